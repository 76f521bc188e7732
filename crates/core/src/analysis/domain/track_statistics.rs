//! Descriptive statistics over an exported or finished trajectory.

use crate::shared::error::TrackingError;
use crate::tracking::domain::detection::Detection;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisStatistics {
    pub mean: f64,
    /// Sample standard deviation; 0 for a single value.
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub range: f64,
}

impl AxisStatistics {
    fn of(values: &[f64]) -> Self {
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std_dev = if values.len() > 1 {
            (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
        } else {
            0.0
        };
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Self {
            mean,
            std_dev,
            min,
            max,
            range: max - min,
        }
    }
}

/// Per-step displacement magnitude, in pixels per recorded detection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VelocityStatistics {
    pub mean: f64,
    pub max: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackStatistics {
    pub count: usize,
    pub x: AxisStatistics,
    pub y: AxisStatistics,
    /// `None` with fewer than two detections.
    pub velocity: Option<VelocityStatistics>,
    /// Detections per processed frame, when the frame count is known.
    pub detection_rate: Option<f64>,
}

impl TrackStatistics {
    pub fn compute(
        detections: &[Detection],
        frames_processed: Option<usize>,
    ) -> Result<Self, TrackingError> {
        if detections.is_empty() {
            return Err(TrackingError::NoDetections);
        }
        let xs: Vec<f64> = detections.iter().map(|d| d.x).collect();
        let ys: Vec<f64> = detections.iter().map(|d| d.y).collect();

        let steps: Vec<f64> = detections
            .windows(2)
            .map(|w| (w[1].x - w[0].x).hypot(w[1].y - w[0].y))
            .collect();
        let velocity = (!steps.is_empty()).then(|| VelocityStatistics {
            mean: steps.iter().sum::<f64>() / steps.len() as f64,
            max: steps.iter().copied().fold(0.0, f64::max),
        });

        let detection_rate = frames_processed
            .filter(|&n| n > 0)
            .map(|n| detections.len() as f64 / n as f64);

        Ok(Self {
            count: detections.len(),
            x: AxisStatistics::of(&xs),
            y: AxisStatistics::of(&ys),
            velocity,
            detection_rate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn track() -> Vec<Detection> {
        vec![
            Detection::new(1, 0.0, 0.0),
            Detection::new(2, 3.0, 4.0),
            Detection::new(3, 3.0, 4.0),
            Detection::new(4, 6.0, 8.0),
        ]
    }

    #[test]
    fn test_axis_statistics() {
        let stats = TrackStatistics::compute(&track(), None).unwrap();

        assert_eq!(stats.count, 4);
        assert_relative_eq!(stats.x.mean, 3.0);
        assert_relative_eq!(stats.x.min, 0.0);
        assert_relative_eq!(stats.x.max, 6.0);
        assert_relative_eq!(stats.x.range, 6.0);
        // Sample variance of [0, 3, 3, 6] is 18 / 3.
        assert_relative_eq!(stats.x.std_dev, 6.0f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(stats.y.mean, 4.0);
    }

    #[test]
    fn test_velocity_magnitudes() {
        let stats = TrackStatistics::compute(&track(), None).unwrap();
        let velocity = stats.velocity.unwrap();
        // Steps: 5, 0, 5.
        assert_relative_eq!(velocity.mean, 10.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(velocity.max, 5.0);
    }

    #[test]
    fn test_detection_rate() {
        let stats = TrackStatistics::compute(&track(), Some(8)).unwrap();
        assert_relative_eq!(stats.detection_rate.unwrap(), 0.5);

        let stats = TrackStatistics::compute(&track(), Some(0)).unwrap();
        assert!(stats.detection_rate.is_none());
    }

    #[test]
    fn test_single_detection() {
        let stats = TrackStatistics::compute(&[Detection::new(1, 2.0, 3.0)], None).unwrap();
        assert_relative_eq!(stats.x.std_dev, 0.0);
        assert!(stats.velocity.is_none());
    }

    #[test]
    fn test_empty_track_errors() {
        assert_eq!(
            TrackStatistics::compute(&[], None),
            Err(TrackingError::NoDetections)
        );
    }
}
