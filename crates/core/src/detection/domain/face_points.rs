//! One detected face: its box, its landmark points and the detector's score.

/// A face as reported by a [`LandmarkDetector`](super::landmark_detector::LandmarkDetector).
///
/// Landmarks are indexed by the model's point layout. A `None` entry means
/// the detector did not consider that point visible on this face.
#[derive(Clone, Debug, PartialEq)]
pub struct FacePoints {
    /// `[x1, y1, x2, y2]` in frame pixels, when the model reports a box.
    pub bbox: Option<[f64; 4]>,
    pub landmarks: Vec<Option<(f64, f64)>>,
    pub confidence: f64,
}

impl FacePoints {
    pub fn new(bbox: Option<[f64; 4]>, landmarks: Vec<Option<(f64, f64)>>, confidence: f64) -> Self {
        Self {
            bbox,
            landmarks,
            confidence,
        }
    }

    /// The landmark at `index`, or `None` when it is missing or invisible.
    pub fn point(&self, index: usize) -> Option<(f64, f64)> {
        self.landmarks.get(index).copied().flatten()
    }

    pub fn visible_count(&self) -> usize {
        self.landmarks.iter().filter(|p| p.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face() -> FacePoints {
        FacePoints::new(
            Some([100.0, 80.0, 220.0, 240.0]),
            vec![
                Some((130.0, 130.0)), // left eye
                Some((190.0, 130.0)), // right eye
                Some((160.0, 170.0)), // nose
                Some((138.0, 205.0)), // left mouth corner
                None,                 // right mouth corner hidden
            ],
            0.91,
        )
    }

    #[test]
    fn test_point_returns_visible_landmark() {
        assert_eq!(face().point(3), Some((138.0, 205.0)));
    }

    #[test]
    fn test_point_invisible_is_none() {
        assert_eq!(face().point(4), None);
    }

    #[test]
    fn test_point_out_of_range_is_none() {
        assert_eq!(face().point(48), None);
    }

    #[test]
    fn test_visible_count() {
        assert_eq!(face().visible_count(), 4);
    }
}
