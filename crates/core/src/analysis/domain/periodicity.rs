//! Post-processing of a finished trajectory into a periodicity estimate.

use crate::analysis::domain::median_filter::median_filter;
use crate::analysis::domain::normalization::normalize;
use crate::analysis::domain::peak_finder::find_peaks;
use crate::shared::error::TrackingError;
use crate::tracking::domain::detection::Detection;

/// Spacing of consecutive peaks, measured in captured frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PeriodEstimate {
    pub mean_interval_frames: f64,
    /// Number of peak-to-peak intervals the mean is taken over.
    pub cycles: usize,
}

impl PeriodEstimate {
    /// Motion frequency for a source running at `fps`.
    pub fn frequency_hz(&self, fps: f64) -> Option<f64> {
        (self.mean_interval_frames > 0.0 && fps > 0.0).then(|| fps / self.mean_interval_frames)
    }
}

/// Derived view of a finished trajectory. Recomputable from the detections.
#[derive(Clone, Debug, PartialEq)]
pub struct PeriodicitySummary {
    pub frame_indices: Vec<usize>,
    pub normalized_x: Vec<f64>,
    pub normalization_applied: bool,
    pub filtered_x: Vec<f64>,
    pub filtered_y: Vec<f64>,
    /// Positions into the sequences above, not frame indices.
    pub peak_indices: Vec<usize>,
    pub period: Option<PeriodEstimate>,
}

impl PeriodicitySummary {
    pub fn peak_frames(&self) -> Vec<usize> {
        self.peak_indices
            .iter()
            .map(|&i| self.frame_indices[i])
            .collect()
    }
}

/// Normalizes x, median-filters x and y, and finds peaks in the filtered x.
pub fn summarize(
    detections: &[Detection],
    window: usize,
) -> Result<PeriodicitySummary, TrackingError> {
    if detections.is_empty() {
        return Err(TrackingError::NoDetections);
    }

    let xs: Vec<f64> = detections.iter().map(|d| d.x).collect();
    let ys: Vec<f64> = detections.iter().map(|d| d.y).collect();
    let frame_indices: Vec<usize> = detections.iter().map(|d| d.frame_index).collect();

    let normalization = normalize(&xs);
    let filtered_x = median_filter(&normalization.values, window)?;
    let filtered_y = median_filter(&ys, window)?;
    let peak_indices = find_peaks(&filtered_x);
    let period = estimate_period(&frame_indices, &peak_indices);

    Ok(PeriodicitySummary {
        frame_indices,
        normalized_x: normalization.values,
        normalization_applied: normalization.applied,
        filtered_x,
        filtered_y,
        peak_indices,
        period,
    })
}

fn estimate_period(frame_indices: &[usize], peak_indices: &[usize]) -> Option<PeriodEstimate> {
    if peak_indices.len() < 2 {
        return None;
    }
    // Frame numbering restarts when tracks are concatenated; such steps are
    // not a period.
    let intervals: Vec<f64> = peak_indices
        .windows(2)
        .filter_map(|w| frame_indices[w[1]].checked_sub(frame_indices[w[0]]))
        .map(|interval| interval as f64)
        .collect();
    if intervals.is_empty() {
        return None;
    }
    Some(PeriodEstimate {
        mean_interval_frames: intervals.iter().sum::<f64>() / intervals.len() as f64,
        cycles: intervals.len(),
    })
}
