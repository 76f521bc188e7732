use crate::shared::error::TrackingError;

/// Sliding-window median with zero padding past both edges.
///
/// `window` must be odd and at least 1. The output has the input's length.
pub fn median_filter(signal: &[f64], window: usize) -> Result<Vec<f64>, TrackingError> {
    if window == 0 || window % 2 == 0 {
        return Err(TrackingError::InvalidMedianWindow(window));
    }
    let half = window / 2;
    let mut scratch = Vec::with_capacity(window);

    let filtered = (0..signal.len())
        .map(|i| {
            scratch.clear();
            scratch.extend((0..window).map(|k| {
                (i + k)
                    .checked_sub(half)
                    .and_then(|j| signal.get(j))
                    .copied()
                    .unwrap_or(0.0)
            }));
            scratch.sort_by(|a, b| a.total_cmp(b));
            scratch[half]
        })
        .collect();
    Ok(filtered)
}
