/// Indices of strict local maxima.
///
/// The first and last samples are never peaks. A flat top produces no peak.
pub fn find_peaks(signal: &[f64]) -> Vec<usize> {
    signal
        .windows(3)
        .enumerate()
        .filter(|(_, w)| w[1] > w[0] && w[1] > w[2])
        .map(|(i, _)| i + 1)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_clear_maxima() {
        let signal = [0.0, 1.0, 3.0, 1.0, 0.0, 2.0, 5.0, 2.0, 0.0];
        let peaks = find_peaks(&signal);

        assert_eq!(peaks, vec![2, 6]);
        for &i in &peaks {
            assert!(i > 0 && i < signal.len() - 1);
            assert!(signal[i - 1] < signal[i] && signal[i] > signal[i + 1]);
        }
    }

    #[test]
    fn test_boundaries_are_not_peaks() {
        assert!(find_peaks(&[9.0, 1.0, 9.0]).is_empty());
    }

    #[test]
    fn test_plateau_is_not_a_peak() {
        assert!(find_peaks(&[0.0, 2.0, 2.0, 0.0]).is_empty());
    }

    #[test]
    fn test_short_signals() {
        assert!(find_peaks(&[]).is_empty());
        assert!(find_peaks(&[1.0]).is_empty());
        assert!(find_peaks(&[1.0, 2.0]).is_empty());
    }
}
