use thiserror::Error;

/// Errors raised by the tracking domain: invalid configuration and
/// terminal session conditions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackingError {
    #[error("frame stride must be >= 1, got {0}")]
    InvalidStride(usize),
    #[error("median window must be a positive odd integer, got {0}")]
    InvalidMedianWindow(usize),
    #[error("landmark index {index} is out of range for a {available}-point face")]
    InvalidPointIndex { index: usize, available: usize },
    #[error(
        "no mouth coordinates were detected; check that faces are visible, \
         that the landmark model is correct, and that the video quality is sufficient"
    )]
    NoDetections,
    #[error("session has already finished")]
    SessionFinished,
    #[error("recording actions are only available in live sessions")]
    NotInteractive,
}
