use crate::shared::constants::{
    DEFAULT_ANALYSIS_WIDTH, DEFAULT_CAMERA_WIDTH, DEFAULT_MEDIAN_WINDOW, DEFAULT_TARGET_FPS,
    STATUS_EVERY_FRAMES,
};
use crate::shared::error::TrackingError;

/// Settings for tracking a video file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackingConfig {
    /// Analyse every `stride`-th frame.
    pub stride: usize,
    /// Frames are resized to this width before detection.
    pub analysis_width: u32,
    pub median_window: usize,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            stride: 1,
            analysis_width: DEFAULT_ANALYSIS_WIDTH,
            median_window: DEFAULT_MEDIAN_WINDOW,
        }
    }
}

impl TrackingConfig {
    pub fn validate(&self) -> Result<(), TrackingError> {
        if self.stride < 1 {
            return Err(TrackingError::InvalidStride(self.stride));
        }
        validate_median_window(self.median_window)
    }
}

/// Settings for a live camera session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LiveConfig {
    pub camera_index: u32,
    /// Frames are resized to this width before detection.
    pub width: u32,
    pub target_fps: u32,
    /// Start in the recording state instead of paused.
    pub start_recording: bool,
    /// Emit a status line every this many frames.
    pub status_every: usize,
    pub median_window: usize,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            camera_index: 0,
            width: DEFAULT_CAMERA_WIDTH,
            target_fps: DEFAULT_TARGET_FPS,
            start_recording: false,
            status_every: STATUS_EVERY_FRAMES,
            median_window: DEFAULT_MEDIAN_WINDOW,
        }
    }
}

impl LiveConfig {
    pub fn validate(&self) -> Result<(), TrackingError> {
        validate_median_window(self.median_window)
    }
}

fn validate_median_window(window: usize) -> Result<(), TrackingError> {
    if window == 0 || window % 2 == 0 {
        return Err(TrackingError::InvalidMedianWindow(window));
    }
    Ok(())
}
