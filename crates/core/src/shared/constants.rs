/// Keypoint index of the left mouth corner in the 5-point face-pose model
/// (left eye, right eye, nose, left mouth corner, right mouth corner).
pub const MOUTH_LANDMARK_INDEX: usize = 3;

/// Width frames are resized to before detection in file mode.
pub const DEFAULT_ANALYSIS_WIDTH: u32 = 500;

pub const DEFAULT_CAMERA_WIDTH: u32 = 640;
pub const DEFAULT_TARGET_FPS: u32 = 30;

/// Sliding-window size for the trajectory median filter (must be odd).
pub const DEFAULT_MEDIAN_WINDOW: usize = 3;

/// Batch progress is reported every this many captured frames.
pub const PROGRESS_EVERY_FRAMES: usize = 100;

/// Live status is reported every this many captured frames (~1s at 30 fps).
pub const STATUS_EVERY_FRAMES: usize = 30;

pub const VIDEO_EXTENSIONS: &[&str] = &["avi", "mp4", "mov"];
