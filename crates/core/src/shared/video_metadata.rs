use std::fmt;
use std::path::PathBuf;

/// Where frames come from: a recorded file or a live capture device.
#[derive(Clone, Debug, PartialEq)]
pub enum FrameSource {
    File(PathBuf),
    Camera { index: u32, target_fps: u32 },
}

impl FrameSource {
    pub fn is_live(&self) -> bool {
        matches!(self, FrameSource::Camera { .. })
    }
}

impl fmt::Display for FrameSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameSource::File(path) => write!(f, "{}", path.display()),
            FrameSource::Camera { index, .. } => write!(f, "camera {index}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// Zero when the source cannot report a length (live cameras).
    pub total_frames: usize,
    pub codec: String,
    pub source: FrameSource,
}

impl VideoMetadata {
    /// Frame rate as a positive integer, falling back to 30 for unknown rates.
    pub fn fps_or_default(&self) -> i32 {
        let fps = self.fps.round() as i32;
        if fps <= 0 {
            30
        } else {
            fps
        }
    }
}
