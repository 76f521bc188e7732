use std::path::PathBuf;

use chrono::{DateTime, Local};

/// Which record shape an export uses: live sessions carry timestamps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordLayout {
    Batch,
    Live,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BatchExportInfo {
    pub video_file: String,
    pub total_frames: usize,
    /// Frames read from the source, analysed or skipped.
    pub frames_processed: usize,
    pub skip_frames: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LiveExportInfo {
    pub recording_date: DateTime<Local>,
    pub camera_index: u32,
    pub frame_width: u32,
    pub target_fps: u32,
    pub total_frames: usize,
    pub duration_seconds: f64,
}

/// Session description written alongside the coordinates in JSON exports.
#[derive(Clone, Debug, PartialEq)]
pub enum ExportMetadata {
    Batch(BatchExportInfo),
    Live(LiveExportInfo),
}

impl ExportMetadata {
    pub fn layout(&self) -> RecordLayout {
        match self {
            ExportMetadata::Batch(_) => RecordLayout::Batch,
            ExportMetadata::Live(_) => RecordLayout::Live,
        }
    }
}

/// Where a finished session is exported. Either, both or neither may be set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExportTargets {
    pub csv: Option<PathBuf>,
    pub json: Option<PathBuf>,
}

impl ExportTargets {
    pub fn is_empty(&self) -> bool {
        self.csv.is_none() && self.json.is_none()
    }
}
