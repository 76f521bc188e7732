//! JSON document for a trajectory plus its session metadata.

use std::path::Path;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::export::domain::export_error::ExportError;
use crate::export::domain::export_metadata::ExportMetadata;
use crate::tracking::domain::detection::Detection;

use super::atomic_file::write_atomically;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoordinateRecord {
    pub frame: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
    pub mouth_x: f64,
    pub mouth_y: f64,
}

impl From<&Detection> for CoordinateRecord {
    fn from(d: &Detection) -> Self {
        Self {
            frame: d.frame_index,
            timestamp: d.timestamp,
            mouth_x: d.x,
            mouth_y: d.y,
        }
    }
}

impl From<&CoordinateRecord> for Detection {
    fn from(r: &CoordinateRecord) -> Self {
        Detection {
            frame_index: r.frame,
            timestamp: r.timestamp,
            x: r.mouth_x,
            y: r.mouth_y,
        }
    }
}

/// On-disk shape of a JSON export. Batch documents carry `video_file`,
/// `frames_processed` and `skip_frames`; live documents carry the camera
/// fields, `recording_date` and `duration_seconds`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recording_date: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_fps: Option<u32>,
    pub total_frames: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frames_processed: Option<usize>,
    pub detections: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_frames: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    pub coordinates: Vec<CoordinateRecord>,
}

impl TrackDocument {
    pub fn new(detections: &[Detection], metadata: &ExportMetadata) -> Self {
        let coordinates: Vec<CoordinateRecord> = detections.iter().map(Into::into).collect();
        let mut doc = Self {
            video_file: None,
            recording_date: None,
            camera_index: None,
            frame_width: None,
            target_fps: None,
            total_frames: 0,
            frames_processed: None,
            detections: coordinates.len(),
            skip_frames: None,
            duration_seconds: None,
            coordinates,
        };
        match metadata {
            ExportMetadata::Batch(info) => {
                doc.video_file = Some(info.video_file.clone());
                doc.total_frames = info.total_frames;
                doc.frames_processed = Some(info.frames_processed);
                doc.skip_frames = Some(info.skip_frames);
            }
            ExportMetadata::Live(info) => {
                doc.recording_date = Some(info.recording_date.fixed_offset());
                doc.camera_index = Some(info.camera_index);
                doc.frame_width = Some(info.frame_width);
                doc.target_fps = Some(info.target_fps);
                doc.total_frames = info.total_frames;
                doc.duration_seconds = Some(info.duration_seconds);
            }
        }
        doc
    }

    pub fn to_detections(&self) -> Vec<Detection> {
        self.coordinates.iter().map(Into::into).collect()
    }

    pub fn is_live(&self) -> bool {
        self.recording_date.is_some() || self.camera_index.is_some()
    }
}

/// Writes the detections and metadata as pretty-printed JSON.
pub fn export_json(
    detections: &[Detection],
    path: &Path,
    metadata: &ExportMetadata,
) -> Result<(), ExportError> {
    let doc = TrackDocument::new(detections, metadata);
    let mut text = serde_json::to_string_pretty(&doc).map_err(|source| ExportError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    text.push('\n');
    write_atomically(path, text.as_bytes())?;
    log::info!("Data exported to JSON: {}", path.display());
    Ok(())
}

/// Reads a JSON export back. Coordinates must not go back in frame order.
pub fn load_json(path: &Path) -> Result<TrackDocument, ExportError> {
    let text = std::fs::read_to_string(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let doc: TrackDocument =
        serde_json::from_str(&text).map_err(|source| ExportError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    if let Some(position) = doc
        .coordinates
        .windows(2)
        .position(|w| w[1].frame < w[0].frame)
    {
        return Err(ExportError::Unordered {
            path: path.to_path_buf(),
            position: position + 1,
            frame: doc.coordinates[position + 1].frame,
            previous: doc.coordinates[position].frame,
        });
    }
    Ok(doc)
}
