use std::path::Path;

use crate::export::domain::export_error::ExportError;
use crate::tracking::domain::detection::Detection;

use super::csv_exporter::load_csv;
use super::json_exporter::load_json;

/// A previously exported trajectory with whatever session facts the file kept.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedTrack {
    pub detections: Vec<Detection>,
    /// Frames read by the session; only JSON exports record it.
    pub frames_processed: Option<usize>,
    /// Frame rate of the source; only live JSON exports record it.
    pub fps: Option<f64>,
}

/// Loads a `.json` or `.csv` export, chosen by extension.
pub fn load_track(path: &Path) -> Result<LoadedTrack, ExportError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("json") => {
            let doc = load_json(path)?;
            let frames_processed = doc
                .frames_processed
                .or_else(|| doc.is_live().then_some(doc.total_frames));
            Ok(LoadedTrack {
                detections: doc.to_detections(),
                frames_processed,
                fps: doc.target_fps.map(f64::from),
            })
        }
        Some("csv") => Ok(LoadedTrack {
            detections: load_csv(path)?,
            frames_processed: None,
            fps: None,
        }),
        _ => Err(ExportError::UnsupportedFormat(path.to_path_buf())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::domain::export_metadata::{BatchExportInfo, ExportMetadata, RecordLayout};
    use crate::export::infrastructure::csv_exporter::export_csv;
    use crate::export::infrastructure::json_exporter::export_json;

    fn track() -> Vec<Detection> {
        vec![Detection::new(1, 10.0, 20.0), Detection::new(3, 12.0, 21.0)]
    }

    #[test]
    fn test_loads_json_with_frames_processed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        let meta = ExportMetadata::Batch(BatchExportInfo {
            video_file: "run.avi".to_string(),
            total_frames: 6,
            frames_processed: 6,
            skip_frames: 1,
        });
        export_json(&track(), &path, &meta).unwrap();

        let loaded = load_track(&path).unwrap();
        assert_eq!(loaded.detections, track());
        assert_eq!(loaded.frames_processed, Some(6));
        assert_eq!(loaded.fps, None);
    }

    #[test]
    fn test_loads_csv_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("RUN.CSV");
        export_csv(&track(), &path, RecordLayout::Batch).unwrap();

        let loaded = load_track(&path).unwrap();
        assert_eq!(loaded.detections, track());
        assert_eq!(loaded.frames_processed, None);
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let err = load_track(Path::new("run.txt")).unwrap_err();
        assert!(matches!(err, ExportError::UnsupportedFormat(_)));
    }
}
