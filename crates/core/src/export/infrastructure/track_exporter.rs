use std::path::PathBuf;

use crate::export::domain::export_error::ExportError;
use crate::export::domain::export_metadata::{ExportMetadata, ExportTargets};
use crate::tracking::domain::detection::Detection;

use super::csv_exporter::export_csv;
use super::json_exporter::export_json;

/// Outcome of one export target.
pub type ExportResult = (PathBuf, Result<(), ExportError>);

/// Runs every configured export, CSV first. A failed export never stops or
/// undoes the others.
pub fn export_all(
    detections: &[Detection],
    targets: &ExportTargets,
    metadata: &ExportMetadata,
) -> Vec<ExportResult> {
    let mut results = Vec::new();
    if let Some(path) = &targets.csv {
        let result = export_csv(detections, path, metadata.layout());
        if let Err(e) = &result {
            log::error!("CSV export failed: {e}");
        }
        results.push((path.clone(), result));
    }
    if let Some(path) = &targets.json {
        let result = export_json(detections, path, metadata);
        if let Err(e) = &result {
            log::error!("JSON export failed: {e}");
        }
        results.push((path.clone(), result));
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::domain::export_metadata::BatchExportInfo;

    fn metadata() -> ExportMetadata {
        ExportMetadata::Batch(BatchExportInfo {
            video_file: "clip.avi".to_string(),
            total_frames: 10,
            frames_processed: 10,
            skip_frames: 1,
        })
    }

    #[test]
    fn test_no_targets_no_results() {
        let results = export_all(&[], &ExportTargets::default(), &metadata());
        assert!(results.is_empty());
    }

    #[test]
    fn test_writes_both_formats() {
        let dir = tempfile::tempdir().unwrap();
        let targets = ExportTargets {
            csv: Some(dir.path().join("t.csv")),
            json: Some(dir.path().join("t.json")),
        };
        let results = export_all(&[Detection::new(1, 2.0, 3.0)], &targets, &metadata());

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|(_, r)| r.is_ok()));
        assert!(dir.path().join("t.csv").exists());
        assert!(dir.path().join("t.json").exists());
    }

    #[test]
    fn test_csv_failure_does_not_block_json() {
        let dir = tempfile::tempdir().unwrap();
        let targets = ExportTargets {
            csv: Some(dir.path().join("missing").join("t.csv")),
            json: Some(dir.path().join("t.json")),
        };
        let results = export_all(&[Detection::new(1, 2.0, 3.0)], &targets, &metadata());

        assert!(results[0].1.is_err());
        assert!(results[1].1.is_ok());
        assert!(dir.path().join("t.json").exists());
    }

    #[test]
    fn test_json_failure_keeps_written_csv() {
        let dir = tempfile::tempdir().unwrap();
        let targets = ExportTargets {
            csv: Some(dir.path().join("t.csv")),
            json: Some(dir.path().join("missing").join("t.json")),
        };
        let results = export_all(&[Detection::new(1, 2.0, 3.0)], &targets, &metadata());

        assert!(results[0].1.is_ok());
        assert!(results[1].1.is_err());
        assert!(dir.path().join("t.csv").exists());
    }
}
