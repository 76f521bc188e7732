//! The shared end of every run: trim, analyse, export.

use crate::analysis::domain::periodicity::{summarize, PeriodicitySummary};
use crate::analysis::domain::track_statistics::TrackStatistics;
use crate::export::domain::export_metadata::{ExportMetadata, ExportTargets};
use crate::export::infrastructure::track_exporter::{export_all, ExportResult};
use crate::shared::error::TrackingError;
use crate::tracking::domain::detection::Detection;
use crate::tracking::domain::track_buffer::TrackBuffer;

use super::tracking_logger::TrackingLogger;

/// What a finished, non-empty session produced.
#[derive(Debug)]
pub struct SessionReport {
    pub detections: Vec<Detection>,
    pub summary: PeriodicitySummary,
    pub statistics: TrackStatistics,
    pub exports: Vec<ExportResult>,
}

impl SessionReport {
    pub fn failed_exports(&self) -> usize {
        self.exports.iter().filter(|(_, r)| r.is_err()).count()
    }
}

/// Facts about the run that the buffer itself does not hold.
pub struct FinalizeOptions<'a> {
    pub median_window: usize,
    pub frames_processed: usize,
    /// Source frame rate, for reporting the period in hertz.
    pub fps: Option<f64>,
    pub targets: &'a ExportTargets,
    pub metadata: &'a ExportMetadata,
}

/// Trims the buffer, then analyses and exports it.
///
/// An empty buffer stops here with [`TrackingError::NoDetections`]; nothing
/// is analysed and nothing is exported.
pub fn finalize_session(
    mut buffer: TrackBuffer,
    options: &FinalizeOptions<'_>,
    logger: &mut dyn TrackingLogger,
) -> Result<SessionReport, TrackingError> {
    buffer.trim();
    let detections = buffer.into_entries();
    if detections.is_empty() {
        return Err(TrackingError::NoDetections);
    }
    logger.info(&format!("Total detections: {}", detections.len()));

    let summary = summarize(&detections, options.median_window)?;
    let statistics = TrackStatistics::compute(&detections, Some(options.frames_processed))?;
    log_summary(&summary, options.fps, logger);

    let exports = export_all(&detections, options.targets, options.metadata);

    Ok(SessionReport {
        detections,
        summary,
        statistics,
        exports,
    })
}

fn log_summary(summary: &PeriodicitySummary, fps: Option<f64>, logger: &mut dyn TrackingLogger) {
    logger.info(&format!(
        "Found {} peaks in mouth x motion at frames {:?}",
        summary.peak_indices.len(),
        summary.peak_frames()
    ));
    if let Some(period) = summary.period {
        let hz = fps
            .and_then(|fps| period.frequency_hz(fps))
            .map(|hz| format!(" ({hz:.2} Hz)"))
            .unwrap_or_default();
        logger.info(&format!(
            "Mean peak interval: {:.1} frames over {} cycles{hz}",
            period.mean_interval_frames, period.cycles
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::domain::export_metadata::BatchExportInfo;
    use crate::pipeline::tracking_logger::NullTrackingLogger;

    fn metadata() -> ExportMetadata {
        ExportMetadata::Batch(BatchExportInfo {
            video_file: "clip.avi".to_string(),
            total_frames: 8,
            frames_processed: 8,
            skip_frames: 1,
        })
    }

    fn filled(capacity: usize, count: usize) -> TrackBuffer {
        let mut buffer = TrackBuffer::bounded(capacity);
        for i in 0..count {
            buffer.append(Detection::new(i + 1, 100.0 + (i % 3) as f64, 50.0));
        }
        buffer
    }

    #[test]
    fn test_empty_buffer_exports_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let targets = ExportTargets {
            csv: Some(dir.path().join("t.csv")),
            json: None,
        };
        let meta = metadata();
        let options = FinalizeOptions {
            median_window: 3,
            frames_processed: 8,
            fps: None,
            targets: &targets,
            metadata: &meta,
        };

        let result = finalize_session(TrackBuffer::bounded(8), &options, &mut NullTrackingLogger);
        assert!(matches!(result, Err(TrackingError::NoDetections)));
        assert!(!dir.path().join("t.csv").exists());
    }

    #[test]
    fn test_trims_analyses_and_exports() {
        let dir = tempfile::tempdir().unwrap();
        let targets = ExportTargets {
            csv: Some(dir.path().join("t.csv")),
            json: Some(dir.path().join("t.json")),
        };
        let meta = metadata();
        let options = FinalizeOptions {
            median_window: 3,
            frames_processed: 8,
            fps: Some(30.0),
            targets: &targets,
            metadata: &meta,
        };

        let report = finalize_session(filled(8, 6), &options, &mut NullTrackingLogger).unwrap();
        assert_eq!(report.detections.len(), 6);
        assert_eq!(report.summary.filtered_x.len(), 6);
        assert_eq!(report.statistics.count, 6);
        assert_eq!(report.exports.len(), 2);
        assert_eq!(report.failed_exports(), 0);
    }

    #[test]
    fn test_failed_export_is_reported_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let targets = ExportTargets {
            csv: Some(dir.path().join("missing").join("t.csv")),
            json: Some(dir.path().join("t.json")),
        };
        let meta = metadata();
        let options = FinalizeOptions {
            median_window: 3,
            frames_processed: 8,
            fps: None,
            targets: &targets,
            metadata: &meta,
        };

        let report = finalize_session(filled(8, 3), &options, &mut NullTrackingLogger).unwrap();
        assert_eq!(report.failed_exports(), 1);
        assert!(dir.path().join("t.json").exists());
    }
}
