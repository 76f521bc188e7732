use std::collections::HashMap;
use std::time::Instant;

use crate::tracking::domain::recording_controller::SessionState;

/// Cross-cutting logger for tracking runs.
///
/// Use cases report what happens; implementations decide what reaches the
/// user and how often.
pub trait TrackingLogger: Send {
    /// Called once per captured frame of a file.
    fn progress(&mut self, captured: usize, total: usize, detections: usize);

    /// Periodic live-session status line.
    fn status(&mut self, state: SessionState, fps: f64, frames: usize, detections: usize);

    /// Record how long a named stage took for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Discards all events. Used by tests.
pub struct NullTrackingLogger;

impl TrackingLogger for NullTrackingLogger {
    fn progress(&mut self, _captured: usize, _total: usize, _detections: usize) {}
    fn status(&mut self, _state: SessionState, _fps: f64, _frames: usize, _detections: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// CLI logger: throttled progress through `log`, per-stage timings and an
/// end-of-run summary.
pub struct StdoutTrackingLogger {
    throttle_frames: usize,
    show_progress: bool,
    timings: HashMap<String, Vec<f64>>,
    start_time: Instant,
    frames: usize,
}

impl StdoutTrackingLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            show_progress: true,
            timings: HashMap::new(),
            start_time: Instant::now(),
            frames: 0,
        }
    }

    /// Suppresses progress and status lines; messages and the summary remain.
    pub fn quiet(mut self) -> Self {
        self.show_progress = false;
        self
    }

    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let mut lines = vec![format!(
            "Tracking summary ({} frames, {:.1}s total):",
            self.frames,
            elapsed_ms / 1000.0
        )];

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let durations = &self.timings[stage];
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = total_ms / durations.len().max(1) as f64;
            lines.push(format!(
                "  {stage:10}: avg {avg_ms:6.1}ms  total {total_ms:7.0}ms  ({} frames)",
                durations.len()
            ));
        }

        if self.frames > 0 && elapsed_ms > 0.0 {
            let fps = self.frames as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {fps:.1} fps"));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }
}

impl Default for StdoutTrackingLogger {
    fn default() -> Self {
        Self::new(crate::shared::constants::PROGRESS_EVERY_FRAMES)
    }
}

impl TrackingLogger for StdoutTrackingLogger {
    fn progress(&mut self, captured: usize, total: usize, detections: usize) {
        self.frames = captured;
        if self.show_progress && captured % self.throttle_frames == 0 {
            if total > 0 {
                log::info!("Processed {captured}/{total} frames ({detections} detections)");
            } else {
                log::info!("Processed {captured} frames ({detections} detections)");
            }
        }
    }

    fn status(&mut self, state: SessionState, fps: f64, frames: usize, detections: usize) {
        self.frames = frames;
        if self.show_progress {
            log::info!(
                "[{}] FPS: {fps:.1} | Frames: {frames} | Detections: {detections}",
                state.label()
            );
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_null_logger_all_methods_are_noop() {
        let mut logger = NullTrackingLogger;
        logger.progress(1, 10, 0);
        logger.status(SessionState::Paused, 29.7, 30, 0);
        logger.timing("detect", 5.0);
        logger.info("hello");
        logger.summary();
    }

    #[test]
    fn test_timing_records_values() {
        let mut logger = StdoutTrackingLogger::new(100);
        logger.timing("detect", 20.0);
        logger.timing("detect", 30.0);
        logger.timing("annotate", 2.0);

        let detect = logger.timings_for("detect").unwrap();
        assert_eq!(detect.len(), 2);
        assert_relative_eq!(detect[1], 30.0);
        assert_eq!(logger.timings_for("annotate").unwrap().len(), 1);
    }

    #[test]
    fn test_summary_lists_stages() {
        let mut logger = StdoutTrackingLogger::new(100);
        logger.progress(50, 100, 12);
        logger.timing("detect", 20.0);
        logger.timing("encode", 4.0);

        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("Tracking summary (50 frames"));
        assert!(summary.contains("detect"));
        assert!(summary.contains("encode"));
        assert!(summary.contains("fps"));
    }

    #[test]
    fn test_empty_summary_returns_none() {
        assert!(StdoutTrackingLogger::new(10).summary_string().is_none());
    }

    #[test]
    fn test_status_updates_frame_count_when_quiet() {
        let mut logger = StdoutTrackingLogger::new(10).quiet();
        logger.status(SessionState::Recording, 30.0, 90, 40);
        assert_eq!(logger.frames, 90);
        assert!(!logger.show_progress);
    }

    #[test]
    fn test_default_throttles_every_hundred_frames() {
        let logger = StdoutTrackingLogger::default();
        assert_eq!(logger.throttle_frames, 100);
        assert!(logger.show_progress);
    }
}
