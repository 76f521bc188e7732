use std::time::Instant;

use chrono::Local;
use crossbeam_channel::{Receiver, TryRecvError};

use crate::detection::domain::landmark_extractor::LandmarkExtractor;
use crate::export::domain::export_metadata::{ExportMetadata, ExportTargets, LiveExportInfo};
use crate::shared::video_metadata::FrameSource;
use crate::tracking::domain::recording_controller::{SessionAction, SessionState, Transition};
use crate::tracking::domain::tracking_session::{RecordOutcome, TrackingSession};
use crate::video::domain::video_reader::VideoReader;

use super::session_finalizer::{finalize_session, FinalizeOptions, SessionReport};
use super::tracking_config::LiveConfig;
use super::tracking_logger::TrackingLogger;

#[derive(Debug)]
pub struct LiveSessionReport {
    /// Frames captured since the start or the last clear.
    pub frames_captured: usize,
    pub duration_seconds: f64,
    /// `None` when nothing was recorded; nothing is exported then.
    pub session: Option<SessionReport>,
}

/// Tracks the mouth landmark from a camera until the user quits or the
/// camera stops delivering frames.
///
/// User actions arrive over a channel and are applied before each frame,
/// so the capture loop never blocks on input.
pub struct LiveSessionUseCase {
    reader: Box<dyn VideoReader>,
    extractor: LandmarkExtractor,
    logger: Box<dyn TrackingLogger>,
    actions: Receiver<SessionAction>,
    config: LiveConfig,
}

impl LiveSessionUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        extractor: LandmarkExtractor,
        logger: Box<dyn TrackingLogger>,
        actions: Receiver<SessionAction>,
        config: LiveConfig,
    ) -> Self {
        Self {
            reader,
            extractor,
            logger,
            actions,
            config,
        }
    }

    pub fn execute(
        &mut self,
        targets: &ExportTargets,
    ) -> Result<LiveSessionReport, Box<dyn std::error::Error>> {
        self.config.validate()?;

        let source = FrameSource::Camera {
            index: self.config.camera_index,
            target_fps: self.config.target_fps,
        };
        self.reader
            .open(&source)
            .map_err(|e| format!("could not open camera {}: {e}", self.config.camera_index))?;

        let initial = if self.config.start_recording {
            SessionState::Recording
        } else {
            SessionState::Paused
        };
        self.logger
            .info("Controls: 'r' start/pause recording, 'c' clear data, 'q' quit");
        if initial == SessionState::Paused {
            self.logger.info("Press 'r' to start recording");
        }

        let Self {
            reader,
            extractor,
            logger,
            actions,
            config,
        } = self;

        let mut session = TrackingSession::live(initial, Instant::now());
        let status_every = config.status_every.max(1);
        let mut window_start = Instant::now();
        let mut frames_seen = 0usize;

        for item in reader.frames() {
            if drain_actions(actions, &mut session, logger.as_mut()) {
                break;
            }

            let frame = match item {
                Ok(frame) => frame,
                Err(e) => {
                    log::warn!("camera stopped delivering frames: {e}");
                    break;
                }
            };
            // Timestamps mark frame arrival, not the end of detection.
            let grabbed_at = Instant::now();

            if let Some(mut sample) = session.capture(frame) {
                sample.image = sample.image.resize_to_width(config.width);

                let detect_start = Instant::now();
                let extraction = extractor.extract(&sample);
                logger.timing("detect", detect_start.elapsed().as_secs_f64() * 1000.0);

                let outcome = session.record(&sample, extraction.points(), grabbed_at);
                if let RecordOutcome::Recorded { started: true, .. } = outcome {
                    logger.info("First mouth position recorded");
                }
            }

            frames_seen += 1;
            if frames_seen % status_every == 0 {
                let window = window_start.elapsed().as_secs_f64();
                let fps = if window > 0.0 {
                    status_every as f64 / window
                } else {
                    0.0
                };
                if let Some(state) = session.state() {
                    logger.status(state, fps, session.captured(), session.buffer().len());
                }
                window_start = Instant::now();
            }
        }

        reader.close();

        let frames_captured = session.captured();
        let buffer = session.finish();
        let duration_seconds = buffer
            .entries()
            .last()
            .and_then(|d| d.timestamp)
            .unwrap_or(0.0);

        if buffer.is_empty() {
            logger.info("No data recorded");
            return Ok(LiveSessionReport {
                frames_captured,
                duration_seconds,
                session: None,
            });
        }
        logger.info(&format!(
            "Recording finished: {} mouth positions over {duration_seconds:.1}s",
            buffer.len()
        ));

        let metadata = ExportMetadata::Live(LiveExportInfo {
            recording_date: Local::now(),
            camera_index: config.camera_index,
            frame_width: config.width,
            target_fps: config.target_fps,
            total_frames: frames_captured,
            duration_seconds,
        });
        let options = FinalizeOptions {
            median_window: config.median_window,
            frames_processed: frames_captured,
            fps: Some(config.target_fps as f64),
            targets,
            metadata: &metadata,
        };
        let report = finalize_session(buffer, &options, logger.as_mut())?;
        logger.summary();

        Ok(LiveSessionReport {
            frames_captured,
            duration_seconds,
            session: Some(report),
        })
    }
}

/// Applies every pending action. Returns `true` once the session is over.
fn drain_actions(
    actions: &Receiver<SessionAction>,
    session: &mut TrackingSession,
    logger: &mut dyn TrackingLogger,
) -> bool {
    loop {
        let action = match actions.try_recv() {
            Ok(action) => action,
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return false,
        };
        let resumed = session.has_started();
        match session.apply(action, Instant::now()) {
            Ok(Transition::Finished) => {
                logger.info("Quitting...");
                return true;
            }
            Ok(Transition::Cleared) => logger.info("Data cleared"),
            Ok(Transition::StateChanged(SessionState::Recording)) if resumed => {
                logger.info("Recording resumed")
            }
            Ok(Transition::StateChanged(SessionState::Recording)) => {
                logger.info("Recording started")
            }
            Ok(Transition::StateChanged(SessionState::Paused)) => logger.info("Recording paused"),
            Err(e) => log::warn!("ignoring {action:?}: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::face_points::FacePoints;
    use crate::detection::domain::landmark_detector::LandmarkDetector;
    use crate::pipeline::tracking_logger::NullTrackingLogger;
    use crate::shared::frame::Frame;
    use crate::shared::video_metadata::VideoMetadata;
    use crossbeam_channel::{unbounded, Sender};
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    // --- Stubs ---

    /// Yields `count` frames; sends each scripted action just before the
    /// frame it is keyed to.
    struct ScriptedCamera {
        count: usize,
        script: Vec<(usize, SessionAction)>,
        sender: Option<Sender<SessionAction>>,
        opened: Arc<Mutex<Option<FrameSource>>>,
    }

    impl VideoReader for ScriptedCamera {
        fn open(
            &mut self,
            source: &FrameSource,
        ) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
            *self.opened.lock().unwrap() = Some(source.clone());
            Ok(VideoMetadata {
                width: 100,
                height: 60,
                fps: 30.0,
                total_frames: 0,
                codec: String::new(),
                source: source.clone(),
            })
        }

        fn frames(
            &mut self,
        ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
            let script = self.script.clone();
            let sender = self.sender.take();
            Box::new((0..self.count).map(move |i| {
                if let Some(tx) = &sender {
                    for (at, action) in &script {
                        if *at == i {
                            tx.send(*action).unwrap();
                        }
                    }
                }
                Ok(Frame::new(vec![0u8; 100 * 60 * 3], 100, 60, 3, i))
            }))
        }

        fn close(&mut self) {}
    }

    struct NoCamera;

    impl VideoReader for NoCamera {
        fn open(
            &mut self,
            _source: &FrameSource,
        ) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
            Err("device busy".into())
        }

        fn frames(
            &mut self,
        ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
            Box::new(std::iter::empty())
        }

        fn close(&mut self) {}
    }

    /// One face per frame; the mouth sits at the frame width so resizing
    /// is observable.
    struct WidthDetector;

    impl LandmarkDetector for WidthDetector {
        fn detect(&mut self, frame: &Frame) -> Result<Vec<FacePoints>, Box<dyn std::error::Error>> {
            let mouth = Some((frame.width() as f64, frame.index() as f64));
            Ok(vec![FacePoints::new(
                None,
                vec![None, None, None, mouth, None],
                0.8,
            )])
        }

        fn points_per_face(&self) -> Option<usize> {
            Some(5)
        }
    }

    /// Takes `delay` per call, then finds one face with its mouth visible.
    struct SlowDetector {
        delay: std::time::Duration,
    }

    impl LandmarkDetector for SlowDetector {
        fn detect(&mut self, frame: &Frame) -> Result<Vec<FacePoints>, Box<dyn std::error::Error>> {
            std::thread::sleep(self.delay);
            WidthDetector.detect(frame)
        }

        fn points_per_face(&self) -> Option<usize> {
            Some(5)
        }
    }

    // --- Helpers ---

    fn config(start_recording: bool) -> LiveConfig {
        LiveConfig {
            camera_index: 1,
            width: 50,
            target_fps: 15,
            start_recording,
            status_every: 2,
            median_window: 3,
        }
    }

    fn run(
        count: usize,
        script: Vec<(usize, SessionAction)>,
        start_recording: bool,
        targets: &ExportTargets,
    ) -> LiveSessionReport {
        let (tx, rx) = unbounded();
        let camera = ScriptedCamera {
            count,
            script,
            sender: Some(tx),
            opened: Arc::new(Mutex::new(None)),
        };
        let mut uc = LiveSessionUseCase::new(
            Box::new(camera),
            LandmarkExtractor::new(Box::new(WidthDetector), 3).unwrap(),
            Box::new(NullTrackingLogger),
            rx,
            config(start_recording),
        );
        uc.execute(targets).unwrap()
    }

    fn frame_indices(report: &LiveSessionReport) -> Vec<usize> {
        report
            .session
            .as_ref()
            .unwrap()
            .detections
            .iter()
            .map(|d| d.frame_index)
            .collect()
    }

    // --- Tests ---

    #[test]
    fn test_paused_session_records_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let targets = ExportTargets {
            csv: Some(dir.path().join("live.csv")),
            json: None,
        };

        let report = run(5, vec![], false, &targets);

        assert!(report.session.is_none());
        assert_eq!(report.frames_captured, 5);
        assert_eq!(report.duration_seconds, 0.0);
        assert!(!dir.path().join("live.csv").exists());
    }

    #[test]
    fn test_start_recording_records_every_frame() {
        let report = run(4, vec![], true, &ExportTargets::default());

        assert_eq!(frame_indices(&report), vec![1, 2, 3, 4]);
        let detections = &report.session.as_ref().unwrap().detections;
        assert!(detections.iter().all(|d| d.timestamp.is_some()));
        assert!(detections.iter().all(|d| d.x == 50.0));
    }

    #[test]
    fn test_toggle_starts_recording_mid_session() {
        let report = run(5, vec![(2, SessionAction::Toggle)], false, &ExportTargets::default());

        assert_eq!(frame_indices(&report), vec![3, 4, 5]);
    }

    #[test]
    fn test_pause_drops_detections_but_keeps_numbering() {
        let script = vec![(1, SessionAction::Toggle), (3, SessionAction::Toggle)];
        let report = run(5, script, true, &ExportTargets::default());

        assert_eq!(frame_indices(&report), vec![1, 4, 5]);
    }

    #[test]
    fn test_clear_restarts_numbering() {
        let report = run(6, vec![(3, SessionAction::Clear)], true, &ExportTargets::default());

        assert_eq!(frame_indices(&report), vec![1, 2, 3]);
        assert_eq!(report.frames_captured, 3);
        // Frames 3..5 survive the clear.
        let ys: Vec<f64> = report
            .session
            .as_ref()
            .unwrap()
            .detections
            .iter()
            .map(|d| d.y)
            .collect();
        assert_eq!(ys, vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_quit_stops_before_next_frame() {
        let report = run(10, vec![(2, SessionAction::Quit)], true, &ExportTargets::default());

        assert_eq!(report.frames_captured, 2);
        assert_eq!(frame_indices(&report), vec![1, 2]);
    }

    #[test]
    fn test_actions_after_quit_are_ignored() {
        let script = vec![(1, SessionAction::Quit), (1, SessionAction::Clear)];
        let report = run(4, script, true, &ExportTargets::default());

        assert_eq!(frame_indices(&report), vec![1]);
    }

    #[test]
    fn test_json_export_has_live_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("live.json");
        let targets = ExportTargets {
            csv: None,
            json: Some(json.clone()),
        };

        run(3, vec![], true, &targets);

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(json).unwrap()).unwrap();
        assert_eq!(value["camera_index"], 1);
        assert_eq!(value["frame_width"], 50);
        assert_eq!(value["target_fps"], 15);
        assert_eq!(value["total_frames"], 3);
        assert!(value["recording_date"].is_string());
        assert!(value.get("video_file").is_none());
        assert!(value["coordinates"][0]["timestamp"].is_number());
    }

    #[test]
    fn test_camera_source_carries_index_and_fps() {
        let (_tx, rx) = unbounded();
        let opened = Arc::new(Mutex::new(None));
        let camera = ScriptedCamera {
            count: 0,
            script: vec![],
            sender: None,
            opened: opened.clone(),
        };
        let mut uc = LiveSessionUseCase::new(
            Box::new(camera),
            LandmarkExtractor::new(Box::new(WidthDetector), 3).unwrap(),
            Box::new(NullTrackingLogger),
            rx,
            config(false),
        );

        uc.execute(&ExportTargets::default()).unwrap();

        assert_eq!(
            *opened.lock().unwrap(),
            Some(FrameSource::Camera {
                index: 1,
                target_fps: 15
            })
        );
    }

    #[test]
    fn test_closed_action_channel_keeps_running() {
        let (tx, rx) = unbounded::<SessionAction>();
        drop(tx);
        let camera = ScriptedCamera {
            count: 3,
            script: vec![],
            sender: None,
            opened: Arc::new(Mutex::new(None)),
        };
        let mut uc = LiveSessionUseCase::new(
            Box::new(camera),
            LandmarkExtractor::new(Box::new(WidthDetector), 3).unwrap(),
            Box::new(NullTrackingLogger),
            rx,
            config(true),
        );

        let report = uc.execute(&ExportTargets::default()).unwrap();
        assert_eq!(report.frames_captured, 3);
    }

    #[test]
    fn test_timestamp_excludes_detection_time() {
        let (_tx, rx) = unbounded();
        let camera = ScriptedCamera {
            count: 1,
            script: vec![],
            sender: None,
            opened: Arc::new(Mutex::new(None)),
        };
        let delay = std::time::Duration::from_millis(200);
        let mut uc = LiveSessionUseCase::new(
            Box::new(camera),
            LandmarkExtractor::new(Box::new(SlowDetector { delay }), 3).unwrap(),
            Box::new(NullTrackingLogger),
            rx,
            config(true),
        );

        let report = uc.execute(&ExportTargets::default()).unwrap();

        let timestamp = report.session.unwrap().detections[0].timestamp.unwrap();
        assert!(timestamp < delay.as_secs_f64(), "timestamp {timestamp}");
    }

    #[test]
    fn test_camera_open_failure_names_device() {
        let (_tx, rx) = unbounded();
        let mut uc = LiveSessionUseCase::new(
            Box::new(NoCamera),
            LandmarkExtractor::new(Box::new(WidthDetector), 3).unwrap(),
            Box::new(NullTrackingLogger),
            rx,
            config(false),
        );

        let err = uc.execute(&ExportTargets::default()).unwrap_err();
        assert!(err.to_string().contains("camera 1"));
        assert!(err.to_string().contains("device busy"));
    }
}
