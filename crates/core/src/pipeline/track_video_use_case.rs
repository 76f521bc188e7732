use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::annotation::domain::frame_annotator::FrameAnnotator;
use crate::detection::domain::landmark_extractor::LandmarkExtractor;
use crate::export::domain::export_metadata::{BatchExportInfo, ExportMetadata, ExportTargets};
use crate::shared::frame::scaled_dimensions;
use crate::shared::video_metadata::{FrameSource, VideoMetadata};
use crate::tracking::domain::tracking_session::TrackingSession;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;

use super::session_finalizer::{finalize_session, FinalizeOptions, SessionReport};
use super::tracking_config::TrackingConfig;
use super::tracking_logger::TrackingLogger;

/// Annotated copy of the sampled frames, written next to the exports.
pub struct AnnotatedOutput {
    pub path: PathBuf,
    pub writer: Box<dyn VideoWriter>,
    pub annotator: Box<dyn FrameAnnotator>,
}

#[derive(Debug)]
pub struct TrackVideoReport {
    pub metadata: VideoMetadata,
    pub frames_captured: usize,
    pub frames_sampled: usize,
    /// Sampled frames the detector failed on.
    pub frames_skipped: usize,
    pub cancelled: bool,
    pub session: SessionReport,
}

/// Tracks the mouth landmark through a video file.
///
/// Reads every frame, analyses every `stride`-th one at the configured
/// width, then trims, analyses and exports the trajectory. End of file,
/// a read error and cancellation all finish through the same path.
pub struct TrackVideoUseCase {
    reader: Box<dyn VideoReader>,
    extractor: LandmarkExtractor,
    output: Option<AnnotatedOutput>,
    logger: Box<dyn TrackingLogger>,
    config: TrackingConfig,
    cancelled: Arc<AtomicBool>,
}

impl TrackVideoUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        extractor: LandmarkExtractor,
        output: Option<AnnotatedOutput>,
        logger: Box<dyn TrackingLogger>,
        config: TrackingConfig,
        cancelled: Option<Arc<AtomicBool>>,
    ) -> Self {
        Self {
            reader,
            extractor,
            output,
            logger,
            config,
            cancelled: cancelled.unwrap_or_else(|| Arc::new(AtomicBool::new(false))),
        }
    }

    pub fn execute(
        &mut self,
        video: &Path,
        targets: &ExportTargets,
    ) -> Result<TrackVideoReport, Box<dyn std::error::Error>> {
        self.config.validate()?;
        let stride = self.config.stride;

        let metadata = self.reader.open(&FrameSource::File(video.to_path_buf()))?;
        let mut session = match TrackingSession::batch(metadata.total_frames, stride) {
            Ok(session) => session,
            Err(e) => {
                self.reader.close();
                return Err(e.into());
            }
        };

        if let Some(output) = self.output.as_mut() {
            let (width, height) =
                scaled_dimensions(metadata.width, metadata.height, self.config.analysis_width);
            let fps = metadata.fps_or_default() as f64 / stride as f64;
            if let Err(e) = output.writer.open(&output.path, width, height, fps) {
                self.reader.close();
                return Err(e);
            }
            self.logger.info(&format!(
                "Saving annotated video to: {}",
                output.path.display()
            ));
        }

        self.logger.info(&format!(
            "Processing {} frames (every {stride} frame(s))...",
            metadata.total_frames
        ));

        let Self {
            reader,
            extractor,
            output,
            logger,
            config,
            cancelled: cancel_flag,
        } = self;

        let total = metadata.total_frames;
        let mut cancelled = false;
        let mut writing = output.is_some();

        for item in reader.frames() {
            if cancel_flag.load(Ordering::Relaxed) {
                logger.info("User interrupted processing.");
                cancelled = true;
                break;
            }
            let frame = match item {
                Ok(frame) => frame,
                Err(e) => {
                    log::warn!(
                        "stopping after frame {}: could not read next frame: {e}",
                        session.captured()
                    );
                    break;
                }
            };

            if let Some(mut sample) = session.capture(frame) {
                sample.image = sample.image.resize_to_width(config.analysis_width);

                let detect_start = Instant::now();
                let extraction = extractor.extract(&sample);
                logger.timing("detect", elapsed_ms(detect_start));

                session.record(&sample, extraction.points(), Instant::now());

                if let (true, Some(out)) = (writing, output.as_mut()) {
                    let write_start = Instant::now();
                    let written = out
                        .annotator
                        .annotate(&mut sample.image, extraction.faces())
                        .and_then(|()| out.writer.write(&sample.image));
                    if let Err(e) = written {
                        log::error!("annotated video output stopped: {e}");
                        writing = false;
                    }
                    logger.timing("annotate", elapsed_ms(write_start));
                }
            }

            logger.progress(session.captured(), total, session.buffer().len());
        }

        reader.close();
        if let Some(out) = output.as_mut() {
            if let Err(e) = out.writer.close() {
                log::error!("could not finish annotated video: {e}");
            }
        }

        let frames_captured = session.captured();
        let frames_sampled = session.sampled();
        let buffer = session.finish();
        logger.info(&format!(
            "Video processing complete. Processed {frames_captured} frames, detected {} mouth positions.",
            buffer.len()
        ));

        let export_metadata = ExportMetadata::Batch(BatchExportInfo {
            video_file: video.display().to_string(),
            total_frames: metadata.total_frames,
            frames_processed: frames_captured,
            skip_frames: stride,
        });
        let options = FinalizeOptions {
            median_window: config.median_window,
            frames_processed: frames_captured,
            fps: Some(metadata.fps_or_default() as f64),
            targets,
            metadata: &export_metadata,
        };
        let report = finalize_session(buffer, &options, logger.as_mut())?;
        logger.summary();

        Ok(TrackVideoReport {
            metadata,
            frames_captured,
            frames_sampled,
            frames_skipped: extractor.skipped(),
            cancelled,
            session: report,
        })
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
