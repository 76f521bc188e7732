use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use crossbeam_channel::Sender;

use tonguetrack_core::analysis::domain::periodicity::{summarize, PeriodicitySummary};
use tonguetrack_core::analysis::domain::track_statistics::TrackStatistics;
use tonguetrack_core::annotation::infrastructure::marker_annotator::MarkerAnnotator;
use tonguetrack_core::detection::domain::landmark_extractor::LandmarkExtractor;
use tonguetrack_core::detection::infrastructure::onnx_landmark_detector::{
    OnnxLandmarkDetector, DEFAULT_CONFIDENCE,
};
use tonguetrack_core::export::domain::export_metadata::ExportTargets;
use tonguetrack_core::export::infrastructure::track_loader::load_track;
use tonguetrack_core::pipeline::live_session_use_case::LiveSessionUseCase;
use tonguetrack_core::pipeline::session_finalizer::SessionReport;
use tonguetrack_core::pipeline::track_video_use_case::{AnnotatedOutput, TrackVideoUseCase};
use tonguetrack_core::pipeline::tracking_config::{LiveConfig, TrackingConfig};
use tonguetrack_core::pipeline::tracking_logger::StdoutTrackingLogger;
use tonguetrack_core::shared::constants::{
    DEFAULT_ANALYSIS_WIDTH, DEFAULT_CAMERA_WIDTH, DEFAULT_MEDIAN_WINDOW, DEFAULT_TARGET_FPS,
    MOUTH_LANDMARK_INDEX, PROGRESS_EVERY_FRAMES, STATUS_EVERY_FRAMES, VIDEO_EXTENSIONS,
};
use tonguetrack_core::tracking::domain::recording_controller::SessionAction;
use tonguetrack_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use tonguetrack_core::video::infrastructure::ffmpeg_writer::FfmpegWriter;

/// Mouth landmark tracking for videos and live camera feeds.
#[derive(Parser)]
#[command(name = "tonguetrack")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Track the mouth through a video file.
    Video(VideoArgs),
    /// Track the mouth live from a camera.
    Webcam(WebcamArgs),
    /// Track every video in a directory.
    Batch(BatchArgs),
    /// Print statistics and periodicity for an exported track.
    Analyze(AnalyzeArgs),
}

#[derive(Args)]
struct DetectorArgs {
    /// Path to the face landmark ONNX model.
    #[arg(short = 'p', long = "shape-predictor")]
    model: PathBuf,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_CONFIDENCE)]
    confidence: f64,

    /// Median filter window for post-processing (positive odd integer).
    #[arg(long, default_value_t = DEFAULT_MEDIAN_WINDOW)]
    median_window: usize,
}

#[derive(Args)]
struct VideoArgs {
    #[command(flatten)]
    detector: DetectorArgs,

    /// Input video file.
    #[arg(short = 'v', long)]
    video: PathBuf,

    /// Analyse every Nth frame (1 = every frame).
    #[arg(long, default_value_t = 1)]
    skip_frames: usize,

    /// Suppress periodic progress output.
    #[arg(long)]
    no_display: bool,

    /// Export coordinates to this CSV file.
    #[arg(long)]
    export_csv: Option<PathBuf>,

    /// Export coordinates and metadata to this JSON file.
    #[arg(long)]
    export_json: Option<PathBuf>,

    /// Write annotated sampled frames to this video file.
    #[arg(long)]
    output_video: Option<PathBuf>,

    /// Width frames are resized to before detection.
    #[arg(long, default_value_t = DEFAULT_ANALYSIS_WIDTH)]
    width: u32,
}

#[derive(Args)]
struct WebcamArgs {
    #[command(flatten)]
    detector: DetectorArgs,

    /// Camera device index.
    #[arg(short = 'c', long, default_value_t = 0)]
    camera: u32,

    /// Width frames are resized to before detection.
    #[arg(short = 'w', long, default_value_t = DEFAULT_CAMERA_WIDTH)]
    width: u32,

    /// Requested camera frame rate.
    #[arg(long, default_value_t = DEFAULT_TARGET_FPS)]
    fps: u32,

    /// Start recording immediately instead of paused.
    #[arg(short = 'r', long)]
    record: bool,

    /// Export coordinates to this CSV file.
    #[arg(long)]
    export_csv: Option<PathBuf>,

    /// Export coordinates and metadata to this JSON file.
    #[arg(long)]
    export_json: Option<PathBuf>,
}

#[derive(Args)]
struct BatchArgs {
    #[command(flatten)]
    detector: DetectorArgs,

    /// Directory containing the input videos.
    #[arg(long, default_value = "./videos")]
    input_dir: PathBuf,

    /// Directory receiving one result folder per video.
    #[arg(long, default_value = "./results")]
    output_dir: PathBuf,

    /// Analyse every Nth frame.
    #[arg(long, default_value_t = 2)]
    skip_frames: usize,
}

#[derive(Args)]
struct AnalyzeArgs {
    /// A JSON or CSV export.
    input: PathBuf,

    /// Median filter window (positive odd integer).
    #[arg(long, default_value_t = DEFAULT_MEDIAN_WINDOW)]
    median_window: usize,

    /// Source frame rate, for reporting the motion frequency.
    #[arg(long)]
    fps: Option<f64>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    match Cli::parse().command {
        Command::Video(args) => run_video(args),
        Command::Webcam(args) => run_webcam(args),
        Command::Batch(args) => run_batch(args),
        Command::Analyze(args) => run_analyze(args),
    }
}

fn run_video(args: VideoArgs) -> Result<(), Box<dyn std::error::Error>> {
    validate_detector(&args.detector)?;
    if !args.video.exists() {
        return Err(format!("Video file not found: {}", args.video.display()).into());
    }
    let config = TrackingConfig {
        stride: args.skip_frames,
        analysis_width: args.width,
        median_window: args.detector.median_window,
    };
    config.validate()?;

    let targets = ExportTargets {
        csv: args.export_csv,
        json: args.export_json,
    };
    if targets.is_empty() {
        log::warn!("No --export-csv or --export-json given; results will not be saved");
    }

    let cancelled = Arc::new(AtomicBool::new(false));
    spawn_cancel_listener(cancelled.clone());

    let report = track_video(
        &args.video,
        &args.detector,
        config,
        &targets,
        args.output_video,
        !args.no_display,
        Some(cancelled),
    )?;
    check_exports(&report)
}

/// Builds and runs one batch tracking pass over `video`.
fn track_video(
    video: &Path,
    detector: &DetectorArgs,
    config: TrackingConfig,
    targets: &ExportTargets,
    output_video: Option<PathBuf>,
    show_progress: bool,
    cancelled: Option<Arc<AtomicBool>>,
) -> Result<SessionReport, Box<dyn std::error::Error>> {
    let extractor = build_extractor(detector)?;
    let output = output_video.map(|path| AnnotatedOutput {
        path,
        writer: Box::new(FfmpegWriter::new()),
        annotator: Box::new(MarkerAnnotator::new(MOUTH_LANDMARK_INDEX)),
    });
    let logger = StdoutTrackingLogger::new(PROGRESS_EVERY_FRAMES);
    let logger = if show_progress { logger } else { logger.quiet() };

    let mut use_case = TrackVideoUseCase::new(
        Box::new(FfmpegReader::new()),
        extractor,
        output,
        Box::new(logger),
        config,
        cancelled,
    );
    let report = use_case.execute(video, targets)?;
    log::info!(
        "Processed {} frames ({} analysed, {} skipped by the detector)",
        report.frames_captured,
        report.frames_sampled,
        report.frames_skipped
    );
    Ok(report.session)
}

fn run_webcam(args: WebcamArgs) -> Result<(), Box<dyn std::error::Error>> {
    validate_detector(&args.detector)?;
    let config = LiveConfig {
        camera_index: args.camera,
        width: args.width,
        target_fps: args.fps,
        start_recording: args.record,
        status_every: STATUS_EVERY_FRAMES,
        median_window: args.detector.median_window,
    };
    config.validate()?;

    let targets = ExportTargets {
        csv: args.export_csv,
        json: args.export_json,
    };
    let extractor = build_extractor(&args.detector)?;

    let (sender, receiver) = crossbeam_channel::unbounded();
    spawn_key_listener(sender);

    let mut use_case = LiveSessionUseCase::new(
        Box::new(FfmpegReader::new()),
        extractor,
        Box::new(StdoutTrackingLogger::new(PROGRESS_EVERY_FRAMES)),
        receiver,
        config,
    );
    let report = use_case.execute(&targets)?;

    // An empty session was already reported by the use case.
    match report.session {
        Some(session) => check_exports(&session),
        None => Ok(()),
    }
}

fn run_batch(args: BatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    validate_detector(&args.detector)?;
    let config = TrackingConfig {
        stride: args.skip_frames,
        analysis_width: DEFAULT_ANALYSIS_WIDTH,
        median_window: args.detector.median_window,
    };
    config.validate()?;

    let videos = find_videos(&args.input_dir)?;
    if videos.is_empty() {
        return Err(format!("No video files found in {}", args.input_dir.display()).into());
    }
    log::info!("Found {} videos to process", videos.len());

    let mut successes = 0;
    for (i, video) in videos.iter().enumerate() {
        log::info!("[{}/{}] Processing {}", i + 1, videos.len(), video.display());
        let (dir, targets, annotated) = batch_outputs(&args.output_dir, video);
        if let Err(e) = std::fs::create_dir_all(&dir) {
            log::error!("Could not create {}: {e}", dir.display());
            continue;
        }

        let result = track_video(
            video,
            &args.detector,
            config.clone(),
            &targets,
            Some(annotated),
            false,
            None,
        )
        .and_then(|report| check_exports(&report));
        match result {
            Ok(()) => successes += 1,
            Err(e) => log::error!("Failed to process {}: {e}", video.display()),
        }
    }

    println!(
        "Successfully processed {successes}/{} videos",
        videos.len()
    );
    println!("Results saved to: {}", args.output_dir.display());
    Ok(())
}

fn run_analyze(args: AnalyzeArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !args.input.exists() {
        return Err(format!("Input file not found: {}", args.input.display()).into());
    }
    let track = load_track(&args.input)?;
    let summary = summarize(&track.detections, args.median_window)?;
    let statistics = TrackStatistics::compute(&track.detections, track.frames_processed)?;

    print!(
        "{}",
        render_analysis(&statistics, &summary, args.fps.or(track.fps))
    );
    Ok(())
}

fn render_analysis(
    stats: &TrackStatistics,
    summary: &PeriodicitySummary,
    fps: Option<f64>,
) -> String {
    let mut out = String::new();
    out.push_str(&format!("Total detections: {}\n", stats.count));
    if let Some(rate) = stats.detection_rate {
        out.push_str(&format!("Detection rate: {:.1}%\n", rate * 100.0));
    }
    for (axis, s) in [("X", &stats.x), ("Y", &stats.y)] {
        out.push_str(&format!(
            "{axis}: mean {:.2}  std {:.2}  min {:.2}  max {:.2}  range {:.2}\n",
            s.mean, s.std_dev, s.min, s.max, s.range
        ));
    }
    if let Some(v) = stats.velocity {
        out.push_str(&format!(
            "Velocity: mean {:.2}  max {:.2} px/detection\n",
            v.mean, v.max
        ));
    }
    if !summary.normalization_applied {
        out.push_str("Normalization skipped: x coordinates sum to zero\n");
    }
    out.push_str(&format!(
        "Peaks: {} at frames {:?}\n",
        summary.peak_indices.len(),
        summary.peak_frames()
    ));
    if let Some(period) = summary.period {
        out.push_str(&format!(
            "Mean peak interval: {:.1} frames over {} cycles",
            period.mean_interval_frames, period.cycles
        ));
        if let Some(hz) = fps.and_then(|fps| period.frequency_hz(fps)) {
            out.push_str(&format!(" ({hz:.2} Hz)"));
        }
        out.push('\n');
    }
    out
}

fn build_extractor(args: &DetectorArgs) -> Result<LandmarkExtractor, Box<dyn std::error::Error>> {
    log::info!("Loading landmark model: {}", args.model.display());
    let detector = OnnxLandmarkDetector::new(&args.model, args.confidence)?;
    Ok(LandmarkExtractor::new(
        Box::new(detector),
        MOUTH_LANDMARK_INDEX,
    )?)
}

fn validate_detector(args: &DetectorArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !args.model.exists() {
        return Err(format!("Model file not found: {}", args.model.display()).into());
    }
    if !(0.0..=1.0).contains(&args.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            args.confidence
        )
        .into());
    }
    Ok(())
}

/// Fails when any export target could not be written.
fn check_exports(report: &SessionReport) -> Result<(), Box<dyn std::error::Error>> {
    for (path, result) in &report.exports {
        if result.is_ok() {
            log::info!("Data exported to: {}", path.display());
        }
    }
    match report.failed_exports() {
        0 => Ok(()),
        n => Err(format!("{n} export(s) failed").into()),
    }
}

/// Video files directly inside `dir`, sorted by name.
fn find_videos(dir: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    if !dir.is_dir() {
        return Err(format!("Input directory not found: {}", dir.display()).into());
    }
    let mut videos = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_video(&path) {
            videos.push(path);
        }
    }
    videos.sort();
    Ok(videos)
}

fn is_video(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// `<output>/<stem>/` plus the CSV, JSON and annotated video paths inside it.
fn batch_outputs(output_dir: &Path, video: &Path) -> (PathBuf, ExportTargets, PathBuf) {
    let stem = video
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string());
    let dir = output_dir.join(&stem);
    let targets = ExportTargets {
        csv: Some(dir.join(format!("{stem}.csv"))),
        json: Some(dir.join(format!("{stem}.json"))),
    };
    let annotated = dir.join(format!("{stem}_annotated.avi"));
    (dir, targets, annotated)
}

/// Maps stdin lines to session actions. End of input quits the session.
fn spawn_key_listener(sender: Sender<SessionAction>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            for action in line.chars().filter_map(SessionAction::from_key) {
                if sender.send(action).is_err() {
                    return;
                }
            }
        }
        let _ = sender.send(SessionAction::Quit);
    });
}

/// Sets `flag` when `q` is entered on stdin.
fn spawn_cancel_listener(flag: Arc<AtomicBool>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().eq_ignore_ascii_case("q") {
                flag.store(true, Ordering::Relaxed);
                break;
            }
        }
    });
}
