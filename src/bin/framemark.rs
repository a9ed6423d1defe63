use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DECODE_BATCH: usize = 64;

#[derive(Parser, Debug)]
#[command(name = "framemark", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Auto-track a point through a clip and print its keyframes as JSON
    /// (requires `ffmpeg`/`ffprobe` on PATH).
    Track(TrackArgs),
    /// Import a package into a canvas of another size and write it back out.
    Rescale(RescaleArgs),
    /// Print which annotations of a package are visible at a time.
    Visibility(VisibilityArgs),
}

#[derive(Parser, Debug)]
struct TrackArgs {
    /// Input video.
    #[arg(long)]
    video: PathBuf,

    /// Start point X, display pixels.
    #[arg(long)]
    x: f64,

    /// Start point Y, display pixels.
    #[arg(long)]
    y: f64,

    /// First second to track.
    #[arg(long, default_value_t = 0.0)]
    start: f64,

    /// Last second to track.
    #[arg(long)]
    end: f64,

    /// Display width (defaults to the native width).
    #[arg(long)]
    display_w: Option<u32>,

    /// Display height (defaults to the native height).
    #[arg(long)]
    display_h: Option<u32>,

    /// Detector and tracker options, JSON.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct RescaleArgs {
    /// Input package JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Target canvas width.
    #[arg(long)]
    width: u32,

    /// Target canvas height.
    #[arg(long)]
    height: u32,

    /// Output package JSON.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct VisibilityArgs {
    /// Input package JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Playback time in seconds.
    #[arg(long)]
    time: f64,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct Config {
    detector: framemark::DetectorConfig,
    tracker: framemark::TrackerOpts,
}

#[derive(serde::Serialize)]
struct TrackReport<'a> {
    id: &'a str,
    status: &'static str,
    last_confidence: Option<f64>,
    keyframes: &'a [framemark::TrackPoint],
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "framemark=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Track(args) => cmd_track(args),
        Command::Rescale(args) => cmd_rescale(args),
        Command::Visibility(args) => cmd_visibility(args),
    }
}

fn read_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let f = File::open(path).with_context(|| format!("open config '{}'", path.display()))?;
    let cfg: Config = serde_json::from_reader(BufReader::new(f))
        .with_context(|| format!("parse config '{}'", path.display()))?;
    Ok(cfg)
}

fn session_for(
    canvas: framemark::Canvas,
    tracker: framemark::TrackerCoordinator,
) -> framemark::AnnotationSession {
    framemark::AnnotationSession::new(canvas, tracker, framemark::SessionServices::default())
}

fn cmd_track(args: TrackArgs) -> anyhow::Result<()> {
    anyhow::ensure!(args.end > args.start, "--end must be after --start");
    let cfg = read_config(args.config.as_deref())?;
    let info = framemark::probe_video(&args.video)?;
    let native = info.canvas();
    let display = framemark::Canvas::new(
        args.display_w.unwrap_or(native.width),
        args.display_h.unwrap_or(native.height),
    )?;

    let opts = framemark::TrackerOpts {
        dispatch: framemark::Dispatch::Inline,
        ..cfg.tracker
    };
    let mut tracker = framemark::TrackerCoordinator::new(opts);
    if cfg.detector.model_path.is_some() {
        let mut detector = framemark::ObjectDetector::new(cfg.detector);
        if !detector.initialize() {
            tracing::warn!("detector unavailable; falling back to color matching");
        }
        tracker.set_detector(Arc::new(Mutex::new(detector)));
    }

    let mut session = session_for(display, tracker);
    session.set_video(native)?;
    let gesture = framemark::Gesture::from_points(vec![framemark::Point::new(args.x, args.y)]);
    let id = session.create(
        framemark::ToolType::PlayerTracker,
        &gesture,
        args.start,
        args.end,
        None,
    )?;

    let times = framemark::frame_times(args.start, args.end, info.fps());
    anyhow::ensure!(!times.is_empty(), "no frames between --start and --end");
    let mut enabled = false;
    for chunk in times.chunks(DECODE_BATCH) {
        let frames = framemark::decode_frames(&info, chunk[0], chunk.len() as u32)
            .with_context(|| format!("decode frames at {:.3}s", chunk[0]))?;
        for (&t, frame) in chunk.iter().zip(&frames) {
            if !enabled {
                enabled = session.enable_auto_tracking(&id, frame, t);
            }
            session.tick(t, Some(frame));
        }
    }

    let tracker = session.tracker();
    let report = TrackReport {
        id: &id,
        status: tracker.status(&id).label(),
        last_confidence: tracker.last_confidence(&id),
        keyframes: tracker.keyframes(&id).unwrap_or_default(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn cmd_rescale(args: RescaleArgs) -> anyhow::Result<()> {
    let pkg = framemark::read_package(&args.in_path)?;
    let target = framemark::Canvas::new(args.width, args.height)?;
    let mut session = session_for(target, framemark::TrackerCoordinator::default());
    let n = session.import_package(pkg)?;

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    framemark::write_package(&args.out, &session.export_package()?)?;
    eprintln!("wrote {} ({n} annotations)", args.out.display());
    Ok(())
}

fn cmd_visibility(args: VisibilityArgs) -> anyhow::Result<()> {
    let pkg = framemark::read_package(&args.in_path)?;
    let mut session =
        session_for(pkg.source_dimensions, framemark::TrackerCoordinator::default());
    session.import_package(pkg)?;

    for p in session.tick(args.time, None) {
        println!("{}\t{}\t{:.3}", p.id, p.visible, p.opacity);
    }
    Ok(())
}
