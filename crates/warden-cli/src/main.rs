use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use image::ImageFormat;
use std::path::{Path, PathBuf};
use warden_core::labels::split_label;
use warden_core::{
    EnrollmentReport, FaceEncoder, KnownSet, LoopExit, OnnxEncoder, RecognitionLoop, SourceStatus,
};
use warden_hw::{Bell, Camera};

mod config;
mod logging;
mod viewer;

use config::Config;
use viewer::TerminalViewer;

#[derive(Parser)]
#[command(
    name = "warden",
    version,
    about = "Face-based threat identification from a live camera"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode every face image in the threat and non-threat directories
    Enroll {
        /// Directory of threat images [env: WARDEN_THREAT_DIR]
        #[arg(long)]
        threat_dir: Option<PathBuf>,
        /// Directory of non-threat images [env: WARDEN_NON_THREAT_DIR]
        #[arg(long)]
        non_threat_dir: Option<PathBuf>,
        /// Enrollment file to write [env: WARDEN_KNOWN_SET]
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Identify faces on the camera in real time
    Watch {
        /// Enrollment file to match against [env: WARDEN_KNOWN_SET]
        #[arg(short, long)]
        known_set: Option<PathBuf>,
        /// Capture device index, /dev/video{N} [env: WARDEN_CAMERA_INDEX]
        #[arg(short, long)]
        device: Option<u32>,
        /// Also write the latest annotated frame to this image file
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },
    /// List enrolled labels
    List {
        /// Enrollment file to read [env: WARDEN_KNOWN_SET]
        #[arg(short, long)]
        known_set: Option<PathBuf>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// List V4L2 capture devices
    Devices,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command {
        Commands::Enroll {
            threat_dir,
            non_threat_dir,
            output,
        } => {
            logging::init_stderr();
            let threat_dir = threat_dir.unwrap_or_else(|| config.threat_dir.clone());
            let non_threat_dir = non_threat_dir.unwrap_or_else(|| config.non_threat_dir.clone());
            let output = output.unwrap_or_else(|| config.known_set.clone());
            run_enroll(&config, threat_dir, non_threat_dir, &output)
        }
        Commands::Watch {
            known_set,
            device,
            snapshot,
        } => {
            let _log_guard = logging::init_file(&config.log_dir)?;
            let known_set = known_set.unwrap_or_else(|| config.known_set.clone());
            let device = device.unwrap_or(config.camera_index);
            run_watch(&config, &known_set, device, snapshot)
        }
        Commands::List { known_set, json } => {
            logging::init_stderr();
            let known_set = known_set.unwrap_or_else(|| config.known_set.clone());
            run_list(&known_set, json)
        }
        Commands::Devices => {
            logging::init_stderr();
            run_devices();
            Ok(())
        }
    }
}

fn load_encoder(config: &Config) -> Result<OnnxEncoder> {
    OnnxEncoder::load(&config.scrfd_model_path(), &config.arcface_model_path()).with_context(
        || {
            format!(
                "failed to load face models from {} (set WARDEN_MODEL_DIR)",
                config.model_dir.display()
            )
        },
    )
}

fn load_known_set(path: &Path) -> Result<KnownSet> {
    KnownSet::load(path).with_context(|| format!("failed to load known set {}", path.display()))
}

fn run_enroll(
    config: &Config,
    threat_dir: PathBuf,
    non_threat_dir: PathBuf,
    output: &Path,
) -> Result<()> {
    let mut encoder = load_encoder(config)?;
    let report = warden_core::enroll(&[threat_dir, non_threat_dir], &mut encoder);

    print!("{}", enrollment_summary(&report));
    if report.known.is_empty() {
        tracing::warn!("no faces enrolled; watch will report every face as unknown");
    }

    report
        .known
        .save(output)
        .with_context(|| format!("failed to write known set {}", output.display()))?;
    println!(
        "saved {} encoding(s) to {}",
        report.known.len(),
        output.display()
    );
    Ok(())
}

fn enrollment_summary(report: &EnrollmentReport) -> String {
    let mut out = String::new();
    for source in &report.sources {
        let status = match &source.status {
            SourceStatus::Scanned => format!(
                "{} enrolled, {} without a face, {} failed",
                source.enrolled(),
                source.no_face(),
                source.failed()
            ),
            SourceStatus::Missing => "missing".to_string(),
            SourceStatus::Empty => "empty".to_string(),
            SourceStatus::Unreadable(reason) => format!("unreadable ({reason})"),
        };
        out.push_str(&format!(
            "{} [{}]: {}\n",
            source.dir.display(),
            source.category,
            status
        ));
    }
    out
}

fn run_watch(
    config: &Config,
    known_set: &Path,
    device: u32,
    snapshot: Option<PathBuf>,
) -> Result<()> {
    if let Some(path) = &snapshot {
        if ImageFormat::from_path(path).is_err() {
            bail!(
                "cannot infer an image format from snapshot path {}",
                path.display()
            );
        }
    }

    let known = load_known_set(known_set)?;
    if known.is_empty() {
        tracing::warn!(
            path = %known_set.display(),
            "known set is empty; every face will be unknown"
        );
    }

    let encoder = load_encoder(config)?;
    check_model_tags(known.encoder.as_deref(), encoder.model_version());

    let camera = Camera::open_index(device)
        .with_context(|| format!("failed to open camera /dev/video{device}"))?;
    let mut stream = camera.stream().context("failed to start capture")?;
    let bell = Bell::terminal(config.alarm_frequency_hz, config.alarm_duration());

    let mut viewer = TerminalViewer::open(known.len(), snapshot).context("failed to start viewer")?;
    let mut session = RecognitionLoop::new(&known, encoder, bell);
    let outcome = session.run(&mut stream, &mut viewer);
    // Restore the terminal before printing anything.
    drop(viewer);

    match outcome.context("recognition stopped")? {
        LoopExit::ExitRequested { frames } => println!("stopped after {frames} frame(s)"),
        LoopExit::EndOfStream { frames } => {
            println!("camera stopped delivering frames after {frames} frame(s)")
        }
    }
    Ok(())
}

/// Warn when the enrolled embeddings may not be comparable with the running
/// model. Returns whether a warning was logged.
fn check_model_tags(enrolled: Option<&str>, current: Option<&str>) -> bool {
    match (enrolled, current) {
        (Some(enrolled), Some(current)) if enrolled == current => false,
        (Some(enrolled), Some(current)) => {
            tracing::warn!(enrolled, current, "known set was enrolled with a different model");
            true
        }
        (enrolled, current) => {
            tracing::warn!(?enrolled, ?current, "cannot confirm the known set's model");
            true
        }
    }
}

fn run_list(path: &Path, json: bool) -> Result<()> {
    let known = load_known_set(path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&known_set_json(&known))?);
        return Ok(());
    }

    if known.is_empty() {
        println!("No faces enrolled");
        return Ok(());
    }
    for (i, label) in known.labels().enumerate() {
        println!("{i:>4}  {label}");
    }
    println!(
        "{} encoding(s), created {}{}",
        known.len(),
        known.created_at,
        known
            .encoder
            .as_deref()
            .map(|e| format!(", model {e}"))
            .unwrap_or_default()
    );
    Ok(())
}

fn known_set_json(known: &KnownSet) -> serde_json::Value {
    let faces: Vec<serde_json::Value> = known
        .labels()
        .enumerate()
        .map(|(index, label)| {
            let (name, tag) = split_label(label);
            serde_json::json!({
                "index": index,
                "label": label,
                "name": name,
                "tag": tag,
            })
        })
        .collect();

    serde_json::json!({
        "created_at": known.created_at,
        "encoder": known.encoder,
        "count": known.len(),
        "faces": faces,
    })
}

fn run_devices() {
    let devices = Camera::list_devices();
    if devices.is_empty() {
        println!("No V4L2 capture devices found");
        return;
    }
    for d in devices {
        println!("{:>2}  {}  {} ({}, {})", d.index, d.path, d.name, d.driver, d.bus);
    }
}
