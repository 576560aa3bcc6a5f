use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};

use watchpost_core::alerting::domain::alert_notifier::AlertNotifier;
use watchpost_core::alerting::infrastructure::jpeg_evidence_encoder::JpegEvidenceEncoder;
use watchpost_core::alerting::infrastructure::smtp_mail_transport::{
    SmtpCredentials, SmtpMailTransport,
};
use watchpost_core::alerting::infrastructure::threaded_alert_dispatcher::ThreadedAlertDispatcher;
use watchpost_core::detection::infrastructure::onnx_yolo_detector::OnnxYoloDetector;
use watchpost_core::events::domain::event_log_store::EventLogStore;
use watchpost_core::events::domain::event_report::EventReport;
use watchpost_core::events::infrastructure::csv_event_log::CsvEventLog;
use watchpost_core::motion::infrastructure::background_difference_gate::BackgroundDifferenceGate;
use watchpost_core::session::monitor_session::MonitorSession;
use watchpost_core::session::session_logger::LogSessionLogger;
use watchpost_core::session::settings::MonitorSettings;
use watchpost_core::shared::constants::{DEFAULT_EVENT_LOG_PATH, YOLO_MODEL_NAME};
use watchpost_core::shared::model_resolver::{self, ModelLocation};
use watchpost_core::video::domain::frame_source::FrameSource;
use watchpost_core::video::infrastructure::ffmpeg_frame_source::FfmpegFrameSource;

/// Motion-gated person detection with email alerts.
#[derive(Parser)]
#[command(name = "watchpost", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Monitor a camera or video file. Type `q` + Enter or press Ctrl-C to stop.
    Watch(WatchArgs),
    /// Print the motion episodes recorded in an event log.
    Report(ReportArgs),
}

#[derive(Args)]
#[command(group(
    clap::ArgGroup::new("source").required(true).args(["device", "input"])
))]
struct WatchArgs {
    /// Capture device, e.g. /dev/video0.
    #[arg(long)]
    device: Option<String>,

    /// Recorded video file to monitor instead of a camera.
    #[arg(long)]
    input: Option<PathBuf>,

    /// JSON settings file (defaults to the platform config directory).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Event log CSV written at shutdown.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Seconds of continuous detection before alerting.
    #[arg(long)]
    confirm_delay: Option<f64>,

    /// Seconds without detection before another alert may fire.
    #[arg(long)]
    cooldown: Option<f64>,

    /// Per-pixel difference threshold (0-255).
    #[arg(long)]
    threshold: Option<u8>,

    /// Minimum motion blob area in pixels.
    #[arg(long)]
    min_area: Option<u32>,

    /// Gaussian blur kernel size (must be odd).
    #[arg(long)]
    blur_kernel: Option<usize>,

    /// Person detection confidence threshold (0.0-1.0).
    #[arg(long)]
    confidence: Option<f64>,

    /// Frames discarded before capturing the background.
    #[arg(long)]
    warmup_frames: Option<usize>,

    /// Seconds to wait for in-flight alerts on shutdown.
    #[arg(long)]
    shutdown_grace: Option<f64>,

    /// Use this ONNX model instead of resolving one.
    #[arg(long)]
    model: Option<PathBuf>,

    /// Directory searched for a bundled model.
    #[arg(long)]
    models_dir: Option<PathBuf>,

    /// URL the model is downloaded from when not found locally.
    #[arg(long)]
    model_url: Option<String>,

    #[arg(long)]
    smtp_host: Option<String>,

    /// Sender address, also used as the SMTP login.
    #[arg(long, env = "WATCHPOST_SMTP_USER")]
    smtp_user: Option<String>,

    #[arg(long, env = "WATCHPOST_SMTP_PASSWORD", hide_env_values = true)]
    smtp_password: Option<String>,

    /// Alert recipient address.
    #[arg(long, env = "WATCHPOST_ALERT_RECIPIENT")]
    alert_to: Option<String>,
}

impl WatchArgs {
    fn settings_overrides(&self) -> MonitorSettings {
        MonitorSettings {
            confirm_delay_secs: self.confirm_delay,
            cooldown_secs: self.cooldown,
            diff_threshold: self.threshold,
            min_motion_area: self.min_area,
            blur_kernel: self.blur_kernel,
            dilate_iterations: None,
            confidence: self.confidence,
            warmup_frames: self.warmup_frames,
            shutdown_grace_secs: self.shutdown_grace,
            output: self.output.clone(),
            smtp_host: self.smtp_host.clone(),
            model_url: self.model_url.clone(),
        }
    }
}

#[derive(Args)]
struct ReportArgs {
    /// Event log CSV to read.
    #[arg(default_value = DEFAULT_EVENT_LOG_PATH)]
    path: PathBuf,
}

fn main() {
    env_logger::init();
    load_env_file(Path::new(".env"));

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Watch(args) => run_watch(args),
        Command::Report(args) => run_report(&args.path),
    };
    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run_watch(args: WatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut settings =
        MonitorSettings::load_or_default(args.config.as_deref())?.merge(args.settings_overrides());
    // Recorded files need no settling time.
    if args.input.is_some() && settings.warmup_frames.is_none() {
        settings.warmup_frames = Some(0);
    }
    let config = settings.to_session_config()?;

    let credentials = SmtpCredentials::new(
        args.smtp_user.as_deref().unwrap_or_default(),
        args.smtp_password.as_deref().unwrap_or_default(),
        args.alert_to.as_deref().unwrap_or_default(),
    )?;
    let transport = SmtpMailTransport::new(settings.smtp_host(), credentials)?;
    let notifier = AlertNotifier::new(
        Box::new(JpegEvidenceEncoder::default()),
        Box::new(transport),
    );

    log::info!("Resolving model: {YOLO_MODEL_NAME}");
    let model_path = model_resolver::resolve(
        &ModelLocation {
            name: YOLO_MODEL_NAME,
            explicit: args.model.as_deref(),
            bundled_dir: args.models_dir.as_deref(),
            url: settings.model_url.as_deref(),
        },
        Some(Box::new(download_progress)),
    )?;
    let detector = OnnxYoloDetector::new(&model_path)?;

    let source: Box<dyn FrameSource> = match (&args.device, &args.input) {
        (Some(device), _) => Box::new(FfmpegFrameSource::open_device(device)?),
        (None, Some(input)) => {
            if !input.exists() {
                return Err(format!("Input file not found: {}", input.display()).into());
            }
            Box::new(FfmpegFrameSource::open_file(input)?)
        }
        (None, None) => return Err("Either --device or --input is required".into()),
    };

    install_quit_handlers(config.cancelled.clone())?;

    let output = settings.output_path();
    println!("Monitoring started. Type 'q' + Enter or press Ctrl-C to stop.");
    let report = MonitorSession::new(
        source,
        Box::new(BackgroundDifferenceGate::new(config.motion.clone())),
        Box::new(detector),
        Box::new(ThreadedAlertDispatcher::new(notifier)),
        Box::new(CsvEventLog::new(&output)),
        config,
    )
    .with_logger(Box::new(LogSessionLogger::default()))
    .run()?;

    println!("{report}");
    if !report.episodes.is_empty() {
        println!("Event log written to {}", output.display());
    }
    Ok(())
}

fn run_report(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let entries = CsvEventLog::new(path).load()?;
    println!("{}", EventReport::from_entries(&entries).render_table());
    Ok(())
}

/// Loads SMTP credentials from a `.env` file when one exists.
///
/// Variables already set in the process environment win.
fn load_env_file(path: &Path) {
    match dotenvy::from_path(path) {
        Ok(()) => log::debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => log::warn!("Ignoring {}: {e}", path.display()),
    }
}

/// Stops the session on Ctrl-C or on a `q` line from stdin.
fn install_quit_handlers(cancelled: Arc<AtomicBool>) -> Result<(), Box<dyn std::error::Error>> {
    let on_signal = cancelled.clone();
    ctrlc::set_handler(move || on_signal.store(true, Ordering::Relaxed))?;

    std::thread::Builder::new()
        .name("stdin-quit".into())
        .spawn(move || {
            // EOF on stdin (e.g. running detached) leaves Ctrl-C as the only way out.
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(l) if l.trim().eq_ignore_ascii_case("q") => {
                        log::info!("Quit requested");
                        cancelled.store(true, Ordering::Relaxed);
                        return;
                    }
                    Ok(_) => {}
                    Err(_) => return,
                }
            }
        })?;
    Ok(())
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading detection model... {pct}%");
    } else {
        eprint!("\rDownloading detection model... {downloaded} bytes");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_watch_requires_a_source() {
        assert!(Cli::try_parse_from(["watchpost", "watch"]).is_err());
        assert!(
            Cli::try_parse_from(["watchpost", "watch", "--device", "/dev/video0", "--input", "a.mp4"])
                .is_err()
        );
    }

    #[test]
    fn test_watch_flags_become_overrides() {
        let cli = Cli::try_parse_from([
            "watchpost",
            "watch",
            "--input",
            "clip.mp4",
            "--cooldown",
            "30",
            "--min-area",
            "800",
        ])
        .unwrap();
        let Command::Watch(args) = cli.command else {
            panic!("expected watch");
        };
        let overrides = args.settings_overrides();
        assert_eq!(overrides.cooldown_secs, Some(30.0));
        assert_eq!(overrides.min_motion_area, Some(800));
        assert_eq!(overrides.confidence, None);
    }

    #[test]
    fn test_env_file_supplies_credentials_without_overriding() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(
            &path,
            "WATCHPOST_ENV_FILE_TEST_RECIPIENT=alerts@example.com\nPATH=/overridden\n",
        )
        .unwrap();
        let original_path = std::env::var("PATH").ok();

        load_env_file(&path);

        assert_eq!(
            std::env::var("WATCHPOST_ENV_FILE_TEST_RECIPIENT").unwrap(),
            "alerts@example.com"
        );
        assert_eq!(std::env::var("PATH").ok(), original_path);
    }

    #[test]
    fn test_missing_env_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        load_env_file(&dir.path().join(".env"));
    }

    #[test]
    fn test_report_defaults_to_times_csv() {
        let cli = Cli::try_parse_from(["watchpost", "report"]).unwrap();
        let Command::Report(args) = cli.command else {
            panic!("expected report");
        };
        assert_eq!(args.path, PathBuf::from(DEFAULT_EVENT_LOG_PATH));
    }
}
