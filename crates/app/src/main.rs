use clap::{Parser, Subcommand};
use std::sync::atomic::Ordering;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::MakeWriterExt;

use auricle_app::pipeline;
use auricle_app::spotter::ThresholdSpotter;
use auricle_app::xcorr::XcorrEstimator;
use auricle_audio::{CaptureConfig, EpochWindow, MicArrayCapture, SlidingWindow};
use auricle_detect::{EnergyConfig, EnergySpeechDetector};
use auricle_doa::{ArrayTopology, DirectionFinder};
use auricle_foundation::{AppError, ShutdownToken};
use auricle_indicator::{IndicatorWorker, LogIndicator};

#[derive(Parser, Debug)]
#[command(name = "auricle", about = "Sound-source bearing tracker for microphone arrays")]
struct Cli {
    /// Array topology: pair2, square4, hex6p1, or circular8
    #[arg(long, default_value = "circular8")]
    topology: ArrayTopology,

    /// Capture sample rate in Hz
    #[arg(long, default_value_t = 16_000)]
    rate: u32,

    /// Preferred input device name (first exact-channel match otherwise)
    #[arg(long)]
    device: Option<String>,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Resolve a bearing for every captured block
    Track {
        #[arg(long, default_value_t = 250)]
        block_ms: u32,
    },
    /// Buffer recent blocks; resolve when the keyword spotter fires
    Keyword {
        #[arg(long, default_value_t = 10)]
        block_ms: u32,
        /// Length of the sliding history flushed on a trigger
        #[arg(long, default_value_t = 800)]
        window_ms: u32,
        /// Reference-channel level that counts as a detection
        #[arg(long, default_value_t = -35.0, allow_negative_numbers = true)]
        trigger_dbfs: f32,
    },
    /// Resolve once per epoch when enough blocks contain speech
    Vad {
        #[arg(long, default_value_t = 10)]
        block_ms: u32,
        /// Epoch length; an epoch resolves when more than half its blocks
        /// are classified as speech
        #[arg(long, default_value_t = 200)]
        epoch_ms: u32,
        /// Reference-channel level that counts as speech
        #[arg(long, default_value_t = -40.0, allow_negative_numbers = true)]
        onset_dbfs: f32,
    },
}

fn init_logging() -> anyhow::Result<()> {
    std::fs::create_dir_all("logs")?;
    let file_appender = RollingFileAppender::new(Rotation::DAILY, "logs", "auricle.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_writer(std::io::stdout.and(non_blocking_file))
        .with_env_filter(log_level)
        .init();
    std::mem::forget(guard);
    Ok(())
}

fn run(cli: Cli, shutdown: ShutdownToken) -> Result<usize, AppError> {
    let topology = cli.topology;

    let block_ms = match &cli.mode {
        Mode::Track { block_ms }
        | Mode::Keyword { block_ms, .. }
        | Mode::Vad { block_ms, .. } => *block_ms,
    };
    let block_frames = (cli.rate as u64 * block_ms as u64 / 1000) as usize;
    if block_frames == 0 {
        return Err(AppError::Config(format!(
            "{block_ms} ms blocks at {} Hz are empty",
            cli.rate
        )));
    }

    let config = CaptureConfig {
        sample_rate_hz: cli.rate,
        block_frames,
        device: cli.device.clone(),
    };
    let mut capture = MicArrayCapture::open(topology, &config)?;

    // Ctrl-C flips the token and injects the queue sentinel, so a consumer
    // blocked on an empty queue still terminates.
    let stop_handle = capture.stop_handle();
    let token = shutdown.clone();
    ctrlc::set_handler(move || {
        token.trigger();
        stop_handle.stop();
    })
    .map_err(|e| AppError::Signal(e.to_string()))?;

    let mut finder = DirectionFinder::new(topology, cli.rate, XcorrEstimator);
    let mut indicator = IndicatorWorker::spawn(LogIndicator)?;

    capture.start()?;
    tracing::info!(%topology, device = capture.device_name(), "pipeline started");

    let resolved = match cli.mode {
        Mode::Track { .. } => {
            pipeline::run_continuous(capture.blocks(), &mut finder, &mut indicator, &shutdown)
        }
        Mode::Keyword {
            block_ms,
            window_ms,
            trigger_dbfs,
        } => {
            let mut spotter = ThresholdSpotter::new(trigger_dbfs);
            let window_blocks = (window_ms / block_ms).max(1) as usize;
            let mut window = SlidingWindow::new(window_blocks);
            pipeline::run_triggered(
                capture.blocks(),
                &mut spotter,
                &mut window,
                &mut finder,
                &mut indicator,
                &shutdown,
            )
        }
        Mode::Vad {
            block_ms,
            epoch_ms,
            onset_dbfs,
        } => {
            let mut detector = EnergySpeechDetector::new(EnergyConfig { onset_dbfs });
            let epoch_blocks = (epoch_ms / block_ms).max(1) as usize;
            let mut window = EpochWindow::new(epoch_blocks, epoch_blocks / 2);
            pipeline::run_gated(
                capture.blocks(),
                &mut detector,
                &mut window,
                &mut finder,
                &mut indicator,
                &shutdown,
            )
        }
    };

    capture.stop();
    let stats = capture.stats();
    tracing::info!(
        resolved,
        captured = stats.blocks_captured.load(Ordering::Relaxed),
        dropped = stats.blocks_dropped.load(Ordering::Relaxed),
        "pipeline finished"
    );
    Ok(resolved)
}

fn main() -> anyhow::Result<()> {
    init_logging()?;
    let cli = Cli::parse();
    tracing::info!("Starting auricle");

    let shutdown = ShutdownToken::new();
    let resolved = run(cli, shutdown)?;

    tracing::info!(resolved, "auricle exiting");
    Ok(())
}
