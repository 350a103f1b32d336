//! ---
//! gait_section: "08-binaries"
//! gait_subsection: "binary"
//! gait_type: "source"
//! gait_scope: "code"
//! gait_description: "Viewer entrypoint for live and recorded gait playback."
//! gait_version: "v0.1.0"
//! gait_owner: "tbd"
//! ---
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use gait_common::{init_tracing, GaitConfig, PacingMode, ReplayPolicy};
use gait_logging::LogContext;
use gait_msg::{endpoint, Subscriber, SubscriberOptions};
use gait_playback::{PlaybackDriver, PlaybackSummary};
use gait_render::{RecordingSurface, RenderSurface, TerminalSurface};
use gait_replay::{RecordFeed, Recording, ReplayFeed, StreamFeed, TrialSelector};
use tokio::signal;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(author, version, about = "Visualise lower-limb gait", long_about = None)]
struct Cli {
    #[arg(long, value_name = "FILE", help = "Path to configuration file")]
    config: Option<PathBuf>,

    /// Draw into memory instead of the terminal and print a JSON summary
    #[arg(long)]
    headless: bool,

    /// Write the pacing jitter summary as JSON once playback ends
    #[arg(long, value_name = "FILE")]
    jitter_report: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Render records received from a running producer")]
    Stream {
        /// Producer address
        host: String,
        /// Producer port
        port: u16,
    },
    #[command(about = "Render records from a .csv or .json recording")]
    Replay {
        file: PathBuf,
        /// Start over after the last record
        #[arg(long = "loop")]
        looped: bool,
        /// Pace frames by the recording's own timestamps
        #[arg(long)]
        timestamped: bool,
        #[arg(long)]
        day: Option<String>,
        #[arg(long)]
        trial: Option<String>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut candidates = Vec::new();
    if let Some(path) = &cli.config {
        candidates.push(path.clone());
    }
    candidates.push(PathBuf::from(GaitConfig::DEFAULT_PATH));
    let loaded = GaitConfig::load_with_source(&candidates)?;
    let mut config = loaded.config;

    if let Commands::Replay {
        looped, timestamped, ..
    } = &cli.command
    {
        if *looped {
            config.playback.replay = ReplayPolicy::Loop;
        }
        if *timestamped {
            config.playback.pacing = PacingMode::Timestamped;
        }
    }
    // Log lines would tear the terminal canvas.
    if !cli.headless {
        config.logging.stdout = false;
    }
    config.validate()?;
    init_tracing("gait-viz", &config.logging)?;
    if let Some(source) = &loaded.source {
        info!(config_path = %source.display(), "configuration loaded");
    }

    let context = LogContext::for_role("viewer");
    let driver = PlaybackDriver::from_config(&config, context.clone())?;
    let mut feed = open_feed(&cli.command, &config, context).await?;

    let summary = if cli.headless {
        let mut surface = RecordingSurface::new().retain_last(1);
        let quit = surface.quit_signal();
        tokio::spawn(async move {
            if signal::ctrl_c().await.is_ok() {
                quit.request();
            }
        });
        let summary = play(&driver, feed.as_mut(), &mut surface).await?;
        println!("{}", serde_json::to_string_pretty(&summary)?);
        summary
    } else {
        let title = format!(" gait: {} (q to quit) ", feed.describe());
        let mut surface = TerminalSurface::enter(&config.canvas, title)?;
        let result = play(&driver, feed.as_mut(), &mut surface).await;
        surface.restore()?;
        result?
    };

    if let Some(path) = &cli.jitter_report {
        match &summary.jitter {
            Some(jitter) => jitter
                .write_json(path)
                .with_context(|| format!("failed to write {}", path.display()))?,
            None => warn!("fewer than two frames were paced; no jitter report written"),
        }
    }

    if !summary.stop_reason.is_clean() {
        bail!("playback stopped: {}", summary.stop_reason);
    }
    Ok(())
}

async fn open_feed(
    command: &Commands,
    config: &GaitConfig,
    context: LogContext,
) -> Result<Box<dyn RecordFeed>> {
    match command {
        Commands::Stream { host, port } => {
            let address = endpoint(host, *port);
            let subscriber =
                Subscriber::connect(&address, SubscriberOptions::from_config(&config.stream))
                    .await?;
            info!(address = %address, "connected to producer");
            Ok(Box::new(StreamFeed::new(subscriber, context)))
        }
        Commands::Replay {
            file, day, trial, ..
        } => {
            let selector = TrialSelector {
                day: day.clone(),
                trial: trial.clone(),
            };
            let recording = Recording::from_path(file, &config.input, &selector)
                .with_context(|| format!("failed to load {}", file.display()))?;
            if config.playback.pacing == PacingMode::Timestamped && !recording.has_timestamps() {
                warn!(
                    source = recording.name(),
                    "recording has no timestamps; using the fixed frame interval"
                );
            }
            Ok(Box::new(ReplayFeed::new(recording, config.playback.replay)))
        }
    }
}

async fn play<S: RenderSurface>(
    driver: &PlaybackDriver,
    feed: &mut dyn RecordFeed,
    surface: &mut S,
) -> Result<PlaybackSummary> {
    let summary = driver.run(feed, surface).await?;
    info!(
        drawn = summary.frames_drawn,
        skipped = summary.frames_skipped,
        stop_reason = %summary.stop_reason,
        "playback finished"
    );
    Ok(summary)
}
