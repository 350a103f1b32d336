//! ---
//! gait_section: "08-binaries"
//! gait_subsection: "binary"
//! gait_type: "source"
//! gait_scope: "code"
//! gait_description: "Producer entrypoint publishing recorded leg data."
//! gait_version: "v0.1.0"
//! gait_owner: "tbd"
//! ---
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use gait_common::{init_tracing, Framing, GaitConfig};
use gait_logging::{log_session_event, LogContext, SessionOutcome};
use gait_msg::{endpoint, Publisher, PublisherOptions};
use gait_replay::{Recording, TrialSelector};
use tokio::signal;
use tracing::info;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliFraming {
    Raw,
    Topic,
}

impl From<CliFraming> for Framing {
    fn from(value: CliFraming) -> Self {
        match value {
            CliFraming::Raw => Framing::Raw,
            CliFraming::Topic => Framing::Topic,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about = "Publish recorded leg data over TCP", long_about = None)]
struct Cli {
    /// Address to bind, e.g. 127.0.0.1
    host: String,

    /// Port to bind
    port: u16,

    #[arg(long, value_name = "FILE", help = "Path to configuration file")]
    config: Option<PathBuf>,

    /// Recording to publish (.csv or .json trial store)
    #[arg(long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Records published per second
    #[arg(long)]
    rate: Option<u32>,

    #[arg(long, value_enum)]
    framing: Option<CliFraming>,

    /// Day group of a trial store (first day when omitted)
    #[arg(long)]
    day: Option<String>,

    /// Trial group of a trial store (first trial when omitted)
    #[arg(long)]
    trial: Option<String>,

    /// Hold publishing until a subscriber has connected
    #[arg(long)]
    wait_for_subscriber: bool,
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

    if let Some(rate) = cli.rate {
        config.stream.samples_per_second = rate;
    }
    if let Some(framing) = cli.framing {
        config.stream.framing = framing.into();
    }
    if let Some(input) = &cli.input {
        config.input.path = input.clone();
    }
    config.validate()?;
    init_tracing("gait-server", &config.logging)?;
    if let Some(source) = &loaded.source {
        info!(config_path = %source.display(), "configuration loaded");
    }

    let selector = TrialSelector {
        day: cli.day.clone(),
        trial: cli.trial.clone(),
    };
    let recording = Recording::from_path(&config.input.path, &config.input, &selector)
        .with_context(|| format!("failed to load {}", config.input.path.display()))?;
    info!(
        source = recording.name(),
        records = recording.len(),
        "recording loaded"
    );

    let address = endpoint(&cli.host, cli.port);
    let context = LogContext::for_role("producer");
    let publisher = Publisher::bind(
        &address,
        PublisherOptions::from_config(&config.stream),
        context.clone(),
    )
    .await?;
    let context = context.with_source(format!("tcp://{}", publisher.local_addr()));

    let interval = config.stream.publish_interval();
    let total = recording.len();
    let sent = tokio::select! {
        sent = publish(&publisher, recording, interval, cli.wait_for_subscriber) => Some(sent),
        result = signal::ctrl_c() => {
            result.context("failed to listen for ctrl-c")?;
            None
        }
    };
    publisher.shutdown().await;

    let message = match sent {
        Some(sent) => format!("published {sent} of {total} record(s)"),
        None => "interrupted".to_string(),
    };
    log_session_event(
        Some(&context.with_frame(sent.unwrap_or_default())),
        "producer.stopped",
        &message,
        SessionOutcome::Success,
    );
    Ok(())
}

async fn publish(
    publisher: &Publisher,
    recording: Recording,
    interval: Duration,
    wait_for_subscriber: bool,
) -> u64 {
    if wait_for_subscriber {
        info!("waiting for a subscriber");
        while publisher.subscriber_count() == 0 {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
    publisher.stream(recording.into_records(), interval).await
}
