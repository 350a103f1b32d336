//! ---
//! gait_section: "09-testing"
//! gait_subsection: "integration-tests"
//! gait_type: "source"
//! gait_scope: "code"
//! gait_description: "Producer to viewer scenarios across the whole workspace."
//! gait_version: "v0.1.0"
//! gait_owner: "tbd"
//! ---
use std::io::Write;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;
use gait_common::{GaitConfig, ReplayPolicy};
use gait_kinematics::{Point2D, Segment, TimestepRecord, Vec3};
use gait_logging::LogContext;
use gait_msg::{Publisher, PublisherOptions, Subscriber, SubscriberOptions};
use gait_playback::{PlaybackDriver, StopReason};
use gait_render::RecordingSurface;
use gait_replay::{Recording, ReplayFeed, StreamFeed, TrialSelector};
use tempfile::Builder;

fn close(a: Point2D, b: Point2D) -> bool {
    a.distance(b) < 1e-6
}

#[tokio::test]
async fn streamed_records_are_drawn_until_producer_closes() -> Result<()> {
    gait_logging::init();
    let config = GaitConfig::from_str(
        r#"
        [stream]
        framing = "topic"
        topic = "gait"
        subscribe_prefix = "gait"
        recv_timeout_ms = 2000

        [playback]
        samples_per_second = 500
        "#,
    )?;
    let publisher = Publisher::bind(
        "127.0.0.1:0",
        PublisherOptions::from_config(&config.stream),
        LogContext::for_role("producer"),
    )
    .await?;
    let address = publisher.local_addr().to_string();
    let subscriber =
        Subscriber::connect(&address, SubscriberOptions::from_config(&config.stream)).await?;
    for _ in 0..200 {
        if publisher.subscriber_count() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(publisher.subscriber_count(), 1);

    let producer = tokio::spawn(async move {
        let sent = publisher
            .stream(vec![TimestepRecord::default(); 6], Duration::from_millis(2))
            .await;
        publisher.shutdown().await;
        sent
    });

    let driver = PlaybackDriver::from_config(&config, LogContext::for_role("viewer"))?;
    let mut feed = StreamFeed::new(subscriber, LogContext::for_role("viewer"));
    let mut surface = RecordingSurface::new();
    let summary = driver.run(&mut feed, &mut surface).await?;

    assert_eq!(producer.await?, 6);
    assert_eq!(summary.frames_drawn, 6);
    assert_eq!(summary.stop_reason, StopReason::Closed);
    assert!(summary.stop_reason.is_clean());
    assert_eq!(feed.received(), 6);
    assert_eq!(feed.rejected(), 0);

    // Default skeleton: anchors one segment above the canvas centre.
    let frame = surface.last_frame().expect("a frame");
    assert_eq!(frame.len(), 5);
    assert!(close(frame[0].0, Point2D::new(310.0, 170.0)));
    assert!(close(frame[1].1, Point2D::new(310.0, 310.0)));
    assert!(close(frame[3].1, Point2D::new(330.0, 310.0)));
    Ok(())
}

#[tokio::test]
async fn silent_producer_times_out_the_viewer() -> Result<()> {
    let config = GaitConfig::from_str(
        r#"
        [stream]
        recv_timeout_ms = 50
        "#,
    )?;
    let publisher = Publisher::bind(
        "127.0.0.1:0",
        PublisherOptions::from_config(&config.stream),
        LogContext::for_role("producer"),
    )
    .await?;
    let subscriber = Subscriber::connect(
        &publisher.local_addr().to_string(),
        SubscriberOptions::from_config(&config.stream),
    )
    .await?;

    let driver = PlaybackDriver::from_config(&config, LogContext::for_role("viewer"))?;
    let mut feed = StreamFeed::new(subscriber, LogContext::for_role("viewer"));
    let mut surface = RecordingSurface::new();
    let summary = driver.run(&mut feed, &mut surface).await?;

    assert_eq!(summary.frames_drawn, 0);
    assert_eq!(summary.stop_reason, StopReason::TimedOut);
    assert!(summary.stop_reason.is_clean());
    publisher.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn csv_replay_in_position_mode_skips_degenerate_rows() -> Result<()> {
    let mut file = Builder::new().suffix(".csv").tempfile()?;
    let header: Vec<String> = (0..24).map(|i| format!("c{i}")).collect();
    writeln!(file, "{}", header.join(","))?;
    // Six columns per segment: right shank, right thigh, left shank, left thigh.
    let shank = "0,4,0,0,0,0";
    let thigh = "0,0,0,0,0,0";
    let reachable = [shank, thigh, shank, thigh].join(",");
    writeln!(file, "{reachable}")?;
    writeln!(file, "{}", ["1,1,0,0,0,0"; 4].join(","))?;
    writeln!(file, "{reachable}")?;
    file.flush()?;

    let config = GaitConfig::from_str(
        r#"
        [reconstruction]
        mode = "position"
        on_geometry_error = "skip"

        [playback]
        samples_per_second = 500
        "#,
    )?;
    let recording = Recording::from_path(
        file.path(),
        &config.input,
        &TrialSelector::default(),
    )?;
    assert_eq!(recording.len(), 3);
    assert_eq!(recording.records()[0].get(Segment::RightThigh), Vec3::ZERO);

    let driver = PlaybackDriver::from_config(&config, LogContext::for_role("viewer"))?;
    let mut feed = ReplayFeed::new(recording, ReplayPolicy::Stop);
    let mut surface = RecordingSurface::new();
    let summary = driver.run(&mut feed, &mut surface).await?;

    assert_eq!(summary.frames_drawn, 2);
    assert_eq!(summary.frames_skipped, 1);
    assert_eq!(summary.stop_reason, StopReason::Exhausted);

    let frame = surface.last_frame().expect("a frame");
    let (thigh, knee) = frame[0];
    let (_, tip) = frame[1];
    assert!(close(thigh, Point2D::new(320.0, 240.0)));
    assert!(close(tip, Point2D::new(320.0, 310.0)));
    assert!((thigh.distance(knee) - 70.0).abs() < 1e-6);
    assert!((knee.distance(tip) - 70.0).abs() < 1e-6);
    Ok(())
}
