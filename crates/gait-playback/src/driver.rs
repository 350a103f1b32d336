//! ---
//! gait_section: "07-playback"
//! gait_subsection: "module"
//! gait_type: "source"
//! gait_scope: "code"
//! gait_description: "Per-frame playback loop."
//! gait_version: "v0.1.0"
//! gait_owner: "tbd"
//! ---
use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use gait_common::{GaitConfig, GeometryPolicy, JitterSummary, LoopTimingReporter, PacingMode};
use gait_kinematics::{GeometryError, LegPose, LegSide, Reconstruct, Reconstructor, Skeleton};
use gait_logging::{gait_debug, gait_info, gait_warn, log_session_event, LogContext, SessionOutcome};
use gait_render::RenderSurface;
use gait_replay::{FeedEnd, RecordFeed};
use serde::Serialize;

use crate::pacing::Pacer;

#[derive(Debug, Clone)]
pub struct PlaybackOptions {
    pub pacing: PacingMode,
    pub frame_interval: Duration,
    pub on_geometry_error: GeometryPolicy,
}

impl PlaybackOptions {
    pub fn from_config(config: &GaitConfig) -> Self {
        Self {
            pacing: config.playback.pacing,
            frame_interval: config.playback.frame_interval(),
            on_geometry_error: config.reconstruction.on_geometry_error,
        }
    }
}

/// Why playback ended.
#[derive(Debug, Clone, PartialEq)]
pub enum StopReason {
    Exhausted,
    TimedOut,
    Closed,
    QuitRequested,
    ChannelFailed(String),
    GeometryAborted { side: LegSide, error: GeometryError },
}

impl StopReason {
    fn from_feed(end: Option<&FeedEnd>) -> Self {
        match end {
            Some(FeedEnd::Exhausted) | None => StopReason::Exhausted,
            Some(FeedEnd::TimedOut) => StopReason::TimedOut,
            Some(FeedEnd::Closed) => StopReason::Closed,
            Some(FeedEnd::Failed(reason)) => StopReason::ChannelFailed(reason.clone()),
        }
    }

    /// True for the ways a session is meant to end.
    pub fn is_clean(&self) -> bool {
        !matches!(
            self,
            StopReason::ChannelFailed(_) | StopReason::GeometryAborted { .. }
        )
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Exhausted => f.write_str("feed exhausted"),
            StopReason::TimedOut => f.write_str("producer timed out"),
            StopReason::Closed => f.write_str("producer closed the channel"),
            StopReason::QuitRequested => f.write_str("quit requested"),
            StopReason::ChannelFailed(reason) => write!(f, "channel failed: {reason}"),
            StopReason::GeometryAborted { side, error } => {
                write!(f, "{} leg geometry error: {error}", side.as_str())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackSummary {
    pub frames_drawn: u64,
    pub frames_skipped: u64,
    #[serde(serialize_with = "serialize_display")]
    pub stop_reason: StopReason,
    pub jitter: Option<JitterSummary>,
}

fn serialize_display<S: serde::Serializer>(value: &StopReason, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// Pulls records from a feed, reconstructs both legs and draws them.
pub struct PlaybackDriver<R = Reconstructor> {
    skeleton: Skeleton,
    reconstructor: R,
    options: PlaybackOptions,
    context: LogContext,
}

impl PlaybackDriver<Reconstructor> {
    pub fn from_config(config: &GaitConfig, context: LogContext) -> Result<Self> {
        let reconstructor =
            Reconstructor::from_config(&config.reconstruction, &config.skeleton, &config.canvas)
                .context("invalid reconstruction settings")?;
        let skeleton = Skeleton::from_config(&config.skeleton, &config.canvas);
        Ok(Self::new(
            skeleton,
            reconstructor,
            PlaybackOptions::from_config(config),
            context,
        ))
    }
}

impl<R: Reconstruct> PlaybackDriver<R> {
    pub fn new(
        skeleton: Skeleton,
        reconstructor: R,
        options: PlaybackOptions,
        context: LogContext,
    ) -> Self {
        Self {
            skeleton,
            reconstructor,
            options,
            context,
        }
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    /// Run until the feed ends, the surface asks to quit, or a geometry
    /// error aborts playback. Surface failures are returned as errors.
    pub async fn run<F, S>(&self, feed: &mut F, surface: &mut S) -> Result<PlaybackSummary>
    where
        F: RecordFeed + ?Sized,
        S: RenderSurface + ?Sized,
    {
        let context = self.context.clone().with_source(feed.describe());
        gait_info!(
            context = context,
            "playback started with {} reconstruction",
            self.reconstructor.name()
        );
        let mut pacer = Pacer::new(self.options.pacing, self.options.frame_interval);
        let mut timing = LoopTimingReporter::new();
        let mut frame = 0u64;
        let mut drawn = 0u64;
        let mut skipped = 0u64;

        let stop_reason = loop {
            if surface.quit_requested()? {
                break StopReason::QuitRequested;
            }
            let Some(sample) = feed.next().await else {
                break StopReason::from_feed(feed.end());
            };
            let wait = pacer.wait_before(sample.timestamp);
            tokio::time::sleep(wait).await;
            timing.record_tick(wait);
            let frame_context = context.clone().with_frame(frame);
            frame += 1;

            match self
                .reconstructor
                .reconstruct_skeleton(&self.skeleton, &sample.record)
            {
                Ok(poses) => {
                    self.draw(surface, &poses)
                        .with_context(|| format!("failed to render frame {}", frame - 1))?;
                    drawn += 1;
                }
                Err((side, error)) => match self.options.on_geometry_error {
                    GeometryPolicy::Skip => {
                        gait_warn!(
                            context = frame_context.with_side(side.as_str()),
                            "skipping frame: {}",
                            error
                        );
                        skipped += 1;
                    }
                    GeometryPolicy::Abort => {
                        break StopReason::GeometryAborted { side, error };
                    }
                },
            }
        };

        let summary = PlaybackSummary {
            frames_drawn: drawn,
            frames_skipped: skipped,
            stop_reason,
            jitter: timing.histogram().summary(),
        };
        let outcome = if summary.stop_reason.is_clean() {
            SessionOutcome::Success
        } else {
            SessionOutcome::Fault
        };
        log_session_event(
            Some(&context.clone().with_frame(frame)),
            "playback.stopped",
            &format!(
                "{} after {} drawn / {} skipped frame(s)",
                summary.stop_reason, summary.frames_drawn, summary.frames_skipped
            ),
            outcome,
        );
        if let Some(jitter) = &summary.jitter {
            gait_debug!(
                context = context,
                "pacing jitter mean {:.1}us max {:.1}us over {} samples",
                jitter.mean_us,
                jitter.max_us,
                jitter.samples
            );
        }
        Ok(summary)
    }

    /// Clear, draw both legs then the anchor line, present.
    fn draw<S: RenderSurface + ?Sized>(&self, surface: &mut S, poses: &[LegPose; 2]) -> Result<()> {
        surface.clear()?;
        for pose in poses {
            for (from, to) in pose.segments() {
                surface.draw_segment(from, to)?;
            }
        }
        let (left, right) = self.skeleton.reference_line();
        surface.draw_segment(left, right)?;
        surface.present()
    }
}
