//! ---
//! gait_section: "05-replay"
//! gait_subsection: "module"
//! gait_type: "source"
//! gait_scope: "code"
//! gait_description: "Record feeds consumed by the playback driver."
//! gait_version: "v0.1.0"
//! gait_owner: "tbd"
//! ---
//! File replay and the live stream look the same to playback: a
//! [`RecordFeed`] yields samples until it ends, then reports why.
use std::fmt;

use async_trait::async_trait;
use gait_common::ReplayPolicy;
use gait_kinematics::TimestepRecord;
use gait_logging::{gait_debug, gait_warn, LogContext};
use gait_msg::{decode, Delivery, Subscriber};

use crate::recording::Recording;

/// One record and, for time-stamped sources, its sample time in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedSample {
    pub record: TimestepRecord,
    pub timestamp: Option<f64>,
}

/// Why a feed stopped yielding samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEnd {
    /// A stop-policy replay reached its last record.
    Exhausted,
    /// The producer stayed silent for the whole receive timeout.
    TimedOut,
    /// The producer closed the channel.
    Closed,
    /// The channel failed; the message is for the logs.
    Failed(String),
}

impl fmt::Display for FeedEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedEnd::Exhausted => f.write_str("exhausted"),
            FeedEnd::TimedOut => f.write_str("timed out"),
            FeedEnd::Closed => f.write_str("closed"),
            FeedEnd::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

#[async_trait]
pub trait RecordFeed: Send {
    /// Next sample, or `None` once the feed has ended.
    async fn next(&mut self) -> Option<FeedSample>;

    /// Set once `next` has returned `None`.
    fn end(&self) -> Option<&FeedEnd>;

    /// Human readable origin used in log context.
    fn describe(&self) -> String;
}

/// Replays a loaded [`Recording`].
#[derive(Debug, Clone)]
pub struct ReplayFeed {
    recording: Recording,
    cursor: usize,
    policy: ReplayPolicy,
    end: Option<FeedEnd>,
}

impl ReplayFeed {
    pub fn new(recording: Recording, policy: ReplayPolicy) -> Self {
        Self {
            recording,
            cursor: 0,
            policy,
            end: None,
        }
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    fn advance(&mut self) -> Option<FeedSample> {
        if self.cursor >= self.recording.len() {
            match self.policy {
                ReplayPolicy::Loop if !self.recording.is_empty() => self.cursor = 0,
                _ => {
                    self.end = Some(FeedEnd::Exhausted);
                    return None;
                }
            }
        }
        let index = self.cursor;
        self.cursor += 1;
        Some(FeedSample {
            record: self.recording.records()[index],
            timestamp: self.recording.timestamp(index),
        })
    }
}

#[async_trait]
impl RecordFeed for ReplayFeed {
    async fn next(&mut self) -> Option<FeedSample> {
        self.advance()
    }

    fn end(&self) -> Option<&FeedEnd> {
        self.end.as_ref()
    }

    fn describe(&self) -> String {
        self.recording.name().to_string()
    }
}

/// Live records from a [`Subscriber`]. Undecodable messages are logged and
/// skipped; a timeout or closed channel ends the feed.
pub struct StreamFeed {
    subscriber: Subscriber,
    context: LogContext,
    received: u64,
    rejected: u64,
    end: Option<FeedEnd>,
}

impl StreamFeed {
    pub fn new(subscriber: Subscriber, context: LogContext) -> Self {
        let context = context.with_source(subscriber.peer().to_string());
        Self {
            subscriber,
            context,
            received: 0,
            rejected: 0,
            end: None,
        }
    }

    pub fn received(&self) -> u64 {
        self.received
    }

    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    fn finish(&mut self, end: FeedEnd) -> Option<FeedSample> {
        gait_debug!(context = self.context, "stream feed ended: {}", end);
        self.end = Some(end);
        None
    }
}

#[async_trait]
impl RecordFeed for StreamFeed {
    async fn next(&mut self) -> Option<FeedSample> {
        if self.end.is_some() {
            return None;
        }
        loop {
            match self.subscriber.recv().await {
                Ok(Delivery::Payload(payload)) => match decode(&payload) {
                    Ok(record) => {
                        self.received += 1;
                        return Some(FeedSample {
                            record,
                            timestamp: None,
                        });
                    }
                    Err(err) => {
                        self.rejected += 1;
                        gait_warn!(
                            context = self.context.clone().with_frame(self.received),
                            "dropping undecodable message: {}",
                            err
                        );
                    }
                },
                Ok(Delivery::Rejected(err)) => {
                    self.rejected += 1;
                    gait_warn!(
                        context = self.context.clone().with_frame(self.received),
                        "dropping malformed frame: {}",
                        err
                    );
                }
                Ok(Delivery::TimedOut) => return self.finish(FeedEnd::TimedOut),
                Ok(Delivery::Closed) => return self.finish(FeedEnd::Closed),
                Err(err) => return self.finish(FeedEnd::Failed(err.to_string())),
            }
        }
    }

    fn end(&self) -> Option<&FeedEnd> {
        self.end.as_ref()
    }

    fn describe(&self) -> String {
        self.subscriber.peer().to_string()
    }
}
