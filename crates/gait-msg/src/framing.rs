//! ---
//! gait_section: "02-messaging"
//! gait_subsection: "module"
//! gait_type: "source"
//! gait_scope: "code"
//! gait_description: "Raw and topic-prefixed channel frames."
//! gait_version: "v0.1.0"
//! gait_owner: "tbd"
//! ---
use bytes::{BufMut, Bytes, BytesMut};
use gait_common::{Framing, StreamConfig};

use crate::codec::DecodeError;

/// How a payload is laid out inside one channel frame.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FrameFormat {
    #[default]
    Raw,
    /// `TOPIC` followed by a single space and the payload.
    Topic(String),
}

impl FrameFormat {
    pub fn from_config(config: &StreamConfig) -> Self {
        match config.framing {
            Framing::Raw => FrameFormat::Raw,
            Framing::Topic => FrameFormat::Topic(config.topic.clone()),
        }
    }

    pub fn wrap(&self, payload: &[u8]) -> Bytes {
        match self {
            FrameFormat::Raw => Bytes::copy_from_slice(payload),
            FrameFormat::Topic(topic) => {
                let mut buf = BytesMut::with_capacity(topic.len() + 1 + payload.len());
                buf.put_slice(topic.as_bytes());
                buf.put_u8(b' ');
                buf.put_slice(payload);
                buf.freeze()
            }
        }
    }

    /// Strip the topic, if any, and hand back the payload.
    pub fn unwrap(&self, frame: Bytes) -> Result<Bytes, DecodeError> {
        match self {
            FrameFormat::Raw => Ok(frame),
            FrameFormat::Topic(topic) => {
                let header = topic.len() + 1;
                let matches = frame.len() >= header
                    && frame.starts_with(topic.as_bytes())
                    && frame[topic.len()] == b' ';
                if matches {
                    Ok(frame.slice(header..))
                } else {
                    Err(DecodeError::MissingTopic {
                        topic: topic.clone(),
                    })
                }
            }
        }
    }
}

/// Subscription filter over the whole frame. An empty prefix accepts all.
pub fn matches_prefix(frame: &[u8], prefix: &[u8]) -> bool {
    frame.starts_with(prefix)
}
