//! ---
//! gait_section: "02-messaging"
//! gait_subsection: "module"
//! gait_type: "source"
//! gait_scope: "code"
//! gait_description: "Record codec and producer/consumer stream channel."
//! gait_version: "v0.1.0"
//! gait_owner: "tbd"
//! ---
//! Wire format and transport shared by the producer and the viewer.

pub mod codec;
pub mod framing;
pub mod transport;

pub use codec::{decode, encode, DecodeError, RECORD_SIZE};
pub use framing::{matches_prefix, FrameFormat};
pub use transport::{
    endpoint, Delivery, Publisher, PublisherOptions, Subscriber, SubscriberOptions,
    TransportError, MAX_FRAME_LEN,
};
