//! ---
//! gait_section: "05-replay"
//! gait_subsection: "module"
//! gait_type: "source"
//! gait_scope: "code"
//! gait_description: "Recorded and live record sources."
//! gait_version: "v0.1.0"
//! gait_owner: "tbd"
//! ---
//! Loaders for tabular and hierarchical recordings, and the [`RecordFeed`]
//! implementations that hand records to playback.

pub mod error;
pub mod feed;
pub mod recording;
pub mod tabular;
pub mod trial_store;

pub use error::SourceError;
pub use feed::{FeedEnd, FeedSample, RecordFeed, ReplayFeed, StreamFeed};
pub use recording::{Recording, TrialSelector};
pub use trial_store::{Trial, TrialStore};
