//! The broker: single-owner coordination of clients, topics and tracks.
//!
//! - `engine`: the broker task and its command handling
//! - `handle`: the cloneable sender everything else uses to reach it
//! - `message`: the inbox command set
//! - `snapshot`: disjoint copies of broker state for debug and export
//! - `topic`, `track`: the state the broker owns

pub mod engine;
pub mod handle;
pub mod message;
pub mod snapshot;
pub mod topic;
pub mod track;

pub use engine::Broker;
pub use handle::BrokerHandle;
pub use snapshot::Snapshot;
