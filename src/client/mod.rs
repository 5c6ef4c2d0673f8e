//! The `client` module defines the broker's view of one live connection.
//!
//! A `Client` carries the sending half of the connection's outbound queue. Only
//! the broker holds it once the client is registered, so every write to a
//! socket originates from the broker.

pub mod pubsub_client;
pub use pubsub_client::{Client, ClientId};

#[cfg(test)]
mod tests;
