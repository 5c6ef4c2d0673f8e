//! Error types shared across the hub.
//!
//! `HubError` covers failures surfaced to callers of the broker handle and the
//! server entry points. `DecodeError` is produced by the client reader when an
//! inbound frame cannot be turned into a typed message; it never leaves the
//! reader except as a log line.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HubError {
    /// The broker task has stopped and can no longer accept commands.
    #[error("broker is not running")]
    BrokerClosed,

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum DecodeError {
    /// The frame is not a `{ "type", "message" }` envelope.
    #[error("malformed envelope: {0}")]
    Envelope(#[source] serde_json::Error),

    /// The envelope type is known but its message body does not match it.
    #[error("malformed {kind} message: {source}")]
    Payload {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
