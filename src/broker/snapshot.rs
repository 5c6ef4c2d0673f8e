//! Point-in-time copies of broker state.
//!
//! A `Snapshot` shares nothing with the live broker, so callers may read or
//! serialize it at leisure while the broker keeps running.

use std::collections::BTreeMap;
use std::fmt::Write;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use super::track::Position;
use crate::client::ClientId;

/// A client without its connection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientSummary {
    pub id: ClientId,
    pub last_message_time: DateTime<Utc>,
    pub user_agent: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Snapshot {
    pub clients: Vec<ClientSummary>,
    pub tracks: BTreeMap<String, Vec<Position>>,
    pub bus_button_count: u64,
}

impl Snapshot {
    pub fn position_count(&self) -> usize {
        self.tracks.values().map(Vec::len).sum()
    }

    /// Plain-text summary served by the debug endpoint.
    pub fn debug_report(&self) -> String {
        let mut out = String::from("broker debug\n\n");
        // writing to a String cannot fail
        let _ = writeln!(out, "{} tracks", self.tracks.len());
        let _ = writeln!(out, "{} positions", self.position_count());
        let _ = writeln!(out, "{} bus buttons\n", self.bus_button_count);
        let _ = writeln!(out, "{} clients:", self.clients.len());
        for client in &self.clients {
            let _ = writeln!(
                out,
                "{}\t{}",
                client
                    .last_message_time
                    .to_rfc3339_opts(SecondsFormat::Secs, true),
                client.user_agent
            );
        }
        out
    }
}
