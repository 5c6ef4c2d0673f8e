//! Wire envelopes.
//!
//! Every frame, in either direction, is `{ "type": <kind>, "message": <body> }`.
//! Inbound frames are decoded in two steps (envelope, then body by kind) so a
//! bad body can be reported against the kind that carried it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::broker::track::Position;
use crate::eta::VehicleEta;
use crate::utils::error::DecodeError;

pub const ETA_TOPIC: &str = "eta";
pub const BUS_BUTTON_TOPIC: &str = "bus_button";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicRequest {
    pub topic: String,
}

/// A position as reported by a client. Any `time` field the client sends is
/// ignored; the server stamps its own.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PositionReport {
    pub latitude: f64,
    pub longitude: f64,
    /// Meters per second, when the device can measure it.
    pub speed: Option<f64>,
    pub heading: Option<f64>,
    /// Client-chosen UUID stitching samples into one track.
    pub track: String,
}

impl PositionReport {
    pub fn stamp(self, time: DateTime<Utc>) -> Position {
        Position {
            latitude: self.latitude,
            longitude: self.longitude,
            speed: self.speed,
            heading: self.heading,
            track: self.track,
            time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusButton {
    pub latitude: f64,
    pub longitude: f64,
}

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    Subscribe(TopicRequest),
    Unsubscribe(TopicRequest),
    Position(Position),
    BusButton(BusButton),
    /// A well-formed envelope whose `type` we don't know. Clients are
    /// untrusted, so this is expected from time to time.
    Unrecognized(String),
}

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    message: serde_json::Value,
}

impl ClientMessage {
    /// Decode one frame. Positions are stamped with `received_at`.
    pub fn decode(frame: &[u8], received_at: DateTime<Utc>) -> Result<Self, DecodeError> {
        let raw: RawEnvelope = serde_json::from_slice(frame).map_err(DecodeError::Envelope)?;

        let message = match raw.kind.as_str() {
            "subscribe" => ClientMessage::Subscribe(body("subscribe", raw.message)?),
            "unsubscribe" => ClientMessage::Unsubscribe(body("unsubscribe", raw.message)?),
            "position" => {
                let report: PositionReport = body("position", raw.message)?;
                ClientMessage::Position(report.stamp(received_at))
            }
            "bus_button" => ClientMessage::BusButton(body("bus_button", raw.message)?),
            _ => ClientMessage::Unrecognized(raw.kind),
        };
        Ok(message)
    }

    pub fn kind(&self) -> &str {
        match self {
            ClientMessage::Subscribe(_) => "subscribe",
            ClientMessage::Unsubscribe(_) => "unsubscribe",
            ClientMessage::Position(_) => "position",
            ClientMessage::BusButton(_) => "bus_button",
            ClientMessage::Unrecognized(kind) => kind,
        }
    }
}

fn body<T: serde::de::DeserializeOwned>(
    kind: &'static str,
    message: serde_json::Value,
) -> Result<T, DecodeError> {
    serde_json::from_value(message).map_err(|source| DecodeError::Payload { kind, source })
}

/// Frames the broker pushes to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message", rename_all = "snake_case")]
pub enum ServerMessage {
    Eta(VehicleEta),
    BusButton(BusButton),
}
