//! Commands accepted by the broker's inbox.

use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use tokio::sync::oneshot;

use super::snapshot::Snapshot;
use crate::client::{Client, ClientId};
use crate::transport::message::{ClientMessage, ServerMessage};

pub enum Command {
    /// A connection finished its upgrade. `reader`, when present, is spawned
    /// by the broker once the client is in the registry.
    RegisterClient {
        client: Client,
        reader: Option<BoxFuture<'static, ()>>,
    },
    /// The client's reader saw its connection fail or close.
    DeregisterClient(ClientId),
    /// A decoded message from a client.
    ClientEvent {
        client_id: ClientId,
        received_at: DateTime<Utc>,
        message: ClientMessage,
    },
    /// A frame arrived from the client but carried nothing to act on.
    Touch {
        client_id: ClientId,
        received_at: DateTime<Utc>,
    },
    /// Fan `envelope` out to every subscriber of `topic`.
    Broadcast {
        topic: String,
        envelope: ServerMessage,
    },
    /// Reply with a copy of broker state.
    Snapshot(oneshot::Sender<Snapshot>),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::RegisterClient { .. } => "register_client",
            Command::DeregisterClient(_) => "deregister_client",
            Command::ClientEvent { .. } => "client_event",
            Command::Touch { .. } => "touch",
            Command::Broadcast { .. } => "broadcast",
            Command::Snapshot(_) => "snapshot",
        }
    }
}
