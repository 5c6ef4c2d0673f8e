//! Cloneable front door to the broker.
//!
//! Everything outside the broker task talks to it through a `BrokerHandle`.
//! Sends never block; they only fail once the broker task is gone.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use tokio::sync::{mpsc, oneshot};

use super::message::Command;
use super::snapshot::Snapshot;
use super::track::Position;
use crate::client::{Client, ClientId};
use crate::transport::message::{ClientMessage, ServerMessage};
use crate::utils::error::HubError;

#[derive(Debug, Clone)]
pub struct BrokerHandle {
    inbox: mpsc::UnboundedSender<Command>,
}

impl BrokerHandle {
    pub(crate) fn new(inbox: mpsc::UnboundedSender<Command>) -> Self {
        Self { inbox }
    }

    fn send(&self, command: Command) -> Result<(), HubError> {
        self.inbox.send(command).map_err(|_| HubError::BrokerClosed)
    }

    pub fn register_client(
        &self,
        client: Client,
        reader: Option<BoxFuture<'static, ()>>,
    ) -> Result<(), HubError> {
        self.send(Command::RegisterClient { client, reader })
    }

    pub fn deregister_client(&self, client_id: ClientId) -> Result<(), HubError> {
        self.send(Command::DeregisterClient(client_id))
    }

    pub fn client_event(
        &self,
        client_id: ClientId,
        received_at: DateTime<Utc>,
        message: ClientMessage,
    ) -> Result<(), HubError> {
        self.send(Command::ClientEvent {
            client_id,
            received_at,
            message,
        })
    }

    /// Record that a frame arrived without forwarding any message.
    pub fn touch(&self, client_id: ClientId, received_at: DateTime<Utc>) -> Result<(), HubError> {
        self.send(Command::Touch {
            client_id,
            received_at,
        })
    }

    pub fn broadcast(
        &self,
        topic: impl Into<String>,
        envelope: ServerMessage,
    ) -> Result<(), HubError> {
        self.send(Command::Broadcast {
            topic: topic.into(),
            envelope,
        })
    }

    /// Ask the broker for a copy of its state and wait for the reply.
    pub async fn snapshot(&self) -> Result<Snapshot, HubError> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Snapshot(reply))?;
        response.await.map_err(|_| HubError::BrokerClosed)
    }

    pub async fn debug_report(&self) -> Result<String, HubError> {
        Ok(self.snapshot().await?.debug_report())
    }

    /// Raw tracks, keyed by track id.
    pub async fn export_tracks(&self) -> Result<BTreeMap<String, Vec<Position>>, HubError> {
        Ok(self.snapshot().await?.tracks)
    }
}
