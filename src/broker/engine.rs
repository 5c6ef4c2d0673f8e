//! Broker engine
//!
//! The broker is the single owner of every piece of shared hub state: the
//! client registry, topic subscriptions, tracks and the bus-button counter.
//! It runs as one task consuming one inbox; nothing else reads or writes that
//! state, so none of it sits behind a lock.
//!
//! Broadcasts are serialized once and queued on each subscriber's outbound
//! channel. A writer task per connection drains that channel, so a slow
//! socket delays only its own client and never the broker loop.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};
use tungstenite::protocol::Message as WsMessage;

use super::handle::BrokerHandle;
use super::message::Command;
use super::snapshot::{ClientSummary, Snapshot};
use super::topic::Topic;
use super::track::{Position, TrackStore};
use crate::client::{Client, ClientId};
use crate::config::BrokerSettings;
use crate::eta::EtaSource;
use crate::transport::message::{
    BUS_BUTTON_TOPIC, BusButton, ClientMessage, ETA_TOPIC, ServerMessage, TopicRequest,
};

#[derive(Debug)]
pub struct Broker {
    pub(crate) topics: HashMap<String, Topic>,
    pub(crate) clients: HashMap<ClientId, Client>,
    pub(crate) tracks: TrackStore,
    pub(crate) bus_button_count: u64,
    inbox: mpsc::UnboundedReceiver<Command>,
}

impl Broker {
    /// Build a broker and the handle that feeds it. The broker does nothing
    /// until [`Broker::run`] is awaited.
    pub fn new(settings: &BrokerSettings) -> (Self, BrokerHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let broker = Self {
            topics: HashMap::new(),
            clients: HashMap::new(),
            tracks: TrackStore::new(settings.max_track_positions),
            bus_button_count: 0,
            inbox: rx,
        };
        (broker, BrokerHandle::new(tx))
    }

    /// Build a broker, subscribe it to `etas`, and run it on the current
    /// tokio runtime.
    pub fn spawn(etas: &dyn EtaSource, settings: &BrokerSettings) -> BrokerHandle {
        let (broker, handle) = Self::new(settings);

        let eta_handle = handle.clone();
        etas.subscribe(Box::new(move |eta| {
            if let Err(e) = eta_handle.broadcast(ETA_TOPIC, ServerMessage::Eta(eta)) {
                warn!("dropping ETA: {e}");
            }
        }));

        tokio::spawn(broker.run());
        handle
    }

    /// Process commands until every handle has been dropped.
    pub async fn run(mut self) {
        info!("broker started");
        while let Some(command) = self.inbox.recv().await {
            self.process(command);
        }
        info!("broker stopped");
    }

    /// Process whatever is already queued without waiting for more.
    #[cfg(test)]
    pub(crate) fn process_pending(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(command) = self.inbox.try_recv() {
            self.process(command);
            processed += 1;
        }
        processed
    }

    fn process(&mut self, command: Command) {
        trace!(command = command.name(), "processing");
        match command {
            Command::RegisterClient { client, reader } => {
                self.register_client(client);
                if let Some(reader) = reader {
                    tokio::spawn(reader);
                }
            }
            Command::DeregisterClient(client_id) => self.cleanup_client(&client_id),
            Command::ClientEvent {
                client_id,
                received_at,
                message,
            } => self.handle_client_message(&client_id, received_at, message),
            Command::Touch {
                client_id,
                received_at,
            } => {
                if !self.touch(&client_id, received_at) {
                    debug!(client_id, "frame from unregistered client");
                }
            }
            Command::Broadcast { topic, envelope } => {
                self.broadcast(&topic, &envelope);
            }
            Command::Snapshot(reply) => {
                if reply.send(self.snapshot()).is_err() {
                    debug!("snapshot requester went away before the reply");
                }
            }
        }
    }

    pub(crate) fn register_client(&mut self, client: Client) {
        info!(client_id = %client.id, user_agent = %client.user_agent, "client registered");
        self.clients.insert(client.id.clone(), client);
    }

    /// Drop a client from the registry and from every topic. Removing a client
    /// that is already gone is a no-op.
    pub(crate) fn cleanup_client(&mut self, client_id: &str) {
        for topic in self.topics.values_mut() {
            if topic.unsubscribe(client_id) {
                debug!(client_id, topic = %topic.name, "unsubscribed on disconnect");
            }
        }

        if self.clients.remove(client_id).is_some() {
            info!(client_id, "client deregistered");
        }
    }

    /// Bump the client's last message time. False if the client is unknown.
    fn touch(&mut self, client_id: &str, received_at: DateTime<Utc>) -> bool {
        match self.clients.get_mut(client_id) {
            Some(client) => {
                client.last_message_time = received_at;
                true
            }
            None => false,
        }
    }

    fn handle_client_message(
        &mut self,
        client_id: &str,
        received_at: DateTime<Utc>,
        message: ClientMessage,
    ) {
        if !self.touch(client_id, received_at) {
            warn!(client_id, kind = message.kind(), "message from unregistered client");
            return;
        }

        match message {
            ClientMessage::Subscribe(request) => self.subscribe(client_id, request),
            ClientMessage::Unsubscribe(request) => self.unsubscribe(client_id, request),
            ClientMessage::Position(position) => self.record_position(position, received_at),
            ClientMessage::BusButton(press) => self.bus_button(press),
            ClientMessage::Unrecognized(kind) => {
                // readers are expected to filter these out
                error!(client_id, kind = %kind, "unhandled client message type");
            }
        }
    }

    pub(crate) fn subscribe(&mut self, client_id: &str, request: TopicRequest) {
        let topic = self
            .topics
            .entry(request.topic.clone())
            .or_insert_with(|| Topic::new(&request.topic));
        if topic.subscribe(client_id.to_string()) {
            debug!(client_id, topic = %request.topic, subscribers = topic.len(), "subscribed");
        }
    }

    pub(crate) fn unsubscribe(&mut self, client_id: &str, request: TopicRequest) {
        let removed = self
            .topics
            .get_mut(&request.topic)
            .is_some_and(|topic| topic.unsubscribe(client_id));
        if removed {
            debug!(client_id, topic = %request.topic, "unsubscribed");
        } else {
            warn!(client_id, topic = %request.topic, "client requested unsubscribe from topic it's not subscribed to");
        }
    }

    fn record_position(&mut self, mut position: Position, received_at: DateTime<Utc>) {
        position.time = received_at;
        let len = self.tracks.append(position);
        trace!(len, "position recorded");
    }

    fn bus_button(&mut self, press: BusButton) {
        self.bus_button_count += 1;
        self.broadcast(BUS_BUTTON_TOPIC, &ServerMessage::BusButton(press));
    }

    /// Serialize `envelope` once and queue it for every subscriber of `topic`.
    /// Returns how many subscribers it was queued for.
    pub(crate) fn broadcast(&self, topic: &str, envelope: &ServerMessage) -> usize {
        let text = match serde_json::to_string(envelope) {
            Ok(json) => json,
            Err(e) => {
                error!(topic, "unable to marshal broadcast: {e}");
                return 0;
            }
        };
        let frame = WsMessage::text(text);

        let Some(subscribers) = self.topics.get(topic).filter(|t| !t.is_empty()) else {
            debug!(topic, "broadcast to topic with no subscribers");
            return 0;
        };

        let mut delivered = 0;
        for sub_id in &subscribers.subscribers {
            match self.clients.get(sub_id) {
                Some(client) => match client.send(frame.clone()) {
                    Ok(()) => delivered += 1,
                    Err(_) => warn!(client_id = %sub_id, topic, "unable to write: connection writer is gone"),
                },
                None => error!(client_id = %sub_id, topic, "subscriber is not registered"),
            }
        }
        debug!(topic, delivered, "broadcast");
        delivered
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        trace!(
            clients = self.clients.len(),
            tracks = self.tracks.track_count(),
            positions = self.tracks.position_count(),
            "taking snapshot"
        );
        Snapshot {
            clients: self
                .clients
                .values()
                .map(|c| ClientSummary {
                    id: c.id.clone(),
                    last_message_time: c.last_message_time,
                    user_agent: c.user_agent.clone(),
                })
                .collect(),
            tracks: self.tracks.to_map(),
            bus_button_count: self.bus_button_count,
        }
    }
}
