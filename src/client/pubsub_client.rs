use chrono::{DateTime, Utc};
use tokio::sync::mpsc::UnboundedSender;
use tungstenite::protocol::Message as WsMessage;
use uuid::Uuid;

pub type ClientId = String;

/// Represents a connected WebSocket client.
#[derive(Debug)]
pub struct Client {
    /// Unique identifier, a random UUID. Uniqueness matters, secrecy does not.
    pub id: ClientId,

    /// Outbound queue drained by the connection's writer task.
    pub sender: UnboundedSender<WsMessage>,

    /// When the broker last processed a message from this client.
    pub last_message_time: DateTime<Utc>,

    /// `User-Agent` header from the upgrade request. Informational only.
    pub user_agent: String,
}

impl Client {
    pub fn new(sender: UnboundedSender<WsMessage>, user_agent: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sender,
            last_message_time: Utc::now(),
            user_agent: user_agent.into(),
        }
    }

    /// Queue a frame for the writer task. Fails once the writer has gone away.
    pub fn send(&self, frame: WsMessage) -> Result<(), WsMessage> {
        self.sender.send(frame).map_err(|e| e.0)
    }
}
