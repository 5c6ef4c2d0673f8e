use super::pubsub_client::Client;
use tokio::sync::mpsc;
use tungstenite::protocol::Message as WsMessage;

#[test]
fn test_client_new() {
    let (tx, _) = mpsc::unbounded_channel::<WsMessage>();
    let client = Client::new(tx, "test-agent/1.0");
    assert!(!client.id.is_empty());
    assert_eq!(client.user_agent, "test-agent/1.0");
}

#[test]
fn test_client_ids_are_unique() {
    let (tx, _) = mpsc::unbounded_channel::<WsMessage>();
    let a = Client::new(tx.clone(), "");
    let b = Client::new(tx, "");
    assert_ne!(a.id, b.id);
}

#[test]
fn test_client_send_after_writer_gone() {
    let (tx, rx) = mpsc::unbounded_channel::<WsMessage>();
    let client = Client::new(tx, "");
    drop(rx);
    assert!(client.send(WsMessage::text("hello")).is_err());
}
