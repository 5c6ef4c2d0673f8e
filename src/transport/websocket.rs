//! WebSocket transport
//!
//! Accepts TCP connections, performs the upgrade, and wires each connection to
//! the broker:
//! - a writer task drains the client's outbound queue into the socket
//! - a reader future decodes inbound frames and forwards them to the broker;
//!   the broker spawns it once the client is registered
//!
//! Decoding happens in the reader, off the broker task. A frame that fails to
//! decode is logged and skipped; the connection stays open. When the socket
//! closes or errors, the reader tells the broker to deregister the client.
//! A connection whose upgrade fails gets a plain `500` and is closed.

use std::fmt::Display;

use chrono::Utc;
use futures_util::{FutureExt, Sink, SinkExt, Stream, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::spawn;
use tokio::sync::mpsc;
use tokio_tungstenite::{WebSocketStream, accept_hdr_async};
use tracing::{debug, error, info, warn};
use tungstenite::error::ProtocolError;
use tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tungstenite::http::header::USER_AGENT;
use tungstenite::protocol::{Message as WsMessage, Role};
use tungstenite::Error as WsError;

use crate::broker::BrokerHandle;
use crate::client::{Client, ClientId};
use crate::transport::message::ClientMessage;
use crate::utils::error::HubError;

const UPGRADE_FAILED_RESPONSE: &[u8] =
    b"HTTP/1.1 500 Internal Server Error\r\ncontent-length: 0\r\nconnection: close\r\n\r\n";

/// Bind `addr` and serve WebSocket clients until the task is dropped.
pub async fn start_websocket_server(addr: String, broker: BrokerHandle) -> Result<(), HubError> {
    let listener = TcpListener::bind(&addr).await?;
    info!("WebSocket server listening on ws://{addr}");
    serve(listener, broker).await
}

/// Serve WebSocket clients on an already bound listener.
pub async fn serve(listener: TcpListener, broker: BrokerHandle) -> Result<(), HubError> {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!("accept failed: {e}");
                continue;
            }
        };
        debug!(%peer, "accepted connection");

        let broker = broker.clone();
        spawn(handle_connection(stream, broker));
    }
}

/// Upgrade one connection and register it with the broker.
pub async fn handle_connection<S>(stream: S, broker: BrokerHandle)
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let mut user_agent = String::new();
    let capture_user_agent =
        |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
            user_agent = request
                .headers()
                .get(USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            Ok(response)
        };

    // The handshake borrows the stream so a failed upgrade can still be
    // answered. On success tungstenite has flushed the 101 response and left
    // nothing buffered, so the socket can be rewrapped as is.
    let mut stream = stream;
    let upgraded = accept_hdr_async(&mut stream, capture_user_agent)
        .await
        .map(drop);
    if let Err(e) = upgraded {
        error!("unable to upgrade connection: {e}");
        reject_upgrade(&mut stream).await;
        return;
    }
    let ws_stream = WebSocketStream::from_raw_socket(stream, Role::Server, None).await;

    let (ws_sender, ws_receiver) = ws_stream.split();
    let (tx, rx) = mpsc::unbounded_channel::<WsMessage>();
    let client = Client::new(tx, user_agent);
    let client_id = client.id.clone();

    spawn(write_loop(client_id.clone(), ws_sender, rx));

    let reader = read_loop(client_id.clone(), ws_receiver, broker.clone()).boxed();
    if let Err(e) = broker.register_client(client, Some(reader)) {
        error!(client_id = %client_id, "unable to register client: {e}");
    }
}

async fn reject_upgrade<S>(stream: &mut S)
where
    S: AsyncWrite + Unpin,
{
    if let Err(e) = stream.write_all(UPGRADE_FAILED_RESPONSE).await {
        debug!("unable to send upgrade failure response: {e}");
        return;
    }
    let _ = stream.shutdown().await;
}

/// Forward queued frames to the socket until the broker drops the client or
/// a write fails.
pub(crate) async fn write_loop<W>(
    client_id: ClientId,
    mut sink: W,
    mut outbound: mpsc::UnboundedReceiver<WsMessage>,
) where
    W: Sink<WsMessage> + Unpin,
    W::Error: Display,
{
    while let Some(frame) = outbound.recv().await {
        if let Err(e) = sink.send(frame).await {
            warn!(client_id = %client_id, "unable to write: {e}");
            break;
        }
    }
    let _ = sink.close().await;
    debug!(client_id = %client_id, "send loop closed");
}

/// Decode frames and forward them to the broker until the connection ends,
/// then deregister the client.
pub(crate) async fn read_loop<R>(client_id: ClientId, mut frames: R, broker: BrokerHandle)
where
    R: Stream<Item = Result<WsMessage, WsError>> + Unpin,
{
    while let Some(frame) = frames.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(
                WsError::ConnectionClosed
                | WsError::AlreadyClosed
                | WsError::Protocol(ProtocolError::ResetWithoutClosingHandshake),
            ) => break,
            Err(e) => {
                error!(client_id = %client_id, "unable to read: {e}");
                break;
            }
        };

        let received_at = Utc::now();
        let payload: &[u8] = match &frame {
            WsMessage::Text(text) => text.as_str().as_bytes(),
            WsMessage::Binary(bytes) => &bytes[..],
            WsMessage::Close(_) => break,
            _ => continue,
        };

        let forwarded = match ClientMessage::decode(payload, received_at) {
            Ok(ClientMessage::Unrecognized(kind)) => {
                // the type comes straight from the client; not our bug
                warn!(client_id = %client_id, kind = %kind, "unknown message type");
                broker.touch(client_id.clone(), received_at)
            }
            Ok(message) => broker.client_event(client_id.clone(), received_at, message),
            Err(e) => {
                error!(client_id = %client_id, "unable to decode message: {e}");
                broker.touch(client_id.clone(), received_at)
            }
        };
        if forwarded.is_err() {
            break;
        }
    }

    debug!(client_id = %client_id, "connection closed");
    if let Err(e) = broker.deregister_client(client_id.clone()) {
        error!(client_id = %client_id, "unable to deregister client: {e}");
    }
}
