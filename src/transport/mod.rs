//! The `transport` module handles network communication with clients.
//!
//! It defines the envelope protocol, the WebSocket server with its per-client
//! reader and writer tasks, and the admin HTTP routes for debug and export.

pub mod admin;
pub mod message;
pub mod websocket;


pub use message::{ClientMessage, ServerMessage};
pub use websocket::start_websocket_server;
