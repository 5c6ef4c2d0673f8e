//! CLI for shuttlehub
//!
//! Subcommands:
//! - `server`: run the WebSocket hub and its admin endpoints
//! - `client`: connect, subscribe and report a position and a bus-button
//!   press (useful for smoke tests)

use clap::Parser;
use shuttlehub::broker::Broker;
use shuttlehub::config::{load_config, load_config_from};
use shuttlehub::eta::EtaManager;
use shuttlehub::transport::admin::start_admin_server;
use shuttlehub::transport::websocket::start_websocket_server;
use shuttlehub::utils::error::HubError;
use shuttlehub::utils::logging;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "shuttlehub")]
enum Command {
    /// Start the WebSocket hub
    Server {
        /// Configuration file (without extension is fine); defaults to config/default
        #[arg(long)]
        config: Option<String>,
    },
    /// Run the example client
    Client {
        /// WebSocket server URL to connect to
        #[arg(long, default_value = "ws://127.0.0.1:8080")]
        url: String,
    },
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let cmd = Command::parse();

    match cmd {
        Command::Server { config } => {
            if let Err(e) = run_server(config.as_deref()).await {
                logging::init("info");
                error!("Server failed: {}", e);
            }
        }
        Command::Client { url } => {
            logging::init("info");
            if let Err(e) = run_client(&url).await {
                error!("Client failed: {}", e);
            }
        }
    }
}

async fn run_server(config_path: Option<&str>) -> Result<(), HubError> {
    let config = match config_path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    logging::init(&config.log.level);

    // The estimator publishes into this manager; the broker subscribes to it.
    let etas = EtaManager::new();
    let broker = Broker::spawn(&etas, &config.broker);

    let admin = start_admin_server(
        config.admin_addr(),
        broker.clone(),
        config.admin.token.clone(),
    );

    tokio::select! {
        res = start_websocket_server(config.server_addr(), broker) => {
            error!("WebSocket server exited unexpectedly: {:?}", res.err());
        }
        res = admin => {
            error!("Admin server exited unexpectedly: {:?}", res.err());
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting gracefully.");
        }
    }

    Ok(())
}

async fn run_client(url: &str) -> Result<(), Box<dyn std::error::Error>> {
    use futures_util::{SinkExt, StreamExt};
    use serde_json::json;
    use tokio_tungstenite::connect_async;
    use tokio_tungstenite::tungstenite::Message as WsMessage;

    let url = url::Url::parse(url)?;
    let (mut ws_stream, _response) = connect_async(url.as_str()).await?;

    // 1. Subscribe to presses
    let subscribe = json!({ "type": "subscribe", "message": { "topic": "bus_button" } });
    ws_stream
        .send(WsMessage::Text(subscribe.to_string().into()))
        .await?;

    // 2. Report a position on a fresh track
    let track = uuid::Uuid::new_v4().to_string();
    let position = json!({
        "type": "position",
        "message": { "latitude": 42.7302, "longitude": -73.6788, "speed": 0.0, "heading": null, "track": track }
    });
    ws_stream
        .send(WsMessage::Text(position.to_string().into()))
        .await?;

    // 3. Press the bus button; we should hear our own press back
    let press = json!({ "type": "bus_button", "message": { "latitude": 42.7302, "longitude": -73.6788 } });
    ws_stream
        .send(WsMessage::Text(press.to_string().into()))
        .await?;

    if let Some(Ok(WsMessage::Text(incoming))) = ws_stream.next().await {
        println!("Incoming: {incoming}");
    }

    ws_stream.close(None).await?;
    Ok(())
}
