use std::time::Duration;

use chrono::{TimeZone, Utc};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use shuttlehub::broker::{Broker, BrokerHandle};
use shuttlehub::config::BrokerSettings;
use shuttlehub::eta::{EtaManager, StopEta, VehicleEta};
use shuttlehub::transport::websocket::serve;
use tokio::net::TcpListener;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;

async fn start_hub(etas: &EtaManager) -> (String, BrokerHandle) {
    let broker = Broker::spawn(
        etas,
        &BrokerSettings {
            max_track_positions: 0,
        },
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(listener, broker.clone()));
    (format!("ws://{addr}"), broker)
}

async fn wait_for_clients(broker: &BrokerHandle, n: usize) {
    for _ in 0..100 {
        if broker.snapshot().await.unwrap().clients.len() == n {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("expected {n} clients");
}

#[tokio::test]
async fn eta_is_pushed_to_subscribers_only() {
    let etas = EtaManager::new();
    let (url, broker) = start_hub(&etas).await;

    let (mut rider, _) = connect_async(url.as_str()).await.expect("rider connect");
    let (mut bystander, _) = connect_async(url.as_str()).await.expect("bystander connect");

    rider
        .send(WsMessage::text(
            json!({ "type": "subscribe", "message": { "topic": "eta" } }).to_string(),
        ))
        .await
        .unwrap();
    wait_for_clients(&broker, 2).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    etas.publish(VehicleEta {
        vehicle_id: 9,
        route_id: 1,
        stop_etas: vec![StopEta {
            stop_id: 5,
            eta: Utc.with_ymd_and_hms(2024, 9, 1, 14, 30, 0).unwrap(),
            arriving: false,
        }],
        updated: Utc.with_ymd_and_hms(2024, 9, 1, 14, 25, 0).unwrap(),
    });

    let frame = tokio::time::timeout(Duration::from_secs(2), rider.next())
        .await
        .expect("rider got no ETA")
        .unwrap()
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(frame.to_text().unwrap()).unwrap();
    assert_eq!(parsed["type"], "eta");
    assert_eq!(parsed["message"]["vehicle_id"], 9);
    assert_eq!(parsed["message"]["stop_etas"][0]["stop_id"], 5);

    let nothing = tokio::time::timeout(Duration::from_millis(200), bystander.next()).await;
    assert!(nothing.is_err(), "bystander should not hear about ETAs");
}

#[tokio::test]
async fn positions_show_up_in_export() {
    let etas = EtaManager::new();
    let (url, broker) = start_hub(&etas).await;
    let (mut vehicle, _) = connect_async(url.as_str()).await.expect("vehicle connect");

    for i in 0..3 {
        vehicle
            .send(WsMessage::text(
                json!({
                    "type": "position",
                    "message": {
                        "latitude": 42.0 + i as f64,
                        "longitude": -73.0,
                        "speed": 11.2,
                        "heading": 180.0,
                        "track": "route-87-run",
                        "time": "2001-01-01T00:00:00Z"
                    }
                })
                .to_string(),
            ))
            .await
            .unwrap();
    }

    let mut exported = Default::default();
    for _ in 0..100 {
        exported = broker.export_tracks().await.unwrap();
        if exported.get("route-87-run").map(Vec::len) == Some(3) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let track = &exported["route-87-run"];
    assert_eq!(track.len(), 3);
    assert_eq!(track[0].latitude, 42.0);
    assert_eq!(track[2].latitude, 44.0);
    assert!(track.iter().all(|p| p.time.timestamp() > 978_307_200));

    vehicle.close(None).await.unwrap();
    wait_for_clients(&broker, 0).await;
}
