//! Boundary with the arrival-time estimator.
//!
//! The estimator itself lives elsewhere; this module only defines the record it
//! produces and the subscription contract the broker relies on. Callbacks run
//! on whatever thread the estimator publishes from, so they must be cheap and
//! must not block.

use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Estimated arrival of one vehicle at one stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopEta {
    pub stop_id: i64,
    pub eta: DateTime<Utc>,
    pub arriving: bool,
}

/// Every current stop estimate for one vehicle on its route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleEta {
    pub vehicle_id: i64,
    pub route_id: i64,
    pub stop_etas: Vec<StopEta>,
    pub updated: DateTime<Utc>,
}

pub type EtaCallback = Box<dyn Fn(VehicleEta) + Send + Sync>;

/// Something that produces ETAs and lets interested parties hear about them.
pub trait EtaSource {
    /// Register `callback` to be invoked for every new estimate.
    fn subscribe(&self, callback: EtaCallback);
}

/// In-process fan-out point between an estimator and its subscribers.
#[derive(Default)]
pub struct EtaManager {
    subscribers: RwLock<Vec<EtaCallback>>,
}

impl EtaManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand a fresh estimate to every subscriber, on the calling thread.
    pub fn publish(&self, eta: VehicleEta) {
        let subscribers = self
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        for callback in subscribers.iter() {
            callback(eta.clone());
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl EtaSource for EtaManager {
    fn subscribe(&self, callback: EtaCallback) {
        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(callback);
    }
}

impl std::fmt::Debug for EtaManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EtaManager")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sample_eta(vehicle_id: i64) -> VehicleEta {
        VehicleEta {
            vehicle_id,
            route_id: 7,
            stop_etas: vec![StopEta {
                stop_id: 3,
                eta: Utc::now(),
                arriving: false,
            }],
            updated: Utc::now(),
        }
    }

    #[test]
    fn publish_reaches_every_subscriber() {
        let manager = EtaManager::new();
        let hits = Arc::new(AtomicUsize::new(0));
        for _ in 0..2 {
            let hits = hits.clone();
            manager.subscribe(Box::new(move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            }));
        }

        manager.publish(sample_eta(1));

        assert_eq!(manager.subscriber_count(), 2);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn publish_without_subscribers_is_a_no_op() {
        let manager = EtaManager::new();
        manager.publish(sample_eta(1));
        assert_eq!(manager.subscriber_count(), 0);
    }

    #[test]
    fn vehicle_eta_wire_shape() {
        let eta = sample_eta(12);
        let value = serde_json::to_value(&eta).unwrap();
        assert_eq!(value["vehicle_id"], 12);
        assert_eq!(value["route_id"], 7);
        assert_eq!(value["stop_etas"][0]["stop_id"], 3);
        assert_eq!(value["stop_etas"][0]["arriving"], false);
    }
}
