//! # shuttlehub
//!
//! `shuttlehub` is the real-time telemetry hub of a vehicle-tracking service.
//! Vehicles, rider devices and dashboards connect over WebSockets, stream
//! positions and bus-button presses, and subscribe to topics such as `eta` and
//! `bus_button` to receive updates as they happen.
//!
//! ## Core Modules
//!
//! - `broker`: the single task that owns clients, subscriptions, tracks and
//!   counters, and fans broadcasts out to subscribers.
//! - `client`: the broker's view of one connection.
//! - `config`: layered configuration loading.
//! - `eta`: the boundary with the arrival-time estimator.
//! - `transport`: the envelope protocol, the WebSocket server and the admin
//!   debug/export routes.
//! - `utils`: error types and logging.

pub mod broker;
pub mod client;
pub mod config;
pub mod eta;
pub mod transport;
pub mod utils;
