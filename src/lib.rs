//! # mqtt-node
//!
//! Keeps an embedded device attached to an MQTT broker and gives it a simple
//! command/status topic convention. The crate sits on top of an existing MQTT
//! client: you bring the transport, it brings reconnect handling and routing.
//!
//! ## Features
//!
//! - Non-blocking reconnect with a fixed retry interval
//! - Device restart after a configurable number of failed attempts
//! - Last will and "I'm online" init message on every (re)connect
//! - Status topics `stat/<topic>/<sub_topic>` and command topics
//!   `cmnd/<topic>/<device>/<action>` routed to a closure
//! - Send-only, receive-only and send-receive modes
//! - JSON configuration via `serde-json-core`
//!
//! ## Usage
//!
//! ```rust,no_run
//! use mqtt_node::mqtt::{ConnectionConfig, Supervisor, SupervisorConfig};
//! # use mqtt_node::network::prelude::*;
//! # use mqtt_node::network::{ClientState, ConnectOptions, PublishPacket};
//! # struct PubSub;
//! # impl Transport for PubSub {
//! #     type Error = ();
//! #     fn connect(&mut self, _: &ConnectOptions<'_>) -> Result<(), ()> { Ok(()) }
//! #     fn is_connected(&self) -> bool { false }
//! #     fn state(&self) -> ClientState { ClientState::Disconnected }
//! #     fn publish(&mut self, _: &str, _: &[u8], _: bool) -> Result<(), ()> { Ok(()) }
//! #     fn subscribe(&mut self, _: &str) -> Result<(), ()> { Ok(()) }
//! #     fn unsubscribe(&mut self, _: &str) -> Result<(), ()> { Ok(()) }
//! #     fn poll(&mut self) -> Result<Option<PublishPacket>, ()> { Ok(None) }
//! # }
//! # struct Board;
//! # impl Platform for Board {
//! #     fn uptime_ms(&self) -> u64 { 0 }
//! #     fn hardware_id(&self) -> u32 { 0 }
//! #     fn restart(&mut self) {}
//! # }
//!
//! let config = ConnectionConfig::from_json(r#"{"server":"10.0.0.2"}"#).unwrap();
//! let mut node = Supervisor::new(PubSub, Board, config, SupervisorConfig::default())
//!     .with_handler(|device: &str, action: &str, payload: &str| {
//!         if device == "relay" && action == "set" {
//!             let _on = payload == "ON";
//!         }
//!     });
//! node.set_topic("device1").unwrap();
//!
//! loop {
//!     let _ = node.poll();
//! }
//! ```
//!
//! ## Optional Features
//!
//! - `std`: Enable standard library support (default: disabled)
//! - `defmt`: Enable defmt logging support for embedded debugging

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(missing_docs)]
#![warn(missing_debug_implementations)]

#[macro_use]
mod fmt;

/// Transport and platform abstractions the supervisor is built on.
pub mod network;

/// Connection supervision and topic routing.
pub mod mqtt;
