//! MQTT session management for a single device.
//!
//! This module keeps a device's MQTT session alive and gives it a small,
//! conventional topic layout:
//!
//! - state and telemetry are published under `stat/<topic>[/<sub_topic>]`
//! - commands arrive on `cmnd/<topic>/#` and are handed to the application as
//!   `(device, action, payload)`
//!
//! The wire protocol is delegated to a [`Transport`](crate::network::Transport)
//! implementation. Everything here runs inside [`Supervisor::poll`] on the
//! caller's thread; there is no background task and no locking.
//!
//! # Components
//!
//! - [`supervisor`]: reconnect backoff, restart escalation, traffic modes
//! - [`topic`]: status topic composition and command topic parsing
//! - [`router`]: dispatch of parsed commands to a [`MessageHandler`]
//! - [`config`]: broker and retry configuration, loadable from JSON

#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod router;
pub mod supervisor;
pub mod topic;

pub use config::{ConnectionConfig, SupervisorConfig};
pub use error::Error;
pub use router::{Callback, Dispatch, MessageHandler, Router};
pub use supervisor::{Mode, PollStatus, Supervisor};
pub use topic::{Route, TopicSet};
