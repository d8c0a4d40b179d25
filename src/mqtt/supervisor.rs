//! Connection supervisor.
//!
//! [`Supervisor`] owns the transport and is driven by calling
//! [`Supervisor::poll`] from the firmware main loop. While the session is down
//! it reconnects at most once per retry interval and, after too many
//! consecutive failures, asks the platform to restart the device. While the
//! session is up it drains the transport and routes commands to the handler.
//!
//! # Examples
//!
//! ```rust,no_run
//! use mqtt_node::mqtt::{ConnectionConfig, Mode, Supervisor, SupervisorConfig};
//! # use mqtt_node::network::prelude::*;
//! # use mqtt_node::network::{ClientState, ConnectOptions, PublishPacket};
//! # struct Wifi;
//! # impl Transport for Wifi {
//! #     type Error = ();
//! #     fn connect(&mut self, _: &ConnectOptions<'_>) -> Result<(), ()> { Ok(()) }
//! #     fn is_connected(&self) -> bool { true }
//! #     fn state(&self) -> ClientState { ClientState::Connected }
//! #     fn publish(&mut self, _: &str, _: &[u8], _: bool) -> Result<(), ()> { Ok(()) }
//! #     fn subscribe(&mut self, _: &str) -> Result<(), ()> { Ok(()) }
//! #     fn unsubscribe(&mut self, _: &str) -> Result<(), ()> { Ok(()) }
//! #     fn poll(&mut self) -> Result<Option<PublishPacket>, ()> { Ok(None) }
//! # }
//! # struct Board;
//! # impl Platform for Board {
//! #     fn uptime_ms(&self) -> u64 { 0 }
//! #     fn hardware_id(&self) -> u32 { 0xC0FFEE }
//! #     fn restart(&mut self) {}
//! # }
//!
//! let connection = ConnectionConfig::new("192.168.1.10")
//!     .unwrap()
//!     .with_credentials("node", "secret")
//!     .unwrap();
//!
//! let mut node = Supervisor::new(Wifi, Board, connection, SupervisorConfig::default())
//!     .with_handler(|device: &str, action: &str, payload: &str| {
//!         // e.g. device = "relay", action = "set", payload = "ON"
//!     });
//! node.set_topic("device1").unwrap();
//! node.set_last_will("status", "offline").unwrap();
//! node.set_init_publish("status", "online").unwrap();
//! node.set_mode(Mode::SendReceive);
//!
//! loop {
//!     node.poll().unwrap();
//!     let _ = node.publish("temp", b"21.5", true);
//! }
//! ```

use core::fmt::Write as _;

use heapless::String;

use super::config::{ConnectionConfig, MAX_CLIENT_ID_LEN, SupervisorConfig};
use super::router::{Callback, Dispatch, MessageHandler, Router};
use super::topic::{MAX_PREFIX_LEN, TopicSet};
use super::Error;
use crate::fmt::Debug2Format;
use crate::network::{ConnectOptions, LastWill, MAX_TOPIC_LEN, Platform, QoS, Transport};

/// Prefix of client identifiers derived from the hardware id.
pub const DEFAULT_CLIENT_ID_PREFIX: &str = "ESP-";
/// Longest sub-topic accepted for the last will and init message.
///
/// Chosen so that `stat/<topic>/<sub_topic>` always fits a topic buffer.
pub const MAX_SUB_TOPIC_LEN: usize = MAX_TOPIC_LEN - MAX_PREFIX_LEN;
/// Longest last-will or init message.
pub const MAX_MESSAGE_LEN: usize = 256;

/// Which directions of traffic the node takes part in.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Publish only; no command subscription, no dispatch.
    SendOnly,
    /// Receive commands only; publishing is refused.
    ReceiveOnly,
    /// Publish and receive.
    #[default]
    SendReceive,
}

impl Mode {
    /// Whether publishing is allowed.
    pub fn sends(self) -> bool {
        !matches!(self, Mode::ReceiveOnly)
    }

    /// Whether commands are subscribed to and dispatched.
    pub fn receives(self) -> bool {
        !matches!(self, Mode::SendOnly)
    }
}

/// What a call to [`Supervisor::poll`] did.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PollStatus {
    /// The session is up; `dispatched` messages reached the handler.
    Connected {
        /// Messages delivered to the handler during this poll.
        dispatched: usize,
    },
    /// Disconnected, but the retry interval has not elapsed yet.
    Backoff,
    /// A reconnect attempt succeeded.
    Reconnected,
    /// A reconnect attempt failed and will be retried.
    Retrying {
        /// Consecutive failed attempts so far.
        attempt: u32,
        /// Why the attempt failed.
        reason: Error,
    },
}

/// A status message published relative to the status prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Announcement {
    sub_topic: String<MAX_SUB_TOPIC_LEN>,
    message: String<MAX_MESSAGE_LEN>,
}

impl Announcement {
    /// `None` for an empty message, which disables the announcement.
    fn new(sub_topic: &str, message: &str) -> Result<Option<Self>, Error> {
        if message.is_empty() {
            return Ok(None);
        }
        Ok(Some(Self {
            sub_topic: String::try_from(sub_topic).map_err(|_| Error::TopicTooLong)?,
            message: String::try_from(message).map_err(|_| Error::MessageTooLong)?,
        }))
    }
}

/// Keeps an MQTT session alive and routes its traffic.
///
/// # Type Parameters
///
/// * `T` - The MQTT client implementing [`Transport`]
/// * `P` - Board services implementing [`Platform`]
/// * `H` - The command handler, see [`MessageHandler`]
#[derive(Debug)]
pub struct Supervisor<T, P, H = Callback> {
    transport: T,
    platform: P,
    connection: ConnectionConfig,
    client_id: String<MAX_CLIENT_ID_LEN>,
    settings: SupervisorConfig,
    router: Router<H>,
    last_will: Option<Announcement>,
    init_publish: Option<Announcement>,
    mode: Mode,
    last_attempt_ms: Option<u64>,
    failures: u32,
}

impl<T: Transport, P: Platform> Supervisor<T, P, Callback> {
    /// Create a supervisor in [`Mode::SendReceive`] without a handler.
    ///
    /// Nothing is sent until the first [`poll`](Self::poll).
    pub fn new(
        transport: T,
        platform: P,
        connection: ConnectionConfig,
        settings: SupervisorConfig,
    ) -> Self {
        let client_id = match &connection.client_id {
            Some(id) if !id.is_empty() => id.clone(),
            _ => default_client_id(platform.hardware_id()),
        };

        Self {
            transport,
            platform,
            connection,
            client_id,
            settings,
            router: Router::new(TopicSet::default()),
            last_will: None,
            init_publish: None,
            mode: Mode::default(),
            last_attempt_ms: None,
            failures: 0,
        }
    }
}

impl<T: Transport, P: Platform, H: MessageHandler> Supervisor<T, P, H> {
    /// Install a handler of any type.
    pub fn with_handler<H2: MessageHandler>(self, handler: H2) -> Supervisor<T, P, H2> {
        Supervisor {
            transport: self.transport,
            platform: self.platform,
            connection: self.connection,
            client_id: self.client_id,
            settings: self.settings,
            router: self.router.with_handler(handler),
            last_will: self.last_will,
            init_publish: self.init_publish,
            mode: self.mode,
            last_attempt_ms: self.last_attempt_ms,
            failures: self.failures,
        }
    }

    /// Replace the handler with another of the same type.
    pub fn set_handler(&mut self, handler: H) {
        self.router.set_handler(handler);
    }

    /// The installed handler.
    pub fn handler_mut(&mut self) -> Option<&mut H> {
        self.router.handler_mut()
    }

    /// Set the node's base topic.
    ///
    /// When already connected and receiving, the old command subscription is
    /// swapped for the new one.
    pub fn set_topic(&mut self, topic: &str) -> Result<(), Error> {
        let topics = TopicSet::new(topic)?;
        let resubscribe = self.transport.is_connected() && self.mode.receives();

        if resubscribe && !self.router.topics().command_filter().is_empty() {
            let old = self.router.topics().command_filter();
            if let Err(e) = self.transport.unsubscribe(old) {
                warn!("unsubscribe from {} failed: {}", old, Debug2Format(&e));
            }
        }

        self.router.set_topics(topics);

        if resubscribe {
            self.subscribe_commands();
        }
        Ok(())
    }

    /// Message the broker publishes to `stat/<topic>[/<sub_topic>]` if the
    /// node drops off without disconnecting. Sent with QoS 0, retained.
    ///
    /// An empty message clears the last will. Takes effect on the next connect.
    pub fn set_last_will(&mut self, sub_topic: &str, message: &str) -> Result<(), Error> {
        self.last_will = Announcement::new(sub_topic, message)?;
        Ok(())
    }

    /// Message published to `stat/<topic>[/<sub_topic>]` after every
    /// successful connect. An empty message disables it.
    pub fn set_init_publish(&mut self, sub_topic: &str, message: &str) -> Result<(), Error> {
        self.init_publish = Announcement::new(sub_topic, message)?;
        Ok(())
    }

    /// Switch the traffic mode.
    ///
    /// Leaving receive modes unsubscribes from the command filter; entering
    /// one subscribes. Subscription changes only reach the transport while
    /// connected; reconnects apply the current mode anyway.
    pub fn set_mode(&mut self, mode: Mode) {
        if mode == self.mode {
            return;
        }
        debug!("switching mode {} -> {}", self.mode, mode);
        self.mode = mode;

        if !self.transport.is_connected() {
            return;
        }
        if mode.receives() {
            self.subscribe_commands();
        } else {
            let filter = self.router.topics().command_filter();
            if filter.is_empty() {
                return;
            }
            if let Err(e) = self.transport.unsubscribe(filter) {
                warn!("unsubscribe from {} failed: {}", filter, Debug2Format(&e));
            }
        }
    }

    /// Publish `payload` to `stat/<topic>[/<sub_topic>]`.
    ///
    /// Refused with [`Error::SendDisabled`] in [`Mode::ReceiveOnly`]; nothing
    /// reaches the transport in that case.
    pub fn publish(&mut self, sub_topic: &str, payload: &[u8], retain: bool) -> Result<(), Error> {
        if !self.mode.sends() {
            return Err(Error::SendDisabled);
        }

        let topic = self.router.topics().compose(sub_topic)?;
        trace!("publish {} ({} bytes)", topic.as_str(), payload.len());
        self.transport
            .publish(&topic, payload, retain)
            .map_err(|e| {
                warn!("publish to {} failed: {}", topic.as_str(), Debug2Format(&e));
                Error::Transport
            })
    }

    /// Drive the connection. Call this on a fixed cadence.
    ///
    /// # Errors
    ///
    /// * [`Error::RetriesExhausted`] - The retry ceiling was hit and
    ///   [`Platform::restart`] has been called
    pub fn poll(&mut self) -> Result<PollStatus, Error> {
        if self.transport.is_connected() {
            let dispatched = self.drain();
            self.failures = 0;
            return Ok(PollStatus::Connected { dispatched });
        }

        if let Some(last) = self.last_attempt_ms {
            let elapsed = self.platform.uptime_ms().saturating_sub(last);
            if elapsed <= self.settings.retry_interval_ms {
                return Ok(PollStatus::Backoff);
            }
        }

        self.failures = self.failures.saturating_add(1);
        let result = self.reconnect();
        self.last_attempt_ms = Some(self.platform.uptime_ms());

        match result {
            Ok(()) => {
                self.failures = 0;
                Ok(PollStatus::Reconnected)
            }
            Err(_) if self.retries_exhausted() => {
                error!(
                    "no MQTT connection after {} attempts, restarting",
                    self.failures
                );
                self.platform.restart();
                Err(Error::RetriesExhausted)
            }
            Err(reason) => Ok(PollStatus::Retrying {
                attempt: self.failures,
                reason,
            }),
        }
    }

    /// Connect now, regardless of the retry interval.
    ///
    /// On success the command filter is subscribed (in receive modes) and the
    /// init message, if any, is published. Failures of those follow-up calls
    /// are logged; the session stays up.
    pub fn reconnect(&mut self) -> Result<(), Error> {
        debug!(
            "attempting MQTT connection: server={} port={} user={} client_id={}",
            self.connection.server.as_str(),
            self.connection.port,
            self.connection.user.as_str(),
            self.client_id.as_str()
        );

        let will_topic = match &self.last_will {
            Some(will) if !self.router.topics().status_prefix().is_empty() => {
                Some(self.router.topics().compose(&will.sub_topic)?)
            }
            _ => None,
        };
        let last_will = match (&will_topic, &self.last_will) {
            (Some(topic), Some(will)) => Some(LastWill {
                topic,
                message: &will.message,
                qos: QoS::AtMostOnce,
                retain: true,
            }),
            _ => None,
        };

        let options = ConnectOptions {
            server: &self.connection.server,
            port: self.connection.port,
            client_id: &self.client_id,
            username: non_empty(&self.connection.user),
            password: non_empty(&self.connection.password),
            last_will,
        };

        let result = self.transport.connect(&options);
        if let Err(e) = &result {
            warn!("transport connect error: {}", Debug2Format(e));
        }
        if result.is_err() || !self.transport.is_connected() {
            let state = self.transport.state();
            warn!(
                "MQTT connection failed, rc={}, trying again in {} ms",
                state.code(),
                self.settings.retry_interval_ms
            );
            return Err(Error::ConnectFailed(state));
        }

        info!(
            "connected to {}:{} as {}",
            self.connection.server.as_str(),
            self.connection.port,
            self.client_id.as_str()
        );

        if self.mode.receives() {
            self.subscribe_commands();
        }
        self.announce();
        Ok(())
    }

    /// Whether the transport reports an open session.
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Current traffic mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Consecutive failed reconnect attempts.
    pub fn failure_count(&self) -> u32 {
        self.failures
    }

    /// Uptime of the last reconnect attempt, `None` before the first one.
    pub fn last_attempt_ms(&self) -> Option<u64> {
        self.last_attempt_ms
    }

    /// Client identifier presented to the broker.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Derived status and command topics.
    pub fn topics(&self) -> &TopicSet {
        self.router.topics()
    }

    /// Broker configuration.
    pub fn connection_config(&self) -> &ConnectionConfig {
        &self.connection
    }

    /// Retry settings.
    pub fn settings(&self) -> &SupervisorConfig {
        &self.settings
    }

    /// The wrapped transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The wrapped transport, mutably.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// The platform services.
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// The platform services, mutably.
    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    fn retries_exhausted(&self) -> bool {
        self.settings.max_retries > 0 && self.failures >= self.settings.max_retries
    }

    fn subscribe_commands(&mut self) {
        let filter = self.router.topics().command_filter();
        if filter.is_empty() {
            return;
        }
        debug!("subscribing to {}", filter);
        if let Err(e) = self.transport.subscribe(filter) {
            warn!("subscribe to {} failed: {}", filter, Debug2Format(&e));
        }
    }

    fn announce(&mut self) {
        let Some(init) = &self.init_publish else {
            return;
        };
        if self.router.topics().status_prefix().is_empty() {
            return;
        }
        let Ok(topic) = self.router.topics().compose(&init.sub_topic) else {
            return;
        };
        debug!("sending initial message to {}", topic.as_str());
        if let Err(e) = self
            .transport
            .publish(&topic, init.message.as_bytes(), false)
        {
            warn!("initial publish failed: {}", Debug2Format(&e));
        }
    }

    fn drain(&mut self) -> usize {
        let mut dispatched = 0;
        for _ in 0..self.settings.max_messages_per_poll.max(1) {
            let packet = match self.transport.poll() {
                Ok(Some(packet)) => packet,
                Ok(None) => break,
                Err(e) => {
                    warn!("transport poll failed: {}", Debug2Format(&e));
                    break;
                }
            };
            if !self.mode.receives() {
                trace!("send-only, dropping message on {}", packet.topic.as_str());
                continue;
            }
            if self.router.dispatch(&packet.topic, &packet.payload) == Dispatch::Delivered {
                dispatched += 1;
            }
        }
        dispatched
    }
}

fn non_empty(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}

fn default_client_id(hardware_id: u32) -> String<MAX_CLIENT_ID_LEN> {
    let mut id = String::new();
    // "ESP-" plus at most 8 hex digits always fits
    let _ = write!(id, "{DEFAULT_CLIENT_ID_PREFIX}{hardware_id:x}");
    id
}
