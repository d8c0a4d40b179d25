//! Transport abstraction for the MQTT layer.
//!
//! The supervisor does not speak the MQTT wire protocol itself. It drives any
//! client implementing [`Transport`], which owns framing, QoS handling, keep
//! alive and the socket. This keeps the crate usable on top of whatever MQTT
//! stack a board support package already ships.
//!

#![deny(unsafe_code)]

use heapless::{String, Vec};

/// Maximum length of a topic delivered by a transport.
pub const MAX_TOPIC_LEN: usize = 256;
/// Maximum size of a payload delivered by a transport.
pub const MAX_PAYLOAD_LEN: usize = 1024;

/// Re-exports of the traits integrations implement
pub mod prelude {
    pub use super::{Platform, Transport};
}

/// An incoming MQTT publish message.
///
/// Transports hand these out from [`Transport::poll`]; the supervisor routes
/// them to the user handler.
///
/// # Examples
///
/// ```rust
/// use mqtt_node::network::PublishPacket;
/// use heapless::{String, Vec};
///
/// let packet = PublishPacket {
///     topic: String::try_from("cmnd/device1/relay/set").unwrap(),
///     payload: Vec::from_slice(b"ON").unwrap(),
/// };
///
/// assert_eq!(packet.topic.as_str(), "cmnd/device1/relay/set");
/// assert_eq!(&packet.payload[..], b"ON");
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PublishPacket {
    /// The topic on which the message was published.
    pub topic: String<MAX_TOPIC_LEN>,
    /// The message payload data.
    pub payload: Vec<u8, MAX_PAYLOAD_LEN>,
}

/// Quality of Service levels for MQTT messages.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum QoS {
    /// At most once delivery.
    AtMostOnce = 0,
    /// At least once delivery.
    AtLeastOnce = 1,
    /// Exactly once delivery.
    ExactlyOnce = 2,
}

/// Message the broker publishes on our behalf after an ungraceful disconnect.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct LastWill<'a> {
    /// Full topic the will is published to.
    pub topic: &'a str,
    /// Will payload.
    pub message: &'a str,
    /// Delivery guarantee requested for the will.
    pub qos: QoS,
    /// Whether the broker retains the will.
    pub retain: bool,
}

/// Everything a transport needs to open a session with the broker.
///
/// Credentials are `None` when the configuration left them empty.
#[derive(Debug, Clone, Copy)]
pub struct ConnectOptions<'a> {
    /// Broker host name or address.
    pub server: &'a str,
    /// Broker port.
    pub port: u16,
    /// Client identifier presented in CONNECT.
    pub client_id: &'a str,
    /// Optional user name.
    pub username: Option<&'a str>,
    /// Optional password.
    pub password: Option<&'a str>,
    /// Optional last will.
    pub last_will: Option<LastWill<'a>>,
}

/// Connection state reported by a transport.
///
/// Negative codes are local failures, positive codes are CONNACK return codes
/// from the broker.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClientState {
    /// The server did not respond within the keep-alive time.
    ConnectionTimeout,
    /// The network connection was broken.
    ConnectionLost,
    /// The network connection failed.
    ConnectFailed,
    /// The client is disconnected cleanly.
    Disconnected,
    /// The client is connected.
    Connected,
    /// The server does not support the requested protocol version.
    BadProtocol,
    /// The server rejected the client identifier.
    BadClientId,
    /// The server was unable to accept the connection.
    Unavailable,
    /// The user name or password was rejected.
    BadCredentials,
    /// The client was not authorized to connect.
    Unauthorized,
}

impl ClientState {
    /// Numeric diagnostic code of this state.
    pub fn code(self) -> i8 {
        match self {
            ClientState::ConnectionTimeout => -4,
            ClientState::ConnectionLost => -3,
            ClientState::ConnectFailed => -2,
            ClientState::Disconnected => -1,
            ClientState::Connected => 0,
            ClientState::BadProtocol => 1,
            ClientState::BadClientId => 2,
            ClientState::Unavailable => 3,
            ClientState::BadCredentials => 4,
            ClientState::Unauthorized => 5,
        }
    }
}

/// An MQTT client the supervisor can drive.
///
/// All methods are expected to be non-blocking or bounded by the transport's
/// own timeouts: they run inside [`Supervisor::poll`](crate::mqtt::Supervisor::poll)
/// on the caller's thread.
///
/// # Examples
///
/// ```rust
/// use mqtt_node::network::prelude::*;
/// use mqtt_node::network::{ClientState, ConnectOptions, PublishPacket};
///
/// struct Loopback {
///     connected: bool,
/// }
///
/// impl Transport for Loopback {
///     type Error = ();
///
///     fn connect(&mut self, _options: &ConnectOptions<'_>) -> Result<(), Self::Error> {
///         self.connected = true;
///         Ok(())
///     }
///     fn is_connected(&self) -> bool {
///         self.connected
///     }
///     fn state(&self) -> ClientState {
///         if self.connected { ClientState::Connected } else { ClientState::Disconnected }
///     }
///     fn publish(&mut self, _topic: &str, _payload: &[u8], _retain: bool) -> Result<(), Self::Error> {
///         Ok(())
///     }
///     fn subscribe(&mut self, _filter: &str) -> Result<(), Self::Error> {
///         Ok(())
///     }
///     fn unsubscribe(&mut self, _filter: &str) -> Result<(), Self::Error> {
///         Ok(())
///     }
///     fn poll(&mut self) -> Result<Option<PublishPacket>, Self::Error> {
///         Ok(None)
///     }
/// }
/// ```
pub trait Transport {
    /// Associated error type
    type Error: core::fmt::Debug;

    /// Open an MQTT session with the broker.
    ///
    /// A transport may return `Ok(())` and still end up disconnected (for
    /// example when the broker answers CONNACK with a refusal); the supervisor
    /// checks [`Transport::is_connected`] afterwards.
    fn connect(&mut self, options: &ConnectOptions<'_>) -> Result<(), Self::Error>;

    /// Whether the session is currently up.
    fn is_connected(&self) -> bool;

    /// Detailed connection state, used for diagnostics after a failed connect.
    fn state(&self) -> ClientState;

    /// Publish `payload` to `topic` at QoS 0.
    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), Self::Error>;

    /// Subscribe to a topic filter.
    fn subscribe(&mut self, filter: &str) -> Result<(), Self::Error>;

    /// Remove a subscription.
    fn unsubscribe(&mut self, filter: &str) -> Result<(), Self::Error>;

    /// Service the connection and return the next received message, if any.
    fn poll(&mut self) -> Result<Option<PublishPacket>, Self::Error>;
}

/// Board services the supervisor relies on.
///
/// Implemented once per target: a monotonic clock, a stable hardware
/// identifier and a way to reset the chip.
pub trait Platform {
    /// Milliseconds since boot. Must be monotonic.
    fn uptime_ms(&self) -> u64;

    /// A hardware identifier (chip id, MAC tail, ...) used for the default
    /// client id.
    fn hardware_id(&self) -> u32;

    /// Reset the device.
    ///
    /// On real hardware this does not return. Host implementations may record
    /// the request and return; the supervisor then reports
    /// [`Error::RetriesExhausted`](crate::mqtt::Error::RetriesExhausted).
    fn restart(&mut self);
}
