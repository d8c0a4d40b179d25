//! Connection and supervisor configuration.
//!
//! Both structures can be built in code or deserialized from a JSON document
//! (typically kept in flash next to the Wi-Fi credentials):
//!
//! ```rust
//! use mqtt_node::mqtt::{ConnectionConfig, SupervisorConfig};
//!
//! let conn = ConnectionConfig::from_json(
//!     r#"{"server": "192.168.1.10", "user": "node", "password": "secret"}"#,
//! ).unwrap();
//! assert_eq!(conn.port, 1883);
//! assert!(conn.client_id.is_none());
//!
//! let sup = SupervisorConfig::from_json(r#"{"max_retries": 3}"#).unwrap();
//! assert_eq!(sup.max_retries, 3);
//! assert_eq!(sup.retry_interval_ms, 5_000);
//! ```

use heapless::String;
use serde::Deserialize;

use super::Error;

/// Default MQTT port.
pub const DEFAULT_PORT: u16 = 1883;
/// Default delay between reconnect attempts.
pub const DEFAULT_RETRY_INTERVAL_MS: u64 = 5_000;
/// Default number of failed attempts before the device restarts.
pub const DEFAULT_MAX_RETRIES: u32 = 10;
/// Default cap on messages dispatched per poll.
pub const DEFAULT_MAX_MESSAGES_PER_POLL: usize = 16;

/// Maximum length of the broker host.
pub const MAX_SERVER_LEN: usize = 64;
/// Maximum length of the user name.
pub const MAX_USER_LEN: usize = 32;
/// Maximum length of the password.
pub const MAX_PASSWORD_LEN: usize = 64;
/// Maximum length of the client identifier.
pub const MAX_CLIENT_ID_LEN: usize = 32;

/// Scratch space for unescaping the longest string field.
const MAX_FIELD_LEN: usize = if MAX_SERVER_LEN > MAX_PASSWORD_LEN {
    MAX_SERVER_LEN
} else {
    MAX_PASSWORD_LEN
};

fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Broker address and credentials.
///
/// Empty `user`/`password` mean "connect anonymously". When `client_id` is
/// `None` the supervisor derives one from the platform hardware id.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConnectionConfig {
    /// Broker host name or IP address.
    pub server: String<MAX_SERVER_LEN>,
    /// Broker port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// User name, empty for none.
    #[serde(default)]
    pub user: String<MAX_USER_LEN>,
    /// Password, empty for none.
    #[serde(default)]
    pub password: String<MAX_PASSWORD_LEN>,
    /// Explicit client identifier.
    #[serde(default)]
    pub client_id: Option<String<MAX_CLIENT_ID_LEN>>,
}

impl ConnectionConfig {
    /// Configuration for `server` on the default port without credentials.
    pub fn new(server: &str) -> Result<Self, Error> {
        Ok(Self {
            server: String::try_from(server).map_err(|_| Error::InvalidConfig)?,
            port: DEFAULT_PORT,
            user: String::new(),
            password: String::new(),
            client_id: None,
        })
    }

    /// Use a non-default port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set user name and password.
    pub fn with_credentials(mut self, user: &str, password: &str) -> Result<Self, Error> {
        self.user = String::try_from(user).map_err(|_| Error::InvalidConfig)?;
        self.password = String::try_from(password).map_err(|_| Error::InvalidConfig)?;
        Ok(self)
    }

    /// Set an explicit client identifier. An empty id keeps the hardware default.
    pub fn with_client_id(mut self, client_id: &str) -> Result<Self, Error> {
        self.client_id = if client_id.is_empty() {
            None
        } else {
            Some(String::try_from(client_id).map_err(|_| Error::InvalidConfig)?)
        };
        Ok(self)
    }

    /// Parse a JSON document.
    ///
    /// String escapes are decoded, and an empty `client_id` is treated as
    /// absent.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let mut scratch = [0u8; MAX_FIELD_LEN];
        let (mut config, _) = serde_json_core::from_str_escaped::<Self>(json, &mut scratch)
            .map_err(|_| Error::InvalidConfig)?;
        if config.server.is_empty() {
            return Err(Error::InvalidConfig);
        }
        if config.client_id.as_ref().is_some_and(|id| id.is_empty()) {
            config.client_id = None;
        }
        Ok(config)
    }
}

/// Timing and limits of the connection supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Minimum time between two reconnect attempts.
    pub retry_interval_ms: u64,
    /// Consecutive failed attempts that trigger a restart. `0` never restarts.
    pub max_retries: u32,
    /// Upper bound on messages drained from the transport in one poll.
    pub max_messages_per_poll: usize,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            retry_interval_ms: DEFAULT_RETRY_INTERVAL_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            max_messages_per_poll: DEFAULT_MAX_MESSAGES_PER_POLL,
        }
    }
}

impl SupervisorConfig {
    /// Parse a JSON document. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json_core::from_str::<Self>(json)
            .map(|(config, _)| config)
            .map_err(|_| Error::InvalidConfig)
    }
}
