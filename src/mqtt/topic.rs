//! Command/status topic naming.
//!
//! A node configured with base topic `device1` publishes its state under
//! `stat/device1[/<sub_topic>]` and listens for commands on `cmnd/device1/#`.
//! An incoming command topic is read as `cmnd/device1/<device path>/<action>`.

use core::fmt::Write as _;

use heapless::String;

use super::Error;
use crate::network::MAX_TOPIC_LEN;

/// Prefix of every outgoing (status) topic.
pub const STATUS_PREFIX: &str = "stat";
/// Prefix of every incoming (command) topic.
pub const COMMAND_PREFIX: &str = "cmnd";
/// Topic level separator.
pub const SEPARATOR: char = '/';

/// Maximum length of the node's base topic.
pub const MAX_BASE_TOPIC_LEN: usize = 64;
/// Capacity of the derived prefixes (`stat/<topic>`, `cmnd/<topic>/#`).
pub const MAX_PREFIX_LEN: usize = MAX_BASE_TOPIC_LEN + 8;

/// A command topic split into its parts.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Route<'a> {
    /// Path between the command prefix and the action; empty when the action
    /// sits directly under the prefix.
    pub device: &'a str,
    /// Last topic level.
    pub action: &'a str,
}

/// Topics derived from the node's base topic.
///
/// # Examples
///
/// ```rust
/// use mqtt_node::mqtt::TopicSet;
///
/// let topics = TopicSet::new("device1").unwrap();
/// assert_eq!(topics.status_prefix(), "stat/device1");
/// assert_eq!(topics.command_filter(), "cmnd/device1/#");
/// assert_eq!(topics.compose("temp").unwrap().as_str(), "stat/device1/temp");
///
/// let route = topics.parse("cmnd/device1/relay/set").unwrap();
/// assert_eq!((route.device, route.action), ("relay", "set"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TopicSet {
    status: String<MAX_PREFIX_LEN>,
    command: String<MAX_PREFIX_LEN>,
}

impl TopicSet {
    /// Derive the status prefix and command filter for `topic`.
    pub fn new(topic: &str) -> Result<Self, Error> {
        if topic.len() > MAX_BASE_TOPIC_LEN {
            return Err(Error::TopicTooLong);
        }
        let mut status = String::new();
        let mut command = String::new();
        write!(status, "{STATUS_PREFIX}{SEPARATOR}{topic}").map_err(|_| Error::TopicTooLong)?;
        write!(command, "{COMMAND_PREFIX}{SEPARATOR}{topic}{SEPARATOR}#")
            .map_err(|_| Error::TopicTooLong)?;
        Ok(Self { status, command })
    }

    /// `stat/<topic>`; empty before a base topic is configured.
    pub fn status_prefix(&self) -> &str {
        &self.status
    }

    /// `cmnd/<topic>/#`; empty before a base topic is configured.
    pub fn command_filter(&self) -> &str {
        &self.command
    }

    /// `cmnd/<topic>`, the part of the filter stripped from incoming topics.
    pub fn command_prefix(&self) -> &str {
        // "/#" is always the last two bytes of a non-empty filter
        let len = self.command.len().saturating_sub(2);
        &self.command[..len]
    }

    /// Outgoing topic for `sub_topic`: `stat/<topic>` or `stat/<topic>/<sub_topic>`.
    pub fn compose(&self, sub_topic: &str) -> Result<String<MAX_TOPIC_LEN>, Error> {
        let mut topic = String::new();
        topic
            .push_str(&self.status)
            .map_err(|_| Error::TopicTooLong)?;
        if !sub_topic.is_empty() {
            topic
                .push(SEPARATOR)
                .map_err(|_| Error::TopicTooLong)?;
            topic
                .push_str(sub_topic)
                .map_err(|_| Error::TopicTooLong)?;
        }
        Ok(topic)
    }

    /// Split an incoming command topic into device path and action.
    ///
    /// The action is everything after the last separator. Returns `None` for
    /// topics that do not live under this node's command prefix.
    pub fn parse<'t>(&self, topic: &'t str) -> Option<Route<'t>> {
        let (remaining, action) = match topic.rfind(SEPARATOR) {
            Some(index) => (&topic[..index], &topic[index + 1..]),
            None => ("", topic),
        };

        let prefix = self.command_prefix();
        if prefix.is_empty() {
            return Some(Route {
                device: remaining,
                action,
            });
        }

        let rest = remaining.strip_prefix(prefix)?;
        let device = if rest.is_empty() {
            rest
        } else {
            rest.strip_prefix(SEPARATOR)?
        };

        Some(Route { device, action })
    }
}
