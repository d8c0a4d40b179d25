//! Inbound command dispatch.

use super::topic::TopicSet;

/// Plain function handler, the default handler type of a fresh supervisor.
pub type Callback = fn(&str, &str, &str);

/// Receives commands addressed to this node.
///
/// Called synchronously from inside [`Supervisor::poll`](super::Supervisor::poll);
/// implementations must not block.
///
/// Any `FnMut(&str, &str, &str)` closure is a handler:
///
/// ```rust
/// use mqtt_node::mqtt::{MessageHandler, Router, TopicSet};
///
/// let mut last = None;
/// let mut router = Router::new(TopicSet::new("device1").unwrap())
///     .with_handler(|device: &str, action: &str, payload: &str| {
///         last = Some((device.len(), action.len(), payload.len()));
///     });
/// router.dispatch("cmnd/device1/relay/set", b"ON");
/// drop(router);
/// assert_eq!(last, Some((5, 3, 2)));
/// ```
pub trait MessageHandler {
    /// Handle `payload` sent to `action` of `device`.
    fn on_message(&mut self, device: &str, action: &str, payload: &str);
}

impl<F> MessageHandler for F
where
    F: FnMut(&str, &str, &str),
{
    fn on_message(&mut self, device: &str, action: &str, payload: &str) {
        self(device, action, payload)
    }
}

/// Outcome of routing one inbound message.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Dispatch {
    /// The handler was called.
    Delivered,
    /// The payload was empty; nothing was called.
    EmptyPayload,
    /// The topic is not under this node's command prefix.
    Unrouted,
    /// The payload is not valid UTF-8.
    InvalidPayload,
    /// No handler is installed.
    NoHandler,
}

/// Splits command topics and forwards them to the installed handler.
#[derive(Debug)]
pub struct Router<H = Callback> {
    topics: TopicSet,
    handler: Option<H>,
}

impl Router<Callback> {
    /// A router for `topics` without a handler.
    pub fn new(topics: TopicSet) -> Self {
        Self {
            topics,
            handler: None,
        }
    }
}

impl<H: MessageHandler> Router<H> {
    /// Replace the handler, possibly with one of a different type.
    pub fn with_handler<H2: MessageHandler>(self, handler: H2) -> Router<H2> {
        Router {
            topics: self.topics,
            handler: Some(handler),
        }
    }

    /// Install or replace the handler.
    pub fn set_handler(&mut self, handler: H) {
        self.handler = Some(handler);
    }

    /// The installed handler.
    pub fn handler_mut(&mut self) -> Option<&mut H> {
        self.handler.as_mut()
    }

    /// Topics used for parsing and composing.
    pub fn topics(&self) -> &TopicSet {
        &self.topics
    }

    /// Swap in a new topic set.
    pub fn set_topics(&mut self, topics: TopicSet) {
        self.topics = topics;
    }

    /// Route one message to the handler.
    pub fn dispatch(&mut self, topic: &str, payload: &[u8]) -> Dispatch {
        if payload.is_empty() {
            return Dispatch::EmptyPayload;
        }

        let Some(route) = self.topics.parse(topic) else {
            warn!("ignoring message on foreign topic {}", topic);
            return Dispatch::Unrouted;
        };

        let Ok(text) = core::str::from_utf8(payload) else {
            warn!("dropping non UTF-8 payload on {}", topic);
            return Dispatch::InvalidPayload;
        };

        debug!(
            "message received: topic={} device={} action={} payload={}",
            topic,
            route.device,
            route.action,
            text
        );

        match self.handler.as_mut() {
            Some(handler) => {
                handler.on_message(route.device, route.action, text);
                Dispatch::Delivered
            }
            None => Dispatch::NoHandler,
        }
    }
}
