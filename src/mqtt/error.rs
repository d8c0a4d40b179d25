//! Error type for supervisor and router operations

use crate::network::ClientState;

/// An error raised by the MQTT supervisor.
///
/// Like the rest of the crate it is a small `Copy` enum so it can be passed
/// around freely in `no_std` firmware.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// Publishing was refused because the client is in receive-only mode.
    SendDisabled,
    /// A composed topic does not fit the topic buffer.
    TopicTooLong,
    /// A last-will or init message does not fit its buffer.
    MessageTooLong,
    /// The broker connection could not be established.
    ConnectFailed(ClientState),
    /// The transport reported an error for a publish or subscription call.
    Transport,
    /// The reconnect ceiling was reached and a restart was requested.
    RetriesExhausted,
    /// A configuration document could not be parsed.
    InvalidConfig,
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::SendDisabled => defmt::write!(f, "SendDisabled"),
            Error::TopicTooLong => defmt::write!(f, "TopicTooLong"),
            Error::MessageTooLong => defmt::write!(f, "MessageTooLong"),
            Error::ConnectFailed(state) => {
                defmt::write!(f, "ConnectFailed(rc={})", state.code())
            }
            Error::Transport => defmt::write!(f, "Transport"),
            Error::RetriesExhausted => defmt::write!(f, "RetriesExhausted"),
            Error::InvalidConfig => defmt::write!(f, "InvalidConfig"),
        }
    }
}
