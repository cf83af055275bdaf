//! Upstream link lifecycle state.

use std::fmt;

/// The lifecycle state of the single upstream link.
///
/// Transitions:
///
/// ```text
/// Disconnected → Connecting → Connected → Disconnected → …
///                     └──────(handshake fails)──┘
/// ```
///
/// The initial state is `Disconnected` and there is no terminal state:
/// the connector retries for the life of the process. At most one link
/// is `Connecting` or `Connected` at any instant, because the connector task
/// is sequential and only dials after the previous link has fully torn
/// down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No link; a reconnect may be pending.
    Disconnected,
    /// A dial and WebSocket handshake are in flight.
    Connecting,
    /// The link is up; `send` forwards to the wire.
    Connected,
}

impl LinkState {
    /// Returns `true` if `send` would reach the wire in this state.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_connected_is_connected() {
        assert!(LinkState::Connected.is_connected());
        assert!(!LinkState::Connecting.is_connected());
        assert!(!LinkState::Disconnected.is_connected());
    }

    #[test]
    fn test_display() {
        assert_eq!(LinkState::Disconnected.to_string(), "Disconnected");
        assert_eq!(LinkState::Connecting.to_string(), "Connecting");
        assert_eq!(LinkState::Connected.to_string(), "Connected");
    }
}
