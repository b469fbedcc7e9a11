//! Unified error type for the Cobble server.

use cobble_chat::ChatError;
use cobble_packet::PacketError;
use cobble_player::PlayerError;
use cobble_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum CobbleError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A field could not be encoded or decoded.
    #[error(transparent)]
    Packet(#[from] PacketError),

    /// A player's connection failed after login.
    #[error(transparent)]
    Player(#[from] PlayerError),

    /// The global chat actor is gone.
    #[error(transparent)]
    Chat(#[from] ChatError),

    /// The client broke the handshake or login sequence.
    #[error("login failed: {0}")]
    Login(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let cobble_err: CobbleError = err.into();
        assert!(matches!(cobble_err, CobbleError::Transport(_)));
        assert!(cobble_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_packet_error() {
        let err = PacketError::invalid("VarInt", "too long");
        let cobble_err: CobbleError = err.into();
        assert!(matches!(cobble_err, CobbleError::Packet(_)));
    }

    #[test]
    fn test_from_player_error() {
        let cobble_err: CobbleError = PlayerError::KeepAliveTimeout.into();
        assert!(matches!(cobble_err, CobbleError::Player(_)));
        assert_eq!(cobble_err.to_string(), "keep-alive timed out");
    }

    #[test]
    fn test_from_chat_error() {
        let cobble_err: CobbleError = ChatError::Stopped.into();
        assert!(matches!(cobble_err, CobbleError::Chat(_)));
    }
}
