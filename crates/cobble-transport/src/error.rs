use cobble_packet::PacketError;

/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The connection was closed.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Sending data failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Binding or accepting connections failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// The underlying stream failed while framing.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The peer sent a frame that violates the framing rules.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    /// The frame body did not start with a valid opcode.
    #[error("malformed packet: {0}")]
    Packet(#[from] PacketError),

    /// The transport was shut down.
    #[error("transport shut down")]
    Shutdown,
}
