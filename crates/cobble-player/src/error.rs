//! Error types for the player layer.

use cobble_packet::PacketError;
use cobble_transport::TransportError;

/// A packet popped from the queue could not be written to the connection.
#[derive(Debug, thiserror::Error)]
#[error("send packet {id:#x} error: {source}")]
pub struct WritePacketError {
    /// Opcode of the packet that failed.
    pub id: i32,
    /// The underlying transport failure.
    #[source]
    pub source: TransportError,
}

/// Reasons a player's connection is torn down.
///
/// Stored in the player's [`ErrorCell`](crate::ErrorCell); only the first
/// one reported survives.
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    /// The writer task failed to deliver a packet.
    #[error(transparent)]
    WritePacket(#[from] WritePacketError),

    /// An inbound packet could not be decoded.
    #[error("malformed packet: {0}")]
    Packet(#[from] PacketError),

    /// The connection failed while reading.
    #[error("transport: {0}")]
    Transport(#[from] TransportError),

    /// The client did not answer a keep-alive in time.
    #[error("keep-alive timed out")]
    KeepAliveTimeout,

    /// A packet handler rejected the player.
    #[error("{0}")]
    Handler(String),
}
