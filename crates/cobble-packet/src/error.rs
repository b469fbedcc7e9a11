//! Error types for the packet layer.
//!
//! Every variant remembers how many bytes the failing operation had already
//! moved when it gave up. Combinators shift that count with
//! [`PacketError::after`] as the error bubbles out, so the caller of
//! [`Packet::scan`](crate::Packet::scan) learns exactly how far decoding got.

use std::io;

/// Errors that can occur while encoding or decoding fields.
#[derive(Debug, thiserror::Error)]
pub enum PacketError {
    /// The source ran out of bytes before the field was complete.
    #[error("unexpected end of data after {processed} bytes")]
    UnexpectedEof {
        /// Bytes consumed before the source ran dry.
        processed: usize,
    },

    /// The underlying reader or writer failed.
    #[error("i/o failure after {processed} bytes: {source}")]
    Io {
        #[source]
        source: io::Error,
        /// Bytes moved before the failure.
        processed: usize,
    },

    /// The bytes (or the value being written) cannot be represented in
    /// the wire format: an oversized VarInt, invalid UTF-8, a negative
    /// array length, and so on.
    #[error("invalid {field} after {processed} bytes: {reason}")]
    Invalid {
        /// Which kind of field rejected the data.
        field: &'static str,
        /// Human-readable explanation.
        reason: String,
        /// Bytes moved before the value was rejected.
        processed: usize,
    },
}

impl PacketError {
    /// Builds an [`Invalid`](Self::Invalid) error with nothing processed yet.
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
            processed: 0,
        }
    }

    /// Number of bytes the failing operation handled before it failed.
    pub fn processed(&self) -> usize {
        match self {
            Self::UnexpectedEof { processed }
            | Self::Io { processed, .. }
            | Self::Invalid { processed, .. } => *processed,
        }
    }

    /// Accounts for `n` bytes that an enclosing field had already handled
    /// before the inner field failed.
    #[must_use]
    pub fn after(mut self, n: usize) -> Self {
        match &mut self {
            Self::UnexpectedEof { processed }
            | Self::Io { processed, .. }
            | Self::Invalid { processed, .. } => *processed += n,
        }
        self
    }

    /// Returns `true` if the source ended early.
    pub fn is_eof(&self) -> bool {
        matches!(self, Self::UnexpectedEof { .. })
    }
}
