//! Error types for the chat layer.

/// Errors returned by [`GlobalChat`](crate::GlobalChat) handles.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// The chat actor has stopped; its mailboxes are closed.
    #[error("global chat is not running")]
    Stopped,
}
