//! A single-slot mailbox for the error that ends a connection.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

/// Holds at most one pending error.
///
/// Several tasks (handlers, the writer, the keep-alive check) may each hit
/// a failure; the first report wins and the rest are dropped. The reader
/// loop waits on [`failed`](Self::failed) to stop early.
#[derive(Debug)]
pub struct ErrorCell<E> {
    slot: Mutex<Option<E>>,
    notify: Notify,
}

impl<E> Default for ErrorCell<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> ErrorCell<E> {
    /// Creates an empty cell.
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            notify: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<E>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores `err` unless an error is already pending.
    ///
    /// Returns `false` when `err` was discarded.
    pub fn put(&self, err: E) -> bool {
        {
            let mut slot = self.lock();
            if slot.is_some() {
                return false;
            }
            *slot = Some(err);
        }
        self.notify.notify_waiters();
        true
    }

    /// Removes and returns the pending error, without waiting.
    pub fn take(&self) -> Option<E> {
        self.lock().take()
    }

    /// Returns `true` if an error is pending.
    pub fn is_set(&self) -> bool {
        self.lock().is_some()
    }

    /// Resolves once an error is pending. Does not consume it.
    pub async fn failed(&self) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.is_set() {
                return;
            }
            notified.await;
        }
    }
}
