//! The per-connection outbound packet queue.
//!
//! Any number of producers (handlers, the chat actor, the keep-alive
//! timer) push; exactly one writer task pulls and hands packets to the
//! transport. Pushing never waits, so a slow client only grows its own
//! queue instead of stalling whoever is broadcasting.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use cobble_packet::Packet;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct State {
    packets: VecDeque<Packet>,
    closed: bool,
}

/// An unbounded FIFO of packets with a one-way open → closed switch.
///
/// One lock guards both the contents and the closed flag, so a push can
/// never slip in after a close has been observed.
#[derive(Debug, Default)]
pub struct PacketQueue {
    state: Mutex<State>,
    notify: Notify,
}

impl PacketQueue {
    /// Creates an open, empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `packet` and wakes one waiting puller.
    ///
    /// On a closed queue the packet is dropped.
    pub fn push(&self, packet: Packet) {
        {
            let mut state = self.lock();
            if state.closed {
                tracing::trace!(id = packet.id, "push on closed queue dropped");
                return;
            }
            state.packets.push_back(packet);
        }
        self.notify.notify_one();
    }

    /// Waits for the oldest packet.
    ///
    /// Returns `None` once the queue is closed, even if packets were still
    /// pending when it was.
    pub async fn pull(&self) -> Option<Packet> {
        loop {
            // Register interest before looking, so a push or close landing
            // between the check and the await still wakes us.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.lock();
                if state.closed {
                    return None;
                }
                if let Some(packet) = state.packets.pop_front() {
                    return Some(packet);
                }
            }

            notified.await;
        }
    }

    /// Closes the queue and wakes every pending puller.
    ///
    /// Undelivered packets are discarded. Closing twice is harmless.
    pub fn close(&self) {
        let dropped = {
            let mut state = self.lock();
            state.closed = true;
            let dropped = state.packets.len();
            state.packets.clear();
            dropped
        };
        if dropped > 0 {
            tracing::debug!(dropped, "queue closed with pending packets");
        }
        self.notify.notify_waiters();
    }

    /// Number of packets waiting to be pulled.
    pub fn len(&self) -> usize {
        self.lock().packets.len()
    }

    /// Returns `true` if no packets are waiting.
    pub fn is_empty(&self) -> bool {
        self.lock().packets.is_empty()
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}
