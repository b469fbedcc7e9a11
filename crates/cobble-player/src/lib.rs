//! Connected players for Cobble.
//!
//! Each accepted connection becomes a [`Player`]: its identity, a
//! [`PacketQueue`] of outbound packets, and a single-slot [`ErrorCell`]
//! where any task may report why the connection must end.
//!
//! # How it fits in the stack
//!
//! ```text
//! Chat / handlers (above)  ← push packets with Player::write_packet
//!     ↕
//! Player Layer (this crate)  ← queue per connection, drained by one writer task
//!     ↕
//! Transport (below)  ← Connection::send / recv
//! ```

mod cell;
mod error;
mod player;
mod queue;

pub use cell::ErrorCell;
pub use error::{PlayerError, WritePacketError};
pub use player::{Gamemode, Packet757, Player};
pub use queue::PacketQueue;
