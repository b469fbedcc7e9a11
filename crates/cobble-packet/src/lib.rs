//! Packet layer for Cobble.
//!
//! This crate defines how individual protocol fields turn into bytes and
//! back, and how whole packets are assembled from those fields:
//!
//! - **Fields** ([`Encode`], [`Decode`]) — the two capabilities a value can
//!   have. Primitive kinds (`i32`, [`VarInt`], `String`, `Uuid`, ...) live
//!   in `types`.
//! - **Combinators** ([`Ary`], [`Counted`], [`Opt`], tuples) — fields built
//!   out of other fields.
//! - **Envelope** ([`Packet`]) — an opcode plus a payload, built with
//!   [`Packet::marshal`] and read with [`Packet::scan`].
//! - **Errors** ([`PacketError`]) — short reads, sink failures, and values
//!   the wire format cannot represent.
//!
//! # Architecture
//!
//! The packet layer knows nothing about sockets or players. A transport
//! moves [`Packet`]s; the server decodes them with the combinators here.
//!
//! ```text
//! Transport (frames) → Packet (id + bytes) → Tuple/Ary/Opt (typed fields)
//! ```
//!
//! # Example
//!
//! ```rust
//! use cobble_packet::{Ary, Packet, VarInt};
//!
//! let names = vec![String::from("Tnze"), String::new()];
//! let packet = Packet::marshal(0x10, (VarInt(7), Ary::<VarInt, _>::new(&names))).unwrap();
//!
//! let mut id = VarInt(0);
//! let mut decoded = Ary::<VarInt, Vec<String>>::default();
//! packet.scan((&mut id, &mut decoded)).unwrap();
//! assert_eq!(id, VarInt(7));
//! assert_eq!(decoded.into_inner(), names);
//! ```

mod ary;
mod error;
mod field;
mod opt;
mod packet;
pub mod packetid;
mod tuple;
mod types;

pub use ary::{Ary, Count, Counted, Elements, ElementsMut, LengthPrefix, LengthSource, MAX_ARRAY_LEN};
pub use error::PacketError;
pub use field::{read_full, write_full, Decode, Encode};
pub use opt::{Opt, Presence};
pub use packet::Packet;
pub use types::{ByteArray, VarInt, VarLong, MAX_STRING_BYTES};
