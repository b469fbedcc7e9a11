//! Tuples as ordered, heterogeneous field sequences.
//!
//! A tuple of fields encodes (or decodes) each element in declaration
//! order, exactly as if each field's own call were written out inline.
//! This is how a packet describes "all my fields, in order":
//!
//! ```rust
//! use cobble_packet::{Packet, VarInt};
//!
//! let packet = Packet::marshal(0x00, (VarInt(757), "localhost", 25565u16, VarInt(2))).unwrap();
//! assert_eq!(packet.data.len(), 2 + 10 + 2 + 1);
//! ```
//!
//! A tuple only implements [`Encode`] if every element does, and only
//! implements [`Decode`] if every element does, so a packet definition
//! missing a capability is rejected by the compiler.
//!
//! On failure nothing is undone. The error's byte count covers the
//! elements that completed plus whatever the failing element consumed.

use std::io::{Read, Write};

use crate::{Decode, Encode, PacketError};

impl Encode for () {
    fn write_to<W: Write + ?Sized>(&self, _w: &mut W) -> Result<usize, PacketError> {
        Ok(0)
    }
}

impl Decode for () {
    fn read_from<R: Read + ?Sized>(&mut self, _r: &mut R) -> Result<usize, PacketError> {
        Ok(0)
    }
}

macro_rules! tuple_field {
    ($($name:ident . $idx:tt),+) => {
        impl<$($name: Encode),+> Encode for ($($name,)+) {
            fn write_to<W: Write + ?Sized>(&self, w: &mut W) -> Result<usize, PacketError> {
                let mut n = 0;
                $(n += self.$idx.write_to(w).map_err(|e| e.after(n))?;)+
                Ok(n)
            }
        }

        impl<$($name: Decode),+> Decode for ($($name,)+) {
            fn read_from<R: Read + ?Sized>(&mut self, r: &mut R) -> Result<usize, PacketError> {
                let mut n = 0;
                $(n += self.$idx.read_from(r).map_err(|e| e.after(n))?;)+
                Ok(n)
            }
        }
    };
}

tuple_field!(T0.0);
tuple_field!(T0.0, T1.1);
tuple_field!(T0.0, T1.1, T2.2);
tuple_field!(T0.0, T1.1, T2.2, T3.3);
tuple_field!(T0.0, T1.1, T2.2, T3.3, T4.4);
tuple_field!(T0.0, T1.1, T2.2, T3.3, T4.4, T5.5);
tuple_field!(T0.0, T1.1, T2.2, T3.3, T4.4, T5.5, T6.6);
tuple_field!(T0.0, T1.1, T2.2, T3.3, T4.4, T5.5, T6.6, T7.7);
tuple_field!(T0.0, T1.1, T2.2, T3.3, T4.4, T5.5, T6.6, T7.7, T8.8);
tuple_field!(T0.0, T1.1, T2.2, T3.3, T4.4, T5.5, T6.6, T7.7, T8.8, T9.9);
tuple_field!(T0.0, T1.1, T2.2, T3.3, T4.4, T5.5, T6.6, T7.7, T8.8, T9.9, T10.10);
tuple_field!(T0.0, T1.1, T2.2, T3.3, T4.4, T5.5, T6.6, T7.7, T8.8, T9.9, T10.10, T11.11);
