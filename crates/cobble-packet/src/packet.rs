//! The packet envelope: an opcode and its raw payload.

use bytes::Bytes;

use crate::{Decode, Encode, PacketError, VarInt};

/// A packet as exchanged with the transport.
///
/// `data` is a [`Bytes`] so a packet broadcast to many players shares one
/// payload buffer instead of copying it per recipient.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Packet {
    /// The opcode identifying the packet kind.
    pub id: i32,
    /// The encoded fields, without the opcode.
    pub data: Bytes,
}

impl Packet {
    /// Creates a packet from an opcode and an already encoded payload.
    pub fn new(id: i32, data: impl Into<Bytes>) -> Self {
        Self {
            id,
            data: data.into(),
        }
    }

    /// Encodes `fields` (usually a tuple) into a fresh packet.
    ///
    /// # Errors
    /// Returns [`PacketError`] if any field has no wire representation.
    /// Writing into memory cannot fail otherwise.
    pub fn marshal<T: Encode>(id: i32, fields: T) -> Result<Self, PacketError> {
        let mut buf = Vec::new();
        fields.write_to(&mut buf)?;
        Ok(Self::new(id, buf))
    }

    /// Decodes the payload into `fields` (usually a tuple of `&mut`
    /// destinations) and returns the number of bytes consumed.
    ///
    /// Trailing bytes after the last field are ignored; compare the return
    /// value with `data.len()` to reject them.
    ///
    /// # Errors
    /// Returns [`PacketError`] if the payload ends before every field is
    /// satisfied or holds malformed data.
    pub fn scan<T: Decode>(&self, mut fields: T) -> Result<usize, PacketError> {
        let mut payload: &[u8] = &self.data;
        fields.read_from(&mut payload)
    }

    /// Length of the `VarInt id ‖ data` body produced by [`pack`](Self::pack).
    pub fn packed_len(&self) -> usize {
        VarInt(self.id).encoded_len() + self.data.len()
    }

    /// Appends the `VarInt id ‖ data` body to `dst`.
    pub fn pack(&self, dst: &mut Vec<u8>) {
        dst.reserve(self.packed_len());
        // Writing into a Vec cannot fail.
        let _ = VarInt(self.id).write_to(dst);
        dst.extend_from_slice(&self.data);
    }

    /// Splits a `VarInt id ‖ data` body back into a packet without copying
    /// the payload.
    ///
    /// # Errors
    /// Returns [`PacketError`] if the opcode is truncated or oversized.
    pub fn unpack(body: Bytes) -> Result<Self, PacketError> {
        let mut id = VarInt(0);
        let mut cursor: &[u8] = &body;
        let n = id.read_from(&mut cursor)?;
        Ok(Self {
            id: id.0,
            data: body.slice(n..),
        })
    }
}
