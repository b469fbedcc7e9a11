//! Length-prefixed packet framing for byte streams.
//!
//! ```text
//! [VarInt frame length][VarInt packet id][payload ...]
//!  \_____ 1-3 bytes ___/\______ frame length bytes ______/
//! ```
//!
//! The codec plugs into `tokio_util::codec::{FramedRead, FramedWrite}`.
//! Partial frames are left in the buffer until the rest arrives.

use bytes::{Buf, BytesMut};
use cobble_packet::{Encode, Packet, VarInt};
use tokio_util::codec::{Decoder, Encoder};

use crate::TransportError;

/// Largest frame body accepted or produced (fits a three-byte VarInt).
pub const MAX_FRAME_LEN: usize = 2_097_151;

/// Bytes a frame length prefix may occupy.
const MAX_HEADER_LEN: usize = 3;

/// Splits a byte stream into [`Packet`]s and back.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameCodec;

impl Decoder for FrameCodec {
    type Item = Packet;
    type Error = TransportError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Packet>, TransportError> {
        // Peek the length prefix without consuming it.
        let mut len = 0usize;
        let mut header = 0usize;
        loop {
            let Some(&byte) = src.get(header) else {
                return Ok(None);
            };
            len |= usize::from(byte & 0x7F) << (7 * header);
            header += 1;
            if byte & 0x80 == 0 {
                break;
            }
            if header >= MAX_HEADER_LEN {
                return Err(TransportError::InvalidFrame(
                    "length prefix longer than 3 bytes".into(),
                ));
            }
        }

        if len == 0 {
            return Err(TransportError::InvalidFrame("empty frame".into()));
        }
        if len > MAX_FRAME_LEN {
            return Err(TransportError::InvalidFrame(format!(
                "frame of {len} bytes exceeds {MAX_FRAME_LEN}"
            )));
        }

        let total = header + len;
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }

        src.advance(header);
        let body = src.split_to(len).freeze();
        Ok(Some(Packet::unpack(body)?))
    }
}

impl Encoder<Packet> for FrameCodec {
    type Error = TransportError;

    fn encode(&mut self, packet: Packet, dst: &mut BytesMut) -> Result<(), TransportError> {
        let len = packet.packed_len();
        if len > MAX_FRAME_LEN {
            return Err(TransportError::InvalidFrame(format!(
                "packet {:#04x} of {len} bytes exceeds {MAX_FRAME_LEN}",
                packet.id
            )));
        }

        let mut frame = Vec::with_capacity(MAX_HEADER_LEN + len);
        // Bounded by MAX_FRAME_LEN above, so the cast cannot truncate.
        VarInt(len as i32).write_to(&mut frame)?;
        packet.pack(&mut frame);
        dst.extend_from_slice(&frame);
        Ok(())
    }
}
