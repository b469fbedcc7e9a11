//! Primitive field kinds and their wire layouts.
//!
//! Plain Rust types map onto the fixed-width protocol types directly:
//!
//! | Rust          | Wire                                   |
//! |---------------|----------------------------------------|
//! | `bool`        | one byte, `0x00` or `0x01`             |
//! | `i8` / `u8`   | one byte                               |
//! | `i16` / `u16` | two bytes, big-endian                  |
//! | `i32` / `i64` | four / eight bytes, big-endian         |
//! | `f32` / `f64` | IEEE-754, big-endian                   |
//! | `String`      | [`VarInt`] byte length, then UTF-8     |
//! | `Uuid`        | sixteen bytes, big-endian              |
//!
//! Variable-width integers and raw byte blobs get newtypes so their wire
//! form can't be confused with the fixed-width one.

use std::fmt;
use std::io::{Read, Write};

use uuid::Uuid;

use crate::{read_full, write_full, Decode, Encode, PacketError, MAX_ARRAY_LEN};

/// Longest string payload, in bytes (32767 UTF-16 units, up to 4 bytes each).
pub const MAX_STRING_BYTES: usize = 32767 * 4;

// ---------------------------------------------------------------------------
// Fixed-width numbers
// ---------------------------------------------------------------------------

macro_rules! fixed_width {
    ($($ty:ty),* $(,)?) => {$(
        impl Encode for $ty {
            fn write_to<W: Write + ?Sized>(&self, w: &mut W) -> Result<usize, PacketError> {
                write_full(w, &self.to_be_bytes())
            }
        }

        impl Decode for $ty {
            fn read_from<R: Read + ?Sized>(&mut self, r: &mut R) -> Result<usize, PacketError> {
                let mut buf = [0u8; std::mem::size_of::<$ty>()];
                let n = read_full(r, &mut buf)?;
                *self = <$ty>::from_be_bytes(buf);
                Ok(n)
            }
        }
    )*};
}

fixed_width!(i8, u8, i16, u16, i32, i64, f32, f64);

impl Encode for bool {
    fn write_to<W: Write + ?Sized>(&self, w: &mut W) -> Result<usize, PacketError> {
        write_full(w, &[u8::from(*self)])
    }
}

impl Decode for bool {
    fn read_from<R: Read + ?Sized>(&mut self, r: &mut R) -> Result<usize, PacketError> {
        let mut buf = [0u8; 1];
        let n = read_full(r, &mut buf)?;
        *self = match buf[0] {
            0x00 => false,
            0x01 => true,
            other => {
                return Err(PacketError::invalid(
                    "Boolean",
                    format!("byte {other:#04x} is neither 0 nor 1"),
                )
                .after(n));
            }
        };
        Ok(n)
    }
}

// ---------------------------------------------------------------------------
// VarInt / VarLong
// ---------------------------------------------------------------------------

macro_rules! var_int {
    ($name:ident, $signed:ty, $unsigned:ty, $max_len:expr, $label:literal) => {
        #[doc = concat!("A ", $label, ": little-endian base-128 groups of the two's complement bit pattern.")]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(pub $signed);

        impl $name {
            /// Maximum number of bytes on the wire.
            pub const MAX_LEN: usize = $max_len;

            /// Number of bytes this value occupies on the wire.
            pub fn encoded_len(self) -> usize {
                let mut value = self.0 as $unsigned;
                let mut len = 1;
                while value >= 0x80 {
                    value >>= 7;
                    len += 1;
                }
                len
            }
        }

        impl Encode for $name {
            fn write_to<W: Write + ?Sized>(&self, w: &mut W) -> Result<usize, PacketError> {
                let mut value = self.0 as $unsigned;
                let mut buf = [0u8; $max_len];
                let mut len = 0;
                loop {
                    let byte = (value & 0x7F) as u8;
                    value >>= 7;
                    if value == 0 {
                        buf[len] = byte;
                        len += 1;
                        break;
                    }
                    buf[len] = byte | 0x80;
                    len += 1;
                }
                write_full(w, &buf[..len])
            }
        }

        impl Decode for $name {
            fn read_from<R: Read + ?Sized>(&mut self, r: &mut R) -> Result<usize, PacketError> {
                let mut value: $unsigned = 0;
                let mut n = 0;
                loop {
                    let mut byte = [0u8; 1];
                    read_full(r, &mut byte).map_err(|e| e.after(n))?;
                    value |= <$unsigned>::from(byte[0] & 0x7F) << (7 * n);
                    n += 1;
                    if byte[0] & 0x80 == 0 {
                        break;
                    }
                    if n >= $max_len {
                        return Err(PacketError::invalid($label, "too big").after(n));
                    }
                }
                self.0 = value as $signed;
                Ok(n)
            }
        }

        impl From<$signed> for $name {
            fn from(value: $signed) -> Self {
                Self(value)
            }
        }

        impl From<$name> for $signed {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

var_int!(VarInt, i32, u32, 5, "VarInt");
var_int!(VarLong, i64, u64, 10, "VarLong");

// ---------------------------------------------------------------------------
// Strings
// ---------------------------------------------------------------------------

impl Encode for str {
    fn write_to<W: Write + ?Sized>(&self, w: &mut W) -> Result<usize, PacketError> {
        if self.len() > MAX_STRING_BYTES {
            return Err(PacketError::invalid(
                "String",
                format!("{} bytes exceeds the {MAX_STRING_BYTES} byte limit", self.len()),
            ));
        }
        // Bounded by MAX_STRING_BYTES above, so the cast cannot truncate.
        let n = VarInt(self.len() as i32).write_to(w)?;
        let body = write_full(w, self.as_bytes()).map_err(|e| e.after(n))?;
        Ok(n + body)
    }
}

impl Encode for String {
    fn write_to<W: Write + ?Sized>(&self, w: &mut W) -> Result<usize, PacketError> {
        self.as_str().write_to(w)
    }
}

impl Decode for String {
    fn read_from<R: Read + ?Sized>(&mut self, r: &mut R) -> Result<usize, PacketError> {
        let mut len = VarInt(0);
        let n = len.read_from(r)?;
        let len = usize::try_from(len.0)
            .ok()
            .filter(|&len| len <= MAX_STRING_BYTES)
            .ok_or_else(|| {
                PacketError::invalid("String", format!("length {len} out of range")).after(n)
            })?;

        let mut buf = vec![0u8; len];
        let body = read_full(r, &mut buf).map_err(|e| e.after(n))?;
        *self = String::from_utf8(buf)
            .map_err(|e| PacketError::invalid("String", e.to_string()).after(n + body))?;
        Ok(n + body)
    }
}

// ---------------------------------------------------------------------------
// UUID
// ---------------------------------------------------------------------------

impl Encode for Uuid {
    fn write_to<W: Write + ?Sized>(&self, w: &mut W) -> Result<usize, PacketError> {
        write_full(w, self.as_bytes())
    }
}

impl Decode for Uuid {
    fn read_from<R: Read + ?Sized>(&mut self, r: &mut R) -> Result<usize, PacketError> {
        let mut buf = [0u8; 16];
        let n = read_full(r, &mut buf)?;
        *self = Uuid::from_bytes(buf);
        Ok(n)
    }
}

// ---------------------------------------------------------------------------
// ByteArray
// ---------------------------------------------------------------------------

/// A [`VarInt`]-length-prefixed blob of raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ByteArray(pub Vec<u8>);

impl Encode for ByteArray {
    fn write_to<W: Write + ?Sized>(&self, w: &mut W) -> Result<usize, PacketError> {
        let len = i32::try_from(self.0.len()).map_err(|_| {
            PacketError::invalid("ByteArray", format!("{} bytes is too long", self.0.len()))
        })?;
        let n = VarInt(len).write_to(w)?;
        let body = write_full(w, &self.0).map_err(|e| e.after(n))?;
        Ok(n + body)
    }
}

impl Decode for ByteArray {
    fn read_from<R: Read + ?Sized>(&mut self, r: &mut R) -> Result<usize, PacketError> {
        let mut len = VarInt(0);
        let n = len.read_from(r)?;
        let len = usize::try_from(len.0)
            .ok()
            .filter(|&len| len <= MAX_ARRAY_LEN)
            .ok_or_else(|| {
                PacketError::invalid("ByteArray", format!("length {len} out of range")).after(n)
            })?;

        self.0.clear();
        self.0.resize(len, 0);
        let body = read_full(r, &mut self.0).map_err(|e| e.after(n))?;
        Ok(n + body)
    }
}

impl From<Vec<u8>> for ByteArray {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}
