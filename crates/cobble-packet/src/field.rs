//! The two field capabilities and the byte-counting I/O helpers they share.
//!
//! A field either knows how to write itself ([`Encode`]), how to read
//! itself ([`Decode`]), or both. Both report the number of bytes they moved.
//!
//! Decoding goes through `&mut self` rather than returning a fresh value:
//! a packet definition names *destinations*, and combinators like
//! [`Opt`](crate::Opt) rely on leaving a destination untouched when the
//! field is absent.

use std::cell::Cell;
use std::io::{self, Read, Write};

use crate::PacketError;

/// A value that can write itself to a byte sink.
pub trait Encode {
    /// Writes `self` to `w` and returns the number of bytes written.
    ///
    /// # Errors
    /// Returns [`PacketError`] if the sink fails or the value has no wire
    /// representation. The error's [`processed`](PacketError::processed)
    /// count tells how many bytes reached the sink first.
    fn write_to<W: Write + ?Sized>(&self, w: &mut W) -> Result<usize, PacketError>;
}

/// A value that can overwrite itself with data read from a byte source.
pub trait Decode {
    /// Reads into `self` from `r` and returns the number of bytes read.
    ///
    /// # Errors
    /// Returns [`PacketError`] on a short read or malformed data. On error
    /// `self` may be partially updated.
    fn read_from<R: Read + ?Sized>(&mut self, r: &mut R) -> Result<usize, PacketError>;
}

impl<T: Encode + ?Sized> Encode for &T {
    fn write_to<W: Write + ?Sized>(&self, w: &mut W) -> Result<usize, PacketError> {
        (**self).write_to(w)
    }
}

impl<T: Encode + ?Sized> Encode for &mut T {
    fn write_to<W: Write + ?Sized>(&self, w: &mut W) -> Result<usize, PacketError> {
        (**self).write_to(w)
    }
}

impl<T: Decode + ?Sized> Decode for &mut T {
    fn read_from<R: Read + ?Sized>(&mut self, r: &mut R) -> Result<usize, PacketError> {
        (**self).read_from(r)
    }
}

impl<T: Encode + Copy> Encode for Cell<T> {
    fn write_to<W: Write + ?Sized>(&self, w: &mut W) -> Result<usize, PacketError> {
        self.get().write_to(w)
    }
}

/// Decodes into a shared cell.
///
/// This lets one tuple both decode a value and hand a shared reference to
/// it to a later field, e.g. a flag read by an [`Opt`](crate::Opt)
/// predicate or a count read by a [`Counted`](crate::Counted) array.
/// The cell is only updated if decoding succeeds.
impl<T: Decode + Copy> Decode for &Cell<T> {
    fn read_from<R: Read + ?Sized>(&mut self, r: &mut R) -> Result<usize, PacketError> {
        let mut value = self.get();
        let n = value.read_from(r)?;
        self.set(value);
        Ok(n)
    }
}

/// Fills `buf` completely from `r`.
///
/// Unlike [`Read::read_exact`], a short read reports how many bytes were
/// consumed before the source ended.
///
/// # Errors
/// [`PacketError::UnexpectedEof`] if the source ends early,
/// [`PacketError::Io`] if it fails.
pub fn read_full<R: Read + ?Sized>(r: &mut R, buf: &mut [u8]) -> Result<usize, PacketError> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => return Err(PacketError::UnexpectedEof { processed: filled }),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(source) => {
                return Err(PacketError::Io {
                    source,
                    processed: filled,
                });
            }
        }
    }
    Ok(filled)
}

/// Writes all of `buf` to `w`, counting bytes accepted by the sink.
///
/// # Errors
/// [`PacketError::Io`] if the sink fails or stops accepting bytes.
pub fn write_full<W: Write + ?Sized>(w: &mut W, buf: &[u8]) -> Result<usize, PacketError> {
    let mut written = 0;
    while written < buf.len() {
        match w.write(&buf[written..]) {
            Ok(0) => {
                return Err(PacketError::Io {
                    source: io::ErrorKind::WriteZero.into(),
                    processed: written,
                });
            }
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(source) => {
                return Err(PacketError::Io {
                    source,
                    processed: written,
                });
            }
        }
    }
    Ok(written)
}
