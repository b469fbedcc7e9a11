//! Optional fields: present on the wire only when a condition holds.
//!
//! Presence is resolved when the field is actually encoded or decoded, not
//! when the [`Opt`] is built. That matters for decoding: the condition is
//! usually a flag decoded a moment earlier by the same tuple.
//!
//! ```rust
//! use std::cell::Cell;
//! use cobble_packet::{Opt, Packet};
//!
//! let packet = Packet::new(0, vec![0x01, 4, b'T', b'n', b'z', b'e']);
//! let has = Cell::new(false);
//! let mut name = String::new();
//! packet.scan((&has, Opt::when(|| has.get(), &mut name))).unwrap();
//! assert_eq!(name, "Tnze");
//! ```

use std::io::{Read, Write};

use crate::{Decode, Encode, PacketError};

/// Decides whether an [`Opt`] field is on the wire.
#[derive(Debug, Clone, Copy)]
pub enum Presence<F = fn() -> bool> {
    /// Known when the packet is defined.
    Value(bool),
    /// Evaluated each time the field is encoded or decoded.
    Predicate(F),
}

impl<F: Fn() -> bool> Presence<F> {
    /// Resolves the condition now.
    pub fn resolve(&self) -> bool {
        match self {
            Presence::Value(has) => *has,
            Presence::Predicate(predicate) => predicate(),
        }
    }
}

/// A field guarded by a [`Presence`].
///
/// When absent, encoding writes nothing, decoding reads nothing, and the
/// wrapped destination keeps whatever value it had.
#[derive(Debug, Clone)]
pub struct Opt<T, F = fn() -> bool> {
    has: Presence<F>,
    field: T,
}

impl<T> Opt<T> {
    /// A field whose presence is known up front.
    pub fn new(has: bool, field: T) -> Self {
        Self {
            has: Presence::Value(has),
            field,
        }
    }
}

impl<T, F: Fn() -> bool> Opt<T, F> {
    /// A field whose presence is decided by `predicate` at the moment of use.
    pub fn when(predicate: F, field: T) -> Self {
        Self {
            has: Presence::Predicate(predicate),
            field,
        }
    }

    /// A field guarded by an explicit [`Presence`].
    pub fn with_presence(has: Presence<F>, field: T) -> Self {
        Self { has, field }
    }

    /// Resolves the presence condition now.
    pub fn is_present(&self) -> bool {
        self.has.resolve()
    }

    /// Unwraps the field.
    pub fn into_inner(self) -> T {
        self.field
    }
}

impl<T: Encode, F: Fn() -> bool> Encode for Opt<T, F> {
    fn write_to<W: Write + ?Sized>(&self, w: &mut W) -> Result<usize, PacketError> {
        if self.has.resolve() {
            self.field.write_to(w)
        } else {
            Ok(0)
        }
    }
}

impl<T: Decode, F: Fn() -> bool> Decode for Opt<T, F> {
    fn read_from<R: Read + ?Sized>(&mut self, r: &mut R) -> Result<usize, PacketError> {
        if self.has.resolve() {
            self.field.read_from(r)
        } else {
            Ok(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn test_absent_writes_nothing() {
        let mut buf = Vec::new();
        assert_eq!(Opt::new(false, 7i32).write_to(&mut buf).unwrap(), 0);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_predicate_is_evaluated_late() {
        let flag = Cell::new(false);
        let opt = Opt::when(|| flag.get(), 1u8);
        assert!(!opt.is_present());
        flag.set(true);
        assert!(opt.is_present());

        let mut buf = Vec::new();
        assert_eq!(opt.write_to(&mut buf).unwrap(), 1);
        assert_eq!(buf, vec![1]);
    }

    #[test]
    fn test_present_errors_propagate() {
        let mut value = 0i64;
        let mut src: &[u8] = &[0, 0, 0];
        let err = Opt::new(true, &mut value).read_from(&mut src).unwrap_err();
        assert!(err.is_eof());
        assert_eq!(err.processed(), 3);
    }
}
