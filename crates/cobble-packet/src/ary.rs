//! Array combinators: a sequence of homogeneous fields with a count.
//!
//! [`Ary`] is the common case, "Array of X" with its own length prefix. The
//! width of the prefix is a type parameter, independent of the element
//! type, so one combinator covers every prefix width the protocol uses:
//!
//! ```text
//! Ary<VarInt, Vec<i32>>   [1, 2, 3]  →  03 | 00 00 00 01 | 00 00 00 02 | 00 00 00 03
//! Ary<i64, Vec<i32>>      [1, 2, 3]  →  00 00 00 00 00 00 00 03 | ...
//! ```
//!
//! [`Counted`] covers the rarer layout where the count is not directly in
//! front of the elements: it was decoded earlier in the packet, or is
//! known from context.

use std::cell::Cell;
use std::fmt;
use std::io::{Read, Write};
use std::marker::PhantomData;

use crate::{Decode, Encode, PacketError, VarInt, VarLong};

/// Largest element count accepted when decoding.
///
/// Matches the largest legal packet payload: even one-byte elements could
/// not exceed it, so a bigger prefix can only be garbage or an attack.
pub const MAX_ARRAY_LEN: usize = 2_097_151;

// ---------------------------------------------------------------------------
// LengthPrefix
// ---------------------------------------------------------------------------

/// An integer field type that can carry an element count.
pub trait LengthPrefix: Encode + Decode + Default + Copy {
    /// Converts an in-memory count into this wire type, if it fits.
    fn from_len(len: usize) -> Option<Self>;

    /// Converts a decoded value back into a count. `None` for negatives.
    fn to_len(self) -> Option<usize>;
}

macro_rules! length_prefix {
    ($($ty:ty),* $(,)?) => {$(
        impl LengthPrefix for $ty {
            fn from_len(len: usize) -> Option<Self> {
                <$ty>::try_from(len).ok()
            }

            fn to_len(self) -> Option<usize> {
                usize::try_from(self).ok()
            }
        }
    )*};
}

length_prefix!(i8, u8, i16, u16, i32, i64);

impl LengthPrefix for VarInt {
    fn from_len(len: usize) -> Option<Self> {
        i32::try_from(len).ok().map(VarInt)
    }

    fn to_len(self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }
}

impl LengthPrefix for VarLong {
    fn from_len(len: usize) -> Option<Self> {
        i64::try_from(len).ok().map(VarLong)
    }

    fn to_len(self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }
}

fn checked_len(len: Option<usize>) -> Result<usize, PacketError> {
    match len {
        Some(len) if len <= MAX_ARRAY_LEN => Ok(len),
        Some(len) => Err(PacketError::invalid(
            "array length",
            format!("{len} exceeds the {MAX_ARRAY_LEN} element limit"),
        )),
        None => Err(PacketError::invalid("array length", "negative count")),
    }
}

// ---------------------------------------------------------------------------
// Element containers
// ---------------------------------------------------------------------------

/// A container an array combinator can encode from.
pub trait Elements {
    /// The element field type.
    type Item;

    /// The elements, in wire order.
    fn elements(&self) -> &[Self::Item];
}

/// A container an array combinator can decode into.
pub trait ElementsMut: Elements {
    /// The backing vector, to be resized to the decoded count.
    fn elements_mut(&mut self) -> &mut Vec<Self::Item>;
}

impl<A> Elements for Vec<A> {
    type Item = A;

    fn elements(&self) -> &[A] {
        self
    }
}

impl<A> ElementsMut for Vec<A> {
    fn elements_mut(&mut self) -> &mut Vec<A> {
        self
    }
}

impl<A> Elements for &Vec<A> {
    type Item = A;

    fn elements(&self) -> &[A] {
        self
    }
}

impl<A> Elements for &mut Vec<A> {
    type Item = A;

    fn elements(&self) -> &[A] {
        self
    }
}

impl<A> ElementsMut for &mut Vec<A> {
    fn elements_mut(&mut self) -> &mut Vec<A> {
        self
    }
}

impl<A> Elements for &[A] {
    type Item = A;

    fn elements(&self) -> &[A] {
        self
    }
}

impl<A, const N: usize> Elements for [A; N] {
    type Item = A;

    fn elements(&self) -> &[A] {
        self
    }
}

/// Encodes `items` in order, counting from `start` bytes already written.
fn write_items<W, A>(w: &mut W, items: &[A], start: usize) -> Result<usize, PacketError>
where
    W: Write + ?Sized,
    A: Encode,
{
    let mut n = start;
    for item in items {
        n += item.write_to(w).map_err(|e| e.after(n))?;
    }
    Ok(n)
}

/// Elements reserved up front when decoding; the rest grow as they arrive.
const PREALLOC_LIMIT: usize = 1024;

/// Replaces `items` with `count` elements decoded one by one.
///
/// Space is reserved as elements are read, so a large prefix alone costs
/// nothing. On failure `items` holds the elements read so far, the failing
/// one last and partially decoded.
fn read_items<R, A>(
    r: &mut R,
    items: &mut Vec<A>,
    count: usize,
    start: usize,
) -> Result<usize, PacketError>
where
    R: Read + ?Sized,
    A: Decode + Default,
{
    items.clear();
    items.reserve(count.min(PREALLOC_LIMIT));
    let mut n = start;
    for _ in 0..count {
        let mut item = A::default();
        let result = item.read_from(r);
        items.push(item);
        n += result.map_err(|e| e.after(n))?;
    }
    Ok(n)
}

// ---------------------------------------------------------------------------
// Ary
// ---------------------------------------------------------------------------

/// "Array of X" with a length prefix of wire type `L`.
///
/// `C` is the container: an owned `Vec<A>`, or a borrowed `&Vec<A>` /
/// `&[A]` to encode without copying, or `&mut Vec<A>` to decode straight
/// into a caller's vector.
///
/// A successful decode leaves exactly as many elements as the prefix said.
/// If an element fails, the container is cut short after it and the whole
/// sequence must be treated as garbage.
pub struct Ary<L, C> {
    items: C,
    prefix: PhantomData<fn() -> L>,
}

impl<L, C> Ary<L, C> {
    /// Wraps a container.
    pub fn new(items: C) -> Self {
        Self {
            items,
            prefix: PhantomData,
        }
    }

    /// Unwraps the container.
    pub fn into_inner(self) -> C {
        self.items
    }

    /// Borrows the container.
    pub fn get(&self) -> &C {
        &self.items
    }
}

impl<L, C: Default> Default for Ary<L, C> {
    fn default() -> Self {
        Self::new(C::default())
    }
}

impl<L, C: Clone> Clone for Ary<L, C> {
    fn clone(&self) -> Self {
        Self::new(self.items.clone())
    }
}

impl<L, C: fmt::Debug> fmt::Debug for Ary<L, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Ary").field(&self.items).finish()
    }
}

impl<L, C: PartialEq> PartialEq for Ary<L, C> {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl<L, A> From<Vec<A>> for Ary<L, Vec<A>> {
    fn from(items: Vec<A>) -> Self {
        Self::new(items)
    }
}

impl<L, C> Encode for Ary<L, C>
where
    L: LengthPrefix,
    C: Elements,
    C::Item: Encode,
{
    fn write_to<W: Write + ?Sized>(&self, w: &mut W) -> Result<usize, PacketError> {
        let items = self.items.elements();
        let len = L::from_len(items.len()).ok_or_else(|| {
            PacketError::invalid(
                "array length",
                format!("{} elements do not fit the length prefix", items.len()),
            )
        })?;
        let n = len.write_to(w)?;
        write_items(w, items, n)
    }
}

impl<L, C> Decode for Ary<L, C>
where
    L: LengthPrefix,
    C: ElementsMut,
    C::Item: Decode + Default,
{
    fn read_from<R: Read + ?Sized>(&mut self, r: &mut R) -> Result<usize, PacketError> {
        let mut len = L::default();
        let n = len.read_from(r)?;
        let count = checked_len(len.to_len()).map_err(|e| e.after(n))?;
        read_items(r, self.items.elements_mut(), count, n)
    }
}

// ---------------------------------------------------------------------------
// Counted
// ---------------------------------------------------------------------------

/// Something that holds an element count discovered at run time.
pub trait LengthSource {
    /// The current count, or `None` if it is negative.
    fn current_len(&self) -> Option<usize>;
}

impl<L: LengthPrefix> LengthSource for Cell<L> {
    fn current_len(&self) -> Option<usize> {
        self.get().to_len()
    }
}

/// Where a [`Counted`] array gets its element count.
#[derive(Clone, Copy)]
pub enum Count<'a> {
    /// A count known up front. Mostly useful when encoding.
    Fixed(usize),
    /// A count read at the moment of use, typically a `Cell` that an
    /// earlier field of the same tuple decoded into.
    Bound(&'a dyn LengthSource),
}

impl Count<'_> {
    fn resolve(&self) -> Result<usize, PacketError> {
        match self {
            Count::Fixed(len) => checked_len(Some(*len)),
            Count::Bound(source) => checked_len(source.current_len()),
        }
    }
}

impl fmt::Debug for Count<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Count::Fixed(len) => f.debug_tuple("Fixed").field(len).finish(),
            Count::Bound(source) => f
                .debug_tuple("Bound")
                .field(&source.current_len())
                .finish(),
        }
    }
}

/// An array with no prefix of its own; the count comes from a [`Count`].
///
/// ```rust
/// use std::cell::Cell;
/// use cobble_packet::{Counted, Packet, VarInt};
///
/// let packet = Packet::new(0, vec![2, 5, 6]);
/// let count = Cell::new(VarInt(0));
/// let mut bytes: Vec<u8> = Vec::new();
/// packet.scan((&count, Counted::bound(&count, &mut bytes))).unwrap();
/// assert_eq!(bytes, vec![5, 6]);
/// ```
#[derive(Debug)]
pub struct Counted<'a, C> {
    count: Count<'a>,
    items: C,
}

impl<'a, C> Counted<'a, C> {
    /// An array whose count is fixed up front.
    pub fn fixed(len: usize, items: C) -> Self {
        Self {
            count: Count::Fixed(len),
            items,
        }
    }

    /// An array whose count is read from `source` when the field runs.
    pub fn bound(source: &'a dyn LengthSource, items: C) -> Self {
        Self {
            count: Count::Bound(source),
            items,
        }
    }

    /// Unwraps the container.
    pub fn into_inner(self) -> C {
        self.items
    }
}

impl<C> Encode for Counted<'_, C>
where
    C: Elements,
    C::Item: Encode,
{
    fn write_to<W: Write + ?Sized>(&self, w: &mut W) -> Result<usize, PacketError> {
        let count = self.count.resolve()?;
        let items = self.items.elements();
        if items.len() != count {
            return Err(PacketError::invalid(
                "array length",
                format!("expected {count} elements, have {}", items.len()),
            ));
        }
        write_items(w, items, 0)
    }
}

impl<C> Decode for Counted<'_, C>
where
    C: ElementsMut,
    C::Item: Decode + Default,
{
    fn read_from<R: Read + ?Sized>(&mut self, r: &mut R) -> Result<usize, PacketError> {
        let count = self.count.resolve()?;
        read_items(r, self.items.elements_mut(), count, 0)
    }
}
