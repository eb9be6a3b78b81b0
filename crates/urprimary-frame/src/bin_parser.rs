//! Big-endian field decoder over a borrowed byte slice.

use bytes::{Buf, Bytes};

use crate::error::ParseError;

/// A fixed-width value that can be decoded from the wire.
pub trait WireValue: Sized {
    /// Encoded size in bytes.
    const SIZE: usize;

    /// Decode one value. Callers guarantee at least `SIZE` bytes remain.
    fn read_from(buf: &mut &[u8]) -> Self;
}

macro_rules! wire_value {
    ($($ty:ty => $get:ident),* $(,)?) => {
        $(
            impl WireValue for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                fn read_from(buf: &mut &[u8]) -> Self {
                    buf.$get()
                }
            }
        )*
    };
}

wire_value! {
    u8 => get_u8,
    i8 => get_i8,
    u16 => get_u16,
    i16 => get_i16,
    u32 => get_u32,
    i32 => get_i32,
    u64 => get_u64,
    i64 => get_i64,
    f32 => get_f32,
    f64 => get_f64,
}

impl WireValue for bool {
    const SIZE: usize = 1;

    fn read_from(buf: &mut &[u8]) -> Self {
        buf.get_u8() != 0
    }
}

/// Cursor over one package body.
///
/// Every decode either consumes exactly the bytes of the requested shape or
/// fails with [`ParseError::OutOfBounds`] without moving the cursor.
#[derive(Debug, Clone)]
pub struct BinParser<'a> {
    buf: &'a [u8],
    consumed: usize,
}

impl<'a> BinParser<'a> {
    /// Start decoding at the beginning of `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, consumed: 0 }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.consumed
    }

    /// Bytes left to decode.
    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    /// Whether the body is fully consumed.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    fn ensure(&self, needed: usize) -> Result<(), ParseError> {
        if self.buf.len() < needed {
            return Err(ParseError::OutOfBounds {
                needed,
                remaining: self.buf.len(),
            });
        }
        Ok(())
    }

    /// Decode one fixed-width value.
    pub fn parse<T: WireValue>(&mut self) -> Result<T, ParseError> {
        self.ensure(T::SIZE)?;
        self.consumed += T::SIZE;
        Ok(T::read_from(&mut self.buf))
    }

    /// Decode a trailing value that older firmware may omit.
    ///
    /// An exhausted body yields `None`; a partially present value is still
    /// an error.
    pub fn parse_optional<T: WireValue>(&mut self) -> Result<Option<T>, ParseError> {
        if self.buf.is_empty() {
            return Ok(None);
        }
        self.parse().map(Some)
    }

    /// Decode a fixed-size array of values.
    pub fn parse_array<T: WireValue, const N: usize>(&mut self) -> Result<[T; N], ParseError> {
        self.ensure(T::SIZE * N)?;
        self.consumed += T::SIZE * N;
        Ok(std::array::from_fn(|_| T::read_from(&mut self.buf)))
    }

    /// Take `len` raw bytes.
    pub fn parse_bytes(&mut self, len: usize) -> Result<&'a [u8], ParseError> {
        self.ensure(len)?;
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        self.consumed += len;
        Ok(head)
    }

    /// Decode a string of exactly `len` bytes.
    pub fn parse_string(&mut self, len: usize) -> Result<String, ParseError> {
        self.parse_bytes(len)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Decode a string prefixed by a one-byte length.
    ///
    /// The cursor only moves if both prefix and string are present.
    pub fn parse_prefixed_string(&mut self) -> Result<String, ParseError> {
        let len = *self.buf.first().ok_or(ParseError::OutOfBounds {
            needed: 1,
            remaining: 0,
        })? as usize;
        self.ensure(1 + len)?;
        self.parse::<u8>()?;
        self.parse_string(len)
    }

    /// Take everything left in the body as raw bytes.
    pub fn parse_remainder(&mut self) -> Bytes {
        let len = self.buf.len();
        let rest = Bytes::copy_from_slice(self.buf);
        self.buf = &self.buf[len..];
        self.consumed += len;
        rest
    }

    /// Take everything left in the body as text.
    pub fn parse_remainder_string(&mut self) -> String {
        let len = self.buf.len();
        let text = String::from_utf8_lossy(self.buf).into_owned();
        self.buf = &self.buf[len..];
        self.consumed += len;
        text
    }

    /// Skip `len` bytes.
    pub fn skip(&mut self, len: usize) -> Result<(), ParseError> {
        self.parse_bytes(len).map(|_| ())
    }
}
