//! Record trait
//!
//! Fixed-size element codec. The store sees opaque bytes; this trait is how
//! list elements map onto them.

use bytes::{Buf, BufMut};

/// A fixed-size record storable as a list element.
///
/// `SIZE` is the exact encoded width in bytes. `encode` must write exactly
/// `SIZE` bytes and `decode` must consume exactly `SIZE` bytes; the list
/// sizes its cells from this constant at file creation, so the width is
/// fixed for the life of the file.
///
/// Structured payloads compose the primitive impls field by field:
///
/// ```
/// use bytes::{Buf, BufMut};
/// use cellar::Record;
///
/// struct Reading {
///     sensor: u32,
///     value: i64,
/// }
///
/// impl Record for Reading {
///     const SIZE: usize = 12;
///
///     fn encode(&self, buf: &mut impl BufMut) {
///         self.sensor.encode(buf);
///         self.value.encode(buf);
///     }
///
///     fn decode(buf: &mut impl Buf) -> Self {
///         Self {
///             sensor: Record::decode(buf),
///             value: Record::decode(buf),
///         }
///     }
/// }
/// ```
pub trait Record: Sized {
    /// Exact encoded width in bytes
    const SIZE: usize;

    /// Write the element's bytes, little-endian
    fn encode(&self, buf: &mut impl BufMut);

    /// Read an element back from its bytes
    fn decode(buf: &mut impl Buf) -> Self;
}

macro_rules! int_record {
    ($($ty:ty => $put:ident, $get:ident, $size:expr;)*) => {
        $(
            impl Record for $ty {
                const SIZE: usize = $size;

                fn encode(&self, buf: &mut impl BufMut) {
                    buf.$put(*self);
                }

                fn decode(buf: &mut impl Buf) -> Self {
                    buf.$get()
                }
            }
        )*
    };
}

int_record! {
    i32 => put_i32_le, get_i32_le, 4;
    u32 => put_u32_le, get_u32_le, 4;
    i64 => put_i64_le, get_i64_le, 8;
    u64 => put_u64_le, get_u64_le, 8;
}

impl<const N: usize> Record for [u8; N] {
    const SIZE: usize = N;

    fn encode(&self, buf: &mut impl BufMut) {
        buf.put_slice(self);
    }

    fn decode(buf: &mut impl Buf) -> Self {
        let mut bytes = [0u8; N];
        buf.copy_to_slice(&mut bytes);
        bytes
    }
}
