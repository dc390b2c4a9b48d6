//! Tagged variable-width integers.
//!
//! A lead byte, read as `i8`, in `[-120, 127]` is the value itself. The eight
//! codes below `-120` name the width of a little-endian payload that follows:
//!
//! | code | payload |
//! |------|---------|
//! | -121 | `u8`    |
//! | -122 | `i8`    |
//! | -123 | `u16`   |
//! | -124 | `i16`   |
//! | -125 | `u32`   |
//! | -126 | `i32`   |
//! | -127 | `u64`   |
//! | -128 | `i64`   |
//!
//! The encoder always picks the smallest form and prefers the unsigned code
//! for positive values.
//!
//! ```
//! use wirecast_core::varint;
//!
//! let mut buf = [0u8; varint::MAX_LEN];
//! assert_eq!(varint::encode(127u32, &mut buf).unwrap(), 1);
//! assert_eq!(varint::encode(128u32, &mut buf).unwrap(), 2);
//! assert_eq!(&buf[..2], &[varint::code::BYTE as u8, 128]);
//!
//! let (value, used): (u32, usize) = varint::decode(&buf).unwrap();
//! assert_eq!((value, used), (128, 2));
//! ```

use crate::{Result, WireError};

/// Smallest value carried directly in the lead byte.
pub const MIN_SINGLE: i8 = -120;

/// Largest value carried directly in the lead byte.
pub const MAX_SINGLE: i8 = 127;

/// Longest encoding: code byte plus an 8-byte payload.
pub const MAX_LEN: usize = 9;

/// Width codes.
pub mod code {
    /// `u8` payload.
    pub const BYTE: i8 = -121;
    /// `i8` payload.
    pub const SBYTE: i8 = -122;
    /// `u16` payload.
    pub const UINT16: i8 = -123;
    /// `i16` payload.
    pub const INT16: i8 = -124;
    /// `u32` payload.
    pub const UINT32: i8 = -125;
    /// `i32` payload.
    pub const INT32: i8 = -126;
    /// `u64` payload.
    pub const UINT64: i8 = -127;
    /// `i64` payload.
    pub const INT64: i8 = -128;
}

/// Integer types that can be written as a varint.
///
/// Values travel through `i128`, which holds every `i64` and `u64` exactly.
pub trait VarIntValue: Copy {
    /// Name used in overflow errors.
    const TYPE_NAME: &'static str;

    /// Widen to `i128`.
    fn to_wide(self) -> i128;

    /// Narrow from `i128`, `None` when out of range.
    fn from_wide(value: i128) -> Option<Self>;
}

macro_rules! impl_varint_value {
    ($($ty:ty),+) => {
        $(
            impl VarIntValue for $ty {
                const TYPE_NAME: &'static str = stringify!($ty);

                #[inline]
                fn to_wide(self) -> i128 {
                    self as i128
                }

                #[inline]
                fn from_wide(value: i128) -> Option<Self> {
                    <$ty>::try_from(value).ok()
                }
            }
        )+
    };
}

impl_varint_value!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize, i128);

impl VarIntValue for u128 {
    const TYPE_NAME: &'static str = "u128";

    #[inline]
    fn to_wide(self) -> i128 {
        // Anything past i128::MAX is out of varint range anyway.
        i128::try_from(self).unwrap_or(i128::MAX)
    }

    #[inline]
    fn from_wide(value: i128) -> Option<Self> {
        u128::try_from(value).ok()
    }
}

/// Encode `value` into `out`, returning the bytes used.
///
/// 128-bit values encode only when they fit in `i64` or `u64`.
#[inline]
pub fn encode<T: VarIntValue>(value: T, out: &mut [u8; MAX_LEN]) -> Result<usize> {
    let v = value.to_wide();
    if v > u64::MAX as i128 || v < i64::MIN as i128 {
        return Err(WireError::VarIntOverflow {
            value: v,
            target: "varint",
        });
    }
    Ok(encode_wide(v, out))
}

fn encode_wide(v: i128, out: &mut [u8; MAX_LEN]) -> usize {
    if (MIN_SINGLE as i128..=MAX_SINGLE as i128).contains(&v) {
        out[0] = v as i8 as u8;
        return 1;
    }
    if v > 0 {
        if let Ok(x) = u8::try_from(v) {
            put(out, code::BYTE, &[x])
        } else if let Ok(x) = u16::try_from(v) {
            put(out, code::UINT16, &x.to_le_bytes())
        } else if let Ok(x) = u32::try_from(v) {
            put(out, code::UINT32, &x.to_le_bytes())
        } else {
            put(out, code::UINT64, &(v as u64).to_le_bytes())
        }
    } else if let Ok(x) = i8::try_from(v) {
        put(out, code::SBYTE, &x.to_le_bytes())
    } else if let Ok(x) = i16::try_from(v) {
        put(out, code::INT16, &x.to_le_bytes())
    } else if let Ok(x) = i32::try_from(v) {
        put(out, code::INT32, &x.to_le_bytes())
    } else {
        put(out, code::INT64, &(v as i64).to_le_bytes())
    }
}

#[inline]
fn put(out: &mut [u8; MAX_LEN], code: i8, payload: &[u8]) -> usize {
    out[0] = code as u8;
    out[1..=payload.len()].copy_from_slice(payload);
    payload.len() + 1
}

/// Bytes `value` occupies once encoded.
pub fn encoded_len<T: VarIntValue>(value: T) -> usize {
    let v = value.to_wide();
    if (MIN_SINGLE as i128..=MAX_SINGLE as i128).contains(&v) {
        1
    } else if v > 0 {
        if v <= u8::MAX as i128 {
            2
        } else if v <= u16::MAX as i128 {
            3
        } else if v <= u32::MAX as i128 {
            5
        } else {
            9
        }
    } else if v >= i8::MIN as i128 {
        2
    } else if v >= i16::MIN as i128 {
        3
    } else if v >= i32::MIN as i128 {
        5
    } else {
        9
    }
}

/// Payload bytes that follow `lead`; zero when the lead byte is the value.
#[inline]
pub fn payload_len(lead: u8) -> usize {
    match lead as i8 {
        code::BYTE | code::SBYTE => 1,
        code::UINT16 | code::INT16 => 2,
        code::UINT32 | code::INT32 => 4,
        code::UINT64 | code::INT64 => 8,
        _ => 0,
    }
}

/// Decode the value named by `lead` from its payload.
///
/// `payload` must hold at least [`payload_len`]`(lead)` bytes.
pub fn decode_payload(lead: u8, payload: &[u8]) -> i128 {
    match lead as i8 {
        code::BYTE => payload[0] as i128,
        code::SBYTE => payload[0] as i8 as i128,
        code::UINT16 => u16::from_le_bytes(le(payload)) as i128,
        code::INT16 => i16::from_le_bytes(le(payload)) as i128,
        code::UINT32 => u32::from_le_bytes(le(payload)) as i128,
        code::INT32 => i32::from_le_bytes(le(payload)) as i128,
        code::UINT64 => u64::from_le_bytes(le(payload)) as i128,
        code::INT64 => i64::from_le_bytes(le(payload)) as i128,
        direct => direct as i128,
    }
}

#[inline]
fn le<const N: usize>(payload: &[u8]) -> [u8; N] {
    let mut bytes = [0u8; N];
    bytes.copy_from_slice(&payload[..N]);
    bytes
}

/// Checked conversion of a decoded value into `T`.
#[inline]
pub fn narrow<T: VarIntValue>(value: i128) -> Result<T> {
    T::from_wide(value).ok_or(WireError::VarIntOverflow {
        value,
        target: T::TYPE_NAME,
    })
}

/// Decode one varint from the front of `buf`.
///
/// Returns the value and the bytes consumed.
pub fn decode<T: VarIntValue>(buf: &[u8]) -> Result<(T, usize)> {
    let Some(&lead) = buf.first() else {
        return Err(WireError::SequenceExhausted {
            needed: 1,
            remaining: 0,
        });
    };
    let len = payload_len(lead);
    if buf.len() < len + 1 {
        return Err(WireError::SequenceExhausted {
            needed: len + 1,
            remaining: buf.len(),
        });
    }
    let value = narrow(decode_payload(lead, &buf[1..=len]))?;
    Ok((value, len + 1))
}
