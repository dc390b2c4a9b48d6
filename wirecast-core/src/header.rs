//! Wire header markers and their encodings.
//!
//! | construct          | layout                                 |
//! |--------------------|----------------------------------------|
//! | null               | `0xFF`                                 |
//! | object header      | one byte, `0..=249` member count       |
//! | union header       | one byte tag `0..=249`                 |
//! | wide union header  | `0xFA`, then `u16` little-endian tag    |
//! | back-reference     | `0xFB`, then a varint id               |
//! | collection header  | `i32` little-endian; `-1` null          |
//!
//! Bytes `0xFC..=0xFE` are reserved and rejected by every reader.

use snafu::ensure;

use crate::error::SchemaMismatchSnafu;
use crate::{Result, WireError};

/// Null marker for objects, unions and shared pointers.
pub const NULL: u8 = 0xFF;

/// Union header prefix announcing a two-byte tag.
pub const WIDE_TAG: u8 = 0xFA;

/// Back-reference prefix.
///
/// Kept apart from [`WIDE_TAG`] so a header byte is never ambiguous.
pub const REFERENCE: u8 = 0xFB;

/// Largest member count an object header can carry.
pub const MAX_MEMBER_COUNT: u8 = 249;

/// Largest tag that fits the one-byte union header.
pub const MAX_NARROW_TAG: u8 = 249;

/// Collection length meaning "no collection".
pub const NULL_COLLECTION: i32 = -1;

/// Size of the collection header.
pub const COLLECTION_HEADER_LEN: usize = 4;

/// Meaning of a leading header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// Null value.
    Null,
    /// Object member count or narrow union tag.
    Value(u8),
    /// Wide union tag follows.
    WideTag,
    /// Back-reference id follows.
    Reference,
    /// Reserved byte.
    Reserved(u8),
}

impl Marker {
    /// Classify a header byte.
    #[inline]
    pub const fn of(byte: u8) -> Self {
        match byte {
            NULL => Self::Null,
            WIDE_TAG => Self::WideTag,
            REFERENCE => Self::Reference,
            0..=MAX_MEMBER_COUNT => Self::Value(byte),
            other => Self::Reserved(other),
        }
    }
}

/// Object header byte for `count` members.
pub fn object_header(count: usize) -> Result<u8> {
    ensure!(
        count <= MAX_MEMBER_COUNT as usize,
        SchemaMismatchSnafu {
            type_name: "object header",
            message: format!("{count} members exceed the limit of {MAX_MEMBER_COUNT}"),
        }
    );
    Ok(count as u8)
}

/// Encode a union header, returning the bytes used.
pub fn union_header(tag: u16, out: &mut [u8; 3]) -> usize {
    if tag <= MAX_NARROW_TAG as u16 {
        out[0] = tag as u8;
        1
    } else {
        out[0] = WIDE_TAG;
        out[1..3].copy_from_slice(&tag.to_le_bytes());
        3
    }
}

/// Encode a collection length, `None` for a null collection.
pub fn collection_header(len: Option<usize>) -> Result<[u8; COLLECTION_HEADER_LEN]> {
    let raw = match len {
        None => NULL_COLLECTION,
        Some(len) => i32::try_from(len).map_err(|_| WireError::CapacityExceeded {
            requested: len,
            limit: i32::MAX as usize,
        })?,
    };
    Ok(raw.to_le_bytes())
}

/// Decode a collection length, `None` for a null collection.
pub fn collection_length(raw: i32) -> Result<Option<usize>> {
    match raw {
        NULL_COLLECTION => Ok(None),
        len if len >= 0 => Ok(Some(len as usize)),
        _ => Err(WireError::Malformed {
            message: "negative collection length",
        }),
    }
}
