//! Per-type encoding strategies and the registry that maps types to them.
//!
//! A [`Formatter<T>`] knows how one type is laid out on the wire. Formatters
//! are stateless; anything a call needs lives in the [`Writer`] or
//! [`Reader`] it is handed. Generic formatters resolve the formatters of
//! their components through the cursor's registry at call time, so
//! registration order never matters.
//!
//! | Shape | Formatter |
//! |---|---|
//! | primitives | [`PrimitiveFormatter`] |
//! | strings | [`StringFormatter`] |
//! | raw memory images | [`BlittableFormatter`] |
//! | sequences and maps | [`VecFormatter`], [`MapFormatter`] |
//! | byte views | [`BytesFormatter`] |
//! | nullable values | [`NullableFormatter`] |
//! | objects and pairs | [`ObjectFormatter`], [`PairFormatter`] |
//! | shared and cyclic pointers | [`SharedFormatter`], [`CyclicFormatter`] |
//! | closed unions | [`UnionFormatter`] |

mod blittable;
mod builtin;
mod collection;
mod nullable;
mod object;
mod primitive;
mod registry;
mod shared;
mod string;
mod union;

pub use blittable::BlittableFormatter;
pub use collection::{BytesFormatter, MapFormatter, VecFormatter};
pub use nullable::NullableFormatter;
pub use object::{Members, ObjectFormatter, PairFormatter, WireObject};
pub use primitive::{DurationFormatter, Primitive, PrimitiveFormatter, UnitFormatter};
pub use registry::FormatterRegistry;
pub use shared::{CyclicFormatter, SharedFormatter, SharedPointer};
pub use string::StringFormatter;
pub use union::{UnionBuilder, UnionFormatter};

use crate::{Reader, Result, Writer};

/// Encoding strategy for values of type `T`.
///
/// `deserialize` overwrites `value` in place. Implementations must consume
/// exactly the bytes their `serialize` produced.
pub trait Formatter<T>: Send + Sync {
    /// Append `value`.
    fn serialize(&self, writer: &mut Writer<'_>, value: &T) -> Result<()>;

    /// Read one value into `value`.
    fn deserialize(&self, reader: &mut Reader<'_>, value: &mut T) -> Result<()>;

    /// True when every encoding starts with an object or union header, so
    /// the first byte is never the null or back-reference marker. Pointer
    /// and nullable wrappers add an object header of count 1 around
    /// formatters that return `false`, including other wrappers.
    fn writes_header(&self) -> bool {
        false
    }
}

/// Fixed-size value encoded as its raw memory image.
///
/// Implemented for the numeric primitives and arrays of blittable types.
/// For a `#[repr(C)]` aggregate, derive the zerocopy traits and add this
/// marker:
///
/// ```
/// use wirecast_core::{Blittable, FromBytes, Immutable, IntoBytes, KnownLayout};
///
/// #[derive(FromBytes, IntoBytes, Immutable, KnownLayout, Clone, Copy)]
/// #[repr(C)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// impl Blittable for Point {}
/// ```
///
/// The image is the in-memory layout, which matches the little-endian wire
/// format only on little-endian targets.
pub trait Blittable:
    zerocopy::FromBytes + zerocopy::IntoBytes + zerocopy::Immutable + Copy + 'static
{
}

impl Blittable for u8 {}
impl Blittable for u16 {}
impl Blittable for u32 {}
impl Blittable for u64 {}
impl Blittable for u128 {}
impl Blittable for i8 {}
impl Blittable for i16 {}
impl Blittable for i32 {}
impl Blittable for i64 {}
impl Blittable for i128 {}
impl Blittable for f32 {}
impl Blittable for f64 {}
impl<T: Blittable, const N: usize> Blittable for [T; N] {}
