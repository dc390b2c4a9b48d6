//! Compact binary serialization.
//!
//! Values are written through formatters looked up by type in a
//! [`FormatterRegistry`], into pooled segment chains that are reused across
//! calls. The layout is fixed little-endian with one-byte object and union
//! headers, `i32` collection headers and tagged varints. Shared pointers
//! keep their identity and may form cycles.
//!
//! # Example
//!
//! ```
//! use wirecast::{Serializer, SerializerOptions, StringEncoding};
//!
//! let serializer = Serializer::new()
//!     .with_options(SerializerOptions::default().with_string_encoding(StringEncoding::Utf16));
//!
//! let bytes = serializer.serialize(&Some("hi".to_string())).unwrap();
//! assert_eq!(bytes, [2, 0, 0, 0, b'h', 0, b'i', 0]);
//!
//! let back: Option<String> = serializer.deserialize(&bytes).unwrap();
//! assert_eq!(back.as_deref(), Some("hi"));
//! ```
//!
//! # Custom types
//!
//! Objects implement [`WireObject`] and are registered once:
//!
//! ```
//! use std::sync::Arc;
//! use wirecast::{FormatterRegistry, Members, Result, Serializer, WireObject, Writer};
//!
//! #[derive(Default, Debug, PartialEq)]
//! struct Reading {
//!     sensor: u16,
//!     values: Vec<f32>,
//! }
//!
//! impl WireObject for Reading {
//!     const MEMBER_COUNT: usize = 2;
//!
//!     fn write_members(&self, writer: &mut Writer<'_>) -> Result<()> {
//!         writer.write_value(&self.sensor)?;
//!         writer.write_value(&self.values)
//!     }
//!
//!     fn read_members(&mut self, members: &mut Members<'_, '_>) -> Result<()> {
//!         members.read(&mut self.sensor)?;
//!         members.read(&mut self.values)
//!     }
//! }
//!
//! let registry = Arc::new(FormatterRegistry::with_builtins());
//! registry.register_object::<Reading>();
//!
//! let serializer = Serializer::new().with_registry(registry);
//! let reading = Reading { sensor: 3, values: vec![0.5, 1.5] };
//! let bytes = serializer.serialize(&reading).unwrap();
//! assert_eq!(serializer.deserialize::<Reading>(&bytes).unwrap(), reading);
//! ```

#![warn(missing_docs)]

mod serializer;
mod state;
#[cfg(feature = "tokio")]
mod stream;

#[cfg(test)]
mod tests;

pub use serializer::{Serializer, deserialize, serialize};
pub use state::{Checkout, MAX_IDLE_STATES, StatePool, WriterState};
#[cfg(feature = "tokio")]
pub use stream::READ_CHUNK;
#[cfg(feature = "tokio")]
pub use tokio_util::sync::CancellationToken;

pub use wirecast_core::formatter::{Members, WireObject};
pub use wirecast_core::{
    Blittable, BufferPool, BufferSink, ErrorKind, Formatter, FormatterRegistry, FromBytes,
    Immutable, IntoBytes, KnownLayout, PooledBuffer, Reader, Result, SegmentedBuffer,
    SerializerOptions, StringEncoding, UnionBuilder, UnionFormatter, VecSink, WireError, Writer,
};
pub use wirecast_core::{buffer, formatter, header, varint};
