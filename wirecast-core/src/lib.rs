//! Core wire engine for wirecast.
//!
//! The engine converts typed values to a compact binary layout and back
//! through a pair of forward-only cursors:
//!
//! - [`Writer`] appends primitives, strings, raw blocks and headers into any
//!   [`BufferSink`], usually a pooled [`SegmentedBuffer`].
//! - [`Reader`] consumes one contiguous slice or a chain of segments,
//!   copying into a rented scratch buffer only when a value straddles a
//!   segment boundary.
//!
//! Compound values are delegated to [`Formatter`] objects resolved through a
//! [`FormatterRegistry`].
//!
//! # Example
//!
//! ```
//! use wirecast_core::{FormatterRegistry, Reader, ReferenceWriter, SegmentedBuffer,
//!     SerializerOptions, Writer};
//!
//! let registry = FormatterRegistry::with_builtins();
//! let options = SerializerOptions::default();
//! let mut buffer = SegmentedBuffer::new();
//! let mut refs = ReferenceWriter::new();
//!
//! let mut writer = Writer::new(&mut buffer, &registry, options, &mut refs);
//! writer.write_value(&String::from("hello")).unwrap();
//! writer.write_value(&42u32).unwrap();
//! let bytes = buffer.to_vec();
//!
//! let mut reader = Reader::new(&bytes, &registry, options);
//! let mut text = String::new();
//! let mut number = 0u32;
//! reader.read_value(&mut text).unwrap();
//! reader.read_value(&mut number).unwrap();
//! assert_eq!((text.as_str(), number), ("hello", 42));
//! ```

#![warn(missing_docs)]

pub mod buffer;
mod error;
pub mod formatter;
pub mod header;
mod options;
mod reader;
mod reference;
pub mod varint;
mod writer;

#[cfg(test)]
mod tests;

pub use buffer::{BufferPool, BufferSink, PooledBuffer, SegmentedBuffer, VecSink};
pub use error::{ErrorKind, Result, WireError};
pub use formatter::{Blittable, Formatter, FormatterRegistry, UnionBuilder, UnionFormatter};
pub use options::{SerializerOptions, StringEncoding};
pub use reader::Reader;
pub use reference::{ReferenceReader, ReferenceWriter, Tracked};
pub use varint::VarIntValue;
pub use writer::Writer;

/// Zerocopy traits and derives used to declare [`Blittable`] aggregates.
pub use zerocopy::{FromBytes, FromZeros, Immutable, IntoBytes, KnownLayout};
