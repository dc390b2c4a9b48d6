//! Forward-only write cursor.

use zerocopy::IntoBytes;

use crate::buffer::BufferSink;
use crate::formatter::{Blittable, Formatter, FormatterRegistry};
use crate::header;
use crate::options::{SerializerOptions, StringEncoding};
use crate::reference::{ReferenceWriter, Tracked};
use crate::varint::{self, VarIntValue};
use crate::{Result, WireError};

macro_rules! write_le {
    ($($name:ident: $ty:ty),+ $(,)?) => {
        $(
            #[doc = concat!("Write a little-endian `", stringify!($ty), "`.")]
            #[inline]
            pub fn $name(&mut self, value: $ty) -> Result<()> {
                self.write_raw(&value.to_le_bytes())
            }
        )+
    };
}

/// Append cursor over a [`BufferSink`].
///
/// Every write commits its bytes immediately; nothing can be rewound.
/// Compound values go through [`write_value`](Self::write_value), which
/// resolves the formatter and counts one nesting level against
/// [`SerializerOptions::max_depth`].
pub struct Writer<'a> {
    sink: &'a mut dyn BufferSink,
    registry: &'a FormatterRegistry,
    options: SerializerOptions,
    references: &'a mut ReferenceWriter,
    depth: usize,
    written: usize,
}

impl<'a> Writer<'a> {
    /// Writer appending to `sink`.
    pub fn new(
        sink: &'a mut dyn BufferSink,
        registry: &'a FormatterRegistry,
        options: SerializerOptions,
        references: &'a mut ReferenceWriter,
    ) -> Self {
        Self {
            sink,
            registry,
            options,
            references,
            depth: 0,
            written: 0,
        }
    }

    /// Options for this call.
    #[inline]
    pub fn options(&self) -> &SerializerOptions {
        &self.options
    }

    /// Registry used by [`write_value`](Self::write_value).
    #[inline]
    pub fn registry(&self) -> &'a FormatterRegistry {
        self.registry
    }

    /// Current nesting level.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Bytes written by this writer.
    #[inline]
    pub fn written(&self) -> usize {
        self.written
    }

    /// Copy `bytes` verbatim.
    pub fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        let span = self.sink.reserve(bytes.len())?;
        span[..bytes.len()].copy_from_slice(bytes);
        self.sink.advance(bytes.len());
        self.written += bytes.len();
        Ok(())
    }

    /// Write one byte.
    #[inline]
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.write_raw(&[value])
    }

    /// Write one signed byte.
    #[inline]
    pub fn write_i8(&mut self, value: i8) -> Result<()> {
        self.write_raw(&[value as u8])
    }

    /// Write `0` or `1`.
    #[inline]
    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_raw(&[value as u8])
    }

    /// Write a scalar value as its `u32` code point.
    #[inline]
    pub fn write_char(&mut self, value: char) -> Result<()> {
        self.write_u32(value as u32)
    }

    write_le!(
        write_u16: u16,
        write_u32: u32,
        write_u64: u64,
        write_u128: u128,
        write_i16: i16,
        write_i32: i32,
        write_i64: i64,
        write_i128: i128,
        write_f32: f32,
        write_f64: f64,
    );

    /// Write the null marker.
    #[inline]
    pub fn write_null(&mut self) -> Result<()> {
        self.write_u8(header::NULL)
    }

    /// Write an object header for `count` members (at most 249).
    pub fn write_object_header(&mut self, count: usize) -> Result<()> {
        let byte = header::object_header(count)?;
        self.write_u8(byte)
    }

    /// Write a collection length, `None` for a null collection.
    pub fn write_collection_header(&mut self, len: Option<usize>) -> Result<()> {
        let bytes = header::collection_header(len)?;
        self.write_raw(&bytes)
    }

    /// Write a union tag, switching to the wide form above 249.
    pub fn write_union_header(&mut self, tag: u16) -> Result<()> {
        let mut bytes = [0u8; 3];
        let len = header::union_header(tag, &mut bytes);
        self.write_raw(&bytes[..len])
    }

    /// Write `value` in its shortest varint form.
    pub fn write_varint<T: VarIntValue>(&mut self, value: T) -> Result<()> {
        let mut bytes = [0u8; varint::MAX_LEN];
        let len = varint::encode(value, &mut bytes)?;
        self.write_raw(&bytes[..len])
    }

    /// Write a back-reference to `id`.
    pub fn write_reference(&mut self, id: u32) -> Result<()> {
        self.write_u8(header::REFERENCE)?;
        self.write_varint(id)
    }

    /// Register `identity`, or report the id it already has.
    #[inline]
    pub fn track_reference(&mut self, identity: usize) -> Tracked {
        self.references.track(identity)
    }

    /// Write a string using the configured [`StringEncoding`].
    ///
    /// Empty strings are always the header `0`.
    pub fn write_str(&mut self, value: &str) -> Result<()> {
        if value.is_empty() {
            return self.write_i32(0);
        }
        match self.options.string_encoding {
            StringEncoding::Utf8 => {
                let byte_len = string_len(value.len())?;
                // Never larger than the byte count, so it fits too.
                let utf16_len = value.encode_utf16().count() as i32;
                self.write_i32(!byte_len)?;
                self.write_i32(utf16_len)?;
                self.write_raw(value.as_bytes())
            }
            StringEncoding::Utf16 => {
                let units = value.encode_utf16().count();
                self.write_i32(string_len(units)?)?;
                let span = self.sink.reserve(units * 2)?;
                for (out, unit) in span.chunks_exact_mut(2).zip(value.encode_utf16()) {
                    out.copy_from_slice(&unit.to_le_bytes());
                }
                self.sink.advance(units * 2);
                self.written += units * 2;
                Ok(())
            }
        }
    }

    /// Write a string, or the null collection header for `None`.
    pub fn write_nullable_str(&mut self, value: Option<&str>) -> Result<()> {
        match value {
            Some(value) => self.write_str(value),
            None => self.write_collection_header(None),
        }
    }

    /// Write the raw memory image of a blittable value.
    #[inline]
    pub fn write_blittable<T: Blittable>(&mut self, value: &T) -> Result<()> {
        self.write_raw(value.as_bytes())
    }

    /// Write a collection header followed by the raw image of `values`.
    pub fn write_blittable_slice<T: Blittable>(&mut self, values: &[T]) -> Result<()> {
        self.write_collection_header(Some(values.len()))?;
        self.write_raw(values.as_bytes())
    }

    /// Serialize `value` with the registered formatter for `T`.
    pub fn write_value<T: 'static>(&mut self, value: &T) -> Result<()> {
        let formatter = self.registry.resolve::<T>()?;
        self.write_with(&*formatter, value)
    }

    /// Serialize `value` with `formatter`, counting one nesting level.
    pub fn write_with<T>(&mut self, formatter: &dyn Formatter<T>, value: &T) -> Result<()> {
        if self.depth >= self.options.max_depth {
            return Err(WireError::DepthExceeded {
                limit: self.options.max_depth,
            });
        }
        self.depth += 1;
        let result = formatter.serialize(self, value);
        self.depth -= 1;
        result
    }
}

fn string_len(len: usize) -> Result<i32> {
    i32::try_from(len).map_err(|_| WireError::CapacityExceeded {
        requested: len,
        limit: i32::MAX as usize,
    })
}

impl core::fmt::Debug for Writer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Writer")
            .field("written", &self.written)
            .field("depth", &self.depth)
            .field("options", &self.options)
            .finish()
    }
}
