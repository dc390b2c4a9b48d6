//! Forward-only read cursor over one or more input segments.

use core::any::Any;
use core::mem::size_of;

use snafu::ensure;
use zerocopy::{FromBytes, FromZeros, IntoBytes};

use crate::buffer::{BufferPool, PooledBuffer};
use crate::error::LengthExceedsRemainingSnafu;
use crate::formatter::{Blittable, Formatter, FormatterRegistry};
use crate::header::{self, Marker};
use crate::options::SerializerOptions;
use crate::reference::ReferenceReader;
use crate::varint::{self, VarIntValue};
use crate::{Result, WireError};

macro_rules! read_le {
    ($($name:ident: $ty:ty),+ $(,)?) => {
        $(
            #[doc = concat!("Read a little-endian `", stringify!($ty), "`.")]
            #[inline]
            pub fn $name(&mut self) -> Result<$ty> {
                let mut bytes = [0u8; size_of::<$ty>()];
                bytes.copy_from_slice(self.read_raw(size_of::<$ty>())?);
                Ok(<$ty>::from_le_bytes(bytes))
            }
        )+
    };
}

/// Read cursor.
///
/// Input is either one contiguous slice or a sequence of segments. Reads
/// that fit in the current segment borrow from it directly; a read that
/// straddles a boundary is copied into a scratch buffer rented from the
/// pool and reused for later straddling reads.
///
/// The back-reference table lives here, so one reader corresponds to one
/// deserialize call.
pub struct Reader<'a> {
    current: &'a [u8],
    rest: &'a [&'a [u8]],
    consumed: usize,
    total: usize,
    scratch: Option<PooledBuffer>,
    pool: BufferPool,
    registry: &'a FormatterRegistry,
    options: SerializerOptions,
    references: ReferenceReader,
    depth: usize,
}

impl<'a> Reader<'a> {
    /// Reader over one contiguous slice.
    pub fn new(
        input: &'a [u8],
        registry: &'a FormatterRegistry,
        options: SerializerOptions,
    ) -> Self {
        Self::build(input, &[], input.len(), registry, options)
    }

    /// Reader over segments consumed in order.
    pub fn from_segments(
        segments: &'a [&'a [u8]],
        registry: &'a FormatterRegistry,
        options: SerializerOptions,
    ) -> Self {
        let total = segments.iter().map(|segment| segment.len()).sum();
        match segments.split_first() {
            Some((first, rest)) => Self::build(*first, rest, total, registry, options),
            None => Self::build(&[], &[], 0, registry, options),
        }
    }

    fn build(
        current: &'a [u8],
        rest: &'a [&'a [u8]],
        total: usize,
        registry: &'a FormatterRegistry,
        options: SerializerOptions,
    ) -> Self {
        Self {
            current,
            rest,
            consumed: 0,
            total,
            scratch: None,
            pool: BufferPool::global().clone(),
            registry,
            options,
            references: ReferenceReader::new(),
            depth: 0,
        }
    }

    /// Rent scratch space from `pool` instead of the global pool.
    #[must_use]
    pub fn with_pool(mut self, pool: BufferPool) -> Self {
        self.pool = pool;
        self
    }

    /// Options for this call.
    #[inline]
    pub fn options(&self) -> &SerializerOptions {
        &self.options
    }

    /// Registry used by [`read_value`](Self::read_value).
    #[inline]
    pub fn registry(&self) -> &'a FormatterRegistry {
        self.registry
    }

    /// Bytes consumed so far.
    #[inline]
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Bytes not yet consumed across all segments.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.total - self.consumed
    }

    /// Current nesting level.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    fn next_segment(&mut self) -> bool {
        while let Some((first, rest)) = self.rest.split_first() {
            self.rest = rest;
            if !first.is_empty() {
                self.current = *first;
                return true;
            }
        }
        false
    }

    fn ensure_remaining(&self, declared: usize) -> Result<()> {
        let remaining = self.remaining();
        ensure!(
            declared <= remaining,
            LengthExceedsRemainingSnafu { declared, remaining }
        );
        Ok(())
    }

    /// Consume exactly `n` bytes.
    ///
    /// The returned slice is valid until the next read.
    pub fn read_raw(&mut self, n: usize) -> Result<&[u8]> {
        let remaining = self.remaining();
        if n > remaining {
            return Err(WireError::SequenceExhausted {
                needed: n,
                remaining,
            });
        }
        if n == 0 {
            return Ok(&[]);
        }
        if self.current.is_empty() {
            self.next_segment();
        }
        let current: &'a [u8] = self.current;
        if current.len() >= n {
            let (head, tail) = current.split_at(n);
            self.current = tail;
            self.consumed += n;
            return Ok(head);
        }
        self.read_across(n)
    }

    fn read_across(&mut self, n: usize) -> Result<&[u8]> {
        tracing::trace!(n, consumed = self.consumed, "read straddles segments");
        let mut scratch = match self.scratch.take() {
            Some(scratch) if scratch.capacity() >= n => scratch,
            // A too-small scratch goes back to the pool here.
            _ => self.pool.rent(n),
        };
        scratch.set_len(n);
        let mut filled = 0;
        while filled < n {
            if self.current.is_empty() && !self.next_segment() {
                return Err(WireError::SequenceExhausted {
                    needed: n - filled,
                    remaining: 0,
                });
            }
            let current: &'a [u8] = self.current;
            let take = (n - filled).min(current.len());
            scratch[filled..filled + take].copy_from_slice(&current[..take]);
            self.current = &current[take..];
            filled += take;
        }
        self.consumed += n;
        let scratch = self.scratch.insert(scratch);
        Ok(&scratch[..n])
    }

    /// Next byte without consuming it.
    pub fn peek_byte(&mut self) -> Result<u8> {
        if self.current.is_empty() {
            self.next_segment();
        }
        self.current
            .first()
            .copied()
            .ok_or(WireError::SequenceExhausted {
                needed: 1,
                remaining: 0,
            })
    }

    /// True if the next byte is the null marker.
    pub fn peek_is_null(&mut self) -> Result<bool> {
        Ok(self.peek_byte()? == header::NULL)
    }

    /// Read one byte.
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_raw(1)?[0])
    }

    /// Read one signed byte.
    #[inline]
    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    /// Read a bool; anything but `0` or `1` is malformed.
    pub fn read_bool(&mut self) -> Result<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(WireError::Malformed {
                message: "bool byte is neither 0 nor 1",
            }),
        }
    }

    /// Read a `u32` code point.
    pub fn read_char(&mut self) -> Result<char> {
        char::from_u32(self.read_u32()?).ok_or(WireError::Malformed {
            message: "invalid char code point",
        })
    }

    read_le!(
        read_u16: u16,
        read_u32: u32,
        read_u64: u64,
        read_u128: u128,
        read_i16: i16,
        read_i32: i32,
        read_i64: i64,
        read_i128: i128,
        read_f32: f32,
        read_f64: f64,
    );

    /// Read an object header: `None` for null, otherwise the member count.
    pub fn try_read_object_header(&mut self) -> Result<Option<u8>> {
        match Marker::of(self.read_u8()?) {
            Marker::Null => Ok(None),
            Marker::Value(count) => Ok(Some(count)),
            _ => Err(WireError::Malformed {
                message: "expected an object header",
            }),
        }
    }

    /// Read a union header: `None` for null, otherwise the tag.
    pub fn try_read_union_header(&mut self) -> Result<Option<u16>> {
        match Marker::of(self.read_u8()?) {
            Marker::Null => Ok(None),
            Marker::Value(tag) => Ok(Some(u16::from(tag))),
            Marker::WideTag => Ok(Some(self.read_u16()?)),
            _ => Err(WireError::Malformed {
                message: "expected a union header",
            }),
        }
    }

    /// Read a collection header: `None` for null, otherwise the length.
    ///
    /// Each element is assumed to take at least one byte; a length larger
    /// than the remaining input is rejected before anything is allocated.
    pub fn try_read_collection_header(&mut self) -> Result<Option<usize>> {
        self.try_read_collection_header_sized(1)
    }

    /// As [`try_read_collection_header`](Self::try_read_collection_header)
    /// with elements of exactly `element_size` bytes.
    pub fn try_read_collection_header_sized(
        &mut self,
        element_size: usize,
    ) -> Result<Option<usize>> {
        let Some(len) = header::collection_length(self.read_i32()?)? else {
            return Ok(None);
        };
        self.ensure_remaining(len.saturating_mul(element_size))?;
        Ok(Some(len))
    }

    /// Read a varint and narrow it to `T`.
    pub fn read_varint<T: VarIntValue>(&mut self) -> Result<T> {
        let lead = self.read_u8()?;
        let payload = match varint::payload_len(lead) {
            0 => &[][..],
            len => self.read_raw(len)?,
        };
        varint::narrow(varint::decode_payload(lead, payload))
    }

    /// Read the id following a back-reference marker.
    pub fn read_reference_id(&mut self) -> Result<u32> {
        self.read_varint()
    }

    /// Reserve the next back-reference id.
    pub fn reserve_reference(&mut self) -> u32 {
        self.references.reserve()
    }

    /// Store the pointer for a reserved id.
    pub fn fill_reference<P: Any>(&mut self, id: u32, pointer: P) {
        self.references.fill(id, pointer);
    }

    /// Clone the pointer stored under `id`.
    pub fn resolve_reference<P: Any + Clone>(&self, id: u32) -> Result<P> {
        self.references.resolve(id)
    }

    /// Read a string into `out`. Returns `false`, leaving `out` empty, on null.
    pub fn read_str_into(&mut self, out: &mut String) -> Result<bool> {
        out.clear();
        let head = self.read_i32()?;
        if head == header::NULL_COLLECTION {
            return Ok(false);
        }
        if head >= 0 {
            let units = head as usize;
            let byte_len = units.saturating_mul(2);
            self.ensure_remaining(byte_len)?;
            let span = self.read_raw(byte_len)?;
            out.reserve(units);
            let decoded = char::decode_utf16(
                span.chunks_exact(2)
                    .map(|pair| u16::from_le_bytes([pair[0], pair[1]])),
            );
            for c in decoded {
                out.push(c.map_err(|_| WireError::Malformed {
                    message: "unpaired surrogate in UTF-16 string",
                })?);
            }
        } else {
            let byte_len = (!head) as usize;
            // UTF-16 length hint; the UTF-8 bytes are authoritative.
            self.read_i32()?;
            self.ensure_remaining(byte_len)?;
            let span = self.read_raw(byte_len)?;
            let text = core::str::from_utf8(span).map_err(|_| WireError::Malformed {
                message: "invalid UTF-8 in string",
            })?;
            out.push_str(text);
        }
        Ok(true)
    }

    /// Read a non-null string.
    pub fn read_string(&mut self) -> Result<String> {
        let mut out = String::new();
        if !self.read_str_into(&mut out)? {
            return Err(WireError::Malformed {
                message: "null where a string is required",
            });
        }
        Ok(out)
    }

    /// Read a string, `None` for null.
    pub fn read_nullable_string(&mut self) -> Result<Option<String>> {
        let mut out = String::new();
        Ok(self.read_str_into(&mut out)?.then_some(out))
    }

    /// Read the raw memory image of a blittable value.
    pub fn read_blittable<T: Blittable>(&mut self) -> Result<T> {
        let span = self.read_raw(size_of::<T>())?;
        T::read_from_bytes(span).map_err(|_| WireError::Malformed {
            message: "blittable span has the wrong size",
        })
    }

    /// Read a blittable collection into `out`, replacing its contents.
    /// Returns `false`, leaving `out` empty, on null.
    pub fn read_blittable_vec<T: Blittable>(&mut self, out: &mut Vec<T>) -> Result<bool> {
        out.clear();
        let Some(len) = self.try_read_collection_header_sized(size_of::<T>())? else {
            return Ok(false);
        };
        out.resize(len, T::new_zeroed());
        let span = self.read_raw(len * size_of::<T>())?;
        out.as_mut_slice().as_mut_bytes().copy_from_slice(span);
        Ok(true)
    }

    /// Deserialize into `value` with the registered formatter for `T`.
    pub fn read_value<T: 'static>(&mut self, value: &mut T) -> Result<()> {
        let formatter = self.registry.resolve::<T>()?;
        self.read_with(&*formatter, value)
    }

    /// Deserialize a fresh `T`.
    pub fn read_new<T: Default + 'static>(&mut self) -> Result<T> {
        let mut value = T::default();
        self.read_value(&mut value)?;
        Ok(value)
    }

    /// Deserialize into `value` with `formatter`, counting one nesting level.
    pub fn read_with<T>(&mut self, formatter: &dyn Formatter<T>, value: &mut T) -> Result<()> {
        if self.depth >= self.options.max_depth {
            return Err(WireError::DepthExceeded {
                limit: self.options.max_depth,
            });
        }
        self.depth += 1;
        let result = formatter.deserialize(self, value);
        self.depth -= 1;
        result
    }
}

impl core::fmt::Debug for Reader<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Reader")
            .field("consumed", &self.consumed)
            .field("total", &self.total)
            .field("depth", &self.depth)
            .field("references", &self.references)
            .finish()
    }
}
