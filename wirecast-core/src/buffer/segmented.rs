//! Growable output buffer made of pooled segments.

use crate::buffer::{BufferPool, BufferSink, PooledBuffer};
use crate::options::SerializerOptions;
use crate::{Result, WireError};

/// Size of the first segment.
const INITIAL_SEGMENT: usize = 256;

/// Growth stops doubling here; larger requests still get a segment that fits.
const MAX_SEGMENT: usize = super::pool::MAX_POOLED_SIZE;

struct Segment {
    buf: PooledBuffer,
    written: usize,
}

impl Segment {
    fn room(&self) -> usize {
        self.buf.len() - self.written
    }

    fn filled(&self) -> &[u8] {
        &self.buf[..self.written]
    }
}

/// Chain of pooled segments written in order.
///
/// A segment is only ever touched by the buffer that rented it. When the
/// current segment cannot satisfy a reservation, a new one of
/// `max(min, 2 * current)` bytes (doubling capped at 1 MiB) is linked after
/// it. [`to_vec`](Self::to_vec) copies everything out and returns the
/// segments to the pool.
///
/// ```
/// use wirecast_core::{BufferSink, SegmentedBuffer};
///
/// let mut buf = SegmentedBuffer::new();
/// let span = buf.reserve(3).unwrap();
/// span[..3].copy_from_slice(b"abc");
/// buf.advance(3);
/// assert_eq!(buf.to_vec(), b"abc");
/// assert!(buf.is_empty());
/// ```
pub struct SegmentedBuffer {
    pool: BufferPool,
    sealed: Vec<Segment>,
    current: Option<Segment>,
    total: usize,
    limit: usize,
}

impl SegmentedBuffer {
    /// Buffer renting from the global pool.
    pub fn new() -> Self {
        Self::with_pool(BufferPool::global().clone())
    }

    /// Buffer renting from `pool`.
    pub fn with_pool(pool: BufferPool) -> Self {
        Self {
            pool,
            sealed: Vec::new(),
            current: None,
            total: 0,
            limit: SerializerOptions::DEFAULT_MAX_BUFFER_SIZE,
        }
    }

    /// Cap the total bytes this buffer accepts.
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
    }

    /// Current cap.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Bytes committed.
    pub fn len(&self) -> usize {
        self.total
    }

    /// True if nothing is committed.
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Number of segments holding committed bytes.
    pub fn segment_count(&self) -> usize {
        self.segments().count()
    }

    /// Committed bytes, one slice per segment.
    pub fn segments(&self) -> impl Iterator<Item = &[u8]> {
        self.sealed
            .iter()
            .chain(self.current.as_ref())
            .map(Segment::filled)
            .filter(|filled| !filled.is_empty())
    }

    /// Copy all committed bytes into one exact-length vector and reset.
    pub fn to_vec(&mut self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.total);
        for segment in self.segments() {
            out.extend_from_slice(segment);
        }
        self.reset();
        out
    }

    /// Drop all segments back to the pool.
    pub fn reset(&mut self) {
        self.sealed.clear();
        self.current = None;
        self.total = 0;
    }

    fn grow(&mut self, min: usize) {
        let previous = self.current.as_ref().map_or(0, |s| s.buf.len());
        let size = min.max((previous * 2).clamp(INITIAL_SEGMENT, MAX_SEGMENT));
        if let Some(segment) = self.current.take() {
            if segment.written > 0 {
                self.sealed.push(segment);
            }
        }
        tracing::trace!(size, sealed = self.sealed.len(), "linking new segment");
        let mut buf = self.pool.rent(size);
        let capacity = buf.capacity();
        buf.set_len(capacity);
        self.current = Some(Segment { buf, written: 0 });
    }
}

impl Default for SegmentedBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferSink for SegmentedBuffer {
    fn reserve(&mut self, min: usize) -> Result<&mut [u8]> {
        let requested = self.total.saturating_add(min);
        if requested > self.limit {
            tracing::debug!(requested, limit = self.limit, "buffer limit reached");
            return Err(WireError::CapacityExceeded {
                requested,
                limit: self.limit,
            });
        }
        if !self.current.as_ref().is_some_and(|s| s.room() >= min) {
            self.grow(min);
        }
        match &mut self.current {
            Some(segment) => Ok(&mut segment.buf[segment.written..]),
            None => unreachable!("grow always links a segment"),
        }
    }

    fn advance(&mut self, n: usize) {
        if let Some(segment) = &mut self.current {
            debug_assert!(n <= segment.room());
            segment.written += n;
            self.total += n;
        }
    }
}

impl std::fmt::Debug for SegmentedBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentedBuffer")
            .field("len", &self.total)
            .field("segments", &self.segment_count())
            .field("limit", &self.limit)
            .finish()
    }
}
