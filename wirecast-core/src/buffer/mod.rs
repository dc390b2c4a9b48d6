//! Output buffers and the shared byte pool.
//!
//! - [`BufferSink`] - the reserve/advance contract the [`Writer`](crate::Writer) appends through
//! - [`SegmentedBuffer`] - growable chain of pooled segments
//! - [`VecSink`] - appends to a caller-owned `Vec<u8>`
//! - [`BufferPool`] - thread-safe pool of byte arrays in power-of-two classes

mod pool;
mod segmented;

pub use pool::{BufferPool, MAX_POOLED_SIZE, MAX_RETAINED_PER_CLASS, PooledBuffer};
pub use segmented::SegmentedBuffer;

use crate::{Result, WireError};

/// Destination for written bytes.
///
/// `reserve` hands out a writable span; `advance` commits a prefix of it.
/// Bytes are final once committed.
pub trait BufferSink {
    /// Writable span of at least `min` bytes.
    fn reserve(&mut self, min: usize) -> Result<&mut [u8]>;

    /// Commit the first `n` bytes of the last reserved span.
    fn advance(&mut self, n: usize);
}

/// Appends to a caller-supplied `Vec<u8>`.
///
/// Reserved but uncommitted bytes are trimmed when the sink is dropped, so
/// the vector only ever grows by what was written.
///
/// ```
/// use wirecast_core::{BufferSink, VecSink};
///
/// let mut out = vec![1u8];
/// {
///     let mut sink = VecSink::new(&mut out);
///     let span = sink.reserve(8).unwrap();
///     span[0] = 2;
///     sink.advance(1);
/// }
/// assert_eq!(out, [1, 2]);
/// ```
#[derive(Debug)]
pub struct VecSink<'a> {
    vec: &'a mut Vec<u8>,
    start: usize,
    committed: usize,
    limit: usize,
}

impl<'a> VecSink<'a> {
    /// Append after the current contents of `vec`.
    pub fn new(vec: &'a mut Vec<u8>) -> Self {
        let start = vec.len();
        Self {
            vec,
            start,
            committed: start,
            limit: usize::MAX,
        }
    }

    /// Cap the bytes this sink will accept.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Bytes committed through this sink.
    pub fn written(&self) -> usize {
        self.committed - self.start
    }
}

impl BufferSink for VecSink<'_> {
    fn reserve(&mut self, min: usize) -> Result<&mut [u8]> {
        let requested = self.written().saturating_add(min);
        if requested > self.limit {
            return Err(WireError::CapacityExceeded {
                requested,
                limit: self.limit,
            });
        }
        self.vec.resize(self.committed + min, 0);
        Ok(&mut self.vec[self.committed..])
    }

    fn advance(&mut self, n: usize) {
        debug_assert!(self.committed + n <= self.vec.len());
        self.committed += n;
    }
}

impl Drop for VecSink<'_> {
    fn drop(&mut self) {
        self.vec.truncate(self.committed);
    }
}
