//! Thread-safe byte array pool.
//!
//! Arrays are kept per power-of-two size class from 256 B to 1 MiB. Larger
//! requests are allocated exactly and dropped instead of pooled. Each class
//! retains at most [`MAX_RETAINED_PER_CLASS`] arrays.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

/// Size classes, smallest first.
const SIZE_CLASSES: [usize; 13] = [
    256,
    512,
    1024,
    2048,
    4096,
    8192,
    16 * 1024,
    32 * 1024,
    64 * 1024,
    128 * 1024,
    256 * 1024,
    512 * 1024,
    1024 * 1024,
];

/// Largest array the pool keeps.
pub const MAX_POOLED_SIZE: usize = SIZE_CLASSES[SIZE_CLASSES.len() - 1];

/// Arrays retained per size class.
pub const MAX_RETAINED_PER_CLASS: usize = 32;

fn class_for(min_len: usize) -> Option<usize> {
    SIZE_CLASSES.iter().position(|&size| size >= min_len)
}

struct PoolInner {
    classes: Vec<Mutex<Vec<Vec<u8>>>>,
}

impl PoolInner {
    fn take(&self, min_len: usize) -> Vec<u8> {
        let Some(idx) = class_for(min_len) else {
            tracing::trace!(min_len, "oversized rent, allocating unpooled array");
            return vec![0; min_len];
        };
        if let Some(array) = self.classes[idx].lock().pop() {
            return array;
        }
        tracing::trace!(size = SIZE_CLASSES[idx], "pool miss, allocating array");
        vec![0; SIZE_CLASSES[idx]]
    }

    fn give_back(&self, array: Vec<u8>) {
        // Only arrays allocated by `take` have an exact class length.
        let Some(idx) = SIZE_CLASSES.iter().position(|&size| size == array.len()) else {
            return;
        };
        let mut class = self.classes[idx].lock();
        if class.len() < MAX_RETAINED_PER_CLASS {
            class.push(array);
        }
    }
}

/// Shared pool of byte arrays.
///
/// Cloning is cheap; clones share the same arrays.
///
/// ```
/// use wirecast_core::BufferPool;
///
/// let pool = BufferPool::new();
/// {
///     let mut buf = pool.rent(100);
///     assert_eq!(buf.len(), 100);
///     buf[0] = 7;
/// }
/// assert_eq!(pool.retained(), 1);
/// ```
#[derive(Clone)]
pub struct BufferPool {
    inner: Arc<PoolInner>,
}

impl BufferPool {
    /// Create an empty, independent pool.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(PoolInner {
                classes: SIZE_CLASSES.iter().map(|_| Mutex::new(Vec::new())).collect(),
            }),
        }
    }

    /// Process-wide pool.
    pub fn global() -> &'static BufferPool {
        static GLOBAL: OnceLock<BufferPool> = OnceLock::new();
        GLOBAL.get_or_init(BufferPool::new)
    }

    /// Rent an array of `len` bytes.
    ///
    /// The contents are initialized but unspecified; a recycled array still
    /// holds whatever its previous renter left in it.
    pub fn rent(&self, len: usize) -> PooledBuffer {
        PooledBuffer {
            array: self.inner.take(len),
            len,
            pool: Some(Arc::clone(&self.inner)),
        }
    }

    /// Arrays currently held across all classes.
    pub fn retained(&self) -> usize {
        self.inner.classes.iter().map(|class| class.lock().len()).sum()
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferPool")
            .field("retained", &self.retained())
            .finish()
    }
}

/// Array rented from a [`BufferPool`], returned when dropped.
///
/// Dereferences to the first `len()` bytes. The array behind it may be
/// larger; [`capacity`](Self::capacity) reports the full size and
/// [`set_len`](Self::set_len) moves the visible end within it.
pub struct PooledBuffer {
    array: Vec<u8>,
    len: usize,
    pool: Option<Arc<PoolInner>>,
}

impl PooledBuffer {
    /// Full size of the underlying array.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.array.len()
    }

    /// Move the visible end. `len` is clamped to the capacity.
    pub fn set_len(&mut self, len: usize) {
        self.len = len.min(self.array.len());
    }

    /// Detach from the pool, returning exactly the visible bytes.
    #[must_use]
    pub fn into_vec(mut self) -> Vec<u8> {
        let mut array = std::mem::take(&mut self.array);
        array.truncate(self.len);
        array
    }
}

impl Default for PooledBuffer {
    /// An empty buffer that owns no pooled array.
    fn default() -> Self {
        Self {
            array: Vec::new(),
            len: 0,
            pool: None,
        }
    }
}

impl Deref for PooledBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.array[..self.len]
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.array[..self.len]
    }
}

impl PartialEq for PooledBuffer {
    fn eq(&self, other: &Self) -> bool {
        **self == **other
    }
}

impl Eq for PooledBuffer {}

impl fmt::Debug for PooledBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledBuffer")
            .field("len", &self.len)
            .field("capacity", &self.array.len())
            .finish()
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        if let Some(pool) = &self.pool {
            pool.give_back(std::mem::take(&mut self.array));
        }
    }
}
