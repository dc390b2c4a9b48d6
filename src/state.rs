//! Reusable writer side-state.
//!
//! Every serialize call needs a segment chain and a reference map. Both are
//! checked out of a [`StatePool`] and come back, reset, when the
//! [`Checkout`] guard drops.

use std::ops::{Deref, DerefMut};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use wirecast_core::{BufferPool, ReferenceWriter, SegmentedBuffer};

/// Most idle states kept by one pool.
pub const MAX_IDLE_STATES: usize = 16;

/// Output buffer and reference map for one serialize call.
#[derive(Debug, Default)]
pub struct WriterState {
    /// Output segments.
    pub buffer: SegmentedBuffer,
    /// Pointer identities seen so far.
    pub references: ReferenceWriter,
}

impl WriterState {
    fn reset(&mut self) {
        self.buffer.reset();
        self.references.clear();
    }
}

/// Pool of [`WriterState`]s shared by all serializers.
#[derive(Debug)]
pub struct StatePool {
    idle: Mutex<Vec<WriterState>>,
    buffers: BufferPool,
}

impl StatePool {
    /// Empty pool whose states rent segments from `buffers`.
    pub fn new(buffers: BufferPool) -> Self {
        Self {
            idle: Mutex::new(Vec::new()),
            buffers,
        }
    }

    /// Process-wide pool backed by the global buffer pool.
    pub fn global() -> Arc<StatePool> {
        static GLOBAL: OnceLock<Arc<StatePool>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(StatePool::new(BufferPool::global().clone()))))
    }

    /// Take an idle state or build a new one.
    pub fn checkout(&self) -> Checkout<'_> {
        let state = self.idle.lock().pop().unwrap_or_else(|| {
            tracing::trace!("writer state pool miss");
            WriterState {
                buffer: SegmentedBuffer::with_pool(self.buffers.clone()),
                references: ReferenceWriter::new(),
            }
        });
        Checkout {
            pool: self,
            state: Some(state),
        }
    }

    /// Idle states currently held.
    pub fn idle(&self) -> usize {
        self.idle.lock().len()
    }

    fn give_back(&self, mut state: WriterState) {
        state.reset();
        let mut idle = self.idle.lock();
        if idle.len() < MAX_IDLE_STATES {
            idle.push(state);
        }
    }
}

/// A [`WriterState`] on loan from a [`StatePool`].
#[derive(Debug)]
pub struct Checkout<'p> {
    pool: &'p StatePool,
    state: Option<WriterState>,
}

impl Deref for Checkout<'_> {
    type Target = WriterState;

    fn deref(&self) -> &WriterState {
        match &self.state {
            Some(state) => state,
            None => unreachable!("state is only taken on drop"),
        }
    }
}

impl DerefMut for Checkout<'_> {
    fn deref_mut(&mut self) -> &mut WriterState {
        match &mut self.state {
            Some(state) => state,
            None => unreachable!("state is only taken on drop"),
        }
    }
}

impl Drop for Checkout<'_> {
    fn drop(&mut self) {
        if let Some(state) = self.state.take() {
            self.pool.give_back(state);
        }
    }
}
