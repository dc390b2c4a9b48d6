//! Identity tracking for shared and cyclic pointers.
//!
//! Ids start at 0 and grow by one per first encounter, in the order the
//! writer walks the graph. The reader reserves ids in the same walk order,
//! so the two tables line up by position alone.

use core::any::{Any, type_name};

use hashbrown::HashMap;
use hashbrown::hash_map::Entry;

use crate::{Result, WireError};

/// Outcome of [`ReferenceWriter::track`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tracked {
    /// Already written under this id; emit a back-reference.
    Seen(u32),
    /// First encounter, now registered under this id; emit the body.
    New(u32),
}

/// Write-side table: object identity to id.
#[derive(Debug, Default)]
pub struct ReferenceWriter {
    ids: HashMap<usize, u32>,
}

impl ReferenceWriter {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `identity`, registering it under the next id if unseen.
    pub fn track(&mut self, identity: usize) -> Tracked {
        let next = self.ids.len() as u32;
        match self.ids.entry(identity) {
            Entry::Occupied(entry) => Tracked::Seen(*entry.get()),
            Entry::Vacant(entry) => {
                entry.insert(next);
                Tracked::New(next)
            }
        }
    }

    /// Registered identities.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Forget all identities, keeping the allocation.
    pub fn clear(&mut self) {
        self.ids.clear();
    }
}

/// Read-side table: id to materialized pointer.
///
/// A slot is reserved when the reader meets a new object and filled once
/// a pointer to it exists. Cyclic pointers fill their slot before the body
/// is read; acyclic ones after.
#[derive(Default)]
pub struct ReferenceReader {
    slots: Vec<Option<Box<dyn Any>>>,
}

impl ReferenceReader {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the next id.
    pub fn reserve(&mut self) -> u32 {
        self.slots.push(None);
        (self.slots.len() - 1) as u32
    }

    /// Store the pointer for a reserved id.
    pub fn fill<P: Any>(&mut self, id: u32, pointer: P) {
        if let Some(slot) = self.slots.get_mut(id as usize) {
            *slot = Some(Box::new(pointer));
        }
    }

    /// Reserve and fill in one step.
    pub fn register<P: Any>(&mut self, pointer: P) -> u32 {
        let id = self.reserve();
        self.fill(id, pointer);
        id
    }

    /// Clone the pointer stored under `id`.
    pub fn resolve<P: Any + Clone>(&self, id: u32) -> Result<P> {
        let slot = self
            .slots
            .get(id as usize)
            .ok_or(WireError::Malformed {
                message: "back-reference to an unknown id",
            })?;
        let stored = slot.as_ref().ok_or(WireError::Malformed {
            message: "back-reference to an object still under construction",
        })?;
        stored.downcast_ref::<P>().cloned().ok_or_else(|| WireError::SchemaMismatch {
            type_name: type_name::<P>(),
            message: format!("back-reference {id} points at a different type"),
        })
    }

    /// Reserved ids.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if nothing is reserved.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Forget all slots.
    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

impl core::fmt::Debug for ReferenceReader {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ReferenceReader")
            .field("slots", &self.slots.len())
            .finish()
    }
}
