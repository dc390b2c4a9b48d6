//! Serializer facade: one configured entry point over the wire engine.

use std::any::type_name;
use std::sync::Arc;

use wirecast_core::{
    BufferSink, FormatterRegistry, Reader, Result, SerializerOptions, VecSink, Writer,
};

use crate::state::{Checkout, StatePool};

/// Serializes and deserializes registered types with fixed options.
///
/// Cloning is cheap; clones share the registry and the state pool.
///
/// # Example
///
/// ```
/// use wirecast::Serializer;
///
/// let serializer = Serializer::new();
/// let bytes = serializer.serialize(&vec![1u32, 2, 3]).unwrap();
/// let back: Vec<u32> = serializer.deserialize(&bytes).unwrap();
/// assert_eq!(back, [1, 2, 3]);
/// ```
#[derive(Debug, Clone)]
pub struct Serializer {
    registry: Arc<FormatterRegistry>,
    options: SerializerOptions,
    states: Arc<StatePool>,
}

impl Serializer {
    /// Serializer over the global registry with default options.
    pub fn new() -> Self {
        Self {
            registry: FormatterRegistry::global(),
            options: SerializerOptions::default(),
            states: StatePool::global(),
        }
    }

    /// Replace the options.
    #[must_use]
    pub fn with_options(mut self, options: SerializerOptions) -> Self {
        self.options = options;
        self
    }

    /// Resolve formatters through `registry` instead of the global one.
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<FormatterRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Check writer state out of `states` instead of the global pool.
    #[must_use]
    pub fn with_state_pool(mut self, states: Arc<StatePool>) -> Self {
        self.states = states;
        self
    }

    /// Registry used for lookups.
    pub fn registry(&self) -> &FormatterRegistry {
        &self.registry
    }

    /// Options applied to every call.
    pub fn options(&self) -> &SerializerOptions {
        &self.options
    }

    pub(crate) fn checkout(&self) -> Checkout<'_> {
        let mut state = self.states.checkout();
        state.buffer.set_limit(self.options.max_buffer_size);
        state
    }

    /// Serialize `value` into pooled segments held by `state`.
    pub(crate) fn write_pooled<T: 'static>(
        &self,
        state: &mut Checkout<'_>,
        value: &T,
    ) -> Result<usize> {
        let state = &mut **state;
        let mut writer = Writer::new(
            &mut state.buffer,
            &self.registry,
            self.options,
            &mut state.references,
        );
        writer.write_value(value)?;
        Ok(writer.written())
    }

    /// Serialize `value` into a new exact-length vector.
    pub fn serialize<T: 'static>(&self, value: &T) -> Result<Vec<u8>> {
        let mut state = self.checkout();
        self.write_pooled(&mut state, value)?;
        let bytes = state.buffer.to_vec();
        tracing::debug!(type_name = type_name::<T>(), len = bytes.len(), "serialized");
        Ok(bytes)
    }

    /// Serialize `value` into a caller-supplied sink. Returns the bytes
    /// written.
    ///
    /// The sink's own limit applies; `max_buffer_size` is not imposed on it.
    pub fn serialize_into<T: 'static>(
        &self,
        value: &T,
        sink: &mut dyn BufferSink,
    ) -> Result<usize> {
        let mut state = self.checkout();
        let mut writer = Writer::new(sink, &self.registry, self.options, &mut state.references);
        writer.write_value(value)?;
        let written = writer.written();
        tracing::debug!(type_name = type_name::<T>(), written, "serialized into sink");
        Ok(written)
    }

    /// Append the encoding of `value` to `out`. Returns the bytes appended.
    ///
    /// On error `out` keeps its previous contents.
    pub fn serialize_to_vec<T: 'static>(&self, value: &T, out: &mut Vec<u8>) -> Result<usize> {
        let start = out.len();
        let mut sink = VecSink::new(out).with_limit(self.options.max_buffer_size);
        match self.serialize_into(value, &mut sink) {
            Ok(written) => Ok(written),
            Err(err) => {
                drop(sink);
                out.truncate(start);
                Err(err)
            }
        }
    }

    /// Deserialize a new `T` from `bytes`.
    pub fn deserialize<T: Default + 'static>(&self, bytes: &[u8]) -> Result<T> {
        let mut value = T::default();
        self.deserialize_in_place(bytes, &mut value)?;
        Ok(value)
    }

    /// Overwrite `value` from `bytes`. Returns the bytes consumed.
    pub fn deserialize_in_place<T: 'static>(&self, bytes: &[u8], value: &mut T) -> Result<usize> {
        let mut reader = Reader::new(bytes, &self.registry, self.options);
        reader.read_value(value)?;
        tracing::debug!(
            type_name = type_name::<T>(),
            consumed = reader.consumed(),
            "deserialized"
        );
        Ok(reader.consumed())
    }

    /// Deserialize a new `T` from a chain of segments.
    pub fn deserialize_segments<T: Default + 'static>(&self, segments: &[&[u8]]) -> Result<T> {
        let mut reader = Reader::from_segments(segments, &self.registry, self.options);
        let value = reader.read_new()?;
        tracing::debug!(
            type_name = type_name::<T>(),
            segments = segments.len(),
            consumed = reader.consumed(),
            "deserialized segments"
        );
        Ok(value)
    }
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialize `value` with the global registry and default options.
pub fn serialize<T: 'static>(value: &T) -> Result<Vec<u8>> {
    Serializer::new().serialize(value)
}

/// Deserialize a `T` with the global registry and default options.
pub fn deserialize<T: Default + 'static>(bytes: &[u8]) -> Result<T> {
    Serializer::new().deserialize(bytes)
}
