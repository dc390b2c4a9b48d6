use core::hash::Hash;
use core::marker::PhantomData;
use std::collections::HashMap;
use std::sync::Arc;

use super::Formatter;
use crate::buffer::{BufferPool, PooledBuffer};
use crate::{Reader, Result, Writer};

/// Sequence formatter dispatching once per element.
///
/// Handles `Vec<T>`, `Option<Vec<T>>` and `Box<[T]>`. The element formatter
/// is resolved once per sequence. A null header read into a non-optional
/// sequence leaves it empty.
pub struct VecFormatter<T>(PhantomData<fn() -> T>);

impl<T> VecFormatter<T> {
    /// New formatter.
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for VecFormatter<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn write_items<T: 'static>(writer: &mut Writer<'_>, items: &[T]) -> Result<()> {
    let formatter = writer.registry().resolve::<T>()?;
    writer.write_collection_header(Some(items.len()))?;
    for item in items {
        writer.write_with(&*formatter, item)?;
    }
    Ok(())
}

/// Returns `false` on a null header.
fn read_items<T: Default + 'static>(reader: &mut Reader<'_>, out: &mut Vec<T>) -> Result<bool> {
    out.clear();
    let Some(len) = reader.try_read_collection_header()? else {
        return Ok(false);
    };
    let formatter = reader.registry().resolve::<T>()?;
    out.reserve(len);
    for _ in 0..len {
        let mut item = T::default();
        reader.read_with(&*formatter, &mut item)?;
        out.push(item);
    }
    Ok(true)
}

impl<T: Default + 'static> Formatter<Vec<T>> for VecFormatter<T> {
    fn serialize(&self, writer: &mut Writer<'_>, value: &Vec<T>) -> Result<()> {
        write_items(writer, value)
    }

    fn deserialize(&self, reader: &mut Reader<'_>, value: &mut Vec<T>) -> Result<()> {
        read_items(reader, value)?;
        Ok(())
    }
}

impl<T: Default + 'static> Formatter<Option<Vec<T>>> for VecFormatter<T> {
    fn serialize(&self, writer: &mut Writer<'_>, value: &Option<Vec<T>>) -> Result<()> {
        match value {
            Some(items) => write_items(writer, items),
            None => writer.write_collection_header(None),
        }
    }

    fn deserialize(&self, reader: &mut Reader<'_>, value: &mut Option<Vec<T>>) -> Result<()> {
        let mut items = value.take().unwrap_or_default();
        if read_items(reader, &mut items)? {
            *value = Some(items);
        }
        Ok(())
    }
}

impl<T: Default + 'static> Formatter<Box<[T]>> for VecFormatter<T> {
    fn serialize(&self, writer: &mut Writer<'_>, value: &Box<[T]>) -> Result<()> {
        write_items(writer, value)
    }

    fn deserialize(&self, reader: &mut Reader<'_>, value: &mut Box<[T]>) -> Result<()> {
        let mut items = Vec::new();
        read_items(reader, &mut items)?;
        *value = items.into_boxed_slice();
        Ok(())
    }
}

/// `HashMap<K, V>` as a collection header followed by alternating keys and
/// values.
pub struct MapFormatter<K, V>(PhantomData<fn() -> (K, V)>);

impl<K, V> MapFormatter<K, V> {
    /// New formatter.
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<K, V> Default for MapFormatter<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Formatter<HashMap<K, V>> for MapFormatter<K, V>
where
    K: Eq + Hash + Default + 'static,
    V: Default + 'static,
{
    fn serialize(&self, writer: &mut Writer<'_>, value: &HashMap<K, V>) -> Result<()> {
        let keys = writer.registry().resolve::<K>()?;
        let values = writer.registry().resolve::<V>()?;
        writer.write_collection_header(Some(value.len()))?;
        for (k, v) in value {
            writer.write_with(&*keys, k)?;
            writer.write_with(&*values, v)?;
        }
        Ok(())
    }

    fn deserialize(&self, reader: &mut Reader<'_>, value: &mut HashMap<K, V>) -> Result<()> {
        value.clear();
        // Each entry takes at least two bytes.
        let Some(len) = reader.try_read_collection_header_sized(2)? else {
            return Ok(());
        };
        let keys = reader.registry().resolve::<K>()?;
        let values = reader.registry().resolve::<V>()?;
        value.reserve(len);
        for _ in 0..len {
            let mut k = K::default();
            let mut v = V::default();
            reader.read_with(&*keys, &mut k)?;
            reader.read_with(&*values, &mut v)?;
            value.insert(k, v);
        }
        Ok(())
    }
}

/// Byte views: `Arc<[u8]>` and [`PooledBuffer`].
///
/// Both encode as a collection header and the raw bytes. A pooled buffer
/// is read into a fresh rental from the global pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct BytesFormatter;

impl Formatter<Arc<[u8]>> for BytesFormatter {
    fn serialize(&self, writer: &mut Writer<'_>, value: &Arc<[u8]>) -> Result<()> {
        writer.write_blittable_slice::<u8>(value)
    }

    fn deserialize(&self, reader: &mut Reader<'_>, value: &mut Arc<[u8]>) -> Result<()> {
        let len = reader.try_read_collection_header()?.unwrap_or(0);
        *value = Arc::from(reader.read_raw(len)?);
        Ok(())
    }
}

impl Formatter<PooledBuffer> for BytesFormatter {
    fn serialize(&self, writer: &mut Writer<'_>, value: &PooledBuffer) -> Result<()> {
        writer.write_blittable_slice::<u8>(value)
    }

    fn deserialize(&self, reader: &mut Reader<'_>, value: &mut PooledBuffer) -> Result<()> {
        let len = reader.try_read_collection_header()?.unwrap_or(0);
        let mut buf = BufferPool::global().rent(len);
        buf.copy_from_slice(reader.read_raw(len)?);
        *value = buf;
        Ok(())
    }
}
