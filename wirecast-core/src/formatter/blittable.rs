use core::marker::PhantomData;

use super::{Blittable, Formatter};
use crate::{Reader, Result, Writer};

/// Raw memory image formatter.
///
/// For `T` the image is written with no header. For `Vec<T>`,
/// `Option<Vec<T>>` and `Box<[T]>` a collection header precedes one block
/// copy of all elements; the declared length is checked against the
/// remaining input as `len * size_of::<T>()` before anything is allocated.
pub struct BlittableFormatter<T>(PhantomData<fn() -> T>);

impl<T> BlittableFormatter<T> {
    /// New formatter.
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for BlittableFormatter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Blittable> Formatter<T> for BlittableFormatter<T> {
    #[inline]
    fn serialize(&self, writer: &mut Writer<'_>, value: &T) -> Result<()> {
        writer.write_blittable(value)
    }

    #[inline]
    fn deserialize(&self, reader: &mut Reader<'_>, value: &mut T) -> Result<()> {
        *value = reader.read_blittable()?;
        Ok(())
    }
}

impl<T: Blittable> Formatter<Vec<T>> for BlittableFormatter<T> {
    fn serialize(&self, writer: &mut Writer<'_>, value: &Vec<T>) -> Result<()> {
        writer.write_blittable_slice(value)
    }

    fn deserialize(&self, reader: &mut Reader<'_>, value: &mut Vec<T>) -> Result<()> {
        reader.read_blittable_vec(value)?;
        Ok(())
    }
}

impl<T: Blittable> Formatter<Option<Vec<T>>> for BlittableFormatter<T> {
    fn serialize(&self, writer: &mut Writer<'_>, value: &Option<Vec<T>>) -> Result<()> {
        match value {
            Some(values) => writer.write_blittable_slice(values),
            None => writer.write_collection_header(None),
        }
    }

    fn deserialize(&self, reader: &mut Reader<'_>, value: &mut Option<Vec<T>>) -> Result<()> {
        let mut values = value.take().unwrap_or_default();
        if reader.read_blittable_vec(&mut values)? {
            *value = Some(values);
        }
        Ok(())
    }
}

impl<T: Blittable> Formatter<Box<[T]>> for BlittableFormatter<T> {
    fn serialize(&self, writer: &mut Writer<'_>, value: &Box<[T]>) -> Result<()> {
        writer.write_blittable_slice(value)
    }

    fn deserialize(&self, reader: &mut Reader<'_>, value: &mut Box<[T]>) -> Result<()> {
        let mut values = Vec::new();
        reader.read_blittable_vec(&mut values)?;
        *value = values.into_boxed_slice();
        Ok(())
    }
}
