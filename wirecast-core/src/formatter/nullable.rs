use core::marker::PhantomData;

use super::Formatter;
use crate::{Reader, Result, WireError, Writer};

/// `Option<T>` over the registered formatter for `T`.
///
/// `None` is the null marker. `Some` is the inner encoding as-is when it
/// starts with an object or union header, otherwise an object header of
/// count 1 followed by the inner encoding. Nested wrappers such as
/// `Option<Option<T>>` always take the envelope.
pub struct NullableFormatter<T>(PhantomData<fn() -> T>);

impl<T> NullableFormatter<T> {
    /// New formatter.
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for NullableFormatter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Default + 'static> Formatter<Option<T>> for NullableFormatter<T> {
    fn serialize(&self, writer: &mut Writer<'_>, value: &Option<T>) -> Result<()> {
        let Some(inner) = value else {
            return writer.write_null();
        };
        let formatter = writer.registry().resolve::<T>()?;
        if !formatter.writes_header() {
            writer.write_object_header(1)?;
        }
        writer.write_with(&*formatter, inner)
    }

    fn deserialize(&self, reader: &mut Reader<'_>, value: &mut Option<T>) -> Result<()> {
        if reader.peek_is_null()? {
            reader.read_u8()?;
            *value = None;
            return Ok(());
        }
        let formatter = reader.registry().resolve::<T>()?;
        if !formatter.writes_header() {
            let count = reader.try_read_object_header()?;
            if count != Some(1) {
                return Err(WireError::schema::<Option<T>>(format!(
                    "expected 1 member, found {count:?}"
                )));
            }
        }
        let inner = value.get_or_insert_with(T::default);
        reader.read_with(&*formatter, inner)
    }
}
