use core::marker::PhantomData;
use core::time::Duration;

use super::Formatter;
use crate::{Reader, Result, WireError, Writer};

/// Scalar with a fixed-width little-endian encoding.
pub trait Primitive: Copy + Default + 'static {
    /// Append `self`.
    fn write(self, writer: &mut Writer<'_>) -> Result<()>;

    /// Read one value.
    fn read(reader: &mut Reader<'_>) -> Result<Self>;
}

macro_rules! impl_primitive {
    ($($ty:ty => $write:ident, $read:ident;)+) => {
        $(
            impl Primitive for $ty {
                #[inline]
                fn write(self, writer: &mut Writer<'_>) -> Result<()> {
                    writer.$write(self)
                }

                #[inline]
                fn read(reader: &mut Reader<'_>) -> Result<Self> {
                    reader.$read()
                }
            }
        )+
    };
}

impl_primitive! {
    u8 => write_u8, read_u8;
    u16 => write_u16, read_u16;
    u32 => write_u32, read_u32;
    u64 => write_u64, read_u64;
    u128 => write_u128, read_u128;
    i8 => write_i8, read_i8;
    i16 => write_i16, read_i16;
    i32 => write_i32, read_i32;
    i64 => write_i64, read_i64;
    i128 => write_i128, read_i128;
    f32 => write_f32, read_f32;
    f64 => write_f64, read_f64;
    bool => write_bool, read_bool;
    char => write_char, read_char;
}

// Pointer-sized integers travel as 64 bits.
impl Primitive for usize {
    fn write(self, writer: &mut Writer<'_>) -> Result<()> {
        writer.write_u64(self as u64)
    }

    fn read(reader: &mut Reader<'_>) -> Result<Self> {
        let value = reader.read_u64()?;
        usize::try_from(value).map_err(|_| WireError::VarIntOverflow {
            value: i128::from(value),
            target: "usize",
        })
    }
}

impl Primitive for isize {
    fn write(self, writer: &mut Writer<'_>) -> Result<()> {
        writer.write_i64(self as i64)
    }

    fn read(reader: &mut Reader<'_>) -> Result<Self> {
        let value = reader.read_i64()?;
        isize::try_from(value).map_err(|_| WireError::VarIntOverflow {
            value: i128::from(value),
            target: "isize",
        })
    }
}

/// Formatter for any [`Primitive`].
pub struct PrimitiveFormatter<T>(PhantomData<fn() -> T>);

impl<T> PrimitiveFormatter<T> {
    /// New formatter.
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for PrimitiveFormatter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Primitive> Formatter<T> for PrimitiveFormatter<T> {
    #[inline]
    fn serialize(&self, writer: &mut Writer<'_>, value: &T) -> Result<()> {
        value.write(writer)
    }

    #[inline]
    fn deserialize(&self, reader: &mut Reader<'_>, value: &mut T) -> Result<()> {
        *value = T::read(reader)?;
        Ok(())
    }
}

/// Formatter for `()`; writes nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnitFormatter;

impl Formatter<()> for UnitFormatter {
    fn serialize(&self, _writer: &mut Writer<'_>, _value: &()) -> Result<()> {
        Ok(())
    }

    fn deserialize(&self, _reader: &mut Reader<'_>, _value: &mut ()) -> Result<()> {
        Ok(())
    }
}

/// Formatter for [`Duration`]: `u64` seconds then `u32` nanoseconds.
#[derive(Debug, Default, Clone, Copy)]
pub struct DurationFormatter;

impl Formatter<Duration> for DurationFormatter {
    fn serialize(&self, writer: &mut Writer<'_>, value: &Duration) -> Result<()> {
        writer.write_u64(value.as_secs())?;
        writer.write_u32(value.subsec_nanos())
    }

    fn deserialize(&self, reader: &mut Reader<'_>, value: &mut Duration) -> Result<()> {
        let secs = reader.read_u64()?;
        let nanos = reader.read_u32()?;
        if nanos >= 1_000_000_000 {
            return Err(WireError::Malformed {
                message: "duration nanoseconds out of range",
            });
        }
        *value = Duration::new(secs, nanos);
        Ok(())
    }
}
