//! Objects: an object header with the member count, then each member in
//! declaration order.
//!
//! Members may only be appended over a type's lifetime. A reader that knows
//! more members than were stored leaves the missing trailing ones at their
//! defaults; one that knows fewer rejects the input.

use core::marker::PhantomData;

use super::Formatter;
use crate::{Reader, Result, WireError, Writer};

/// Type encoded as an object.
///
/// ```
/// use wirecast_core::formatter::{Members, WireObject};
/// use wirecast_core::{FormatterRegistry, Reader, ReferenceWriter, Result,
///     SegmentedBuffer, SerializerOptions, Writer};
///
/// #[derive(Default, Debug, PartialEq)]
/// struct Account {
///     id: u64,
///     name: String,
/// }
///
/// impl WireObject for Account {
///     const MEMBER_COUNT: usize = 2;
///
///     fn write_members(&self, writer: &mut Writer<'_>) -> Result<()> {
///         writer.write_value(&self.id)?;
///         writer.write_value(&self.name)
///     }
///
///     fn read_members(&mut self, members: &mut Members<'_, '_>) -> Result<()> {
///         members.read(&mut self.id)?;
///         members.read(&mut self.name)
///     }
/// }
///
/// let registry = FormatterRegistry::with_builtins();
/// registry.register_object::<Account>();
///
/// let options = SerializerOptions::default();
/// let mut buffer = SegmentedBuffer::new();
/// let mut refs = ReferenceWriter::new();
/// let account = Account { id: 7, name: "ada".into() };
/// Writer::new(&mut buffer, &registry, options, &mut refs).write_value(&account).unwrap();
/// let bytes = buffer.to_vec();
///
/// let mut back = Account::default();
/// Reader::new(&bytes, &registry, options).read_value(&mut back).unwrap();
/// assert_eq!(back, account);
/// ```
pub trait WireObject: Default + 'static {
    /// Members this version of the type writes. At most 249.
    const MEMBER_COUNT: usize;

    /// Write all members in order.
    fn write_members(&self, writer: &mut Writer<'_>) -> Result<()>;

    /// Read members in the same order.
    fn read_members(&mut self, members: &mut Members<'_, '_>) -> Result<()>;
}

/// Member cursor for one stored object.
///
/// Reads past the stored count are no-ops, leaving the target untouched.
pub struct Members<'r, 'a> {
    reader: &'r mut Reader<'a>,
    remaining: usize,
}

impl<'r, 'a> Members<'r, 'a> {
    /// Cursor over `stored` members of a type that knows `known`.
    pub fn new<T: ?Sized>(reader: &'r mut Reader<'a>, stored: u8, known: usize) -> Result<Self> {
        let stored = usize::from(stored);
        if stored > known {
            return Err(WireError::schema::<T>(format!(
                "{stored} members stored, {known} known"
            )));
        }
        Ok(Self {
            reader,
            remaining: stored,
        })
    }

    /// Stored members not yet read.
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Read the next member with its registered formatter.
    pub fn read<V: 'static>(&mut self, value: &mut V) -> Result<()> {
        if self.remaining == 0 {
            return Ok(());
        }
        self.remaining -= 1;
        self.reader.read_value(value)
    }

    /// Read the next member with `formatter`.
    pub fn read_with<V>(&mut self, formatter: &dyn Formatter<V>, value: &mut V) -> Result<()> {
        if self.remaining == 0 {
            return Ok(());
        }
        self.remaining -= 1;
        self.reader.read_with(formatter, value)
    }
}

/// Formatter for a [`WireObject`].
pub struct ObjectFormatter<T>(PhantomData<fn() -> T>);

impl<T> ObjectFormatter<T> {
    /// New formatter.
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for ObjectFormatter<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn read_object_header(reader: &mut Reader<'_>) -> Result<u8> {
    reader.try_read_object_header()?.ok_or(WireError::Malformed {
        message: "null where an object is required",
    })
}

impl<T: WireObject> Formatter<T> for ObjectFormatter<T> {
    fn serialize(&self, writer: &mut Writer<'_>, value: &T) -> Result<()> {
        writer.write_object_header(T::MEMBER_COUNT)?;
        value.write_members(writer)
    }

    fn deserialize(&self, reader: &mut Reader<'_>, value: &mut T) -> Result<()> {
        let stored = read_object_header(reader)?;
        if usize::from(stored) < T::MEMBER_COUNT {
            *value = T::default();
        }
        let mut members = Members::new::<T>(reader, stored, T::MEMBER_COUNT)?;
        value.read_members(&mut members)
    }

    fn writes_header(&self) -> bool {
        true
    }
}

/// `(A, B)` as a two-member object.
pub struct PairFormatter<A, B>(PhantomData<fn() -> (A, B)>);

impl<A, B> PairFormatter<A, B> {
    /// New formatter.
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<A, B> Default for PairFormatter<A, B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Default + 'static, B: Default + 'static> Formatter<(A, B)> for PairFormatter<A, B> {
    fn serialize(&self, writer: &mut Writer<'_>, value: &(A, B)) -> Result<()> {
        writer.write_object_header(2)?;
        writer.write_value(&value.0)?;
        writer.write_value(&value.1)
    }

    fn deserialize(&self, reader: &mut Reader<'_>, value: &mut (A, B)) -> Result<()> {
        let stored = read_object_header(reader)?;
        if stored < 2 {
            *value = Default::default();
        }
        let mut members = Members::new::<(A, B)>(reader, stored, 2)?;
        members.read(&mut value.0)?;
        members.read(&mut value.1)
    }

    fn writes_header(&self) -> bool {
        true
    }
}
