//! Reference-tracked pointers.
//!
//! With tracking on, the first encounter of a pointee writes its body and
//! every later one writes a back-reference, so shared subgraphs come back
//! shared. Pointers always sit behind `Option` so null is representable.
//! With tracking off no back-references are written and only the depth
//! guard stops a cycle.

use core::any::Any;
use core::marker::PhantomData;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use super::Formatter;
use crate::header;
use crate::reference::Tracked;
use crate::{Reader, Result, WireError, Writer};

/// Shared pointer whose pointee is read into a default value first.
pub trait SharedPointer: Clone + Any {
    /// Pointee type.
    type Pointee: Default + 'static;

    /// Wrap a freshly read pointee.
    fn wrap(value: Self::Pointee) -> Self;

    /// Borrow the pointee.
    fn pointee(&self) -> &Self::Pointee;

    /// Address identifying the pointee.
    fn identity(&self) -> usize;
}

impl<T: Default + 'static> SharedPointer for Rc<T> {
    type Pointee = T;

    fn wrap(value: T) -> Self {
        Rc::new(value)
    }

    fn pointee(&self) -> &T {
        self
    }

    fn identity(&self) -> usize {
        Rc::as_ptr(self) as *const () as usize
    }
}

impl<T: Default + 'static> SharedPointer for Arc<T> {
    type Pointee = T;

    fn wrap(value: T) -> Self {
        Arc::new(value)
    }

    fn pointee(&self) -> &T {
        self
    }

    fn identity(&self) -> usize {
        Arc::as_ptr(self) as *const () as usize
    }
}

/// Writes a back-reference for a pointee already written. Returns `true`
/// when the body must follow.
fn write_head(writer: &mut Writer<'_>, identity: usize) -> Result<bool> {
    if writer.options().track_references {
        if let Tracked::Seen(id) = writer.track_reference(identity) {
            writer.write_reference(id)?;
            return Ok(false);
        }
    }
    Ok(true)
}

enum Head<P> {
    Null,
    Pointer(P),
    /// A new body follows; the id is reserved when tracking is on.
    Body(Option<u32>),
}

fn read_head<P: Any + Clone>(reader: &mut Reader<'_>) -> Result<Head<P>> {
    let tracking = reader.options().track_references;
    match reader.peek_byte()? {
        header::NULL => {
            reader.read_u8()?;
            Ok(Head::Null)
        }
        header::REFERENCE if tracking => {
            reader.read_u8()?;
            let id = reader.read_reference_id()?;
            Ok(Head::Pointer(reader.resolve_reference(id)?))
        }
        header::REFERENCE => Err(WireError::Malformed {
            message: "back-reference while reference tracking is off",
        }),
        _ => Ok(Head::Body(tracking.then(|| reader.reserve_reference()))),
    }
}

fn write_body<T: 'static>(writer: &mut Writer<'_>, value: &T) -> Result<()> {
    let formatter = writer.registry().resolve::<T>()?;
    if !formatter.writes_header() {
        writer.write_object_header(1)?;
    }
    writer.write_with(&*formatter, value)
}

fn read_body<T: 'static>(reader: &mut Reader<'_>, value: &mut T) -> Result<()> {
    let formatter = reader.registry().resolve::<T>()?;
    if !formatter.writes_header() {
        let count = reader.try_read_object_header()?;
        if count != Some(1) {
            return Err(WireError::schema::<T>("pointer body must be a single member"));
        }
    }
    reader.read_with(&*formatter, value)
}

/// Formatter for `Option<P>` where `P` is an [`SharedPointer`] such as
/// `Rc<T>` or `Arc<T>`.
///
/// The pointee is fully read before the pointer exists, so a pointee that
/// refers back to itself cannot be expressed; use [`CyclicFormatter`].
pub struct SharedFormatter<P>(PhantomData<fn() -> P>);

impl<P> SharedFormatter<P> {
    /// New formatter.
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<P> Default for SharedFormatter<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: SharedPointer> Formatter<Option<P>> for SharedFormatter<P> {
    fn serialize(&self, writer: &mut Writer<'_>, value: &Option<P>) -> Result<()> {
        let Some(pointer) = value else {
            return writer.write_null();
        };
        if write_head(writer, pointer.identity())? {
            write_body(writer, pointer.pointee())?;
        }
        Ok(())
    }

    fn deserialize(&self, reader: &mut Reader<'_>, value: &mut Option<P>) -> Result<()> {
        *value = match read_head::<P>(reader)? {
            Head::Null => None,
            Head::Pointer(pointer) => Some(pointer),
            Head::Body(id) => {
                let mut pointee = P::Pointee::default();
                read_body(reader, &mut pointee)?;
                let pointer = P::wrap(pointee);
                if let Some(id) = id {
                    reader.fill_reference(id, pointer.clone());
                }
                Some(pointer)
            }
        };
        Ok(())
    }
}

/// Formatter for `Option<Rc<RefCell<T>>>`, which may form cycles.
///
/// The pointer is registered with a default pointee before the body is
/// read, so back-references inside the body, including to the object
/// itself, resolve to it.
pub struct CyclicFormatter<T>(PhantomData<fn() -> T>);

impl<T> CyclicFormatter<T> {
    /// New formatter.
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for CyclicFormatter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Default + 'static> Formatter<Option<Rc<RefCell<T>>>> for CyclicFormatter<T> {
    fn serialize(&self, writer: &mut Writer<'_>, value: &Option<Rc<RefCell<T>>>) -> Result<()> {
        let Some(cell) = value else {
            return writer.write_null();
        };
        if write_head(writer, Rc::as_ptr(cell) as *const () as usize)? {
            let pointee = cell.try_borrow().map_err(|_| WireError::Malformed {
                message: "cyclic pointee is mutably borrowed",
            })?;
            write_body(writer, &*pointee)?;
        }
        Ok(())
    }

    fn deserialize(
        &self,
        reader: &mut Reader<'_>,
        value: &mut Option<Rc<RefCell<T>>>,
    ) -> Result<()> {
        *value = match read_head::<Rc<RefCell<T>>>(reader)? {
            Head::Null => None,
            Head::Pointer(pointer) => Some(pointer),
            Head::Body(id) => {
                let pointer = Rc::new(RefCell::new(T::default()));
                if let Some(id) = id {
                    reader.fill_reference(id, Rc::clone(&pointer));
                }
                let mut pointee = T::default();
                read_body(reader, &mut pointee)?;
                *pointer.borrow_mut() = pointee;
                Some(pointer)
            }
        };
        Ok(())
    }
}
