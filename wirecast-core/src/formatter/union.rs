//! Closed unions: a tag header selecting one of a fixed set of cases.

use core::any::{TypeId, type_name};
use std::sync::Arc;

use hashbrown::HashMap;

use super::Formatter;
use crate::{Reader, Result, WireError, Writer};

type WriteCase<B> = Box<dyn Fn(&mut Writer<'_>, &B) -> Result<bool> + Send + Sync>;
type ReadCase<B> = Box<dyn Fn(&mut Reader<'_>) -> Result<B> + Send + Sync>;

struct Case<B> {
    tag: u16,
    type_name: &'static str,
    /// Writes the tagged case and returns `true` if the value is this case.
    write: WriteCase<B>,
    read: ReadCase<B>,
}

struct Table<B> {
    cases: Vec<Case<B>>,
    by_tag: HashMap<u16, usize>,
    by_type: HashMap<TypeId, u16>,
}

/// Collects the cases of a union before freezing them.
pub struct UnionBuilder<B> {
    cases: Vec<Case<B>>,
    types: Vec<TypeId>,
}

impl<B: 'static> UnionBuilder<B> {
    /// Builder with no cases.
    pub fn new() -> Self {
        Self {
            cases: Vec::new(),
            types: Vec::new(),
        }
    }

    /// Add case `C` under `tag`.
    ///
    /// `into` lifts a read case into the union; `project` returns the case
    /// payload if a union value holds this case. The payload is encoded with
    /// the registered formatter for `C`.
    #[must_use]
    pub fn case<C: Default + 'static>(
        mut self,
        tag: u16,
        into: fn(C) -> B,
        project: fn(&B) -> Option<&C>,
    ) -> Self {
        self.types.push(TypeId::of::<C>());
        self.cases.push(Case {
            tag,
            type_name: type_name::<C>(),
            write: Box::new(move |writer: &mut Writer<'_>, value: &B| {
                let Some(payload) = project(value) else {
                    return Ok(false);
                };
                writer.write_union_header(tag)?;
                writer.write_value(payload)?;
                Ok(true)
            }),
            read: Box::new(move |reader: &mut Reader<'_>| {
                let mut payload = C::default();
                reader.read_value(&mut payload)?;
                Ok(into(payload))
            }),
        });
        self
    }

    /// Freeze the case set. Fails if a tag or a case type appears twice.
    pub fn build(self) -> Result<UnionFormatter<B>> {
        let mut by_tag = HashMap::with_capacity(self.cases.len());
        let mut by_type = HashMap::with_capacity(self.cases.len());
        for (idx, (case, type_id)) in self.cases.iter().zip(&self.types).enumerate() {
            if by_tag.insert(case.tag, idx).is_some() {
                return Err(WireError::schema::<B>(format!("duplicate union tag {}", case.tag)));
            }
            if by_type.insert(*type_id, case.tag).is_some() {
                return Err(WireError::schema::<B>(format!(
                    "{} appears under more than one tag",
                    case.type_name
                )));
            }
        }
        Ok(UnionFormatter {
            table: Arc::new(Table {
                cases: self.cases,
                by_tag,
                by_type,
            }),
        })
    }
}

impl<B: 'static> Default for UnionBuilder<B> {
    fn default() -> Self {
        Self::new()
    }
}

/// Formatter for a closed union `B` and for `Option<B>`.
///
/// The tag-to-case map is fixed when the formatter is built. Tags up to 249
/// take one byte, larger ones three.
///
/// ```
/// use wirecast_core::{FormatterRegistry, Reader, ReferenceWriter, SegmentedBuffer,
///     SerializerOptions, UnionFormatter, Writer};
///
/// #[derive(Debug, PartialEq)]
/// enum Shape {
///     Circle(f64),
///     Label(String),
/// }
///
/// impl Default for Shape {
///     fn default() -> Self {
///         Shape::Circle(0.0)
///     }
/// }
///
/// let union = UnionFormatter::<Shape>::builder()
///     .case(0, Shape::Circle, |s| match s {
///         Shape::Circle(r) => Some(r),
///         _ => None,
///     })
///     .case(300, Shape::Label, |s| match s {
///         Shape::Label(l) => Some(l),
///         _ => None,
///     })
///     .build()
///     .unwrap();
///
/// let registry = FormatterRegistry::with_builtins();
/// registry.register_union(union);
///
/// let options = SerializerOptions::default();
/// let mut buffer = SegmentedBuffer::new();
/// let mut refs = ReferenceWriter::new();
/// let shape = Shape::Label("hex".into());
/// Writer::new(&mut buffer, &registry, options, &mut refs).write_value(&shape).unwrap();
/// let bytes = buffer.to_vec();
/// assert_eq!(&bytes[..3], &[0xFA, 0x2C, 0x01]);
///
/// let mut back = Shape::default();
/// Reader::new(&bytes, &registry, options).read_value(&mut back).unwrap();
/// assert_eq!(back, shape);
/// ```
pub struct UnionFormatter<B> {
    table: Arc<Table<B>>,
}

impl<B: 'static> UnionFormatter<B> {
    /// Start describing the cases.
    pub fn builder() -> UnionBuilder<B> {
        UnionBuilder::new()
    }

    /// Tag assigned to case type `C`.
    pub fn tag_of<C: 'static>(&self) -> Option<u16> {
        self.table.by_type.get(&TypeId::of::<C>()).copied()
    }

    /// Number of cases.
    pub fn len(&self) -> usize {
        self.table.cases.len()
    }

    /// True if the union has no cases.
    pub fn is_empty(&self) -> bool {
        self.table.cases.is_empty()
    }

    fn write_case(&self, writer: &mut Writer<'_>, value: &B) -> Result<()> {
        for case in &self.table.cases {
            if (case.write)(writer, value)? {
                return Ok(());
            }
        }
        Err(WireError::schema::<B>("value matches no union case"))
    }

    fn read_case(&self, reader: &mut Reader<'_>, tag: u16) -> Result<B> {
        let Some(&idx) = self.table.by_tag.get(&tag) else {
            return Err(WireError::schema::<B>(format!("unknown union tag {tag}")));
        };
        (self.table.cases[idx].read)(reader)
    }
}

impl<B> Clone for UnionFormatter<B> {
    fn clone(&self) -> Self {
        Self {
            table: Arc::clone(&self.table),
        }
    }
}

impl<B: 'static> Formatter<B> for UnionFormatter<B> {
    fn serialize(&self, writer: &mut Writer<'_>, value: &B) -> Result<()> {
        self.write_case(writer, value)
    }

    fn deserialize(&self, reader: &mut Reader<'_>, value: &mut B) -> Result<()> {
        let Some(tag) = reader.try_read_union_header()? else {
            return Err(WireError::Malformed {
                message: "null where a union is required",
            });
        };
        *value = self.read_case(reader, tag)?;
        Ok(())
    }

    fn writes_header(&self) -> bool {
        true
    }
}

impl<B: 'static> Formatter<Option<B>> for UnionFormatter<B> {
    fn serialize(&self, writer: &mut Writer<'_>, value: &Option<B>) -> Result<()> {
        match value {
            Some(value) => self.write_case(writer, value),
            None => writer.write_null(),
        }
    }

    fn deserialize(&self, reader: &mut Reader<'_>, value: &mut Option<B>) -> Result<()> {
        *value = match reader.try_read_union_header()? {
            Some(tag) => Some(self.read_case(reader, tag)?),
            None => None,
        };
        Ok(())
    }
}

impl<B> core::fmt::Debug for UnionFormatter<B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut cases: Vec<(u16, &str)> = self
            .table
            .cases
            .iter()
            .map(|case| (case.tag, case.type_name))
            .collect();
        cases.sort_unstable();
        f.debug_struct("UnionFormatter")
            .field("cases", &cases)
            .finish()
    }
}
