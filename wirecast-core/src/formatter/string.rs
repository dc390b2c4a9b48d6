use super::Formatter;
use crate::{Reader, Result, Writer};

/// Formatter for `String` and `Option<String>`.
///
/// The write side follows [`SerializerOptions::string_encoding`]; the read
/// side accepts both encodings. `None` is the null collection header, and a
/// null read into a plain `String` leaves it empty.
///
/// [`SerializerOptions::string_encoding`]: crate::SerializerOptions::string_encoding
#[derive(Debug, Default, Clone, Copy)]
pub struct StringFormatter;

impl Formatter<String> for StringFormatter {
    fn serialize(&self, writer: &mut Writer<'_>, value: &String) -> Result<()> {
        writer.write_str(value)
    }

    fn deserialize(&self, reader: &mut Reader<'_>, value: &mut String) -> Result<()> {
        reader.read_str_into(value)?;
        Ok(())
    }
}

impl Formatter<Option<String>> for StringFormatter {
    fn serialize(&self, writer: &mut Writer<'_>, value: &Option<String>) -> Result<()> {
        writer.write_nullable_str(value.as_deref())
    }

    fn deserialize(&self, reader: &mut Reader<'_>, value: &mut Option<String>) -> Result<()> {
        let mut text = value.take().unwrap_or_default();
        if reader.read_str_into(&mut text)? {
            *value = Some(text);
        }
        Ok(())
    }
}
