mod formatters;
mod reader;
mod references;

use core::fmt::Debug;

use crate::{
    ErrorKind, FormatterRegistry, Reader, ReferenceWriter, Result, SegmentedBuffer,
    SerializerOptions, Writer,
};

fn encode_with<T: 'static>(
    registry: &FormatterRegistry,
    options: SerializerOptions,
    value: &T,
) -> Result<Vec<u8>> {
    let mut buffer = SegmentedBuffer::new();
    let mut refs = ReferenceWriter::new();
    let mut writer = Writer::new(&mut buffer, registry, options, &mut refs);
    writer.write_value(value)?;
    Ok(buffer.to_vec())
}

fn decode_with<T: Default + 'static>(
    registry: &FormatterRegistry,
    options: SerializerOptions,
    bytes: &[u8],
) -> Result<T> {
    Reader::new(bytes, registry, options).read_new()
}

/// Round-trips `value` through the built-ins and returns its encoding.
fn roundtrip<T: Default + PartialEq + Debug + 'static>(value: &T) -> Vec<u8> {
    let registry = FormatterRegistry::with_builtins();
    let options = SerializerOptions::default();
    let bytes = encode_with(&registry, options, value).unwrap();
    let back: T = decode_with(&registry, options, &bytes).unwrap();
    assert_eq!(&back, value);
    bytes
}

fn error_kind<T>(result: Result<T>) -> ErrorKind {
    match result {
        Ok(_) => panic!("expected an error"),
        Err(err) => err.kind(),
    }
}

#[test]
fn primitives_are_fixed_width_little_endian() {
    assert_eq!(roundtrip(&0x1234_5678u32), [0x78, 0x56, 0x34, 0x12]);
    assert_eq!(roundtrip(&-2i16), [0xFE, 0xFF]);
    assert_eq!(roundtrip(&1.5f64), 1.5f64.to_le_bytes());
    assert_eq!(roundtrip(&true), [1]);
    assert_eq!(roundtrip(&'é'), 0xE9u32.to_le_bytes());
    assert_eq!(roundtrip(&u128::MAX).len(), 16);
    assert_eq!(roundtrip(&usize::MAX).len(), 8);
}

#[test]
fn unit_writes_nothing() {
    assert!(roundtrip(&()).is_empty());
}

#[test]
fn writer_counts_written_bytes() {
    let registry = FormatterRegistry::with_builtins();
    let mut buffer = SegmentedBuffer::new();
    let mut refs = ReferenceWriter::new();
    let mut writer = Writer::new(&mut buffer, &registry, SerializerOptions::default(), &mut refs);
    writer.write_value(&7u64).unwrap();
    writer.write_varint(300u32).unwrap();
    assert_eq!(writer.written(), 8 + 3);
    assert_eq!(writer.depth(), 0);
    assert_eq!(buffer.len(), 11);
}

#[test]
fn depth_is_restored_after_an_error() {
    let registry = FormatterRegistry::with_builtins();
    let mut buffer = SegmentedBuffer::new();
    let mut refs = ReferenceWriter::new();
    let mut writer = Writer::new(&mut buffer, &registry, SerializerOptions::default(), &mut refs);

    struct Unregistered;
    assert_eq!(error_kind(writer.write_value(&Unregistered)), ErrorKind::NotRegistered);
    assert_eq!(writer.depth(), 0);
    writer.write_value(&1u8).unwrap();
}

#[cfg(feature = "serde")]
#[test]
fn options_deserialize_with_defaults() {
    let options: SerializerOptions =
        serde_json::from_str(r#"{"max_depth": 8, "string_encoding": "utf16"}"#).unwrap();
    assert_eq!(options.max_depth, 8);
    assert_eq!(options.string_encoding, crate::StringEncoding::Utf16);
    assert!(options.track_references);
    assert_eq!(options.max_buffer_size, SerializerOptions::DEFAULT_MAX_BUFFER_SIZE);
}
