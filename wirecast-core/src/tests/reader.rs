use super::{decode_with, error_kind};
use crate::{
    BufferPool, ErrorKind, FormatterRegistry, Reader, ReferenceWriter, SegmentedBuffer,
    SerializerOptions, Writer,
};

fn sample(registry: &FormatterRegistry) -> Vec<u8> {
    let mut buffer = SegmentedBuffer::new();
    let mut refs = ReferenceWriter::new();
    let mut writer = Writer::new(&mut buffer, registry, SerializerOptions::default(), &mut refs);
    writer
        .write_value(&vec!["alpha".to_string(), String::new(), "ωmega".to_string()])
        .unwrap();
    writer.write_value(&0x0102_0304_0506_0708u64).unwrap();
    writer.write_value(&vec![1u32, 2, 3, 0xFFFF_FFFF]).unwrap();
    writer.write_varint(-3000i32).unwrap();
    writer.write_value(&Some(9u16)).unwrap();
    buffer.to_vec()
}

type Sample = (Vec<String>, u64, Vec<u32>, i32, Option<u16>);

fn read_sample(reader: &mut Reader<'_>) -> Sample {
    let strings = reader.read_new().unwrap();
    let number = reader.read_new().unwrap();
    let block = reader.read_new().unwrap();
    let varint = reader.read_varint().unwrap();
    let nullable = reader.read_new().unwrap();
    (strings, number, block, varint, nullable)
}

#[test]
fn segment_crossing_reads_equal_contiguous_reads() {
    let registry = FormatterRegistry::with_builtins();
    let options = SerializerOptions::default();
    let bytes = sample(&registry);

    let expected = read_sample(&mut Reader::new(&bytes, &registry, options));
    assert_eq!(expected.0[2], "ωmega");
    assert_eq!(expected.3, -3000);

    for size in 1..=9 {
        let segments: Vec<&[u8]> = bytes.chunks(size).collect();
        let mut reader = Reader::from_segments(&segments, &registry, options);
        assert_eq!(read_sample(&mut reader), expected, "segment size {size}");
        assert_eq!(reader.remaining(), 0);
        assert_eq!(reader.consumed(), bytes.len());
    }
}

#[test]
fn empty_segments_are_skipped() {
    let registry = FormatterRegistry::with_builtins();
    let options = SerializerOptions::default();
    let segments: [&[u8]; 5] = [&[], &[0x78, 0x56], &[], &[0x34, 0x12], &[]];
    let mut reader = Reader::from_segments(&segments, &registry, options);
    assert_eq!(reader.peek_byte().unwrap(), 0x78);
    assert_eq!(reader.read_u32().unwrap(), 0x1234_5678);
    assert_eq!(error_kind(reader.peek_byte()), ErrorKind::SequenceExhausted);
}

#[test]
fn exhausted_segment_switches_to_the_next_one() {
    let registry = FormatterRegistry::with_builtins();
    let options = SerializerOptions::default();
    let segments: [&[u8]; 2] = [&[1, 2], &[3, 4, 5, 6]];
    let mut reader = Reader::from_segments(&segments, &registry, options);
    assert_eq!(reader.read_raw(2).unwrap(), [1, 2]);
    let next = reader.read_raw(4).unwrap();
    // Borrowed straight from the second segment.
    assert_eq!(next.as_ptr(), segments[1].as_ptr());
    assert_eq!(reader.remaining(), 0);
}

#[test]
fn straddling_read_uses_scratch() {
    let registry = FormatterRegistry::with_builtins();
    let options = SerializerOptions::default();
    let pool = BufferPool::new();
    let segments: [&[u8]; 3] = [&[1, 2, 3], &[4], &[5, 6, 7, 8]];
    let mut reader = Reader::from_segments(&segments, &registry, options).with_pool(pool.clone());
    assert_eq!(reader.read_raw(1).unwrap(), [1]);
    assert_eq!(reader.read_raw(5).unwrap(), [2, 3, 4, 5, 6]);
    assert_eq!(reader.read_raw(2).unwrap(), [7, 8]);
    drop(reader);
    assert_eq!(pool.retained(), 1);
}

#[test]
fn read_past_end_is_exhausted() {
    let registry = FormatterRegistry::with_builtins();
    let options = SerializerOptions::default();
    let err = decode_with::<u64>(&registry, options, &[1, 2, 3]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SequenceExhausted);

    let mut reader = Reader::new(&[1, 2], &registry, options);
    assert_eq!(error_kind(reader.read_raw(3)), ErrorKind::SequenceExhausted);
    // A failed read consumes nothing.
    assert_eq!(reader.read_u16().unwrap(), 0x0201);
}

#[test]
fn collection_length_is_validated_against_remaining() {
    let registry = FormatterRegistry::with_builtins();
    let options = SerializerOptions::default();

    // 10 elements declared, 2 bytes present.
    let bytes = [10, 0, 0, 0, 1, 2];
    let err = decode_with::<Vec<u8>>(&registry, options, &bytes).unwrap_err();
    assert!(matches!(err, crate::WireError::LengthExceedsRemaining { declared: 10, remaining: 2 }));

    // Per-element collections use one byte per element as the floor.
    let err = decode_with::<Vec<String>>(&registry, options, &[0, 0, 0, 0x40]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedInput);

    // Raw blocks scale by the element size.
    let bytes = [2, 0, 0, 0, 1, 0, 0, 0];
    let err = decode_with::<Vec<u32>>(&registry, options, &bytes).unwrap_err();
    assert!(matches!(err, crate::WireError::LengthExceedsRemaining { declared: 8, remaining: 4 }));
}

#[test]
fn negative_collection_length_is_malformed() {
    let registry = FormatterRegistry::with_builtins();
    let bytes = (-5i32).to_le_bytes();
    let err = decode_with::<Vec<u8>>(&registry, SerializerOptions::default(), &bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedInput);
}

#[test]
fn invalid_bool_and_char_are_malformed() {
    let registry = FormatterRegistry::with_builtins();
    let options = SerializerOptions::default();
    let err = decode_with::<bool>(&registry, options, &[2]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedInput);
    let surrogate = 0xD800u32.to_le_bytes();
    let err = decode_with::<char>(&registry, options, &surrogate).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedInput);
}

#[test]
fn headers_read_back() {
    let registry = FormatterRegistry::with_builtins();
    let options = SerializerOptions::default();
    let bytes = [0xFF, 3, 0xFA, 0x2C, 0x01, 7, 0xFF, 0xFF, 0xFF, 0xFF];
    let mut reader = Reader::new(&bytes, &registry, options);
    assert!(reader.peek_is_null().unwrap());
    assert_eq!(reader.try_read_object_header().unwrap(), None);
    assert_eq!(reader.try_read_object_header().unwrap(), Some(3));
    assert_eq!(reader.try_read_union_header().unwrap(), Some(300));
    assert_eq!(reader.try_read_union_header().unwrap(), Some(7));
    assert_eq!(reader.try_read_collection_header().unwrap(), None);
}

#[test]
fn reserved_marker_is_malformed() {
    let registry = FormatterRegistry::with_builtins();
    let mut reader = Reader::new(&[0xFC], &registry, SerializerOptions::default());
    assert_eq!(error_kind(reader.try_read_object_header()), ErrorKind::MalformedInput);
}
