use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::{decode_with, encode_with, error_kind, roundtrip};
use crate::formatter::{Members, WireObject};
use crate::{
    Blittable, ErrorKind, FormatterRegistry, FromBytes, Immutable, IntoBytes, KnownLayout,
    PooledBuffer, Reader, Result, SerializerOptions, Writer,
};

// --- nullable ---

#[test]
fn nullable_primitive_layout() {
    assert_eq!(roundtrip(&None::<u32>), [0xFF]);
    assert_eq!(roundtrip(&Some(5u32)), [1, 5, 0, 0, 0]);
    assert_eq!(roundtrip(&Some(false)), [1, 0]);
}

#[test]
fn nullable_with_wrong_count_is_rejected() {
    let registry = FormatterRegistry::with_builtins();
    let err = decode_with::<Option<u8>>(&registry, SerializerOptions::default(), &[2, 0, 0])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SchemaMismatch);
}

// --- collections ---

#[test]
fn numeric_vec_is_a_raw_block() {
    assert_eq!(
        roundtrip(&vec![1u32, 0x0102_0304]),
        [2, 0, 0, 0, 1, 0, 0, 0, 4, 3, 2, 1]
    );
    assert_eq!(roundtrip(&Vec::<u64>::new()), [0, 0, 0, 0]);
}

#[test]
fn optional_vec_null_and_empty_differ() {
    assert_eq!(roundtrip(&None::<Vec<u16>>), [0xFF; 4]);
    assert_eq!(roundtrip(&Some(Vec::<u16>::new())), [0; 4]);
    assert_eq!(roundtrip(&None::<Vec<String>>), [0xFF; 4]);
}

#[test]
fn null_into_required_vec_reads_empty() {
    let registry = FormatterRegistry::with_builtins();
    let options = SerializerOptions::default();
    let back: Vec<u32> = decode_with(&registry, options, &[0xFF; 4]).unwrap();
    assert!(back.is_empty());
    let back: Vec<String> = decode_with(&registry, options, &[0xFF; 4]).unwrap();
    assert!(back.is_empty());
}

#[test]
fn per_element_collections() {
    assert_eq!(roundtrip(&vec![true, false, true]), [3, 0, 0, 0, 1, 0, 1]);
    roundtrip(&vec!['a', 'ß', '🦀']);
    roundtrip(&vec!["one".to_string(), String::new(), "three".to_string()]);
    roundtrip(&vec![1i16, -1, i16::MIN].into_boxed_slice());
}

#[test]
fn deserialize_overwrites_previous_contents() {
    let registry = FormatterRegistry::with_builtins();
    let options = SerializerOptions::default();
    let bytes = encode_with(&registry, options, &vec![9u8]).unwrap();

    let mut target = vec![1u8, 2, 3];
    Reader::new(&bytes, &registry, options)
        .read_value(&mut target)
        .unwrap();
    assert_eq!(target, [9]);
}

#[test]
fn maps_roundtrip() {
    let registry = FormatterRegistry::with_builtins();
    registry.register_map::<String, u32>();
    let options = SerializerOptions::default();

    let map: HashMap<String, u32> = [("a".to_string(), 1), ("bb".to_string(), 2)].into();
    let bytes = encode_with(&registry, options, &map).unwrap();
    assert_eq!(&bytes[..4], &[2, 0, 0, 0]);
    let back: HashMap<String, u32> = decode_with(&registry, options, &bytes).unwrap();
    assert_eq!(back, map);

    // A null map reads as empty.
    let back: HashMap<String, u32> = decode_with(&registry, options, &[0xFF; 4]).unwrap();
    assert!(back.is_empty());
}

#[test]
fn map_length_is_validated() {
    let registry = FormatterRegistry::with_builtins();
    registry.register_map::<u8, u8>();
    let err = decode_with::<HashMap<u8, u8>>(
        &registry,
        SerializerOptions::default(),
        &[3, 0, 0, 0, 1, 1],
    )
    .unwrap_err();
    assert!(matches!(
        err,
        crate::WireError::LengthExceedsRemaining { declared: 6, remaining: 2 }
    ));
}

// --- objects ---

#[derive(Default, Debug, PartialEq)]
struct ProfileV1 {
    id: u32,
    name: String,
}

#[derive(Default, Debug, PartialEq)]
struct ProfileV2 {
    id: u32,
    name: String,
    score: Option<u16>,
}

impl WireObject for ProfileV1 {
    const MEMBER_COUNT: usize = 2;

    fn write_members(&self, writer: &mut Writer<'_>) -> Result<()> {
        writer.write_value(&self.id)?;
        writer.write_value(&self.name)
    }

    fn read_members(&mut self, members: &mut Members<'_, '_>) -> Result<()> {
        members.read(&mut self.id)?;
        members.read(&mut self.name)
    }
}

impl WireObject for ProfileV2 {
    const MEMBER_COUNT: usize = 3;

    fn write_members(&self, writer: &mut Writer<'_>) -> Result<()> {
        writer.write_value(&self.id)?;
        writer.write_value(&self.name)?;
        writer.write_value(&self.score)
    }

    fn read_members(&mut self, members: &mut Members<'_, '_>) -> Result<()> {
        members.read(&mut self.id)?;
        members.read(&mut self.name)?;
        members.read(&mut self.score)
    }
}

fn profile_registry() -> FormatterRegistry {
    let registry = FormatterRegistry::with_builtins();
    registry.register_object::<ProfileV1>();
    registry.register_object::<ProfileV2>();
    registry
}

#[test]
fn object_starts_with_member_count() {
    let registry = profile_registry();
    let value = ProfileV1 {
        id: 1,
        name: String::new(),
    };
    let bytes = encode_with(&registry, SerializerOptions::default(), &value).unwrap();
    assert_eq!(bytes, [2, 1, 0, 0, 0, 0, 0, 0, 0]);
}

#[test]
fn newer_reader_defaults_missing_members() {
    let registry = profile_registry();
    let options = SerializerOptions::default();
    let old = ProfileV1 {
        id: 7,
        name: "ada".into(),
    };
    let bytes = encode_with(&registry, options, &old).unwrap();

    let mut target = ProfileV2 {
        id: 0,
        name: "stale".into(),
        score: Some(99),
    };
    Reader::new(&bytes, &registry, options)
        .read_value(&mut target)
        .unwrap();
    assert_eq!(
        target,
        ProfileV2 {
            id: 7,
            name: "ada".into(),
            score: None,
        }
    );
}

#[test]
fn older_reader_rejects_extra_members() {
    let registry = profile_registry();
    let options = SerializerOptions::default();
    let new = ProfileV2 {
        id: 1,
        name: "x".into(),
        score: Some(3),
    };
    let bytes = encode_with(&registry, options, &new).unwrap();
    let err = decode_with::<ProfileV1>(&registry, options, &bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SchemaMismatch);
}

#[test]
fn nullable_object_has_no_extra_header() {
    let registry = profile_registry();
    let options = SerializerOptions::default();
    assert_eq!(encode_with(&registry, options, &None::<ProfileV1>).unwrap(), [0xFF]);

    let some = Some(ProfileV1::default());
    let bytes = encode_with(&registry, options, &some).unwrap();
    assert_eq!(bytes[0], 2);
    let back: Option<ProfileV1> = decode_with(&registry, options, &bytes).unwrap();
    assert_eq!(back, some);
}

#[test]
fn null_into_required_object_is_malformed() {
    let registry = profile_registry();
    let err =
        decode_with::<ProfileV1>(&registry, SerializerOptions::default(), &[0xFF]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedInput);
}

#[test]
fn pairs_are_two_member_objects() {
    let registry = FormatterRegistry::with_builtins();
    registry.register_pair::<u8, String>();
    let options = SerializerOptions::default();
    let pair = (3u8, "p".to_string());
    let bytes = encode_with(&registry, options, &pair).unwrap();
    assert_eq!(&bytes[..2], &[2, 3]);
    let back: (u8, String) = decode_with(&registry, options, &bytes).unwrap();
    assert_eq!(back, pair);
}

// --- time and bytes ---

#[test]
fn duration_layout() {
    let value = Duration::new(2, 500);
    assert_eq!(roundtrip(&value), [2, 0, 0, 0, 0, 0, 0, 0, 0xF4, 1, 0, 0]);
    roundtrip(&Some(Duration::from_millis(1500)));
}

#[test]
fn duration_with_bad_nanos_is_malformed() {
    let registry = FormatterRegistry::with_builtins();
    let mut bytes = vec![0u8; 8];
    bytes.extend_from_slice(&1_000_000_000u32.to_le_bytes());
    let err = decode_with::<Duration>(&registry, SerializerOptions::default(), &bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedInput);
}

#[test]
fn byte_views_roundtrip() {
    let bytes: Arc<[u8]> = Arc::from(&[1u8, 2, 3][..]);
    assert_eq!(roundtrip(&bytes), [3, 0, 0, 0, 1, 2, 3]);

    let mut pooled = crate::BufferPool::new().rent(2);
    pooled.copy_from_slice(&[7, 8]);
    let registry = FormatterRegistry::with_builtins();
    let options = SerializerOptions::default();
    let encoded = encode_with(&registry, options, &pooled).unwrap();
    let back: PooledBuffer = decode_with(&registry, options, &encoded).unwrap();
    assert_eq!(&back[..], &[7, 8]);
}

#[test]
fn usize_narrowing_overflow() {
    let registry = FormatterRegistry::with_builtins();
    let big = u64::MAX.to_le_bytes();
    let result = decode_with::<usize>(&registry, SerializerOptions::default(), &big);
    if usize::BITS < 64 {
        assert_eq!(error_kind(result), ErrorKind::MalformedInput);
    } else {
        assert_eq!(result.unwrap(), usize::MAX);
    }
}

// --- blittable ---

#[derive(FromBytes, IntoBytes, Immutable, KnownLayout, Clone, Copy, Default, Debug, PartialEq)]
#[repr(C)]
struct Point {
    x: i32,
    y: i32,
}

impl Blittable for Point {}

#[test]
fn blittable_struct_is_its_memory_image() {
    let registry = FormatterRegistry::with_builtins();
    registry.register_blittable::<Point>();
    let options = SerializerOptions::default();

    let point = Point { x: 1, y: -1 };
    let bytes = encode_with(&registry, options, &point).unwrap();
    if cfg!(target_endian = "little") {
        assert_eq!(bytes, [1, 0, 0, 0, 0xFF, 0xFF, 0xFF, 0xFF]);
    }
    let back: Point = decode_with(&registry, options, &bytes).unwrap();
    assert_eq!(back, point);

    let points = vec![point, Point { x: 5, y: 6 }];
    let bytes = encode_with(&registry, options, &points).unwrap();
    assert_eq!(bytes.len(), 4 + 16);
    let back: Vec<Point> = decode_with(&registry, options, &bytes).unwrap();
    assert_eq!(back, points);
}

// --- nested nullable ---

#[test]
fn nested_option_keeps_inner_null() {
    let registry = FormatterRegistry::with_builtins();
    registry.register_nullable::<Option<u32>>();
    let options = SerializerOptions::default();

    let cases: [(Option<Option<u32>>, &[u8]); 3] = [
        (None, &[0xFF]),
        (Some(None), &[1, 0xFF]),
        (Some(Some(5)), &[1, 1, 5, 0, 0, 0]),
    ];
    for (value, expected) in cases {
        let bytes = encode_with(&registry, options, &value).unwrap();
        assert_eq!(bytes, expected);
        let back: Option<Option<u32>> = decode_with(&registry, options, &bytes).unwrap();
        assert_eq!(back, value);
    }
}

#[test]
fn nested_option_of_object_uses_one_envelope() {
    let registry = profile_registry();
    registry.register_nullable::<Option<ProfileV1>>();
    let options = SerializerOptions::default();

    let value = Some(Some(ProfileV1::default()));
    let bytes = encode_with(&registry, options, &value).unwrap();
    assert_eq!(&bytes[..2], &[1, 2]);
    let back: Option<Option<ProfileV1>> = decode_with(&registry, options, &bytes).unwrap();
    assert_eq!(back, value);

    let bytes = encode_with(&registry, options, &Some(None::<ProfileV1>)).unwrap();
    assert_eq!(bytes, [1, 0xFF]);
    let back: Option<Option<ProfileV1>> = decode_with(&registry, options, &bytes).unwrap();
    assert_eq!(back, Some(None));
}
