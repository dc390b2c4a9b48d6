use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use super::{decode_with, encode_with};
use crate::formatter::{Members, WireObject};
use crate::{ErrorKind, FormatterRegistry, Result, SerializerOptions, Writer};

#[derive(Default)]
struct Node {
    value: u32,
    next: Option<Rc<RefCell<Node>>>,
}

impl WireObject for Node {
    const MEMBER_COUNT: usize = 2;

    fn write_members(&self, writer: &mut Writer<'_>) -> Result<()> {
        writer.write_value(&self.value)?;
        writer.write_value(&self.next)
    }

    fn read_members(&mut self, members: &mut Members<'_, '_>) -> Result<()> {
        members.read(&mut self.value)?;
        members.read(&mut self.next)
    }
}

fn node_registry() -> FormatterRegistry {
    let registry = FormatterRegistry::with_builtins();
    registry.register_object::<Node>();
    registry.register_cyclic::<Node>();
    registry
}

fn shared_registry() -> FormatterRegistry {
    let registry = FormatterRegistry::with_builtins();
    registry.register_shared::<String>();
    registry.register_collection::<Option<Rc<String>>>();
    registry.register_collection::<Option<Arc<String>>>();
    registry
}

#[test]
fn self_cycle_resolves_to_the_same_object() {
    let registry = node_registry();
    let options = SerializerOptions::default();

    let node = Rc::new(RefCell::new(Node {
        value: 42,
        next: None,
    }));
    node.borrow_mut().next = Some(Rc::clone(&node));

    let bytes = encode_with(&registry, options, &Some(Rc::clone(&node))).unwrap();
    // header, value, back-reference to id 0
    assert_eq!(bytes, [2, 42, 0, 0, 0, 0xFB, 0]);

    let back: Option<Rc<RefCell<Node>>> = decode_with(&registry, options, &bytes).unwrap();
    let back = back.unwrap();
    assert_eq!(back.borrow().value, 42);
    let inner = back.borrow().next.clone().unwrap();
    assert!(Rc::ptr_eq(&inner, &back));

    // Break the cycles so both graphs are freed.
    node.borrow_mut().next = None;
    back.borrow_mut().next = None;
}

#[test]
fn chain_without_cycle_roundtrips() {
    let registry = node_registry();
    let options = SerializerOptions::default();

    let tail = Rc::new(RefCell::new(Node { value: 2, next: None }));
    let head = Some(Rc::new(RefCell::new(Node {
        value: 1,
        next: Some(tail),
    })));

    let bytes = encode_with(&registry, options, &head).unwrap();
    let back: Option<Rc<RefCell<Node>>> = decode_with(&registry, options, &bytes).unwrap();
    let back = back.unwrap();
    let next = back.borrow().next.clone().unwrap();
    assert_eq!(back.borrow().value, 1);
    assert_eq!(next.borrow().value, 2);
    assert!(next.borrow().next.is_none());
}

#[test]
fn shared_diamond_keeps_identity() {
    let registry = shared_registry();
    let options = SerializerOptions::default();

    let a = Rc::new("shared".to_string());
    let b = Rc::new("shared".to_string());
    let list = vec![Some(Rc::clone(&a)), Some(Rc::clone(&a)), None, Some(b)];

    let bytes = encode_with(&registry, options, &list).unwrap();
    let back: Vec<Option<Rc<String>>> = decode_with(&registry, options, &bytes).unwrap();
    assert_eq!(back.len(), 4);

    let first = back[0].as_ref().unwrap();
    let second = back[1].as_ref().unwrap();
    let fourth = back[3].as_ref().unwrap();
    assert!(Rc::ptr_eq(first, second));
    assert!(!Rc::ptr_eq(first, fourth));
    assert!(back[2].is_none());
    assert_eq!(**fourth, "shared");
}

#[test]
fn arc_pointers_are_tracked_too() {
    let registry = shared_registry();
    let options = SerializerOptions::default();

    let a = Arc::new("x".to_string());
    let list = vec![Some(Arc::clone(&a)), Some(a)];
    let bytes = encode_with(&registry, options, &list).unwrap();
    let back: Vec<Option<Arc<String>>> = decode_with(&registry, options, &bytes).unwrap();
    assert!(Arc::ptr_eq(
        back[0].as_ref().unwrap(),
        back[1].as_ref().unwrap()
    ));
}

#[test]
fn tracking_off_duplicates_shared_values() {
    let registry = shared_registry();
    let options = SerializerOptions::default().with_track_references(false);

    let a = Rc::new("dup".to_string());
    let list = vec![Some(Rc::clone(&a)), Some(a)];
    let bytes = encode_with(&registry, options, &list).unwrap();
    assert!(!bytes.contains(&0xFB));

    let back: Vec<Option<Rc<String>>> = decode_with(&registry, options, &bytes).unwrap();
    let (first, second) = (back[0].as_ref().unwrap(), back[1].as_ref().unwrap());
    assert!(!Rc::ptr_eq(first, second));
    assert_eq!(first, second);
}

#[test]
fn depth_guard_stops_cycles_without_tracking() {
    let registry = node_registry();
    let options = SerializerOptions::default().with_track_references(false);

    let node = Rc::new(RefCell::new(Node::default()));
    node.borrow_mut().next = Some(Rc::clone(&node));

    let err = encode_with(&registry, options, &Some(Rc::clone(&node))).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DepthExceeded);

    node.borrow_mut().next = None;
}

#[test]
fn depth_guard_applies_to_plain_nesting() {
    let registry = FormatterRegistry::with_builtins();
    registry.register_collection::<Vec<String>>();
    let nested = vec![vec!["a".to_string()]];

    let shallow = SerializerOptions::default().with_max_depth(2);
    let err = encode_with(&registry, shallow, &nested).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DepthExceeded);

    let bytes = encode_with(&registry, SerializerOptions::default(), &nested).unwrap();
    let err = decode_with::<Vec<Vec<String>>>(&registry, shallow, &bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DepthExceeded);

    let back: Vec<Vec<String>> =
        decode_with(&registry, SerializerOptions::default().with_max_depth(3), &bytes).unwrap();
    assert_eq!(back, nested);
}

#[test]
fn back_reference_without_tracking_is_malformed() {
    let registry = shared_registry();
    let options = SerializerOptions::default().with_track_references(false);
    let err = decode_with::<Option<Rc<String>>>(&registry, options, &[0xFB, 0]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedInput);
}

#[test]
fn back_reference_to_unknown_id_is_malformed() {
    let registry = shared_registry();
    let options = SerializerOptions::default();
    let err = decode_with::<Option<Rc<String>>>(&registry, options, &[0xFB, 5]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedInput);
}

#[test]
fn shared_body_wraps_headerless_values() {
    let registry = shared_registry();
    let options = SerializerOptions::default();
    let bytes = encode_with(&registry, options, &Some(Rc::new(String::new()))).unwrap();
    // Object header of one member, then the empty string.
    assert_eq!(bytes, [1, 0, 0, 0, 0]);
}

// --- pointers nested in pointers ---

type Inner = Option<Rc<u32>>;
type Outer = Option<Rc<Option<Rc<u32>>>>;

#[test]
fn nested_pointer_back_references_an_earlier_sibling() {
    let registry = FormatterRegistry::with_builtins();
    registry.register_shared::<u32>();
    registry.register_shared::<Inner>();
    registry.register_pair::<Inner, Outer>();
    let options = SerializerOptions::default();

    let shared = Rc::new(7u32);
    let value: (Inner, Outer) = (
        Some(Rc::clone(&shared)),
        Some(Rc::new(Some(Rc::clone(&shared)))),
    );
    let bytes = encode_with(&registry, options, &value).unwrap();
    // pair, first pointer body, second pointer envelope, back-reference to 0
    assert_eq!(bytes, [2, 1, 7, 0, 0, 0, 1, 0xFB, 0]);

    let (first, second): (Inner, Outer) = decode_with(&registry, options, &bytes).unwrap();
    let first = first.unwrap();
    let second = second.unwrap();
    let inner = second.as_ref().as_ref().unwrap();
    assert_eq!(*first, 7);
    assert!(Rc::ptr_eq(&first, inner));
}

#[test]
fn nested_pointer_to_null_roundtrips() {
    let registry = FormatterRegistry::with_builtins();
    registry.register_shared::<u32>();
    registry.register_shared::<Inner>();
    let options = SerializerOptions::default();

    let value: Outer = Some(Rc::new(None));
    let bytes = encode_with(&registry, options, &value).unwrap();
    assert_eq!(bytes, [1, 0xFF]);
    let back: Outer = decode_with(&registry, options, &bytes).unwrap();
    assert!(back.unwrap().is_none());
}

#[test]
fn cyclic_pointer_behind_shared_pointer_keeps_identity() {
    let registry = node_registry();
    registry.register_shared::<Option<Rc<RefCell<Node>>>>();
    let options = SerializerOptions::default();

    let node = Rc::new(RefCell::new(Node {
        value: 42,
        next: None,
    }));
    node.borrow_mut().next = Some(Rc::clone(&node));
    let value = Some(Rc::new(Some(Rc::clone(&node))));

    let bytes = encode_with(&registry, options, &value).unwrap();
    // envelope, node object, back-reference to the node's id 1
    assert_eq!(bytes, [1, 2, 42, 0, 0, 0, 0xFB, 1]);

    let back: Option<Rc<Option<Rc<RefCell<Node>>>>> =
        decode_with(&registry, options, &bytes).unwrap();
    let outer = back.unwrap();
    let inner = outer.as_ref().clone().unwrap();
    let next = inner.borrow().next.clone().unwrap();
    assert!(Rc::ptr_eq(&inner, &next));
    assert_eq!(inner.borrow().value, 42);

    node.borrow_mut().next = None;
    inner.borrow_mut().next = None;
}
