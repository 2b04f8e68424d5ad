use std::io::Cursor;

use crate::io::{read_named_compound, write_named_compound};
use crate::{NbtCompound, NbtList, NbtTag, TagId};

fn round_trip(name: &str, compound: &NbtCompound) -> (String, NbtCompound) {
    let mut buf = Vec::new();
    write_named_compound(&mut buf, name, compound).expect("write");
    let mut cursor = Cursor::new(buf);
    read_named_compound(&mut cursor).expect("read")
}

#[test]
fn tag_id_exhaustive() {
    for byte in 0u8..=12 {
        assert_eq!(TagId::from_byte(byte).unwrap().to_byte(), byte);
    }
    for byte in 13u8..=255 {
        assert!(TagId::from_byte(byte).is_err());
    }
}

#[test]
fn scalar_round_trip() {
    let mut root = NbtCompound::new();
    root.insert("b", NbtTag::Byte(-12));
    root.insert("s", NbtTag::Short(1234));
    root.insert("i", NbtTag::Int(-99999));
    root.insert("l", NbtTag::Long(i64::MIN));
    root.insert("f", NbtTag::Float(1.5));
    root.insert("d", NbtTag::Double(-2.25));
    root.insert("str", NbtTag::String("hello \u{1F600}".into()));

    let (name, decoded) = round_trip("root", &root);
    assert_eq!(name, "root");
    assert_eq!(decoded, root);
}

#[test]
fn arrays_round_trip() {
    let mut root = NbtCompound::new();
    root.insert("ba", NbtTag::ByteArray(vec![1, -1, 0, 127, -128]));
    root.insert("ia", NbtTag::IntArray(vec![1, 2, -3]));
    root.insert("la", NbtTag::LongArray(vec![1, -2, 3]));

    let (_, decoded) = round_trip("", &root);
    assert_eq!(decoded, root);
}

#[test]
fn nested_compound_round_trip() {
    let mut inner = NbtCompound::new();
    inner.insert("xPos", NbtTag::Int(1));
    inner.insert("zPos", NbtTag::Int(-1));

    let mut root = NbtCompound::new();
    root.insert("Level", NbtTag::Compound(inner));

    let (_, decoded) = round_trip("", &root);
    assert_eq!(decoded, root);
}

#[test]
fn empty_list_type_round_trips() {
    let mut root = NbtCompound::new();
    root.insert("e", NbtTag::List(NbtList::empty()));

    let (_, decoded) = round_trip("", &root);
    match decoded.get("e") {
        Some(NbtTag::List(list)) => {
            assert!(list.is_empty());
            assert_eq!(list.element_type(), TagId::Compound);
        }
        other => panic!("expected empty list, got {other:?}"),
    }
}

#[test]
fn list_of_longs_round_trips() {
    let list = NbtList::new(vec![NbtTag::Long(1), NbtTag::Long(2), NbtTag::Long(3)]).unwrap();
    let mut root = NbtCompound::new();
    root.insert("f", NbtTag::List(list));

    let (_, decoded) = round_trip("", &root);
    assert_eq!(decoded, root);
}

#[test]
fn heterogeneous_list_rejected() {
    let err = NbtList::new(vec![NbtTag::Byte(1), NbtTag::Int(2)]).unwrap_err();
    assert!(matches!(err, crate::NbtError::ListTypeMismatch { .. }));
}

#[test]
fn nan_and_signed_zero_round_trip_bitwise() {
    let mut root = NbtCompound::new();
    root.insert("nan", NbtTag::Double(f64::NAN));
    root.insert("neg_zero", NbtTag::Float(-0.0));
    root.insert("inf", NbtTag::Double(f64::INFINITY));
    root.insert("neg_inf", NbtTag::Double(f64::NEG_INFINITY));

    let (_, decoded) = round_trip("", &root);
    // structural equality here is bitwise for float/double (see NbtTag::eq)
    assert_eq!(decoded, root);
    match decoded.get("neg_zero") {
        Some(NbtTag::Float(v)) => assert!(v.is_sign_negative()),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn named_children_preserve_insertion_order() {
    let mut root = NbtCompound::new();
    root.insert("z", NbtTag::Byte(1));
    root.insert("a", NbtTag::Byte(2));
    root.insert("m", NbtTag::Byte(3));

    let (_, decoded) = round_trip("", &root);
    let keys: Vec<_> = decoded.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["z", "a", "m"]);
}

#[test]
fn truncated_input_errors_not_panics() {
    let mut root = NbtCompound::new();
    root.insert("a", NbtTag::Int(1));
    let mut buf = Vec::new();
    write_named_compound(&mut buf, "", &root).unwrap();
    buf.truncate(buf.len() - 2);

    let mut cursor = Cursor::new(buf);
    assert!(read_named_compound(&mut cursor).is_err());
}
