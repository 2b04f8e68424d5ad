use gitmc_nbt::{NbtCompound, NbtList, NbtTag};

use crate::{parse, to_string, Mode, NewlineHandling, QuotingPolicy, SnbtWriteOptions};

fn round_trip(tag: &NbtTag, opts: &SnbtWriteOptions) -> NbtTag {
    let text = to_string(tag, opts);
    parse(&text).unwrap_or_else(|e| panic!("reparse of {text:?} failed: {e}"))
}

fn all_option_sets() -> Vec<SnbtWriteOptions> {
    let mut sets = Vec::new();
    for &mode in &[Mode::Minified, Mode::Expanded] {
        for &number_suffixes in &[true, false] {
            for &key_quoting in &[QuotingPolicy::Auto, QuotingPolicy::AlwaysDouble, QuotingPolicy::AlwaysSingle] {
                for &string_quoting in &[QuotingPolicy::Auto, QuotingPolicy::AlwaysDouble, QuotingPolicy::AlwaysSingle] {
                    sets.push(SnbtWriteOptions {
                        mode,
                        number_suffixes,
                        array_prefixes: true,
                        key_quoting,
                        string_quoting,
                        newline_handling: NewlineHandling::Escape,
                    });
                }
            }
        }
    }
    sets
}

fn sample_tree() -> NbtTag {
    let mut level = NbtCompound::new();
    level.insert("xPos", NbtTag::Int(4));
    level.insert("zPos", NbtTag::Int(-4));
    level.insert("InhabitedTime", NbtTag::Long(1024));
    level.insert("biome", NbtTag::String("minecraft:plains".into()));
    level.insert("needsQuoting", NbtTag::String("has space".into()));
    level.insert("heights", NbtTag::List(NbtList::new(vec![
        NbtTag::Double(63.0),
        NbtTag::Double(64.5),
        NbtTag::Double(-1.25),
    ]).unwrap()));
    level.insert("palette", NbtTag::IntArray(vec![0, 1, 2, -1]));
    level.insert("empty", NbtTag::List(NbtList::empty()));

    let mut root = NbtCompound::new();
    root.insert("Level", NbtTag::Compound(level));
    NbtTag::Compound(root)
}

#[test]
fn round_trips_under_every_option_set() {
    let tree = sample_tree();
    for opts in all_option_sets() {
        let decoded = round_trip(&tree, &opts);
        assert_eq!(decoded, tree, "mismatch under {opts:?}");
    }
}

#[test]
fn serialization_is_idempotent() {
    let tree = sample_tree();
    for opts in all_option_sets() {
        let first = to_string(&tree, &opts);
        let reparsed = parse(&first).unwrap();
        let second = to_string(&reparsed, &opts);
        assert_eq!(first, second, "not idempotent under {opts:?}");
    }
}

#[test]
fn spec_literal_fixture_parses_and_round_trips() {
    let text = "{a: NaN, b: Infinity, c: -Infinity, d: [B;1b,-1b,0b], e: [], f: [1L,2L,3L]}";
    let tag = parse(text).expect("valid snbt");

    let NbtTag::Compound(root) = &tag else { panic!("expected compound") };
    match root.get("a") {
        Some(NbtTag::Double(v)) => assert!(v.is_nan()),
        other => panic!("unexpected a: {other:?}"),
    }
    match root.get("b") {
        Some(NbtTag::Double(v)) => assert_eq!(*v, f64::INFINITY),
        other => panic!("unexpected b: {other:?}"),
    }
    match root.get("c") {
        Some(NbtTag::Double(v)) => assert_eq!(*v, f64::NEG_INFINITY),
        other => panic!("unexpected c: {other:?}"),
    }
    assert_eq!(root.get("d"), Some(&NbtTag::ByteArray(vec![1, -1, 0])));
    match root.get("e") {
        Some(NbtTag::List(list)) => assert!(list.is_empty()),
        other => panic!("unexpected e: {other:?}"),
    }
    assert_eq!(
        root.get("f"),
        Some(&NbtTag::List(NbtList::new(vec![NbtTag::Long(1), NbtTag::Long(2), NbtTag::Long(3)]).unwrap()))
    );

    let reparsed = round_trip(&tag, &SnbtWriteOptions::default());
    assert_eq!(reparsed, tag);
}

#[test]
fn bare_keys_are_not_quoted_under_auto() {
    let mut root = NbtCompound::new();
    root.insert("simple_key.1", NbtTag::Byte(1));
    let tag = NbtTag::Compound(root);

    let text = to_string(&tag, &SnbtWriteOptions {
        mode: Mode::Minified,
        ..SnbtWriteOptions::default()
    });
    assert!(text.contains("simple_key.1:"));
    assert!(!text.contains('"'));
}

#[test]
fn keys_needing_quotes_are_quoted_under_auto() {
    let mut root = NbtCompound::new();
    root.insert("has space", NbtTag::Byte(1));
    let tag = NbtTag::Compound(root);

    let text = to_string(&tag, &SnbtWriteOptions {
        mode: Mode::Minified,
        ..SnbtWriteOptions::default()
    });
    assert!(text.contains("\"has space\":"));
}

#[test]
fn ambiguous_numeric_forms_degrade_to_string() {
    let parsed = parse("007").unwrap();
    assert_eq!(parsed, NbtTag::String("007".into()));
}

#[test]
fn heterogeneous_list_is_rejected() {
    assert!(parse("[1b, 2]").is_err());
}

#[test]
fn empty_document_is_an_empty_compound() {
    assert_eq!(parse("").unwrap(), NbtTag::Compound(NbtCompound::new()));
    assert_eq!(parse("   ").unwrap(), NbtTag::Compound(NbtCompound::new()));
}

#[test]
fn trailing_input_is_rejected() {
    assert!(parse("{a: 1} garbage").is_err());
}

#[test]
fn numeric_lists_stay_on_one_line_in_expanded_mode() {
    let list = NbtTag::List(NbtList::new(vec![NbtTag::Int(1), NbtTag::Int(2), NbtTag::Int(3)]).unwrap());
    let text = to_string(&list, &SnbtWriteOptions::default());
    assert!(!text.contains('\n'));
}

#[test]
fn quoted_string_escapes_round_trip() {
    let tag = NbtTag::String("line one\nline \"two\" with \\backslash".into());
    let decoded = round_trip(&tag, &SnbtWriteOptions::default());
    assert_eq!(decoded, tag);
}

#[test]
fn numeric_looking_strings_stay_strings_under_auto_quoting() {
    for s in ["123", "1b", "2.5", "true", "false", "-4L", "1e10", "Infinity", "NaN"] {
        let tag = NbtTag::String(s.into());
        let text = to_string(&tag, &SnbtWriteOptions::default());
        assert!(text.starts_with('"') || text.starts_with('\''), "{s:?} serialized unquoted as {text:?}");
        let decoded = parse(&text).unwrap();
        assert_eq!(decoded, tag, "{s:?} did not round-trip as a String");
    }
}
