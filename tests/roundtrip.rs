//! Codec tests: validation, normalization, packing, and the decode(encode(x))
//! round-trip law across field types and nullability.

use bitschema::{compute_layout, decode, encode, FieldDef, FieldKind, Resolution, Value};
use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use std::collections::HashMap;

fn dt(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .expect("valid date")
        .and_hms_opt(h, mi, s)
        .expect("valid time")
}

fn int(min: i64, max: i64) -> FieldKind {
    FieldKind::Int { min, max }
}

fn enum_of(values: &[&str]) -> FieldKind {
    FieldKind::Enum {
        values: values.iter().map(|s| s.to_string()).collect(),
    }
}

fn fields(defs: Vec<(&str, FieldDef)>) -> IndexMap<String, FieldDef> {
    defs.into_iter().map(|(n, d)| (n.to_string(), d)).collect()
}

fn data(entries: Vec<(&str, Value)>) -> HashMap<String, Value> {
    entries.into_iter().map(|(n, v)| (n.to_string(), v)).collect()
}

#[test]
fn test_bool_and_int_pack_to_85() {
    let defs = fields(vec![
        ("active", FieldDef::new(FieldKind::Bool)),
        ("age", FieldDef::new(int(0, 127))),
    ]);
    let (layouts, total) = compute_layout(&defs).expect("layout");
    assert_eq!(total, 8);

    let input = data(vec![
        ("active", Value::Bool(true)),
        ("age", Value::Int(42)),
    ]);
    // bit 0 = 1, bits 1..=7 = 42 -> 1 | (42 << 1) = 85
    let packed = encode(&input, &layouts).expect("encode");
    assert_eq!(packed, 85);
    assert_eq!(decode(packed, &layouts), input);
}

#[test]
fn test_nullable_int_null_packs_to_zero() {
    let defs = fields(vec![("score", FieldDef::nullable(int(0, 100)))]);
    let (layouts, _) = compute_layout(&defs).expect("layout");

    let input = data(vec![("score", Value::Null)]);
    assert_eq!(encode(&input, &layouts).expect("encode"), 0);
    assert_eq!(decode(0, &layouts), input);

    // Absent nullable field behaves like null.
    let empty = HashMap::new();
    assert_eq!(encode(&empty, &layouts).expect("encode"), 0);
}

#[test]
fn test_nullable_int_present_sets_presence_bit() {
    let defs = fields(vec![("score", FieldDef::nullable(int(0, 100)))]);
    let (layouts, _) = compute_layout(&defs).expect("layout");

    let input = data(vec![("score", Value::Int(42))]);
    // presence bit 0 = 1, value 42 in bits 1..=7 -> 1 | (42 << 1) = 85
    let packed = encode(&input, &layouts).expect("encode");
    assert_eq!(packed, 85);
    assert_eq!(decode(packed, &layouts), input);
}

#[test]
fn test_enum_packs_index() {
    let defs = fields(vec![(
        "status",
        FieldDef::new(enum_of(&["pending", "running", "done"])),
    )]);
    let (layouts, _) = compute_layout(&defs).expect("layout");

    let input = data(vec![("status", Value::from("done"))]);
    let packed = encode(&input, &layouts).expect("encode");
    assert_eq!(packed, 2);
    assert_eq!(decode(packed, &layouts), input);
}

#[test]
fn test_bitmask_packs_flag_positions() {
    let mut flags = IndexMap::new();
    flags.insert("read".to_string(), 0u8);
    flags.insert("write".to_string(), 1u8);
    flags.insert("execute".to_string(), 2u8);
    let defs = fields(vec![("perms", FieldDef::new(FieldKind::Bitmask { flags }))]);
    let (layouts, _) = compute_layout(&defs).expect("layout");

    let mut set = IndexMap::new();
    set.insert("read".to_string(), true);
    set.insert("write".to_string(), false);
    set.insert("execute".to_string(), true);
    let input = data(vec![("perms", Value::Flags(set))]);
    let packed = encode(&input, &layouts).expect("encode");
    assert_eq!(packed, 0b101);

    // Decode materializes every declared flag.
    let decoded = decode(packed, &layouts);
    let Value::Flags(out) = &decoded["perms"] else {
        panic!("expected flags value");
    };
    assert_eq!(out.get("read"), Some(&true));
    assert_eq!(out.get("write"), Some(&false));
    assert_eq!(out.get("execute"), Some(&true));
}

#[test]
fn test_bitmask_omitted_flags_default_to_false() {
    let mut flags = IndexMap::new();
    flags.insert("read".to_string(), 0u8);
    flags.insert("write".to_string(), 1u8);
    let defs = fields(vec![("perms", FieldDef::new(FieldKind::Bitmask { flags }))]);
    let (layouts, _) = compute_layout(&defs).expect("layout");

    let mut set = IndexMap::new();
    set.insert("write".to_string(), true);
    let input = data(vec![("perms", Value::Flags(set))]);
    assert_eq!(encode(&input, &layouts).expect("encode"), 0b10);
}

#[test]
fn test_zero_bit_fields_round_trip_to_constant() {
    let defs = fields(vec![
        ("mode", FieldDef::new(enum_of(&["only"]))),
        ("pinned", FieldDef::new(int(7, 7))),
        ("tail", FieldDef::new(FieldKind::Bool)),
    ]);
    let (layouts, total) = compute_layout(&defs).expect("layout");
    assert_eq!(total, 1);

    let input = data(vec![
        ("mode", Value::from("only")),
        ("pinned", Value::Int(7)),
        ("tail", Value::Bool(true)),
    ]);
    let packed = encode(&input, &layouts).expect("encode");
    assert_eq!(packed, 1);
    assert_eq!(decode(packed, &layouts), input);
}

#[test]
fn test_int_boundary_values() {
    let defs = fields(vec![("n", FieldDef::new(int(-5, 5)))]);
    let (layouts, _) = compute_layout(&defs).expect("layout");
    for v in [-5i64, -1, 0, 1, 5] {
        let input = data(vec![("n", Value::Int(v))]);
        let packed = encode(&input, &layouts).expect("encode");
        assert_eq!(decode(packed, &layouts), input, "value {v}");
    }
}

#[test]
fn test_full_i64_range_round_trips() {
    let defs = fields(vec![("n", FieldDef::new(int(i64::MIN, i64::MAX)))]);
    let (layouts, total) = compute_layout(&defs).expect("layout");
    assert_eq!(total, 64);
    for v in [i64::MIN, -1, 0, 1, i64::MAX] {
        let input = data(vec![("n", Value::Int(v))]);
        let packed = encode(&input, &layouts).expect("encode");
        assert_eq!(decode(packed, &layouts), input, "value {v}");
    }
}

#[test]
fn test_date_round_trip_per_resolution() {
    let cases = [
        (Resolution::Day, Value::Date(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap())),
        (Resolution::Hour, Value::DateTime(dt(2024, 3, 15, 13, 0, 0))),
        (Resolution::Minute, Value::DateTime(dt(2024, 3, 15, 13, 37, 0))),
        (Resolution::Second, Value::DateTime(dt(2024, 3, 15, 13, 37, 42))),
    ];
    for (resolution, value) in cases {
        let kind = FieldKind::Date {
            resolution,
            min_date: dt(2024, 1, 1, 0, 0, 0),
            max_date: dt(2024, 12, 31, 0, 0, 0),
        };
        let defs = fields(vec![("when", FieldDef::new(kind))]);
        let (layouts, _) = compute_layout(&defs).expect("layout");
        let input = data(vec![("when", value.clone())]);
        let packed = encode(&input, &layouts).expect("encode");
        assert_eq!(decode(packed, &layouts), input, "{:?}", value);
    }
}

#[test]
fn test_date_accepts_iso_strings() {
    let kind = FieldKind::Date {
        resolution: Resolution::Day,
        min_date: dt(2024, 1, 1, 0, 0, 0),
        max_date: dt(2024, 12, 31, 0, 0, 0),
    };
    let defs = fields(vec![("when", FieldDef::new(kind))]);
    let (layouts, _) = compute_layout(&defs).expect("layout");

    let input = data(vec![("when", Value::from("2024-03-15"))]);
    let packed = encode(&input, &layouts).expect("encode");
    let decoded = decode(packed, &layouts);
    assert_eq!(
        decoded["when"],
        Value::Date(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap())
    );
}

#[test]
fn test_date_power_of_two_span_boundary() {
    // Four days of span plan 2 value bits, so unit counts 0..=3 are
    // encodable but max_date itself (unit 4) is not; it must be rejected
    // instead of masking down to min_date.
    let kind = FieldKind::Date {
        resolution: Resolution::Day,
        min_date: dt(2020, 1, 1, 0, 0, 0),
        max_date: dt(2020, 1, 5, 0, 0, 0),
    };
    let defs = fields(vec![("d", FieldDef::new(kind))]);
    let (layouts, total) = compute_layout(&defs).expect("layout");
    assert_eq!(total, 2);

    // The last encodable day round-trips exactly.
    let input = data(vec![(
        "d",
        Value::Date(NaiveDate::from_ymd_opt(2020, 1, 4).unwrap()),
    )]);
    let packed = encode(&input, &layouts).expect("encode");
    assert_eq!(decode(packed, &layouts), input);

    // One day later is in [min_date, max_date] but unrepresentable.
    let err = encode(&data(vec![("d", Value::from("2020-01-05"))]), &layouts)
        .expect_err("unencodable max_date");
    assert!(
        err.to_string().contains("last encodable value 2020-01-04"),
        "got: {err}"
    );
}

#[test]
fn test_nullable_single_value_enum_round_trips() {
    let defs = fields(vec![("opt", FieldDef::nullable(enum_of(&["only"])))]);
    let (layouts, total) = compute_layout(&defs).expect("layout");
    assert_eq!(total, 1);

    // Present: the presence bit alone carries the field.
    let input = data(vec![("opt", Value::from("only"))]);
    let packed = encode(&input, &layouts).expect("encode");
    assert_eq!(packed, 1);
    assert_eq!(decode(packed, &layouts), input);

    // Null: all zero.
    let input = data(vec![("opt", Value::Null)]);
    assert_eq!(encode(&input, &layouts).expect("encode"), 0);
    assert_eq!(decode(0, &layouts), input);
}

#[test]
fn test_fields_do_not_interfere() {
    let mut flags = IndexMap::new();
    flags.insert("x".to_string(), 0u8);
    flags.insert("y".to_string(), 1u8);
    let defs = fields(vec![
        ("a", FieldDef::new(FieldKind::Bool)),
        ("b", FieldDef::new(int(-100, 100))),
        ("c", FieldDef::nullable(enum_of(&["p", "q", "r"]))),
        ("d", FieldDef::new(FieldKind::Bitmask { flags })),
    ]);
    let (layouts, _) = compute_layout(&defs).expect("layout");

    let mut set = IndexMap::new();
    set.insert("x".to_string(), true);
    set.insert("y".to_string(), false);
    let input = data(vec![
        ("a", Value::Bool(true)),
        ("b", Value::Int(-73)),
        ("c", Value::from("r")),
        ("d", Value::Flags(set)),
    ]);
    let packed = encode(&input, &layouts).expect("encode");
    let decoded = decode(packed, &layouts);
    assert_eq!(decoded["a"], Value::Bool(true));
    assert_eq!(decoded["b"], Value::Int(-73));
    assert_eq!(decoded["c"], Value::from("r"));
    let Value::Flags(out) = &decoded["d"] else {
        panic!("expected flags value");
    };
    assert_eq!(out.get("x"), Some(&true));
    assert_eq!(out.get("y"), Some(&false));
}

#[test]
fn test_decode_ignores_unused_high_bits() {
    let defs = fields(vec![("age", FieldDef::new(int(0, 127)))]);
    let (layouts, _) = compute_layout(&defs).expect("layout");
    let packed = 42u64 | (0xdead << 7);
    assert_eq!(decode(packed, &layouts)["age"], Value::Int(42));
}

#[test]
fn test_missing_required_field_is_rejected() {
    let defs = fields(vec![("age", FieldDef::new(int(0, 127)))]);
    let (layouts, _) = compute_layout(&defs).expect("layout");
    let err = encode(&HashMap::new(), &layouts).expect_err("missing field");
    assert_eq!(err.to_string(), "required field 'age' is missing");
}

#[test]
fn test_all_missing_fields_reported_sorted() {
    let defs = fields(vec![
        ("zeta", FieldDef::new(FieldKind::Bool)),
        ("alpha", FieldDef::new(FieldKind::Bool)),
        ("mid", FieldDef::new(FieldKind::Bool)),
    ]);
    let (layouts, _) = compute_layout(&defs).expect("layout");
    let err = encode(&HashMap::new(), &layouts).expect_err("missing fields");
    assert_eq!(
        err.to_string(),
        "required fields missing: 'alpha', 'mid', 'zeta'"
    );
}

#[test]
fn test_null_in_non_nullable_field_is_rejected() {
    let defs = fields(vec![("age", FieldDef::new(int(0, 127)))]);
    let (layouts, _) = compute_layout(&defs).expect("layout");
    let input = data(vec![("age", Value::Null)]);
    let err = encode(&input, &layouts).expect_err("null not allowed");
    assert!(err.to_string().contains("cannot be null"), "got: {err}");
}

#[test]
fn test_out_of_range_int_is_rejected() {
    let defs = fields(vec![("age", FieldDef::new(int(0, 100)))]);
    let (layouts, _) = compute_layout(&defs).expect("layout");

    let err = encode(&data(vec![("age", Value::Int(150))]), &layouts)
        .expect_err("above max");
    assert!(
        err.to_string().contains("value 150 exceeds maximum 100"),
        "got: {err}"
    );

    let err = encode(&data(vec![("age", Value::Int(-1))]), &layouts)
        .expect_err("below min");
    assert!(
        err.to_string().contains("value -1 is below minimum 0"),
        "got: {err}"
    );
}

#[test]
fn test_unknown_enum_value_is_rejected() {
    let defs = fields(vec![("status", FieldDef::new(enum_of(&["a", "b"])))]);
    let (layouts, _) = compute_layout(&defs).expect("layout");
    let err = encode(&data(vec![("status", Value::from("c"))]), &layouts)
        .expect_err("unknown value");
    assert!(err.to_string().contains("not in allowed values"), "got: {err}");
}

#[test]
fn test_wrong_type_is_rejected() {
    let defs = fields(vec![("active", FieldDef::new(FieldKind::Bool))]);
    let (layouts, _) = compute_layout(&defs).expect("layout");
    let err = encode(&data(vec![("active", Value::Int(1))]), &layouts)
        .expect_err("type mismatch");
    assert!(err.to_string().contains("active"), "got: {err}");
}

#[test]
fn test_date_out_of_range_is_rejected() {
    let kind = FieldKind::Date {
        resolution: Resolution::Day,
        min_date: dt(2024, 1, 1, 0, 0, 0),
        max_date: dt(2024, 12, 31, 0, 0, 0),
    };
    let defs = fields(vec![("when", FieldDef::new(kind))]);
    let (layouts, _) = compute_layout(&defs).expect("layout");
    let err = encode(&data(vec![("when", Value::from("2025-06-01"))]), &layouts)
        .expect_err("beyond max_date");
    assert!(err.to_string().contains("when"), "got: {err}");
}

#[test]
fn test_extra_data_keys_are_ignored() {
    let defs = fields(vec![("active", FieldDef::new(FieldKind::Bool))]);
    let (layouts, _) = compute_layout(&defs).expect("layout");
    let input = data(vec![
        ("active", Value::Bool(true)),
        ("unrelated", Value::Int(99)),
    ]);
    assert_eq!(encode(&input, &layouts).expect("encode"), 1);
}

#[test]
fn test_decoded_enum_index_beyond_values_clamps() {
    // 4 values need 2 bits; all four codes are valid here, but a schema with
    // 3 values also has 2 bits and code 3 maps to the last value.
    let defs = fields(vec![("status", FieldDef::new(enum_of(&["a", "b", "c"])))]);
    let (layouts, _) = compute_layout(&defs).expect("layout");
    assert_eq!(decode(0b11, &layouts)["status"], Value::from("c"));
}
