// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

fn schema() -> ParamSchema {
    ParamSchema::new()
        .field("a", ParamKind::Integer, 1)
        .field("b", ParamKind::Text, "")
        .field("scale", ParamKind::Float, 0.5)
        .field("strict", ParamKind::Boolean, false)
}

fn raw(value: serde_json::Value) -> Params {
    raw_params(Some(&value)).unwrap()
}

#[test]
fn defaults_fill_missing_keys() {
    let out = schema().normalize(&Params::new()).unwrap();
    assert_eq!(out.get("a"), Some(&json!(1)));
    assert_eq!(out.get("b"), Some(&json!("")));
    assert_eq!(out.get("scale"), Some(&json!(0.5)));
    assert_eq!(out.get("strict"), Some(&json!(false)));
}

#[test]
fn unknown_key_is_a_hard_error() {
    let err = schema().normalize(&raw(json!({"nope": 1}))).unwrap_err();
    assert_eq!(err, ParamError::UnknownKey("nope".to_string()));
}

#[test]
fn numeric_string_coerces_to_integer() {
    let out = schema().normalize(&raw(json!({"a": "2"}))).unwrap();
    assert_eq!(out.get("a"), Some(&json!(2)));
}

#[test]
fn coerced_and_literal_forms_normalize_identically() {
    let coerced = schema().normalize(&raw(json!({"a": "2"}))).unwrap();
    let literal = schema().normalize(&raw(json!({"a": 2}))).unwrap();
    assert_eq!(canonical_json(&coerced), canonical_json(&literal));
}

#[test]
fn whole_float_canonicalizes_to_integer() {
    let a = schema().normalize(&raw(json!({"scale": 2.0}))).unwrap();
    let b = schema().normalize(&raw(json!({"scale": 2}))).unwrap();
    assert_eq!(canonical_json(&a), canonical_json(&b));
}

#[yare::parameterized(
    int_from_bool   = { json!({"a": true}) },
    int_from_float  = { json!({"a": 1.5}) },
    int_from_word   = { json!({"a": "two"}) },
    text_from_int   = { json!({"b": 7}) },
    bool_from_word  = { json!({"strict": "yes"}) },
    float_from_null = { json!({"scale": null}) },
)]
fn type_mismatches_are_rejected(bad: serde_json::Value) {
    let err = schema().normalize(&raw(bad)).unwrap_err();
    assert!(matches!(err, ParamError::TypeMismatch { .. }));
}

#[test]
fn boolean_string_coercion() {
    let out = schema().normalize(&raw(json!({"strict": "true"}))).unwrap();
    assert_eq!(out.get("strict"), Some(&json!(true)));
}

#[test]
fn required_field_without_value_errors() {
    let schema = ParamSchema::new().required("window", ParamKind::Integer);
    let err = schema.normalize(&Params::new()).unwrap_err();
    assert_eq!(err, ParamError::Missing("window".to_string()));
}

#[test]
fn canonical_json_sorts_keys() {
    let out = schema()
        .normalize(&raw(json!({"strict": true, "a": 3, "b": "x"})))
        .unwrap();
    let json = canonical_json(&out);
    let a = json.find("\"a\"").unwrap();
    let b = json.find("\"b\"").unwrap();
    let scale = json.find("\"scale\"").unwrap();
    let strict = json.find("\"strict\"").unwrap();
    assert!(a < b && b < scale && scale < strict);
}

#[test]
fn raw_params_accepts_none_and_null() {
    assert!(raw_params(None).unwrap().is_empty());
    assert!(raw_params(Some(&json!(null))).unwrap().is_empty());
}

#[test]
fn raw_params_rejects_non_object() {
    let err = raw_params(Some(&json!([1, 2]))).unwrap_err();
    assert_eq!(err, ParamError::NotAnObject("array".to_string()));
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Normalization is a projection: normalizing a normalized set is
        /// a no-op.
        #[test]
        fn normalize_is_idempotent(a in -1000i64..1000, strict in any::<bool>()) {
            let first = schema().normalize(&raw(json!({"a": a, "strict": strict}))).unwrap();
            let second = schema().normalize(&first).unwrap();
            prop_assert_eq!(canonical_json(&first), canonical_json(&second));
        }

        #[test]
        fn integer_string_always_matches_literal(a in -1000i64..1000) {
            let coerced = schema().normalize(&raw(json!({"a": a.to_string()}))).unwrap();
            let literal = schema().normalize(&raw(json!({"a": a}))).unwrap();
            prop_assert_eq!(canonical_json(&coerced), canonical_json(&literal));
        }
    }
}
