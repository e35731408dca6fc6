use rstest::rstest;
use serde_json::json;
use toon_codec::{decode, encode, DecodeOptions, EncodeOptions, Error, Value};

#[rstest]
fn test_missing_colon_reports_line_and_key() {
    let err = decode("a: 1\nb: 2\noops here\nc: 3", &DecodeOptions::default()).unwrap_err();
    match err {
        Error::Syntax { line, message } => {
            assert_eq!(line, 3);
            assert!(message.contains("':'"), "message: {message}");
        }
        other => panic!("expected syntax error, got {other:?}"),
    }
}

#[rstest]
#[case("a: \"unterminated", "unterminated quoted string")]
#[case("a: \"bad\\q\"", "invalid escape")]
#[case("[1]{}:\n  1", "at least one field")]
#[case("[x]: 1", "array length")]
#[case("[2: 1,2", "']'")]
#[case("[*]:\n  - 1", "streaming")]
fn test_syntax_errors_describe_the_failure(#[case] input: &str, #[case] needle: &str) {
    let err = decode(input, &DecodeOptions::default()).unwrap_err();
    assert!(matches!(err, Error::Syntax { .. }), "got {err:?}");
    assert!(
        err.to_string().contains(needle),
        "expected {needle:?} in {err}"
    );
}

#[rstest]
fn test_syntax_errors_survive_lenient_mode() {
    // Lenient mode repairs cardinality only; structure stays fatal.
    let options = DecodeOptions::new().with_strict(false);
    for input in ["a: 1\nkey no colon", "a: \"unterminated", "[1]{}:\n  1"] {
        let err = decode(input, &options).unwrap_err();
        assert!(matches!(err, Error::Syntax { .. }), "input {input:?}: {err:?}");
    }
}

#[rstest]
fn test_strict_mode_boundary_row_overflow() {
    let err = decode("[2]{a,b}:\n  1,2,3", &DecodeOptions::default()).unwrap_err();
    assert!(err.is_validation());
    assert!(err.to_string().contains("row width mismatch"));

    let lenient = DecodeOptions::new().with_strict(false);
    let value: serde_json::Value = decode("[2]{a,b}:\n  1,2,3\n  4,5", &lenient)
        .unwrap()
        .into();
    assert_eq!(value, json!([{"a": 1, "b": 2}, {"a": 4, "b": 5}]));
}

#[rstest]
fn test_lenient_mode_pads_missing_values_with_null() {
    let lenient = DecodeOptions::new().with_strict(false);

    let value: serde_json::Value = decode("[3]: 1,2", &lenient).unwrap().into();
    assert_eq!(value, json!([1, 2, null]));

    let value: serde_json::Value = decode("[1]{a,b,c}:\n  7", &lenient).unwrap().into();
    assert_eq!(value, json!([{"a": 7, "b": null, "c": null}]));
}

#[rstest]
fn test_lenient_mode_discards_extra_values() {
    let lenient = DecodeOptions::new().with_strict(false);
    let value: serde_json::Value = decode("[2]: 1,2,3,4", &lenient).unwrap().into();
    assert_eq!(value, json!([1, 2]));
}

#[rstest]
#[case("[3]: 1,2")]
#[case("[1]: 1,2")]
#[case("items[2]:\n  - 1")]
#[case("rows[1]{a}:\n  1\n  2")]
fn test_strict_mode_rejects_every_length_disagreement(#[case] input: &str) {
    let err = decode(input, &DecodeOptions::default()).unwrap_err();
    assert!(err.is_validation(), "input {input:?}: {err:?}");
}

#[rstest]
fn test_strict_indentation_rules() {
    let err = decode("a:\n\tb: 1", &DecodeOptions::default()).unwrap_err();
    assert!(err.to_string().contains("tabs"));

    let err = decode("a:\n   b: 1", &DecodeOptions::default()).unwrap_err();
    assert!(err.to_string().contains("multiple"));

    // Lenient mode tolerates both.
    let options = DecodeOptions::new().with_strict(false);
    assert!(decode("a:\n   b: 1", &options).is_ok());
}

#[rstest]
fn test_deep_nesting_fails_with_path() {
    let mut value = json!(true);
    for _ in 0..300 {
        value = json!({ "level": value });
    }
    let err = encode(&Value::from(value), &EncodeOptions::default()).unwrap_err();
    match err {
        Error::Encode { path, message } => {
            assert!(path.starts_with("$.level"));
            assert!(message.contains("depth"));
        }
        other => panic!("expected encode error, got {other:?}"),
    }
}

#[rstest]
fn test_error_display_is_structured() {
    let err = decode(": 1", &DecodeOptions::default()).unwrap_err();
    let text = err.to_string();
    assert!(text.starts_with("syntax error at line 1:"), "got {text}");
}
