use rstest::rstest;
use serde_json::json;
use toon_codec::{
    decode, decode_events, decode_items, encode, encode_chunks, encode_indefinite, ArrayLen,
    DecodeOptions, EncodeOptions, Event, Value,
};

#[rstest]
#[case("[3]:\n  - 1\n  - two\n  - true")]
#[case("[2]{id,name}:\n  1,Alice\n  2,Bob")]
#[case("[4]: 1,2,3,4")]
#[case("[2]:\n  - id: 1\n    tags[2]: a,b\n  - id: 2\n    tags[0]:")]
#[case("[1]:\n  - rows[2]{v}:\n      1\n      2")]
fn test_items_equal_materialized_decode(#[case] input: &str) {
    let streamed: Vec<Value> = decode_items(input.split('\n'), &DecodeOptions::default())
        .collect::<Result<_, _>>()
        .unwrap();
    let whole = decode(input, &DecodeOptions::default()).unwrap();
    assert_eq!(Value::Array(streamed), whole);
}

#[rstest]
fn test_items_for_non_array_root_yield_one_value() {
    let items: Vec<Value> = decode_items("name: Alice\nage: 30".split('\n'), &DecodeOptions::default())
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0], decode("name: Alice\nage: 30", &DecodeOptions::default()).unwrap());
}

#[rstest]
fn test_items_stop_early_without_draining_source() {
    // Terminates only if each pull reads a bounded number of lines.
    let source = (0..).map(|i| format!("- {i}"));
    let taken: Vec<Value> = decode_items(source, &DecodeOptions::default())
        .take(10)
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(taken.len(), 10);
    assert_eq!(taken[9], Value::from(9i64));
}

#[rstest]
fn test_events_for_tabular_document() {
    let events: Vec<Event> = decode_events(
        "users[2]{id,name}:\n  1,Alice\n  2,Bob".split('\n'),
        &DecodeOptions::default(),
    )
    .collect::<Result<_, _>>()
    .unwrap();

    assert_eq!(events[0], Event::StartDocument);
    assert_eq!(events[1], Event::StartObject);
    assert_eq!(events[2], Event::Key("users".into()));
    assert_eq!(events[3], Event::StartArray(ArrayLen::Known(2)));
    assert_eq!(
        events.iter().filter(|e| matches!(e, Event::StartObject)).count(),
        3
    );
    assert_eq!(events.last(), Some(&Event::EndDocument));
}

#[rstest]
fn test_events_report_unknown_length_for_indefinite_header() {
    let events: Vec<Event> = decode_events("[*]:\n  - 1".split('\n'), &DecodeOptions::default())
        .collect::<Result<_, _>>()
        .unwrap();
    assert!(events.contains(&Event::StartArray(ArrayLen::Unknown)));
}

#[rstest]
fn test_events_balance_every_open_with_a_close() {
    let input = "a:\n  b[2]:\n    - x: 1\n    - x: 2\nc: 3";
    let mut depth = 0i32;
    for event in decode_events(input.split('\n'), &DecodeOptions::default()) {
        match event.unwrap() {
            Event::StartDocument | Event::StartObject | Event::StartArray(_) => depth += 1,
            Event::EndDocument | Event::EndObject | Event::EndArray => depth -= 1,
            Event::Key(_) | Event::Value(_) => {}
        }
        assert!(depth >= 0);
    }
    assert_eq!(depth, 0);
}

#[rstest]
#[case(json!({"name": "Alice", "age": 30}))]
#[case(json!([{"id": 1, "name": "Alice"}, {"id": 2, "name": "Bob"}]))]
#[case(json!({"a": {"b": [1, 2]}, "c": [{"x": 1}, "mixed"]}))]
#[case(json!([]))]
#[case(json!("just a string"))]
fn test_chunks_concatenate_to_one_shot_output(#[case] value: serde_json::Value) {
    let options = EncodeOptions::default();
    let expected = encode(&Value::from(&value), &options).unwrap();
    let chunked: String = encode_chunks(Value::from(value), &options).unwrap().collect();
    assert_eq!(chunked, expected);
}

#[rstest]
fn test_indefinite_emits_star_header_first() {
    let mut chunks = encode_indefinite(
        vec![Value::from(1i64), Value::from(2i64)],
        &EncodeOptions::default(),
    );
    assert_eq!(chunks.next().unwrap().unwrap(), "[*]:");
    assert_eq!(chunks.next().unwrap().unwrap(), "\n  - 1");
    assert_eq!(chunks.next().unwrap().unwrap(), "\n  - 2");
    assert!(chunks.next().is_none());
}

#[rstest]
fn test_indefinite_does_one_item_of_work_per_pull() {
    let endless = (0..).map(|i| Value::from(json!({"seq": i})));
    let taken: Vec<String> = encode_indefinite(endless, &EncodeOptions::default())
        .take(5)
        .map(|chunk| chunk.unwrap())
        .collect();
    assert_eq!(taken[0], "[*]:");
    assert_eq!(taken[4], "\n  - seq: 3");
}

#[rstest]
fn test_indefinite_stream_roundtrips_through_items() {
    let source = vec![
        Value::from(json!({"id": 1, "name": "Alice"})),
        Value::from(json!({"id": 2, "name": "Bob"})),
        Value::from(json!([1, 2, 3])),
        Value::from(json!("plain")),
    ];
    let text: String = encode_indefinite(source.clone(), &EncodeOptions::default())
        .map(|chunk| chunk.unwrap())
        .collect();

    let back: Vec<Value> = decode_items(text.split('\n'), &DecodeOptions::default())
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(back, source);
}

#[rstest]
fn test_streaming_decode_honors_lenient_mode() {
    let options = DecodeOptions::new().with_strict(false);
    let items: Vec<Value> = decode_items("[3]: 1,2".split('\n'), &options)
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(items, vec![Value::from(1i64), Value::from(2i64), Value::Null]);
}

#[rstest]
fn test_streaming_decode_propagates_strict_errors() {
    let failed: Result<Vec<Value>, _> =
        decode_items("[2]{a,b}:\n  1,2,3".split('\n'), &DecodeOptions::default()).collect();
    assert!(failed.unwrap_err().is_validation());
}

#[rstest]
fn test_lines_with_carriage_returns_decode_like_plain_lines() {
    let crlf = "users[2]{id}:\r\n  1\r\n  2\r\n";
    let streamed: Vec<Value> = decode_items(crlf.split('\n'), &DecodeOptions::default())
        .collect::<Result<_, _>>()
        .unwrap();
    let plain = decode("users[2]{id}:\n  1\n  2", &DecodeOptions::default()).unwrap();
    assert_eq!(
        Value::Array(streamed),
        Value::Array(vec![plain]),
        "CRLF input should match LF input wrapped as the single object item"
    );
}
