//! Encoder: one pass over the value tree, choosing the most compact
//! valid representation for every array and applying the quoting rule to
//! every string.
//!
//! Array form selection is a pure function of content shape: inline for
//! all-primitive arrays, tabular for uniform arrays of flat objects,
//! block list for everything else, preferred in that order.

pub mod parallel;
pub mod stream;
mod writer;

use std::io::Write;

use serde::Serialize;

use crate::constants::MAX_DEPTH;
use crate::error::{Error, Result};
use crate::options::EncodeOptions;
use crate::value::{Object, Value};

pub(crate) use writer::{write_primitive_into, Writer};

/// Encode a value tree to text.
pub fn encode(value: &Value, options: &EncodeOptions) -> Result<String> {
    let mut encoder = Encoder::new(options);
    encoder.write_root(value)?;
    Ok(encoder.writer.finish())
}

pub fn to_string<T: Serialize>(value: &T, options: &EncodeOptions) -> Result<String> {
    let json = serde_json::to_value(value)
        .map_err(|err| Error::encode("$", format!("serialize failed: {err}")))?;
    encode(&Value::from(json), options)
}

pub fn to_vec<T: Serialize>(value: &T, options: &EncodeOptions) -> Result<Vec<u8>> {
    to_string(value, options).map(String::into_bytes)
}

pub fn to_writer<T: Serialize, W: Write>(
    mut writer: W,
    value: &T,
    options: &EncodeOptions,
) -> Result<()> {
    let text = to_string(value, options)?;
    writer
        .write_all(text.as_bytes())
        .map_err(|err| Error::io(format!("write failed: {err}")))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArrayForm {
    Inline,
    Tabular,
    List,
}

/// Classify an array by the shape of its content. Empty arrays are
/// inline; tabular requires non-empty objects sharing one flat key set.
pub(crate) fn detect_array_form(arr: &[Value], sort_keys: bool) -> ArrayForm {
    if arr.is_empty() {
        return ArrayForm::Inline;
    }

    let mut inline = true;
    let mut tabular = true;
    let mut fields: Option<Vec<&str>> = None;

    for item in arr {
        if inline && !item.is_primitive() {
            inline = false;
        }
        if tabular {
            match item.as_object() {
                Some(obj) if !obj.is_empty() => {
                    match &fields {
                        None => {
                            fields = Some(obj.keys().map(String::as_str).collect());
                        }
                        Some(expected) => {
                            let same = if sort_keys {
                                obj.len() == expected.len()
                                    && expected.iter().all(|field| obj.contains_key(*field))
                            } else {
                                obj.len() == expected.len()
                                    && obj.keys().map(String::as_str).eq(expected.iter().copied())
                            };
                            if !same {
                                tabular = false;
                            }
                        }
                    }
                    if tabular && !obj.values().all(Value::is_primitive) {
                        tabular = false;
                    }
                }
                _ => tabular = false,
            }
        }
        if !inline && !tabular {
            return ArrayForm::List;
        }
    }

    if inline {
        ArrayForm::Inline
    } else if tabular {
        ArrayForm::Tabular
    } else {
        ArrayForm::List
    }
}

/// Header field order for a tabular array.
pub(crate) fn tabular_fields(first: &Object, sort_keys: bool) -> Vec<String> {
    let mut fields: Vec<String> = first.keys().cloned().collect();
    if sort_keys {
        fields.sort_unstable();
    }
    fields
}

/// Render one tabular row in header order.
pub(crate) fn render_row(obj: &Object, fields: &[String], options: &EncodeOptions) -> String {
    let mut out = String::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(options.delimiter.as_char());
        }
        let value = obj.get(field).expect("tabular rows share the header fields");
        write_primitive_into(&mut out, value);
    }
    out
}

pub(crate) fn render_inline_values(arr: &[Value], options: &EncodeOptions) -> String {
    let mut out = String::new();
    for (i, value) in arr.iter().enumerate() {
        if i > 0 {
            out.push(options.delimiter.as_char());
        }
        write_primitive_into(&mut out, value);
    }
    out
}

/// Render a single block-list item line (plus continuation lines) at the
/// given depth, without a leading newline. Used for each element of an
/// indefinite stream.
pub(crate) fn render_block_item(
    value: &Value,
    depth: usize,
    options: &EncodeOptions,
) -> Result<String> {
    let mut encoder = Encoder::new(options);
    encoder.writer.indent(depth);
    encoder.write_list_item(value, depth)?;
    Ok(encoder.writer.finish())
}

enum Segment {
    Key(String),
    Index(usize),
}

struct Encoder<'o> {
    writer: Writer,
    options: &'o EncodeOptions,
    path: Vec<Segment>,
}

impl<'o> Encoder<'o> {
    fn new(options: &'o EncodeOptions) -> Self {
        Self {
            writer: Writer::new(options),
            options,
            path: Vec::new(),
        }
    }

    fn write_root(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Object(obj) => self.write_object(obj, 0, false),
            Value::Array(arr) => self.write_array(None, arr, 0),
            _ => {
                self.writer.write_primitive(value);
                Ok(())
            }
        }
    }

    fn write_object(&mut self, obj: &Object, depth: usize, absorbed: bool) -> Result<()> {
        self.check_depth(depth)?;

        if self.options.sort_keys {
            let mut entries: Vec<(&String, &Value)> = obj.iter().collect();
            entries.sort_unstable_by_key(|(key, _)| *key);
            for (i, (key, value)) in entries.into_iter().enumerate() {
                self.write_entry_line(key, value, depth, i == 0 && absorbed)?;
            }
        } else {
            for (i, (key, value)) in obj.iter().enumerate() {
                self.write_entry_line(key, value, depth, i == 0 && absorbed)?;
            }
        }
        Ok(())
    }

    fn write_entry_line(
        &mut self,
        key: &str,
        value: &Value,
        depth: usize,
        continue_line: bool,
    ) -> Result<()> {
        if !continue_line {
            if !self.writer.is_empty() {
                self.writer.newline();
            }
            self.writer.indent(depth);
        }
        self.path.push(Segment::Key(key.to_string()));
        match value {
            Value::Object(obj) if obj.is_empty() => {
                self.writer.write_key(key);
                self.writer.push_char(':');
            }
            Value::Object(obj) => {
                self.writer.write_key(key);
                self.writer.push_char(':');
                self.write_object(obj, depth + 1, false)?;
            }
            Value::Array(arr) => {
                self.write_array(Some(key), arr, depth)?;
            }
            _ => {
                self.writer.write_key(key);
                self.writer.push_str(": ");
                self.writer.write_primitive(value);
            }
        }
        self.path.pop();
        Ok(())
    }

    fn write_array(&mut self, key: Option<&str>, arr: &[Value], depth: usize) -> Result<()> {
        self.check_depth(depth)?;

        if arr.is_empty() {
            self.writer.write_array_header(key, Some(0), None);
            return Ok(());
        }

        match detect_array_form(arr, self.options.sort_keys) {
            ArrayForm::Inline => {
                self.writer.write_array_header(key, Some(arr.len()), None);
                self.writer.push_char(' ');
                let values = render_inline_values(arr, self.options);
                self.writer.push_str(&values);
            }
            ArrayForm::Tabular => {
                let first = arr[0].as_object().expect("tabular arrays hold objects");
                let fields = tabular_fields(first, self.options.sort_keys);
                let field_refs: Vec<&str> = fields.iter().map(String::as_str).collect();
                self.writer
                    .write_array_header(key, Some(arr.len()), Some(&field_refs));

                let rows = self.render_rows(arr, &fields);
                for row in rows {
                    self.writer.newline();
                    self.writer.indent(depth + 1);
                    self.writer.push_str(&row);
                }
            }
            ArrayForm::List => {
                self.writer.write_array_header(key, Some(arr.len()), None);
                for (i, item) in arr.iter().enumerate() {
                    self.path.push(Segment::Index(i));
                    self.writer.newline();
                    self.writer.indent(depth + 1);
                    self.write_list_item(item, depth + 1)?;
                    self.path.pop();
                }
            }
        }
        Ok(())
    }

    /// Rows are independent once the header is fixed, so large tables are
    /// fanned out to workers. A fault in the accelerated path is
    /// normalized at the boundary and the batch is retried once on the
    /// sequential reference path.
    fn render_rows(&self, arr: &[Value], fields: &[String]) -> Vec<String> {
        let render = |item: &Value| {
            let obj = item.as_object().expect("tabular arrays hold objects");
            render_row(obj, fields, self.options)
        };

        if parallel::should_parallelize(arr.len(), self.options.parallelism_threshold) {
            match parallel::map_items(arr, render) {
                Ok(rows) => return rows,
                Err(_) => {}
            }
        }
        arr.iter().map(render).collect()
    }

    /// Item content after the line's indentation: the dash marker plus
    /// the recursively encoded element.
    fn write_list_item(&mut self, item: &Value, item_depth: usize) -> Result<()> {
        self.writer.push_char('-');
        match item {
            Value::Object(obj) if obj.is_empty() => {}
            Value::Object(obj) => {
                self.writer.push_char(' ');
                self.write_object(obj, item_depth + 1, true)?;
            }
            Value::Array(nested) => {
                self.writer.push_char(' ');
                self.write_array(None, nested, item_depth)?;
            }
            _ => {
                self.writer.push_char(' ');
                self.writer.write_primitive(item);
            }
        }
        Ok(())
    }

    fn check_depth(&self, depth: usize) -> Result<()> {
        if depth > MAX_DEPTH {
            return Err(Error::encode(self.path_string(), "maximum depth exceeded"));
        }
        Ok(())
    }

    fn path_string(&self) -> String {
        let mut out = String::from("$");
        for segment in &self.path {
            match segment {
                Segment::Key(key) => {
                    out.push('.');
                    out.push_str(key);
                }
                Segment::Index(index) => {
                    out.push('[');
                    let mut buf = itoa::Buffer::new();
                    out.push_str(buf.format(*index as u64));
                    out.push(']');
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::options::{Delimiter, Indent};

    fn encode_json(value: serde_json::Value) -> String {
        encode(&Value::from(value), &EncodeOptions::default()).unwrap()
    }

    #[rstest::rstest]
    fn test_encode_flat_object() {
        assert_eq!(
            encode_json(json!({"name": "Alice", "age": 30})),
            "name: Alice\nage: 30"
        );
    }

    #[rstest::rstest]
    fn test_encode_root_primitives() {
        assert_eq!(encode_json(json!(42)), "42");
        assert_eq!(encode_json(json!(true)), "true");
        assert_eq!(encode_json(json!(null)), "null");
        assert_eq!(encode_json(json!("hello")), "hello");
        assert_eq!(encode_json(json!("true")), "\"true\"");
        assert_eq!(encode_json(json!({})), "");
        assert_eq!(encode_json(json!([])), "[0]:");
    }

    #[rstest::rstest]
    fn test_encode_nested_object() {
        assert_eq!(
            encode_json(json!({"user": {"name": "Alice", "address": {"city": "NYC"}}})),
            "user:\n  name: Alice\n  address:\n    city: NYC"
        );
    }

    #[rstest::rstest]
    fn test_encode_empty_object_value() {
        assert_eq!(encode_json(json!({"a": {}, "b": 1})), "a:\nb: 1");
    }

    #[rstest::rstest]
    fn test_encode_inline_array() {
        assert_eq!(encode_json(json!([1, 2, 3])), "[3]: 1,2,3");
        assert_eq!(
            encode_json(json!({"tags": ["reading", "gaming"]})),
            "tags[2]: reading,gaming"
        );
        assert_eq!(encode_json(json!({"empty": []})), "empty[0]:");
    }

    #[rstest::rstest]
    fn test_encode_tabular_array() {
        assert_eq!(
            encode_json(json!([{"id": 1, "name": "Alice"}, {"id": 2, "name": "Bob"}])),
            "[2]{id,name}:\n  1,Alice\n  2,Bob"
        );
    }

    #[rstest::rstest]
    fn test_encode_keyed_tabular_array() {
        assert_eq!(
            encode_json(json!({"users": [{"id": 1}, {"id": 2}]})),
            "users[2]{id}:\n  1\n  2"
        );
    }

    #[rstest::rstest]
    fn test_non_uniform_objects_fall_back_to_list() {
        assert_eq!(
            encode_json(json!([{"a": 1}, {"a": 1, "b": 2}])),
            "[2]:\n  - a: 1\n  - a: 1\n    b: 2"
        );
    }

    #[rstest::rstest]
    fn test_nested_values_disqualify_tabular() {
        assert_eq!(
            encode_json(json!([{"a": [1]}, {"a": [2]}])),
            "[2]:\n  - a[1]: 1\n  - a[1]: 2"
        );
    }

    #[rstest::rstest]
    fn test_encode_mixed_list() {
        assert_eq!(
            encode_json(json!({"items": [1, "two", {"id": 3}]})),
            "items[3]:\n  - 1\n  - two\n  - id: 3"
        );
    }

    #[rstest::rstest]
    fn test_encode_nested_arrays() {
        assert_eq!(
            encode_json(json!({"matrix": [[1, 2], [3, 4]]})),
            "matrix[2]:\n  - [2]: 1,2\n  - [2]: 3,4"
        );
    }

    #[rstest::rstest]
    fn test_encode_empty_object_in_list() {
        assert_eq!(encode_json(json!([{}, 1])), "[2]:\n  -\n  - 1");
    }

    #[rstest::rstest]
    fn test_encode_with_pipe_delimiter() {
        let options = EncodeOptions::new().with_delimiter(Delimiter::Pipe);
        let value = Value::from(json!({"tags": ["a", "b"]}));
        assert_eq!(encode(&value, &options).unwrap(), "tags[2|]: a|b");
    }

    #[rstest::rstest]
    fn test_encode_with_wider_indent() {
        let options = EncodeOptions::new().with_indent(Indent::spaces(4));
        let value = Value::from(json!({"a": {"b": 1}}));
        assert_eq!(encode(&value, &options).unwrap(), "a:\n    b: 1");
    }

    #[rstest::rstest]
    fn test_encode_sort_keys() {
        let options = EncodeOptions::new().with_sort_keys(true);
        let value = Value::from(json!({"b": 1, "a": {"d": 2, "c": 3}}));
        assert_eq!(encode(&value, &options).unwrap(), "a:\n  c: 3\n  d: 2\nb: 1");
    }

    #[rstest::rstest]
    fn test_encode_sort_keys_tabular() {
        let options = EncodeOptions::new().with_sort_keys(true);
        let value = Value::from(json!([{"b": 1, "a": 2}, {"a": 3, "b": 4}]));
        assert_eq!(
            encode(&value, &options).unwrap(),
            "[2]{a,b}:\n  2,1\n  4,3"
        );
    }

    #[rstest::rstest]
    fn test_quoting_in_values() {
        assert_eq!(
            encode_json(json!({"a": "hello world", "b": "with, comma", "c": "123"})),
            "a: hello world\nb: \"with, comma\"\nc: \"123\""
        );
    }

    #[rstest::rstest]
    fn test_depth_limit_reports_path() {
        let mut value = json!(1);
        for _ in 0..=MAX_DEPTH {
            value = json!({ "a": value });
        }
        let err = encode(&Value::from(value), &EncodeOptions::default()).unwrap_err();
        match err {
            Error::Encode { path, message } => {
                assert!(path.starts_with("$.a"));
                assert!(message.contains("depth"));
            }
            other => panic!("expected encode error, got {other:?}"),
        }
    }

    #[rstest::rstest]
    fn test_detect_array_form() {
        let inline = Value::from(json!([1, "a", null]));
        assert_eq!(
            detect_array_form(inline.as_array().unwrap(), false),
            ArrayForm::Inline
        );

        let tabular = Value::from(json!([{"x": 1}, {"x": 2}]));
        assert_eq!(
            detect_array_form(tabular.as_array().unwrap(), false),
            ArrayForm::Tabular
        );

        let reordered = Value::from(json!([{"x": 1, "y": 2}, {"y": 3, "x": 4}]));
        assert_eq!(
            detect_array_form(reordered.as_array().unwrap(), false),
            ArrayForm::List
        );
        assert_eq!(
            detect_array_form(reordered.as_array().unwrap(), true),
            ArrayForm::Tabular
        );

        let empty_objects = Value::from(json!([{}, {}]));
        assert_eq!(
            detect_array_form(empty_objects.as_array().unwrap(), false),
            ArrayForm::List
        );
    }

    #[rstest::rstest]
    fn test_scenario_two_row_table() {
        let value = Value::from(json!([
            {"id": 1, "name": "Alice"},
            {"id": 2, "name": "Bob"}
        ]));
        let text = encode(&value, &EncodeOptions::default()).unwrap();
        assert!(text.starts_with("[2]{id,name}:"));
        assert_eq!(text.lines().count(), 3);
    }
}
