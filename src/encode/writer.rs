//! Low-level line emission: indentation caching, key and scalar
//! rendering, array headers.

use crate::num::write_number_into;
use crate::options::{Delimiter, EncodeOptions};
use crate::text::{escape_string_into, is_unquoted_key, needs_quoting};
use crate::value::Value;

pub(crate) struct Writer {
    out: String,
    delimiter: Delimiter,
    indent_unit: String,
    indent_cache: Vec<String>,
}

impl Writer {
    pub fn new(options: &EncodeOptions) -> Self {
        let indent_unit = " ".repeat(options.indent.get_spaces());
        Self {
            out: String::new(),
            delimiter: options.delimiter,
            indent_unit,
            indent_cache: vec![String::new()],
        }
    }

    pub fn finish(self) -> String {
        self.out
    }

    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    pub fn push_str(&mut self, s: &str) {
        self.out.push_str(s);
    }

    pub fn push_char(&mut self, ch: char) {
        self.out.push(ch);
    }

    pub fn newline(&mut self) {
        self.out.push('\n');
    }

    pub fn indent(&mut self, depth: usize) {
        if depth == 0 || self.indent_unit.is_empty() {
            return;
        }
        while self.indent_cache.len() <= depth {
            let next = match self.indent_cache.last() {
                Some(prev) => {
                    let mut s = String::with_capacity(prev.len() + self.indent_unit.len());
                    s.push_str(prev);
                    s.push_str(&self.indent_unit);
                    s
                }
                None => String::new(),
            };
            self.indent_cache.push(next);
        }
        self.out.push_str(&self.indent_cache[depth]);
    }

    pub fn write_key(&mut self, key: &str) {
        write_key_into(&mut self.out, key);
    }

    /// Emit a primitive with the quoting rule applied to strings.
    pub fn write_primitive(&mut self, value: &Value) {
        write_primitive_into(&mut self.out, value);
    }

    /// Array header: `key[N]:`, `[N]{f1,f2}:`, `[*]:`. A non-comma
    /// delimiter is marked inside the brackets.
    pub fn write_array_header(&mut self, key: Option<&str>, len: Option<usize>, fields: Option<&[&str]>) {
        write_array_header_into(&mut self.out, key, len, fields, self.delimiter);
    }
}

pub(crate) fn write_array_header_into(
    out: &mut String,
    key: Option<&str>,
    len: Option<usize>,
    fields: Option<&[&str]>,
    delimiter: Delimiter,
) {
    if let Some(key) = key {
        write_key_into(out, key);
    }
    out.push('[');
    match len {
        Some(len) => {
            let mut buf = itoa::Buffer::new();
            out.push_str(buf.format(len as u64));
        }
        None => out.push('*'),
    }
    out.push_str(delimiter.as_header_marker());
    out.push(']');

    if let Some(fields) = fields {
        out.push('{');
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                out.push(delimiter.as_char());
            }
            write_key_into(out, field);
        }
        out.push('}');
    }
    out.push(':');
}

pub(crate) fn write_key_into(out: &mut String, key: &str) {
    if is_unquoted_key(key) {
        out.push_str(key);
    } else {
        out.push('"');
        escape_string_into(out, key);
        out.push('"');
    }
}

pub(crate) fn write_primitive_into(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Number(n) => write_number_into(n, out),
        Value::String(s) => {
            if needs_quoting(s) {
                out.push('"');
                escape_string_into(out, s);
                out.push('"');
            } else {
                out.push_str(s);
            }
        }
        Value::Array(_) | Value::Object(_) => {
            unreachable!("write_primitive_into called with a container")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Indent;
    use crate::value::Number;

    #[rstest::rstest]
    fn test_indent_cache() {
        let mut writer = Writer::new(&EncodeOptions::default());
        writer.push_str("a");
        writer.newline();
        writer.indent(1);
        writer.push_str("b");
        writer.newline();
        writer.indent(2);
        writer.push_str("c");
        assert_eq!(writer.finish(), "a\n  b\n    c");
    }

    #[rstest::rstest]
    fn test_compact_indent() {
        let options = EncodeOptions::new().with_indent(Indent::spaces(0));
        let mut writer = Writer::new(&options);
        writer.indent(3);
        writer.push_str("x");
        assert_eq!(writer.finish(), "x");
    }

    #[rstest::rstest]
    fn test_array_headers() {
        let mut writer = Writer::new(&EncodeOptions::default());
        writer.write_array_header(Some("items"), Some(3), None);
        assert_eq!(writer.finish(), "items[3]:");

        let mut writer = Writer::new(&EncodeOptions::default());
        writer.write_array_header(Some("users"), Some(2), Some(&["id", "name"]));
        assert_eq!(writer.finish(), "users[2]{id,name}:");

        let mut writer = Writer::new(&EncodeOptions::default());
        writer.write_array_header(None, None, None);
        assert_eq!(writer.finish(), "[*]:");
    }

    #[rstest::rstest]
    fn test_array_header_with_pipe_delimiter() {
        let options = EncodeOptions::new().with_delimiter(Delimiter::Pipe);
        let mut writer = Writer::new(&options);
        writer.write_array_header(Some("users"), Some(2), Some(&["id", "name"]));
        assert_eq!(writer.finish(), "users[2|]{id|name}:");
    }

    #[rstest::rstest]
    fn test_write_key_quotes_when_needed() {
        let mut writer = Writer::new(&EncodeOptions::default());
        writer.write_key("plain_key");
        assert_eq!(writer.finish(), "plain_key");

        let mut writer = Writer::new(&EncodeOptions::default());
        writer.write_key("key:colon");
        assert_eq!(writer.finish(), "\"key:colon\"");
    }

    #[rstest::rstest]
    fn test_write_primitive() {
        let mut out = String::new();
        write_primitive_into(&mut out, &Value::Null);
        out.push(' ');
        write_primitive_into(&mut out, &Value::Bool(true));
        out.push(' ');
        write_primitive_into(&mut out, &Value::Number(Number::Float(2.5)));
        out.push(' ');
        write_primitive_into(&mut out, &Value::String("plain".to_string()));
        out.push(' ');
        write_primitive_into(&mut out, &Value::String("needs quoting,".to_string()));
        assert_eq!(out, "null true 2.5 plain \"needs quoting,\"");
    }
}
