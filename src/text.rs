//! String quoting analysis and escaping, shared by the encoder and the
//! streaming encoder. The decoder's bare-token reading is the exact
//! inverse of `needs_quoting`; the two are tested together.

use crate::constants::{is_keyword, COMMENT_MARKER};
use crate::num::is_numeric_like;

/// Decide whether a string must be wrapped in double quotes.
///
/// Quoting is forced when the bare token would be read back as something
/// other than the original string: reserved literals, numeric lookalikes,
/// strings that collide with structure (`: , | [ ] { }`), the list marker
/// or comment marker in leading position, surrounding whitespace, and
/// anything requiring an escape sequence.
pub(crate) fn needs_quoting(s: &str) -> bool {
    if s.is_empty() {
        return true;
    }
    if is_keyword(s) || is_numeric_like(s) {
        return true;
    }

    let mut chars = s.chars();
    let first = match chars.next() {
        Some(ch) => ch,
        None => return true,
    };
    if first.is_whitespace() || first == '-' || first == COMMENT_MARKER {
        return true;
    }

    let mut last = first;
    for ch in std::iter::once(first).chain(chars) {
        if matches!(
            ch,
            ':' | ',' | '|' | '[' | ']' | '{' | '}' | '"' | '\\' | '\n' | '\r' | '\t'
        ) {
            return true;
        }
        last = ch;
    }

    last.is_whitespace()
}

/// Append `value` to `out` with the five escape sequences applied.
pub(crate) fn escape_string_into(out: &mut String, value: &str) {
    let bytes = value.as_bytes();
    let mut start = 0;
    for (idx, byte) in bytes.iter().enumerate() {
        let escaped = match byte {
            b'\n' => "\\n",
            b'\r' => "\\r",
            b'\t' => "\\t",
            b'"' => "\\\"",
            b'\\' => "\\\\",
            _ => continue,
        };
        if start < idx {
            out.push_str(&value[start..idx]);
        }
        out.push_str(escaped);
        start = idx + 1;
    }
    if start < value.len() {
        out.push_str(&value[start..]);
    }
}

/// Keys written without quotes: leading letter or underscore, then
/// letters, digits, underscores and dots.
pub(crate) fn is_unquoted_key(key: &str) -> bool {
    let bytes = key.as_bytes();
    if bytes.is_empty() {
        return false;
    }
    let first = bytes[0];
    if !first.is_ascii_alphabetic() && first != b'_' {
        return false;
    }
    bytes[1..]
        .iter()
        .all(|b| b.is_ascii_alphanumeric() || *b == b'_' || *b == b'.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    fn test_needs_quoting_literals_and_numbers() {
        assert!(needs_quoting(""));
        assert!(needs_quoting("true"));
        assert!(needs_quoting("false"));
        assert!(needs_quoting("null"));
        assert!(needs_quoting("123"));
        assert!(needs_quoting("-1.5"));
        assert!(needs_quoting("1e5"));
        assert!(!needs_quoting("truthy"));
        assert!(!needs_quoting("NaN"));
    }

    #[rstest::rstest]
    fn test_needs_quoting_structure() {
        assert!(needs_quoting("a:b"));
        assert!(needs_quoting("a,b"));
        assert!(needs_quoting("a|b"));
        assert!(needs_quoting("a[b]"));
        assert!(needs_quoting("a{b}"));
        assert!(needs_quoting("say \"hi\""));
        assert!(needs_quoting("back\\slash"));
        assert!(needs_quoting("line\nbreak"));
        assert!(needs_quoting("tab\there"));
    }

    #[rstest::rstest]
    fn test_needs_quoting_leading_markers() {
        assert!(needs_quoting("-dash"));
        assert!(needs_quoting("- item"));
        assert!(needs_quoting("#comment"));
        assert!(!needs_quoting("a-b"));
        assert!(!needs_quoting("a#b"));
    }

    #[rstest::rstest]
    fn test_needs_quoting_whitespace() {
        assert!(needs_quoting(" leading"));
        assert!(needs_quoting("trailing "));
        assert!(needs_quoting(" "));
        assert!(!needs_quoting("hello world"));
    }

    #[rstest::rstest]
    fn test_escape_string() {
        let mut out = String::new();
        escape_string_into(&mut out, "hello");
        assert_eq!(out, "hello");

        let mut out = String::new();
        escape_string_into(&mut out, "a\nb\tc\rd\"e\\f");
        assert_eq!(out, "a\\nb\\tc\\rd\\\"e\\\\f");
    }

    #[rstest::rstest]
    fn test_is_unquoted_key() {
        assert!(is_unquoted_key("user_name"));
        assert!(is_unquoted_key("key123"));
        assert!(is_unquoted_key("key.path"));
        assert!(is_unquoted_key("_private"));
        assert!(!is_unquoted_key(""));
        assert!(!is_unquoted_key("123"));
        assert!(!is_unquoted_key("key-dash"));
        assert!(!is_unquoted_key("key value"));
        assert!(!is_unquoted_key("key:value"));
    }
}
