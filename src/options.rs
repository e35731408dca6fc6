//! Configuration passed by reference into every codec entry point.
//!
//! There is no process-wide mutable state: callers build an options value
//! once and hand it to `encode`/`decode` and the streaming variants.

use crate::constants::{DEFAULT_INDENT, DEFAULT_PARALLELISM_THRESHOLD};

/// Delimiter used between inline-array values and tabular row cells.
///
/// # Examples
/// ```
/// use toon_codec::Delimiter;
///
/// assert_eq!(Delimiter::Pipe.as_char(), '|');
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Delimiter {
    #[default]
    Comma,
    Tab,
    Pipe,
}

impl Delimiter {
    pub fn as_char(self) -> char {
        match self {
            Delimiter::Comma => ',',
            Delimiter::Tab => '\t',
            Delimiter::Pipe => '|',
        }
    }

    /// Marker written inside the array header brackets. Comma is the
    /// default and stays implicit.
    pub fn as_header_marker(self) -> &'static str {
        match self {
            Delimiter::Comma => "",
            Delimiter::Tab => "\t",
            Delimiter::Pipe => "|",
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            ',' => Some(Delimiter::Comma),
            '\t' => Some(Delimiter::Tab),
            '|' => Some(Delimiter::Pipe),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indent {
    Spaces(usize),
}

impl Indent {
    pub fn spaces(count: usize) -> Self {
        Indent::Spaces(count)
    }

    pub fn get_spaces(self) -> usize {
        let Indent::Spaces(count) = self;
        count
    }
}

impl Default for Indent {
    fn default() -> Self {
        Indent::Spaces(DEFAULT_INDENT)
    }
}

/// Encoder configuration.
///
/// `Indent::Spaces(0)` produces compact output. `sort_keys` sorts object
/// keys at every depth for byte-for-byte reproducible output.
#[derive(Debug, Clone)]
pub struct EncodeOptions {
    pub indent: Indent,
    pub delimiter: Delimiter,
    pub sort_keys: bool,
    pub parallelism_threshold: usize,
}

impl EncodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_indent(mut self, indent: Indent) -> Self {
        self.indent = indent;
        self
    }

    pub fn with_delimiter(mut self, delimiter: Delimiter) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_sort_keys(mut self, sort_keys: bool) -> Self {
        self.sort_keys = sort_keys;
        self
    }

    pub fn with_parallelism_threshold(mut self, threshold: usize) -> Self {
        self.parallelism_threshold = threshold;
        self
    }
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            indent: Indent::default(),
            delimiter: Delimiter::default(),
            sort_keys: false,
            parallelism_threshold: DEFAULT_PARALLELISM_THRESHOLD,
        }
    }
}

/// Decoder configuration.
///
/// `strict` turns cardinality mismatches (array length headers, tabular
/// row widths) into errors; lenient mode pads missing trailing values with
/// null and discards extras. `type_inference` controls whether bare
/// scalars are read as numbers/booleans/null; with it off every unquoted
/// scalar decodes as a string.
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    pub indent: Indent,
    pub strict: bool,
    pub type_inference: bool,
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_indent(mut self, indent: Indent) -> Self {
        self.indent = indent;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_type_inference(mut self, type_inference: bool) -> Self {
        self.type_inference = type_inference;
        self
    }
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            indent: Indent::default(),
            strict: true,
            type_inference: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    fn test_delimiter_chars() {
        assert_eq!(Delimiter::Comma.as_char(), ',');
        assert_eq!(Delimiter::Tab.as_char(), '\t');
        assert_eq!(Delimiter::Pipe.as_char(), '|');
    }

    #[rstest::rstest]
    fn test_delimiter_header_marker() {
        assert_eq!(Delimiter::Comma.as_header_marker(), "");
        assert_eq!(Delimiter::Tab.as_header_marker(), "\t");
        assert_eq!(Delimiter::Pipe.as_header_marker(), "|");
    }

    #[rstest::rstest]
    fn test_delimiter_from_char() {
        assert_eq!(Delimiter::from_char(','), Some(Delimiter::Comma));
        assert_eq!(Delimiter::from_char('\t'), Some(Delimiter::Tab));
        assert_eq!(Delimiter::from_char('|'), Some(Delimiter::Pipe));
        assert_eq!(Delimiter::from_char(';'), None);
    }

    #[rstest::rstest]
    fn test_defaults() {
        let encode = EncodeOptions::default();
        assert_eq!(encode.indent.get_spaces(), 2);
        assert_eq!(encode.delimiter, Delimiter::Comma);
        assert!(!encode.sort_keys);
        assert_eq!(encode.parallelism_threshold, 1000);

        let decode = DecodeOptions::default();
        assert!(decode.strict);
        assert!(decode.type_inference);
    }

    #[rstest::rstest]
    fn test_builders() {
        let options = EncodeOptions::new()
            .with_indent(Indent::spaces(4))
            .with_delimiter(Delimiter::Pipe)
            .with_sort_keys(true)
            .with_parallelism_threshold(16);
        assert_eq!(options.indent.get_spaces(), 4);
        assert_eq!(options.delimiter, Delimiter::Pipe);
        assert!(options.sort_keys);
        assert_eq!(options.parallelism_threshold, 16);

        let options = DecodeOptions::new()
            .with_strict(false)
            .with_type_inference(false);
        assert!(!options.strict);
        assert!(!options.type_inference);
    }
}
