//! Tokenization of line-oriented input.
//!
//! A line is scanned into structural tokens plus scalar tokens; the
//! caller-facing lexers ([`tokenize`] for whole documents,
//! [`stream::StreamLexer`] for incremental sources) drive the same
//! per-line scanner and add the indentation bookkeeping: one
//! `Indent`/`Dedent` token per level gained or lost, dedents back to
//! level zero at end of input, then `Eof`.

pub mod stream;

use smol_str::SmolStr;

use crate::constants::is_structural_byte;
use crate::error::{Error, Result};
use crate::num::parse_number;
use crate::options::DecodeOptions;
use crate::value::Number;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Indent,
    Dedent,
    Newline,
    Eof,
    Colon,
    Comma,
    Pipe,
    Dash,
    Star,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    /// Unquoted scalar run, trimmed. Produced for everything bare when
    /// type inference is off.
    Word(SmolStr),
    /// Content of a double-quoted string, escapes resolved.
    Quoted(SmolStr),
    Number(Number),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub level: usize,
}

impl Token {
    fn new(kind: TokenKind, line: usize, level: usize) -> Self {
        Self { kind, line, level }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct LexerConfig {
    pub indent_size: usize,
    pub infer_types: bool,
    pub strict: bool,
}

impl From<&DecodeOptions> for LexerConfig {
    fn from(options: &DecodeOptions) -> Self {
        Self {
            indent_size: options.indent.get_spaces().max(1),
            infer_types: options.type_inference,
            strict: options.strict,
        }
    }
}

/// Tokenize a whole document. Lines are 1-based in reported positions.
pub(crate) fn tokenize(input: &str, config: &LexerConfig) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut level = 0usize;
    let mut last_line = 0usize;
    for (idx, raw) in input.split('\n').enumerate() {
        last_line = idx + 1;
        process_line(raw, last_line, &mut level, config, &mut tokens)?;
    }
    finish(last_line, &mut level, &mut tokens);
    Ok(tokens)
}

/// Append indentation tokens, line tokens and a trailing `Newline` for one
/// raw input line. Blank and comment-only lines contribute nothing and do
/// not disturb the indentation state.
pub(crate) fn process_line(
    raw: &str,
    line_no: usize,
    level: &mut usize,
    config: &LexerConfig,
    out: &mut Vec<Token>,
) -> Result<()> {
    let line = raw.strip_suffix('\n').unwrap_or(raw);
    let line = line.strip_suffix('\r').unwrap_or(line);

    let bytes = line.as_bytes();
    let mut columns = 0usize;
    let mut chars = 0usize;
    for &byte in bytes {
        match byte {
            b' ' => {
                columns += 1;
                chars += 1;
            }
            b'\t' => {
                if config.strict {
                    return Err(Error::syntax(line_no, "tabs are not allowed in indentation"));
                }
                columns += config.indent_size;
                chars += 1;
            }
            _ => break,
        }
    }

    let content = &line[chars..];
    if content.trim().is_empty() || content.starts_with('#') {
        return Ok(());
    }

    if config.strict && columns % config.indent_size != 0 {
        return Err(Error::syntax(
            line_no,
            format!("indentation of {columns} spaces is not a multiple of {}", config.indent_size),
        ));
    }
    let new_level = columns / config.indent_size;

    while *level < new_level {
        *level += 1;
        out.push(Token::new(TokenKind::Indent, line_no, *level));
    }
    while *level > new_level {
        *level -= 1;
        out.push(Token::new(TokenKind::Dedent, line_no, *level));
    }

    scan_line(content, line_no, *level, config, out)?;
    out.push(Token::new(TokenKind::Newline, line_no, *level));
    Ok(())
}

/// Emit closing dedents and `Eof` once the source is exhausted.
pub(crate) fn finish(line_no: usize, level: &mut usize, out: &mut Vec<Token>) {
    while *level > 0 {
        *level -= 1;
        out.push(Token::new(TokenKind::Dedent, line_no, *level));
    }
    out.push(Token::new(TokenKind::Eof, line_no, 0));
}

fn scan_line(
    content: &str,
    line_no: usize,
    level: usize,
    config: &LexerConfig,
    out: &mut Vec<Token>,
) -> Result<()> {
    let bytes = content.as_bytes();
    let mut i = 0usize;

    while i < bytes.len() {
        let byte = bytes[i];
        let kind = match byte {
            b' ' | b'\t' => {
                // Tabs separate tokens so tab-delimited rows lex without
                // knowing the active delimiter.
                i += 1;
                continue;
            }
            b':' => {
                i += 1;
                TokenKind::Colon
            }
            b',' => {
                i += 1;
                TokenKind::Comma
            }
            b'|' => {
                i += 1;
                TokenKind::Pipe
            }
            b'[' => {
                i += 1;
                TokenKind::LeftBracket
            }
            b']' => {
                i += 1;
                TokenKind::RightBracket
            }
            b'{' => {
                i += 1;
                TokenKind::LeftBrace
            }
            b'}' => {
                i += 1;
                TokenKind::RightBrace
            }
            b'*' if bytes.get(i + 1) == Some(&b']') => {
                i += 1;
                TokenKind::Star
            }
            b'#' => break,
            b'-' if i + 1 >= bytes.len() || bytes[i + 1] == b' ' => {
                // List marker: bare `-` normalizes to `- `.
                i += 2.min(bytes.len() - i);
                TokenKind::Dash
            }
            b'"' => {
                let (kind, next) = scan_quoted(content, i, line_no)?;
                i = next;
                kind
            }
            _ => {
                let (kind, next) = scan_word(content, i, config);
                i = next;
                kind
            }
        };
        out.push(Token::new(kind, line_no, level));
    }
    Ok(())
}

fn scan_quoted(content: &str, start: usize, line_no: usize) -> Result<(TokenKind, usize)> {
    let bytes = content.as_bytes();
    let mut value = String::new();
    let mut i = start + 1;

    loop {
        // Unescaped spans are copied in bulk; only `\` and `"` need a
        // byte-by-byte look.
        let offset = match memchr::memchr2(b'\\', b'"', &bytes[i..]) {
            Some(offset) => offset,
            None => return Err(Error::syntax(line_no, "unterminated quoted string")),
        };
        value.push_str(&content[i..i + offset]);
        i += offset;

        if bytes[i] == b'"' {
            return Ok((TokenKind::Quoted(SmolStr::from(value)), i + 1));
        }
        match bytes.get(i + 1) {
            Some(b'n') => value.push('\n'),
            Some(b'r') => value.push('\r'),
            Some(b't') => value.push('\t'),
            Some(b'"') => value.push('"'),
            Some(b'\\') => value.push('\\'),
            Some(_) => {
                let bad = content[i + 1..].chars().next().unwrap_or('?');
                return Err(Error::syntax(
                    line_no,
                    format!("invalid escape sequence '\\{bad}'"),
                ));
            }
            None => return Err(Error::syntax(line_no, "unterminated escape sequence")),
        }
        i += 2;
    }
}

fn scan_word(content: &str, start: usize, config: &LexerConfig) -> (TokenKind, usize) {
    let bytes = content.as_bytes();
    let mut i = start;
    while i < bytes.len() && !is_structural_byte(bytes[i]) {
        i += 1;
    }
    // Trailing spaces before a delimiter or end of line belong to the
    // layout, not the value; strings that really end in whitespace arrive
    // quoted.
    let word = content[start..i].trim_end_matches(' ');

    let kind = if config.infer_types {
        classify_word(word)
    } else {
        TokenKind::Word(SmolStr::from(word))
    };
    (kind, i)
}

fn classify_word(word: &str) -> TokenKind {
    match word {
        "true" => return TokenKind::Bool(true),
        "false" => return TokenKind::Bool(false),
        "null" => return TokenKind::Null,
        _ => {}
    }
    match parse_number(word) {
        Some(number) => TokenKind::Number(number),
        None => TokenKind::Word(SmolStr::from(word)),
    }
}
