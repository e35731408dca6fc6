//! Materializing decoder: recursive descent over the token stream,
//! producing a complete [`Value`] in one pass.
//!
//! The root form is classified from the leading tokens before recursing:
//! an array header, an implicit dash list, an object, or a single
//! primitive. Cardinality declarations (array length headers, tabular row
//! widths) are enforced in strict mode and repaired in lenient mode.

pub mod events;
pub mod items;

use std::io::Read;

use serde::de::DeserializeOwned;
use smallvec::SmallVec;
use smol_str::SmolStr;

use crate::error::{Error, Result};
use crate::lexer::{self, LexerConfig, Token, TokenKind};
use crate::options::DecodeOptions;
use crate::value::{Object, Value};

/// Decode a document into a value tree. An empty document decodes to an
/// empty object.
pub fn decode(input: &str, options: &DecodeOptions) -> Result<Value> {
    if input.trim().is_empty() {
        return Ok(Value::Object(Object::new()));
    }
    let config = LexerConfig::from(options);
    let tokens = lexer::tokenize(input, &config)?;
    Parser::new(&tokens, options).parse_document()
}

pub fn from_str<T: DeserializeOwned>(input: &str, options: &DecodeOptions) -> Result<T> {
    let value = decode(input, options)?;
    let json: serde_json::Value = value.into();
    serde_json::from_value(json)
        .map_err(|err| Error::validation(format!("deserialize failed: {err}")))
}

pub fn from_slice<T: DeserializeOwned>(input: &[u8], options: &DecodeOptions) -> Result<T> {
    let text = std::str::from_utf8(input)
        .map_err(|err| Error::io(format!("invalid utf-8: {err}")))?;
    from_str(text, options)
}

pub fn from_reader<T: DeserializeOwned, R: Read>(
    mut reader: R,
    options: &DecodeOptions,
) -> Result<T> {
    let mut buf = String::new();
    reader
        .read_to_string(&mut buf)
        .map_err(|err| Error::io(format!("read failed: {err}")))?;
    from_str(&buf, options)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArrayForm {
    Inline,
    Tabular,
    List,
}

#[derive(Debug)]
struct ArrayHeader {
    /// `None` for the `[*]` indefinite marker.
    len: Option<usize>,
    fields: Option<SmallVec<[SmolStr; 8]>>,
    form: ArrayForm,
}

struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    strict: bool,
}

impl<'t> Parser<'t> {
    fn new(tokens: &'t [Token], options: &DecodeOptions) -> Self {
        Self {
            tokens,
            pos: 0,
            strict: options.strict,
        }
    }

    fn peek(&self) -> &'t Token {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> &'t Token {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    fn advance(&mut self) -> &'t Token {
        let token = &self.tokens[self.pos.min(self.tokens.len() - 1)];
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn line(&self) -> usize {
        self.peek().line
    }

    fn skip_newlines(&mut self) {
        while matches!(self.peek().kind, TokenKind::Newline) {
            self.advance();
        }
    }

    fn parse_document(&mut self) -> Result<Value> {
        self.skip_newlines();
        if matches!(self.peek().kind, TokenKind::Indent) {
            if self.strict {
                return Err(Error::syntax(self.line(), "unexpected indentation"));
            }
            while matches!(self.peek().kind, TokenKind::Indent) {
                self.advance();
            }
        }

        let value = match &self.peek().kind {
            TokenKind::Eof => return Ok(Value::Object(Object::new())),
            TokenKind::LeftBracket => {
                let header = self.parse_array_header()?;
                self.parse_array_body(&header)?
            }
            TokenKind::Dash => Value::Array(self.parse_list_items(None)?),
            TokenKind::Word(_) | TokenKind::Quoted(_)
                if matches!(
                    self.peek_at(1).kind,
                    TokenKind::Colon | TokenKind::LeftBracket
                ) =>
            {
                return self.parse_root_object();
            }
            _ => {
                let token = self.advance();
                self.token_to_value(token)?
            }
        };

        self.ensure_no_trailing_content()?;
        Ok(value)
    }

    fn ensure_no_trailing_content(&mut self) -> Result<()> {
        loop {
            match self.peek().kind {
                TokenKind::Newline | TokenKind::Dedent => {
                    self.advance();
                }
                TokenKind::Eof => return Ok(()),
                _ => {
                    if self.strict {
                        return Err(Error::syntax(self.line(), "unexpected trailing content"));
                    }
                    return Ok(());
                }
            }
        }
    }

    fn parse_root_object(&mut self) -> Result<Value> {
        let mut result = Object::new();
        loop {
            match &self.peek().kind {
                TokenKind::Eof => break,
                // Stray dedents cannot go below the base level.
                TokenKind::Newline | TokenKind::Dedent => {
                    self.advance();
                }
                TokenKind::Word(_) | TokenKind::Quoted(_) => {
                    self.parse_key_value(&mut result)?;
                }
                other => {
                    return Err(Error::syntax(
                        self.line(),
                        format!("expected key, found {}", describe(other)),
                    ));
                }
            }
        }
        Ok(Value::Object(result))
    }

    fn parse_key_value(&mut self, result: &mut Object) -> Result<()> {
        let key = match &self.advance().kind {
            TokenKind::Word(w) => w.to_string(),
            TokenKind::Quoted(q) => q.to_string(),
            other => {
                return Err(Error::syntax(
                    self.line(),
                    format!("expected key, found {}", describe(other)),
                ));
            }
        };

        let value = match &self.peek().kind {
            TokenKind::LeftBracket => {
                let header = self.parse_array_header()?;
                self.parse_array_body(&header)?
            }
            TokenKind::Colon => {
                self.advance();
                self.parse_value_after_colon()?
            }
            _ => {
                return Err(Error::syntax(
                    self.line(),
                    format!("expected ':' after key '{key}'"),
                ));
            }
        };

        result.insert(key, value);
        Ok(())
    }

    fn parse_value_after_colon(&mut self) -> Result<Value> {
        match &self.peek().kind {
            TokenKind::Newline => {
                if matches!(self.peek_at(1).kind, TokenKind::Indent) {
                    self.advance();
                    // A dash-absorbed first field can sit more than one
                    // level above its own nested block, so consume every
                    // indent that opens this value.
                    while matches!(self.peek().kind, TokenKind::Indent) {
                        self.advance();
                    }
                    self.parse_block()
                } else {
                    // `key:` with nothing below is an empty object.
                    Ok(Value::Object(Object::new()))
                }
            }
            TokenKind::Eof | TokenKind::Dedent => Ok(Value::Object(Object::new())),
            _ => {
                let token = self.advance();
                self.token_to_value(token)
            }
        }
    }

    /// Indented block under a key: an object, or a dash list without an
    /// explicit header. Consumes the dedent that closes the block.
    fn parse_block(&mut self) -> Result<Value> {
        if matches!(self.peek().kind, TokenKind::Dash) {
            let items = self.parse_dash_items_until_dedent()?;
            return Ok(Value::Array(items));
        }

        let mut result = Object::new();
        loop {
            match &self.peek().kind {
                TokenKind::Dedent => {
                    self.advance();
                    break;
                }
                TokenKind::Eof => break,
                TokenKind::Newline => {
                    self.advance();
                }
                TokenKind::Word(_) | TokenKind::Quoted(_) => {
                    self.parse_key_value(&mut result)?;
                }
                other => {
                    return Err(Error::syntax(
                        self.line(),
                        format!("expected key, found {}", describe(other)),
                    ));
                }
            }
        }
        Ok(Value::Object(result))
    }

    fn parse_dash_items_until_dedent(&mut self) -> Result<Vec<Value>> {
        let mut items = Vec::new();
        loop {
            match self.peek().kind {
                TokenKind::Dedent => {
                    self.advance();
                    break;
                }
                TokenKind::Eof => break,
                TokenKind::Newline => {
                    self.advance();
                }
                TokenKind::Dash => {
                    let dash_level = self.advance().level;
                    items.push(self.parse_value_after_dash(dash_level)?);
                }
                _ => break,
            }
        }
        Ok(items)
    }

    fn parse_value_after_dash(&mut self, dash_level: usize) -> Result<Value> {
        match &self.peek().kind {
            TokenKind::LeftBracket => {
                let header = self.parse_array_header()?;
                self.parse_array_body(&header)
            }
            TokenKind::Word(_) | TokenKind::Quoted(_)
                if matches!(
                    self.peek_at(1).kind,
                    TokenKind::Colon | TokenKind::LeftBracket
                ) =>
            {
                self.parse_absorbed_object(dash_level)
            }
            TokenKind::Newline | TokenKind::Eof => {
                // Bare dash: fields may follow one level deeper, otherwise
                // the item is an empty object.
                if matches!(self.peek().kind, TokenKind::Newline)
                    && matches!(self.peek_at(1).kind, TokenKind::Indent)
                {
                    self.advance();
                    while matches!(self.peek().kind, TokenKind::Indent) {
                        self.advance();
                    }
                    self.parse_block()
                } else {
                    Ok(Value::Object(Object::new()))
                }
            }
            TokenKind::Dash => Err(Error::syntax(
                self.line(),
                "nested list items must declare an array header",
            )),
            _ => {
                let token = self.advance();
                self.token_to_value(token)
            }
        }
    }

    /// Object absorbed into a dash line: first field on the dash line,
    /// remaining fields one level deeper than the dash.
    fn parse_absorbed_object(&mut self, dash_level: usize) -> Result<Value> {
        let mut result = Object::new();
        self.parse_key_value(&mut result)?;

        loop {
            match &self.peek().kind {
                TokenKind::Newline | TokenKind::Indent => {
                    self.advance();
                }
                TokenKind::Dedent => {
                    // A dedent back to the dash line's level closes this
                    // item; anything shallower belongs to the enclosing
                    // list and stays in the stream.
                    let level = self.peek().level;
                    if level > dash_level {
                        self.advance();
                    } else if level == dash_level {
                        self.advance();
                        break;
                    } else {
                        break;
                    }
                }
                TokenKind::Word(_) | TokenKind::Quoted(_) => {
                    self.parse_key_value(&mut result)?;
                }
                _ => break,
            }
        }
        Ok(Value::Object(result))
    }

    fn parse_array_header(&mut self) -> Result<ArrayHeader> {
        let line = self.line();
        match self.advance().kind {
            TokenKind::LeftBracket => {}
            _ => return Err(Error::syntax(line, "expected '[' for array header")),
        }

        let len = match &self.peek().kind {
            TokenKind::Number(n) => match n.as_u64() {
                Some(u) if !n.is_float() => {
                    self.advance();
                    Some(u as usize)
                }
                _ => {
                    return Err(Error::syntax(
                        self.line(),
                        "expected array length or '*'",
                    ))
                }
            },
            TokenKind::Word(w) => match w.parse::<usize>() {
                Ok(u) => {
                    self.advance();
                    Some(u)
                }
                Err(_) => {
                    return Err(Error::syntax(
                        self.line(),
                        "expected array length or '*'",
                    ))
                }
            },
            TokenKind::Star => {
                self.advance();
                None
            }
            _ => {
                return Err(Error::syntax(
                    self.line(),
                    "expected array length or '*'",
                ))
            }
        };

        // Optional delimiter marker inside the brackets (`[3|]`). Rows are
        // lexed delimiter-agnostically, so the marker needs no dispatch.
        if matches!(self.peek().kind, TokenKind::Pipe) {
            self.advance();
        }

        if !matches!(self.peek().kind, TokenKind::RightBracket) {
            return Err(Error::syntax(self.line(), "expected ']' in array header"));
        }
        self.advance();

        let mut fields: Option<SmallVec<[SmolStr; 8]>> = None;
        if matches!(self.peek().kind, TokenKind::LeftBrace) {
            self.advance();
            let mut list: SmallVec<[SmolStr; 8]> = SmallVec::new();
            loop {
                match &self.peek().kind {
                    TokenKind::RightBrace => {
                        self.advance();
                        break;
                    }
                    TokenKind::Word(w) => {
                        list.push(w.clone());
                        self.advance();
                    }
                    TokenKind::Quoted(q) => {
                        list.push(q.clone());
                        self.advance();
                    }
                    TokenKind::Comma | TokenKind::Pipe => {
                        self.advance();
                    }
                    TokenKind::Newline | TokenKind::Eof => {
                        return Err(Error::syntax(
                            self.line(),
                            "unterminated field list in array header",
                        ));
                    }
                    other => {
                        return Err(Error::syntax(
                            self.line(),
                            format!("expected field name, found {}", describe(other)),
                        ));
                    }
                }
            }
            if list.is_empty() {
                return Err(Error::syntax(
                    self.line(),
                    "tabular array must declare at least one field",
                ));
            }
            fields = Some(list);
        }

        if !matches!(self.peek().kind, TokenKind::Colon) {
            return Err(Error::syntax(self.line(), "expected ':' after array header"));
        }
        self.advance();

        let form = if fields.is_some() {
            ArrayForm::Tabular
        } else if !matches!(self.peek().kind, TokenKind::Newline | TokenKind::Eof) {
            ArrayForm::Inline
        } else {
            ArrayForm::List
        };

        Ok(ArrayHeader { len, fields, form })
    }

    fn parse_array_body(&mut self, header: &ArrayHeader) -> Result<Value> {
        let len = match header.len {
            Some(len) => len,
            None => {
                return Err(Error::syntax(
                    self.line(),
                    "indefinite-length array requires the streaming decoder",
                ));
            }
        };
        match header.form {
            ArrayForm::Inline => self.parse_inline_array(len),
            ArrayForm::Tabular => {
                let fields = header.fields.as_ref().expect("tabular header has fields");
                self.parse_tabular_array(len, fields)
            }
            ArrayForm::List => Ok(Value::Array(self.parse_list_items(Some(len))?)),
        }
    }

    fn parse_inline_array(&mut self, len: usize) -> Result<Value> {
        let mut values = Vec::with_capacity(len);
        loop {
            match &self.peek().kind {
                TokenKind::Newline | TokenKind::Eof => break,
                TokenKind::Comma | TokenKind::Pipe => {
                    self.advance();
                }
                TokenKind::Dash => {
                    return Err(Error::syntax(self.line(), "unexpected '-' in inline array"));
                }
                _ => {
                    let token = self.advance();
                    values.push(self.token_to_value(token)?);
                }
            }
        }

        if values.len() != len {
            if self.strict {
                return Err(Error::validation(format!(
                    "array length mismatch: declared {len}, got {}",
                    values.len()
                )));
            }
            // Lenient repair: missing trailing values become null, extras
            // are dropped.
            values.resize(len, Value::Null);
        }
        Ok(Value::Array(values))
    }

    fn parse_tabular_array(&mut self, len: usize, fields: &[SmolStr]) -> Result<Value> {
        if !matches!(self.peek().kind, TokenKind::Newline | TokenKind::Eof) {
            return Err(Error::syntax(
                self.line(),
                "expected newline after tabular header",
            ));
        }
        self.skip_newlines();

        // Rows under a dash-absorbed header can open more than one level
        // at once; the block still closes on its first dedent.
        let mut entered = false;
        while matches!(self.peek().kind, TokenKind::Indent) {
            entered = true;
            self.advance();
        }

        let mut rows = Vec::with_capacity(len);
        loop {
            match self.peek().kind {
                TokenKind::Newline => {
                    self.advance();
                    continue;
                }
                TokenKind::Dedent => {
                    if entered {
                        self.advance();
                    }
                    break;
                }
                TokenKind::Eof => break,
                _ => {}
            }

            let mut cells: Vec<Value> = Vec::with_capacity(fields.len());
            loop {
                match &self.peek().kind {
                    TokenKind::Newline | TokenKind::Dedent | TokenKind::Eof => break,
                    TokenKind::Comma | TokenKind::Pipe => {
                        self.advance();
                    }
                    _ => {
                        let token = self.advance();
                        cells.push(self.token_to_value(token)?);
                    }
                }
            }

            if cells.len() != fields.len() && self.strict {
                return Err(Error::validation(format!(
                    "row width mismatch: declared {} fields, got {} values",
                    fields.len(),
                    cells.len()
                )));
            }

            let mut row = Object::with_capacity(fields.len());
            let mut cells = cells.into_iter();
            for field in fields {
                row.insert(field.to_string(), cells.next().unwrap_or(Value::Null));
            }
            rows.push(Value::Object(row));
        }

        if rows.len() != len {
            if self.strict {
                return Err(Error::validation(format!(
                    "array length mismatch: declared {len}, got {}",
                    rows.len()
                )));
            }
            rows.truncate(len);
        }
        Ok(Value::Array(rows))
    }

    fn parse_list_items(&mut self, len: Option<usize>) -> Result<Vec<Value>> {
        self.skip_newlines();

        let mut entered = false;
        let mut items = Vec::new();
        loop {
            match self.peek().kind {
                TokenKind::Newline => {
                    self.advance();
                }
                TokenKind::Indent => {
                    entered = true;
                    self.advance();
                }
                TokenKind::Dedent => {
                    if entered {
                        self.advance();
                    }
                    break;
                }
                TokenKind::Eof => break,
                TokenKind::Dash => {
                    let dash_level = self.advance().level;
                    items.push(self.parse_value_after_dash(dash_level)?);
                }
                _ => break,
            }
        }

        // Block-list items are kept as parsed in lenient mode; the
        // pad/drop repair applies to inline values and tabular cells only.
        if let Some(len) = len {
            if self.strict && items.len() != len {
                return Err(Error::validation(format!(
                    "array length mismatch: declared {len}, got {}",
                    items.len()
                )));
            }
        }
        Ok(items)
    }

    fn token_to_value(&self, token: &Token) -> Result<Value> {
        scalar_value(token)
    }
}

/// Convert a scalar token into its value. Shared with the event decoder
/// so both strategies read bare tokens identically.
pub(crate) fn scalar_value(token: &Token) -> Result<Value> {
    match &token.kind {
        TokenKind::Null => Ok(Value::Null),
        TokenKind::Bool(b) => Ok(Value::Bool(*b)),
        TokenKind::Number(n) => Ok(Value::Number(*n)),
        TokenKind::Word(w) => Ok(Value::String(w.to_string())),
        TokenKind::Quoted(q) => Ok(Value::String(q.to_string())),
        other => Err(Error::syntax(
            token.line,
            format!("unexpected {}", describe(other)),
        )),
    }
}

pub(crate) fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Indent => "indent".to_string(),
        TokenKind::Dedent => "dedent".to_string(),
        TokenKind::Newline => "end of line".to_string(),
        TokenKind::Eof => "end of input".to_string(),
        TokenKind::Colon => "':'".to_string(),
        TokenKind::Comma => "','".to_string(),
        TokenKind::Pipe => "'|'".to_string(),
        TokenKind::Dash => "'-'".to_string(),
        TokenKind::Star => "'*'".to_string(),
        TokenKind::LeftBracket => "'['".to_string(),
        TokenKind::RightBracket => "']'".to_string(),
        TokenKind::LeftBrace => "'{'".to_string(),
        TokenKind::RightBrace => "'}'".to_string(),
        TokenKind::Word(w) => format!("'{w}'"),
        TokenKind::Quoted(_) => "quoted string".to_string(),
        TokenKind::Number(n) => format!("number {n}"),
        TokenKind::Bool(b) => format!("'{b}'"),
        TokenKind::Null => "'null'".to_string(),
    }
}
