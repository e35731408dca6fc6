//! Pull-based event decoding.
//!
//! Instead of materializing a tree, the event decoder walks the token
//! stream and yields structural notifications: document, object and array
//! boundaries, keys, and scalar values. Memory stays proportional to the
//! current nesting path (plus one tabular row of lookahead), never to the
//! document, so arbitrarily large top-level arrays can be consumed with
//! bounded memory. Parsing rules match the materializing decoder exactly;
//! only the output channel differs.

use std::collections::VecDeque;

use smallvec::SmallVec;
use smol_str::SmolStr;

use crate::decode::{describe, scalar_value};
use crate::error::{Error, Result};
use crate::lexer::stream::StreamLexer;
use crate::lexer::{LexerConfig, Token, TokenKind};
use crate::options::DecodeOptions;
use crate::value::Value;

/// Declared length of an array: a count from its header, or unknown for
/// the `[*]` indefinite marker and implicit dash lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayLen {
    Known(usize),
    Unknown,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    StartDocument,
    EndDocument,
    StartObject,
    EndObject,
    StartArray(ArrayLen),
    EndArray,
    Key(SmolStr),
    Value(Value),
}

/// Decode a line source into a lazy event sequence.
pub fn decode_events<I>(
    lines: I,
    options: &DecodeOptions,
) -> Events<StreamLexer<I::IntoIter>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let lexer = StreamLexer::new(lines.into_iter(), LexerConfig::from(options));
    Events::new(lexer, options)
}

enum Frame {
    Object {
        root: bool,
    },
    /// Dash-absorbed object; closes on the dedent back to the dash level.
    Absorbed {
        dash_level: usize,
    },
    List {
        declared: Option<usize>,
        seen: usize,
        entered: bool,
    },
    Inline {
        declared: usize,
        seen: usize,
    },
    Tabular {
        fields: SmallVec<[SmolStr; 8]>,
        declared: usize,
        seen: usize,
        entered: bool,
    },
}

pub struct Events<T>
where
    T: Iterator<Item = Result<Token>>,
{
    tokens: T,
    buffer: VecDeque<Token>,
    last_line: usize,
    pending: VecDeque<Event>,
    stack: Vec<Frame>,
    strict: bool,
    started: bool,
    done: bool,
}

impl<T> Events<T>
where
    T: Iterator<Item = Result<Token>>,
{
    pub(crate) fn new(tokens: T, options: &DecodeOptions) -> Self {
        Self {
            tokens,
            buffer: VecDeque::new(),
            last_line: 1,
            pending: VecDeque::new(),
            stack: Vec::new(),
            strict: options.strict,
            started: false,
            done: false,
        }
    }

    fn fill(&mut self, n: usize) -> Result<()> {
        while self.buffer.len() <= n {
            match self.tokens.next() {
                Some(Ok(token)) => {
                    self.last_line = token.line;
                    self.buffer.push_back(token);
                }
                Some(Err(err)) => return Err(err),
                // A well-formed source ends with Eof; synthesize one for
                // exhausted sources so the lookahead never dangles.
                None => self.buffer.push_back(Token {
                    kind: TokenKind::Eof,
                    line: self.last_line,
                    level: 0,
                }),
            }
        }
        Ok(())
    }

    fn peek(&mut self, n: usize) -> Result<Token> {
        self.fill(n)?;
        Ok(self.buffer[n].clone())
    }

    fn advance(&mut self) -> Result<Token> {
        self.fill(0)?;
        Ok(self.buffer.pop_front().expect("buffer filled"))
    }

    fn emit(&mut self, event: Event) {
        self.pending.push_back(event);
    }

    /// Advance the machine until at least one event is pending or the
    /// document is done.
    fn step(&mut self) -> Result<()> {
        if !self.started {
            self.started = true;
            return self.start_document();
        }
        match self.stack.pop() {
            None => self.finish_document(),
            Some(Frame::Object { root }) => self.step_object(root),
            Some(Frame::Absorbed { dash_level }) => self.step_absorbed(dash_level),
            Some(Frame::List {
                declared,
                seen,
                entered,
            }) => self.step_list(declared, seen, entered),
            Some(Frame::Inline { declared, seen }) => self.step_inline(declared, seen),
            Some(Frame::Tabular {
                fields,
                declared,
                seen,
                entered,
            }) => self.step_tabular(fields, declared, seen, entered),
        }
    }

    fn start_document(&mut self) -> Result<()> {
        self.emit(Event::StartDocument);

        loop {
            match self.peek(0)?.kind {
                TokenKind::Newline => {
                    self.advance()?;
                }
                TokenKind::Indent => {
                    if self.strict {
                        let line = self.peek(0)?.line;
                        return Err(Error::syntax(line, "unexpected indentation"));
                    }
                    self.advance()?;
                }
                _ => break,
            }
        }

        let token = self.peek(0)?;
        match &token.kind {
            TokenKind::Eof => {
                self.emit(Event::EndDocument);
                self.done = true;
                Ok(())
            }
            TokenKind::LeftBracket => self.start_array(),
            TokenKind::Dash => {
                self.emit(Event::StartArray(ArrayLen::Unknown));
                self.stack.push(Frame::List {
                    declared: None,
                    seen: 0,
                    entered: false,
                });
                Ok(())
            }
            TokenKind::Word(_) | TokenKind::Quoted(_)
                if matches!(
                    self.peek(1)?.kind,
                    TokenKind::Colon | TokenKind::LeftBracket
                ) =>
            {
                self.emit(Event::StartObject);
                self.stack.push(Frame::Object { root: true });
                Ok(())
            }
            _ => {
                let token = self.advance()?;
                let value = scalar_value(&token)?;
                self.emit(Event::Value(value));
                Ok(())
            }
        }
    }

    fn finish_document(&mut self) -> Result<()> {
        loop {
            match self.peek(0)?.kind {
                TokenKind::Newline | TokenKind::Dedent => {
                    self.advance()?;
                }
                TokenKind::Eof => break,
                _ => {
                    if self.strict {
                        let line = self.peek(0)?.line;
                        return Err(Error::syntax(line, "unexpected trailing content"));
                    }
                    break;
                }
            }
        }
        self.emit(Event::EndDocument);
        self.done = true;
        Ok(())
    }

    fn step_object(&mut self, root: bool) -> Result<()> {
        loop {
            let token = self.peek(0)?;
            match &token.kind {
                TokenKind::Eof => {
                    self.emit(Event::EndObject);
                    return Ok(());
                }
                TokenKind::Newline => {
                    self.advance()?;
                }
                TokenKind::Dedent => {
                    self.advance()?;
                    if root {
                        continue;
                    }
                    self.emit(Event::EndObject);
                    return Ok(());
                }
                TokenKind::Word(_) | TokenKind::Quoted(_) => {
                    self.stack.push(Frame::Object { root });
                    return self.parse_entry();
                }
                other => {
                    return Err(Error::syntax(
                        token.line,
                        format!("expected key, found {}", describe(other)),
                    ));
                }
            }
        }
    }

    fn step_absorbed(&mut self, dash_level: usize) -> Result<()> {
        loop {
            let token = self.peek(0)?;
            match &token.kind {
                TokenKind::Newline | TokenKind::Indent => {
                    self.advance()?;
                }
                TokenKind::Dedent => {
                    if token.level > dash_level {
                        self.advance()?;
                    } else if token.level == dash_level {
                        self.advance()?;
                        self.emit(Event::EndObject);
                        return Ok(());
                    } else {
                        self.emit(Event::EndObject);
                        return Ok(());
                    }
                }
                TokenKind::Dash | TokenKind::Eof => {
                    self.emit(Event::EndObject);
                    return Ok(());
                }
                TokenKind::Word(_) | TokenKind::Quoted(_) => {
                    self.stack.push(Frame::Absorbed { dash_level });
                    return self.parse_entry();
                }
                other => {
                    return Err(Error::syntax(
                        token.line,
                        format!("expected key, found {}", describe(other)),
                    ));
                }
            }
        }
    }

    /// Key plus value dispatch; the owning frame is already back on the
    /// stack.
    fn parse_entry(&mut self) -> Result<()> {
        let token = self.advance()?;
        let key = match &token.kind {
            TokenKind::Word(w) => w.clone(),
            TokenKind::Quoted(q) => q.clone(),
            other => {
                return Err(Error::syntax(
                    token.line,
                    format!("expected key, found {}", describe(other)),
                ));
            }
        };
        self.emit(Event::Key(key.clone()));

        match self.peek(0)?.kind {
            TokenKind::LeftBracket => self.start_array(),
            TokenKind::Colon => {
                self.advance()?;
                self.dispatch_value()
            }
            _ => {
                let line = self.peek(0)?.line;
                Err(Error::syntax(line, format!("expected ':' after key '{key}'")))
            }
        }
    }

    /// Value position after a colon.
    fn dispatch_value(&mut self) -> Result<()> {
        let token = self.peek(0)?;
        match &token.kind {
            TokenKind::Newline => {
                if matches!(self.peek(1)?.kind, TokenKind::Indent) {
                    self.advance()?;
                    while matches!(self.peek(0)?.kind, TokenKind::Indent) {
                        self.advance()?;
                    }
                    self.start_block()
                } else {
                    self.emit(Event::StartObject);
                    self.emit(Event::EndObject);
                    Ok(())
                }
            }
            TokenKind::Eof | TokenKind::Dedent => {
                self.emit(Event::StartObject);
                self.emit(Event::EndObject);
                Ok(())
            }
            TokenKind::Dash => Err(Error::syntax(token.line, "unexpected '-'")),
            _ => {
                let token = self.advance()?;
                let value = scalar_value(&token)?;
                self.emit(Event::Value(value));
                Ok(())
            }
        }
    }

    /// Indented block: an object, or a headerless dash list.
    fn start_block(&mut self) -> Result<()> {
        if matches!(self.peek(0)?.kind, TokenKind::Dash) {
            self.emit(Event::StartArray(ArrayLen::Unknown));
            self.stack.push(Frame::List {
                declared: None,
                seen: 0,
                entered: true,
            });
        } else {
            self.emit(Event::StartObject);
            self.stack.push(Frame::Object { root: false });
        }
        Ok(())
    }

    fn step_list(
        &mut self,
        declared: Option<usize>,
        mut seen: usize,
        mut entered: bool,
    ) -> Result<()> {
        loop {
            let token = self.peek(0)?;
            match &token.kind {
                TokenKind::Newline => {
                    self.advance()?;
                }
                TokenKind::Indent => {
                    entered = true;
                    self.advance()?;
                }
                TokenKind::Dedent => {
                    if entered {
                        self.advance()?;
                    }
                    return self.close_list(declared, seen);
                }
                TokenKind::Eof => {
                    return self.close_list(declared, seen);
                }
                TokenKind::Dash => {
                    let dash_level = token.level;
                    self.advance()?;
                    seen += 1;
                    self.stack.push(Frame::List {
                        declared,
                        seen,
                        entered,
                    });
                    return self.dispatch_dash_value(dash_level);
                }
                _ => {
                    return self.close_list(declared, seen);
                }
            }
        }
    }

    fn close_list(&mut self, declared: Option<usize>, seen: usize) -> Result<()> {
        if self.strict {
            if let Some(declared) = declared {
                if seen != declared {
                    return Err(Error::validation(format!(
                        "array length mismatch: declared {declared}, got {seen}"
                    )));
                }
            }
        }
        self.emit(Event::EndArray);
        Ok(())
    }

    /// Value position after a dash; the list frame is already back on the
    /// stack.
    fn dispatch_dash_value(&mut self, dash_level: usize) -> Result<()> {
        let token = self.peek(0)?;
        match &token.kind {
            TokenKind::LeftBracket => self.start_array(),
            TokenKind::Word(_) | TokenKind::Quoted(_)
                if matches!(
                    self.peek(1)?.kind,
                    TokenKind::Colon | TokenKind::LeftBracket
                ) =>
            {
                self.emit(Event::StartObject);
                self.stack.push(Frame::Absorbed { dash_level });
                Ok(())
            }
            TokenKind::Newline => {
                if matches!(self.peek(1)?.kind, TokenKind::Indent) {
                    self.advance()?;
                    while matches!(self.peek(0)?.kind, TokenKind::Indent) {
                        self.advance()?;
                    }
                    self.start_block()
                } else {
                    self.emit(Event::StartObject);
                    self.emit(Event::EndObject);
                    Ok(())
                }
            }
            TokenKind::Eof => {
                self.emit(Event::StartObject);
                self.emit(Event::EndObject);
                Ok(())
            }
            TokenKind::Dash => Err(Error::syntax(
                token.line,
                "nested list items must declare an array header",
            )),
            _ => {
                let token = self.advance()?;
                let value = scalar_value(&token)?;
                self.emit(Event::Value(value));
                Ok(())
            }
        }
    }

    fn step_inline(&mut self, declared: usize, mut seen: usize) -> Result<()> {
        loop {
            let token = self.peek(0)?;
            match &token.kind {
                TokenKind::Comma | TokenKind::Pipe => {
                    self.advance()?;
                }
                TokenKind::Newline | TokenKind::Eof => {
                    if seen != declared {
                        if self.strict {
                            return Err(Error::validation(format!(
                                "array length mismatch: declared {declared}, got {seen}"
                            )));
                        }
                        for _ in seen..declared {
                            self.emit(Event::Value(Value::Null));
                        }
                    }
                    self.emit(Event::EndArray);
                    return Ok(());
                }
                TokenKind::Dash => {
                    return Err(Error::syntax(token.line, "unexpected '-' in inline array"));
                }
                _ => {
                    let token = self.advance()?;
                    let value = scalar_value(&token)?;
                    seen += 1;
                    if seen <= declared {
                        self.stack.push(Frame::Inline { declared, seen });
                        self.emit(Event::Value(value));
                        return Ok(());
                    }
                    // Lenient over-supply: the extra value is discarded;
                    // strict mode reports the mismatch when the line ends.
                }
            }
        }
    }

    fn step_tabular(
        &mut self,
        fields: SmallVec<[SmolStr; 8]>,
        declared: usize,
        mut seen: usize,
        mut entered: bool,
    ) -> Result<()> {
        loop {
            let token = self.peek(0)?;
            match &token.kind {
                TokenKind::Newline => {
                    self.advance()?;
                }
                TokenKind::Indent => {
                    entered = true;
                    self.advance()?;
                }
                TokenKind::Dedent => {
                    if entered {
                        self.advance()?;
                    }
                    return self.close_tabular(declared, seen);
                }
                TokenKind::Eof => {
                    return self.close_tabular(declared, seen);
                }
                _ => {
                    let mut cells: Vec<Value> = Vec::with_capacity(fields.len());
                    loop {
                        let token = self.peek(0)?;
                        match &token.kind {
                            TokenKind::Newline | TokenKind::Dedent | TokenKind::Eof => break,
                            TokenKind::Comma | TokenKind::Pipe => {
                                self.advance()?;
                            }
                            _ => {
                                let token = self.advance()?;
                                cells.push(scalar_value(&token)?);
                            }
                        }
                    }

                    if self.strict && cells.len() != fields.len() {
                        return Err(Error::validation(format!(
                            "row width mismatch: declared {} fields, got {} values",
                            fields.len(),
                            cells.len()
                        )));
                    }

                    seen += 1;
                    if seen <= declared {
                        self.emit(Event::StartObject);
                        let mut cells = cells.into_iter();
                        for field in &fields {
                            self.emit(Event::Key(field.clone()));
                            self.emit(Event::Value(cells.next().unwrap_or(Value::Null)));
                        }
                        self.emit(Event::EndObject);
                        self.stack.push(Frame::Tabular {
                            fields,
                            declared,
                            seen,
                            entered,
                        });
                        return Ok(());
                    }
                    // Lenient over-supply: drop the extra row.
                }
            }
        }
    }

    fn close_tabular(&mut self, declared: usize, seen: usize) -> Result<()> {
        if self.strict && seen != declared {
            return Err(Error::validation(format!(
                "array length mismatch: declared {declared}, got {seen}"
            )));
        }
        self.emit(Event::EndArray);
        Ok(())
    }

    /// Parse an array header and open the matching frame. The owning
    /// frame, if any, is already back on the stack.
    fn start_array(&mut self) -> Result<()> {
        let open = self.advance()?;
        if !matches!(open.kind, TokenKind::LeftBracket) {
            return Err(Error::syntax(open.line, "expected '[' for array header"));
        }

        let token = self.peek(0)?;
        let len = match &token.kind {
            TokenKind::Number(n) => match n.as_u64() {
                Some(u) if !n.is_float() => {
                    self.advance()?;
                    ArrayLen::Known(u as usize)
                }
                _ => return Err(Error::syntax(token.line, "expected array length or '*'")),
            },
            TokenKind::Word(w) => match w.parse::<usize>() {
                Ok(u) => {
                    self.advance()?;
                    ArrayLen::Known(u)
                }
                Err(_) => {
                    return Err(Error::syntax(token.line, "expected array length or '*'"))
                }
            },
            TokenKind::Star => {
                self.advance()?;
                ArrayLen::Unknown
            }
            _ => return Err(Error::syntax(token.line, "expected array length or '*'")),
        };

        if matches!(self.peek(0)?.kind, TokenKind::Pipe) {
            self.advance()?;
        }

        let token = self.peek(0)?;
        if !matches!(token.kind, TokenKind::RightBracket) {
            return Err(Error::syntax(token.line, "expected ']' in array header"));
        }
        self.advance()?;

        let mut fields: Option<SmallVec<[SmolStr; 8]>> = None;
        if matches!(self.peek(0)?.kind, TokenKind::LeftBrace) {
            self.advance()?;
            let mut list: SmallVec<[SmolStr; 8]> = SmallVec::new();
            loop {
                let token = self.peek(0)?;
                match &token.kind {
                    TokenKind::RightBrace => {
                        self.advance()?;
                        break;
                    }
                    TokenKind::Word(w) => {
                        list.push(w.clone());
                        self.advance()?;
                    }
                    TokenKind::Quoted(q) => {
                        list.push(q.clone());
                        self.advance()?;
                    }
                    TokenKind::Comma | TokenKind::Pipe => {
                        self.advance()?;
                    }
                    TokenKind::Newline | TokenKind::Eof => {
                        return Err(Error::syntax(
                            token.line,
                            "unterminated field list in array header",
                        ));
                    }
                    other => {
                        return Err(Error::syntax(
                            token.line,
                            format!("expected field name, found {}", describe(other)),
                        ));
                    }
                }
            }
            if list.is_empty() {
                return Err(Error::syntax(
                    token.line,
                    "tabular array must declare at least one field",
                ));
            }
            fields = Some(list);
        }

        let token = self.peek(0)?;
        if !matches!(token.kind, TokenKind::Colon) {
            return Err(Error::syntax(token.line, "expected ':' after array header"));
        }
        self.advance()?;

        if let Some(fields) = fields {
            let declared = match len {
                ArrayLen::Known(n) => n,
                ArrayLen::Unknown => {
                    return Err(Error::syntax(
                        token.line,
                        "indefinite-length array must use the block list form",
                    ));
                }
            };
            let next = self.peek(0)?;
            if !matches!(next.kind, TokenKind::Newline | TokenKind::Eof) {
                return Err(Error::syntax(
                    next.line,
                    "expected newline after tabular header",
                ));
            }
            self.emit(Event::StartArray(ArrayLen::Known(declared)));
            self.stack.push(Frame::Tabular {
                fields,
                declared,
                seen: 0,
                entered: false,
            });
            return Ok(());
        }

        if !matches!(self.peek(0)?.kind, TokenKind::Newline | TokenKind::Eof) {
            let declared = match len {
                ArrayLen::Known(n) => n,
                ArrayLen::Unknown => {
                    let line = self.peek(0)?.line;
                    return Err(Error::syntax(
                        line,
                        "indefinite-length array must use the block list form",
                    ));
                }
            };
            self.emit(Event::StartArray(len));
            self.stack.push(Frame::Inline { declared, seen: 0 });
            return Ok(());
        }

        self.emit(Event::StartArray(len));
        self.stack.push(Frame::List {
            declared: match len {
                ArrayLen::Known(n) => Some(n),
                ArrayLen::Unknown => None,
            },
            seen: 0,
            entered: false,
        });
        Ok(())
    }
}

impl<T> Iterator for Events<T>
where
    T: Iterator<Item = Result<Token>>,
{
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(Ok(event));
            }
            if self.done {
                return None;
            }
            if let Err(err) = self.step() {
                self.done = true;
                return Some(Err(err));
            }
        }
    }
}
