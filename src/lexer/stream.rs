//! Incremental tokenization over an arbitrary line source.
//!
//! Applies the same per-line scanner and indentation bookkeeping as the
//! whole-document lexer, but pulls one line at a time so that no full
//! document buffering is ever required.

use std::collections::VecDeque;

use crate::error::Result;
use crate::lexer::{finish, process_line, LexerConfig, Token};

pub struct StreamLexer<I> {
    source: I,
    config: LexerConfig,
    pending: VecDeque<Token>,
    level: usize,
    line_no: usize,
    finished: bool,
    failed: bool,
}

impl<I, S> StreamLexer<I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    pub(crate) fn new(source: I, config: LexerConfig) -> Self {
        Self {
            source,
            config,
            pending: VecDeque::new(),
            level: 0,
            line_no: 0,
            finished: false,
            failed: false,
        }
    }
}

impl<I, S> Iterator for StreamLexer<I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Some(Ok(token));
            }
            if self.failed || self.finished {
                return None;
            }
            match self.source.next() {
                Some(line) => {
                    self.line_no += 1;
                    let mut buffer = Vec::new();
                    if let Err(err) = process_line(
                        line.as_ref(),
                        self.line_no,
                        &mut self.level,
                        &self.config,
                        &mut buffer,
                    ) {
                        self.failed = true;
                        return Some(Err(err));
                    }
                    self.pending.extend(buffer);
                }
                None => {
                    self.finished = true;
                    let mut buffer = Vec::new();
                    finish(self.line_no, &mut self.level, &mut buffer);
                    self.pending.extend(buffer);
                }
            }
        }
    }
}
