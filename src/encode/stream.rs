//! Streaming encoders: chunked emission of a materialized tree, and
//! indefinite-length emission from an unbounded item source.
//!
//! Both share the representation-selection, quoting and number logic of
//! the one-shot encoder; concatenating every chunk of
//! [`encode_chunks`] reproduces [`encode`](super::encode) byte for byte.

use crate::constants::MAX_DEPTH;
use crate::encode::writer::write_array_header_into;
use crate::encode::{
    detect_array_form, render_block_item, render_inline_values, render_row, tabular_fields,
    write_primitive_into, ArrayForm,
};
use crate::error::{Error, Result};
use crate::options::EncodeOptions;
use crate::value::{Object, Value};

/// Encode a tree as an incremental sequence of chunks, one logical line
/// per pull, using an explicit frame stack instead of recursion.
pub fn encode_chunks(value: Value, options: &EncodeOptions) -> Result<ChunkedEncoder> {
    let mut path = String::from("$");
    check_tree_depth(&value, 0, &mut path)?;
    Ok(ChunkedEncoder {
        options: options.clone(),
        indent_unit: " ".repeat(options.indent.get_spaces()),
        stack: Vec::new(),
        root: Some(value),
        any_emitted: false,
        done: false,
    })
}

/// Encode a root-level indefinite array from an unbounded source. The
/// header chunk is `[*]:`; afterwards every pull takes exactly one item
/// from the source and yields its block-list rendering, so consuming only
/// the first K chunks does the work for K items.
pub fn encode_indefinite<I>(items: I, options: &EncodeOptions) -> IndefiniteEncoder<I::IntoIter>
where
    I: IntoIterator<Item = Value>,
{
    IndefiniteEncoder {
        items: items.into_iter(),
        options: options.clone(),
        header_emitted: false,
        failed: false,
    }
}

#[derive(Debug)]
enum Frame {
    Object {
        entries: std::vec::IntoIter<(String, Value)>,
        depth: usize,
        absorbed_first: bool,
    },
    List {
        items: std::vec::IntoIter<Value>,
        item_depth: usize,
    },
    Tabular {
        rows: std::vec::IntoIter<Value>,
        fields: Vec<String>,
        row_depth: usize,
    },
}

#[derive(Debug)]
pub struct ChunkedEncoder {
    options: EncodeOptions,
    indent_unit: String,
    stack: Vec<Frame>,
    root: Option<Value>,
    any_emitted: bool,
    done: bool,
}

impl ChunkedEncoder {
    fn line_start(&self, chunk: &mut String, depth: usize) {
        if self.any_emitted {
            chunk.push('\n');
        }
        for _ in 0..depth {
            chunk.push_str(&self.indent_unit);
        }
    }

    fn object_entries(&self, obj: Object) -> std::vec::IntoIter<(String, Value)> {
        let mut entries: Vec<(String, Value)> = obj.into_iter().collect();
        if self.options.sort_keys {
            entries.sort_by(|a, b| a.0.cmp(&b.0));
        }
        entries.into_iter()
    }

    fn start_root(&mut self, root: Value) -> Option<String> {
        match root {
            Value::Object(obj) => {
                if obj.is_empty() {
                    self.done = true;
                    return None;
                }
                let entries = self.object_entries(obj);
                self.stack.push(Frame::Object {
                    entries,
                    depth: 0,
                    absorbed_first: false,
                });
                None
            }
            Value::Array(arr) => Some(self.open_array(None, arr, 0)),
            primitive => {
                let mut chunk = String::new();
                write_primitive_into(&mut chunk, &primitive);
                self.done = true;
                Some(chunk)
            }
        }
    }

    /// Emit an array's first line (header, or the whole line for inline
    /// form) and open a frame for the remainder. `depth` is the header
    /// line's depth; the chunk continues the current line, so the caller
    /// is responsible for any line start.
    fn open_array(&mut self, key: Option<&str>, arr: Vec<Value>, depth: usize) -> String {
        let mut chunk = String::new();
        if arr.is_empty() {
            write_array_header_into(&mut chunk, key, Some(0), None, self.options.delimiter);
            return chunk;
        }

        match detect_array_form(&arr, self.options.sort_keys) {
            ArrayForm::Inline => {
                write_array_header_into(
                    &mut chunk,
                    key,
                    Some(arr.len()),
                    None,
                    self.options.delimiter,
                );
                chunk.push(' ');
                chunk.push_str(&render_inline_values(&arr, &self.options));
            }
            ArrayForm::Tabular => {
                let first = arr[0].as_object().expect("tabular arrays hold objects");
                let fields = tabular_fields(first, self.options.sort_keys);
                let field_refs: Vec<&str> = fields.iter().map(String::as_str).collect();
                write_array_header_into(
                    &mut chunk,
                    key,
                    Some(arr.len()),
                    Some(&field_refs),
                    self.options.delimiter,
                );
                self.stack.push(Frame::Tabular {
                    rows: arr.into_iter(),
                    fields,
                    row_depth: depth + 1,
                });
            }
            ArrayForm::List => {
                write_array_header_into(
                    &mut chunk,
                    key,
                    Some(arr.len()),
                    None,
                    self.options.delimiter,
                );
                self.stack.push(Frame::List {
                    items: arr.into_iter(),
                    item_depth: depth + 1,
                });
            }
        }
        chunk
    }
}

impl Iterator for ChunkedEncoder {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.done {
            return None;
        }

        if let Some(root) = self.root.take() {
            if let Some(chunk) = self.start_root(root) {
                self.any_emitted = true;
                return Some(chunk);
            }
            if self.done {
                return None;
            }
        }

        loop {
            let frame = match self.stack.pop() {
                Some(frame) => frame,
                None => {
                    self.done = true;
                    return None;
                }
            };

            match frame {
                Frame::Object {
                    mut entries,
                    depth,
                    absorbed_first,
                } => {
                    let (key, value) = match entries.next() {
                        Some(entry) => entry,
                        None => continue,
                    };
                    self.stack.push(Frame::Object {
                        entries,
                        depth,
                        absorbed_first: false,
                    });

                    let mut chunk = String::new();
                    if !absorbed_first {
                        self.line_start(&mut chunk, depth);
                    }
                    match value {
                        Value::Object(obj) if obj.is_empty() => {
                            super::writer::write_key_into(&mut chunk, &key);
                            chunk.push(':');
                        }
                        Value::Object(obj) => {
                            super::writer::write_key_into(&mut chunk, &key);
                            chunk.push(':');
                            let entries = self.object_entries(obj);
                            self.stack.push(Frame::Object {
                                entries,
                                depth: depth + 1,
                                absorbed_first: false,
                            });
                        }
                        Value::Array(arr) => {
                            let rest = self.open_array(Some(&key), arr, depth);
                            chunk.push_str(&rest);
                        }
                        primitive => {
                            super::writer::write_key_into(&mut chunk, &key);
                            chunk.push_str(": ");
                            write_primitive_into(&mut chunk, &primitive);
                        }
                    }
                    self.any_emitted = true;
                    return Some(chunk);
                }
                Frame::List {
                    mut items,
                    item_depth,
                } => {
                    let item = match items.next() {
                        Some(item) => item,
                        None => continue,
                    };
                    self.stack.push(Frame::List { items, item_depth });

                    let mut chunk = String::new();
                    self.line_start(&mut chunk, item_depth);
                    chunk.push('-');
                    match item {
                        Value::Object(obj) if obj.is_empty() => {}
                        Value::Object(obj) => {
                            chunk.push(' ');
                            let entries = self.object_entries(obj);
                            self.stack.push(Frame::Object {
                                entries,
                                depth: item_depth + 1,
                                absorbed_first: true,
                            });
                        }
                        Value::Array(nested) => {
                            chunk.push(' ');
                            let rest = self.open_array(None, nested, item_depth);
                            chunk.push_str(&rest);
                        }
                        primitive => {
                            chunk.push(' ');
                            write_primitive_into(&mut chunk, &primitive);
                        }
                    }
                    self.any_emitted = true;
                    return Some(chunk);
                }
                Frame::Tabular {
                    mut rows,
                    fields,
                    row_depth,
                } => {
                    let row = match rows.next() {
                        Some(row) => row,
                        None => continue,
                    };
                    let obj = row.as_object().expect("tabular arrays hold objects");
                    let rendered = render_row(obj, &fields, &self.options);
                    self.stack.push(Frame::Tabular {
                        rows,
                        fields,
                        row_depth,
                    });

                    let mut chunk = String::new();
                    self.line_start(&mut chunk, row_depth);
                    chunk.push_str(&rendered);
                    self.any_emitted = true;
                    return Some(chunk);
                }
            }
        }
    }
}

pub struct IndefiniteEncoder<I> {
    items: I,
    options: EncodeOptions,
    header_emitted: bool,
    failed: bool,
}

impl<I> Iterator for IndefiniteEncoder<I>
where
    I: Iterator<Item = Value>,
{
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        if !self.header_emitted {
            self.header_emitted = true;
            return Some(Ok("[*]:".to_string()));
        }
        let value = self.items.next()?;
        match render_block_item(&value, 1, &self.options) {
            Ok(rendered) => Some(Ok(format!("\n{rendered}"))),
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

fn check_tree_depth(value: &Value, depth: usize, path: &mut String) -> Result<()> {
    if depth > MAX_DEPTH {
        return Err(Error::encode(path.clone(), "maximum depth exceeded"));
    }
    match value {
        Value::Array(arr) => {
            for (i, item) in arr.iter().enumerate() {
                let len = path.len();
                path.push('[');
                path.push_str(&i.to_string());
                path.push(']');
                check_tree_depth(item, depth + 1, path)?;
                path.truncate(len);
            }
        }
        Value::Object(obj) => {
            for (key, item) in obj {
                let len = path.len();
                path.push('.');
                path.push_str(key);
                check_tree_depth(item, depth + 1, path)?;
                path.truncate(len);
            }
        }
        _ => {}
    }
    Ok(())
}
