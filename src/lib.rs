//! # toon_codec
//!
//! A codec for TOON, a compact line-oriented text format for
//! JSON-compatible data. Documents read like indented `key: value` lines;
//! arrays pick the most compact of three representations, and uniform
//! object arrays collapse into a one-header table so keys are written
//! once instead of once per row:
//!
//! ```text
//! users[2]{id,name}:
//!   1,Alice
//!   2,Bob
//! active: true
//! ```
//!
//! The crate provides:
//!
//! - [`encode`] / [`decode`] over the [`Value`] tree, plus serde entry
//!   points ([`to_string`], [`from_str`] and friends) for arbitrary
//!   `Serialize`/`DeserializeOwned` types;
//! - a streaming decoder ([`decode_events`], [`decode_items`]) that walks
//!   input with memory bounded by nesting depth rather than document
//!   size;
//! - a streaming encoder ([`encode_chunks`], [`encode_indefinite`]) that
//!   emits output incrementally, including `[*]` indefinite-length
//!   arrays fed from an unbounded source.
//!
//! ## Quick start
//!
//! ```
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct User {
//!     name: String,
//!     age: u32,
//! }
//!
//! let user = User { name: "Alice".to_string(), age: 30 };
//! let text = toon_codec::to_string(&user)?;
//! assert_eq!(text, "name: Alice\nage: 30");
//!
//! let back: User = toon_codec::from_str(&text)?;
//! assert_eq!(back, user);
//! # Ok::<(), toon_codec::Error>(())
//! ```
//!
//! ## Strictness
//!
//! Array headers declare lengths and tabular headers declare field
//! counts. In the default strict mode any disagreement is a
//! [`Error::Validation`]; with [`DecodeOptions::with_strict`]`(false)`
//! missing trailing values are repaired to `null` and extras are
//! discarded.

pub mod constants;
pub mod decode;
pub mod encode;
pub mod error;
pub mod lexer;
pub mod options;
pub mod value;

mod num;
mod text;

use serde::de::DeserializeOwned;
use serde::Serialize;

pub use crate::decode::events::{ArrayLen, Event, Events};
pub use crate::decode::items::Items;
pub use crate::encode::stream::{ChunkedEncoder, IndefiniteEncoder};
pub use crate::error::{Error, Result};
pub use crate::options::{DecodeOptions, Delimiter, EncodeOptions, Indent};
pub use crate::value::{Number, Object, Value};

/// Encode a value tree with explicit options.
pub fn encode(value: &Value, options: &EncodeOptions) -> Result<String> {
    encode::encode(value, options)
}

/// Decode a document into a value tree with explicit options.
pub fn decode(input: &str, options: &DecodeOptions) -> Result<Value> {
    decode::decode(input, options)
}

pub fn to_string<T: Serialize>(value: &T) -> Result<String> {
    to_string_with_options(value, &EncodeOptions::default())
}

pub fn to_string_with_options<T: Serialize>(value: &T, options: &EncodeOptions) -> Result<String> {
    encode::to_string(value, options)
}

pub fn to_vec<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    to_vec_with_options(value, &EncodeOptions::default())
}

pub fn to_vec_with_options<T: Serialize>(value: &T, options: &EncodeOptions) -> Result<Vec<u8>> {
    encode::to_vec(value, options)
}

pub fn to_writer<T: Serialize, W: std::io::Write>(writer: W, value: &T) -> Result<()> {
    to_writer_with_options(writer, value, &EncodeOptions::default())
}

pub fn to_writer_with_options<T: Serialize, W: std::io::Write>(
    writer: W,
    value: &T,
    options: &EncodeOptions,
) -> Result<()> {
    encode::to_writer(writer, value, options)
}

pub fn from_str<T: DeserializeOwned>(input: &str) -> Result<T> {
    from_str_with_options(input, &DecodeOptions::default())
}

pub fn from_str_with_options<T: DeserializeOwned>(
    input: &str,
    options: &DecodeOptions,
) -> Result<T> {
    decode::from_str(input, options)
}

pub fn from_slice<T: DeserializeOwned>(input: &[u8]) -> Result<T> {
    from_slice_with_options(input, &DecodeOptions::default())
}

pub fn from_slice_with_options<T: DeserializeOwned>(
    input: &[u8],
    options: &DecodeOptions,
) -> Result<T> {
    decode::from_slice(input, options)
}

pub fn from_reader<T: DeserializeOwned, R: std::io::Read>(reader: R) -> Result<T> {
    from_reader_with_options(reader, &DecodeOptions::default())
}

pub fn from_reader_with_options<T: DeserializeOwned, R: std::io::Read>(
    reader: R,
    options: &DecodeOptions,
) -> Result<T> {
    decode::from_reader(reader, options)
}

/// Decode a line source into a lazy event sequence; see
/// [`decode::events`].
pub fn decode_events<I>(
    lines: I,
    options: &DecodeOptions,
) -> Events<lexer::stream::StreamLexer<I::IntoIter>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    decode::events::decode_events(lines, options)
}

/// Decode a line source item by item; see [`decode::items`].
pub fn decode_items<I>(
    lines: I,
    options: &DecodeOptions,
) -> Items<Events<lexer::stream::StreamLexer<I::IntoIter>>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    decode::items::decode_items(lines, options)
}

/// Encode a tree as an incremental chunk sequence; concatenating all
/// chunks reproduces [`encode`] byte for byte.
pub fn encode_chunks(value: Value, options: &EncodeOptions) -> Result<ChunkedEncoder> {
    encode::stream::encode_chunks(value, options)
}

/// Encode a root-level `[*]` array from a possibly unbounded item
/// source.
pub fn encode_indefinite<I>(items: I, options: &EncodeOptions) -> IndefiniteEncoder<I::IntoIter>
where
    I: IntoIterator<Item = Value>,
{
    encode::stream::encode_indefinite(items, options)
}
