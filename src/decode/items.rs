//! Item reconstruction on top of the event decoder.
//!
//! [`decode_items`] yields the elements of a top-level array one at a
//! time, rebuilding each element from its events; memory is bounded by
//! the largest single item, not the document. A primitive or object root
//! yields exactly one item.

use crate::decode::events::{decode_events, Event, Events};
use crate::error::{Error, Result};
use crate::lexer::stream::StreamLexer;
use crate::options::DecodeOptions;
use crate::value::{Object, Value};

/// Decode a line source item by item.
pub fn decode_items<I>(
    lines: I,
    options: &DecodeOptions,
) -> Items<Events<StreamLexer<I::IntoIter>>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    Items {
        events: decode_events(lines, options),
        state: State::Start,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    InArray,
    Done,
}

pub struct Items<E>
where
    E: Iterator<Item = Result<Event>>,
{
    events: E,
    state: State,
}

impl<E> Iterator for Items<E>
where
    E: Iterator<Item = Result<Event>>,
{
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.state {
                State::Done => return None,
                State::Start => match self.events.next()? {
                    Err(err) => {
                        self.state = State::Done;
                        return Some(Err(err));
                    }
                    Ok(Event::StartDocument) => continue,
                    Ok(Event::EndDocument) => {
                        self.state = State::Done;
                        return None;
                    }
                    Ok(Event::StartArray(_)) => {
                        self.state = State::InArray;
                        continue;
                    }
                    Ok(first) => {
                        self.state = State::Done;
                        return Some(reconstruct(first, &mut self.events));
                    }
                },
                State::InArray => match self.events.next()? {
                    Err(err) => {
                        self.state = State::Done;
                        return Some(Err(err));
                    }
                    Ok(Event::EndArray) => {
                        self.state = State::Done;
                        return None;
                    }
                    Ok(first) => return Some(reconstruct(first, &mut self.events)),
                },
            }
        }
    }
}

enum Builder {
    Object { map: Object, key: Option<String> },
    Array(Vec<Value>),
}

/// Rebuild one complete value from its event subsequence. The event
/// decoder always closes what it opens, so an unbalanced stream here is a
/// codec fault, not a caller error.
fn reconstruct<E>(first: Event, events: &mut E) -> Result<Value>
where
    E: Iterator<Item = Result<Event>>,
{
    let mut stack: Vec<Builder> = Vec::new();
    match first {
        Event::Value(value) => return Ok(value),
        Event::StartObject => stack.push(Builder::Object {
            map: Object::new(),
            key: None,
        }),
        Event::StartArray(_) => stack.push(Builder::Array(Vec::new())),
        other => {
            return Err(Error::internal(format!(
                "unexpected event at item start: {other:?}"
            )));
        }
    }

    while let Some(event) = events.next() {
        match event? {
            Event::StartObject => stack.push(Builder::Object {
                map: Object::new(),
                key: None,
            }),
            Event::StartArray(_) => stack.push(Builder::Array(Vec::new())),
            Event::Key(name) => match stack.last_mut() {
                Some(Builder::Object { key, .. }) => *key = Some(name.to_string()),
                _ => return Err(Error::internal("key event outside object")),
            },
            Event::Value(value) => attach(&mut stack, value)?,
            Event::EndObject | Event::EndArray => {
                let finished = match stack.pop() {
                    Some(Builder::Object { map, .. }) => Value::Object(map),
                    Some(Builder::Array(items)) => Value::Array(items),
                    None => return Err(Error::internal("unbalanced event stream")),
                };
                if stack.is_empty() {
                    return Ok(finished);
                }
                attach(&mut stack, finished)?;
            }
            Event::StartDocument | Event::EndDocument => {
                return Err(Error::internal("document boundary inside item"));
            }
        }
    }
    Err(Error::internal("event stream ended inside item"))
}

fn attach(stack: &mut [Builder], value: Value) -> Result<()> {
    match stack.last_mut() {
        Some(Builder::Object { map, key }) => match key.take() {
            Some(key) => {
                map.insert(key, value);
                Ok(())
            }
            None => Err(Error::internal("value event without preceding key")),
        },
        Some(Builder::Array(items)) => {
            items.push(value);
            Ok(())
        }
        None => Err(Error::internal("value event outside container")),
    }
}
