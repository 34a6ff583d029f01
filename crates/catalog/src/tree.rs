// ABOUTME: Schema-agnostic XML to tree conversion built on quick-xml.
// ABOUTME: Produces an ordered Object/Array/Scalar tree with "@_" attribute keys and "#text" values.

use std::fmt;

use once_cell::sync::Lazy;
use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use regex::Regex;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::error::TreeError;

/// Prefix applied to attribute names when they become object keys.
pub const ATTRIBUTE_PREFIX: &str = "@_";

/// Key holding the text of an element that also has attributes or children.
pub const TEXT_KEY: &str = "#text";

/// Plain decimal numbers. Leading zeros are excluded so SKUs like "00123" stay text.
static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?(0|[1-9]\d*)(\.\d+)?$").unwrap());

/// Longest digit run that still round-trips through an f64.
const MAX_NUMBER_DIGITS: usize = 15;

/// A leaf value of the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Scalar {
    /// Types a raw tag or attribute value the way feeds are usually read.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "true" => return Scalar::Bool(true),
            "false" => return Scalar::Bool(false),
            _ => {}
        }

        if NUMBER_RE.is_match(raw) {
            let digits = raw
                .chars()
                .filter(char::is_ascii_digit)
                .skip_while(|c| *c == '0')
                .count();
            if digits <= MAX_NUMBER_DIGITS {
                if let Ok(n) = raw.parse::<f64>() {
                    return Scalar::Number(n);
                }
            }
        }

        Scalar::Text(raw.to_string())
    }

    /// Empty text, zero, NaN and `false` are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Scalar::Text(s) => !s.is_empty(),
            Scalar::Number(n) => *n != 0.0 && !n.is_nan(),
            Scalar::Bool(b) => *b,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Text(s) => write!(f, "{}", s),
            Scalar::Number(n) => match integral(*n) {
                Some(i) => write!(f, "{}", i),
                None => write!(f, "{}", n),
            },
            Scalar::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// Returns the value as an i64 when it has no fractional part and fits exactly.
fn integral(n: f64) -> Option<i64> {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        Some(n as i64)
    } else {
        None
    }
}

/// A parsed XML document or fragment.
///
/// Objects keep their keys in document order, so any traversal that stops at
/// the "first" match is deterministic.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Object(Vec<(String, Node)>),
    Array(Vec<Node>),
    Scalar(Scalar),
}

impl Node {
    /// Shorthand for a text leaf.
    pub fn text_value(s: impl Into<String>) -> Self {
        Node::Scalar(Scalar::Text(s.into()))
    }

    /// Looks up a key on an object. Non-objects have no keys.
    pub fn get(&self, key: &str) -> Option<&Node> {
        match self {
            Node::Object(fields) => fields.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Follows a chain of object keys.
    pub fn path(&self, keys: &[&str]) -> Option<&Node> {
        keys.iter().try_fold(self, |node, key| node.get(key))
    }

    pub fn as_array(&self) -> Option<&[Node]> {
        match self {
            Node::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Loose truthiness over scalars; containers are always truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Node::Object(_) | Node::Array(_) => true,
            Node::Scalar(s) => s.is_truthy(),
        }
    }

    /// Resolves the scalar carried by this node.
    ///
    /// Objects resolve through their `#text` entry, arrays through their first
    /// truthy element.
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Node::Scalar(s) => Some(s),
            Node::Object(_) => self.get(TEXT_KEY).and_then(Node::as_scalar),
            Node::Array(items) => items
                .iter()
                .filter(|n| n.is_truthy())
                .find_map(Node::as_scalar),
        }
    }

    /// String form of [`Node::as_scalar`].
    pub fn text(&self) -> Option<String> {
        self.as_scalar().map(|s| s.to_string())
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Node::Object(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (k, v) in fields {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Node::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Node::Scalar(Scalar::Text(s)) => serializer.serialize_str(s),
            Node::Scalar(Scalar::Number(n)) => match integral(*n) {
                Some(i) => serializer.serialize_i64(i),
                None => serializer.serialize_f64(*n),
            },
            Node::Scalar(Scalar::Bool(b)) => serializer.serialize_bool(*b),
        }
    }
}

/// An element still being read.
#[derive(Debug, Default)]
struct Frame {
    name: String,
    fields: Vec<(String, Node)>,
    text: String,
}

impl Frame {
    fn open(start: &BytesStart) -> Self {
        let mut frame = Frame {
            name: String::from_utf8_lossy(start.name().as_ref()).to_string(),
            ..Default::default()
        };
        for attr in start.attributes().flatten() {
            let key = String::from_utf8_lossy(attr.key.as_ref());
            let raw = String::from_utf8_lossy(&attr.value);
            let value = unescape(&raw)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| raw.to_string());
            frame.fields.push((
                format!("{}{}", ATTRIBUTE_PREFIX, key),
                Node::Scalar(Scalar::parse(&value)),
            ));
        }
        frame
    }

    fn into_node(self) -> (String, Node) {
        let text = self.text.trim();
        if self.fields.is_empty() {
            return (self.name, Node::Scalar(Scalar::parse(text)));
        }
        let mut fields = self.fields;
        if !text.is_empty() {
            fields.push((TEXT_KEY.to_string(), Node::Scalar(Scalar::parse(text))));
        }
        (self.name, Node::Object(fields))
    }

    /// Adds a child element; repeated tags collapse into an array at the first position.
    fn push_child(&mut self, key: String, node: Node) {
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, Node::Array(items))) => items.push(node),
            Some((_, existing)) => {
                let first = std::mem::replace(existing, Node::Array(Vec::new()));
                *existing = Node::Array(vec![first, node]);
            }
            None => self.fields.push((key, node)),
        }
    }
}

/// Parses an XML document into a [`Node::Object`] keyed by its top-level elements.
///
/// Comments, declarations, processing instructions and doctypes are skipped.
/// Malformed input fails with [`TreeError`].
pub fn parse_xml(text: &str) -> Result<Node, TreeError> {
    let mut reader = Reader::from_str(text);
    let mut root = Frame::default();
    let mut stack: Vec<Frame> = Vec::new();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| TreeError::xml(reader.buffer_position() as u64, e))?;

        match event {
            Event::Start(ref e) => stack.push(Frame::open(e)),
            Event::Empty(ref e) => {
                let (name, node) = Frame::open(e).into_node();
                current(&mut root, &mut stack).push_child(name, node);
            }
            Event::End(_) => {
                let frame = stack
                    .pop()
                    .ok_or(TreeError::UnexpectedClose(reader.buffer_position() as u64))?;
                let (name, node) = frame.into_node();
                current(&mut root, &mut stack).push_child(name, node);
            }
            Event::Text(ref e) => {
                let decoded = e
                    .decode()
                    .map_err(|err| TreeError::xml(reader.buffer_position() as u64, err))?;
                current(&mut root, &mut stack).text.push_str(&decoded);
            }
            Event::CData(e) => {
                let raw = e.into_inner();
                current(&mut root, &mut stack)
                    .text
                    .push_str(&String::from_utf8_lossy(&raw));
            }
            Event::GeneralRef(e) => {
                let frame = current(&mut root, &mut stack);
                if let Ok(Some(ch)) = e.resolve_char_ref() {
                    frame.text.push(ch);
                    continue;
                }
                let name = String::from_utf8_lossy(&e.into_inner()).to_string();
                match resolve_predefined_entity(&name) {
                    Some(resolved) => frame.text.push_str(resolved),
                    None => {
                        frame.text.push('&');
                        frame.text.push_str(&name);
                        frame.text.push(';');
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.pop() {
        return Err(TreeError::Unclosed(open.name));
    }

    Ok(Node::Object(root.fields))
}

fn current<'a>(root: &'a mut Frame, stack: &'a mut [Frame]) -> &'a mut Frame {
    match stack.last_mut() {
        Some(frame) => frame,
        None => root,
    }
}
