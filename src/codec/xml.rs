//! XML codec.
//!
//! Documents map to nested `serde_json` maps:
//! - child elements become keys, repeated siblings become arrays
//! - text-only elements become strings, empty elements become empty maps
//! - attributes are collected under `@attributes`
//!
//! When converting, every value is nested under a `<root>` element and purely
//! numeric keys are prefixed with `item`, since element names cannot start with a digit.

use std::borrow::Cow;

use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

use super::{CodecError, ContentCodec, MediaType};

const ROOT_ELEMENT: &str = "root";
const NUMERIC_KEY_PREFIX: &str = "item";
const ATTRIBUTES_KEY: &str = "@attributes";

/// Deepest element nesting accepted in either direction, matching serde_json's recursion limit.
pub const MAX_DEPTH: usize = 128;

/// `application/xml` codec backed by `quick-xml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlCodec;

impl ContentCodec for XmlCodec {
    fn media_type(&self) -> MediaType {
        MediaType::Xml
    }

    fn verify(&self, text: &str) -> bool {
        parse_document(text).is_ok()
    }

    fn translate(&self, text: &str) -> Map<String, Value> {
        match parse_document(text).map(Element::into_value) {
            Ok(Value::Object(map)) => map,
            Ok(Value::String(text)) => Map::from_iter([("0".to_string(), Value::String(text))]),
            _ => Map::new(),
        }
    }

    fn convert(&self, data: &Map<String, Value>) -> Result<String, CodecError> {
        let mut out = String::from("<?xml version=\"1.0\"?>\n");
        out.push('<');
        out.push_str(ROOT_ELEMENT);
        out.push('>');
        for (key, value) in data {
            write_element(&mut out, key, value, 1)?;
        }
        out.push_str("</");
        out.push_str(ROOT_ELEMENT);
        out.push_str(">\n");
        Ok(out)
    }
}

/// Parsed element tree.
#[derive(Debug, Default)]
struct Element {
    name: String,
    attributes: Map<String, Value>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    fn open(start: &BytesStart<'_>) -> Result<Self, CodecError> {
        let name = std::str::from_utf8(start.name().as_ref())?.to_string();
        let mut attributes = Map::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(quick_xml::Error::from)?;
            let key = std::str::from_utf8(attribute.key.as_ref())?.to_string();
            let value = attribute.unescape_value()?.into_owned();
            attributes.insert(key, Value::String(value));
        }
        Ok(Self {
            name,
            attributes,
            ..Self::default()
        })
    }

    fn into_value(self) -> Value {
        if self.children.is_empty() && self.attributes.is_empty() {
            return if self.text.is_empty() {
                Value::Object(Map::new())
            } else {
                Value::String(self.text)
            };
        }

        let mut map = Map::new();
        if !self.attributes.is_empty() {
            map.insert(ATTRIBUTES_KEY.to_string(), Value::Object(self.attributes));
        }
        if self.children.is_empty() && !self.text.is_empty() {
            map.insert("0".to_string(), Value::String(self.text));
        }
        for child in self.children {
            let name = child.name.clone();
            let value = child.into_value();
            // into_value never yields an array, so an existing array means a repeated sibling
            match map.get_mut(&name) {
                None => {
                    map.insert(name, value);
                }
                Some(Value::Array(items)) => items.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
            }
        }
        Value::Object(map)
    }
}

fn parse_document(text: &str) -> Result<Element, CodecError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                if root.is_some() && stack.is_empty() {
                    return Err(CodecError::MalformedXml("multiple root elements"));
                }
                if stack.len() >= MAX_DEPTH {
                    return Err(CodecError::MalformedXml("nesting too deep"));
                }
                stack.push(Element::open(&start)?);
            }
            Event::Empty(start) => {
                let element = Element::open(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or(CodecError::MalformedXml("unexpected closing tag"))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(content) => {
                let content = content.unescape()?;
                push_text(&mut stack, &content)?;
            }
            Event::CData(content) => {
                let content = std::str::from_utf8(&content)?;
                push_text(&mut stack, content)?;
            }
            Event::Eof => break,
            // declarations, comments, processing instructions, doctype
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(CodecError::MalformedXml("unclosed element"));
    }
    root.ok_or(CodecError::MalformedXml("missing root element"))
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), CodecError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
    } else if root.is_none() {
        *root = Some(element);
    } else {
        return Err(CodecError::MalformedXml("multiple root elements"));
    }
    Ok(())
}

fn push_text(stack: &mut [Element], content: &str) -> Result<(), CodecError> {
    match stack.last_mut() {
        Some(element) => element.text.push_str(content),
        None if content.trim().is_empty() => {}
        None => return Err(CodecError::MalformedXml("text outside the root element")),
    }
    Ok(())
}

fn write_element(out: &mut String, key: &str, value: &Value, depth: usize) -> Result<(), CodecError> {
    if depth > MAX_DEPTH {
        return Err(CodecError::MalformedXml("nesting too deep"));
    }
    let name = element_name(key)?;
    out.push('<');
    out.push_str(&name);
    out.push('>');
    match value {
        Value::Object(map) => {
            for (child_key, child) in map {
                write_element(out, child_key, child, depth + 1)?;
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                write_element(out, &index.to_string(), item, depth + 1)?;
            }
        }
        scalar => out.push_str(&escape(scalar_text(scalar).as_ref())),
    }
    out.push_str("</");
    out.push_str(&name);
    out.push('>');
    Ok(())
}

fn scalar_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(text) => Cow::Borrowed(text),
        Value::Number(number) => Cow::Owned(number.to_string()),
        Value::Bool(true) => Cow::Borrowed("1"),
        _ => Cow::Borrowed(""),
    }
}

fn element_name(key: &str) -> Result<Cow<'_, str>, CodecError> {
    if !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(Cow::Owned(format!("{NUMERIC_KEY_PREFIX}{key}")));
    }

    let mut chars = key.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_alphabetic() || first == '_')
                && chars.all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
        }
        None => false,
    };

    if valid {
        Ok(Cow::Borrowed(key))
    } else {
        Err(CodecError::InvalidElementName(key.to_string()))
    }
}
