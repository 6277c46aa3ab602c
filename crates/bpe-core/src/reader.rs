//! # XML Reader: Span-Preserving Parse
//!
//! Parses a document into a read-only tree of [`ParsedElement`] nodes, each
//! remembering the byte range it occupies in the source text. Protocol
//! merging cuts signed fragments out of the source through these ranges, so
//! the bytes covered by a signature are never re-serialized.
//!
//! Element names are local names (prefix stripped). Attribute keys are kept
//! as written so namespace declarations stay distinguishable.

use std::ops::Range;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::XmlError;

/// Element of a parsed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedElement {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<ParsedElement>,
    text: String,
    span: Range<usize>,
    content: Range<usize>,
}

impl ParsedElement {
    /// Local element name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attribute value (unescaped).
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Concatenated direct text and CDATA (unescaped).
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Direct child elements in document order.
    pub fn children(&self) -> &[ParsedElement] {
        &self.children
    }

    /// First direct child with the given name.
    pub fn child(&self, name: &str) -> Option<&ParsedElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Text of the first direct child with the given name.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(ParsedElement::text)
    }

    /// First element with the given name in document order, self included.
    pub fn find(&self, name: &str) -> Option<&ParsedElement> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    /// Every element with the given name in document order, self included.
    pub fn find_all<'a>(&'a self, name: &str) -> Vec<&'a ParsedElement> {
        let mut out = Vec::new();
        self.collect(name, &mut out);
        out
    }

    fn collect<'a>(&'a self, name: &str, out: &mut Vec<&'a ParsedElement>) {
        if self.name == name {
            out.push(self);
        }
        for child in &self.children {
            child.collect(name, out);
        }
    }

    /// Byte range of the whole element, tags included.
    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }

    /// Byte range between the start and end tags. Empty for `<x/>`.
    pub fn content(&self) -> Range<usize> {
        self.content.clone()
    }
}

/// Parsed document that keeps its source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    source: String,
    root: ParsedElement,
}

impl XmlDocument {
    /// Parse `source`.
    ///
    /// # Errors
    ///
    /// [`XmlError::Parse`] for malformed input, [`XmlError::NoRoot`] when
    /// no element is present.
    pub fn parse(source: impl Into<String>) -> Result<Self, XmlError> {
        let source = source.into();
        let root = parse_tree(&source)?;
        Ok(Self { source, root })
    }

    /// Root element.
    pub fn root(&self) -> &ParsedElement {
        &self.root
    }

    /// Source text as given to [`parse`](Self::parse).
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Verbatim source text of an element of this document.
    pub fn raw(&self, element: &ParsedElement) -> &str {
        &self.source[element.span()]
    }

    /// Shorthand for `self.root().find(name)`.
    pub fn find(&self, name: &str) -> Option<&ParsedElement> {
        self.root.find(name)
    }

    /// Shorthand for `self.root().find_all(name)`.
    pub fn find_all(&self, name: &str) -> Vec<&ParsedElement> {
        self.root.find_all(name)
    }
}

fn parse_error(position: usize, err: impl std::fmt::Display) -> XmlError {
    XmlError::Parse {
        position,
        message: err.to_string(),
    }
}

fn open(source: &str, start: &BytesStart<'_>, end: usize) -> Result<ParsedElement, XmlError> {
    let begin = source[..end].rfind('<').unwrap_or(0);
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| parse_error(begin, e))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| parse_error(begin, e))?
            .into_owned();
        attributes.push((key, value));
    }
    Ok(ParsedElement {
        name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
        attributes,
        children: Vec::new(),
        text: String::new(),
        span: begin..end,
        content: end..end,
    })
}

fn parse_tree(source: &str) -> Result<ParsedElement, XmlError> {
    let mut reader = Reader::from_str(source);
    let mut stack: Vec<ParsedElement> = Vec::new();
    let mut root: Option<ParsedElement> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| parse_error(reader.buffer_position() as usize, e))?;
        let pos = reader.buffer_position() as usize;
        match event {
            Event::Start(ref e) => {
                stack.push(open(source, e, pos)?);
            }
            Event::Empty(ref e) => {
                let el = open(source, e, pos)?;
                attach(&mut stack, &mut root, el);
            }
            Event::End(_) => {
                let begin = source[..pos].rfind('<').unwrap_or(pos);
                let mut el = stack
                    .pop()
                    .ok_or_else(|| parse_error(pos, "unexpected closing tag"))?;
                el.content = el.span.end..begin;
                el.span = el.span.start..pos;
                attach(&mut stack, &mut root, el);
            }
            Event::Text(e) => {
                if let Some(top) = stack.last_mut() {
                    let text = e.unescape().map_err(|err| parse_error(pos, err))?;
                    top.text.push_str(&text);
                }
            }
            Event::CData(e) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(parse_error(source.len(), "unclosed element"));
    }
    root.ok_or(XmlError::NoRoot)
}

fn attach(stack: &mut [ParsedElement], root: &mut Option<ParsedElement>, el: ParsedElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(el),
        None => {
            if root.is_none() {
                *root = Some(el);
            }
        }
    }
}
