//! # XML Element Tree: Writing Side
//!
//! A small owned element tree used to assemble documents before
//! serialization. Children keep insertion order, which is the order the
//! layout schema requires. Serialization goes through `quick_xml::Writer`;
//! text is escaped for `<`, `>`, and `&` only, CDATA is written verbatim.

use std::io::Cursor;

use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesCData, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::constants::XML_DECLARATION;
use crate::error::XmlError;

/// Child node of an [`Element`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Nested element.
    Element(Element),
    /// Character data, escaped on output.
    Text(String),
    /// CDATA section, written verbatim.
    CData(String),
}

/// Owned XML element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    /// Create an empty element.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Create an element holding a single text node.
    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        let mut el = Self::new(name);
        el.children.push(Node::Text(text.into()));
        el
    }

    /// Builder form of [`set_attr`](Self::set_attr).
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Set an attribute, replacing any previous value.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Attribute value.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Element name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a child element.
    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    /// Append `<name>text</name>`.
    pub fn push_text(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.push(Element::with_text(name, text));
    }

    /// Append `<name><![CDATA[data]]></name>`.
    pub fn push_cdata(&mut self, name: impl Into<String>, data: impl Into<String>) {
        let mut el = Element::new(name);
        el.children.push(Node::CData(data.into()));
        self.push(el);
    }

    /// All child nodes.
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Child elements only.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// First child element with the given name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    /// Mutable first child element with the given name.
    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.children.iter_mut().find_map(|n| match n {
            Node::Element(e) if e.name == name => Some(e),
            _ => None,
        })
    }

    /// First descendant (depth first, self excluded) with the given name.
    pub fn find(&self, name: &str) -> Option<&Element> {
        for child in self.elements() {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find(name) {
                return Some(found);
            }
        }
        None
    }

    /// Concatenated text and CDATA of the direct children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|n| match n {
                Node::Text(t) | Node::CData(t) => Some(t.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    /// Replace all children with a single text node.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children.clear();
        self.children.push(Node::Text(text.into()));
    }

    /// `true` when the element has no children.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Serialize without a declaration.
    pub fn to_xml(&self) -> Result<String, XmlError> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        self.write(&mut writer)?;
        String::from_utf8(writer.into_inner().into_inner())
            .map_err(|e| XmlError::Write(e.to_string()))
    }

    /// Serialize with the UTF-8 declaration prepended.
    pub fn to_document(&self) -> Result<String, XmlError> {
        Ok(format!("{XML_DECLARATION}{}", self.to_xml()?))
    }

    fn write(&self, writer: &mut Writer<Cursor<Vec<u8>>>) -> Result<(), XmlError> {
        let mut start = BytesStart::new(self.name.as_str());
        for (k, v) in &self.attributes {
            start.push_attribute((k.as_str(), v.as_str()));
        }
        if self.children.is_empty() {
            return emit(writer, Event::Empty(start));
        }
        emit(writer, Event::Start(start))?;
        for child in &self.children {
            match child {
                Node::Element(e) => e.write(writer)?,
                Node::Text(t) => emit(writer, Event::Text(BytesText::from_escaped(partial_escape(t))))?,
                Node::CData(d) => emit(writer, Event::CData(BytesCData::new(d.as_str())))?,
            }
        }
        emit(writer, Event::End(BytesEnd::new(self.name.as_str())))
    }
}

/// Escape `<`, `>`, and `&` for use as element text.
pub fn escape_text(text: &str) -> String {
    partial_escape(text).into_owned()
}

fn emit(writer: &mut Writer<Cursor<Vec<u8>>>, event: Event<'_>) -> Result<(), XmlError> {
    writer
        .write_event(event)
        .map_err(|e| XmlError::Write(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_serialization() {
        let mut root = Element::new("ide").with_attr("versao", "1.00");
        root.push_text("cUF", "35");
        root.push_text("tpAmb", "2");
        assert_eq!(
            root.to_xml().unwrap(),
            r#"<ide versao="1.00"><cUF>35</cUF><tpAmb>2</tpAmb></ide>"#
        );
    }

    #[test]
    fn text_is_escaped() {
        let el = Element::with_text("xNome", "A & B <C>");
        assert_eq!(el.to_xml().unwrap(), "<xNome>A &amp; B &lt;C&gt;</xNome>");
    }

    #[test]
    fn cdata_written_verbatim() {
        let mut el = Element::new("infBPeSupl");
        el.push_cdata("qrCodBPe", "https://x/q?a=1&b=2");
        assert_eq!(
            el.to_xml().unwrap(),
            "<infBPeSupl><qrCodBPe><![CDATA[https://x/q?a=1&b=2]]></qrCodBPe></infBPeSupl>"
        );
    }

    #[test]
    fn escape_keeps_quotes() {
        assert_eq!(escape_text(r#"a & "b" <c>"#), r#"a &amp; "b" &lt;c&gt;"#);
    }

    #[test]
    fn empty_element_self_closes() {
        assert_eq!(Element::new("a").to_xml().unwrap(), "<a/>");
    }

    #[test]
    fn document_has_declaration() {
        let doc = Element::new("a").to_document().unwrap();
        assert!(doc.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?><a"));
    }

    #[test]
    fn lookup_and_mutation() {
        let mut root = Element::new("infBPe");
        let mut ide = Element::new("ide");
        ide.push_text("cDV", "1");
        root.push(ide);
        assert_eq!(root.find("cDV").map(Element::text), Some("1".to_string()));

        if let Some(cdv) = root.child_mut("ide").and_then(|ide| ide.child_mut("cDV")) {
            cdv.set_text("7");
        }
        assert_eq!(root.find("cDV").unwrap().text(), "7");

        root.set_attr("Id", "BPe1");
        root.set_attr("Id", "BPe2");
        assert_eq!(root.attr("Id"), Some("BPe2"));
        assert!(root.child("emit").is_none());
    }
}
