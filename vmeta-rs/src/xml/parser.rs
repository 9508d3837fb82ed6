//! XML parser that builds node trees.
//!
//! This parser uses quick-xml's streaming API. Whitespace-only text between
//! elements is layout and is dropped; every other piece of text is kept
//! verbatim so kit names round-trip exactly.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Error, Result};
use crate::node::{new_node, NodeInner, NodeRef, XmlComment, XmlContent, XmlElement, XmlText};

/// Name of the synthetic node that holds the root element and any top-level comments.
pub const DOCUMENT_NODE: &str = "$ROOT$";

/// XML parser that builds node trees.
#[derive(Debug, Default)]
pub struct XmlParser;

impl XmlParser {
    /// Creates a new parser.
    pub fn new() -> Self {
        XmlParser
    }

    /// Parses XML from a string.
    pub fn parse_str(&self, xml: &str) -> Result<NodeRef> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(false);
        self.parse_reader(&mut reader)
    }

    /// Parses XML from a file.
    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<NodeRef> {
        let file = File::open(path)?;
        let mut reader = Reader::from_reader(BufReader::new(file));
        reader.config_mut().trim_text(false);
        self.parse_reader(&mut reader)
    }

    /// Parses XML from a quick-xml Reader.
    fn parse_reader<R: BufRead>(&self, reader: &mut Reader<R>) -> Result<NodeRef> {
        let root = new_node(XmlContent::Element(XmlElement::new(DOCUMENT_NODE, Vec::new())));

        let mut node_stack: Vec<NodeRef> = vec![root.clone()];
        let mut current_text: Option<String> = None;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    flush_text(&mut current_text, &node_stack);
                    let node = new_node(XmlContent::Element(self.parse_element(e, reader)?));
                    if let Some(parent) = node_stack.last() {
                        NodeInner::add_child_to_ref(parent, node.clone());
                    }
                    node_stack.push(node);
                }
                Ok(Event::End(_)) => {
                    flush_text(&mut current_text, &node_stack);
                    node_stack.pop();
                }
                Ok(Event::Empty(ref e)) => {
                    // Self-closing tag - handle like Start + End
                    flush_text(&mut current_text, &node_stack);
                    let node = new_node(XmlContent::Element(self.parse_element(e, reader)?));
                    if let Some(parent) = node_stack.last() {
                        NodeInner::add_child_to_ref(parent, node);
                    }
                }
                Ok(Event::Text(e)) => {
                    let raw =
                        std::str::from_utf8(e.as_ref()).map_err(|e| Error::Parse(e.to_string()))?;
                    let text = unescape(raw).map_err(|e| Error::Parse(e.to_string()))?;
                    current_text.get_or_insert_with(String::new).push_str(&text);
                }
                Ok(Event::GeneralRef(e)) => {
                    let resolved = match e
                        .resolve_char_ref()
                        .map_err(|e| Error::Parse(e.to_string()))?
                    {
                        Some(c) => c.to_string(),
                        None => {
                            let name = std::str::from_utf8(e.as_ref())
                                .map_err(|e| Error::Parse(e.to_string()))?;
                            resolve_predefined_entity(name)
                                .ok_or_else(|| Error::Parse(format!("unknown entity &{};", name)))?
                                .to_string()
                        }
                    };
                    current_text
                        .get_or_insert_with(String::new)
                        .push_str(&resolved);
                }
                Ok(Event::CData(ref e)) => {
                    // Treat CDATA like text
                    let text = String::from_utf8_lossy(e.as_ref());
                    current_text.get_or_insert_with(String::new).push_str(&text);
                }
                Ok(Event::Comment(ref e)) => {
                    flush_text(&mut current_text, &node_stack);
                    let comment_text = String::from_utf8_lossy(e.as_ref()).to_string();
                    let comment_node = new_node(XmlContent::Comment(XmlComment::new(&comment_text)));
                    if let Some(parent) = node_stack.last() {
                        NodeInner::add_child_to_ref(parent, comment_node);
                    }
                }
                Ok(Event::Eof) => break,
                Ok(Event::Decl(_)) | Ok(Event::PI(_)) | Ok(Event::DocType(_)) => {
                    // The declaration is regenerated on save
                }
                Err(e) => {
                    return Err(Error::Parse(format!(
                        "at byte {}: {}",
                        reader.error_position(),
                        e
                    )))
                }
            }
            buf.clear();
        }

        if node_stack.len() > 1 {
            let open = node_stack
                .last()
                .and_then(|n| n.borrow().element_name().map(str::to_string))
                .unwrap_or_default();
            return Err(Error::Parse(format!("unclosed element <{}>", open)));
        }

        let has_root = root
            .borrow()
            .children()
            .iter()
            .any(|c| c.borrow().content().is_element());
        if !has_root {
            return Err(Error::Parse("document has no root element".to_string()));
        }

        Ok(root)
    }

    /// Parses an element's name and attributes.
    fn parse_element<R: BufRead>(&self, e: &BytesStart, reader: &Reader<R>) -> Result<XmlElement> {
        let name = reader
            .decoder()
            .decode(e.name().as_ref())
            .map_err(|e| Error::Parse(e.to_string()))?
            .to_string();

        let mut attributes = Vec::new();
        for attr_result in e.attributes() {
            let attr = attr_result.map_err(|e| Error::Parse(format!("Attribute error: {}", e)))?;
            let key = reader
                .decoder()
                .decode(attr.key.as_ref())
                .map_err(|e| Error::Parse(e.to_string()))?
                .to_string();
            let value = attr
                .decode_and_unescape_value(reader.decoder())
                .map_err(|e| Error::Parse(e.to_string()))?
                .to_string();
            attributes.push((key, value));
        }

        Ok(XmlElement::new(&name, attributes))
    }
}

/// Attaches accumulated text to the innermost open element. Whitespace-only
/// runs are indentation and are discarded.
fn flush_text(current_text: &mut Option<String>, node_stack: &[NodeRef]) {
    if let Some(text) = current_text.take() {
        if text.trim().is_empty() {
            return;
        }
        if let Some(parent) = node_stack.last() {
            NodeInner::add_child_to_ref(parent, new_node(XmlContent::Text(XmlText::new(&text))));
        }
    }
}

/// Parses XML from a file.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<NodeRef> {
    XmlParser::new().parse_file(path)
}

/// Parses XML from a string.
pub fn parse_str(xml: &str) -> Result<NodeRef> {
    XmlParser::new().parse_str(xml)
}
