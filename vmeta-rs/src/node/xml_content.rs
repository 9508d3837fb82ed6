//! XML content types for tree nodes.
//!
//! This module provides `XmlContent`, which represents the content of an XML node:
//! an element (tag with attributes), text content, or a comment.

/// Represents the content of an XML node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlContent {
    /// An XML element with a name and attributes.
    Element(XmlElement),
    /// XML text content.
    Text(XmlText),
    /// XML comment.
    Comment(XmlComment),
}

impl XmlContent {
    /// Returns true if this is an element node.
    pub fn is_element(&self) -> bool {
        matches!(self, XmlContent::Element(_))
    }

    /// Returns true if this is a text node.
    pub fn is_text(&self) -> bool {
        matches!(self, XmlContent::Text(_))
    }

    /// Returns true if this is a comment node.
    pub fn is_comment(&self) -> bool {
        matches!(self, XmlContent::Comment(_))
    }

    /// Returns a reference to the element, if this is an element node.
    pub fn as_element(&self) -> Option<&XmlElement> {
        match self {
            XmlContent::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Returns a mutable reference to the element, if this is an element node.
    pub fn as_element_mut(&mut self) -> Option<&mut XmlElement> {
        match self {
            XmlContent::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Returns a reference to the text, if this is a text node.
    pub fn as_text(&self) -> Option<&XmlText> {
        match self {
            XmlContent::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Returns a mutable reference to the text, if this is a text node.
    pub fn as_text_mut(&mut self) -> Option<&mut XmlText> {
        match self {
            XmlContent::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Returns a reference to the comment, if this is a comment node.
    pub fn as_comment(&self) -> Option<&XmlComment> {
        match self {
            XmlContent::Comment(c) => Some(c),
            _ => None,
        }
    }
}

/// An XML element with a name and attributes.
///
/// Attributes keep the order they were read in, so a saved document lists
/// them exactly as the original did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
}

impl XmlElement {
    /// Creates a new XML element with the given name and attributes.
    pub fn new(name: &str, attributes: Vec<(String, String)>) -> Self {
        XmlElement {
            name: name.to_string(),
            attributes,
        }
    }

    /// Returns the element name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the attributes in document order.
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Returns the value of the named attribute.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Sets an attribute, replacing it in place or appending it at the end.
    pub fn set_attribute(&mut self, key: &str, value: &str) {
        match self.attributes.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value.to_string(),
            None => self
                .attributes
                .push((key.to_string(), value.to_string())),
        }
    }
}

/// XML text content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlText {
    text: String,
}

impl XmlText {
    /// Creates a new text node.
    pub fn new(text: &str) -> Self {
        XmlText {
            text: text.to_string(),
        }
    }

    /// Returns the text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replaces the text.
    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
    }
}

impl std::fmt::Display for XmlText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// XML comment. The text is kept verbatim, including surrounding spaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlComment {
    text: String,
}

impl XmlComment {
    /// Creates a new comment node.
    pub fn new(text: &str) -> Self {
        XmlComment {
            text: text.to_string(),
        }
    }

    /// Returns the comment text.
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl std::fmt::Display for XmlComment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<!--{}-->", self.text)
    }
}
