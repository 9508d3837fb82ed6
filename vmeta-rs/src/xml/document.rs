//! Loaded meta documents.

use std::fmt;
use std::fs;
use std::path::Path;

use tracing::debug;

use super::parser::{parse_file, parse_str};
use super::printer::print_to_string;
use crate::constants::{CATALOG_ROOT, VARIATION_ROOT};
use crate::error::{Error, Result};
use crate::node::NodeRef;

/// The two meta document shapes the resolver understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Customization catalog: kits, their ids, and siren definitions.
    Catalog,
    /// Variation catalog: per-vehicle siren settings and kit references.
    Variation,
}

impl DocumentKind {
    /// Returns the root element name that identifies this kind.
    pub fn root_name(self) -> &'static str {
        match self {
            DocumentKind::Catalog => CATALOG_ROOT,
            DocumentKind::Variation => VARIATION_ROOT,
        }
    }

    /// Maps a root element name to its kind.
    pub fn from_root_name(name: &str) -> Option<Self> {
        match name {
            CATALOG_ROOT => Some(DocumentKind::Catalog),
            VARIATION_ROOT => Some(DocumentKind::Variation),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Catalog => write!(f, "catalog"),
            DocumentKind::Variation => write!(f, "variation catalog"),
        }
    }
}

/// A parsed meta document.
#[derive(Debug)]
pub struct Document {
    /// Synthetic node above the root element; also holds top-level comments.
    node: NodeRef,
    /// The root element.
    root: NodeRef,
}

impl Document {
    fn from_node(node: NodeRef) -> Result<Self> {
        let root = node
            .borrow()
            .children()
            .iter()
            .find(|c| c.borrow().content().is_element())
            .cloned()
            .ok_or_else(|| Error::Parse("document has no root element".to_string()))?;
        Ok(Document { node, root })
    }

    /// Parses a document from a string.
    pub fn parse_str(xml: &str) -> Result<Self> {
        Self::from_node(parse_str(xml)?)
    }

    /// Loads a document from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }
        let node = parse_file(path).map_err(|e| match e {
            Error::Parse(msg) => Error::Parse(format!("{}: {}", path.display(), msg)),
            other => other,
        })?;
        debug!(path = %path.display(), "loaded document");
        Self::from_node(node)
    }

    /// Serializes the document with its declaration and indentation.
    pub fn to_xml_string(&self) -> Result<String> {
        Ok(print_to_string(&self.node)?)
    }

    /// Serializes the document and writes it to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let xml = self.to_xml_string()?;
        write_serialized(path.as_ref(), &xml)
    }

    /// Returns the synthetic document node.
    pub fn node(&self) -> &NodeRef {
        &self.node
    }

    /// Returns the root element.
    pub fn root(&self) -> &NodeRef {
        &self.root
    }

    /// Returns the root element's name.
    pub fn root_name(&self) -> String {
        self.root
            .borrow()
            .element_name()
            .unwrap_or_default()
            .to_string()
    }

    /// Returns the document kind, or `None` for an unrecognized root.
    pub fn kind(&self) -> Option<DocumentKind> {
        DocumentKind::from_root_name(&self.root_name())
    }

    /// True only when the root element is one of the two recognized names.
    pub fn is_expected_kind(&self) -> bool {
        self.kind().is_some()
    }
}

/// Writes already-serialized markup to `path`.
pub(crate) fn write_serialized(path: &Path, xml: &str) -> Result<()> {
    fs::write(path, xml).map_err(|source| Error::Write {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = xml.len(), "saved document");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{descendants, XmlContent};

    const CATALOG: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!-- generated -->
<CVehicleModelInfoVarGlobal>
  <Kits>
    <Item>
      <kitName>100_alpha_modkit</kitName>
      <id value="100" />
    </Item>
  </Kits>
  <sirens>
    <!-- alpha -->
    <Item>
      <id value="555" />
    </Item>
  </sirens>
</CVehicleModelInfoVarGlobal>
"#;

    /// Compares element names, attributes, text and comments recursively.
    fn trees_equal(a: &NodeRef, b: &NodeRef) -> bool {
        let a = a.borrow();
        let b = b.borrow();
        let same_content = match (a.content(), b.content()) {
            (XmlContent::Element(x), XmlContent::Element(y)) => x == y,
            (XmlContent::Text(x), XmlContent::Text(y)) => x == y,
            (XmlContent::Comment(x), XmlContent::Comment(y)) => x == y,
            _ => false,
        };
        same_content
            && a.child_count() == b.child_count()
            && a.children()
                .iter()
                .zip(b.children())
                .all(|(x, y)| trees_equal(x, y))
    }

    #[test]
    fn test_kind_detection() {
        let doc = Document::parse_str(CATALOG).unwrap();
        assert_eq!(doc.kind(), Some(DocumentKind::Catalog));
        assert!(doc.is_expected_kind());

        let doc = Document::parse_str("<CVehicleModelInfoVariation />").unwrap();
        assert_eq!(doc.kind(), Some(DocumentKind::Variation));

        let doc = Document::parse_str("<vehicles />").unwrap();
        assert_eq!(doc.kind(), None);
        assert!(!doc.is_expected_kind());
    }

    #[test]
    fn test_round_trip_preserves_structure() {
        let doc = Document::parse_str(CATALOG).unwrap();
        let reparsed = Document::parse_str(&doc.to_xml_string().unwrap()).unwrap();

        assert!(trees_equal(doc.node(), reparsed.node()));
        assert_eq!(descendants(reparsed.root()).len(), 7);
    }

    #[test]
    fn test_round_trip_is_stable_for_canonical_input() {
        let doc = Document::parse_str(CATALOG).unwrap();
        assert_eq!(doc.to_xml_string().unwrap(), CATALOG);
    }

    #[test]
    fn test_load_and_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("carcols.meta");
        fs::write(&path, CATALOG).unwrap();

        let doc = Document::load(&path).unwrap();
        let copy = dir.path().join("copy.meta");
        doc.save(&copy).unwrap();

        assert_eq!(fs::read_to_string(&copy).unwrap(), CATALOG);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.meta");
        assert!(matches!(Document::load(&missing), Err(Error::NotFound(p)) if p == missing));
    }

    #[test]
    fn test_load_malformed_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.meta");
        fs::write(&path, "<CVehicleModelInfoVarGlobal><Kits></CVehicleModelInfoVarGlobal>").unwrap();

        match Document::load(&path) {
            Err(Error::Parse(msg)) => assert!(msg.contains("broken.meta")),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_save_to_missing_directory_is_a_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let doc = Document::parse_str(CATALOG).unwrap();
        let target = dir.path().join("no-such-dir").join("out.meta");
        assert!(matches!(doc.save(&target), Err(Error::Write { .. })));
    }
}
