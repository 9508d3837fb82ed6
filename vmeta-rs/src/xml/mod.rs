//! XML parsing and output.
//!
//! [`Document`] is the entry point: it loads a meta file into a mutable node
//! tree, reports which of the two recognized meta kinds it is, and writes it
//! back with stable formatting.

mod document;
mod parser;
mod printer;

pub use document::{Document, DocumentKind};
pub(crate) use document::write_serialized;
pub use parser::{parse_file, parse_str, XmlParser, DOCUMENT_NODE};
pub use printer::{print_to_string, XmlPrinter, XML_DECLARATION};
