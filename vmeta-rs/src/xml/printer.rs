//! XML printer that outputs node trees.
//!
//! Layout: a declaration line, two-space indentation per level, childless
//! elements self-closed, and elements holding text written inline on one
//! line so the text is read back exactly as it was stored.

use std::io::Write;

use crate::node::{NodeRef, XmlContent, XmlElement};
use crate::xml::parser::DOCUMENT_NODE;

/// The declaration written at the top of every saved document.
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// XML printer that outputs node trees.
pub struct XmlPrinter<W: Write> {
    writer: W,
    indent: usize,
}

impl<W: Write> XmlPrinter<W> {
    /// Creates a new XML printer.
    pub fn new(writer: W) -> Self {
        XmlPrinter { writer, indent: 0 }
    }

    /// Prints a document, starting with the XML declaration.
    pub fn print(&mut self, root: &NodeRef) -> std::io::Result<()> {
        writeln!(self.writer, "{}", XML_DECLARATION)?;
        self.print_block(root)?;
        self.writer.flush()
    }

    /// Prints a node on its own indented line(s).
    fn print_block(&mut self, node: &NodeRef) -> std::io::Result<()> {
        let borrowed = node.borrow();

        match borrowed.content() {
            XmlContent::Element(element) if element.name() == DOCUMENT_NODE => {
                for child in borrowed.children() {
                    self.print_block(child)?;
                }
            }
            XmlContent::Element(element) => {
                write!(self.writer, "{}", Self::indent_str(self.indent))?;
                if borrowed.child_count() == 0 {
                    writeln!(self.writer, "{} />", open_tag(element))?;
                } else if borrowed.has_text_child() {
                    // Mixed or text-only content stays on one line
                    self.print_inline(node)?;
                    writeln!(self.writer)?;
                } else {
                    writeln!(self.writer, "{}>", open_tag(element))?;
                    self.indent += 1;
                    for child in borrowed.children() {
                        self.print_block(child)?;
                    }
                    self.indent -= 1;
                    writeln!(
                        self.writer,
                        "{}</{}>",
                        Self::indent_str(self.indent),
                        element.name()
                    )?;
                }
            }
            XmlContent::Comment(comment) => {
                writeln!(self.writer, "{}{}", Self::indent_str(self.indent), comment)?;
            }
            XmlContent::Text(text) => {
                writeln!(
                    self.writer,
                    "{}{}",
                    Self::indent_str(self.indent),
                    escape_text(text.text())
                )?;
            }
        }

        Ok(())
    }

    /// Prints a node and its subtree without any added whitespace.
    fn print_inline(&mut self, node: &NodeRef) -> std::io::Result<()> {
        let borrowed = node.borrow();

        match borrowed.content() {
            XmlContent::Element(element) => {
                if borrowed.child_count() == 0 {
                    write!(self.writer, "{} />", open_tag(element))?;
                } else {
                    write!(self.writer, "{}>", open_tag(element))?;
                    for child in borrowed.children() {
                        self.print_inline(child)?;
                    }
                    write!(self.writer, "</{}>", element.name())?;
                }
            }
            XmlContent::Comment(comment) => write!(self.writer, "{}", comment)?,
            XmlContent::Text(text) => write!(self.writer, "{}", escape_text(text.text()))?,
        }

        Ok(())
    }

    fn indent_str(level: usize) -> String {
        "  ".repeat(level)
    }
}

/// Builds `<name attr="value" ...` without the closing bracket.
fn open_tag(element: &XmlElement) -> String {
    let mut tag = String::new();
    tag.push('<');
    tag.push_str(element.name());
    for (name, value) in element.attributes() {
        tag.push(' ');
        tag.push_str(name);
        tag.push_str("=\"");
        tag.push_str(&escape_attribute(value));
        tag.push('"');
    }
    tag
}

/// Escapes character data.
fn escape_text(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            _ => result.push(c),
        }
    }
    result
}

/// Escapes a double-quoted attribute value.
fn escape_attribute(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}

/// Prints a node tree to a string.
pub fn print_to_string(root: &NodeRef) -> std::io::Result<String> {
    let mut output = Vec::new();
    XmlPrinter::new(&mut output).print(root)?;
    Ok(String::from_utf8_lossy(&output).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_str;

    #[test]
    fn test_print_layout() {
        let xml = r#"<root><group><kitName>100_alpha_modkit</kitName><id value="100"/></group></root>"#;
        let root = parse_str(xml).unwrap();
        let output = print_to_string(&root).unwrap();

        let expected = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
                        <root>\n\
                        \x20 <group>\n\
                        \x20   <kitName>100_alpha_modkit</kitName>\n\
                        \x20   <id value=\"100\" />\n\
                        \x20 </group>\n\
                        </root>\n";
        assert_eq!(output, expected);
    }

    #[test]
    fn test_comments_are_written_verbatim() {
        let xml = "<!--top--><sirens><!-- alpha --><Item /></sirens>";
        let root = parse_str(xml).unwrap();
        let output = print_to_string(&root).unwrap();

        assert!(output.contains("<!--top-->\n<sirens>"));
        assert!(output.contains("  <!-- alpha -->\n  <Item />"));
    }

    #[test]
    fn test_entity_encoding() {
        let xml = r#"<root attr="&amp;&lt;&quot;">a &amp; b</root>"#;
        let root = parse_str(xml).unwrap();
        let output = print_to_string(&root).unwrap();

        assert!(output.contains(r#"attr="&amp;&lt;&quot;""#));
        assert!(output.contains(">a &amp; b</root>"));
    }

    #[test]
    fn test_mixed_content_stays_inline() {
        let xml = "<root><p>one <b>two</b> three</p></root>";
        let root = parse_str(xml).unwrap();
        let output = print_to_string(&root).unwrap();

        assert!(output.contains("  <p>one <b>two</b> three</p>\n"));
    }

    #[test]
    fn test_double_round_trip() {
        // Parse -> Print -> Parse -> Print should produce identical output
        let xml = r#"<doc><!-- c --><section id="s1"><para>First.</para><para>Second &amp; last.</para><empty/></section></doc>"#;
        let tree1 = parse_str(xml).unwrap();
        let output1 = print_to_string(&tree1).unwrap();
        let tree2 = parse_str(&output1).unwrap();
        let output2 = print_to_string(&tree2).unwrap();

        assert_eq!(output1, output2);
    }
}
