//! Node structures for the in-memory document tree.
//!
//! A document is a graph of reference-counted nodes with weak parent links.
//! Each node records its position among its siblings, so the resolver can
//! walk from a kit name to its sibling `id` node, or from a siren item back
//! to the comment written above it.

mod xml_content;

pub use xml_content::{XmlComment, XmlContent, XmlElement, XmlText};

use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// A reference-counted pointer to a node.
pub type NodeRef = Rc<RefCell<NodeInner>>;

/// Creates a new node reference holding the given content.
pub fn new_node(content: XmlContent) -> NodeRef {
    Rc::new(RefCell::new(NodeInner::new(content)))
}

/// Creates a new element node with no attributes.
pub fn new_element(name: &str) -> NodeRef {
    new_node(XmlContent::Element(XmlElement::new(name, Vec::new())))
}

/// The inner data of a node in the document tree.
#[derive(Debug)]
pub struct NodeInner {
    /// Child nodes, in document order.
    children: Vec<NodeRef>,
    /// XML content of this node.
    content: XmlContent,
    /// Weak reference to parent node.
    parent: Weak<RefCell<NodeInner>>,
    /// Zero-based position among siblings (-1 for an unattached node).
    child_pos: i32,
}

impl NodeInner {
    fn new(content: XmlContent) -> Self {
        NodeInner {
            children: Vec::new(),
            content,
            parent: Weak::new(),
            child_pos: -1,
        }
    }

    /// Returns the content of this node.
    pub fn content(&self) -> &XmlContent {
        &self.content
    }

    /// Returns the number of children.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Returns a reference to the child at the given index.
    pub fn child(&self, index: usize) -> Option<&NodeRef> {
        self.children.get(index)
    }

    /// Returns the children as a slice.
    pub fn children(&self) -> &[NodeRef] {
        &self.children
    }

    /// Returns a weak reference to the parent.
    pub fn parent(&self) -> &Weak<RefCell<NodeInner>> {
        &self.parent
    }

    /// Returns the child position (0-based index among siblings, -1 when detached).
    pub fn child_pos(&self) -> i32 {
        self.child_pos
    }

    /// Returns the element name, or `None` for text and comment nodes.
    pub fn element_name(&self) -> Option<&str> {
        self.content.as_element().map(XmlElement::name)
    }

    /// Returns true if this node is an element with the given name.
    pub fn is_element_named(&self, name: &str) -> bool {
        self.element_name() == Some(name)
    }

    /// Returns the value of an attribute, if this is an element carrying it.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.content.as_element().and_then(|e| e.attribute(key))
    }

    /// Returns the first direct text child, like the leading text of an element.
    pub fn text(&self) -> Option<String> {
        self.children.iter().find_map(|child| {
            child
                .borrow()
                .content()
                .as_text()
                .map(|t| t.text().to_string())
        })
    }

    /// Returns true if any direct child is a text node.
    pub fn has_text_child(&self) -> bool {
        self.children
            .iter()
            .any(|child| child.borrow().content().is_text())
    }
}

/// Helper functions that work with NodeRef.
impl NodeInner {
    /// Adds a child node. Must be called on the NodeRef wrapper.
    pub fn add_child_to_ref(parent_ref: &NodeRef, child_ref: NodeRef) {
        {
            let mut child = child_ref.borrow_mut();
            child.parent = Rc::downgrade(parent_ref);
            child.child_pos = parent_ref.borrow().children.len() as i32;
        }
        parent_ref.borrow_mut().children.push(child_ref);
    }

    /// Returns the parent node, if it is still alive.
    pub fn parent_of_ref(node_ref: &NodeRef) -> Option<NodeRef> {
        node_ref.borrow().parent.upgrade()
    }

    /// Gets the left sibling of a node.
    pub fn left_sibling_of_ref(node_ref: &NodeRef) -> Option<NodeRef> {
        let node = node_ref.borrow();
        if node.child_pos <= 0 {
            return None;
        }
        if let Some(parent) = node.parent.upgrade() {
            let parent_borrowed = parent.borrow();
            let sibling_index = (node.child_pos - 1) as usize;
            parent_borrowed.children.get(sibling_index).cloned()
        } else {
            None
        }
    }

    /// Sets an attribute on an element node. Does nothing for other nodes.
    pub fn set_attribute_on_ref(node_ref: &NodeRef, key: &str, value: &str) {
        if let Some(element) = node_ref.borrow_mut().content.as_element_mut() {
            element.set_attribute(key, value);
        }
    }

    /// Replaces the first direct text child of an element, or appends one
    /// when the element has no text yet.
    pub fn set_text_on_ref(node_ref: &NodeRef, text: &str) {
        let existing = node_ref
            .borrow()
            .children
            .iter()
            .find(|child| child.borrow().content().is_text())
            .cloned();
        match existing {
            Some(text_node) => {
                if let Some(t) = text_node.borrow_mut().content.as_text_mut() {
                    t.set_text(text);
                }
            }
            None => {
                let text_node = new_node(XmlContent::Text(XmlText::new(text)));
                NodeInner::add_child_to_ref(node_ref, text_node);
            }
        }
    }
}

/// Collects every element below `node` (not including `node` itself) in
/// document order.
pub fn descendants(node: &NodeRef) -> Vec<NodeRef> {
    let mut out = Vec::new();
    collect_descendants(node, &mut |_| true, &mut out);
    out
}

/// Collects every element below `node` with the given name, in document order.
pub fn descendants_named(node: &NodeRef, name: &str) -> Vec<NodeRef> {
    let mut out = Vec::new();
    collect_descendants(node, &mut |n| n.is_element_named(name), &mut out);
    out
}

/// Returns the first element below `node` with the given name.
pub fn first_descendant_named(node: &NodeRef, name: &str) -> Option<NodeRef> {
    for child in node.borrow().children() {
        if child.borrow().is_element_named(name) {
            return Some(child.clone());
        }
        if let Some(found) = first_descendant_named(child, name) {
            return Some(found);
        }
    }
    None
}

/// Returns the direct children of `node` that are elements with the given name.
pub fn children_named(node: &NodeRef, name: &str) -> Vec<NodeRef> {
    node.borrow()
        .children()
        .iter()
        .filter(|child| child.borrow().is_element_named(name))
        .cloned()
        .collect()
}

/// Returns the first direct child of `node` that is an element with the given name.
pub fn first_child_named(node: &NodeRef, name: &str) -> Option<NodeRef> {
    node.borrow()
        .children()
        .iter()
        .find(|child| child.borrow().is_element_named(name))
        .cloned()
}

/// Finds `child` elements directly under any `container` element below `node`,
/// the equivalent of the path `.//container/child`.
pub fn find_under(node: &NodeRef, container: &str, child: &str) -> Vec<NodeRef> {
    descendants_named(node, container)
        .iter()
        .flat_map(|c| children_named(c, child))
        .collect()
}

fn collect_descendants(
    node: &NodeRef,
    keep: &mut dyn FnMut(&NodeInner) -> bool,
    out: &mut Vec<NodeRef>,
) {
    for child in node.borrow().children() {
        if keep(&child.borrow()) && child.borrow().content().is_element() {
            out.push(child.clone());
        }
        collect_descendants(child, keep, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_node(text: &str) -> NodeRef {
        new_node(XmlContent::Text(XmlText::new(text)))
    }

    #[test]
    fn test_add_child() {
        let parent = new_element("parent");
        let child1 = new_element("child1");
        let child2 = new_element("child2");

        NodeInner::add_child_to_ref(&parent, child1.clone());
        NodeInner::add_child_to_ref(&parent, child2.clone());

        assert_eq!(parent.borrow().child_count(), 2);
        assert_eq!(child1.borrow().child_pos(), 0);
        assert_eq!(child2.borrow().child_pos(), 1);
        let up = NodeInner::parent_of_ref(&child2).unwrap();
        assert!(Rc::ptr_eq(&up, &parent));
    }

    #[test]
    fn test_left_sibling() {
        let parent = new_element("sirens");
        let comment = new_node(XmlContent::Comment(XmlComment::new(" alpha ")));
        let item = new_element("Item");

        NodeInner::add_child_to_ref(&parent, comment.clone());
        NodeInner::add_child_to_ref(&parent, item.clone());

        assert!(NodeInner::left_sibling_of_ref(&comment).is_none());
        let left = NodeInner::left_sibling_of_ref(&item).unwrap();
        assert!(left.borrow().content().is_comment());
    }

    #[test]
    fn test_set_text_replaces_first_text_child() {
        let kit = new_element("kitName");
        NodeInner::add_child_to_ref(&kit, text_node("100_alpha_modkit"));

        NodeInner::set_text_on_ref(&kit, "200_alpha_modkit");

        assert_eq!(kit.borrow().child_count(), 1);
        assert_eq!(kit.borrow().text().as_deref(), Some("200_alpha_modkit"));
    }

    #[test]
    fn test_set_text_appends_when_missing() {
        let item = new_element("Item");
        NodeInner::set_text_on_ref(&item, "hello");
        assert_eq!(item.borrow().text().as_deref(), Some("hello"));
    }

    #[test]
    fn test_descendant_queries() {
        // root > kits > Item, Item ; root > other > kits > Item
        let root = new_element("root");
        let kits = new_element("kits");
        let other = new_element("other");
        let nested_kits = new_element("kits");
        NodeInner::add_child_to_ref(&root, kits.clone());
        NodeInner::add_child_to_ref(&root, other.clone());
        NodeInner::add_child_to_ref(&other, nested_kits.clone());
        for parent in [&kits, &kits, &nested_kits] {
            NodeInner::add_child_to_ref(parent, new_element("Item"));
        }

        assert_eq!(descendants(&root).len(), 6);
        assert_eq!(descendants_named(&root, "kits").len(), 2);
        assert_eq!(find_under(&root, "kits", "Item").len(), 3);
        assert_eq!(children_named(&root, "kits").len(), 1);
        let first = first_descendant_named(&other, "Item").unwrap();
        assert!(Rc::ptr_eq(
            &NodeInner::parent_of_ref(&first).unwrap(),
            &nested_kits
        ));
        assert!(first_child_named(&root, "Item").is_none());
    }

    #[test]
    fn test_set_attribute_ignores_text_nodes() {
        let text = text_node("x");
        NodeInner::set_attribute_on_ref(&text, "value", "1");
        assert_eq!(text.borrow().attribute("value"), None);

        let id = new_element("id");
        NodeInner::set_attribute_on_ref(&id, "value", "1");
        assert_eq!(id.borrow().attribute("value"), Some("1"));
    }
}
