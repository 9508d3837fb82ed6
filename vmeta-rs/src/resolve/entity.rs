//! Kit-name parsing and entity scoping.
//!
//! A kit name has the form `<id>_<vehicle>_modkit`. Everything that decides
//! which vehicle a node belongs to goes through [`extract_entity_name`], so
//! the splitting rule lives in one place.

use crate::constants::{ITEM_TAG, KITS_TAG, KIT_NAME_TAG, KIT_SEPARATOR};
use crate::node::{children_named, first_descendant_named, NodeRef};

/// Returns the vehicle segment of a kit name: the second field.
pub fn extract_entity_name(kit_name: &str) -> Option<&str> {
    kit_name.split(KIT_SEPARATOR).nth(1)
}

/// Returns the identifier segment of a kit name: the text before the first separator.
pub fn kit_prefix(kit_name: &str) -> &str {
    kit_name.split(KIT_SEPARATOR).next().unwrap_or(kit_name)
}

/// Finds the vehicle a node belongs to.
///
/// Looked up in order: the node's own text when it is a `kitName`, the first
/// `kitName` below it, then the items of the first `kits` list below it.
pub fn entity_of(node: &NodeRef) -> Option<String> {
    if node.borrow().is_element_named(KIT_NAME_TAG) {
        if let Some(entity) = entity_from_text(node) {
            return Some(entity);
        }
    }

    if let Some(kit) = first_descendant_named(node, KIT_NAME_TAG) {
        if let Some(entity) = entity_from_text(&kit) {
            return Some(entity);
        }
    }

    let kits = first_descendant_named(node, KITS_TAG)?;
    children_named(&kits, ITEM_TAG)
        .iter()
        .find_map(entity_from_text)
}

/// Case-insensitive substring match of `name` against the node's vehicle.
/// A node with no kit name anywhere belongs to no vehicle.
pub fn belongs_to_entity(node: &NodeRef, name: &str) -> bool {
    entity_of(node).is_some_and(|entity| entity.to_lowercase().contains(&name.to_lowercase()))
}

fn entity_from_text(node: &NodeRef) -> Option<String> {
    let text = node.borrow().text()?;
    extract_entity_name(&text).map(str::to_string)
}
