//! Read-only inventory of a catalog / variation pair.
//!
//! Lists what the resolver would work on: kits and their ids, siren items
//! with the comment naming their vehicle, variation items with their siren
//! settings and kit references, and identifier values used more than once.

use std::collections::BTreeMap;
use std::fmt;

use crate::constants::{
    ID_TAG, ITEM_TAG, KITS_TAG, KIT_NAME_TAG, MODKIT_MARKER, NAME_ATTR, SIRENS_TAG,
    SIREN_SETTINGS_TAG, VALUE_ATTR, VARIATION_DATA_TAG,
};
use crate::node::{children_named, descendants_named, find_under, first_child_named, NodeInner, NodeRef};
use crate::resolve::{extract_entity_name, kit_prefix};
use crate::xml::Document;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KitEntry {
    pub kit_name: String,
    /// `value` of the sibling `id` node.
    pub id: Option<String>,
    pub vehicle: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SirenEntry {
    /// Text of the comment directly above the item, trimmed.
    pub comment: Option<String>,
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariationEntry {
    pub name: Option<String>,
    pub siren_settings: Vec<String>,
    pub kits: Vec<String>,
}

/// An identifier value seen more than once in the same role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Duplicate {
    pub role: &'static str,
    pub value: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    pub kits: Vec<KitEntry>,
    pub sirens: Vec<SirenEntry>,
    pub variations: Vec<VariationEntry>,
    pub duplicates: Vec<Duplicate>,
}

impl Inventory {
    /// Builds the inventory. Neither document is modified.
    pub fn collect(catalog: &Document, variations: &Document) -> Self {
        let kits: Vec<KitEntry> = descendants_named(catalog.root(), KIT_NAME_TAG)
            .iter()
            .filter_map(|kit| {
                let kit_name = kit.borrow().text()?;
                let id = NodeInner::parent_of_ref(kit)
                    .and_then(|p| first_child_named(&p, ID_TAG))
                    .and_then(|id| value_of(&id));
                let vehicle = extract_entity_name(&kit_name).map(str::to_string);
                Some(KitEntry {
                    kit_name,
                    id,
                    vehicle,
                })
            })
            .collect();

        let sirens = find_under(catalog.root(), SIRENS_TAG, ITEM_TAG)
            .iter()
            .map(|item| SirenEntry {
                comment: preceding_comment(item),
                id: first_child_named(item, ID_TAG).and_then(|id| value_of(&id)),
            })
            .collect();

        let variations: Vec<VariationEntry> =
            find_under(variations.root(), VARIATION_DATA_TAG, ITEM_TAG)
                .iter()
                .map(|item| VariationEntry {
                    name: item.borrow().attribute(NAME_ATTR).map(str::to_string),
                    siren_settings: children_named(item, SIREN_SETTINGS_TAG)
                        .iter()
                        .filter_map(value_of)
                        .collect(),
                    kits: find_under(item, KITS_TAG, ITEM_TAG)
                        .iter()
                        .filter_map(|k| k.borrow().text())
                        .collect(),
                })
                .collect();

        let mut duplicates = repeated(
            "siren setting",
            variations.iter().flat_map(|v| v.siren_settings.iter().cloned()),
        );
        duplicates.extend(repeated(
            "kit id",
            kits.iter()
                .filter(|k| k.kit_name.contains(MODKIT_MARKER))
                .map(|k| kit_prefix(&k.kit_name).to_string()),
        ));

        Inventory {
            kits,
            sirens,
            variations,
            duplicates,
        }
    }
}

fn value_of(node: &NodeRef) -> Option<String> {
    node.borrow().attribute(VALUE_ATTR).map(str::to_string)
}

/// Returns the comment immediately before `node`, if there is one.
fn preceding_comment(node: &NodeRef) -> Option<String> {
    let sibling = NodeInner::left_sibling_of_ref(node)?;
    let sibling = sibling.borrow();
    sibling
        .content()
        .as_comment()
        .map(|c| c.text().trim().to_string())
}

fn repeated(role: &'static str, values: impl Iterator<Item = String>) -> Vec<Duplicate> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for value in values {
        *counts.entry(value).or_default() += 1;
    }
    counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(value, count)| Duplicate { role, value, count })
        .collect()
}

fn or_dash(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}

impl fmt::Display for Inventory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Kits ({}):", self.kits.len())?;
        for kit in &self.kits {
            writeln!(
                f,
                "  {}  id={}  vehicle={}",
                kit.kit_name,
                or_dash(&kit.id),
                or_dash(&kit.vehicle)
            )?;
        }

        writeln!(f, "Siren items ({}):", self.sirens.len())?;
        for siren in &self.sirens {
            writeln!(f, "  id={}  {}", or_dash(&siren.id), or_dash(&siren.comment))?;
        }

        writeln!(f, "Variation items ({}):", self.variations.len())?;
        for item in &self.variations {
            writeln!(
                f,
                "  {}  sirenSettings=[{}]  kits=[{}]",
                or_dash(&item.name),
                item.siren_settings.join(", "),
                item.kits.join(", ")
            )?;
        }

        if self.duplicates.is_empty() {
            writeln!(f, "No duplicate identifiers.")?;
        } else {
            writeln!(f, "Duplicate identifiers:")?;
            for dup in &self.duplicates {
                writeln!(f, "  {} {} used {} times", dup.role, dup.value, dup.count)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"<CVehicleModelInfoVarGlobal>
  <Kits>
    <Item><kitName>100_alpha_modkit</kitName><id value="100" /></Item>
    <Item><kitName>100_beta_modkit</kitName><id value="100" /></Item>
  </Kits>
  <sirens>
    <!-- alpha lights -->
    <Item><id value="555" /></Item>
    <Item><id value="556" /></Item>
  </sirens>
</CVehicleModelInfoVarGlobal>"#;

    const VARIATIONS: &str = r#"<CVehicleModelInfoVariation>
  <variationData>
    <Item name="alpha">
      <sirenSettings value="555" />
      <kits><Item>100_alpha_modkit</Item></kits>
    </Item>
    <Item name="beta">
      <sirenSettings value="555" />
    </Item>
  </variationData>
</CVehicleModelInfoVariation>"#;

    #[test]
    fn test_collect_inventory() {
        let catalog = Document::parse_str(CATALOG).unwrap();
        let variations = Document::parse_str(VARIATIONS).unwrap();
        let inventory = Inventory::collect(&catalog, &variations);

        assert_eq!(inventory.kits.len(), 2);
        assert_eq!(
            inventory.kits[0],
            KitEntry {
                kit_name: "100_alpha_modkit".into(),
                id: Some("100".into()),
                vehicle: Some("alpha".into()),
            }
        );

        assert_eq!(inventory.sirens[0].comment.as_deref(), Some("alpha lights"));
        assert_eq!(inventory.sirens[0].id.as_deref(), Some("555"));
        // The comment belongs to the first item only
        assert_eq!(inventory.sirens[1].comment, None);

        assert_eq!(inventory.variations[0].name.as_deref(), Some("alpha"));
        assert_eq!(inventory.variations[0].kits, vec!["100_alpha_modkit"]);
        assert!(inventory.variations[1].kits.is_empty());

        assert_eq!(
            inventory.duplicates,
            vec![
                Duplicate {
                    role: "siren setting",
                    value: "555".into(),
                    count: 2
                },
                Duplicate {
                    role: "kit id",
                    value: "100".into(),
                    count: 2
                },
            ]
        );
    }

    #[test]
    fn test_display_lists_every_section() {
        let catalog = Document::parse_str(CATALOG).unwrap();
        let variations = Document::parse_str(VARIATIONS).unwrap();
        let report = Inventory::collect(&catalog, &variations).to_string();

        assert!(report.contains("Kits (2):"));
        assert!(report.contains("  id=555  alpha lights"));
        assert!(report.contains("  beta  sirenSettings=[555]  kits=[]"));
        assert!(report.contains("  siren setting 555 used 2 times"));
    }
}
