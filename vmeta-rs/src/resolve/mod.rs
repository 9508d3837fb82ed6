//! Identifier conflict resolution across a catalog / variation pair.
//!
//! A [`ConflictResolver`] loads both meta files, seeds an [`IdAllocator`]
//! with every identifier already present in either one, and runs one of two
//! passes:
//!
//! - [`resolve_catalog_conflicts`](ConflictResolver::resolve_catalog_conflicts)
//!   gives every `sirenSettings` value a fresh wide id and mirrors it into
//!   each catalog `id` node that carried the old value.
//! - [`resolve_kit_conflicts`](ConflictResolver::resolve_kit_conflicts)
//!   gives every modkit a fresh compact id, rewriting the kit name, its
//!   sibling `id`, and every `kits` reference in the variation file.
//!
//! Nodes with a missing attribute or text are skipped, not reported. Edits
//! made before an error are not rolled back; the caller's backup is the
//! recovery path.

mod change_set;
mod entity;

pub use change_set::{Change, ChangeSet};
pub use entity::{belongs_to_entity, entity_of, extract_entity_name, kit_prefix};

use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::Rng;
use rustc_hash::FxHashSet;
use tracing::{debug, info, warn};

use crate::config::{PersistPolicy, ResolverConfig};
use crate::constants::{
    ID_TAG, ITEM_TAG, KITS_TAG, KIT_NAME_TAG, MODKIT_MARKER, SIREN_SETTINGS_TAG, VALUE_ATTR,
    VARIATION_DATA_TAG,
};
use crate::error::{Error, Result};
use crate::ids::IdAllocator;
use crate::node::{
    children_named, descendants_named, find_under, first_child_named, NodeInner, NodeRef,
};
use crate::xml::{Document, DocumentKind};

/// A document together with the path it is persisted to.
#[derive(Debug)]
pub struct MetaFile {
    path: PathBuf,
    document: Document,
}

impl MetaFile {
    /// Loads the document at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let document = Document::load(&path)?;
        Ok(MetaFile { path, document })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &Document {
        &self.document
    }
}

/// Collects every identifier in use across both documents: catalog `id`
/// values, `sirenSettings` values, and the numeric prefix of every modkit
/// name in either file.
pub fn existing_ids(catalog: &Document, variations: &Document) -> FxHashSet<i64> {
    let mut ids = FxHashSet::default();
    let mut add = |raw: &str, source: &str| match raw.trim().parse::<i64>() {
        Ok(id) => {
            ids.insert(id);
        }
        Err(_) => debug!(value = raw, source, "skipping non-numeric identifier"),
    };

    for node in descendants_named(catalog.root(), ID_TAG) {
        if let Some(value) = node.borrow().attribute(VALUE_ATTR) {
            add(value, ID_TAG);
        }
    }
    for node in descendants_named(variations.root(), SIREN_SETTINGS_TAG) {
        if let Some(value) = node.borrow().attribute(VALUE_ATTR) {
            add(value, SIREN_SETTINGS_TAG);
        }
    }
    let kit_names = descendants_named(catalog.root(), KIT_NAME_TAG)
        .into_iter()
        .chain(find_under(variations.root(), KITS_TAG, ITEM_TAG));
    for node in kit_names {
        if let Some(text) = node.borrow().text() {
            if text.contains(MODKIT_MARKER) {
                add(kit_prefix(&text), KIT_NAME_TAG);
            }
        }
    }

    ids
}

/// Rewrites conflicting identifiers in a catalog / variation pair.
#[derive(Debug)]
pub struct ConflictResolver<R = StdRng> {
    catalog: MetaFile,
    variations: MetaFile,
    allocator: IdAllocator<R>,
    catalog_persist: PersistPolicy,
    kits_persist: PersistPolicy,
}

impl ConflictResolver<StdRng> {
    /// Loads both files and seeds an OS-seeded allocator from them.
    pub fn open<P: AsRef<Path>, Q: AsRef<Path>>(
        catalog_path: P,
        variations_path: Q,
        config: &ResolverConfig,
    ) -> Result<Self> {
        let catalog = MetaFile::load(catalog_path)?;
        let variations = MetaFile::load(variations_path)?;
        let allocator = IdAllocator::new(existing_ids(&catalog.document, &variations.document));
        Self::configured(catalog, variations, allocator, config)
    }
}

impl<R: Rng> ConflictResolver<R> {
    /// Loads both files and seeds an allocator that draws from `rng`.
    pub fn open_with_rng<P: AsRef<Path>, Q: AsRef<Path>>(
        catalog_path: P,
        variations_path: Q,
        config: &ResolverConfig,
        rng: R,
    ) -> Result<Self> {
        let catalog = MetaFile::load(catalog_path)?;
        let variations = MetaFile::load(variations_path)?;
        let allocator =
            IdAllocator::with_rng(existing_ids(&catalog.document, &variations.document), rng);
        Self::configured(catalog, variations, allocator, config)
    }

    fn configured(
        catalog: MetaFile,
        variations: MetaFile,
        allocator: IdAllocator<R>,
        config: &ResolverConfig,
    ) -> Result<Self> {
        let allocator = allocator.with_ranges(config.ids.wide, config.ids.compact);
        let mut resolver = Self::from_parts(catalog, variations, allocator)?;
        resolver.catalog_persist = config.persist.catalog;
        resolver.kits_persist = config.persist.kits;
        Ok(resolver)
    }

    /// Builds a resolver around already-loaded files and an allocator the
    /// caller seeded (normally with [`existing_ids`]).
    pub fn from_parts(
        catalog: MetaFile,
        variations: MetaFile,
        allocator: IdAllocator<R>,
    ) -> Result<Self> {
        for (file, expected) in [
            (&catalog, DocumentKind::Catalog),
            (&variations, DocumentKind::Variation),
        ] {
            match file.document.kind() {
                None => {
                    return Err(Error::Validation(format!(
                        "{}: unexpected root element <{}>, expected <{}>",
                        file.path.display(),
                        file.document.root_name(),
                        expected.root_name()
                    )))
                }
                Some(kind) if kind != expected => warn!(
                    path = %file.path.display(),
                    "file looks like a {} but was given as the {}",
                    kind,
                    expected
                ),
                Some(_) => {}
            }
        }

        Ok(ConflictResolver {
            catalog,
            variations,
            allocator,
            catalog_persist: PersistPolicy::OnChange,
            kits_persist: PersistPolicy::Always,
        })
    }

    pub fn catalog(&self) -> &MetaFile {
        &self.catalog
    }

    pub fn variations(&self) -> &MetaFile {
        &self.variations
    }

    pub fn allocator(&self) -> &IdAllocator<R> {
        &self.allocator
    }

    /// Gives each `sirenSettings` value in the variation file a fresh wide id
    /// and carries the new value into every catalog `id` node that matched
    /// the old one. With `vehicle`, only variation items of that vehicle are
    /// touched.
    pub fn resolve_catalog_conflicts(&mut self, vehicle: Option<&str>) -> Result<ChangeSet> {
        let vehicle = vehicle_filter(vehicle);
        debug!(vehicle = vehicle.unwrap_or("all"), "resolving catalog conflicts");
        let mut changes = ChangeSet::default();

        let items = find_under(self.variations.document.root(), VARIATION_DATA_TAG, ITEM_TAG);
        let catalog_ids = descendants_named(self.catalog.document.root(), ID_TAG);
        debug!(items = items.len(), "found variation items");

        for item in &items {
            if !in_scope(item, vehicle) {
                continue;
            }
            for siren in children_named(item, SIREN_SETTINGS_TAG) {
                let Some(old) = siren.borrow().attribute(VALUE_ATTR).map(str::to_string) else {
                    continue;
                };
                let new = self.allocator.allocate_wide()?.to_string();
                debug!(%old, %new, "replacing sirenSettings id");
                NodeInner::set_attribute_on_ref(&siren, VALUE_ATTR, &new);
                changes.variations.push(Change::new(&old, &new));

                for id in &catalog_ids {
                    if id.borrow().attribute(VALUE_ATTR) == Some(old.as_str()) {
                        NodeInner::set_attribute_on_ref(id, VALUE_ATTR, &new);
                        changes.catalog.push(Change::new(&old, &new));
                        debug!(%old, %new, "updated matching catalog id");
                    }
                }
            }
        }

        let written = self.persist(self.catalog_persist, &changes)?;
        info!(
            catalog = changes.catalog.len(),
            variations = changes.variations.len(),
            written,
            "catalog conflict pass complete"
        );
        Ok(changes)
    }

    /// Gives each modkit in the catalog a fresh compact id, rewriting the kit
    /// name, its sibling `id`, and every identical `kits` entry in the
    /// variation file. With `vehicle`, only that vehicle's kits are touched.
    pub fn resolve_kit_conflicts(&mut self, vehicle: Option<&str>) -> Result<ChangeSet> {
        let vehicle = vehicle_filter(vehicle);
        debug!(vehicle = vehicle.unwrap_or("all"), "resolving kit conflicts");
        let mut changes = ChangeSet::default();

        let kit_nodes = descendants_named(self.catalog.document.root(), KIT_NAME_TAG);
        let variation_kits = find_under(self.variations.document.root(), KITS_TAG, ITEM_TAG);

        for kit in &kit_nodes {
            if !in_scope(kit, vehicle) {
                continue;
            }
            let Some(old_name) = kit.borrow().text() else {
                continue;
            };
            if !old_name.contains(MODKIT_MARKER) {
                continue;
            }

            let old_id = kit_prefix(&old_name).to_string();
            let new_id = self.allocator.allocate_compact()?.to_string();
            let new_name = old_name.replacen(&old_id, &new_id, 1);
            debug!(old = %old_name, new = %new_name, "replacing kit name");

            NodeInner::set_text_on_ref(kit, &new_name);
            changes.catalog.push(Change::new(&old_name, &new_name));

            if let Some(id) = NodeInner::parent_of_ref(kit).and_then(|p| first_child_named(&p, ID_TAG))
            {
                if id.borrow().attribute(VALUE_ATTR) == Some(old_id.as_str()) {
                    NodeInner::set_attribute_on_ref(&id, VALUE_ATTR, &new_id);
                }
            }

            for item in &variation_kits {
                if item.borrow().text().as_deref() == Some(old_name.as_str()) {
                    NodeInner::set_text_on_ref(item, &new_name);
                    changes.variations.push(Change::new(&old_name, &new_name));
                }
            }
        }

        let written = self.persist(self.kits_persist, &changes)?;
        info!(
            catalog = changes.catalog.len(),
            variations = changes.variations.len(),
            written,
            "kit conflict pass complete"
        );
        Ok(changes)
    }

    /// Writes both documents back. Both are serialized before either file is
    /// touched. Returns whether anything was written.
    fn persist(&self, policy: PersistPolicy, changes: &ChangeSet) -> Result<bool> {
        if policy == PersistPolicy::OnChange && changes.is_empty() {
            debug!("no changes, leaving files untouched");
            return Ok(false);
        }

        let catalog_xml = self.catalog.document.to_xml_string()?;
        let variations_xml = self.variations.document.to_xml_string()?;
        crate::xml::write_serialized(&self.catalog.path, &catalog_xml)?;
        crate::xml::write_serialized(&self.variations.path, &variations_xml)?;
        debug!("changes saved to both files");
        Ok(true)
    }
}

/// A blank vehicle name means no filter.
fn vehicle_filter(vehicle: Option<&str>) -> Option<&str> {
    vehicle.filter(|name| !name.trim().is_empty())
}

fn in_scope(node: &NodeRef, vehicle: Option<&str>) -> bool {
    vehicle.is_none_or(|name| belongs_to_entity(node, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(body: &str) -> Document {
        Document::parse_str(&format!(
            "<CVehicleModelInfoVarGlobal>{}</CVehicleModelInfoVarGlobal>",
            body
        ))
        .unwrap()
    }

    fn variations(body: &str) -> Document {
        Document::parse_str(&format!(
            "<CVehicleModelInfoVariation>{}</CVehicleModelInfoVariation>",
            body
        ))
        .unwrap()
    }

    #[test]
    fn test_existing_ids_covers_both_documents() {
        let cat = catalog(
            r#"<Kits><Item><kitName>321_alpha_modkit</kitName><id value="321" /></Item></Kits>
               <sirens><Item><id value="555" /></Item><Item><id value="oops" /></Item></sirens>"#,
        );
        let var = variations(
            r#"<variationData><Item name="alpha"><sirenSettings value="777" />
               <kits><Item>654_alpha_modkit</Item><Item>not_a_kit</Item></kits></Item></variationData>"#,
        );

        let mut ids: Vec<i64> = existing_ids(&cat, &var).into_iter().collect();
        ids.sort();
        assert_eq!(ids, vec![321, 555, 654, 777]);
    }

    #[test]
    fn test_blank_vehicle_is_no_filter() {
        assert_eq!(vehicle_filter(None), None);
        assert_eq!(vehicle_filter(Some("")), None);
        assert_eq!(vehicle_filter(Some("  \t")), None);
        assert_eq!(vehicle_filter(Some("valor")), Some("valor"));
    }

    #[test]
    fn test_in_scope_without_filter() {
        let var = variations("<Item />");
        assert!(in_scope(var.root(), None));
        assert!(!in_scope(var.root(), Some("alpha")));
    }
}
