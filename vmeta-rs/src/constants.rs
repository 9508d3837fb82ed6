//! Constants used throughout the resolver.

use crate::ids::IdRange;

/// Root element of a customization catalog (`carcols.meta`).
pub const CATALOG_ROOT: &str = "CVehicleModelInfoVarGlobal";

/// Root element of a variation catalog (`carvariations.meta`).
pub const VARIATION_ROOT: &str = "CVehicleModelInfoVariation";

/// Range for catalog identifiers (siren settings and their `id` nodes).
pub const WIDE_RANGE: IdRange = IdRange::new(10_000, 99_999);

/// Range for modkit identifiers.
pub const COMPACT_RANGE: IdRange = IdRange::new(10, 999_999);

/// Largest range a configuration may ask for.
pub const MAX_RANGE_LEN: u64 = u32::MAX as u64;

/// Rejected draws tolerated before the allocator falls back to enumerating
/// the free values of a range.
pub const MAX_REJECTED_DRAWS: usize = 64;

/// Separator between the fields of a kit name (`<id>_<vehicle>_modkit`).
pub const KIT_SEPARATOR: char = '_';

/// Substring every modkit name carries.
pub const MODKIT_MARKER: &str = "_modkit";

pub const ID_TAG: &str = "id";
pub const KIT_NAME_TAG: &str = "kitName";
pub const KITS_TAG: &str = "kits";
pub const ITEM_TAG: &str = "Item";
pub const SIRENS_TAG: &str = "sirens";
pub const SIREN_SETTINGS_TAG: &str = "sirenSettings";
pub const VARIATION_DATA_TAG: &str = "variationData";
pub const VALUE_ATTR: &str = "value";
pub const NAME_ATTR: &str = "name";
