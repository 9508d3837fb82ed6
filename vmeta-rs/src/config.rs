//! TOML configuration.
//!
//! Every key is optional; a missing file section falls back to the defaults
//! below, which reproduce the tool's built-in behavior.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::constants::{COMPACT_RANGE, MAX_RANGE_LEN, WIDE_RANGE};
use crate::error::{Error, Result};
use crate::ids::IdRange;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolverConfig {
    /// Minimum tracing level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Identifier allocation ranges.
    #[serde(default)]
    pub ids: IdsConfig,

    /// When each resolution pass writes the documents back.
    #[serde(default)]
    pub persist: PersistConfig,

    /// Backup copies taken before a pass runs.
    #[serde(default)]
    pub backup: BackupConfig,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            ids: IdsConfig::default(),
            persist: PersistConfig::default(),
            backup: BackupConfig::default(),
        }
    }
}

impl ResolverConfig {
    /// Loads and validates a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let config = Self::from_toml(&text)?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Parses and validates configuration text.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: ResolverConfig =
            toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (name, range) in [("wide", self.ids.wide), ("compact", self.ids.compact)] {
            if range.is_empty() {
                return Err(Error::Config(format!(
                    "ids.{} range is empty: min {} > max {}",
                    name, range.min, range.max
                )));
            }
            if range.min < 0 {
                return Err(Error::Config(format!(
                    "ids.{} range starts below zero: min {}",
                    name, range.min
                )));
            }
            if range.len() > MAX_RANGE_LEN {
                return Err(Error::Config(format!(
                    "ids.{} range holds more than {} values",
                    name, MAX_RANGE_LEN
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Identifier allocation ranges.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdsConfig {
    #[serde(default = "default_wide")]
    pub wide: IdRange,
    #[serde(default = "default_compact")]
    pub compact: IdRange,
}

fn default_wide() -> IdRange {
    WIDE_RANGE
}
fn default_compact() -> IdRange {
    COMPACT_RANGE
}

impl Default for IdsConfig {
    fn default() -> Self {
        Self {
            wide: default_wide(),
            compact: default_compact(),
        }
    }
}

/// Whether a pass saves the documents unconditionally or only after a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PersistPolicy {
    OnChange,
    Always,
}

/// Persistence policy for each resolution pass.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PersistConfig {
    #[serde(default = "default_catalog_persist")]
    pub catalog: PersistPolicy,
    #[serde(default = "default_kits_persist")]
    pub kits: PersistPolicy,
}

fn default_catalog_persist() -> PersistPolicy {
    PersistPolicy::OnChange
}
fn default_kits_persist() -> PersistPolicy {
    PersistPolicy::Always
}

impl Default for PersistConfig {
    fn default() -> Self {
        Self {
            catalog: default_catalog_persist(),
            kits: default_kits_persist(),
        }
    }
}

/// Backup settings used by the command-line front end.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackupConfig {
    #[serde(default = "default_backup_enabled")]
    pub enabled: bool,
    /// Directory the timestamped backup folder is created in.
    #[serde(default = "default_backup_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_backup_prefix")]
    pub prefix: String,
}

fn default_backup_enabled() -> bool {
    true
}
fn default_backup_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_backup_prefix() -> String {
    "backups_".into()
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            enabled: default_backup_enabled(),
            dir: default_backup_dir(),
            prefix: default_backup_prefix(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ResolverConfig::from_toml("").unwrap();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.ids.wide, WIDE_RANGE);
        assert_eq!(config.ids.compact, COMPACT_RANGE);
        assert_eq!(config.persist.catalog, PersistPolicy::OnChange);
        assert_eq!(config.persist.kits, PersistPolicy::Always);
        assert!(config.backup.enabled);
        assert_eq!(config.backup.prefix, "backups_");
    }

    #[test]
    fn test_full_config() {
        let config = ResolverConfig::from_toml(
            r#"
log_level = "debug"

[ids]
wide = { min = 20000, max = 29999 }

[persist]
kits = "on-change"

[backup]
enabled = false
dir = "/tmp/meta-backups"
"#,
        )
        .unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.ids.wide, IdRange::new(20_000, 29_999));
        assert_eq!(config.ids.compact, COMPACT_RANGE);
        assert_eq!(config.persist.kits, PersistPolicy::OnChange);
        assert!(!config.backup.enabled);
        assert_eq!(config.backup.dir, PathBuf::from("/tmp/meta-backups"));
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let err = ResolverConfig::from_toml("[ids]\ncompact = { min = 10, max = 9 }").unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("ids.compact")));
    }

    #[test]
    fn test_negative_range_is_rejected() {
        let err = ResolverConfig::from_toml("[ids]\nwide = { min = -10, max = 10 }").unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("below zero")));
    }

    #[test]
    fn test_oversized_range_is_rejected() {
        let err = ResolverConfig::from_toml("[ids]\nwide = { min = 0, max = 9223372036854775807 }")
            .unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("ids.wide")));

        let err =
            ResolverConfig::from_toml("[ids]\ncompact = { min = -10, max = 9223372036854775807 }")
                .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(matches!(
            ResolverConfig::from_toml("[persist]\nsirens = \"always\""),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ResolverConfig::load(&dir.path().join("vmeta.toml")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
