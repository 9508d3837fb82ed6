//! Records of rewritten identifiers.

use std::fmt;

/// One rewritten value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub old: String,
    pub new: String,
}

impl Change {
    pub fn new(old: &str, new: &str) -> Self {
        Change {
            old: old.to_string(),
            new: new.to_string(),
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.old, self.new)
    }
}

/// Changes made by one resolution pass, in the order they were applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// Rewrites in the customization catalog.
    pub catalog: Vec<Change>,
    /// Rewrites in the variation catalog.
    pub variations: Vec<Change>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty() && self.variations.is_empty()
    }

    /// Total number of rewrites across both documents.
    pub fn len(&self) -> usize {
        self.catalog.len() + self.variations.len()
    }
}

impl fmt::Display for ChangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (title, changes) in [
            ("Catalog changes", &self.catalog),
            ("Variation changes", &self.variations),
        ] {
            writeln!(f, "{}:", title)?;
            if changes.is_empty() {
                writeln!(f, "  (none)")?;
            }
            for change in changes {
                writeln!(f, "  {}", change)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_format() {
        let changes = ChangeSet {
            catalog: vec![Change::new("555", "12345")],
            variations: vec![],
        };
        assert_eq!(changes.len(), 1);
        assert!(!changes.is_empty());
        assert_eq!(
            changes.to_string(),
            "Catalog changes:\n  555 → 12345\nVariation changes:\n  (none)\n"
        );
    }
}
