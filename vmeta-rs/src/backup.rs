//! Timestamped backup copies of the input files.
//!
//! The resolver never calls this; front ends take a backup before the first
//! mutation so a failed or unwanted run can be undone by copying files back.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::info;

use crate::error::{Error, Result};

/// Copies `files` into a new directory `<prefix><YYYYmmdd_HHMMSS>` under
/// `parent` and returns that directory. A `_1`, `_2`, ... suffix is added
/// when a backup was already taken in the same second.
pub fn create_backup<P: AsRef<Path>>(files: &[P], parent: &Path, prefix: &str) -> Result<PathBuf> {
    for file in files {
        if !file.as_ref().is_file() {
            return Err(Error::NotFound(file.as_ref().to_path_buf()));
        }
    }

    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let dir = fresh_dir(parent, &format!("{}{}", prefix, stamp))?;

    for file in files {
        let file = file.as_ref();
        let name = file.file_name().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} has no file name", file.display()),
            )
        })?;
        let mut target = dir.join(name);
        let mut n = 1;
        while target.exists() {
            target = dir.join(format!("{}_{}", n, name.to_string_lossy()));
            n += 1;
        }
        fs::copy(file, &target)?;
    }

    info!(dir = %dir.display(), files = files.len(), "created backup");
    Ok(dir)
}

fn fresh_dir(parent: &Path, base: &str) -> Result<PathBuf> {
    fs::create_dir_all(parent)?;
    let mut n = 0u32;
    loop {
        let name = if n == 0 {
            base.to_string()
        } else {
            format!("{}_{}", base, n)
        };
        let candidate = parent.join(name);
        match fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => n += 1,
            Err(e) => return Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backup_copies_files() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("carcols.meta");
        let b = dir.path().join("carvariations.meta");
        fs::write(&a, "<a />").unwrap();
        fs::write(&b, "<b />").unwrap();

        let backups = dir.path().join("backups");
        let out = create_backup(&[&a, &b], &backups, "backups_").unwrap();

        assert!(out.starts_with(&backups));
        let name = out.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("backups_"));
        assert_eq!(fs::read_to_string(out.join("carcols.meta")).unwrap(), "<a />");
        assert_eq!(fs::read_to_string(out.join("carvariations.meta")).unwrap(), "<b />");
    }

    #[test]
    fn test_each_backup_gets_its_own_directory() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("carcols.meta");
        fs::write(&a, "<a />").unwrap();

        let first = create_backup(&[&a], dir.path(), "bk_").unwrap();
        let second = create_backup(&[&a], dir.path(), "bk_").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_same_file_name_twice_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("x")).unwrap();
        fs::create_dir(dir.path().join("y")).unwrap();
        let a = dir.path().join("x").join("data.meta");
        let b = dir.path().join("y").join("data.meta");
        fs::write(&a, "one").unwrap();
        fs::write(&b, "two").unwrap();

        let out = create_backup(&[&a, &b], dir.path(), "bk_").unwrap();
        assert_eq!(fs::read_to_string(out.join("data.meta")).unwrap(), "one");
        assert_eq!(fs::read_to_string(out.join("1_data.meta")).unwrap(), "two");
    }

    #[test]
    fn test_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone.meta");
        let err = create_backup(&[&missing], dir.path(), "bk_").unwrap_err();
        assert!(matches!(err, Error::NotFound(p) if p == missing));
        // Nothing is created when a source is missing
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
