//! Storage capability the loader depends on.

use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

/// Read-only access to the catalog tree.
pub trait CatalogSource {
    /// Child directories of `path`, sorted by name, hidden (`.`-prefixed)
    /// entries skipped. A missing directory yields an empty list.
    fn list_child_directories(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    /// Raw contents of the document at `path`, or `None` if it does not exist.
    fn read_document(&self, path: &Path) -> io::Result<Option<Vec<u8>>>;
}

impl<S: CatalogSource + ?Sized> CatalogSource for &S {
    fn list_child_directories(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        (**self).list_child_directories(path)
    }

    fn read_document(&self, path: &Path) -> io::Result<Option<Vec<u8>>> {
        (**self).read_document(path)
    }
}

/// [`CatalogSource`] over the local filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsSource;

impl CatalogSource for FsSource {
    fn list_child_directories(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let entries = match fs::read_dir(path) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err),
        };
        let mut dirs = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            // Follows symlinks, so linked brand directories are listed too.
            if entry.path().is_dir() {
                dirs.push(entry.path());
            }
        }
        dirs.sort();
        Ok(dirs)
    }

    fn read_document(&self, path: &Path) -> io::Result<Option<Vec<u8>>> {
        match fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::TempDir;

    #[test]
    fn lists_visible_directories_in_name_order() -> Result<()> {
        let dir = TempDir::new()?;
        for name in ["zeta", "alpha", ".git", "mid"] {
            fs::create_dir(dir.path().join(name))?;
        }
        fs::write(dir.path().join("brand.json"), "{}")?;
        let names: Vec<String> = FsSource
            .list_child_directories(dir.path())?
            .iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
        Ok(())
    }

    #[test]
    fn missing_paths_are_empty_not_errors() -> Result<()> {
        let dir = TempDir::new()?;
        let missing = dir.path().join("nope");
        assert!(FsSource.list_child_directories(&missing)?.is_empty());
        assert!(FsSource.read_document(&missing.join("brand.json"))?.is_none());
        Ok(())
    }
}
