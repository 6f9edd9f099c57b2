//! Persist the catalog to disk (`library.json`) so later runs only fetch what is new.

use std::io;
use std::path::{Path, PathBuf};

use super::Catalog;
use crate::storage;

/// Reads and writes one identity's catalog file.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    path: PathBuf,
}

impl CatalogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the catalog. A missing, unreadable, or corrupt file yields an empty
    /// catalog (first-run semantics) and is only logged.
    pub fn load(&self) -> Catalog {
        let bytes = match std::fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Catalog::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "cannot read catalog, starting empty: {}", e);
                return Catalog::new();
            }
        };
        match serde_json::from_slice::<Catalog>(&bytes) {
            Ok(catalog) => catalog,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "cannot parse catalog, starting empty: {}", e);
                Catalog::new()
            }
        }
    }

    /// Replace the catalog file with `catalog` (temp file + rename).
    pub fn save(&self, catalog: &Catalog) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec_pretty(catalog)?;
        storage::write_atomic(&self.path, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogItem;

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = CatalogStore::new(dir.path().join("library.json"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("library.json");
        std::fs::write(&path, b"{ not json").unwrap();
        assert!(CatalogStore::new(&path).load().is_empty());
    }

    #[test]
    fn save_then_load_preserves_order_and_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = CatalogStore::new(dir.path().join("nested").join("library.json"));
        let mut second = CatalogItem::new("b").with_audio_url("http://x/b.mp3");
        second
            .extra
            .insert("title".to_string(), serde_json::Value::from("B side"));
        let catalog = vec![CatalogItem::new("a"), second];

        store.save(&catalog).unwrap();
        let loaded = store.load();
        assert_eq!(loaded, catalog);
        assert!(!storage::temp_path(store.path()).exists());
    }

    #[test]
    fn save_overwrites_previous_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let store = CatalogStore::new(dir.path().join("library.json"));
        store.save(&vec![CatalogItem::new("a"), CatalogItem::new("b")]).unwrap();
        store.save(&vec![CatalogItem::new("z")]).unwrap();
        let loaded = store.load();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "z");
    }
}
