//! Catalog model: items, new-item diffing, and append-only merge.
//!
//! The engine only understands `id` and `audio_url`; every other field of an
//! item is carried through load → diff → merge → save untouched.

mod store;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

pub use store::CatalogStore;

/// One entry of a remote library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    /// Remaining metadata, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CatalogItem {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            audio_url: None,
            extra: Map::new(),
        }
    }

    pub fn with_audio_url(mut self, url: impl Into<String>) -> Self {
        self.audio_url = Some(url.into());
        self
    }

    /// Asset URL if the item is downloadable (an empty string counts as absent).
    pub fn asset_url(&self) -> Option<&str> {
        self.audio_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }
}

/// Ordered list of every item ever seen for an identity (old items first).
pub type Catalog = Vec<CatalogItem>;

/// Body of the remote catalog endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCatalog {
    #[serde(default)]
    pub items: Vec<CatalogItem>,
}

/// Items of `fetched` whose id is not in `old`, in `fetched` order.
///
/// An id repeated inside `fetched` is reported once (first occurrence) so the
/// merged catalog keeps unique ids.
pub fn diff(old: &[CatalogItem], fetched: &[CatalogItem]) -> Vec<CatalogItem> {
    let mut seen: HashSet<&str> = old.iter().map(|i| i.id.as_str()).collect();
    fetched
        .iter()
        .filter(|item| seen.insert(item.id.as_str()))
        .cloned()
        .collect()
}

/// Append `new_items` after `old`. Callers pass the output of [`diff`].
pub fn merge(mut old: Catalog, new_items: &[CatalogItem]) -> Catalog {
    old.extend_from_slice(new_items);
    old
}
