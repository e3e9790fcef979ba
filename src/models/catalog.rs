//! Catalog item model, consumed through the `CatalogStore` port.

use serde::{Deserialize, Serialize};

/// An item of the shared content catalog (a book, in the reading platform).
///
/// Only the fields the content-based recommender scores against are carried
/// here; full item management lives outside this subsystem.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogItem {
    pub id: String,
    pub title: String,
    pub author: String,
    pub genres: Vec<String>,
    pub description: String,
    /// Broad popularity signal (view or checkout count) used as a small
    /// monotonic boost when ranking
    pub popularity: u64,
}

impl CatalogItem {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
        genres: Vec<String>,
        description: impl Into<String>,
        popularity: u64,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            author: author.into(),
            genres,
            description: description.into(),
            popularity,
        }
    }
}
