//! Recommendation models: search-term profiles, the pairwise similarity
//! graph, and scored catalog items.

use serde::{Deserialize, Serialize};

use super::CatalogItem;

/// Accumulated search interest of one user in one term.
///
/// `search_count` is incremented on repeated searches and forms the weight
/// of that term in the user's sparse interest vector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchTermProfile {
    pub user_id: String,
    pub term: String,
    pub search_count: u64,
}

impl SearchTermProfile {
    pub fn new(user_id: impl Into<String>, term: impl Into<String>, search_count: u64) -> Self {
        Self {
            user_id: user_id.into(),
            term: term.into(),
            search_count,
        }
    }
}

/// One directed edge of the user similarity graph.
///
/// The underlying cosine metric is symmetric, but both directions are
/// persisted independently so lookups by either endpoint stay simple.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSimilarity {
    pub user_id: String,
    pub other_user_id: String,
    /// Cosine similarity in `[0, 1]`
    pub score: f64,
}

impl UserSimilarity {
    pub fn new(user_id: impl Into<String>, other_user_id: impl Into<String>, score: f64) -> Self {
        Self {
            user_id: user_id.into(),
            other_user_id: other_user_id.into(),
            score,
        }
    }
}

/// A catalog item paired with its relevance score for one ranking pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredItem {
    pub item: CatalogItem,
    pub score: f64,
}
