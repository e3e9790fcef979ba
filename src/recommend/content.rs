//! Content-based scoring of catalog items against a reference keyword
//! vector.
//!
//! Keywords are extracted from an item's structured fields with fixed field
//! weights (title above genre above author above description). Similarity
//! is an unnormalized dot product over shared keywords, which deliberately
//! favors items with many strong overlapping terms over merely
//! proportionally similar ones.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::models::{CatalogItem, ScoredItem};
use crate::recommend::cache::RecommendationCache;
use crate::storage::{CatalogStore, SearchHistoryStore, UserDirectory};
use crate::{RenownError, Result};

/// Field weight for title tokens.
pub const TITLE_WEIGHT: f64 = 3.0;
/// Field weight for genre tokens.
pub const GENRE_WEIGHT: f64 = 2.0;
/// Field weight for author tokens.
pub const AUTHOR_WEIGHT: f64 = 1.5;
/// Field weight for description tokens.
pub const DESCRIPTION_WEIGHT: f64 = 1.0;
/// Tokens shorter than this many characters are dropped.
pub const MIN_TOKEN_LEN: usize = 2;
/// Per-popularity-point boost added to every candidate's score.
pub const POPULARITY_BOOST: f64 = 0.01;

/// Split on non-alphanumeric boundaries, Unicode-aware so mixed-script
/// text tokenizes sensibly, lowercase, and drop short tokens.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.chars().count() >= MIN_TOKEN_LEN)
        .map(|token| token.to_lowercase())
}

fn add_field(keywords: &mut HashMap<String, f64>, text: &str, weight: f64) {
    for token in tokenize(text) {
        *keywords.entry(token).or_insert(0.0) += weight;
    }
}

/// Weighted keyword multiset of one catalog item. Repeated tokens sum
/// their field weights.
pub fn extract_keywords(item: &CatalogItem) -> HashMap<String, f64> {
    let mut keywords = HashMap::new();
    add_field(&mut keywords, &item.title, TITLE_WEIGHT);
    for genre in &item.genres {
        add_field(&mut keywords, genre, GENRE_WEIGHT);
    }
    add_field(&mut keywords, &item.author, AUTHOR_WEIGHT);
    add_field(&mut keywords, &item.description, DESCRIPTION_WEIGHT);
    keywords
}

/// Rank `candidates` against a reference keyword vector.
///
/// Score = sum over shared keywords of `weight_ref * weight_candidate`,
/// plus a small monotonic popularity boost. The sort is stable and leaves
/// ties in input order; the result is paginated by `offset`/`limit`.
pub fn score_against(
    reference: &HashMap<String, f64>,
    candidates: &[CatalogItem],
    offset: usize,
    limit: usize,
) -> Vec<ScoredItem> {
    let mut scored: Vec<ScoredItem> = candidates
        .iter()
        .map(|item| {
            let keywords = extract_keywords(item);
            let overlap: f64 = keywords
                .iter()
                .filter_map(|(token, weight)| reference.get(token).map(|r| r * weight))
                .sum();
            ScoredItem {
                score: overlap + item.popularity as f64 * POPULARITY_BOOST,
                item: item.clone(),
            }
        })
        .collect();
    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored.into_iter().skip(offset).take(limit).collect()
}

/// Content-based recommender with a bounded TTL'd read cache.
#[derive(Debug)]
pub struct ContentBasedRecommender {
    catalog: Arc<dyn CatalogStore>,
    history: Arc<dyn SearchHistoryStore>,
    directory: Arc<dyn UserDirectory>,
    cache: RecommendationCache,
}

impl ContentBasedRecommender {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        history: Arc<dyn SearchHistoryStore>,
        directory: Arc<dyn UserDirectory>,
        cache: RecommendationCache,
    ) -> Self {
        Self {
            catalog,
            history,
            directory,
            cache,
        }
    }

    /// Items most similar to `item_id` by keyword overlap, self excluded.
    pub async fn get_similar_items(&self, item_id: &str, limit: usize) -> Result<Vec<ScoredItem>> {
        if limit == 0 {
            return Err(RenownError::InvalidArgument(
                "limit must be positive".to_string(),
            ));
        }

        let key = format!("similar:{item_id}:{limit}");
        if let Some(hit) = self.cache.get(&key) {
            debug!(item = %item_id, "similar-items cache hit");
            return Ok(hit);
        }

        let reference_item = self
            .catalog
            .item_by_id(item_id)
            .await?
            .ok_or_else(|| RenownError::NotFound(format!("unknown item {item_id}")))?;
        let reference = extract_keywords(&reference_item);
        let candidates: Vec<CatalogItem> = self
            .catalog
            .all_items()
            .await?
            .into_iter()
            .filter(|item| item.id != item_id)
            .collect();

        let ranked = score_against(&reference, &candidates, 0, limit);
        self.cache.put(key, ranked.clone());
        Ok(ranked)
    }

    /// Items ranked against a user's derived interest-keyword vector
    /// (search terms weighted by count).
    pub async fn get_personalized_items(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<ScoredItem>> {
        if limit == 0 {
            return Err(RenownError::InvalidArgument(
                "limit must be positive".to_string(),
            ));
        }
        if !self.directory.exists(user_id).await? {
            return Err(RenownError::NotFound(format!("unknown user {user_id}")));
        }

        let key = format!("personalized:{user_id}:{limit}");
        if let Some(hit) = self.cache.get(&key) {
            debug!(user = %user_id, "personalized-items cache hit");
            return Ok(hit);
        }

        let mut reference: HashMap<String, f64> = HashMap::new();
        for profile in self.history.terms_for(user_id).await? {
            // Terms go through the same normalization as item keywords so
            // mixed-case searches still match.
            for token in tokenize(&profile.term) {
                *reference.entry(token).or_insert(0.0) += profile.search_count as f64;
            }
        }

        let candidates = self.catalog.all_items().await?;
        let ranked = score_against(&reference, &candidates, 0, limit);
        self.cache.put(key, ranked.clone());
        Ok(ranked)
    }

    /// Drop cached rankings; called by batch jobs that rewrite underlying
    /// data.
    pub fn invalidate_cache(&self) {
        self.cache.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{InMemoryCatalog, InMemorySearchHistory, InMemoryUserDirectory};

    #[test]
    fn tokenize_is_unicode_aware_and_drops_short_tokens() {
        let tokens: Vec<String> = tokenize("Der Zauberberg: роман Томаса Манна (1924)").collect();
        assert!(tokens.contains(&"der".to_string()));
        assert!(tokens.contains(&"zauberberg".to_string()));
        assert!(tokens.contains(&"роман".to_string()));
        assert!(tokens.contains(&"1924".to_string()));
        // single-character tokens are dropped
        let tokens: Vec<String> = tokenize("a b cd").collect();
        assert_eq!(tokens, vec!["cd".to_string()]);
    }

    #[test]
    fn keywords_sum_weights_on_repeats() {
        let item = CatalogItem::new(
            "b1",
            "Sea Stories",
            "Ann Sea",
            vec!["sea".to_string()],
            "stories of the sea",
            0,
        );
        let keywords = extract_keywords(&item);
        // title 3.0 + genre 2.0 + author 1.5 + description 1.0
        assert!((keywords["sea"] - 7.5).abs() < 1e-12);
        // title 3.0 + description 1.0
        assert!((keywords["stories"] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn title_match_outranks_description_match() {
        let reference = extract_keywords(&CatalogItem::new(
            "ref",
            "Mountain Echoes",
            "R. Ridge",
            vec!["nature".to_string()],
            "walks among peaks",
            0,
        ));
        let title_match = CatalogItem::new(
            "t",
            "Mountain Trails",
            "Someone Else",
            vec!["travel".to_string()],
            "a guide",
            10,
        );
        let description_match = CatalogItem::new(
            "d",
            "City Lights",
            "Someone Else",
            vec!["travel".to_string()],
            "city walks at night",
            10,
        );

        let ranked = score_against(&reference, &[description_match, title_match], 0, 10);
        assert_eq!(ranked[0].item.id, "t");
        assert!(ranked[0].score > ranked[1].score);
    }

    #[test]
    fn ties_keep_input_order_and_pagination_applies() {
        let reference = HashMap::new();
        let items: Vec<CatalogItem> = ["x", "y", "z"]
            .iter()
            .map(|id| CatalogItem::new(*id, "title", "author", vec![], "", 5))
            .collect();
        let ranked = score_against(&reference, &items, 0, 10);
        let ids: Vec<&str> = ranked.iter().map(|s| s.item.id.as_str()).collect();
        assert_eq!(ids, vec!["x", "y", "z"]);

        let page = score_against(&reference, &items, 1, 1);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].item.id, "y");
    }

    #[test]
    fn popularity_breaks_otherwise_tied_items() {
        let reference = extract_keywords(&CatalogItem::new(
            "ref",
            "Gardens",
            "A",
            vec![],
            "",
            0,
        ));
        let modest = CatalogItem::new("m", "Gardens", "B", vec![], "", 10);
        let popular = CatalogItem::new("p", "Gardens", "C", vec![], "", 500);
        let ranked = score_against(&reference, &[modest, popular], 0, 10);
        assert_eq!(ranked[0].item.id, "p");
    }

    async fn seeded_recommender() -> (Arc<ContentBasedRecommender>, Arc<InMemorySearchHistory>) {
        let catalog = Arc::new(InMemoryCatalog::new());
        catalog
            .add_item(CatalogItem::new(
                "b1",
                "Rust in Practice",
                "Ferris Crab",
                vec!["programming".to_string()],
                "systems programming with rust",
                50,
            ))
            .await;
        catalog
            .add_item(CatalogItem::new(
                "b2",
                "Rust and Ruin",
                "I. Oxide",
                vec!["fantasy".to_string()],
                "a kingdom of rust",
                80,
            ))
            .await;
        catalog
            .add_item(CatalogItem::new(
                "b3",
                "Garden Birds",
                "A. Finch",
                vec!["nature".to_string()],
                "bird watching at home",
                120,
            ))
            .await;

        let history = Arc::new(InMemorySearchHistory::new());
        let directory = Arc::new(InMemoryUserDirectory::new());
        directory.add_user("alice", "Alice").await;

        let recommender = Arc::new(ContentBasedRecommender::new(
            catalog,
            history.clone(),
            directory,
            RecommendationCache::new(16, 60),
        ));
        (recommender, history)
    }

    #[tokio::test]
    async fn similar_items_excludes_self_and_ranks_overlap() {
        let (recommender, _) = seeded_recommender().await;
        let similar = recommender.get_similar_items("b1", 10).await.unwrap();
        assert_eq!(similar.len(), 2);
        assert!(similar.iter().all(|s| s.item.id != "b1"));
        assert_eq!(similar[0].item.id, "b2");
    }

    #[tokio::test]
    async fn similar_items_unknown_item_is_not_found() {
        let (recommender, _) = seeded_recommender().await;
        assert!(matches!(
            recommender.get_similar_items("nope", 5).await.unwrap_err(),
            RenownError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn personalized_items_follow_search_history() {
        let (recommender, history) = seeded_recommender().await;
        for _ in 0..5 {
            history.record_search("alice", "rust").await;
        }
        let items = recommender
            .get_personalized_items("alice", 2)
            .await
            .unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|s| s.item.id != "b3"));
    }

    #[tokio::test]
    async fn personalized_items_served_from_cache_until_invalidated() {
        let (recommender, history) = seeded_recommender().await;
        history.record_search("alice", "rust").await;
        let first = recommender
            .get_personalized_items("alice", 3)
            .await
            .unwrap();

        // New history is invisible until the cache is invalidated.
        for _ in 0..10 {
            history.record_search("alice", "birds").await;
        }
        let cached = recommender
            .get_personalized_items("alice", 3)
            .await
            .unwrap();
        assert_eq!(first, cached);

        recommender.invalidate_cache();
        let fresh = recommender
            .get_personalized_items("alice", 3)
            .await
            .unwrap();
        assert_ne!(first, fresh);
    }
}
