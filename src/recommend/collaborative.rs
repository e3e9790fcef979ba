//! Collaborative filtering over sparse search-term interest vectors.
//!
//! Builds one `term -> search-count` vector per user, compares users by
//! cosine similarity, and persists the resulting similarity graph. The full
//! pairwise pass is quadratic in user count and only ever runs as an
//! offline job with bounded concurrency.

use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::models::UserSimilarity;
use crate::storage::{SearchHistoryStore, SimilarityStore, UserDirectory};
use crate::{RenownError, Result};

/// Rows kept by the popular-terms refresh.
pub const POPULAR_TERMS_CAP: usize = 50;

/// Cosine similarity of two sparse vectors.
///
/// Defined as exactly `0.0` when either vector is empty or has zero
/// magnitude, so there is no division by zero. Symmetric in its arguments.
pub fn cosine_similarity(a: &HashMap<String, f64>, b: &HashMap<String, f64>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    // Iterate the smaller side for the dot product.
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let dot: f64 = small
        .iter()
        .filter_map(|(term, w)| large.get(term).map(|v| w * v))
        .sum();
    let mag_a: f64 = a.values().map(|w| w * w).sum::<f64>().sqrt();
    let mag_b: f64 = b.values().map(|w| w * w).sum::<f64>().sqrt();
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }
    dot / (mag_a * mag_b)
}

/// Collaborative recommender over the user similarity graph.
#[derive(Debug)]
pub struct CollaborativeRecommender {
    history: Arc<dyn SearchHistoryStore>,
    similarities: Arc<dyn SimilarityStore>,
    directory: Arc<dyn UserDirectory>,
    shard_concurrency: usize,
    popular: std::sync::RwLock<Vec<(String, u64)>>,
}

impl CollaborativeRecommender {
    pub fn new(
        history: Arc<dyn SearchHistoryStore>,
        similarities: Arc<dyn SimilarityStore>,
        directory: Arc<dyn UserDirectory>,
        shard_concurrency: usize,
    ) -> Self {
        Self {
            history,
            similarities,
            directory,
            shard_concurrency: shard_concurrency.max(1),
            popular: std::sync::RwLock::new(Vec::new()),
        }
    }

    async fn vector_for(&self, user_id: &str) -> Result<HashMap<String, f64>> {
        Ok(self
            .history
            .terms_for(user_id)
            .await?
            .into_iter()
            .map(|profile| (profile.term, profile.search_count as f64))
            .collect())
    }

    async fn all_vectors(&self) -> Result<HashMap<String, HashMap<String, f64>>> {
        let mut vectors = HashMap::new();
        for user_id in self.history.user_ids().await? {
            let vector = self.vector_for(&user_id).await?;
            if !vector.is_empty() {
                vectors.insert(user_id, vector);
            }
        }
        Ok(vectors)
    }

    /// Full pairwise batch: persist every ordered pair `(u, v)` with
    /// `u != v` whose similarity reaches `similarity_threshold`.
    ///
    /// Users are processed with bounded concurrency; a failed write is
    /// logged and skipped, so the pass reports an updated-pair count rather
    /// than failing hard. Every pair write is independent and idempotent,
    /// which makes the batch safe to interrupt and re-run.
    pub async fn run_batch(&self, similarity_threshold: f64) -> Result<usize> {
        if !(0.0..=1.0).contains(&similarity_threshold) {
            return Err(RenownError::InvalidArgument(format!(
                "similarity threshold must be in [0, 1], got {similarity_threshold}"
            )));
        }

        let vectors = self.all_vectors().await?;
        let similarities = &self.similarities;
        let vectors_ref = &vectors;

        let futures: Vec<_> = vectors_ref
            .iter()
            .map(|(user_id, vector)| async move {
                let mut written = 0usize;
                for (other_id, other_vector) in vectors_ref.iter() {
                    if other_id == user_id {
                        continue;
                    }
                    let score = cosine_similarity(vector, other_vector);
                    if score < similarity_threshold {
                        continue;
                    }
                    match similarities
                        .upsert(UserSimilarity::new(user_id.clone(), other_id.clone(), score))
                        .await
                    {
                        Ok(()) => written += 1,
                        Err(e) => warn!(
                            user = %user_id,
                            other = %other_id,
                            error = %e,
                            "similarity write failed, continuing batch"
                        ),
                    }
                }
                written
            })
            .collect();
        let updated = stream::iter(futures)
            .buffer_unordered(self.shard_concurrency)
            .fold(0usize, |acc, written| async move { acc + written })
            .await;

        info!(
            users = vectors.len(),
            updated, similarity_threshold, "collaborative filtering batch complete"
        );
        Ok(updated)
    }

    /// Incremental pass after one user's search activity changed: drop the
    /// user's outgoing edges, then recompute that user against every other
    /// user with a non-empty vector, writing both directions of each pair.
    /// Clearing first keeps edges to users who no longer share any terms
    /// from surviving the rewrite.
    pub async fn update_for_user(&self, user_id: &str) -> Result<usize> {
        if !self.directory.exists(user_id).await? {
            return Err(RenownError::NotFound(format!("unknown user {user_id}")));
        }

        let vector = self.vector_for(user_id).await?;
        if vector.is_empty() {
            debug!(user = %user_id, "no search history, nothing to update");
            return Ok(0);
        }

        self.similarities.clear_for(user_id).await?;
        let mut updated = 0usize;
        for (other_id, other_vector) in self.all_vectors().await? {
            if other_id == user_id {
                continue;
            }
            let score = cosine_similarity(&vector, &other_vector);
            self.similarities
                .upsert(UserSimilarity::new(user_id, other_id.clone(), score))
                .await?;
            self.similarities
                .upsert(UserSimilarity::new(other_id, user_id, score))
                .await?;
            updated += 2;
        }
        debug!(user = %user_id, updated, "incremental similarity update");
        Ok(updated)
    }

    /// Most similar users by stored similarity, descending.
    pub async fn get_recommended_users(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<UserSimilarity>> {
        if limit == 0 {
            return Err(RenownError::InvalidArgument(
                "limit must be positive".to_string(),
            ));
        }
        if !self.directory.exists(user_id).await? {
            return Err(RenownError::NotFound(format!("unknown user {user_id}")));
        }
        Ok(self.similarities.top_for(user_id, limit).await?)
    }

    /// Refresh the cached platform-wide popular terms (hourly job).
    /// Aggregates search counts across all users; idempotent.
    pub async fn refresh_popular_terms(&self) -> Result<usize> {
        let mut totals: HashMap<String, u64> = HashMap::new();
        for user_id in self.history.user_ids().await? {
            for profile in self.history.terms_for(&user_id).await? {
                *totals.entry(profile.term).or_insert(0) += profile.search_count;
            }
        }
        let mut ranked: Vec<(String, u64)> = totals.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(POPULAR_TERMS_CAP);
        let count = ranked.len();

        if let Ok(mut popular) = self.popular.write() {
            *popular = ranked;
        }
        info!(terms = count, "popular terms refreshed");
        Ok(count)
    }

    /// The current popular-terms list, highest total first.
    pub fn popular_terms(&self, limit: usize) -> Vec<(String, u64)> {
        self.popular
            .read()
            .map(|popular| popular.iter().take(limit).cloned().collect())
            .unwrap_or_default()
    }
}
