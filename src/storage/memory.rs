//! In-memory storage backends.
//!
//! These back the embedded assembly and double as test fakes for the
//! collaborator ports. Durable-store stand-ins use `tokio::sync::RwLock`
//! over plain maps; the realtime ranking structure uses a `std` lock since
//! its operations never await.

use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::models::{
    ActivityRecord, CatalogItem, LeaderboardEntry, LeaderboardType, RankTier, SearchTermProfile,
    UserScore, UserSimilarity,
};
use crate::storage::errors::{StorageError, StorageResult};
use crate::storage::traits::{
    ActivityLog, CatalogStore, LeaderboardStore, RealtimeRankingStore, ScoreStore,
    SearchHistoryStore, SimilarityStore, UserDirectory,
};

/// In-memory [`ScoreStore`].
#[derive(Debug, Default)]
pub struct InMemoryScoreStore {
    scores: RwLock<HashMap<String, UserScore>>,
}

impl InMemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ScoreStore for InMemoryScoreStore {
    async fn get(&self, user_id: &str) -> StorageResult<Option<UserScore>> {
        Ok(self.scores.read().await.get(user_id).cloned())
    }

    async fn put(&self, score: UserScore) -> StorageResult<()> {
        self.scores
            .write()
            .await
            .insert(score.user_id.clone(), score);
        Ok(())
    }

    async fn compare_and_update(
        &self,
        user_id: &str,
        expected_current: i64,
        updated: UserScore,
    ) -> StorageResult<bool> {
        let mut scores = self.scores.write().await;
        match scores.get(user_id) {
            Some(existing) if existing.current_score == expected_current => {
                scores.insert(user_id.to_string(), updated);
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(StorageError::NotFound(format!(
                "no score record for user {user_id}"
            ))),
        }
    }

    async fn top_by_score(&self, limit: usize) -> StorageResult<Vec<UserScore>> {
        let mut scores: Vec<UserScore> = self.scores.read().await.values().cloned().collect();
        scores.sort_by(|a, b| {
            b.current_score
                .cmp(&a.current_score)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        scores.truncate(limit);
        Ok(scores)
    }

    async fn by_tier(&self, tier: RankTier) -> StorageResult<Vec<UserScore>> {
        let mut scores: Vec<UserScore> = self
            .scores
            .read()
            .await
            .values()
            .filter(|s| s.rank_tier == tier)
            .cloned()
            .collect();
        scores.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        Ok(scores)
    }

    async fn suspicious(&self, report_threshold: u32) -> StorageResult<Vec<UserScore>> {
        let mut scores: Vec<UserScore> = self
            .scores
            .read()
            .await
            .values()
            .filter(|s| s.suspicious_activity || s.report_count >= report_threshold)
            .cloned()
            .collect();
        scores.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        Ok(scores)
    }

    async fn suspended(&self) -> StorageResult<Vec<UserScore>> {
        let mut scores: Vec<UserScore> = self
            .scores
            .read()
            .await
            .values()
            .filter(|s| s.account_suspended)
            .cloned()
            .collect();
        scores.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        Ok(scores)
    }

    async fn inactive_since(&self, cutoff: DateTime<Utc>) -> StorageResult<Vec<UserScore>> {
        Ok(self
            .scores
            .read()
            .await
            .values()
            .filter(|s| s.last_activity_at < cutoff)
            .cloned()
            .collect())
    }

    async fn all(&self) -> StorageResult<Vec<UserScore>> {
        Ok(self.scores.read().await.values().cloned().collect())
    }
}

/// In-memory append-only [`ActivityLog`].
#[derive(Debug, Default)]
pub struct InMemoryActivityLog {
    records: RwLock<Vec<ActivityRecord>>,
}

impl InMemoryActivityLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ActivityLog for InMemoryActivityLog {
    async fn append(&self, record: ActivityRecord) -> StorageResult<()> {
        self.records.write().await.push(record);
        Ok(())
    }

    async fn for_user(&self, user_id: &str, limit: usize) -> StorageResult<Vec<ActivityRecord>> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .rev()
            .filter(|r| r.user_id == user_id)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PeriodKey {
    leaderboard_type: LeaderboardType,
    period_start: DateTime<Utc>,
    period_end: DateTime<Utc>,
}

/// In-memory [`LeaderboardStore`].
#[derive(Debug, Default)]
pub struct InMemoryLeaderboardStore {
    periods: RwLock<HashMap<PeriodKey, Vec<LeaderboardEntry>>>,
}

impl InMemoryLeaderboardStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LeaderboardStore for InMemoryLeaderboardStore {
    async fn replace_entries(
        &self,
        leaderboard_type: LeaderboardType,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
        entries: Vec<LeaderboardEntry>,
    ) -> StorageResult<()> {
        let key = PeriodKey {
            leaderboard_type,
            period_start,
            period_end,
        };
        // Single map insert under the write lock: delete-then-insert is one
        // atomic step from any reader's point of view.
        self.periods.write().await.insert(key, entries);
        Ok(())
    }

    async fn entries(
        &self,
        leaderboard_type: LeaderboardType,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
        limit: usize,
    ) -> StorageResult<Vec<LeaderboardEntry>> {
        let key = PeriodKey {
            leaderboard_type,
            period_start,
            period_end,
        };
        Ok(self
            .periods
            .read()
            .await
            .get(&key)
            .map(|entries| entries.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn rank_of(
        &self,
        user_id: &str,
        leaderboard_type: LeaderboardType,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    ) -> StorageResult<Option<u32>> {
        let key = PeriodKey {
            leaderboard_type,
            period_start,
            period_end,
        };
        Ok(self.periods.read().await.get(&key).and_then(|entries| {
            entries
                .iter()
                .find(|e| e.user_id == user_id)
                .map(|e| e.rank_position)
        }))
    }
}

/// In-memory [`SimilarityStore`].
#[derive(Debug, Default)]
pub struct InMemorySimilarityStore {
    edges: RwLock<HashMap<String, HashMap<String, f64>>>,
}

impl InMemorySimilarityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SimilarityStore for InMemorySimilarityStore {
    async fn upsert(&self, similarity: UserSimilarity) -> StorageResult<()> {
        self.edges
            .write()
            .await
            .entry(similarity.user_id)
            .or_default()
            .insert(similarity.other_user_id, similarity.score);
        Ok(())
    }

    async fn top_for(&self, user_id: &str, limit: usize) -> StorageResult<Vec<UserSimilarity>> {
        let edges = self.edges.read().await;
        let Some(out) = edges.get(user_id) else {
            return Ok(Vec::new());
        };
        let mut rows: Vec<UserSimilarity> = out
            .iter()
            .map(|(other, score)| UserSimilarity::new(user_id, other.clone(), *score))
            .collect();
        rows.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.other_user_id.cmp(&b.other_user_id))
        });
        rows.truncate(limit);
        Ok(rows)
    }

    async fn clear_for(&self, user_id: &str) -> StorageResult<()> {
        self.edges.write().await.remove(user_id);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct RankingInner {
    by_user: HashMap<String, i64>,
    // Ascending over (score, Reverse(user)): reverse iteration yields score
    // descending with user id ascending on ties.
    ordered: BTreeSet<(i64, Reverse<String>)>,
}

/// In-memory [`RealtimeRankingStore`] over an ordered set.
#[derive(Debug, Default)]
pub struct InMemoryRealtimeRanking {
    inner: std::sync::RwLock<RankingInner>,
}

impl InMemoryRealtimeRanking {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StorageResult<std::sync::RwLockReadGuard<'_, RankingInner>> {
        self.inner
            .read()
            .map_err(|_| StorageError::Unavailable("realtime ranking lock poisoned".to_string()))
    }

    fn write(&self) -> StorageResult<std::sync::RwLockWriteGuard<'_, RankingInner>> {
        self.inner
            .write()
            .map_err(|_| StorageError::Unavailable("realtime ranking lock poisoned".to_string()))
    }
}

impl RealtimeRankingStore for InMemoryRealtimeRanking {
    fn upsert(&self, user_id: &str, score: i64) -> StorageResult<()> {
        let mut inner = self.write()?;
        if let Some(old) = inner.by_user.insert(user_id.to_string(), score) {
            inner.ordered.remove(&(old, Reverse(user_id.to_string())));
        }
        inner.ordered.insert((score, Reverse(user_id.to_string())));
        Ok(())
    }

    fn top(&self, k: usize) -> StorageResult<Vec<(String, i64)>> {
        let inner = self.read()?;
        Ok(inner
            .ordered
            .iter()
            .rev()
            .take(k)
            .map(|(score, Reverse(user))| (user.clone(), *score))
            .collect())
    }

    /// Rank is one past the number of entries strictly ahead of the user.
    /// Counting walks the ordered set, so this is linear in the entries
    /// ahead rather than logarithmic; fine at in-memory scale, an
    /// order-statistics index would be needed to do better.
    fn rank_of(&self, user_id: &str) -> StorageResult<Option<usize>> {
        use std::ops::Bound::{Excluded, Unbounded};

        let inner = self.read()?;
        let Some(score) = inner.by_user.get(user_id) else {
            return Ok(None);
        };
        let key = (*score, Reverse(user_id.to_string()));
        let ahead = inner.ordered.range((Excluded(key), Unbounded)).count();
        Ok(Some(ahead + 1))
    }

    fn remove(&self, user_id: &str) -> StorageResult<bool> {
        let mut inner = self.write()?;
        match inner.by_user.remove(user_id) {
            Some(score) => {
                inner.ordered.remove(&(score, Reverse(user_id.to_string())));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn len(&self) -> StorageResult<usize> {
        Ok(self.read()?.by_user.len())
    }

    fn clear(&self) -> StorageResult<()> {
        let mut inner = self.write()?;
        inner.by_user.clear();
        inner.ordered.clear();
        Ok(())
    }
}

/// In-memory [`UserDirectory`] fake.
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<String, String>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user with a display name.
    pub async fn add_user(&self, user_id: impl Into<String>, display_name: impl Into<String>) {
        self.users
            .write()
            .await
            .insert(user_id.into(), display_name.into());
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn exists(&self, user_id: &str) -> StorageResult<bool> {
        Ok(self.users.read().await.contains_key(user_id))
    }

    async fn display_name(&self, user_id: &str) -> StorageResult<Option<String>> {
        Ok(self.users.read().await.get(user_id).cloned())
    }
}

/// In-memory [`SearchHistoryStore`] fake.
#[derive(Debug, Default)]
pub struct InMemorySearchHistory {
    terms: RwLock<HashMap<String, HashMap<String, u64>>>,
}

impl InMemorySearchHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one search by a user, incrementing the term's count.
    pub async fn record_search(&self, user_id: impl Into<String>, term: impl Into<String>) {
        *self
            .terms
            .write()
            .await
            .entry(user_id.into())
            .or_default()
            .entry(term.into())
            .or_insert(0) += 1;
    }
}

#[async_trait]
impl SearchHistoryStore for InMemorySearchHistory {
    async fn terms_for(&self, user_id: &str) -> StorageResult<Vec<SearchTermProfile>> {
        Ok(self
            .terms
            .read()
            .await
            .get(user_id)
            .map(|counts| {
                counts
                    .iter()
                    .map(|(term, count)| SearchTermProfile::new(user_id, term.clone(), *count))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn user_ids(&self) -> StorageResult<Vec<String>> {
        let mut ids: Vec<String> = self.terms.read().await.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

/// In-memory [`CatalogStore`] fake.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    items: RwLock<HashMap<String, CatalogItem>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_item(&self, item: CatalogItem) {
        self.items.write().await.insert(item.id.clone(), item);
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn all_items(&self) -> StorageResult<Vec<CatalogItem>> {
        let mut items: Vec<CatalogItem> = self.items.read().await.values().cloned().collect();
        items.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(items)
    }

    async fn item_by_id(&self, id: &str) -> StorageResult<Option<CatalogItem>> {
        Ok(self.items.read().await.get(id).cloned())
    }
}

/// Test fake whose every operation reports the backend as unavailable,
/// for exercising degraded realtime paths.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct UnavailableRealtimeRanking;

#[cfg(test)]
impl RealtimeRankingStore for UnavailableRealtimeRanking {
    fn upsert(&self, _user_id: &str, _score: i64) -> StorageResult<()> {
        Err(StorageError::Unavailable("realtime ranking down".to_string()))
    }

    fn top(&self, _k: usize) -> StorageResult<Vec<(String, i64)>> {
        Err(StorageError::Unavailable("realtime ranking down".to_string()))
    }

    fn rank_of(&self, _user_id: &str) -> StorageResult<Option<usize>> {
        Err(StorageError::Unavailable("realtime ranking down".to_string()))
    }

    fn remove(&self, _user_id: &str) -> StorageResult<bool> {
        Err(StorageError::Unavailable("realtime ranking down".to_string()))
    }

    fn len(&self) -> StorageResult<usize> {
        Err(StorageError::Unavailable("realtime ranking down".to_string()))
    }

    fn clear(&self) -> StorageResult<()> {
        Err(StorageError::Unavailable("realtime ranking down".to_string()))
    }
}

/// Test fake that rejects every edge write, for exercising partial-failure
/// accounting in batch passes.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RejectingSimilarityStore;

#[cfg(test)]
#[async_trait]
impl SimilarityStore for RejectingSimilarityStore {
    async fn upsert(&self, _similarity: UserSimilarity) -> StorageResult<()> {
        Err(StorageError::Unavailable("similarity store down".to_string()))
    }

    async fn top_for(&self, _user_id: &str, _limit: usize) -> StorageResult<Vec<UserSimilarity>> {
        Ok(Vec::new())
    }

    async fn clear_for(&self, _user_id: &str) -> StorageResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn realtime_sole_member_ranks_first() {
        let ranking = InMemoryRealtimeRanking::new();
        ranking.upsert("user-1", 1000).unwrap();
        assert_eq!(ranking.rank_of("user-1").unwrap(), Some(1));
        assert_eq!(ranking.len().unwrap(), 1);
    }

    #[test]
    fn realtime_top_orders_desc_with_user_tiebreak() {
        let ranking = InMemoryRealtimeRanking::new();
        ranking.upsert("carol", 1200).unwrap();
        ranking.upsert("alice", 1100).unwrap();
        ranking.upsert("bob", 1100).unwrap();

        let top = ranking.top(3).unwrap();
        assert_eq!(
            top,
            vec![
                ("carol".to_string(), 1200),
                ("alice".to_string(), 1100),
                ("bob".to_string(), 1100),
            ]
        );
        assert_eq!(ranking.rank_of("alice").unwrap(), Some(2));
        assert_eq!(ranking.rank_of("bob").unwrap(), Some(3));
    }

    #[test]
    fn realtime_upsert_moves_member() {
        let ranking = InMemoryRealtimeRanking::new();
        ranking.upsert("alice", 1000).unwrap();
        ranking.upsert("bob", 1100).unwrap();
        assert_eq!(ranking.rank_of("alice").unwrap(), Some(2));

        ranking.upsert("alice", 1300).unwrap();
        assert_eq!(ranking.rank_of("alice").unwrap(), Some(1));
        assert_eq!(ranking.len().unwrap(), 2);
    }

    #[test]
    fn realtime_remove_and_clear() {
        let ranking = InMemoryRealtimeRanking::new();
        ranking.upsert("alice", 1000).unwrap();
        assert!(ranking.remove("alice").unwrap());
        assert!(!ranking.remove("alice").unwrap());
        assert_eq!(ranking.rank_of("alice").unwrap(), None);

        ranking.upsert("bob", 900).unwrap();
        ranking.clear().unwrap();
        assert!(ranking.is_empty().unwrap());
    }

    #[tokio::test]
    async fn compare_and_update_detects_conflicts() {
        let store = InMemoryScoreStore::new();
        let mut score = UserScore::new("user-1");
        store.put(score.clone()).await.unwrap();

        score.current_score = 1010;
        assert!(store
            .compare_and_update("user-1", 1000, score.clone())
            .await
            .unwrap());

        // Expectation is now stale.
        score.current_score = 1020;
        assert!(!store
            .compare_and_update("user-1", 1000, score)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn compare_and_update_missing_user_is_not_found() {
        let store = InMemoryScoreStore::new();
        let err = store
            .compare_and_update("ghost", 1000, UserScore::new("ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn top_by_score_breaks_ties_by_user_id() {
        let store = InMemoryScoreStore::new();
        for id in ["bob", "alice", "carol"] {
            let mut score = UserScore::new(id);
            score.current_score = 1100;
            store.put(score).await.unwrap();
        }
        let top = store.top_by_score(2).await.unwrap();
        assert_eq!(top[0].user_id, "alice");
        assert_eq!(top[1].user_id, "bob");
    }

    #[tokio::test]
    async fn similarity_top_for_sorts_desc() {
        let store = InMemorySimilarityStore::new();
        store
            .upsert(UserSimilarity::new("u1", "u2", 0.4))
            .await
            .unwrap();
        store
            .upsert(UserSimilarity::new("u1", "u3", 0.9))
            .await
            .unwrap();
        store
            .upsert(UserSimilarity::new("u1", "u2", 0.6))
            .await
            .unwrap();

        let top = store.top_for("u1", 10).await.unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].other_user_id, "u3");
        assert_eq!(top[1].other_user_id, "u2");
        assert!((top[1].score - 0.6).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn search_history_aggregates_term_profiles() {
        let history = InMemorySearchHistory::new();
        history.record_search("alice", "rust").await;
        history.record_search("alice", "rust").await;
        history.record_search("alice", "poetry").await;

        let mut profiles = history.terms_for("alice").await.unwrap();
        profiles.sort_by(|a, b| a.term.cmp(&b.term));
        assert_eq!(
            profiles,
            vec![
                SearchTermProfile::new("alice", "poetry", 1),
                SearchTermProfile::new("alice", "rust", 2),
            ]
        );
        assert!(history.terms_for("ghost").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn activity_log_returns_newest_first() {
        let log = InMemoryActivityLog::new();
        for target in ["a", "b", "c"] {
            log.append(ActivityRecord::new(
                "user-1",
                target,
                "book",
                crate::models::ActivityType::View,
                1,
            ))
            .await
            .unwrap();
        }
        let records = log.for_user("user-1", 2).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].target_id, "c");
        assert_eq!(records[1].target_id, "b");
    }
}
