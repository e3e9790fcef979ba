//! Trait definitions for the storage components and collaborator ports.
//!
//! Durable stores are async traits so real backends can sit behind them;
//! the realtime ranking structure is a synchronous trait over an in-process
//! ordered map and is injected explicitly so the leaderboard manager can be
//! tested against an in-memory implementation.

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{
    ActivityRecord, CatalogItem, LeaderboardEntry, LeaderboardType, RankTier, SearchTermProfile,
    UserScore, UserSimilarity,
};
use crate::storage::errors::StorageResult;

/// Durable repository of one [`UserScore`] per user.
#[async_trait]
pub trait ScoreStore: Send + Sync + 'static + Debug {
    /// Fetch a user's score record, if one exists.
    async fn get(&self, user_id: &str) -> StorageResult<Option<UserScore>>;

    /// Insert or overwrite a score record unconditionally.
    async fn put(&self, score: UserScore) -> StorageResult<()>;

    /// Overwrite a score record only if its stored `current_score` still
    /// equals `expected_current`. Returns `false` when the swap lost.
    async fn compare_and_update(
        &self,
        user_id: &str,
        expected_current: i64,
        updated: UserScore,
    ) -> StorageResult<bool>;

    /// Top scores descending, ties broken by `user_id` ascending for
    /// determinism.
    async fn top_by_score(&self, limit: usize) -> StorageResult<Vec<UserScore>>;

    /// All records whose tier equals `tier`.
    async fn by_tier(&self, tier: RankTier) -> StorageResult<Vec<UserScore>>;

    /// Records with the anomaly flag set or at least `report_threshold`
    /// reports.
    async fn suspicious(&self, report_threshold: u32) -> StorageResult<Vec<UserScore>>;

    /// All suspended accounts.
    async fn suspended(&self) -> StorageResult<Vec<UserScore>>;

    /// Records whose `last_activity_at` is older than `cutoff`.
    async fn inactive_since(&self, cutoff: DateTime<Utc>) -> StorageResult<Vec<UserScore>>;

    /// Every stored record.
    async fn all(&self) -> StorageResult<Vec<UserScore>>;
}

/// Append-only log of scoring-relevant actions.
#[async_trait]
pub trait ActivityLog: Send + Sync + 'static + Debug {
    /// Append one record; records are never mutated or deleted.
    async fn append(&self, record: ActivityRecord) -> StorageResult<()>;

    /// Most recent records for a user, newest first.
    async fn for_user(&self, user_id: &str, limit: usize) -> StorageResult<Vec<ActivityRecord>>;
}

/// Durable storage for periodic leaderboard snapshots.
#[async_trait]
pub trait LeaderboardStore: Send + Sync + 'static + Debug {
    /// Atomically replace all entries for the given `(type, period)`:
    /// prior entries are deleted and the new set inserted as one logical
    /// operation, so a partial read never mixes two generations.
    async fn replace_entries(
        &self,
        leaderboard_type: LeaderboardType,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
        entries: Vec<LeaderboardEntry>,
    ) -> StorageResult<()>;

    /// Entries for the given period in rank order, capped at `limit`.
    async fn entries(
        &self,
        leaderboard_type: LeaderboardType,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
        limit: usize,
    ) -> StorageResult<Vec<LeaderboardEntry>>;

    /// 1-based rank of a user within the given period, if present.
    async fn rank_of(
        &self,
        user_id: &str,
        leaderboard_type: LeaderboardType,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    ) -> StorageResult<Option<u32>>;
}

/// Durable storage for the directed user similarity graph.
#[async_trait]
pub trait SimilarityStore: Send + Sync + 'static + Debug {
    /// Insert or overwrite one directed similarity edge. Writes are
    /// independent and idempotent, which makes batch passes safe to
    /// interrupt and re-run.
    async fn upsert(&self, similarity: UserSimilarity) -> StorageResult<()>;

    /// Highest-scored edges leaving `user_id`, descending.
    async fn top_for(&self, user_id: &str, limit: usize) -> StorageResult<Vec<UserSimilarity>>;

    /// Drop all edges leaving `user_id`.
    async fn clear_for(&self, user_id: &str) -> StorageResult<()>;
}

/// In-process ordered `(user -> score)` structure used as a cache of
/// current standing.
///
/// Not a source of truth: it may be rebuilt at any time from the score
/// store with no loss other than staleness. Upserts must be atomic; reads
/// may observe a stale snapshot.
pub trait RealtimeRankingStore: Send + Sync + 'static + Debug {
    /// Atomically insert or move a member to `score`.
    fn upsert(&self, user_id: &str, score: i64) -> StorageResult<()>;

    /// Top `k` members by score descending, ties by user id ascending.
    fn top(&self, k: usize) -> StorageResult<Vec<(String, i64)>>;

    /// 1-based rank of a member, `None` when absent.
    fn rank_of(&self, user_id: &str) -> StorageResult<Option<usize>>;

    /// Remove a member; returns whether it was present.
    fn remove(&self, user_id: &str) -> StorageResult<bool>;

    /// Number of members.
    fn len(&self) -> StorageResult<usize>;

    /// Whether the structure is empty.
    fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Drop all members (used before a rebuild from the score store).
    fn clear(&self) -> StorageResult<()>;
}

/// Collaborator port: the platform's user directory.
#[async_trait]
pub trait UserDirectory: Send + Sync + 'static + Debug {
    /// Whether the user exists; actors are validated before any write.
    async fn exists(&self, user_id: &str) -> StorageResult<bool>;

    /// Display name for snapshots, if the directory knows one.
    async fn display_name(&self, user_id: &str) -> StorageResult<Option<String>>;
}

/// Collaborator port: per-user search history aggregated by term.
#[async_trait]
pub trait SearchHistoryStore: Send + Sync + 'static + Debug {
    /// Per-term search profiles for one user.
    async fn terms_for(&self, user_id: &str) -> StorageResult<Vec<SearchTermProfile>>;

    /// Every user with recorded search history.
    async fn user_ids(&self) -> StorageResult<Vec<String>>;
}

/// Collaborator port: the shared content catalog.
#[async_trait]
pub trait CatalogStore: Send + Sync + 'static + Debug {
    /// Every catalog item.
    async fn all_items(&self) -> StorageResult<Vec<CatalogItem>>;

    /// One item by id, if it exists.
    async fn item_by_id(&self, id: &str) -> StorageResult<Option<CatalogItem>>;
}
