//! Builds periodic leaderboard snapshots and serves realtime standing.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::models::{LeaderboardEntry, LeaderboardType, UserScore};
use crate::storage::{LeaderboardStore, RealtimeRankingStore, ScoreStore, UserDirectory};
use crate::{RenownError, Result};

/// Fixed number of rows a periodic snapshot carries.
pub const SNAPSHOT_CAP: usize = 100;

/// Leaderboard manager.
///
/// The snapshot path is durable and periodic; the realtime path is a cache
/// of current standing that every score update pushes into and that can be
/// rebuilt from the score store at any time.
#[derive(Debug)]
pub struct LeaderboardManager {
    scores: Arc<dyn ScoreStore>,
    directory: Arc<dyn UserDirectory>,
    store: Arc<dyn LeaderboardStore>,
    realtime: Arc<dyn RealtimeRankingStore>,
    // Single-flight guard: two snapshot builds for the same period must not
    // interleave their delete-then-insert windows.
    build_gate: Mutex<()>,
}

impl LeaderboardManager {
    pub fn new(
        scores: Arc<dyn ScoreStore>,
        directory: Arc<dyn UserDirectory>,
        store: Arc<dyn LeaderboardStore>,
        realtime: Arc<dyn RealtimeRankingStore>,
    ) -> Self {
        Self {
            scores,
            directory,
            store,
            realtime,
            build_gate: Mutex::new(()),
        }
    }

    /// Build and persist the snapshot for one `(type, period)`.
    ///
    /// Reads the top [`SNAPSHOT_CAP`] scores (descending, user id ascending
    /// on ties), snapshots usernames from the directory, assigns 1-based
    /// positions, and replaces the period's prior entries atomically.
    /// Deterministic for unchanged underlying scores, hence idempotent.
    pub async fn build_snapshot(
        &self,
        leaderboard_type: LeaderboardType,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    ) -> Result<Vec<LeaderboardEntry>> {
        if period_start >= period_end {
            return Err(RenownError::InvalidArgument(format!(
                "period start {period_start} is not before end {period_end}"
            )));
        }

        let _flight = self.build_gate.lock().await;

        let top = self.scores.top_by_score(SNAPSHOT_CAP).await?;
        let mut entries = Vec::with_capacity(top.len());
        for (position, score) in top.into_iter().enumerate() {
            let username = self
                .directory
                .display_name(&score.user_id)
                .await?
                .unwrap_or_else(|| score.user_id.clone());
            entries.push(LeaderboardEntry {
                user_id: score.user_id,
                username,
                score: score.current_score,
                rank_tier: score.rank_tier,
                leaderboard_type,
                rank_position: position as u32 + 1,
                period_start,
                period_end,
            });
        }

        self.store
            .replace_entries(leaderboard_type, period_start, period_end, entries.clone())
            .await?;

        info!(
            leaderboard = %leaderboard_type,
            rows = entries.len(),
            %period_start,
            %period_end,
            "leaderboard snapshot built"
        );
        Ok(entries)
    }

    /// Read a stored snapshot in rank order.
    pub async fn get_leaderboard(
        &self,
        leaderboard_type: LeaderboardType,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<LeaderboardEntry>> {
        if limit == 0 {
            return Err(RenownError::InvalidArgument(
                "limit must be positive".to_string(),
            ));
        }
        Ok(self
            .store
            .entries(leaderboard_type, period_start, period_end, limit)
            .await?)
    }

    /// A user's 1-based position in a stored snapshot, if ranked.
    pub async fn get_user_rank(
        &self,
        user_id: &str,
        leaderboard_type: LeaderboardType,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    ) -> Result<Option<u32>> {
        Ok(self
            .store
            .rank_of(user_id, leaderboard_type, period_start, period_end)
            .await?)
    }

    /// Push a score into the realtime structure (atomic upsert).
    pub fn update_realtime(&self, user_id: &str, score: i64) -> Result<()> {
        Ok(self.realtime.upsert(user_id, score)?)
    }

    /// Current top `k` from the realtime structure.
    ///
    /// Realtime-store unavailability degrades this read to empty rather
    /// than failing the caller.
    pub fn top_realtime(&self, k: usize) -> Vec<(String, i64)> {
        match self.realtime.top(k) {
            Ok(top) => top,
            Err(e) => {
                warn!(error = %e, "realtime top read degraded");
                Vec::new()
            }
        }
    }

    /// A user's current 1-based realtime rank, `None` when absent or when
    /// the structure is unavailable.
    pub fn realtime_rank_of(&self, user_id: &str) -> Option<usize> {
        match self.realtime.rank_of(user_id) {
            Ok(rank) => rank,
            Err(e) => {
                warn!(user = %user_id, error = %e, "realtime rank read degraded");
                None
            }
        }
    }

    /// Rebuild the realtime structure from the score store.
    ///
    /// The structure is a cache, so a rebuild loses nothing but staleness.
    pub async fn rebuild_realtime(&self) -> Result<usize> {
        let scores: Vec<UserScore> = self.scores.all().await?;
        self.realtime.clear()?;
        let count = scores.len();
        for score in scores {
            self.realtime.upsert(&score.user_id, score.current_score)?;
        }
        info!(members = count, "realtime ranking rebuilt from score store");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RankTier, UserScore};
    use crate::storage::{
        InMemoryLeaderboardStore, InMemoryRealtimeRanking, InMemoryScoreStore,
        InMemoryUserDirectory,
    };
    use chrono::Duration;

    async fn seeded_manager(scores: &[(&str, i64)]) -> LeaderboardManager {
        let score_store = Arc::new(InMemoryScoreStore::new());
        let directory = Arc::new(InMemoryUserDirectory::new());
        for (user, value) in scores {
            directory.add_user(*user, format!("{user}-name")).await;
            let mut score = UserScore::new(*user);
            score.current_score = *value;
            score.rank_tier = RankTier::for_score(*value);
            score_store.put(score).await.unwrap();
        }
        LeaderboardManager::new(
            score_store,
            directory,
            Arc::new(InMemoryLeaderboardStore::new()),
            Arc::new(InMemoryRealtimeRanking::new()),
        )
    }

    fn period() -> (DateTime<Utc>, DateTime<Utc>) {
        let start = Utc::now();
        (start, start + Duration::days(1))
    }

    #[tokio::test]
    async fn snapshot_orders_and_positions_entries() {
        let manager = seeded_manager(&[("bob", 1100), ("alice", 1300), ("carol", 1100)]).await;
        let (start, end) = period();

        let entries = manager
            .build_snapshot(LeaderboardType::Daily, start, end)
            .await
            .unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].user_id, "alice");
        assert_eq!(entries[0].rank_position, 1);
        assert_eq!(entries[0].username, "alice-name");
        // tie broken by user id ascending
        assert_eq!(entries[1].user_id, "bob");
        assert_eq!(entries[2].user_id, "carol");
    }

    #[tokio::test]
    async fn snapshot_rebuild_is_deterministic() {
        let manager = seeded_manager(&[("bob", 1100), ("alice", 1300)]).await;
        let (start, end) = period();

        let first = manager
            .build_snapshot(LeaderboardType::Weekly, start, end)
            .await
            .unwrap();
        let second = manager
            .build_snapshot(LeaderboardType::Weekly, start, end)
            .await
            .unwrap();
        assert_eq!(first, second);

        let stored = manager
            .get_leaderboard(LeaderboardType::Weekly, start, end, 10)
            .await
            .unwrap();
        assert_eq!(stored, second);
    }

    #[tokio::test]
    async fn snapshot_rejects_inverted_period() {
        let manager = seeded_manager(&[]).await;
        let (start, end) = period();
        let err = manager
            .build_snapshot(LeaderboardType::Daily, end, start)
            .await
            .unwrap_err();
        assert!(matches!(err, RenownError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn user_rank_reads_from_snapshot() {
        let manager = seeded_manager(&[("alice", 1300), ("bob", 1100)]).await;
        let (start, end) = period();
        manager
            .build_snapshot(LeaderboardType::Monthly, start, end)
            .await
            .unwrap();

        assert_eq!(
            manager
                .get_user_rank("bob", LeaderboardType::Monthly, start, end)
                .await
                .unwrap(),
            Some(2)
        );
        assert_eq!(
            manager
                .get_user_rank("ghost", LeaderboardType::Monthly, start, end)
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn realtime_path_round_trips() {
        let manager = seeded_manager(&[]).await;
        manager.update_realtime("alice", 1200).unwrap();
        assert_eq!(manager.realtime_rank_of("alice"), Some(1));
        assert_eq!(manager.top_realtime(5), vec![("alice".to_string(), 1200)]);
    }

    #[tokio::test]
    async fn realtime_reads_degrade_when_store_is_unavailable() {
        let manager = LeaderboardManager::new(
            Arc::new(InMemoryScoreStore::new()),
            Arc::new(InMemoryUserDirectory::new()),
            Arc::new(InMemoryLeaderboardStore::new()),
            Arc::new(crate::storage::memory::UnavailableRealtimeRanking),
        );
        assert!(manager.top_realtime(5).is_empty());
        assert_eq!(manager.realtime_rank_of("alice"), None);
    }

    #[tokio::test]
    async fn rebuild_realtime_mirrors_score_store() {
        let manager = seeded_manager(&[("alice", 1300), ("bob", 1100)]).await;
        let rebuilt = manager.rebuild_realtime().await.unwrap();
        assert_eq!(rebuilt, 2);
        assert_eq!(manager.realtime_rank_of("alice"), Some(1));
        assert_eq!(manager.realtime_rank_of("bob"), Some(2));
    }
}
