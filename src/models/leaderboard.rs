//! Leaderboard models: periodic snapshot entries and their period types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RankTier;

/// Period granularity of a leaderboard snapshot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum LeaderboardType {
    Daily,
    Weekly,
    Monthly,
}

impl std::fmt::Display for LeaderboardType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Daily => write!(f, "daily"),
            Self::Weekly => write!(f, "weekly"),
            Self::Monthly => write!(f, "monthly"),
        }
    }
}

/// Denormalized, point-in-time ranking row.
///
/// Entries for a given `(type, period)` are regenerated atomically as a
/// delete-then-insert, so a reader never observes a mix of two generations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeaderboardEntry {
    /// User being ranked
    pub user_id: String,

    /// Username snapshot taken at build time
    pub username: String,

    /// Score snapshot taken at build time
    pub score: i64,

    /// Rank tier snapshot taken at build time
    pub rank_tier: RankTier,

    /// Which periodic leaderboard this entry belongs to
    pub leaderboard_type: LeaderboardType,

    /// 1-based position within the snapshot
    pub rank_position: u32,

    /// Start of the covered period (inclusive)
    pub period_start: DateTime<Utc>,

    /// End of the covered period (exclusive)
    pub period_end: DateTime<Utc>,
}
