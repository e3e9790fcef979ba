//! Core data models for scores, leaderboards, and recommendations.

mod catalog;
mod leaderboard;
mod recommend;
mod score;

pub use catalog::CatalogItem;
pub use leaderboard::{LeaderboardEntry, LeaderboardType};
pub use recommend::{ScoredItem, SearchTermProfile, UserSimilarity};
pub use score::{ActivityRecord, ActivityType, RankTier, UserScore, BASELINE_SCORE};
