//! Leaderboard manager: periodic snapshots plus realtime standing reads.

mod manager;

pub use manager::{LeaderboardManager, SNAPSHOT_CAP};
