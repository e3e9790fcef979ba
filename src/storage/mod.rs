//! Storage layer: durable-store traits, collaborator ports, and in-memory
//! implementations.

pub mod errors;
pub mod memory;
pub mod traits;

pub use errors::{StorageError, StorageResult};
pub use memory::{
    InMemoryActivityLog, InMemoryCatalog, InMemoryLeaderboardStore, InMemoryRealtimeRanking,
    InMemoryScoreStore, InMemorySearchHistory, InMemorySimilarityStore, InMemoryUserDirectory,
};
pub use traits::{
    ActivityLog, CatalogStore, LeaderboardStore, RealtimeRankingStore, ScoreStore,
    SearchHistoryStore, SimilarityStore, UserDirectory,
};
