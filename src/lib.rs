//! # Renown
//!
//! User-scoring, leaderboard, and recommendation engine for social reading
//! platforms. Renown keeps a continuously-updated reputation score per user
//! (exponentially-weighted moving average with anomaly flagging), maintains
//! periodic leaderboard snapshots plus a realtime ranking structure, and
//! recommends users and catalog items through collaborative filtering and
//! content-based scoring.
//!
//! ## Quick Start
//!
//! ```no_run
//! use renown::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let renown = renown::init_with_defaults().await?;
//!
//!     // Award score for a qualifying activity
//!     let score = renown
//!         .record_activity("user-1", "book-42", "book", ActivityType::Like)
//!         .await?;
//!     println!("{} is now {} ({})", score.user_id, score.current_score, score.rank_tier);
//!
//!     // Realtime standing
//!     let top = renown.top_realtime(10);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **Scoring engine**: EWMA score updates, rank tiers, abuse flags
//! - **Leaderboard manager**: periodic snapshots + realtime ordered ranking
//! - **Recommenders**: collaborative filtering over search-term vectors and
//!   content-based keyword scoring with a TTL'd read cache
//! - **Scheduler**: idempotent, single-flight batch jobs (decay, snapshot
//!   promotion, popular terms, similarity batch)
//!
//! External collaborators (user directory, search history, catalog) are
//! consumed through narrow async ports so the engine stays embeddable and
//! testable against in-memory fakes.

pub mod config;
pub mod core;
pub mod leaderboard;
pub mod logging;
pub mod models;
pub mod recommend;
pub mod scheduler;
pub mod scoring;
pub mod storage;

/// The prelude re-exports commonly used types for convenience
pub mod prelude {
    pub use crate::config::{ConfigBuilder, LogFormat, LogLevel, RenownConfig};
    pub use crate::core::{Renown, RenownBuilder};
    pub use crate::models::{
        ActivityRecord, ActivityType, CatalogItem, LeaderboardEntry, LeaderboardType, RankTier,
        ScoredItem, SearchTermProfile, UserScore, UserSimilarity,
    };
    pub use crate::storage::StorageError;
    pub use crate::{init, init_with_defaults, RenownError, Result};
}

/// Current library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Error type for Renown operations
#[derive(Debug, thiserror::Error)]
pub enum RenownError {
    /// Unknown user or item; surfaced to the caller, not retried
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad threshold, zero limit, out-of-range factor; rejected before any
    /// write
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Lost the per-user update race even after bounded internal retries
    #[error("concurrent update conflict: {0}")]
    ConcurrentUpdateConflict(String),

    /// Durable or realtime store unreachable; scoring calls fail fast and
    /// retrying is the caller's responsibility
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Any other storage failure
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Logging setup error
    #[error("logging error: {0}")]
    Logging(String),
}

impl From<storage::StorageError> for RenownError {
    fn from(err: storage::StorageError) -> Self {
        match err {
            storage::StorageError::NotFound(msg) => RenownError::NotFound(msg),
            storage::StorageError::InvalidArgument(msg) => RenownError::InvalidArgument(msg),
            storage::StorageError::Conflict(msg) => RenownError::ConcurrentUpdateConflict(msg),
            storage::StorageError::Unavailable(msg) => RenownError::StorageUnavailable(msg),
            storage::StorageError::Serialization(msg) | storage::StorageError::Operation(msg) => {
                RenownError::Storage(msg)
            }
        }
    }
}

impl From<config::ConfigError> for RenownError {
    fn from(err: config::ConfigError) -> Self {
        RenownError::Configuration(err.to_string())
    }
}

/// Result type for Renown operations
pub type Result<T> = std::result::Result<T, RenownError>;

/// Initialize Renown with default configuration and in-memory storage.
pub async fn init_with_defaults() -> Result<core::Renown> {
    let config = config::ConfigBuilder::defaults().build()?;
    init(config).await
}

/// Initialize Renown with the provided configuration.
///
/// Sets up logging (tolerating an already-installed subscriber) and builds
/// the in-memory assembly. Callers that plug in real backends use
/// [`core::RenownBuilder`] directly.
pub async fn init(config: config::RenownConfig) -> Result<core::Renown> {
    let _ = logging::init(&config.logging);
    Ok(core::RenownBuilder::new(config).build())
}
