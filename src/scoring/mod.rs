//! Scoring engine: EWMA score updates, rank tiers, and abuse handling.

mod engine;

pub use engine::{
    ScoringEngine, ANOMALY_THRESHOLD, MAX_UPDATE_RETRIES, SMOOTHING_FACTOR,
};
