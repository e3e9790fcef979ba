//! Scheduled batch jobs: inactivity decay, snapshot promotion, popular-term
//! refresh, and the collaborative-filtering batch.
//!
//! The scheduler holds references to the engine and recommenders and calls
//! their public methods directly. Every job is idempotent within its
//! window, guarded against overlapping runs of itself, and caught at the
//! job boundary so a failure never unwinds the host process.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Months, NaiveTime, Utc, Weekday};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::SchedulerConfig;
use crate::leaderboard::LeaderboardManager;
use crate::models::LeaderboardType;
use crate::recommend::{CollaborativeRecommender, ContentBasedRecommender};
use crate::scoring::ScoringEngine;
use crate::Result;

/// Start of the UTC day containing `t`.
pub fn day_period(t: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = t.date_naive().and_time(NaiveTime::MIN).and_utc();
    (start, start + chrono::Duration::days(1))
}

/// The Monday-based UTC week containing `t`.
pub fn week_period(t: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let first = t.date_naive().week(Weekday::Mon).first_day();
    let start = first.and_time(NaiveTime::MIN).and_utc();
    (start, start + chrono::Duration::days(7))
}

/// The calendar month containing `t`.
pub fn month_period(t: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let day = t.date_naive();
    let first = day.with_day0(0).unwrap_or(day);
    let start = first.and_time(NaiveTime::MIN).and_utc();
    let end = (first + Months::new(1)).and_time(NaiveTime::MIN).and_utc();
    (start, end)
}

/// Owns the periodic jobs of the subsystem.
#[derive(Debug)]
pub struct JobScheduler {
    engine: Arc<ScoringEngine>,
    leaderboards: Arc<LeaderboardManager>,
    collaborative: Arc<CollaborativeRecommender>,
    content: Arc<ContentBasedRecommender>,
    config: SchedulerConfig,
    // Per-job single-flight gates: an overlapping tick is skipped, not
    // queued.
    maintenance_gate: Mutex<()>,
    popular_gate: Mutex<()>,
    similarity_gate: Mutex<()>,
    handles: std::sync::Mutex<Vec<JoinHandle<()>>>,
}

impl JobScheduler {
    pub fn new(
        engine: Arc<ScoringEngine>,
        leaderboards: Arc<LeaderboardManager>,
        collaborative: Arc<CollaborativeRecommender>,
        content: Arc<ContentBasedRecommender>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            engine,
            leaderboards,
            collaborative,
            content,
            config,
            maintenance_gate: Mutex::new(()),
            popular_gate: Mutex::new(()),
            similarity_gate: Mutex::new(()),
            handles: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Daily maintenance: inactivity decay followed by snapshot promotion
    /// for the current daily, weekly, and monthly periods.
    pub async fn run_daily_maintenance(&self) -> Result<()> {
        let Ok(_flight) = self.maintenance_gate.try_lock() else {
            warn!("daily maintenance already running, skipping tick");
            return Ok(());
        };

        let decayed = self
            .engine
            .decay_inactive_scores(self.config.inactivity_days, self.config.decay_factor)
            .await?;

        let now = Utc::now();
        for (leaderboard_type, (start, end)) in [
            (LeaderboardType::Daily, day_period(now)),
            (LeaderboardType::Weekly, week_period(now)),
            (LeaderboardType::Monthly, month_period(now)),
        ] {
            self.leaderboards
                .build_snapshot(leaderboard_type, start, end)
                .await?;
        }

        info!(decayed, "daily maintenance complete");
        Ok(())
    }

    /// Hourly popular-term refresh.
    pub async fn run_popular_term_refresh(&self) -> Result<usize> {
        let Ok(_flight) = self.popular_gate.try_lock() else {
            warn!("popular-term refresh already running, skipping tick");
            return Ok(0);
        };
        self.collaborative.refresh_popular_terms().await
    }

    /// Daily collaborative-filtering batch; invalidates recommendation
    /// caches once the similarity graph has been rewritten.
    pub async fn run_similarity_batch(&self) -> Result<usize> {
        let Ok(_flight) = self.similarity_gate.try_lock() else {
            warn!("similarity batch already running, skipping tick");
            return Ok(0);
        };
        let updated = self
            .collaborative
            .run_batch(self.config.similarity_threshold)
            .await?;
        self.content.invalidate_cache();
        Ok(updated)
    }

    /// Spawn the interval loops. Each tick catches its own failure at the
    /// job boundary; partial progress self-heals on the next run since all
    /// writes are idempotent.
    pub fn start(self: &Arc<Self>) {
        let mut handles = Vec::new();

        let scheduler = Arc::clone(self);
        handles.push(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(std::time::Duration::from_secs(
                scheduler.config.maintenance_interval_secs,
            ));
            ticker.tick().await; // first tick fires immediately; skip it
            loop {
                ticker.tick().await;
                if let Err(e) = scheduler.run_daily_maintenance().await {
                    error!(error = %e, "daily maintenance failed");
                }
            }
        }));

        let scheduler = Arc::clone(self);
        handles.push(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(std::time::Duration::from_secs(
                scheduler.config.popular_terms_interval_secs,
            ));
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = scheduler.run_popular_term_refresh().await {
                    error!(error = %e, "popular-term refresh failed");
                }
            }
        }));

        let scheduler = Arc::clone(self);
        handles.push(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(std::time::Duration::from_secs(
                scheduler.config.similarity_interval_secs,
            ));
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = scheduler.run_similarity_batch().await {
                    error!(error = %e, "similarity batch failed");
                }
            }
        }));

        if let Ok(mut stored) = self.handles.lock() {
            stored.extend(handles);
        }
        info!("job scheduler started");
    }

    /// Abort all running interval loops.
    pub fn shutdown(&self) {
        if let Ok(mut handles) = self.handles.lock() {
            for handle in handles.drain(..) {
                handle.abort();
            }
        }
        info!("job scheduler stopped");
    }
}

impl Drop for JobScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn day_period_covers_one_day() {
        let t = Utc.with_ymd_and_hms(2025, 3, 15, 17, 45, 0).unwrap();
        let (start, end) = day_period(t);
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 3, 15, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 3, 16, 0, 0, 0).unwrap());
    }

    #[test]
    fn week_period_starts_monday() {
        // 2025-03-15 is a Saturday
        let t = Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap();
        let (start, end) = week_period(t);
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 3, 17, 0, 0, 0).unwrap());
    }

    #[test]
    fn month_period_handles_year_rollover() {
        let t = Utc.with_ymd_and_hms(2025, 12, 20, 8, 0, 0).unwrap();
        let (start, end) = month_period(t);
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
    }
}
