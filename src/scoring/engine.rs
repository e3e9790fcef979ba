//! The scoring engine: applies EWMA updates on qualifying activity, derives
//! rank tiers, flags anomalous jumps, and handles reports and inactivity
//! decay.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::models::{ActivityRecord, ActivityType, RankTier, UserScore};
use crate::storage::{ActivityLog, RealtimeRankingStore, ScoreStore, UserDirectory};
use crate::{RenownError, Result};

/// EWMA smoothing factor. Fixed by observed behavior of the system; not a
/// configuration knob.
pub const SMOOTHING_FACTOR: f64 = 0.2;

/// Absolute one-update score jump beyond which the sticky anomaly flag is
/// set.
pub const ANOMALY_THRESHOLD: i64 = 100;

/// Bounded internal retries for a lost compare-and-swap before the conflict
/// surfaces to the caller.
pub const MAX_UPDATE_RETRIES: u32 = 3;

/// EWMA update rule: `round(alpha * (old + delta) + (1 - alpha) * old)`.
fn ewma(old: i64, delta: i64) -> i64 {
    (SMOOTHING_FACTOR * (old + delta) as f64 + (1.0 - SMOOTHING_FACTOR) * old as f64).round()
        as i64
}

/// Engine owning all mutations of [`UserScore`].
///
/// Concurrent calls for different users proceed in parallel; calls for the
/// same user serialize on a per-user mutex so the read-modify-write of the
/// EWMA update never loses a delta. The durable write is still a
/// compare-and-swap, so a store shared with another writer cannot silently
/// drop updates either.
#[derive(Debug)]
pub struct ScoringEngine {
    scores: Arc<dyn ScoreStore>,
    activities: Arc<dyn ActivityLog>,
    directory: Arc<dyn UserDirectory>,
    realtime: Arc<dyn RealtimeRankingStore>,
    user_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ScoringEngine {
    pub fn new(
        scores: Arc<dyn ScoreStore>,
        activities: Arc<dyn ActivityLog>,
        directory: Arc<dyn UserDirectory>,
        realtime: Arc<dyn RealtimeRankingStore>,
    ) -> Self {
        Self {
            scores,
            activities,
            directory,
            realtime,
            user_locks: Mutex::new(HashMap::new()),
        }
    }

    async fn user_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.user_locks.lock().await;
        locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Record a qualifying activity and return the updated score.
    ///
    /// Creates the score record lazily at the baseline on a user's first
    /// activity. The activity record and the score update succeed together
    /// from the caller's point of view; only the realtime ranking push is
    /// allowed to degrade.
    pub async fn record_activity(
        &self,
        user_id: &str,
        target_id: &str,
        target_type: &str,
        activity_type: ActivityType,
    ) -> Result<UserScore> {
        if !self.directory.exists(user_id).await? {
            return Err(RenownError::NotFound(format!("unknown user {user_id}")));
        }

        let lock = self.user_lock(user_id).await;
        let _guard = lock.lock().await;

        let delta = activity_type.weight();
        let mut attempts = 0;
        let updated = loop {
            attempts += 1;
            let existing = self.scores.get(user_id).await?;
            let (mut score, created) = match existing {
                Some(score) => (score, false),
                None => (UserScore::new(user_id), true),
            };

            let old = score.current_score;
            score.previous_score = old;
            score.current_score = ewma(old, delta);
            score.rank_tier = RankTier::for_score(score.current_score);
            score.last_activity_at = Utc::now();
            // Sticky: once flagged, only an explicit moderation action
            // clears it.
            if (score.current_score - score.previous_score).abs() > ANOMALY_THRESHOLD {
                score.suspicious_activity = true;
                warn!(
                    user = %user_id,
                    jump = score.current_score - score.previous_score,
                    "anomalous score jump flagged"
                );
            }

            if created {
                self.scores.put(score.clone()).await?;
                break score;
            }
            if self
                .scores
                .compare_and_update(user_id, old, score.clone())
                .await?
            {
                break score;
            }
            if attempts >= MAX_UPDATE_RETRIES {
                return Err(RenownError::ConcurrentUpdateConflict(format!(
                    "score update for {user_id} lost {attempts} races"
                )));
            }
            debug!(user = %user_id, attempt = attempts, "score swap lost, retrying");
        };

        let change = updated.current_score - updated.previous_score;
        self.activities
            .append(ActivityRecord::new(
                user_id,
                target_id,
                target_type,
                activity_type,
                change,
            ))
            .await?;

        if let Err(e) = self.realtime.upsert(user_id, updated.current_score) {
            // Realtime standing is a cache; its loss degrades rank reads,
            // never the scoring call itself.
            warn!(user = %user_id, error = %e, "realtime ranking update failed");
        }

        debug!(
            user = %user_id,
            score = updated.current_score,
            tier = %updated.rank_tier,
            change,
            "activity recorded"
        );
        Ok(updated)
    }

    /// Register a report against a user; suspends the account when the
    /// count reaches `suspension_threshold`.
    ///
    /// The counter keeps incrementing after suspension; the flag itself is
    /// idempotent.
    pub async fn report_user(&self, user_id: &str, suspension_threshold: u32) -> Result<UserScore> {
        if suspension_threshold == 0 {
            return Err(RenownError::InvalidArgument(
                "suspension threshold must be positive".to_string(),
            ));
        }

        let lock = self.user_lock(user_id).await;
        let _guard = lock.lock().await;

        let mut score = self
            .scores
            .get(user_id)
            .await?
            .ok_or_else(|| RenownError::NotFound(format!("unknown user {user_id}")))?;

        score.report_count += 1;
        if !score.account_suspended && score.report_count >= suspension_threshold {
            score.account_suspended = true;
            info!(user = %user_id, reports = score.report_count, "account suspended");
        }
        self.scores.put(score.clone()).await?;
        Ok(score)
    }

    /// Moderation action: clear the sticky anomaly flag.
    pub async fn clear_suspicion(&self, user_id: &str) -> Result<UserScore> {
        let lock = self.user_lock(user_id).await;
        let _guard = lock.lock().await;

        let mut score = self
            .scores
            .get(user_id)
            .await?
            .ok_or_else(|| RenownError::NotFound(format!("unknown user {user_id}")))?;
        score.suspicious_activity = false;
        self.scores.put(score.clone()).await?;
        info!(user = %user_id, "suspicion cleared by moderation");
        Ok(score)
    }

    /// Batch job: multiply the score of every user inactive for more than
    /// `inactivity_days` by `decay_factor` and re-derive their tier.
    ///
    /// Runs outside the request path. Returns the number of users decayed.
    pub async fn decay_inactive_scores(
        &self,
        inactivity_days: u32,
        decay_factor: f64,
    ) -> Result<usize> {
        if inactivity_days == 0 {
            return Err(RenownError::InvalidArgument(
                "inactivity days must be positive".to_string(),
            ));
        }
        if !(decay_factor > 0.0 && decay_factor < 1.0) {
            return Err(RenownError::InvalidArgument(format!(
                "decay factor must be in (0, 1), got {decay_factor}"
            )));
        }

        let cutoff = Utc::now() - Duration::days(i64::from(inactivity_days));
        let stale = self.scores.inactive_since(cutoff).await?;
        let mut decayed = 0;

        for candidate in stale {
            let lock = self.user_lock(&candidate.user_id).await;
            let _guard = lock.lock().await;

            // Re-read under the lock: the user may have been active since
            // the candidate list was taken.
            let Some(mut score) = self.scores.get(&candidate.user_id).await? else {
                continue;
            };
            if score.last_activity_at >= cutoff {
                continue;
            }

            let old = score.current_score;
            score.previous_score = old;
            score.current_score = (old as f64 * decay_factor).round() as i64;
            score.rank_tier = RankTier::for_score(score.current_score);

            if self
                .scores
                .compare_and_update(&score.user_id, old, score.clone())
                .await?
            {
                decayed += 1;
                if let Err(e) = self.realtime.upsert(&score.user_id, score.current_score) {
                    warn!(user = %score.user_id, error = %e, "realtime update failed during decay");
                }
            }
        }

        info!(decayed, inactivity_days, decay_factor, "inactivity decay complete");
        Ok(decayed)
    }

    /// Fetch a user's score record.
    pub async fn get_user_score(&self, user_id: &str) -> Result<UserScore> {
        self.scores
            .get(user_id)
            .await?
            .ok_or_else(|| RenownError::NotFound(format!("no score for user {user_id}")))
    }

    /// Top users by current score, descending.
    pub async fn get_top_users(&self, limit: usize) -> Result<Vec<UserScore>> {
        if limit == 0 {
            return Err(RenownError::InvalidArgument(
                "limit must be positive".to_string(),
            ));
        }
        Ok(self.scores.top_by_score(limit).await?)
    }

    /// Users whose score sits in the given tier band.
    pub async fn get_users_by_rank_tier(&self, tier: RankTier) -> Result<Vec<UserScore>> {
        Ok(self.scores.by_tier(tier).await?)
    }

    /// Users flagged as suspicious or with at least `threshold` reports.
    pub async fn get_suspicious_users(&self, threshold: u32) -> Result<Vec<UserScore>> {
        Ok(self.scores.suspicious(threshold).await?)
    }

    /// All suspended accounts.
    pub async fn get_suspended_users(&self) -> Result<Vec<UserScore>> {
        Ok(self.scores.suspended().await?)
    }

    /// Most recent activity of a user, newest first.
    pub async fn get_user_activity(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<ActivityRecord>> {
        if limit == 0 {
            return Err(RenownError::InvalidArgument(
                "limit must be positive".to_string(),
            ));
        }
        Ok(self.activities.for_user(user_id, limit).await?)
    }
}
