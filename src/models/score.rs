//! Score model: per-user standing, rank tiers, and the activity records
//! that drive score changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Score assigned to a user on their first qualifying activity.
pub const BASELINE_SCORE: i64 = 1000;

/// Named rank bands derived purely from the numeric score.
///
/// Bands are fixed, non-overlapping, and ascending; the tier stored on a
/// [`UserScore`] is recomputed on every update and never cached independently.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RankTier {
    /// Below 1100 points
    Bronze,
    /// 1100 to 1249 points
    Silver,
    /// 1250 to 1499 points
    Gold,
    /// 1500 to 1999 points
    Platinum,
    /// 2000 points and above
    Diamond,
}

impl RankTier {
    /// Derive the tier whose band contains `score`.
    ///
    /// Band boundaries are lower-inclusive: a score of exactly 1100 is
    /// already Silver.
    pub fn for_score(score: i64) -> Self {
        match score {
            s if s >= 2000 => Self::Diamond,
            s if s >= 1500 => Self::Platinum,
            s if s >= 1250 => Self::Gold,
            s if s >= 1100 => Self::Silver,
            _ => Self::Bronze,
        }
    }

    /// Lower bound of this tier's band (inclusive), if any.
    pub fn lower_bound(&self) -> Option<i64> {
        match self {
            Self::Bronze => None,
            Self::Silver => Some(1100),
            Self::Gold => Some(1250),
            Self::Platinum => Some(1500),
            Self::Diamond => Some(2000),
        }
    }
}

impl std::fmt::Display for RankTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bronze => write!(f, "bronze"),
            Self::Silver => write!(f, "silver"),
            Self::Gold => write!(f, "gold"),
            Self::Platinum => write!(f, "platinum"),
            Self::Diamond => write!(f, "diamond"),
        }
    }
}

/// Qualifying user actions, each with an associated raw point weight.
///
/// `AdminAdjustment` carries an arbitrary operator-supplied delta and is the
/// only variant without a fixed weight.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    /// Viewing content (+1)
    View,
    /// Liking content (+3)
    Like,
    /// Commenting on content (+5)
    Comment,
    /// Sharing content (+8)
    Share,
    /// Adding content to favorites (+10)
    Favorite,
    /// Operator-issued adjustment with a caller-supplied delta
    AdminAdjustment { delta: i64 },
}

impl ActivityType {
    /// Raw signed point weight applied before EWMA smoothing.
    pub fn weight(&self) -> i64 {
        match self {
            Self::View => 1,
            Self::Like => 3,
            Self::Comment => 5,
            Self::Share => 8,
            Self::Favorite => 10,
            Self::AdminAdjustment { delta } => *delta,
        }
    }
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::View => write!(f, "view"),
            Self::Like => write!(f, "like"),
            Self::Comment => write!(f, "comment"),
            Self::Share => write!(f, "share"),
            Self::Favorite => write!(f, "favorite"),
            Self::AdminAdjustment { delta } => write!(f, "admin_adjustment:{}", delta),
        }
    }
}

/// One score record per user.
///
/// Created lazily on the first qualifying activity, mutated only by the
/// scoring engine, and never hard-deleted. Suspension is a flag, not a
/// removal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserScore {
    /// Identifier of the user this score belongs to
    pub user_id: String,

    /// Current smoothed score
    pub current_score: i64,

    /// Score value before the most recent update
    pub previous_score: i64,

    /// Rank band containing `current_score`
    pub rank_tier: RankTier,

    /// Sticky anomaly flag, set when a single update jumps beyond the
    /// anomaly threshold; cleared only by an explicit moderation action
    pub suspicious_activity: bool,

    /// Number of times other users have reported this user
    pub report_count: u32,

    /// Whether the account is suspended
    pub account_suspended: bool,

    /// When the user last performed a qualifying activity
    pub last_activity_at: DateTime<Utc>,
}

impl UserScore {
    /// Create a fresh record at the baseline score.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            current_score: BASELINE_SCORE,
            previous_score: BASELINE_SCORE,
            rank_tier: RankTier::for_score(BASELINE_SCORE),
            suspicious_activity: false,
            report_count: 0,
            account_suspended: false,
            last_activity_at: Utc::now(),
        }
    }

    /// Whether the stored tier matches the tier derived from the score.
    pub fn tier_consistent(&self) -> bool {
        self.rank_tier == RankTier::for_score(self.current_score)
    }
}

/// Append-only record of one qualifying action.
///
/// Owned exclusively by whichever caller reported the activity; never
/// mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityRecord {
    /// Unique identifier of this record
    pub id: String,

    /// User who performed the action
    pub user_id: String,

    /// What was acted on
    pub target_id: String,

    /// Free-form tag identifying the kind of target (book, quote, comment...)
    pub target_type: String,

    /// The action performed
    pub activity_type: ActivityType,

    /// Signed score change actually applied after smoothing
    pub score_change: i64,

    /// When the activity was recorded
    pub created_at: DateTime<Utc>,

    /// Optional origin tag used for abuse correlation (e.g. "ADMIN" for
    /// operator-issued adjustments)
    pub origin: Option<String>,
}

impl ActivityRecord {
    /// Build a record for an activity that was just applied.
    pub fn new(
        user_id: impl Into<String>,
        target_id: impl Into<String>,
        target_type: impl Into<String>,
        activity_type: ActivityType,
        score_change: i64,
    ) -> Self {
        let origin = match &activity_type {
            ActivityType::AdminAdjustment { .. } => Some("ADMIN".to_string()),
            _ => None,
        };
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            target_id: target_id.into(),
            target_type: target_type.into(),
            activity_type,
            score_change,
            created_at: Utc::now(),
            origin,
        }
    }
}
