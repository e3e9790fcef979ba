//! The `Renown` facade: wires stores, engine, leaderboards, recommenders,
//! and scheduler into one embeddable assembly and re-exposes the public
//! operations of the subsystem.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::RenownConfig;
use crate::leaderboard::LeaderboardManager;
use crate::models::{
    ActivityRecord, ActivityType, LeaderboardEntry, LeaderboardType, RankTier, ScoredItem,
    UserScore, UserSimilarity,
};
use crate::recommend::{CollaborativeRecommender, ContentBasedRecommender, RecommendationCache};
use crate::scheduler::JobScheduler;
use crate::scoring::ScoringEngine;
use crate::storage::{
    ActivityLog, CatalogStore, InMemoryActivityLog, InMemoryCatalog, InMemoryLeaderboardStore,
    InMemoryRealtimeRanking, InMemoryScoreStore, InMemorySearchHistory, InMemorySimilarityStore,
    InMemoryUserDirectory, LeaderboardStore, RealtimeRankingStore, ScoreStore, SearchHistoryStore,
    SimilarityStore, UserDirectory,
};
use crate::Result;

/// Builder assembling a [`Renown`] instance.
///
/// Every port defaults to its in-memory implementation; embedders plug in
/// real backends with the `with_*` methods.
pub struct RenownBuilder {
    config: RenownConfig,
    scores: Option<Arc<dyn ScoreStore>>,
    activities: Option<Arc<dyn ActivityLog>>,
    leaderboards: Option<Arc<dyn LeaderboardStore>>,
    similarities: Option<Arc<dyn SimilarityStore>>,
    realtime: Option<Arc<dyn RealtimeRankingStore>>,
    directory: Option<Arc<dyn UserDirectory>>,
    history: Option<Arc<dyn SearchHistoryStore>>,
    catalog: Option<Arc<dyn CatalogStore>>,
}

impl RenownBuilder {
    pub fn new(config: RenownConfig) -> Self {
        Self {
            config,
            scores: None,
            activities: None,
            leaderboards: None,
            similarities: None,
            realtime: None,
            directory: None,
            history: None,
            catalog: None,
        }
    }

    pub fn with_score_store(mut self, store: Arc<dyn ScoreStore>) -> Self {
        self.scores = Some(store);
        self
    }

    pub fn with_activity_log(mut self, log: Arc<dyn ActivityLog>) -> Self {
        self.activities = Some(log);
        self
    }

    pub fn with_leaderboard_store(mut self, store: Arc<dyn LeaderboardStore>) -> Self {
        self.leaderboards = Some(store);
        self
    }

    pub fn with_similarity_store(mut self, store: Arc<dyn SimilarityStore>) -> Self {
        self.similarities = Some(store);
        self
    }

    pub fn with_realtime_ranking(mut self, store: Arc<dyn RealtimeRankingStore>) -> Self {
        self.realtime = Some(store);
        self
    }

    pub fn with_user_directory(mut self, directory: Arc<dyn UserDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    pub fn with_search_history(mut self, history: Arc<dyn SearchHistoryStore>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn with_catalog(mut self, catalog: Arc<dyn CatalogStore>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn build(self) -> Renown {
        let scores = self
            .scores
            .unwrap_or_else(|| Arc::new(InMemoryScoreStore::new()));
        let activities = self
            .activities
            .unwrap_or_else(|| Arc::new(InMemoryActivityLog::new()));
        let leaderboard_store = self
            .leaderboards
            .unwrap_or_else(|| Arc::new(InMemoryLeaderboardStore::new()));
        let similarities = self
            .similarities
            .unwrap_or_else(|| Arc::new(InMemorySimilarityStore::new()));
        let realtime = self
            .realtime
            .unwrap_or_else(|| Arc::new(InMemoryRealtimeRanking::new()));
        let directory = self
            .directory
            .unwrap_or_else(|| Arc::new(InMemoryUserDirectory::new()));
        let history = self
            .history
            .unwrap_or_else(|| Arc::new(InMemorySearchHistory::new()));
        let catalog = self
            .catalog
            .unwrap_or_else(|| Arc::new(InMemoryCatalog::new()));

        let engine = Arc::new(ScoringEngine::new(
            scores.clone(),
            activities,
            directory.clone(),
            realtime.clone(),
        ));
        let leaderboards = Arc::new(LeaderboardManager::new(
            scores,
            directory.clone(),
            leaderboard_store,
            realtime,
        ));
        let collaborative = Arc::new(CollaborativeRecommender::new(
            history.clone(),
            similarities,
            directory.clone(),
            self.config.scheduler.shard_concurrency,
        ));
        let content = Arc::new(ContentBasedRecommender::new(
            catalog,
            history,
            directory,
            RecommendationCache::new(self.config.cache.capacity, self.config.cache.ttl_seconds),
        ));
        let scheduler = Arc::new(JobScheduler::new(
            engine.clone(),
            leaderboards.clone(),
            collaborative.clone(),
            content.clone(),
            self.config.scheduler.clone(),
        ));

        Renown {
            engine,
            leaderboards,
            collaborative,
            content,
            scheduler,
            config: self.config,
        }
    }
}

/// The assembled scoring, leaderboard, and recommendation subsystem.
#[derive(Clone)]
pub struct Renown {
    engine: Arc<ScoringEngine>,
    leaderboards: Arc<LeaderboardManager>,
    collaborative: Arc<CollaborativeRecommender>,
    content: Arc<ContentBasedRecommender>,
    scheduler: Arc<JobScheduler>,
    config: RenownConfig,
}

impl Renown {
    /// Builder with every port defaulting to in-memory storage.
    pub fn builder(config: RenownConfig) -> RenownBuilder {
        RenownBuilder::new(config)
    }

    /// The all-in-memory assembly, for embedding and tests.
    pub fn in_memory(config: RenownConfig) -> Renown {
        RenownBuilder::new(config).build()
    }

    pub fn config(&self) -> &RenownConfig {
        &self.config
    }

    pub fn engine(&self) -> &Arc<ScoringEngine> {
        &self.engine
    }

    pub fn leaderboards(&self) -> &Arc<LeaderboardManager> {
        &self.leaderboards
    }

    pub fn collaborative(&self) -> &Arc<CollaborativeRecommender> {
        &self.collaborative
    }

    pub fn content(&self) -> &Arc<ContentBasedRecommender> {
        &self.content
    }

    pub fn scheduler(&self) -> &Arc<JobScheduler> {
        &self.scheduler
    }

    // --- scoring ---

    /// Record a qualifying activity and return the updated score.
    pub async fn record_activity(
        &self,
        user_id: &str,
        target_id: &str,
        target_type: &str,
        activity_type: ActivityType,
    ) -> Result<UserScore> {
        self.engine
            .record_activity(user_id, target_id, target_type, activity_type)
            .await
    }

    pub async fn get_user_score(&self, user_id: &str) -> Result<UserScore> {
        self.engine.get_user_score(user_id).await
    }

    pub async fn get_top_users(&self, limit: usize) -> Result<Vec<UserScore>> {
        self.engine.get_top_users(limit).await
    }

    pub async fn get_users_by_rank_tier(&self, tier: RankTier) -> Result<Vec<UserScore>> {
        self.engine.get_users_by_rank_tier(tier).await
    }

    pub async fn get_suspicious_users(&self, threshold: u32) -> Result<Vec<UserScore>> {
        self.engine.get_suspicious_users(threshold).await
    }

    pub async fn get_suspended_users(&self) -> Result<Vec<UserScore>> {
        self.engine.get_suspended_users().await
    }

    pub async fn get_user_activity(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<ActivityRecord>> {
        self.engine.get_user_activity(user_id, limit).await
    }

    pub async fn report_user(
        &self,
        user_id: &str,
        suspension_threshold: u32,
    ) -> Result<UserScore> {
        self.engine.report_user(user_id, suspension_threshold).await
    }

    pub async fn clear_suspicion(&self, user_id: &str) -> Result<UserScore> {
        self.engine.clear_suspicion(user_id).await
    }

    // --- leaderboards ---

    pub async fn get_leaderboard(
        &self,
        leaderboard_type: LeaderboardType,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<LeaderboardEntry>> {
        self.leaderboards
            .get_leaderboard(leaderboard_type, period_start, period_end, limit)
            .await
    }

    pub async fn get_user_rank(
        &self,
        user_id: &str,
        leaderboard_type: LeaderboardType,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    ) -> Result<Option<u32>> {
        self.leaderboards
            .get_user_rank(user_id, leaderboard_type, period_start, period_end)
            .await
    }

    pub fn top_realtime(&self, k: usize) -> Vec<(String, i64)> {
        self.leaderboards.top_realtime(k)
    }

    pub fn realtime_rank_of(&self, user_id: &str) -> Option<usize> {
        self.leaderboards.realtime_rank_of(user_id)
    }

    // --- recommendations ---

    pub async fn get_recommended_users(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<UserSimilarity>> {
        self.collaborative.get_recommended_users(user_id, limit).await
    }

    pub async fn get_similar_items(&self, item_id: &str, limit: usize) -> Result<Vec<ScoredItem>> {
        self.content.get_similar_items(item_id, limit).await
    }

    pub async fn get_personalized_items(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<ScoredItem>> {
        self.content.get_personalized_items(user_id, limit).await
    }

    /// Incrementally refresh one user's similarity edges after their search
    /// activity changed.
    pub async fn update_similarities_for_user(&self, user_id: &str) -> Result<usize> {
        self.collaborative.update_for_user(user_id).await
    }

    pub fn popular_terms(&self, limit: usize) -> Vec<(String, u64)> {
        self.collaborative.popular_terms(limit)
    }
}
