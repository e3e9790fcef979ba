//! End-to-end tests for leaderboard snapshots and the realtime ranking
//! structure, driven through the `Renown` facade.

use std::sync::Arc;

use chrono::Utc;
use renown::prelude::*;
use renown::scheduler::day_period;
use renown::storage::InMemoryUserDirectory;

async fn renown_with_users(users: &[(&str, &str)]) -> Renown {
    let directory = Arc::new(InMemoryUserDirectory::new());
    for (id, name) in users {
        directory.add_user(*id, *name).await;
    }

    let config = ConfigBuilder::defaults()
        .build()
        .expect("default config should validate");
    RenownBuilder::new(config)
        .with_user_directory(directory)
        .build()
}

#[tokio::test]
async fn snapshot_orders_by_score_then_user_id() {
    let renown =
        renown_with_users(&[("alice", "Alice"), ("bob", "Bob"), ("carol", "Carol")]).await;

    renown
        .record_activity("alice", "book-1", "book", ActivityType::Favorite)
        .await
        .expect("favorite should succeed");
    renown
        .record_activity("bob", "book-1", "book", ActivityType::Like)
        .await
        .expect("like should succeed");
    renown
        .record_activity("carol", "book-1", "book", ActivityType::Like)
        .await
        .expect("like should succeed");

    let (start, end) = day_period(Utc::now());
    renown
        .leaderboards()
        .build_snapshot(LeaderboardType::Daily, start, end)
        .await
        .expect("snapshot build should succeed");

    let board = renown
        .get_leaderboard(LeaderboardType::Daily, start, end, 10)
        .await
        .expect("leaderboard read should succeed");

    assert_eq!(board.len(), 3);
    // alice 1002 first, then bob/carol tied at 1001 broken by user id.
    assert_eq!(board[0].user_id, "alice");
    assert_eq!(board[0].rank_position, 1);
    assert_eq!(board[0].username, "Alice");
    assert_eq!(board[1].user_id, "bob");
    assert_eq!(board[1].rank_position, 2);
    assert_eq!(board[2].user_id, "carol");
    assert_eq!(board[2].rank_position, 3);
}

#[tokio::test]
async fn rebuilding_a_period_replaces_the_previous_generation() {
    let renown = renown_with_users(&[("alice", "Alice"), ("bob", "Bob")]).await;

    renown
        .record_activity("alice", "book-1", "book", ActivityType::Like)
        .await
        .expect("like should succeed");

    let (start, end) = day_period(Utc::now());
    renown
        .leaderboards()
        .build_snapshot(LeaderboardType::Daily, start, end)
        .await
        .expect("first snapshot should succeed");

    renown
        .record_activity("bob", "book-1", "book", ActivityType::Favorite)
        .await
        .expect("favorite should succeed");
    renown
        .leaderboards()
        .build_snapshot(LeaderboardType::Daily, start, end)
        .await
        .expect("second snapshot should succeed");

    let board = renown
        .get_leaderboard(LeaderboardType::Daily, start, end, 10)
        .await
        .expect("leaderboard read should succeed");
    assert_eq!(board.len(), 2);
    assert_eq!(board[0].user_id, "bob");
    assert_eq!(board[0].score, 1002);
}

#[tokio::test]
async fn user_rank_is_one_based_and_absent_when_unranked() {
    let renown = renown_with_users(&[("alice", "Alice"), ("bob", "Bob")]).await;

    renown
        .record_activity("alice", "book-1", "book", ActivityType::Like)
        .await
        .expect("like should succeed");

    let (start, end) = day_period(Utc::now());
    renown
        .leaderboards()
        .build_snapshot(LeaderboardType::Daily, start, end)
        .await
        .expect("snapshot should succeed");

    let rank = renown
        .get_user_rank("alice", LeaderboardType::Daily, start, end)
        .await
        .expect("rank read should succeed");
    assert_eq!(rank, Some(1));

    let rank = renown
        .get_user_rank("bob", LeaderboardType::Daily, start, end)
        .await
        .expect("rank read should succeed");
    assert_eq!(rank, None);
}

#[tokio::test]
async fn realtime_ranking_tracks_recorded_activity() {
    let renown = renown_with_users(&[("alice", "Alice"), ("bob", "Bob")]).await;

    renown
        .record_activity("alice", "book-1", "book", ActivityType::Favorite)
        .await
        .expect("favorite should succeed");
    renown
        .record_activity("bob", "book-1", "book", ActivityType::Like)
        .await
        .expect("like should succeed");

    let top = renown.top_realtime(10);
    assert_eq!(top, vec![("alice".to_string(), 1002), ("bob".to_string(), 1001)]);

    assert_eq!(renown.realtime_rank_of("alice"), Some(1));
    assert_eq!(renown.realtime_rank_of("bob"), Some(2));
    assert_eq!(renown.realtime_rank_of("nobody"), None);
}

#[tokio::test]
async fn realtime_ties_break_by_ascending_user_id() {
    let renown = renown_with_users(&[("zed", "Zed"), ("amy", "Amy")]).await;

    renown
        .record_activity("zed", "book-1", "book", ActivityType::Like)
        .await
        .expect("like should succeed");
    renown
        .record_activity("amy", "book-1", "book", ActivityType::Like)
        .await
        .expect("like should succeed");

    let top = renown.top_realtime(2);
    assert_eq!(top[0].0, "amy");
    assert_eq!(top[1].0, "zed");
    // Tied scores get distinct ranks in the same order top-k lists them.
    assert_eq!(renown.realtime_rank_of("amy"), Some(1));
    assert_eq!(renown.realtime_rank_of("zed"), Some(2));
}

#[tokio::test]
async fn rebuild_realtime_repopulates_from_durable_scores() {
    let renown = renown_with_users(&[("alice", "Alice"), ("bob", "Bob")]).await;

    renown
        .record_activity("alice", "book-1", "book", ActivityType::Favorite)
        .await
        .expect("favorite should succeed");
    renown
        .record_activity("bob", "book-1", "book", ActivityType::Like)
        .await
        .expect("like should succeed");

    let count = renown
        .leaderboards()
        .rebuild_realtime()
        .await
        .expect("rebuild should succeed");
    assert_eq!(count, 2);

    let top = renown.top_realtime(10);
    assert_eq!(top.len(), 2);
    assert_eq!(top[0], ("alice".to_string(), 1002));
}
