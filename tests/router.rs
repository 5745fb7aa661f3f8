//! Routing behavior through the public handle

mod common;

use std::sync::Arc;

use common::{spawn_test_router, FailingGenerator, FixedGenerator};
use ember_companion::memory::{DialogueHistory, KvStore};
use ember_companion::skills::{MSG_NO_SEARCH, MSG_NO_WEATHER};
use ember_companion::FALLBACK_RESPONSE;

/// Reload the dialogue history a test router persisted under its temp dir
fn reload_history(dir: &tempfile::TempDir) -> DialogueHistory {
    let store = KvStore::open(dir.path().join("memory")).expect("store");
    DialogueHistory::load(store).expect("history")
}

#[tokio::test]
async fn test_multi_clause_order() {
    let (router, _speech, _dir) =
        spawn_test_router(Arc::new(FixedGenerator("okay".to_string())));

    let response = router.handle("tell me a story then sing me a song").await;
    assert_eq!(response, "okay\nokay");
}

#[tokio::test]
async fn test_timer_clause_skips_generation() {
    // A failing generator proves the timer path never generates
    let (router, _speech, _dir) = spawn_test_router(Arc::new(FailingGenerator));

    let response = router.handle("set a timer for 5 minutes").await;
    assert_eq!(response, "Okay, timer set for 5 minutes.");
}

#[tokio::test]
async fn test_timer_without_duration() {
    let (router, _speech, _dir) = spawn_test_router(Arc::new(FailingGenerator));

    let response = router.handle("set a timer").await;
    assert_eq!(response, "Sorry, I didn't catch the timer duration.");
}

#[tokio::test]
async fn test_media_context_carries_to_bare_stop() {
    let (router, _speech, _dir) = spawn_test_router(Arc::new(FailingGenerator));

    let response = router.handle("play jazz on youtube, then stop").await;
    let lines: Vec<&str> = response.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("media player"));
    assert_eq!(lines[1], "Nothing is playing right now.");
}

#[tokio::test]
async fn test_stop_after_timer_references_timer() {
    let (router, _speech, _dir) = spawn_test_router(Arc::new(FailingGenerator));

    let response = router.handle("set a timer for 2 minutes then stop").await;
    let lines: Vec<&str> = response.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].contains("no specific timer"));
}

#[tokio::test]
async fn test_generation_failure_becomes_fallback() {
    let (router, _speech, _dir) = spawn_test_router(Arc::new(FailingGenerator));

    let response = router.handle("how are you feeling today?").await;
    assert_eq!(response, FALLBACK_RESPONSE);
}

#[tokio::test]
async fn test_long_generation_is_truncated() {
    let long = "word ".repeat(100).trim().to_string();
    let (router, _speech, _dir) = spawn_test_router(Arc::new(FixedGenerator(long)));

    let response = router.handle("tell me everything you know").await;
    assert_eq!(response.split_whitespace().count(), 60);
    assert!(response.ends_with("..."));
}

#[tokio::test]
async fn test_remember_and_recall() {
    let (router, _speech, _dir) =
        spawn_test_router(Arc::new(FixedGenerator("okay".to_string())));

    let ack = router.handle("remember that I water plants on sunday").await;
    assert_eq!(ack, "Okay, I'll remember that for you.");

    let recall = router.handle("did i ask you to save anything").await;
    assert!(recall.contains("water plants on sunday"));
}

#[tokio::test]
async fn test_bare_remind_me_stores_goal() {
    let (router, _speech, _dir) = spawn_test_router(Arc::new(FailingGenerator));

    let ack = router.handle("remind me about the water bill").await;
    assert_eq!(ack, "Okay, I'll remember that for you.");

    let recall = router.handle("what did i tell you to remember").await;
    assert!(recall.contains("about the water bill"));
}

#[tokio::test]
async fn test_missing_weather_skill_declines() {
    let (router, _speech, _dir) = spawn_test_router(Arc::new(FailingGenerator));

    let response = router.handle("what's the weather like").await;
    assert_eq!(response, MSG_NO_WEATHER);
}

#[tokio::test]
async fn test_missing_search_skill_declines() {
    let (router, _speech, _dir) = spawn_test_router(Arc::new(FailingGenerator));

    let response = router.handle("search for the tallest mountain").await;
    assert_eq!(response, MSG_NO_SEARCH);
}

#[tokio::test]
async fn test_calendar_round_trip() {
    let (router, _speech, _dir) = spawn_test_router(Arc::new(FailingGenerator));

    let created = router.handle("schedule yoga every tuesday").await;
    assert!(created.contains("yoga"));

    let upcoming = router.handle("what's on my calendar this week").await;
    assert!(upcoming.contains("yoga every tuesday"));
}

#[tokio::test]
async fn test_special_memory_short_circuits() {
    let (router, _speech, _dir) = spawn_test_router(Arc::new(FailingGenerator));

    let response = router
        .handle("tell me about a special memory you and I share")
        .await;
    assert!(response.contains("haven't made any special memories"));
}

#[tokio::test]
async fn test_search_words_beat_stop_and_timer_words() {
    let (router, _speech, _dir) = spawn_test_router(Arc::new(FailingGenerator));

    // "stop" and "timer" appear, but the search cue decides the path
    let response = router.handle("look up how to stop hiccups").await;
    assert_eq!(response, MSG_NO_SEARCH);

    let response = router.handle("search for the best timer apps").await;
    assert_eq!(response, MSG_NO_SEARCH);
}

#[tokio::test]
async fn test_each_clause_gets_its_own_dialogue_turn() {
    let (router, _speech, dir) =
        spawn_test_router(Arc::new(FixedGenerator("okay".to_string())));

    router.handle("tell me a story then sing me a song").await;

    let history = reload_history(&dir);
    assert_eq!(history.len(), 2);
    assert_eq!(history.last().unwrap().input, "sing me a song");
}

#[tokio::test]
async fn test_history_write_failure_keeps_response() {
    let (router, _speech, dir) =
        spawn_test_router(Arc::new(FixedGenerator("okay".to_string())));

    // A directory squatting on the history file makes every save fail
    std::fs::create_dir_all(dir.path().join("memory/history.json")).unwrap();

    let response = router.handle("tell me a story").await;
    assert_eq!(response, "okay");
}

#[tokio::test]
async fn test_goal_ack_survives_save_failure() {
    let (router, _speech, dir) = spawn_test_router(Arc::new(FailingGenerator));

    std::fs::create_dir_all(dir.path().join("memory/goals.json")).unwrap();

    let response = router.handle("remember that the car needs new tires").await;
    assert_eq!(response, "Okay, I'll remember that for you.");
}

#[tokio::test]
async fn test_earlier_clause_runs_before_memory_short_circuit() {
    let (router, _speech, dir) = spawn_test_router(Arc::new(FailingGenerator));

    let response = router
        .handle("set a timer for 5 minutes and tell me a special memory")
        .await;

    // Only the memory comes back, but the timer clause already executed
    assert!(!response.contains("timer set"));
    assert_eq!(response.lines().count(), 1);

    let history = reload_history(&dir);
    assert_eq!(history.len(), 1);
    assert!(history.last().unwrap().response.contains("timer set"));
}
