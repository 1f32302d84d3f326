//! Integration tests for keyword watches.
//!
//! Drives the public API end to end: the `watch` command against a JSON
//! watch file, reloading from disk, and routing messages through the
//! service.

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use tempfile::TempDir;
use watchbot::commands::WatchCommand;
use watchbot::models::{ChatId, ChatMessage, Presence, UserId};
use watchbot::services::{InMemoryRoster, WatchService};
use watchbot::storage::{JsonWatchStore, WatchStore};
use watchbot::{Error, WatchbotConfig};

const ALICE: UserId = UserId::new(1);
const BOB: UserId = UserId::new(2);
const CAROL: UserId = UserId::new(3);
const GENERAL: ChatId = ChatId::new(100);
const NOW: f64 = 1_700_000_000.0;

fn config(dir: &TempDir) -> WatchbotConfig {
    WatchbotConfig::new().with_data_dir(dir.path())
}

fn run(service: &WatchService, user: UserId, input: &str) -> String {
    WatchCommand::parse(input)
        .unwrap()
        .execute(service, user, NOW)
        .unwrap()
}

fn roster() -> InMemoryRoster {
    let mut roster = InMemoryRoster::new();
    for user in [ALICE, BOB, CAROL] {
        roster.add_member(GENERAL, user);
    }
    roster
}

fn recipients(
    service: &WatchService,
    text: &str,
    author: UserId,
    roster: &InMemoryRoster,
) -> Vec<UserId> {
    let message = ChatMessage::group(text, author, GENERAL).at(NOW);
    service
        .on_message(&message, roster, NOW)
        .unwrap()
        .into_iter()
        .map(|n| n.recipient)
        .collect()
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_watches_survive_restart() {
    let dir = TempDir::new().unwrap();
    {
        let service = WatchService::open(&config(&dir)).unwrap();
        run(&service, BOB, r#"add "3d printer" no yes"#);
        run(&service, BOB, "add CAD yes yes");
        run(&service, BOB, "activityTimeout 60");
        run(&service, CAROL, "off");
    }

    let path = config(&dir).watch_file_path();
    let stored = JsonWatchStore::new(&path).load().unwrap();
    assert_eq!(stored[&BOB].keywords.len(), 2);
    assert!(!stored[&CAROL].enabled);

    let service = WatchService::open(&config(&dir)).unwrap();
    assert_eq!(
        recipients(&service, "Anyone have a 3D printer?", ALICE, &roster()),
        vec![BOB]
    );
    let status = service.status(BOB, NOW).unwrap().unwrap();
    assert!((status.activity_timeout - 60.0).abs() < f64::EPSILON);
}

#[test]
fn test_reads_existing_watch_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("keyword_watches.json"),
        r#"{
            "2": {"on": true, "activityTimeout": 180.0, "keywords": [
                {"keyword": "CAD", "wholeWord": true, "matchCase": true}
            ]},
            "bogus": {"on": true, "activityTimeout": 0, "keywords": []}
        }"#,
    )
    .unwrap();

    let service = WatchService::open(&config(&dir)).unwrap();
    assert_eq!(recipients(&service, "I love CAD tools", ALICE, &roster()), vec![BOB]);
    assert!(recipients(&service, "I love cad tools", ALICE, &roster()).is_empty());
    assert!(recipients(&service, "AutoCAD rocks", ALICE, &roster()).is_empty());
}

#[test]
fn test_corrupt_watch_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("keyword_watches.json"), "{not json").unwrap();
    assert!(matches!(
        WatchService::open(&config(&dir)),
        Err(Error::OperationFailed { .. })
    ));
}

// ============================================================================
// Routing
// ============================================================================

#[test]
fn test_author_never_notified() {
    let service = WatchService::in_memory();
    run(&service, ALICE, "add rust");
    run(&service, BOB, "add rust");

    assert_eq!(recipients(&service, "rust rust rust", ALICE, &roster()), vec![BOB]);
}

#[test]
fn test_one_notification_per_user_listing_all_keywords() {
    let service = WatchService::in_memory();
    run(&service, BOB, "add rust");
    run(&service, BOB, "add Cargo yes");
    run(&service, CAROL, "add cargo");

    let message = ChatMessage::group("cargo build; Cargo test; rust", ALICE, GENERAL)
        .with_names("Alice", "general");
    let notifications = service.on_message(&message, &roster(), NOW).unwrap();

    assert_eq!(notifications.len(), 2);
    assert_eq!(notifications[0].recipient, BOB);
    assert_eq!(notifications[0].keywords, vec!["Cargo".to_string(), "rust".to_string()]);
    assert_eq!(notifications[1].recipient, CAROL);
    assert_eq!(notifications[1].keywords, vec!["cargo".to_string()]);
    assert!(notifications[1].render().starts_with(
        "The following message matched your watches for the keyword(s) \"**cargo**\":\n\
         > *Alice* said in *general*:"
    ));
}

#[test]
fn test_presence_activity_and_suppression() {
    let service = WatchService::in_memory();
    run(&service, BOB, "add rust");
    let mut roster = roster();

    roster.set_presence(BOB, Presence::Available);
    assert!(recipients(&service, "rust", ALICE, &roster).is_empty());

    roster.set_presence(BOB, Presence::Away);
    roster.record_activity(BOB, NOW - 10.0);
    assert!(recipients(&service, "rust", ALICE, &roster).is_empty());

    run(&service, BOB, "activityTimeout 0");
    assert_eq!(recipients(&service, "rust", ALICE, &roster), vec![BOB]);

    run(&service, BOB, "suppress 600");
    assert!(recipients(&service, "rust", ALICE, &roster).is_empty());

    run(&service, BOB, "suppress 0");
    assert_eq!(recipients(&service, "rust", ALICE, &roster), vec![BOB]);
}

#[test]
fn test_off_and_delete_stop_notifications() {
    let service = WatchService::in_memory();
    run(&service, BOB, "add rust");
    run(&service, BOB, "add go");

    run(&service, BOB, "off");
    assert!(recipients(&service, "rust and go", ALICE, &roster()).is_empty());

    run(&service, BOB, "on");
    run(&service, BOB, "delete 1");
    let message = ChatMessage::group("rust and go", ALICE, GENERAL);
    let notifications = service.on_message(&message, &roster(), NOW).unwrap();
    assert_eq!(notifications[0].keywords, vec!["go".to_string()]);

    run(&service, BOB, "delete all");
    assert!(recipients(&service, "rust and go", ALICE, &roster()).is_empty());
}

#[test]
fn test_non_member_not_notified_in_group_but_is_in_direct() {
    let service = WatchService::in_memory();
    run(&service, BOB, "add rust");
    let roster = InMemoryRoster::new();

    assert!(recipients(&service, "rust", ALICE, &roster).is_empty());
    let direct = ChatMessage::direct("rust", ALICE, ChatId::new(5));
    assert_eq!(service.on_message(&direct, &roster, NOW).unwrap().len(), 1);
}

#[test]
fn test_exhaustive_suffix_matches_config() {
    let dir = TempDir::new().unwrap();
    let plain = WatchService::open(&config(&dir)).unwrap();
    run(&plain, BOB, "add she");
    run(&plain, CAROL, "add he");

    // "he" ends where "she" ends, so only the longer keyword is reported.
    assert_eq!(recipients(&plain, "ushers", ALICE, &roster()), vec![BOB]);

    let mut exhaustive_config = config(&dir);
    exhaustive_config.exhaustive_suffix_matches = true;
    let exhaustive = WatchService::open(&exhaustive_config).unwrap();
    assert_eq!(recipients(&exhaustive, "ushers", ALICE, &roster()), vec![BOB, CAROL]);
}

#[test]
fn test_empty_keyword_leaves_list_unchanged() {
    let service = WatchService::in_memory();
    run(&service, BOB, "add rust");
    let result = WatchCommand::parse(r#"add """#).unwrap().execute(&service, BOB, NOW);
    assert!(matches!(result, Err(Error::EmptyKeyword)));
    assert_eq!(service.status(BOB, NOW).unwrap().unwrap().keywords.len(), 1);
}
