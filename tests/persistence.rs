mod common;

use chatgames::bot::{dispatch, MessageEvent, TextEvent};
use chatgames::games::UserRecord;
use common::{harness, sled_harness, PLATFORM};

#[tokio::test]
async fn records_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    {
        let h = sled_harness(dir.path());
        h.service.sign("dee", PLATFORM).await.unwrap();
        h.service.shop("dee", PLATFORM, "buy", "hint_token").await.unwrap();
    }
    let h = sled_harness(dir.path());
    let record = h.service.records().get("dee", PLATFORM).await.unwrap();
    assert_eq!(record.points, 100 + 12 - 30);
    assert_eq!(record.hint_tokens, 1);
    assert_eq!(record.total_sign_days, 1);
}

#[tokio::test]
async fn new_user_is_created_once_with_defaults() {
    let h = harness();
    assert!(h.kv.get("test:eve").await.unwrap().is_none());
    let reply = h.service.profile("eve", PLATFORM).await.unwrap();
    assert!(reply.contains("Points: 100"), "{}", reply);

    let bytes = h.kv.get("test:eve").await.unwrap().expect("persisted");
    let stored: UserRecord = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(stored.free_spin_count, 1);
    assert_eq!(stored.schema_version, 1);
    assert!(stored.inventory.is_empty());
}

#[tokio::test]
async fn platforms_keep_separate_records() {
    let h = harness();
    h.service.sign("fay", "discord").await.unwrap();
    let other = h.service.records().get("fay", "telegram").await.unwrap();
    assert_eq!(other.points, 100);
    assert!(other.last_sign_date.is_none());
}

#[tokio::test]
async fn concurrent_commands_for_one_user_do_not_lose_updates() {
    let h = std::sync::Arc::new(harness());
    let mut record = h.service.records().get("gus", PLATFORM).await.unwrap();
    record.points = 450;
    h.service.records().put(&record).await.unwrap();

    let mut tasks = Vec::new();
    for _ in 0..4 {
        let h = h.clone();
        tasks.push(tokio::spawn(async move {
            h.service.shop("gus", PLATFORM, "buy", "hint_token").await
        }));
    }
    for t in tasks {
        t.await.unwrap().unwrap();
    }
    let record = h.service.records().get("gus", PLATFORM).await.unwrap();
    assert_eq!(record.hint_tokens, 4);
    assert_eq!(record.points, 450 - 4 * 30);
}

struct Anonymous {
    reply: Option<String>,
}

impl MessageEvent for Anonymous {
    fn sender_id(&self) -> Option<String> {
        None
    }
    fn platform_id(&self) -> Option<String> {
        Some(PLATFORM.to_string())
    }
    fn set_reply(&mut self, reply: String) {
        self.reply = Some(reply);
    }
}

#[tokio::test]
async fn dispatch_handles_identity_and_unknown_text() {
    let h = harness();
    let mut anon = Anonymous { reply: None };
    assert!(dispatch(&h.service, &mut anon, "sign").await);
    assert_eq!(anon.reply.as_deref(), Some("Could not identify the sender."));

    let mut event = TextEvent::new("hal", PLATFORM);
    assert!(!dispatch(&h.service, &mut event, "good morning").await);
    assert!(event.take_reply().is_none());

    assert!(dispatch(&h.service, &mut event, "help").await);
    assert!(event.take_reply().unwrap().contains("spin pay"));

    assert!(dispatch(&h.service, &mut event, "achievements").await);
    let listing = event.take_reply().unwrap();
    assert!(listing.contains("(0/10)"), "{}", listing);
}
