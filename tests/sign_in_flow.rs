mod common;

use chatgames::games::GameError;
use common::{harness, PLATFORM};

#[tokio::test]
async fn seven_day_streak_pays_week_bonus_and_sign_master() {
    let h = harness();
    for day in 1..=7 {
        let reply = h.service.sign("alice", PLATFORM).await.unwrap();
        if day == 7 {
            assert!(reply.contains("7-day streak bonus: +50"), "{}", reply);
            assert!(reply.contains("Sign-in Master"), "{}", reply);
        }
        h.clock.advance_days(1);
    }
    let record = h.service.records().get("alice", PLATFORM).await.unwrap();
    // 100 start + 126 streak rewards + 50 week bonus + 100 sign_master
    assert_eq!(record.points, 376);
    assert_eq!(record.consecutive_days, 7);
    assert!(record.has_achievement("sign_master"));
}

#[tokio::test]
async fn second_sign_in_same_day_changes_nothing() {
    let h = harness();
    h.service.sign("bob", PLATFORM).await.unwrap();
    let after_first = h.service.records().get("bob", PLATFORM).await.unwrap();
    assert_eq!(after_first.points, 112);

    h.wait_cooldown();
    let err = h.service.sign("bob", PLATFORM).await.unwrap_err();
    assert!(matches!(err, GameError::AlreadySignedToday));
    let after_second = h.service.records().get("bob", PLATFORM).await.unwrap();
    assert_eq!(after_second.points, after_first.points);
    assert_eq!(after_second.total_sign_days, 1);
}

#[tokio::test]
async fn missing_a_day_restarts_the_streak() {
    let h = harness();
    h.service.sign("carol", PLATFORM).await.unwrap();
    h.clock.advance_days(1);
    h.service.sign("carol", PLATFORM).await.unwrap();
    h.clock.advance_days(2);
    let reply = h.service.sign("carol", PLATFORM).await.unwrap();
    assert!(reply.contains("Streak: 1 days"), "{}", reply);
    let record = h.service.records().get("carol", PLATFORM).await.unwrap();
    assert_eq!(record.total_sign_days, 3);
}

#[tokio::test]
async fn double_card_from_shop_doubles_next_sign_in() {
    let h = harness();
    h.service.shop("dana", PLATFORM, "buy", "double_card").await.unwrap();
    let reply = h.service.sign("dana", PLATFORM).await.unwrap();
    assert!(reply.contains("+22 points"), "{}", reply);
    let record = h.service.records().get("dana", PLATFORM).await.unwrap();
    assert!(!record.has_double_card);
    assert_eq!(record.points, 100 - 50 + 22);
}
