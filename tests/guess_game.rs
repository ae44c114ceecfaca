mod common;

use chatgames::games::guess::GameStateStore;
use chatgames::games::GameError;
use common::{harness, Harness, PLATFORM};

async fn target(h: &Harness, user: &str) -> u32 {
    h.games
        .get(&format!("{}:{}", PLATFORM, user))
        .await
        .expect("game running")
        .target_number
}

#[tokio::test]
async fn winning_first_game_pays_score_and_first_blood() {
    let h = harness();
    let reply = h.service.guess("ray", PLATFORM, "start").await.unwrap();
    assert!(reply.contains("between 1 and 100"), "{}", reply);

    let t = target(&h, "ray").await;
    h.clock.advance_ms(10_000);
    let reply = h.service.guess("ray", PLATFORM, &t.to_string()).await.unwrap();
    assert!(reply.contains("Correct!"), "{}", reply);
    assert!(reply.contains("First Blood"), "{}", reply);

    let record = h.service.records().get("ray", PLATFORM).await.unwrap();
    // one attempt: 9*5 = 45, 10 s elapsed: 50*2 = 100, plus 50 for first_blood
    assert_eq!(record.points, 100 + 45 + 100 + 50);
    assert_eq!(record.games_played, 1);
    assert_eq!(record.games_won, 1);
    assert!(h.games.get("test:ray").await.is_none());
}

#[tokio::test]
async fn experience_card_boosts_one_win() {
    let h = harness();
    let mut record = h.service.records().get("sam", PLATFORM).await.unwrap();
    record.points = 200;
    record.add_item("exp_card", "Experience Card", "");
    record.achievements.push("first_blood".into());
    h.service.records().put(&record).await.unwrap();

    h.service.use_item("sam", PLATFORM, "exp_card").await.unwrap();
    h.clock.advance_ms(5_000);
    h.service.guess("sam", PLATFORM, "start").await.unwrap();
    let t = target(&h, "sam").await;
    let reply = h.service.guess("sam", PLATFORM, &t.to_string()).await.unwrap();
    assert!(reply.contains("experience card 33"), "{}", reply);

    let record = h.service.records().get("sam", PLATFORM).await.unwrap();
    assert!(!record.exp_card_active);
    assert_eq!(record.points, 200 + 45 + 120 + 33);
}

#[tokio::test]
async fn wrong_guesses_give_direction() {
    let h = harness();
    h.service.guess("tia", PLATFORM, "start").await.unwrap();
    let t = target(&h, "tia").await;
    if t > 1 {
        let reply = h.service.guess("tia", PLATFORM, "1").await.unwrap();
        assert!(reply.contains("Higher than 1"), "{}", reply);
    }
    if t < 100 {
        let reply = h.service.guess("tia", PLATFORM, "100").await.unwrap();
        assert!(reply.contains("Lower than 100"), "{}", reply);
    }
    let err = h.service.guess("tia", PLATFORM, "seven").await.unwrap_err();
    assert!(matches!(err, GameError::InvalidNumber(_)));
    let err = h.service.guess("tia", PLATFORM, "101").await.unwrap_err();
    assert!(matches!(err, GameError::OutOfRange { value: 101, max: 100 }));
}

#[tokio::test]
async fn hint_spends_a_token_and_brackets_target() {
    let h = harness();
    h.service.shop("uma", PLATFORM, "buy", "hint_token").await.unwrap();
    h.service.guess("uma", PLATFORM, "start").await.unwrap();
    let t = target(&h, "uma").await;

    let reply = h.service.guess("uma", PLATFORM, "hint").await.unwrap();
    let low = t.saturating_sub(10).max(1);
    let high = (t + 10).min(100);
    assert!(reply.contains(&format!("between {} and {}", low, high)), "{}", reply);
    assert_eq!(h.service.records().get("uma", PLATFORM).await.unwrap().hint_tokens, 0);

    let err = h.service.guess("uma", PLATFORM, "hint").await.unwrap_err();
    assert!(matches!(err, GameError::NoHintTokens));
}

#[tokio::test]
async fn giving_up_reveals_and_ends_the_game() {
    let h = harness();
    h.service.guess("vic", PLATFORM, "start").await.unwrap();
    let t = target(&h, "vic").await;
    let reply = h.service.guess("vic", PLATFORM, "quit").await.unwrap();
    assert!(reply.contains(&t.to_string()));
    let err = h.service.guess("vic", PLATFORM, "5").await.unwrap_err();
    assert!(matches!(err, GameError::NoActiveGame));
}

#[tokio::test]
async fn twenty_games_unlock_game_addict() {
    let h = harness();
    for _ in 0..20 {
        h.service.guess("wes", PLATFORM, "start").await.unwrap();
        h.wait_cooldown();
    }
    let record = h.service.records().get("wes", PLATFORM).await.unwrap();
    assert_eq!(record.games_played, 20);
    assert!(record.has_achievement("game_addict"));
    assert_eq!(record.points, 250);
}
