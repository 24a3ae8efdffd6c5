//! QA tests for screen flow, NPC dialogue, skills, items and level
//! progression through the public session API.
//!
//! Run with: cargo test -p glitch-core --test qa_session_flow

use glitch_core::audio::{AudioCue, AudioSink, MusicTrack, SoundEffect};
use glitch_core::catalog;
use glitch_core::testing::*;
use glitch_core::world::{Customization, EntityId, Position, Screen};
use glitch_core::{SessionConfig, SessionError};
use std::time::Duration;

// ============================================================================
// Menus
// ============================================================================

#[test]
fn test_menu_navigation() {
    let mut h = TestHarness::new(41);
    assert_screen(&h, Screen::Intro);

    h.session.open_achievements();
    assert_screen(&h, Screen::Achievements);
    assert_eq!(h.audio.current_music(), Some(MusicTrack::MainMenu));
    h.session.close_overlay();
    assert_screen(&h, Screen::Intro);

    h.session.start();
    assert_screen(&h, Screen::LevelSelect);
    assert!(h.audio.played(AudioCue::Sfx(SoundEffect::ButtonClick)));

    // Locked levels stay on the select screen
    assert!(h.session.select_level("forest").is_empty());
    assert_screen(&h, Screen::LevelSelect);

    h.session.back_to_intro();
    assert_screen(&h, Screen::Intro);
}

#[test]
fn test_customization_saved() {
    let mut h = TestHarness::new(42);
    assert!(h.session.save_customization(Vec::new()).is_empty());

    h.session.open_customization();
    assert_screen(&h, Screen::Customization);
    let look = Customization {
        entity_id: EntityId::new(catalog::PLAYER_ID),
        outfit: "hoodie".into(),
        color: "#00ff99".into(),
    };
    h.session.save_customization(vec![look.clone()]);
    assert_eq!(h.world().customizations, vec![look]);

    // No level running, so closing returns to the title
    h.session.close_overlay();
    assert_screen(&h, Screen::Intro);
}

#[test]
fn test_customization_from_exploration_returns_to_level() {
    let mut h = TestHarness::in_level(43, "cyber_city");
    h.session.open_customization();
    assert_screen(&h, Screen::Customization);
    h.session.close_overlay();
    assert_screen(&h, Screen::Exploration);
}

#[test]
fn test_configured_start_level() {
    let config = SessionConfig::new("Test Bot")
        .with_seed(44)
        .with_start_level("cyber_city");
    let mut h = TestHarness::with_config(config).unwrap();
    h.session.start();
    assert_screen(&h, Screen::Exploration);

    let err = TestHarness::with_config(SessionConfig::new("Bot").with_start_level("moon"));
    assert!(matches!(err, Err(SessionError::UnknownLevel(_))));
}

// ============================================================================
// Dialogue
// ============================================================================

#[tokio::test]
async fn test_chat_with_cat_builds_bond() {
    let mut h = TestHarness::in_level(45, "cyber_city");
    h.recruit_companion();
    h.dialogue.queue_reply("Meow. Keep up, glitch-face.");

    h.session.interact_npc(catalog::COMPANION_NPC);
    assert_eq!(h.session.dialogue_text(), None);

    let response = h.session.send_chat("  hello cat  ").await;
    assert_eq!(response.narrative, "Meow. Keep up, glitch-face.");
    assert_eq!(h.session.dialogue_text(), Some("Meow. Keep up, glitch-face."));
    assert_bond(&h, 125, 2);

    let contexts = h.dialogue.contexts();
    assert_eq!(contexts.len(), 1);
    assert_eq!(contexts[0].npc_name, "Black Cat");
    assert_eq!(contexts[0].player_input, "hello cat");

    // Second turn carries the first exchange as history
    h.session.send_chat("and now?").await;
    let contexts = h.dialogue.contexts();
    assert_eq!(
        contexts[1].history,
        vec![
            "Player: hello cat".to_string(),
            "Black Cat: Meow. Keep up, glitch-face.".to_string()
        ]
    );
    assert_bond(&h, 130, 2);
}

#[test]
fn test_pet_companion() {
    let mut h = TestHarness::in_level(46, "cyber_city");
    h.recruit_companion();
    assert!(h.session.pet_companion().is_empty());

    h.session.interact_npc(catalog::COMPANION_NPC);
    let response = h.session.pet_companion();
    assert!(response.narrative.contains("Purrrr"));
    assert_bond(&h, 135, 2);
}

#[test]
fn test_pending_chat_blocks_second_send() {
    let mut h = TestHarness::in_level(47, "cyber_city");
    h.session.interact_npc(catalog::BARKEEP_NPC);

    assert!(h.session.begin_chat("   ").is_none());
    let context = h.session.begin_chat("one drink please").unwrap();
    assert_eq!(context.npc_name, "Barkeep VPN");
    assert!(h.session.chat_pending());
    assert!(h.session.begin_chat("hello?").is_none());

    h.session.finish_chat("Coming right up.".into());
    assert!(!h.session.chat_pending());
    assert_eq!(h.session.dialogue_text(), Some("Coming right up."));
}

#[test]
fn test_closed_dialogue_drops_late_reply() {
    let mut h = TestHarness::in_level(48, "cyber_city");
    h.recruit_companion();
    h.session.interact_npc(catalog::COMPANION_NPC);

    h.session.begin_chat("still there?").unwrap();
    h.session.close_dialogue();
    let response = h.session.finish_chat("Meow?".into());

    assert!(response.is_empty());
    assert_eq!(h.session.dialogue_text(), None);
    assert_bond(&h, 120, 2);
}

#[test]
fn test_boss_greeting() {
    let mut h = TestHarness::in_level(49, "cyber_city");
    h.session.interact_npc(catalog::BOSS_NPC);
    assert!(h
        .session
        .dialogue_text()
        .is_some_and(|t| t.contains("YOUR METRICS ARE INSUFFICIENT")));
    assert_eq!(h.world().active_npc.as_deref(), Some(catalog::BOSS_NPC));

    // Dialogue pauses movement until closed
    h.session.key_down(glitch_core::Key::D);
    h.tick();
    assert_eq!(h.world().player_position, Position::new(300.0, 800.0));
    h.session.close_dialogue();
    assert_eq!(h.world().active_npc, None);
}

// ============================================================================
// Skills and items
// ============================================================================

#[test]
fn test_unlock_skills_by_level() {
    let mut h = TestHarness::in_level(50, "cyber_city");
    let player = EntityId::new(catalog::PLAYER_ID);

    let denied = h.session.unlock_skill(&player, "hotfix");
    assert!(denied.is_empty());

    h.world_mut().player_mut().level = 4;
    assert!(!h.session.unlock_skill(&player, "hotfix").is_empty());
    assert!(h.world().player().has_unlocked("hotfix"));

    // The path unlocks in order
    let skipped = h.session.unlock_skill(&player, "overclock");
    assert!(skipped.narrative.contains("Unlock trash_post"));
    h.session.unlock_skill(&player, "trash_post");

    // Passive bonus applies once
    h.session.unlock_skill(&player, "overclock");
    h.session.unlock_skill(&player, "overclock");
    assert_eq!(h.world().player().attack, 15);
}

#[test]
fn test_buy_and_use_items() {
    let mut h = TestHarness::in_level(51, "cyber_city");
    h.world_mut().subscribers = 600;
    h.session.buy_item("ram_stick");
    h.session.buy_item("gpu_shard");
    assert_eq!(h.world().subscribers, 50);
    assert_eq!(h.world().inventory.len(), 2);

    h.world_mut().player_mut().hit_points.take_damage(60);
    h.session.use_item(0, None);
    assert_hp(&h, 90, 100);

    h.session.use_item(0, None);
    assert_eq!(h.world().player().attack, 12);
    assert!(h.world().inventory.is_empty());

    assert!(h.session.use_item(5, None).is_empty());
}

// ============================================================================
// Level progression
// ============================================================================

#[test]
fn test_complete_level_unlocks_next() {
    let mut h = TestHarness::in_level(52, "cyber_city");
    h.wait(Duration::from_secs(30));
    h.tick();

    h.session.complete_level("cyber_city");
    let level = h.world().level("cyber_city").unwrap();
    assert!(level.completed);
    assert_eq!(level.best_time, Some(30));
    assert!(h.world().level("forest").unwrap().unlocked);
    assert_eq!(h.world().subscribers, 500);
    assert!(h.world().achievement("first_level").unwrap().unlocked);
    assert!(h.audio.played(AudioCue::Sfx(SoundEffect::LevelComplete)));
    assert!(h.audio.played(AudioCue::Sfx(SoundEffect::Achievement)));
}

#[test]
fn test_objectives_complete_level() {
    let mut h = TestHarness::in_level(53, "cyber_city");
    h.place_player(Position::new(1000.0, 800.0));
    assert!(!h.world().level("cyber_city").unwrap().completed);

    for enemy in ["glitch_1", "glitch_5"] {
        h.session.engage(enemy);
        h.fight(50);
        assert_screen(&h, Screen::Exploration);
    }

    let level = h.world().level("cyber_city").unwrap();
    assert!(level.completed);
    assert!(level.objectives.iter().all(|o| o.completed));
    assert!(h.world().level("forest").unwrap().unlocked);
    assert!(h.world().subscribers >= 500);
}

#[test]
fn test_new_level_after_menu() {
    let mut h = TestHarness::in_level(54, "cyber_city");
    h.session.complete_level("cyber_city");
    h.session.open_customization();
    h.session.back_to_intro();
    h.session.start();
    h.session.select_level("forest");

    assert_screen(&h, Screen::Exploration);
    assert_eq!(h.world().current_level.as_deref(), Some("forest"));
    assert_eq!(h.audio.current_music(), Some(MusicTrack::ForestTheme));
    assert_eq!(h.world().player_position, Position::new(300.0, 800.0));
}
