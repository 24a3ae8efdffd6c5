//! QA tests for turn-based combat: rewards, companion turns, the boss
//! fight and defeat.
//!
//! Run with: cargo test -p glitch-core --test qa_combat

use glitch_core::audio::{AudioCue, AudioSink, MusicTrack};
use glitch_core::catalog;
use glitch_core::combat::{CombatEvent, CombatPhase};
use glitch_core::testing::*;
use glitch_core::world::Screen;

fn cyber_city(seed: u64) -> TestHarness {
    TestHarness::in_level(seed, "cyber_city")
}

/// Give the player the ultimate and enough attack to one-shot the boss.
fn arm_for_boss(h: &mut TestHarness) {
    let ultimate = catalog::find_skill("content_validation")
        .expect("ultimate exists")
        .clone()
        .unlocked();
    let player = h.world_mut().player_mut();
    player.skills.push(ultimate);
    player.attack = 1500;
}

// ============================================================================
// Regular fights
// ============================================================================

#[test]
fn test_victory_rewards() {
    let mut h = cyber_city(21);
    h.session.engage("glitch_1");
    assert_in_combat(&h);
    assert_eq!(h.session.combat().unwrap().enemy.hit_points.maximum, 60);

    h.fight(50);

    assert_not_in_combat(&h);
    assert_screen(&h, Screen::Exploration);
    assert_hp_in_bounds(&h);

    let player = h.world().player();
    assert_eq!(player.xp, 20);
    assert_eq!(player.level, 1);
    assert!((10..60).contains(&h.world().subscribers));
    assert_log_contains(&h, "Victory! Gained 20 XP");

    // One removed, one respawned
    assert_eq!(h.world().roaming_enemies.len(), 5);
    assert!(h.world().roaming_enemies.iter().all(|e| e.id != "glitch_1"));

    assert!(h.world().achievement("first_victory").unwrap().unlocked);
    let level = h.world().current_level().unwrap();
    let defeat = level.objectives.iter().find(|o| o.id == "cc_defeat").unwrap();
    assert_eq!(defeat.progress, 1);
}

#[test]
fn test_hp_persists_after_fight() {
    let mut h = cyber_city(22);
    h.session.engage("glitch_1");
    h.fight(50);

    // 18 damage per hit against 60 HP gives the mite three swings of 8
    assert_hp(&h, 76, 100);
    assert_eq!(h.session.movement_mode(), glitch_core::MovementMode::Active);
}

#[test]
fn test_action_ignored_outside_player_turn() {
    let mut h = cyber_city(23);
    h.session.engage("glitch_1");

    let first = h.session.combat_action(0, "basic_glitch");
    assert!(!first.is_empty());
    assert_eq!(h.session.combat().unwrap().phase, CombatPhase::EnemyTurn);

    let second = h.session.combat_action(0, "basic_glitch");
    assert!(second.is_empty());
    assert_eq!(h.session.combat().unwrap().enemy.hit_points.current, 42);
}

#[test]
fn test_locked_skill_rejected() {
    let mut h = cyber_city(24);
    h.session.engage("glitch_1");

    let response = h.session.combat_action(0, "hotfix");
    assert!(response.is_empty());
    assert_eq!(h.session.combat().unwrap().phase, CombatPhase::PlayerTurn);
}

#[test]
fn test_menus_blocked_during_combat() {
    let mut h = cyber_city(25);
    h.world_mut().subscribers = 500;
    h.session.engage("glitch_1");

    assert!(h.session.buy_item("ram_stick").is_empty());
    assert!(h.session.rest().is_empty());
    assert!(h.session.open_skill_tree().is_empty());
    assert_eq!(h.world().subscribers, 500);
    assert_screen(&h, Screen::Combat);
}

#[test]
fn test_companion_fights_and_bonds() {
    let mut h = cyber_city(26);
    h.recruit_companion();
    h.world_mut().roaming_enemies = catalog::initial_roaming_enemies();

    h.session.engage("glitch_1");
    let responses = h.fight(50);
    assert_screen(&h, Screen::Exploration);
    assert_hp_in_bounds(&h);

    let cat_acted = responses.iter().flat_map(|r| &r.combat_events).any(|e| {
        matches!(e, CombatEvent::SkillUsed { actor, .. } if actor == "Black Cat")
    });
    assert!(cat_acted, "expected the cat to take a turn");

    // Victory adds 25 bond XP on top of the recruit reward
    assert_bond(&h, 145, 2);
    assert_eq!(h.world().companion().unwrap().xp, 20);
}

// ============================================================================
// Boss and defeat
// ============================================================================

#[test]
fn test_boss_defeat_ends_run() {
    let mut h = cyber_city(31);
    h.session.challenge_boss();
    assert!(h.session.combat().unwrap().is_boss());
    assert!(h.audio.played(AudioCue::Music(MusicTrack::BossBattle)));

    h.fight(20);

    assert_screen(&h, Screen::GameOver);
    assert_not_in_combat(&h);
    assert_hp(&h, 0, 100);
    assert_log_contains(&h, "SYSTEM FAILURE");
    assert_eq!(h.audio.current_music(), None);

    h.session.back_to_intro();
    assert_screen(&h, Screen::Intro);
    assert_hp(&h, 100, 100);
    assert_eq!(h.world().roaming_enemies.len(), 5);
    assert_eq!(h.world().current_level, None);
}

#[test]
fn test_boss_victory() {
    let mut h = cyber_city(32);
    arm_for_boss(&mut h);
    h.session.challenge_boss();

    let response = h.session.combat_action(0, "content_validation");
    assert!(response.narrative.contains("Algorithm King"));

    assert_screen(&h, Screen::Victory);
    assert_not_in_combat(&h);
    assert_eq!(h.audio.current_music(), Some(MusicTrack::Victory));
    assert_log_contains(&h, "The feed is free");

    // No XP, currency or respawn for the boss
    assert_eq!(h.world().player().xp, 0);
    assert_eq!(h.world().subscribers, 0);
    assert_eq!(h.world().roaming_enemies.len(), 5);
}

#[test]
fn test_boss_victory_completes_final_level() {
    let mut h = TestHarness::new(33);
    for level in &mut h.world_mut().levels {
        level.unlocked = true;
    }
    h.session.start();
    h.session.select_level("space");
    h.place_player(glitch_core::world::Position::new(2000.0, 800.0));
    assert_eq!(
        h.session.nearby().unwrap().label,
        "PRESS [SPACE] TO CHALLENGE BOSS"
    );

    arm_for_boss(&mut h);
    h.session.interact();
    assert!(h.session.combat().unwrap().is_boss());
    h.session.combat_action(0, "content_validation");

    assert_screen(&h, Screen::Victory);
    let space = h.world().level("space").unwrap();
    assert!(space.completed);
    assert!(h.world().achievement("first_level").unwrap().unlocked);
    // The boss pays nothing, even when its fall completes the level
    assert_eq!(h.world().subscribers, 0);
    assert_log_contains(&h, "Cloud Orbit complete!");
}
