//! Testing utilities for Glitch Protocol.
//!
//! This module provides tools for integration testing:
//! - `MockDialogue` for scripted NPC replies without API calls
//! - `RecordingAudio` to inspect the cues a session emitted
//! - `TestHarness` for seeded, reproducible game scenarios
//! - Assertion helpers for verifying game state

use crate::audio::{AudioCue, AudioSink, MusicTrack};
use crate::combat::CombatPhase;
use crate::dialogue::{DialogueContext, DialogueGenerator};
use crate::session::{GameSession, Response, SessionConfig, SessionError};
use crate::world::{GameWorld, Position, Screen};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Frame length used by the harness clock.
pub const FRAME: Duration = Duration::from_millis(16);

/// Dialogue backend that returns scripted replies in order.
#[derive(Debug, Clone, Default)]
pub struct MockDialogue {
    replies: Arc<Mutex<VecDeque<String>>>,
    seen: Arc<Mutex<Vec<DialogueContext>>>,
}

impl MockDialogue {
    pub fn new(replies: Vec<&str>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into_iter().map(String::from).collect())),
            seen: Arc::default(),
        }
    }

    /// Add a reply to the end of the script.
    pub fn queue_reply(&self, reply: impl Into<String>) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(reply.into());
        }
    }

    /// Every context the session asked about, oldest first.
    pub fn contexts(&self) -> Vec<DialogueContext> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl DialogueGenerator for MockDialogue {
    async fn generate(&self, context: &DialogueContext) -> String {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(context.clone());
        }
        self.replies
            .lock()
            .ok()
            .and_then(|mut r| r.pop_front())
            .unwrap_or_else(|| format!("{} has nothing more to say.", context.npc_name))
    }
}

/// Audio sink that records every cue. Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct RecordingAudio {
    cues: Arc<Mutex<Vec<AudioCue>>>,
}

impl RecordingAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cues(&self) -> Vec<AudioCue> {
        self.cues.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn played(&self, cue: AudioCue) -> bool {
        self.cues().contains(&cue)
    }
}

impl AudioSink for RecordingAudio {
    fn play(&mut self, cue: AudioCue) {
        if let Ok(mut cues) = self.cues.lock() {
            cues.push(cue);
        }
    }

    fn current_music(&self) -> Option<MusicTrack> {
        self.cues().iter().rev().find_map(|cue| match cue {
            AudioCue::Music(track) => Some(Some(*track)),
            AudioCue::StopMusic => Some(None),
            AudioCue::Sfx(_) => None,
        })?
    }
}

/// Test harness for running game scenarios.
pub struct TestHarness {
    pub session: GameSession,
    pub dialogue: MockDialogue,
    pub audio: RecordingAudio,
    now: Duration,
}

impl TestHarness {
    /// Seeded session with mock backends, sitting on the intro screen.
    pub fn new(seed: u64) -> Self {
        let dialogue = MockDialogue::default();
        let audio = RecordingAudio::new();
        let session = GameSession::build(
            SessionConfig::new("Test Bot").with_seed(seed),
            Box::new(dialogue.clone()),
            Box::new(audio.clone()),
        );
        Self::from_parts(session, dialogue, audio)
    }

    pub fn with_config(config: SessionConfig) -> Result<Self, SessionError> {
        let dialogue = MockDialogue::default();
        let audio = RecordingAudio::new();
        let session = GameSession::with_backends(
            config,
            Box::new(dialogue.clone()),
            Box::new(audio.clone()),
        )?;
        Ok(Self::from_parts(session, dialogue, audio))
    }

    fn from_parts(session: GameSession, dialogue: MockDialogue, audio: RecordingAudio) -> Self {
        Self {
            session,
            dialogue,
            audio,
            now: Duration::ZERO,
        }
    }

    /// Harness already exploring `level_id`.
    pub fn in_level(seed: u64, level_id: &str) -> Self {
        let mut harness = Self::new(seed);
        harness.session.start();
        harness.session.select_level(level_id);
        harness
    }

    pub fn world(&self) -> &GameWorld {
        self.session.world()
    }

    pub fn world_mut(&mut self) -> &mut GameWorld {
        self.session.world_mut()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /// Advance the harness clock by one frame and tick.
    pub fn tick(&mut self) -> Response {
        self.now += FRAME;
        self.session.tick(self.now)
    }

    /// Advance the clock by `elapsed` without running frames.
    pub fn wait(&mut self, elapsed: Duration) {
        self.now += elapsed;
    }

    /// Tick `frames` times, collecting every response.
    pub fn run_frames(&mut self, frames: usize) -> Vec<Response> {
        (0..frames).map(|_| self.tick()).collect()
    }

    /// Put the player at `pos` and run one frame there.
    pub fn place_player(&mut self, pos: Position) -> Response {
        self.session.world_mut().player_position = pos;
        self.tick()
    }

    /// Walk to the companion's spot and recruit it.
    pub fn recruit_companion(&mut self) -> Response {
        self.session.world_mut().roaming_enemies.clear();
        let response = self.session.interact_npc(crate::catalog::COMPANION_NPC);
        self.session.close_dialogue();
        response
    }

    /// Alternate player actions and automated phases until the fight ends
    /// or `max_rounds` player turns pass. Uses the first unlocked skill.
    pub fn fight(&mut self, max_rounds: usize) -> Vec<Response> {
        let mut responses = Vec::new();
        for _ in 0..max_rounds {
            let Some(encounter) = self.session.combat() else {
                break;
            };
            if encounter.phase == CombatPhase::PlayerTurn {
                let skill = self
                    .world()
                    .player()
                    .unlocked_skills()
                    .next()
                    .map(|s| s.id.clone())
                    .unwrap_or_default();
                responses.push(self.session.combat_action(0, &skill));
            }
            while self
                .session
                .combat()
                .is_some_and(|c| matches!(c.phase, CombatPhase::CompanionTurn | CombatPhase::EnemyTurn))
            {
                responses.push(self.session.advance_combat());
            }
        }
        responses
    }

    pub fn player_hp(&self) -> (u32, u32) {
        let hp = &self.world().player().hit_points;
        (hp.current, hp.maximum)
    }

    pub fn log_contains(&self, text: &str) -> bool {
        self.world().log.iter().any(|l| l.contains(text))
    }
}

// ============================================================================
// Assertion helpers
// ============================================================================

#[track_caller]
pub fn assert_screen(harness: &TestHarness, screen: Screen) {
    let actual = harness.session.screen();
    assert_eq!(actual, screen, "Expected screen {screen:?}, got {actual:?}");
}

/// Assert every party member satisfies `0 <= current <= maximum`.
#[track_caller]
pub fn assert_hp_in_bounds(harness: &TestHarness) {
    for member in &harness.world().party {
        assert!(
            member.hit_points.current <= member.hit_points.maximum,
            "{} has {}/{} HP",
            member.name,
            member.hit_points.current,
            member.hit_points.maximum
        );
    }
}

#[track_caller]
pub fn assert_hp(harness: &TestHarness, current: u32, max: u32) {
    let (actual_current, actual_max) = harness.player_hp();
    assert_eq!(
        (actual_current, actual_max),
        (current, max),
        "Expected HP {current}/{max}, got {actual_current}/{actual_max}"
    );
}

#[track_caller]
pub fn assert_in_combat(harness: &TestHarness) {
    assert!(harness.world().in_combat(), "Expected to be in combat");
}

#[track_caller]
pub fn assert_not_in_combat(harness: &TestHarness) {
    assert!(!harness.world().in_combat(), "Expected to NOT be in combat");
}

#[track_caller]
pub fn assert_log_contains(harness: &TestHarness, text: &str) {
    assert!(
        harness.log_contains(text),
        "Expected log to contain '{text}', got {:?}",
        harness.world().recent_log(10)
    );
}

#[track_caller]
pub fn assert_bond(harness: &TestHarness, xp: u32, level: u32) {
    let Some(bond) = harness.world().companion().and_then(|c| c.bond) else {
        panic!("Expected a companion with a bond");
    };
    assert_eq!((bond.xp, bond.level), (xp, level), "Unexpected bond {bond:?}");
}
