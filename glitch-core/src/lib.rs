//! Glitch Protocol game engine.
//!
//! This crate provides:
//! - A real-time exploration loop with camera framing and proximity checks
//! - Turn-based combat with a companion AI and bond-based synergy
//! - Intent/Effect rules for rewards, skills, items, levels and achievements
//! - NPC dialogue through Claude, with offline fallbacks
//!
//! # Quick Start
//!
//! ```ignore
//! use glitch_core::{GameSession, Key, SessionConfig};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut session = GameSession::new(SessionConfig::new("Glitched Bot"))?;
//!     session.start();
//!     session.select_level("cyber_city");
//!
//!     session.key_down(Key::D);
//!     for frame in 1..=60u64 {
//!         session.tick(Duration::from_millis(frame * 16));
//!     }
//!     session.key_up(Key::D);
//!
//!     session.interact_npc("black_cat_npc");
//!     let reply = session.send_chat("Who are you?").await;
//!     println!("{}", reply.narrative);
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod banter;
pub mod bond;
pub mod catalog;
pub mod combat;
pub mod dialogue;
pub mod levels;
pub mod movement;
pub mod progression;
pub mod rules;
pub mod session;
pub mod testing;
pub mod world;

// Primary public API
pub use audio::{AudioConfig, AudioCue, AudioSink, MusicTrack, SoundEffect, TracingAudio};
pub use combat::{CombatEncounter, CombatEvent, CombatPhase};
pub use dialogue::{
    ClaudeDialogue, DialogueConfig, DialogueContext, DialogueError, DialogueGenerator,
    OfflineDialogue,
};
pub use movement::{Key, MovementConfig, MovementMode};
pub use rules::{Effect, Intent, RulesEngine};
pub use session::{GameSession, Response, SessionConfig, SessionError};
pub use testing::{MockDialogue, RecordingAudio, TestHarness};
pub use world::{Entity, EntityId, EntityKind, GameWorld, Screen};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_snapshot_roundtrip() {
        let mut harness = TestHarness::in_level(3, "cyber_city");
        harness.recruit_companion();

        let json = serde_json::to_string(harness.world()).unwrap();
        let restored: GameWorld = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.party.len(), 2);
        assert_eq!(restored.current_level.as_deref(), Some("cyber_city"));
        assert_eq!(restored.screen, Screen::Exploration);
    }
}
