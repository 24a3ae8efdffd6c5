//! GameSession - the primary public API for playing Glitch Protocol.
//!
//! The session owns the [`GameWorld`] and wires the engines together:
//! movement drives exploration, the combat encounter runs fights, the
//! rules engine applies every discrete change, and the dialogue and audio
//! backends are injected so nothing here is process-global.
//!
//! The caller drives time. `tick(now)` runs one exploration frame,
//! `advance_combat()` steps the automated combat phases and
//! `sweep_effects(now)` expires power-ups (about once a second).

use crate::audio::{AudioCue, AudioConfig, AudioSink, MusicTrack, SoundEffect, TracingAudio};
use crate::banter::{self, ExplorationBanter, VisibleBanter};
use crate::bond;
use crate::catalog;
use crate::combat::{CombatEncounter, CombatEvent, CombatPhase, Submission};
use crate::dialogue::{self, DialogueConfig, DialogueContext, DialogueError, DialogueGenerator};
use crate::levels::{self, ObjectiveEvent};
use crate::movement::{InputCommand, Interaction, Key, MovementConfig, MovementEngine, MovementMode, Nearby};
use crate::rules::{apply_effects, Effect, Intent, Resolution, RulesEngine};
use crate::world::{Customization, Entity, EntityId, GameWorld, Position, Screen};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;
use thiserror::Error;

const BOSS_GREETING: &str =
    "Algorithm King: 'YOUR METRICS ARE INSUFFICIENT. PREPARE FOR DELETION.'";
const PET_REPLY: &str = "*Purrrr...* The Black Cat nudges your hand. 'Not bad, for a bot.'";

/// Errors from GameSession construction.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Dialogue error: {0}")]
    Dialogue(#[from] DialogueError),

    #[error("Unknown level: {0}")]
    UnknownLevel(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Configuration for creating a new game session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Player character name.
    pub player_name: String,

    /// Seed for every random roll in the session. Entropy when unset.
    pub seed: Option<u64>,

    /// Level entered directly by `start`, skipping level select.
    pub start_level: Option<String>,

    pub movement: MovementConfig,
    pub dialogue: DialogueConfig,
    pub audio: AudioConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new("Glitched Bot")
    }
}

impl SessionConfig {
    pub fn new(player_name: impl Into<String>) -> Self {
        Self {
            player_name: player_name.into(),
            seed: None,
            start_level: None,
            movement: MovementConfig::default(),
            dialogue: DialogueConfig::default(),
            audio: AudioConfig::default(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_start_level(mut self, level_id: impl Into<String>) -> Self {
        self.start_level = Some(level_id.into());
        self
    }

    /// Set the visible area used for camera framing.
    pub fn with_viewport(mut self, width: f32, height: f32) -> Self {
        self.movement = self.movement.with_viewport(width, height);
        self
    }

    pub fn with_movement(mut self, movement: MovementConfig) -> Self {
        self.movement = movement;
        self
    }

    pub fn with_dialogue(mut self, dialogue: DialogueConfig) -> Self {
        self.dialogue = dialogue;
        self
    }

    pub fn with_audio(mut self, audio: AudioConfig) -> Self {
        self.audio = audio;
        self
    }

    fn validate(&self) -> Result<(), SessionError> {
        if self.player_name.trim().is_empty() {
            return Err(SessionError::InvalidConfig("player name is empty".into()));
        }
        let m = &self.movement;
        if m.viewport_width <= 0.0 || m.viewport_height <= 0.0 {
            return Err(SessionError::InvalidConfig("viewport must be positive".into()));
        }
        if m.speed <= 0.0 {
            return Err(SessionError::InvalidConfig("speed must be positive".into()));
        }
        if m.map_width <= 2.0 * m.margin || m.map_height <= 2.0 * m.margin {
            return Err(SessionError::InvalidConfig("map smaller than its margins".into()));
        }
        if let Some(level_id) = &self.start_level {
            if !catalog::LEVELS.iter().any(|l| &l.id == level_id) {
                return Err(SessionError::UnknownLevel(level_id.clone()));
            }
        }
        Ok(())
    }
}

/// What a session call did.
#[derive(Debug, Clone, Default)]
pub struct Response {
    /// Text for the player.
    pub narrative: String,

    /// Effects that were applied to the game world.
    pub effects: Vec<Effect>,

    /// Combat steps resolved by this call.
    pub combat_events: Vec<CombatEvent>,
}

impl Response {
    fn ignored(reason: impl Into<String>) -> Self {
        let narrative = reason.into();
        tracing::debug!(reason = %narrative, "request ignored");
        Self {
            narrative,
            ..Default::default()
        }
    }

    /// True when nothing changed.
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty() && self.combat_events.is_empty()
    }

    fn absorb(&mut self, other: Response) {
        if other.is_empty() {
            return;
        }
        if !other.narrative.is_empty() {
            if !self.narrative.is_empty() {
                self.narrative.push('\n');
            }
            self.narrative.push_str(&other.narrative);
        }
        self.effects.extend(other.effects);
        self.combat_events.extend(other.combat_events);
    }
}

impl From<Resolution> for Response {
    fn from(resolution: Resolution) -> Self {
        Self {
            narrative: resolution.narrative,
            effects: resolution.effects,
            combat_events: Vec::new(),
        }
    }
}

/// A Glitch Protocol game session.
pub struct GameSession {
    config: SessionConfig,
    world: GameWorld,
    movement: MovementEngine,
    rules: RulesEngine,
    /// Combat and banter rolls.
    rng: StdRng,
    dialogue: Box<dyn DialogueGenerator>,
    audio: Box<dyn AudioSink>,
    exploration_banter: ExplorationBanter,
    banter: Option<VisibleBanter>,
    dialogue_text: Option<String>,
    chat_history: Vec<String>,
    chat_pending: bool,
    camera: Position,
    clock: Duration,
}

impl GameSession {
    /// Create a session with Claude dialogue when `ANTHROPIC_API_KEY` is set
    /// (offline replies otherwise) and tracing-backed audio.
    pub fn new(config: SessionConfig) -> Result<Self, SessionError> {
        let dialogue = dialogue::generator_from_env(config.dialogue.clone());
        let audio = Box::new(TracingAudio::new(config.audio));
        Self::with_backends(config, dialogue, audio)
    }

    /// Create a session with explicit dialogue and audio backends.
    pub fn with_backends(
        config: SessionConfig,
        dialogue: Box<dyn DialogueGenerator>,
        audio: Box<dyn AudioSink>,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        Ok(Self::build(config, dialogue, audio))
    }

    /// Assemble without validating the config.
    pub(crate) fn build(
        config: SessionConfig,
        dialogue: Box<dyn DialogueGenerator>,
        audio: Box<dyn AudioSink>,
    ) -> Self {
        let (rules, rng) = match config.seed {
            Some(seed) => (
                RulesEngine::with_seed(seed),
                StdRng::seed_from_u64(seed.wrapping_add(1)),
            ),
            None => (RulesEngine::new(), StdRng::from_entropy()),
        };
        let world = catalog::starting_world(&config.player_name);
        let movement = MovementEngine::new(config.movement);
        let camera = movement.config().camera_for(world.player_position);

        tracing::info!(session = %world.session_id, player = %config.player_name, "session created");
        Self {
            config,
            world,
            movement,
            rules,
            rng,
            dialogue,
            audio,
            exploration_banter: ExplorationBanter::new(),
            banter: None,
            dialogue_text: None,
            chat_history: Vec::new(),
            chat_pending: false,
            camera,
            clock: Duration::ZERO,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn world(&self) -> &GameWorld {
        &self.world
    }

    /// Direct modifications bypass the rules engine.
    pub fn world_mut(&mut self) -> &mut GameWorld {
        &mut self.world
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn screen(&self) -> Screen {
        self.world.screen
    }

    /// Time of the latest `tick` or `sweep_effects`.
    pub fn clock(&self) -> Duration {
        self.clock
    }

    pub fn camera(&self) -> Position {
        self.camera
    }

    pub fn movement_mode(&self) -> MovementMode {
        self.movement.mode()
    }

    /// The location in interaction range, with its HUD label.
    pub fn nearby(&self) -> Option<&Nearby> {
        self.movement.nearby()
    }

    pub fn combat(&self) -> Option<&CombatEncounter> {
        self.world.combat.as_ref()
    }

    pub fn dialogue_text(&self) -> Option<&str> {
        self.dialogue_text.as_deref()
    }

    pub fn chat_pending(&self) -> bool {
        self.chat_pending
    }

    /// Banter line on screen right now.
    pub fn banter(&self) -> Option<&str> {
        self.banter
            .as_ref()
            .filter(|b| b.is_visible(self.clock))
            .map(|b| b.text.as_str())
    }

    pub fn audio(&self) -> &dyn AudioSink {
        self.audio.as_ref()
    }

    // ========================================================================
    // Plumbing
    // ========================================================================

    fn apply(&mut self, resolution: Resolution) -> Response {
        for cue in resolution.audio() {
            self.audio.play(cue);
        }
        apply_effects(&mut self.world, &resolution.effects);
        self.sync_movement_mode();
        resolution.into()
    }

    fn resolve(&mut self, intent: Intent) -> Response {
        let resolution = self.rules.resolve(&self.world, intent);
        self.apply(resolution)
    }

    /// Movement runs only on the exploration screen with no NPC open.
    fn sync_movement_mode(&mut self) {
        let mode = if self.world.screen == Screen::Exploration && self.world.active_npc.is_none() {
            MovementMode::Active
        } else {
            MovementMode::Paused
        };
        if self.movement.mode() != mode {
            self.movement.set_mode(mode);
        }
    }

    fn screen_effects(&self, screen: Screen) -> Vec<Effect> {
        let music = match screen {
            Screen::Intro | Screen::LevelSelect | Screen::Achievements => {
                Some(AudioCue::Music(MusicTrack::MainMenu))
            }
            Screen::Exploration => self
                .world
                .current_level()
                .map(|l| AudioCue::Music(l.theme.music())),
            Screen::Combat => self
                .world
                .combat
                .as_ref()
                .filter(|c| c.is_boss())
                .map(|_| AudioCue::Music(MusicTrack::BossBattle)),
            Screen::Victory => Some(AudioCue::Music(MusicTrack::Victory)),
            Screen::GameOver => Some(AudioCue::StopMusic),
            Screen::SkillTree | Screen::Shop | Screen::Customization => None,
        };
        let mut effects = vec![Effect::ScreenChanged(screen)];
        effects.extend(music.map(Effect::Audio));
        effects
    }

    fn change_screen(&mut self, screen: Screen) -> Response {
        let effects = self.screen_effects(screen);
        self.apply(Resolution::new("").with_effects(effects))
    }

    fn in_menu(&self) -> bool {
        matches!(
            self.world.screen,
            Screen::Intro | Screen::LevelSelect | Screen::Achievements | Screen::Customization
        )
    }

    /// Exploration screen with a level running and no fight.
    fn exploring(&self) -> bool {
        self.world.screen == Screen::Exploration && !self.world.in_combat()
    }

    // ========================================================================
    // Menus
    // ========================================================================

    /// Leave the intro. Goes to level select, or straight into the
    /// configured start level.
    pub fn start(&mut self) -> Response {
        if !self.in_menu() {
            return Response::ignored("Already playing.");
        }
        let mut response =
            self.apply(Resolution::new("").with_effect(Effect::Audio(AudioCue::Sfx(SoundEffect::ButtonClick))));
        match self.config.start_level.clone() {
            Some(level_id) => response.absorb(self.select_level(&level_id)),
            None => response.absorb(self.change_screen(Screen::LevelSelect)),
        }
        response
    }

    pub fn select_level(&mut self, level_id: &str) -> Response {
        if !self.in_menu() {
            return Response::ignored("Levels can only be picked from the menu.");
        }
        let response = self.resolve(Intent::SelectLevel {
            level_id: level_id.to_string(),
            now: self.clock,
        });
        if !response.is_empty() {
            self.movement.reset();
            self.exploration_banter.reset(self.clock);
            self.banter = None;
            self.close_dialogue_state();
            self.camera = self.movement.config().camera_for(self.world.player_position);
        }
        response
    }

    pub fn open_achievements(&mut self) -> Response {
        if !self.in_menu() {
            return Response::ignored("Achievements open from the menu.");
        }
        self.change_screen(Screen::Achievements)
    }

    pub fn open_customization(&mut self) -> Response {
        if !(self.in_menu() || self.exploring()) {
            return Response::ignored("Cannot customize right now.");
        }
        self.change_screen(Screen::Customization)
    }

    pub fn save_customization(&mut self, customizations: Vec<Customization>) -> Response {
        if self.world.screen != Screen::Customization {
            return Response::ignored("Customization is not open.");
        }
        self.apply(
            Resolution::new("Look saved.")
                .with_effect(Effect::Audio(AudioCue::Sfx(SoundEffect::ButtonClick)))
                .with_effect(Effect::CustomizationsSaved(customizations)),
        )
    }

    /// Back to the title screen. From the end screens this reboots the
    /// world for a new run.
    pub fn back_to_intro(&mut self) -> Response {
        match self.world.screen {
            Screen::GameOver | Screen::Victory => {
                self.world = catalog::starting_world(&self.config.player_name);
                self.movement.reset();
                self.banter = None;
                self.close_dialogue_state();
                tracing::info!(session = %self.world.session_id, "world rebooted");
                self.change_screen(Screen::Intro)
            }
            Screen::LevelSelect | Screen::Achievements | Screen::Customization => {
                self.change_screen(Screen::Intro)
            }
            _ => Response::ignored("Finish what you are doing first."),
        }
    }

    /// Close the skill tree, shop, customization or achievements view.
    pub fn close_overlay(&mut self) -> Response {
        let back = match self.world.screen {
            Screen::SkillTree | Screen::Shop => Screen::Exploration,
            Screen::Customization if self.world.current_level.is_some() => Screen::Exploration,
            Screen::Customization | Screen::Achievements => Screen::Intro,
            _ => return Response::ignored("Nothing to close."),
        };
        self.change_screen(back)
    }

    // ========================================================================
    // Exploration
    // ========================================================================

    pub fn key_down(&mut self, key: Key) {
        self.movement.key_down(key);
    }

    pub fn key_up(&mut self, key: Key) -> Response {
        match self.movement.key_up(key) {
            Some(InputCommand::Interact) => self.interact(),
            Some(InputCommand::OpenSkillTree) => self.open_skill_tree(),
            None => Response::default(),
        }
    }

    /// Run one exploration frame at time `now`.
    pub fn tick(&mut self, now: Duration) -> Response {
        self.clock = self.clock.max(now);
        if self.banter.as_ref().is_some_and(|b| !b.is_visible(self.clock)) {
            self.banter = None;
        }
        if !self.exploring() {
            return Response::default();
        }

        let eligible = self.world.companion().is_some()
            && self.world.active_npc.is_none()
            && self.banter.is_none();
        let bond_level = self.world.bond_level();
        if let Some(line) = self
            .exploration_banter
            .poll(self.clock, eligible, bond_level, &mut self.rng)
        {
            self.banter = Some(line);
        }

        let previous = self.movement.nearby().map(|n| n.location_id.clone());
        let Some(outcome) = self.movement.tick(&self.world) else {
            return Response::default();
        };
        self.world.player_position = outcome.position;
        self.camera = outcome.camera;

        if let Some(enemy_id) = outcome.encounter {
            return self.engage(&enemy_id);
        }

        let mut response = Response::default();
        if let Some(nearby) = outcome.nearby.filter(|n| previous.as_ref() != Some(&n.location_id)) {
            self.world.current_location = nearby.location_id.clone();
            response.absorb(self.resolve(Intent::RecordObjective {
                event: ObjectiveEvent::LocationVisited(nearby.location_id),
                now: self.clock,
            }));
        }
        for damage in outcome.obstacle_hits {
            response.absorb(self.resolve(Intent::ObstacleHit { damage }));
        }
        for power_up_id in outcome.power_ups {
            response.absorb(self.collect_power_up(&power_up_id));
        }
        response
    }

    /// Act on the location in range: the same choice the HUD label shows.
    pub fn interact(&mut self) -> Response {
        if !self.exploring() {
            return Response::ignored("Nothing to interact with.");
        }
        match self.movement.interact(&self.world) {
            Some(Interaction::ChallengeBoss) => self.challenge_boss(),
            Some(Interaction::OpenShop) => self.open_shop(),
            Some(Interaction::Rest) => self.rest(),
            Some(Interaction::Talk { npc_id }) => self.interact_npc(&npc_id),
            None => Response::ignored("Nothing to interact with."),
        }
    }

    pub fn collect_power_up(&mut self, power_up_id: &str) -> Response {
        if !self.exploring() {
            return Response::ignored("Not exploring.");
        }
        self.resolve(Intent::CollectPowerUp {
            power_up_id: power_up_id.to_string(),
            now: self.clock,
        })
    }

    /// Drop expired power-up effects. Meant to run about once a second.
    pub fn sweep_effects(&mut self, now: Duration) -> usize {
        self.clock = self.clock.max(now);
        let removed = levels::sweep_expired(&mut self.world.active_effects, self.clock);
        if removed > 0 {
            tracing::debug!(removed, "power-up effects expired");
        }
        removed
    }

    pub fn complete_level(&mut self, level_id: &str) -> Response {
        if self.world.in_combat() {
            return Response::ignored("Finish the fight first.");
        }
        self.resolve(Intent::CompleteLevel {
            level_id: level_id.to_string(),
            now: self.clock,
        })
    }

    // ========================================================================
    // NPCs and dialogue
    // ========================================================================

    pub fn interact_npc(&mut self, npc_id: &str) -> Response {
        if !self.exploring() {
            return Response::ignored("No one to talk to.");
        }
        self.chat_history.clear();
        self.chat_pending = false;

        if npc_id == catalog::COMPANION_NPC && self.world.companion().is_none() {
            let response = self.resolve(Intent::RecruitCompanion);
            self.dialogue_text = Some(response.narrative.clone());
            return response;
        }

        self.dialogue_text = (npc_id == catalog::BOSS_NPC).then(|| BOSS_GREETING.to_string());
        self.apply(
            Resolution::new(format!("Talking to {}.", catalog::npc_name(npc_id)))
                .with_effect(Effect::ActiveNpcSet(Some(npc_id.to_string()))),
        )
    }

    /// Start a chat turn. Returns the context to hand to the generator, or
    /// `None` when there is no NPC, no text, or a reply is still pending.
    pub fn begin_chat(&mut self, input: &str) -> Option<DialogueContext> {
        let input = input.trim();
        let npc_id = self.world.active_npc.as_deref()?;
        if input.is_empty() || self.chat_pending {
            tracing::debug!(pending = self.chat_pending, "chat submission rejected");
            return None;
        }
        let context = DialogueContext::new(catalog::npc_name(npc_id), input)
            .with_history(self.chat_history.clone());
        self.chat_history.push(format!("Player: {input}"));
        self.chat_pending = true;
        Some(context)
    }

    /// Deliver a generated reply. Talking to the cat strengthens the bond.
    pub fn finish_chat(&mut self, reply: String) -> Response {
        if !self.chat_pending {
            return Response::ignored("No chat pending.");
        }
        self.chat_pending = false;
        let Some(npc_id) = self.world.active_npc.clone() else {
            return Response::ignored("Dialogue was closed.");
        };

        self.chat_history
            .push(format!("{}: {}", catalog::npc_name(&npc_id), reply));
        self.dialogue_text = Some(reply.clone());

        let mut response = Response {
            narrative: reply,
            ..Default::default()
        };
        if npc_id == catalog::COMPANION_NPC {
            response.absorb(self.resolve(Intent::IncreaseFriendship {
                amount: bond::TALK_BOND_XP,
            }));
        }
        response
    }

    /// Send a line to the active NPC and wait for the reply.
    pub async fn send_chat(&mut self, input: &str) -> Response {
        let Some(context) = self.begin_chat(input) else {
            return Response::ignored("Cannot send that right now.");
        };
        let reply = self.dialogue.generate(&context).await;
        self.finish_chat(reply)
    }

    pub fn pet_companion(&mut self) -> Response {
        let talking_to_cat = self.world.active_npc.as_deref() == Some(catalog::COMPANION_NPC);
        if !talking_to_cat || self.world.companion().is_none() {
            return Response::ignored("There is no cat to pet.");
        }
        self.dialogue_text = Some(PET_REPLY.to_string());
        let mut response = Response {
            narrative: PET_REPLY.to_string(),
            ..Default::default()
        };
        response.absorb(self.resolve(Intent::IncreaseFriendship {
            amount: bond::PET_BOND_XP,
        }));
        response
    }

    fn close_dialogue_state(&mut self) {
        self.dialogue_text = None;
        self.chat_history.clear();
        self.chat_pending = false;
    }

    /// Close the dialogue. A reply still in flight is dropped on arrival.
    pub fn close_dialogue(&mut self) -> Response {
        if self.world.active_npc.is_none() {
            return Response::ignored("No dialogue open.");
        }
        self.close_dialogue_state();
        self.apply(Resolution::new("").with_effect(Effect::ActiveNpcSet(None)))
    }

    // ========================================================================
    // Combat
    // ========================================================================

    fn start_combat(&mut self, enemy: Entity, roaming_id: Option<String>) -> Response {
        let name = enemy.name.clone();
        self.world.combat = Some(CombatEncounter::new(enemy));
        self.banter = None;
        self.close_dialogue_state();
        tracing::info!(enemy = %name, "combat started");

        let mut resolution = Resolution::new(format!("{name} appeared!"))
            .with_effect(Effect::ActiveNpcSet(None));
        if let Some(enemy_id) = roaming_id {
            resolution = resolution.with_effect(Effect::RoamingEnemyRemoved { enemy_id });
        }
        let screen = self.screen_effects(Screen::Combat);
        self.apply(
            resolution
                .with_effects(screen)
                .with_effect(Effect::Log(format!("Encountered {name}!"))),
        )
    }

    /// Fight the roaming enemy with this id.
    pub fn engage(&mut self, enemy_id: &str) -> Response {
        if !self.exploring() {
            return Response::ignored("Cannot fight right now.");
        }
        let Some(roaming) = self.world.roaming_enemies.iter().find(|e| e.id == enemy_id) else {
            return Response::ignored(format!("No enemy {enemy_id} on the map."));
        };
        let enemy = catalog::spawn_enemy(&roaming.enemy_type, self.world.player().level);
        let id = roaming.id.clone();
        self.start_combat(enemy, Some(id))
    }

    pub fn challenge_boss(&mut self) -> Response {
        if !self.exploring() {
            return Response::ignored("Cannot fight right now.");
        }
        self.start_combat(catalog::algorithm_king(), None)
    }

    /// Use a skill with party member `member` during the player turn.
    pub fn combat_action(&mut self, member: usize, skill_id: &str) -> Response {
        let GameWorld { combat, party, .. } = &mut self.world;
        let Some(encounter) = combat.as_mut() else {
            return Response::ignored("No fight in progress.");
        };
        match encounter.player_action(party, member, skill_id, &mut self.rng) {
            Submission::Accepted(events) => self.after_combat_step(events),
            Submission::Ignored(reason) => Response::ignored(format!("Action ignored: {reason:?}")),
        }
    }

    /// Run one automated combat phase (companion or enemy).
    pub fn advance_combat(&mut self) -> Response {
        let GameWorld { combat, party, .. } = &mut self.world;
        let Some(encounter) = combat.as_mut() else {
            return Response::ignored("No fight in progress.");
        };
        let events = encounter.advance(party, &mut self.rng);
        self.after_combat_step(events)
    }

    fn after_combat_step(&mut self, events: Vec<CombatEvent>) -> Response {
        for event in &events {
            if let CombatEvent::Banter(text) = event {
                self.banter = Some(VisibleBanter::new(
                    text.clone(),
                    self.clock,
                    banter::COMBAT_BANTER_DURATION,
                ));
            }
        }
        let narrative = self
            .world
            .combat
            .as_ref()
            .and_then(|c| c.log.front().cloned())
            .unwrap_or_default();
        let finished = self.world.combat.as_ref().is_some_and(|c| c.is_over());

        let mut response = Response {
            narrative,
            effects: Vec::new(),
            combat_events: events,
        };
        if finished {
            response.absorb(self.finish_combat());
        }
        response
    }

    fn finish_combat(&mut self) -> Response {
        let Some(encounter) = self.world.combat.take() else {
            return Response::default();
        };
        tracing::info!(enemy = %encounter.enemy.name, phase = ?encounter.phase, "combat finished");

        match encounter.phase {
            CombatPhase::Victory if encounter.is_boss() => {
                let line = format!("{} has been deleted! The feed is free.", encounter.enemy.name);
                let screen = self.screen_effects(Screen::Victory);
                let mut response = self.apply(
                    Resolution::new(line.clone())
                        .with_effect(Effect::Log(line))
                        .with_effects(screen),
                );
                response.absorb(self.resolve(Intent::RecordObjective {
                    event: ObjectiveEvent::BossDefeated,
                    now: self.clock,
                }));
                response
            }
            CombatPhase::Victory => {
                let mut response = self.resolve(Intent::VictoryReward {
                    enemy_xp: encounter.enemy.xp,
                });
                response.absorb(self.resolve(Intent::RecordObjective {
                    event: ObjectiveEvent::EnemyDefeated,
                    now: self.clock,
                }));
                response.absorb(self.change_screen(Screen::Exploration));
                response
            }
            CombatPhase::Defeat => {
                let line = "SYSTEM FAILURE. The bot has crashed.";
                let screen = self.screen_effects(Screen::GameOver);
                self.apply(
                    Resolution::new(line)
                        .with_effect(Effect::Log(line.to_string()))
                        .with_effects(screen),
                )
            }
            CombatPhase::PlayerTurn | CombatPhase::CompanionTurn | CombatPhase::EnemyTurn => {
                self.world.combat = Some(encounter);
                Response::default()
            }
        }
    }

    // ========================================================================
    // Skills, shop, inventory, inn
    // ========================================================================

    pub fn open_skill_tree(&mut self) -> Response {
        if !self.exploring() || self.world.active_npc.is_some() {
            return Response::ignored("Cannot open the skill tree right now.");
        }
        self.change_screen(Screen::SkillTree)
    }

    pub fn unlock_skill(&mut self, member: &EntityId, skill_id: &str) -> Response {
        if self.world.in_combat() {
            return Response::ignored("Finish the fight first.");
        }
        self.resolve(Intent::UnlockSkill {
            member: member.clone(),
            skill_id: skill_id.to_string(),
        })
    }

    pub fn open_shop(&mut self) -> Response {
        if !self.exploring() {
            return Response::ignored("No shop here.");
        }
        self.change_screen(Screen::Shop)
    }

    pub fn buy_item(&mut self, item_id: &str) -> Response {
        if self.world.in_combat() {
            return Response::ignored("Finish the fight first.");
        }
        self.resolve(Intent::BuyItem {
            item_id: item_id.to_string(),
        })
    }

    /// Use the inventory item at `index` on `target` (party leader when `None`).
    pub fn use_item(&mut self, index: usize, target: Option<EntityId>) -> Response {
        if self.world.in_combat() {
            return Response::ignored("Finish the fight first.");
        }
        self.resolve(Intent::UseItem { index, target })
    }

    pub fn rest(&mut self) -> Response {
        if self.world.in_combat() {
            return Response::ignored("Finish the fight first.");
        }
        self.resolve(Intent::Rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogue::OfflineDialogue;

    fn session(config: SessionConfig) -> GameSession {
        GameSession::with_backends(
            config,
            Box::new(OfflineDialogue),
            Box::new(TracingAudio::default()),
        )
        .unwrap()
    }

    #[test]
    fn test_session_config() {
        let config = SessionConfig::new("Test Bot")
            .with_seed(7)
            .with_start_level("forest")
            .with_viewport(800.0, 600.0)
            .with_audio(AudioConfig::new().with_enabled(false));

        assert_eq!(config.player_name, "Test Bot");
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.start_level.as_deref(), Some("forest"));
        assert_eq!(config.movement.viewport_width, 800.0);
        assert!(!config.audio.enabled);
    }

    #[test]
    fn test_config_validation() {
        let err = SessionConfig::new("Bot").with_start_level("moon").validate();
        assert!(matches!(err, Err(SessionError::UnknownLevel(id)) if id == "moon"));

        let err = SessionConfig::new("  ").validate();
        assert!(matches!(err, Err(SessionError::InvalidConfig(_))));

        let err = SessionConfig::new("Bot").with_viewport(0.0, 600.0).validate();
        assert!(matches!(err, Err(SessionError::InvalidConfig(_))));

        assert!(SessionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_start_goes_to_level_select() {
        let mut s = session(SessionConfig::default().with_seed(1));
        assert_eq!(s.screen(), Screen::Intro);
        s.start();
        assert_eq!(s.screen(), Screen::LevelSelect);
        assert_eq!(s.movement_mode(), MovementMode::Paused);
    }

    #[test]
    fn test_start_level_skips_select() {
        let mut s = session(SessionConfig::default().with_seed(1).with_start_level("cyber_city"));
        s.start();
        assert_eq!(s.screen(), Screen::Exploration);
        assert_eq!(s.world().current_level.as_deref(), Some("cyber_city"));
        assert_eq!(s.movement_mode(), MovementMode::Active);
    }

    #[test]
    fn test_locked_level_is_ignored() {
        let mut s = session(SessionConfig::default().with_seed(1));
        s.start();
        let response = s.select_level("space");
        assert!(response.is_empty());
        assert_eq!(s.screen(), Screen::LevelSelect);
    }

    #[test]
    fn test_combat_requires_fight() {
        let mut s = session(SessionConfig::default().with_seed(1));
        assert!(s.combat_action(0, "basic_glitch").is_empty());
        assert!(s.advance_combat().is_empty());
    }

    #[test]
    fn test_response_absorb_skips_empty() {
        let mut a = Response {
            narrative: "one".into(),
            ..Default::default()
        };
        a.absorb(Response::ignored("nothing"));
        assert_eq!(a.narrative, "one");

        a.absorb(Response {
            narrative: "two".into(),
            effects: vec![Effect::Log("x".into())],
            combat_events: Vec::new(),
        });
        assert_eq!(a.narrative, "one\ntwo");
        assert_eq!(a.effects.len(), 1);
    }
}
