//! Real-time exploration: movement, camera and proximity scans.
//!
//! The caller drives [`MovementEngine::tick`] at a fixed cadence (about
//! 60 Hz). Each tick reads the world, integrates held keys into a new
//! position and reports what the player is near. The engine never mutates
//! the world; the session applies the returned [`TickOutcome`].

use crate::catalog;
use crate::levels::{self, POWER_UP_RADIUS};
use crate::world::{GameWorld, Location, Position};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const MAP_WIDTH: f32 = 2400.0;
pub const MAP_HEIGHT: f32 = 1600.0;
pub const MAP_MARGIN: f32 = 50.0;
pub const PLAYER_SPEED: f32 = 5.0;
pub const INTERACTION_RADIUS: f32 = 80.0;
pub const COMBAT_RADIUS: f32 = 40.0;

/// Input keys the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    W,
    A,
    S,
    D,
    Space,
    K,
}

impl Key {
    /// Unit step on each axis for movement keys.
    fn direction(&self) -> (f32, f32) {
        match self {
            Key::ArrowUp | Key::W => (0.0, -1.0),
            Key::ArrowDown | Key::S => (0.0, 1.0),
            Key::ArrowLeft | Key::A => (-1.0, 0.0),
            Key::ArrowRight | Key::D => (1.0, 0.0),
            Key::Space | Key::K => (0.0, 0.0),
        }
    }
}

/// Something a key release asks the session to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputCommand {
    Interact,
    OpenSkillTree,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MovementMode {
    Active,
    #[default]
    Paused,
}

/// What interacting with a location does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interaction {
    ChallengeBoss,
    OpenShop,
    Rest,
    Talk { npc_id: String },
}

/// The location the player is close to, with its HUD label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nearby {
    pub location_id: String,
    pub label: String,
    pub interaction: Option<Interaction>,
}

impl Nearby {
    fn from_location(location: &Location) -> Self {
        let (label, interaction) = if location.boss_lair {
            (
                "PRESS [SPACE] TO CHALLENGE BOSS".to_string(),
                Some(Interaction::ChallengeBoss),
            )
        } else if location.has_shop {
            ("PRESS [SPACE] TO OPEN SHOP".to_string(), Some(Interaction::OpenShop))
        } else if location.has_inn {
            ("PRESS [SPACE] TO REST (INN)".to_string(), Some(Interaction::Rest))
        } else if let Some(npc_id) = location.npcs.first() {
            (
                format!(
                    "PRESS [SPACE] TO TALK TO {}",
                    catalog::npc_name(npc_id).to_uppercase()
                ),
                Some(Interaction::Talk {
                    npc_id: npc_id.clone(),
                }),
            )
        } else {
            (location.name.clone(), None)
        };
        Self {
            location_id: location.id.clone(),
            label,
            interaction,
        }
    }
}

/// Movement and map tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovementConfig {
    pub map_width: f32,
    pub map_height: f32,
    pub margin: f32,
    /// Pixels per tick on each axis.
    pub speed: f32,
    pub viewport_width: f32,
    pub viewport_height: f32,
    pub interaction_radius: f32,
    pub combat_radius: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            map_width: MAP_WIDTH,
            map_height: MAP_HEIGHT,
            margin: MAP_MARGIN,
            speed: PLAYER_SPEED,
            viewport_width: 1280.0,
            viewport_height: 720.0,
            interaction_radius: INTERACTION_RADIUS,
            combat_radius: COMBAT_RADIUS,
        }
    }
}

impl MovementConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_viewport(mut self, width: f32, height: f32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_map_size(mut self, width: f32, height: f32) -> Self {
        self.map_width = width;
        self.map_height = height;
        self
    }

    /// Clamp a point into the walkable area.
    pub fn clamp(&self, pos: Position) -> Position {
        Position::new(
            pos.x.max(self.margin).min(self.map_width - self.margin),
            pos.y.max(self.margin).min(self.map_height - self.margin),
        )
    }

    /// Top-left of a camera centered on `pos`, kept inside the map.
    pub fn camera_for(&self, pos: Position) -> Position {
        Position::new(
            (pos.x - self.viewport_width / 2.0)
                .min(self.map_width - self.viewport_width)
                .max(0.0),
            (pos.y - self.viewport_height / 2.0)
                .min(self.map_height - self.viewport_height)
                .max(0.0),
        )
    }
}

/// Everything one tick produced.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TickOutcome {
    pub position: Position,
    pub camera: Position,
    /// Roaming enemy touched this tick. Other scans are skipped.
    pub encounter: Option<String>,
    pub nearby: Option<Nearby>,
    /// Damage of each obstacle newly touched.
    pub obstacle_hits: Vec<u32>,
    /// Power-ups within pickup range.
    pub power_ups: Vec<String>,
}

/// Position integration and proximity scanning.
#[derive(Debug, Clone, Default)]
pub struct MovementEngine {
    config: MovementConfig,
    mode: MovementMode,
    held: HashSet<Key>,
    nearby: Option<Nearby>,
    /// Obstacle indices the player currently overlaps.
    contacts: HashSet<usize>,
}

impl MovementEngine {
    pub fn new(config: MovementConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &MovementConfig {
        &self.config
    }

    pub fn mode(&self) -> MovementMode {
        self.mode
    }

    /// Switch modes. Pausing drops held keys so nothing sticks on resume.
    pub fn set_mode(&mut self, mode: MovementMode) {
        if mode == MovementMode::Paused {
            self.held.clear();
        }
        self.mode = mode;
    }

    /// Forget per-level state such as obstacle contact.
    pub fn reset(&mut self) {
        self.held.clear();
        self.nearby = None;
        self.contacts.clear();
    }

    /// Last computed nearby location.
    pub fn nearby(&self) -> Option<&Nearby> {
        self.nearby.as_ref()
    }

    pub fn key_down(&mut self, key: Key) {
        if self.mode == MovementMode::Paused {
            return;
        }
        self.held.insert(key);
    }

    pub fn key_up(&mut self, key: Key) -> Option<InputCommand> {
        if self.mode == MovementMode::Paused {
            return None;
        }
        self.held.remove(&key);
        match key {
            Key::Space if self.nearby.is_some() => Some(InputCommand::Interact),
            Key::K => Some(InputCommand::OpenSkillTree),
            _ => None,
        }
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    /// Clamped target for an instant move.
    pub fn teleport(&self, pos: Position) -> Position {
        self.config.clamp(pos)
    }

    /// Advance one frame. Returns `None` while paused.
    pub fn tick(&mut self, world: &GameWorld) -> Option<TickOutcome> {
        if self.mode == MovementMode::Paused {
            return None;
        }

        let (mut dx, mut dy) = self.held.iter().fold((0.0f32, 0.0f32), |(x, y), key| {
            let (kx, ky) = key.direction();
            (x + kx, y + ky)
        });
        // Opposing keys cancel; clamp so aliases don't double the step
        dx = dx.clamp(-1.0, 1.0);
        dy = dy.clamp(-1.0, 1.0);

        let speed = self.config.speed * levels::speed_multiplier(&world.active_effects);
        dx *= speed;
        dy *= speed;
        if dx != 0.0 && dy != 0.0 {
            dx *= std::f32::consts::FRAC_1_SQRT_2;
            dy *= std::f32::consts::FRAC_1_SQRT_2;
        }

        let current = world.player_position;
        let position = self
            .config
            .clamp(Position::new(current.x + dx, current.y + dy));
        let mut outcome = TickOutcome {
            position,
            camera: self.config.camera_for(position),
            ..Default::default()
        };

        if let Some(enemy) = world
            .roaming_enemies
            .iter()
            .find(|e| e.position.distance_to(position) < self.config.combat_radius)
        {
            outcome.encounter = Some(enemy.id.clone());
            return Some(outcome);
        }

        self.nearby = select_location(&world.locations, position, self.config.interaction_radius)
            .map(Nearby::from_location);
        outcome.nearby = self.nearby.clone();

        if let Some(level) = world.current_level() {
            let touching: HashSet<usize> = level
                .obstacles
                .iter()
                .enumerate()
                .filter(|(_, o)| o.contains(position))
                .map(|(i, _)| i)
                .collect();
            outcome.obstacle_hits = touching
                .difference(&self.contacts)
                .filter_map(|&i| level.obstacles.get(i).map(|o| o.damage))
                .collect();
            self.contacts = touching;

            let reach = POWER_UP_RADIUS + levels::magnet_bonus(&world.active_effects);
            outcome.power_ups = level
                .power_ups
                .iter()
                .filter(|p| !p.collected && p.position.distance_to(position) < reach)
                .map(|p| p.id.clone())
                .collect();
        }

        Some(outcome)
    }

    /// Resolve what interacting at the current position does. Uses the
    /// same selection as the HUD label.
    pub fn interact(&self, world: &GameWorld) -> Option<Interaction> {
        select_location(
            &world.locations,
            world.player_position,
            self.config.interaction_radius,
        )
        .and_then(|l| Nearby::from_location(l).interaction)
    }
}

/// Last location in declaration order within `radius` of `pos`.
pub fn select_location(locations: &[Location], pos: Position, radius: f32) -> Option<&Location> {
    locations
        .iter()
        .filter(|l| l.position.distance_to(pos) < radius)
        .last()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::{Level, LevelTheme, Obstacle, PowerUp, PowerUpKind};
    use crate::world::RoamingEnemy;

    fn world_at(x: f32, y: f32) -> GameWorld {
        let mut world = GameWorld::new(
            catalog::initial_player("Glitched Bot"),
            catalog::LOCATIONS.clone(),
        );
        world.player_position = Position::new(x, y);
        world
    }

    fn active_engine() -> MovementEngine {
        let mut engine = MovementEngine::new(MovementConfig::default());
        engine.set_mode(MovementMode::Active);
        engine
    }

    #[test]
    fn test_straight_and_diagonal_steps() {
        let world = world_at(1200.0, 400.0);
        let mut engine = active_engine();

        engine.key_down(Key::D);
        let out = engine.tick(&world).unwrap();
        assert_eq!(out.position, Position::new(1205.0, 400.0));

        engine.key_down(Key::ArrowUp);
        let out = engine.tick(&world).unwrap();
        let step = 5.0 * std::f32::consts::FRAC_1_SQRT_2;
        assert!((out.position.x - (1200.0 + step)).abs() < 1e-3);
        assert!((out.position.y - (400.0 - step)).abs() < 1e-3);
    }

    #[test]
    fn test_aliases_do_not_double_speed() {
        let world = world_at(1200.0, 400.0);
        let mut engine = active_engine();
        engine.key_down(Key::D);
        engine.key_down(Key::ArrowRight);
        assert_eq!(engine.tick(&world).unwrap().position.x, 1205.0);
    }

    #[test]
    fn test_clamped_to_margin() {
        let engine = active_engine();
        assert_eq!(engine.teleport(Position::new(-50.0, 5000.0)), Position::new(50.0, 1550.0));

        let world = world_at(52.0, 800.0);
        let mut engine = active_engine();
        engine.key_down(Key::A);
        assert_eq!(engine.tick(&world).unwrap().position.x, 50.0);
    }

    #[test]
    fn test_camera_clamps() {
        let config = MovementConfig::default().with_viewport(1000.0, 600.0);
        assert_eq!(config.camera_for(Position::new(100.0, 100.0)), Position::new(0.0, 0.0));
        assert_eq!(
            config.camera_for(Position::new(2350.0, 1550.0)),
            Position::new(1400.0, 1000.0)
        );
        assert_eq!(config.camera_for(Position::new(1200.0, 800.0)), Position::new(700.0, 500.0));

        // Viewport wider than the map pins the camera to zero
        let wide = MovementConfig::default().with_viewport(3000.0, 2000.0);
        assert_eq!(wide.camera_for(Position::new(1200.0, 800.0)), Position::new(0.0, 0.0));
    }

    #[test]
    fn test_paused_tick_does_nothing() {
        let world = world_at(1200.0, 400.0);
        let mut engine = MovementEngine::new(MovementConfig::default());
        engine.key_down(Key::D);
        assert!(!engine.is_held(Key::D));
        assert!(engine.tick(&world).is_none());
        assert_eq!(engine.key_up(Key::K), None);
    }

    #[test]
    fn test_enemy_contact_stops_scan() {
        let mut world = world_at(300.0, 800.0);
        world.roaming_enemies = vec![
            RoamingEnemy::new("a", "bug_mite", 320.0, 800.0),
            RoamingEnemy::new("b", "troll_bot", 310.0, 800.0),
        ];
        let mut engine = active_engine();
        let out = engine.tick(&world).unwrap();
        // First in iteration order wins even though "b" is closer
        assert_eq!(out.encounter.as_deref(), Some("a"));
        assert!(out.nearby.is_none());
    }

    #[test]
    fn test_labels_by_priority() {
        let mut engine = active_engine();

        let out = engine.tick(&world_at(300.0, 800.0)).unwrap();
        assert_eq!(out.nearby.unwrap().label, "PRESS [SPACE] TO TALK TO BLACK CAT");

        let out = engine.tick(&world_at(600.0, 420.0)).unwrap();
        assert_eq!(out.nearby.unwrap().label, "PRESS [SPACE] TO OPEN SHOP");

        let out = engine.tick(&world_at(1000.0, 1300.0)).unwrap();
        assert_eq!(out.nearby.unwrap().interaction, Some(Interaction::Rest));

        let out = engine.tick(&world_at(1980.0, 800.0)).unwrap();
        assert_eq!(out.nearby.unwrap().label, "PRESS [SPACE] TO CHALLENGE BOSS");

        let out = engine.tick(&world_at(1000.0, 780.0)).unwrap();
        let nearby = out.nearby.unwrap();
        assert_eq!(nearby.label, "The Viral Feed");
        assert_eq!(nearby.interaction, None);

        assert!(engine.tick(&world_at(2200.0, 200.0)).unwrap().nearby.is_none());
    }

    #[test]
    fn test_interact_matches_label_selection() {
        // Two overlapping spots: the later declared one wins for both
        let mut world = world_at(500.0, 500.0);
        world.locations = vec![
            crate::world::Location::new("inn", "Inn", 480.0, 500.0).with_inn(),
            crate::world::Location::new("shop", "Shop", 520.0, 500.0).with_shop(),
        ];
        let mut engine = active_engine();
        let out = engine.tick(&world).unwrap();
        assert_eq!(out.nearby.unwrap().location_id, "shop");
        assert_eq!(engine.interact(&world), Some(Interaction::OpenShop));
    }

    #[test]
    fn test_space_release_interacts_only_when_near() {
        let mut engine = active_engine();
        engine.tick(&world_at(2200.0, 200.0));
        engine.key_down(Key::Space);
        assert_eq!(engine.key_up(Key::Space), None);

        engine.tick(&world_at(300.0, 800.0));
        engine.key_down(Key::Space);
        assert_eq!(engine.key_up(Key::Space), Some(InputCommand::Interact));
        assert_eq!(engine.key_up(Key::K), Some(InputCommand::OpenSkillTree));
    }

    #[test]
    fn test_obstacle_hits_are_edge_triggered() {
        let mut world = world_at(200.0, 200.0);
        world.levels = vec![Level::new("t", "Test", LevelTheme::Forest, 1)
            .with_obstacle(Obstacle::new(190.0, 190.0, 40.0, 40.0, 7))];
        world.current_level = Some("t".into());
        let mut engine = active_engine();

        assert_eq!(engine.tick(&world).unwrap().obstacle_hits, vec![7]);
        assert!(engine.tick(&world).unwrap().obstacle_hits.is_empty());

        world.player_position = Position::new(400.0, 400.0);
        engine.tick(&world);
        world.player_position = Position::new(200.0, 200.0);
        assert_eq!(engine.tick(&world).unwrap().obstacle_hits, vec![7]);
    }

    #[test]
    fn test_power_up_pickup_radius_and_magnet() {
        let mut world = world_at(200.0, 200.0);
        world.levels = vec![Level::new("t", "Test", LevelTheme::Forest, 1)
            .with_power_up(PowerUp::new("p", PowerUpKind::Speed, 250.0, 200.0, 10, 150))];
        world.current_level = Some("t".into());
        let mut engine = active_engine();

        assert!(engine.tick(&world).unwrap().power_ups.is_empty());

        world.active_effects.push(crate::levels::ActiveEffect {
            kind: PowerUpKind::Magnet,
            ends_at: std::time::Duration::from_secs(60),
            value: 30,
        });
        assert_eq!(engine.tick(&world).unwrap().power_ups, vec!["p".to_string()]);
    }

    #[test]
    fn test_speed_effect_scales_step() {
        let mut world = world_at(1200.0, 400.0);
        world.active_effects.push(crate::levels::ActiveEffect {
            kind: PowerUpKind::Speed,
            ends_at: std::time::Duration::from_secs(60),
            value: 200,
        });
        let mut engine = active_engine();
        engine.key_down(Key::S);
        assert_eq!(engine.tick(&world).unwrap().position.y, 410.0);
    }
}
