//! Themed levels, objectives, obstacles, power-ups and achievements.
//!
//! These are plain data with small pure helpers. Mutation happens through
//! [`crate::rules`] effects so level bookkeeping stays in one place.

use crate::audio::MusicTrack;
use crate::world::Position;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Base radius for picking up a power-up, in map pixels.
pub const POWER_UP_RADIUS: f32 = 30.0;

// ============================================================================
// Themes
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LevelTheme {
    CyberCity,
    Forest,
    Desert,
    Arctic,
    Volcano,
    Space,
}

impl LevelTheme {
    pub fn name(&self) -> &'static str {
        match self {
            LevelTheme::CyberCity => "Cyber City",
            LevelTheme::Forest => "Forest",
            LevelTheme::Desert => "Desert",
            LevelTheme::Arctic => "Arctic",
            LevelTheme::Volcano => "Volcano",
            LevelTheme::Space => "Space",
        }
    }

    /// Background music for the theme.
    pub fn music(&self) -> MusicTrack {
        match self {
            LevelTheme::CyberCity => MusicTrack::CyberTheme,
            LevelTheme::Forest => MusicTrack::ForestTheme,
            LevelTheme::Desert => MusicTrack::DesertTheme,
            LevelTheme::Arctic => MusicTrack::ArcticTheme,
            LevelTheme::Volcano => MusicTrack::VolcanoTheme,
            LevelTheme::Space => MusicTrack::SpaceTheme,
        }
    }
}

// ============================================================================
// Objectives
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectiveKind {
    DefeatEnemies,
    CollectPowerUps,
    VisitLocation(String),
    DefeatBoss,
}

/// Something that happened in play that may advance an objective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectiveEvent {
    EnemyDefeated,
    BossDefeated,
    PowerUpCollected,
    LocationVisited(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Objective {
    pub id: String,
    pub description: String,
    pub kind: ObjectiveKind,
    pub progress: u32,
    pub target: u32,
    pub completed: bool,
}

impl Objective {
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        kind: ObjectiveKind,
        target: u32,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            kind,
            progress: 0,
            target: target.max(1),
            completed: false,
        }
    }

    /// Whether the event counts toward this objective.
    pub fn matches(&self, event: &ObjectiveEvent) -> bool {
        match (&self.kind, event) {
            (ObjectiveKind::DefeatEnemies, ObjectiveEvent::EnemyDefeated) => true,
            (ObjectiveKind::CollectPowerUps, ObjectiveEvent::PowerUpCollected) => true,
            (ObjectiveKind::DefeatBoss, ObjectiveEvent::BossDefeated) => true,
            (ObjectiveKind::VisitLocation(want), ObjectiveEvent::LocationVisited(got)) => {
                want == got
            }
            _ => false,
        }
    }

    /// Progress after recording one matching event, capped at the target.
    pub fn next_progress(&self) -> u32 {
        (self.progress + 1).min(self.target)
    }
}

// ============================================================================
// Obstacles and power-ups
// ============================================================================

/// Axis-aligned hazard rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub damage: u32,
}

impl Obstacle {
    pub fn new(x: f32, y: f32, width: f32, height: f32, damage: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            damage,
        }
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= self.x
            && pos.x <= self.x + self.width
            && pos.y >= self.y
            && pos.y <= self.y + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUpKind {
    /// Movement speed scaled by `value` percent.
    Speed,
    /// Obstacle damage is ignored.
    Shield,
    /// Pickup radius widened by `value` pixels.
    Magnet,
}

impl PowerUpKind {
    pub fn name(&self) -> &'static str {
        match self {
            PowerUpKind::Speed => "Overclock Boost",
            PowerUpKind::Shield => "Firewall Shield",
            PowerUpKind::Magnet => "Data Magnet",
        }
    }
}

/// A collectible placed in a level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerUp {
    pub id: String,
    pub position: Position,
    pub kind: PowerUpKind,
    pub duration: Duration,
    pub value: u32,
    pub collected: bool,
}

impl PowerUp {
    pub fn new(
        id: impl Into<String>,
        kind: PowerUpKind,
        x: f32,
        y: f32,
        duration_secs: u64,
        value: u32,
    ) -> Self {
        Self {
            id: id.into(),
            position: Position::new(x, y),
            kind,
            duration: Duration::from_secs(duration_secs),
            value,
            collected: false,
        }
    }
}

/// A timed power-up effect currently applied to the player.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveEffect {
    pub kind: PowerUpKind,
    pub ends_at: Duration,
    pub value: u32,
}

impl ActiveEffect {
    pub fn is_expired(&self, now: Duration) -> bool {
        now >= self.ends_at
    }
}

/// Drop every effect that has run out. Returns how many were removed.
pub fn sweep_expired(effects: &mut Vec<ActiveEffect>, now: Duration) -> usize {
    let before = effects.len();
    effects.retain(|e| !e.is_expired(now));
    before - effects.len()
}

/// Combined speed multiplier of all active speed effects.
pub fn speed_multiplier(effects: &[ActiveEffect]) -> f32 {
    effects
        .iter()
        .filter(|e| e.kind == PowerUpKind::Speed)
        .fold(1.0, |acc, e| acc * e.value as f32 / 100.0)
}

pub fn shield_active(effects: &[ActiveEffect]) -> bool {
    effects.iter().any(|e| e.kind == PowerUpKind::Shield)
}

/// Extra pickup radius from magnet effects (largest wins).
pub fn magnet_bonus(effects: &[ActiveEffect]) -> f32 {
    effects
        .iter()
        .filter(|e| e.kind == PowerUpKind::Magnet)
        .map(|e| e.value as f32)
        .fold(0.0, f32::max)
}

// ============================================================================
// Levels
// ============================================================================

/// A themed stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub id: String,
    pub name: String,
    pub description: String,
    pub theme: LevelTheme,
    /// 1 (easy) to 5 (hard).
    pub difficulty: u8,
    pub unlocked: bool,
    pub completed: bool,
    pub objectives: Vec<Objective>,
    pub obstacles: Vec<Obstacle>,
    pub power_ups: Vec<PowerUp>,
    pub spawn: Position,
    /// Fastest completion, in seconds.
    pub best_time: Option<u64>,
}

impl Level {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        theme: LevelTheme,
        difficulty: u8,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            theme,
            difficulty: difficulty.clamp(1, 5),
            unlocked: false,
            completed: false,
            objectives: Vec::new(),
            obstacles: Vec::new(),
            power_ups: Vec::new(),
            spawn: Position::new(300.0, 800.0),
            best_time: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_objective(mut self, objective: Objective) -> Self {
        self.objectives.push(objective);
        self
    }

    pub fn with_obstacle(mut self, obstacle: Obstacle) -> Self {
        self.obstacles.push(obstacle);
        self
    }

    pub fn with_power_up(mut self, power_up: PowerUp) -> Self {
        self.power_ups.push(power_up);
        self
    }

    pub fn with_spawn(mut self, x: f32, y: f32) -> Self {
        self.spawn = Position::new(x, y);
        self
    }

    pub fn unlocked(mut self) -> Self {
        self.unlocked = true;
        self
    }

    pub fn objectives_complete(&self) -> bool {
        !self.objectives.is_empty() && self.objectives.iter().all(|o| o.completed)
    }

    pub fn power_up(&self, id: &str) -> Option<&PowerUp> {
        self.power_ups.iter().find(|p| p.id == id)
    }
}

// ============================================================================
// Achievements
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub name: String,
    pub description: String,
    pub progress: u32,
    pub target: u32,
    pub unlocked: bool,
    pub reward: Option<String>,
}

impl Achievement {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        target: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            progress: 0,
            target: target.max(1),
            unlocked: false,
            reward: None,
        }
    }

    pub fn with_reward(mut self, reward: impl Into<String>) -> Self {
        self.reward = Some(reward.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_obstacle_contains_edges() {
        let rock = Obstacle::new(100.0, 100.0, 50.0, 20.0, 10);
        assert!(rock.contains(Position::new(100.0, 100.0)));
        assert!(rock.contains(Position::new(150.0, 120.0)));
        assert!(!rock.contains(Position::new(151.0, 110.0)));
        assert!(!rock.contains(Position::new(120.0, 99.0)));
    }

    #[test]
    fn test_sweep_removes_expired_effects() {
        let mut effects = vec![
            ActiveEffect {
                kind: PowerUpKind::Speed,
                ends_at: Duration::from_secs(5),
                value: 150,
            },
            ActiveEffect {
                kind: PowerUpKind::Shield,
                ends_at: Duration::from_secs(10),
                value: 0,
            },
        ];

        assert_eq!(sweep_expired(&mut effects, Duration::from_secs(4)), 0);
        // Expiry is inclusive of the end instant
        assert_eq!(sweep_expired(&mut effects, Duration::from_secs(5)), 1);
        assert_eq!(effects.len(), 1);
        assert!(shield_active(&effects));
        assert_eq!(speed_multiplier(&effects), 1.0);
    }

    #[test]
    fn test_effect_modifiers() {
        let effects = vec![
            ActiveEffect {
                kind: PowerUpKind::Speed,
                ends_at: Duration::from_secs(5),
                value: 200,
            },
            ActiveEffect {
                kind: PowerUpKind::Magnet,
                ends_at: Duration::from_secs(5),
                value: 40,
            },
        ];
        assert_eq!(speed_multiplier(&effects), 2.0);
        assert_eq!(magnet_bonus(&effects), 40.0);
        assert!(!shield_active(&effects));
    }

    #[test]
    fn test_objective_matching() {
        let visit = Objective::new(
            "visit_core",
            "Reach the core",
            ObjectiveKind::VisitLocation("boss_arena".into()),
            1,
        );
        assert!(visit.matches(&ObjectiveEvent::LocationVisited("boss_arena".into())));
        assert!(!visit.matches(&ObjectiveEvent::LocationVisited("start_node".into())));
        assert!(!visit.matches(&ObjectiveEvent::EnemyDefeated));

        let mut kills = Objective::new("kills", "Defeat 2", ObjectiveKind::DefeatEnemies, 2);
        kills.progress = 2;
        assert_eq!(kills.next_progress(), 2);
    }

    #[test]
    fn test_level_without_objectives_never_auto_completes() {
        let level = Level::new("empty", "Empty", LevelTheme::Forest, 1);
        assert!(!level.objectives_complete());
    }
}
