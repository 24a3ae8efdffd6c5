//! Game world types.
//!
//! Contains all types for representing game state: entities, skills,
//! items, quests, locations, roaming enemies and the aggregate world root.

use crate::combat::CombatEncounter;
use crate::levels::{Achievement, ActiveEffect, Level};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Maximum number of entries kept in the world action log.
pub const LOG_CAPACITY: usize = 50;

// ============================================================================
// ID Types
// ============================================================================

/// Identifier for entities (player, companion, enemies, boss).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A fresh id for a spawned entity, e.g. `enemy_3f2a...`.
    pub fn generated(prefix: &str) -> Self {
        Self(format!("{prefix}_{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

// ============================================================================
// Geometry
// ============================================================================

/// A point on the 2D map, in map pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance between two points.
    pub fn distance_to(&self, other: Position) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

// ============================================================================
// Skills
// ============================================================================

/// Skill category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillKind {
    Attack,
    Heal,
    Buff,
    Ultimate,
    Team,
    Passive,
}

impl SkillKind {
    pub fn name(&self) -> &'static str {
        match self {
            SkillKind::Attack => "Attack",
            SkillKind::Heal => "Heal",
            SkillKind::Buff => "Buff",
            SkillKind::Ultimate => "Ultimate",
            SkillKind::Team => "Team",
            SkillKind::Passive => "Passive",
        }
    }

    /// Whether using this skill in combat deals damage.
    pub fn deals_damage(&self) -> bool {
        !matches!(self, SkillKind::Heal | SkillKind::Passive)
    }
}

/// A stat that items and passive skills can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stat {
    Hp,
    Attack,
    Defense,
}

impl Stat {
    pub fn abbreviation(&self) -> &'static str {
        match self {
            Stat::Hp => "HP",
            Stat::Attack => "ATK",
            Stat::Defense => "DEF",
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}

/// Permanent stat change granted by a passive skill at unlock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBonus {
    pub stat: Stat,
    pub value: u32,
}

/// A combat or passive skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub id: String,
    pub name: String,
    pub description: String,
    pub kind: SkillKind,
    /// Flavor cost shown in menus; the rules never charge it.
    pub cost: u32,
    pub damage: Option<u32>,
    pub heal: Option<u32>,
    pub unlocked: bool,
    /// Character level for the player, bond level for the companion.
    pub required_level: u32,
    pub stat_bonus: Option<StatBonus>,
    /// Resolve the hit as if the target had zero defense.
    pub ignores_defense: bool,
}

impl Skill {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: SkillKind,
        required_level: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            kind,
            cost: 0,
            damage: None,
            heal: None,
            unlocked: false,
            required_level,
            stat_bonus: None,
            ignores_defense: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_cost(mut self, cost: u32) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_damage(mut self, damage: u32) -> Self {
        self.damage = Some(damage);
        self
    }

    pub fn with_heal(mut self, heal: u32) -> Self {
        self.heal = Some(heal);
        self
    }

    pub fn with_stat_bonus(mut self, stat: Stat, value: u32) -> Self {
        self.stat_bonus = Some(StatBonus { stat, value });
        self
    }

    pub fn ignoring_defense(mut self) -> Self {
        self.ignores_defense = true;
        self
    }

    pub fn unlocked(mut self) -> Self {
        self.unlocked = true;
        self
    }
}

// ============================================================================
// Hit Points
// ============================================================================

/// Hit points tracking. `current` never leaves `[0, maximum]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitPoints {
    pub current: u32,
    pub maximum: u32,
}

impl HitPoints {
    pub fn new(maximum: u32) -> Self {
        Self {
            current: maximum,
            maximum,
        }
    }

    /// Apply damage, flooring at zero. Returns the HP actually lost.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        let old = self.current;
        self.current = self.current.saturating_sub(amount);
        old - self.current
    }

    /// Heal, capped at maximum. Returns the HP actually restored.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let old = self.current;
        self.current = self.current.saturating_add(amount).min(self.maximum);
        self.current - old
    }

    pub fn restore_full(&mut self) {
        self.current = self.maximum;
    }

    /// Raise both maximum and current HP.
    pub fn raise_maximum(&mut self, amount: u32) {
        self.maximum = self.maximum.saturating_add(amount);
        self.current = self.current.saturating_add(amount).min(self.maximum);
    }

    pub fn is_depleted(&self) -> bool {
        self.current == 0
    }

    pub fn ratio(&self) -> f32 {
        if self.maximum == 0 {
            0.0
        } else {
            self.current as f32 / self.maximum as f32
        }
    }
}

// ============================================================================
// Entities
// ============================================================================

/// Entity category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Player,
    Companion,
    Enemy,
    Boss,
}

impl EntityKind {
    pub fn is_party_member(&self) -> bool {
        matches!(self, EntityKind::Player | EntityKind::Companion)
    }
}

/// Companion bond (friendship) progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bond {
    pub xp: u32,
    pub level: u32,
}

impl Bond {
    pub fn new() -> Self {
        Self { xp: 0, level: 1 }
    }

    /// XP needed to leave the current level.
    pub fn threshold(&self) -> u32 {
        100 * self.level
    }
}

impl Default for Bond {
    fn default() -> Self {
        Self::new()
    }
}

/// A player, companion, enemy or boss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub kind: EntityKind,
    pub hit_points: HitPoints,
    pub level: u32,
    /// Current XP for party members, reward XP for enemies.
    pub xp: u32,
    pub max_xp: u32,
    pub attack: u32,
    pub defense: u32,
    pub skills: Vec<Skill>,
    pub bond: Option<Bond>,
}

impl Entity {
    pub fn new(id: impl Into<EntityIdSource>, name: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            id: id.into().0,
            name: name.into(),
            kind,
            hit_points: HitPoints::new(1),
            level: 1,
            xp: 0,
            max_xp: 100,
            attack: 0,
            defense: 0,
            skills: Vec::new(),
            bond: None,
        }
    }

    pub fn with_hp(mut self, maximum: u32) -> Self {
        self.hit_points = HitPoints::new(maximum);
        self
    }

    pub fn with_stats(mut self, attack: u32, defense: u32) -> Self {
        self.attack = attack;
        self.defense = defense;
        self
    }

    pub fn with_level(mut self, level: u32, xp: u32, max_xp: u32) -> Self {
        self.level = level;
        self.xp = xp;
        self.max_xp = max_xp;
        self
    }

    pub fn with_skills(mut self, skills: Vec<Skill>) -> Self {
        self.skills = skills;
        self
    }

    pub fn with_bond(mut self, bond: Bond) -> Self {
        self.bond = Some(bond);
        self
    }

    pub fn is_alive(&self) -> bool {
        !self.hit_points.is_depleted()
    }

    pub fn skill(&self, skill_id: &str) -> Option<&Skill> {
        self.skills.iter().find(|s| s.id == skill_id)
    }

    pub fn has_unlocked(&self, skill_id: &str) -> bool {
        self.skill(skill_id).map(|s| s.unlocked).unwrap_or(false)
    }

    pub fn unlocked_skills(&self) -> impl Iterator<Item = &Skill> {
        self.skills.iter().filter(|s| s.unlocked)
    }

    /// First unlocked skill of the given kind.
    pub fn unlocked_of_kind(&self, kind: SkillKind) -> Option<&Skill> {
        self.unlocked_skills().find(|s| s.kind == kind)
    }

    /// The level skill requirements are checked against.
    pub fn unlock_level(&self) -> u32 {
        match self.kind {
            EntityKind::Companion => self.bond.map(|b| b.level).unwrap_or(1),
            EntityKind::Player | EntityKind::Enemy | EntityKind::Boss => self.level,
        }
    }

    pub fn bond_level(&self) -> Option<u32> {
        self.bond.map(|b| b.level)
    }
}

/// Conversion helper so constructors accept `&str`, `String` or `EntityId`.
pub struct EntityIdSource(EntityId);

impl From<&str> for EntityIdSource {
    fn from(id: &str) -> Self {
        Self(EntityId::new(id))
    }
}

impl From<String> for EntityIdSource {
    fn from(id: String) -> Self {
        Self(EntityId(id))
    }
}

impl From<EntityId> for EntityIdSource {
    fn from(id: EntityId) -> Self {
        Self(id)
    }
}

// ============================================================================
// Items
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    /// Used up on use (potions and snacks).
    Consumable,
    /// Permanent stat boost.
    Upgrade,
}

/// A shop item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub description: String,
    pub cost: u32,
    pub kind: ItemKind,
    /// HP amount or stat amount.
    pub effect_value: u32,
    pub stat: Option<Stat>,
}

impl Item {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: ItemKind,
        cost: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            cost,
            kind,
            effect_value: 0,
            stat: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_effect(mut self, stat: Stat, value: u32) -> Self {
        self.stat = Some(stat);
        self.effect_value = value;
        self
    }
}

// ============================================================================
// Locations and NPCs
// ============================================================================

/// A fixed point of interest on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: String,
    pub description: String,
    pub position: Position,
    pub connections: Vec<String>,
    pub enemy_types: Vec<String>,
    pub npcs: Vec<String>,
    pub has_shop: bool,
    pub has_inn: bool,
    /// Interacting here challenges the boss.
    pub boss_lair: bool,
}

impl Location {
    pub fn new(id: impl Into<String>, name: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            position: Position::new(x, y),
            connections: Vec::new(),
            enemy_types: Vec::new(),
            npcs: Vec::new(),
            has_shop: false,
            has_inn: false,
            boss_lair: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn connected_to(mut self, ids: &[&str]) -> Self {
        self.connections = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_enemies(mut self, types: &[&str]) -> Self {
        self.enemy_types = types.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_npcs(mut self, npcs: &[&str]) -> Self {
        self.npcs = npcs.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_shop(mut self) -> Self {
        self.has_shop = true;
        self
    }

    pub fn with_inn(mut self) -> Self {
        self.has_inn = true;
        self
    }

    pub fn boss_lair(mut self) -> Self {
        self.boss_lair = true;
        self
    }
}

/// A talkable character on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Npc {
    pub id: String,
    pub name: String,
}

/// A map-placed combat trigger, turned into a full [`Entity`] on contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoamingEnemy {
    pub id: String,
    pub enemy_type: String,
    pub position: Position,
}

impl RoamingEnemy {
    pub fn new(id: impl Into<String>, enemy_type: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            id: id.into(),
            enemy_type: enemy_type.into(),
            position: Position::new(x, y),
        }
    }
}

// ============================================================================
// Quests
// ============================================================================

/// A quest. Completion is one way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quest {
    pub id: String,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub reward_subscribers: u32,
    pub reward_bond_xp: Option<u32>,
}

// ============================================================================
// Customization
// ============================================================================

/// Cosmetic choices for a party member. Stored, never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customization {
    pub entity_id: EntityId,
    pub outfit: String,
    pub color: String,
}

// ============================================================================
// Game World
// ============================================================================

/// Which screen the game is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Screen {
    #[default]
    Intro,
    LevelSelect,
    Exploration,
    Combat,
    SkillTree,
    Shop,
    Achievements,
    Customization,
    GameOver,
    Victory,
}

/// The complete game world state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameWorld {
    pub session_id: Uuid,
    pub screen: Screen,

    /// Active combatants; the player is always index 0.
    pub party: Vec<Entity>,
    /// Currency.
    pub subscribers: u32,
    pub inventory: Vec<Item>,
    pub quests: Vec<Quest>,
    /// Most recent first.
    pub log: VecDeque<String>,

    // Exploration
    pub player_position: Position,
    pub current_location: String,
    pub locations: Vec<Location>,
    pub roaming_enemies: Vec<RoamingEnemy>,
    pub active_npc: Option<String>,

    // Combat
    pub combat: Option<CombatEncounter>,

    // Levels and meta progress
    pub levels: Vec<Level>,
    pub current_level: Option<String>,
    pub level_started_at: Option<Duration>,
    pub achievements: Vec<Achievement>,
    pub active_effects: Vec<ActiveEffect>,
    pub customizations: Vec<Customization>,
}

impl GameWorld {
    pub fn new(player: Entity, locations: Vec<Location>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            screen: Screen::Intro,
            party: vec![player],
            subscribers: 0,
            inventory: Vec::new(),
            quests: Vec::new(),
            log: VecDeque::new(),
            player_position: Position::default(),
            current_location: String::new(),
            locations,
            roaming_enemies: Vec::new(),
            active_npc: None,
            combat: None,
            levels: Vec::new(),
            current_level: None,
            level_started_at: None,
            achievements: Vec::new(),
            active_effects: Vec::new(),
            customizations: Vec::new(),
        }
    }

    /// The party leader.
    pub fn player(&self) -> &Entity {
        &self.party[0]
    }

    pub fn player_mut(&mut self) -> &mut Entity {
        &mut self.party[0]
    }

    /// The companion, if one has joined.
    pub fn companion(&self) -> Option<&Entity> {
        self.party.iter().find(|e| e.kind == EntityKind::Companion)
    }

    pub fn companion_mut(&mut self) -> Option<&mut Entity> {
        self.party
            .iter_mut()
            .find(|e| e.kind == EntityKind::Companion)
    }

    pub fn member(&self, id: &EntityId) -> Option<&Entity> {
        self.party.iter().find(|e| &e.id == id)
    }

    pub fn member_mut(&mut self, id: &EntityId) -> Option<&mut Entity> {
        self.party.iter_mut().find(|e| &e.id == id)
    }

    /// Bond level used to gate banter lines; 0 without a companion.
    pub fn bond_level(&self) -> u32 {
        self.companion().and_then(|c| c.bond_level()).unwrap_or(0)
    }

    pub fn push_log(&mut self, message: impl Into<String>) {
        self.log.push_front(message.into());
        self.log.truncate(LOG_CAPACITY);
    }

    pub fn recent_log(&self, count: usize) -> Vec<&str> {
        self.log.iter().take(count).map(String::as_str).collect()
    }

    pub fn location(&self, id: &str) -> Option<&Location> {
        self.locations.iter().find(|l| l.id == id)
    }

    pub fn quest(&self, id: &str) -> Option<&Quest> {
        self.quests.iter().find(|q| q.id == id)
    }

    pub fn level(&self, id: &str) -> Option<&Level> {
        self.levels.iter().find(|l| l.id == id)
    }

    pub fn current_level(&self) -> Option<&Level> {
        self.current_level.as_deref().and_then(|id| self.level(id))
    }

    pub fn achievement(&self, id: &str) -> Option<&Achievement> {
        self.achievements.iter().find(|a| a.id == id)
    }

    pub fn in_combat(&self) -> bool {
        self.combat.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_player() -> Entity {
        Entity::new("bot_player", "Glitched Bot", EntityKind::Player)
            .with_hp(100)
            .with_stats(10, 2)
    }

    #[test]
    fn test_hit_points_clamp() {
        let mut hp = HitPoints::new(20);
        assert_eq!(hp.take_damage(5), 5);
        assert_eq!(hp.current, 15);

        assert_eq!(hp.heal(10), 5);
        assert_eq!(hp.current, 20); // Capped at max

        assert_eq!(hp.take_damage(50), 20);
        assert_eq!(hp.current, 0); // Floored at zero
        assert!(hp.is_depleted());
    }

    #[test]
    fn test_raise_maximum_adds_to_current() {
        let mut hp = HitPoints::new(80);
        hp.take_damage(30);
        hp.raise_maximum(20);
        assert_eq!(hp.maximum, 100);
        assert_eq!(hp.current, 70);
    }

    #[test]
    fn test_unlock_level_uses_bond_for_companion() {
        let cat = Entity::new("black_cat", "Black Cat", EntityKind::Companion)
            .with_level(4, 0, 100)
            .with_bond(Bond { xp: 120, level: 2 });
        assert_eq!(cat.unlock_level(), 2);

        let player = sample_player().with_level(3, 0, 100);
        assert_eq!(player.unlock_level(), 3);
    }

    #[test]
    fn test_log_is_most_recent_first_and_capped() {
        let mut world = GameWorld::new(sample_player(), Vec::new());
        for i in 0..(LOG_CAPACITY + 10) {
            world.push_log(format!("entry {i}"));
        }
        assert_eq!(world.log.len(), LOG_CAPACITY);
        assert_eq!(world.log[0], format!("entry {}", LOG_CAPACITY + 9));
    }

    #[test]
    fn test_companion_is_derived_from_party() {
        let mut world = GameWorld::new(sample_player(), Vec::new());
        assert!(world.companion().is_none());
        assert_eq!(world.bond_level(), 0);

        world.party.push(
            Entity::new("black_cat", "Black Cat", EntityKind::Companion).with_bond(Bond::new()),
        );
        assert_eq!(world.companion().map(|c| c.name.as_str()), Some("Black Cat"));
        assert_eq!(world.bond_level(), 1);
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = EntityId::generated("enemy");
        let b = EntityId::generated("enemy");
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("enemy_"));
    }
}
