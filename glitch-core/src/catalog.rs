//! Static game content.
//!
//! Skill paths, starting entities, shop stock, the world map, quests,
//! levels and achievements. Everything here is read-only; the session
//! clones what it needs into the [`GameWorld`](crate::world::GameWorld).

use crate::levels::{
    Achievement, Level, LevelTheme, Objective, ObjectiveKind, Obstacle, PowerUp, PowerUpKind,
};
use crate::world::{
    Bond, Entity, EntityId, EntityKind, GameWorld, Item, ItemKind, Location, Position, Quest,
    RoamingEnemy, Skill, SkillKind, Stat,
};
use rand::seq::SliceRandom;
use rand::Rng;

pub const PLAYER_ID: &str = "bot_player";
pub const COMPANION_ID: &str = "black_cat";
pub const BOSS_ID: &str = "algo_king";

pub const COMPANION_NPC: &str = "black_cat_npc";
pub const BOSS_NPC: &str = "algo_king_npc";
pub const BARKEEP_NPC: &str = "barkeep_vpn";

pub const START_LOCATION: &str = "start_node";
pub const FIRST_QUEST: &str = "find_cat";
pub const BOSS_QUEST: &str = "defeat_algo";

/// Enemy types that can respawn after a victory.
pub const RESPAWN_TYPES: [&str; 3] = ["bug_mite", "youtube_minion", "troll_bot"];

// ============================================================================
// Skills
// ============================================================================

lazy_static::lazy_static! {
    /// Player skill tree, in unlock order.
    pub static ref PLAYER_SKILL_PATH: Vec<Skill> = vec![
        Skill::new("basic_glitch", "Basic Glitch", SkillKind::Attack, 1)
            .with_description("A simple data corruption attack.")
            .with_damage(10)
            .unlocked(),
        Skill::new("hotfix", "Hotfix Patch", SkillKind::Heal, 2)
            .with_description("Quickly patch wounds. Restores HP.")
            .with_cost(20)
            .with_heal(30),
        Skill::new("trash_post", "Trash Post", SkillKind::Attack, 3)
            .with_description("Post absolute garbage. Confuses the enemy.")
            .with_cost(15)
            .with_damage(25),
        Skill::new("overclock", "Overclocked CPU", SkillKind::Passive, 4)
            .with_description("System optimization. +5 permanent ATK.")
            .with_stat_bonus(Stat::Attack, 5),
        Skill::new("content_validation", "Content Validation Protocol", SkillKind::Ultimate, 6)
            .with_description("Shoots content validation bullets. Ignores defense.")
            .with_cost(50)
            .with_damage(999)
            .ignoring_defense(),
    ];

    /// Companion skill tree, gated by bond level.
    pub static ref COMPANION_SKILL_PATH: Vec<Skill> = vec![
        Skill::new("cat_scratch", "Claw Scratch", SkillKind::Attack, 1)
            .with_description("Sharp claws meet digital skin.")
            .with_damage(12)
            .unlocked(),
        Skill::new("purr_therapy", "Purr Therapy", SkillKind::Heal, 2)
            .with_description("Purrs at a frequency that fixes code.")
            .with_cost(25)
            .with_heal(40),
        Skill::new("bad_luck_protocol", "Bad Luck Protocol", SkillKind::Passive, 3)
            .with_description("Enemies glitch when attacking. +3 permanent DEF.")
            .with_stat_bonus(Stat::Defense, 3),
        Skill::new("hiss_debuff", "Viral Hiss", SkillKind::Buff, 4)
            .with_description("Scares the enemy, lowering their defense.")
            .with_cost(20)
            .with_damage(5),
        Skill::new("chaos_sync", "Chaos Sync", SkillKind::Team, 5)
            .with_description("Bot and cat synchronize glitches. Massive joint damage.")
            .with_cost(40)
            .with_damage(60),
    ];
}

/// The unlock path a party member's skills belong to.
pub fn skill_path(kind: EntityKind) -> &'static [Skill] {
    match kind {
        EntityKind::Player => &PLAYER_SKILL_PATH,
        EntityKind::Companion => &COMPANION_SKILL_PATH,
        EntityKind::Enemy | EntityKind::Boss => &[],
    }
}

/// Look up a skill in either path.
pub fn find_skill(skill_id: &str) -> Option<&'static Skill> {
    PLAYER_SKILL_PATH
        .iter()
        .chain(COMPANION_SKILL_PATH.iter())
        .find(|s| s.id == skill_id)
}

// ============================================================================
// Entities
// ============================================================================

pub fn initial_player(name: &str) -> Entity {
    let starting = PLAYER_SKILL_PATH.iter().filter(|s| s.unlocked).cloned().collect();
    Entity::new(PLAYER_ID, name, EntityKind::Player)
        .with_hp(100)
        .with_level(1, 0, 100)
        .with_stats(10, 2)
        .with_skills(starting)
}

pub fn black_cat() -> Entity {
    Entity::new(COMPANION_ID, "Black Cat", EntityKind::Companion)
        .with_hp(80)
        .with_level(1, 0, 100)
        .with_stats(15, 0)
        .with_skills(COMPANION_SKILL_PATH.clone())
        .with_bond(Bond::new())
}

pub fn algorithm_king() -> Entity {
    Entity::new(BOSS_ID, "Algorithm King", EntityKind::Boss)
        .with_hp(2000)
        .with_level(10, 5000, 0)
        .with_stats(50, 100)
}

/// Display name for an enemy type id: `bug_mite` becomes `BUG MITE`.
pub fn enemy_display_name(enemy_type: &str) -> String {
    enemy_type.replace('_', " ").to_uppercase()
}

/// Build a combat-ready enemy scaled to the player's level.
pub fn spawn_enemy(enemy_type: &str, level: u32) -> Entity {
    let level = level.max(1);
    Entity::new(EntityId::generated("enemy"), enemy_display_name(enemy_type), EntityKind::Enemy)
        .with_hp(50 + level * 10)
        .with_level(level, 20 * level, 0)
        .with_stats(8 + level * 2, 2)
}

// ============================================================================
// Shop
// ============================================================================

lazy_static::lazy_static! {
    pub static ref SHOP_ITEMS: Vec<Item> = vec![
        Item::new("ram_stick", "RAM Stick", ItemKind::Consumable, 50)
            .with_description("Restores 50 HP. Crunchy silicon snack.")
            .with_effect(Stat::Hp, 50),
        Item::new("energy_drink", "Liquid Code", ItemKind::Consumable, 120)
            .with_description("Restores 100 HP. Tastes like electricity.")
            .with_effect(Stat::Hp, 100),
        Item::new("gpu_shard", "GPU Shard", ItemKind::Upgrade, 500)
            .with_description("Permanently increases ATTACK by 2.")
            .with_effect(Stat::Attack, 2),
        Item::new("firewall_plate", "Firewall Plate", ItemKind::Upgrade, 450)
            .with_description("Permanently increases DEFENSE by 1.")
            .with_effect(Stat::Defense, 1),
    ];
}

pub fn shop_item(item_id: &str) -> Option<&'static Item> {
    SHOP_ITEMS.iter().find(|i| i.id == item_id)
}

// ============================================================================
// Map
// ============================================================================

lazy_static::lazy_static! {
    pub static ref LOCATIONS: Vec<Location> = vec![
        Location::new(START_LOCATION, "System Crash Dump", 300.0, 800.0)
            .with_description("A pile of corrupted data and lost files. It smells like burnt silicon.")
            .connected_to(&["social_feed", "dev_console"])
            .with_enemies(&["bug_mite"])
            .with_npcs(&[COMPANION_NPC]),
        Location::new("social_feed", "The Viral Feed", 1000.0, 800.0)
            .with_description("A rushing river of content. Loud, bright and dangerous.")
            .connected_to(&[START_LOCATION, "trending_tab", "dark_mode_tavern"])
            .with_enemies(&["youtube_minion", "troll_bot"]),
        Location::new("dev_console", "Developer Console", 600.0, 400.0)
            .with_description("The skeletal structure of the world.")
            .connected_to(&[START_LOCATION, "boss_arena"])
            .with_enemies(&["syntax_error", "memory_leak"])
            .with_shop(),
        Location::new("dark_mode_tavern", "Incognito Tavern", 1000.0, 1300.0)
            .with_description("A safe place where cookies are deleted.")
            .connected_to(&["social_feed"])
            .with_npcs(&[BARKEEP_NPC])
            .with_inn(),
        Location::new("trending_tab", "Trending Tab", 1600.0, 600.0)
            .with_description("The high ground. Only the verified survive here.")
            .connected_to(&["social_feed", "boss_arena"])
            .with_enemies(&["influencer_wraith", "clickbait_hydra"]),
        Location::new("boss_arena", "The Algorithm Core", 2000.0, 800.0)
            .with_description("The perfect machine. The King watches all.")
            .connected_to(&["dev_console", "trending_tab"])
            .with_npcs(&[BOSS_NPC])
            .boss_lair(),
    ];
}

/// Display name for an NPC id.
pub fn npc_name(npc_id: &str) -> &'static str {
    match npc_id {
        COMPANION_NPC => "Black Cat",
        BOSS_NPC => "Algorithm King",
        BARKEEP_NPC => "Barkeep VPN",
        _ => "Stranger",
    }
}

pub fn initial_roaming_enemies() -> Vec<RoamingEnemy> {
    vec![
        RoamingEnemy::new("glitch_1", "bug_mite", 600.0, 850.0),
        RoamingEnemy::new("glitch_2", "youtube_minion", 1200.0, 700.0),
        RoamingEnemy::new("glitch_3", "troll_bot", 1100.0, 900.0),
        RoamingEnemy::new("glitch_4", "influencer_wraith", 1500.0, 650.0),
        RoamingEnemy::new("glitch_5", "syntax_error", 500.0, 500.0),
    ]
}

/// A fresh roaming enemy somewhere in the middle of the map.
pub fn random_roaming_enemy<R: Rng>(rng: &mut R) -> RoamingEnemy {
    let enemy_type = RESPAWN_TYPES.choose(rng).copied().unwrap_or(RESPAWN_TYPES[0]);
    let x = rng.gen_range(400.0..1400.0);
    let y = rng.gen_range(400.0..1200.0);
    RoamingEnemy::new(EntityId::generated("enemy").0, enemy_type, x, y)
}

// ============================================================================
// Quests
// ============================================================================

pub fn first_quest() -> Quest {
    Quest {
        id: FIRST_QUEST.to_string(),
        title: "Protocol: Friendship".to_string(),
        description: "Find the Black Cat in the System Crash Dump.".to_string(),
        completed: false,
        reward_subscribers: 100,
        reward_bond_xp: Some(120),
    }
}

pub fn boss_quest() -> Quest {
    Quest {
        id: BOSS_QUEST.to_string(),
        title: "Viral or Vanish".to_string(),
        description: "Defeat the Algorithm King. You need a skill that breaks the rules."
            .to_string(),
        completed: false,
        reward_subscribers: 1_000_000,
        reward_bond_xp: Some(1000),
    }
}

pub fn initial_log() -> Vec<&'static str> {
    vec![
        "System initialized...",
        "Crash detected...",
        "Rebooting into Safe Mode...",
    ]
}

// ============================================================================
// Levels
// ============================================================================

lazy_static::lazy_static! {
    pub static ref LEVELS: Vec<Level> = vec![
        Level::new("cyber_city", "Neon Crash Dump", LevelTheme::CyberCity, 1)
            .with_description("Reboot among the corrupted files and find a friend.")
            .with_objective(Objective::new("cc_defeat", "Delete 2 glitches", ObjectiveKind::DefeatEnemies, 2))
            .with_objective(Objective::new(
                "cc_visit",
                "Reach the Viral Feed",
                ObjectiveKind::VisitLocation("social_feed".into()),
                1,
            ))
            .with_obstacle(Obstacle::new(700.0, 950.0, 120.0, 40.0, 10))
            .with_power_up(PowerUp::new("cc_speed", PowerUpKind::Speed, 450.0, 700.0, 10, 150))
            .with_spawn(300.0, 800.0)
            .unlocked(),
        Level::new("forest", "Root Directory Woods", LevelTheme::Forest, 2)
            .with_description("Tangled branches of nested folders.")
            .with_objective(Objective::new("fo_defeat", "Delete 3 glitches", ObjectiveKind::DefeatEnemies, 3))
            .with_objective(Objective::new("fo_collect", "Collect 2 power-ups", ObjectiveKind::CollectPowerUps, 2))
            .with_obstacle(Obstacle::new(800.0, 600.0, 60.0, 150.0, 12))
            .with_obstacle(Obstacle::new(1300.0, 1000.0, 150.0, 50.0, 12))
            .with_power_up(PowerUp::new("fo_shield", PowerUpKind::Shield, 900.0, 500.0, 15, 0))
            .with_power_up(PowerUp::new("fo_magnet", PowerUpKind::Magnet, 1200.0, 1100.0, 20, 60))
            .with_spawn(300.0, 800.0),
        Level::new("desert", "Dead Pixel Dunes", LevelTheme::Desert, 3)
            .with_description("Endless sand made of burnt-out pixels.")
            .with_objective(Objective::new(
                "de_visit",
                "Find the Incognito Tavern",
                ObjectiveKind::VisitLocation("dark_mode_tavern".into()),
                1,
            ))
            .with_objective(Objective::new("de_defeat", "Delete 4 glitches", ObjectiveKind::DefeatEnemies, 4))
            .with_obstacle(Obstacle::new(600.0, 1100.0, 200.0, 60.0, 15))
            .with_obstacle(Obstacle::new(1400.0, 900.0, 80.0, 200.0, 15))
            .with_power_up(PowerUp::new("de_speed", PowerUpKind::Speed, 1100.0, 1150.0, 10, 175))
            .with_spawn(300.0, 800.0),
        Level::new("arctic", "Frozen Cache", LevelTheme::Arctic, 3)
            .with_description("Stale data frozen solid. Watch your step.")
            .with_objective(Objective::new("ar_collect", "Collect 3 power-ups", ObjectiveKind::CollectPowerUps, 3))
            .with_objective(Objective::new("ar_defeat", "Delete 3 glitches", ObjectiveKind::DefeatEnemies, 3))
            .with_obstacle(Obstacle::new(500.0, 600.0, 250.0, 40.0, 18))
            .with_obstacle(Obstacle::new(1700.0, 750.0, 60.0, 250.0, 18))
            .with_power_up(PowerUp::new("ar_shield", PowerUpKind::Shield, 800.0, 300.0, 15, 0))
            .with_power_up(PowerUp::new("ar_magnet", PowerUpKind::Magnet, 1300.0, 400.0, 20, 60))
            .with_power_up(PowerUp::new("ar_speed", PowerUpKind::Speed, 1800.0, 1200.0, 10, 150))
            .with_spawn(300.0, 800.0),
        Level::new("volcano", "Overheated Core", LevelTheme::Volcano, 4)
            .with_description("Thermal throttling everywhere. Do not touch the lava.")
            .with_objective(Objective::new("vo_defeat", "Delete 5 glitches", ObjectiveKind::DefeatEnemies, 5))
            .with_objective(Objective::new(
                "vo_visit",
                "Climb the Trending Tab",
                ObjectiveKind::VisitLocation("trending_tab".into()),
                1,
            ))
            .with_obstacle(Obstacle::new(1100.0, 450.0, 300.0, 50.0, 25))
            .with_obstacle(Obstacle::new(1800.0, 1000.0, 200.0, 200.0, 25))
            .with_obstacle(Obstacle::new(750.0, 1200.0, 150.0, 150.0, 25))
            .with_power_up(PowerUp::new("vo_shield", PowerUpKind::Shield, 1300.0, 700.0, 20, 0))
            .with_spawn(300.0, 800.0),
        Level::new("space", "Cloud Orbit", LevelTheme::Space, 5)
            .with_description("The Algorithm Core floats above it all. End this.")
            .with_objective(Objective::new(
                "sp_visit",
                "Breach the Algorithm Core",
                ObjectiveKind::VisitLocation("boss_arena".into()),
                1,
            ))
            .with_objective(Objective::new("sp_boss", "Defeat the Algorithm King", ObjectiveKind::DefeatBoss, 1))
            .with_obstacle(Obstacle::new(1500.0, 950.0, 100.0, 100.0, 30))
            .with_obstacle(Obstacle::new(1750.0, 500.0, 100.0, 100.0, 30))
            .with_power_up(PowerUp::new("sp_speed", PowerUpKind::Speed, 1400.0, 800.0, 15, 200))
            .with_power_up(PowerUp::new("sp_magnet", PowerUpKind::Magnet, 700.0, 800.0, 20, 80))
            .with_spawn(300.0, 800.0),
    ];
}

// ============================================================================
// Achievements
// ============================================================================

pub const ACH_FIRST_LEVEL: &str = "first_level";
pub const ACH_ALL_LEVELS: &str = "all_levels";
pub const ACH_COLLECTOR: &str = "collector";
pub const ACH_FIRST_VICTORY: &str = "first_victory";
pub const ACH_BEST_FRIENDS: &str = "best_friends";

lazy_static::lazy_static! {
    pub static ref ACHIEVEMENTS: Vec<Achievement> = vec![
        Achievement::new(ACH_FIRST_LEVEL, "Hello World", "Complete your first level.", 1)
            .with_reward("Title: Junior Glitch"),
        Achievement::new(ACH_ALL_LEVELS, "Full Stack", "Complete every level.", LEVELS.len() as u32)
            .with_reward("Title: Senior Glitch"),
        Achievement::new(ACH_COLLECTOR, "Packet Hoarder", "Collect 10 power-ups.", 10),
        Achievement::new(ACH_FIRST_VICTORY, "First Blood Byte", "Win your first battle.", 1),
        Achievement::new(ACH_BEST_FRIENDS, "Best Friends Forever", "Reach bond level 5 with the Black Cat.", 5)
            .with_reward("Cat outfit: Neon Collar"),
    ];
}

// ============================================================================
// New game
// ============================================================================

/// A fresh world: the player alone at the crash dump with the first quest.
pub fn starting_world(player_name: &str) -> GameWorld {
    let mut world = GameWorld::new(initial_player(player_name), LOCATIONS.clone());
    world.quests = vec![first_quest()];
    world.log = initial_log().into_iter().map(String::from).collect();
    world.roaming_enemies = initial_roaming_enemies();
    world.levels = LEVELS.clone();
    world.achievements = ACHIEVEMENTS.clone();
    world.current_location = START_LOCATION.to_string();
    world.player_position = LOCATIONS
        .iter()
        .find(|l| l.id == START_LOCATION)
        .map(|l| l.position)
        .unwrap_or(Position::new(300.0, 800.0));
    world
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_starting_world() {
        let world = starting_world("Glitched Bot");
        assert_eq!(world.party.len(), 1);
        assert!(world.companion().is_none());
        assert_eq!(world.player_position, Position::new(300.0, 800.0));
        assert_eq!(world.roaming_enemies.len(), 5);
        assert_eq!(world.quests[0].id, FIRST_QUEST);
        assert_eq!(world.log.len(), 3);
        assert!(world.levels[0].unlocked);
    }

    #[test]
    fn test_initial_player_has_only_basic_attack() {
        let player = initial_player("Glitched Bot");
        assert_eq!(player.hit_points.maximum, 100);
        assert_eq!((player.attack, player.defense), (10, 2));
        assert_eq!(player.skills.len(), 1);
        assert!(player.has_unlocked("basic_glitch"));
    }

    #[test]
    fn test_cat_carries_full_path() {
        let cat = black_cat();
        assert_eq!(cat.skills.len(), COMPANION_SKILL_PATH.len());
        assert_eq!(cat.bond, Some(Bond { xp: 0, level: 1 }));
        assert_eq!(cat.unlocked_skills().count(), 1);
    }

    #[test]
    fn test_spawned_enemy_scales_with_level() {
        let enemy = spawn_enemy("bug_mite", 3);
        assert_eq!(enemy.name, "BUG MITE");
        assert_eq!(enemy.hit_points.maximum, 80);
        assert_eq!(enemy.xp, 60);
        assert_eq!(enemy.attack, 14);
        assert_eq!(enemy.defense, 2);
        assert_eq!(enemy.kind, EntityKind::Enemy);
    }

    #[test]
    fn test_enemy_display_name_replaces_every_underscore() {
        assert_eq!(enemy_display_name("influencer_wraith_prime"), "INFLUENCER WRAITH PRIME");
    }

    #[test]
    fn test_random_roaming_enemy_in_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let enemy = random_roaming_enemy(&mut rng);
            assert!(RESPAWN_TYPES.contains(&enemy.enemy_type.as_str()));
            assert!((400.0..1400.0).contains(&enemy.position.x));
            assert!((400.0..1200.0).contains(&enemy.position.y));
        }
    }

    #[test]
    fn test_only_first_level_unlocked() {
        assert_eq!(LEVELS.len(), 6);
        assert!(LEVELS[0].unlocked);
        assert!(LEVELS.iter().skip(1).all(|l| !l.unlocked));
    }

    #[test]
    fn test_level_spawns_clear_of_obstacles() {
        for level in LEVELS.iter() {
            assert!(
                level.obstacles.iter().all(|o| !o.contains(level.spawn)),
                "spawn inside obstacle in {}",
                level.id
            );
        }
    }

    #[test]
    fn test_npc_names() {
        assert_eq!(npc_name(COMPANION_NPC), "Black Cat");
        assert_eq!(npc_name(BARKEEP_NPC), "Barkeep VPN");
        assert_eq!(npc_name("ghost"), "Stranger");
    }
}
