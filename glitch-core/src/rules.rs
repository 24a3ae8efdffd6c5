//! Progression rules with an Intent/Effect system.
//!
//! Every discrete change to the world outside of a fight goes through here:
//! 1. The session builds an [`Intent`] (what should happen)
//! 2. [`RulesEngine::resolve`] reads the world and produces [`Effect`]s
//! 3. [`apply_effects`] writes those effects into the [`GameWorld`]
//!
//! Resolution never mutates. An intent that makes no sense in the current
//! state resolves to a narrative with no effects.

use crate::audio::{AudioCue, SoundEffect};
use crate::bond::{self, BondChange};
use crate::catalog;
use crate::levels::{ActiveEffect, ObjectiveEvent};
use crate::progression::{self, ItemUse, LevelUp, SkillUnlock};
use crate::world::{
    Bond, Customization, Entity, EntityId, GameWorld, Item, Position, Quest, RoamingEnemy, Screen,
    Skill, SkillKind, Stat,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Currency range for a non-boss victory.
pub const VICTORY_SUBSCRIBERS: std::ops::RangeInclusive<u32> = 10..=59;

/// A requested change to the world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Intent {
    /// Rewards for beating a regular enemy worth `enemy_xp`.
    VictoryReward { enemy_xp: u32 },

    /// Unlock a skill for a party member.
    UnlockSkill { member: EntityId, skill_id: String },

    /// Use the inventory item at `index`. Targets the party leader by default.
    UseItem {
        index: usize,
        target: Option<EntityId>,
    },

    /// Buy one of a shop item.
    BuyItem { item_id: String },

    /// Inn rest.
    Rest,

    /// The leader walked into a hazard.
    ObstacleHit { damage: u32 },

    /// Award companion bond XP.
    IncreaseFriendship { amount: u32 },

    /// First meeting with the cat.
    RecruitCompanion,

    /// Begin a level run.
    SelectLevel { level_id: String, now: Duration },

    /// Finish a level run.
    CompleteLevel { level_id: String, now: Duration },

    /// Pick up a level power-up.
    CollectPowerUp { power_up_id: String, now: Duration },

    /// Something happened that objectives may count.
    RecordObjective { event: ObjectiveEvent, now: Duration },
}

/// The result of resolving an intent.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub effects: Vec<Effect>,
    pub narrative: String,
}

impl Resolution {
    pub fn new(narrative: impl Into<String>) -> Self {
        Self {
            effects: Vec::new(),
            narrative: narrative.into(),
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Audio cues carried by the effects, in order.
    pub fn audio(&self) -> impl Iterator<Item = AudioCue> + '_ {
        self.effects.iter().filter_map(|e| match e {
            Effect::Audio(cue) => Some(*cue),
            _ => None,
        })
    }
}

/// A concrete change to apply to the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    Log(String),
    SubscribersGained(u32),
    SubscribersSpent(u32),

    XpGained { member: EntityId, amount: u32 },
    /// Applied after `XpGained`: pays `max_xp` out of the XP pool.
    LeveledUp { member: EntityId, level_up: LevelUp },
    Healed { member: EntityId, amount: u32 },
    FullyHealed { member: EntityId },
    Damaged { member: EntityId, amount: u32 },
    StatRaised { member: EntityId, stat: Stat, value: u32 },
    SkillUnlocked { member: EntityId, skill: Skill, appended: bool },

    BondSet(Bond),
    CompanionJoined(Entity),

    ItemAdded(Item),
    ItemRemoved { index: usize },

    RoamingEnemySpawned(RoamingEnemy),
    /// Engaged on the map; it now lives in the combat encounter.
    RoamingEnemyRemoved { enemy_id: String },
    QuestCompleted { quest_id: String },
    QuestAdded(Quest),
    ActiveNpcSet(Option<String>),

    LevelStarted { level_id: String, at: Duration, spawn: Position },
    LevelCompleted { level_id: String, elapsed_secs: Option<u64> },
    LevelUnlocked { level_id: String },
    ObjectiveProgressed {
        level_id: String,
        objective_id: String,
        progress: u32,
        completed: bool,
    },
    PowerUpCollected { level_id: String, power_up_id: String },
    EffectStarted(ActiveEffect),

    AchievementProgressed { achievement_id: String, progress: u32 },
    AchievementUnlocked { achievement_id: String },

    ScreenChanged(Screen),
    CustomizationsSaved(Vec<Customization>),
    /// Forwarded to the audio sink; no world change.
    Audio(AudioCue),
}

/// Resolves intents into effects.
pub struct RulesEngine {
    rng: StdRng,
}

impl Default for RulesEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RulesEngine {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic engine for reproducible sessions.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Resolve an intent and produce effects.
    pub fn resolve(&mut self, world: &GameWorld, intent: Intent) -> Resolution {
        match intent {
            Intent::VictoryReward { enemy_xp } => self.resolve_victory(world, enemy_xp),
            Intent::UnlockSkill { member, skill_id } => {
                self.resolve_unlock_skill(world, &member, &skill_id)
            }
            Intent::UseItem { index, target } => self.resolve_use_item(world, index, target),
            Intent::BuyItem { item_id } => self.resolve_buy_item(world, &item_id),
            Intent::Rest => self.resolve_rest(world),
            Intent::ObstacleHit { damage } => self.resolve_obstacle_hit(world, damage),
            Intent::IncreaseFriendship { amount } => {
                let effects = friendship_effects(world, amount);
                if effects.is_empty() {
                    Resolution::new("No companion to bond with.")
                } else {
                    Resolution::new(format!("Bond +{amount} XP.")).with_effects(effects)
                }
            }
            Intent::RecruitCompanion => self.resolve_recruit(world),
            Intent::SelectLevel { level_id, now } => self.resolve_select_level(world, &level_id, now),
            Intent::CompleteLevel { level_id, now } => {
                self.resolve_complete_level(world, &level_id, now, true)
            }
            Intent::CollectPowerUp { power_up_id, now } => {
                self.resolve_collect_power_up(world, &power_up_id, now)
            }
            Intent::RecordObjective { event, now } => self.resolve_objective(world, &event, now),
        }
    }

    fn resolve_victory(&mut self, world: &GameWorld, enemy_xp: u32) -> Resolution {
        let subscribers = self.rng.gen_range(VICTORY_SUBSCRIBERS);
        let mut resolution = Resolution::new(format!(
            "Victory! Gained {enemy_xp} XP and {subscribers} Subs."
        ));

        for member in &world.party {
            resolution = resolution.with_effect(Effect::XpGained {
                member: member.id.clone(),
                amount: enemy_xp,
            });
            if let Some(level_up) = progression::award_xp(member, enemy_xp).level_up {
                resolution = resolution
                    .with_effect(Effect::LeveledUp {
                        member: member.id.clone(),
                        level_up,
                    })
                    .with_effect(Effect::Log(format!(
                        "{} reached level {}!",
                        member.name, level_up.new_level
                    )));
            }
        }

        resolution
            .with_effect(Effect::SubscribersGained(subscribers))
            .with_effect(Effect::RoamingEnemySpawned(catalog::random_roaming_enemy(
                &mut self.rng,
            )))
            .with_effects(friendship_effects(world, bond::VICTORY_BOND_XP))
            .with_effects(achievement_effects(world, catalog::ACH_FIRST_VICTORY, 1))
            .with_effect(Effect::Log(format!(
                "Victory! Gained {enemy_xp} XP and {subscribers} Subs."
            )))
    }

    fn resolve_unlock_skill(&self, world: &GameWorld, member: &EntityId, skill_id: &str) -> Resolution {
        let Some(entity) = world.member(member) else {
            tracing::debug!(%member, "unlock for unknown member");
            return Resolution::new(format!("No party member {member}."));
        };

        match progression::check_unlock(entity, skill_id) {
            Ok(unlock) => {
                let skill = unlock.skill().clone();
                let mut resolution = Resolution::new(format!(
                    "{} unlocked {}!",
                    entity.name, skill.name
                ))
                .with_effect(Effect::SkillUnlocked {
                    member: member.clone(),
                    skill: skill.clone(),
                    appended: matches!(unlock, SkillUnlock::Append(_)),
                })
                .with_effect(Effect::Log(format!("{} unlocked {}.", entity.name, skill.name)));

                if let Some(bonus) = skill.stat_bonus.filter(|_| skill.kind == SkillKind::Passive) {
                    resolution = resolution
                        .with_effect(Effect::StatRaised {
                            member: member.clone(),
                            stat: bonus.stat,
                            value: bonus.value,
                        })
                        .with_effect(Effect::Log(format!(
                            "{} gained +{} {}.",
                            entity.name, bonus.value, bonus.stat
                        )));
                }
                resolution
            }
            Err(denied) => {
                tracing::debug!(skill_id, ?denied, "skill unlock denied");
                Resolution::new(denied.describe(skill_id))
            }
        }
    }

    fn resolve_use_item(&self, world: &GameWorld, index: usize, target: Option<EntityId>) -> Resolution {
        let Some(item) = world.inventory.get(index) else {
            tracing::debug!(index, "no item at inventory index");
            return Resolution::new("Nothing in that slot.");
        };
        let target = target.unwrap_or_else(|| world.player().id.clone());
        if world.member(&target).is_none() {
            return Resolution::new(format!("No party member {target}."));
        }

        let (narrative, effect) = match progression::item_use(item) {
            ItemUse::Heal(amount) => (
                format!("Used {}. Restored {} HP.", item.name, amount),
                Some(Effect::Healed {
                    member: target.clone(),
                    amount,
                }),
            ),
            ItemUse::Raise(stat, value) => (
                format!("System Upgrade! {stat} increased by {value}."),
                Some(Effect::StatRaised {
                    member: target.clone(),
                    stat,
                    value,
                }),
            ),
            ItemUse::Nothing => (format!("Used {}. Nothing happened.", item.name), None),
        };

        Resolution::new(narrative.clone())
            .with_effects(effect)
            .with_effect(Effect::ItemRemoved { index })
            .with_effect(Effect::Log(narrative))
    }

    fn resolve_buy_item(&self, world: &GameWorld, item_id: &str) -> Resolution {
        let Some(item) = catalog::shop_item(item_id) else {
            return Resolution::new(format!("The shop doesn't stock {item_id}."));
        };
        if world.subscribers < item.cost {
            return Resolution::new(format!(
                "Not enough Subs for {}: need {}, have {}.",
                item.name, item.cost, world.subscribers
            ));
        }
        let line = format!("Purchased {} for {} Subs.", item.name, item.cost);
        Resolution::new(line.clone())
            .with_effect(Effect::SubscribersSpent(item.cost))
            .with_effect(Effect::ItemAdded(item.clone()))
            .with_effect(Effect::Log(line))
            .with_effect(Effect::Audio(AudioCue::Sfx(SoundEffect::Collect)))
    }

    fn resolve_rest(&self, world: &GameWorld) -> Resolution {
        let line = "System cache cleared. HP restored.";
        Resolution::new(line)
            .with_effects(world.party.iter().map(|m| Effect::FullyHealed {
                member: m.id.clone(),
            }))
            .with_effect(Effect::Log(line.to_string()))
    }

    fn resolve_obstacle_hit(&self, world: &GameWorld, damage: u32) -> Resolution {
        if crate::levels::shield_active(&world.active_effects) {
            return Resolution::new("The firewall shield absorbed the hit.");
        }
        let line = format!("Hit obstacle! -{damage} HP");
        Resolution::new(line.clone())
            .with_effect(Effect::Damaged {
                member: world.player().id.clone(),
                amount: damage,
            })
            .with_effect(Effect::Log(line))
            .with_effect(Effect::Audio(AudioCue::Sfx(SoundEffect::Damage)))
    }

    fn resolve_recruit(&self, world: &GameWorld) -> Resolution {
        if world.companion().is_some() {
            return Resolution::new("The Black Cat is already in your party.");
        }

        let quest = world.quest(catalog::FIRST_QUEST);
        let bond_xp = quest.and_then(|q| q.reward_bond_xp).unwrap_or(0);
        let subscribers = quest.map(|q| q.reward_subscribers).unwrap_or(0);

        let mut cat = catalog::black_cat();
        cat.bond = Some(bond::bond_from_reward(bond_xp));

        let mut resolution = Resolution::new(
            "The black cat looks at you. 'You look like a walking syntax error. \
             Want to team up and break some stuff?' (Companion Joined!)",
        )
        .with_effect(Effect::CompanionJoined(cat))
        .with_effect(Effect::QuestCompleted {
            quest_id: catalog::FIRST_QUEST.to_string(),
        });
        if world.quest(catalog::BOSS_QUEST).is_none() {
            resolution = resolution.with_effect(Effect::QuestAdded(catalog::boss_quest()));
        }
        resolution
            .with_effect(Effect::SubscribersGained(subscribers))
            .with_effect(Effect::ActiveNpcSet(Some(catalog::COMPANION_NPC.to_string())))
            .with_effect(Effect::Log(format!(
                "Joined by Black Cat. Gained {bond_xp} Friendship XP."
            )))
    }

    fn resolve_select_level(&self, world: &GameWorld, level_id: &str, now: Duration) -> Resolution {
        let Some(level) = world.level(level_id) else {
            return Resolution::new(format!("No level called {level_id}."));
        };
        if !level.unlocked {
            tracing::debug!(level_id, "level is locked");
            return Resolution::new(format!("{} is still locked.", level.name));
        }
        Resolution::new(format!("Loading {}...", level.name))
            .with_effect(Effect::Audio(AudioCue::Sfx(SoundEffect::MenuSelect)))
            .with_effect(Effect::Audio(AudioCue::Music(level.theme.music())))
            .with_effect(Effect::LevelStarted {
                level_id: level.id.clone(),
                at: now,
                spawn: level.spawn,
            })
            .with_effect(Effect::ScreenChanged(Screen::Exploration))
            .with_effect(Effect::Log(format!("Entered {}.", level.name)))
    }

    /// `paid` is false when the completion came from the boss falling, which
    /// never pays out.
    fn resolve_complete_level(
        &self,
        world: &GameWorld,
        level_id: &str,
        now: Duration,
        paid: bool,
    ) -> Resolution {
        let Some(index) = world.levels.iter().position(|l| l.id == level_id) else {
            return Resolution::new(format!("No level called {level_id}."));
        };
        let level = &world.levels[index];

        let elapsed_secs = (world.current_level.as_deref() == Some(level_id))
            .then_some(world.level_started_at)
            .flatten()
            .map(|start| now.saturating_sub(start).as_secs());

        let mut resolution = Resolution::new(format!("{} complete!", level.name))
            .with_effect(Effect::Audio(AudioCue::Sfx(SoundEffect::LevelComplete)))
            .with_effect(Effect::LevelCompleted {
                level_id: level.id.clone(),
                elapsed_secs,
            });
        if let Some(next) = world.levels.get(index + 1) {
            if !next.unlocked {
                resolution = resolution
                    .with_effect(Effect::LevelUnlocked {
                        level_id: next.id.clone(),
                    })
                    .with_effect(Effect::Log(format!("{} unlocked.", next.name)));
            }
        }

        let completed = world
            .levels
            .iter()
            .filter(|l| l.completed || l.id == level_id)
            .count() as u32;

        resolution = if paid {
            resolution
                .with_effect(Effect::SubscribersGained(progression::LEVEL_COMPLETE_REWARD))
                .with_effect(Effect::Log(format!(
                    "{} complete! +{} Subs.",
                    level.name,
                    progression::LEVEL_COMPLETE_REWARD
                )))
        } else {
            resolution.with_effect(Effect::Log(format!("{} complete!", level.name)))
        };

        resolution
            .with_effects(achievement_effects(world, catalog::ACH_FIRST_LEVEL, completed))
            .with_effects(achievement_effects(world, catalog::ACH_ALL_LEVELS, completed))
    }

    fn resolve_collect_power_up(&self, world: &GameWorld, power_up_id: &str, now: Duration) -> Resolution {
        let Some(level) = world.current_level() else {
            return Resolution::new("No level in progress.");
        };
        let Some(power_up) = level.power_up(power_up_id).filter(|p| !p.collected) else {
            tracing::debug!(power_up_id, "power-up missing or already collected");
            return Resolution::new("Nothing to collect.");
        };

        let collector = world
            .achievement(catalog::ACH_COLLECTOR)
            .map(|a| a.progress + 1)
            .unwrap_or(0);

        Resolution::new(format!("Collected {}!", power_up.kind.name()))
            .with_effect(Effect::PowerUpCollected {
                level_id: level.id.clone(),
                power_up_id: power_up.id.clone(),
            })
            .with_effect(Effect::EffectStarted(ActiveEffect {
                kind: power_up.kind,
                ends_at: now + power_up.duration,
                value: power_up.value,
            }))
            .with_effect(Effect::Audio(AudioCue::Sfx(SoundEffect::PowerUp)))
            .with_effect(Effect::Log(format!("Collected {}.", power_up.kind.name())))
            .with_effects(achievement_effects(world, catalog::ACH_COLLECTOR, collector))
            .with_effects(
                self.resolve_objective(world, &ObjectiveEvent::PowerUpCollected, now)
                    .effects,
            )
    }

    /// Advance matching objectives of the current level. When this finishes
    /// the last open objective the level completes too.
    fn resolve_objective(&self, world: &GameWorld, event: &ObjectiveEvent, now: Duration) -> Resolution {
        let Some(level) = world.current_level() else {
            return Resolution::new("No level in progress.");
        };
        if level.completed && level.objectives.iter().all(|o| o.completed) {
            return Resolution::new("Level already complete.");
        }

        let mut resolution = Resolution::new("Objectives updated.");
        let mut all_done = true;
        for objective in &level.objectives {
            if objective.completed {
                continue;
            }
            if !objective.matches(event) {
                all_done = false;
                continue;
            }
            let progress = objective.next_progress();
            let completed = progress >= objective.target;
            all_done &= completed;
            resolution = resolution.with_effect(Effect::ObjectiveProgressed {
                level_id: level.id.clone(),
                objective_id: objective.id.clone(),
                progress,
                completed,
            });
            if completed {
                resolution = resolution
                    .with_effect(Effect::Log(format!("Objective complete: {}", objective.description)));
            }
        }

        if resolution.is_empty() {
            return Resolution::new("No objective affected.");
        }
        if all_done {
            let paid = *event != ObjectiveEvent::BossDefeated;
            let completion = self.resolve_complete_level(world, &level.id, now, paid);
            resolution = resolution.with_effects(completion.effects);
        }
        resolution
    }
}

/// Bond award effects, including the level-up log and the bond achievement.
pub fn friendship_effects(world: &GameWorld, amount: u32) -> Vec<Effect> {
    let Some(bond) = world.companion().and_then(|c| c.bond) else {
        return Vec::new();
    };
    let change: BondChange = bond::increase_friendship(bond, amount);
    let mut effects = vec![Effect::BondSet(change.after)];
    if let Some(line) = change.log_line() {
        effects.push(Effect::Log(line));
        effects.extend(achievement_effects(
            world,
            catalog::ACH_BEST_FRIENDS,
            change.after.level,
        ));
    }
    effects
}

/// Move an achievement to `progress` (capped at its target) and unlock it
/// when reached. Unlocked achievements never change again.
pub fn achievement_effects(world: &GameWorld, achievement_id: &str, progress: u32) -> Vec<Effect> {
    let Some(achievement) = world.achievement(achievement_id) else {
        return Vec::new();
    };
    if achievement.unlocked {
        return Vec::new();
    }
    let progress = progress.min(achievement.target);
    let mut effects = Vec::new();
    if progress != achievement.progress {
        effects.push(Effect::AchievementProgressed {
            achievement_id: achievement.id.clone(),
            progress,
        });
    }
    if progress >= achievement.target {
        effects.push(Effect::AchievementUnlocked {
            achievement_id: achievement.id.clone(),
        });
        effects.push(Effect::Log(format!("Achievement unlocked: {}", achievement.name)));
        effects.push(Effect::Audio(AudioCue::Sfx(SoundEffect::Achievement)));
    }
    effects
}

/// Apply effects to the game world.
pub fn apply_effects(world: &mut GameWorld, effects: &[Effect]) {
    for effect in effects {
        apply_effect(world, effect);
    }
}

/// Apply a single effect to the game world.
pub fn apply_effect(world: &mut GameWorld, effect: &Effect) {
    match effect {
        Effect::Log(line) => world.push_log(line.clone()),
        Effect::SubscribersGained(amount) => {
            world.subscribers = world.subscribers.saturating_add(*amount);
        }
        Effect::SubscribersSpent(amount) => {
            world.subscribers = world.subscribers.saturating_sub(*amount);
        }
        Effect::XpGained { member, amount } => {
            if let Some(entity) = world.member_mut(member) {
                entity.xp = entity.xp.saturating_add(*amount);
            }
        }
        Effect::LeveledUp { member, level_up } => {
            if let Some(entity) = world.member_mut(member) {
                entity.level = level_up.new_level;
                entity.xp = level_up.carried_xp;
                entity.max_xp = level_up.new_max_xp;
                entity.hit_points.raise_maximum(progression::LEVEL_UP_HP);
                entity.attack = entity.attack.saturating_add(progression::LEVEL_UP_ATTACK);
                entity.hit_points.restore_full();
                tracing::info!(member = %entity.id, level = entity.level, "level up");
            }
        }
        Effect::Healed { member, amount } => {
            if let Some(entity) = world.member_mut(member) {
                entity.hit_points.heal(*amount);
            }
        }
        Effect::FullyHealed { member } => {
            if let Some(entity) = world.member_mut(member) {
                entity.hit_points.restore_full();
            }
        }
        Effect::Damaged { member, amount } => {
            if let Some(entity) = world.member_mut(member) {
                entity.hit_points.take_damage(*amount);
            }
        }
        Effect::StatRaised {
            member,
            stat,
            value,
        } => {
            if let Some(entity) = world.member_mut(member) {
                match stat {
                    Stat::Hp => entity.hit_points.raise_maximum(*value),
                    Stat::Attack => entity.attack = entity.attack.saturating_add(*value),
                    Stat::Defense => entity.defense = entity.defense.saturating_add(*value),
                }
            }
        }
        Effect::SkillUnlocked {
            member,
            skill,
            appended,
        } => {
            if let Some(entity) = world.member_mut(member) {
                if *appended {
                    entity.skills.push(skill.clone());
                } else if let Some(existing) = entity.skills.iter_mut().find(|s| s.id == skill.id) {
                    existing.unlocked = true;
                }
                tracing::info!(member = %entity.id, skill = %skill.id, "skill unlocked");
            }
        }
        Effect::BondSet(bond) => {
            if let Some(companion) = world.companion_mut() {
                companion.bond = Some(*bond);
            }
        }
        Effect::CompanionJoined(companion) => {
            if world.companion().is_none() {
                world.party.push(companion.clone());
            }
        }
        Effect::ItemAdded(item) => world.inventory.push(item.clone()),
        Effect::ItemRemoved { index } => {
            if *index < world.inventory.len() {
                world.inventory.remove(*index);
            }
        }
        Effect::RoamingEnemySpawned(enemy) => world.roaming_enemies.push(enemy.clone()),
        Effect::RoamingEnemyRemoved { enemy_id } => {
            world.roaming_enemies.retain(|e| &e.id != enemy_id);
        }
        Effect::QuestCompleted { quest_id } => {
            if let Some(quest) = world.quests.iter_mut().find(|q| &q.id == quest_id) {
                quest.completed = true;
            }
        }
        Effect::QuestAdded(quest) => {
            if world.quest(&quest.id).is_none() {
                world.quests.push(quest.clone());
            }
        }
        Effect::ActiveNpcSet(npc) => world.active_npc = npc.clone(),
        Effect::LevelStarted {
            level_id,
            at,
            spawn,
        } => {
            if let Some(level) = world.levels.iter_mut().find(|l| &l.id == level_id) {
                // A fresh run: objectives and pickups reset, completion stays
                for objective in &mut level.objectives {
                    objective.progress = 0;
                    objective.completed = false;
                }
                for power_up in &mut level.power_ups {
                    power_up.collected = false;
                }
            }
            world.current_level = Some(level_id.clone());
            world.level_started_at = Some(*at);
            world.player_position = *spawn;
        }
        Effect::LevelCompleted {
            level_id,
            elapsed_secs,
        } => {
            if let Some(level) = world.levels.iter_mut().find(|l| &l.id == level_id) {
                level.completed = true;
                if let Some(secs) = elapsed_secs {
                    level.best_time = Some(level.best_time.map_or(*secs, |best| best.min(*secs)));
                }
                tracing::info!(level = %level.id, "level complete");
            }
        }
        Effect::LevelUnlocked { level_id } => {
            if let Some(level) = world.levels.iter_mut().find(|l| &l.id == level_id) {
                level.unlocked = true;
            }
        }
        Effect::ObjectiveProgressed {
            level_id,
            objective_id,
            progress,
            completed,
        } => {
            if let Some(objective) = world
                .levels
                .iter_mut()
                .find(|l| &l.id == level_id)
                .and_then(|l| l.objectives.iter_mut().find(|o| &o.id == objective_id))
            {
                objective.progress = *progress;
                objective.completed = *completed;
            }
        }
        Effect::PowerUpCollected {
            level_id,
            power_up_id,
        } => {
            if let Some(power_up) = world
                .levels
                .iter_mut()
                .find(|l| &l.id == level_id)
                .and_then(|l| l.power_ups.iter_mut().find(|p| &p.id == power_up_id))
            {
                power_up.collected = true;
            }
        }
        Effect::EffectStarted(active) => world.active_effects.push(*active),
        Effect::AchievementProgressed {
            achievement_id,
            progress,
        } => {
            if let Some(a) = world.achievements.iter_mut().find(|a| &a.id == achievement_id) {
                a.progress = *progress;
            }
        }
        Effect::AchievementUnlocked { achievement_id } => {
            if let Some(a) = world.achievements.iter_mut().find(|a| &a.id == achievement_id) {
                a.unlocked = true;
                a.progress = a.progress.max(a.target);
                tracing::info!(achievement = %a.id, "achievement unlocked");
            }
        }
        Effect::ScreenChanged(screen) => {
            tracing::info!(from = ?world.screen, to = ?screen, "screen change");
            world.screen = *screen;
        }
        Effect::CustomizationsSaved(customizations) => {
            world.customizations = customizations.clone();
        }
        Effect::Audio(_) => {}
    }
}
