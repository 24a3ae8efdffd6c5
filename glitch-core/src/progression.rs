//! Character growth: experience curve, skill unlock gating and item effects.
//!
//! Pure checks over entities. The rules engine turns their answers into
//! effects.

use crate::catalog;
use crate::world::{Entity, Item, ItemKind, Skill, Stat};
use serde::{Deserialize, Serialize};

/// Max HP gained per character level.
pub const LEVEL_UP_HP: u32 = 20;
/// Attack gained per character level.
pub const LEVEL_UP_ATTACK: u32 = 5;
/// Currency for completing a level.
pub const LEVEL_COMPLETE_REWARD: u32 = 500;

/// What an XP award does to an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpAward {
    pub gained: u32,
    /// Set when the award crosses `max_xp`. At most one level per award.
    pub level_up: Option<LevelUp>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelUp {
    pub new_level: u32,
    /// XP left after paying for the level.
    pub carried_xp: u32,
    pub new_max_xp: u32,
}

/// Next `max_xp`: ×1.5, floored.
pub fn next_max_xp(max_xp: u32) -> u32 {
    max_xp.saturating_add(max_xp / 2)
}

pub fn award_xp(entity: &Entity, amount: u32) -> XpAward {
    let total = entity.xp.saturating_add(amount);
    let level_up = (entity.max_xp > 0 && total >= entity.max_xp).then(|| LevelUp {
        new_level: entity.level + 1,
        carried_xp: total - entity.max_xp,
        new_max_xp: next_max_xp(entity.max_xp),
    });
    XpAward {
        gained: amount,
        level_up,
    }
}

/// Why a skill cannot be unlocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnlockDenied {
    UnknownSkill,
    AlreadyUnlocked,
    LevelTooLow { required: u32, current: u32 },
    PreviousLocked { previous: String },
}

impl UnlockDenied {
    pub fn describe(&self, skill_id: &str) -> String {
        match self {
            UnlockDenied::UnknownSkill => format!("No skill called {skill_id}."),
            UnlockDenied::AlreadyUnlocked => format!("{skill_id} is already unlocked."),
            UnlockDenied::LevelTooLow { required, current } => {
                format!("{skill_id} requires level {required} (currently {current}).")
            }
            UnlockDenied::PreviousLocked { previous } => {
                format!("Unlock {previous} before {skill_id}.")
            }
        }
    }
}

/// How an allowed unlock lands on the entity.
#[derive(Debug, Clone, PartialEq)]
pub enum SkillUnlock {
    /// The entity already carries the skill; flip it on.
    Flip(Skill),
    /// Append an unlocked copy from the skill path.
    Append(Skill),
}

impl SkillUnlock {
    pub fn skill(&self) -> &Skill {
        match self {
            SkillUnlock::Flip(skill) | SkillUnlock::Append(skill) => skill,
        }
    }
}

/// Check whether `entity` may unlock `skill_id` now.
pub fn check_unlock(entity: &Entity, skill_id: &str) -> Result<SkillUnlock, UnlockDenied> {
    let path = catalog::skill_path(entity.kind);
    let unlock = match entity.skill(skill_id) {
        Some(skill) if skill.unlocked => return Err(UnlockDenied::AlreadyUnlocked),
        Some(skill) => SkillUnlock::Flip(skill.clone()),
        None => match path.iter().find(|s| s.id == skill_id) {
            Some(skill) => SkillUnlock::Append(Skill {
                unlocked: true,
                ..skill.clone()
            }),
            None => return Err(UnlockDenied::UnknownSkill),
        },
    };

    let required = unlock.skill().required_level;
    let current = entity.unlock_level();
    if current < required {
        return Err(UnlockDenied::LevelTooLow { required, current });
    }

    if let Some(index) = path.iter().position(|s| s.id == skill_id) {
        if let Some(previous) = index.checked_sub(1).and_then(|i| path.get(i)) {
            if !entity.has_unlocked(&previous.id) {
                return Err(UnlockDenied::PreviousLocked {
                    previous: previous.id.clone(),
                });
            }
        }
    }

    Ok(unlock)
}

/// What using an item does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemUse {
    Heal(u32),
    Raise(Stat, u32),
    /// Consumable with no HP effect, or an upgrade with no stat.
    Nothing,
}

pub fn item_use(item: &Item) -> ItemUse {
    match (item.kind, item.stat) {
        (ItemKind::Consumable, Some(Stat::Hp)) => ItemUse::Heal(item.effect_value),
        (ItemKind::Upgrade, Some(stat @ (Stat::Attack | Stat::Defense))) => {
            ItemUse::Raise(stat, item.effect_value)
        }
        _ => ItemUse::Nothing,
    }
}
