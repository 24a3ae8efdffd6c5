//! Turn-based combat.
//!
//! A fight is an explicit phase machine:
//!
//! ```text
//! PlayerTurn -> CompanionTurn (companion alive) -> EnemyTurn -> PlayerTurn
//!            \-> Victory                        \-> Defeat
//! ```
//!
//! The player's action resolves immediately. Everything after it is stepped
//! with [`CombatEncounter::advance`], so the caller decides pacing and the
//! rules never depend on timers. The party is the world party, borrowed for
//! each step, so HP changes persist after the fight.

use crate::banter::{self, BanterTrigger};
use crate::world::{Entity, EntityKind, SkillKind};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Entries kept in the combat log.
pub const COMBAT_LOG_CAPACITY: usize = 5;
/// Heal amount for a heal skill that doesn't specify one.
pub const DEFAULT_HEAL: u32 = 20;
/// Base damage for an attack skill that doesn't specify one.
pub const DEFAULT_DAMAGE: u32 = 10;
/// Companion heals the player below this HP ratio.
pub const COMPANION_HEAL_THRESHOLD: f32 = 0.4;
/// Companion prefers a team attack against enemies above this HP.
pub const TEAM_ATTACK_HP: u32 = 100;
/// Chance the companion uses its buff when nothing more urgent applies.
pub const COMPANION_BUFF_CHANCE: f64 = 0.3;
/// Flat defense reduction from the companion's buff.
pub const BUFF_DEFENSE_REDUCTION: u32 = 2;
/// Low HP banter below this ratio.
pub const LOW_HP_THRESHOLD: f32 = 0.3;
/// Synergy damage per bond level for team skills.
pub const SYNERGY_PER_BOND_LEVEL: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatPhase {
    PlayerTurn,
    CompanionTurn,
    EnemyTurn,
    Victory,
    Defeat,
}

impl CombatPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CombatPhase::Victory | CombatPhase::Defeat)
    }
}

/// Why a player action was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IgnoreReason {
    NotPlayerTurn,
    ActionInFlight,
    NoSuchMember,
    MemberDown,
    SkillUnavailable,
}

/// Something that happened during a combat step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CombatEvent {
    SkillUsed {
        actor: String,
        skill: String,
    },
    Damage {
        attacker: String,
        target: String,
        amount: u32,
        ignored_defense: bool,
        synergy_bonus: u32,
    },
    Healed {
        source: String,
        target: String,
        amount: u32,
    },
    DefenseLowered {
        target: String,
        new_defense: u32,
    },
    Banter(String),
    PhaseChanged(CombatPhase),
}

/// Result of submitting a player action.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Accepted(Vec<CombatEvent>),
    Ignored(IgnoreReason),
}

impl Submission {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Submission::Accepted(_))
    }

    pub fn events(&self) -> &[CombatEvent] {
        match self {
            Submission::Accepted(events) => events,
            Submission::Ignored(_) => &[],
        }
    }
}

/// Damage from one hit before it is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageRoll {
    pub amount: u32,
    pub ignored_defense: bool,
    pub synergy_bonus: u32,
}

/// `max(1, attack + base - defense)`.
pub fn damage_formula(attack: u32, base: u32, defense: u32) -> u32 {
    attack.saturating_add(base).saturating_sub(defense).max(1)
}

/// Damage for `attacker` using a damaging skill against `defender`.
pub fn skill_damage(
    attacker: &Entity,
    damage: Option<u32>,
    kind: SkillKind,
    ignores_defense: bool,
    defender: &Entity,
) -> DamageRoll {
    let defense = if ignores_defense { 0 } else { defender.defense };
    let base = damage_formula(attacker.attack, damage.unwrap_or(DEFAULT_DAMAGE), defense);
    let synergy_bonus = match (kind, attacker.bond) {
        (SkillKind::Team, Some(bond)) => bond.level * SYNERGY_PER_BOND_LEVEL,
        _ => 0,
    };
    DamageRoll {
        amount: base + synergy_bonus,
        ignored_defense: ignores_defense,
        synergy_bonus,
    }
}

/// What the companion decided to do on its turn.
#[derive(Debug, Clone, PartialEq)]
pub enum CompanionMove {
    /// Heal a party member (index into the party).
    Heal { skill: usize, target: usize },
    /// Lower enemy defense.
    Buff { skill: usize },
    /// Hit the enemy.
    Attack { skill: usize },
}

/// Companion decision policy, in strict priority order:
/// heal a low player, team attack a big enemy, occasionally buff,
/// otherwise a random unlocked attack (or the first skill).
pub fn choose_companion_move<R: Rng>(
    party: &[Entity],
    companion: usize,
    enemy: &Entity,
    rng: &mut R,
) -> Option<CompanionMove> {
    let actor = party.get(companion)?;
    let player = party.iter().position(|e| e.kind == EntityKind::Player);
    let player_low = player
        .and_then(|i| party.get(i))
        .map(|p| p.hit_points.ratio() < COMPANION_HEAL_THRESHOLD)
        .unwrap_or(false);

    let unlocked_of = |kind: SkillKind| {
        actor
            .skills
            .iter()
            .position(|s| s.unlocked && s.kind == kind)
    };

    if player_low {
        if let (Some(skill), Some(target)) = (unlocked_of(SkillKind::Heal), player) {
            return Some(CompanionMove::Heal { skill, target });
        }
    }
    if enemy.hit_points.current > TEAM_ATTACK_HP {
        if let Some(skill) = unlocked_of(SkillKind::Team) {
            return Some(CompanionMove::Attack { skill });
        }
    }
    if let Some(skill) = unlocked_of(SkillKind::Buff) {
        if rng.gen_bool(COMPANION_BUFF_CHANCE) {
            return Some(CompanionMove::Buff { skill });
        }
    }

    let attacks: Vec<usize> = actor
        .skills
        .iter()
        .enumerate()
        .filter(|(_, s)| s.unlocked && s.kind == SkillKind::Attack)
        .map(|(i, _)| i)
        .collect();
    let skill = match attacks.choose(rng) {
        Some(&i) => i,
        None if !actor.skills.is_empty() => 0,
        None => return None,
    };

    // The first-skill fallback can land on any kind
    Some(match actor.skills[skill].kind {
        SkillKind::Heal => CompanionMove::Heal {
            skill,
            target: companion,
        },
        SkillKind::Buff => CompanionMove::Buff { skill },
        _ => CompanionMove::Attack { skill },
    })
}

/// State of one fight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatEncounter {
    pub enemy: Entity,
    pub phase: CombatPhase,
    /// Most recent first.
    pub log: VecDeque<String>,
    pub round: u32,
    in_flight: bool,
}

impl CombatEncounter {
    pub fn new(enemy: Entity) -> Self {
        let mut encounter = Self {
            enemy,
            phase: CombatPhase::PlayerTurn,
            log: VecDeque::new(),
            round: 1,
            in_flight: false,
        };
        encounter.push_log(format!("{} appeared!", encounter.enemy.name));
        encounter
    }

    pub fn is_boss(&self) -> bool {
        self.enemy.kind == EntityKind::Boss
    }

    pub fn is_over(&self) -> bool {
        self.phase.is_terminal()
    }

    pub fn action_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Whether a player action would currently be considered.
    pub fn accepts_actions(&self) -> bool {
        self.phase == CombatPhase::PlayerTurn && !self.in_flight
    }

    fn push_log(&mut self, message: impl Into<String>) {
        self.log.push_front(message.into());
        self.log.truncate(COMBAT_LOG_CAPACITY);
    }

    /// Resolve a party member's skill during the player turn.
    pub fn player_action<R: Rng>(
        &mut self,
        party: &mut [Entity],
        member: usize,
        skill_id: &str,
        rng: &mut R,
    ) -> Submission {
        if self.phase != CombatPhase::PlayerTurn {
            return Submission::Ignored(IgnoreReason::NotPlayerTurn);
        }
        if self.in_flight {
            return Submission::Ignored(IgnoreReason::ActionInFlight);
        }
        let Some(actor) = party.get(member) else {
            return Submission::Ignored(IgnoreReason::NoSuchMember);
        };
        if !actor.is_alive() {
            return Submission::Ignored(IgnoreReason::MemberDown);
        }
        let Some(skill) = actor.skill(skill_id).filter(|s| s.unlocked).cloned() else {
            return Submission::Ignored(IgnoreReason::SkillUnavailable);
        };

        self.in_flight = true;
        let bond_level = bond_level(party);
        let mut events = Vec::new();

        let actor_name = party[member].name.clone();
        self.push_log(format!("{} used {}!", actor_name, skill.name));
        events.push(CombatEvent::SkillUsed {
            actor: actor_name.clone(),
            skill: skill.name.clone(),
        });

        match skill.kind {
            SkillKind::Heal => {
                let restored = party[member]
                    .hit_points
                    .heal(skill.heal.unwrap_or(DEFAULT_HEAL));
                self.push_log(format!("Recovered {restored} HP."));
                events.push(CombatEvent::Healed {
                    source: actor_name.clone(),
                    target: actor_name,
                    amount: restored,
                });
                self.trigger_banter(BanterTrigger::Heal, bond_level, rng, &mut events);
            }
            // Anything that is not a heal hits, passives included
            SkillKind::Attack
            | SkillKind::Passive
            | SkillKind::Buff
            | SkillKind::Ultimate
            | SkillKind::Team => {
                let roll = skill_damage(
                    &party[member],
                    skill.damage,
                    skill.kind,
                    skill.ignores_defense,
                    &self.enemy,
                );
                if roll.ignored_defense {
                    self.push_log("DEFENSE IGNORED. CRITICAL ERROR INJECTED.");
                    self.trigger_banter(BanterTrigger::Crit, bond_level, rng, &mut events);
                }
                self.hit_enemy(&actor_name, roll, &mut events);
            }
        }

        let next = if !self.enemy.is_alive() {
            CombatPhase::Victory
        } else if party
            .iter()
            .any(|e| e.kind == EntityKind::Companion && e.is_alive())
        {
            CombatPhase::CompanionTurn
        } else {
            CombatPhase::EnemyTurn
        };
        self.transition(next, party, bond_level, rng, &mut events);
        Submission::Accepted(events)
    }

    /// Step the automated phases once. No-op on the player turn and after
    /// the fight ends.
    pub fn advance<R: Rng>(&mut self, party: &mut [Entity], rng: &mut R) -> Vec<CombatEvent> {
        let bond_level = bond_level(party);
        let mut events = Vec::new();
        match self.phase {
            CombatPhase::CompanionTurn => {
                self.companion_turn(party, rng, bond_level, &mut events);
                let next = if self.enemy.is_alive() {
                    CombatPhase::EnemyTurn
                } else {
                    CombatPhase::Victory
                };
                self.transition(next, party, bond_level, rng, &mut events);
            }
            CombatPhase::EnemyTurn => {
                self.enemy_turn(party, rng, &mut events);
                let next = if party.iter().all(|e| !e.is_alive()) {
                    CombatPhase::Defeat
                } else {
                    self.round += 1;
                    CombatPhase::PlayerTurn
                };
                self.transition(next, party, bond_level, rng, &mut events);
            }
            CombatPhase::PlayerTurn | CombatPhase::Victory | CombatPhase::Defeat => {
                tracing::debug!(phase = ?self.phase, "advance ignored");
            }
        }
        events
    }

    /// Advance until control returns to the player or the fight ends.
    pub fn run_until_player<R: Rng>(
        &mut self,
        party: &mut [Entity],
        rng: &mut R,
    ) -> Vec<CombatEvent> {
        let mut events = Vec::new();
        while matches!(self.phase, CombatPhase::CompanionTurn | CombatPhase::EnemyTurn) {
            events.extend(self.advance(party, rng));
        }
        events
    }

    fn companion_turn<R: Rng>(
        &mut self,
        party: &mut [Entity],
        rng: &mut R,
        bond_level: u32,
        events: &mut Vec<CombatEvent>,
    ) {
        let Some(companion) = party
            .iter()
            .position(|e| e.kind == EntityKind::Companion && e.is_alive())
        else {
            return;
        };
        let Some(choice) = choose_companion_move(party, companion, &self.enemy, rng) else {
            return;
        };
        let companion_name = party[companion].name.clone();

        match choice {
            CompanionMove::Heal { skill, target } => {
                let skill = party[companion].skills[skill].clone();
                let restored = party[target]
                    .hit_points
                    .heal(skill.heal.unwrap_or(DEFAULT_HEAL));
                let target_name = party[target].name.clone();
                self.push_log(format!(
                    "{} uses {} on {}! (+{} HP)",
                    companion_name, skill.name, target_name, restored
                ));
                events.push(CombatEvent::Healed {
                    source: companion_name,
                    target: target_name,
                    amount: restored,
                });
                self.trigger_banter(BanterTrigger::Heal, bond_level, rng, events);
            }
            CompanionMove::Buff { skill } => {
                let skill_name = party[companion].skills[skill].name.clone();
                self.enemy.defense = self.enemy.defense.saturating_sub(BUFF_DEFENSE_REDUCTION);
                self.push_log(format!(
                    "{} uses {}! Enemy Defense weakened.",
                    companion_name, skill_name
                ));
                events.push(CombatEvent::DefenseLowered {
                    target: self.enemy.name.clone(),
                    new_defense: self.enemy.defense,
                });
            }
            CompanionMove::Attack { skill } => {
                let skill = party[companion].skills[skill].clone();
                let roll = skill_damage(
                    &party[companion],
                    skill.damage,
                    skill.kind,
                    skill.ignores_defense,
                    &self.enemy,
                );
                self.push_log(format!("{} used {}!", companion_name, skill.name));
                events.push(CombatEvent::SkillUsed {
                    actor: companion_name.clone(),
                    skill: skill.name,
                });
                self.hit_enemy(&companion_name, roll, events);
            }
        }
    }

    fn enemy_turn<R: Rng>(&mut self, party: &mut [Entity], rng: &mut R, events: &mut Vec<CombatEvent>) {
        let living: Vec<usize> = party
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_alive())
            .map(|(i, _)| i)
            .collect();
        let Some(&target) = living.choose(rng) else {
            return;
        };

        let amount = damage_formula(self.enemy.attack, 0, party[target].defense);
        party[target].hit_points.take_damage(amount);
        let target_name = party[target].name.clone();
        self.push_log(format!(
            "{} attacks {} for {} damage!",
            self.enemy.name, target_name, amount
        ));
        events.push(CombatEvent::Damage {
            attacker: self.enemy.name.clone(),
            target: target_name,
            amount,
            ignored_defense: false,
            synergy_bonus: 0,
        });
    }

    fn hit_enemy(&mut self, attacker: &str, roll: DamageRoll, events: &mut Vec<CombatEvent>) {
        if roll.synergy_bonus > 0 {
            self.push_log(format!("Synergy Bonus! +{} dmg.", roll.synergy_bonus));
        }
        self.enemy.hit_points.take_damage(roll.amount);
        self.push_log(format!("Dealt {} damage to {}!", roll.amount, self.enemy.name));
        events.push(CombatEvent::Damage {
            attacker: attacker.to_string(),
            target: self.enemy.name.clone(),
            amount: roll.amount,
            ignored_defense: roll.ignored_defense,
            synergy_bonus: roll.synergy_bonus,
        });
    }

    fn transition<R: Rng>(
        &mut self,
        next: CombatPhase,
        party: &[Entity],
        bond_level: u32,
        rng: &mut R,
        events: &mut Vec<CombatEvent>,
    ) {
        tracing::debug!(from = ?self.phase, to = ?next, "combat phase");
        self.phase = next;
        events.push(CombatEvent::PhaseChanged(next));

        match next {
            CombatPhase::PlayerTurn => {
                self.in_flight = false;
                let player_low = party
                    .first()
                    .map(|p| p.hit_points.ratio() < LOW_HP_THRESHOLD)
                    .unwrap_or(false);
                if player_low {
                    self.trigger_banter(BanterTrigger::LowHp, bond_level, rng, events);
                }
            }
            CombatPhase::Victory => {
                self.in_flight = false;
                self.push_log(format!("{} has been deleted!", self.enemy.name));
                self.trigger_banter(BanterTrigger::Victory, bond_level, rng, events);
            }
            CombatPhase::Defeat => {
                self.in_flight = false;
                self.push_log("The party has crashed.");
            }
            CombatPhase::CompanionTurn | CombatPhase::EnemyTurn => {}
        }
    }

    fn trigger_banter<R: Rng>(
        &mut self,
        trigger: BanterTrigger,
        bond_level: u32,
        rng: &mut R,
        events: &mut Vec<CombatEvent>,
    ) {
        if let Some(text) = banter::combat_banter(trigger, bond_level, rng) {
            events.push(CombatEvent::Banter(text.to_string()));
        }
    }
}

fn bond_level(party: &[Entity]) -> u32 {
    party
        .iter()
        .find(|e| e.kind == EntityKind::Companion)
        .and_then(|c| c.bond_level())
        .unwrap_or(0)
}
