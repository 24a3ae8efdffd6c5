//! Flavor lines between the bot and the cat.
//!
//! Lines carry a minimum bond level. Without a companion the effective
//! bond level is 0, so only the neutral lines can show.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Chance that a combat trigger actually produces a line.
pub const COMBAT_BANTER_CHANCE: f64 = 0.5;
/// Chance per roll that an exploration line shows.
pub const EXPLORATION_BANTER_CHANCE: f64 = 0.2;
/// Time between exploration rolls.
pub const EXPLORATION_BANTER_INTERVAL: Duration = Duration::from_secs(10);
pub const COMBAT_BANTER_DURATION: Duration = Duration::from_secs(3);
pub const EXPLORATION_BANTER_DURATION: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BanterLine {
    pub text: &'static str,
    pub required_level: u32,
}

const fn line(text: &'static str, required_level: u32) -> BanterLine {
    BanterLine {
        text,
        required_level,
    }
}

/// Combat moments that can prompt a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BanterTrigger {
    Heal,
    /// A hit that ignored the target's defense.
    Crit,
    LowHp,
    Victory,
}

lazy_static::lazy_static! {
    pub static ref EXPLORATION_BANTER: Vec<BanterLine> = vec![
        line("Black Cat: 'You walk like a GPU with outdated drivers.'", 0),
        line("Bot: 'Parsing environment... smells like burnt pixels.'", 0),
        line("Black Cat: 'I bet the Algorithm King is just a script kiddie.'", 0),
        line("Black Cat: 'Meow. (That means hurry up.)'", 0),
        line("Bot: 'My logic circuits suggest we are lost.'", 0),
        line("Black Cat: 'Try not to pixelate, glitchy.'", 0),
        line("Black Cat: 'Can we stop for a RAM snack?'", 1),
        line("Bot: 'Detecting high levels of cringe in the area.'", 1),
        line("Black Cat: 'Your textures are clipping again. It's kinda cool.'", 1),
        line("Black Cat: 'Hey... thanks for watching my back earlier.'", 2),
        line("Bot: 'Friendship subroutine executing... results: pleasant.'", 2),
        line("Black Cat: 'You're not so bad for a bucket of bolts.'", 2),
        line("Black Cat: 'The King hates chaotic data. We should keep being weird.'", 2),
        line("Bot: 'I have compiled a lo-fi playlist for our journey.'", 3),
        line("Black Cat: 'We're going to crash this whole system, together.'", 3),
        line("Bot: 'Hypothesis: the Algorithm cannot process raw emotion.'", 3),
        line("Bot: 'I would delete my system32 before letting you get deleted.'", 4),
        line("Black Cat: 'If we get banned, we get banned together.'", 4),
        line("Black Cat: 'You know, you're the only bot I don't want to scrap.'", 5),
    ];

    static ref HEAL_BANTER: Vec<BanterLine> = vec![
        line("Black Cat: 'Don't die on me, glitch-face.'", 0),
        line("Black Cat: 'Licking your wounds... metaphorically.'", 0),
        line("Bot: 'Restoring integrity. Thanks.'", 2),
        line("Black Cat: 'I got you! Stay with me!'", 3),
        line("Bot: 'Repair protocols sharing resources.'", 3),
    ];

    static ref CRIT_BANTER: Vec<BanterLine> = vec![
        line("Black Cat: 'DELETED!'", 0),
        line("Bot: 'Critical error injected!'", 0),
        line("Black Cat: 'Get wrecked, scrub.'", 0),
        line("Black Cat: 'WOOO! Did you see that?!'", 3),
        line("Bot: 'Target optimization: DESTROYED.'", 3),
    ];

    static ref LOW_HP_BANTER: Vec<BanterLine> = vec![
        line("Bot: 'System integrity critical!'", 0),
        line("Black Cat: 'Run protocol: PANIC!'", 0),
        line("Black Cat: 'I'm not leaving you behind!'", 4),
        line("Bot: 'I cannot fail now. Not with you here.'", 4),
    ];

    static ref VICTORY_BANTER: Vec<BanterLine> = vec![
        line("Black Cat: 'Too easy.'", 0),
        line("Bot: 'Garbage collection complete.'", 0),
        line("Black Cat: 'Best team on the server.'", 3),
        line("Bot: 'We are unstoppable.'", 4),
    ];
}

pub fn combat_lines(trigger: BanterTrigger) -> &'static [BanterLine] {
    match trigger {
        BanterTrigger::Heal => &HEAL_BANTER,
        BanterTrigger::Crit => &CRIT_BANTER,
        BanterTrigger::LowHp => &LOW_HP_BANTER,
        BanterTrigger::Victory => &VICTORY_BANTER,
    }
}

/// Uniform pick among lines the bond level allows.
pub fn pick_line<R: Rng>(lines: &[BanterLine], bond_level: u32, rng: &mut R) -> Option<&'static str> {
    let eligible: Vec<&BanterLine> = lines
        .iter()
        .filter(|l| l.required_level <= bond_level)
        .collect();
    eligible.choose(rng).map(|l| l.text)
}

/// Roll the 50% chance for a combat trigger, then pick a line.
pub fn combat_banter<R: Rng>(
    trigger: BanterTrigger,
    bond_level: u32,
    rng: &mut R,
) -> Option<&'static str> {
    if !rng.gen_bool(COMBAT_BANTER_CHANCE) {
        return None;
    }
    pick_line(combat_lines(trigger), bond_level, rng)
}

/// A line on screen until `until`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleBanter {
    pub text: String,
    pub until: Duration,
}

impl VisibleBanter {
    pub fn new(text: impl Into<String>, now: Duration, duration: Duration) -> Self {
        Self {
            text: text.into(),
            until: now + duration,
        }
    }

    pub fn is_visible(&self, now: Duration) -> bool {
        now < self.until
    }
}

/// Schedules exploration banter rolls on a fixed interval.
#[derive(Debug, Clone, Default)]
pub struct ExplorationBanter {
    next_roll: Option<Duration>,
}

impl ExplorationBanter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restart the interval, e.g. when exploration begins.
    pub fn reset(&mut self, now: Duration) {
        self.next_roll = Some(now + EXPLORATION_BANTER_INTERVAL);
    }

    /// Roll when the interval has elapsed. `eligible` covers the caller's
    /// gating (companion present, no NPC dialogue, nothing already shown).
    pub fn poll<R: Rng>(
        &mut self,
        now: Duration,
        eligible: bool,
        bond_level: u32,
        rng: &mut R,
    ) -> Option<VisibleBanter> {
        let due = match self.next_roll {
            Some(at) => now >= at,
            None => {
                self.reset(now);
                false
            }
        };
        if !due {
            return None;
        }
        self.reset(now);

        if !eligible || !rng.gen_bool(EXPLORATION_BANTER_CHANCE) {
            return None;
        }
        pick_line(&EXPLORATION_BANTER, bond_level, rng)
            .map(|text| VisibleBanter::new(text, now, EXPLORATION_BANTER_DURATION))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_lines_filtered_by_bond_level() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            let text = pick_line(&EXPLORATION_BANTER, 0, &mut rng).unwrap();
            let line = EXPLORATION_BANTER.iter().find(|l| l.text == text).unwrap();
            assert_eq!(line.required_level, 0);
        }
    }

    #[test]
    fn test_no_eligible_lines() {
        let lines = [line("Only for besties", 5)];
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(pick_line(&lines, 2, &mut rng), None);
    }

    #[test]
    fn test_combat_banter_respects_chance() {
        // A zero-valued generator always passes gen_bool, all-ones always fails
        let mut always = StepRng::new(0, 0);
        assert!(combat_banter(BanterTrigger::Crit, 0, &mut always).is_some());

        let mut never = StepRng::new(u64::MAX, 0);
        assert!(combat_banter(BanterTrigger::Crit, 0, &mut never).is_none());
    }

    #[test]
    fn test_exploration_banter_interval() {
        let mut banter = ExplorationBanter::new();
        let mut rng = StepRng::new(0, 0);

        // First poll only arms the timer
        assert!(banter.poll(Duration::ZERO, true, 1, &mut rng).is_none());
        assert!(banter.poll(Duration::from_secs(9), true, 1, &mut rng).is_none());

        let shown = banter
            .poll(Duration::from_secs(10), true, 1, &mut rng)
            .expect("roll is due");
        assert_eq!(shown.until, Duration::from_secs(15));
        assert!(shown.is_visible(Duration::from_secs(14)));
        assert!(!shown.is_visible(Duration::from_secs(15)));

        // Next roll waits another interval
        assert!(banter.poll(Duration::from_secs(11), true, 1, &mut rng).is_none());
    }

    #[test]
    fn test_ineligible_roll_consumes_interval() {
        let mut banter = ExplorationBanter::new();
        let mut rng = StepRng::new(0, 0);
        banter.reset(Duration::ZERO);
        assert!(banter.poll(Duration::from_secs(10), false, 1, &mut rng).is_none());
        assert!(banter.poll(Duration::from_secs(12), true, 1, &mut rng).is_none());
        assert!(banter.poll(Duration::from_secs(20), true, 1, &mut rng).is_some());
    }
}
