//! Companion friendship progression.

use crate::world::Bond;
use serde::{Deserialize, Serialize};

/// Bond XP for a chat line with the companion.
pub const TALK_BOND_XP: u32 = 5;
/// Bond XP for petting the companion.
pub const PET_BOND_XP: u32 = 15;
/// Bond XP for winning a fight together.
pub const VICTORY_BOND_XP: u32 = 25;

/// Result of awarding bond XP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BondChange {
    pub before: Bond,
    pub after: Bond,
}

impl BondChange {
    pub fn leveled_up(&self) -> bool {
        self.after.level > self.before.level
    }

    /// Log line for a level-up, if one happened.
    pub fn log_line(&self) -> Option<String> {
        self.leveled_up().then(|| {
            format!(
                "Friendship Bond Level Up! The Cat trusts you more (Lvl {}).",
                self.after.level
            )
        })
    }
}

/// Award bond XP. At most one level is gained per award, however large.
pub fn increase_friendship(bond: Bond, amount: u32) -> BondChange {
    let xp = bond.xp.saturating_add(amount);
    let level = if xp >= bond.threshold() {
        bond.level + 1
    } else {
        bond.level
    };
    BondChange {
        before: bond,
        after: Bond { xp, level },
    }
}

/// Bond state after a quest reward sets XP directly.
pub fn bond_from_reward(xp: u32) -> Bond {
    Bond {
        xp,
        level: if xp >= 100 { 2 } else { 1 },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reaching_threshold_levels_up() {
        let change = increase_friendship(Bond::new(), 100);
        assert_eq!(change.after, Bond { xp: 100, level: 2 });
        assert!(change.leveled_up());
        assert_eq!(
            change.log_line().as_deref(),
            Some("Friendship Bond Level Up! The Cat trusts you more (Lvl 2).")
        );

        let change = increase_friendship(change.after, 5);
        assert_eq!(change.after, Bond { xp: 105, level: 2 });
        assert!(change.log_line().is_none());
    }

    #[test]
    fn test_single_increment_per_award() {
        let change = increase_friendship(Bond::new(), 500);
        assert_eq!(change.after.xp, 500);
        assert_eq!(change.after.level, 2);
    }

    #[test]
    fn test_xp_saturates() {
        let bond = Bond {
            xp: u32::MAX - 1,
            level: 3,
        };
        let change = increase_friendship(bond, 10);
        assert_eq!(change.after.xp, u32::MAX);
    }

    #[test]
    fn test_quest_reward_bond() {
        assert_eq!(bond_from_reward(120), Bond { xp: 120, level: 2 });
        assert_eq!(bond_from_reward(40), Bond { xp: 40, level: 1 });
    }
}
