//! Single attack resolution: to-hit, critical threats, and damage.

use crate::dice::DiceRoller;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CRIT_RANGE: u32 = 20;
pub const DEFAULT_CRIT_MULTIPLIER: u32 = 2;

/// A natural 20 on the attack roll counts as this in every comparison.
const NATURAL_TWENTY_VALUE: i32 = 30;

/// Everything needed to resolve one attack roll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackContext {
    pub to_hit: i32,
    pub defense: i32,
    pub base_damage: i32,
    pub crit_range: u32,
    pub crit_multiplier: u32,
    /// Sentence prefix such as "Goblin slashes hero".
    pub description: String,
}

impl AttackContext {
    pub fn new(to_hit: i32, defense: i32, base_damage: i32, description: impl Into<String>) -> Self {
        Self {
            to_hit,
            defense,
            base_damage,
            crit_range: DEFAULT_CRIT_RANGE,
            crit_multiplier: DEFAULT_CRIT_MULTIPLIER,
            description: description.into(),
        }
    }

    pub fn with_critical(mut self, crit_range: u32, crit_multiplier: u32) -> Self {
        self.crit_range = crit_range;
        self.crit_multiplier = crit_multiplier;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackOutcome {
    Miss,
    Hit,
    Critical,
}

impl AttackOutcome {
    pub fn is_hit(&self) -> bool {
        !matches!(self, AttackOutcome::Miss)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackResult {
    pub outcome: AttackOutcome,
    /// Damage to apply; zero on a miss.
    pub damage: i32,
    pub first_roll: u32,
    /// Present only when the first roll threatened a critical.
    pub confirmation_roll: Option<u32>,
    /// Full sentence for the message log.
    pub description: String,
}

/// Resolve one attack roll.
///
/// Damage is floored at 1 before any multiplier. A threat needs the first
/// roll to be in the critical range and to hit; a second roll that also hits
/// confirms it.
pub fn resolve_attack(roller: &mut dyn DiceRoller, ctx: AttackContext) -> AttackResult {
    let first_roll = roller.d20();
    let effective = if first_roll == 20 {
        NATURAL_TWENTY_VALUE
    } else {
        first_roll as i32
    };
    let damage = ctx.base_damage.max(1);
    let hits = ctx.to_hit + effective >= ctx.defense;
    let mut description = ctx.description;

    if hits && effective >= ctx.crit_range as i32 {
        let confirmation = roller.d20();
        if ctx.to_hit + confirmation as i32 >= ctx.defense {
            let damage = damage * ctx.crit_multiplier as i32;
            description.push_str(&format!(" *Crit* for {damage} hit points."));
            return AttackResult {
                outcome: AttackOutcome::Critical,
                damage,
                first_roll,
                confirmation_roll: Some(confirmation),
                description,
            };
        }
        description.push_str(&format!(" for {damage} hit points."));
        return AttackResult {
            outcome: AttackOutcome::Hit,
            damage,
            first_roll,
            confirmation_roll: Some(confirmation),
            description,
        };
    }

    if hits {
        description.push_str(&format!(" for {damage} hit points."));
        AttackResult {
            outcome: AttackOutcome::Hit,
            damage,
            first_roll,
            confirmation_roll: None,
            description,
        }
    } else {
        description.push_str(" and misses.");
        AttackResult {
            outcome: AttackOutcome::Miss,
            damage: 0,
            first_roll,
            confirmation_roll: None,
            description,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedRoller;

    fn swing(to_hit: i32, defense: i32, damage: i32) -> AttackContext {
        AttackContext::new(to_hit, defense, damage, "Orc chops hero")
    }

    #[test]
    fn test_hit_when_total_meets_defense() {
        let mut roller = ScriptedRoller::new([10]);
        let result = resolve_attack(&mut roller, swing(5, 15, 6));
        assert_eq!(result.outcome, AttackOutcome::Hit);
        assert_eq!(result.damage, 6);
        assert_eq!(result.description, "Orc chops hero for 6 hit points.");
    }

    #[test]
    fn test_miss_deals_nothing() {
        let mut roller = ScriptedRoller::new([9]);
        let result = resolve_attack(&mut roller, swing(5, 15, 6));
        assert_eq!(result.outcome, AttackOutcome::Miss);
        assert_eq!(result.damage, 0);
        assert_eq!(result.description, "Orc chops hero and misses.");
    }

    #[test]
    fn test_hit_deals_at_least_one() {
        let mut roller = ScriptedRoller::new([15]);
        let result = resolve_attack(&mut roller, swing(5, 15, -3));
        assert_eq!(result.damage, 1);
    }

    #[test]
    fn test_natural_twenty_counts_as_thirty() {
        // Needs 40 to hit: only the natural 20 as 30 plus 10 gets there.
        let mut roller = ScriptedRoller::new([20, 1]);
        let result = resolve_attack(&mut roller, swing(10, 40, 5));
        assert_eq!(result.outcome, AttackOutcome::Hit);
        assert_eq!(result.confirmation_roll, Some(1));
    }

    #[test]
    fn test_confirmed_critical_multiplies() {
        let mut roller = ScriptedRoller::new([20, 12]);
        let result = resolve_attack(&mut roller, swing(5, 15, 7));
        assert_eq!(result.outcome, AttackOutcome::Critical);
        assert_eq!(result.damage, 14);
        assert_eq!(result.description, "Orc chops hero *Crit* for 14 hit points.");
    }

    #[test]
    fn test_critical_floor_then_multiply() {
        let mut roller = ScriptedRoller::new([20, 20]);
        let ctx = swing(0, 10, -4).with_critical(20, 3);
        let result = resolve_attack(&mut roller, ctx);
        assert_eq!(result.damage, 3);
    }

    #[test]
    fn test_unconfirmed_threat_is_plain_hit() {
        let mut roller = ScriptedRoller::new([20, 3]);
        let result = resolve_attack(&mut roller, swing(5, 15, 7));
        assert_eq!(result.outcome, AttackOutcome::Hit);
        assert_eq!(result.damage, 7);
    }

    #[test]
    fn test_expanded_threat_range() {
        let mut roller = ScriptedRoller::new([19, 15]);
        let ctx = swing(5, 15, 4).with_critical(19, 2);
        let result = resolve_attack(&mut roller, ctx);
        assert_eq!(result.outcome, AttackOutcome::Critical);
        assert_eq!(result.damage, 8);
    }

    #[test]
    fn test_threat_that_misses_rolls_no_confirmation() {
        let mut roller = ScriptedRoller::new([19]);
        let ctx = swing(0, 25, 4).with_critical(19, 2);
        let result = resolve_attack(&mut roller, ctx);
        assert_eq!(result.outcome, AttackOutcome::Miss);
        assert_eq!(result.confirmation_roll, None);
        assert_eq!(roller.remaining(), 0);
    }
}
