//! Saving throws.

use crate::dice::DiceRoller;
use crate::error::ActionError;
use crate::world::Actor;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A natural 1 counts as this value instead of 1. It is heavily penalised,
/// not an automatic failure.
pub const NATURAL_ONE_VALUE: i32 = -10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SaveKind {
    Fortitude,
    Reflex,
    Will,
}

impl SaveKind {
    pub fn name(&self) -> &'static str {
        match self {
            SaveKind::Fortitude => "Fortitude",
            SaveKind::Reflex => "Reflex",
            SaveKind::Will => "Will",
        }
    }
}

impl fmt::Display for SaveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for SaveKind {
    type Err = ActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fortitude" | "fort" => Ok(SaveKind::Fortitude),
            "reflex" | "ref" => Ok(SaveKind::Reflex),
            "will" => Ok(SaveKind::Will),
            _ => Err(ActionError::impossible(
                "Save is not Fort, Reflex, or Will.",
            )),
        }
    }
}

/// The outcome of one saving throw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveRoll {
    pub natural: u32,
    pub total: i32,
    pub success: bool,
}

/// Roll d20 + bonus against a DC. A natural 20 always succeeds.
pub fn roll_save(roller: &mut dyn DiceRoller, dc: i32, bonus: i32) -> SaveRoll {
    let natural = roller.d20();
    let value = if natural == 1 {
        NATURAL_ONE_VALUE
    } else {
        natural as i32
    };
    let total = value + bonus;
    SaveRoll {
        natural,
        total,
        success: natural == 20 || total >= dc,
    }
}

/// Roll the target's save of the given kind.
pub fn make_save(roller: &mut dyn DiceRoller, dc: i32, target: &Actor, kind: SaveKind) -> bool {
    let roll = roll_save(roller, dc, target.save_bonus(kind));
    tracing::trace!(
        target = %target.name,
        save = %kind,
        dc,
        natural = roll.natural,
        total = roll.total,
        success = roll.success,
        "saving throw"
    );
    roll.success
}

/// Damage after a successful save for half. Never rounds a hit down to zero.
pub fn half_damage(damage: i32) -> i32 {
    if damage <= 0 {
        0
    } else {
        (damage / 2).max(1)
    }
}

/// Reflex-for-half damage. Non-positive damage needs no roll.
pub fn reflex_save_half(roller: &mut dyn DiceRoller, damage: i32, dc: i32, target: &Actor) -> i32 {
    if damage <= 0 {
        return 0;
    }
    if make_save(roller, dc, target, SaveKind::Reflex) {
        half_damage(damage)
    } else {
        damage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedRoller;

    fn nimble(reflex: i32) -> Actor {
        let mut actor = Actor::new("rogue");
        actor.stats.reflex = reflex;
        actor
    }

    #[test]
    fn test_natural_twenty_always_saves() {
        let mut roller = ScriptedRoller::new([20]);
        assert!(make_save(&mut roller, 100, &nimble(0), SaveKind::Will));
    }

    #[test]
    fn test_natural_one_is_penalised_not_failed() {
        let mut roller = ScriptedRoller::new([1, 1]);
        assert!(make_save(&mut roller, 15, &nimble(25), SaveKind::Reflex));
        assert!(!make_save(&mut roller, 16, &nimble(25), SaveKind::Reflex));
    }

    #[test]
    fn test_save_meets_dc() {
        let mut roller = ScriptedRoller::new([10, 9]);
        assert!(make_save(&mut roller, 13, &nimble(3), SaveKind::Reflex));
        assert!(!make_save(&mut roller, 13, &nimble(3), SaveKind::Reflex));
    }

    #[test]
    fn test_reflex_half_on_success() {
        let mut roller = ScriptedRoller::new([20, 20]);
        assert_eq!(reflex_save_half(&mut roller, 7, 15, &nimble(0)), 3);
        assert_eq!(reflex_save_half(&mut roller, 1, 15, &nimble(0)), 1);
    }

    #[test]
    fn test_reflex_full_on_failure() {
        let mut roller = ScriptedRoller::new([2]);
        assert_eq!(reflex_save_half(&mut roller, 9, 15, &nimble(0)), 9);
    }

    #[test]
    fn test_no_roll_for_zero_damage() {
        let mut roller = ScriptedRoller::empty();
        assert_eq!(reflex_save_half(&mut roller, 0, 15, &nimble(0)), 0);
        assert_eq!(roller.remaining(), 0);
    }

    #[test]
    fn test_parse_save_kind() {
        assert_eq!("Fort".parse::<SaveKind>().unwrap(), SaveKind::Fortitude);
        assert_eq!("Reflex".parse::<SaveKind>().unwrap(), SaveKind::Reflex);
        let err = "Charisma".parse::<SaveKind>().unwrap_err();
        assert_eq!(err.to_string(), "Save is not Fort, Reflex, or Will.");
    }
}
