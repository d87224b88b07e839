//! Dice rolling and damage dice.
//!
//! Supports `XdY+Z` notation for weapon and natural attack damage, a
//! [`DiceRoller`] seam so resolution can run on a real RNG or a script,
//! and the size progressions that grow or shrink weapon dice for
//! creatures that are not Medium.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for dice parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceError {
    #[error("Invalid dice notation: {0}")]
    InvalidNotation(String),
    #[error("Invalid die size: {0}")]
    InvalidDieSize(u32),
    #[error("No dice specified")]
    NoDice,
    #[error("Damage dice cannot carry a modifier: {0}")]
    UnexpectedModifier(String),
}

/// A number of identical dice, e.g. `2d6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DamageDice {
    pub count: u32,
    pub sides: u32,
}

impl DamageDice {
    pub const fn new(count: u32, sides: u32) -> Self {
        Self { count, sides }
    }

    pub fn max(&self) -> u32 {
        self.count * self.sides
    }
}

impl fmt::Display for DamageDice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)
    }
}

impl FromStr for DamageDice {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let expr = DiceExpression::parse(s)?;
        if expr.modifier != 0 {
            return Err(DiceError::UnexpectedModifier(expr.original));
        }
        expr.dice.ok_or(DiceError::NoDice)
    }
}

impl TryFrom<String> for DamageDice {
    type Error = DiceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DamageDice> for String {
    fn from(dice: DamageDice) -> Self {
        dice.to_string()
    }
}

/// A dice expression with a flat modifier (e.g. `1d4+1`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceExpression {
    pub dice: Option<DamageDice>,
    pub modifier: i32,
    pub original: String,
}

impl DiceExpression {
    /// Parse a dice notation string.
    pub fn parse(notation: &str) -> Result<Self, DiceError> {
        let notation = notation.trim().to_lowercase();
        if notation.is_empty() {
            return Err(DiceError::NoDice);
        }

        let mut dice = None;
        let mut modifier: i32 = 0;
        let mut current = String::new();
        let mut sign: i32 = 1;

        for ch in notation.chars() {
            match ch {
                '+' | '-' => {
                    if !current.is_empty() {
                        Self::parse_component(&current, sign, &mut dice, &mut modifier)?;
                        current.clear();
                    }
                    sign = if ch == '+' { 1 } else { -1 };
                }
                ' ' => continue,
                _ => current.push(ch),
            }
        }

        if !current.is_empty() {
            Self::parse_component(&current, sign, &mut dice, &mut modifier)?;
        }

        if dice.is_none() && modifier == 0 {
            return Err(DiceError::NoDice);
        }

        Ok(DiceExpression {
            dice,
            modifier,
            original: notation,
        })
    }

    fn parse_component(
        s: &str,
        sign: i32,
        dice: &mut Option<DamageDice>,
        modifier: &mut i32,
    ) -> Result<(), DiceError> {
        if let Some(d_pos) = s.find('d') {
            // Only one dice group per expression; "2d6+1d4" is not a damage roll.
            if dice.is_some() || sign < 0 {
                return Err(DiceError::InvalidNotation(s.to_string()));
            }

            let count_str = &s[..d_pos];
            let count: u32 = if count_str.is_empty() {
                1
            } else {
                count_str
                    .parse()
                    .map_err(|_| DiceError::InvalidNotation(s.to_string()))?
            };
            if count == 0 {
                return Err(DiceError::NoDice);
            }

            let sides: u32 = s[d_pos + 1..]
                .parse()
                .map_err(|_| DiceError::InvalidNotation(s.to_string()))?;
            if sides == 0 {
                return Err(DiceError::InvalidDieSize(sides));
            }

            *dice = Some(DamageDice::new(count, sides));
        } else {
            let value: i32 = s
                .parse()
                .map_err(|_| DiceError::InvalidNotation(s.to_string()))?;
            *modifier += sign * value;
        }

        Ok(())
    }

    /// Roll the expression with the given roller.
    pub fn roll(&self, roller: &mut dyn DiceRoller) -> i32 {
        let rolled = self.dice.map_or(0, |dice| roller.roll(dice) as i32);
        rolled + self.modifier
    }
}

impl FromStr for DiceExpression {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiceExpression::parse(s)
    }
}

impl fmt::Display for DiceExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original)
    }
}

// ============================================================================
// Rollers
// ============================================================================

/// Source of die results for every roll the engine makes.
pub trait DiceRoller {
    /// Roll one die with `sides` faces, returning a value in `1..=sides`.
    fn roll_die(&mut self, sides: u32) -> u32;

    fn d20(&mut self) -> u32 {
        self.roll_die(20)
    }

    fn roll(&mut self, dice: DamageDice) -> u32 {
        (0..dice.count).map(|_| self.roll_die(dice.sides)).sum()
    }
}

/// A [`DiceRoller`] backed by any `rand` RNG.
#[derive(Debug, Clone)]
pub struct RngRoller<R: Rng> {
    rng: R,
}

impl<R: Rng> RngRoller<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngRoller<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// A reproducible roller for demos and replays.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> DiceRoller for RngRoller<R> {
    fn roll_die(&mut self, sides: u32) -> u32 {
        let value = self.rng.gen_range(1..=sides.max(1));
        tracing::trace!(sides, value, "die rolled");
        value
    }
}

// ============================================================================
// Size Scaling
// ============================================================================

/// Creature size, as far as weapon damage is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SizeCategory {
    Tiny,
    Small,
    #[default]
    Medium,
    Large,
}

impl SizeCategory {
    /// Steps along a damage progression relative to Medium.
    pub fn damage_step(&self) -> i32 {
        match self {
            SizeCategory::Tiny => -2,
            SizeCategory::Small => -1,
            SizeCategory::Medium => 0,
            SizeCategory::Large => 1,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SizeCategory::Tiny => "Tiny",
            SizeCategory::Small => "Small",
            SizeCategory::Medium => "Medium",
            SizeCategory::Large => "Large",
        }
    }
}

const STANDARD_STEPS: &[(u32, u32)] = &[
    (1, 1),
    (1, 2),
    (1, 3),
    (1, 4),
    (1, 6),
    (1, 8),
    (2, 6),
    (3, 6),
    (4, 6),
    (6, 6),
    (8, 6),
];

const TWO_D4_STEPS: &[(u32, u32)] = &[
    (1, 1),
    (1, 2),
    (1, 3),
    (1, 4),
    (1, 6),
    (2, 4),
    (2, 6),
    (3, 6),
    (4, 6),
    (6, 6),
    (8, 6),
];

const ONE_D10_STEPS: &[(u32, u32)] = &[
    (1, 1),
    (1, 2),
    (1, 3),
    (1, 4),
    (1, 6),
    (1, 8),
    (1, 10),
    (2, 8),
    (3, 8),
    (4, 8),
    (6, 8),
];

const ONE_D12_STEPS: &[(u32, u32)] = &[
    (1, 1),
    (1, 2),
    (1, 3),
    (1, 4),
    (1, 6),
    (1, 8),
    (1, 10),
    (1, 12),
    (3, 6),
    (4, 6),
    (6, 6),
    (8, 6),
];

const TWO_D6_STEPS: &[(u32, u32)] = &[
    (1, 1),
    (1, 2),
    (1, 3),
    (1, 4),
    (1, 6),
    (1, 8),
    (1, 10),
    (2, 6),
    (3, 6),
    (4, 6),
    (6, 6),
    (8, 6),
];

/// The ordered dice list a weapon's damage moves along as size changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiceProgression {
    Standard,
    TwoD4,
    OneD10,
    OneD12,
    TwoD6,
}

impl DiceProgression {
    /// Pick the progression for a Medium creature's base dice.
    pub fn for_dice(dice: DamageDice) -> Self {
        match (dice.count, dice.sides) {
            (2, 4) => DiceProgression::TwoD4,
            (1, 10) => DiceProgression::OneD10,
            (1, 12) => DiceProgression::OneD12,
            (2, 6) => DiceProgression::TwoD6,
            _ => DiceProgression::Standard,
        }
    }

    pub fn steps(&self) -> &'static [(u32, u32)] {
        match self {
            DiceProgression::Standard => STANDARD_STEPS,
            DiceProgression::TwoD4 => TWO_D4_STEPS,
            DiceProgression::OneD10 => ONE_D10_STEPS,
            DiceProgression::OneD12 => ONE_D12_STEPS,
            DiceProgression::TwoD6 => TWO_D6_STEPS,
        }
    }

    pub fn position(&self, dice: DamageDice) -> Option<usize> {
        self.steps()
            .iter()
            .position(|&(count, sides)| count == dice.count && sides == dice.sides)
    }
}

/// Weapon dice for a wielder of the given size.
///
/// The shift is clamped to the ends of the progression. Dice that appear on
/// no progression are returned unchanged.
pub fn size_scaled_damage(dice: DamageDice, size: SizeCategory) -> DamageDice {
    let progression = DiceProgression::for_dice(dice);
    let steps = progression.steps();
    let Some(position) = progression.position(dice) else {
        return dice;
    };

    let shifted = (position as i32 + size.damage_step()).clamp(0, steps.len() as i32 - 1);
    let (count, sides) = steps[shifted as usize];
    DamageDice::new(count, sides)
}
