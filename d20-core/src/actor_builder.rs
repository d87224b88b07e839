//! Actor construction from code or JSON templates.

use crate::dice::{DamageDice, SizeCategory};
use crate::effects::{TimedEffect, SUMMON_MARKER};
use crate::feats;
use crate::world::{
    AbilityScores, Actor, Allegiance, BreathWeapon, CharacterClass, CombatMode, CombatStats,
    Equipment, HitPoints, Inventory, Level, Mana, NaturalAttack, Position, Weapon,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Error from actor building.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuilderError {
    #[error("Actor name is required")]
    MissingName,
    #[error("Hit points must be positive, got {0}")]
    InvalidHitPoints(i32),
    #[error("Level must be at least 1")]
    InvalidLevel,
    #[error("Unknown feat: {0}")]
    UnknownFeat(String),
}

fn default_level() -> u32 {
    1
}

fn default_unarmed() -> DamageDice {
    DamageDice::new(1, 3)
}

/// A creature description as stored in content files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorTemplate {
    pub name: String,
    pub hit_points: i32,
    #[serde(default)]
    pub size: SizeCategory,
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default)]
    pub class: CharacterClass,
    #[serde(default)]
    pub xp_reward: u32,
    #[serde(default)]
    pub abilities: AbilityScores,
    #[serde(default)]
    pub stats: CombatStats,
    #[serde(default)]
    pub mana: i32,
    #[serde(default)]
    pub natural_attacks: Vec<NaturalAttack>,
    #[serde(default)]
    pub natural_ranged_attacks: Vec<NaturalAttack>,
    #[serde(default = "default_unarmed")]
    pub unarmed: DamageDice,
    #[serde(default)]
    pub breath_weapon: Option<BreathWeapon>,
    #[serde(default)]
    pub main_hand: Option<Weapon>,
    #[serde(default)]
    pub ranged: Option<Weapon>,
    #[serde(default)]
    pub combat_mode: CombatMode,
    #[serde(default)]
    pub spells: BTreeMap<String, u32>,
    #[serde(default)]
    pub feats: Vec<String>,
    #[serde(default)]
    pub gold: u32,
}

/// Builder for actors.
#[derive(Debug, Clone)]
pub struct ActorBuilder {
    name: Option<String>,
    hit_points: i32,
    size: SizeCategory,
    level: u32,
    class: CharacterClass,
    xp_reward: u32,
    abilities: AbilityScores,
    stats: CombatStats,
    mana: i32,
    natural_attacks: Vec<NaturalAttack>,
    natural_ranged_attacks: Vec<NaturalAttack>,
    unarmed: DamageDice,
    breath_weapon: Option<BreathWeapon>,
    equipment: Equipment,
    combat_mode: CombatMode,
    spells: BTreeMap<String, u32>,
    feats: Vec<String>,
    gold: u32,
    position: Position,
    allegiance: Allegiance,
    inventory_capacity: usize,
    summoned_until: Option<u64>,
}

impl Default for ActorBuilder {
    fn default() -> Self {
        Self {
            name: None,
            hit_points: 1,
            size: SizeCategory::default(),
            level: default_level(),
            class: CharacterClass::default(),
            xp_reward: 0,
            abilities: AbilityScores::default(),
            stats: CombatStats::default(),
            mana: 0,
            natural_attacks: Vec::new(),
            natural_ranged_attacks: Vec::new(),
            unarmed: default_unarmed(),
            breath_weapon: None,
            equipment: Equipment::default(),
            combat_mode: CombatMode::default(),
            spells: BTreeMap::new(),
            feats: Vec::new(),
            gold: 0,
            position: Position::default(),
            allegiance: Allegiance::default(),
            inventory_capacity: Inventory::default().capacity,
            summoned_until: None,
        }
    }
}

impl ActorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a content template. Builder calls afterwards override it.
    pub fn from_template(template: &ActorTemplate) -> Self {
        Self {
            name: Some(template.name.clone()),
            hit_points: template.hit_points,
            size: template.size,
            level: template.level,
            class: template.class,
            xp_reward: template.xp_reward,
            abilities: template.abilities,
            stats: template.stats,
            mana: template.mana,
            natural_attacks: template.natural_attacks.clone(),
            natural_ranged_attacks: template.natural_ranged_attacks.clone(),
            unarmed: template.unarmed,
            breath_weapon: template.breath_weapon.clone(),
            equipment: Equipment {
                main_hand: template.main_hand.clone(),
                ranged: template.ranged.clone(),
            },
            combat_mode: template.combat_mode,
            spells: template.spells.clone(),
            feats: template.feats.clone(),
            gold: template.gold,
            ..Self::default()
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn hit_points(mut self, hit_points: i32) -> Self {
        self.hit_points = hit_points;
        self
    }

    pub fn size(mut self, size: SizeCategory) -> Self {
        self.size = size;
        self
    }

    pub fn level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    pub fn class(mut self, class: CharacterClass) -> Self {
        self.class = class;
        self
    }

    /// Experience the player's side earns for the kill.
    pub fn xp_reward(mut self, xp: u32) -> Self {
        self.xp_reward = xp;
        self
    }

    pub fn abilities(mut self, abilities: AbilityScores) -> Self {
        self.abilities = abilities;
        self
    }

    pub fn stats(mut self, stats: CombatStats) -> Self {
        self.stats = stats;
        self
    }

    pub fn base_attack_bonus(mut self, bab: i32) -> Self {
        self.stats.base_attack_bonus = bab;
        self
    }

    pub fn mana(mut self, mana: i32) -> Self {
        self.mana = mana;
        self
    }

    pub fn natural_attack(mut self, attack: NaturalAttack) -> Self {
        self.natural_attacks.push(attack);
        self
    }

    pub fn natural_ranged_attack(mut self, attack: NaturalAttack) -> Self {
        self.natural_ranged_attacks.push(attack);
        self
    }

    pub fn main_hand(mut self, weapon: Weapon) -> Self {
        self.equipment.main_hand = Some(weapon);
        self
    }

    pub fn ranged_weapon(mut self, weapon: Weapon) -> Self {
        self.equipment.ranged = Some(weapon);
        self
    }

    pub fn breath_weapon(mut self, breath: BreathWeapon) -> Self {
        self.breath_weapon = Some(breath);
        self
    }

    pub fn combat_mode(mut self, mode: CombatMode) -> Self {
        self.combat_mode = mode;
        self
    }

    pub fn spell(mut self, name: impl Into<String>, cost: u32) -> Self {
        self.spells.insert(name.into(), cost);
        self
    }

    pub fn feat(mut self, name: impl Into<String>) -> Self {
        self.feats.push(name.into());
        self
    }

    pub fn gold(mut self, gold: u32) -> Self {
        self.gold = gold;
        self
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn allegiance(mut self, allegiance: Allegiance) -> Self {
        self.allegiance = allegiance;
        self
    }

    pub fn inventory_capacity(mut self, capacity: usize) -> Self {
        self.inventory_capacity = capacity;
        self
    }

    /// Mark the actor as a summon that vanishes after `turn`.
    pub fn summoned_until(mut self, turn: u64) -> Self {
        self.summoned_until = Some(turn);
        self.allegiance = Allegiance::Player;
        self
    }

    pub fn build(self) -> Result<Actor, BuilderError> {
        let name = self.name.ok_or(BuilderError::MissingName)?;
        if self.hit_points <= 0 {
            return Err(BuilderError::InvalidHitPoints(self.hit_points));
        }
        if self.level == 0 {
            return Err(BuilderError::InvalidLevel);
        }

        // Templates may grant feats without meeting prerequisites, but the
        // names must exist.
        let mut feat_counts = BTreeMap::new();
        for feat in &self.feats {
            let definition =
                feats::get_feat(feat).ok_or_else(|| BuilderError::UnknownFeat(feat.clone()))?;
            *feat_counts.entry(definition.name.clone()).or_insert(0) += 1;
        }

        let mut actor = Actor::new(name);
        actor.position = self.position;
        actor.allegiance = self.allegiance;
        actor.size = self.size;
        actor.class = self.class;
        actor.level = Level::new(self.level);
        actor.xp_reward = self.xp_reward;
        actor.abilities = self.abilities;
        actor.base_abilities = self.abilities;
        actor.stats = self.stats;
        actor.hit_points = HitPoints::new(self.hit_points);
        actor.mana = Mana::new(self.mana.max(0));
        actor.spells = self.spells;
        actor.feats = feat_counts;
        actor.natural_attacks = self.natural_attacks;
        actor.natural_ranged_attacks = self.natural_ranged_attacks;
        actor.unarmed = self.unarmed;
        actor.breath_weapon = self.breath_weapon;
        actor.equipment = self.equipment;
        actor.combat_mode = self.combat_mode;
        actor.gold = self.gold;
        actor.inventory = Inventory::new(self.inventory_capacity);
        if let Some(turn) = self.summoned_until {
            actor
                .effects
                .insert(SUMMON_MARKER, TimedEffect::new(turn, 0));
        }
        Ok(actor)
    }
}
