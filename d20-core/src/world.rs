//! Game world types.
//!
//! Contains the types that make up tactical combat state: actors with their
//! combat statistics and equipment, the tile map, and loot on the ground.

use crate::dice::{DamageDice, SizeCategory};
use crate::effects::EffectTable;
use crate::saves::SaveKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

// ============================================================================
// ID Types
// ============================================================================

/// Unique identifier for actors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub Uuid);

impl ActorId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Positions
// ============================================================================

/// A tile coordinate. `y` grows southward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Euclidean distance in tiles.
    pub fn distance(self, other: Position) -> f64 {
        let dx = (other.x - self.x) as f64;
        let dy = (other.y - self.y) as f64;
        (dx * dx + dy * dy).sqrt()
    }

    /// One-tile step that closes the distance to `other`.
    pub fn step_toward(self, other: Position) -> (i32, i32) {
        ((other.x - self.x).signum(), (other.y - self.y).signum())
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ============================================================================
// Ability Scores
// ============================================================================

/// The six ability scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ability {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
}

impl Ability {
    pub fn abbreviation(&self) -> &'static str {
        match self {
            Ability::Strength => "STR",
            Ability::Dexterity => "DEX",
            Ability::Constitution => "CON",
            Ability::Intelligence => "INT",
            Ability::Wisdom => "WIS",
            Ability::Charisma => "CHA",
        }
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}

/// Ability scores container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScores {
    pub strength: u8,
    pub dexterity: u8,
    pub constitution: u8,
    pub intelligence: u8,
    pub wisdom: u8,
    pub charisma: u8,
}

impl AbilityScores {
    pub fn new(str: u8, dex: u8, con: u8, int: u8, wis: u8, cha: u8) -> Self {
        Self {
            strength: str,
            dexterity: dex,
            constitution: con,
            intelligence: int,
            wisdom: wis,
            charisma: cha,
        }
    }

    pub fn get(&self, ability: Ability) -> u8 {
        match ability {
            Ability::Strength => self.strength,
            Ability::Dexterity => self.dexterity,
            Ability::Constitution => self.constitution,
            Ability::Intelligence => self.intelligence,
            Ability::Wisdom => self.wisdom,
            Ability::Charisma => self.charisma,
        }
    }

    pub fn set(&mut self, ability: Ability, value: u8) {
        match ability {
            Ability::Strength => self.strength = value,
            Ability::Dexterity => self.dexterity = value,
            Ability::Constitution => self.constitution = value,
            Ability::Intelligence => self.intelligence = value,
            Ability::Wisdom => self.wisdom = value,
            Ability::Charisma => self.charisma = value,
        }
    }

    /// Score 8-9 = -1, 10-11 = 0, 12-13 = +1, and so on.
    pub fn modifier(&self, ability: Ability) -> i32 {
        (self.get(ability) as i32 - 10).div_euclid(2)
    }
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self::new(10, 10, 10, 10, 10, 10)
    }
}

// ============================================================================
// Combat Types
// ============================================================================

/// Whether an actor is fighting with its melee or ranged kit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CombatMode {
    #[default]
    Melee,
    Ranged,
}

impl CombatMode {
    pub fn name(&self) -> &'static str {
        match self {
            CombatMode::Melee => "melee",
            CombatMode::Ranged => "ranged",
        }
    }
}

/// Which side an actor fights on. Summons fight for the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Allegiance {
    Player,
    #[default]
    Hostile,
}

/// How a natural attack sits in a full-attack routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AttackTag {
    #[default]
    Primary,
    Secondary,
    TwoHanded,
}

impl AttackTag {
    pub fn to_hit_penalty(&self, secondary_penalty: i32) -> i32 {
        match self {
            AttackTag::Secondary => secondary_penalty,
            AttackTag::Primary | AttackTag::TwoHanded => 0,
        }
    }

    /// Adjust a strength-derived damage bonus. Fractions truncate toward zero.
    pub fn damage_bonus(&self, bonus: i32) -> i32 {
        match self {
            AttackTag::Primary => bonus,
            AttackTag::Secondary => bonus / 2,
            AttackTag::TwoHanded => bonus * 3 / 2,
        }
    }
}

/// A bite, claw, spit, or similar attack built into a creature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NaturalAttack {
    #[serde(default)]
    pub tag: AttackTag,
    pub verb: String,
    pub damage: DamageDice,
}

impl NaturalAttack {
    pub fn new(tag: AttackTag, verb: impl Into<String>, damage: DamageDice) -> Self {
        Self {
            tag,
            verb: verb.into(),
            damage,
        }
    }
}

fn default_crit_range() -> u32 {
    20
}

fn default_crit_multiplier() -> u32 {
    2
}

/// A wielded weapon. Damage dice are listed for a Medium wielder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weapon {
    pub name: String,
    pub verb: String,
    pub damage: DamageDice,
    #[serde(default = "default_crit_range")]
    pub crit_range: u32,
    #[serde(default = "default_crit_multiplier")]
    pub crit_multiplier: u32,
}

impl Weapon {
    pub fn new(name: impl Into<String>, verb: impl Into<String>, damage: DamageDice) -> Self {
        Self {
            name: name.into(),
            verb: verb.into(),
            damage,
            crit_range: default_crit_range(),
            crit_multiplier: default_crit_multiplier(),
        }
    }

    pub fn with_critical(mut self, crit_range: u32, crit_multiplier: u32) -> Self {
        self.crit_range = crit_range;
        self.crit_multiplier = crit_multiplier;
        self
    }
}

/// Where a weapon is worn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquipSlot {
    MainHand,
    Ranged,
}

/// Equipment slots that matter in combat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    pub main_hand: Option<Weapon>,
    pub ranged: Option<Weapon>,
}

impl Equipment {
    pub fn slot(&self, slot: EquipSlot) -> Option<&Weapon> {
        match slot {
            EquipSlot::MainHand => self.main_hand.as_ref(),
            EquipSlot::Ranged => self.ranged.as_ref(),
        }
    }

    pub fn slot_mut(&mut self, slot: EquipSlot) -> &mut Option<Weapon> {
        match slot {
            EquipSlot::MainHand => &mut self.main_hand,
            EquipSlot::Ranged => &mut self.ranged,
        }
    }
}

fn default_breath_radius() -> i32 {
    3
}

/// A cone-shaped breath attack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreathWeapon {
    pub name: String,
    pub damage: DamageDice,
    #[serde(default = "default_breath_radius")]
    pub radius: i32,
}

/// Derived combat numbers, before timed effects are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatStats {
    pub armor_class: i32,
    pub touch_ac: i32,
    pub base_attack_bonus: i32,
    pub melee_to_hit: i32,
    pub melee_to_damage: i32,
    pub ranged_to_hit: i32,
    pub ranged_to_damage: i32,
    pub fortitude: i32,
    pub reflex: i32,
    pub will: i32,
}

impl Default for CombatStats {
    fn default() -> Self {
        Self {
            armor_class: 10,
            touch_ac: 10,
            base_attack_bonus: 0,
            melee_to_hit: 0,
            melee_to_damage: 0,
            ranged_to_hit: 0,
            ranged_to_damage: 0,
            fortitude: 0,
            reflex: 0,
            will: 0,
        }
    }
}

// ============================================================================
// Progression
// ============================================================================

/// Decides how often a character earns feats on level up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CharacterClass {
    #[default]
    Monster,
    Fighter,
    Wizard,
}

/// Character level, experience, and unspent level-up rewards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub current: u32,
    /// Experience banked toward the next level.
    pub xp: u32,
    pub feats_to_take: u32,
    pub stats_to_take: u32,
}

impl Level {
    pub fn new(current: u32) -> Self {
        Self {
            current,
            xp: 0,
            feats_to_take: 0,
            stats_to_take: 0,
        }
    }

    pub fn gain_xp(&mut self, amount: u32) {
        self.xp = self.xp.saturating_add(amount);
    }

    /// Experience needed to leave the current level: `base + current * factor`.
    pub fn experience_to_next_level(&self, base: u32, factor: u32) -> u32 {
        base.saturating_add(self.current.saturating_mul(factor))
    }

    pub fn can_level_up(&self, base: u32, factor: u32) -> bool {
        self.xp >= self.experience_to_next_level(base, factor)
    }
}

impl Default for Level {
    fn default() -> Self {
        Self::new(1)
    }
}

// ============================================================================
// Hit Points and Mana
// ============================================================================

/// Hit points tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitPoints {
    pub current: i32,
    pub maximum: i32,
}

impl HitPoints {
    pub fn new(maximum: i32) -> Self {
        Self {
            current: maximum,
            maximum,
        }
    }

    pub fn missing(&self) -> i32 {
        (self.maximum - self.current).max(0)
    }

    pub fn is_full(&self) -> bool {
        self.current >= self.maximum
    }

    /// Heal up to the maximum, returning the amount actually restored.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let old = self.current;
        self.current = (self.current + amount).min(self.maximum);
        self.current - old
    }
}

/// Spell points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Mana {
    pub current: i32,
    pub maximum: i32,
}

impl Mana {
    pub fn new(maximum: i32) -> Self {
        Self {
            current: maximum,
            maximum,
        }
    }

    pub fn can_afford(&self, cost: u32) -> bool {
        cost as i32 <= self.current
    }

    pub fn is_full(&self) -> bool {
        self.current >= self.maximum
    }
}

// ============================================================================
// Items
// ============================================================================

fn default_item_count() -> u32 {
    1
}

/// A weapon an item puts in hand when equipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equippable {
    pub slot: EquipSlot,
    pub weapon: Weapon,
}

/// Inventory item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    #[serde(default)]
    pub stackable: bool,
    #[serde(default = "default_item_count")]
    pub count: u32,
    #[serde(default)]
    pub equippable: Option<Equippable>,
    #[serde(default)]
    pub equipped: bool,
}

impl Item {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stackable: false,
            count: 1,
            equippable: None,
            equipped: false,
        }
    }

    /// An item carrying `weapon`, named after it.
    pub fn weapon(weapon: Weapon, slot: EquipSlot) -> Self {
        let name = weapon.name.clone();
        Self {
            equippable: Some(Equippable { slot, weapon }),
            ..Self::new(name)
        }
    }

    fn fits(&self, slot: EquipSlot) -> bool {
        self.equippable.as_ref().is_some_and(|gear| gear.slot == slot)
    }

    pub fn stackable(mut self, count: u32) -> Self {
        self.stackable = true;
        self.count = count;
        self
    }
}

/// What happened when an item went into an inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stowed {
    NewSlot,
    Stacked,
}

/// A bounded list of carried items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    pub items: Vec<Item>,
    pub capacity: usize,
}

impl Inventory {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: Vec::new(),
            capacity,
        }
    }

    fn stack_index(&self, item: &Item) -> Option<usize> {
        if !item.stackable {
            return None;
        }
        self.items
            .iter()
            .position(|held| held.stackable && held.name == item.name)
    }

    pub fn can_stow(&self, item: &Item) -> bool {
        self.stack_index(item).is_some() || self.items.len() < self.capacity
    }

    /// Add an item, merging into an existing stack when possible.
    /// Returns `None` if there is no room.
    pub fn stow(&mut self, item: Item) -> Option<Stowed> {
        if let Some(index) = self.stack_index(&item) {
            self.items[index].count += item.count;
            return Some(Stowed::Stacked);
        }
        if self.items.len() >= self.capacity {
            return None;
        }
        self.items.push(item);
        Some(Stowed::NewSlot)
    }

    pub fn get(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }

    pub fn remove(&mut self, index: usize) -> Option<Item> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new(26)
    }
}

/// An item lying on a tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundItem {
    pub item: Item,
    pub position: Position,
}

/// Loose gold lying on a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoldPile {
    pub position: Position,
    pub amount: u32,
}

// ============================================================================
// Actors
// ============================================================================

/// A creature on the map: the player, an enemy, or a summon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub name: String,
    pub position: Position,
    pub allegiance: Allegiance,
    pub size: SizeCategory,
    pub class: CharacterClass,
    pub level: Level,
    /// Experience awarded to the player's side for killing this actor.
    pub xp_reward: u32,
    /// Current scores, after drains.
    pub abilities: AbilityScores,
    /// Scores the derived stats were computed from.
    pub base_abilities: AbilityScores,
    pub stats: CombatStats,
    pub hit_points: HitPoints,
    pub mana: Mana,
    /// Known spells and their mana cost.
    pub spells: BTreeMap<String, u32>,
    /// Feats and how many times each was taken.
    pub feats: BTreeMap<String, u32>,
    pub natural_attacks: Vec<NaturalAttack>,
    pub natural_ranged_attacks: Vec<NaturalAttack>,
    pub unarmed: DamageDice,
    pub breath_weapon: Option<BreathWeapon>,
    pub equipment: Equipment,
    pub combat_mode: CombatMode,
    pub effects: EffectTable,
    pub inventory: Inventory,
    pub gold: u32,
    pub is_dead: bool,
}

impl Actor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ActorId::new(),
            name: name.into(),
            position: Position::default(),
            allegiance: Allegiance::default(),
            size: SizeCategory::default(),
            class: CharacterClass::default(),
            level: Level::default(),
            xp_reward: 0,
            abilities: AbilityScores::default(),
            base_abilities: AbilityScores::default(),
            stats: CombatStats::default(),
            hit_points: HitPoints::new(1),
            mana: Mana::default(),
            spells: BTreeMap::new(),
            feats: BTreeMap::new(),
            natural_attacks: Vec::new(),
            natural_ranged_attacks: Vec::new(),
            unarmed: DamageDice::new(1, 3),
            breath_weapon: None,
            equipment: Equipment::default(),
            combat_mode: CombatMode::default(),
            effects: EffectTable::new(),
            inventory: Inventory::default(),
            gold: 0,
            is_dead: false,
        }
    }

    pub fn is_alive(&self) -> bool {
        !self.is_dead
    }

    /// Name with the first letter capitalised, for the start of a sentence.
    pub fn display_name(&self) -> String {
        let mut chars = self.name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    pub fn has_feat(&self, feat: &str) -> bool {
        self.feats.get(feat).is_some_and(|&count| count > 0)
    }

    pub fn spell_cost(&self, spell: &str) -> Option<u32> {
        self.spells.get(spell).copied()
    }

    pub fn is_hostile_to(&self, other: &Actor) -> bool {
        self.allegiance != other.allegiance
    }

    pub fn has_ranged_option(&self) -> bool {
        self.equipment.ranged.is_some() || !self.natural_ranged_attacks.is_empty()
    }

    pub fn armor_class(&self) -> i32 {
        self.stats.armor_class + self.effects.armor_class_bonus()
    }

    pub fn touch_ac(&self) -> i32 {
        self.stats.touch_ac
    }

    /// Change in strength modifier caused by drains on the current score.
    fn strength_adjustment(&self) -> i32 {
        self.abilities.modifier(Ability::Strength) - self.base_abilities.modifier(Ability::Strength)
    }

    pub fn melee_to_hit(&self) -> i32 {
        self.stats.melee_to_hit + self.strength_adjustment() + self.effects.weapon_bonus()
    }

    pub fn melee_to_damage(&self) -> i32 {
        self.stats.melee_to_damage + self.strength_adjustment() + self.effects.weapon_bonus()
    }

    pub fn ranged_to_hit(&self) -> i32 {
        self.stats.ranged_to_hit
    }

    pub fn ranged_to_damage(&self) -> i32 {
        self.stats.ranged_to_damage
    }

    pub fn save_bonus(&self, kind: SaveKind) -> i32 {
        match kind {
            SaveKind::Fortitude => self.stats.fortitude,
            SaveKind::Reflex => self.stats.reflex,
            SaveKind::Will => self.stats.will,
        }
    }

    pub fn modifier(&self, ability: Ability) -> i32 {
        self.abilities.modifier(ability)
    }

    /// Raise a score by one point. When the modifier goes up, the stats
    /// derived from it go up with it.
    pub fn raise_ability(&mut self, ability: Ability) {
        let before = self.base_abilities.modifier(ability);
        let current = self.abilities.get(ability).saturating_add(1);
        let base = self.base_abilities.get(ability).saturating_add(1);
        self.abilities.set(ability, current);
        self.base_abilities.set(ability, base);

        let delta = self.base_abilities.modifier(ability) - before;
        if delta == 0 {
            return;
        }
        let stats = &mut self.stats;
        match ability {
            Ability::Strength => {
                stats.melee_to_hit += delta;
                stats.melee_to_damage += delta;
            }
            Ability::Dexterity => {
                stats.ranged_to_hit += delta;
                stats.armor_class += delta;
                stats.touch_ac += delta;
                stats.reflex += delta;
            }
            Ability::Constitution => {
                stats.fortitude += delta;
                let extra = delta * self.level.current as i32;
                self.hit_points.maximum += extra;
                self.hit_points.current += extra;
            }
            Ability::Wisdom => stats.will += delta,
            Ability::Intelligence | Ability::Charisma => {}
        }
    }

    /// Put the carried item at `index` in hand, or take it out. Equipping
    /// displaces whatever else filled the same slot. Returns false when the
    /// item is missing or cannot be equipped.
    pub fn set_equipped(&mut self, index: usize, equipped: bool) -> bool {
        let Some(gear) = self
            .inventory
            .get(index)
            .and_then(|item| item.equippable.clone())
        else {
            return false;
        };
        if equipped {
            for held in &mut self.inventory.items {
                if held.fits(gear.slot) {
                    held.equipped = false;
                }
            }
        }
        self.inventory.items[index].equipped = equipped;
        *self.equipment.slot_mut(gear.slot) = equipped.then_some(gear.weapon);
        true
    }
}

// ============================================================================
// Map
// ============================================================================

/// Walkability and visibility for a rectangular grid of tiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameMap {
    pub width: i32,
    pub height: i32,
    walkable: Vec<bool>,
    visible: Vec<bool>,
}

impl GameMap {
    /// An open floor, entirely walkable and visible.
    pub fn open(width: i32, height: i32) -> Self {
        let tiles = (width.max(0) * height.max(0)) as usize;
        Self {
            width,
            height,
            walkable: vec![true; tiles],
            visible: vec![true; tiles],
        }
    }

    fn index(&self, position: Position) -> Option<usize> {
        self.in_bounds(position)
            .then(|| (position.y * self.width + position.x) as usize)
    }

    pub fn in_bounds(&self, position: Position) -> bool {
        (0..self.width).contains(&position.x) && (0..self.height).contains(&position.y)
    }

    pub fn is_walkable(&self, position: Position) -> bool {
        self.index(position).is_some_and(|i| self.walkable[i])
    }

    pub fn is_visible(&self, position: Position) -> bool {
        self.index(position).is_some_and(|i| self.visible[i])
    }

    pub fn set_walkable(&mut self, position: Position, walkable: bool) {
        if let Some(i) = self.index(position) {
            self.walkable[i] = walkable;
        }
    }

    pub fn set_visible(&mut self, position: Position, visible: bool) {
        if let Some(i) = self.index(position) {
            self.visible[i] = visible;
        }
    }
}

// ============================================================================
// World
// ============================================================================

/// Everything on one level: the map, the actors, and the loot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    pub map: GameMap,
    pub actors: Vec<Actor>,
    pub player_id: ActorId,
    pub ground_items: Vec<GroundItem>,
    pub gold_piles: Vec<GoldPile>,
    /// The last creature the player aimed a ranged attack at.
    pub last_target: Option<ActorId>,
}

impl World {
    pub fn new(map: GameMap, mut player: Actor) -> Self {
        player.allegiance = Allegiance::Player;
        Self {
            map,
            player_id: player.id,
            actors: vec![player],
            ground_items: Vec::new(),
            gold_piles: Vec::new(),
            last_target: None,
        }
    }

    pub fn is_player(&self, id: ActorId) -> bool {
        self.player_id == id
    }

    pub fn player(&self) -> Option<&Actor> {
        self.actor(self.player_id)
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.iter().find(|a| a.id == id)
    }

    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.iter_mut().find(|a| a.id == id)
    }

    pub fn living_actors(&self) -> impl Iterator<Item = &Actor> {
        self.actors.iter().filter(|a| a.is_alive())
    }

    /// The living actor standing on a tile, if any.
    pub fn actor_at(&self, position: Position) -> Option<&Actor> {
        self.living_actors().find(|a| a.position == position)
    }

    /// Snapshot of living actor ids in turn order.
    pub fn living_ids(&self) -> Vec<ActorId> {
        self.living_actors().map(|a| a.id).collect()
    }

    pub fn spawn(&mut self, actor: Actor) -> ActorId {
        let id = actor.id;
        tracing::debug!(name = %actor.name, position = %actor.position, "actor spawned");
        self.actors.push(actor);
        id
    }

    pub fn despawn(&mut self, id: ActorId) -> Option<Actor> {
        let index = self.actors.iter().position(|a| a.id == id)?;
        if self.last_target == Some(id) {
            self.last_target = None;
        }
        Some(self.actors.remove(index))
    }

    /// Take every dead actor except the player off the map. Returns how many
    /// were removed.
    pub fn remove_corpses(&mut self) -> usize {
        let player_id = self.player_id;
        let before = self.actors.len();
        self.actors.retain(|a| a.is_alive() || a.id == player_id);
        if let Some(target) = self.last_target {
            if self.actor(target).is_none() {
                self.last_target = None;
            }
        }
        before - self.actors.len()
    }

    /// A tile that is on the map, walkable, and free of living actors.
    pub fn is_open(&self, position: Position) -> bool {
        self.map.is_walkable(position) && self.actor_at(position).is_none()
    }

    pub fn gold_at(&self, position: Position) -> Option<&GoldPile> {
        self.gold_piles.iter().find(|g| g.position == position)
    }

    pub fn items_at(&self, position: Position) -> impl Iterator<Item = &GroundItem> {
        self.ground_items
            .iter()
            .filter(move |g| g.position == position)
    }

    pub fn add_item(&mut self, item: Item, position: Position) {
        self.ground_items.push(GroundItem { item, position });
    }

    pub fn add_gold(&mut self, amount: u32, position: Position) {
        self.gold_piles.push(GoldPile { position, amount });
    }
}
