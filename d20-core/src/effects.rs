//! Timed effects: buffs, debuffs, and summon timers.
//!
//! Every effect records the world turn it expires on. [`sweep`] runs after
//! each turn advance and removes anything whose turn has passed.

use crate::world::{Actor, ActorId, World};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const MAGE_ARMOR: &str = "Mage Armor";
pub const SHIELD: &str = "Shield";
pub const MAGIC_WEAPON: &str = "Magic Weapon";
pub const ALTER_SELF: &str = "Alter Self";
pub const RAY_OF_ENFEEBLEMENT: &str = "Ray of Enfeeblement";

/// Marks a creature that was summoned and disappears when the entry expires.
pub const SUMMON_MARKER: &str = "Player Summoned";

const ARMOR_BUFF_BONUS: i32 = 4;

/// One entry in an actor's effect table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedEffect {
    pub expires_at_turn: u64,
    /// Effect-specific payload, e.g. strength drained.
    pub magnitude: i32,
}

impl TimedEffect {
    pub fn new(expires_at_turn: u64, magnitude: i32) -> Self {
        Self {
            expires_at_turn,
            magnitude,
        }
    }

    pub fn is_expired(&self, current_turn: u64) -> bool {
        self.expires_at_turn < current_turn
    }
}

/// Effects keyed by name. Re-applying a name replaces the old entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectTable {
    entries: BTreeMap<String, TimedEffect>,
}

impl EffectTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&TimedEffect> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TimedEffect)> {
        self.entries.iter().map(|(name, effect)| (name.as_str(), effect))
    }

    pub fn insert(&mut self, name: impl Into<String>, effect: TimedEffect) -> Option<TimedEffect> {
        self.entries.insert(name.into(), effect)
    }

    pub fn remove(&mut self, name: &str) -> Option<TimedEffect> {
        self.entries.remove(name)
    }

    /// Names of expired entries, collected before anything is removed.
    pub fn expired(&self, current_turn: u64) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, effect)| effect.is_expired(current_turn))
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn armor_class_bonus(&self) -> i32 {
        [MAGE_ARMOR, SHIELD]
            .iter()
            .filter(|name| self.contains(name))
            .count() as i32
            * ARMOR_BUFF_BONUS
    }

    pub fn weapon_bonus(&self) -> i32 {
        if self.contains(MAGIC_WEAPON) {
            1
        } else {
            0
        }
    }

    pub fn is_summoned(&self) -> bool {
        self.contains(SUMMON_MARKER)
    }
}

/// Add or refresh an effect on an actor. Returns true on a refresh.
///
/// Ray of Enfeeblement drains current strength by its magnitude, never below 1.
/// A refresh first gives back whatever the previous application took.
pub fn attach(actor: &mut Actor, name: &str, effect: TimedEffect) -> bool {
    let refreshed = detach(actor, name).is_some();
    let mut effect = effect;

    if name == RAY_OF_ENFEEBLEMENT {
        let strength = actor.abilities.strength as i32;
        let drained = effect.magnitude.min(strength - 1).max(0);
        actor.abilities.strength = (strength - drained) as u8;
        effect.magnitude = drained;
    }

    tracing::debug!(
        actor = %actor.name,
        effect = name,
        expires_at_turn = effect.expires_at_turn,
        refreshed,
        "effect attached"
    );
    actor.effects.insert(name, effect);
    refreshed
}

/// Remove an effect, undoing any ability drain it carried.
pub fn detach(actor: &mut Actor, name: &str) -> Option<TimedEffect> {
    let effect = actor.effects.remove(name)?;
    if name == RAY_OF_ENFEEBLEMENT {
        let restored = actor.abilities.strength as i32 + effect.magnitude;
        actor.abilities.strength = restored.min(actor.base_abilities.strength as i32) as u8;
    }
    Some(effect)
}

/// Something that ran out during a sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expiry {
    Faded {
        actor: ActorId,
        actor_name: String,
        effect: String,
    },
    SummonDismissed {
        actor: ActorId,
        actor_name: String,
    },
}

impl Expiry {
    pub fn message(&self) -> String {
        match self {
            Expiry::Faded {
                actor_name, effect, ..
            } => format!("{actor_name}'s {effect} fades."),
            Expiry::SummonDismissed { actor_name, .. } => {
                format!("{actor_name} vanishes in a puff of smoke.")
            }
        }
    }
}

/// Remove every expired effect on every living actor.
///
/// Summons whose marker has expired are taken off the map after the scan,
/// along with the bodies of anything that died since the last sweep.
pub fn sweep(world: &mut World, current_turn: u64) -> Vec<Expiry> {
    let mut expiries = Vec::new();
    let mut dismissed = Vec::new();

    for actor in world.actors.iter_mut().filter(|a| a.is_alive()) {
        for name in actor.effects.expired(current_turn) {
            if name == SUMMON_MARKER {
                actor.effects.remove(&name);
                dismissed.push(actor.id);
                expiries.push(Expiry::SummonDismissed {
                    actor: actor.id,
                    actor_name: actor.name.clone(),
                });
            } else {
                detach(actor, &name);
                expiries.push(Expiry::Faded {
                    actor: actor.id,
                    actor_name: actor.name.clone(),
                    effect: name,
                });
            }
        }
    }

    for id in dismissed {
        world.despawn(id);
    }
    let removed = world.remove_corpses();
    if removed > 0 {
        tracing::debug!(turn = current_turn, removed, "corpses removed");
    }

    if !expiries.is_empty() {
        tracing::debug!(turn = current_turn, count = expiries.len(), "effects expired");
    }
    expiries
}
