//! Intent/Effect pipeline for tactical combat.
//!
//! 1. A player command or the enemy AI produces an [`Intent`]
//! 2. The engine resolves the intent against the rules, rolling dice
//! 3. Each state change is recorded as an [`Effect`] and applied to the world
//! 4. The [`Resolution`] carries the effects and the log messages back out
//!
//! Handlers validate before they emit, so most rejected intents never touch
//! the world. A failure after the first effect is undone by
//! [`Engine::perform`](crate::engine::Engine::perform), which restores the
//! world from a snapshot.

use crate::clock::WorldClock;
use crate::combat::AttackOutcome;
use crate::config::EngineConfig;
use crate::dice::DiceRoller;
use crate::effects::{self, Expiry, TimedEffect};
use crate::error::ActionError;
use crate::message::{Message, Tone};
use crate::world::{Ability, Actor, ActorId, Allegiance, CombatMode, Position, World};
use serde::{Deserialize, Serialize};

/// Something an actor wants to do this turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Intent {
    /// Step one tile. Attacks instead if a hostile stands there.
    Bump { dx: i32, dy: i32 },

    /// Step one tile without attacking.
    Move { dx: i32, dy: i32 },

    /// Full melee attack against whoever stands on a tile.
    MeleeAttack { target: Position },

    /// Full ranged attack against whoever stands on a tile.
    RangedAttack { target: Position },

    /// Swap between melee and ranged kit.
    ToggleCombatMode,

    /// Cast a known spell, optionally at a tile.
    CastSpell {
        spell: String,
        target: Option<Position>,
    },

    /// Breathe in a cone toward a tile.
    BreathWeapon { aim: Position },

    /// Pass the turn, recovering a little.
    Wait,

    /// Wait repeatedly until recovered or disturbed, or for a fixed number
    /// of turns.
    Rest { turns: Option<u32> },

    /// Pick up the first item on the actor's tile.
    PickUp,

    /// Equip the carried item at `index`, or take it off if already worn.
    Equip { index: usize },

    /// Drop the carried item at `index` on the actor's tile.
    Drop { index: usize },

    /// Spend banked experience on the next level.
    LevelUp,

    /// Spend a feat earned on level up.
    LearnFeat { feat: String },

    /// Spend a stat point earned on level up.
    RaiseAbility { ability: Ability },
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Intent::Bump { .. } => "bump",
            Intent::Move { .. } => "move",
            Intent::MeleeAttack { .. } => "melee attack",
            Intent::RangedAttack { .. } => "ranged attack",
            Intent::ToggleCombatMode => "toggle combat mode",
            Intent::CastSpell { .. } => "cast spell",
            Intent::BreathWeapon { .. } => "breath weapon",
            Intent::Wait => "wait",
            Intent::Rest { .. } => "rest",
            Intent::PickUp => "pick up",
            Intent::Equip { .. } => "equip",
            Intent::Drop { .. } => "drop",
            Intent::LevelUp => "level up",
            Intent::LearnFeat { .. } => "learn feat",
            Intent::RaiseAbility { .. } => "raise ability",
        }
    }
}

/// How much of the world's time an action consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionOutcome {
    /// Took no time.
    Free,
    /// Took one turn; the caller advances the clock.
    TurnTaken,
    /// Advanced the clock itself this many times.
    Ticked(u32),
}

/// A concrete state change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Effect {
    /// An attack roll was made. Damage follows as a separate effect.
    AttackResolved {
        attacker: ActorId,
        target: ActorId,
        outcome: AttackOutcome,
        first_roll: u32,
        damage: i32,
    },

    /// A saving throw was made.
    SaveRolled {
        target: ActorId,
        dc: i32,
        success: bool,
    },

    /// HP changed (damage or healing)
    HpChanged {
        target: ActorId,
        amount: i32,
        new_current: i32,
    },

    ActorDied { target: ActorId },

    ManaChanged {
        target: ActorId,
        amount: i32,
        new_current: i32,
    },

    TimedEffectApplied {
        target: ActorId,
        name: String,
        effect: TimedEffect,
        refreshed: bool,
    },

    /// Notification only; the sweep has already removed the entry.
    TimedEffectExpired { target: ActorId, name: String },

    /// Notification only; the sweep has already removed the summon.
    Despawned { target: ActorId },

    CombatModeChanged { target: ActorId, mode: CombatMode },

    Moved {
        target: ActorId,
        from: Position,
        to: Position,
    },

    GoldCollected {
        target: ActorId,
        at: Position,
        amount: u32,
    },

    ItemPickedUp {
        target: ActorId,
        at: Position,
        name: String,
    },

    /// The carried item at `index` was put on or taken off.
    EquipmentChanged {
        target: ActorId,
        index: usize,
        equipped: bool,
    },

    ItemDropped {
        target: ActorId,
        index: usize,
        at: Position,
    },

    Summoned {
        summoner: ActorId,
        actor: Box<Actor>,
    },

    XpGained { target: ActorId, amount: u32 },

    LeveledUp {
        target: ActorId,
        level: u32,
        xp_spent: u32,
        feats: u32,
        stats: u32,
    },

    FeatLearned { target: ActorId, name: String },

    AbilityRaised { target: ActorId, ability: Ability },
}

/// The result of resolving an intent.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub effects: Vec<Effect>,
    pub messages: Vec<Message>,
    pub outcome: ActionOutcome,
}

impl Resolution {
    /// All messages joined into one line.
    pub fn narrative(&self) -> String {
        self.messages
            .iter()
            .map(|m| m.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn attack_count(&self) -> usize {
        self.effects
            .iter()
            .filter(|e| matches!(e, Effect::AttackResolved { .. }))
            .count()
    }
}

/// Apply effects to the game world.
pub fn apply_effects(world: &mut World, effects: &[Effect]) {
    for effect in effects {
        apply_effect(world, effect);
    }
}

/// Apply a single effect to the game world.
pub fn apply_effect(world: &mut World, effect: &Effect) {
    match effect {
        Effect::AttackResolved { .. }
        | Effect::SaveRolled { .. }
        | Effect::TimedEffectExpired { .. }
        | Effect::Despawned { .. } => {}
        Effect::HpChanged {
            target,
            new_current,
            ..
        } => {
            if let Some(actor) = world.actor_mut(*target) {
                actor.hit_points.current = (*new_current).min(actor.hit_points.maximum);
            }
        }
        Effect::ActorDied { target } => {
            if let Some(actor) = world.actor_mut(*target) {
                actor.is_dead = true;
            }
            if world.last_target == Some(*target) {
                world.last_target = None;
            }
        }
        Effect::ManaChanged {
            target,
            new_current,
            ..
        } => {
            if let Some(actor) = world.actor_mut(*target) {
                actor.mana.current = (*new_current).clamp(0, actor.mana.maximum);
            }
        }
        Effect::TimedEffectApplied {
            target,
            name,
            effect,
            ..
        } => {
            if let Some(actor) = world.actor_mut(*target) {
                effects::attach(actor, name, *effect);
            }
        }
        Effect::CombatModeChanged { target, mode } => {
            if let Some(actor) = world.actor_mut(*target) {
                actor.combat_mode = *mode;
            }
        }
        Effect::Moved { target, to, .. } => {
            if let Some(actor) = world.actor_mut(*target) {
                actor.position = *to;
            }
        }
        Effect::GoldCollected { target, at, amount } => {
            world.gold_piles.retain(|pile| pile.position != *at);
            if let Some(actor) = world.actor_mut(*target) {
                actor.gold += amount;
            }
        }
        Effect::ItemPickedUp { target, at, name } => {
            let Some(index) = world
                .ground_items
                .iter()
                .position(|g| g.position == *at && g.item.name == *name)
            else {
                tracing::warn!(item = %name, at = %at, "picked up item is no longer on the ground");
                return;
            };
            let ground = world.ground_items.remove(index);
            if let Some(actor) = world.actor_mut(*target) {
                if actor.inventory.stow(ground.item).is_none() {
                    tracing::warn!(actor = %actor.name, item = %name, "inventory overflowed on pickup");
                }
            }
        }
        Effect::EquipmentChanged {
            target,
            index,
            equipped,
        } => {
            if let Some(actor) = world.actor_mut(*target) {
                if !actor.set_equipped(*index, *equipped) {
                    tracing::warn!(actor = %actor.name, index, "no equippable item at index");
                }
            }
        }
        Effect::ItemDropped { target, index, at } => {
            let Some(actor) = world.actor_mut(*target) else {
                return;
            };
            if actor.inventory.get(*index).is_some_and(|item| item.equipped) {
                actor.set_equipped(*index, false);
            }
            let Some(item) = actor.inventory.remove(*index) else {
                tracing::warn!(actor = %actor.name, index, "dropped item is not carried");
                return;
            };
            world.add_item(item, *at);
        }
        Effect::Summoned { actor, .. } => {
            world.spawn(actor.as_ref().clone());
        }
        Effect::XpGained { target, amount } => {
            if let Some(actor) = world.actor_mut(*target) {
                actor.level.gain_xp(*amount);
            }
        }
        Effect::LeveledUp {
            target,
            level,
            xp_spent,
            feats,
            stats,
        } => {
            if let Some(actor) = world.actor_mut(*target) {
                actor.level.xp = actor.level.xp.saturating_sub(*xp_spent);
                actor.level.current = *level;
                actor.level.feats_to_take += feats;
                actor.level.stats_to_take += stats;
            }
        }
        Effect::FeatLearned { target, name } => {
            if let Some(actor) = world.actor_mut(*target) {
                *actor.feats.entry(name.clone()).or_insert(0) += 1;
                actor.level.feats_to_take = actor.level.feats_to_take.saturating_sub(1);
            }
        }
        Effect::AbilityRaised { target, ability } => {
            if let Some(actor) = world.actor_mut(*target) {
                actor.raise_ability(*ability);
                actor.level.stats_to_take = actor.level.stats_to_take.saturating_sub(1);
            }
        }
    }
}

/// Mutable view of the engine handed to every action handler.
///
/// Effects emitted through the context are applied immediately, so later
/// steps of a multi-attack sequence see the results of earlier ones.
pub struct ActionContext<'a> {
    pub world: &'a mut World,
    pub clock: &'a mut WorldClock,
    pub roller: &'a mut dyn DiceRoller,
    pub config: &'a EngineConfig,
    /// The acting actor.
    pub actor: ActorId,
    effects: Vec<Effect>,
    messages: Vec<Message>,
    ticks: u32,
}

impl<'a> ActionContext<'a> {
    pub fn new(
        world: &'a mut World,
        clock: &'a mut WorldClock,
        roller: &'a mut dyn DiceRoller,
        config: &'a EngineConfig,
        actor: ActorId,
    ) -> Self {
        Self {
            world,
            clock,
            roller,
            config,
            actor,
            effects: Vec::new(),
            messages: Vec::new(),
            ticks: 0,
        }
    }

    /// The acting actor.
    pub fn actor(&self) -> Result<&Actor, ActionError> {
        self.world
            .actor(self.actor)
            .ok_or(ActionError::UnknownActor(self.actor))
    }

    pub fn target(&self, id: ActorId) -> Result<&Actor, ActionError> {
        self.world.actor(id).ok_or(ActionError::UnknownActor(id))
    }

    pub fn actor_is_player(&self) -> bool {
        self.world.is_player(self.actor)
    }

    pub fn is_dead(&self, id: ActorId) -> bool {
        self.world.actor(id).map_or(true, |a| a.is_dead)
    }

    /// Tone for attack messages from the acting actor.
    pub fn attack_tone(&self) -> Tone {
        if self.actor_is_player() {
            Tone::PlayerAttack
        } else {
            Tone::EnemyAttack
        }
    }

    pub fn emit(&mut self, effect: Effect) {
        apply_effect(self.world, &effect);
        self.effects.push(effect);
    }

    pub fn say(&mut self, text: impl Into<String>, tone: Tone) {
        self.messages.push(Message::new(text, tone));
    }

    /// Deal damage, marking the target dead when it reaches zero. Hit points
    /// never go negative. A kill by the player's side earns the player the
    /// victim's experience.
    pub fn damage(&mut self, target: ActorId, amount: i32) {
        if amount <= 0 {
            return;
        }
        let Some(victim) = self.world.actor(target) else {
            return;
        };
        let new_current = (victim.hit_points.current - amount).max(0);
        let already_dead = victim.is_dead;
        let name = victim.display_name();
        let reward = victim.xp_reward;

        self.emit(Effect::HpChanged {
            target,
            amount: -amount,
            new_current,
        });

        if new_current <= 0 && !already_dead {
            self.emit(Effect::ActorDied { target });
            let text = if self.world.is_player(target) {
                "You died!".to_string()
            } else {
                format!("{name} is dead!")
            };
            tracing::debug!(actor = %name, "actor died");
            self.say(text, Tone::Alert);
            if !self.world.is_player(target) {
                self.award_experience(reward);
            }
        }
    }

    fn award_experience(&mut self, amount: u32) {
        let player_side = self
            .world
            .actor(self.actor)
            .is_some_and(|a| a.allegiance == Allegiance::Player);
        if amount == 0 || !player_side {
            return;
        }
        let target = self.world.player_id;
        self.emit(Effect::XpGained { target, amount });
        self.say(format!("You gain {amount} experience points."), Tone::Info);
    }

    /// Heal up to the target's maximum. Returns the amount restored.
    pub fn heal(&mut self, target: ActorId, amount: i32) -> i32 {
        let Some(patient) = self.world.actor(target) else {
            return 0;
        };
        let restored = amount.min(patient.hit_points.missing()).max(0);
        if restored > 0 {
            let new_current = patient.hit_points.current + restored;
            self.emit(Effect::HpChanged {
                target,
                amount: restored,
                new_current,
            });
        }
        restored
    }

    pub fn change_mana(&mut self, target: ActorId, amount: i32) {
        let Some(caster) = self.world.actor(target) else {
            return;
        };
        let new_current = (caster.mana.current + amount).clamp(0, caster.mana.maximum);
        if new_current != caster.mana.current {
            let amount = new_current - caster.mana.current;
            self.emit(Effect::ManaChanged {
                target,
                amount,
                new_current,
            });
        }
    }

    pub fn set_combat_mode(&mut self, mode: CombatMode) {
        self.emit(Effect::CombatModeChanged {
            target: self.actor,
            mode,
        });
    }

    /// Advance the world clock for the acting actor and report what expired.
    pub fn tick(&mut self) {
        self.ticks += 1;
        for expiry in self.clock.advance_turn(self.world, self.actor) {
            let text = expiry.message();
            let effect = match expiry {
                Expiry::Faded { actor, effect, .. } => Effect::TimedEffectExpired {
                    target: actor,
                    name: effect,
                },
                Expiry::SummonDismissed { actor, .. } => Effect::Despawned { target: actor },
            };
            self.effects.push(effect);
            self.say(text, Tone::Alert);
        }
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Number of effects applied so far.
    pub fn emitted(&self) -> usize {
        self.effects.len()
    }

    pub fn finish(self, outcome: ActionOutcome) -> Resolution {
        Resolution {
            effects: self.effects,
            messages: self.messages,
            outcome,
        }
    }
}
