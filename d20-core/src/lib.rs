//! d20 tactical combat engine.
//!
//! This crate provides:
//! - d20 attack, critical and saving throw resolution
//! - Full-attack sequencing: iteratives, natural attack routines, Rapid Shot
//! - A world turn clock that expires buffs, debuffs and summons
//! - Spellcasting gated on known spells, mana and caster level
//! - Intent/Effect rules system with a simple monster AI
//! - Experience, level ups, and an inventory of weapons to equip or drop
//!
//! # Quick Start
//!
//! ```no_run
//! use d20_core::{bestiary, Engine, GameMap, Intent, Position, RngRoller, World};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let hero = bestiary::spawn("human fighter", Position::new(1, 1))?;
//!     let mut world = World::new(GameMap::open(10, 10), hero);
//!     world.spawn(bestiary::spawn("goblin", Position::new(2, 1))?);
//!
//!     let mut engine = Engine::new(world).with_roller(RngRoller::seeded(7));
//!     let report = engine.player_turn(Intent::MeleeAttack {
//!         target: Position::new(2, 1),
//!     })?;
//!     println!("{}", report.player.narrative());
//!     Ok(())
//! }
//! ```

pub mod actor_builder;
pub mod ai;
pub mod bestiary;
pub mod clock;
pub mod combat;
pub mod config;
pub mod dice;
pub mod effects;
pub mod engine;
pub mod error;
pub mod feats;
pub mod message;
pub mod progression;
pub mod rules;
pub mod saves;
pub mod sequencer;
pub mod spells;
pub mod targeting;
pub mod testing;
pub mod world;

// Primary public API
pub use actor_builder::{ActorBuilder, ActorTemplate, BuilderError};
pub use clock::WorldClock;
pub use combat::{resolve_attack, AttackContext, AttackOutcome, AttackResult};
pub use config::EngineConfig;
pub use dice::{size_scaled_damage, DamageDice, DiceExpression, DiceRoller, RngRoller, SizeCategory};
pub use engine::{Engine, TurnReport};
pub use error::{ActionError, ContentError};
pub use message::{Message, MessageLog, Tone};
pub use rules::{ActionOutcome, Effect, Intent, Resolution};
pub use saves::SaveKind;
pub use testing::{ScriptedRoller, TestHarness};
pub use world::{
    Ability, Actor, ActorId, AttackTag, CharacterClass, CombatMode, EquipSlot, GameMap, Item,
    Level, Position, World,
};
