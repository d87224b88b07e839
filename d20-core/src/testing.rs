//! Testing utilities for the combat engine.
//!
//! This module provides tools for deterministic tests:
//! - `ScriptedRoller` replays fixed die results instead of rolling
//! - `TestHarness` for scripted combat scenarios on an open map
//! - Assertion helpers for verifying game state

use crate::bestiary;
use crate::dice::DiceRoller;
use crate::engine::{Engine, TurnReport};
use crate::error::ActionError;
use crate::rules::{Intent, Resolution};
use crate::world::{Actor, ActorId, GameMap, HitPoints, Position, World};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// A dice roller that returns scripted results in order.
///
/// Clones share one queue, so a test can keep a handle and top it up after
/// the engine has taken ownership of the roller. Running out of rolls panics,
/// unless the roller was built with [`ScriptedRoller::constant`].
#[derive(Debug, Clone, Default)]
pub struct ScriptedRoller {
    rolls: Rc<RefCell<VecDeque<u32>>>,
    fallback: Option<u32>,
}

impl ScriptedRoller {
    pub fn new(rolls: impl IntoIterator<Item = u32>) -> Self {
        Self {
            rolls: Rc::new(RefCell::new(rolls.into_iter().collect())),
            fallback: None,
        }
    }

    /// A roller with nothing queued. Any roll panics.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns `value` whenever the queue is empty.
    pub fn constant(value: u32) -> Self {
        Self {
            fallback: Some(value),
            ..Self::default()
        }
    }

    /// Append more results to the queue.
    pub fn push(&self, rolls: impl IntoIterator<Item = u32>) {
        self.rolls.borrow_mut().extend(rolls);
    }

    /// Number of queued results not yet used.
    pub fn remaining(&self) -> usize {
        self.rolls.borrow().len()
    }
}

impl DiceRoller for ScriptedRoller {
    fn roll_die(&mut self, sides: u32) -> u32 {
        let next = self.rolls.borrow_mut().pop_front();
        match (next, self.fallback) {
            (Some(value), _) | (None, Some(value)) => value,
            (None, None) => panic!("ScriptedRoller ran out of rolls (wanted a d{sides})"),
        }
    }
}

/// Test harness for running combat scenarios.
pub struct TestHarness {
    /// The engine under test. Its dice come from `rolls`.
    pub engine: Engine,
    rolls: ScriptedRoller,
}

impl TestHarness {
    /// A 12x12 open arena with a 20 hp hero at (5, 5).
    pub fn new() -> Self {
        let mut hero = Actor::new("hero");
        hero.position = Position::new(5, 5);
        hero.hit_points = HitPoints::new(20);
        Self::with_player(hero)
    }

    /// An open arena around a custom player.
    pub fn with_player(player: Actor) -> Self {
        Self::with_world(World::new(GameMap::open(12, 12), player))
    }

    pub fn with_world(world: World) -> Self {
        let rolls = ScriptedRoller::empty();
        let engine = Engine::new(world).with_roller(rolls.clone());
        Self { engine, rolls }
    }

    /// Queue die results for upcoming rolls.
    pub fn roll(&mut self, rolls: impl IntoIterator<Item = u32>) -> &mut Self {
        self.rolls.push(rolls);
        self
    }

    pub fn remaining_rolls(&self) -> usize {
        self.rolls.remaining()
    }

    pub fn spawn(&mut self, actor: Actor) -> ActorId {
        self.engine.world.spawn(actor)
    }

    /// Place a bundled monster.
    ///
    /// # Panics
    ///
    /// If the bestiary has no such template.
    pub fn spawn_monster(&mut self, name: &str, at: Position) -> ActorId {
        let monster = bestiary::spawn(name, at)
            .unwrap_or_else(|err| panic!("cannot spawn {name}: {err}"));
        self.spawn(monster)
    }

    /// Take a player turn.
    pub fn act(&mut self, intent: Intent) -> Result<TurnReport, ActionError> {
        self.engine.player_turn(intent)
    }

    /// Resolve a player intent without giving anyone else a turn.
    pub fn resolve(&mut self, intent: Intent) -> Result<Resolution, ActionError> {
        let player = self.player_id();
        self.engine.perform(player, &intent)
    }

    /// Resolve an intent for any actor.
    pub fn resolve_for(&mut self, actor: ActorId, intent: Intent) -> Result<Resolution, ActionError> {
        self.engine.perform(actor, &intent)
    }

    pub fn player_id(&self) -> ActorId {
        self.engine.player_id()
    }

    pub fn actor(&self, id: ActorId) -> &Actor {
        self.engine
            .world
            .actor(id)
            .unwrap_or_else(|| panic!("no actor {id}"))
    }

    pub fn actor_mut(&mut self, id: ActorId) -> &mut Actor {
        self.engine
            .world
            .actor_mut(id)
            .unwrap_or_else(|| panic!("no actor {id}"))
    }

    pub fn player(&self) -> &Actor {
        self.actor(self.player_id())
    }

    pub fn player_mut(&mut self) -> &mut Actor {
        let id = self.player_id();
        self.actor_mut(id)
    }

    /// Player HP as (current, max).
    pub fn player_hp(&self) -> (i32, i32) {
        let hp = self.player().hit_points;
        (hp.current, hp.maximum)
    }

    pub fn hp(&self, id: ActorId) -> i32 {
        self.actor(id).hit_points.current
    }

    pub fn is_dead(&self, id: ActorId) -> bool {
        self.engine.world.actor(id).map_or(true, |a| a.is_dead)
    }

    pub fn turn(&self) -> u64 {
        self.engine.clock.current_turn()
    }

    /// Check if any log message contains `needle`.
    pub fn logged(&self, needle: &str) -> bool {
        self.engine.log.contains(needle)
    }

    pub fn last_message(&self) -> Option<&str> {
        self.engine.log.last().map(|m| m.text.as_str())
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Assert player HP is at expected values.
#[track_caller]
pub fn assert_hp(harness: &TestHarness, current: i32, max: i32) {
    let (actual_current, actual_max) = harness.player_hp();
    assert_eq!(
        (actual_current, actual_max),
        (current, max),
        "Expected HP {current}/{max}, got {actual_current}/{actual_max}"
    );
}

/// Assert some log message contains `needle`.
#[track_caller]
pub fn assert_logged(harness: &TestHarness, needle: &str) {
    assert!(
        harness.logged(needle),
        "Expected a log message containing {needle:?}, log was {:?}",
        harness
            .engine
            .log
            .messages()
            .iter()
            .map(|m| m.full_text())
            .collect::<Vec<_>>()
    );
}

/// Assert the clock reads `turn`.
#[track_caller]
pub fn assert_turn(harness: &TestHarness, turn: u64) {
    assert_eq!(harness.turn(), turn, "Expected turn {turn}, got {}", harness.turn());
}
