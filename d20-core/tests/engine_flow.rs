//! Whole player turns: the player acts, then everyone else does.

use d20_core::effects::{self, TimedEffect, SHIELD, SUMMON_MARKER};
use d20_core::feats::QUICK_DRAW;
use d20_core::testing::{assert_hp, assert_logged, assert_turn, TestHarness};
use d20_core::world::Weapon;
use d20_core::{
    ActionError, ActionOutcome, ActorBuilder, CombatMode, DamageDice, Intent, Position,
    WorldClock,
};

#[test]
fn test_monster_attacks_after_player_waits() {
    let mut harness = TestHarness::new();
    harness.spawn_monster("goblin", Position::new(6, 5));

    // A Small morningstar rolls a d6: 4 damage, then 15 to hit.
    harness.roll([4, 15]);
    let report = harness.act(Intent::Wait).unwrap();
    assert_eq!(report.others.len(), 1);
    assert_eq!(report.others[0].attack_count(), 1);
    assert_hp(&harness, 16, 20);
    assert_logged(&harness, "Goblin bashes hero for 4 hit points.");
    assert_turn(&harness, 1);
}

#[test]
fn test_blocked_monster_loses_its_turn_quietly() {
    let mut harness = TestHarness::new();
    let rat = ActorBuilder::new()
        .name("rat")
        .hit_points(2)
        .at(Position::new(10, 10))
        .build()
        .unwrap();
    let rat = harness.spawn(rat);
    for (dx, dy) in [(-1, -1), (-1, 0), (-1, 1), (0, -1), (0, 1), (1, -1), (1, 0), (1, 1)] {
        harness
            .engine
            .world
            .map
            .set_walkable(Position::new(10 + dx, 10 + dy), false);
    }

    let report = harness.act(Intent::Wait).unwrap();
    assert!(report.others.is_empty());
    assert_eq!(harness.actor(rat).position, Position::new(10, 10));
    assert!(!harness.logged("That way is blocked."));
}

#[test]
fn test_monster_closes_distance() {
    let mut harness = TestHarness::new();
    let rat = ActorBuilder::new()
        .name("rat")
        .hit_points(2)
        .at(Position::new(9, 5))
        .build()
        .unwrap();
    let rat = harness.spawn(rat);

    harness.act(Intent::Wait).unwrap();
    assert_eq!(harness.actor(rat).position, Position::new(8, 5));
    // Monster moves do not move the clock.
    assert_turn(&harness, 1);
}

#[test]
fn test_bump_attacks_hostiles() {
    let mut harness = TestHarness::new();
    let goblin = ActorBuilder::new()
        .name("goblin")
        .hit_points(1)
        .at(Position::new(6, 5))
        .build()
        .unwrap();
    let goblin = harness.spawn(goblin);

    // Unarmed 1d3 for 2, then 15 to hit.
    harness.roll([2, 15]);
    let report = harness.act(Intent::Bump { dx: 1, dy: 0 }).unwrap();
    assert!(harness.is_dead(goblin));
    assert!(report.others.is_empty());
    assert_eq!(harness.player().position, Position::new(5, 5));
    assert_logged(&harness, "Hero punches goblin for 2 hit points.");
    assert_logged(&harness, "Goblin is dead!");
    // The end-of-turn sweep clears the body away.
    assert!(harness.engine.world.actor(goblin).is_none());
    assert_eq!(harness.engine.world.actors.len(), 1);

    // Nothing blocks the way.
    harness.act(Intent::Bump { dx: 1, dy: 0 }).unwrap();
    assert_eq!(harness.player().position, Position::new(6, 5));
}

#[test]
fn test_bump_into_an_ally_is_blocked() {
    let mut harness = TestHarness::new();
    let badger = ActorBuilder::new()
        .name("celestial badger")
        .hit_points(6)
        .at(Position::new(6, 5))
        .summoned_until(20)
        .build()
        .unwrap();
    harness.spawn(badger);

    let err = harness.act(Intent::Bump { dx: 1, dy: 0 }).unwrap_err();
    assert_eq!(err.to_string(), "That way is blocked.");
    assert_turn(&harness, 0);
    assert_eq!(harness.last_message(), Some("That way is blocked."));
}

#[test]
fn test_quick_draw_toggle_is_free() {
    let hero = ActorBuilder::new()
        .name("hero")
        .hit_points(20)
        .feat(QUICK_DRAW)
        .ranged_weapon(Weapon::new("short bow", "shoots", DamageDice::new(1, 6)))
        .at(Position::new(5, 5))
        .build()
        .unwrap();
    let mut harness = TestHarness::with_player(hero);
    // Adjacent, but never gets to act: the roller has nothing queued.
    harness.spawn_monster("goblin", Position::new(6, 5));

    let report = harness.act(Intent::ToggleCombatMode).unwrap();
    assert_eq!(report.player.outcome, ActionOutcome::Free);
    assert!(report.others.is_empty());
    assert_eq!(harness.player().combat_mode, CombatMode::Ranged);
    assert_logged(&harness, "Hero quickly shifts to a ranged weapon.");
    assert_turn(&harness, 0);
}

#[test]
fn test_slow_toggle_takes_a_turn() {
    let hero = ActorBuilder::new()
        .name("hero")
        .hit_points(20)
        .ranged_weapon(Weapon::new("short bow", "shoots", DamageDice::new(1, 6)))
        .at(Position::new(5, 5))
        .build()
        .unwrap();
    let mut harness = TestHarness::with_player(hero);

    let report = harness.act(Intent::ToggleCombatMode).unwrap();
    assert_eq!(report.player.outcome, ActionOutcome::TurnTaken);
    assert_logged(&harness, "Now in ranged mode.");
    assert_turn(&harness, 1);
}

#[test]
fn test_player_death_ends_the_game() {
    let mut harness = TestHarness::new();
    harness.player_mut().hit_points.current = 3;
    harness.spawn_monster("goblin", Position::new(6, 5));

    harness.roll([4, 15]);
    harness.act(Intent::Wait).unwrap();
    assert!(harness.engine.is_player_dead());
    assert_logged(&harness, "You died!");

    let err = harness.act(Intent::Wait).unwrap_err();
    assert_eq!(err.to_string(), "You are dead.");
    assert_turn(&harness, 1);
}

#[test]
fn test_action_failing_part_way_is_rolled_back() {
    let mut harness = TestHarness::new();
    harness.engine.clock = WorldClock::starting_at(5);
    effects::attach(harness.player_mut(), SHIELD, TimedEffect::new(3, 0));
    // A summon whose time ran out but has not been swept yet.
    let badger = ActorBuilder::new()
        .name("celestial badger")
        .hit_points(6)
        .at(Position::new(6, 5))
        .summoned_until(3)
        .build()
        .unwrap();
    let badger = harness.spawn(badger);
    harness.actor_mut(badger).hit_points.current = 2;

    // The rest heals a point, then its first tick dismisses the resting
    // badger and the next lookup fails.
    let err = harness
        .resolve_for(badger, Intent::Rest { turns: None })
        .unwrap_err();
    assert_eq!(err, ActionError::UnknownActor(badger));
    assert!(!err.is_impossible());

    assert_eq!(harness.hp(badger), 2);
    assert!(harness.actor(badger).effects.contains(SUMMON_MARKER));
    assert!(harness.player().effects.contains(SHIELD));
    assert_turn(&harness, 5);
    assert!(!harness.logged("vanishes"));
    assert!(!harness.logged("fades"));
}
