//! Casting gates, healing, area spells and breath weapons.

use d20_core::testing::{assert_hp, assert_logged, assert_turn, TestHarness};
use d20_core::world::AbilityScores;
use d20_core::{ActorBuilder, ActorId, Effect, Intent, Position, Tone};

fn caster(level: u32, mana: i32) -> ActorBuilder {
    ActorBuilder::new()
        .name("hero")
        .hit_points(12)
        .level(level)
        .mana(mana)
        .abilities(AbilityScores::new(10, 12, 10, 14, 10, 10))
        .at(Position::new(5, 5))
}

fn cast(spell: &str, target: Option<Position>) -> Intent {
    Intent::CastSpell {
        spell: spell.to_string(),
        target,
    }
}

fn spawn_dummy(harness: &mut TestHarness, name: &str, at: Position) -> ActorId {
    let dummy = ActorBuilder::new()
        .name(name)
        .hit_points(10)
        .at(at)
        .build()
        .unwrap();
    harness.spawn(dummy)
}

#[test]
fn test_no_mana_rejects_without_side_effects() {
    let hero = caster(1, 0).spell("Magic Missile", 1).build().unwrap();
    let mut harness = TestHarness::with_player(hero);
    let goblin = spawn_dummy(&mut harness, "goblin", Position::new(7, 5));

    for _ in 0..2 {
        let err = harness
            .act(cast("Magic Missile", Some(Position::new(7, 5))))
            .unwrap_err();
        assert_eq!(err.to_string(), "You do not have enough mana for that.");
    }
    assert_eq!(harness.player().mana.current, 0);
    assert_eq!(harness.hp(goblin), 10);
    assert_turn(&harness, 0);

    let last = harness.engine.log.last().unwrap();
    assert_eq!(last.tone, Tone::Impossible);
    assert_eq!(last.count, 2);
}

#[test]
fn test_gate_order() {
    let hero = caster(2, 10).spell("Summon Monster 3", 3).build().unwrap();
    let mut harness = TestHarness::with_player(hero);

    let err = harness
        .act(cast("Fireball", Some(Position::new(7, 5))))
        .unwrap_err();
    assert_eq!(err.to_string(), "You don't know Fireball.");

    let err = harness
        .act(cast("Summon Monster 3", Some(Position::new(6, 5))))
        .unwrap_err();
    assert_eq!(err.to_string(), "You are not high enough level to cast that.");
    assert_eq!(harness.player().mana.current, 10);
    assert_eq!(harness.engine.world.actors.len(), 1);
}

#[test]
fn test_cure_clamps_to_missing_hit_points() {
    let hero = caster(1, 2).spell("Cure Light Wounds", 1).build().unwrap();
    let mut harness = TestHarness::with_player(hero);
    harness.player_mut().hit_points.current = 9;

    // d8 of 8 plus caster level 1 would restore 9.
    harness.roll([8]);
    let report = harness.act(cast("Cure Light Wounds", None)).unwrap();
    assert_hp(&harness, 12, 12);
    assert_eq!(harness.player().mana.current, 1);
    assert_logged(&harness, "Hero heals 3 hps.");
    assert!(report.effects().any(|e| matches!(
        e,
        Effect::HpChanged { amount: 3, new_current: 12, .. }
    )));
}

#[test]
fn test_cure_someone_else() {
    let hero = caster(3, 4).spell("Cure Moderate Wounds", 2).build().unwrap();
    let mut harness = TestHarness::with_player(hero);
    let ally = ActorBuilder::new()
        .name("celestial badger")
        .hit_points(20)
        .at(Position::new(6, 5))
        .summoned_until(50)
        .build()
        .unwrap();
    let ally = harness.spawn(ally);
    harness.actor_mut(ally).hit_points.current = 5;

    // 2d8 of 2 and 3 plus caster level 3.
    harness.roll([2, 3]);
    harness
        .resolve(cast("Cure Moderate Wounds", Some(Position::new(6, 5))))
        .unwrap();
    assert_eq!(harness.hp(ally), 13);
    assert_logged(&harness, "Celestial badger heals 8 hps.");

    let err = harness
        .resolve(cast("Cure Moderate Wounds", Some(Position::new(8, 8))))
        .unwrap_err();
    assert_eq!(err.to_string(), "There is no one there to heal.");
}

#[test]
fn test_burning_hands_saves_separately() {
    let hero = caster(2, 3).spell("Burning Hands", 1).build().unwrap();
    let mut harness = TestHarness::with_player(hero);
    let kobold = spawn_dummy(&mut harness, "kobold", Position::new(6, 5));
    let goblin = spawn_dummy(&mut harness, "goblin", Position::new(7, 5));
    let orc = spawn_dummy(&mut harness, "orc", Position::new(7, 6));
    let bystander = spawn_dummy(&mut harness, "rat", Position::new(5, 7));

    // 2d4 for 7, then reflex saves against DC 13: natural 20, natural 1, 13.
    harness.roll([3, 4, 20, 1, 13]);
    let resolution = harness
        .resolve(cast("Burning Hands", Some(Position::new(8, 5))))
        .unwrap();

    assert_eq!(harness.hp(kobold), 7);
    assert_eq!(harness.hp(goblin), 3);
    assert_eq!(harness.hp(orc), 7);
    assert_eq!(harness.hp(bystander), 10);
    let saves: Vec<bool> = resolution
        .effects
        .iter()
        .filter_map(|e| match e {
            Effect::SaveRolled { dc, success, .. } => {
                assert_eq!(*dc, 13);
                Some(*success)
            }
            _ => None,
        })
        .collect();
    assert_eq!(saves, vec![true, false, true]);
    assert_logged(
        &harness,
        "Hero sprays fire. Kobold takes 3 damage. Goblin takes 7 damage. Orc takes 3 damage.",
    );
    assert_eq!(harness.player().mana.current, 2);
}

#[test]
fn test_burning_hands_into_empty_air() {
    let hero = caster(1, 1).spell("Burning Hands", 1).build().unwrap();
    let mut harness = TestHarness::with_player(hero);

    harness.roll([2]);
    harness
        .resolve(cast("Burning Hands", Some(Position::new(5, 2))))
        .unwrap();
    assert_logged(&harness, "Hero sprays fire but no one is hit.");
    assert_eq!(harness.player().mana.current, 0);
}

#[test]
fn test_shocking_grasp_needs_a_touch() {
    let hero = caster(1, 2).spell("Shocking Grasp", 1).build().unwrap();
    let mut harness = TestHarness::with_player(hero);
    let goblin = spawn_dummy(&mut harness, "goblin", Position::new(7, 5));

    let err = harness
        .resolve(cast("Shocking Grasp", Some(Position::new(7, 5))))
        .unwrap_err();
    assert_eq!(err.to_string(), "That target is too far (Melee only)");
    assert_eq!(harness.player().mana.current, 2);

    harness.actor_mut(goblin).position = Position::new(6, 6);
    // 1d6 of 5, touch attack 12 against touch AC 10.
    harness.roll([5, 12]);
    harness
        .resolve(cast("Shocking Grasp", Some(Position::new(6, 6))))
        .unwrap();
    assert_eq!(harness.hp(goblin), 5);
    assert_logged(&harness, "Hero shocks goblin for 5 hit points.");
    assert_eq!(harness.player().mana.current, 1);
}

#[test]
fn test_buff_raises_armor_class() {
    let hero = caster(1, 2).spell("Mage Armor", 1).build().unwrap();
    let mut harness = TestHarness::with_player(hero);
    let before = harness.player().armor_class();

    harness.resolve(cast("Mage Armor", None)).unwrap();
    assert_eq!(harness.player().armor_class(), before + 4);
    assert_logged(&harness, "Hero gains Mage Armor.");
    assert_eq!(
        harness
            .player()
            .effects
            .get("Mage Armor")
            .unwrap()
            .expires_at_turn,
        600
    );
}

#[test]
fn test_breath_weapon_cone() {
    let mut harness = TestHarness::new();
    let dragon = harness.spawn_monster("young white dragon", Position::new(1, 5));

    // 4d6 for 10, then the hero's reflex save of 5 against DC 22.
    harness.roll([1, 2, 3, 4, 5]);
    harness
        .resolve_for(dragon, Intent::BreathWeapon { aim: Position::new(5, 5) })
        .unwrap();
    assert_hp(&harness, 10, 20);
    assert_logged(
        &harness,
        "Young white dragon breathes cone of frost on hero save failed for 10 hit points.",
    );
}

#[test]
fn test_no_breath_weapon() {
    let mut harness = TestHarness::new();
    let err = harness
        .resolve(Intent::BreathWeapon { aim: Position::new(6, 5) })
        .unwrap_err();
    assert_eq!(err.to_string(), "You have no breath weapon.");
}
