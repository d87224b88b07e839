//! Spell catalogue and spellcasting.
//!
//! Every cast goes through the same gate: the caster must know the spell,
//! afford its mana cost, and be at least as high level as that cost. Mana is
//! spent once, after the spell has fully resolved, whether or not it hit.

use crate::actor_builder::ActorBuilder;
use crate::bestiary;
use crate::combat::{resolve_attack, AttackContext};
use crate::dice::DamageDice;
use crate::effects::{TimedEffect, ALTER_SELF, MAGE_ARMOR, MAGIC_WEAPON, RAY_OF_ENFEEBLEMENT, SHIELD};
use crate::error::ActionError;
use crate::message::Tone;
use crate::rules::{ActionContext, ActionOutcome, Effect};
use crate::saves::{self, SaveKind};
use crate::targeting::{self, in_melee_reach, Cone};
use crate::world::{Ability, Actor, ActorId, Position};
use std::collections::HashMap;
use std::sync::LazyLock;

pub const BURNING_HANDS_RADIUS: i32 = 3;

/// Self-targeted spells that leave a timed effect named after the spell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuffSpell {
    MageArmor,
    Shield,
    MagicWeapon,
    AlterSelf,
}

impl BuffSpell {
    pub fn effect_name(&self) -> &'static str {
        match self {
            BuffSpell::MageArmor => MAGE_ARMOR,
            BuffSpell::Shield => SHIELD,
            BuffSpell::MagicWeapon => MAGIC_WEAPON,
            BuffSpell::AlterSelf => ALTER_SELF,
        }
    }

    /// Turns the buff lasts at the given caster level.
    pub fn duration(&self, caster_level: u32) -> u64 {
        let per_level = match self {
            BuffSpell::MageArmor => 600,
            BuffSpell::Shield | BuffSpell::MagicWeapon => 10,
            BuffSpell::AlterSelf => 100,
        };
        u64::from(caster_level) * per_level
    }
}

/// The four cure spells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HealTier {
    Light,
    Moderate,
    Serious,
    Critical,
}

impl HealTier {
    pub fn dice(&self) -> DamageDice {
        match self {
            HealTier::Light => DamageDice::new(1, 8),
            HealTier::Moderate => DamageDice::new(2, 8),
            HealTier::Serious => DamageDice::new(3, 8),
            HealTier::Critical => DamageDice::new(4, 8),
        }
    }

    /// Most the caster level can add to the roll.
    pub fn level_cap(&self) -> u32 {
        match self {
            HealTier::Light => 5,
            HealTier::Moderate => 10,
            HealTier::Serious => 15,
            HealTier::Critical => 20,
        }
    }

    pub fn bonus(&self, caster_level: u32) -> i32 {
        caster_level.min(self.level_cap()) as i32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpellKind {
    MagicMissile,
    BurningHands,
    ShockingGrasp,
    ScorchingRay,
    RayOfEnfeeblement,
    Buff(BuffSpell),
    Heal(HealTier),
    /// Calls the named bestiary template.
    Summon(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpellInfo {
    pub name: &'static str,
    pub kind: SpellKind,
}

impl SpellInfo {
    /// Whether the spell has to be aimed at a tile.
    pub fn needs_target(&self) -> bool {
        !matches!(self.kind, SpellKind::Buff(_) | SpellKind::Heal(_))
    }
}

fn build_spell_catalogue() -> HashMap<String, SpellInfo> {
    let spells = [
        ("Magic Missile", SpellKind::MagicMissile),
        ("Burning Hands", SpellKind::BurningHands),
        ("Shocking Grasp", SpellKind::ShockingGrasp),
        ("Scorching Ray", SpellKind::ScorchingRay),
        (RAY_OF_ENFEEBLEMENT, SpellKind::RayOfEnfeeblement),
        (MAGE_ARMOR, SpellKind::Buff(BuffSpell::MageArmor)),
        (SHIELD, SpellKind::Buff(BuffSpell::Shield)),
        (MAGIC_WEAPON, SpellKind::Buff(BuffSpell::MagicWeapon)),
        (ALTER_SELF, SpellKind::Buff(BuffSpell::AlterSelf)),
        ("Cure Light Wounds", SpellKind::Heal(HealTier::Light)),
        ("Cure Moderate Wounds", SpellKind::Heal(HealTier::Moderate)),
        ("Cure Serious Wounds", SpellKind::Heal(HealTier::Serious)),
        ("Cure Critical Wounds", SpellKind::Heal(HealTier::Critical)),
        ("Summon Monster 1", SpellKind::Summon("celestial badger")),
        ("Summon Monster 2", SpellKind::Summon("celestial riding dog")),
        ("Summon Monster 3", SpellKind::Summon("celestial dire badger")),
    ];
    spells
        .into_iter()
        .map(|(name, kind)| (name.to_lowercase(), SpellInfo { name, kind }))
        .collect()
}

static SPELL_CATALOGUE: LazyLock<HashMap<String, SpellInfo>> = LazyLock::new(build_spell_catalogue);

/// Look up a spell by name (case-insensitive).
pub fn get_spell(name: &str) -> Option<&'static SpellInfo> {
    SPELL_CATALOGUE.get(&name.to_lowercase())
}

/// Get all spells in the catalogue.
pub fn all_spells() -> impl Iterator<Item = &'static SpellInfo> {
    SPELL_CATALOGUE.values()
}

/// Range in squares of ray spells.
pub fn ray_range(caster_level: u32) -> f64 {
    5.0 + f64::from(caster_level / 2)
}

pub fn scorching_ray_dice(caster_level: u32) -> DamageDice {
    let count = if caster_level >= 11 {
        12
    } else if caster_level >= 7 {
        8
    } else {
        4
    };
    DamageDice::new(count, 6)
}

/// Check that `caster` may cast `spell` right now and return its cost.
pub fn check_castable(caster: &Actor, spell: &str) -> Result<u32, ActionError> {
    let cost = caster
        .spell_cost(spell)
        .ok_or_else(|| ActionError::impossible(format!("You don't know {spell}.")))?;
    if !caster.mana.can_afford(cost) {
        return Err(ActionError::impossible("You do not have enough mana for that."));
    }
    if cost > caster.level.current {
        return Err(ActionError::impossible(
            "You are not high enough level to cast that.",
        ));
    }
    Ok(cost)
}

/// Cast a known spell, optionally aimed at a tile.
pub fn cast_spell(
    ctx: &mut ActionContext<'_>,
    spell: &str,
    target: Option<Position>,
) -> Result<ActionOutcome, ActionError> {
    let cost = check_castable(ctx.actor()?, spell)?;
    let info = get_spell(spell)
        .ok_or_else(|| ActionError::impossible(format!("{spell} has no effect.")))?;
    if info.needs_target() && target.is_none() {
        return Err(ActionError::impossible("That spell needs a target."));
    }

    tracing::debug!(caster = %ctx.actor, spell = info.name, cost, "casting");
    match (info.kind, target) {
        (SpellKind::MagicMissile, Some(at)) => magic_missile(ctx, at)?,
        (SpellKind::BurningHands, Some(at)) => burning_hands(ctx, at)?,
        (SpellKind::ShockingGrasp, Some(at)) => shocking_grasp(ctx, at)?,
        (SpellKind::ScorchingRay, Some(at)) => scorching_ray(ctx, at)?,
        (SpellKind::RayOfEnfeeblement, Some(at)) => ray_of_enfeeblement(ctx, at)?,
        (SpellKind::Summon(template), Some(at)) => summon(ctx, template, at)?,
        (SpellKind::Buff(buff), _) => self_buff(ctx, buff)?,
        (SpellKind::Heal(tier), aim) => cure(ctx, tier, aim)?,
        (_, None) => return Err(ActionError::impossible("That spell needs a target.")),
    }

    let caster = ctx.actor;
    ctx.change_mana(caster, -(cost as i32));
    Ok(ActionOutcome::TurnTaken)
}

/// Breathe the actor's breath weapon in a cone toward `aim`.
///
/// Every hostile in the cone saves separately against the same roll, taking
/// half on a success.
pub fn breathe(ctx: &mut ActionContext<'_>, aim: Position) -> Result<ActionOutcome, ActionError> {
    let actor = ctx.actor()?;
    let breath = actor
        .breath_weapon
        .clone()
        .ok_or_else(|| ActionError::impossible("You have no breath weapon."))?;
    let cone = Cone::aimed(actor.position, aim, breath.radius)?;
    let dc = 10 + i32::from(actor.abilities.constitution) / 2 + actor.level.current as i32 / 2;
    let name = actor.display_name();
    let victims = hostiles_in_cone(ctx, &cone)?;
    let tone = ctx.attack_tone();

    let damage = ctx.roller.roll(breath.damage) as i32;
    if victims.is_empty() {
        ctx.say(
            format!("{name} breathes {} but catches no one.", breath.name),
            tone,
        );
        return Ok(ActionOutcome::TurnTaken);
    }

    for victim in victims {
        let (saved, dealt) = reflex_for_half(ctx, victim, damage, dc)?;
        let victim_name = ctx.target(victim)?.name.clone();
        let verdict = if saved { "save made" } else { "save failed" };
        ctx.say(
            format!(
                "{name} breathes {} on {victim_name} {verdict} for {dealt} hit points.",
                breath.name
            ),
            tone,
        );
        ctx.damage(victim, dealt);
    }
    Ok(ActionOutcome::TurnTaken)
}

fn magic_missile(ctx: &mut ActionContext<'_>, at: Position) -> Result<(), ActionError> {
    let target = targeting::require_target(ctx.world, ctx.actor, at)?;
    let caster = ctx.actor()?;
    let missiles = ((caster.level.current + 1) / 2).min(5);
    let description = format!("{} zaps {}", caster.display_name(), ctx.target(target)?.name);
    let tone = ctx.attack_tone();

    let damage: i32 = (0..missiles)
        .map(|_| ctx.roller.roll_die(4) as i32 + 1)
        .sum();
    remember_target(ctx, target);
    if damage > 0 {
        ctx.say(format!("{description} for {damage} hit points."), tone);
    } else {
        ctx.say(format!("{description} but does no damage."), tone);
    }
    ctx.damage(target, damage);
    Ok(())
}

fn burning_hands(ctx: &mut ActionContext<'_>, at: Position) -> Result<(), ActionError> {
    let caster = ctx.actor()?;
    let cone = Cone::aimed(caster.position, at, BURNING_HANDS_RADIUS)?;
    let dc = 11 + caster.modifier(Ability::Intelligence);
    let dice = DamageDice::new(caster.level.current.min(5), 4);
    let name = caster.display_name();
    let victims = hostiles_in_cone(ctx, &cone)?;
    let tone = ctx.attack_tone();

    let damage = ctx.roller.roll(dice) as i32;
    let mut text = format!("{name} sprays fire");
    if victims.is_empty() {
        text.push_str(" but no one is hit.");
        ctx.say(text, tone);
        return Ok(());
    }

    text.push('.');
    let mut dealt_to = Vec::with_capacity(victims.len());
    for victim in victims {
        let (_, dealt) = reflex_for_half(ctx, victim, damage, dc)?;
        let victim_name = ctx.target(victim)?.display_name();
        text.push_str(&format!(" {victim_name} takes {dealt} damage."));
        dealt_to.push((victim, dealt));
    }
    ctx.say(text, tone);
    for (victim, dealt) in dealt_to {
        ctx.damage(victim, dealt);
    }
    Ok(())
}

fn shocking_grasp(ctx: &mut ActionContext<'_>, at: Position) -> Result<(), ActionError> {
    let target = targeting::require_target(ctx.world, ctx.actor, at)?;
    let caster = ctx.actor()?;
    if !in_melee_reach(caster.position, at, ctx.config.touch_reach) {
        return Err(ActionError::impossible("That target is too far (Melee only)"));
    }
    let dice = DamageDice::new(caster.level.current.min(5), 6);
    let to_hit = caster.melee_to_hit();
    let defender = ctx.target(target)?;
    let defense = defender.touch_ac();
    let description = format!("{} shocks {}", caster.display_name(), defender.name);

    let base_damage = ctx.roller.roll(dice) as i32;
    touch_attack(ctx, target, AttackContext::new(to_hit, defense, base_damage, description));
    Ok(())
}

fn scorching_ray(ctx: &mut ActionContext<'_>, at: Position) -> Result<(), ActionError> {
    let target = ray_target(ctx, at)?;
    let caster = ctx.actor()?;
    let dice = scorching_ray_dice(caster.level.current);
    let to_hit = caster.ranged_to_hit();
    let defender = ctx.target(target)?;
    let defense = defender.touch_ac();
    let description = format!("{} scorches {}", caster.display_name(), defender.name);

    let base_damage = ctx.roller.roll(dice) as i32;
    touch_attack(ctx, target, AttackContext::new(to_hit, defense, base_damage, description));
    Ok(())
}

fn ray_of_enfeeblement(ctx: &mut ActionContext<'_>, at: Position) -> Result<(), ActionError> {
    let target = ray_target(ctx, at)?;
    let caster = ctx.actor()?;
    let level = caster.level.current;
    let to_hit = caster.ranged_to_hit();
    let defender = ctx.target(target)?;
    let defense = defender.touch_ac();
    let target_name = defender.name.clone();
    let description = format!("{} shoots a grey beam at {}", caster.display_name(), target_name);
    let tone = ctx.attack_tone();

    remember_target(ctx, target);
    let result = resolve_attack(&mut *ctx.roller, AttackContext::new(to_hit, defense, 1, ""));
    let attacker = ctx.actor;
    ctx.emit(Effect::AttackResolved {
        attacker,
        target,
        outcome: result.outcome,
        first_roll: result.first_roll,
        damage: 0,
    });
    if !result.outcome.is_hit() {
        ctx.say(format!("{description} and misses."), tone);
        return Ok(());
    }

    let penalty = ctx.roller.roll_die(6) as i32 + level.min(5) as i32;
    let refreshed = ctx.target(target)?.effects.contains(RAY_OF_ENFEEBLEMENT);
    let effect = TimedEffect::new(ctx.clock.expiry_after(10 * u64::from(level)), penalty);
    ctx.emit(Effect::TimedEffectApplied {
        target,
        name: RAY_OF_ENFEEBLEMENT.to_string(),
        effect,
        refreshed,
    });
    let drained = ctx
        .target(target)?
        .effects
        .get(RAY_OF_ENFEEBLEMENT)
        .map_or(0, |e| e.magnitude);
    ctx.say(format!("{description} lowering str by {drained}."), tone);
    Ok(())
}

fn self_buff(ctx: &mut ActionContext<'_>, buff: BuffSpell) -> Result<(), ActionError> {
    let caster = ctx.actor()?;
    let name = caster.display_name();
    let effect_name = buff.effect_name();
    let refreshed = caster.effects.contains(effect_name);
    let expires_at_turn = ctx.clock.expiry_after(buff.duration(caster.level.current));

    let target = ctx.actor;
    ctx.emit(Effect::TimedEffectApplied {
        target,
        name: effect_name.to_string(),
        effect: TimedEffect::new(expires_at_turn, 0),
        refreshed,
    });
    let verb = if refreshed { "refreshes" } else { "gains" };
    ctx.say(format!("{name} {verb} {effect_name}."), Tone::Info);
    Ok(())
}

fn cure(ctx: &mut ActionContext<'_>, tier: HealTier, aim: Option<Position>) -> Result<(), ActionError> {
    let caster = ctx.actor()?;
    let bonus = tier.bonus(caster.level.current);
    let patient = match aim {
        Some(at) if at != caster.position => ctx
            .world
            .actor_at(at)
            .ok_or_else(|| ActionError::impossible("There is no one there to heal."))?,
        _ => caster,
    };
    if patient.hit_points.is_full() {
        return Err(ActionError::impossible(if patient.id == ctx.actor {
            "You do not need healing.".to_string()
        } else {
            format!("{} does not need healing.", patient.display_name())
        }));
    }
    let patient_id = patient.id;
    let patient_name = patient.display_name();

    let rolled = ctx.roller.roll(tier.dice()) as i32 + bonus;
    let restored = ctx.heal(patient_id, rolled);
    ctx.say(format!("{patient_name} heals {restored} hps."), Tone::Info);
    Ok(())
}

fn summon(ctx: &mut ActionContext<'_>, creature: &str, at: Position) -> Result<(), ActionError> {
    if !ctx.world.is_open(at) {
        return Err(ActionError::impossible("You can't summon there."));
    }
    let caster = ctx.actor()?;
    let name = caster.display_name();
    let expires_at_turn = ctx.clock.expiry_after(u64::from(caster.level.current));
    let template = bestiary::template(creature)
        .ok_or_else(|| ActionError::impossible(format!("Nothing answers the call for {creature}.")))?;
    let creature = ActorBuilder::from_template(template)
        .at(at)
        .summoned_until(expires_at_turn)
        .build()
        .map_err(|err| ActionError::impossible(format!("The summoning fails: {err}")))?;

    let summoner = ctx.actor;
    let creature_name = creature.name.clone();
    ctx.emit(Effect::Summoned {
        summoner,
        actor: Box::new(creature),
    });
    ctx.say(format!("{name} summons a {creature_name}."), Tone::Info);
    Ok(())
}

/// Living target of a ray: visible and within ray range.
fn ray_target(ctx: &ActionContext<'_>, at: Position) -> Result<ActorId, ActionError> {
    let target = targeting::require_target(ctx.world, ctx.actor, at)?;
    if !ctx.world.map.is_visible(at) {
        return Err(ActionError::impossible("You can't see that target."));
    }
    let caster = ctx.actor()?;
    targeting::require_in_range(caster.position, at, ray_range(caster.level.current))?;
    Ok(target)
}

fn hostiles_in_cone(ctx: &ActionContext<'_>, cone: &Cone) -> Result<Vec<ActorId>, ActionError> {
    let caster = ctx.actor()?;
    Ok(ctx
        .world
        .living_actors()
        .filter(|other| other.id != caster.id && caster.is_hostile_to(other))
        .filter(|other| cone.contains(other.position))
        .map(|other| other.id)
        .collect())
}

/// Roll a reflex save for `victim`, recording it. Returns whether it saved and
/// the damage it takes.
fn reflex_for_half(
    ctx: &mut ActionContext<'_>,
    victim: ActorId,
    damage: i32,
    dc: i32,
) -> Result<(bool, i32), ActionError> {
    let defender = ctx.world.actor(victim).ok_or(ActionError::UnknownActor(victim))?;
    let saved = saves::make_save(&mut *ctx.roller, dc, defender, SaveKind::Reflex);
    ctx.emit(Effect::SaveRolled {
        target: victim,
        dc,
        success: saved,
    });
    let dealt = if saved { saves::half_damage(damage) } else { damage };
    Ok((saved, dealt))
}

fn touch_attack(ctx: &mut ActionContext<'_>, target: ActorId, attack: AttackContext) {
    remember_target(ctx, target);
    let result = resolve_attack(&mut *ctx.roller, attack);
    let attacker = ctx.actor;
    ctx.emit(Effect::AttackResolved {
        attacker,
        target,
        outcome: result.outcome,
        first_roll: result.first_roll,
        damage: result.damage,
    });
    let tone = ctx.attack_tone();
    ctx.say(result.description, tone);
    ctx.damage(target, result.damage);
}

fn remember_target(ctx: &mut ActionContext<'_>, target: ActorId) {
    if ctx.actor_is_player() {
        ctx.world.last_target = Some(target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::WorldClock;
    use crate::config::EngineConfig;
    use crate::testing::ScriptedRoller;
    use crate::world::{GameMap, HitPoints, Level, Mana, World};

    fn wizard(level: u32, mana: i32) -> Actor {
        let mut wizard = Actor::new("wizard");
        wizard.level = Level::new(level);
        wizard.mana = Mana::new(mana);
        wizard.hit_points = HitPoints::new(12);
        wizard.spells.insert("Magic Missile".into(), 1);
        wizard.spells.insert("Scorching Ray".into(), 2);
        wizard.spells.insert("Cure Light Wounds".into(), 1);
        wizard.spells.insert("Shield".into(), 1);
        wizard
    }

    fn arena(level: u32, mana: i32) -> (World, ActorId, ActorId) {
        let caster = wizard(level, mana);
        let caster_id = caster.id;
        let mut world = World::new(GameMap::open(12, 12), caster);
        let mut goblin = Actor::new("goblin");
        goblin.position = Position::new(3, 0);
        goblin.hit_points = HitPoints::new(30);
        let goblin_id = world.spawn(goblin);
        (world, caster_id, goblin_id)
    }

    #[test]
    fn test_gate_order() {
        let caster = wizard(1, 1);
        assert_eq!(
            check_castable(&caster, "Fireball").unwrap_err().to_string(),
            "You don't know Fireball."
        );
        assert_eq!(
            check_castable(&caster, "Scorching Ray").unwrap_err().to_string(),
            "You do not have enough mana for that."
        );
        let rich = wizard(1, 10);
        assert_eq!(
            check_castable(&rich, "Scorching Ray").unwrap_err().to_string(),
            "You are not high enough level to cast that."
        );
        assert_eq!(check_castable(&rich, "Magic Missile"), Ok(1));
    }

    #[test]
    fn test_durations_and_tiers() {
        assert_eq!(BuffSpell::MageArmor.duration(2), 1200);
        assert_eq!(BuffSpell::Shield.duration(3), 30);
        assert_eq!(BuffSpell::AlterSelf.duration(3), 300);
        assert_eq!(HealTier::Light.bonus(9), 5);
        assert_eq!(HealTier::Critical.bonus(9), 9);
        assert_eq!(scorching_ray_dice(6), DamageDice::new(4, 6));
        assert_eq!(scorching_ray_dice(7), DamageDice::new(8, 6));
        assert_eq!(scorching_ray_dice(11), DamageDice::new(12, 6));
        assert_eq!(ray_range(5), 7.0);
    }

    #[test]
    fn test_catalogue_is_case_insensitive() {
        assert_eq!(get_spell("magic missile").unwrap().name, "Magic Missile");
        assert!(get_spell("Summon Monster 3").is_some());
        assert!(!get_spell("Shield").unwrap().needs_target());
        assert!(get_spell("Wish").is_none());
    }

    #[test]
    fn test_magic_missile_auto_hits() {
        let (mut world, caster_id, goblin_id) = arena(3, 5);
        let mut clock = WorldClock::new();
        let mut roller = ScriptedRoller::new([2, 4]);
        let config = EngineConfig::default();
        let mut ctx = ActionContext::new(&mut world, &mut clock, &mut roller, &config, caster_id);

        let outcome = cast_spell(&mut ctx, "Magic Missile", Some(Position::new(3, 0))).unwrap();
        assert_eq!(outcome, ActionOutcome::TurnTaken);
        let resolution = ctx.finish(outcome);
        assert_eq!(resolution.narrative(), "Wizard zaps goblin for 8 hit points.");
        assert_eq!(world.actor(goblin_id).unwrap().hit_points.current, 22);
        assert_eq!(world.actor(caster_id).unwrap().mana.current, 4);
        assert_eq!(world.last_target, Some(goblin_id));
        assert_eq!(roller.remaining(), 0);
    }

    #[test]
    fn test_failed_gate_touches_nothing() {
        let (mut world, caster_id, _) = arena(1, 0);
        let mut clock = WorldClock::new();
        let mut roller = ScriptedRoller::empty();
        let config = EngineConfig::default();
        let mut ctx = ActionContext::new(&mut world, &mut clock, &mut roller, &config, caster_id);

        let err = cast_spell(&mut ctx, "Magic Missile", Some(Position::new(3, 0))).unwrap_err();
        assert_eq!(err.to_string(), "You do not have enough mana for that.");
        assert!(ctx.finish(ActionOutcome::Free).effects.is_empty());
        assert_eq!(world.actor(caster_id).unwrap().mana.current, 0);
    }

    #[test]
    fn test_scorching_ray_out_of_range() {
        let (mut world, caster_id, goblin_id) = arena(3, 5);
        world.actor_mut(goblin_id).unwrap().position = Position::new(9, 0);
        let mut clock = WorldClock::new();
        let mut roller = ScriptedRoller::empty();
        let config = EngineConfig::default();
        let mut ctx = ActionContext::new(&mut world, &mut clock, &mut roller, &config, caster_id);

        let err = cast_spell(&mut ctx, "Scorching Ray", Some(Position::new(9, 0))).unwrap_err();
        assert_eq!(err.to_string(), "That target is too far: 6 squares.");
        assert_eq!(world.actor(caster_id).unwrap().mana.current, 5);
    }

    #[test]
    fn test_missed_ray_still_costs_mana() {
        let (mut world, caster_id, goblin_id) = arena(3, 5);
        world.actor_mut(goblin_id).unwrap().stats.touch_ac = 30;
        let mut clock = WorldClock::new();
        // 4d6 damage, then a d20 that misses.
        let mut roller = ScriptedRoller::new([1, 1, 1, 1, 2]);
        let config = EngineConfig::default();
        let mut ctx = ActionContext::new(&mut world, &mut clock, &mut roller, &config, caster_id);

        cast_spell(&mut ctx, "Scorching Ray", Some(Position::new(3, 0))).unwrap();
        let resolution = ctx.finish(ActionOutcome::TurnTaken);
        assert_eq!(resolution.narrative(), "Wizard scorches goblin and misses.");
        assert_eq!(world.actor(caster_id).unwrap().mana.current, 3);
        assert_eq!(world.actor(goblin_id).unwrap().hit_points.current, 30);
    }

    #[test]
    fn test_shield_refreshes() {
        let (mut world, caster_id, _) = arena(2, 5);
        let mut clock = WorldClock::starting_at(7);
        let mut roller = ScriptedRoller::empty();
        let config = EngineConfig::default();
        let mut ctx = ActionContext::new(&mut world, &mut clock, &mut roller, &config, caster_id);

        cast_spell(&mut ctx, "Shield", None).unwrap();
        cast_spell(&mut ctx, "Shield", None).unwrap();
        let resolution = ctx.finish(ActionOutcome::TurnTaken);
        assert_eq!(
            resolution.narrative(),
            "Wizard gains Shield. Wizard refreshes Shield."
        );
        let caster = world.actor(caster_id).unwrap();
        assert_eq!(caster.effects.get(SHIELD).unwrap().expires_at_turn, 27);
        assert_eq!(caster.armor_class(), 14);
        assert_eq!(caster.mana.current, 3);
    }

    #[test]
    fn test_cure_requires_wounds() {
        let (mut world, caster_id, _) = arena(3, 5);
        let mut clock = WorldClock::new();
        let mut roller = ScriptedRoller::empty();
        let config = EngineConfig::default();
        let mut ctx = ActionContext::new(&mut world, &mut clock, &mut roller, &config, caster_id);

        let err = cast_spell(&mut ctx, "Cure Light Wounds", None).unwrap_err();
        assert_eq!(err.to_string(), "You do not need healing.");
    }

    #[test]
    fn test_summon_needs_open_tile() {
        let (mut world, caster_id, _) = arena(3, 5);
        world.actor_mut(caster_id).unwrap().spells.insert("Summon Monster 1".into(), 1);
        let mut clock = WorldClock::new();
        let mut roller = ScriptedRoller::empty();
        let config = EngineConfig::default();
        let mut ctx = ActionContext::new(&mut world, &mut clock, &mut roller, &config, caster_id);

        let err = cast_spell(&mut ctx, "Summon Monster 1", Some(Position::new(3, 0))).unwrap_err();
        assert_eq!(err.to_string(), "You can't summon there.");
        cast_spell(&mut ctx, "Summon Monster 1", Some(Position::new(1, 1))).unwrap();
        let resolution = ctx.finish(ActionOutcome::TurnTaken);
        assert_eq!(resolution.narrative(), "Wizard summons a celestial badger.");

        let badger = world.actor_at(Position::new(1, 1)).unwrap();
        assert!(badger.effects.is_summoned());
        assert_eq!(badger.effects.get(crate::effects::SUMMON_MARKER).unwrap().expires_at_turn, 3);
    }
}
