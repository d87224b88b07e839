//! Full-attack sequencing.
//!
//! Expands one melee or ranged intent into its individual strikes: iterative
//! attacks from a high base attack bonus, natural attack routines, Rapid Shot,
//! and the combat-mode switch that may eat the turn. When a target dies
//! mid-sequence the remaining strikes move to a new target if one is in reach.

use crate::combat::{resolve_attack, AttackContext, DEFAULT_CRIT_MULTIPLIER, DEFAULT_CRIT_RANGE};
use crate::dice::size_scaled_damage;
use crate::error::ActionError;
use crate::feats::{POINT_BLANK_SHOT, QUICK_DRAW, RAPID_SHOT};
use crate::message::Tone;
use crate::rules::{ActionContext, ActionOutcome, Effect};
use crate::targeting::{self, find_new_target, in_melee_reach};
use crate::world::{ActorId, CombatMode, NaturalAttack, Position};

/// To-hit penalties for each attack in an iterative sequence.
///
/// Below `threshold` there is a single attack. Otherwise one attack is made
/// per `step` of base attack bonus, each `step` worse than the last.
pub fn iterative_penalties(base_attack_bonus: i32, threshold: i32, step: i32) -> Vec<i32> {
    if base_attack_bonus < threshold {
        return vec![0];
    }
    let step = step.max(1);
    let mut penalties = Vec::new();
    let mut remaining = base_attack_bonus;
    let mut penalty = 0;
    while remaining > 0 {
        penalties.push(penalty);
        remaining -= step;
        penalty += step;
    }
    penalties
}

/// Full melee attack against the actor standing on `target_at`.
pub fn full_melee_attack(
    ctx: &mut ActionContext<'_>,
    target_at: Position,
) -> Result<ActionOutcome, ActionError> {
    let mut target = targeting::require_target(ctx.world, ctx.actor, target_at)?;
    let reach = ctx.config.melee_reach;

    let attacker = ctx.actor()?;
    if !in_melee_reach(attacker.position, target_at, reach) {
        return Err(ActionError::impossible("That target is out of reach."));
    }
    let name = attacker.display_name();
    let armed = attacker.equipment.main_hand.is_some();
    let quick_draw = attacker.has_feat(QUICK_DRAW);
    let natural_attacks = attacker.natural_attacks.clone();
    let bab = attacker.stats.base_attack_bonus;
    let mode = attacker.combat_mode;
    let tone = ctx.attack_tone();

    if mode == CombatMode::Ranged {
        ctx.set_combat_mode(CombatMode::Melee);
        if !armed {
            ctx.say(format!("{name} enters melee mode."), tone);
        } else if quick_draw {
            ctx.say(format!("{name} quickly shifts to melee mode."), tone);
        } else {
            ctx.say(format!("{name} clumsily grabs its melee weapon."), tone);
            melee_strike(ctx, target, 0, None)?;
            return Ok(ActionOutcome::TurnTaken);
        }
    }

    if armed || natural_attacks.is_empty() {
        let penalties = iterative_penalties(
            bab,
            ctx.config.iterative_threshold,
            ctx.config.iterative_step,
        );
        for penalty in penalties {
            match next_living_target(ctx, target, Some(reach)) {
                Some(next) => target = next,
                None => break,
            }
            melee_strike(ctx, target, penalty, None)?;
        }
    } else {
        let secondary = ctx.config.secondary_attack_penalty;
        for attack in &natural_attacks {
            match next_living_target(ctx, target, Some(reach)) {
                Some(next) => target = next,
                None => break,
            }
            melee_strike(ctx, target, attack.tag.to_hit_penalty(secondary), Some(attack))?;
        }
    }

    Ok(ActionOutcome::TurnTaken)
}

/// Full ranged attack against the actor standing on `target_at`.
pub fn full_ranged_attack(
    ctx: &mut ActionContext<'_>,
    target_at: Position,
) -> Result<ActionOutcome, ActionError> {
    let mut target = targeting::require_target(ctx.world, ctx.actor, target_at)?;
    if !ctx.world.map.is_visible(target_at) {
        return Err(ActionError::impossible("You can't see that target."));
    }

    let attacker = ctx.actor()?;
    if !attacker.has_ranged_option() {
        return Err(ActionError::impossible("You have no ranged weapon."));
    }
    let name = attacker.display_name();
    let has_weapon = attacker.equipment.ranged.is_some();
    let quick_draw = attacker.has_feat(QUICK_DRAW);
    let rapid_shot = attacker.has_feat(RAPID_SHOT);
    let natural_attacks = attacker.natural_ranged_attacks.clone();
    let bab = attacker.stats.base_attack_bonus;
    let secondary = ctx.config.secondary_attack_penalty;
    let mode = attacker.combat_mode;
    let tone = ctx.attack_tone();

    if mode != CombatMode::Ranged {
        ctx.set_combat_mode(CombatMode::Ranged);
        if quick_draw {
            ctx.say(format!("{name} quickly switches to a ranged weapon."), tone);
        } else {
            ctx.say(format!("{name} struggles to change to a ranged weapon."), tone);
            let first = if has_weapon { None } else { natural_attacks.first() };
            let penalty = first.map_or(0, |attack| attack.tag.to_hit_penalty(secondary));
            ranged_strike(ctx, target, penalty, first)?;
            return Ok(ActionOutcome::TurnTaken);
        }
    }

    if has_weapon {
        if rapid_shot {
            let penalty = ctx.config.rapid_shot_penalty;
            ranged_strike(ctx, target, penalty, None)?;
        }
        let penalties = iterative_penalties(
            bab,
            ctx.config.iterative_threshold,
            ctx.config.iterative_step,
        );
        for penalty in penalties {
            match next_living_target(ctx, target, None) {
                Some(next) => target = next,
                None => break,
            }
            ranged_strike(ctx, target, penalty, None)?;
        }
    } else {
        for attack in &natural_attacks {
            match next_living_target(ctx, target, None) {
                Some(next) => target = next,
                None => break,
            }
            ranged_strike(ctx, target, attack.tag.to_hit_penalty(secondary), Some(attack))?;
        }
    }

    Ok(ActionOutcome::TurnTaken)
}

/// Swap between melee and ranged kit.
pub fn toggle_combat_mode(ctx: &mut ActionContext<'_>) -> Result<ActionOutcome, ActionError> {
    let actor = ctx.actor()?;
    let name = actor.display_name();
    let quick_draw = actor.has_feat(QUICK_DRAW);
    let has_ranged_option = actor.has_ranged_option();
    let mode = actor.combat_mode;

    match mode {
        CombatMode::Ranged => {
            ctx.set_combat_mode(CombatMode::Melee);
            if quick_draw {
                ctx.say(format!("{name} quickly shifts to melee."), Tone::Info);
                Ok(ActionOutcome::Free)
            } else {
                ctx.say("Now in melee mode.", Tone::Info);
                Ok(ActionOutcome::TurnTaken)
            }
        }
        CombatMode::Melee => {
            if !has_ranged_option {
                return Err(ActionError::impossible("You have no ranged weapon."));
            }
            ctx.set_combat_mode(CombatMode::Ranged);
            if quick_draw {
                ctx.say(
                    format!("{name} quickly shifts to a ranged weapon."),
                    Tone::Info,
                );
                Ok(ActionOutcome::Free)
            } else {
                ctx.say("Now in ranged mode.", Tone::Info);
                Ok(ActionOutcome::TurnTaken)
            }
        }
    }
}

/// The target to strike next: the current one while it lives, otherwise a
/// replacement. `None` ends the sequence.
fn next_living_target(
    ctx: &mut ActionContext<'_>,
    current: ActorId,
    reach: Option<f64>,
) -> Option<ActorId> {
    if !ctx.is_dead(current) {
        return Some(current);
    }
    let next = find_new_target(ctx.world, ctx.actor, current, reach)?;
    let attacker = ctx.world.actor(ctx.actor)?.display_name();
    let target = ctx.world.actor(next)?.name.clone();
    tracing::debug!(attacker = %attacker, target = %target, "retargeting");
    ctx.say(
        format!("{attacker} retargets to {target}."),
        Tone::PlayerAttack,
    );
    Some(next)
}

/// One melee swing with the main-hand weapon, a natural attack, or a fist.
fn melee_strike(
    ctx: &mut ActionContext<'_>,
    target: ActorId,
    penalty: i32,
    natural: Option<&NaturalAttack>,
) -> Result<(), ActionError> {
    let attacker = ctx.actor()?;
    let defender = ctx.target(target)?;

    let (dice, verb, crit_range, crit_multiplier) = match (&attacker.equipment.main_hand, natural) {
        (Some(weapon), _) => (
            size_scaled_damage(weapon.damage, attacker.size),
            weapon.verb.clone(),
            weapon.crit_range,
            weapon.crit_multiplier,
        ),
        (None, Some(attack)) => (
            attack.damage,
            attack.verb.clone(),
            DEFAULT_CRIT_RANGE,
            DEFAULT_CRIT_MULTIPLIER,
        ),
        (None, None) => (
            attacker.unarmed,
            "punches".to_string(),
            DEFAULT_CRIT_RANGE,
            DEFAULT_CRIT_MULTIPLIER,
        ),
    };
    let bonus = match (attacker.equipment.main_hand.is_some(), natural) {
        (false, Some(attack)) => attack.tag.damage_bonus(attacker.melee_to_damage()),
        _ => attacker.melee_to_damage(),
    };
    let to_hit = attacker.melee_to_hit() - penalty;
    let defense = defender.armor_class();
    let description = format!("{} {} {}", attacker.display_name(), verb, defender.name);

    let base_damage = ctx.roller.roll(dice) as i32 + bonus;
    let attack = AttackContext::new(to_hit, defense, base_damage, description)
        .with_critical(crit_range, crit_multiplier);
    strike(ctx, target, attack);
    Ok(())
}

/// One ranged shot with the ranged weapon or a natural ranged attack.
fn ranged_strike(
    ctx: &mut ActionContext<'_>,
    target: ActorId,
    penalty: i32,
    natural: Option<&NaturalAttack>,
) -> Result<(), ActionError> {
    let attacker = ctx.actor()?;
    let defender = ctx.target(target)?;

    let (dice, verb, crit_range, crit_multiplier, bonus) = match (&attacker.equipment.ranged, natural) {
        (Some(weapon), _) => (
            size_scaled_damage(weapon.damage, attacker.size),
            weapon.verb.clone(),
            weapon.crit_range,
            weapon.crit_multiplier,
            attacker.ranged_to_damage(),
        ),
        (None, Some(attack)) => (
            attack.damage,
            attack.verb.clone(),
            DEFAULT_CRIT_RANGE,
            DEFAULT_CRIT_MULTIPLIER,
            attack.tag.damage_bonus(attacker.ranged_to_damage()),
        ),
        (None, None) => return Err(ActionError::impossible("You have no ranged weapon.")),
    };
    let point_blank = attacker.has_feat(POINT_BLANK_SHOT)
        && attacker.position.distance(defender.position) <= ctx.config.point_blank_range;
    let bonus = bonus + i32::from(point_blank);
    let to_hit = attacker.ranged_to_hit() - penalty;
    let defense = defender.armor_class();
    let description = format!("{} {} {}", attacker.display_name(), verb, defender.name);

    if ctx.actor_is_player() {
        ctx.world.last_target = Some(target);
    }

    let base_damage = ctx.roller.roll(dice) as i32 + bonus;
    let attack = AttackContext::new(to_hit, defense, base_damage, description)
        .with_critical(crit_range, crit_multiplier);
    strike(ctx, target, attack);
    Ok(())
}

fn strike(ctx: &mut ActionContext<'_>, target: ActorId, attack: AttackContext) {
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
