//! Experience and levelling.
//!
//! Kills by the player's side bank experience (see
//! [`ActionContext::damage`]). Once enough is banked the player may level up,
//! which restores hit points and mana and hands out feats and stat points to
//! spend later. None of these take a turn.

use crate::error::ActionError;
use crate::feats;
use crate::message::Tone;
use crate::rules::{ActionContext, ActionOutcome, Effect};
use crate::world::{Ability, CharacterClass};

/// Feats earned on reaching `level`. Fighters get one every level, everyone
/// else on odd levels, and wizards a bonus one every fifth level.
pub fn feats_gained(class: CharacterClass, level: u32) -> u32 {
    let mut feats = match class {
        CharacterClass::Fighter => 1,
        _ => u32::from(level % 2 == 1),
    };
    if class == CharacterClass::Wizard && level % 5 == 0 {
        feats += 1;
    }
    feats
}

/// Stat points earned on reaching `level`: one every fourth level.
pub fn stat_points_gained(level: u32) -> u32 {
    u32::from(level % 4 == 0)
}

/// Spend banked experience on the next level. Leftover experience carries
/// over.
pub fn level_up(ctx: &mut ActionContext<'_>) -> Result<ActionOutcome, ActionError> {
    let actor = ctx.actor()?;
    let needed = actor
        .level
        .experience_to_next_level(ctx.config.level_up_base, ctx.config.level_up_factor);
    if actor.level.xp < needed {
        return Err(ActionError::impossible(
            "You do not have sufficient experience to level.",
        ));
    }
    let level = actor.level.current + 1;
    let feats = feats_gained(actor.class, level);
    let stats = stat_points_gained(level);
    let stats_to_take = actor.level.stats_to_take + stats;
    let missing_hp = actor.hit_points.missing();
    let missing_mana = actor.mana.maximum - actor.mana.current;
    let name = actor.display_name();

    let target = ctx.actor;
    ctx.emit(Effect::LeveledUp {
        target,
        level,
        xp_spent: needed,
        feats,
        stats,
    });
    ctx.heal(target, missing_hp);
    ctx.change_mana(target, missing_mana);
    tracing::info!(actor = %name, level, feats, stats, "level up");

    if ctx.actor_is_player() {
        ctx.say(format!("Congratulations! You are now level {level}!"), Tone::Info);
    } else {
        ctx.say(format!("{name} reaches level {level}."), Tone::Info);
    }
    if feats > 0 {
        ctx.say(format!("You have {feats} more feat(s) to learn!"), Tone::Info);
    }
    if stats > 0 {
        ctx.say(
            format!("You have {stats_to_take} stat points to spend."),
            Tone::Info,
        );
    }
    Ok(ActionOutcome::Free)
}

/// Spend an earned feat.
pub fn learn_feat(ctx: &mut ActionContext<'_>, name: &str) -> Result<ActionOutcome, ActionError> {
    let actor = ctx.actor()?;
    if actor.level.feats_to_take == 0 {
        return Err(ActionError::impossible("You have no feats to learn."));
    }
    let feat = feats::check_feat(actor, name)?;
    let learner = actor.display_name();

    let target = ctx.actor;
    ctx.emit(Effect::FeatLearned {
        target,
        name: feat.name.clone(),
    });
    ctx.say(format!("{learner} learns {}.", feat.name), Tone::Info);
    Ok(ActionOutcome::Free)
}

/// Spend an earned stat point.
pub fn raise_ability(
    ctx: &mut ActionContext<'_>,
    ability: Ability,
) -> Result<ActionOutcome, ActionError> {
    let actor = ctx.actor()?;
    if actor.level.stats_to_take == 0 {
        return Err(ActionError::impossible("You have no stat points to spend."));
    }
    let score = actor.abilities.get(ability);
    if score == u8::MAX {
        return Err(ActionError::impossible(format!(
            "Your {ability} cannot go any higher."
        )));
    }
    let name = actor.display_name();

    let target = ctx.actor;
    ctx.emit(Effect::AbilityRaised { target, ability });
    ctx.say(format!("{name}'s {ability} rises to {}.", score + 1), Tone::Info);
    Ok(ActionOutcome::Free)
}
