//! Intent selection for non-player actors.
//!
//! Monsters and summons share one simple policy: idle out of the player's
//! sight, otherwise close on the nearest living enemy and hit it with whatever
//! reaches.

use crate::config::EngineConfig;
use crate::rules::Intent;
use crate::targeting::in_melee_reach;
use crate::world::{Actor, ActorId, World};

/// The nearest living actor hostile to `actor`.
pub fn nearest_enemy<'w>(world: &'w World, actor: &Actor) -> Option<&'w Actor> {
    world
        .living_actors()
        .filter(|other| other.id != actor.id && actor.is_hostile_to(other))
        .min_by(|a, b| {
            let da = actor.position.distance(a.position);
            let db = actor.position.distance(b.position);
            da.total_cmp(&db)
        })
}

/// What `id` does this turn.
pub fn choose_intent(world: &World, id: ActorId, config: &EngineConfig) -> Intent {
    let Some(actor) = world.actor(id).filter(|a| a.is_alive()) else {
        return Intent::Wait;
    };
    if !world.map.is_visible(actor.position) {
        return Intent::Wait;
    }
    let Some(enemy) = nearest_enemy(world, actor) else {
        return Intent::Wait;
    };

    let distance = actor.position.distance(enemy.position);
    if in_melee_reach(actor.position, enemy.position, config.melee_reach) {
        Intent::MeleeAttack {
            target: enemy.position,
        }
    } else if actor.has_ranged_option() && distance <= config.ai_ranged_distance {
        Intent::RangedAttack {
            target: enemy.position,
        }
    } else {
        let (dx, dy) = actor.position.step_toward(enemy.position);
        Intent::Move { dx, dy }
    }
}
