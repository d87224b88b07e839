//! Target validation, retargeting, and cone geometry.

use crate::error::ActionError;
use crate::world::{ActorId, Position, World};

pub fn in_melee_reach(from: Position, to: Position, reach: f64) -> bool {
    from.distance(to) < reach
}

/// The living actor at `at`, provided it is not the attacker itself.
pub fn require_target(world: &World, attacker: ActorId, at: Position) -> Result<ActorId, ActionError> {
    let target = world
        .actor_at(at)
        .ok_or_else(|| ActionError::impossible("Nothing to attack."))?;
    if target.id == attacker {
        return Err(ActionError::impossible("You can't target yourself."));
    }
    Ok(target.id)
}

pub fn require_in_range(from: Position, to: Position, range: f64) -> Result<(), ActionError> {
    if from.distance(to) > range {
        return Err(ActionError::impossible(format!(
            "That target is too far: {} squares.",
            range as i32
        )));
    }
    Ok(())
}

/// Pick a replacement for a target that died mid-sequence.
///
/// Candidates are living, visible, hostile to the attacker, and neither the
/// player nor the fallen target. With `reach` set they must also be within
/// melee reach of the attacker.
pub fn find_new_target(
    world: &World,
    attacker: ActorId,
    fallen: ActorId,
    reach: Option<f64>,
) -> Option<ActorId> {
    let attacker = world.actor(attacker)?;
    world
        .living_actors()
        .filter(|candidate| {
            candidate.id != fallen
                && candidate.id != attacker.id
                && !world.is_player(candidate.id)
                && attacker.is_hostile_to(candidate)
                && world.map.is_visible(candidate.position)
        })
        .find(|candidate| {
            reach.map_or(true, |reach| {
                in_melee_reach(attacker.position, candidate.position, reach)
            })
        })
        .map(|candidate| candidate.id)
}

/// One of the eight directions a cone can open toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConeDirection {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl ConeDirection {
    /// Classify the aim point by the signs of its offset from the origin.
    pub fn from_aim(origin: Position, aim: Position) -> Option<Self> {
        let dx = aim.x - origin.x;
        let dy = aim.y - origin.y;
        let direction = match (dx.signum(), dy.signum()) {
            (0, 0) => return None,
            (0, -1) => ConeDirection::North,
            (0, 1) => ConeDirection::South,
            (1, 0) => ConeDirection::East,
            (-1, 0) => ConeDirection::West,
            (1, -1) => ConeDirection::NorthEast,
            (1, 1) => ConeDirection::SouthEast,
            (-1, 1) => ConeDirection::SouthWest,
            _ => ConeDirection::NorthWest,
        };
        Some(direction)
    }
}

/// A cone-shaped area anchored on its caster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cone {
    pub origin: Position,
    pub direction: ConeDirection,
    pub radius: i32,
}

impl Cone {
    pub fn aimed(origin: Position, aim: Position, radius: i32) -> Result<Self, ActionError> {
        let direction = ConeDirection::from_aim(origin, aim)
            .ok_or_else(|| ActionError::impossible("Can't target cone on yourself."))?;
        Ok(Self {
            origin,
            direction,
            radius,
        })
    }

    pub fn contains(&self, point: Position) -> bool {
        if point == self.origin || self.origin.distance(point) > self.radius as f64 + 0.5 {
            return false;
        }
        let dx = point.x - self.origin.x;
        let dy = point.y - self.origin.y;
        match self.direction {
            ConeDirection::East => dx > 0 && dy.abs() < dx.abs(),
            ConeDirection::West => dx < 0 && dy.abs() < dx.abs(),
            ConeDirection::North => dy < 0 && dy.abs() > dx.abs(),
            ConeDirection::South => dy > 0 && dy.abs() > dx.abs(),
            ConeDirection::NorthEast => dx > 0 && dy < 0,
            ConeDirection::SouthEast => dx > 0 && dy > 0,
            ConeDirection::SouthWest => dx < 0 && dy > 0,
            ConeDirection::NorthWest => dx < 0 && dy < 0,
        }
    }
}
