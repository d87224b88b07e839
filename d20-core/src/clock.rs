//! The world turn clock.

use crate::effects::{self, Expiry};
use crate::world::{ActorId, World};
use serde::{Deserialize, Serialize};

/// Counts player turns. Enemy and summon actions never move it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldClock {
    current_turn: u64,
}

impl WorldClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(turn: u64) -> Self {
        Self { current_turn: turn }
    }

    pub fn current_turn(&self) -> u64 {
        self.current_turn
    }

    /// The turn an effect lasting `duration` turns from now expires on.
    pub fn expiry_after(&self, duration: u64) -> u64 {
        self.current_turn + duration
    }

    /// Record that `acting` used up a turn, then sweep expired effects.
    ///
    /// Only the player's actions advance the counter, but the sweep runs on
    /// every call.
    pub fn advance_turn(&mut self, world: &mut World, acting: ActorId) -> Vec<Expiry> {
        if world.is_player(acting) {
            self.current_turn += 1;
            tracing::trace!(turn = self.current_turn, "turn advanced");
        }
        effects::sweep(world, self.current_turn)
    }
}
