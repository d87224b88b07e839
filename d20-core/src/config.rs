//! Engine tuning.
//!
//! Defaults reproduce the standard rules. Every field can be overridden in
//! code with the `with_*` setters or loaded from JSON, where missing fields
//! fall back to their defaults.

use crate::error::ContentError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Melee attacks reach targets strictly closer than this.
    pub melee_reach: f64,
    /// Reach for touch spells such as Shocking Grasp.
    pub touch_reach: f64,
    /// Minimum base attack bonus for extra iterative attacks.
    pub iterative_threshold: i32,
    /// Base attack bonus consumed and penalty added per iterative attack.
    pub iterative_step: i32,
    /// To-hit penalty for secondary natural attacks.
    pub secondary_attack_penalty: i32,
    pub rapid_shot_penalty: i32,
    /// Point Blank Shot applies within this many tiles.
    pub point_blank_range: f64,
    /// Hard cap on ticks in one rest.
    pub max_rest_ticks: u32,
    pub inventory_capacity: usize,
    /// Enemies with a ranged option shoot from this far away.
    pub ai_ranged_distance: f64,
    /// Experience to leave level `n` is `level_up_base + n * level_up_factor`.
    pub level_up_base: u32,
    pub level_up_factor: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            melee_reach: 1.5,
            touch_reach: 1.43,
            iterative_threshold: 6,
            iterative_step: 5,
            secondary_attack_penalty: 5,
            rapid_shot_penalty: 2,
            point_blank_range: 6.0,
            max_rest_ticks: 500,
            inventory_capacity: 26,
            ai_ranged_distance: 8.0,
            level_up_base: 200,
            level_up_factor: 150,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, ContentError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_melee_reach(mut self, reach: f64) -> Self {
        self.melee_reach = reach;
        self
    }

    pub fn with_touch_reach(mut self, reach: f64) -> Self {
        self.touch_reach = reach;
        self
    }

    pub fn with_iteratives(mut self, threshold: i32, step: i32) -> Self {
        self.iterative_threshold = threshold;
        self.iterative_step = step.max(1);
        self
    }

    pub fn with_max_rest_ticks(mut self, ticks: u32) -> Self {
        self.max_rest_ticks = ticks;
        self
    }

    pub fn with_inventory_capacity(mut self, capacity: usize) -> Self {
        self.inventory_capacity = capacity;
        self
    }

    pub fn with_ai_ranged_distance(mut self, distance: f64) -> Self {
        self.ai_ranged_distance = distance;
        self
    }

    pub fn with_level_up(mut self, base: u32, factor: u32) -> Self {
        self.level_up_base = base;
        self.level_up_factor = factor;
        self
    }
}
