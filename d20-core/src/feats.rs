//! Feat catalogue and prerequisites.
//!
//! Most feats can be taken once. A few, such as Extra Turning, stack.

use crate::error::ActionError;
use crate::world::Actor;

pub const QUICK_DRAW: &str = "Quick Draw";
pub const RAPID_SHOT: &str = "Rapid Shot";
pub const POINT_BLANK_SHOT: &str = "Point Blank Shot";

/// What an actor needs before taking a feat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Prerequisites {
    pub feats: Vec<String>,
    pub base_attack_bonus: Option<i32>,
    /// Compared against base attack bonus, which tracks fighter level.
    pub fighter_level: Option<i32>,
}

impl Prerequisites {
    fn none() -> Self {
        Self::default()
    }

    fn feats(feats: &[&str]) -> Self {
        Self {
            feats: feats.iter().map(|f| f.to_string()).collect(),
            ..Self::default()
        }
    }

    fn bab(base_attack_bonus: i32) -> Self {
        Self {
            base_attack_bonus: Some(base_attack_bonus),
            ..Self::default()
        }
    }

    fn fighter(feats: &[&str], level: i32) -> Self {
        Self {
            feats: feats.iter().map(|f| f.to_string()).collect(),
            fighter_level: Some(level),
            ..Self::default()
        }
    }

    pub fn met_by(&self, actor: &Actor) -> bool {
        let bab = actor.stats.base_attack_bonus;
        self.feats.iter().all(|feat| actor.has_feat(feat))
            && self.base_attack_bonus.map_or(true, |needed| bab >= needed)
            && self.fighter_level.map_or(true, |needed| bab >= needed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatDefinition {
    pub name: String,
    pub prerequisites: Prerequisites,
    pub stackable: bool,
}

impl FeatDefinition {
    fn once(name: impl Into<String>, prerequisites: Prerequisites) -> Self {
        Self {
            name: name.into(),
            prerequisites,
            stackable: false,
        }
    }

    fn stacking(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prerequisites: Prerequisites::none(),
            stackable: true,
        }
    }
}

/// The weapon-specific chain: Focus, Specialization, Greater versions, Improved Critical.
fn weapon_feats(weapon: &str) -> Vec<FeatDefinition> {
    let focus = format!("Weapon Focus ({weapon})");
    let specialization = format!("Weapon Specialization ({weapon})");
    let greater_focus = format!("Greater Weapon Focus ({weapon})");
    let greater_specialization = format!("Greater Weapon Specialization ({weapon})");

    vec![
        FeatDefinition::once(focus.clone(), Prerequisites::none()),
        FeatDefinition::once(specialization.clone(), Prerequisites::fighter(&[focus.as_str()], 4)),
        FeatDefinition::once(greater_focus.clone(), Prerequisites::fighter(&[focus.as_str()], 8)),
        FeatDefinition::once(
            greater_specialization,
            Prerequisites::fighter(&[focus.as_str(), greater_focus.as_str(), specialization.as_str()], 12),
        ),
        FeatDefinition::once(format!("Improved Critical ({weapon})"), Prerequisites::bab(8)),
    ]
}

lazy_static::lazy_static! {
    /// Every feat an actor can take.
    pub static ref FEATS: Vec<FeatDefinition> = {
        let mut feats = vec![
            FeatDefinition::once("Toughness", Prerequisites::none()),
            FeatDefinition::once("Power Attack", Prerequisites::none()),
            FeatDefinition::once("Weapon Finesse", Prerequisites::none()),
            FeatDefinition::once(QUICK_DRAW, Prerequisites::none()),
            FeatDefinition::once("Cleave", Prerequisites::feats(&["Power Attack"])),
            FeatDefinition::once("Great Cleave", Prerequisites::feats(&["Power Attack", "Cleave"])),
            FeatDefinition::once(POINT_BLANK_SHOT, Prerequisites::none()),
            FeatDefinition::once(RAPID_SHOT, Prerequisites::feats(&[POINT_BLANK_SHOT])),
            FeatDefinition::once("Deadly Aim", Prerequisites::none()),
        ];
        for weapon in ["Dwarven Waraxe", "Composite Long Bow", "Greatsword"] {
            feats.extend(weapon_feats(weapon));
        }
        feats.push(FeatDefinition::stacking("Extra Turning"));
        feats
    };
}

/// Look up a feat by name (case-insensitive).
pub fn get_feat(name: &str) -> Option<&'static FeatDefinition> {
    let name_lower = name.to_lowercase();
    FEATS.iter().find(|f| f.name.to_lowercase() == name_lower)
}

/// Feats the actor could take right now.
pub fn available_feats(actor: &Actor) -> Vec<&'static FeatDefinition> {
    FEATS
        .iter()
        .filter(|feat| feat.stackable || !actor.has_feat(&feat.name))
        .filter(|feat| feat.prerequisites.met_by(actor))
        .collect()
}

/// Give an actor a feat, checking prerequisites. Stackable feats count up.
pub fn take_feat(actor: &mut Actor, name: &str) -> Result<(), ActionError> {
    let feat = check_feat(actor, name)?;
    *actor.feats.entry(feat.name.clone()).or_insert(0) += 1;
    Ok(())
}

/// The feat `name` if `actor` may take it now.
pub fn check_feat(actor: &Actor, name: &str) -> Result<&'static FeatDefinition, ActionError> {
    let feat = get_feat(name)
        .ok_or_else(|| ActionError::impossible(format!("There is no feat called {name}.")))?;
    if !feat.stackable && actor.has_feat(&feat.name) {
        return Err(ActionError::impossible(format!(
            "{} already has {}.",
            actor.display_name(),
            feat.name
        )));
    }
    if !feat.prerequisites.met_by(actor) {
        return Err(ActionError::impossible(format!(
            "{} does not meet the prerequisites for {}.",
            actor.display_name(),
            feat.name
        )));
    }
    Ok(feat)
}
