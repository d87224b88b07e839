//! Monster and summon templates bundled with the crate.

use crate::actor_builder::{ActorBuilder, ActorTemplate};
use crate::error::ContentError;
use crate::world::{Actor, Position};
use std::collections::HashMap;

const BUNDLED: &str = include_str!("../content/bestiary.json");

lazy_static::lazy_static! {
    static ref BESTIARY: HashMap<String, ActorTemplate> = match parse(BUNDLED) {
        Ok(templates) => templates,
        Err(err) => {
            tracing::warn!(error = %err, "bundled bestiary failed to load");
            HashMap::new()
        }
    };
}

/// Parse a bestiary document: an object mapping template keys to templates.
pub fn parse(json: &str) -> Result<HashMap<String, ActorTemplate>, ContentError> {
    let templates: HashMap<String, ActorTemplate> = serde_json::from_str(json)?;
    Ok(templates
        .into_iter()
        .map(|(key, template)| (key.to_lowercase(), template))
        .collect())
}

/// Look up a bundled template (case-insensitive).
pub fn template(name: &str) -> Option<&'static ActorTemplate> {
    BESTIARY.get(&name.to_lowercase())
}

/// Keys of every bundled template, sorted.
pub fn names() -> Vec<&'static str> {
    let mut names: Vec<_> = BESTIARY.keys().map(String::as_str).collect();
    names.sort_unstable();
    names
}

/// Build a fresh actor from a bundled template, standing at `at`.
pub fn spawn(name: &str, at: Position) -> Result<Actor, ContentError> {
    let template = template(name).ok_or_else(|| ContentError::UnknownTemplate(name.to_string()))?;
    Ok(ActorBuilder::from_template(template).at(at).build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{AttackTag, CharacterClass};

    #[test]
    fn test_bundled_templates_load() {
        let names = names();
        assert!(names.contains(&"goblin"));
        assert!(names.contains(&"celestial badger"));
        assert!(names.contains(&"celestial riding dog"));
        assert!(names.contains(&"celestial dire badger"));
    }

    #[test]
    fn test_every_template_builds() {
        for name in names() {
            let actor = spawn(name, Position::new(1, 1));
            assert!(actor.is_ok(), "{name} failed to build: {:?}", actor.err());
        }
    }

    #[test]
    fn test_spawn_places_actor() {
        let owlbear = spawn("Owlbear", Position::new(3, 4)).unwrap();
        assert_eq!(owlbear.position, Position::new(3, 4));
        assert_eq!(owlbear.natural_attacks.len(), 3);
        assert_eq!(owlbear.natural_attacks[2].tag, AttackTag::Secondary);
        assert_eq!(owlbear.xp_reward, 1200);
    }

    #[test]
    fn test_player_templates_carry_a_class() {
        let fighter = spawn("human fighter", Position::default()).unwrap();
        assert_eq!(fighter.class, CharacterClass::Fighter);
        assert_eq!(fighter.level.current, 3);
        let wizard = spawn("elf wizard", Position::default()).unwrap();
        assert_eq!(wizard.class, CharacterClass::Wizard);
    }

    #[test]
    fn test_unknown_template() {
        let err = spawn("tarrasque", Position::default()).unwrap_err();
        assert!(matches!(err, ContentError::UnknownTemplate(name) if name == "tarrasque"));
    }

    #[test]
    fn test_parse_rejects_bad_json() {
        assert!(matches!(parse("{ not json"), Err(ContentError::Json(_))));
    }
}
