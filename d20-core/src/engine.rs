//! The turn engine.
//!
//! [`Engine`] owns the world, the clock, the dice and the message log. A
//! player turn resolves the player's intent, then lets every other living
//! actor act once. Rejected player intents are logged and cost nothing;
//! rejected monster intents are dropped.

use crate::ai;
use crate::clock::WorldClock;
use crate::config::EngineConfig;
use crate::dice::{DiceRoller, RngRoller};
use crate::error::ActionError;
use crate::message::{MessageLog, Tone};
use crate::progression;
use crate::rules::{ActionContext, ActionOutcome, Effect, Intent, Resolution};
use crate::sequencer;
use crate::spells;
use crate::world::{ActorId, World};

/// Everything that happened in one player turn.
#[derive(Debug, Clone)]
pub struct TurnReport {
    pub player: Resolution,
    /// One resolution per monster or summon action that succeeded.
    pub others: Vec<Resolution>,
}

impl TurnReport {
    pub fn effects(&self) -> impl Iterator<Item = &Effect> {
        std::iter::once(&self.player)
            .chain(self.others.iter())
            .flat_map(|r| r.effects.iter())
    }
}

pub struct Engine {
    pub world: World,
    pub clock: WorldClock,
    pub log: MessageLog,
    pub config: EngineConfig,
    roller: Box<dyn DiceRoller>,
}

impl Engine {
    /// An engine with default rules and entropy-seeded dice.
    pub fn new(world: World) -> Self {
        Self {
            world,
            clock: WorldClock::new(),
            log: MessageLog::new(),
            config: EngineConfig::default(),
            roller: Box::new(RngRoller::from_entropy()),
        }
    }

    /// Replace the rules. The player's pack is resized to the configured
    /// capacity.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        let capacity = config.inventory_capacity;
        let player_id = self.world.player_id;
        if let Some(player) = self.world.actor_mut(player_id) {
            player.inventory.capacity = capacity;
        }
        self.config = config;
        self
    }

    pub fn with_roller(mut self, roller: impl DiceRoller + 'static) -> Self {
        self.roller = Box::new(roller);
        self
    }

    pub fn with_clock(mut self, clock: WorldClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn player_id(&self) -> ActorId {
        self.world.player_id
    }

    pub fn is_player_dead(&self) -> bool {
        self.world.player().map_or(true, |p| p.is_dead)
    }

    /// Resolve one intent for one actor.
    ///
    /// A turn-taking action advances the clock exactly once. Messages go to
    /// the log only when the action succeeds. An action that fails part way
    /// through is rolled back: the world and the clock are restored to where
    /// they stood before it started. Dice already rolled stay rolled.
    pub fn perform(&mut self, actor: ActorId, intent: &Intent) -> Result<Resolution, ActionError> {
        let acting = self
            .world
            .actor(actor)
            .ok_or(ActionError::UnknownActor(actor))?;
        if acting.is_dead {
            return Err(ActionError::impossible(format!(
                "{} is dead.",
                acting.display_name()
            )));
        }

        let world_before = self.world.clone();
        let clock_before = self.clock;
        let mut ctx = ActionContext::new(
            &mut self.world,
            &mut self.clock,
            &mut *self.roller,
            &self.config,
            actor,
        );
        let outcome = match dispatch(&mut ctx, intent) {
            Ok(outcome) => outcome,
            Err(err) => {
                let applied = ctx.emitted();
                drop(ctx);
                if applied > 0 {
                    tracing::debug!(
                        actor = %actor,
                        intent = intent.name(),
                        applied,
                        "rolling back failed action"
                    );
                }
                self.world = world_before;
                self.clock = clock_before;
                return Err(err);
            }
        };
        if outcome == ActionOutcome::TurnTaken {
            ctx.tick();
        }
        let resolution = ctx.finish(outcome);

        tracing::debug!(
            actor = %actor,
            intent = intent.name(),
            outcome = ?resolution.outcome,
            effects = resolution.effects.len(),
            turn = self.clock.current_turn(),
            "intent resolved"
        );
        for message in &resolution.messages {
            self.log.add(message.text.clone(), message.tone);
        }
        Ok(resolution)
    }

    /// Resolve the player's intent, then give everyone else a turn if it
    /// took time.
    pub fn player_turn(&mut self, intent: Intent) -> Result<TurnReport, ActionError> {
        if self.is_player_dead() {
            return Err(ActionError::impossible("You are dead."));
        }
        let player = match self.perform(self.world.player_id, &intent) {
            Ok(resolution) => resolution,
            Err(err) => {
                self.log.add(err.to_string(), Tone::Impossible);
                return Err(err);
            }
        };
        let others = if player.outcome == ActionOutcome::Free {
            Vec::new()
        } else {
            self.handle_enemy_turns()
        };
        Ok(TurnReport { player, others })
    }

    /// Every living non-player actor acts once, in spawn order.
    pub fn handle_enemy_turns(&mut self) -> Vec<Resolution> {
        let mut resolutions = Vec::new();
        for id in self.world.living_ids() {
            if self.world.is_player(id) || self.is_player_dead() {
                continue;
            }
            if self.world.actor(id).map_or(true, |a| a.is_dead) {
                continue;
            }
            let intent = ai::choose_intent(&self.world, id, &self.config);
            match self.perform(id, &intent) {
                Ok(resolution) => resolutions.push(resolution),
                Err(err) => {
                    tracing::debug!(actor = %id, intent = intent.name(), error = %err, "enemy action dropped");
                }
            }
        }
        resolutions
    }
}

fn dispatch(ctx: &mut ActionContext<'_>, intent: &Intent) -> Result<ActionOutcome, ActionError> {
    match intent {
        Intent::Bump { dx, dy } => {
            let destination = ctx.actor()?.position.offset(*dx, *dy);
            let hostile = match ctx.world.actor_at(destination) {
                Some(occupant) => ctx.actor()?.is_hostile_to(occupant),
                None => false,
            };
            if hostile {
                sequencer::full_melee_attack(ctx, destination)
            } else {
                move_by(ctx, *dx, *dy)
            }
        }
        Intent::Move { dx, dy } => move_by(ctx, *dx, *dy),
        Intent::MeleeAttack { target } => sequencer::full_melee_attack(ctx, *target),
        Intent::RangedAttack { target } => sequencer::full_ranged_attack(ctx, *target),
        Intent::ToggleCombatMode => sequencer::toggle_combat_mode(ctx),
        Intent::CastSpell { spell, target } => spells::cast_spell(ctx, spell, *target),
        Intent::BreathWeapon { aim } => spells::breathe(ctx, *aim),
        Intent::Wait => {
            recover(ctx);
            Ok(ActionOutcome::TurnTaken)
        }
        Intent::Rest { turns } => rest(ctx, *turns),
        Intent::PickUp => pick_up(ctx),
        Intent::Equip { index } => equip(ctx, *index),
        Intent::Drop { index } => drop_item(ctx, *index),
        Intent::LevelUp => progression::level_up(ctx),
        Intent::LearnFeat { feat } => progression::learn_feat(ctx, feat),
        Intent::RaiseAbility { ability } => progression::raise_ability(ctx, *ability),
    }
}

fn move_by(ctx: &mut ActionContext<'_>, dx: i32, dy: i32) -> Result<ActionOutcome, ActionError> {
    let actor = ctx.actor()?;
    let from = actor.position;
    let to = from.offset(dx, dy);
    let name = actor.display_name();
    if (dx, dy) == (0, 0) || !ctx.world.is_open(to) {
        return Err(ActionError::impossible("That way is blocked."));
    }

    let target = ctx.actor;
    ctx.emit(Effect::Moved { target, from, to });

    if let Some(pile) = ctx.world.gold_at(to).copied() {
        ctx.emit(Effect::GoldCollected {
            target,
            at: to,
            amount: pile.amount,
        });
        ctx.say(
            format!("{name} picks up {} gold pieces.", pile.amount),
            Tone::Info,
        );
    }

    if ctx.actor_is_player() {
        let here: Vec<String> = ctx
            .world
            .items_at(to)
            .map(|g| format!("{} is here.", g.item.name))
            .collect();
        for line in here {
            ctx.say(line, Tone::Info);
        }
    }
    Ok(ActionOutcome::TurnTaken)
}

/// One turn's natural recovery: a hit point and a point of mana.
fn recover(ctx: &mut ActionContext<'_>) {
    let target = ctx.actor;
    ctx.heal(target, 1);
    ctx.change_mana(target, 1);
}

/// Name of a hostile the resting actor can see, if any.
fn spotted_enemy(ctx: &ActionContext<'_>) -> Result<Option<String>, ActionError> {
    let actor = ctx.actor()?;
    Ok(ctx
        .world
        .living_actors()
        .filter(|other| other.id != actor.id && actor.is_hostile_to(other))
        .find(|other| ctx.world.map.is_visible(other.position))
        .map(|other| other.display_name()))
}

fn rest(ctx: &mut ActionContext<'_>, turns: Option<u32>) -> Result<ActionOutcome, ActionError> {
    let actor = ctx.actor()?;
    let name = actor.display_name();
    let already_full = actor.hit_points.is_full() && actor.mana.is_full();
    if turns.is_none() && already_full {
        return Err(ActionError::impossible(format!("{name} is already fully rested.")));
    }
    let limit = turns.unwrap_or(ctx.config.max_rest_ticks);

    while ctx.ticks() < limit {
        if let Some(enemy) = spotted_enemy(ctx)? {
            if ctx.ticks() == 0 {
                return Err(ActionError::impossible(format!("{enemy} spotted.")));
            }
            ctx.say(format!("{enemy} spotted."), Tone::Alert);
            return Ok(ActionOutcome::Ticked(ctx.ticks()));
        }
        recover(ctx);
        ctx.tick();

        let actor = ctx.actor()?;
        if turns.is_none() && actor.hit_points.is_full() && actor.mana.is_full() {
            ctx.say(format!("{name} is fully rested."), Tone::Info);
            return Ok(ActionOutcome::Ticked(ctx.ticks()));
        }
    }
    if turns.is_some() {
        ctx.say(format!("{name} stops resting."), Tone::Info);
    }
    Ok(ActionOutcome::Ticked(ctx.ticks()))
}

fn pick_up(ctx: &mut ActionContext<'_>) -> Result<ActionOutcome, ActionError> {
    let actor = ctx.actor()?;
    let at = actor.position;
    let item = ctx
        .world
        .items_at(at)
        .next()
        .map(|g| g.item.clone())
        .ok_or_else(|| ActionError::impossible("There is nothing here to pick up."))?;
    if !actor.inventory.can_stow(&item) {
        return Err(ActionError::impossible("Your inventory is full."));
    }
    let stacks = item.stackable
        && actor
            .inventory
            .items
            .iter()
            .any(|held| held.stackable && held.name == item.name);

    let target = ctx.actor;
    ctx.emit(Effect::ItemPickedUp {
        target,
        at,
        name: item.name.clone(),
    });
    if stacks {
        ctx.say(format!("You have one more {}!", item.name), Tone::Info);
    } else {
        ctx.say(format!("You picked up the {}!", item.name), Tone::Info);
    }
    Ok(ActionOutcome::TurnTaken)
}

/// Put on the carried item at `index`, or take it off if it is already worn.
fn equip(ctx: &mut ActionContext<'_>, index: usize) -> Result<ActionOutcome, ActionError> {
    let actor = ctx.actor()?;
    let item = actor
        .inventory
        .get(index)
        .ok_or_else(|| ActionError::impossible("Invalid entry."))?;
    let Some(gear) = &item.equippable else {
        return Err(ActionError::impossible(format!(
            "The {} cannot be equipped.",
            item.name
        )));
    };
    let name = item.name.clone();
    let equipped = !item.equipped;
    let displaced = actor
        .inventory
        .items
        .iter()
        .enumerate()
        .find(|(i, held)| {
            *i != index
                && held.equipped
                && held.equippable.as_ref().is_some_and(|g| g.slot == gear.slot)
        })
        .map(|(_, held)| held.name.clone());

    let target = ctx.actor;
    ctx.emit(Effect::EquipmentChanged {
        target,
        index,
        equipped,
    });
    if !equipped {
        ctx.say(format!("You remove the {name}."), Tone::Info);
        return Ok(ActionOutcome::TurnTaken);
    }
    if let Some(old) = displaced {
        ctx.say(format!("You remove the {old}."), Tone::Info);
    }
    ctx.say(format!("You equip the {name}."), Tone::Info);
    Ok(ActionOutcome::TurnTaken)
}

fn drop_item(ctx: &mut ActionContext<'_>, index: usize) -> Result<ActionOutcome, ActionError> {
    let actor = ctx.actor()?;
    let item = actor
        .inventory
        .get(index)
        .ok_or_else(|| ActionError::impossible("Invalid entry."))?;
    let name = item.name.clone();
    let was_equipped = item.equipped;
    let at = actor.position;

    let target = ctx.actor;
    ctx.emit(Effect::ItemDropped { target, index, at });
    if was_equipped {
        ctx.say(format!("You remove the {name}."), Tone::Info);
    }
    ctx.say(format!("You dropped the {name}."), Tone::Info);
    Ok(ActionOutcome::TurnTaken)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedRoller;
    use crate::dice::DamageDice;
    use crate::world::{Actor, EquipSlot, GameMap, HitPoints, Item, Mana, Position, Weapon};

    fn engine() -> Engine {
        let mut hero = Actor::new("hero");
        hero.position = Position::new(2, 2);
        hero.hit_points = HitPoints::new(10);
        hero.mana = Mana::new(4);
        Engine::new(World::new(GameMap::open(8, 8), hero)).with_roller(ScriptedRoller::empty())
    }

    #[test]
    fn test_move_collects_gold() {
        let mut engine = engine();
        engine.world.add_gold(7, Position::new(3, 2));
        let report = engine.player_turn(Intent::Move { dx: 1, dy: 0 }).unwrap();
        assert_eq!(report.player.narrative(), "Hero picks up 7 gold pieces.");
        assert_eq!(engine.world.player().unwrap().gold, 7);
        assert_eq!(engine.clock.current_turn(), 1);
    }

    #[test]
    fn test_blocked_move_costs_nothing() {
        let mut engine = engine();
        engine.world.map.set_walkable(Position::new(2, 3), false);
        let err = engine.player_turn(Intent::Move { dx: 0, dy: 1 }).unwrap_err();
        assert_eq!(err.to_string(), "That way is blocked.");
        assert_eq!(engine.clock.current_turn(), 0);
        assert_eq!(engine.log.last().unwrap().tone, Tone::Impossible);
    }

    #[test]
    fn test_items_are_announced() {
        let mut engine = engine();
        engine.world.add_item(Item::new("dagger"), Position::new(1, 1));
        let report = engine.player_turn(Intent::Move { dx: -1, dy: -1 }).unwrap();
        assert_eq!(report.player.narrative(), "dagger is here.");
    }

    #[test]
    fn test_wait_recovers() {
        let mut engine = engine();
        let id = engine.player_id();
        {
            let hero = engine.world.actor_mut(id).unwrap();
            hero.hit_points.current = 5;
            hero.mana.current = 4;
        }
        engine.player_turn(Intent::Wait).unwrap();
        let hero = engine.world.player().unwrap();
        assert_eq!(hero.hit_points.current, 6);
        assert_eq!(hero.mana.current, 4);
    }

    #[test]
    fn test_rest_until_full() {
        let mut engine = engine();
        let id = engine.player_id();
        engine.world.actor_mut(id).unwrap().hit_points.current = 6;
        let report = engine.player_turn(Intent::Rest { turns: None }).unwrap();
        assert_eq!(report.player.outcome, ActionOutcome::Ticked(4));
        assert_eq!(report.player.narrative(), "Hero is fully rested.");
        assert_eq!(engine.clock.current_turn(), 4);
    }

    #[test]
    fn test_rest_interrupted_before_first_tick() {
        let mut engine = engine();
        let id = engine.player_id();
        engine.world.actor_mut(id).unwrap().hit_points.current = 6;
        let mut goblin = Actor::new("goblin");
        goblin.position = Position::new(7, 7);
        engine.world.spawn(goblin);
        let err = engine.player_turn(Intent::Rest { turns: None }).unwrap_err();
        assert_eq!(err.to_string(), "Goblin spotted.");
        assert_eq!(engine.clock.current_turn(), 0);
    }

    #[test]
    fn test_fixed_rest() {
        let mut engine = engine();
        let report = engine.player_turn(Intent::Rest { turns: Some(3) }).unwrap();
        assert_eq!(report.player.outcome, ActionOutcome::Ticked(3));
        assert_eq!(report.player.narrative(), "Hero stops resting.");
        assert_eq!(engine.clock.current_turn(), 3);
    }

    #[test]
    fn test_pick_up_stacks() {
        let mut engine = engine();
        let at = Position::new(2, 2);
        engine.world.add_item(Item::new("arrows").stackable(20), at);
        engine.world.add_item(Item::new("arrows").stackable(10), at);

        let first = engine.player_turn(Intent::PickUp).unwrap();
        assert_eq!(first.player.narrative(), "You picked up the arrows!");
        let second = engine.player_turn(Intent::PickUp).unwrap();
        assert_eq!(second.player.narrative(), "You have one more arrows!");

        let hero = engine.world.player().unwrap();
        assert_eq!(hero.inventory.items.len(), 1);
        assert_eq!(hero.inventory.items[0].count, 30);
        assert!(engine.player_turn(Intent::PickUp).is_err());
    }

    #[test]
    fn test_full_inventory_rejects_pickup() {
        let mut engine = engine().with_config(EngineConfig::default().with_inventory_capacity(0));
        engine.world.add_item(Item::new("dagger"), Position::new(2, 2));
        let err = engine.player_turn(Intent::PickUp).unwrap_err();
        assert_eq!(err.to_string(), "Your inventory is full.");
        assert_eq!(engine.world.ground_items.len(), 1);
    }

    fn spear() -> Item {
        Item::weapon(
            Weapon::new("spear", "stabs", DamageDice::new(1, 8)).with_critical(20, 3),
            EquipSlot::MainHand,
        )
    }

    #[test]
    fn test_equip_toggles_and_swaps() {
        let mut engine = engine();
        let id = engine.player_id();
        {
            let hero = engine.world.actor_mut(id).unwrap();
            hero.inventory.stow(spear());
            hero.inventory.stow(Item::weapon(
                Weapon::new("club", "clubs", DamageDice::new(1, 6)),
                EquipSlot::MainHand,
            ));
        }

        let report = engine.player_turn(Intent::Equip { index: 0 }).unwrap();
        assert_eq!(report.player.narrative(), "You equip the spear.");
        assert_eq!(engine.clock.current_turn(), 1);
        let weapon = engine.world.player().unwrap().equipment.main_hand.clone();
        assert_eq!(weapon.map(|w| w.crit_multiplier), Some(3));

        let report = engine.player_turn(Intent::Equip { index: 1 }).unwrap();
        assert_eq!(report.player.narrative(), "You remove the spear. You equip the club.");

        let report = engine.player_turn(Intent::Equip { index: 1 }).unwrap();
        assert_eq!(report.player.narrative(), "You remove the club.");
        assert_eq!(engine.world.player().unwrap().equipment.main_hand, None);
    }

    #[test]
    fn test_equip_rejects_bad_entries() {
        let mut engine = engine();
        let id = engine.player_id();
        engine
            .world
            .actor_mut(id)
            .unwrap()
            .inventory
            .stow(Item::new("rope"));

        let err = engine.player_turn(Intent::Equip { index: 0 }).unwrap_err();
        assert_eq!(err.to_string(), "The rope cannot be equipped.");
        let err = engine.player_turn(Intent::Equip { index: 4 }).unwrap_err();
        assert_eq!(err.to_string(), "Invalid entry.");
        assert_eq!(engine.clock.current_turn(), 0);
    }

    #[test]
    fn test_drop_puts_the_item_underfoot() {
        let mut engine = engine();
        let id = engine.player_id();
        engine.world.actor_mut(id).unwrap().inventory.stow(spear());
        engine.player_turn(Intent::Equip { index: 0 }).unwrap();

        let report = engine.player_turn(Intent::Drop { index: 0 }).unwrap();
        assert_eq!(report.player.narrative(), "You remove the spear. You dropped the spear.");
        let hero = engine.world.player().unwrap();
        assert!(hero.inventory.items.is_empty());
        assert_eq!(hero.equipment.main_hand, None);
        assert_eq!(engine.world.items_at(Position::new(2, 2)).count(), 1);

        // It can be picked straight back up.
        let report = engine.player_turn(Intent::PickUp).unwrap();
        assert_eq!(report.player.narrative(), "You picked up the spear!");
        assert!(engine.player_turn(Intent::Drop { index: 3 }).is_err());
    }
}
