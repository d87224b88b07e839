//! A short scripted skirmish: an elf wizard against a goblin patrol.
//!
//! Run with `RUST_LOG=d20_core=debug` to see the engine's tracing output.

use d20_core::ai::nearest_enemy;
use d20_core::{bestiary, Engine, GameMap, Intent, Position, RngRoller, World};

const MAX_TURNS: usize = 40;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let seed = std::env::args()
        .nth(1)
        .map(|s| s.parse::<u64>())
        .transpose()?
        .unwrap_or(7);

    let wizard = bestiary::spawn("elf wizard", Position::new(2, 5))?;
    let mut world = World::new(GameMap::open(16, 10), wizard);
    world.spawn(bestiary::spawn("goblin", Position::new(9, 4))?);
    world.spawn(bestiary::spawn("goblin", Position::new(10, 6))?);
    world.spawn(bestiary::spawn("orc", Position::new(12, 5))?);
    world.add_gold(12, Position::new(3, 5));

    let mut engine = Engine::new(world).with_roller(RngRoller::seeded(seed));
    println!("=== Skirmish (seed {seed}) ===\n");

    let opening = [
        Intent::CastSpell {
            spell: "Mage Armor".to_string(),
            target: None,
        },
        Intent::CastSpell {
            spell: "Summon Monster 1".to_string(),
            target: Some(Position::new(3, 4)),
        },
    ];
    let mut printed = 0;
    for intent in opening {
        // A rejected opener is already in the log.
        let _ = engine.player_turn(intent);
        printed = flush_log(&engine, printed);
    }

    for _ in 0..MAX_TURNS {
        if engine.is_player_dead() {
            break;
        }
        let Some(intent) = next_intent(&engine) else {
            println!("\nThe field is clear after {} turns.", engine.clock.current_turn());
            break;
        };
        if engine.player_turn(intent).is_err() {
            // Out of options this turn: catch a breath instead.
            let _ = engine.player_turn(Intent::Wait);
        }
        printed = flush_log(&engine, printed);
    }

    if let Some(player) = engine.world.player() {
        println!(
            "\nHP {}/{}  mana {}/{}  gold {}",
            player.hit_points.current,
            player.hit_points.maximum,
            player.mana.current,
            player.mana.maximum,
            player.gold
        );
    }
    Ok(())
}

/// Melee whatever is adjacent, missile anything in sight, else close in.
fn next_intent(engine: &Engine) -> Option<Intent> {
    let player = engine.world.player()?;
    let enemy = nearest_enemy(&engine.world, player)?;
    let distance = player.position.distance(enemy.position);

    let intent = if distance < engine.config.melee_reach {
        Intent::MeleeAttack {
            target: enemy.position,
        }
    } else if player.mana.current > 0 {
        Intent::CastSpell {
            spell: "Magic Missile".to_string(),
            target: Some(enemy.position),
        }
    } else {
        let (dx, dy) = player.position.step_toward(enemy.position);
        Intent::Bump { dx, dy }
    };
    Some(intent)
}

fn flush_log(engine: &Engine, printed: usize) -> usize {
    let messages = engine.log.messages();
    for message in messages.iter().skip(printed) {
        println!("[turn {:>2}] {}", engine.clock.current_turn(), message.full_text());
    }
    messages.len()
}
