//! Headless driver for Glitch Protocol.
//!
//! A line-oriented protocol over stdin, for scripted play and quick manual
//! checks without a renderer:
//! - `start`, `level <id>`, `back`, `close`
//! - `walk <w|a|s|d> <frames>`, `space`, `skills`
//! - `use <skill_id>` during combat (the automated turns run afterwards)
//! - `say <text>`, `pet`, `bye` while talking to an NPC
//! - `buy <item_id>`, `item <index>`, `unlock <skill_id>`
//! - `#status`, `#quit`
//!
//! Run with: `cargo run -p glitch-core --example headless`

use glitch_core::catalog;
use glitch_core::combat::CombatPhase;
use glitch_core::world::EntityId;
use glitch_core::{GameSession, Key, Response, SessionConfig, SessionError};
use std::io::{self, BufRead};
use std::time::Duration;

const FRAME: Duration = Duration::from_millis(16);

struct Driver {
    session: GameSession,
    now: Duration,
}

impl Driver {
    fn tick(&mut self) -> Response {
        self.now += FRAME;
        let response = self.session.tick(self.now);
        if self.now.as_millis() % 1000 < FRAME.as_millis() {
            self.session.sweep_effects(self.now);
        }
        response
    }

    fn walk(&mut self, key: Key, frames: usize) {
        self.session.key_down(key);
        for _ in 0..frames {
            let response = self.tick();
            print_response(&response);
            if self.session.combat().is_some() {
                break;
            }
        }
        self.session.key_up(key);
    }

    fn finish_round(&mut self) {
        while self
            .session
            .combat()
            .is_some_and(|c| matches!(c.phase, CombatPhase::CompanionTurn | CombatPhase::EnemyTurn))
        {
            let response = self.session.advance_combat();
            print_response(&response);
        }
    }

    fn status(&self) {
        let world = self.session.world();
        let player = world.player();
        println!(
            "[STATUS] {:?} | HP {}/{} | LV {} ({}/{} XP) | Subs {} | at ({:.0}, {:.0})",
            world.screen,
            player.hit_points.current,
            player.hit_points.maximum,
            player.level,
            player.xp,
            player.max_xp,
            world.subscribers,
            world.player_position.x,
            world.player_position.y,
        );
        if let Some(nearby) = self.session.nearby() {
            println!("[NEARBY] {}", nearby.label);
        }
        if let Some(combat) = self.session.combat() {
            println!(
                "[COMBAT] {} {}/{} | {:?}",
                combat.enemy.name,
                combat.enemy.hit_points.current,
                combat.enemy.hit_points.maximum,
                combat.phase
            );
        }
        if let Some(banter) = self.session.banter() {
            println!("[BANTER] {banter}");
        }
    }
}

fn print_response(response: &Response) {
    if !response.narrative.is_empty() {
        println!("{}", response.narrative);
    }
}

fn key_for(dir: &str) -> Option<Key> {
    match dir {
        "w" | "up" => Some(Key::W),
        "a" | "left" => Some(Key::A),
        "s" | "down" => Some(Key::S),
        "d" | "right" => Some(Key::D),
        _ => None,
    }
}

#[tokio::main]
async fn main() -> Result<(), SessionError> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let session = GameSession::new(SessionConfig::new("Glitched Bot"))?;
    let mut driver = Driver {
        session,
        now: Duration::ZERO,
    };

    println!("=== Glitch Protocol (headless) ===");
    driver.status();

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Error reading input: {e}");
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));

        let response = match command {
            "#quit" | "#exit" => {
                println!("Goodbye!");
                break;
            }
            "#status" => {
                driver.status();
                continue;
            }
            "start" => driver.session.start(),
            "level" => driver.session.select_level(rest.trim()),
            "back" => driver.session.back_to_intro(),
            "close" => driver.session.close_overlay(),
            "walk" => {
                let mut parts = rest.split_whitespace();
                let key = parts.next().and_then(key_for);
                let frames = parts.next().and_then(|f| f.parse().ok()).unwrap_or(30);
                match key {
                    Some(key) => driver.walk(key, frames),
                    None => println!("[ERROR] Usage: walk <w|a|s|d> <frames>"),
                }
                driver.status();
                continue;
            }
            "space" => {
                driver.session.key_down(Key::Space);
                driver.session.key_up(Key::Space)
            }
            "skills" => driver.session.key_up(Key::K),
            "use" => {
                let response = driver.session.combat_action(0, rest.trim());
                print_response(&response);
                driver.finish_round();
                driver.status();
                continue;
            }
            "say" => driver.session.send_chat(rest).await,
            "pet" => driver.session.pet_companion(),
            "bye" => driver.session.close_dialogue(),
            "buy" => driver.session.buy_item(rest.trim()),
            "item" => match rest.trim().parse() {
                Ok(index) => driver.session.use_item(index, None),
                Err(_) => {
                    println!("[ERROR] Usage: item <index>");
                    continue;
                }
            },
            "unlock" => driver
                .session
                .unlock_skill(&EntityId::new(catalog::PLAYER_ID), rest.trim()),
            other => {
                println!("[ERROR] Unknown command: {other}");
                continue;
            }
        };
        print_response(&response);
    }

    Ok(())
}
