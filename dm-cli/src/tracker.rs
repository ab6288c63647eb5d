//! Line-oriented combat tracker.
//!
//! Reads one command per line from stdin and prints the combat-log lines each
//! command produced. The session is auto-saved on the configured interval
//! and once more on exit.

use anyhow::Result;
use dm_core::{CombatState, DmSession};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
Commands (quote names with spaces, e.g. \"Goblin #2\"):
  add <name> <hp> [initiative]           - Add a combatant (initiative rolled if omitted)
  remove <name>                          - Remove a combatant and its ailments
  sort                                   - Sort by initiative
  next                                   - Advance to the next turn
  damage <name> <amount>                 - Deal damage
  heal <name> <amount>                   - Heal
  ail <target> <ailment> <turns> [source] - Apply an ailment
  cure <target> <ailment>                - Remove an ailment
  show                                   - Show initiative order and ailments
  log                                    - Print the full combat log
  save [path]                            - Save (defaults to the current save path)
  load <path>                            - Load a saved combat
  help                                   - Show this help
  quit                                   - Auto-save and exit";

enum Flow {
    Continue,
    Quit,
}

/// Run the tracker until `quit` or end of input.
pub async fn run(mut session: DmSession, state: Option<PathBuf>) -> Result<()> {
    match state {
        Some(path) => {
            session.load_combat(&path).await?;
            println!("[LOADED] {}", path.display());
        }
        None => match session.resume_last().await {
            Ok(Some(path)) => println!("[RESUMED] {}", path.display()),
            Ok(None) => {}
            Err(e) => println!("[ERROR] Could not resume last combat: {e}"),
        },
    }

    println!("=== Combat Tracker ===");
    println!("{HELP}");
    println!();
    show(session.combat());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(session.config().auto_save_interval());
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if let Flow::Quit = handle(&mut session, &line).await {
                    break;
                }
            }
            _ = ticker.tick() => {
                match session.auto_save().await {
                    Ok(path) => log::info!("Auto-saved combat state to '{}'", path.display()),
                    Err(e) => log::warn!("Auto-save failed: {e}"),
                }
            }
        }
    }

    match session.auto_save().await {
        Ok(path) => println!("[SAVED] {}", path.display()),
        Err(e) => println!("[ERROR] Final auto-save failed: {e}"),
    }
    println!("Goodbye!");
    Ok(())
}

async fn handle(session: &mut DmSession, line: &str) -> Flow {
    let args = split_args(line);
    let Some(command) = args.first().map(String::as_str) else {
        return Flow::Continue;
    };
    let before = session.combat().log().len();

    let result: Result<(), String> = match (command, &args[1..]) {
        ("quit" | "exit", _) => return Flow::Quit,
        ("help", _) => {
            println!("{HELP}");
            Ok(())
        }
        ("show", _) => {
            show(session.combat());
            Ok(())
        }
        ("log", _) => {
            println!("{}", session.combat().log().render());
            Ok(())
        }
        ("add", [name, hp]) => parse_int(hp)
            .and_then(|hp| session.add_combatant(name, hp, None).map_err(|e| e.to_string()))
            .map(drop),
        ("add", [name, hp, initiative]) => parse_int(hp)
            .and_then(|hp| Ok((hp, parse_int(initiative)?)))
            .and_then(|(hp, init)| {
                session
                    .add_combatant(name, hp, Some(init))
                    .map_err(|e| e.to_string())
            })
            .map(drop),
        ("remove", [name]) => session
            .combat_mut()
            .remove_combatant(name)
            .map(drop)
            .map_err(|e| e.to_string()),
        ("sort", []) => {
            session.combat_mut().sort_initiative();
            Ok(())
        }
        ("next", []) => {
            if session.combat().is_empty() {
                Err("No combatants in combat".to_string())
            } else {
                session.combat_mut().next_turn();
                Ok(())
            }
        }
        ("damage", [name, amount]) => parse_int(amount).and_then(|amount| {
            session
                .combat_mut()
                .apply_damage(name, amount)
                .map(drop)
                .map_err(|e| e.to_string())
        }),
        ("heal", [name, amount]) => parse_int(amount).and_then(|amount| {
            session
                .combat_mut()
                .heal(name, amount)
                .map(drop)
                .map_err(|e| e.to_string())
        }),
        ("ail", [target, ailment, turns, source @ ..]) => parse_turns(turns).and_then(|turns| {
            session
                .combat_mut()
                .add_ailment(target, ailment, turns, &source.join(" "))
                .map(drop)
                .map_err(|e| e.to_string())
        }),
        ("cure", [target, ailment]) => session
            .combat_mut()
            .remove_ailment(target, ailment)
            .map(drop)
            .map_err(|e| e.to_string()),
        ("save", []) => match session.combat_path().map(|p| p.to_path_buf()) {
            Some(path) => session.save_combat(&path).await.map_err(|e| e.to_string()),
            None => Err("Usage: save <path>".to_string()),
        },
        ("save", [path]) => session.save_combat(path).await.map_err(|e| e.to_string()),
        ("load", [path]) => session.load_combat(path).await.map_err(|e| e.to_string()),
        _ => Err(format!("Unknown or malformed command '{line}'. Type help for help.")),
    };

    match result {
        Ok(()) => {
            let lines = session.combat().log().lines();
            for entry in &lines[before.min(lines.len())..] {
                println!("{entry}");
            }
        }
        Err(e) => println!("[ERROR] {e}"),
    }
    Flow::Continue
}

fn show(combat: &CombatState) {
    println!("[ROUND {}]", combat.round());
    if combat.is_empty() {
        println!("  (no combatants)");
        return;
    }
    for (i, c) in combat.combatants().iter().enumerate() {
        let marker = if combat.current_turn() == Some(i) { '>' } else { ' ' };
        let ailments: Vec<String> = combat
            .ailments_for(&c.name)
            .iter()
            .map(|a| format!("{} ({})", a.name, a.duration))
            .collect();
        let down = if c.is_down() { " DOWN" } else { "" };
        println!(
            "{marker} {:<20} Init {:>3}  HP {:>4}{down}  {}",
            c.name,
            c.initiative,
            c.hp,
            ailments.join(", ")
        );
    }
}

fn parse_int(text: &str) -> Result<i32, String> {
    text.parse()
        .map_err(|_| format!("'{text}' is not a whole number"))
}

fn parse_turns(text: &str) -> Result<u32, String> {
    text.parse()
        .map_err(|_| format!("Duration must be a positive whole number, got '{text}'"))
}

/// Split a command line on whitespace, keeping double-quoted runs together.
fn split_args(line: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut pending = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                quoted = !quoted;
                pending = true;
            }
            c if c.is_whitespace() && !quoted => {
                if pending {
                    args.push(std::mem::take(&mut current));
                    pending = false;
                }
            }
            c => {
                current.push(c);
                pending = true;
            }
        }
    }
    if pending {
        args.push(current);
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_args_keeps_quoted_names() {
        assert_eq!(
            split_args(r#"damage "Goblin #2" 5"#),
            vec!["damage", "Goblin #2", "5"]
        );
        assert_eq!(split_args("  next  "), vec!["next"]);
        assert!(split_args("   ").is_empty());
    }
}
