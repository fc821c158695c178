//! Operator console
//!
//! A line-based REPL that plays the role of the UI: it lets the operator
//! browse the parameter tree, focus a parameter and ask for it to be linked,
//! and save or reload the links file. Lines are read on a dedicated thread
//! and handed to the main loop as [`Command`]s.

use anyhow::{bail, Result};
use colored::*;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::thread;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// A console command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the parameter tree with current values
    Params,
    /// Focus a parameter or group
    Focus(String),
    /// Link the focused parameter, or focus `path` first
    Learn(Option<String>),
    /// Show parameters waiting for a control
    Pending,
    /// Show current links
    Links,
    /// Save links (to the configured file unless a path is given)
    Save(Option<String>),
    /// Load links (from the configured file unless a path is given)
    Load(Option<String>),
    Help,
    Quit,
}

impl Command {
    /// Parse one console line
    pub fn parse(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            bail!("Empty command");
        };
        let arg = words.next().map(str::to_string);
        if words.next().is_some() {
            bail!("Too many arguments for '{}'", verb);
        }

        let command = match (verb.to_lowercase().as_str(), arg) {
            ("params" | "ls", None) => Command::Params,
            ("focus" | "f", Some(path)) => Command::Focus(path),
            ("focus" | "f", None) => bail!("Usage: focus <path>"),
            ("learn" | "l", path) => Command::Learn(path),
            ("pending", None) => Command::Pending,
            ("links", None) => Command::Links,
            ("save", path) => Command::Save(path),
            ("load", path) => Command::Load(path),
            ("help" | "?", None) => Command::Help,
            ("quit" | "exit" | "q", None) => Command::Quit,
            (other, _) => bail!("Unknown command '{}' (try 'help')", other),
        };

        Ok(command)
    }
}

/// Console help text
pub fn help_text() -> String {
    [
        ("params", "show the parameter tree"),
        ("focus <path>", "focus a parameter"),
        ("learn [path]", "link the focused parameter to the next control you move"),
        ("pending", "show parameters waiting for a control"),
        ("links", "show current links"),
        ("save [file]", "save links"),
        ("load [file]", "load links"),
        ("quit", "save (if autosave) and exit"),
    ]
    .iter()
    .map(|(usage, what)| format!("  {:<14} {}", usage.yellow(), what))
    .collect::<Vec<_>>()
    .join("\n")
}

/// Start the REPL on its own thread
///
/// The returned receiver closes when the operator quits or stdin ends.
pub fn spawn_repl() -> Result<mpsc::Receiver<Command>> {
    let (tx, rx) = mpsc::channel(16);

    thread::Builder::new()
        .name("console".to_string())
        .spawn(move || {
            let mut rl = match DefaultEditor::new() {
                Ok(rl) => rl,
                Err(e) => {
                    warn!("Console unavailable: {}", e);
                    return;
                }
            };
            repl_loop(&mut rl, &tx);
        })?;

    Ok(rx)
}

fn repl_loop(rl: &mut DefaultEditor, tx: &mpsc::Sender<Command>) {
    loop {
        match rl.readline("link> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line.as_str());

                match Command::parse(&line) {
                    Ok(command) => {
                        let quit = command == Command::Quit;
                        if tx.blocking_send(command).is_err() || quit {
                            break;
                        }
                    }
                    Err(e) => println!("{}", e.to_string().red()),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                let _ = tx.blocking_send(Command::Quit);
                break;
            }
            Err(e) => {
                debug!("Console read error: {}", e);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("params").unwrap(), Command::Params);
        assert_eq!(
            Command::parse("  focus lights/dimmer ").unwrap(),
            Command::Focus("lights/dimmer".to_string())
        );
        assert_eq!(Command::parse("learn").unwrap(), Command::Learn(None));
        assert_eq!(
            Command::parse("L fx/mix").unwrap(),
            Command::Learn(Some("fx/mix".to_string()))
        );
        assert_eq!(Command::parse("save").unwrap(), Command::Save(None));
        assert_eq!(
            Command::parse("load other.json").unwrap(),
            Command::Load(Some("other.json".to_string()))
        );
        assert_eq!(Command::parse("exit").unwrap(), Command::Quit);
    }

    #[test]
    fn test_parse_errors() {
        assert!(Command::parse("").is_err());
        assert!(Command::parse("focus").is_err());
        assert!(Command::parse("links extra").is_err());
        assert!(Command::parse("learn a b").is_err());
        assert!(Command::parse("dance").is_err());
    }

    #[test]
    fn test_help_mentions_every_command() {
        let help = help_text();
        for verb in ["params", "focus", "learn", "pending", "links", "save", "load", "quit"] {
            assert!(help.contains(verb), "missing {verb}");
        }
    }
}
