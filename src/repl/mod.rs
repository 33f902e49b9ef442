//! REPL (Read-Eval-Print Loop) for exploring four-part progressions

use crate::commands::progression::render;
use crate::commands::{create_registry, CommandContext, CommandRegistry, CommandResult};
use anyhow::{anyhow, Result};
use chorale_core::session::SessionConfig;
use colored::*;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RustylineResult};

/// Interactive REPL driving one harmony session
pub struct Repl {
    editor: DefaultEditor,
    registry: CommandRegistry,
    ctx: CommandContext,
}

impl Repl {
    /// Create a new REPL instance
    pub fn new(config: SessionConfig) -> RustylineResult<Self> {
        Ok(Repl {
            editor: DefaultEditor::new()?,
            registry: create_registry(),
            ctx: CommandContext::new(config),
        })
    }

    /// Handle one line of input. Returns false when the REPL should stop.
    fn dispatch(&mut self, line: &str) -> bool {
        match self.registry.execute(line, &mut self.ctx) {
            CommandResult::Success => {}
            CommandResult::Message(msg) => println!("{}", msg),
            CommandResult::Exit => {
                println!("{} 🎵", "Goodbye!".bright_cyan());
                return false;
            }
            CommandResult::Error(e) => {
                println!("{} {}", "Error:".bright_red().bold(), e.red());
            }
            CommandResult::NotACommand => match self.ctx.voice_literal(line) {
                Ok((progression, voiced)) => println!("{}", render(&progression, &voiced)),
                Err(e) => println!(
                    "{} {}",
                    "Error:".bright_red().bold(),
                    e.to_string().red()
                ),
            },
        }
        true
    }

    /// Start the REPL loop
    pub fn run(&mut self) -> Result<()> {
        println!(
            "{} {}",
            "🎼".bright_yellow(),
            "Chorale four-part harmony".bright_cyan().bold()
        );
        println!(
            "Try {}, {} or type a progression like {}",
            "generate".cyan(),
            "generate G 5".cyan(),
            "I vi ii V I".cyan()
        );
        println!(
            "Type '{}' for more information, '{}' or {} to exit.\n",
            "help".bright_green(),
            "quit".bright_red(),
            "Ctrl+C".bright_red()
        );

        let prompt = format!("{} ", "chorale>".bright_magenta().bold());
        loop {
            match self.editor.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    let _ = self.editor.add_history_entry(line);
                    if !self.dispatch(line) {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                    println!("{} 🎵", "Goodbye!".bright_cyan());
                    break;
                }
                Err(err) => {
                    println!("{} {:?}", "Error:".bright_red().bold(), err);
                    break;
                }
            }
        }
        Ok(())
    }
}

/// Route core diagnostics to stderr, filtered by `RUST_LOG`
fn setup_tracing() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|err: Box<dyn std::error::Error + Send + Sync>| {
            anyhow!("failed to initialise tracing: {err}")
        })?;
    Ok(())
}

/// Start the REPL with default settings
pub fn start() -> Result<()> {
    setup_tracing()?;
    let mut repl = Repl::new(SessionConfig::default())?;
    repl.run()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_subscriber_installs_once() {
        assert!(setup_tracing().is_ok());
        assert!(setup_tracing().is_err());
    }
}
