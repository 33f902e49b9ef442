//! Command registry for REPL commands
//!
//! Provides a clean, extensible pattern for handling REPL commands.

pub mod general;
pub mod progression;

use anyhow::Result;
use chorale_core::session::{Session, SessionConfig};
use chorale_core::types::Progression;
use chorale_core::voice_leading::assign;
use chorale_core::VoicedProgression;

/// Result of executing a command
#[derive(Debug)]
pub enum CommandResult {
    /// Command executed successfully, continue REPL
    Success,
    /// Command executed, show this message
    Message(String),
    /// Exit the REPL
    Exit,
    /// Not a command, try reading it as a progression
    NotACommand,
    /// Error occurred
    Error(String),
}

/// Context passed to command handlers
pub struct CommandContext {
    pub session: Session,
}

impl CommandContext {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            session: Session::new(config),
        }
    }

    /// Voice a typed progression such as "I vi ii V I" in the session's key
    pub fn voice_literal(&self, input: &str) -> Result<(Progression, VoicedProgression)> {
        let config = self.session.config();
        let progression = Progression::parse(input, &config.tonality, config.generator.mode)?;
        let voiced = assign(&progression, &config.formation.tessituras, &config.voicing)?;
        Ok((progression, voiced))
    }
}

impl Default for CommandContext {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

/// A command handler function
pub type CommandHandler = fn(&str, &mut CommandContext) -> CommandResult;

/// Registry of available commands
pub struct CommandRegistry {
    /// Commands indexed by their prefix (e.g., "trace show")
    /// Sorted by prefix length descending for longest-match-first lookup
    commands: Vec<(String, CommandHandler)>,
}

impl CommandRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    /// Register a command with its prefix
    pub fn register(&mut self, prefix: &str, handler: CommandHandler) {
        self.commands.push((prefix.to_string(), handler));
        // Sort by prefix length descending for longest-match-first
        self.commands.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    }

    /// Execute a command, returning NotACommand if no match found
    pub fn execute(&self, input: &str, ctx: &mut CommandContext) -> CommandResult {
        for (prefix, handler) in &self.commands {
            if input == prefix || input.starts_with(&format!("{} ", prefix)) {
                let args = input[prefix.len()..].trim();
                return handler(args, ctx);
            }
        }
        CommandResult::NotACommand
    }

    /// Get all registered command prefixes
    pub fn list_commands(&self) -> Vec<&str> {
        self.commands.iter().map(|(p, _)| p.as_str()).collect()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a fully populated command registry with all built-in commands
pub fn create_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();

    // Progression commands
    registry.register("generate", progression::cmd_generate);
    registry.register("next", progression::cmd_next);
    registry.register("prev", progression::cmd_prev);
    registry.register("show", progression::cmd_show);
    registry.register("regen", progression::cmd_regen);
    registry.register("export", progression::cmd_export);
    registry.register("trace show", progression::cmd_trace_show);
    registry.register("trace", progression::cmd_trace);

    // Settings
    registry.register("key", progression::cmd_key);
    registry.register("length", progression::cmd_length);
    registry.register("strategy", progression::cmd_strategy);
    registry.register("mode", progression::cmd_mode);
    registry.register("formation", progression::cmd_formation);
    registry.register("voicer", progression::cmd_voicer);
    registry.register("status", general::cmd_status);

    // General commands
    registry.register("help", general::cmd_help);
    registry.register("quit", general::cmd_quit);
    registry.register("exit", general::cmd_quit);

    registry
}
