//! General REPL commands (help, quit, status)

use crate::commands::{CommandContext, CommandResult};
use colored::*;

/// Handle `help` command
pub fn cmd_help(_args: &str, _ctx: &mut CommandContext) -> CommandResult {
    print_help();
    CommandResult::Success
}

/// Handle `quit` or `exit` command
pub fn cmd_quit(_args: &str, _ctx: &mut CommandContext) -> CommandResult {
    CommandResult::Exit
}

/// Handle `status` command
pub fn cmd_status(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    CommandResult::Message(status_line(ctx))
}

pub fn status_line(ctx: &CommandContext) -> String {
    let session = &ctx.session;
    let config = session.config();
    let position = match session.cursor() {
        Some(i) => format!("{}/{}", i + 1, session.history().len()),
        None => "-".to_string(),
    };
    format!(
        "{} {} {}, {} chords, {}, {} voicing, {} [{}] {}",
        "Key:".green(),
        config.tonality.cyan(),
        config.generator.mode,
        config.length,
        config.strategy,
        config.voicing.algorithm,
        config.formation.name.cyan(),
        session.state(),
        position
    )
}

/// Print help information
fn print_help() {
    println!("{}", "🎼 Chorale Help".bold());
    println!("{}", "===============".bold());
    println!();
    println!("{}", "Progressions:".green());
    println!("  {}  - Start a new search and show the first result", "generate [key] [length]".cyan());
    println!("  {}                    - Next progression", "next".cyan());
    println!("  {}                    - Previous progression", "prev".cyan());
    println!("  {}                    - Show the current progression", "show".cyan());
    println!("  {}                   - Revoice with a random tie-break", "regen".cyan());
    println!("  {}                  - Print the current entry as JSON", "export".cyan());
    println!("  {}             - Voice a progression you type", "I vi ii V I".cyan());
    println!();
    println!("{}", "Settings:".green());
    println!("  {}               - Tonality (C, F#, Bb, ...)", "key <name>".cyan());
    println!("  {}             - Chords per progression", "length <n>".cyan());
    println!("  {}   - Plain or inverted triads", "strategy tonal|inverted".cyan());
    println!("  {}        - Major or harmonic minor", "mode major|minor".cyan());
    println!("  {}        - Ensemble ranges (no name lists them)", "formation [name]".cyan());
    println!("  {} - Voice-leading algorithm", "voicer greedy|exhaustive".cyan());
    println!("  {}            - Record pruned candidates", "trace on|off".cyan());
    println!("  {}              - Show pruned candidates", "trace show".cyan());
    println!("  {}                  - Current settings", "status".cyan());
    println!();
    println!("{}", "Examples:".green());
    println!("  chorale> {}", "generate G 5".cyan());
    println!("  I → IV → ii → V → I");
    println!();
    println!("  chorale> {}", "formation piano".cyan());
    println!("  Formation set to Piano");
    println!();
    println!("Type '{}' or '{}' to leave.", "quit".bright_red(), "exit".bright_red());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_reports_settings() {
        let mut ctx = CommandContext::default();
        match cmd_status("", &mut ctx) {
            CommandResult::Message(msg) => {
                assert!(msg.contains("4 chords"));
                assert!(msg.contains("not started"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
