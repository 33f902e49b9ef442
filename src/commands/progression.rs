//! Progression and settings commands

use crate::commands::{CommandContext, CommandResult};
use chorale_core::generator::Strategy;
use chorale_core::session::Session;
use chorale_core::types::{Formation, Mode, Note, Progression, Spelling, Voice};
use chorale_core::voice_leading::VoicingAlgorithm;
use chorale_core::{Entry, VoicedProgression};
use colored::*;

/// Most rejections printed by `trace show`
const TRACE_LIMIT: usize = 40;

/// Render a progression with its voicing and any warnings
pub fn render(progression: &Progression, voiced: &VoicedProgression) -> String {
    let symbols: Vec<String> = progression
        .chords()
        .map(|c| format!("{:<6}", c.chord_symbol()))
        .collect();
    let functions: Vec<String> = progression
        .chords()
        .map(|c| format!("{:<6}", c.function().abbreviation()))
        .collect();

    let mut out = format!(
        "{}\n{} {}\n{} {}\n\n{}",
        progression.to_string().bright_cyan().bold(),
        "Chords:   ".green(),
        symbols.join("").trim_end(),
        "Functions:".green(),
        functions.join("").trim_end(),
        voiced
    );
    for warning in voiced.warnings() {
        out.push_str(&format!("\n{} {}", "⚠".yellow(), warning.to_string().yellow()));
    }
    out
}

fn render_entry(entry: &Entry) -> String {
    render(entry.progression(), entry.voiced())
}

/// "[2/5]" style marker for the cursor
fn position(session: &Session) -> String {
    match session.cursor() {
        Some(i) => format!("[{}/{}]", i + 1, session.history().len())
            .dimmed()
            .to_string(),
        None => String::new(),
    }
}

fn with_position(session: &Session, body: String) -> CommandResult {
    CommandResult::Message(format!("{} {}", position(session), body))
}

fn pull_next(ctx: &mut CommandContext) -> CommandResult {
    let body = match ctx.session.next() {
        Ok(Some(entry)) => render_entry(entry),
        Ok(None) => {
            let config = ctx.session.config();
            let reason = if ctx.session.is_truncated() {
                "search stopped on its step budget"
            } else {
                "search exhausted"
            };
            let text = if ctx.session.history().is_empty() {
                format!(
                    "No {}-chord progression in {} {} ({})",
                    config.length, config.tonality, config.generator.mode, reason
                )
            } else {
                format!("No more progressions ({})", reason)
            };
            return CommandResult::Message(text.yellow().to_string());
        }
        Err(e) => return CommandResult::Error(e.to_string()),
    };
    with_position(&ctx.session, body)
}

/// Handle `generate [key] [length]` command
pub fn cmd_generate(args: &str, ctx: &mut CommandContext) -> CommandResult {
    for arg in args.split_whitespace() {
        let applied = match arg.parse::<usize>() {
            Ok(length) => ctx.session.set_length(length),
            Err(_) => ctx.session.set_tonality(arg),
        };
        if let Err(e) = applied {
            return CommandResult::Error(e.to_string());
        }
    }
    if let Err(e) = ctx.session.start() {
        return CommandResult::Error(e.to_string());
    }
    pull_next(ctx)
}

/// Handle `next` command
pub fn cmd_next(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    pull_next(ctx)
}

/// Handle `prev` command
pub fn cmd_prev(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    let body = match ctx.session.previous() {
        Some(entry) => render_entry(entry),
        None => {
            return CommandResult::Message("Already at the first progression".yellow().to_string())
        }
    };
    with_position(&ctx.session, body)
}

/// Handle `show` command
pub fn cmd_show(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    match ctx.session.current() {
        Some(entry) => with_position(&ctx.session, render_entry(entry)),
        None => CommandResult::Error("No progression yet. Try 'generate'".to_string()),
    }
}

/// Handle `regen` command
pub fn cmd_regen(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    match ctx.session.regenerate_voice_leading() {
        Ok(entry) => {
            let body = render_entry(entry);
            with_position(&ctx.session, body)
        }
        Err(e) => CommandResult::Error(e.to_string()),
    }
}

/// Handle `export` command
pub fn cmd_export(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    let Some(entry) = ctx.session.current() else {
        return CommandResult::Error("Nothing to export. Try 'generate'".to_string());
    };
    match serde_json::to_string_pretty(&entry.snapshot()) {
        Ok(json) => CommandResult::Message(json),
        Err(e) => CommandResult::Error(format!("Export failed: {}", e)),
    }
}

/// Handle `trace [on|off]` command
pub fn cmd_trace(args: &str, ctx: &mut CommandContext) -> CommandResult {
    let enabled = match args {
        "" => {
            let state = if ctx.session.config().generator.trace { "on" } else { "off" };
            return CommandResult::Message(format!("Trace is {}", state));
        }
        "on" => true,
        "off" => false,
        _ => return CommandResult::Error("Usage: trace on|off|show".to_string()),
    };
    ctx.session.set_trace(enabled);
    CommandResult::Message(format!(
        "Trace {}. Applies from the next 'generate'",
        if enabled { "on" } else { "off" }
    ))
}

/// Handle `trace show` command
pub fn cmd_trace_show(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    if !ctx.session.config().generator.trace {
        return CommandResult::Error("Trace is off. Use 'trace on' then 'generate'".to_string());
    }
    let rejections = ctx.session.take_rejections();
    if rejections.is_empty() {
        return CommandResult::Message("No rejected candidates recorded".to_string());
    }
    let mut out = format!("{} rejected candidate(s)", rejections.len())
        .yellow()
        .to_string();
    for rejection in rejections.iter().take(TRACE_LIMIT) {
        out.push_str(&format!("\n  {}", rejection));
    }
    if rejections.len() > TRACE_LIMIT {
        out.push_str(&format!("\n  ... {} more", rejections.len() - TRACE_LIMIT));
    }
    CommandResult::Message(out)
}

/// Handle `key [name]` command
pub fn cmd_key(args: &str, ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::Message(format!("Key: {}", ctx.session.config().tonality));
    }
    match ctx.session.set_tonality(args) {
        Ok(()) => settings_changed(format!("Key set to {}", ctx.session.config().tonality)),
        Err(e) => CommandResult::Error(e.to_string()),
    }
}

/// Handle `length [n]` command
pub fn cmd_length(args: &str, ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::Message(format!("Length: {}", ctx.session.config().length));
    }
    let Ok(length) = args.parse::<usize>() else {
        return CommandResult::Error(format!("Invalid length '{}'", args));
    };
    match ctx.session.set_length(length) {
        Ok(()) => settings_changed(format!("Length set to {}", length)),
        Err(e) => CommandResult::Error(e.to_string()),
    }
}

/// Handle `strategy [tonal|inverted]` command
pub fn cmd_strategy(args: &str, ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::Message(format!("Strategy: {}", ctx.session.config().strategy));
    }
    match args.parse::<Strategy>() {
        Ok(strategy) => {
            ctx.session.set_strategy(strategy);
            settings_changed(format!("Strategy set to {}", strategy))
        }
        Err(e) => CommandResult::Error(e.to_string()),
    }
}

/// Handle `mode [major|minor]` command
pub fn cmd_mode(args: &str, ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::Message(format!("Mode: {}", ctx.session.config().generator.mode));
    }
    match args.parse::<Mode>() {
        Ok(mode) => {
            ctx.session.set_mode(mode);
            settings_changed(format!("Mode set to {}", mode))
        }
        Err(e) => CommandResult::Error(e.to_string()),
    }
}

fn settings_changed(text: String) -> CommandResult {
    CommandResult::Message(format!(
        "{}. History cleared, run '{}' to search",
        text.bright_green(),
        "generate".cyan()
    ))
}

fn range_name(pitch: i32) -> String {
    Note::from_midi(pitch, Spelling::Sharp).scientific()
}

/// Handle `formation [name]` command
pub fn cmd_formation(args: &str, ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        let current = &ctx.session.config().formation;
        let mut out = String::from("Formations:");
        for formation in Formation::builtins() {
            let marker = if formation.name == current.name { "*" } else { " " };
            let ranges: Vec<String> = Voice::ALL
                .iter()
                .map(|&v| {
                    let t = formation.tessituras.get(v);
                    format!("{} {}-{}", v, range_name(t.min), range_name(t.max))
                })
                .collect();
            out.push_str(&format!(
                "\n {} {:<15} {}",
                marker,
                formation.name.cyan(),
                ranges.join(", ")
            ));
        }
        return CommandResult::Message(out);
    }

    let formation = match Formation::by_name(args) {
        Ok(f) => f,
        Err(e) => return CommandResult::Error(e.to_string()),
    };
    let name = formation.name.clone();
    match ctx.session.change_formation(formation) {
        Ok(Some(entry)) => {
            let body = render_entry(entry);
            CommandResult::Message(format!(
                "{}\n{}",
                format!("Formation set to {}", name).bright_green(),
                body
            ))
        }
        Ok(None) => CommandResult::Message(
            format!("Formation set to {}", name).bright_green().to_string(),
        ),
        Err(e) => CommandResult::Error(e.to_string()),
    }
}

/// Handle `voicer [greedy|exhaustive]` command
pub fn cmd_voicer(args: &str, ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::Message(format!(
            "Voicer: {}",
            ctx.session.config().voicing.algorithm
        ));
    }
    let algorithm = match args.parse::<VoicingAlgorithm>() {
        Ok(a) => a,
        Err(e) => return CommandResult::Error(e.to_string()),
    };
    match ctx.session.set_voicing_algorithm(algorithm) {
        Ok(Some(entry)) => CommandResult::Message(format!(
            "{}\n{}",
            format!("Voicer set to {}", algorithm).bright_green(),
            render_entry(entry)
        )),
        Ok(None) => CommandResult::Message(
            format!("Voicer set to {}", algorithm).bright_green().to_string(),
        ),
        Err(e) => CommandResult::Error(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chorale_core::session::{SessionConfig, SessionState};

    fn ctx() -> CommandContext {
        CommandContext::new(SessionConfig {
            seed: Some(5),
            ..SessionConfig::default()
        })
    }

    fn message(result: CommandResult) -> String {
        match result {
            CommandResult::Message(msg) => msg,
            other => panic!("expected a message, got {:?}", other),
        }
    }

    #[test]
    fn test_generate_and_navigate() {
        let mut ctx = ctx();
        let first = message(cmd_generate("", &mut ctx));
        assert!(first.contains("iii"));
        assert_eq!(ctx.session.state(), SessionState::HasCurrent);

        let more = message(cmd_next("", &mut ctx));
        assert!(more.contains("No more progressions"));
        assert!(message(cmd_prev("", &mut ctx)).contains("first"));
        assert!(message(cmd_show("", &mut ctx)).contains("soprano"));
    }

    #[test]
    fn test_generate_with_arguments() {
        let mut ctx = ctx();
        message(cmd_generate("G 5", &mut ctx));
        assert_eq!(ctx.session.config().tonality, "G");
        assert_eq!(ctx.session.config().length, 5);
        assert!(matches!(cmd_generate("H", &mut ctx), CommandResult::Error(_)));
    }

    #[test]
    fn test_settings_commands() {
        let mut ctx = ctx();
        assert!(matches!(cmd_key("Q", &mut ctx), CommandResult::Error(_)));
        message(cmd_key("Eb", &mut ctx));
        assert_eq!(ctx.session.config().tonality, "Eb");
        assert!(matches!(cmd_length("x", &mut ctx), CommandResult::Error(_)));
        assert!(matches!(cmd_length("1", &mut ctx), CommandResult::Error(_)));
        message(cmd_strategy("inverted", &mut ctx));
        assert_eq!(ctx.session.config().strategy, Strategy::Inverted);
        message(cmd_mode("minor", &mut ctx));
        assert_eq!(ctx.session.config().generator.mode, Mode::Minor);
        assert!(matches!(cmd_voicer("random", &mut ctx), CommandResult::Error(_)));
        message(cmd_voicer("exhaustive", &mut ctx));
        assert_eq!(ctx.session.config().voicing.algorithm, VoicingAlgorithm::Exhaustive);
    }

    #[test]
    fn test_formation_command() {
        let mut ctx = ctx();
        let listing = message(cmd_formation("", &mut ctx));
        assert!(listing.contains("Piano") && listing.contains("Vocal Quartet"));
        assert!(matches!(cmd_formation("kazoo", &mut ctx), CommandResult::Error(_)));

        message(cmd_generate("", &mut ctx));
        let labels = ctx.session.current().unwrap().progression().roman_labels();
        message(cmd_formation("string quartet", &mut ctx));
        assert_eq!(ctx.session.config().formation, Formation::string_quartet());
        assert_eq!(ctx.session.current().unwrap().progression().roman_labels(), labels);
    }

    #[test]
    fn test_export_is_json() {
        let mut ctx = ctx();
        assert!(matches!(cmd_export("", &mut ctx), CommandResult::Error(_)));
        message(cmd_generate("", &mut ctx));
        let json = message(cmd_export("", &mut ctx));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["progression"]["roman_labels"][0], "I");
        assert_eq!(value["voiced"]["voicings"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_trace_commands() {
        let mut ctx = ctx();
        assert!(matches!(cmd_trace_show("", &mut ctx), CommandResult::Error(_)));
        message(cmd_trace("on", &mut ctx));
        message(cmd_generate("", &mut ctx));
        let shown = message(cmd_trace_show("", &mut ctx));
        assert!(shown.contains("no common tone"));
        assert!(matches!(cmd_trace("maybe", &mut ctx), CommandResult::Error(_)));
    }

    #[test]
    fn test_regen_needs_a_progression() {
        let mut ctx = ctx();
        assert!(matches!(cmd_regen("", &mut ctx), CommandResult::Error(_)));
        message(cmd_generate("", &mut ctx));
        assert!(message(cmd_regen("", &mut ctx)).contains("I → iii → V → I"));
    }
}
