//! `chorus run`: one conversation from a roster file, rendered live.
//!
//! Streaming providers print tokens as they arrive; non-streaming ones show
//! a spinner until the whole reply is in.

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use console::{Color, Style, style};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use chorus_core::completion::CompletionUpdate;
use chorus_core::engine::{NoopObserver, RunOutcome, TurnObserver};
use chorus_core::llm::registry::ProviderRegistry;
use chorus_core::session::Session;
use chorus_infra::config::load_roster;
use chorus_types::bot::{BotColor, BotConfig};
use chorus_types::transcript::TranscriptEntry;

use crate::state::AppState;

pub struct RunArgs<'a> {
    pub roster: &'a Path,
    pub iterations: Option<u32>,
    pub initial_message: Option<String>,
    pub more: Option<u32>,
}

fn terminal_color(color: BotColor) -> Color {
    match color {
        BotColor::Red => Color::Red,
        BotColor::Teal => Color::Cyan,
        BotColor::Blue => Color::Blue,
        BotColor::Orange => Color::Color256(209),
        BotColor::Green => Color::Green,
        BotColor::Gray => Color::Color256(245),
    }
}

/// Prints each turn as it happens.
struct TerminalObserver<'a> {
    providers: &'a ProviderRegistry,
    spinner: Option<ProgressBar>,
    /// Speaker header held back while the spinner runs.
    header: Option<String>,
    turn_failed: bool,
    failed_turns: usize,
}

impl<'a> TerminalObserver<'a> {
    fn new(providers: &'a ProviderRegistry) -> Self {
        Self {
            providers,
            spinner: None,
            header: None,
            turn_failed: false,
            failed_turns: 0,
        }
    }

    fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
        if let Some(header) = self.header.take() {
            print!("{header} ");
        }
    }

    fn streams(&self, bot: &BotConfig) -> bool {
        self.providers
            .for_model(bot.model)
            .is_some_and(|p| p.capabilities().streaming)
    }
}

impl TurnObserver for TerminalObserver<'_> {
    fn on_turn_start(&mut self, bot: &BotConfig, _round: u32) {
        let header = Style::new()
            .fg(terminal_color(bot.color))
            .bold()
            .apply_to(format!("{}:", bot.name))
            .to_string();
        if self.streams(bot) {
            print!("{header} ");
            let _ = std::io::stdout().flush();
            return;
        }

        let spinner = ProgressBar::new_spinner();
        if let Ok(template) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            spinner.set_style(template);
        }
        spinner.set_message(format!("{} is thinking...", bot.name));
        spinner.enable_steady_tick(Duration::from_millis(80));
        self.spinner = Some(spinner);
        self.header = Some(header);
    }

    fn on_update(&mut self, _bot: &BotConfig, update: &CompletionUpdate) {
        self.stop_spinner();
        if update.is_error {
            self.turn_failed = true;
            print!("{}", style(&update.delta).red());
        } else {
            print!("{}", update.delta);
        }
        let _ = std::io::stdout().flush();
    }

    fn on_turn_end(&mut self, _entry: &TranscriptEntry) {
        self.stop_spinner();
        if std::mem::take(&mut self.turn_failed) {
            self.failed_turns += 1;
        }
        println!();
        println!();
    }
}

#[derive(Debug, Serialize)]
struct RunReport<'a> {
    initial_message: &'a str,
    provider_calls: usize,
    entries: &'a [TranscriptEntry],
}

/// Fill a fresh session from the roster file.
async fn build_session(state: &AppState, args: &RunArgs<'_>) -> Result<Session> {
    let roster = load_roster(args.roster).await?;
    let mut session = Session::new(state.config.initial_message.clone());
    for request in roster {
        let name = request.name.clone();
        session
            .add_bot(request)
            .with_context(|| format!("cannot add bot '{name}'"))?;
    }
    if let Some(message) = &args.initial_message {
        session.set_initial_message(message);
    }
    Ok(session)
}

/// Run the roster's conversation, then any extra rounds requested.
pub async fn run(state: &AppState, args: RunArgs<'_>, json: bool, quiet: bool) -> Result<()> {
    let mut session = build_session(state, &args).await?;
    let iterations = args.iterations.unwrap_or(state.config.default_iterations);
    let live = !json && !quiet;

    if live {
        println!();
        println!(
            "  {} {} bots, {} rounds, opening with {}",
            style("▶").bold(),
            style(session.bots().len()).bold(),
            style(iterations).bold(),
            style(format!("\"{}\"", session.initial_message())).cyan()
        );
        println!();
    }

    let mut terminal = live.then(|| TerminalObserver::new(state.engine.providers()));
    let mut silent = NoopObserver;
    let observer: &mut dyn TurnObserver = match terminal.as_mut() {
        Some(terminal) => terminal,
        None => &mut silent,
    };

    let mut outcome = session
        .generate(&state.engine, iterations, observer)
        .await?;

    if let Some(more) = args.more {
        if live {
            println!("  {}", style(format!("... {more} more round(s)")).dim());
            println!();
        }
        let extra = session
            .generate_more(&state.engine, more, observer)
            .await?;
        merge(&mut outcome, extra);
    }
    let failed = terminal.map_or(0, |t| t.failed_turns);

    if json {
        let report = RunReport {
            initial_message: session.initial_message(),
            provider_calls: outcome.provider_calls,
            entries: session.transcript().entries(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if quiet {
        for line in session.transcript().plain_lines() {
            println!("{line}");
        }
    } else {
        println!(
            "  {} {} messages from {} provider calls",
            style("✓").green().bold(),
            style(session.transcript().len()).bold(),
            outcome.provider_calls
        );
        if failed > 0 {
            println!(
                "  {} {} turn(s) failed; see the messages above",
                style("!").yellow().bold(),
                failed
            );
        }
        println!();
    }

    Ok(())
}

fn merge(outcome: &mut RunOutcome, extra: RunOutcome) {
    outcome.entries.extend(extra.entries);
    outcome.provider_calls += extra.provider_calls;
}
