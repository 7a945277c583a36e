//! Round-robin conversation engine.
//!
//! For each round, every bot in registry order gets one turn: its view of the
//! conversation is formatted for its provider, sent through the completion
//! client, and the final text is appended to the shared transcript before the
//! next bot speaks. Turns are strictly sequential.

use std::sync::Arc;

use futures_util::StreamExt;
use tracing::{Instrument, debug, info, info_span};

use chorus_types::bot::BotConfig;
use chorus_types::config::GlobalConfig;
use chorus_types::error::ValidationError;
use chorus_types::llm::{CompletionRequest, Message};
use chorus_types::transcript::{Transcript, TranscriptEntry};

use crate::completion::{self, CompletionUpdate};
use crate::format::{TurnContext, formatter_for};
use crate::llm::box_provider::BoxLlmProvider;
use crate::llm::registry::ProviderRegistry;
use crate::registry::BotRegistry;

/// Receives progress while a run is in flight.
///
/// All methods default to doing nothing.
pub trait TurnObserver: Send {
    /// A bot is about to be called. `round` counts from zero.
    fn on_turn_start(&mut self, _bot: &BotConfig, _round: u32) {}

    /// New text arrived for the bot currently speaking.
    fn on_update(&mut self, _bot: &BotConfig, _update: &CompletionUpdate) {}

    /// The turn's final text has been appended to the transcript.
    fn on_turn_end(&mut self, _entry: &TranscriptEntry) {}
}

/// Observer that ignores everything.
pub struct NoopObserver;

impl TurnObserver for NoopObserver {}

/// Generation parameters applied to every provider call.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub max_tokens: u32,
    pub temperature: Option<f64>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_tokens: 150,
            temperature: None,
        }
    }
}

impl From<&GlobalConfig> for EngineSettings {
    fn from(config: &GlobalConfig) -> Self {
        Self {
            max_tokens: config.max_tokens,
            temperature: None,
        }
    }
}

/// Result of a completed run.
#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    /// Entries appended by this run, in speaking order.
    pub entries: Vec<TranscriptEntry>,
    pub provider_calls: usize,
}

impl RunOutcome {
    pub fn plain_lines(&self) -> Vec<String> {
        self.entries.iter().map(TranscriptEntry::plain).collect()
    }
}

pub struct ConversationEngine {
    providers: Arc<ProviderRegistry>,
    settings: EngineSettings,
}

impl ConversationEngine {
    pub fn new(providers: Arc<ProviderRegistry>, settings: EngineSettings) -> Self {
        Self {
            providers,
            settings,
        }
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Check that a run of `iterations` rounds over `registry` can start.
    pub fn check_ready(
        &self,
        registry: &BotRegistry,
        iterations: u32,
    ) -> Result<(), ValidationError> {
        if registry.len() < 2 {
            return Err(ValidationError::NotEnoughBots);
        }
        if iterations == 0 {
            return Err(ValidationError::ZeroIterations);
        }
        if let Some(bot) = registry
            .iter()
            .find(|b| self.providers.for_model(b.model).is_none())
        {
            return Err(ValidationError::UnsupportedModel(bot.model));
        }
        Ok(())
    }

    /// Run `iterations` rounds on top of `transcript`.
    ///
    /// `opening` heads every bot's view of the conversation. Provider failures
    /// do not stop the run; they are recorded as error text. Validation
    /// failures are returned before any provider is called.
    pub async fn run(
        &self,
        registry: &mut BotRegistry,
        transcript: &mut Transcript,
        opening: &str,
        iterations: u32,
        observer: &mut dyn TurnObserver,
    ) -> Result<RunOutcome, ValidationError> {
        self.check_ready(registry, iterations)?;

        let start = transcript.len();
        let mut provider_calls = 0;
        info!(
            bots = registry.len(),
            iterations,
            resumed = start > 0,
            "conversation run started"
        );

        for round in 0..iterations {
            for index in 0..registry.len() {
                let Some(bot) = registry.iter().nth(index) else {
                    break;
                };
                let provider = self
                    .providers
                    .for_model(bot.model)
                    .ok_or(ValidationError::UnsupportedModel(bot.model))?;

                let span = info_span!(
                    "chorus.turn",
                    gen_ai.agent.name = %bot.name,
                    round,
                    turn = index,
                );
                let text = self
                    .take_turn(bot, provider, transcript, opening, round, observer)
                    .instrument(span)
                    .await;
                provider_calls += 1;

                let entry = TranscriptEntry {
                    speaker: bot.name.clone(),
                    content: text,
                    color: bot.color,
                };
                if let Some(bot) = registry.iter_mut().nth(index) {
                    bot.history
                        .push(Message::assistant(entry.content.clone()).with_speaker(&bot.name));
                }
                transcript.push(entry.clone());
                observer.on_turn_end(&entry);
            }
        }

        info!(provider_calls, "conversation run finished");
        Ok(RunOutcome {
            entries: transcript.entries()[start..].to_vec(),
            provider_calls,
        })
    }

    async fn take_turn(
        &self,
        bot: &BotConfig,
        provider: Arc<BoxLlmProvider>,
        transcript: &Transcript,
        opening: &str,
        round: u32,
        observer: &mut dyn TurnObserver,
    ) -> String {
        let request = self.build_request(bot, &provider, transcript, opening);
        debug!(messages = request.messages.len(), "calling provider");
        observer.on_turn_start(bot, round);

        let mut updates = completion::complete(provider, request);
        let mut text = String::new();
        while let Some(update) = updates.next().await {
            observer.on_update(bot, &update);
            text = update.text;
        }
        text
    }

    fn build_request(
        &self,
        bot: &BotConfig,
        provider: &BoxLlmProvider,
        transcript: &Transcript,
        opening: &str,
    ) -> CompletionRequest {
        let ctx = TurnContext {
            bot_name: &bot.name,
            system_prompt: bot.system_prompt(),
            opening,
            entries: transcript.entries(),
        };
        let capabilities = provider.capabilities();
        let prompt = formatter_for(capabilities.role_protocol).format(&ctx);
        CompletionRequest {
            model: bot.model.as_str().to_string(),
            messages: prompt.messages,
            system: prompt.system,
            max_tokens: self.settings.max_tokens.min(capabilities.max_output_tokens),
            temperature: self.settings.temperature,
            stream: false,
        }
    }
}
