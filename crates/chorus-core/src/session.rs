//! Application state for one user: bots, the current conversation and the
//! saved history, with one method per user-facing control.

use chrono::Local;

use chorus_types::bot::{BotConfig, BotId, CreateBotRequest};
use chorus_types::error::{SessionError, ValidationError};
use chorus_types::transcript::{HistoryEntry, Transcript};

use crate::engine::{ConversationEngine, RunOutcome, TurnObserver};
use crate::history::HistoryStore;
use crate::registry::BotRegistry;

#[derive(Debug, Clone)]
pub struct Session {
    bots: BotRegistry,
    transcript: Transcript,
    history: HistoryStore,
    initial_message: String,
    default_initial_message: String,
}

impl Session {
    /// Empty session whose seed message starts out as `default_initial_message`.
    pub fn new(default_initial_message: impl Into<String>) -> Self {
        let default_initial_message = default_initial_message.into();
        Self {
            bots: BotRegistry::new(),
            transcript: Transcript::new(),
            history: HistoryStore::new(),
            initial_message: default_initial_message.clone(),
            default_initial_message,
        }
    }

    pub fn bots(&self) -> &BotRegistry {
        &self.bots
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn initial_message(&self) -> &str {
        &self.initial_message
    }

    /// Set the seed message. Blank input restores the default.
    pub fn set_initial_message(&mut self, message: &str) {
        let message = message.trim();
        self.initial_message = if message.is_empty() {
            self.default_initial_message.clone()
        } else {
            message.to_string()
        };
    }

    pub fn add_bot(&mut self, request: CreateBotRequest) -> Result<BotConfig, SessionError> {
        Ok(self.bots.add(request)?.clone())
    }

    pub fn edit_bot_prompt(&mut self, id: BotId, prompt: &str) -> Result<BotConfig, SessionError> {
        self.bots.edit_prompt(id, prompt).cloned()
    }

    pub fn delete_bot(&mut self, id: BotId) -> Result<BotConfig, SessionError> {
        self.bots.delete(id)
    }

    /// Remove every bot. The conversation goes with them.
    pub fn clear_bots(&mut self) {
        self.bots.clear();
        self.transcript = Transcript::new();
    }

    /// Start a fresh conversation of `iterations` rounds and save it to
    /// history when it completes.
    ///
    /// On a validation error the current conversation is left untouched.
    pub async fn generate(
        &mut self,
        engine: &ConversationEngine,
        iterations: u32,
        observer: &mut dyn TurnObserver,
    ) -> Result<RunOutcome, SessionError> {
        engine.check_ready(&self.bots, iterations)?;
        self.clear_conversation();

        let outcome = engine
            .run(
                &mut self.bots,
                &mut self.transcript,
                &self.initial_message,
                iterations,
                observer,
            )
            .await?;
        self.history.append(
            Local::now(),
            self.initial_message.clone(),
            self.transcript.clone(),
        );
        Ok(outcome)
    }

    /// Continue the current conversation for `iterations` more rounds.
    ///
    /// The extension is not saved to history.
    pub async fn generate_more(
        &mut self,
        engine: &ConversationEngine,
        iterations: u32,
        observer: &mut dyn TurnObserver,
    ) -> Result<RunOutcome, SessionError> {
        if self.transcript.is_empty() {
            return Err(ValidationError::EmptyConversation.into());
        }
        let outcome = engine
            .run(
                &mut self.bots,
                &mut self.transcript,
                &self.initial_message,
                iterations,
                observer,
            )
            .await?;
        Ok(outcome)
    }

    /// Drop the current conversation and every bot's recorded turns.
    pub fn clear_conversation(&mut self) {
        self.transcript = Transcript::new();
        self.bots.reset_histories();
    }

    /// Save the current conversation to history.
    pub fn save_conversation(&mut self) -> Result<(), SessionError> {
        if self.transcript.is_empty() {
            return Err(ValidationError::EmptyConversation.into());
        }
        self.history.append(
            Local::now(),
            self.initial_message.clone(),
            self.transcript.clone(),
        );
        Ok(())
    }

    /// Replace the current conversation with a saved one.
    ///
    /// The saved seed message is restored too, so continuing a loaded
    /// conversation uses the seed it was started with.
    pub fn load_history(&mut self, index: usize) -> Result<&Transcript, SessionError> {
        let entry = self.history.load(index, &self.bots)?;
        self.bots.reset_histories();
        self.transcript = entry.transcript;
        self.initial_message = entry.initial_message;
        Ok(&self.transcript)
    }

    pub fn delete_history(&mut self, index: usize) -> Result<HistoryEntry, SessionError> {
        self.history.delete(index)
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}
