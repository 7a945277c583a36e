//! In-memory list of saved conversations.

use chrono::{DateTime, Local};

use chorus_types::error::SessionError;
use chorus_types::transcript::{HistoryEntry, Transcript, TranscriptEntry};

use crate::registry::BotRegistry;

/// Saved conversations, kept for the life of the process.
///
/// Indices used by [`load`](Self::load) and [`delete`](Self::delete) refer to
/// the newest-first order returned by [`list`](Self::list).
#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    // Oldest first; reversed on the way out.
    entries: Vec<HistoryEntry>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(
        &mut self,
        timestamp: DateTime<Local>,
        initial_message: impl Into<String>,
        transcript: Transcript,
    ) {
        let entry = HistoryEntry {
            timestamp,
            initial_message: initial_message.into(),
            transcript,
        };
        tracing::debug!(
            label = %entry.label(),
            entries = entry.transcript.len(),
            "conversation saved to history"
        );
        self.entries.push(entry);
    }

    /// Saved conversations, newest first.
    pub fn list(&self) -> impl ExactSizeIterator<Item = &HistoryEntry> {
        self.entries.iter().rev()
    }

    /// Copy of the entry at `index`, with each speaker's color taken from
    /// the current registry (gray for bots that no longer exist).
    pub fn load(&self, index: usize, registry: &BotRegistry) -> Result<HistoryEntry, SessionError> {
        let pos = self.position(index)?;
        let saved = &self.entries[pos];
        let transcript: Transcript = saved
            .transcript
            .entries()
            .iter()
            .map(|e| TranscriptEntry {
                speaker: e.speaker.clone(),
                content: e.content.clone(),
                color: registry.color_of(&e.speaker),
            })
            .collect::<Vec<_>>()
            .into();
        Ok(HistoryEntry {
            timestamp: saved.timestamp,
            initial_message: saved.initial_message.clone(),
            transcript,
        })
    }

    pub fn delete(&mut self, index: usize) -> Result<HistoryEntry, SessionError> {
        let pos = self.position(index)?;
        Ok(self.entries.remove(pos))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Map a newest-first index to a storage position.
    fn position(&self, index: usize) -> Result<usize, SessionError> {
        if index >= self.entries.len() {
            return Err(SessionError::HistoryNotFound(index));
        }
        Ok(self.entries.len() - 1 - index)
    }
}
