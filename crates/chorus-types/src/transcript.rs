//! Conversation transcript and saved-history types.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::bot::BotColor;

/// One bot turn in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Name of the bot that produced the text.
    pub speaker: String,
    pub content: String,
    /// Display-only; re-derived when a transcript is loaded from history.
    pub color: BotColor,
}

impl TranscriptEntry {
    /// The plain `"Name: text"` rendering of this entry.
    pub fn plain(&self) -> String {
        format!("{}: {}", self.speaker, self.content)
    }
}

/// Ordered record of the turns in a conversation.
///
/// Entries are only ever appended; the whole transcript is replaced on clear
/// or when a saved conversation is loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: TranscriptEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Plain `"Name: text"` lines, one per entry.
    pub fn plain_lines(&self) -> Vec<String> {
        self.entries.iter().map(TranscriptEntry::plain).collect()
    }

    /// True when both transcripts hold the same speakers and texts in the
    /// same order, ignoring display colors.
    pub fn same_content(&self, other: &Transcript) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(&other.entries)
                .all(|(a, b)| a.speaker == b.speaker && a.content == b.content)
    }
}

impl From<Vec<TranscriptEntry>> for Transcript {
    fn from(entries: Vec<TranscriptEntry>) -> Self {
        Self { entries }
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a TranscriptEntry;
    type IntoIter = std::slice::Iter<'a, TranscriptEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// A saved conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Local>,
    /// The seed message the conversation was opened with.
    pub initial_message: String,
    pub transcript: Transcript,
}

impl HistoryEntry {
    /// Timestamp formatted the way it is shown to the user.
    pub fn label(&self) -> String {
        self.timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(speaker: &str, content: &str, color: BotColor) -> TranscriptEntry {
        TranscriptEntry {
            speaker: speaker.to_string(),
            content: content.to_string(),
            color,
        }
    }

    #[test]
    fn test_plain_lines() {
        let t = Transcript::from(vec![
            entry("Ada", "hello", BotColor::Red),
            entry("Bob", "hi there", BotColor::Teal),
        ]);
        assert_eq!(t.plain_lines(), vec!["Ada: hello", "Bob: hi there"]);
    }

    #[test]
    fn test_same_content_ignores_color() {
        let a = Transcript::from(vec![entry("Ada", "hello", BotColor::Red)]);
        let b = Transcript::from(vec![entry("Ada", "hello", BotColor::Gray)]);
        let c = Transcript::from(vec![entry("Ada", "bye", BotColor::Red)]);
        assert!(a.same_content(&b));
        assert!(!a.same_content(&c));
        assert!(!a.same_content(&Transcript::new()));
    }

    #[test]
    fn test_transcript_serializes_as_list() {
        let t = Transcript::from(vec![entry("Ada", "hello", BotColor::Blue)]);
        let json = serde_json::to_value(&t).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["color"], "blue");
    }

    #[test]
    fn test_history_label_format() {
        let ts = chrono::TimeZone::with_ymd_and_hms(&Local, 2024, 7, 1, 9, 5, 3).unwrap();
        let h = HistoryEntry {
            timestamp: ts,
            initial_message: "start".to_string(),
            transcript: Transcript::new(),
        };
        assert_eq!(h.label(), "2024-07-01 09:05:03");
    }
}
