//! Provider-ready prompt construction.
//!
//! Every bot sees the same shared transcript, but from its own seat: its own
//! turns are `assistant` messages and everybody else's are `user` messages
//! prefixed with the speaker's name. How that list is then laid out depends
//! on the provider's [`RoleProtocol`], with one [`MessageFormatter`]
//! implementation per protocol.

use chorus_types::llm::{Message, MessageRole, RoleProtocol};
use chorus_types::transcript::TranscriptEntry;

/// Appended when an alternating-role prompt would otherwise end on the
/// bot's own turn.
pub const CONTINUE_PROMPT: &str = "Please continue the conversation.";

/// Everything a formatter needs to build one bot's prompt.
#[derive(Debug, Clone, Copy)]
pub struct TurnContext<'a> {
    /// Name of the bot about to speak.
    pub bot_name: &'a str,
    /// The bot's fixed system message.
    pub system_prompt: &'a str,
    /// Seed message the conversation was opened with.
    pub opening: &'a str,
    /// All prior turns, across all rounds.
    pub entries: &'a [TranscriptEntry],
}

/// A prompt laid out for a specific provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedPrompt {
    /// Top-level system field, for providers that take one.
    pub system: Option<String>,
    pub messages: Vec<Message>,
}

/// Lays out a bot's view of the conversation for one role protocol.
pub trait MessageFormatter: Send + Sync {
    fn format(&self, ctx: &TurnContext<'_>) -> FormattedPrompt;
}

/// Formatter for providers that accept any role sequence.
pub struct FreeformFormatter;

/// Formatter for providers that require strictly alternating user/assistant
/// turns and a separate system field.
pub struct AlternatingFormatter;

/// The formatter implementing `protocol`.
pub fn formatter_for(protocol: RoleProtocol) -> &'static dyn MessageFormatter {
    match protocol {
        RoleProtocol::Freeform => &FreeformFormatter,
        RoleProtocol::Alternating => &AlternatingFormatter,
    }
}

/// The conversation as seen by `ctx.bot_name`: the opening message followed
/// by one message per transcript entry.
fn conversation_view(ctx: &TurnContext<'_>) -> Vec<Message> {
    let mut messages = Vec::with_capacity(ctx.entries.len() + 1);
    messages.push(Message::user(ctx.opening));
    for entry in ctx.entries {
        let message = if entry.speaker == ctx.bot_name {
            Message::assistant(entry.content.clone())
        } else {
            Message::user(entry.plain())
        };
        messages.push(message.with_speaker(entry.speaker.clone()));
    }
    messages
}

impl MessageFormatter for FreeformFormatter {
    fn format(&self, ctx: &TurnContext<'_>) -> FormattedPrompt {
        let mut messages = vec![Message::system(ctx.system_prompt)];
        messages.extend(conversation_view(ctx));
        FormattedPrompt {
            system: None,
            messages,
        }
    }
}

impl MessageFormatter for AlternatingFormatter {
    fn format(&self, ctx: &TurnContext<'_>) -> FormattedPrompt {
        let mut messages: Vec<Message> = Vec::new();
        // Empty content blocks are rejected; a turn that produced no text is
        // skipped and its neighbours merge.
        let view = conversation_view(ctx)
            .into_iter()
            .filter(|m| !m.content.trim().is_empty());
        for message in view {
            match messages.last_mut() {
                Some(prev) if prev.role == message.role => {
                    prev.content.push_str("\n\n");
                    prev.content.push_str(&message.content);
                    prev.speaker = None;
                }
                _ => messages.push(message),
            }
        }

        if messages.first().map(|m| m.role) != Some(MessageRole::User) {
            messages.insert(0, Message::user(ctx.opening));
        }
        if messages.last().map(|m| m.role) != Some(MessageRole::User) {
            messages.push(Message::user(CONTINUE_PROMPT));
        }

        FormattedPrompt {
            system: Some(ctx.system_prompt.to_string()),
            messages,
        }
    }
}
