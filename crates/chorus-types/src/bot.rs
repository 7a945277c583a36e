use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::llm::{Message, ProviderType};

/// Maximum number of bots that may take part in one conversation.
pub const MAX_BOTS: usize = 5;

/// Unique identifier for a bot, wrapping a UUID v7 (time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BotId(pub Uuid);

impl BotId {
    /// Create a new BotId using UUID v7 (time-sortable, guaranteed ordering).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Create a BotId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for BotId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BotId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Backend models a bot can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelId {
    #[serde(rename = "gpt-4o-mini")]
    Gpt4oMini,
    #[serde(rename = "gpt-3.5-turbo")]
    Gpt35Turbo,
    #[serde(rename = "claude-3-5-sonnet-20240620")]
    Claude35Sonnet,
}

impl ModelId {
    /// Every supported model, in the order they are offered to the user.
    pub const ALL: [ModelId; 3] = [
        ModelId::Gpt4oMini,
        ModelId::Gpt35Turbo,
        ModelId::Claude35Sonnet,
    ];

    /// The wire identifier sent to the provider.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelId::Gpt4oMini => "gpt-4o-mini",
            ModelId::Gpt35Turbo => "gpt-3.5-turbo",
            ModelId::Claude35Sonnet => "claude-3-5-sonnet-20240620",
        }
    }

    /// The provider backend serving this model.
    pub fn provider_type(&self) -> ProviderType {
        match self {
            ModelId::Gpt4oMini | ModelId::Gpt35Turbo => ProviderType::OpenAi,
            ModelId::Claude35Sonnet => ProviderType::Anthropic,
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelId::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unsupported model: '{s}'"))
    }
}

/// Display-only color tag attached to a bot and its transcript entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BotColor {
    Red,
    Teal,
    Blue,
    Orange,
    Green,
    /// Used for speakers that are no longer in the registry.
    Gray,
}

impl BotColor {
    /// Fixed palette cycled through as bots are added.
    pub const PALETTE: [BotColor; 5] = [
        BotColor::Red,
        BotColor::Teal,
        BotColor::Blue,
        BotColor::Orange,
        BotColor::Green,
    ];

    /// Palette color for the bot inserted when the registry holds `len` bots.
    ///
    /// Not stable under deletion: a later bot can inherit a color that a
    /// deleted bot used.
    pub fn for_slot(len: usize) -> Self {
        Self::PALETTE[len % Self::PALETTE.len()]
    }

    /// CSS hex value for browser hosts.
    pub fn hex(&self) -> &'static str {
        match self {
            BotColor::Red => "#FF6B6B",
            BotColor::Teal => "#4ECDC4",
            BotColor::Blue => "#45B7D1",
            BotColor::Orange => "#FFA07A",
            BotColor::Green => "#98D8C8",
            BotColor::Gray => "#A0A0A0",
        }
    }
}

impl fmt::Display for BotColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BotColor::Red => write!(f, "red"),
            BotColor::Teal => write!(f, "teal"),
            BotColor::Blue => write!(f, "blue"),
            BotColor::Orange => write!(f, "orange"),
            BotColor::Green => write!(f, "green"),
            BotColor::Gray => write!(f, "gray"),
        }
    }
}

/// A bot persona taking part in the group conversation.
///
/// `history` always starts with exactly one system message generated from
/// the bot's name and role prompt. Later entries record the turns this bot
/// has taken.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    pub id: BotId,
    /// Display name, unique among the active bots.
    pub name: String,
    pub model: ModelId,
    /// The user-supplied role description.
    pub role_prompt: String,
    pub color: BotColor,
    pub history: Vec<Message>,
}

impl BotConfig {
    /// Build a bot whose history holds only its fixed system message.
    pub fn new(name: String, model: ModelId, role_prompt: String, color: BotColor) -> Self {
        let system = system_message(&name, &role_prompt);
        Self {
            id: BotId::new(),
            name,
            model,
            role_prompt,
            color,
            history: vec![system],
        }
    }

    /// The fixed role-defining system message.
    pub fn system_prompt(&self) -> &str {
        &self.history[0].content
    }

    /// Replace the role prompt and regenerate the system message.
    ///
    /// Turns already recorded in the bot's history are kept.
    pub fn set_role_prompt(&mut self, role_prompt: String) {
        self.history[0] = system_message(&self.name, &role_prompt);
        self.role_prompt = role_prompt;
    }

    /// Drop every recorded turn, keeping the system message.
    pub fn reset_history(&mut self) {
        self.history.truncate(1);
    }
}

/// Request to add a bot, as sent by hosts and roster files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBotRequest {
    pub name: String,
    pub model: ModelId,
    pub prompt: String,
}

/// Render the fixed system message for a bot.
///
/// Deterministic in `name` and `role_prompt`.
pub fn system_message(name: &str, role_prompt: &str) -> Message {
    let content = format!(
        "You are part of a groupchat of bots. Your name is {name}. \
         Your role will be the following: {role_prompt}\n\
         Please STICK to this role the WHOLE conversation.\n\
         You will have access to the whole conversation history, DON'T MIX IT UP WITH YOUR ROLE."
    );
    Message::system(content)
}
