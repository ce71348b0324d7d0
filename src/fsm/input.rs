//! Inbound updates as seen by the engine

use super::ConversationContext;

/// Command that resets any conversation back to its initial state.
pub const START_COMMAND: &str = "start";

/// What the user sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Plain text, including reply-keyboard button presses
    Text(String),
    /// A `/command`, lowercased and stripped of any `@botname` suffix
    Command { name: String, args: String },
    /// Anything the engine cannot interpret (stickers, photos, ...)
    Unsupported,
}

impl Input {
    /// Classifies message text as a command or plain text.
    pub fn from_text(text: &str) -> Self {
        let trimmed = text.trim();
        let Some(rest) = trimmed.strip_prefix('/') else {
            return Self::Text(trimmed.to_string());
        };

        let (head, args) = match rest.split_once(char::is_whitespace) {
            Some((head, args)) => (head, args.trim()),
            None => (rest, ""),
        };
        let name = head.split('@').next().unwrap_or(head).to_lowercase();
        if name.is_empty() {
            return Self::Text(trimmed.to_string());
        }

        Self::Command {
            name,
            args: args.to_string(),
        }
    }

    /// True for the global `/start` command.
    pub fn is_start(&self) -> bool {
        self.is_command(START_COMMAND)
    }

    pub fn is_command(&self, command: &str) -> bool {
        matches!(self, Self::Command { name, .. } if name == command)
    }

    /// The text of a plain text input.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// One update addressed to a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    pub context: ConversationContext,
    pub input: Input,
}

impl Inbound {
    pub fn new(context: ConversationContext, input: Input) -> Self {
        Self { context, input }
    }

    /// Shorthand for a text message, classified with [`Input::from_text`].
    pub fn text(context: ConversationContext, text: &str) -> Self {
        Self::new(context, Input::from_text(text))
    }
}
