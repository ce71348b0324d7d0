use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a single chat tracked by the engine.
///
/// Used as the state store key and carried by every [`State`](super::State)
/// belonging to that chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationContext(i64);

impl ConversationContext {
    pub const fn new(chat_id: i64) -> Self {
        Self(chat_id)
    }

    pub const fn chat_id(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ConversationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<teloxide::types::ChatId> for ConversationContext {
    fn from(chat_id: teloxide::types::ChatId) -> Self {
        Self(chat_id.0)
    }
}

impl From<ConversationContext> for teloxide::types::ChatId {
    fn from(context: ConversationContext) -> Self {
        teloxide::types::ChatId(context.0)
    }
}
