//! Capabilities available to state hooks

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Offset, Utc};
use std::collections::HashSet;
use std::sync::Arc;

use super::{ConversationContext, SendError, TaskScope};
use crate::brawl::PlayerDirectory;
use crate::core::config;
use crate::i18n::Localizer;
use crate::storage::db::DbPool;

/// Reply keyboard attached to an outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Keyboard {
    /// Leave whatever keyboard the chat currently shows
    #[default]
    Keep,
    Remove,
    /// Rows of button labels; pressing one sends its label as text
    Buttons(Vec<Vec<String>>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub text: String,
    pub keyboard: Keyboard,
}

impl OutboundMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: Keyboard::Keep,
        }
    }

    #[must_use]
    pub fn with_buttons(mut self, rows: Vec<Vec<String>>) -> Self {
        self.keyboard = Keyboard::Buttons(rows);
        self
    }

    #[must_use]
    pub fn remove_keyboard(mut self) -> Self {
        self.keyboard = Keyboard::Remove;
        self
    }

    /// Labels of all buttons, row by row.
    pub fn buttons(&self) -> Vec<&str> {
        match &self.keyboard {
            Keyboard::Buttons(rows) => rows.iter().flatten().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }
}

/// Sends messages to a conversation.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send(&self, context: ConversationContext, message: OutboundMessage) -> Result<(), SendError>;
}

/// Current time as seen by a conversation.
pub trait Clock: Send + Sync {
    fn now(&self, context: ConversationContext) -> DateTime<FixedOffset>;
}

/// Wall clock shifted to a fixed UTC offset.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Clock using `BOT_UTC_OFFSET_MINUTES`.
    pub fn from_config() -> Self {
        let offset = FixedOffset::east_opt(*config::UTC_OFFSET_MINUTES * 60).unwrap_or_else(|| Utc.fix());
        Self::new(offset)
    }
}

impl Clock for SystemClock {
    fn now(&self, _context: ConversationContext) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }
}

/// Everything a hook may use. Built once at startup and cloned cheaply.
#[derive(Clone)]
pub struct Deps {
    pub messenger: Arc<dyn Messenger>,
    pub localizer: Arc<Localizer>,
    pub clock: Arc<dyn Clock>,
    pub players: Arc<dyn PlayerDirectory>,
    pub db_pool: Arc<DbPool>,
    pub tasks: TaskScope,
    pub admins: Arc<HashSet<i64>>,
}

impl Deps {
    pub fn new(
        messenger: Arc<dyn Messenger>,
        players: Arc<dyn PlayerDirectory>,
        clock: Arc<dyn Clock>,
        db_pool: Arc<DbPool>,
        tasks: TaskScope,
        admins: impl IntoIterator<Item = i64>,
    ) -> Self {
        Self {
            messenger,
            localizer: Arc::new(Localizer::new(Arc::clone(&db_pool))),
            clock,
            players,
            db_pool,
            tasks,
            admins: Arc::new(admins.into_iter().collect()),
        }
    }

    /// Tracing span carrying the chat id; every dispatch runs inside it.
    pub fn span(&self, context: ConversationContext) -> tracing::Span {
        tracing::info_span!("conversation", chat_id = context.chat_id())
    }

    pub fn is_admin(&self, context: ConversationContext) -> bool {
        self.admins.contains(&context.chat_id())
    }

    pub async fn send(&self, context: ConversationContext, message: OutboundMessage) -> Result<(), SendError> {
        self.messenger.send(context, message).await
    }
}
