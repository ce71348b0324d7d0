//! Handler types, dependencies, and user management helpers

use std::sync::Arc;
use tokio::sync::mpsc;

use teloxide::types::Message;

use crate::fsm::{Inbound, Input};
use crate::i18n;
use crate::storage::db::{self, create_user};
use crate::storage::get_connection;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub db_pool: Arc<db::DbPool>,
    /// Feeds the conversation loop
    pub updates: mpsc::Sender<Inbound>,
}

impl HandlerDeps {
    pub fn new(db_pool: Arc<db::DbPool>, updates: mpsc::Sender<Inbound>) -> Self {
        Self { db_pool, updates }
    }
}

/// Sender details taken from a Telegram message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    pub chat_id: i64,
    pub username: Option<String>,
    pub language_code: Option<String>,
}

impl UserInfo {
    /// Extract user info from a Telegram message
    pub fn from_message(msg: &Message) -> Self {
        Self {
            chat_id: msg.chat.id.0,
            username: msg.from.as_ref().and_then(|u| u.username.clone()),
            language_code: msg.from.as_ref().and_then(|u| u.language_code.clone()),
        }
    }
}

/// Result of ensure_user_exists operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserCreationResult {
    /// User already existed
    Existed,
    /// User was newly created
    Created,
    /// Failed to read or write the users table
    DbError,
}

/// Ensures a user row exists, seeding its language from Telegram when supported.
pub fn ensure_user_exists(db_pool: &Arc<db::DbPool>, user: &UserInfo) -> UserCreationResult {
    let conn = match get_connection(db_pool) {
        Ok(c) => c,
        Err(e) => {
            log::error!("Failed to get DB connection for user {}: {}", user.chat_id, e);
            return UserCreationResult::DbError;
        }
    };

    let language = user.language_code.as_deref().and_then(i18n::is_language_supported);
    match create_user(&conn, user.chat_id, user.username.as_deref(), language) {
        Ok(true) => {
            log::info!(
                "New user {} (@{}, language {:?})",
                user.chat_id,
                user.username.as_deref().unwrap_or("-"),
                language
            );
            UserCreationResult::Created
        }
        Ok(false) => UserCreationResult::Existed,
        Err(e) => {
            log::error!("Failed to create user {}: {}", user.chat_id, e);
            UserCreationResult::DbError
        }
    }
}

/// Converts a Telegram message into an engine update.
pub fn inbound_from_message(msg: &Message) -> Inbound {
    let input = msg.text().map(Input::from_text).unwrap_or(Input::Unsupported);
    Inbound::new(msg.chat.id.into(), input)
}
