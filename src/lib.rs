//! ClubWarden - Telegram bot for a Brawl Stars club community
//!
//! The bot verifies players against the Brawl Stars API, walks them through
//! the club and chat rules and gives members and admins a small menu. Every
//! chat is a conversation driven by the state machine in [`fsm`].
//!
//! # Module Structure
//!
//! - `core`: configuration, errors and logging
//! - `fsm`: the conversation engine (states, dispatcher, store, supervisor)
//! - `conversation`: the club's states and their handlers
//! - `brawl`: player tags and the Brawl Stars API client
//! - `storage`: SQLite pool, migrations, users, settings and persisted states
//! - `telegram`: update intake and message delivery through teloxide
//! - `testing`: in-memory fakes for exercising conversations

pub mod brawl;
pub mod cli;
pub mod conversation;
pub mod core;
pub mod fsm;
pub mod i18n;
pub mod storage;
pub mod telegram;
pub mod testing;

// Re-export commonly used types for convenience
pub use core::{config, AppError, AppResult};
pub use fsm::{ConversationContext, Deps, Dispatcher, State, StateKind};
pub use storage::{create_pool, get_connection, DbConnection, DbPool};
