//! Telegram bot handler tree configuration
//!
//! The handlers are organized in a testable way, allowing integration tests
//! to use the same handler tree as production code.

mod schema;
mod types;

pub use schema::schema;
pub use types::{
    ensure_user_exists, inbound_from_message, HandlerDeps, HandlerError, UserCreationResult, UserInfo,
};
