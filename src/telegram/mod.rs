//! Telegram bot integration: update intake and message delivery

pub mod bot;
pub mod handlers;
pub mod messenger;

// Re-exports for convenience
pub use bot::{create_bot, setup_bot_commands, Command};
pub use handlers::{schema, HandlerDeps};
pub use messenger::TelegramMessenger;
