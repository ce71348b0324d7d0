//! Users, club settings and conversation state in SQLite

pub mod db;
pub mod migrations;
pub mod settings;
pub mod state_store;

// Re-exports for convenience
pub use db::{create_memory_pool, create_pool, get_connection, DbConnection, DbPool, User};
pub use settings::SettingKey;
pub use state_store::SqliteStateStore;
