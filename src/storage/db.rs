use chrono::{DateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension, Result};

use crate::core::config;
use crate::core::AppResult;
use crate::storage::migrations::run_migrations;

/// A chat known to the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Telegram chat ID (equals the user ID for private chats)
    pub chat_id: i64,
    /// Telegram username, if the user has one
    pub username: Option<String>,
    /// Chosen interface language code ("en", "ru", ...)
    pub language: Option<String>,
    /// Verified Brawl Stars player tag in `#TAG` form
    pub player_tag: Option<String>,
    /// In-game name recorded at verification time
    pub player_name: Option<String>,
    /// When the user accepted the club rules
    pub club_rules_accepted_at: Option<DateTime<Utc>>,
    /// When the user accepted the chat rules and became a member
    pub member_since: Option<DateTime<Utc>>,
}

impl User {
    /// A user is a member once both rule sets were accepted.
    pub fn is_member(&self) -> bool {
        self.member_since.is_some()
    }

    /// A user is verified once a player tag was linked.
    pub fn is_verified(&self) -> bool {
        self.player_tag.is_some()
    }
}

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Create a new database connection pool
///
/// Initializes a connection pool and runs schema migrations on the first
/// connection.
///
/// # Arguments
///
/// * `database_path` - Path to SQLite database file
pub fn create_pool(database_path: &str) -> AppResult<DbPool> {
    let manager = SqliteConnectionManager::file(database_path);
    let pool = Pool::builder()
        .max_size(config::database::POOL_SIZE)
        .connection_timeout(config::database::connection_timeout())
        .build(manager)?;

    let mut conn = pool.get()?;
    run_migrations(&mut conn)?;

    Ok(pool)
}

/// Create a single-connection pool over an in-memory database.
///
/// Every in-memory connection is its own database, so the pool is capped at
/// one connection: callers must not hold a connection while asking for another.
pub fn create_memory_pool() -> AppResult<DbPool> {
    let pool = Pool::builder()
        .max_size(1)
        .connection_timeout(config::database::connection_timeout())
        .build(SqliteConnectionManager::memory())?;

    let mut conn = pool.get()?;
    run_migrations(&mut conn)?;

    Ok(pool)
}

/// Get a connection from the pool
///
/// The connection is returned to the pool when dropped.
pub fn get_connection(pool: &DbPool) -> Result<DbConnection, r2d2::Error> {
    pool.get()
}

fn parse_timestamp(raw: Option<String>) -> Option<DateTime<Utc>> {
    raw.and_then(|value| match DateTime::parse_from_rfc3339(&value) {
        Ok(parsed) => Some(parsed.with_timezone(&Utc)),
        Err(e) => {
            log::warn!("Ignoring malformed timestamp {:?}: {}", value, e);
            None
        }
    })
}

/// Creates a user row unless one already exists.
///
/// Returns `true` when a new row was inserted.
pub fn create_user(conn: &DbConnection, chat_id: i64, username: Option<&str>, language: Option<&str>) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO users (chat_id, username, language) VALUES (?1, ?2, ?3)",
        params![chat_id, username, language],
    )?;
    Ok(inserted > 0)
}

/// Loads a user by chat ID.
///
/// Returns `Ok(None)` if the chat never talked to the bot.
pub fn get_user(conn: &DbConnection, chat_id: i64) -> Result<Option<User>> {
    conn.query_row(
        "SELECT chat_id, username, language, player_tag, player_name, club_rules_accepted_at, member_since
         FROM users WHERE chat_id = ?1",
        [chat_id],
        |row| {
            Ok(User {
                chat_id: row.get(0)?,
                username: row.get(1)?,
                language: row.get(2)?,
                player_tag: row.get(3)?,
                player_name: row.get(4)?,
                club_rules_accepted_at: parse_timestamp(row.get(5)?),
                member_since: parse_timestamp(row.get(6)?),
            })
        },
    )
    .optional()
}

/// Returns the stored language code for a chat, if one was chosen.
pub fn get_user_language(conn: &DbConnection, chat_id: i64) -> Result<Option<String>> {
    let language: Option<Option<String>> = conn
        .query_row("SELECT language FROM users WHERE chat_id = ?1", [chat_id], |row| row.get(0))
        .optional()?;
    Ok(language.flatten())
}

/// Stores the interface language for a chat.
pub fn set_user_language(conn: &DbConnection, chat_id: i64, language: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO users (chat_id, language) VALUES (?1, ?2)
         ON CONFLICT(chat_id) DO UPDATE SET language = excluded.language",
        params![chat_id, language],
    )?;
    Ok(())
}

/// Links a verified player to a chat.
///
/// Linking a player restarts the join flow: previous rule acceptance and
/// membership are cleared.
pub fn set_player(conn: &DbConnection, chat_id: i64, player_tag: &str, player_name: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO users (chat_id, player_tag, player_name) VALUES (?1, ?2, ?3)
         ON CONFLICT(chat_id) DO UPDATE SET
            player_tag = excluded.player_tag,
            player_name = excluded.player_name,
            club_rules_accepted_at = NULL,
            member_since = NULL",
        params![chat_id, player_tag, player_name],
    )?;
    Ok(())
}

/// Records that the chat accepted the club rules.
pub fn accept_club_rules(conn: &DbConnection, chat_id: i64, at: DateTime<Utc>) -> Result<()> {
    conn.execute(
        "UPDATE users SET club_rules_accepted_at = ?2 WHERE chat_id = ?1",
        params![chat_id, at.to_rfc3339()],
    )?;
    Ok(())
}

/// Records that the chat accepted the chat rules and is now a member.
pub fn mark_member(conn: &DbConnection, chat_id: i64, at: DateTime<Utc>) -> Result<()> {
    conn.execute(
        "UPDATE users SET member_since = ?2 WHERE chat_id = ?1",
        params![chat_id, at.to_rfc3339()],
    )?;
    Ok(())
}

/// Number of chats that completed the join flow.
pub fn count_members(conn: &DbConnection) -> Result<u64> {
    conn.query_row("SELECT COUNT(*) FROM users WHERE member_since IS NOT NULL", [], |row| {
        row.get::<_, i64>(0)
    })
    .map(|count| u64::try_from(count).unwrap_or(0))
}
