//! Configuration constants for the bot, read once from the environment.

use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

/// Database file path
/// Read from DATABASE_PATH environment variable
/// Default: database.sqlite
pub static DATABASE_PATH: Lazy<String> =
    Lazy::new(|| env::var("DATABASE_PATH").unwrap_or_else(|_| "database.sqlite".to_string()));

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: app.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "app.log".to_string()));

/// Bot token
/// Read from BOT_TOKEN or TELOXIDE_TOKEN environment variable
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env::var("BOT_TOKEN")
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_else(|_| String::new())
});

/// Language used when a chat has not picked one and Telegram gave no hint
/// Read from DEFAULT_LANGUAGE environment variable
/// Default: en
pub static DEFAULT_LANGUAGE: Lazy<String> =
    Lazy::new(|| env::var("DEFAULT_LANGUAGE").unwrap_or_else(|_| "en".to_string()));

/// Offset from UTC applied when rendering dates to users (in minutes)
/// Read from BOT_UTC_OFFSET_MINUTES environment variable
/// Default: 0
pub static UTC_OFFSET_MINUTES: Lazy<i32> = Lazy::new(|| {
    env::var("BOT_UTC_OFFSET_MINUTES")
        .ok()
        .and_then(|raw| parse_offset_minutes(&raw))
        .unwrap_or(0)
});

/// Parses a UTC offset in minutes, rejecting values outside +/-14h.
pub fn parse_offset_minutes(raw: &str) -> Option<i32> {
    raw.trim()
        .parse::<i32>()
        .ok()
        .filter(|minutes| minutes.abs() <= 14 * 60)
}

/// Brawl Stars API configuration
pub mod brawl {
    use super::Duration;
    use once_cell::sync::Lazy;
    use std::env;

    /// API token issued at developer.brawlstars.com
    /// Read from BRAWL_API_TOKEN environment variable
    pub static API_TOKEN: Lazy<String> = Lazy::new(|| env::var("BRAWL_API_TOKEN").unwrap_or_default());

    /// Base URL of the API (a proxy can be used for IP allow-listing)
    /// Read from BRAWL_API_URL environment variable
    pub static API_URL: Lazy<String> = Lazy::new(|| {
        env::var("BRAWL_API_URL").unwrap_or_else(|_| "https://api.brawlstars.com/v1".to_string())
    });

    /// How long player lookups are cached (in seconds)
    /// Read from BRAWL_CACHE_TTL_SECS environment variable
    pub static CACHE_TTL_SECS: Lazy<u64> = Lazy::new(|| {
        env::var("BRAWL_CACHE_TTL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(300)
    });

    /// Maximum number of cached player lookups
    pub const CACHE_CAPACITY: u64 = 10_000;

    /// Request timeout for API calls (in seconds)
    pub const REQUEST_TIMEOUT_SECS: u64 = 10;

    /// Cache TTL duration
    pub fn cache_ttl() -> Duration {
        Duration::from_secs(*CACHE_TTL_SECS)
    }

    /// API request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

/// Conversation engine configuration
pub mod fsm {
    use super::Duration;

    /// Maximum number of states a single entry chain may pass through
    /// before the chain is treated as a configuration error.
    pub const MAX_ENTRY_CHAIN: usize = 32;

    /// Capacity of the inbound update channel feeding the conversation loop
    pub const CHANNEL_CAPACITY: usize = 1024;

    /// Delay before a supervised loop is relaunched (0 = immediately)
    pub const RESTART_DELAY_MS: u64 = 0;

    /// Restart delay duration
    pub fn restart_delay() -> Duration {
        Duration::from_millis(RESTART_DELAY_MS)
    }
}

/// Database configuration
pub mod database {
    use super::Duration;

    /// Maximum number of pooled SQLite connections
    pub const POOL_SIZE: u32 = 8;

    /// How long to wait for a free pooled connection (in seconds)
    pub const CONNECTION_TIMEOUT_SECS: u64 = 5;

    /// Connection checkout timeout duration
    pub fn connection_timeout() -> Duration {
        Duration::from_secs(CONNECTION_TIMEOUT_SECS)
    }
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for Telegram Bot API calls (in seconds)
    pub const REQUEST_TIMEOUT_SECS: u64 = 60;

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

/// Admin configuration
pub mod admin {
    use once_cell::sync::Lazy;
    use std::env;

    pub fn parse_admin_ids(raw: &str) -> Vec<i64> {
        raw.split([',', ' ', '\n', '\t'])
            .filter_map(|part| part.trim().parse::<i64>().ok())
            .collect()
    }

    /// Admin user IDs (comma-separated)
    /// Read from ADMIN_IDS environment variable
    pub static ADMIN_IDS: Lazy<Vec<i64>> = Lazy::new(|| {
        env::var("ADMIN_IDS")
            .ok()
            .map(|raw| parse_admin_ids(&raw))
            .unwrap_or_default()
    });

    /// Longest value an admin may store for a setting (in characters)
    pub const MAX_SETTING_LENGTH: usize = 3000;

    /// How much of each value the settings overview shows (in characters)
    pub const SETTING_PREVIEW_LENGTH: usize = 500;
}
