//! Club-wide settings edited by admins

use rusqlite::{params, OptionalExtension, Result};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator};

use crate::storage::db::DbConnection;

/// Keys of the `club_settings` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, EnumIter, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SettingKey {
    /// Tag of the club players must belong to
    ClubTag,
    /// Rules shown before joining the club
    ClubRules,
    /// Rules shown before joining the club chat
    ChatRules,
    /// Invite link sent to new members
    ChatInviteLink,
}

impl SettingKey {
    /// Localization key of the human-readable setting name.
    pub fn label_key(self) -> String {
        format!("setting.{}", self.as_ref())
    }
}

/// Reads a single setting.
pub fn get_setting(conn: &DbConnection, key: SettingKey) -> Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM club_settings WHERE key = ?1",
        [key.as_ref()],
        |row| row.get(0),
    )
    .optional()
}

/// Writes a single setting, replacing the previous value.
pub fn set_setting(conn: &DbConnection, key: SettingKey, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO club_settings (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
        params![key.as_ref(), value],
    )?;
    Ok(())
}

/// Reads every setting in declaration order; unset settings are `None`.
pub fn all_settings(conn: &DbConnection) -> Result<Vec<(SettingKey, Option<String>)>> {
    SettingKey::iter()
        .map(|key| get_setting(conn, key).map(|value| (key, value)))
        .collect()
}
