use std::collections::HashMap;
use std::sync::Arc;

use fluent_templates::{fluent_bundle::FluentValue, static_loader, Loader};
use once_cell::sync::Lazy;
use unic_langid::LanguageIdentifier;

use crate::core::config;
use crate::fsm::ConversationContext;
use crate::storage::db::{self, DbPool};

static_loader! {
    static LOCALES = {
        locales: "./locales",
        fallback_language: "en",
        // Telegram renders the Unicode isolation marks around arguments
        customise: |bundle| bundle.set_use_isolating(false),
    };
}

/// Supported languages (code, human-readable name).
pub static SUPPORTED_LANGS: &[(&str, &str)] = &[("en", "English"), ("ru", "Русский"), ("de", "Deutsch")];

/// Language used when a chat has no stored preference.
static DEFAULT_LANG: Lazy<LanguageIdentifier> = Lazy::new(|| lang_from_code(&config::DEFAULT_LANGUAGE));

static FALLBACK_LANG: Lazy<LanguageIdentifier> = Lazy::new(LanguageIdentifier::default);

/// Normalizes a language code into a LanguageIdentifier.
///
/// Unknown or malformed codes map to English.
pub fn lang_from_code(code: &str) -> LanguageIdentifier {
    let normalized = is_language_supported(code).unwrap_or("en");
    normalized.parse().unwrap_or_else(|_| FALLBACK_LANG.clone())
}

/// Returns a localized string for the given key.
/// Converts literal `\n` sequences to actual newlines for proper Telegram formatting.
pub fn t(lang: &LanguageIdentifier, key: &str) -> String {
    let text = LOCALES
        .lookup(lang, key)
        .unwrap_or_else(|| LOCALES.lookup(&DEFAULT_LANG, key).unwrap_or_else(|| key.to_string()));
    text.replace("\\n", "\n")
}

/// Returns a localized string with arguments for interpolation.
pub fn t_args(lang: &LanguageIdentifier, key: &str, args: &[(&str, &str)]) -> String {
    let args_map: HashMap<String, FluentValue> = args
        .iter()
        .map(|(name, value)| ((*name).to_string(), FluentValue::from((*value).to_string())))
        .collect();

    let text = LOCALES.lookup_with_args(lang, key, &args_map).unwrap_or_else(|| {
        LOCALES
            .lookup_with_args(&DEFAULT_LANG, key, &args_map)
            .unwrap_or_else(|| key.to_string())
    });
    text.replace("\\n", "\n")
}

/// Finds a human-friendly name for a language code.
pub fn language_name(code: &str) -> &str {
    SUPPORTED_LANGS
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(code))
        .map(|(_, name)| *name)
        .unwrap_or("Unknown")
}

/// Checks if a language code is supported by the bot.
/// Returns the normalized language code if supported, None otherwise.
pub fn is_language_supported(code: &str) -> Option<&'static str> {
    // "en-US" -> "en", "ru_RU" -> "ru"
    let normalized = code.split(['-', '_']).next().unwrap_or(code).trim().to_lowercase();

    SUPPORTED_LANGS
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(&normalized))
        .map(|(c, _)| *c)
}

/// Language code whose display name is `label`, for language picker buttons.
pub fn language_by_name(label: &str) -> Option<&'static str> {
    SUPPORTED_LANGS
        .iter()
        .find(|(_, name)| *name == label.trim())
        .map(|(code, _)| *code)
}

/// Per-chat string lookup backed by the users table.
pub struct Localizer {
    db_pool: Arc<DbPool>,
}

impl Localizer {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// The chat's chosen language, or the configured default.
    pub fn lang(&self, context: ConversationContext) -> LanguageIdentifier {
        let stored = db::get_connection(&self.db_pool)
            .map_err(|e| e.to_string())
            .and_then(|conn| db::get_user_language(&conn, context.chat_id()).map_err(|e| e.to_string()));

        match stored {
            Ok(Some(code)) => lang_from_code(&code),
            Ok(None) => DEFAULT_LANG.clone(),
            Err(e) => {
                log::warn!("Failed to read language of chat {}: {}", context, e);
                DEFAULT_LANG.clone()
            }
        }
    }

    pub fn t(&self, context: ConversationContext, key: &str) -> String {
        t(&self.lang(context), key)
    }

    pub fn t_args(&self, context: ConversationContext, key: &str, args: &[(&str, &str)]) -> String {
        t_args(&self.lang(context), key, args)
    }

    /// Codes of the languages users can pick.
    pub fn locales(&self) -> impl Iterator<Item = &'static str> {
        SUPPORTED_LANGS.iter().map(|(code, _)| *code)
    }
}
