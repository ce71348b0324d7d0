//! Helpers shared by the conversation steps

use crate::fsm::{stay, ConversationContext, Deps, EngineError, HookResult, Inbound, OutboundMessage, State};
use crate::storage::db::{self, User};
use crate::storage::settings::{self, SettingKey};

/// Menu command that re-renders the current menu.
pub const MENU_COMMAND: &str = "menu";

/// Maximum message length for Telegram (with margin)
pub const MAX_MESSAGE_LENGTH: usize = 4000;

/// Cuts `text` to at most `max` characters, marking the cut with an ellipsis.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut trimmed: String = text.chars().take(max.saturating_sub(1)).collect();
    trimmed.push('…');
    trimmed
}

/// Keeps an outgoing message within Telegram's length limit.
pub fn truncate_message(text: &str) -> String {
    if text.chars().count() <= MAX_MESSAGE_LENGTH {
        return text.to_string();
    }
    let mut trimmed = truncate_chars(text, MAX_MESSAGE_LENGTH - 20);
    trimmed.push_str("\n... (truncated)");
    trimmed
}

/// Localized button label.
pub fn label(deps: &Deps, context: ConversationContext, key: &str) -> String {
    deps.localizer.t(context, key)
}

/// True if the input is the text of the button `key`.
pub fn pressed(deps: &Deps, input: &Inbound, key: &str) -> bool {
    input
        .input
        .text()
        .is_some_and(|text| text == label(deps, input.context, key))
}

pub fn user(deps: &Deps, context: ConversationContext) -> Result<Option<User>, EngineError> {
    let conn = db::get_connection(&deps.db_pool)?;
    Ok(db::get_user(&conn, context.chat_id())?)
}

pub fn setting(deps: &Deps, key: SettingKey) -> Result<Option<String>, EngineError> {
    let conn = db::get_connection(&deps.db_pool)?;
    Ok(settings::get_setting(&conn, key)?)
}

/// The main menu matching the chat's membership.
pub fn home(deps: &Deps, context: ConversationContext) -> Result<State, EngineError> {
    let is_member = user(deps, context)?.is_some_and(|user| user.is_member());
    Ok(if is_member {
        State::MemberMainMenu { context }
    } else {
        State::GuestMainMenu { context }
    })
}

/// Tells the user the input was not understood and keeps waiting.
///
/// `buttons` is the keyboard of the current step. It is sent again because
/// the chat may never have seen it, e.g. when the first message of a new chat
/// is not `/start`.
pub async fn invalid_choice(deps: &Deps, state: &State, buttons: Vec<Vec<String>>) -> HookResult {
    let context = state.context();
    log::debug!("Chat {}: unrecognized input in {}", context, state.kind());
    let message = OutboundMessage::text(deps.localizer.t(context, "common.invalid-choice")).with_buttons(buttons);
    deps.send(context, message).await?;
    stay(state)
}

/// Single-column keyboard of localized buttons.
pub fn column(deps: &Deps, context: ConversationContext, keys: &[&str]) -> Vec<Vec<String>> {
    keys.iter().map(|key| vec![label(deps, context, key)]).collect()
}
