//! Club settings editor for admins

use async_trait::async_trait;
use strum::IntoEnumIterator;
use url::Url;

use super::common::{
    column, home, invalid_choice, label, pressed, truncate_chars, truncate_message, MENU_COMMAND,
};
use crate::brawl::BrawlTag;
use crate::core::config::admin::{MAX_SETTING_LENGTH, SETTING_PREVIEW_LENGTH};
use crate::fsm::{
    go, stay, ConversationContext, Deps, EngineError, HookResult, Inbound, OutboundMessage, ReturnTo, State,
    StateHandler, StateKind,
};
use crate::storage::db;
use crate::storage::settings::{self, SettingKey};

/// Label of the "edit" button for `key`.
fn edit_label(deps: &Deps, context: ConversationContext, key: SettingKey) -> String {
    let name = deps.localizer.t(context, &key.label_key());
    deps.localizer.t_args(context, "button.edit", &[("setting", name.as_str())])
}

/// Sends the "admins only" notice and returns the chat's main menu.
async fn forbidden(deps: &Deps, context: ConversationContext) -> HookResult {
    log::warn!("Chat {} tried to open the settings without admin rights", context);
    deps.send(context, OutboundMessage::text(deps.localizer.t(context, "admin.forbidden")))
        .await?;
    go(home(deps, context)?)
}

/// Checks an admin-entered value and returns the form to store.
///
/// On rejection returns the localization key of the reason.
pub fn validate_setting(key: SettingKey, raw: &str) -> Result<String, &'static str> {
    let value = raw.trim();
    if value.is_empty() {
        return Err("admin.empty-value");
    }
    if value.chars().count() > MAX_SETTING_LENGTH {
        return Err("admin.too-long");
    }
    match key {
        SettingKey::ClubTag => BrawlTag::parse(value)
            .map(|tag| tag.to_string())
            .map_err(|_| "admin.invalid-tag"),
        SettingKey::ChatInviteLink => match Url::parse(value) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(url.to_string()),
            _ => Err("admin.invalid-link"),
        },
        SettingKey::ClubRules | SettingKey::ChatRules => Ok(value.to_string()),
    }
}

/// One edit button per setting, then language and back.
fn settings_buttons(deps: &Deps, context: ConversationContext) -> Vec<Vec<String>> {
    let mut buttons: Vec<Vec<String>> = SettingKey::iter().map(|key| vec![edit_label(deps, context, key)]).collect();
    buttons.push(vec![label(deps, context, "button.language")]);
    buttons.push(vec![label(deps, context, "button.back")]);
    buttons
}

pub struct ViewSettingsHandler;

impl ViewSettingsHandler {
    async fn render(&self, deps: &Deps, context: ConversationContext) -> Result<(), EngineError> {
        let current = {
            let conn = db::get_connection(&deps.db_pool)?;
            settings::all_settings(&conn)?
        };
        let unset = deps.localizer.t(context, "admin.unset");

        let mut text = deps.localizer.t(context, "admin.settings-title");
        for (key, value) in &current {
            let name = deps.localizer.t(context, &key.label_key());
            let value = value
                .as_deref()
                .map_or_else(|| unset.clone(), |value| truncate_chars(value, SETTING_PREVIEW_LENGTH));
            text.push_str(&format!("\n\n• {}: {}", name, value));
        }

        let message =
            OutboundMessage::text(truncate_message(&text)).with_buttons(settings_buttons(deps, context));
        deps.send(context, message).await?;
        Ok(())
    }
}

#[async_trait]
impl StateHandler for ViewSettingsHandler {
    fn kind(&self) -> StateKind {
        StateKind::AdminViewSettings
    }

    async fn entry(&self, state: &State, _previous: Option<&State>, deps: &Deps) -> HookResult {
        let context = state.context();
        if !deps.is_admin(context) {
            return forbidden(deps, context).await;
        }
        self.render(deps, context).await?;
        stay(state)
    }

    async fn process(&self, state: &State, input: &Inbound, deps: &Deps) -> HookResult {
        let context = state.context();
        if !deps.is_admin(context) {
            return forbidden(deps, context).await;
        }
        if pressed(deps, input, "button.back") {
            return go(home(deps, context)?);
        }
        if pressed(deps, input, "button.language") {
            return go(State::LanguagePicker {
                context,
                return_to: ReturnTo::AdminViewSettings,
            });
        }
        if input.input.is_command(MENU_COMMAND) {
            self.render(deps, context).await?;
            return stay(state);
        }

        let chosen = input
            .input
            .text()
            .and_then(|text| SettingKey::iter().find(|key| edit_label(deps, context, *key) == text));
        match chosen {
            Some(key) => go(State::AdminEditSetting { context, key }),
            None => invalid_choice(deps, state, settings_buttons(deps, context)).await,
        }
    }
}

pub struct EditSettingHandler;

#[async_trait]
impl StateHandler for EditSettingHandler {
    fn kind(&self) -> StateKind {
        StateKind::AdminEditSetting
    }

    async fn entry(&self, state: &State, _previous: Option<&State>, deps: &Deps) -> HookResult {
        let State::AdminEditSetting { context, key } = state else {
            return Err(EngineError::state_mismatch(self.kind(), state));
        };
        if !deps.is_admin(*context) {
            return forbidden(deps, *context).await;
        }

        let current = {
            let conn = db::get_connection(&deps.db_pool)?;
            settings::get_setting(&conn, *key)?
        };
        let current = current.unwrap_or_else(|| deps.localizer.t(*context, "admin.unset"));
        let name = deps.localizer.t(*context, &key.label_key());
        let text = truncate_message(&deps.localizer.t_args(
            *context,
            "admin.edit-prompt",
            &[("setting", name.as_str()), ("current", current.as_str())],
        ));

        deps.send(
            *context,
            OutboundMessage::text(text).with_buttons(column(deps, *context, &["button.back"])),
        )
        .await?;
        stay(state)
    }

    async fn process(&self, state: &State, input: &Inbound, deps: &Deps) -> HookResult {
        let State::AdminEditSetting { context, key } = state else {
            return Err(EngineError::state_mismatch(self.kind(), state));
        };
        let context = *context;
        if !deps.is_admin(context) {
            return forbidden(deps, context).await;
        }
        if pressed(deps, input, "button.back") {
            return go(State::AdminViewSettings { context });
        }
        let Some(text) = input.input.text() else {
            return invalid_choice(deps, state, column(deps, context, &["button.back"])).await;
        };

        let value = match validate_setting(*key, text) {
            Ok(value) => value,
            Err(reason) => {
                let max = MAX_SETTING_LENGTH.to_string();
                let text = deps.localizer.t_args(context, reason, &[("max", max.as_str())]);
                deps.send(context, OutboundMessage::text(text)).await?;
                return stay(state);
            }
        };

        {
            let conn = db::get_connection(&deps.db_pool)?;
            settings::set_setting(&conn, *key, &value)?;
        }
        log::info!("Admin {} set {} to {:?}", context, key.as_ref(), value);

        let name = deps.localizer.t(context, &key.label_key());
        let saved = deps
            .localizer
            .t_args(context, "admin.saved", &[("setting", name.as_str())]);
        deps.send(context, OutboundMessage::text(saved)).await?;
        go(State::AdminViewSettings { context })
    }
}
