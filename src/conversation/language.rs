use async_trait::async_trait;

use super::common::{invalid_choice, label, pressed};
use crate::fsm::{
    go, stay, ConversationContext, Deps, EngineError, HookResult, Inbound, OutboundMessage, State, StateHandler,
    StateKind,
};
use crate::i18n::{self, SUPPORTED_LANGS};
use crate::storage::db;

fn language_buttons(deps: &Deps, context: ConversationContext) -> Vec<Vec<String>> {
    let mut buttons: Vec<Vec<String>> = SUPPORTED_LANGS
        .chunks(2)
        .map(|row| row.iter().map(|(_, name)| (*name).to_string()).collect())
        .collect();
    buttons.push(vec![label(deps, context, "button.back")]);
    buttons
}

/// Lets the user pick an interface language, then returns to where the
/// picker was opened from.
pub struct LanguagePickerHandler;

#[async_trait]
impl StateHandler for LanguagePickerHandler {
    fn kind(&self) -> StateKind {
        StateKind::LanguagePicker
    }

    async fn entry(&self, state: &State, _previous: Option<&State>, deps: &Deps) -> HookResult {
        let context = state.context();
        let message = OutboundMessage::text(deps.localizer.t(context, "language.prompt"))
            .with_buttons(language_buttons(deps, context));
        deps.send(context, message).await?;
        stay(state)
    }

    async fn process(&self, state: &State, input: &Inbound, deps: &Deps) -> HookResult {
        let State::LanguagePicker { context, return_to } = state else {
            return Err(EngineError::state_mismatch(self.kind(), state));
        };
        let context = *context;

        if pressed(deps, input, "button.back") {
            return go(return_to.into_state(context));
        }
        let Some(code) = input.input.text().and_then(i18n::language_by_name) else {
            return invalid_choice(deps, state, language_buttons(deps, context)).await;
        };

        {
            let conn = db::get_connection(&deps.db_pool)?;
            db::set_user_language(&conn, context.chat_id(), code)?;
        }
        log::info!("Chat {} switched language to {}", context, code);

        let text = deps
            .localizer
            .t_args(context, "language.changed", &[("language", i18n::language_name(code))]);
        deps.send(context, OutboundMessage::text(text)).await?;
        go(return_to.into_state(context))
    }
}
