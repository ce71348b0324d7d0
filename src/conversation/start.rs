use async_trait::async_trait;

use super::common::{column, invalid_choice, pressed, user};
use crate::fsm::{
    go, stay, ConversationContext, Deps, HookResult, Inbound, OutboundMessage, ReturnTo, State, StateHandler,
    StateKind,
};
use crate::storage::db;

fn welcome_buttons(deps: &Deps, context: ConversationContext) -> Vec<Vec<String>> {
    column(deps, context, &["button.verify", "button.language"])
}

/// First step of every conversation.
///
/// Known members and verified guests go straight to their menu; everyone
/// else gets the welcome message.
pub struct InitialHandler;

#[async_trait]
impl StateHandler for InitialHandler {
    fn kind(&self) -> StateKind {
        StateKind::Initial
    }

    async fn entry(&self, state: &State, _previous: Option<&State>, deps: &Deps) -> HookResult {
        let context = state.context();
        {
            let conn = db::get_connection(&deps.db_pool)?;
            if db::create_user(&conn, context.chat_id(), None, None)? {
                log::info!("New user {}", context);
            }
        }

        match user(deps, context)? {
            Some(user) if user.is_member() => go(State::MemberMainMenu { context }),
            Some(user) if user.is_verified() => go(State::GuestMainMenu { context }),
            _ => {
                let message = OutboundMessage::text(deps.localizer.t(context, "welcome.text"))
                    .with_buttons(welcome_buttons(deps, context));
                deps.send(context, message).await?;
                stay(state)
            }
        }
    }

    async fn process(&self, state: &State, input: &Inbound, deps: &Deps) -> HookResult {
        let context = state.context();
        if pressed(deps, input, "button.verify") {
            go(State::AwaitingPlayerTag { context })
        } else if pressed(deps, input, "button.language") {
            go(State::LanguagePicker {
                context,
                return_to: ReturnTo::Initial,
            })
        } else {
            invalid_choice(deps, state, welcome_buttons(deps, context)).await
        }
    }
}
