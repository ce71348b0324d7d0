//! Guest and member main menus

use async_trait::async_trait;

use super::common::{invalid_choice, label, pressed, user, MENU_COMMAND};
use crate::fsm::{
    go, stay, ConversationContext, Deps, EngineError, HookResult, Inbound, OutboundMessage, ReturnTo, State,
    StateHandler, StateKind,
};

fn menu_buttons(deps: &Deps, context: ConversationContext, first: &str) -> Vec<Vec<String>> {
    let mut rows = vec![vec![label(deps, context, first), label(deps, context, "button.language")]];
    if deps.is_admin(context) {
        rows.push(vec![label(deps, context, "button.settings")]);
    }
    rows
}

/// Transitions shared by both menus; `None` if the input is not one of them.
fn common_choice(deps: &Deps, input: &Inbound, return_to: ReturnTo) -> Option<State> {
    let context = input.context;
    if pressed(deps, input, "button.language") {
        Some(State::LanguagePicker { context, return_to })
    } else if deps.is_admin(context) && pressed(deps, input, "button.settings") {
        Some(State::AdminViewSettings { context })
    } else {
        None
    }
}

pub struct GuestMenuHandler;

impl GuestMenuHandler {
    async fn render(&self, deps: &Deps, context: ConversationContext) -> Result<(), EngineError> {
        let message = OutboundMessage::text(deps.localizer.t(context, "menu.guest"))
            .with_buttons(menu_buttons(deps, context, "button.verify"));
        deps.send(context, message).await?;
        Ok(())
    }
}

#[async_trait]
impl StateHandler for GuestMenuHandler {
    fn kind(&self) -> StateKind {
        StateKind::GuestMainMenu
    }

    async fn entry(&self, state: &State, _previous: Option<&State>, deps: &Deps) -> HookResult {
        self.render(deps, state.context()).await?;
        stay(state)
    }

    async fn process(&self, state: &State, input: &Inbound, deps: &Deps) -> HookResult {
        let context = state.context();
        if input.input.is_command(MENU_COMMAND) {
            self.render(deps, context).await?;
            return stay(state);
        }
        if pressed(deps, input, "button.verify") {
            return go(State::AwaitingPlayerTag { context });
        }
        match common_choice(deps, input, ReturnTo::GuestMainMenu) {
            Some(next) => go(next),
            None => invalid_choice(deps, state, menu_buttons(deps, context, "button.verify")).await,
        }
    }
}

pub struct MemberMenuHandler;

impl MemberMenuHandler {
    async fn render(&self, deps: &Deps, context: ConversationContext) -> Result<(), EngineError> {
        let name = user(deps, context)?.and_then(|user| user.player_name).unwrap_or_default();
        let text = deps
            .localizer
            .t_args(context, "menu.member", &[("name", name.as_str())]);
        let message = OutboundMessage::text(text).with_buttons(menu_buttons(deps, context, "button.profile"));
        deps.send(context, message).await?;
        Ok(())
    }

    async fn show_profile(&self, deps: &Deps, context: ConversationContext) -> Result<(), EngineError> {
        let Some(user) = user(deps, context)? else {
            return Ok(());
        };
        let offset = *deps.clock.now(context).offset();
        let since = user
            .member_since
            .map(|at| at.with_timezone(&offset).format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();

        let text = deps.localizer.t_args(
            context,
            "menu.profile",
            &[
                ("name", user.player_name.as_deref().unwrap_or_default()),
                ("tag", user.player_tag.as_deref().unwrap_or_default()),
                ("since", since.as_str()),
            ],
        );
        deps.send(context, OutboundMessage::text(text)).await?;
        Ok(())
    }
}

#[async_trait]
impl StateHandler for MemberMenuHandler {
    fn kind(&self) -> StateKind {
        StateKind::MemberMainMenu
    }

    async fn entry(&self, state: &State, _previous: Option<&State>, deps: &Deps) -> HookResult {
        self.render(deps, state.context()).await?;
        stay(state)
    }

    async fn process(&self, state: &State, input: &Inbound, deps: &Deps) -> HookResult {
        let context = state.context();
        if input.input.is_command(MENU_COMMAND) {
            self.render(deps, context).await?;
            return stay(state);
        }
        if pressed(deps, input, "button.profile") {
            self.show_profile(deps, context).await?;
            return stay(state);
        }
        match common_choice(deps, input, ReturnTo::MemberMainMenu) {
            Some(next) => go(next),
            None => invalid_choice(deps, state, menu_buttons(deps, context, "button.profile")).await,
        }
    }
}
