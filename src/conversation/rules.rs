//! Club and chat rule acceptance

use async_trait::async_trait;
use chrono::Utc;

use super::common::{invalid_choice, label, pressed, setting, truncate_message, user};
use crate::fsm::{
    go, stay, ConversationContext, Deps, EngineError, HookResult, Inbound, OutboundMessage, State, StateHandler,
    StateKind,
};
use crate::storage::db;
use crate::storage::settings::SettingKey;

fn rule_buttons(deps: &Deps, context: ConversationContext) -> Vec<Vec<String>> {
    vec![vec![label(deps, context, "button.accept"), label(deps, context, "button.decline")]]
}

/// Sends a rule set with accept and decline buttons.
async fn show_rules(
    deps: &Deps,
    context: ConversationContext,
    title_key: &str,
    rules_key: SettingKey,
    default_key: &str,
) -> Result<(), EngineError> {
    let rules = match setting(deps, rules_key)? {
        Some(rules) => rules,
        None => deps.localizer.t(context, default_key),
    };
    let text = truncate_message(&format!("{}\n\n{}", deps.localizer.t(context, title_key), rules));
    deps.send(context, OutboundMessage::text(text).with_buttons(rule_buttons(deps, context)))
        .await?;
    Ok(())
}

async fn declined(deps: &Deps, context: ConversationContext) -> HookResult {
    log::info!("Chat {} declined the rules", context);
    deps.send(context, OutboundMessage::text(deps.localizer.t(context, "rules.declined")))
        .await?;
    go(State::GuestMainMenu { context })
}

pub struct ClubRulesHandler;

#[async_trait]
impl StateHandler for ClubRulesHandler {
    fn kind(&self) -> StateKind {
        StateKind::AwaitingClubRuleAcceptance
    }

    async fn entry(&self, state: &State, _previous: Option<&State>, deps: &Deps) -> HookResult {
        show_rules(
            deps,
            state.context(),
            "rules.club-title",
            SettingKey::ClubRules,
            "rules.club-default",
        )
        .await?;
        stay(state)
    }

    async fn process(&self, state: &State, input: &Inbound, deps: &Deps) -> HookResult {
        let State::AwaitingClubRuleAcceptance { context, tag } = state else {
            return Err(EngineError::state_mismatch(self.kind(), state));
        };

        if pressed(deps, input, "button.accept") {
            {
                let conn = db::get_connection(&deps.db_pool)?;
                db::accept_club_rules(&conn, context.chat_id(), deps.clock.now(*context).with_timezone(&Utc))?;
            }
            go(State::AwaitingChatRuleAcceptance {
                context: *context,
                tag: tag.clone(),
            })
        } else if pressed(deps, input, "button.decline") {
            declined(deps, *context).await
        } else {
            invalid_choice(deps, state, rule_buttons(deps, *context)).await
        }
    }
}

pub struct ChatRulesHandler;

#[async_trait]
impl StateHandler for ChatRulesHandler {
    fn kind(&self) -> StateKind {
        StateKind::AwaitingChatRuleAcceptance
    }

    async fn entry(&self, state: &State, _previous: Option<&State>, deps: &Deps) -> HookResult {
        show_rules(
            deps,
            state.context(),
            "rules.chat-title",
            SettingKey::ChatRules,
            "rules.chat-default",
        )
        .await?;
        stay(state)
    }

    async fn process(&self, state: &State, input: &Inbound, deps: &Deps) -> HookResult {
        let context = state.context();

        if pressed(deps, input, "button.accept") {
            {
                let conn = db::get_connection(&deps.db_pool)?;
                db::mark_member(&conn, context.chat_id(), deps.clock.now(context).with_timezone(&Utc))?;
            }
            welcome_member(deps, context).await?;
            go(State::MemberMainMenu { context })
        } else if pressed(deps, input, "button.decline") {
            declined(deps, context).await
        } else {
            invalid_choice(deps, state, rule_buttons(deps, context)).await
        }
    }
}

async fn welcome_member(deps: &Deps, context: ConversationContext) -> Result<(), EngineError> {
    let name = user(deps, context)?.and_then(|user| user.player_name).unwrap_or_default();
    log::info!("Chat {} ({}) joined the club", context, name);

    let mut text = deps
        .localizer
        .t_args(context, "rules.welcome", &[("name", name.as_str())]);
    if let Some(link) = setting(deps, SettingKey::ChatInviteLink)? {
        text.push_str("\n\n");
        text.push_str(&deps.localizer.t_args(context, "rules.invite", &[("link", link.as_str())]));
    }
    deps.send(context, OutboundMessage::text(text)).await?;
    Ok(())
}
