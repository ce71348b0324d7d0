//! Player tag verification

use async_trait::async_trait;

use super::common::{column, invalid_choice, pressed, setting};
use crate::brawl::{BrawlTag, Player};
use crate::fsm::{go, stay, Deps, EngineError, HookResult, Inbound, OutboundMessage, State, StateHandler, StateKind};
use crate::storage::db;
use crate::storage::settings::SettingKey;

pub struct PlayerTagHandler;

#[async_trait]
impl StateHandler for PlayerTagHandler {
    fn kind(&self) -> StateKind {
        StateKind::AwaitingPlayerTag
    }

    async fn entry(&self, state: &State, _previous: Option<&State>, deps: &Deps) -> HookResult {
        let context = state.context();
        let message = OutboundMessage::text(deps.localizer.t(context, "player.prompt"))
            .with_buttons(column(deps, context, &["button.back"]));
        deps.send(context, message).await?;
        stay(state)
    }

    async fn process(&self, state: &State, input: &Inbound, deps: &Deps) -> HookResult {
        let context = state.context();
        if pressed(deps, input, "button.back") {
            return go(State::initial(context));
        }
        let Some(text) = input.input.text() else {
            return invalid_choice(deps, state, column(deps, context, &["button.back"])).await;
        };

        let tag = match BrawlTag::parse(text) {
            Ok(tag) => tag,
            Err(e) => {
                log::debug!("Chat {} sent an invalid tag {:?}: {}", context, text, e);
                deps.send(context, OutboundMessage::text(deps.localizer.t(context, "player.invalid-tag")))
                    .await?;
                return stay(state);
            }
        };

        let player = match deps.players.find_player(&tag).await {
            Ok(Some(player)) => player,
            Ok(None) => {
                let text = deps
                    .localizer
                    .t_args(context, "player.not-found", &[("tag", tag.to_string().as_str())]);
                deps.send(context, OutboundMessage::text(text)).await?;
                return stay(state);
            }
            Err(e) => {
                log::warn!("Player lookup for {} failed: {}", tag, e);
                deps.send(
                    context,
                    OutboundMessage::text(deps.localizer.t(context, "common.service-unavailable")),
                )
                .await?;
                return stay(state);
            }
        };

        link_player(deps, state, &player)?;

        if club_tag(deps)?.is_some_and(|club| player.is_in_club(&club)) {
            let text = deps.localizer.t_args(
                context,
                "player.found",
                &[("name", player.name.as_str()), ("tag", player.tag.to_string().as_str())],
            );
            deps.send(context, OutboundMessage::text(text)).await?;
            go(State::AwaitingClubRuleAcceptance {
                context,
                tag: player.tag,
            })
        } else {
            let text = deps
                .localizer
                .t_args(context, "player.not-in-club", &[("name", player.name.as_str())]);
            deps.send(context, OutboundMessage::text(text)).await?;
            go(State::GuestMainMenu { context })
        }
    }
}

fn link_player(deps: &Deps, state: &State, player: &Player) -> Result<(), EngineError> {
    let conn = db::get_connection(&deps.db_pool)?;
    db::set_player(&conn, state.context().chat_id(), &player.tag.to_string(), &player.name)?;
    log::info!("Chat {} linked player {} ({})", state.context(), player.name, player.tag);
    Ok(())
}

/// The configured club tag, if it is set and valid.
fn club_tag(deps: &Deps) -> Result<Option<BrawlTag>, EngineError> {
    let Some(raw) = setting(deps, SettingKey::ClubTag)? else {
        log::warn!("Club tag is not configured, nobody can join");
        return Ok(None);
    };
    match BrawlTag::parse(&raw) {
        Ok(tag) => Ok(Some(tag)),
        Err(e) => {
            log::warn!("Configured club tag {:?} is invalid: {}", raw, e);
            Ok(None)
        }
    }
}
