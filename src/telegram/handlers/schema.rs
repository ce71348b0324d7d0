//! Dispatcher schema: private messages are forwarded to the conversation loop

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Message;

use super::types::{ensure_user_exists, inbound_from_message, HandlerDeps, HandlerError, UserInfo};
use crate::telegram::bot::is_private_chat;

/// Creates the dispatcher schema for the Telegram bot.
///
/// Every private message, commands included, becomes an
/// [`Inbound`](crate::fsm::Inbound) on the conversation channel; the
/// conversation engine decides what it means.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    dptree::entry().branch(message_handler(deps))
}

fn message_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| is_private_chat(&msg))
        .endpoint(move |msg: Message| {
            let deps = deps.clone();
            async move { forward_message(&deps, &msg).await }
        })
}

async fn forward_message(deps: &HandlerDeps, msg: &Message) -> Result<(), HandlerError> {
    ensure_user_exists(&deps.db_pool, &UserInfo::from_message(msg));

    let inbound = inbound_from_message(msg);
    log::debug!("Chat {}: {:?}", inbound.context, inbound.input);

    deps.updates.send(inbound).await.map_err(|e| {
        log::error!("Conversation loop is gone, dropping update from chat {}", msg.chat.id);
        HandlerError::from(e.to_string())
    })
}
