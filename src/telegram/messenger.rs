use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{KeyboardButton, KeyboardMarkup, KeyboardRemove, ReplyMarkup};
use teloxide::{ApiError, RequestError};

use crate::fsm::{ConversationContext, Keyboard, Messenger, OutboundMessage, SendError};

/// [`Messenger`] that sends through the Bot API.
#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

/// Telegram reply markup for a keyboard; `None` keeps the current one.
pub fn reply_markup(keyboard: &Keyboard) -> Option<ReplyMarkup> {
    match keyboard {
        Keyboard::Keep => None,
        Keyboard::Remove => Some(ReplyMarkup::KeyboardRemove(KeyboardRemove::new())),
        Keyboard::Buttons(rows) => {
            let rows = rows
                .iter()
                .map(|row| row.iter().map(|label| KeyboardButton::new(label.clone())).collect::<Vec<_>>());
            Some(ReplyMarkup::Keyboard(KeyboardMarkup::new(rows).resize_keyboard()))
        }
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send(&self, context: ConversationContext, message: OutboundMessage) -> Result<(), SendError> {
        let mut request = self.bot.send_message(ChatId::from(context), message.text);
        if let Some(markup) = reply_markup(&message.keyboard) {
            request = request.reply_markup(markup);
        }

        match request.await {
            Ok(_) => Ok(()),
            Err(RequestError::Api(ApiError::BotBlocked)) => {
                log::info!("Chat {} blocked the bot", context);
                Err(SendError::Blocked(context))
            }
            Err(e) => Err(SendError::delivery(context, e)),
        }
    }
}
