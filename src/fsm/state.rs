//! Conversation states
//!
//! [`State`] is a closed sum over every step of a conversation. Each value
//! carries the [`ConversationContext`] it belongs to, and its fieldless
//! discriminant [`StateKind`] keys the handler registry and tags the
//! persisted JSON.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumDiscriminants, EnumIter, EnumString};

use super::ConversationContext;
use crate::brawl::BrawlTag;
use crate::storage::settings::SettingKey;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, EnumDiscriminants)]
#[serde(tag = "variant")]
#[strum_discriminants(name(StateKind))]
#[strum_discriminants(derive(Hash, PartialOrd, Ord, EnumIter, Display, AsRefStr, EnumString))]
pub enum State {
    /// Entry point of every conversation; routes to the right menu.
    Initial { context: ConversationContext },
    /// Waiting for the user to type their player tag.
    AwaitingPlayerTag { context: ConversationContext },
    /// Club rules shown, waiting for accept/decline.
    AwaitingClubRuleAcceptance { context: ConversationContext, tag: BrawlTag },
    /// Chat rules shown, waiting for accept/decline.
    AwaitingChatRuleAcceptance { context: ConversationContext, tag: BrawlTag },
    GuestMainMenu { context: ConversationContext },
    MemberMainMenu { context: ConversationContext },
    AdminViewSettings { context: ConversationContext },
    /// Waiting for the new value of `key`.
    AdminEditSetting { context: ConversationContext, key: SettingKey },
    LanguagePicker { context: ConversationContext, return_to: ReturnTo },
}

impl State {
    pub fn initial(context: ConversationContext) -> Self {
        Self::Initial { context }
    }

    pub fn context(&self) -> ConversationContext {
        match self {
            Self::Initial { context }
            | Self::AwaitingPlayerTag { context }
            | Self::AwaitingClubRuleAcceptance { context, .. }
            | Self::AwaitingChatRuleAcceptance { context, .. }
            | Self::GuestMainMenu { context }
            | Self::MemberMainMenu { context }
            | Self::AdminViewSettings { context }
            | Self::AdminEditSetting { context, .. }
            | Self::LanguagePicker { context, .. } => *context,
        }
    }

    pub fn kind(&self) -> StateKind {
        StateKind::from(self)
    }
}

/// Where a sub-flow goes back to once it is done.
///
/// Persisted inside the sub-flow's state, so the way back survives restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReturnTo {
    Initial,
    GuestMainMenu,
    MemberMainMenu,
    AdminViewSettings,
}

impl ReturnTo {
    /// A fresh state of the target kind for `context`.
    pub fn into_state(self, context: ConversationContext) -> State {
        match self {
            Self::Initial => State::Initial { context },
            Self::GuestMainMenu => State::GuestMainMenu { context },
            Self::MemberMainMenu => State::MemberMainMenu { context },
            Self::AdminViewSettings => State::AdminViewSettings { context },
        }
    }
}
