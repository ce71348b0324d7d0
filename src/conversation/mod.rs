//! Conversation steps of the club bot, one handler per [`StateKind`](crate::fsm::StateKind)

pub mod admin;
pub mod common;
pub mod language;
pub mod menu;
pub mod rules;
pub mod start;
pub mod verification;

use crate::fsm::{Registry, RegistryError};

/// Registry with a handler for every conversation step.
pub fn registry() -> Result<Registry, RegistryError> {
    Registry::builder()
        .register(start::InitialHandler)
        .register(verification::PlayerTagHandler)
        .register(rules::ClubRulesHandler)
        .register(rules::ChatRulesHandler)
        .register(menu::GuestMenuHandler)
        .register(menu::MemberMenuHandler)
        .register(admin::ViewSettingsHandler)
        .register(admin::EditSettingHandler)
        .register(language::LanguagePickerHandler)
        .build()
}
