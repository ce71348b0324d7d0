use thiserror::Error;

use super::{ConversationContext, StateKind};
use crate::core::AppError;

/// Failures of a [`StateStore`](super::StateStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// A record exists but cannot be decoded. Never treated as "no record".
    #[error("stored state for chat {context} is corrupt: {reason}")]
    Corrupt { context: ConversationContext, reason: String },

    #[error("refusing to store a state of chat {found} under chat {expected}")]
    ContextMismatch {
        expected: ConversationContext,
        found: ConversationContext,
    },

    #[error("failed to encode state: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("state store backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Backend(Box::new(err))
    }
}

impl From<r2d2::Error> for StoreError {
    fn from(err: r2d2::Error) -> Self {
        Self::Backend(Box::new(err))
    }
}

/// Invalid handler registry. Always a startup error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("no handler registered for state kinds {0:?}")]
    Missing(Vec<StateKind>),

    #[error("more than one handler registered for state kind {0}")]
    Duplicate(StateKind),
}

/// Failure to deliver an outbound message.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("chat {0} blocked the bot")]
    Blocked(ConversationContext),

    #[error("failed to deliver message to chat {context}: {source}")]
    Delivery {
        context: ConversationContext,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl SendError {
    pub fn delivery(context: ConversationContext, source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Delivery {
            context,
            source: source.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no handler registered for state kind {0}")]
    Unregistered(StateKind),

    #[error("entry chain for chat {context} did not settle within {limit} states")]
    ChainTooLong { context: ConversationContext, limit: usize },

    #[error("handler for {expected} was given a {found} state")]
    StateMismatch { expected: StateKind, found: StateKind },

    #[error("hook for chat {expected} produced a state of chat {found}")]
    ForeignContext {
        expected: ConversationContext,
        found: ConversationContext,
    },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Send(#[from] SendError),

    #[error(transparent)]
    Storage(#[from] AppError),

    #[error("hook failed: {0:#}")]
    Hook(#[from] anyhow::Error),
}

impl EngineError {
    pub fn state_mismatch(expected: StateKind, state: &super::State) -> Self {
        Self::StateMismatch {
            expected,
            found: state.kind(),
        }
    }

    /// Configuration errors that restarting cannot fix.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Unregistered(_)
                | Self::ChainTooLong { .. }
                | Self::StateMismatch { .. }
                | Self::ForeignContext { .. }
                | Self::Registry(_)
        )
    }
}

impl From<rusqlite::Error> for EngineError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(AppError::from(err))
    }
}

impl From<r2d2::Error> for EngineError {
    fn from(err: r2d2::Error) -> Self {
        Self::Storage(AppError::from(err))
    }
}

/// True if any error in the chain is a fatal [`EngineError`].
pub fn is_fatal(err: &anyhow::Error) -> bool {
    err.chain()
        .any(|cause| cause.downcast_ref::<EngineError>().is_some_and(EngineError::is_fatal))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn classifies_fatal_errors() {
        assert!(EngineError::Unregistered(StateKind::Initial).is_fatal());
        assert!(EngineError::ChainTooLong {
            context: ConversationContext::new(1),
            limit: 32
        }
        .is_fatal());
        assert!(EngineError::from(RegistryError::Duplicate(StateKind::Initial)).is_fatal());

        assert!(!EngineError::Hook(anyhow::anyhow!("boom")).is_fatal());
        assert!(!EngineError::from(SendError::Blocked(ConversationContext::new(1))).is_fatal());
    }

    #[test]
    fn finds_fatal_errors_behind_context() {
        let fatal = Err::<(), _>(EngineError::Unregistered(StateKind::LanguagePicker))
            .context("dispatch failed for chat 7")
            .unwrap_err();
        assert!(is_fatal(&fatal));

        let transient = Err::<(), _>(EngineError::Hook(anyhow::anyhow!("db locked")))
            .context("dispatch failed for chat 7")
            .unwrap_err();
        assert!(!is_fatal(&transient));
    }

    #[test]
    fn corrupt_message_names_the_chat() {
        let err = StoreError::Corrupt {
            context: ConversationContext::new(9),
            reason: "unknown variant".to_string(),
        };
        assert_eq!(err.to_string(), "stored state for chat 9 is corrupt: unknown variant");
    }
}
