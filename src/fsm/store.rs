//! Durable per-chat state
//!
//! A record holds the JSON of the chat's current [`State`]. Only a missing
//! record means "start over"; an unreadable one is a [`StoreError::Corrupt`].

use async_trait::async_trait;
use dashmap::DashMap;

use super::{ConversationContext, State, StoreError};

#[async_trait]
pub trait StateStore: Send + Sync {
    /// The committed state, or `Initial` if the chat has no record.
    async fn load(&self, context: ConversationContext) -> Result<State, StoreError>;

    /// Replaces the chat's record; `None` deletes it.
    async fn commit(&self, context: ConversationContext, state: Option<&State>) -> Result<(), StoreError>;
}

/// Serializes `state` for storage under `context`.
pub fn encode(context: ConversationContext, state: &State) -> Result<String, StoreError> {
    if state.context() != context {
        return Err(StoreError::ContextMismatch {
            expected: context,
            found: state.context(),
        });
    }
    serde_json::to_string(state).map_err(StoreError::Encode)
}

/// Parses a stored record, checking it belongs to `context`.
pub fn decode(context: ConversationContext, raw: &str) -> Result<State, StoreError> {
    let state: State = serde_json::from_str(raw).map_err(|e| StoreError::Corrupt {
        context,
        reason: e.to_string(),
    })?;
    if state.context() != context {
        return Err(StoreError::Corrupt {
            context,
            reason: format!("record belongs to chat {}", state.context()),
        });
    }
    Ok(state)
}

/// Process-local store for tests and ephemeral runs.
#[derive(Default)]
pub struct InMemoryStateStore {
    records: DashMap<ConversationContext, String>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a raw record without validation.
    pub fn insert_raw(&self, context: ConversationContext, raw: impl Into<String>) {
        self.records.insert(context, raw.into());
    }

    pub fn contains(&self, context: ConversationContext) -> bool {
        self.records.contains_key(&context)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn load(&self, context: ConversationContext) -> Result<State, StoreError> {
        // Clone out of the shard before decoding so no DashMap guard is held
        let raw = self.records.get(&context).map(|record| record.value().clone());
        match raw {
            Some(raw) => decode(context, &raw),
            None => Ok(State::initial(context)),
        }
    }

    async fn commit(&self, context: ConversationContext, state: Option<&State>) -> Result<(), StoreError> {
        match state {
            Some(state) => {
                let raw = encode(context, state)?;
                self.records.insert(context, raw);
            }
            None => {
                self.records.remove(&context);
            }
        }
        Ok(())
    }
}
