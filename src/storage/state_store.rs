//! SQLite-backed conversation state store

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};
use std::sync::Arc;

use crate::fsm::store::{decode, encode};
use crate::fsm::{ConversationContext, State, StateStore, StoreError};
use crate::storage::db::DbPool;

/// Stores one row per chat in `conversation_states`.
pub struct SqliteStateStore {
    pool: Arc<DbPool>,
}

impl SqliteStateStore {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    /// Number of chats with a stored state.
    pub fn count(&self) -> Result<u64, StoreError> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM conversation_states", [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

#[async_trait]
impl StateStore for SqliteStateStore {
    async fn load(&self, context: ConversationContext) -> Result<State, StoreError> {
        let conn = self.pool.get()?;
        let raw: Option<String> = conn
            .query_row(
                "SELECT state FROM conversation_states WHERE chat_id = ?1",
                [context.chat_id()],
                |row| row.get(0),
            )
            .optional()?;

        match raw {
            Some(raw) => decode(context, &raw),
            None => Ok(State::initial(context)),
        }
    }

    async fn commit(&self, context: ConversationContext, state: Option<&State>) -> Result<(), StoreError> {
        let conn = self.pool.get()?;
        match state {
            Some(state) => {
                let raw = encode(context, state)?;
                conn.execute(
                    "INSERT INTO conversation_states (chat_id, kind, state) VALUES (?1, ?2, ?3)
                     ON CONFLICT(chat_id) DO UPDATE SET
                        kind = excluded.kind,
                        state = excluded.state,
                        updated_at = CURRENT_TIMESTAMP",
                    params![context.chat_id(), state.kind().as_ref(), raw],
                )?;
            }
            None => {
                conn.execute(
                    "DELETE FROM conversation_states WHERE chat_id = ?1",
                    [context.chat_id()],
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fsm::ReturnTo;
    use crate::storage::db::{create_memory_pool, create_pool};
    use pretty_assertions::assert_eq;

    const CTX: ConversationContext = ConversationContext::new(3);

    fn store() -> SqliteStateStore {
        SqliteStateStore::new(Arc::new(create_memory_pool().unwrap()))
    }

    #[tokio::test]
    async fn upserts_single_row_per_chat() {
        let store = store();
        store
            .commit(CTX, Some(&State::GuestMainMenu { context: CTX }))
            .await
            .unwrap();
        let picker = State::LanguagePicker {
            context: CTX,
            return_to: ReturnTo::GuestMainMenu,
        };
        store.commit(CTX, Some(&picker)).await.unwrap();

        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.load(CTX).await.unwrap(), picker);
    }

    #[tokio::test]
    async fn delete_on_none() {
        let store = store();
        store
            .commit(CTX, Some(&State::MemberMainMenu { context: CTX }))
            .await
            .unwrap();
        store.commit(CTX, None).await.unwrap();

        assert_eq!(store.count().unwrap(), 0);
        assert_eq!(store.load(CTX).await.unwrap(), State::initial(CTX));
    }

    #[tokio::test]
    async fn undecodable_row_is_corrupt() {
        let store = store();
        {
            let conn = store.pool.get().unwrap();
            conn.execute(
                "INSERT INTO conversation_states (chat_id, kind, state) VALUES (?1, 'Initial', '{broken')",
                [CTX.chat_id()],
            )
            .unwrap();
        }
        assert!(matches!(store.load(CTX).await, Err(StoreError::Corrupt { .. })));
    }

    #[tokio::test]
    async fn survives_reopening_the_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("states.sqlite");
        let path = path.to_str().unwrap();
        let state = State::AdminViewSettings { context: CTX };

        SqliteStateStore::new(Arc::new(create_pool(path).unwrap()))
            .commit(CTX, Some(&state))
            .await
            .unwrap();

        let reopened = SqliteStateStore::new(Arc::new(create_pool(path).unwrap()));
        assert_eq!(reopened.load(CTX).await.unwrap(), state);
    }
}
