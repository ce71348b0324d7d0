use std::sync::Arc;

use super::fakes::{FixedClock, StaticDirectory};
use super::recorder::RecordingMessenger;
use crate::conversation;
use crate::core::{AppError, AppResult};
use crate::fsm::{
    ConversationContext, Deps, DispatchOutcome, Dispatcher, EngineError, Inbound, InMemoryStateStore, Registry,
    StateStore, TaskScope,
};
use crate::storage::db::{self, create_memory_pool, DbPool, User};
use crate::storage::settings::{self, SettingKey};

/// A dispatcher wired to in-memory fakes.
pub struct TestBench {
    pub dispatcher: Arc<Dispatcher>,
    pub messenger: Arc<RecordingMessenger>,
    pub players: Arc<StaticDirectory>,
    pub store: Arc<InMemoryStateStore>,
    pub db_pool: Arc<DbPool>,
}

pub struct TestBenchBuilder {
    admins: Vec<i64>,
    clock: FixedClock,
    registry: Option<Registry>,
    max_chain: Option<usize>,
}

impl TestBench {
    pub fn builder() -> TestBenchBuilder {
        TestBenchBuilder {
            admins: Vec::new(),
            clock: FixedClock::default(),
            registry: None,
            max_chain: None,
        }
    }

    /// Bench with the real conversation handlers and no admins.
    pub fn new() -> AppResult<Self> {
        Self::builder().build()
    }

    pub fn deps(&self) -> &Deps {
        self.dispatcher.deps()
    }

    /// Dispatches a text message (or `/command`) from `context`.
    pub async fn send(&self, context: ConversationContext, text: &str) -> Result<DispatchOutcome, EngineError> {
        self.dispatcher.dispatch(&Inbound::text(context, text)).await
    }

    /// The localized string `key` in the chat's current language.
    pub fn t(&self, context: ConversationContext, key: &str) -> String {
        self.deps().localizer.t(context, key)
    }

    pub async fn state(&self, context: ConversationContext) -> Result<crate::fsm::State, EngineError> {
        Ok(self.store.load(context).await?)
    }

    pub fn user(&self, context: ConversationContext) -> AppResult<Option<User>> {
        let conn = db::get_connection(&self.db_pool)?;
        Ok(db::get_user(&conn, context.chat_id())?)
    }

    pub fn set_setting(&self, key: SettingKey, value: &str) -> AppResult<()> {
        let conn = db::get_connection(&self.db_pool)?;
        settings::set_setting(&conn, key, value)?;
        Ok(())
    }
}

impl TestBenchBuilder {
    #[must_use]
    pub fn admins(mut self, admins: impl IntoIterator<Item = i64>) -> Self {
        self.admins = admins.into_iter().collect();
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: FixedClock) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the conversation handlers.
    #[must_use]
    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    #[must_use]
    pub fn max_chain(mut self, max_chain: usize) -> Self {
        self.max_chain = Some(max_chain);
        self
    }

    pub fn build(self) -> AppResult<TestBench> {
        let db_pool = Arc::new(create_memory_pool()?);
        let messenger = Arc::new(RecordingMessenger::new());
        let players = Arc::new(StaticDirectory::new());
        let store = Arc::new(InMemoryStateStore::new());

        let deps = Deps::new(
            messenger.clone(),
            players.clone(),
            Arc::new(self.clock),
            Arc::clone(&db_pool),
            TaskScope::new(),
            self.admins,
        );
        let registry = match self.registry {
            Some(registry) => registry,
            None => conversation::registry().map_err(|e| AppError::Validation(e.to_string()))?,
        };

        let mut dispatcher = Dispatcher::new(registry, store.clone(), deps);
        if let Some(max_chain) = self.max_chain {
            dispatcher = dispatcher.with_max_chain(max_chain);
        }

        Ok(TestBench {
            dispatcher: Arc::new(dispatcher),
            messenger,
            players,
            store,
            db_pool,
        })
    }
}
