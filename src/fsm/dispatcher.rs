//! Routes inbound updates to state hooks and drives entry chains.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::Instrument;

use super::{ConversationContext, Deps, EngineError, Inbound, Registry, State, StateKind, StateStore};
use crate::core::config;

/// How a dispatch left the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A (possibly new) state was committed and waits for input.
    Waiting(StateKind),
    /// The process hook kept the current state; nothing was written.
    Unchanged(StateKind),
    /// The conversation ended and its record was deleted.
    Terminated,
}

pub struct Dispatcher {
    registry: Registry,
    store: Arc<dyn StateStore>,
    deps: Deps,
    locks: DashMap<ConversationContext, Arc<Mutex<()>>>,
    max_chain: usize,
}

impl Dispatcher {
    pub fn new(registry: Registry, store: Arc<dyn StateStore>, deps: Deps) -> Self {
        Self {
            registry,
            store,
            deps,
            locks: DashMap::new(),
            max_chain: config::fsm::MAX_ENTRY_CHAIN,
        }
    }

    /// Overrides the number of states one entry chain may visit.
    #[must_use]
    pub fn with_max_chain(mut self, max_chain: usize) -> Self {
        self.max_chain = max_chain.max(1);
        self
    }

    pub fn deps(&self) -> &Deps {
        &self.deps
    }

    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }

    /// Handles one update. Updates of the same chat are processed one at a time.
    pub async fn dispatch(&self, inbound: &Inbound) -> Result<DispatchOutcome, EngineError> {
        let span = self.deps.span(inbound.context);
        async {
            let lock = self.lock_for(inbound.context);
            let result = {
                let _guard = lock.lock().await;
                self.dispatch_locked(inbound).await
            };
            drop(lock);
            self.release(inbound.context);
            result
        }
        .instrument(span)
        .await
    }

    /// Restarts the conversation at `Initial` as if the user sent `/start`.
    pub async fn restart(&self, context: ConversationContext) -> Result<DispatchOutcome, EngineError> {
        let lock = self.lock_for(context);
        let result = {
            let _guard = lock.lock().await;
            self.run_entry_chain(context, State::initial(context), None).await
        };
        drop(lock);
        self.release(context);
        result
    }

    /// Number of chats with a dispatch in flight.
    pub fn active_conversations(&self) -> usize {
        self.locks.len()
    }

    fn lock_for(&self, context: ConversationContext) -> Arc<Mutex<()>> {
        Arc::clone(self.locks.entry(context).or_default().value())
    }

    /// Forgets the chat's lock once no dispatch holds or waits for it.
    fn release(&self, context: ConversationContext) {
        self.locks.remove_if(&context, |_, lock| Arc::strong_count(lock) == 1);
    }

    async fn dispatch_locked(&self, inbound: &Inbound) -> Result<DispatchOutcome, EngineError> {
        let context = inbound.context;

        if inbound.input.is_start() {
            log::info!("Chat {} sent /start, resetting conversation", context);
            return self.run_entry_chain(context, State::initial(context), None).await;
        }

        let current = self.store.load(context).await?;
        let handler = self.registry.handler(current.kind())?;
        let next = handler.process(&current, inbound, &self.deps).await?;

        match next {
            None => {
                self.store.commit(context, None).await?;
                log::info!("Conversation of chat {} ended in {}", context, current.kind());
                Ok(DispatchOutcome::Terminated)
            }
            Some(next) if next == current => Ok(DispatchOutcome::Unchanged(current.kind())),
            Some(next) => {
                log::debug!("Chat {}: {} -> {}", context, current.kind(), next.kind());
                self.run_entry_chain(context, next, Some(current)).await
            }
        }
    }

    /// Runs entry hooks from `start` until one keeps its own state or ends
    /// the conversation, then commits the result.
    async fn run_entry_chain(
        &self,
        context: ConversationContext,
        start: State,
        previous: Option<State>,
    ) -> Result<DispatchOutcome, EngineError> {
        let mut previous = previous;
        let mut current = start;

        for _ in 0..self.max_chain {
            ensure_context(context, &current)?;
            let handler = self.registry.handler(current.kind())?;

            match handler.entry(&current, previous.as_ref(), &self.deps).await? {
                None => {
                    self.store.commit(context, None).await?;
                    log::info!("Conversation of chat {} ended in {}", context, current.kind());
                    return Ok(DispatchOutcome::Terminated);
                }
                Some(next) if next == current => {
                    self.store.commit(context, Some(&current)).await?;
                    return Ok(DispatchOutcome::Waiting(current.kind()));
                }
                Some(next) => {
                    log::debug!("Chat {}: {} -> {}", context, current.kind(), next.kind());
                    previous = Some(std::mem::replace(&mut current, next));
                }
            }
        }

        log::error!(
            "Entry chain of chat {} exceeded {} states (last: {})",
            context,
            self.max_chain,
            current.kind()
        );
        Err(EngineError::ChainTooLong {
            context,
            limit: self.max_chain,
        })
    }
}

fn ensure_context(context: ConversationContext, state: &State) -> Result<(), EngineError> {
    if state.context() == context {
        Ok(())
    } else {
        Err(EngineError::ForeignContext {
            expected: context,
            found: state.context(),
        })
    }
}
