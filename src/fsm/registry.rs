use std::collections::HashMap;
use std::sync::Arc;
use strum::IntoEnumIterator;

use super::{EngineError, RegistryError, StateHandler, StateKind};

/// Handler for every [`StateKind`], validated once at startup.
pub struct Registry {
    handlers: HashMap<StateKind, Arc<dyn StateHandler>>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn handler(&self, kind: StateKind) -> Result<&Arc<dyn StateHandler>, EngineError> {
        self.handlers.get(&kind).ok_or(EngineError::Unregistered(kind))
    }

    pub fn contains(&self, kind: StateKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[derive(Default)]
pub struct RegistryBuilder {
    handlers: Vec<Arc<dyn StateHandler>>,
}

impl RegistryBuilder {
    #[must_use]
    pub fn register(self, handler: impl StateHandler + 'static) -> Self {
        self.register_arc(Arc::new(handler))
    }

    #[must_use]
    pub fn register_arc(mut self, handler: Arc<dyn StateHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Builds the registry, requiring exactly one handler per kind.
    pub fn build(self) -> Result<Registry, RegistryError> {
        let registry = self.build_partial()?;

        let missing: Vec<StateKind> = StateKind::iter().filter(|kind| !registry.contains(*kind)).collect();
        if !missing.is_empty() {
            return Err(RegistryError::Missing(missing));
        }
        Ok(registry)
    }

    /// Like [`build`](Self::build) but allows kinds without a handler.
    /// Dispatching to such a kind fails with [`EngineError::Unregistered`].
    pub fn build_partial(self) -> Result<Registry, RegistryError> {
        let mut handlers = HashMap::with_capacity(self.handlers.len());
        for handler in self.handlers {
            let kind = handler.kind();
            if handlers.insert(kind, handler).is_some() {
                return Err(RegistryError::Duplicate(kind));
            }
        }
        Ok(Registry { handlers })
    }
}
