use async_trait::async_trait;

use super::{Deps, EngineError, Inbound, State, StateKind};

/// `Some(state)` to continue (the same state means "wait for input"),
/// `None` to end the conversation.
pub type HookResult = Result<Option<State>, EngineError>;

/// Behaviour of one [`StateKind`].
///
/// Entry hooks run every time a state becomes current, including after a
/// crash, so they must be safe to repeat.
#[async_trait]
pub trait StateHandler: Send + Sync {
    fn kind(&self) -> StateKind;

    /// Runs when `state` becomes current. `previous` is `None` at the start
    /// of a conversation and after `/start`.
    async fn entry(&self, state: &State, previous: Option<&State>, deps: &Deps) -> HookResult;

    /// Interprets the next input addressed to `state`.
    async fn process(&self, state: &State, input: &Inbound, deps: &Deps) -> HookResult;
}

/// Keep `state` current and wait for input.
pub fn stay(state: &State) -> HookResult {
    Ok(Some(state.clone()))
}

/// Move on to `next`.
pub fn go(next: State) -> HookResult {
    Ok(Some(next))
}

/// End the conversation and forget its state.
pub fn end() -> HookResult {
    Ok(None)
}
