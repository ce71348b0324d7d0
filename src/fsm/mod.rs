//! Conversation engine
//!
//! Every chat has exactly one current [`State`]. The [`Dispatcher`] routes
//! each [`Inbound`] update to the current state's [`StateHandler`], follows
//! entry hooks until the conversation settles and commits the result to a
//! [`StateStore`]. The conversation loop runs under a [`Supervisor`] that
//! relaunches it after failures.

pub mod context;
pub mod deps;
pub mod dispatcher;
pub mod error;
pub mod hooks;
pub mod input;
pub mod registry;
pub mod state;
pub mod store;
pub mod supervisor;
pub mod tasks;
pub mod updates;

pub use context::ConversationContext;
pub use deps::{Clock, Deps, Keyboard, Messenger, OutboundMessage, SystemClock};
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use error::{EngineError, RegistryError, SendError, StoreError};
pub use hooks::{end, go, stay, HookResult, StateHandler};
pub use input::{Inbound, Input};
pub use registry::{Registry, RegistryBuilder};
pub use state::{ReturnTo, State, StateKind};
pub use store::{InMemoryStateStore, StateStore};
pub use supervisor::{RestartPolicy, SupervisionEnd, SupervisionReport, Supervisor};
pub use tasks::TaskScope;
pub use updates::{channel, run_conversation_loop, supervise_conversations, SharedReceiver};
