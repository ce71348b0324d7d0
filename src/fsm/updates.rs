//! The conversation loop: drains the inbound channel into the dispatcher.

use anyhow::Context;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use super::supervisor::{RestartPolicy, SupervisionReport, Supervisor};
use super::{Dispatcher, Inbound};

/// Receiving end of the update channel, shared by successive loop restarts.
pub type SharedReceiver = Arc<Mutex<mpsc::Receiver<Inbound>>>;

/// Creates the channel between the Telegram adapter and the conversation loop.
pub fn channel(capacity: usize) -> (mpsc::Sender<Inbound>, SharedReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (tx, Arc::new(Mutex::new(rx)))
}

/// Dispatches updates in arrival order until the channel closes.
///
/// The first dispatch error ends the loop; the update that caused it is not
/// retried.
pub async fn run_conversation_loop(dispatcher: Arc<Dispatcher>, updates: SharedReceiver) -> anyhow::Result<()> {
    let mut rx = updates.lock().await;

    while let Some(inbound) = rx.recv().await {
        let context = inbound.context;
        let outcome = dispatcher
            .dispatch(&inbound)
            .await
            .with_context(|| format!("dispatch failed for chat {}", context))?;
        log::debug!("Chat {}: {:?}", context, outcome);
    }

    log::info!("Update channel closed, conversation loop finished");
    Ok(())
}

/// Runs [`run_conversation_loop`] under a [`Supervisor`].
pub async fn supervise_conversations(
    dispatcher: Arc<Dispatcher>,
    updates: SharedReceiver,
    policy: RestartPolicy,
    cancel: CancellationToken,
) -> SupervisionReport {
    Supervisor::new("conversation loop", policy, cancel)
        .run(move || run_conversation_loop(Arc::clone(&dispatcher), Arc::clone(&updates)))
        .await
}
