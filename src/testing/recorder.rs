//! Messenger that records outbound messages instead of sending them

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::fsm::{ConversationContext, Messenger, OutboundMessage, SendError};

/// A message captured by [`RecordingMessenger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub context: ConversationContext,
    pub message: OutboundMessage,
}

/// Records every send. Can be told to fail upcoming sends.
#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<SentMessage>>,
    failures: AtomicUsize,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<SentMessage>> {
        // A test that panicked while recording leaves the log usable
        self.sent.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Makes the next `count` sends fail with [`SendError::Delivery`].
    pub fn fail_next(&self, count: usize) {
        self.failures.store(count, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.lock().clone()
    }

    /// Messages sent to one chat, oldest first.
    pub fn sent_to(&self, context: ConversationContext) -> Vec<OutboundMessage> {
        self.lock()
            .iter()
            .filter(|sent| sent.context == context)
            .map(|sent| sent.message.clone())
            .collect()
    }

    /// Texts sent to one chat, oldest first.
    pub fn texts(&self, context: ConversationContext) -> Vec<String> {
        self.sent_to(context).into_iter().map(|message| message.text).collect()
    }

    pub fn last(&self, context: ConversationContext) -> Option<OutboundMessage> {
        self.sent_to(context).pop()
    }

    /// Removes and returns everything recorded so far.
    pub fn take(&self) -> Vec<SentMessage> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send(&self, context: ConversationContext, message: OutboundMessage) -> Result<(), SendError> {
        let should_fail = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(SendError::delivery(context, "simulated delivery failure"));
        }

        self.lock().push(SentMessage { context, message });
        Ok(())
    }
}
