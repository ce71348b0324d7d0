//! Restarts failed units of work

use std::any::Any;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::error::is_fatal;
use crate::core::config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartPolicy {
    /// `None` restarts forever
    pub max_restarts: Option<u32>,
    /// Pause before each restart
    pub delay: Duration,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self {
            max_restarts: None,
            delay: config::fsm::restart_delay(),
        }
    }
}

impl RestartPolicy {
    pub fn limited(max_restarts: u32) -> Self {
        Self {
            max_restarts: Some(max_restarts),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Debug)]
pub enum SupervisionEnd {
    /// The unit returned `Ok(())`
    Completed,
    Cancelled,
    /// A configuration error that restarting cannot fix
    Fatal(anyhow::Error),
    /// `max_restarts` was exhausted
    GaveUp { last_error: anyhow::Error },
}

#[derive(Debug)]
pub struct SupervisionReport {
    pub restarts: u32,
    pub end: SupervisionEnd,
}

impl SupervisionReport {
    /// `Ok` for completion and cancellation, the stopping error otherwise.
    pub fn into_result(self) -> anyhow::Result<u32> {
        match self.end {
            SupervisionEnd::Completed | SupervisionEnd::Cancelled => Ok(self.restarts),
            SupervisionEnd::Fatal(err) => Err(err.context("fatal error, supervision stopped")),
            SupervisionEnd::GaveUp { last_error } => {
                Err(last_error.context(format!("gave up after {} restarts", self.restarts)))
            }
        }
    }
}

/// Runs a unit of work as a tokio task and relaunches it when it fails or
/// panics.
pub struct Supervisor {
    name: String,
    policy: RestartPolicy,
    cancel: CancellationToken,
}

impl Supervisor {
    pub fn new(name: impl Into<String>, policy: RestartPolicy, cancel: CancellationToken) -> Self {
        Self {
            name: name.into(),
            policy,
            cancel,
        }
    }

    /// Supervises the futures produced by `make`, one at a time.
    pub async fn run<F, Fut>(&self, mut make: F) -> SupervisionReport
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let mut restarts = 0;

        loop {
            if self.cancel.is_cancelled() {
                return self.report(restarts, SupervisionEnd::Cancelled);
            }

            let handle = tokio::spawn(make());
            let abort = handle.abort_handle();
            let joined = tokio::select! {
                joined = handle => joined,
                () = self.cancel.cancelled() => {
                    abort.abort();
                    return self.report(restarts, SupervisionEnd::Cancelled);
                }
            };

            let failure = match joined {
                Ok(Ok(())) => return self.report(restarts, SupervisionEnd::Completed),
                Ok(Err(err)) if is_fatal(&err) => {
                    log::error!("{} stopped by fatal error: {:#}", self.name, err);
                    return self.report(restarts, SupervisionEnd::Fatal(err));
                }
                Ok(Err(err)) => {
                    log::error!("{} failed: {:#}", self.name, err);
                    err
                }
                Err(join_err) if join_err.is_panic() => {
                    let message = panic_message(join_err.into_panic());
                    log::error!("{} panicked: {}", self.name, message);
                    anyhow::anyhow!("{} panicked: {}", self.name, message)
                }
                Err(join_err) => {
                    log::error!("{} was aborted: {}", self.name, join_err);
                    anyhow::Error::new(join_err)
                }
            };

            if self.policy.max_restarts.is_some_and(|max| restarts >= max) {
                log::error!("{} gave up after {} restarts", self.name, restarts);
                return self.report(restarts, SupervisionEnd::GaveUp { last_error: failure });
            }

            restarts += 1;
            log::warn!("Restarting {} (restart #{})", self.name, restarts);

            if !self.policy.delay.is_zero() {
                tokio::select! {
                    () = tokio::time::sleep(self.policy.delay) => {}
                    () = self.cancel.cancelled() => {
                        return self.report(restarts, SupervisionEnd::Cancelled);
                    }
                }
            }
        }
    }

    fn report(&self, restarts: u32, end: SupervisionEnd) -> SupervisionReport {
        log::info!("{} supervision finished after {} restarts", self.name, restarts);
        SupervisionReport { restarts, end }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
