use std::future::Future;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use super::supervisor::{RestartPolicy, SupervisionEnd, Supervisor};

/// Launcher for background work that outlives a single hook call.
///
/// Every task is tracked so [`shutdown`](Self::shutdown) can cancel and
/// await all of them.
#[derive(Clone, Default)]
pub struct TaskScope {
    tracker: TaskTracker,
    cancel: CancellationToken,
}

impl TaskScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancelled when the scope shuts down.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Runs `make` under a [`Supervisor`] in the background.
    pub fn spawn_supervised<F, Fut>(&self, name: impl Into<String>, policy: RestartPolicy, make: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let supervisor = Supervisor::new(name, policy, self.cancel.child_token());
        self.tracker.spawn(async move {
            let report = supervisor.run(make).await;
            if let SupervisionEnd::Fatal(err) | SupervisionEnd::GaveUp { last_error: err } = &report.end {
                log::error!("Background task stopped after {} restarts: {:#}", report.restarts, err);
            }
        });
    }

    /// Number of tasks still running.
    pub fn len(&self) -> usize {
        self.tracker.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracker.is_empty()
    }

    /// Cancels every task and waits for them to finish.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        self.tracker.close();
        self.tracker.wait().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn supervised_task_is_restarted_until_it_succeeds() {
        let scope = TaskScope::new();
        let runs = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&runs);

        scope.spawn_supervised("flaky", RestartPolicy::default(), move || {
            let run = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if run < 2 {
                    anyhow::bail!("attempt {run} failed");
                }
                Ok(())
            }
        });

        tokio::time::timeout(Duration::from_secs(5), async {
            while !scope.is_empty() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 3);
        scope.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_cancels_long_running_tasks() {
        let scope = TaskScope::new();
        scope.spawn_supervised("forever", RestartPolicy::default(), || async {
            std::future::pending::<()>().await;
            Ok::<(), anyhow::Error>(())
        });
        assert_eq!(scope.len(), 1);

        scope.shutdown().await;
        assert!(scope.is_empty());
        assert!(scope.cancel_token().is_cancelled());
    }
}
