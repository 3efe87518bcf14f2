use anyhow::Context;
use tokio::{sync::watch, task::JoinHandle};

/// Handle of the running dispatcher loop. Dropping the handle stops the loop as well, but
/// doesn't wait for it.
#[derive(Debug)]
pub struct DispatcherHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl DispatcherHandle {
    pub(super) fn new(shutdown_tx: watch::Sender<bool>, task: JoinHandle<()>) -> Self {
        Self { shutdown_tx, task }
    }

    /// Signals the loop to stop and waits until the in-flight deliveries are recorded.
    pub async fn shutdown(self) -> anyhow::Result<()> {
        self.shutdown_tx.send_replace(true);
        self.task
            .await
            .with_context(|| "Reminder dispatcher task failed.")
    }
}
