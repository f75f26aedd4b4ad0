use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;

use crate::models::CartRecord;
use crate::session::repository::CartRepository;

/// Mirrors every cart snapshot to the local cache and the remote store, and
/// restores from them on login. Writes never interrupt the mutation that
/// produced them: failures are logged and the session's in-memory cart stays
/// the source of truth.
pub struct PersistenceMirror {
    local: Arc<dyn CartRepository>,
    remote: Arc<dyn CartRepository>,
    retry_delay: Duration,
    /// Completion of the most recently scheduled background save. Each new
    /// save awaits it before writing, so snapshots reach the sinks in
    /// mutation order even when an earlier write is slow.
    last_done: Mutex<Option<oneshot::Receiver<()>>>,
}

impl PersistenceMirror {
    pub fn new(local: Arc<dyn CartRepository>, remote: Arc<dyn CartRepository>) -> Self {
        Self {
            local,
            remote,
            retry_delay: Duration::from_millis(250),
            last_done: Mutex::new(None),
        }
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Cart for `email` at login. The remote record wins; a failed or empty
    /// remote fetch falls back to the local cache; neither means an empty
    /// cart.
    pub async fn restore(&self, email: &str) -> CartRecord {
        match self.remote.load(email).await {
            Ok(Some(record)) => return record,
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(error = %err, "remote cart fetch failed, trying the local cache");
            }
        }

        match self.local.load(email).await {
            Ok(Some(record)) => record,
            Ok(None) => CartRecord::empty(),
            Err(err) => {
                tracing::warn!(error = %err, "local cart cache unreadable");
                CartRecord::empty()
            }
        }
    }

    /// Persist a snapshot without blocking the caller. Dropping the returned
    /// handle detaches the write.
    pub async fn save_background(&self, email: &str, record: CartRecord) -> JoinHandle<()> {
        let local = Arc::clone(&self.local);
        let remote = Arc::clone(&self.remote);
        let retry_delay = self.retry_delay;
        let email = email.to_string();

        let (done, next) = oneshot::channel();
        let previous = self.last_done.lock().await.replace(next);

        tokio::spawn(async move {
            // A dropped sender still completes the receiver, so a cancelled
            // predecessor cannot stall the chain.
            if let Some(previous) = previous {
                let _ = previous.await;
            }
            if let Err(err) = local.save(&email, &record).await {
                tracing::warn!(error = %err, "local cart save failed");
            }
            save_remote(remote.as_ref(), &email, &record, retry_delay).await;
            let _ = done.send(());
        })
    }

    /// Flush a snapshot and wait for it, draining any saves still in flight
    /// first. Errors are logged, never returned.
    pub async fn flush(&self, email: &str, record: &CartRecord) {
        let previous = self.last_done.lock().await.take();
        if let Some(previous) = previous {
            let _ = previous.await;
        }

        if let Err(err) = self.local.save(email, record).await {
            tracing::warn!(error = %err, "local cart save failed");
        }
        save_remote(self.remote.as_ref(), email, record, self.retry_delay).await;
    }
}

// Remote saves get exactly one retry, then the snapshot is dropped.
async fn save_remote(
    remote: &dyn CartRepository,
    email: &str,
    record: &CartRecord,
    retry_delay: Duration,
) {
    let first = match remote.save(email, record).await {
        Ok(()) => return,
        Err(err) => err,
    };
    tracing::warn!(error = %first, "remote cart save failed, retrying once");

    tokio::time::sleep(retry_delay).await;
    if let Err(err) = remote.save(email, record).await {
        tracing::warn!(error = %err, "remote cart save failed after retry, dropping snapshot");
    }
}
