//! One-shot session expiry task

use log::info;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use super::context::SessionContext;
use crate::error::SESSION_EXPIRED_NOTICE;
use crate::prompt::Prompt;

/// Guard over the background task that ends a session when its window runs
/// out. Dropping the guard cancels the task.
#[derive(Debug)]
pub struct ExpiryTimer {
    handle: JoinHandle<()>,
    expires_at_epoch_ms: i64,
}

impl ExpiryTimer {
    /// Spawn the task. It fires once, after `after`, and is never re-armed.
    /// Must be called from within a tokio runtime.
    pub(crate) fn arm(
        context: Arc<SessionContext>,
        prompt: Arc<dyn Prompt>,
        after: Duration,
        expires_at_epoch_ms: i64,
    ) -> Self {
        let handle = tokio::spawn(async move {
            sleep(after).await;
            if context.expire(expires_at_epoch_ms) {
                info!("session expired");
                prompt.notify(SESSION_EXPIRED_NOTICE).await;
            }
        });

        Self {
            handle,
            expires_at_epoch_ms,
        }
    }

    /// The expiry this timer was armed for
    pub fn expires_at_epoch_ms(&self) -> i64 {
        self.expires_at_epoch_ms
    }

    /// Whether the task has already fired (or been cancelled)
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ExpiryTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
