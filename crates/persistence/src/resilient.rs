//! Remote-first execution with local fallback.

use metrics::counter;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::StoreError;

/// Runs store operations against the remote API first and falls back to the
/// local store.
///
/// A network failure or non-2xx response disables the remote for the rest of
/// the session. Any other error, including a missing token, is returned as is.
#[derive(Debug, Default)]
pub struct ResilientExecutor {
    remote_disabled: AtomicBool,
}

impl ResilientExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Executor that never attempts the remote.
    pub fn local_only() -> Self {
        Self {
            remote_disabled: AtomicBool::new(true),
        }
    }

    pub fn is_remote_disabled(&self) -> bool {
        self.remote_disabled.load(Ordering::Relaxed)
    }

    pub async fn run<T, R, RF, L, LF>(
        &self,
        operation: &str,
        remote: R,
        local: L,
    ) -> Result<T, StoreError>
    where
        R: FnOnce() -> RF,
        RF: Future<Output = Result<T, StoreError>>,
        L: FnOnce() -> LF,
        LF: Future<Output = Result<T, StoreError>>,
    {
        if self.is_remote_disabled() {
            return local().await;
        }

        match remote().await {
            Ok(value) => Ok(value),
            Err(e) if e.is_remote_failure() => {
                tracing::warn!(
                    operation = operation,
                    error = %e,
                    "Remote report API failed, switching to local storage for this session"
                );
                self.remote_disabled.store(true, Ordering::Relaxed);
                counter!("report_store_fallback_total", "operation" => operation.to_string())
                    .increment(1);
                local().await
            }
            Err(e) => Err(e),
        }
    }
}
