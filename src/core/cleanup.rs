//! Compensating actions for multi-step operations
//!
//! Operations that touch both the entity store and the file store register
//! the file removals they need on a [`Cleanup`] list, then hand the final
//! outcome to [`Cleanup::finish`]:
//!
//! - on failure, files registered with [`Cleanup::on_failure`] are removed
//!   (e.g. a PDF saved before its record write failed);
//! - on success, files registered with [`Cleanup::on_success`] are removed
//!   (e.g. images of a deleted property).
//!
//! Removal failures are logged and never change the outcome. A list dropped
//! without `finish` (cancelled request) runs its failure actions in the
//! background. When the last step may commit after the caller is cancelled
//! (a database write already sent), use [`Cleanup::finish_detached`] so the
//! actions follow the real outcome.

use crate::core::error::{EstateError, EstateResult};
use crate::core::files::FileStore;
use std::sync::Arc;

/// Summary of one cleanup run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: Vec<String>,
    pub missing: Vec<String>,
    pub failed: Vec<String>,
}

/// Ordered list of file removals tied to an operation outcome
pub struct Cleanup {
    files: Arc<dyn FileStore>,
    context: String,
    on_failure: Vec<String>,
    on_success: Vec<String>,
    finished: bool,
}

impl Cleanup {
    pub fn new(files: Arc<dyn FileStore>, context: impl Into<String>) -> Self {
        Self {
            files,
            context: context.into(),
            on_failure: Vec::new(),
            on_success: Vec::new(),
            finished: false,
        }
    }

    /// Remove `path` if the operation fails
    pub fn on_failure(&mut self, path: impl Into<String>) -> &mut Self {
        self.on_failure.push(path.into());
        self
    }

    /// Remove `path` once the operation has succeeded
    pub fn on_success(&mut self, path: impl Into<String>) -> &mut Self {
        self.on_success.push(path.into());
        self
    }

    /// Run the actions matching `outcome` and pass it through unchanged
    pub async fn finish<T>(self, outcome: EstateResult<T>) -> EstateResult<T> {
        self.finish_with_report(outcome).await.0
    }

    /// Run `operation` to completion in its own task, then [`finish`](Self::finish).
    ///
    /// Dropping the returned future does not cancel `operation`, so a
    /// cancelled caller never removes files the operation went on to use.
    pub async fn finish_detached<T, F>(self, operation: F) -> EstateResult<T>
    where
        T: Send + 'static,
        F: Future<Output = EstateResult<T>> + Send + 'static,
    {
        let context = self.context.clone();
        tokio::spawn(async move {
            let outcome = operation.await;
            self.finish(outcome).await
        })
        .await
        .map_err(|e| {
            tracing::error!(context = %context, error = %e, "detached operation did not complete");
            EstateError::Internal(format!("{}: {}", context, e))
        })?
    }

    /// Like [`finish`](Self::finish), also returning what was removed
    pub async fn finish_with_report<T>(
        mut self,
        outcome: EstateResult<T>,
    ) -> (EstateResult<T>, CleanupReport) {
        self.finished = true;
        let paths = if outcome.is_ok() {
            std::mem::take(&mut self.on_success)
        } else {
            std::mem::take(&mut self.on_failure)
        };
        let report = run_removals(self.files.as_ref(), &self.context, paths).await;
        (outcome, report)
    }
}

impl Drop for Cleanup {
    fn drop(&mut self) {
        if self.finished || self.on_failure.is_empty() {
            return;
        }
        let paths = std::mem::take(&mut self.on_failure);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let files = self.files.clone();
                let context = self.context.clone();
                handle.spawn(async move {
                    run_removals(files.as_ref(), &context, paths).await;
                });
            }
            Err(_) => {
                tracing::warn!(context = %self.context, ?paths, "cleanup dropped outside a runtime, files left in place");
            }
        }
    }
}

async fn run_removals(files: &dyn FileStore, context: &str, paths: Vec<String>) -> CleanupReport {
    let mut report = CleanupReport::default();
    for path in paths {
        match files.delete(&path).await {
            Ok(true) => {
                tracing::debug!(context, path = %path, "removed file");
                report.removed.push(path);
            }
            Ok(false) => {
                tracing::debug!(context, path = %path, "file already removed");
                report.missing.push(path);
            }
            Err(e) => {
                tracing::warn!(context, path = %path, error = %e, "failed to remove file");
                report.failed.push(path);
            }
        }
    }
    report
}
