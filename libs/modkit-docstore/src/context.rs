use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::StoreError;

/// Per-call operation context carrying the caller's cancellation signal.
#[derive(Debug, Clone, Default)]
pub struct OpContext {
    cancel: CancellationToken,
}

impl OpContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// A context cancelled together with this one, but cancellable on its own.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            cancel: self.cancel.child_token(),
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Drive a store call, abandoning it if the context is cancelled first.
    ///
    /// # Errors
    /// Returns [`StoreError::Cancelled`] on cancellation, otherwise the call's own result.
    pub async fn run<T, F>(&self, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(StoreError::Cancelled),
            res = call => res,
        }
    }
}
