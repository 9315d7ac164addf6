//! Per-call execution context.
//!
//! Every service operation receives a [`CallCtx`] and runs each storage call
//! through [`CallCtx::guard`]. When the token fires or the deadline passes the
//! pending storage future is dropped, which aborts the outstanding query.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::domain::error::DomainError;

#[derive(Debug, Clone, Default)]
pub struct CallCtx {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl CallCtx {
    /// Context bound to an externally owned token (request or shutdown scope).
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            deadline: None,
        }
    }

    /// Context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Keeps the earlier of the current and the given deadline.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) if current < deadline => current,
            _ => deadline,
        });
        self
    }

    /// Child context: cancelled with the parent, cancellable on its own.
    pub fn child(&self) -> Self {
        Self {
            cancel: self.cancel.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fails fast when the context is already cancelled or expired.
    pub fn ensure_active(&self) -> Result<(), DomainError> {
        if self.cancel.is_cancelled() {
            return Err(DomainError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(DomainError::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Race `fut` against cancellation and the deadline.
    pub async fn guard<F>(&self, fut: F) -> Result<F::Output, DomainError>
    where
        F: Future,
    {
        self.ensure_active()?;

        let cancellable = async {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Err(DomainError::Cancelled),
                out = fut => Ok(out),
            }
        };

        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, cancellable)
                .await
                .unwrap_or(Err(DomainError::DeadlineExceeded)),
            None => cancellable.await,
        }
    }
}
