use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::UsersVotesConfig;
use crate::domain::ctx::CallCtx;
use crate::domain::service::Service;

/// Shared state handed to every handler through an `Extension`.
pub struct RestState {
    pub service: Arc<Service>,
    pub config: UsersVotesConfig,
    /// Server-wide shutdown token; each request runs under a child of it.
    pub shutdown: CancellationToken,
    pub request_timeout: Option<Duration>,
}

impl RestState {
    pub fn new(service: Arc<Service>, config: UsersVotesConfig) -> Self {
        Self {
            service,
            config,
            shutdown: CancellationToken::new(),
            request_timeout: None,
        }
    }

    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Fresh call context for one request.
    pub fn call_ctx(&self) -> CallCtx {
        let ctx = CallCtx::new(self.shutdown.child_token());
        match self.request_timeout {
            Some(timeout) => ctx.with_timeout(timeout),
            None => ctx,
        }
    }
}
