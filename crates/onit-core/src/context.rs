//! Request-scoped context passed explicitly to every operation.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{Error, Result};

/// Per-request identity, deadline and cancellation signal.
///
/// Every [`AuthService`] and store operation takes a `&RequestContext`.
/// Store implementations wrap their work in [`RequestContext::run`], so an
/// expired deadline or a cancelled request aborts the operation with a
/// server-class error instead of leaving it running in the background.
///
/// [`AuthService`]: crate::AuthService
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: Uuid,
    deadline: Option<Instant>,
    cancellation: CancellationToken,
}

impl RequestContext {
    /// Creates a context with a fresh request id and no deadline.
    pub fn new() -> Self {
        Self {
            request_id: Uuid::now_v7(),
            deadline: None,
            cancellation: CancellationToken::new(),
        }
    }

    /// Sets the request id, usually propagated from the transport layer.
    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = request_id;
        self
    }

    /// Sets a deadline relative to now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Sets an absolute deadline.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Ties this context to an existing cancellation token.
    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    #[inline]
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    #[inline]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns whether the request was cancelled.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Cancels the request and every operation running under it.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Drives `future` to completion unless the request is cancelled or its
    /// deadline passes first.
    pub async fn run<T, F>(&self, future: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.is_cancelled() {
            return Err(Error::server("request cancelled"));
        }
        if let Some(deadline) = self.deadline
            && Instant::now() >= deadline
        {
            return Err(Error::server("deadline exceeded"));
        }

        let deadline = self.deadline;
        let expired = async move {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancellation.cancelled() => Err(Error::server("request cancelled")),
            _ = expired => Err(Error::server("deadline exceeded")),
            result = future => result,
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[tokio::test]
    async fn run_completes_without_deadline() -> anyhow::Result<()> {
        let ctx = RequestContext::new();
        let value = ctx.run(async { Ok(7) }).await?;
        assert_eq!(value, 7);
        Ok(())
    }

    #[tokio::test]
    async fn run_aborts_after_deadline() {
        let ctx = RequestContext::new().with_timeout(Duration::from_millis(10));
        let error = ctx
            .run(std::future::pending::<Result<()>>())
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Server);
        assert_eq!(error.message(), "deadline exceeded");
    }

    #[tokio::test]
    async fn run_aborts_when_cancelled() {
        let ctx = RequestContext::new();
        ctx.cancel();

        let error = ctx.run(async { Ok(()) }).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Server);
        assert_eq!(error.message(), "request cancelled");
    }

    #[tokio::test]
    async fn run_propagates_operation_errors() {
        let ctx = RequestContext::new().with_timeout(Duration::from_secs(5));
        let error = ctx
            .run(async { Err::<(), _>(Error::user_not_found()) })
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::NotFound);
    }
}
