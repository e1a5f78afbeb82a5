//! One-shot cancellation signal (`spec.md` §4.1, §5).
//!
//! Every `stream` call hands back a `CancelHandle`; closing it obliges the producer
//! to stop emitting within finite time and to forward cancellation to any upstream
//! streams it opened. `tokio_util::sync::CancellationToken` already has exactly this
//! parent-cancels-children shape via `child_token()`, so each operator calls
//! `cancel.child()` once per upstream it opens rather than hand-rolling a broadcast.

use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct CancelHandle(CancellationToken);

impl CancelHandle {
    pub fn new() -> Self {
        CancelHandle(CancellationToken::new())
    }

    /// A handle linked to this one: cancelling `self` cancels the child too, but
    /// cancelling the child alone leaves `self` (and any sibling children) untouched.
    pub fn child(&self) -> Self {
        CancelHandle(self.0.child_token())
    }

    pub fn cancel(&self) {
        self.0.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.is_cancelled()
    }

    /// Resolves once this handle (or an ancestor of it) has been cancelled. Meant to
    /// be raced in a `tokio::select!` alongside sends/receives, per `spec.md` §5's
    /// "suspension points" rule.
    pub async fn cancelled(&self) {
        self.0.cancelled().await;
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}
