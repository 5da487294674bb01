//! Cancellation for conversation turns

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::Notify;

/// Shared cancellation flag
///
/// Clones share state. A [`child_token`](Self::child_token) is cancelled
/// together with its parent but can also be cancelled on its own, which is
/// how a single turn is stopped without touching the session token.
#[derive(Clone, Default)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    state: Mutex<State>,
    notify: Notify,
}

#[derive(Default)]
struct State {
    cancelled: bool,
    children: Vec<Weak<Inner>>,
}

impl Inner {
    fn cancel(&self) {
        let children = {
            let mut state = self.state.lock();
            if state.cancelled {
                return;
            }
            state.cancelled = true;
            std::mem::take(&mut state.children)
        };
        self.notify.notify_waiters();

        for child in children.iter().filter_map(Weak::upgrade) {
            child.cancel();
        }
    }
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.state.lock().cancelled
    }

    /// Request cancellation of this token and every child. Idempotent.
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    /// A token cancelled whenever this one is
    pub fn child_token(&self) -> CancellationToken {
        let child = CancellationToken::new();
        {
            let mut state = self.inner.state.lock();
            if !state.cancelled {
                state.children.retain(|c| c.strong_count() > 0);
                state.children.push(Arc::downgrade(&child.inner));
                return child;
            }
        }
        child.cancel();
        child
    }

    /// Wait until cancellation is requested
    pub async fn cancelled(&self) {
        // notify_waiters only reaches futures that exist, so create it before
        // checking the flag
        let notified = self.inner.notify.notified();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("is_cancelled", &self.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_cancel_is_shared_and_idempotent() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());

        token.cancel();
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_child_follows_parent_only() {
        let session = CancellationToken::new();
        let turn = session.child_token();

        turn.cancel();
        assert!(turn.is_cancelled());
        assert!(!session.is_cancelled());

        let next_turn = session.child_token();
        session.cancel();
        assert!(next_turn.is_cancelled());

        // children of a cancelled token start cancelled
        assert!(session.child_token().is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_wakes_waiter() {
        let token = CancellationToken::new();
        let child = token.child_token();

        let waiter = tokio::spawn(async move {
            child.cancelled().await;
            "stopped"
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        token.cancel();
        assert_eq!(waiter.await.unwrap(), "stopped");
    }

    #[tokio::test]
    async fn test_already_cancelled_returns_immediately() {
        let token = CancellationToken::new();
        token.cancel();
        tokio::time::timeout(Duration::from_millis(100), token.cancelled())
            .await
            .expect("cancelled() should not block");
    }
}
