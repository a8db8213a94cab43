use std::fmt::Debug;

use tokio_util::sync::CancellationToken;

/// Handle of a registered event listener.
///
/// Releasing happens at most once: either by calling [`Subscription::unsubscribe`]
/// or when the handle is dropped. Further calls are no-ops.
pub struct Subscription {
    ended: CancellationToken,
    id: u64,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(id: u64, release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            ended: CancellationToken::new(),
            id,
            release: Some(Box::new(release)),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Cancelled by the host once no more events will arrive, e.g. after the
    /// connection dropped. Unsubscribing does not cancel it.
    pub fn ended(&self) -> CancellationToken {
        self.ended.clone()
    }

    pub fn is_active(&self) -> bool {
        self.release.is_some()
    }

    pub fn unsubscribe(&mut self) {
        match self.release.take() {
            Some(release) => {
                tracing::debug!("releasing subscription {}", self.id);
                release();
            }
            None => tracing::trace!("subscription {} already released", self.id),
        }
    }
}

impl Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use super::Subscription;

    #[test]
    fn unsubscribe_twice_releases_once() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = released.clone();
        let mut subscription = Subscription::new(7, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        subscription.unsubscribe();
        subscription.unsubscribe();

        assert!(!subscription.is_active());
        assert_eq!(1, released.load(Ordering::SeqCst));
    }

    #[test]
    fn drop_releases_active_subscription() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = released.clone();
        let subscription = Subscription::new(1, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        drop(subscription);

        assert_eq!(1, released.load(Ordering::SeqCst));
    }

    #[test]
    fn unsubscribe_does_not_end_subscription() {
        let mut subscription = Subscription::new(3, || {});
        let ended = subscription.ended();

        subscription.unsubscribe();

        assert!(!ended.is_cancelled());
    }

    #[test]
    fn drop_after_unsubscribe_does_not_release_again() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = released.clone();
        let mut subscription = Subscription::new(1, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        subscription.unsubscribe();
        drop(subscription);

        assert_eq!(1, released.load(Ordering::SeqCst));
    }
}
