//! Change notification for resource caches.
//!
//! The notification system provides:
//! - A generation counter bumped on every cache update ([`Notifier`])
//! - Owned subscriptions that remember what they last saw ([`Watch`])
//!
//! A waiter registers the last generation it observed. If the notifier has
//! already moved past it, the wait completes immediately; otherwise the
//! waiter parks on a oneshot channel until the next [`Notifier::notify`].
//! Registration and the generation bump happen under the same lock, so a
//! notify racing a registration is never lost.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use tracing::trace;

/// Unique identifier for a registered waiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct WatchId(u64);

impl WatchId {
    /// Create a new unique watch ID.
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for WatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "watch-{}", self.0)
    }
}

#[derive(Debug)]
struct Waiter {
    id: WatchId,
    sender: oneshot::Sender<u64>,
}

#[derive(Debug, Default)]
struct State {
    generation: u64,
    waiters: Vec<Waiter>,
}

enum Registration {
    Ready(u64),
    Pending(WatchId, oneshot::Receiver<u64>),
}

/// Broadcast wakeup for every waiter of one cache.
///
/// Every call to [`notify`](Self::notify) wakes all waiters registered at
/// that moment; there is no coalescing. Waiters re-register to hear about
/// the next change.
#[derive(Debug, Default)]
pub struct Notifier {
    state: Mutex<State>,
}

impl Notifier {
    /// Create a notifier at generation zero.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // The state is a counter and a list of senders; neither is left
        // half-written by a panic.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The number of notifications fired so far.
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Number of waiters currently parked.
    pub fn waiter_count(&self) -> usize {
        self.lock()
            .waiters
            .iter()
            .filter(|w| !w.sender.is_closed())
            .count()
    }

    /// Advance the generation and wake every parked waiter.
    ///
    /// Returns the number of waiters woken.
    pub fn notify(&self) -> usize {
        let (generation, waiters) = {
            let mut state = self.lock();
            state.generation += 1;
            (state.generation, std::mem::take(&mut state.waiters))
        };

        // A failed send means the waiter was cancelled after registering.
        let woken = waiters
            .into_iter()
            .map(|w| w.sender.send(generation).is_ok())
            .filter(|sent| *sent)
            .count();

        trace!(generation, woken, "notified waiters");
        woken
    }

    fn register(&self, seen: u64) -> Registration {
        let mut state = self.lock();
        if state.generation > seen {
            return Registration::Ready(state.generation);
        }

        state.waiters.retain(|w| !w.sender.is_closed());

        let id = WatchId::next();
        let (sender, receiver) = oneshot::channel();
        state.waiters.push(Waiter { id, sender });
        trace!(watch_id = %id, seen, "registered waiter");

        Registration::Pending(id, receiver)
    }

    /// Wait for a generation newer than `seen`.
    ///
    /// Returns immediately if one has already been reached. Dropping the
    /// returned future cancels the wait.
    pub async fn wait(&self, seen: u64) -> u64 {
        loop {
            match self.register(seen) {
                Registration::Ready(generation) => return generation,
                Registration::Pending(_, receiver) => {
                    if let Ok(generation) = receiver.await {
                        return generation;
                    }
                }
            }
        }
    }

    /// Like [`wait`](Self::wait), but gives up when `cancel` completes.
    ///
    /// Returns `None` if cancelled. The waiter is deregistered before
    /// returning.
    pub async fn wait_or_cancel<F>(&self, seen: u64, cancel: F) -> Option<u64>
    where
        F: Future,
    {
        tokio::pin!(cancel);
        loop {
            let (id, receiver) = match self.register(seen) {
                Registration::Ready(generation) => return Some(generation),
                Registration::Pending(id, receiver) => (id, receiver),
            };

            tokio::select! {
                biased;
                woken = receiver => {
                    if let Ok(generation) = woken {
                        return Some(generation);
                    }
                }
                _ = &mut cancel => {
                    self.cancel(id);
                    return None;
                }
            }
        }
    }

    /// Remove a parked waiter.
    ///
    /// A waiter that was already woken is no longer registered; that is
    /// not an error.
    fn cancel(&self, id: WatchId) {
        let mut state = self.lock();
        if let Some(pos) = state.waiters.iter().position(|w| w.id == id) {
            state.waiters.swap_remove(pos);
            trace!(watch_id = %id, "cancelled waiter");
        }
    }
}

/// A subscription to one cache's change notifications.
///
/// A `Watch` remembers the last generation it observed. It is created
/// primed with the notifier's current generation, so the first
/// [`changed`](Self::changed) completes on the next update, not on any
/// earlier one.
#[derive(Debug, Clone)]
pub struct Watch {
    notifier: Arc<Notifier>,
    seen: u64,
}

impl Watch {
    /// Subscribe to `notifier`, starting from its current generation.
    pub fn new(notifier: Arc<Notifier>) -> Self {
        let seen = notifier.generation();
        Self { notifier, seen }
    }

    /// The last generation this watch observed.
    #[inline]
    pub fn seen(&self) -> u64 {
        self.seen
    }

    /// Whether an update happened since the last observed generation.
    pub fn has_changed(&self) -> bool {
        self.notifier.generation() > self.seen
    }

    /// Record that the caller has read state as of `generation`.
    ///
    /// Used after reading a cache snapshot so that updates already
    /// reflected in it do not trigger another wakeup. Never moves
    /// backwards.
    pub fn mark_seen(&mut self, generation: u64) {
        self.seen = self.seen.max(generation);
    }

    /// Wait for the next update and return its generation.
    pub async fn changed(&mut self) -> u64 {
        let generation = self.notifier.wait(self.seen).await;
        self.seen = generation;
        generation
    }

    /// Wait for the next update, or return `None` once `cancel` completes.
    pub async fn changed_or_cancel<F>(&mut self, cancel: F) -> Option<u64>
    where
        F: Future,
    {
        let generation = self.notifier.wait_or_cancel(self.seen, cancel).await?;
        self.seen = generation;
        Some(generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn watch_id_unique() {
        let id1 = WatchId::next();
        let id2 = WatchId::next();
        assert_ne!(id1, id2);
    }

    #[test]
    fn notify_without_waiters() {
        let notifier = Notifier::new();
        assert_eq!(notifier.notify(), 0);
        assert_eq!(notifier.notify(), 0);
        assert_eq!(notifier.generation(), 2);
    }

    #[tokio::test]
    async fn wait_returns_immediately_when_behind() {
        let notifier = Notifier::new();
        notifier.notify();
        assert_eq!(notifier.wait(0).await, 1);
    }

    #[tokio::test]
    async fn wait_parks_until_notify() {
        let notifier = Arc::new(Notifier::new());

        let waiter = {
            let notifier = Arc::clone(&notifier);
            tokio::spawn(async move { notifier.wait(0).await })
        };

        while notifier.waiter_count() == 0 {
            tokio::task::yield_now().await;
        }
        assert_eq!(notifier.notify(), 1);
        assert_eq!(waiter.await.unwrap(), 1);
        assert_eq!(notifier.waiter_count(), 0);
    }

    #[tokio::test]
    async fn cancel_deregisters_waiter() {
        let notifier = Notifier::new();

        let result = notifier
            .wait_or_cancel(0, tokio::time::sleep(Duration::from_millis(10)))
            .await;

        assert_eq!(result, None);
        assert_eq!(notifier.waiter_count(), 0);
        assert_eq!(notifier.notify(), 0);
    }

    #[tokio::test]
    async fn cancel_leaves_other_waiters_parked() {
        let notifier = Arc::new(Notifier::new());

        let parked = {
            let notifier = Arc::clone(&notifier);
            tokio::spawn(async move { notifier.wait(0).await })
        };
        while notifier.waiter_count() == 0 {
            tokio::task::yield_now().await;
        }

        let result = notifier.wait_or_cancel(0, std::future::ready(())).await;
        assert_eq!(result, None);
        assert_eq!(notifier.waiter_count(), 1);

        assert_eq!(notifier.notify(), 1);
        assert_eq!(parked.await.unwrap(), 1);
    }

    #[tokio::test]
    async fn dropped_wait_is_pruned() {
        let notifier = Notifier::new();

        let timed_out =
            tokio::time::timeout(Duration::from_millis(10), notifier.wait(0)).await;
        assert!(timed_out.is_err());

        assert_eq!(notifier.waiter_count(), 0);
        assert_eq!(notifier.notify(), 0);
    }

    #[tokio::test]
    async fn watch_starts_at_current_generation() {
        let notifier = Arc::new(Notifier::new());
        notifier.notify();

        let mut watch = Watch::new(Arc::clone(&notifier));
        assert_eq!(watch.seen(), 1);
        assert!(!watch.has_changed());

        notifier.notify();
        assert!(watch.has_changed());
        assert_eq!(watch.changed().await, 2);
        assert!(!watch.has_changed());
    }

    #[tokio::test]
    async fn mark_seen_never_moves_backwards() {
        let notifier = Arc::new(Notifier::new());
        notifier.notify();
        notifier.notify();

        let mut watch = Watch::new(Arc::clone(&notifier));
        watch.mark_seen(1);
        assert_eq!(watch.seen(), 2);
    }
}
