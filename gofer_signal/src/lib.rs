//! Shutdown signalling for gofer.
//!
//! Gofer runs many writer slots concurrently and must stop all of them on a
//! single process interrupt, then wait for every slot to finish its own
//! draining sequence before the process exits. The mechanism here has two
//! halves: a [`Broadcaster`], held by whoever decides that shutdown has
//! begun, and one [`Watcher`] per participating task.
//!
//! Signalling is a one-time event. The `Broadcaster` raises the signal by
//! dropping its channel sender; every `Watcher` observes the closed channel.
//! Completion accounting is separate from receipt: a `Watcher` counts as
//! outstanding until it is *dropped*, so [`Broadcaster::signal_and_wait`]
//! does not return while any participant is still tearing down, even after
//! it has seen the signal.

use std::sync::{
    Arc,
    atomic::{AtomicU32, Ordering},
};

use tokio::sync::{
    Notify,
    broadcast::{self, error},
};
use tracing::debug;

/// Construct a connected [`Watcher`] and [`Broadcaster`] pair.
///
/// The returned `Watcher` is already registered; further participants are
/// created with [`Watcher::register`]. All registration must happen before
/// the signal is raised for [`Broadcaster::signal_and_wait`] to account for
/// every participant.
#[must_use]
pub fn signal() -> (Watcher, Broadcaster) {
    let (sender, receiver) = broadcast::channel(1);
    let peers = Arc::new(AtomicU32::new(1));
    let notify = Arc::new(Notify::new());

    let w = Watcher {
        peers: Arc::clone(&peers),
        receiver,
        notify: Arc::clone(&notify),
        received: false,
    };

    let b = Broadcaster {
        peers,
        sender,
        notify,
    };

    (w, b)
}

/// Raises the shutdown signal and accounts for outstanding [`Watcher`]
/// instances.
#[derive(Debug)]
pub struct Broadcaster {
    /// Number of `Watcher` instances not yet dropped.
    peers: Arc<AtomicU32>,
    /// Dropping this sender is the signal.
    sender: broadcast::Sender<()>,
    /// Watchers poke this as they drop so `signal_and_wait` can re-check.
    notify: Arc<Notify>,
}

impl Broadcaster {
    /// Raise the signal without waiting for any `Watcher` to act on it.
    pub fn signal(self) {
        drop(self.sender);
    }

    /// Raise the signal, then block until every registered `Watcher` has
    /// been dropped.
    ///
    /// A `Watcher` drops when its owning task finishes teardown, so this
    /// returns only once all participants have fully stopped, not merely
    /// once they have observed the signal.
    pub async fn signal_and_wait(self) {
        drop(self.sender);

        // Register for notification before checking the count; a watcher
        // that drops between the check and the await would otherwise be a
        // lost wakeup.
        loop {
            let notified = self.notify.notified();
            let peers = self.peers.load(Ordering::SeqCst);
            if peers == 0 {
                break;
            }
            debug!(peers, "waiting for watchers to stand down");
            notified.await;
        }
    }
}

/// Observes the shutdown signal raised by the [`Broadcaster`].
///
/// A `Watcher` counts as an outstanding participant from construction until
/// it is dropped. Owning tasks should therefore keep their `Watcher` alive
/// for exactly as long as they have teardown work left to do.
#[derive(Debug)]
pub struct Watcher {
    /// Shared participant count, decremented on drop.
    peers: Arc<AtomicU32>,
    /// Receive half; a closed channel means the signal was raised.
    receiver: broadcast::Receiver<()>,
    /// Wakes the `Broadcaster` when this instance drops.
    notify: Arc<Notify>,
    /// Set once the signal has been observed by this instance.
    received: bool,
}

impl Watcher {
    /// Register a new participant.
    ///
    /// Registration after the signal has already been raised yields a
    /// `Watcher` that observes it immediately on the next receive.
    #[must_use]
    pub fn register(&self) -> Self {
        self.peers.fetch_add(1, Ordering::SeqCst);
        Self {
            peers: Arc::clone(&self.peers),
            receiver: self.receiver.resubscribe(),
            notify: Arc::clone(&self.notify),
            received: self.received,
        }
    }

    /// Wait for the signal. Returns immediately if this instance has
    /// already observed it.
    ///
    /// # Panics
    ///
    /// Panics if the underlying channel reports lag, which cannot happen:
    /// nothing is ever sent on it, the sender is only dropped.
    pub async fn recv(&mut self) {
        if self.received {
            return;
        }

        match self.receiver.recv().await {
            Ok(()) | Err(error::RecvError::Closed) => self.received = true,
            Err(error::RecvError::Lagged(_)) => {
                unreachable!("shutdown channel lagged: nothing is ever sent on it")
            }
        }
    }

    /// Check for the signal without blocking. Once this returns `true` it
    /// returns `true` forever.
    pub fn raised(&mut self) -> bool {
        if self.received {
            return true;
        }

        match self.receiver.try_recv() {
            Ok(()) | Err(error::TryRecvError::Closed | error::TryRecvError::Lagged(_)) => {
                self.received = true;
                true
            }
            Err(error::TryRecvError::Empty) => false,
        }
    }
}

impl Drop for Watcher {
    fn drop(&mut self) {
        self.peers.fetch_sub(1, Ordering::SeqCst);
        self.notify.notify_waiters();
    }
}
