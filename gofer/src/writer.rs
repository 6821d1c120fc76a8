//! Writer slots and their supervision.
//!
//! A [`Pool`] owns one supervised slot per configured writer. Each slot runs
//! sessions back to back: when a session ends for any reason short of
//! shutdown the slot waits out a cool-down and starts over with fresh
//! credentials. The invariant the supervisor enforces is that a slot never
//! has two live sessions at once -- a session is fully torn down before the
//! next attempt begins -- and that once the shutdown signal fires, the slot
//! stops permanently.

use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{error, info};

use crate::{auth, config::Config};

mod session;

/// Reason a session returned control to its supervising slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Credentials could not be fetched, or came back incomplete.
    AuthFailed,
    /// The handshake against the intake endpoint failed.
    ConnectFailed,
    /// The established stream broke: a write failed, a read failed or the
    /// peer closed the connection.
    StreamError,
    /// The shutdown signal was observed; the slot must not restart.
    Shutdown,
}

/// One supervised writer slot.
struct Writer {
    id: u16,
    auth: auth::Client,
    write_period: Duration,
    close_timeout: Duration,
    cool_down: Duration,
    shutdown: gofer_signal::Watcher,
}

impl Writer {
    /// Run sessions for this slot until shutdown.
    ///
    /// The shutdown decision is made through the slot's watcher at the head
    /// of every iteration and inside every blocking wait, so an interrupt
    /// is observed promptly no matter what the slot is doing.
    async fn spin(mut self) {
        info!(id = self.id, "starting writer");
        loop {
            if self.shutdown.raised() {
                break;
            }

            let outcome = session::run(
                self.id,
                &self.auth,
                self.write_period,
                self.close_timeout,
                &mut self.shutdown,
            )
            .await;

            match outcome {
                Outcome::Shutdown => break,
                outcome => {
                    info!(
                        id = self.id,
                        ?outcome,
                        "session ended, restarting after cool-down"
                    );
                    tokio::select! {
                        () = tokio::time::sleep(self.cool_down) => {}
                        () = self.shutdown.recv() => break,
                    }
                }
            }
        }
        info!(id = self.id, "writer stopped");
    }
}

/// The pool of writer slots.
///
/// Slots are spawned at construction and run until the shutdown signal
/// fires; [`Pool::spin`] then joins every slot, which means waiting out
/// each slot's own draining sequence.
#[derive(Debug)]
pub struct Pool {
    handles: JoinSet<()>,
    shutdown: gofer_signal::Watcher,
}

impl Pool {
    /// Create a new [`Pool`], spawning one supervised writer per slot.
    #[must_use]
    pub fn new(config: &Config, shutdown: gofer_signal::Watcher) -> Self {
        let auth = auth::Client::new(&config.auth);
        let mut handles = JoinSet::new();
        for id in 0..config.writers {
            let writer = Writer {
                id,
                auth: auth.clone(),
                write_period: config.write_period,
                close_timeout: config.close_timeout,
                cool_down: config.cool_down,
                shutdown: shutdown.register(),
            };
            handles.spawn(writer.spin());
        }
        Self { handles, shutdown }
    }

    /// Run the pool until the shutdown signal fires, then join every slot.
    pub async fn spin(mut self) {
        self.shutdown.recv().await;
        info!("shutdown signal received, draining writers");
        while let Some(res) = self.handles.join_next().await {
            if let Err(err) = res {
                error!(%err, "failed to join writer task");
            }
        }
    }
}
