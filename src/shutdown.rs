//! Graceful shutdown coordination.
//!
//! A [`ShutdownCoordinator`] is created by the binary, triggered from the
//! Ctrl+C handler and handed to whichever driver is running. Drivers link it
//! to their own abort token with [`ShutdownCoordinator::link`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// Shared handle to a shutdown coordinator.
pub type SharedShutdown = Arc<ShutdownCoordinator>;

/// Coordinates shutdown across async tasks.
#[derive(Debug, Default)]
pub struct ShutdownCoordinator {
    is_shutdown: AtomicBool,
    notify: Notify,
}

impl ShutdownCoordinator {
    /// Create a new coordinator.
    pub fn new() -> Self {
        Self {
            is_shutdown: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    /// Create a new shared coordinator wrapped in [`Arc`].
    pub fn shared() -> SharedShutdown {
        Arc::new(Self::new())
    }

    /// Request shutdown. Notifies all registered waiters exactly once.
    pub fn request_shutdown(&self) {
        if !self.is_shutdown.swap(true, Ordering::SeqCst) {
            self.notify.notify_waiters();
        }
    }

    /// Whether shutdown has been requested.
    pub fn is_shutdown_requested(&self) -> bool {
        self.is_shutdown.load(Ordering::SeqCst)
    }

    /// Wait until shutdown is requested. Returns immediately if already set.
    pub async fn wait_for_shutdown(&self) {
        let notified = self.notify.notified();
        if self.is_shutdown_requested() {
            return;
        }
        notified.await;
    }

    /// Cancel `token` once shutdown is requested. The watcher task exits on
    /// its own when `token` is cancelled by someone else first.
    pub fn link(self: &Arc<Self>, token: CancellationToken) {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            tokio::select! {
                _ = this.wait_for_shutdown() => {
                    tracing::warn!("Shutdown requested, aborting pipeline");
                    token.cancel();
                }
                _ = token.cancelled() => {}
            }
        });
    }
}
