use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use tokio::signal;
use tokio::sync::Notify;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ShutdownPhase {
    Running = 0,
    Signaled = 1,
    DrainingRequests = 2,
    ClosingConnections = 3,
    Complete = 4,
}

impl ShutdownPhase {
    fn from_raw(raw: u8) -> Self {
        match raw {
            0 => ShutdownPhase::Running,
            1 => ShutdownPhase::Signaled,
            2 => ShutdownPhase::DrainingRequests,
            3 => ShutdownPhase::ClosingConnections,
            _ => ShutdownPhase::Complete,
        }
    }
}

fn transition(phase: &AtomicU8, next: ShutdownPhase) {
    let previous = ShutdownPhase::from_raw(phase.swap(next as u8, Ordering::SeqCst));
    tracing::info!(?previous, phase = ?next, "Shutdown phase");
}

pub struct ShutdownCoordinator {
    shutdown: Arc<AtomicBool>,
    phase: Arc<AtomicU8>,
    notify: Arc<Notify>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self {
            shutdown: Arc::new(AtomicBool::new(false)),
            phase: Arc::new(AtomicU8::new(ShutdownPhase::Running as u8)),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Signal shutdown start
    pub fn signal(&self) {
        if !self.shutdown.swap(true, Ordering::SeqCst) {
            self.phase
                .store(ShutdownPhase::Signaled as u8, Ordering::SeqCst);
            tracing::info!("Graceful shutdown initiated");
            self.notify.notify_waiters();
        }
    }

    /// Check if shutdown is in progress
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Get current phase
    pub fn phase(&self) -> ShutdownPhase {
        ShutdownPhase::from_raw(self.phase.load(Ordering::SeqCst))
    }

    /// Advance to next phase
    pub fn advance(&self, phase: ShutdownPhase) {
        transition(&self.phase, phase);
    }

    /// Create a handle for sharing
    pub fn handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            shutdown: Arc::clone(&self.shutdown),
            phase: Arc::clone(&self.phase),
            notify: Arc::clone(&self.notify),
        }
    }

    /// Signal shutdown on ctrl-c (and SIGTERM on unix).
    pub fn listen_for_signals(&self) -> tokio::task::JoinHandle<()> {
        let handle = self.handle();
        tokio::spawn(async move {
            tokio::select! {
                _ = wait_for_signal() => {
                    tracing::info!("Termination signal received");
                    handle.signal();
                }
                _ = handle.wait() => {}
            }
        })
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            tracing::warn!(error = %e, "SIGTERM handler unavailable, listening for ctrl-c only");
            let _ = signal::ctrl_c().await;
            return;
        }
    };
    tokio::select! {
        _ = signal::ctrl_c() => {},
        _ = sigterm.recv() => {},
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = signal::ctrl_c().await;
}

/// Lightweight handle for checking shutdown state
#[derive(Clone)]
pub struct ShutdownHandle {
    shutdown: Arc<AtomicBool>,
    phase: Arc<AtomicU8>,
    notify: Arc<Notify>,
}

impl ShutdownHandle {
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    pub fn signal(&self) {
        if !self.shutdown.swap(true, Ordering::SeqCst) {
            self.phase
                .store(ShutdownPhase::Signaled as u8, Ordering::SeqCst);
            self.notify.notify_waiters();
        }
    }

    /// Record progress from a component that owns only a handle.
    pub fn advance(&self, phase: ShutdownPhase) {
        transition(&self.phase, phase);
    }

    pub async fn wait(&self) {
        // Subscribe to Notify BEFORE checking the flag to avoid TOCTOU race:
        // without this, signal() could fire between the check and the await,
        // and notify_waiters() would have no subscribers, losing the notification.
        let notified = self.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if self.is_shutting_down() {
            return;
        }
        notified.await;
    }
}
