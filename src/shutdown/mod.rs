//! Shutdown coordination
//!
//! A watch-channel handle observed cooperatively by the pipeline tasks at
//! their suspension points, fed by a signal-listener task. The first
//! SIGINT/SIGTERM requests a graceful drain: the reader stops, the queue
//! closes, and buffered chunks are flushed normally. A second signal while
//! draining forces the process to exit immediately, accepting loss of any
//! unflushed data.

use std::fmt;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Which signal triggered shutdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    /// SIGINT (Ctrl+C)
    SigInt,
    /// SIGTERM
    SigTerm,
    /// Requested programmatically (tests)
    Manual,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SigInt => write!(f, "SIGINT (Ctrl+C)"),
            Self::SigTerm => write!(f, "SIGTERM"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

/// Handle for triggering and observing shutdown
#[derive(Clone)]
pub struct ShutdownHandle {
    sender: watch::Sender<Option<ShutdownSignal>>,
    receiver: watch::Receiver<Option<ShutdownSignal>>,
}

impl ShutdownHandle {
    /// Creates a handle with no shutdown requested.
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(None);
        Self { sender, receiver }
    }

    /// Requests a graceful drain.
    pub fn shutdown(&self, signal: ShutdownSignal) {
        let _ = self.sender.send(Some(signal));
    }

    /// Suspends until shutdown is requested.
    pub async fn wait(&mut self) -> ShutdownSignal {
        loop {
            if let Some(signal) = *self.receiver.borrow() {
                return signal;
            }
            if self.receiver.changed().await.is_err() {
                return ShutdownSignal::Manual;
            }
        }
    }

    /// True once shutdown has been requested
    pub fn is_shutdown(&self) -> bool {
        self.receiver.borrow().is_some()
    }
}

impl Default for ShutdownHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawns the signal-listener task.
///
/// First signal: notify `handle` and let the pipeline drain. Second signal:
/// exit 1 immediately.
pub fn spawn_signal_listener(handle: ShutdownHandle) -> JoinHandle<()> {
    tokio::spawn(async move {
        let signal = next_signal().await;
        info!(%signal, "received signal, draining buffered data");
        info!("press Ctrl+C again to force exit (unprocessed data will be lost)");
        handle.shutdown(signal);

        let signal = next_signal().await;
        warn!(%signal, "received second signal, forcing exit");
        std::process::exit(1);
    })
}

/// Completes when SIGINT or SIGTERM is delivered.
async fn next_signal() -> ShutdownSignal {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
        ShutdownSignal::SigInt
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
        ShutdownSignal::SigTerm
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<ShutdownSignal>();

    tokio::select! {
        signal = ctrl_c => signal,
        signal = terminate => signal,
    }
}
