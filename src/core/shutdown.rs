//! Shutdown coordination
//!
//! A broadcast channel carries the interrupt to every task that subscribed
//! (the orchestrator in particular) and an atomic flag lets synchronous code
//! ask whether an interrupt has been seen. A second signal exits immediately.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Exit status used when the run was interrupted
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Coordinates interruption of a running sweep
pub struct ShutdownCoordinator {
    pub shutdown_tx: broadcast::Sender<()>,
    pub shutdown_requested: Arc<AtomicBool>,
}

impl ShutdownCoordinator {
    pub fn new() -> (Self, broadcast::Receiver<()>) {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(8);
        let shutdown_requested = Arc::new(AtomicBool::new(false));

        let coordinator = Self {
            shutdown_tx,
            shutdown_requested,
        };

        (coordinator, shutdown_rx)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Request shutdown as if a signal had arrived
    pub fn trigger_shutdown(&self) {
        self.shutdown_requested.store(true, Ordering::Release);
        let _ = self.shutdown_tx.send(());
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::Acquire)
    }

    /// Install signal handlers and run `future_fn` with the coordinator
    ///
    /// The closure owns the coordinator so it can check the flag after the
    /// guarded work finishes and choose the exit status.
    pub async fn guard_with_coordinator<F, Fut, R>(future_fn: F) -> R
    where
        F: FnOnce(Self, broadcast::Receiver<()>) -> Fut,
        Fut: std::future::Future<Output = R>,
    {
        let (coordinator, shutdown_rx) = Self::new();

        setup_signal_handlers(
            coordinator.shutdown_tx.clone(),
            coordinator.shutdown_requested.clone(),
        );

        future_fn(coordinator, shutdown_rx).await
    }
}

fn record_signal(
    tx: &broadcast::Sender<()>,
    requested: &AtomicBool,
    counter: &AtomicUsize,
    source: &str,
) {
    let prev = counter.fetch_add(1, Ordering::AcqRel);
    requested.store(true, Ordering::Release);
    let _ = tx.send(());
    if prev >= 1 {
        log::warn!("{} received again; exiting without a report", source);
        std::process::exit(INTERRUPTED_EXIT_CODE);
    }
    log::warn!(
        "{} received; stopping the sweep and reporting partial results",
        source
    );
}

fn setup_signal_handlers(shutdown_tx: broadcast::Sender<()>, shutdown_requested: Arc<AtomicBool>) {
    let signal_count = Arc::new(AtomicUsize::new(0));

    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }

        use tokio::signal::unix::{signal, SignalKind};
        let signals = [
            (SignalKind::interrupt(), "SIGINT"),
            (SignalKind::terminate(), "SIGTERM"),
            (SignalKind::hangup(), "SIGHUP"),
            (SignalKind::quit(), "SIGQUIT"),
        ];

        for (kind, name) in signals {
            let tx = shutdown_tx.clone();
            let requested = shutdown_requested.clone();
            let counter = signal_count.clone();

            tokio::spawn(async move {
                if let Ok(mut sig) = signal(kind) {
                    while sig.recv().await.is_some() {
                        record_signal(&tx, &requested, &counter, name);
                    }
                }
            });
        }
    }

    #[cfg(not(unix))]
    {
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                record_signal(&shutdown_tx, &shutdown_requested, &signal_count, "Ctrl-C");
            }
        });
    }
}
