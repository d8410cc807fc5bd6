//! # Shutdown Conditions
//!
//! Decides when the host loop should stop: an interrupt from the OS or an
//! optional run-duration deadline, whichever comes first.
//!
//! Signals are awaited on a small current-thread `tokio` runtime parked on
//! its own thread. Delivery into the synchronous host loop goes through a
//! `crossbeam-channel`, polled once per `should_stop` call.

use std::cell::Cell;
use std::io;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};

/// Stop condition for [`AlertHost::run`](crate::AlertHost::run).
///
/// Latches: once it reports stop, it keeps reporting stop.
pub struct StopSignal {
    /// Fires on SIGINT/SIGTERM (or whatever the owner wires in).
    interrupt: Receiver<()>,
    /// Fires when the run duration elapses. Never fires if unbounded.
    deadline: Receiver<Instant>,
    /// Set once either source fired.
    stopped: Cell<bool>,
}

impl StopSignal {
    /// Builds a stop condition from an interrupt channel and an optional
    /// run duration.
    #[must_use]
    pub fn new(interrupt: Receiver<()>, duration: Option<Duration>) -> Self {
        Self {
            interrupt,
            deadline: duration.map_or_else(crossbeam_channel::never, crossbeam_channel::after),
            stopped: Cell::new(false),
        }
    }

    /// Installs OS signal handlers and builds a stop condition on them.
    ///
    /// # Errors
    ///
    /// Fails if the signal runtime or its thread cannot be created.
    pub fn install(duration: Option<Duration>) -> io::Result<Self> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        spawn_signal_watcher(tx)?;
        Ok(Self::new(rx, duration))
    }

    /// Returns true once an interrupt arrived or the deadline passed.
    pub fn should_stop(&self) -> bool {
        if self.stopped.get() {
            return true;
        }

        if self.interrupt.try_recv().is_ok() {
            tracing::info!("Shutdown requested");
            self.stopped.set(true);
        } else if self.deadline.try_recv().is_ok() {
            tracing::info!("Run duration elapsed");
            self.stopped.set(true);
        }
        self.stopped.get()
    }
}

/// Waits for SIGINT (and SIGTERM on Unix) on a dedicated thread and sends
/// one notification on `tx`.
fn spawn_signal_watcher(tx: Sender<()>) -> io::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_io()
        .build()?;

    thread::Builder::new()
        .name("cogalert-signals".to_string())
        .spawn(move || {
            runtime.block_on(async move {
                #[cfg(unix)]
                {
                    use tokio::signal::unix::{signal, SignalKind};

                    match signal(SignalKind::terminate()) {
                        Ok(mut terminate) => {
                            let term_tx = tx.clone();
                            tokio::spawn(async move {
                                if terminate.recv().await.is_some() {
                                    let _ = term_tx.try_send(());
                                }
                            });
                        }
                        Err(e) => tracing::warn!("Could not watch SIGTERM: {}", e),
                    }
                }

                match tokio::signal::ctrl_c().await {
                    Ok(()) => {
                        let _ = tx.try_send(());
                    }
                    Err(e) => tracing::warn!("Could not watch Ctrl-C: {}", e),
                }
            });
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbounded_without_interrupt_keeps_running() {
        let (_tx, rx) = crossbeam_channel::bounded(1);
        let stop = StopSignal::new(rx, None);

        assert!(!stop.should_stop());
        assert!(!stop.should_stop());
    }

    #[test]
    fn test_interrupt_stops_and_latches() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let stop = StopSignal::new(rx, None);

        tx.send(()).unwrap();

        assert!(stop.should_stop());
        assert!(stop.should_stop());
    }

    #[test]
    fn test_deadline_stops() {
        let (_tx, rx) = crossbeam_channel::bounded(1);
        let stop = StopSignal::new(rx, Some(Duration::from_millis(10)));

        thread::sleep(Duration::from_millis(30));

        assert!(stop.should_stop());
    }

    #[test]
    fn test_install_starts_idle() {
        let stop = StopSignal::install(None).unwrap();
        assert!(!stop.should_stop());
    }
}
