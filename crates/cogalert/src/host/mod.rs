//! # Alert Host
//!
//! The consumer side of the bridge: owns the display and drains the dispatch
//! queue once per tick of a single-threaded loop.
//!
//! ## Tick Order
//!
//! ```text
//! 1. Wait for the next tick
//! 2. Swap out everything the listener queued since the last tick
//! 3. Show each alert, oldest first
//! ```

mod tick;

pub use tick::{TickLoop, TickStats};

use std::sync::Arc;

use cogalert_core::{
    AlertDisplay, Consumer, DispatchError, DispatchQueue, DispatchResult, DrainReport,
};

/// Consumer handle paired with the display it drains into.
struct Installed<D> {
    consumer: Consumer,
    display: D,
}

/// Drives the per-tick drain of a [`DispatchQueue`] into an [`AlertDisplay`].
///
/// Built around an existing queue; the display is installed separately so
/// hosts can start the listener before their renderer is ready. Ticking
/// before that is reported as [`DispatchError::UninitializedConsumer`].
pub struct AlertHost<D> {
    /// Shared queue, also held by the listener.
    queue: Arc<DispatchQueue>,
    /// Present once a display is installed.
    installed: Option<Installed<D>>,
    /// Whether the pre-install tick error was already logged.
    reported_uninitialized: bool,
    /// Totals across all ticks.
    totals: DrainReport,
}

impl<D: AlertDisplay> AlertHost<D> {
    /// Creates a host with no display installed.
    #[must_use]
    pub fn new(queue: Arc<DispatchQueue>) -> Self {
        Self {
            queue,
            installed: None,
            reported_uninitialized: false,
            totals: DrainReport::default(),
        }
    }

    /// Attaches the queue's consumer and starts delivering to `display`.
    ///
    /// Installing again replaces the previous display and keeps the consumer.
    ///
    /// # Errors
    ///
    /// [`DispatchError::ConsumerAlreadyAttached`] if something else already
    /// drains this queue.
    pub fn install_display(&mut self, display: D) -> DispatchResult<()> {
        if let Some(installed) = self.installed.as_mut() {
            installed.display = display;
            return Ok(());
        }

        let consumer = self.queue.attach_consumer()?;
        self.installed = Some(Installed { consumer, display });
        tracing::info!("Alert display installed");
        Ok(())
    }

    /// Removes the display and detaches the consumer.
    pub fn take_display(&mut self) -> Option<D> {
        self.installed.take().map(|installed| installed.display)
    }

    /// Returns whether a display is installed.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.installed.is_some()
    }

    /// Returns the installed display.
    #[must_use]
    pub fn display(&self) -> Option<&D> {
        self.installed.as_ref().map(|installed| &installed.display)
    }

    /// Returns the shared queue.
    #[must_use]
    pub fn queue(&self) -> &Arc<DispatchQueue> {
        &self.queue
    }

    /// Delivery totals across all ticks.
    #[must_use]
    pub const fn totals(&self) -> DrainReport {
        self.totals
    }

    /// Runs one drain pass. An empty queue is a no-op.
    ///
    /// # Errors
    ///
    /// [`DispatchError::UninitializedConsumer`] if no display is installed.
    /// Logged at `error` the first time, then at `trace`.
    pub fn tick(&mut self) -> DispatchResult<DrainReport> {
        let Some(Installed { consumer, display }) = self.installed.as_mut() else {
            if self.reported_uninitialized {
                tracing::trace!("Tick before display installed");
            } else {
                self.reported_uninitialized = true;
                tracing::error!("Alert host ticked before a display was installed");
            }
            return Err(DispatchError::UninitializedConsumer);
        };

        let report = consumer.drain_and_run(display);
        self.totals.delivered += report.delivered;
        self.totals.failed += report.failed;
        Ok(report)
    }

    /// Ticks at the loop's rate until `should_stop` returns true.
    ///
    /// # Errors
    ///
    /// [`DispatchError::UninitializedConsumer`] if no display is installed.
    pub fn run<F>(&mut self, tick_loop: &mut TickLoop, mut should_stop: F) -> DispatchResult<()>
    where
        F: FnMut() -> bool,
    {
        if !self.is_ready() {
            return self.tick().map(|_| ());
        }

        while !should_stop() {
            tick_loop.wait_for_next_tick();

            while tick_loop.should_tick() {
                let start = tick_loop.begin_tick();
                self.tick()?;
                tick_loop.end_tick(start);
            }
        }

        Ok(())
    }
}
