//! # Dispatch Queue
//!
//! Ordered handoff between producer threads and the single consumer loop.
//!
//! ## Design
//!
//! ```text
//!   Listener ──┐
//!   Producer ──┼──> [Mutex<VecDeque>] ──swap──> Consumer ──> AlertDisplay
//!   Producer ──┘      (push_back)               (one per tick, in order)
//! ```
//!
//! The lock covers only the `push_back` on the producer side and a buffer
//! swap on the consumer side. Actions are invoked after the lock is released,
//! so a slow or failing display never stalls producers.
//!
//! There is one queue per process, built at startup and shared through
//! `Arc`. Draining goes through the [`Consumer`] handle returned by
//! [`DispatchQueue::attach_consumer`]; at most one exists at a time.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::action::{AlertPayload, PendingAction};
use crate::display::AlertDisplay;
use crate::error::{DispatchError, DispatchResult};

/// Queue configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueueConfig {
    /// Maximum number of pending actions.
    ///
    /// `None` leaves the queue unbounded. With `Some(n)`, enqueueing into a
    /// full queue discards the oldest pending action.
    pub capacity: Option<usize>,
}

impl QueueConfig {
    /// Unbounded queue.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self { capacity: None }
    }

    /// Bounded queue that drops the oldest entry on overflow.
    #[must_use]
    pub const fn bounded(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
        }
    }
}

/// Live counters, updated without taking the queue lock.
#[derive(Debug, Default)]
struct QueueCounters {
    enqueued: AtomicU64,
    rejected: AtomicU64,
    dropped: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
    drains: AtomicU64,
}

/// Point-in-time queue statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Actions accepted by `enqueue`.
    pub enqueued: u64,
    /// Actions refused because no consumer was attached.
    pub rejected: u64,
    /// Actions discarded by the drop-oldest overflow policy.
    pub dropped: u64,
    /// Actions the display accepted.
    pub delivered: u64,
    /// Actions whose display call failed or panicked.
    pub failed: u64,
    /// Completed drain passes, including empty ones.
    pub drains: u64,
    /// Actions currently waiting.
    pub pending: usize,
}

/// Outcome of one drain pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Actions shown successfully.
    pub delivered: usize,
    /// Actions whose display call failed.
    pub failed: usize,
}

impl DrainReport {
    /// Total number of actions invoked.
    #[inline]
    #[must_use]
    pub const fn total(&self) -> usize {
        self.delivered + self.failed
    }

    /// Returns true if the pass invoked nothing.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Thread-safe FIFO of pending alert actions.
#[derive(Debug)]
pub struct DispatchQueue {
    /// Pending actions, oldest first.
    pending: Mutex<VecDeque<PendingAction>>,
    /// Whether a [`Consumer`] currently exists.
    consumer_attached: AtomicBool,
    /// Overflow bound, if any.
    capacity: Option<usize>,
    /// Statistics.
    counters: QueueCounters,
}

impl DispatchQueue {
    /// Creates an empty queue with no consumer attached.
    #[must_use]
    pub fn new(config: QueueConfig) -> Self {
        let initial = config.capacity.unwrap_or(64).min(1024);
        Self {
            pending: Mutex::new(VecDeque::with_capacity(initial)),
            consumer_attached: AtomicBool::new(false),
            capacity: config.capacity.map(|c| c.max(1)),
            counters: QueueCounters::default(),
        }
    }

    /// Creates a shared queue, ready to hand to producers and the consumer.
    #[must_use]
    pub fn shared(config: QueueConfig) -> Arc<Self> {
        Arc::new(Self::new(config))
    }

    /// Attaches the single consumer.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::ConsumerAlreadyAttached`] if another
    /// [`Consumer`] is alive.
    pub fn attach_consumer(self: &Arc<Self>) -> DispatchResult<Consumer> {
        self.consumer_attached
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| DispatchError::ConsumerAlreadyAttached)?;

        tracing::debug!("Consumer attached to dispatch queue");

        Ok(Consumer {
            queue: Arc::clone(self),
            spare: VecDeque::new(),
        })
    }

    /// Returns whether a consumer is attached.
    #[inline]
    #[must_use]
    pub fn consumer_attached(&self) -> bool {
        self.consumer_attached.load(Ordering::Acquire)
    }

    /// Appends an action at the tail.
    ///
    /// Safe to call from any thread. Holds the lock only for the push.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UninitializedConsumer`] if no consumer is
    /// attached. The action is not queued in that case.
    pub fn enqueue(&self, action: PendingAction) -> DispatchResult<()> {
        if !self.consumer_attached() {
            self.counters.rejected.fetch_add(1, Ordering::Relaxed);
            return Err(DispatchError::UninitializedConsumer);
        }

        let evicted = {
            let mut pending = self.pending.lock();
            let evicted = match self.capacity {
                Some(capacity) if pending.len() >= capacity => pending.pop_front(),
                _ => None,
            };
            pending.push_back(action);
            evicted
        };

        self.counters.enqueued.fetch_add(1, Ordering::Relaxed);

        if let Some(old) = evicted {
            self.counters.dropped.fetch_add(1, Ordering::Relaxed);
            tracing::warn!("Dispatch queue full, dropped oldest alert {:?}", old.payload().as_str());
        }

        Ok(())
    }

    /// Number of pending actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Returns true if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    /// Copies the pending actions, oldest first, without removing them.
    #[must_use]
    pub fn pending_actions(&self) -> Vec<PendingAction> {
        self.pending.lock().iter().cloned().collect()
    }

    /// Payloads of the pending actions, oldest first.
    #[must_use]
    pub fn pending_payloads(&self) -> Vec<AlertPayload> {
        self.pending
            .lock()
            .iter()
            .map(|action| action.payload().clone())
            .collect()
    }

    /// Returns a statistics snapshot.
    #[must_use]
    pub fn stats(&self) -> QueueStats {
        QueueStats {
            enqueued: self.counters.enqueued.load(Ordering::Relaxed),
            rejected: self.counters.rejected.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
            delivered: self.counters.delivered.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            drains: self.counters.drains.load(Ordering::Relaxed),
            pending: self.len(),
        }
    }
}

/// The unique drain handle for a [`DispatchQueue`].
///
/// Not `Clone`. Dropping it detaches the consumer, after which `enqueue`
/// is refused again.
#[derive(Debug)]
pub struct Consumer {
    queue: Arc<DispatchQueue>,
    /// Swapped with the live buffer on each drain to reuse its allocation.
    spare: VecDeque<PendingAction>,
}

impl Consumer {
    /// Returns the queue this consumer drains.
    #[must_use]
    pub fn queue(&self) -> &Arc<DispatchQueue> {
        &self.queue
    }

    /// Detaches everything currently pending and shows it, oldest first.
    ///
    /// Actions enqueued while the pass runs wait for the next call. A display
    /// error or panic is logged and counted against that action only.
    pub fn drain_and_run<D>(&mut self, display: &mut D) -> DrainReport
    where
        D: AlertDisplay + ?Sized,
    {
        {
            let mut pending = self.queue.pending.lock();
            std::mem::swap(&mut *pending, &mut self.spare);
        }

        let mut report = DrainReport::default();

        for action in self.spare.drain(..) {
            match action {
                PendingAction::ShowAlert { payload, .. } => {
                    match panic::catch_unwind(AssertUnwindSafe(|| display.show_alert(&payload))) {
                        Ok(Ok(())) => report.delivered += 1,
                        Ok(Err(e)) => {
                            report.failed += 1;
                            tracing::error!("Alert {:?} failed to display: {}", payload.as_str(), e);
                        }
                        Err(cause) => {
                            report.failed += 1;
                            tracing::error!(
                                "Alert {:?} display panicked: {}",
                                payload.as_str(),
                                panic_message(cause.as_ref())
                            );
                        }
                    }
                }
            }
        }

        let counters = &self.queue.counters;
        counters.delivered.fetch_add(report.delivered as u64, Ordering::Relaxed);
        counters.failed.fetch_add(report.failed as u64, Ordering::Relaxed);
        counters.drains.fetch_add(1, Ordering::Relaxed);

        report
    }
}

impl Drop for Consumer {
    fn drop(&mut self) {
        self.queue.consumer_attached.store(false, Ordering::Release);
        tracing::debug!("Consumer detached from dispatch queue");
    }
}

fn panic_message(cause: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = cause.downcast_ref::<&'static str>() {
        *s
    } else if let Some(s) = cause.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
