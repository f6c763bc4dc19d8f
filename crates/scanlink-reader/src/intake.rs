//! Ordered event intake for the state machine.
//!
//! All producers (user API, callback aggregator, trigger handler) funnel
//! events through a single unbounded queue drained by exactly one worker.
//! The intake also absorbs the startup race: events submitted before the
//! machine has been constructed are held in one shared ordered buffer
//! and flushed into the queue the moment the machine binds, ahead of
//! anything submitted afterwards. A producer's events are therefore
//! delivered in submission order whether the machine exists yet or not.

use std::sync::{Arc, Mutex, OnceLock};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use scanlink_core::constants::INTAKE_PENDING_LIMIT;

use crate::event::ReaderEvent;

struct IntakeShared {
    tx: OnceLock<mpsc::UnboundedSender<ReaderEvent>>,
    // Held pre-bind events. The lock also serializes binding against
    // submission: `bind` publishes the sender and drains this buffer
    // under the lock, so the buffer is always empty once the sender is
    // visible and no later submission can overtake a held event.
    pending: Mutex<Vec<ReaderEvent>>,
}

/// Cloneable entry point into the state machine's event queue.
///
/// Cheap to clone; every clone refers to the same queue. Created either
/// implicitly by the machine spawner or explicitly ahead of time so that
/// producers can be wired up before the machine exists.
#[derive(Clone)]
pub struct EventIntake {
    inner: Arc<IntakeShared>,
}

impl EventIntake {
    /// Create an unbound intake.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(IntakeShared {
                tx: OnceLock::new(),
                pending: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Bind the intake to a fresh queue, returning the consumer end.
    ///
    /// Events held since before the binding are flushed into the queue
    /// first, in submission order. Returns `None` if the intake was
    /// already bound; an intake feeds exactly one machine.
    pub(crate) fn bind(&self) -> Option<mpsc::UnboundedReceiver<ReaderEvent>> {
        let (tx, rx) = mpsc::unbounded_channel();
        let sender = tx.clone();
        let mut pending = self.lock_pending();
        if self.inner.tx.set(tx).is_err() {
            return None;
        }
        for event in pending.drain(..) {
            // The receiver cannot be gone yet, we hold it.
            let _ = sender.send(event);
        }
        Some(rx)
    }

    /// Submit an event, preserving submission order for a given producer.
    ///
    /// If the machine has not been constructed yet, the event is held in
    /// the intake's ordered buffer and delivered when the machine binds.
    /// The buffer is bounded by [`INTAKE_PENDING_LIMIT`]; overflow means
    /// the machine was never started, and further events are dropped
    /// with a warning rather than hoarded against a dead consumer.
    pub fn submit(&self, event: impl Into<ReaderEvent>) {
        let event = event.into();
        let mut pending = self.lock_pending();
        if let Some(tx) = self.inner.tx.get() {
            // Receiver only drops when the worker is gone for good.
            if tx.send(event).is_err() {
                warn!("state machine worker is gone, event dropped");
            }
        } else if pending.len() >= INTAKE_PENDING_LIMIT {
            warn!(?event, "intake buffer full, machine never appeared, event dropped");
        } else {
            debug!(?event, "machine not constructed yet, holding event");
            pending.push(event);
        }
    }

    /// Whether a machine has bound this intake.
    pub fn is_bound(&self) -> bool {
        self.inner.tx.get().is_some()
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, Vec<ReaderEvent>> {
        self.inner.pending.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for EventIntake {
    fn default() -> Self {
        Self::new()
    }
}
