//! Physical trigger-button handling with release debounce.
//!
//! The handler maintains one piece of state: whether the trigger is
//! currently held. A press fires the start intent immediately and cancels
//! any pending stop; a release schedules the stop intent after a fixed
//! grace window so that mechanical bounce or a quick double-tap never
//! produces a stop/start flicker. Only a release that stays released for
//! the full window produces a stop, and it produces exactly one.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, warn};

use scanlink_core::constants::TRIGGER_RELEASE_DELAY;

use crate::event::UserEvent;
use crate::intake::EventIntake;

/// Raw signal from the physical trigger button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSignal {
    Press,
    Release,
}

/// Errors raised by a trigger signal source.
///
/// Registration failures are logged by the handler and never propagate
/// further; the reader simply runs without trigger input.
#[derive(Debug, thiserror::Error)]
pub enum TriggerError {
    /// The signal source could not be registered.
    #[error("Trigger registration failed: {message}")]
    Registration { message: String },
}

impl TriggerError {
    /// Create a new registration failure error.
    pub fn registration(message: impl Into<String>) -> Self {
        Self::Registration {
            message: message.into(),
        }
    }
}

/// Source of physical trigger press/release signals.
///
/// Abstracts whatever host mechanism delivers button notifications
/// (broadcast receiver, GPIO interrupt, input event). Registration and
/// unregistration must be safe to call repeatedly.
pub trait TriggerSignalSource: Send + 'static {
    /// Register for signals, returning the delivery channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying source cannot be subscribed;
    /// the handler tolerates this without propagating it.
    fn register(&mut self) -> Result<mpsc::UnboundedReceiver<TriggerSignal>, TriggerError>;

    /// Unregister from the source. Safe to call when not registered.
    fn unregister(&mut self);
}

/// Mock trigger source driven programmatically through a handle.
pub struct MockTriggerSource {
    rx: Option<mpsc::UnboundedReceiver<TriggerSignal>>,
}

/// Handle for injecting signals into a [`MockTriggerSource`].
#[derive(Clone)]
pub struct MockTriggerHandle {
    tx: mpsc::UnboundedSender<TriggerSignal>,
}

impl MockTriggerSource {
    /// Create a mock source and its injection handle.
    pub fn new() -> (Self, MockTriggerHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { rx: Some(rx) }, MockTriggerHandle { tx })
    }
}

impl TriggerSignalSource for MockTriggerSource {
    fn register(&mut self) -> Result<mpsc::UnboundedReceiver<TriggerSignal>, TriggerError> {
        self.rx
            .take()
            .ok_or_else(|| TriggerError::registration("mock source already registered"))
    }

    fn unregister(&mut self) {}
}

impl MockTriggerHandle {
    /// Inject a press signal.
    pub fn press(&self) {
        let _ = self.tx.send(TriggerSignal::Press);
    }

    /// Inject a release signal.
    pub fn release(&self) {
        let _ = self.tx.send(TriggerSignal::Release);
    }
}

/// Debouncing trigger handler.
///
/// Owns the signal source and a background task translating raw signals
/// into logical start/stop intents. Start/stop callbacks run on the
/// handler's task; the wired constructor submits user events to the
/// machine intake instead.
pub struct TriggerHandler<S: TriggerSignalSource> {
    source: S,
    on_start: Arc<dyn Fn() + Send + Sync>,
    on_stop: Arc<dyn Fn() + Send + Sync>,
    task: Option<JoinHandle<()>>,
}

impl<S: TriggerSignalSource> TriggerHandler<S> {
    /// Create a handler with explicit start/stop callbacks.
    pub fn new(
        source: S,
        on_start: impl Fn() + Send + Sync + 'static,
        on_stop: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self {
            source,
            on_start: Arc::new(on_start),
            on_stop: Arc::new(on_stop),
            task: None,
        }
    }

    /// Create a handler that submits `Start`/`Stop` user events.
    pub fn wired(source: S, intake: EventIntake) -> Self {
        let start_intake = intake.clone();
        Self::new(
            source,
            move || start_intake.submit(UserEvent::Start),
            move || intake.submit(UserEvent::Stop),
        )
    }

    /// Register the signal source and start handling signals.
    ///
    /// Idempotent; a registration failure is logged and swallowed, the
    /// handler just stays inactive.
    pub fn start(&mut self) {
        if self.task.is_some() {
            return;
        }
        let rx = match self.source.register() {
            Ok(rx) => rx,
            Err(e) => {
                warn!(error = %e, "trigger source registration failed");
                return;
            }
        };
        let on_start = self.on_start.clone();
        let on_stop = self.on_stop.clone();
        self.task = Some(tokio::spawn(run_debounce(rx, on_start, on_stop)));
    }

    /// Stop handling signals and unregister the source.
    ///
    /// Idempotent; also cancels any pending debounced stop.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.source.unregister();
    }

    /// Whether the handler is currently active.
    pub fn is_active(&self) -> bool {
        self.task.is_some()
    }
}

impl<S: TriggerSignalSource> Drop for TriggerHandler<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_debounce(
    mut rx: mpsc::UnboundedReceiver<TriggerSignal>,
    on_start: Arc<dyn Fn() + Send + Sync>,
    on_stop: Arc<dyn Fn() + Send + Sync>,
) {
    let mut held = false;
    // Deadline of the pending debounced stop, if one is scheduled.
    let mut pending_stop: Option<Instant> = None;

    loop {
        tokio::select! {
            signal = rx.recv() => match signal {
                None => break,
                Some(TriggerSignal::Press) => {
                    // A re-press cancels the pending stop outright.
                    pending_stop = None;
                    if held {
                        continue;
                    }
                    debug!("trigger is DOWN");
                    held = true;
                    on_start();
                }
                Some(TriggerSignal::Release) => {
                    if !held {
                        continue;
                    }
                    debug!("trigger is UP");
                    held = false;
                    pending_stop = Some(Instant::now() + TRIGGER_RELEASE_DELAY);
                }
            },
            _ = async { sleep_until(pending_stop.expect("guarded by if")).await },
                if pending_stop.is_some() =>
            {
                pending_stop = None;
                on_stop();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct Counters {
        starts: AtomicUsize,
        stops: AtomicUsize,
    }

    fn counting_handler(
        source: MockTriggerSource,
    ) -> (TriggerHandler<MockTriggerSource>, Arc<Counters>) {
        let counters = Arc::new(Counters {
            starts: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
        });
        let c1 = counters.clone();
        let c2 = counters.clone();
        let handler = TriggerHandler::new(
            source,
            move || {
                c1.starts.fetch_add(1, Ordering::SeqCst);
            },
            move || {
                c2.stops.fetch_add(1, Ordering::SeqCst);
            },
        );
        (handler, counters)
    }

    async fn settle() {
        // Let the handler task observe queued signals.
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_press_fires_start_immediately() {
        let (source, signals) = MockTriggerSource::new();
        let (mut handler, counters) = counting_handler(source);
        handler.start();

        signals.press();
        settle().await;

        assert_eq!(counters.starts.load(Ordering::SeqCst), 1);
        assert_eq!(counters.stops.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_press_is_idempotent() {
        let (source, signals) = MockTriggerSource::new();
        let (mut handler, counters) = counting_handler(source);
        handler.start();

        signals.press();
        signals.press();
        signals.press();
        settle().await;

        assert_eq!(counters.starts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_held_full_window_stops_once() {
        let (source, signals) = MockTriggerSource::new();
        let (mut handler, counters) = counting_handler(source);
        handler.start();

        signals.press();
        settle().await;
        signals.release();
        settle().await;

        tokio::time::sleep(TRIGGER_RELEASE_DELAY + Duration::from_millis(10)).await;
        assert_eq!(counters.stops.load(Ordering::SeqCst), 1);

        // Nothing further fires
        tokio::time::sleep(TRIGGER_RELEASE_DELAY * 2).await;
        assert_eq!(counters.stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repress_within_window_cancels_stop() {
        let (source, signals) = MockTriggerSource::new();
        let (mut handler, counters) = counting_handler(source);
        handler.start();

        signals.press();
        settle().await;
        signals.release();
        settle().await;

        // Re-press well inside the 200ms window
        tokio::time::sleep(Duration::from_millis(100)).await;
        signals.press();
        settle().await;

        // Even long after, no stop fired and a second start did
        tokio::time::sleep(TRIGGER_RELEASE_DELAY * 3).await;
        assert_eq!(counters.stops.load(Ordering::SeqCst), 0);
        assert_eq!(counters.starts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_without_press_is_ignored() {
        let (source, signals) = MockTriggerSource::new();
        let (mut handler, counters) = counting_handler(source);
        handler.start();

        signals.release();
        settle().await;
        tokio::time::sleep(TRIGGER_RELEASE_DELAY * 2).await;

        assert_eq!(counters.stops.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_is_idempotent_and_failure_tolerated() {
        let (source, _signals) = MockTriggerSource::new();
        let (mut handler, _counters) = counting_handler(source);

        handler.start();
        assert!(handler.is_active());
        // Second start is a no-op, not a re-registration
        handler.start();
        assert!(handler.is_active());

        handler.stop();
        assert!(!handler.is_active());
        // The mock source cannot re-register; start logs and stays inactive
        handler.start();
        assert!(!handler.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_pending_debounced_stop() {
        let (source, signals) = MockTriggerSource::new();
        let (mut handler, counters) = counting_handler(source);
        handler.start();

        signals.press();
        settle().await;
        signals.release();
        settle().await;

        handler.stop();
        tokio::time::sleep(TRIGGER_RELEASE_DELAY * 2).await;
        assert_eq!(counters.stops.load(Ordering::SeqCst), 0);
    }
}
