//! Reader lifecycle coordination for the scanlink coordinator.
//!
//! This crate is the core of the system: a serialized state machine that
//! merges three asynchronous input sources (user intent, driver
//! callbacks, and debounced physical trigger signals) into one
//! consistent reader lifecycle, exposed through three observable status
//! slots downstream code can trust without races.
//!
//! # Event flow
//!
//! ```text
//! user intent ─────────┐
//! trigger handler ─────┼──► EventIntake ──► worker task ──► transitions
//! driver callbacks ──► CallbackAggregator ─┘                    │
//!                                                               ▼
//!                                       watch: ScannerStatus, SurfaceState,
//!                                              Option<ScanResult>
//! ```
//!
//! Events are drained strictly one at a time; a transition's side
//! effects (driver calls, hardware feedback, status publication) finish
//! before the next event is looked at. Events submitted before the
//! machine exists are held in order and flushed ahead of later
//! submissions once it appears.
//!
//! # Quickstart
//!
//! ```no_run
//! use std::sync::Arc;
//! use tokio::sync::watch;
//!
//! use scanlink_core::ScannerSettings;
//! use scanlink_driver::mock::{MockDecoder, MockFeedback};
//! use scanlink_driver::{FixedCameraProvider, SurfaceHandle};
//! use scanlink_reader::ReaderMachine;
//!
//! # #[tokio::main] async fn main() {
//! let (driver, _handle) = MockDecoder::new();
//! let (_settings_tx, settings_rx) = watch::channel(ScannerSettings::default());
//!
//! let reader = ReaderMachine::spawn(
//!     driver,
//!     &FixedCameraProvider(1),
//!     Arc::new(MockFeedback::new()),
//!     settings_rx,
//! );
//!
//! reader.launch();
//! reader.set_surface(SurfaceHandle(1));
//! reader.start();
//!
//! let mut output = reader.output();
//! let result = output.wait_for(|o| o.is_some()).await.unwrap();
//! println!("scanned: {:?}", result.as_ref().unwrap().first_text());
//! # }
//! ```

pub mod aggregator;
pub mod event;
pub mod intake;
pub mod machine;
pub mod state;
pub mod trigger;

pub use aggregator::CallbackAggregator;
pub use event::{ReaderEvent, SystemEvent, UserEvent};
pub use intake::EventIntake;
pub use machine::{ReaderHandle, ReaderMachine};
pub use state::{ReaderState, ReadingKind};
pub use trigger::{
    MockTriggerHandle, MockTriggerSource, TriggerError, TriggerHandler, TriggerSignal,
    TriggerSignalSource,
};
