//! Events driving the reader state machine.
//!
//! Events are immutable value records grouped by origin: `User` events
//! carry external intent (launch, trigger, mode changes), `System` events
//! carry driver callbacks and internal lifecycle notifications. The
//! machine never mutates an event after dispatch.

use bytes::Bytes;

use scanlink_core::{Mode, ScannerProperties};
use scanlink_driver::SurfaceHandle;

/// External user intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserEvent {
    /// Power the reader on (from `Idle` or `Stopped`).
    Launch,

    /// Tear the reader down from any active state.
    Release,

    /// Start a manual decode session.
    Start,

    /// Stop a manual decode session.
    Stop,

    /// Switch between manual and hands-free mode.
    SetMode(Mode),

    /// Replace the scanner's per-symbology configuration.
    SetProperties(ScannerProperties),
}

/// Driver callbacks and internal lifecycle notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemEvent {
    /// Driver bring-up finished and no surface is needed.
    InitReady,

    /// Driver bring-up finished; a video surface is required.
    InitAwaitingSurface,

    /// Driver bring-up failed.
    InitFailed,

    /// Driver teardown finished.
    InitClosed,

    /// A decode session completed.
    DecodeComplete {
        symbology: i32,
        length: i32,
        data: Option<Bytes>,
    },

    /// Generic driver event not special-cased by the aggregator.
    DriverEvent {
        code: i32,
        info: i32,
        data: Option<Bytes>,
    },

    /// The driver reported an error.
    DriverError { code: i32 },

    /// A preview frame became available.
    FrameAvailable,

    /// The host supplied a video surface.
    SetSurface(SurfaceHandle),

    /// Motion detected in the field of view.
    MotionDetected,

    /// The engine left scanning mode on its own.
    StopScanning,
}

/// Any event accepted by the state machine's intake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReaderEvent {
    User(UserEvent),
    System(SystemEvent),
}

impl From<UserEvent> for ReaderEvent {
    fn from(event: UserEvent) -> Self {
        ReaderEvent::User(event)
    }
}

impl From<SystemEvent> for ReaderEvent {
    fn from(event: SystemEvent) -> Self {
        ReaderEvent::System(event)
    }
}
