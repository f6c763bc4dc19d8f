//! Reader lifecycle states and the status projection.
//!
//! The lifecycle state is the machine-internal single source of truth;
//! [`ReaderState::status`] is the pure, total projection applied to the
//! externally observable [`Status`] after every completed transition.
//!
//! # States
//!
//! - `Idle`: initial state, nothing launched yet
//! - `Initializing`: driver bring-up in progress
//! - `AwaitingSurface`: open succeeded, waiting for a video surface
//! - `Ready`: open and surface-bound, no decode session running
//! - `Reading(Scanning | Image | Video)`: an active session
//! - `Failure`: bring-up or session failed; recoverable via teardown
//! - `Stopping`: teardown in progress
//! - `Stopped`: resting state; a new `Launch` re-enters `Initializing`
//!
//! `Reading::Image` and `Reading::Video` are declared with projection
//! mappings but no transition currently targets them; they exist so the
//! capture-session extension does not change the projection table.

use std::fmt;

use serde::{Deserialize, Serialize};

use scanlink_core::Status;

/// Kind of active reading session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingKind {
    /// Barcode decode session.
    Scanning,

    /// Still image capture session.
    Image,

    /// Video capture session.
    Video,
}

/// Reader lifecycle state.
///
/// Exactly one state is active at any observation point. `Idle` is
/// initial; `Stopped` and `Failure` are resting states reachable from
/// active operation; the machine never terminates permanently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReaderState {
    Idle,
    Initializing,
    AwaitingSurface,
    Ready,
    Reading(ReadingKind),
    Failure,
    Stopping,
    Stopped,
}

impl ReaderState {
    /// Project this lifecycle state onto the observable status.
    ///
    /// Pure and total over every declared state.
    pub fn status(&self) -> Status {
        match self {
            ReaderState::Reading(ReadingKind::Scanning) => Status::Scanning,
            ReaderState::Reading(ReadingKind::Image) | ReaderState::Reading(ReadingKind::Video) => {
                Status::Capturing
            }
            ReaderState::Initializing => Status::Initializing,
            ReaderState::Ready | ReaderState::AwaitingSurface => Status::Ready,
            ReaderState::Failure => Status::Failed,
            ReaderState::Idle | ReaderState::Stopped | ReaderState::Stopping => Status::Off,
        }
    }

    /// Whether a `Release` teardown applies from this state.
    ///
    /// Teardown is meaningful from any state that may hold driver
    /// resources, including `Failure` (the only recovery path out of it).
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            ReaderState::Initializing
                | ReaderState::AwaitingSurface
                | ReaderState::Ready
                | ReaderState::Reading(_)
                | ReaderState::Failure
        )
    }
}

impl fmt::Display for ReaderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReaderState::Idle => "Idle",
            ReaderState::Initializing => "Initializing",
            ReaderState::AwaitingSurface => "AwaitingSurface",
            ReaderState::Ready => "Ready",
            ReaderState::Reading(ReadingKind::Scanning) => "Reading.Scanning",
            ReaderState::Reading(ReadingKind::Image) => "Reading.Image",
            ReaderState::Reading(ReadingKind::Video) => "Reading.Video",
            ReaderState::Failure => "Failure",
            ReaderState::Stopping => "Stopping",
            ReaderState::Stopped => "Stopped",
        };
        write!(f, "{}", s)
    }
}
