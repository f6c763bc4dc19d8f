//! Scanner status, driver phase, surface, and scan result value types.
//!
//! These are the externally observable projections published by the reader
//! state machine, plus the driver-side phase record owned by the adapter.
//! All of them are plain value types: the machine produces them, observers
//! read the latest value, nothing here carries behavior of its own.

use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::NO_READER_ID;

/// Decode session mode.
///
/// `Manual` requires an explicit start per scan; `HandsFree` keeps the
/// driver armed continuously and re-arms after every result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Manual,
    HandsFree,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Manual => write!(f, "Manual"),
            Mode::HandsFree => write!(f, "HandsFree"),
        }
    }
}

/// Externally observable scanner status.
///
/// This is the projection of the internal lifecycle state applied after
/// every completed transition. Observers can trust that it always reflects
/// the last completed transition's target state, never an intermediate one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Reader is powered down or being torn down.
    Off,

    /// Driver bring-up in progress.
    Initializing,

    /// Reader is open and idle (includes waiting for a video surface).
    Ready,

    /// A decode session is running.
    Scanning,

    /// An image or video capture session is running.
    Capturing,

    /// Driver bring-up or a decode session failed.
    Failed,

    /// Native driver is missing or unusable on this device.
    Unavailable,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Off => "Off",
            Status::Initializing => "Initializing",
            Status::Ready => "Ready",
            Status::Scanning => "Scanning",
            Status::Capturing => "Capturing",
            Status::Failed => "Failed",
            Status::Unavailable => "Unavailable",
        };
        write!(f, "{}", s)
    }
}

/// Scanner identity and per-symbology configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannerProperties {
    /// Vendor-assigned reader id (`-1` before a handle is open).
    pub id: i32,

    /// Symbology-id → parameter-value configuration map.
    pub codes_config: BTreeMap<u32, i32>,
}

impl ScannerProperties {
    /// Properties before any reader has been opened.
    pub const INITIAL: ScannerProperties = ScannerProperties {
        id: NO_READER_ID,
        codes_config: BTreeMap::new(),
    };
}

impl Default for ScannerProperties {
    fn default() -> Self {
        Self::INITIAL
    }
}

/// Complete externally observable scanner state.
///
/// Published by the state machine as a single current-value slot; readers
/// always observe the most recently completed transition's projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannerStatus {
    /// Reader id mirrored from the driver handle.
    pub id: i32,

    /// Lifecycle status projection.
    pub status: Status,

    /// Current decode session mode.
    pub mode: Mode,

    /// Scanner identity and configuration.
    pub properties: ScannerProperties,
}

impl ScannerStatus {
    /// Status before the machine has processed any event.
    pub const INITIAL: ScannerStatus = ScannerStatus {
        id: NO_READER_ID,
        status: Status::Off,
        mode: Mode::Manual,
        properties: ScannerProperties::INITIAL,
    };
}

impl Default for ScannerStatus {
    fn default() -> Self {
        Self::INITIAL
    }
}

/// Raw health of the opaque driver handle.
///
/// Distinct from the lifecycle state machine: this mirrors what the vendor
/// handle itself reports, independent of where the machine is in its own
/// richer state model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverPhase {
    Uninitialized,
    Initializing,
    Ready,
    Reading,
    /// A parameter or control call failed after the handle opened.
    Exception,
    /// The native driver could not be linked at all.
    Unavailable,
}

impl fmt::Display for DriverPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DriverPhase::Uninitialized => "Uninitialized",
            DriverPhase::Initializing => "Initializing",
            DriverPhase::Ready => "Ready",
            DriverPhase::Reading => "Reading",
            DriverPhase::Exception => "Exception",
            DriverPhase::Unavailable => "Unavailable",
        };
        write!(f, "{}", s)
    }
}

/// Driver handle identity and phase, owned by the driver adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverState {
    /// Vendor handle id (`-1` when no handle is open).
    pub id: i32,

    /// Current handle phase.
    pub phase: DriverPhase,
}

impl DriverState {
    /// State before any open attempt.
    pub const INITIAL: DriverState = DriverState {
        id: NO_READER_ID,
        phase: DriverPhase::Uninitialized,
    };

    /// Create a driver state for an unopened handle in the given phase.
    pub fn unopened(phase: DriverPhase) -> Self {
        Self {
            id: NO_READER_ID,
            phase,
        }
    }
}

impl Default for DriverState {
    fn default() -> Self {
        Self::INITIAL
    }
}

/// Video surface binding status.
///
/// `Requested` when the machine enters `AwaitingSurface`, `Available` once
/// the host supplies a surface, reset to `Ignored` on teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceState {
    Ignored,
    Requested,
    Available,
}

/// One decoded value within a scan result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScanPayload {
    /// Decoded data interpreted as UTF-8 text.
    Text {
        timestamp: DateTime<Utc>,
        size: usize,
        value: Option<String>,
    },

    /// Raw decoded bytes.
    Bytes {
        timestamp: DateTime<Utc>,
        size: usize,
        #[serde(with = "serde_bytes_compat")]
        value: Bytes,
    },
}

impl ScanPayload {
    /// Size of the decoded data in bytes.
    pub fn size(&self) -> usize {
        match self {
            ScanPayload::Text { size, .. } | ScanPayload::Bytes { size, .. } => *size,
        }
    }

    /// Timestamp of the decode.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            ScanPayload::Text { timestamp, .. } | ScanPayload::Bytes { timestamp, .. } => {
                *timestamp
            }
        }
    }
}

/// Result of a completed decode session.
///
/// Exclusively produced and cleared by the state machine; absent outside an
/// active scan result window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    /// When the result was published.
    pub timestamp: DateTime<Utc>,

    /// Decoded values, in decode order.
    pub payload: Vec<ScanPayload>,
}

impl ScanResult {
    /// Build a result holding a single text payload decoded from raw bytes.
    ///
    /// Invalid UTF-8 yields `value: None` while preserving the reported
    /// size, so a lossy decode is still observable as a completed scan.
    pub fn from_text_bytes(data: &[u8]) -> Self {
        let now = Utc::now();
        Self {
            timestamp: now,
            payload: vec![ScanPayload::Text {
                timestamp: now,
                size: data.len(),
                value: std::str::from_utf8(data).ok().map(str::to_owned),
            }],
        }
    }

    /// First text value in the payload, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.payload.iter().find_map(|p| match p {
            ScanPayload::Text {
                value: Some(v), ..
            } => Some(v.as_str()),
            _ => None,
        })
    }
}

/// Audio feedback tones supported by the hardware provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BeepTone {
    Hz440,
    Hz880,
    Hz1320,
    Hz1760,
    Hz2200,
    Hz2640,
    Hz3080,
}

impl BeepTone {
    /// Tone frequency in hertz.
    pub fn hz(&self) -> u32 {
        match self {
            BeepTone::Hz440 => 440,
            BeepTone::Hz880 => 880,
            BeepTone::Hz1320 => 1320,
            BeepTone::Hz1760 => 1760,
            BeepTone::Hz2200 => 2200,
            BeepTone::Hz2640 => 2640,
            BeepTone::Hz3080 => 3080,
        }
    }
}

mod serde_bytes_compat {
    //! Serialize `bytes::Bytes` as a plain byte sequence.

    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        let v = Vec::<u8>::deserialize(deserializer)?;
        Ok(Bytes::from(v))
    }
}
