//! Core domain types for the scanlink barcode reader coordinator.
//!
//! This crate defines the value types shared by the driver adapter and the
//! reader state machine: scanner status projections, surface binding state,
//! scan results, driver phase tracking, and the settings snapshot consulted
//! at transition time. It holds no behavior beyond construction, validation,
//! and the embedded vendor default tables.

pub mod constants;
pub mod defaults;
pub mod error;
pub mod settings;
pub mod types;

pub use error::{CoreError, Result};
pub use settings::{AimMode, BeepMode, FlashMode, ScannerSettings, VibrationMode};
pub use types::{
    BeepTone, DriverPhase, DriverState, Mode, ScanPayload, ScanResult, ScannerProperties,
    ScannerStatus, Status, SurfaceState,
};

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
