//! Decoder driver abstraction layer for the scanlink coordinator.
//!
//! This crate isolates the opaque vendor decoder SDK behind a trait
//! boundary and wraps it in an adapter that never lets a hardware fault
//! escape as an error value: link failures, open failures, and rejected
//! parameter or control calls all degrade into a [`DriverState`] phase
//! that the reader state machine observes through a watch slot.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────┐     ┌───────────────┐     ┌──────────────────┐
//! │ Reader state      │────►│ ReaderAdapter │────►│ DecoderDriver    │
//! │ machine (worker)  │     │ (never throws)│     │ (vendor handle)  │
//! └───────────────────┘     └───────┬───────┘     └────────┬─────────┘
//!                                   │                      │ callbacks
//!                                   ▼                      ▼
//!                           watch<DriverState>     DriverCallbacks sink
//! ```
//!
//! The [`mock`] module provides a scriptable in-memory driver for
//! development and tests, following the same handle pattern as real
//! vendor bindings.
//!
//! [`DriverState`]: scanlink_core::DriverState

pub mod adapter;
pub mod error;
pub mod mock;
pub mod params;
pub mod traits;

pub use adapter::ReaderAdapter;
pub use error::{DriverError, Result};
pub use traits::{
    CameraProvider, DecoderDriver, DriverCallbacks, FixedCameraProvider, HardwareFeedback,
    SurfaceHandle,
};
