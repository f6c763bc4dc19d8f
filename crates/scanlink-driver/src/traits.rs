//! Decoder driver and feedback trait definitions.
//!
//! These traits establish the contract between the coordinator core and
//! the vendor decoder SDK, enabling substitution between the mock driver
//! (for development and testing) and a real vendor binding. The decoder
//! surface is deliberately synchronous: the vendor SDK is a C-style
//! handle API, and all calls happen from within the state machine's
//! single worker context.

use std::sync::Arc;

use bytes::Bytes;

use crate::error::Result;

/// Opaque video surface handle supplied by the host.
///
/// The coordinator never inspects the handle; it is forwarded verbatim to
/// the driver's preview target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceHandle(pub u64);

/// Sink for asynchronous driver notifications.
///
/// Installed on the driver at open time; the driver invokes these from its
/// own callback context, in the order the hardware produced them. The
/// implementation must not block.
pub trait DriverCallbacks: Send + Sync {
    /// A decode session completed.
    ///
    /// `data` is `None` when the session ended without a successful read
    /// (timeout, cancel).
    fn on_decode_complete(&self, symbology: i32, length: i32, data: Option<Bytes>);

    /// A generic driver event occurred.
    fn on_event(&self, code: i32, info: i32, data: Option<Bytes>);

    /// The driver reported an error.
    fn on_error(&self, code: i32);

    /// A preview frame became available.
    fn on_frame_available(&self);
}

/// Opaque decoder driver, the vendor SDK surface.
///
/// Implementations wrap a single hardware handle. All methods are invoked
/// from the state machine's worker; the driver may invoke the installed
/// [`DriverCallbacks`] sink from any thread.
pub trait DecoderDriver: Send + 'static {
    /// Load and link the native driver libraries.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Link`](crate::DriverError::Link) when the
    /// native libraries are missing or unusable on this device, or another
    /// variant for any other failure during loading.
    fn link(&mut self) -> Result<()>;

    /// Open the decoder handle against the given camera.
    ///
    /// Returns the vendor-assigned reader id.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle cannot be acquired.
    fn open(&mut self, camera_index: u32) -> Result<i32>;

    /// Reset all engine parameters to vendor defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if no handle is open or the reset is rejected.
    fn set_default_parameters(&mut self) -> Result<()>;

    /// Write a single engine parameter.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameter is rejected.
    fn set_parameter(&mut self, id: u32, value: i32) -> Result<()>;

    /// Install the callback sink for decode/error/event/frame callbacks.
    fn set_callback_sink(&mut self, sink: Arc<dyn DriverCallbacks>);

    /// Detach the callback sink. Safe to call when none is installed.
    fn clear_callback_sink(&mut self);

    /// Attach a display/preview target.
    ///
    /// # Errors
    ///
    /// Returns an error if no handle is open.
    fn bind_surface(&mut self, surface: SurfaceHandle) -> Result<()>;

    /// Start a decode session.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine rejects the session.
    fn start_decode(&mut self) -> Result<()>;

    /// Stop any in-flight decode session.
    ///
    /// # Errors
    ///
    /// Returns an error if the stop call fails.
    fn stop_decode(&mut self) -> Result<()>;

    /// Start a continuous hands-free decode session.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot enter hands-free mode.
    fn start_hands_free(&mut self, mode: i32) -> Result<()>;

    /// Release the hardware handle. Safe to call when none is open.
    fn release(&mut self);
}

/// Camera availability, used only to pick the open-call camera index.
pub trait CameraProvider {
    /// Number of cameras the host reports.
    fn camera_count(&self) -> usize;
}

/// Camera provider with a fixed count, for hosts that enumerate once.
#[derive(Debug, Clone, Copy)]
pub struct FixedCameraProvider(pub usize);

impl CameraProvider for FixedCameraProvider {
    fn camera_count(&self) -> usize {
        self.0
    }
}

/// Audio and vibration feedback hardware.
///
/// Calls are fire-and-forget transition side effects; failures are not
/// recoverable and the signatures are infallible.
pub trait HardwareFeedback: Send + Sync {
    /// Play a tone with the device default duration.
    fn beep(&self, tone: scanlink_core::BeepTone);

    /// Play a tone for the given duration in milliseconds.
    fn beep_for(&self, tone: scanlink_core::BeepTone, millis: u64);

    /// Fire the vibration motor.
    fn vibrate(&self);
}
