//! Mock decoder driver for testing and development.
//!
//! The mock simulates the vendor decoder SDK without physical hardware:
//! tests script failure modes and inject callbacks through a cloneable
//! [`MockDecoderHandle`], while the driver side is owned by the adapter
//! like a real handle would be.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;

use crate::error::{DriverError, Result};
use crate::traits::{DecoderDriver, DriverCallbacks, HardwareFeedback, SurfaceHandle};

#[derive(Default)]
struct MockState {
    sink: Option<Arc<dyn DriverCallbacks>>,
    fail_link: bool,
    fail_open: bool,
    fail_parameter: bool,
    fail_control: bool,
    fail_hands_free: bool,
    linked: bool,
    open_camera_index: Option<u32>,
    hands_free: bool,
    surface: Option<SurfaceHandle>,
    decode_starts: usize,
    decode_stops: usize,
    default_resets: usize,
    releases: usize,
    parameter_log: Vec<(u32, i32)>,
}

/// Mock decoder driver.
///
/// Create with [`MockDecoder::new`], which also returns the handle used to
/// script behavior and inject hardware callbacks.
///
/// # Examples
///
/// ```
/// use scanlink_driver::mock::MockDecoder;
/// use scanlink_driver::DecoderDriver;
///
/// let (mut driver, handle) = MockDecoder::new();
/// driver.link().unwrap();
/// let id = driver.open(1).unwrap();
/// assert_eq!(id, 1);
/// assert_eq!(handle.open_camera_index(), Some(1));
/// ```
pub struct MockDecoder {
    state: Arc<Mutex<MockState>>,
}

impl MockDecoder {
    /// Create a mock decoder and its controlling handle.
    pub fn new() -> (Self, MockDecoderHandle) {
        let state = Arc::new(Mutex::new(MockState::default()));
        (
            Self {
                state: state.clone(),
            },
            MockDecoderHandle { state },
        )
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl DecoderDriver for MockDecoder {
    fn link(&mut self) -> Result<()> {
        let mut s = self.lock();
        if s.fail_link {
            return Err(DriverError::link("mock native library missing"));
        }
        s.linked = true;
        Ok(())
    }

    fn open(&mut self, camera_index: u32) -> Result<i32> {
        let mut s = self.lock();
        if s.fail_open {
            return Err(DriverError::open("mock open failure"));
        }
        s.open_camera_index = Some(camera_index);
        Ok(1)
    }

    fn set_default_parameters(&mut self) -> Result<()> {
        let mut s = self.lock();
        if s.open_camera_index.is_none() {
            return Err(DriverError::control("no handle open"));
        }
        s.default_resets += 1;
        Ok(())
    }

    fn set_parameter(&mut self, id: u32, value: i32) -> Result<()> {
        let mut s = self.lock();
        if s.fail_parameter {
            return Err(DriverError::parameter(id, "mock parameter rejection"));
        }
        s.parameter_log.push((id, value));
        Ok(())
    }

    fn set_callback_sink(&mut self, sink: Arc<dyn DriverCallbacks>) {
        self.lock().sink = Some(sink);
    }

    fn clear_callback_sink(&mut self) {
        self.lock().sink = None;
    }

    fn bind_surface(&mut self, surface: SurfaceHandle) -> Result<()> {
        let mut s = self.lock();
        if s.open_camera_index.is_none() {
            return Err(DriverError::control("no handle open"));
        }
        s.surface = Some(surface);
        Ok(())
    }

    fn start_decode(&mut self) -> Result<()> {
        let mut s = self.lock();
        if s.fail_control {
            return Err(DriverError::control("mock decode start failure"));
        }
        s.decode_starts += 1;
        Ok(())
    }

    fn stop_decode(&mut self) -> Result<()> {
        let mut s = self.lock();
        if s.fail_control {
            return Err(DriverError::control("mock decode stop failure"));
        }
        s.decode_stops += 1;
        s.hands_free = false;
        Ok(())
    }

    fn start_hands_free(&mut self, _mode: i32) -> Result<()> {
        let mut s = self.lock();
        if s.fail_hands_free {
            return Err(DriverError::control("mock hands-free start failure"));
        }
        s.hands_free = true;
        Ok(())
    }

    fn release(&mut self) {
        let mut s = self.lock();
        s.releases += 1;
        s.open_camera_index = None;
        s.hands_free = false;
    }
}

/// Handle for scripting a [`MockDecoder`] and injecting callbacks.
///
/// Cloneable and shareable across tasks; injection methods invoke the
/// sink the adapter installed, exactly as vendor callback threads would.
#[derive(Clone)]
pub struct MockDecoderHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockDecoderHandle {
    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn sink(&self) -> Option<Arc<dyn DriverCallbacks>> {
        self.lock().sink.clone()
    }

    /// Make the next `link` call fail as a native link error.
    pub fn fail_link(&self, fail: bool) {
        self.lock().fail_link = fail;
    }

    /// Make `open` calls fail.
    pub fn fail_open(&self, fail: bool) {
        self.lock().fail_open = fail;
    }

    /// Make parameter writes fail.
    pub fn fail_parameter(&self, fail: bool) {
        self.lock().fail_parameter = fail;
    }

    /// Make decode start/stop calls fail.
    pub fn fail_control(&self, fail: bool) {
        self.lock().fail_control = fail;
    }

    /// Make hands-free decode start fail.
    pub fn fail_hands_free(&self, fail: bool) {
        self.lock().fail_hands_free = fail;
    }

    /// Camera index passed to the last successful `open`, if any.
    pub fn open_camera_index(&self) -> Option<u32> {
        self.lock().open_camera_index
    }

    /// Whether the engine is currently in hands-free mode.
    pub fn is_hands_free(&self) -> bool {
        self.lock().hands_free
    }

    /// Surface bound via `bind_surface`, if any.
    pub fn bound_surface(&self) -> Option<SurfaceHandle> {
        self.lock().surface
    }

    /// Number of `start_decode` calls observed.
    pub fn decode_start_count(&self) -> usize {
        self.lock().decode_starts
    }

    /// Number of `stop_decode` calls observed.
    pub fn decode_stop_count(&self) -> usize {
        self.lock().decode_stops
    }

    /// Number of `release` calls observed.
    pub fn release_count(&self) -> usize {
        self.lock().releases
    }

    /// All parameter writes observed, in order.
    pub fn parameter_log(&self) -> Vec<(u32, i32)> {
        self.lock().parameter_log.clone()
    }

    /// Whether a callback sink is currently installed.
    pub fn has_sink(&self) -> bool {
        self.lock().sink.is_some()
    }

    /// Inject a completed decode with the given payload.
    pub fn complete_decode(&self, symbology: i32, data: &[u8]) {
        if let Some(sink) = self.sink() {
            sink.on_decode_complete(symbology, data.len() as i32, Some(Bytes::copy_from_slice(data)));
        }
    }

    /// Inject a decode completion without payload (timeout/cancel).
    pub fn complete_decode_empty(&self, symbology: i32) {
        if let Some(sink) = self.sink() {
            sink.on_decode_complete(symbology, 0, None);
        }
    }

    /// Inject a generic driver event.
    pub fn emit_event(&self, code: i32, info: i32) {
        if let Some(sink) = self.sink() {
            sink.on_event(code, info, None);
        }
    }

    /// Inject a driver error.
    pub fn raise_error(&self, code: i32) {
        if let Some(sink) = self.sink() {
            sink.on_error(code);
        }
    }

    /// Inject a frame-available notification.
    pub fn frame_available(&self) {
        if let Some(sink) = self.sink() {
            sink.on_frame_available();
        }
    }
}

/// Hardware feedback recorder for tests.
///
/// Counts beep and vibration invocations; cloneable so tests can keep a
/// counter while the machine owns the provider.
#[derive(Clone, Default)]
pub struct MockFeedback {
    beeps: Arc<AtomicUsize>,
    vibrations: Arc<AtomicUsize>,
}

impl MockFeedback {
    /// Create a feedback recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of beep invocations (either variant).
    pub fn beep_count(&self) -> usize {
        self.beeps.load(Ordering::SeqCst)
    }

    /// Number of vibration invocations.
    pub fn vibrate_count(&self) -> usize {
        self.vibrations.load(Ordering::SeqCst)
    }
}

impl HardwareFeedback for MockFeedback {
    fn beep(&self, _tone: scanlink_core::BeepTone) {
        self.beeps.fetch_add(1, Ordering::SeqCst);
    }

    fn beep_for(&self, _tone: scanlink_core::BeepTone, _millis: u64) {
        self.beeps.fetch_add(1, Ordering::SeqCst);
    }

    fn vibrate(&self) {
        self.vibrations.fetch_add(1, Ordering::SeqCst);
    }
}
