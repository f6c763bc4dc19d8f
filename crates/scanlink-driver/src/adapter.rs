//! Reader driver adapter.
//!
//! The adapter owns the opaque decoder handle and confines every vendor
//! side effect behind a never-throws boundary: link failures surface as
//! the `Unavailable` phase, operational failures as `Exception`, and no
//! fault ever propagates to the state machine as an error value. The
//! adapter holds no transition logic: it only mirrors raw handle health
//! into a [`DriverState`] watch slot.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, error, warn};

use scanlink_core::constants::STOP_TIMEOUT_PARAM_DIVISOR;
use scanlink_core::defaults;
use scanlink_core::{DriverPhase, DriverState, ScannerSettings};

use crate::error::Result;
use crate::params;
use crate::traits::{CameraProvider, DecoderDriver, DriverCallbacks, SurfaceHandle};

/// Driver adapter wrapping a [`DecoderDriver`] implementation.
///
/// All methods are synchronous and intended to be invoked only from the
/// state machine's worker context; the watch slot is the single point
/// where other contexts observe handle health.
pub struct ReaderAdapter<D> {
    driver: D,
    camera_count: usize,
    state_tx: watch::Sender<DriverState>,
    open: bool,
}

impl<D: DecoderDriver> ReaderAdapter<D> {
    /// Create an adapter over a driver, reading the camera count once.
    pub fn new(driver: D, cameras: &impl CameraProvider) -> Self {
        let (state_tx, _) = watch::channel(DriverState::INITIAL);
        Self {
            driver,
            camera_count: cameras.camera_count(),
            state_tx,
            open: false,
        }
    }

    /// Subscribe to driver handle state.
    pub fn driver_state(&self) -> watch::Receiver<DriverState> {
        self.state_tx.subscribe()
    }

    /// Current driver handle state snapshot.
    pub fn state(&self) -> DriverState {
        *self.state_tx.borrow()
    }

    /// Open and configure the decoder.
    ///
    /// Links the native driver, opens the handle against the camera path
    /// this device supports, installs the callback sink, and applies the
    /// vendor baseline, the default symbology table, the supplied
    /// per-symbology settings, and the settings-derived engine parameters.
    ///
    /// Returns `false` on any failure; the failure class is visible in the
    /// driver state (`Unavailable` for link faults, `Exception` otherwise).
    /// Never panics or propagates an error.
    pub fn open(
        &mut self,
        sink: Arc<dyn DriverCallbacks>,
        code_settings: &BTreeMap<u32, i32>,
        settings: &ScannerSettings,
    ) -> bool {
        debug!("linking native decoder driver");
        if let Err(e) = self.driver.link() {
            if e.is_link_failure() {
                error!(error = %e, "native driver unavailable");
                self.set_state(DriverState::unopened(DriverPhase::Unavailable));
            } else {
                error!(error = %e, "driver link raised an exception");
                self.set_state(DriverState::unopened(DriverPhase::Exception));
            }
            return false;
        }
        self.set_state(DriverState::unopened(DriverPhase::Initializing));

        // Devices without a dedicated imager camera expose the engine on
        // index 0; otherwise the engine sits behind index 1.
        let camera_index = if self.camera_count == 0 { 0 } else { 1 };

        let id = match self.driver.open(camera_index) {
            Ok(id) => id,
            Err(e) => {
                error!(error = %e, camera_index, "failed to open decoder handle");
                self.set_state(DriverState::unopened(DriverPhase::Exception));
                return false;
            }
        };
        self.open = true;
        self.driver.set_callback_sink(sink);

        if let Err(e) = self.configure(code_settings, settings) {
            error!(error = %e, "decoder configuration failed");
            self.set_state(DriverState {
                id,
                phase: DriverPhase::Exception,
            });
            return false;
        }

        self.set_state(DriverState {
            id,
            phase: DriverPhase::Ready,
        });
        debug!(id, camera_index, "decoder open and configured");
        true
    }

    /// Close the decoder, stopping any in-flight decode.
    ///
    /// Idempotent: safe to call when no handle is open.
    pub fn close(&mut self) {
        if !self.open {
            debug!("close: no handle open");
            return;
        }
        if let Err(e) = self.driver.stop_decode() {
            warn!(error = %e, "stop decode during close failed");
        }
        self.driver.clear_callback_sink();
        self.driver.release();
        self.open = false;
        self.set_state(DriverState::INITIAL);
        debug!("decoder released");
    }

    /// Best-effort parameter application.
    ///
    /// Failures set the `Exception` phase and return `false`, but do not
    /// propagate.
    pub fn set_params(&mut self, map: &BTreeMap<u32, i32>) -> bool {
        debug!(count = map.len(), "applying parameters");
        for (&id, &value) in map {
            if let Err(e) = self.driver.set_parameter(id, value) {
                warn!(error = %e, id, value, "parameter rejected");
                self.set_phase(DriverPhase::Exception);
                return false;
            }
        }
        self.set_phase(DriverPhase::Ready);
        true
    }

    /// Start a decode session. Fire-and-forget; failures map to the
    /// `Exception` phase.
    pub fn start_decode(&mut self) {
        debug!("start decode");
        match self.driver.start_decode() {
            Ok(()) => self.set_phase(DriverPhase::Reading),
            Err(e) => {
                warn!(error = %e, "start decode failed");
                self.set_phase(DriverPhase::Exception);
            }
        }
    }

    /// Stop any in-flight decode session. Fire-and-forget.
    pub fn stop_decode(&mut self) {
        debug!("stop decode");
        match self.driver.stop_decode() {
            Ok(()) => self.set_phase(DriverPhase::Ready),
            Err(e) => {
                warn!(error = %e, "stop decode failed");
                self.set_phase(DriverPhase::Exception);
            }
        }
    }

    /// Attach a display/preview target. Does not change the driver phase.
    pub fn bind_surface(&mut self, surface: SurfaceHandle) {
        if let Err(e) = self.driver.bind_surface(surface) {
            warn!(error = %e, "surface binding failed");
        }
    }

    /// Switch the engine into continuous hands-free decode.
    ///
    /// Reports success so the caller can fall back to manual mode.
    pub fn enter_hands_free(&mut self) -> bool {
        let aim = self
            .driver
            .set_parameter(params::AIM_MODE_HANDS_FREE, params::AIM_ON_ALWAYS);
        let trig = self
            .driver
            .set_parameter(params::PRIM_TRIG_MODE, params::TRIG_MODE_HANDS_FREE);
        if let Err(e) = aim.and(trig) {
            warn!(error = %e, "hands-free parameter setup failed");
            self.set_phase(DriverPhase::Exception);
        }
        match self.driver.start_hands_free(params::TRIG_MODE_HANDS_FREE) {
            Ok(()) => {
                self.set_phase(DriverPhase::Reading);
                true
            }
            Err(e) => {
                warn!(error = %e, "hands-free decode start failed");
                self.set_phase(DriverPhase::Exception);
                false
            }
        }
    }

    /// Switch the engine back to level-triggered manual decode.
    pub fn exit_hands_free(&mut self) {
        for (id, value) in [
            (params::AIM_MODE_HANDS_FREE, params::AIM_OFF),
            (params::PRIM_TRIG_MODE, params::TRIG_MODE_LEVEL),
        ] {
            if let Err(e) = self.driver.set_parameter(id, value) {
                warn!(error = %e, id, "hands-free teardown parameter rejected");
                self.set_phase(DriverPhase::Exception);
            }
        }
        self.stop_decode();
    }

    /// Access the wrapped driver (mock inspection in tests).
    pub fn driver(&self) -> &D {
        &self.driver
    }

    fn configure(
        &mut self,
        code_settings: &BTreeMap<u32, i32>,
        settings: &ScannerSettings,
    ) -> Result<()> {
        for (&id, &value) in &defaults::sdk_baseline_params() {
            self.driver.set_parameter(id, value)?;
        }

        // Reset to vendor defaults, then layer the default symbology
        // table, then the externally supplied per-symbology settings.
        self.driver.set_default_parameters()?;
        for (&id, &value) in &defaults::default_code_params() {
            self.driver.set_parameter(id, value)?;
        }
        for (&id, &value) in code_settings {
            self.driver.set_parameter(id, value)?;
        }

        self.apply_settings_params(settings)
    }

    fn apply_settings_params(&mut self, settings: &ScannerSettings) -> Result<()> {
        let timeout_param = settings.stop_timeout_ms / STOP_TIMEOUT_PARAM_DIVISOR;
        for (id, value) in [
            (params::IMG_ILLUM, settings.flash_mode.param_value()),
            (params::IMG_AIM_MODE, settings.aim_mode.param_value()),
            (params::AIM_MODE_HANDS_FREE, settings.aim_mode.param_value()),
            (params::IMG_AIM_SNAPSHOT, settings.aim_mode.param_value()),
            (params::LASER_ON_PRIM, timeout_param),
            (params::IMG_SNAPTIMEOUT, timeout_param),
        ] {
            self.driver.set_parameter(id, value)?;
        }
        Ok(())
    }

    fn set_phase(&self, phase: DriverPhase) {
        self.state_tx.send_modify(|s| s.phase = phase);
    }

    fn set_state(&self, state: DriverState) {
        self.state_tx.send_replace(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockDecoder, MockFeedback};
    use crate::traits::FixedCameraProvider;
    use bytes::Bytes;

    fn noop_sink() -> Arc<dyn DriverCallbacks> {
        Arc::new(MockFeedbackSink)
    }

    struct MockFeedbackSink;

    impl DriverCallbacks for MockFeedbackSink {
        fn on_decode_complete(&self, _symbology: i32, _length: i32, _data: Option<Bytes>) {}
        fn on_event(&self, _code: i32, _info: i32, _data: Option<Bytes>) {}
        fn on_error(&self, _code: i32) {}
        fn on_frame_available(&self) {}
    }

    #[test]
    fn test_open_success_reaches_ready() {
        let (driver, handle) = MockDecoder::new();
        let mut adapter = ReaderAdapter::new(driver, &FixedCameraProvider(1));

        let settings = ScannerSettings::default();
        assert!(adapter.open(noop_sink(), &settings.code_settings, &settings));

        let state = adapter.state();
        assert_eq!(state.phase, DriverPhase::Ready);
        assert_eq!(state.id, 1);
        assert_eq!(handle.open_camera_index(), Some(1));
        // Baseline params were applied
        assert!(handle.parameter_log().iter().any(|&(id, _)| id == 765));
        // Settings-derived illumination was applied
        assert!(
            handle
                .parameter_log()
                .iter()
                .any(|&(id, v)| id == params::IMG_ILLUM && v == 1)
        );
    }

    #[test]
    fn test_open_without_camera_uses_index_zero() {
        let (driver, handle) = MockDecoder::new();
        let mut adapter = ReaderAdapter::new(driver, &FixedCameraProvider(0));

        let settings = ScannerSettings::default();
        assert!(adapter.open(noop_sink(), &settings.code_settings, &settings));
        assert_eq!(handle.open_camera_index(), Some(0));
    }

    #[test]
    fn test_link_failure_is_unavailable() {
        let (driver, handle) = MockDecoder::new();
        handle.fail_link(true);
        let mut adapter = ReaderAdapter::new(driver, &FixedCameraProvider(1));

        let settings = ScannerSettings::default();
        assert!(!adapter.open(noop_sink(), &settings.code_settings, &settings));
        assert_eq!(adapter.state().phase, DriverPhase::Unavailable);
        assert_eq!(adapter.state().id, -1);
    }

    #[test]
    fn test_open_failure_is_exception() {
        let (driver, handle) = MockDecoder::new();
        handle.fail_open(true);
        let mut adapter = ReaderAdapter::new(driver, &FixedCameraProvider(1));

        let settings = ScannerSettings::default();
        assert!(!adapter.open(noop_sink(), &settings.code_settings, &settings));
        assert_eq!(adapter.state().phase, DriverPhase::Exception);
        assert_eq!(adapter.state().id, -1);
    }

    #[test]
    fn test_close_is_idempotent() {
        let (driver, handle) = MockDecoder::new();
        let mut adapter = ReaderAdapter::new(driver, &FixedCameraProvider(1));

        let settings = ScannerSettings::default();
        assert!(adapter.open(noop_sink(), &settings.code_settings, &settings));

        adapter.close();
        assert_eq!(handle.release_count(), 1);
        assert_eq!(adapter.state(), DriverState::INITIAL);

        // Second close is a no-op
        adapter.close();
        assert_eq!(handle.release_count(), 1);
    }

    #[test]
    fn test_set_params_failure_is_exception() {
        let (driver, handle) = MockDecoder::new();
        let mut adapter = ReaderAdapter::new(driver, &FixedCameraProvider(1));
        let settings = ScannerSettings::default();
        assert!(adapter.open(noop_sink(), &settings.code_settings, &settings));

        handle.fail_parameter(true);
        let map = BTreeMap::from([(8u32, 1i32)]);
        assert!(!adapter.set_params(&map));
        assert_eq!(adapter.state().phase, DriverPhase::Exception);

        handle.fail_parameter(false);
        assert!(adapter.set_params(&map));
        assert_eq!(adapter.state().phase, DriverPhase::Ready);
    }

    #[test]
    fn test_decode_control_phases() {
        let (driver, handle) = MockDecoder::new();
        let mut adapter = ReaderAdapter::new(driver, &FixedCameraProvider(1));
        let settings = ScannerSettings::default();
        assert!(adapter.open(noop_sink(), &settings.code_settings, &settings));

        adapter.start_decode();
        assert_eq!(adapter.state().phase, DriverPhase::Reading);
        assert_eq!(handle.decode_start_count(), 1);

        adapter.stop_decode();
        assert_eq!(adapter.state().phase, DriverPhase::Ready);

        handle.fail_control(true);
        adapter.start_decode();
        assert_eq!(adapter.state().phase, DriverPhase::Exception);
    }

    #[test]
    fn test_hands_free_round_trip() {
        let (driver, handle) = MockDecoder::new();
        let mut adapter = ReaderAdapter::new(driver, &FixedCameraProvider(1));
        let settings = ScannerSettings::default();
        assert!(adapter.open(noop_sink(), &settings.code_settings, &settings));

        assert!(adapter.enter_hands_free());
        assert!(handle.is_hands_free());
        assert_eq!(adapter.state().phase, DriverPhase::Reading);

        adapter.exit_hands_free();
        assert!(!handle.is_hands_free());
        assert_eq!(adapter.state().phase, DriverPhase::Ready);
    }

    #[test]
    fn test_hands_free_failure_reports_false() {
        let (driver, handle) = MockDecoder::new();
        handle.fail_hands_free(true);
        let mut adapter = ReaderAdapter::new(driver, &FixedCameraProvider(1));
        let settings = ScannerSettings::default();
        assert!(adapter.open(noop_sink(), &settings.code_settings, &settings));

        assert!(!adapter.enter_hands_free());
        assert_eq!(adapter.state().phase, DriverPhase::Exception);
    }

    #[test]
    fn test_bind_surface_keeps_phase() {
        let (driver, handle) = MockDecoder::new();
        let mut adapter = ReaderAdapter::new(driver, &FixedCameraProvider(1));
        let settings = ScannerSettings::default();
        assert!(adapter.open(noop_sink(), &settings.code_settings, &settings));

        adapter.bind_surface(SurfaceHandle(7));
        assert_eq!(handle.bound_surface(), Some(SurfaceHandle(7)));
        assert_eq!(adapter.state().phase, DriverPhase::Ready);
    }

    #[test]
    fn test_mock_feedback_records() {
        let feedback = MockFeedback::new();
        use crate::traits::HardwareFeedback;
        feedback.beep(scanlink_core::BeepTone::Hz1760);
        feedback.vibrate();
        assert_eq!(feedback.beep_count(), 1);
        assert_eq!(feedback.vibrate_count(), 1);
    }
}
