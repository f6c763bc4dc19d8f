//! The reader state machine.
//!
//! A single worker task owns the lifecycle state, the driver adapter and
//! the three observable status slots. Events enter through the ordered
//! intake and are drained one at a time; handling of an event fully
//! completes, including every driver call, feedback call and status
//! update, before the next event is looked at, so transitions never
//! interleave.
//!
//! Internal follow-up events raised by entry actions (init outcome,
//! teardown completion) are dispatched synchronously within the same
//! drain step, ahead of anything still queued in the intake.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use scanlink_core::{
    BeepMode, BeepTone, Mode, ScanResult, ScannerProperties, ScannerSettings, ScannerStatus,
    SurfaceState, VibrationMode,
};
use scanlink_driver::{
    CameraProvider, DecoderDriver, HardwareFeedback, ReaderAdapter, SurfaceHandle,
};

use crate::aggregator::CallbackAggregator;
use crate::event::{ReaderEvent, SystemEvent, UserEvent};
use crate::intake::EventIntake;
use crate::state::{ReaderState, ReadingKind};

/// Cloneable handle to a running reader machine.
///
/// Carries the event intake and the three observable slots. Dropping
/// every handle does not stop the worker; the machine is built to live
/// for the lifetime of the host service, with `Release` as the way to
/// power the hardware down.
#[derive(Clone)]
pub struct ReaderHandle {
    intake: EventIntake,
    status: watch::Receiver<ScannerStatus>,
    surface: watch::Receiver<SurfaceState>,
    output: watch::Receiver<Option<ScanResult>>,
}

impl ReaderHandle {
    /// Submit any event to the machine.
    pub fn submit(&self, event: impl Into<ReaderEvent>) {
        self.intake.submit(event);
    }

    /// Power the reader on.
    pub fn launch(&self) {
        self.intake.submit(UserEvent::Launch);
    }

    /// Tear the reader down.
    pub fn release(&self) {
        self.intake.submit(UserEvent::Release);
    }

    /// Start a manual decode session.
    pub fn start(&self) {
        self.intake.submit(UserEvent::Start);
    }

    /// Stop a manual decode session.
    pub fn stop(&self) {
        self.intake.submit(UserEvent::Stop);
    }

    /// Switch between manual and hands-free mode.
    pub fn set_mode(&self, mode: Mode) {
        self.intake.submit(UserEvent::SetMode(mode));
    }

    /// Hand the machine a video surface.
    pub fn set_surface(&self, surface: SurfaceHandle) {
        self.intake.submit(SystemEvent::SetSurface(surface));
    }

    /// The intake feeding this machine, for wiring up producers.
    pub fn intake(&self) -> EventIntake {
        self.intake.clone()
    }

    /// Subscribe to lifecycle/mode status.
    pub fn status(&self) -> watch::Receiver<ScannerStatus> {
        self.status.clone()
    }

    /// Subscribe to surface binding status.
    pub fn surface_state(&self) -> watch::Receiver<SurfaceState> {
        self.surface.clone()
    }

    /// Subscribe to the latest scan output.
    pub fn output(&self) -> watch::Receiver<Option<ScanResult>> {
        self.output.clone()
    }
}

/// The state machine worker.
///
/// Construct via [`ReaderMachine::spawn`]; the struct itself never
/// leaves the worker task.
pub struct ReaderMachine<D> {
    adapter: ReaderAdapter<D>,
    sink: Arc<CallbackAggregator>,
    feedback: Arc<dyn HardwareFeedback>,
    settings: watch::Receiver<ScannerSettings>,
    rx: mpsc::UnboundedReceiver<ReaderEvent>,
    state: ReaderState,
    mode: Mode,
    status_tx: watch::Sender<ScannerStatus>,
    surface_tx: watch::Sender<SurfaceState>,
    output_tx: watch::Sender<Option<ScanResult>>,
}

impl<D: DecoderDriver> ReaderMachine<D> {
    /// Spawn a machine with a fresh intake.
    pub fn spawn(
        driver: D,
        cameras: &impl CameraProvider,
        feedback: Arc<dyn HardwareFeedback>,
        settings: watch::Receiver<ScannerSettings>,
    ) -> ReaderHandle {
        let intake = EventIntake::new();
        // A fresh intake always binds.
        Self::spawn_with_intake(intake, driver, cameras, feedback, settings)
            .expect("fresh intake cannot be bound already")
    }

    /// Spawn a machine onto a pre-existing intake.
    ///
    /// Lets producers (trigger handler, host glue) be wired before the
    /// machine exists; events they submit in the meantime are held in
    /// the intake's buffer and processed first. Returns `None` if the
    /// intake already feeds another machine.
    pub fn spawn_with_intake(
        intake: EventIntake,
        driver: D,
        cameras: &impl CameraProvider,
        feedback: Arc<dyn HardwareFeedback>,
        settings: watch::Receiver<ScannerSettings>,
    ) -> Option<ReaderHandle> {
        let rx = intake.bind()?;
        let (status_tx, status_rx) = watch::channel(ScannerStatus::INITIAL);
        let (surface_tx, surface_rx) = watch::channel(SurfaceState::Ignored);
        let (output_tx, output_rx) = watch::channel(None);

        let machine = Self {
            adapter: ReaderAdapter::new(driver, cameras),
            sink: Arc::new(CallbackAggregator::new(intake.clone())),
            feedback,
            settings,
            rx,
            state: ReaderState::Idle,
            mode: Mode::Manual,
            status_tx,
            surface_tx,
            output_tx,
        };
        tokio::spawn(machine.run());

        Some(ReaderHandle {
            intake,
            status: status_rx,
            surface: surface_rx,
            output: output_rx,
        })
    }

    async fn run(mut self) {
        debug!("reader state machine worker started");
        while let Some(event) = self.rx.recv().await {
            self.dispatch(event);
        }
        debug!("reader state machine worker finished");
    }

    /// Handle one event to completion, including synchronous follow-ups
    /// raised by entry actions.
    fn dispatch(&mut self, event: ReaderEvent) {
        let mut next = Some(event);
        while let Some(event) = next.take() {
            debug!(state = %self.state, ?event, "processing event");
            let target = match event {
                ReaderEvent::User(e) => self.handle_user(e),
                ReaderEvent::System(e) => self.handle_system(e),
            };
            match target {
                Some(state) => next = self.complete_transition(state).map(Into::into),
                None => debug!(state = %self.state, "no transition, event dropped"),
            }
        }
    }

    /// Apply a transition: switch state, run entry actions, publish the
    /// status projection. Returns a follow-up event raised on entry.
    fn complete_transition(&mut self, target: ReaderState) -> Option<SystemEvent> {
        debug!(from = %self.state, to = %target, "transition complete");
        self.state = target;
        let follow_up = self.enter(target);
        self.publish_status();
        follow_up
    }

    fn handle_user(&mut self, event: UserEvent) -> Option<ReaderState> {
        match event {
            UserEvent::Launch => match self.state {
                ReaderState::Idle | ReaderState::Stopped => Some(ReaderState::Initializing),
                _ => None,
            },

            UserEvent::Release => self.state.is_active().then_some(ReaderState::Stopping),

            UserEvent::Start => {
                if self.state == ReaderState::Ready && self.mode == Mode::Manual {
                    self.feedback_on_scan_start();
                    self.adapter.start_decode();
                    Some(ReaderState::Reading(ReadingKind::Scanning))
                } else {
                    None
                }
            }

            UserEvent::Stop => {
                let stoppable = matches!(
                    self.state,
                    ReaderState::Ready | ReaderState::Reading(ReadingKind::Scanning)
                );
                if stoppable && self.mode == Mode::Manual {
                    self.adapter.stop_decode();
                    Some(ReaderState::Ready)
                } else {
                    None
                }
            }

            UserEvent::SetMode(mode) => {
                let switchable = matches!(
                    self.state,
                    ReaderState::Ready | ReaderState::Reading(ReadingKind::Scanning)
                );
                if switchable && mode != self.mode {
                    Some(self.switch_mode(mode))
                } else {
                    None
                }
            }

            UserEvent::SetProperties(properties) => {
                self.apply_properties(properties);
                None
            }
        }
    }

    fn handle_system(&mut self, event: SystemEvent) -> Option<ReaderState> {
        match event {
            SystemEvent::InitReady => {
                (self.state == ReaderState::Initializing).then_some(ReaderState::Ready)
            }

            SystemEvent::InitAwaitingSurface => {
                (self.state == ReaderState::Initializing).then_some(ReaderState::AwaitingSurface)
            }

            SystemEvent::InitFailed => {
                (self.state == ReaderState::Initializing).then_some(ReaderState::Failure)
            }

            SystemEvent::InitClosed => {
                (self.state == ReaderState::Stopping).then_some(ReaderState::Stopped)
            }

            SystemEvent::SetSurface(surface) => {
                if self.state != ReaderState::AwaitingSurface {
                    return None;
                }
                self.adapter.bind_surface(surface);
                self.publish_surface(SurfaceState::Available);
                Some(ReaderState::Ready)
            }

            SystemEvent::DecodeComplete {
                symbology,
                length,
                data,
            } => {
                if self.state != ReaderState::Reading(ReadingKind::Scanning) {
                    return None;
                }
                // Empty completions (timeout, aborted session) carry no
                // payload and are guard-rejected.
                let data = data?;
                debug!(symbology, length, "decode complete with payload");
                self.feedback_on_scan_end();
                self.output_tx
                    .send_replace(Some(ScanResult::from_text_bytes(&data)));
                match self.mode {
                    Mode::Manual => Some(ReaderState::Ready),
                    // Hands-free re-arms: stay in the scanning state.
                    Mode::HandsFree => Some(ReaderState::Reading(ReadingKind::Scanning)),
                }
            }

            SystemEvent::DriverError { code } => {
                if self.state != ReaderState::Reading(ReadingKind::Scanning) {
                    return None;
                }
                warn!(code, "driver error during scan");
                self.clear_output();
                Some(ReaderState::Failure)
            }

            SystemEvent::MotionDetected => {
                if self.state != ReaderState::Reading(ReadingKind::Scanning) {
                    return None;
                }
                self.clear_output();
                self.adapter.start_decode();
                Some(ReaderState::Reading(ReadingKind::Scanning))
            }

            SystemEvent::StopScanning => {
                let applies = matches!(
                    self.state,
                    ReaderState::Ready | ReaderState::Reading(ReadingKind::Scanning)
                );
                if !applies {
                    return None;
                }
                self.clear_output();
                self.adapter.stop_decode();
                Some(ReaderState::Ready)
            }

            SystemEvent::FrameAvailable => {
                let scanning = self.state == ReaderState::Reading(ReadingKind::Scanning);
                scanning.then_some(ReaderState::Reading(ReadingKind::Scanning))
            }

            SystemEvent::DriverEvent { code, info, .. } => {
                if self.state != ReaderState::Reading(ReadingKind::Scanning) {
                    return None;
                }
                debug!(code, info, "driver event during scan");
                Some(ReaderState::Reading(ReadingKind::Scanning))
            }
        }
    }

    /// Entry actions for the freshly entered state.
    fn enter(&mut self, state: ReaderState) -> Option<SystemEvent> {
        match state {
            ReaderState::Initializing => {
                let settings = self.settings.borrow().clone();
                let opened = self.adapter.open(
                    self.sink.clone(),
                    &settings.code_settings,
                    &settings,
                );
                if opened {
                    let id = self.adapter.state().id;
                    self.status_tx.send_modify(|s| {
                        s.properties = ScannerProperties {
                            id,
                            codes_config: settings.code_settings,
                        };
                    });
                    Some(SystemEvent::InitAwaitingSurface)
                } else {
                    Some(SystemEvent::InitFailed)
                }
            }

            ReaderState::AwaitingSurface => {
                self.publish_surface(SurfaceState::Requested);
                None
            }

            ReaderState::Stopping => {
                self.publish_surface(SurfaceState::Ignored);
                self.adapter.close();
                Some(SystemEvent::InitClosed)
            }

            ReaderState::Stopped | ReaderState::Failure => {
                self.clear_output();
                None
            }

            ReaderState::Idle
            | ReaderState::Ready
            | ReaderState::Reading(_) => None,
        }
    }

    /// Mode-switch policy shared by `Ready` and `Reading.Scanning`.
    ///
    /// Switching to manual always stops hands-free on the driver and
    /// lands in `Ready`. Switching to hands-free lands in
    /// `Reading.Scanning` on success; on failure hands-free is torn back
    /// down and the machine lands in `Failure`.
    fn switch_mode(&mut self, mode: Mode) -> ReaderState {
        debug!(from = %self.mode, to = %mode, "switching mode");
        self.mode = mode;
        match mode {
            Mode::Manual => {
                self.adapter.exit_hands_free();
                ReaderState::Ready
            }
            Mode::HandsFree => {
                if self.adapter.enter_hands_free() {
                    ReaderState::Reading(ReadingKind::Scanning)
                } else {
                    self.adapter.exit_hands_free();
                    ReaderState::Failure
                }
            }
        }
    }

    /// Replace the per-symbology configuration.
    ///
    /// Applied best-effort to the open driver handle and mirrored into
    /// the observable properties; no lifecycle transition.
    fn apply_properties(&mut self, properties: ScannerProperties) {
        if self.state.is_active() {
            self.adapter.set_params(&properties.codes_config);
        }
        self.status_tx.send_modify(|s| {
            s.properties.codes_config = properties.codes_config;
        });
    }

    /// Publish the status projection of the current state.
    fn publish_status(&mut self) {
        let driver = self.adapter.state();
        let state = self.state;
        let mode = self.mode;
        self.status_tx.send_if_modified(|s| {
            let changed = s.id != driver.id || s.status != state.status() || s.mode != mode;
            if changed {
                s.id = driver.id;
                s.status = state.status();
                s.mode = mode;
            }
            changed
        });
    }

    fn publish_surface(&mut self, state: SurfaceState) {
        self.surface_tx.send_if_modified(|s| {
            if *s == state {
                false
            } else {
                *s = state;
                true
            }
        });
    }

    fn clear_output(&mut self) {
        self.output_tx.send_if_modified(|o| o.take().is_some());
    }

    fn feedback_on_scan_start(&self) {
        let settings = self.settings.borrow().clone();
        if settings.beep_mode == BeepMode::OnStartOnEnd {
            self.feedback.beep(BeepTone::Hz1760);
        }
        if settings.vibration_mode == VibrationMode::OnStartOnEnd {
            self.feedback.vibrate();
        }
    }

    fn feedback_on_scan_end(&self) {
        let settings = self.settings.borrow().clone();
        if matches!(settings.beep_mode, BeepMode::OnEnd | BeepMode::OnStartOnEnd) {
            self.feedback.beep(BeepTone::Hz1760);
        }
        if matches!(
            settings.vibration_mode,
            VibrationMode::OnEnd | VibrationMode::OnStartOnEnd
        ) {
            self.feedback.vibrate();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use scanlink_core::Status;
    use scanlink_driver::mock::{MockDecoder, MockDecoderHandle, MockFeedback};
    use scanlink_driver::FixedCameraProvider;

    struct Fixture {
        reader: ReaderHandle,
        driver: MockDecoderHandle,
        #[allow(dead_code)]
        settings: watch::Sender<ScannerSettings>,
    }

    fn fixture() -> Fixture {
        let (driver, handle) = MockDecoder::new();
        let (settings_tx, settings_rx) = watch::channel(ScannerSettings::default());
        let reader = ReaderMachine::spawn(
            driver,
            &FixedCameraProvider(1),
            Arc::new(MockFeedback::new()),
            settings_rx,
        );
        Fixture {
            reader,
            driver: handle,
            settings: settings_tx,
        }
    }

    async fn wait_status(rx: &mut watch::Receiver<ScannerStatus>, status: Status) {
        tokio::time::timeout(Duration::from_secs(1), rx.wait_for(|s| s.status == status))
            .await
            .unwrap_or_else(|_| panic!("timed out waiting for status {status}"))
            .expect("status channel closed");
    }

    #[tokio::test]
    async fn test_launch_requests_surface() {
        let f = fixture();
        let mut status = f.reader.status();
        let mut surface = f.reader.surface_state();

        f.reader.launch();

        wait_status(&mut status, Status::Ready).await;
        surface
            .wait_for(|s| *s == SurfaceState::Requested)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_launch_is_noop_while_active() {
        let f = fixture();
        let mut status = f.reader.status();

        f.reader.launch();
        wait_status(&mut status, Status::Ready).await;
        let configured = f.driver.parameter_log().len();

        // A second launch while active must not re-open the driver
        f.reader.launch();
        f.reader.set_surface(SurfaceHandle(7));
        wait_status(&mut status, Status::Ready).await;
        assert_eq!(f.driver.parameter_log().len(), configured);
    }

    #[tokio::test]
    async fn test_start_rejected_before_surface_bound() {
        let f = fixture();
        let mut status = f.reader.status();

        f.reader.launch();
        wait_status(&mut status, Status::Ready).await;

        // Still AwaitingSurface; Start must be guard-rejected
        f.reader.start();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(f.driver.decode_start_count(), 0);
        assert_eq!(status.borrow().status, Status::Ready);
    }

    #[tokio::test]
    async fn test_empty_decode_completion_is_rejected() {
        let f = fixture();
        let mut status = f.reader.status();

        f.reader.launch();
        f.reader.set_surface(SurfaceHandle(1));
        wait_status(&mut status, Status::Ready).await;
        f.reader.start();
        wait_status(&mut status, Status::Scanning).await;

        f.driver.complete_decode_empty(11);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(status.borrow().status, Status::Scanning);
        assert!(f.reader.output().borrow().is_none());
    }

    #[tokio::test]
    async fn test_set_properties_updates_config_and_driver() {
        let f = fixture();
        let mut status = f.reader.status();

        f.reader.launch();
        f.reader.set_surface(SurfaceHandle(1));
        wait_status(&mut status, Status::Ready).await;
        let before = f.driver.parameter_log().len();

        let mut props = ScannerProperties::default();
        props.codes_config.insert(293, 1);
        f.reader.submit(UserEvent::SetProperties(props));

        status
            .wait_for(|s| s.properties.codes_config.get(&293) == Some(&1))
            .await
            .unwrap();
        assert!(f.driver.parameter_log().len() > before);
    }

    #[tokio::test]
    async fn test_status_id_mirrors_driver_handle() {
        let f = fixture();
        let mut status = f.reader.status();

        assert_eq!(status.borrow().id, ScannerStatus::INITIAL.id);
        f.reader.launch();
        wait_status(&mut status, Status::Ready).await;
        assert!(status.borrow().id >= 0);
    }
}
