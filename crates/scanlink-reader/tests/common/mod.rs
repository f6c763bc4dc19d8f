//! Common test utilities for reader lifecycle integration tests.
//!
//! Helpers come in two tiers: fixture builders (`spawn_reader*`) that
//! wire a machine over a scripted mock decoder, and wait helpers that
//! block on the observable slots with a bounded timeout so a broken
//! transition fails the test instead of hanging it.

// Each integration binary uses a different subset of these helpers.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use scanlink_core::{
    Mode, ScanResult, ScannerSettings, ScannerStatus, Status, SurfaceState,
};
use scanlink_driver::mock::{MockDecoder, MockDecoderHandle, MockFeedback};
use scanlink_driver::{FixedCameraProvider, SurfaceHandle};
use scanlink_reader::{ReaderHandle, ReaderMachine};

/// Upper bound for any single observable change.
pub const WAIT: Duration = Duration::from_secs(1);

/// Install a test-writer tracing subscriber once per binary.
///
/// Run with `RUST_LOG=scanlink_reader=debug` to see transition logs on
/// failing tests.
pub fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Surface handle used by flow tests.
pub const TEST_SURFACE: SurfaceHandle = SurfaceHandle(42);

/// A running machine plus everything needed to script and observe it.
pub struct TestReader {
    pub reader: ReaderHandle,
    pub driver: MockDecoderHandle,
    pub feedback: Arc<MockFeedback>,
    pub settings: watch::Sender<ScannerSettings>,
}

/// Spawn a machine over a well-behaved mock decoder with default settings.
pub fn spawn_reader() -> TestReader {
    spawn_reader_with(ScannerSettings::default())
}

/// Spawn a machine with explicit initial settings.
pub fn spawn_reader_with(settings: ScannerSettings) -> TestReader {
    init_tracing();
    let (driver, handle) = MockDecoder::new();
    let feedback = Arc::new(MockFeedback::new());
    let (settings_tx, settings_rx) = watch::channel(settings);
    let reader = ReaderMachine::spawn(
        driver,
        &FixedCameraProvider(1),
        feedback.clone(),
        settings_rx,
    );
    TestReader {
        reader,
        driver: handle,
        feedback,
        settings: settings_tx,
    }
}

/// Wait until the observable status matches.
pub async fn wait_status(rx: &mut watch::Receiver<ScannerStatus>, status: Status) {
    tokio::time::timeout(WAIT, rx.wait_for(|s| s.status == status))
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for status {status}"))
        .expect("status channel closed");
}

/// Wait until the observable status and mode both match.
pub async fn wait_status_mode(rx: &mut watch::Receiver<ScannerStatus>, status: Status, mode: Mode) {
    tokio::time::timeout(WAIT, rx.wait_for(|s| s.status == status && s.mode == mode))
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for status {status} in mode {mode}"))
        .expect("status channel closed");
}

/// Wait until the surface binding state matches.
pub async fn wait_surface(rx: &mut watch::Receiver<SurfaceState>, state: SurfaceState) {
    tokio::time::timeout(WAIT, rx.wait_for(|s| *s == state))
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for surface state {state:?}"))
        .expect("surface channel closed");
}

/// Wait until a scan result is published, returning it.
pub async fn wait_output(rx: &mut watch::Receiver<Option<ScanResult>>) -> ScanResult {
    tokio::time::timeout(WAIT, rx.wait_for(|o| o.is_some()))
        .await
        .expect("timed out waiting for scan output")
        .expect("output channel closed")
        .clone()
        .expect("wait_for guarantees presence")
}

/// Wait until the scan output is cleared.
pub async fn wait_output_cleared(rx: &mut watch::Receiver<Option<ScanResult>>) {
    tokio::time::timeout(WAIT, rx.wait_for(|o| o.is_none()))
        .await
        .expect("timed out waiting for scan output to clear")
        .expect("output channel closed");
}

/// Poll an arbitrary condition against the mock until it holds.
pub async fn wait_until(what: &str, mut cond: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + WAIT;
    while !cond() {
        if tokio::time::Instant::now() > deadline {
            panic!("timed out waiting for {what}");
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Give the worker a moment to drain anything queued, for negative
/// assertions ("nothing happened").
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(30)).await;
}

/// Drive a fresh machine to `Ready` with a surface bound.
pub async fn launch_to_ready(t: &TestReader) {
    let mut status = t.reader.status();
    t.reader.launch();
    wait_status(&mut status, Status::Ready).await;
    t.reader.set_surface(TEST_SURFACE);
    wait_until("surface bound", || {
        t.driver.bound_surface() == Some(TEST_SURFACE)
    })
    .await;
}
