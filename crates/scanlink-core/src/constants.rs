//! Timing and intake constants shared across the workspace.
//!
//! These values govern the debounce window applied to physical trigger
//! releases and the bounded buffer that absorbs the startup race between
//! event producers and the state machine worker.

use std::time::Duration;

/// Delay applied to a trigger release before the stop intent fires.
///
/// A release followed by a re-press within this window (mechanical
/// bounce, double-tap) cancels the pending stop, so the decode session
/// survives without a stop/start flicker. Only a release that stays
/// released for the full window produces a stop.
pub const TRIGGER_RELEASE_DELAY: Duration = Duration::from_millis(200);

/// Maximum number of events the intake holds before the state machine
/// has been constructed.
///
/// Expected pre-construction traffic is a handful of events at most, so
/// 64 leaves ample headroom. Overflow indicates the machine was never
/// started, and further events are dropped with a warning rather than
/// hoarded against a dead consumer.
pub const INTAKE_PENDING_LIMIT: usize = 64;

/// Default stop timeout for a decode session, in milliseconds.
pub const DEFAULT_STOP_TIMEOUT_MS: i32 = 5000;

/// Divisor applied to the stop timeout before it is written to the
/// vendor laser-on and snapshot-timeout parameters (vendor units are
/// hundreds of milliseconds).
pub const STOP_TIMEOUT_PARAM_DIVISOR: i32 = 100;

/// Sentinel id used before a driver handle has been opened.
pub const NO_READER_ID: i32 = -1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_timeout_divisor() {
        assert_eq!(DEFAULT_STOP_TIMEOUT_MS / STOP_TIMEOUT_PARAM_DIVISOR, 50);
    }
}
