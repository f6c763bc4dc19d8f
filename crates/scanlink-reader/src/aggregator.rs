//! Callback aggregator: the single entry point for driver notifications.
//!
//! Every hardware callback is translated 1:1 into a well-typed system
//! event and forwarded to the intake in the order the hardware invoked
//! it. Two generic-event codes are special-cased before translation;
//! everything else passes through untouched. The aggregator holds no
//! state and performs no business logic.

use bytes::Bytes;
use tracing::debug;

use scanlink_driver::{DriverCallbacks, params};

use crate::event::SystemEvent;
use crate::intake::EventIntake;

/// Translates driver callbacks into [`SystemEvent`]s.
pub struct CallbackAggregator {
    intake: EventIntake,
}

impl CallbackAggregator {
    /// Create an aggregator feeding the given intake.
    pub fn new(intake: EventIntake) -> Self {
        Self { intake }
    }
}

impl DriverCallbacks for CallbackAggregator {
    fn on_decode_complete(&self, symbology: i32, length: i32, data: Option<Bytes>) {
        debug!(symbology, length, "decode complete callback");
        self.intake.submit(SystemEvent::DecodeComplete {
            symbology,
            length,
            data,
        });
    }

    fn on_event(&self, code: i32, info: i32, data: Option<Bytes>) {
        debug!(code, info, "driver event callback");
        match code {
            params::EVENT_SCAN_MODE_CHANGED => self.intake.submit(SystemEvent::StopScanning),
            params::EVENT_MOTION_DETECTED => self.intake.submit(SystemEvent::MotionDetected),
            _ => self.intake.submit(SystemEvent::DriverEvent { code, info, data }),
        }
    }

    fn on_error(&self, code: i32) {
        debug!(code, "driver error callback");
        self.intake.submit(SystemEvent::DriverError { code });
    }

    fn on_frame_available(&self) {
        self.intake.submit(SystemEvent::FrameAvailable);
    }
}
