//! Scanner settings snapshot consulted by the state machine.
//!
//! Settings are externally supplied and read-only from the machine's point
//! of view: transition logic reads the latest snapshot at the instant it
//! executes, never an event-scoped copy, so a settings change applies to
//! the next transition rather than retroactively.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_STOP_TIMEOUT_MS;
use crate::defaults;
use crate::error::{CoreError, Result};

/// Illumination flash behavior during a decode session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashMode {
    Off,
    On,
}

/// Aim pattern behavior during a decode session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AimMode {
    Off,
    On,
}

/// When audio feedback fires relative to a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeepMode {
    Off,
    OnEnd,
    OnStartOnEnd,
}

/// When vibration feedback fires relative to a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VibrationMode {
    Off,
    OnEnd,
    OnStartOnEnd,
}

impl FlashMode {
    /// Vendor parameter value for this mode.
    pub fn param_value(&self) -> i32 {
        *self as i32
    }
}

impl AimMode {
    /// Vendor parameter value for this mode.
    pub fn param_value(&self) -> i32 {
        *self as i32
    }
}

/// Snapshot of all externally supplied scanner configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannerSettings {
    /// Per-symbology parameter map (symbology-id → param-value).
    pub code_settings: BTreeMap<u32, i32>,

    /// Illumination flash behavior.
    pub flash_mode: FlashMode,

    /// Aim pattern behavior.
    pub aim_mode: AimMode,

    /// Audio feedback policy.
    pub beep_mode: BeepMode,

    /// Vibration feedback policy.
    pub vibration_mode: VibrationMode,

    /// Decode session stop timeout in milliseconds.
    pub stop_timeout_ms: i32,

    /// Whether the physical trigger button drives decode sessions.
    pub use_trigger: bool,
}

impl Default for ScannerSettings {
    fn default() -> Self {
        Self {
            code_settings: defaults::default_code_params(),
            flash_mode: FlashMode::On,
            aim_mode: AimMode::On,
            beep_mode: BeepMode::OnEnd,
            vibration_mode: VibrationMode::OnEnd,
            stop_timeout_ms: DEFAULT_STOP_TIMEOUT_MS,
            use_trigger: true,
        }
    }
}

impl ScannerSettings {
    /// Parse a string-keyed symbology map into a typed parameter map.
    ///
    /// This is the bridge from stringly-typed settings storage to the
    /// vendor's integer parameter space.
    ///
    /// # Errors
    ///
    /// Returns an error if any key or value fails to parse as an integer.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::BTreeMap;
    /// use scanlink_core::ScannerSettings;
    ///
    /// let mut raw = BTreeMap::new();
    /// raw.insert("1".to_string(), "0".to_string());
    /// raw.insert("293".to_string(), "1".to_string());
    ///
    /// let parsed = ScannerSettings::code_settings_from_string_map(&raw).unwrap();
    /// assert_eq!(parsed.get(&293), Some(&1));
    /// ```
    pub fn code_settings_from_string_map(
        map: &BTreeMap<String, String>,
    ) -> Result<BTreeMap<u32, i32>> {
        map.iter()
            .map(|(k, v)| {
                let key: u32 = k.parse().map_err(|_| {
                    CoreError::invalid_setting(format!("Invalid symbology id: {k}"))
                })?;
                let value: i32 = v.parse().map_err(|_| {
                    CoreError::invalid_setting(format!("Invalid parameter value for {k}: {v}"))
                })?;
                Ok((key, value))
            })
            .collect()
    }
}
