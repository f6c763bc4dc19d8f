//! Vendor parameter and event codes.
//!
//! Parameter ids and values are integer codes defined by the hardware
//! vendor; the coordinator treats them as opaque configuration. The names
//! here follow the vendor SDK documentation so the call sites read like
//! the vendor examples. Modifying these values breaks compatibility with
//! the scanner engine firmware.

/// Primary trigger mode parameter.
pub const PRIM_TRIG_MODE: u32 = 650;

/// Aim pattern behavior while in hands-free mode.
pub const AIM_MODE_HANDS_FREE: u32 = 1541;

/// Aim pattern behavior for triggered decode sessions.
pub const IMG_AIM_MODE: u32 = 680;

/// Aim pattern behavior for snapshot capture.
pub const IMG_AIM_SNAPSHOT: u32 = 681;

/// Illumination flash behavior.
pub const IMG_ILLUM: u32 = 684;

/// Laser-on duration for the primary trigger, in hundreds of ms.
pub const LASER_ON_PRIM: u32 = 136;

/// Snapshot session timeout, in hundreds of ms.
pub const IMG_SNAPTIMEOUT: u32 = 323;

/// Trigger mode value: level-triggered (manual) decode.
pub const TRIG_MODE_LEVEL: i32 = 0;

/// Trigger mode value: continuous hands-free decode.
pub const TRIG_MODE_HANDS_FREE: i32 = 7;

/// Aim value: aim pattern off.
pub const AIM_OFF: i32 = 0;

/// Aim value: aim pattern always on.
pub const AIM_ON_ALWAYS: i32 = 2;

/// Driver event code: the engine changed scan mode on its own.
pub const EVENT_SCAN_MODE_CHANGED: i32 = 6;

/// Driver event code: motion detected in the field of view.
pub const EVENT_MOTION_DETECTED: i32 = 2;
