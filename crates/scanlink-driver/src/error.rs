//! Error types for decoder driver operations.
//!
//! Every fault the vendor surface can raise is caught at the adapter
//! boundary and converted into a driver phase; these types never cross
//! into the state machine as thrown faults.

/// Result type alias for driver operations.
pub type Result<T> = std::result::Result<T, DriverError>;

/// Errors that can occur while talking to the decoder driver.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// The native driver library could not be linked or loaded.
    #[error("Driver link failure: {message}")]
    Link { message: String },

    /// Opening the decoder handle failed.
    #[error("Open failed: {message}")]
    Open { message: String },

    /// A parameter write was rejected by the driver.
    #[error("Parameter {id} rejected: {message}")]
    Parameter { id: u32, message: String },

    /// A decode control call (start/stop/hands-free) failed.
    #[error("Control call failed: {message}")]
    Control { message: String },

    /// The operation is not supported by this driver.
    #[error("Unsupported operation: {operation}")]
    Unsupported { operation: String },
}

impl DriverError {
    /// Create a new link failure error.
    pub fn link(message: impl Into<String>) -> Self {
        Self::Link {
            message: message.into(),
        }
    }

    /// Create a new open failure error.
    pub fn open(message: impl Into<String>) -> Self {
        Self::Open {
            message: message.into(),
        }
    }

    /// Create a new parameter rejection error.
    pub fn parameter(id: u32, message: impl Into<String>) -> Self {
        Self::Parameter {
            id,
            message: message.into(),
        }
    }

    /// Create a new control failure error.
    pub fn control(message: impl Into<String>) -> Self {
        Self::Control {
            message: message.into(),
        }
    }

    /// Create a new unsupported operation error.
    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
        }
    }

    /// Whether this fault means the native driver is unusable on this
    /// device, as opposed to a transient operational failure.
    pub fn is_link_failure(&self) -> bool {
        matches!(self, Self::Link { .. })
    }
}
