//! Error taxonomy for the layout kernels.
//!
//! Configuration errors are reported at the call that caused them and leave
//! simulation state untouched. Numerical edge cases (coincident nodes) never
//! surface here; the force library contains them locally.

use thiserror::Error;

use crate::graph::NodeId;

/// A rejected configuration or ingest call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// No force is registered under this name.
    #[error("unknown force: {0}")]
    UnknownForce(String),

    /// A force with this name is already registered.
    #[error("force already registered: {0}")]
    DuplicateForce(String),

    /// Parameters of one force kind were supplied for a force of another kind.
    #[error("force {name} is a {expected} force, got {found} parameters")]
    ForceKindMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A numeric parameter is out of range or not finite.
    #[error("invalid {parameter} = {value}: {reason}")]
    InvalidParameter {
        parameter: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// The same node id appears twice in one node set.
    #[error("duplicate node id {0}")]
    DuplicateNode(NodeId),

    /// A link names a node id that is not in the node set.
    #[error("link {link} references missing node {id}")]
    MissingLinkEndpoint { link: usize, id: NodeId },

    /// An operation named a node id that is not in the node set.
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    /// No scene is registered under this name.
    #[error("unknown scene: {0}")]
    UnknownScene(String),

    /// A scene with this name is already registered.
    #[error("scene already registered: {0}")]
    DuplicateScene(String),

    /// No kernel implementation has this name.
    #[error("unknown kernel: {0}")]
    UnknownKernel(String),

    #[error("unknown easing: {0}")]
    UnknownEasing(String),
}

impl ConfigurationError {
    pub(crate) fn invalid(parameter: &'static str, value: f64, reason: &'static str) -> Self {
        Self::InvalidParameter {
            parameter,
            value,
            reason,
        }
    }
}

/// Errors surfaced by an engine adapter.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The requested kernel could not be initialized.
    #[error("{kernel} kernel unavailable: {reason}")]
    KernelUnavailable { kernel: &'static str, reason: String },

    /// The kernel behind a pending adapter has not been attached yet.
    #[error("kernel is not ready")]
    NotReady,

    /// The kernel was disposed and its buffers released.
    #[error("kernel has been disposed")]
    Disposed,
}

/// Result type for kernel and scene operations.
pub type Result<T> = std::result::Result<T, LayoutError>;

/// Reject non-finite values.
pub(crate) fn finite(parameter: &'static str, value: f64) -> std::result::Result<f64, ConfigurationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigurationError::invalid(parameter, value, "must be finite"))
    }
}

/// Reject negative or non-finite values.
pub(crate) fn non_negative(
    parameter: &'static str,
    value: f64,
) -> std::result::Result<f64, ConfigurationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ConfigurationError::invalid(
            parameter,
            value,
            "must be finite and non-negative",
        ))
    }
}

/// Reject values outside `[0, 1]`.
pub(crate) fn unit_interval(
    parameter: &'static str,
    value: f64,
) -> std::result::Result<f64, ConfigurationError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigurationError::invalid(parameter, value, "must lie in [0, 1]"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validators() {
        assert_eq!(finite("x", 1.5), Ok(1.5));
        assert!(finite("x", f64::NAN).is_err());
        assert!(non_negative("d", -1.0).is_err());
        assert_eq!(non_negative("d", 0.0), Ok(0.0));
        assert!(unit_interval("v", 1.01).is_err());
        assert!(unit_interval("v", f64::NAN).is_err());
    }

    #[test]
    fn test_configuration_error_converts() {
        let err: LayoutError = ConfigurationError::UnknownForce("spin".into()).into();
        assert_eq!(err.to_string(), "unknown force: spin");
    }
}
