//! Error types for the boxsim crate.
//!
//! This module provides a unified error type for all boxsim operations.
//! Validation warnings are not errors; they travel in
//! [`crate::validate::ValidationResult`] and never abort a computation.

use thiserror::Error;

/// Error type for boxsim operations.
#[derive(Debug, Error)]
pub enum BoxsimError {
    /// A driver parameter is missing, malformed or outside its physical range.
    ///
    /// Fatal for the whole computation that received the parameter set.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Name of the offending parameter (e.g. "fs", "qms").
        name: String,
        /// Description of what is wrong with it.
        message: String,
    },

    /// A requested alignment cannot be realized by the enclosure family.
    ///
    /// A sealed box can only raise the system Q above the driver's Qts,
    /// so any target at or below Qts is physically out of reach.
    #[error("alignment not achievable: target Qtc {target_qtc} is <= driver Qts {qts}")]
    InfeasibleAlignment {
        /// The requested total system Q.
        target_qtc: f64,
        /// The driver's total Q, the lower bound of what a sealed box can do.
        qts: f64,
    },

    /// An iterative search terminated without reaching its target.
    #[error("target of {target_hz} Hz is not reachable (searched {lo_hz:.1}..{hi_hz:.1} Hz)")]
    UnreachableTarget {
        /// The frequency target the search was asked to hit.
        target_hz: f64,
        /// Lowest value the search bracket could produce.
        lo_hz: f64,
        /// Highest value the search bracket could produce.
        hi_hz: f64,
    },

    /// Zero, negative or non-finite box/port geometry.
    ///
    /// Fatal for the single evaluation that used the geometry.
    #[error("degenerate enclosure geometry: {message}")]
    DegenerateGeometry {
        /// Description of the degenerate quantity.
        message: String,
    },

    /// An optional enrichment cannot be computed because an optional
    /// driver field is missing. The rest of the result remains valid.
    #[error("result unavailable: driver field '{field}' is not set")]
    Unavailable {
        /// Name of the missing optional field (e.g. "xmax", "pe").
        field: String,
    },
}

/// Result type alias for boxsim operations.
pub type Result<T> = std::result::Result<T, BoxsimError>;

impl BoxsimError {
    /// Returns true if this is the soft "optional data missing" outcome,
    /// which callers typically render as "n/a" rather than a failure.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, BoxsimError::Unavailable { .. })
    }

    /// Returns true if this is a hard input error (bad driver parameters
    /// or degenerate geometry).
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            BoxsimError::InvalidParameter { .. } | BoxsimError::DegenerateGeometry { .. }
        )
    }

    /// Returns true if a requested design target could not be met.
    pub fn is_design_error(&self) -> bool {
        matches!(
            self,
            BoxsimError::InfeasibleAlignment { .. } | BoxsimError::UnreachableTarget { .. }
        )
    }
}

pub(crate) fn invalid_parameter(name: &str, message: impl Into<String>) -> BoxsimError {
    BoxsimError::InvalidParameter {
        name: name.to_string(),
        message: message.into(),
    }
}

pub(crate) fn degenerate_geometry(message: impl Into<String>) -> BoxsimError {
    BoxsimError::DegenerateGeometry {
        message: message.into(),
    }
}
