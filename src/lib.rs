#![doc = include_str!("../README.md")]

/// Error types for boxsim operations.
pub mod error;
pub use error::{BoxsimError, Result};

/// Physical constants and engine defaults.
pub mod constants;

/// Thiele-Small parameter model and derived mechanical quantities.
pub mod driver;
/// Driver parameter validation (errors vs. advisory warnings).
pub mod validate;

/// Enclosure descriptions and derived system parameters.
pub mod enclosure;

/// Closed-form sealed/vented transfer functions and displacement shapes.
pub mod transfer;

/// Complex-impedance network solver for explicit box/port geometry.
pub mod network;

/// Alignment search: named targets and bounded inverse searches.
pub mod alignment;

/// Response curve materialization over log-spaced grids.
pub mod curve;

/// Thermal/excursion power-limit engine.
pub mod power;

// Re-export the library surface.
pub use alignment::{
    design_sealed, find_volume_for_f3, find_volume_for_qtc, qb3_alignment, PortedDesign,
    SealedAlignment, SealedDesign,
};
pub use curve::{log_frequency_grid, network_response_curve, response_curve, Curve};
pub use driver::{derive_mechanical, DriverParameters, MechanicalParameters};
pub use enclosure::{system_parameters, EnclosureSpec, PortedSystem, SealedSystem, SystemParameters};
pub use network::{port_length_for_tuning, solve_network, NetworkModel, NetworkSolution};
pub use power::{
    excursion_limited_power, max_power_curve, LimitingFactor, PowerLimitCurve, PowerLimitPoint,
};
pub use transfer::{ported_response_db, sealed_f3, sealed_response_db};
pub use validate::{validate, ValidationResult};
