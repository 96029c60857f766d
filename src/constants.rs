//! Physical constants and engine-wide defaults.

/// Density of air at 20 °C, kg/m³.
pub const AIR_DENSITY: f64 = 1.18;

/// Speed of sound in air at 20 °C, m/s.
pub const SPEED_OF_SOUND: f64 = 343.0;

/// Adiabatic bulk modulus of air, ρc² (Pa).
pub const AIR_BULK_MODULUS: f64 = AIR_DENSITY * SPEED_OF_SOUND * SPEED_OF_SOUND;

/// Default enclosure loss Q for vented boxes (light leakage damping).
/// `f64::INFINITY` selects the lossless theoretical case.
pub const DEFAULT_LOSS_Q: f64 = 7.0;

/// Reference frequency used to normalize response curves to passband level.
pub const REFERENCE_FREQ_HZ: f64 = 200.0;

/// Reference input power (W) at which displacement is evaluated for
/// power-limit scaling.
pub const REFERENCE_POWER_W: f64 = 1.0;

/// Smallest magnitude ratio carried into a dB conversion; -200 dB floor.
/// Keeps deep-stopband points plottable instead of -inf/NaN.
pub const MAGNITUDE_FLOOR: f64 = 1e-10;
