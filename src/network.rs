//! Complex-impedance network solver.
//!
//! The physically general path for vented boxes with explicit geometry:
//! instead of the tabulated alignment formulas, the coupled
//! electro-mechano-acoustic circuit is solved at each frequency. The
//! unknowns are cone velocity `V` (outward positive) and port volume
//! velocity `Up` (out of the port positive); with box compliance
//! `Cab = Vb/ρc²`, port acoustic mass `Map = ρ·Leff/Sp` and
//! `Zc = 1/(jωCab)`, `Zp = Rp + jωMap`:
//!
//! ```text
//! [ Zm + Bl²/Re + Sd²·Zc    Sd·Zc   ] [ V  ]   [ Bl·eg/Re ]
//! [ Sd·Zc                   Zc + Zp ] [ Up ] = [ 0        ]
//! ```
//!
//! All arithmetic is carried in `Complex64`; magnitude-only math would
//! lose the phase cancellation that produces the excursion null at the
//! tuning frequency.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::constants::{AIR_BULK_MODULUS, AIR_DENSITY, REFERENCE_POWER_W};
use crate::driver::{derive_mechanical, DriverParameters, MechanicalParameters};
use crate::enclosure::EnclosureSpec;
use crate::error::{degenerate_geometry, invalid_parameter, Result};

/// Flanged-plus-free-end port correction, in port radii.
const END_CORRECTION: f64 = 1.46;

/// Network solution at a single frequency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetworkSolution {
    /// Frequency evaluated (Hz).
    pub frequency_hz: f64,
    /// Cone peak displacement (m).
    pub displacement_m: f64,
    /// Port air velocity, peak (m/s).
    pub port_velocity_ms: f64,
    /// Magnitude of the total radiated volume velocity |Sd·V + Up| (m³/s).
    pub radiated_volume_velocity: f64,
}

/// Precomputed circuit model for one driver/enclosure pair.
///
/// Construction validates the geometry and derives the mechanical
/// parameter set once; [`NetworkModel::solve`] is then a cheap pure
/// function of frequency.
#[derive(Debug, Clone)]
pub struct NetworkModel {
    mech: MechanicalParameters,
    re: f64,
    sd: f64,
    /// Port cross-section area (m²).
    port_area: f64,
    /// Port acoustic mass (kg/m⁴).
    map: f64,
    /// Box acoustic compliance (m³/Pa).
    cab: f64,
    /// Port acoustic loss resistance (Pa·s/m³).
    rp: f64,
    /// Drive voltage amplitude (V).
    eg: f64,
}

impl NetworkModel {
    /// Build the model at the reference drive level (1 W into Re).
    pub fn new(driver: &DriverParameters, enclosure: &EnclosureSpec) -> Result<Self> {
        let re = driver.require("re")?;
        // sine drive: eg is the peak voltage for the given average power
        Self::with_drive_voltage(driver, enclosure, (2.0 * REFERENCE_POWER_W * re).sqrt())
    }

    /// Build the model at an explicit drive voltage amplitude.
    pub fn with_drive_voltage(
        driver: &DriverParameters,
        enclosure: &EnclosureSpec,
        drive_voltage: f64,
    ) -> Result<Self> {
        enclosure.check()?;
        let (volume_m3, port_area_m2, port_length_m, loss_q) = match *enclosure {
            EnclosureSpec::Ported {
                volume_m3,
                port_area_m2,
                port_length_m,
                loss_q,
                ..
            } => (volume_m3, port_area_m2, port_length_m, loss_q),
            EnclosureSpec::Sealed { .. } => {
                return Err(invalid_parameter(
                    "enclosure",
                    "the network solver models ported enclosures; \
                     use the closed-form engine for sealed boxes",
                ))
            }
        };

        let mech = derive_mechanical(driver)?;
        let re = driver.require("re")?;
        let sd = driver.require("sd")?;

        let radius = (port_area_m2 / PI).sqrt();
        let leff = port_length_m + END_CORRECTION * radius;
        if !(leff > 0.0) {
            return Err(degenerate_geometry(format!(
                "effective port length {leff} m is not positive"
            )));
        }
        let map = AIR_DENSITY * leff / port_area_m2;
        let cab = volume_m3 / AIR_BULK_MODULUS;

        // Helmholtz resonance of the geometry, used to size the loss term
        let wb = 1.0 / (map * cab).sqrt();
        let rp = if loss_q.is_finite() && loss_q > 0.0 {
            wb * map / loss_q
        } else {
            0.0
        };

        Ok(Self {
            mech,
            re,
            sd,
            port_area: port_area_m2,
            map,
            cab,
            rp,
            eg: drive_voltage,
        })
    }

    /// Helmholtz tuning frequency implied by the geometry (Hz).
    pub fn geometric_tuning_hz(&self) -> f64 {
        1.0 / (2.0 * PI * (self.map * self.cab).sqrt())
    }

    /// Solve the network at `frequency`.
    ///
    /// Frequencies at or below zero are clamped to a millihertz so the
    /// reactive terms stay finite; the result approaches the static one.
    pub fn solve(&self, frequency: f64) -> NetworkSolution {
        let f = frequency.max(1e-3);
        let w = 2.0 * PI * f;
        let jw = Complex64::new(0.0, w);

        let m = &self.mech;
        // mechanical impedance with the electrical back-EMF term folded in
        let zm = jw * m.mms + m.rms + m.bl * m.bl / self.re + 1.0 / (jw * m.cms);
        let zc = 1.0 / (jw * self.cab);
        let zp = self.rp + jw * self.map;

        let force = Complex64::new(m.bl * self.eg / self.re, 0.0);
        let a11 = zm + zc * (self.sd * self.sd);
        let a12 = zc * self.sd;
        let a22 = zc + zp;

        // Cramer's rule on the 2x2 system
        let det = a11 * a22 - a12 * a12;
        let v = force * a22 / det;
        let up = -force * a12 / det;

        let radiated = v * self.sd + up;

        NetworkSolution {
            frequency_hz: f,
            displacement_m: v.norm() / w,
            port_velocity_ms: up.norm() / self.port_area,
            radiated_volume_velocity: radiated.norm(),
        }
    }
}

/// Solve the network for one frequency at the 1 W reference drive.
///
/// Convenience wrapper over [`NetworkModel`]; build the model once when
/// sweeping a grid.
pub fn solve_network(
    frequency: f64,
    driver: &DriverParameters,
    enclosure: &EnclosureSpec,
) -> Result<NetworkSolution> {
    Ok(NetworkModel::new(driver, enclosure)?.solve(frequency))
}

/// Physical port length (m) that tunes `volume_m3` to `tuning_hz` with a
/// port of `port_area_m2`, accounting for the end correction.
///
/// Fails with `DegenerateGeometry` when the required length is not
/// positive (port too wide for the requested tuning).
pub fn port_length_for_tuning(volume_m3: f64, tuning_hz: f64, port_area_m2: f64) -> Result<f64> {
    if !(volume_m3 > 0.0) || !volume_m3.is_finite() {
        return Err(degenerate_geometry(format!(
            "box volume must be positive and finite, got {volume_m3} m³"
        )));
    }
    if !(tuning_hz > 0.0) || !(port_area_m2 > 0.0) {
        return Err(degenerate_geometry(
            "tuning frequency and port area must be positive".to_string(),
        ));
    }
    let cab = volume_m3 / AIR_BULK_MODULUS;
    let wb = 2.0 * PI * tuning_hz;
    let map = 1.0 / (wb * wb * cab);
    let leff = map * port_area_m2 / AIR_DENSITY;
    let radius = (port_area_m2 / PI).sqrt();
    let length = leff - END_CORRECTION * radius;
    if length <= 0.0 {
        return Err(degenerate_geometry(format!(
            "port of {port_area_m2} m² cannot tune {volume_m3} m³ to {tuning_hz} Hz \
             (required length {length:.4} m)"
        )));
    }
    Ok(length)
}
