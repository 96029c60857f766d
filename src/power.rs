//! Power-limit engine.
//!
//! For each frequency the safe input power is the lower of the thermal
//! limit `pe` and the excursion limit: displacement scales with the
//! square root of power in the small-signal model, so the power at which
//! the cone first reaches `xmax` is `P_ref · (xmax / x(P_ref))²`.
//!
//! For a vented box the defining property is the excursion null: near
//! the tuning frequency the port supplies most of the volume
//! displacement, cone displacement collapses, and excursion-limited
//! power spikes (so thermal usually becomes the binding limit there).
//! The displacement model here is the physically correct one, shared
//! with the closed-form transfer engine and validated against the
//! network solver.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constants::REFERENCE_POWER_W;
use crate::driver::{derive_mechanical, DriverParameters};
use crate::enclosure::{EnclosureSpec, SealedSystem};
use crate::error::{BoxsimError, Result};
use crate::transfer::{ported_displacement_ratio, sealed_displacement_ratio};

/// What limits the safe input power at a grid point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitingFactor {
    /// Voice-coil dissipation is the binding limit.
    Thermal,
    /// Cone excursion is the binding limit.
    Excursion,
}

/// Safe input power at one frequency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerLimitPoint {
    /// Frequency (Hz).
    pub frequency_hz: f64,
    /// Maximum safe input power (W).
    pub max_power_w: f64,
    /// Which mechanism binds at this frequency.
    pub limited_by: LimitingFactor,
}

/// Safe-power curve over the same grid as the response curve it
/// accompanies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerLimitCurve {
    /// Per-frequency limits, ordered by frequency.
    pub points: Vec<PowerLimitPoint>,
}

impl PowerLimitCurve {
    /// The lowest safe power anywhere on the grid (W).
    pub fn min_power_w(&self) -> Option<f64> {
        self.points
            .iter()
            .map(|p| p.max_power_w)
            .min_by(|a, b| a.total_cmp(b))
    }
}

/// Cone displacement evaluator shared by the per-frequency loop.
struct DisplacementModel {
    /// Displacement at DC for the reference drive (m).
    x_dc: f64,
    shape: Shape,
}

enum Shape {
    Sealed { fc: f64, qtc: f64 },
    Ported { fs: f64, fb: f64, alpha: f64, qts: f64, ql: f64 },
}

impl DisplacementModel {
    fn build(driver: &DriverParameters, enclosure: &EnclosureSpec) -> Result<Self> {
        enclosure.check()?;
        // a missing mechanical field makes the power curve unavailable,
        // like a missing xmax/pe; malformed values stay hard errors
        for (field, value) in [("qms", driver.qms), ("re", driver.re), ("sd", driver.sd)] {
            if value.is_none() {
                return Err(BoxsimError::Unavailable {
                    field: field.to_string(),
                });
            }
        }
        let mech = derive_mechanical(driver)?;
        let re = driver.require("re")?;
        // peak voltage of a sine carrying the reference average power
        let eg = (2.0 * REFERENCE_POWER_W * re).sqrt();
        let x_free = eg * mech.bl * mech.cms / re;

        Ok(match *enclosure {
            EnclosureSpec::Sealed { volume_m3 } => {
                let sys = SealedSystem::derive(driver, volume_m3)?;
                DisplacementModel {
                    // box air stiffens the suspension by (1 + alpha)
                    x_dc: x_free / (1.0 + sys.alpha),
                    shape: Shape::Sealed {
                        fc: sys.fc,
                        qtc: sys.qtc,
                    },
                }
            }
            EnclosureSpec::Ported {
                volume_m3,
                tuning_hz,
                loss_q,
                ..
            } => DisplacementModel {
                // the port vents the box at DC; static compliance is the
                // driver's own
                x_dc: x_free,
                shape: Shape::Ported {
                    fs: driver.fs,
                    fb: tuning_hz,
                    alpha: driver.vas / volume_m3,
                    qts: driver.qts,
                    ql: loss_q,
                },
            },
        })
    }

    /// Peak displacement (m) at `f` for the reference drive.
    fn displacement(&self, f: f64) -> f64 {
        let ratio = match self.shape {
            Shape::Sealed { fc, qtc } => sealed_displacement_ratio(f, fc, qtc),
            Shape::Ported {
                fs,
                fb,
                alpha,
                qts,
                ql,
            } => ported_displacement_ratio(f, fs, fb, alpha, qts, ql),
        };
        self.x_dc * ratio
    }
}

/// Excursion-limited input power (W) at a single frequency, ignoring the
/// thermal limit.
///
/// Requires `xmax` plus the mechanical fields; `Unavailable` when `xmax`
/// is missing.
pub fn excursion_limited_power(
    driver: &DriverParameters,
    enclosure: &EnclosureSpec,
    frequency_hz: f64,
) -> Result<f64> {
    let xmax = driver.xmax.ok_or(BoxsimError::Unavailable {
        field: "xmax".to_string(),
    })?;
    let model = DisplacementModel::build(driver, enclosure)?;
    Ok(excursion_power(xmax, model.displacement(frequency_hz)))
}

fn excursion_power(xmax: f64, x_ref: f64) -> f64 {
    // displacement never truly vanishes; the floor keeps the spike finite
    let ratio = xmax / x_ref.max(1e-12);
    REFERENCE_POWER_W * ratio * ratio
}

/// Maximum safe input power over `freqs`, tagged per point with the
/// binding limit.
///
/// Returns `Unavailable` (not a hard error) when `xmax` or `pe` is
/// missing: the power curve is an optional enrichment of a design
/// result, not a required part of it.
pub fn max_power_curve(
    driver: &DriverParameters,
    enclosure: &EnclosureSpec,
    freqs: &[f64],
) -> Result<PowerLimitCurve> {
    let xmax = driver.xmax.ok_or(BoxsimError::Unavailable {
        field: "xmax".to_string(),
    })?;
    let pe = driver.pe.ok_or(BoxsimError::Unavailable {
        field: "pe".to_string(),
    })?;
    let model = DisplacementModel::build(driver, enclosure)?;

    let points = freqs
        .par_iter()
        .map(|&f| {
            let p_excursion = excursion_power(xmax, model.displacement(f));
            if p_excursion < pe {
                PowerLimitPoint {
                    frequency_hz: f,
                    max_power_w: p_excursion,
                    limited_by: LimitingFactor::Excursion,
                }
            } else {
                PowerLimitPoint {
                    frequency_hz: f,
                    max_power_w: pe,
                    limited_by: LimitingFactor::Thermal,
                }
            }
        })
        .collect();

    Ok(PowerLimitCurve { points })
}
