//! Enclosure descriptions and derived system parameters.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_LOSS_Q;
use crate::driver::DriverParameters;
use crate::error::{degenerate_geometry, invalid_parameter, Result};
use crate::transfer::{ratio_to_db, sealed_f3, vented_transfer};

/// An enclosure the driver is mounted in.
///
/// A closed tagged variant: every consumer pattern-matches and handles
/// both families exhaustively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EnclosureSpec {
    /// Sealed (acoustic suspension) box.
    Sealed {
        /// Net internal volume (m³).
        volume_m3: f64,
    },
    /// Vented (bass reflex) box.
    Ported {
        /// Net internal volume (m³).
        volume_m3: f64,
        /// Helmholtz tuning frequency (Hz).
        tuning_hz: f64,
        /// Port cross-section area (m²).
        port_area_m2: f64,
        /// Physical port length (m).
        port_length_m: f64,
        /// Enclosure loss Q (leakage); `f64::INFINITY` for lossless.
        loss_q: f64,
    },
}

impl EnclosureSpec {
    /// Sealed box of the given volume.
    pub fn sealed(volume_m3: f64) -> Self {
        EnclosureSpec::Sealed { volume_m3 }
    }

    /// Ported box with the default loss Q of 7.
    pub fn ported(volume_m3: f64, tuning_hz: f64, port_area_m2: f64, port_length_m: f64) -> Self {
        EnclosureSpec::Ported {
            volume_m3,
            tuning_hz,
            port_area_m2,
            port_length_m,
            loss_q: DEFAULT_LOSS_Q,
        }
    }

    /// Net internal volume (m³), for either family.
    pub fn volume_m3(&self) -> f64 {
        match *self {
            EnclosureSpec::Sealed { volume_m3 } => volume_m3,
            EnclosureSpec::Ported { volume_m3, .. } => volume_m3,
        }
    }

    /// Check the geometry invariants, `DegenerateGeometry` on violation.
    pub fn check(&self) -> Result<()> {
        match *self {
            EnclosureSpec::Sealed { volume_m3 } => {
                if !(volume_m3 > 0.0) || !volume_m3.is_finite() {
                    return Err(degenerate_geometry(format!(
                        "box volume must be positive and finite, got {volume_m3} m³"
                    )));
                }
            }
            EnclosureSpec::Ported {
                volume_m3,
                tuning_hz,
                port_area_m2,
                port_length_m,
                ..
            } => {
                if !(volume_m3 > 0.0) || !volume_m3.is_finite() {
                    return Err(degenerate_geometry(format!(
                        "box volume must be positive and finite, got {volume_m3} m³"
                    )));
                }
                if !(tuning_hz > 0.0) {
                    return Err(degenerate_geometry(format!(
                        "tuning frequency must be positive, got {tuning_hz} Hz"
                    )));
                }
                if !(port_area_m2 > 0.0) {
                    return Err(degenerate_geometry(format!(
                        "port area must be positive, got {port_area_m2} m²"
                    )));
                }
                if port_length_m < 0.0 {
                    return Err(degenerate_geometry(format!(
                        "port length must be non-negative, got {port_length_m} m"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Derived parameters of a sealed system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SealedSystem {
    /// Compliance ratio vas/vb.
    pub alpha: f64,
    /// System resonance frequency (Hz).
    pub fc: f64,
    /// Total system quality factor.
    pub qtc: f64,
    /// -3 dB frequency (Hz).
    pub f3: f64,
}

impl SealedSystem {
    /// Derive sealed system parameters for a driver in `volume_m3`.
    pub fn derive(driver: &DriverParameters, volume_m3: f64) -> Result<Self> {
        if !(volume_m3 > 0.0) || !volume_m3.is_finite() {
            return Err(degenerate_geometry(format!(
                "box volume must be positive and finite, got {volume_m3} m³"
            )));
        }
        if !(driver.fs > 0.0) || !(driver.qts > 0.0) || !(driver.vas > 0.0) {
            return Err(invalid_parameter(
                "driver",
                "fs, qts and vas must all be positive",
            ));
        }
        let alpha = driver.vas / volume_m3;
        let factor = (1.0 + alpha).sqrt();
        let fc = driver.fs * factor;
        let qtc = driver.qts * factor;
        Ok(Self {
            alpha,
            fc,
            qtc,
            f3: sealed_f3(fc, qtc),
        })
    }
}

/// Derived parameters of a ported system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortedSystem {
    /// Compliance ratio vas/vb.
    pub alpha: f64,
    /// Tuning ratio fb/fs.
    pub h: f64,
    /// Tuning frequency (Hz).
    pub fb: f64,
    /// -3 dB frequency (Hz), found numerically on the response curve.
    pub f3: f64,
}

impl PortedSystem {
    /// Derive ported system parameters for a driver in `enclosure`.
    pub fn derive(driver: &DriverParameters, enclosure: &EnclosureSpec) -> Result<Self> {
        enclosure.check()?;
        let (volume_m3, fb, ql) = match *enclosure {
            EnclosureSpec::Ported {
                volume_m3,
                tuning_hz,
                loss_q,
                ..
            } => (volume_m3, tuning_hz, loss_q),
            EnclosureSpec::Sealed { .. } => {
                return Err(invalid_parameter(
                    "enclosure",
                    "ported system parameters require a ported enclosure",
                ))
            }
        };
        if !(driver.fs > 0.0) || !(driver.qts > 0.0) || !(driver.vas > 0.0) {
            return Err(invalid_parameter(
                "driver",
                "fs, qts and vas must all be positive",
            ));
        }
        let alpha = driver.vas / volume_m3;
        let h = fb / driver.fs;
        let f3 = ported_f3(driver.fs, fb, alpha, driver.qts, ql);
        Ok(Self { alpha, h, fb, f3 })
    }
}

/// Derived system parameters for either enclosure family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SystemParameters {
    /// Sealed system summary.
    Sealed(SealedSystem),
    /// Ported system summary.
    Ported(PortedSystem),
}

/// Derive the system parameter summary for a driver/enclosure pair.
pub fn system_parameters(
    driver: &DriverParameters,
    enclosure: &EnclosureSpec,
) -> Result<SystemParameters> {
    match enclosure {
        EnclosureSpec::Sealed { volume_m3 } => Ok(SystemParameters::Sealed(SealedSystem::derive(
            driver, *volume_m3,
        )?)),
        EnclosureSpec::Ported { .. } => Ok(SystemParameters::Ported(PortedSystem::derive(
            driver, enclosure,
        )?)),
    }
}

/// Locate the ported -3 dB point by scanning the response downward from
/// the passband and interpolating the topmost crossing.
///
/// The scan span and the passband reference both scale with the system
/// corner frequencies, so a 500 Hz tuning resolves as faithfully as a
/// 25 Hz one. The response always falls below any finite level toward
/// DC, so a crossing always exists within the scanned span.
fn ported_f3(fs: f64, fb: f64, alpha: f64, qts: f64, ql: f64) -> f64 {
    const N: usize = 512;
    let top = fb.max(fs);
    let lo = fb.min(fs) / 16.0;
    let hi = 8.0 * top;
    let step = (hi / lo).ln() / (N - 1) as f64;

    let g_ref = vented_transfer(16.0 * top, fs, fb, alpha, qts, ql).norm();
    let freq_at = |i: usize| lo * (step * i as f64).exp();
    let db_at =
        |f: f64| ratio_to_db(vented_transfer(f, fs, fb, alpha, qts, ql).norm() / g_ref);

    let mut f3 = lo;
    for i in (0..N - 1).rev() {
        let (fa, fb_) = (freq_at(i), freq_at(i + 1));
        let (da, db) = (db_at(fa), db_at(fb_));
        if da < -3.0 && db >= -3.0 {
            // interpolate in log-frequency, as elsewhere in the crate
            let t = (-3.0 - da) / (db - da);
            f3 = (fa.ln() + t * (fb_.ln() - fa.ln())).exp();
            break;
        }
    }
    f3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sealed_scenario_22hz_driver_in_330l() {
        // fs=22, qts=0.53, vas=248.2 L in 330 L -> qtc ~= 0.707, fc ~= 29.1
        let driver = DriverParameters::new(22.0, 0.53, 0.2482);
        let sys = SealedSystem::derive(&driver, 0.330).unwrap();
        assert!((sys.qtc - 0.707).abs() < 0.01, "qtc {}", sys.qtc);
        assert!((sys.fc - 29.1).abs() < 1.0, "fc {}", sys.fc);
    }

    #[test]
    fn sealed_rejects_degenerate_volume() {
        let driver = DriverParameters::new(27.4, 0.39, 0.185);
        assert!(SealedSystem::derive(&driver, 0.0).is_err());
        assert!(SealedSystem::derive(&driver, -0.1).is_err());
        assert!(SealedSystem::derive(&driver, f64::INFINITY).is_err());
    }

    #[test]
    fn ported_f3_sits_near_tuning_for_qb3_like_box() {
        let driver = DriverParameters::new(34.3, 0.35, 0.201);
        let enclosure = EnclosureSpec::ported(0.178, 34.3, 0.008, 0.1);
        let sys = PortedSystem::derive(&driver, &enclosure).unwrap();
        assert!((sys.h - 1.0).abs() < 1e-12);
        // QB3 f3 lands in the vicinity of tuning
        assert!(sys.f3 > 0.8 * sys.fb && sys.f3 < 1.6 * sys.fb, "f3 {}", sys.f3);
    }

    #[test]
    fn ported_f3_tracks_tunings_far_above_the_driver() {
        // a fixed scan span would saturate these at the same value
        let driver = DriverParameters::new(34.3, 0.35, 0.201);
        let low = EnclosureSpec::ported(0.178, 300.0, 0.008, 0.1);
        let high = EnclosureSpec::ported(0.178, 450.0, 0.008, 0.1);
        let f3_low = PortedSystem::derive(&driver, &low).unwrap().f3;
        let f3_high = PortedSystem::derive(&driver, &high).unwrap().f3;

        assert!(f3_low > 0.4 * 300.0 && f3_low < 1.2 * 300.0, "f3 {f3_low}");
        assert!(f3_high > 0.4 * 450.0 && f3_high < 1.2 * 450.0, "f3 {f3_high}");
        assert!(f3_high > 1.3 * f3_low, "{f3_low} -> {f3_high}");
    }

    #[test]
    fn system_parameters_dispatches_by_variant() {
        let driver = DriverParameters::new(27.4, 0.39, 0.185);
        match system_parameters(&driver, &EnclosureSpec::sealed(0.08)).unwrap() {
            SystemParameters::Sealed(s) => assert!(s.qtc > driver.qts),
            SystemParameters::Ported(_) => panic!("expected sealed"),
        }
        let ported = EnclosureSpec::ported(0.18, 34.0, 0.008, 0.1);
        match system_parameters(&driver, &ported).unwrap() {
            SystemParameters::Ported(p) => assert!(p.fb > 0.0),
            SystemParameters::Sealed(_) => panic!("expected ported"),
        }
    }

    #[test]
    fn ported_check_rejects_zero_port_area() {
        let e = EnclosureSpec::Ported {
            volume_m3: 0.1,
            tuning_hz: 30.0,
            port_area_m2: 0.0,
            port_length_m: 0.1,
            loss_q: 7.0,
        };
        assert!(e.check().is_err());
    }
}
