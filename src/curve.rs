//! Response curve materialization.
//!
//! Curves are plain immutable values on a log-spaced frequency grid,
//! always computed in full (callers plot the whole thing). Each grid
//! point is independent, so sweeps run through rayon.

use ndarray::Array1;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constants::REFERENCE_FREQ_HZ;
use crate::driver::DriverParameters;
use crate::enclosure::{EnclosureSpec, PortedSystem, SealedSystem};
use crate::error::Result;
use crate::network::NetworkModel;
use crate::transfer::{ported_response_db, ratio_to_db, sealed_response_db};

/// A frequency response: magnitude in dB relative to passband level,
/// over an ordered frequency grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Curve {
    /// Frequency points in Hz.
    pub freq: Array1<f64>,
    /// Response in dB.
    pub spl: Array1<f64>,
}

impl Curve {
    /// Number of points.
    pub fn len(&self) -> usize {
        self.freq.len()
    }

    /// True when the curve holds no points.
    pub fn is_empty(&self) -> bool {
        self.freq.is_empty()
    }

    /// The -3 dB point relative to `reference_db`: the topmost crossing,
    /// interpolated in log frequency. `None` when the curve never rises
    /// to within 3 dB of the reference.
    pub fn f3_from_reference(&self, reference_db: f64) -> Option<f64> {
        let cutoff = reference_db - 3.0;
        for i in (0..self.len().saturating_sub(1)).rev() {
            let (da, db) = (self.spl[i], self.spl[i + 1]);
            if da < cutoff && db >= cutoff {
                let t = (cutoff - da) / (db - da);
                let lf = self.freq[i].ln() + t * (self.freq[i + 1].ln() - self.freq[i].ln());
                return Some(lf.exp());
            }
        }
        None
    }
}

/// Create a standard logarithmic frequency grid.
pub fn log_frequency_grid(n_points: usize, f_min: f64, f_max: f64) -> Array1<f64> {
    Array1::logspace(10.0, f_min.log10(), f_max.log10(), n_points)
}

/// Materialize the closed-form response curve for a driver/enclosure
/// pair over `freqs`.
pub fn response_curve(
    driver: &DriverParameters,
    enclosure: &EnclosureSpec,
    freqs: &Array1<f64>,
) -> Result<Curve> {
    let spl: Vec<f64> = match enclosure {
        EnclosureSpec::Sealed { volume_m3 } => {
            let sys = SealedSystem::derive(driver, *volume_m3)?;
            freqs
                .to_vec()
                .par_iter()
                .map(|&f| sealed_response_db(f, sys.fc, sys.qtc))
                .collect()
        }
        EnclosureSpec::Ported { loss_q, .. } => {
            let sys = PortedSystem::derive(driver, enclosure)?;
            let (fs, qts, ql) = (driver.fs, driver.qts, *loss_q);
            freqs
                .to_vec()
                .par_iter()
                .map(|&f| ported_response_db(f, fs, sys.fb, sys.alpha, qts, ql))
                .collect()
        }
    };
    Ok(Curve {
        freq: freqs.clone(),
        spl: Array1::from(spl),
    })
}

/// Materialize the response curve through the complex-impedance network
/// solver, normalized at the same reference frequency as the closed-form
/// engine so the two paths are directly comparable.
pub fn network_response_curve(
    driver: &DriverParameters,
    enclosure: &EnclosureSpec,
    freqs: &Array1<f64>,
) -> Result<Curve> {
    let model = NetworkModel::new(driver, enclosure)?;
    let reference = model.solve(REFERENCE_FREQ_HZ).radiated_volume_velocity;
    let spl: Vec<f64> = freqs
        .to_vec()
        .par_iter()
        .map(|&f| ratio_to_db(model.solve(f).radiated_volume_velocity / reference))
        .collect();
    Ok(Curve {
        freq: freqs.clone(),
        spl: Array1::from(spl),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_is_log_spaced_and_bounded() {
        let grid = log_frequency_grid(100, 10.0, 1000.0);
        assert_eq!(grid.len(), 100);
        assert!((grid[0] - 10.0).abs() < 1e-9);
        assert!((grid[99] - 1000.0).abs() < 1e-6);
        // constant ratio between neighbors
        let r0 = grid[1] / grid[0];
        let r1 = grid[51] / grid[50];
        assert!((r0 - r1).abs() < 1e-9);
    }

    #[test]
    fn sealed_curve_passband_is_flat_at_zero() {
        let driver = DriverParameters::new(27.4, 0.39, 0.185);
        let freqs = log_frequency_grid(120, 10.0, 400.0);
        let curve = response_curve(&driver, &EnclosureSpec::sealed(0.0809), &freqs).unwrap();
        assert_eq!(curve.len(), 120);
        assert!(curve.spl[119].abs() < 0.5, "top of band {}", curve.spl[119]);
        assert!(curve.spl.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn f3_extraction_matches_closed_form() {
        let driver = DriverParameters::new(27.4, 0.39, 0.185);
        let freqs = log_frequency_grid(400, 10.0, 400.0);
        let curve = response_curve(&driver, &EnclosureSpec::sealed(0.0809), &freqs).unwrap();
        let sys = SealedSystem::derive(&driver, 0.0809).unwrap();
        let f3 = curve.f3_from_reference(0.0).expect("curve crosses -3 dB");
        assert!((f3 - sys.f3).abs() < 0.5, "curve f3 {f3} vs closed form {}", sys.f3);
    }

    #[test]
    fn f3_is_none_when_curve_never_reaches_reference() {
        let curve = Curve {
            freq: Array1::from(vec![10.0, 20.0, 40.0]),
            spl: Array1::from(vec![-40.0, -30.0, -20.0]),
        };
        assert!(curve.f3_from_reference(0.0).is_none());
    }
}
