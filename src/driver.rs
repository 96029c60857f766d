//! Driver electro-mechanical parameter model.
//!
//! [`DriverParameters`] is an immutable value object holding a driver's
//! Thiele-Small parameters. Only `fs`, `qts` and `vas` are required; the
//! remaining fields are optional and unlock additional engine features
//! (the network solver needs `qms`, `re`, `sd`; the power-limit engine
//! additionally needs `xmax` and `pe`).

use log::warn;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::constants::AIR_BULK_MODULUS;
use crate::error::{invalid_parameter, Result};

/// Thiele-Small parameter set for a single driver.
///
/// All fields are SI: Hz, m³, Ω, N/A, kg, m/N, N·s/m, m², m, W.
/// Instances are never mutated; normalization returns a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverParameters {
    /// Free-air resonance frequency (Hz).
    pub fs: f64,
    /// Total quality factor at fs.
    pub qts: f64,
    /// Equivalent compliance volume (m³).
    pub vas: f64,
    /// Electrical quality factor at fs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qes: Option<f64>,
    /// Mechanical quality factor at fs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qms: Option<f64>,
    /// Voice-coil DC resistance (Ω).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub re: Option<f64>,
    /// Force factor (N/A).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bl: Option<f64>,
    /// Moving mass including air load (kg).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mms: Option<f64>,
    /// Suspension mechanical compliance (m/N).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cms: Option<f64>,
    /// Suspension mechanical resistance (N·s/m).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rms: Option<f64>,
    /// Effective piston area (m²).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sd: Option<f64>,
    /// Maximum linear excursion, peak (m).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xmax: Option<f64>,
    /// Thermal power limit (W).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pe: Option<f64>,
}

impl DriverParameters {
    /// Create a parameter set from the three required parameters, with
    /// every optional field unset.
    pub fn new(fs: f64, qts: f64, vas: f64) -> Self {
        Self {
            fs,
            qts,
            vas,
            qes: None,
            qms: None,
            re: None,
            bl: None,
            mms: None,
            cms: None,
            rms: None,
            sd: None,
            xmax: None,
            pe: None,
        }
    }

    /// Return a copy with plausible unit mistakes corrected.
    ///
    /// Catalog data frequently arrives in liters, cm² or mm instead of
    /// SI. Values that are implausible in SI are rescaled:
    /// `vas > 10` m³ is read as liters, `sd > 1` m² as cm² and
    /// `xmax > 0.05` m as millimeters. The original is left untouched.
    pub fn normalized(&self) -> Self {
        let mut out = self.clone();
        if out.vas > 10.0 {
            warn!("vas = {} looks like liters, converting to m³", out.vas);
            out.vas /= 1000.0;
        }
        if let Some(sd) = out.sd {
            if sd > 1.0 {
                warn!("sd = {} looks like cm², converting to m²", sd);
                out.sd = Some(sd / 10_000.0);
            }
        }
        if let Some(xmax) = out.xmax {
            if xmax > 0.05 {
                warn!("xmax = {} looks like mm, converting to m", xmax);
                out.xmax = Some(xmax / 1000.0);
            }
        }
        out
    }

    pub(crate) fn require(&self, name: &'static str) -> Result<f64> {
        let value = match name {
            "qes" => self.qes,
            "qms" => self.qms,
            "re" => self.re,
            "bl" => self.bl,
            "mms" => self.mms,
            "cms" => self.cms,
            "rms" => self.rms,
            "sd" => self.sd,
            "xmax" => self.xmax,
            "pe" => self.pe,
            _ => unreachable!("unknown optional driver field"),
        };
        value.ok_or_else(|| invalid_parameter(name, "required for this operation but not set"))
    }
}

/// Secondary mechanical/electrical quantities derived from the
/// Thiele-Small set, as needed by the network solver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MechanicalParameters {
    /// Suspension compliance (m/N).
    pub cms: f64,
    /// Moving mass (kg).
    pub mms: f64,
    /// Electrical quality factor.
    pub qes: f64,
    /// Force factor (N/A).
    pub bl: f64,
    /// Mechanical resistance (N·s/m).
    pub rms: f64,
}

/// Derive the mechanical parameter set from `{fs, qms, qts, vas, re, sd}`.
///
/// Pure and deterministic. Fails with `InvalidParameter` if any required
/// input is missing or non-positive, or if `qts >= qms` (which would
/// imply a non-positive electrical Q).
pub fn derive_mechanical(params: &DriverParameters) -> Result<MechanicalParameters> {
    let qms = params.require("qms")?;
    let re = params.require("re")?;
    let sd = params.require("sd")?;

    for (name, value) in [
        ("fs", params.fs),
        ("qts", params.qts),
        ("vas", params.vas),
        ("qms", qms),
        ("re", re),
        ("sd", sd),
    ] {
        if !(value > 0.0) || !value.is_finite() {
            return Err(invalid_parameter(name, format!("must be positive, got {value}")));
        }
    }
    if params.qts >= qms {
        return Err(invalid_parameter(
            "qts",
            format!("qts ({}) must be below qms ({qms})", params.qts),
        ));
    }

    let ws = 2.0 * PI * params.fs;
    let cms = params.vas / (AIR_BULK_MODULUS * sd * sd);
    let mms = 1.0 / (ws * ws * cms);
    let qes = 1.0 / (1.0 / params.qts - 1.0 / qms);
    let bl = (ws * mms * re / qes).sqrt();
    let rms = ws * mms / qms;

    Ok(MechanicalParameters {
        cms,
        mms,
        qes,
        bl,
        rms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_driver() -> DriverParameters {
        let mut d = DriverParameters::new(27.4, 0.39, 0.185);
        d.qms = Some(3.5);
        d.re = Some(6.3);
        d.sd = Some(0.0855);
        d
    }

    #[test]
    fn derive_mechanical_roundtrips_fs_and_qts() {
        let d = test_driver();
        let m = derive_mechanical(&d).unwrap();

        // fs must be recoverable from mms and cms
        let fs = 1.0 / (2.0 * PI * (m.mms * m.cms).sqrt());
        assert!((fs - d.fs).abs() / d.fs < 1e-9);

        // 1/qts = 1/qes + 1/qms must hold for the derived qes
        let qts = 1.0 / (1.0 / m.qes + 1.0 / d.qms.unwrap());
        assert!((qts - d.qts).abs() / d.qts < 1e-9);
    }

    #[test]
    fn derive_mechanical_rejects_qts_at_or_above_qms() {
        let mut d = test_driver();
        d.qms = Some(0.39);
        assert!(derive_mechanical(&d).is_err());
        d.qms = Some(0.2);
        assert!(derive_mechanical(&d).is_err());
    }

    #[test]
    fn derive_mechanical_rejects_missing_fields() {
        let d = DriverParameters::new(27.4, 0.39, 0.185);
        assert!(derive_mechanical(&d).is_err());
    }

    #[test]
    fn normalized_rescales_liters_and_millimeters() {
        let mut d = DriverParameters::new(27.4, 0.39, 185.0);
        d.xmax = Some(6.5);
        d.sd = Some(855.0);
        let n = d.normalized();
        assert!((n.vas - 0.185).abs() < 1e-12);
        assert!((n.xmax.unwrap() - 0.0065).abs() < 1e-12);
        assert!((n.sd.unwrap() - 0.0855).abs() < 1e-12);
        // original untouched
        assert_eq!(d.vas, 185.0);
    }
}
