//! Driver parameter validation.
//!
//! Absolute-bound violations and irreconcilable cross-relations are
//! errors (downstream computation should not proceed); unit-plausible
//! mismatches between redundant fields are warnings only. Real driver
//! datasheets routinely disagree by 10-15% across measurement methods,
//! so the warning band is deliberately wide.

use std::f64::consts::PI;

use crate::constants::AIR_BULK_MODULUS;
use crate::driver::DriverParameters;

/// Relative deviation between redundant fields below which nothing is said.
const CROSS_CHECK_QUIET: f64 = 0.05;
/// Relative deviation above which a cross-relation is irreconcilable.
const CROSS_CHECK_FATAL: f64 = 0.30;

/// Findings from driver parameter validation.
///
/// Validity is derived, not stored: a set is usable downstream exactly
/// while `errors` stays empty.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// Critical problems that prevent computation.
    pub errors: Vec<String>,
    /// Advisory inconsistencies; computation proceeds.
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// True while no error has been recorded.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Record a critical problem.
    pub fn add_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    /// Record an advisory finding.
    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Fold another result's findings into this one.
    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

/// Validate a driver parameter set.
///
/// Checks absolute physical bounds on the required fields and, for every
/// redundant optional field present, the cross-relations that tie it to
/// the rest of the set (`qts` vs `qes`/`qms`, `vas` vs `cms`·`sd`²,
/// `fs` vs `mms`·`cms`).
pub fn validate(params: &DriverParameters) -> ValidationResult {
    let mut result = ValidationResult::default();

    validate_bounds(params, &mut result);
    validate_cross_relations(params, &mut result);

    result
}

fn validate_bounds(params: &DriverParameters, result: &mut ValidationResult) {
    if !(10.0..=500.0).contains(&params.fs) {
        result.add_error(format!(
            "fs ({} Hz) outside the plausible driver range 10..500 Hz",
            params.fs
        ));
    }
    if !(params.qts > 0.0) {
        result.add_error(format!("qts ({}) must be positive", params.qts));
    } else if params.qts > 2.0 {
        result.add_warning(format!("qts ({}) is unusually high", params.qts));
    }
    if !(params.vas > 0.0) {
        result.add_error(format!("vas ({} m³) must be positive", params.vas));
    } else if params.vas > 1.0 {
        result.add_warning(format!(
            "vas ({} m³) is over 1000 L; value may be in liters",
            params.vas
        ));
    }

    for (name, value) in [
        ("qes", params.qes),
        ("qms", params.qms),
        ("re", params.re),
        ("bl", params.bl),
        ("mms", params.mms),
        ("cms", params.cms),
        ("rms", params.rms),
        ("sd", params.sd),
        ("xmax", params.xmax),
        ("pe", params.pe),
    ] {
        if let Some(v) = value {
            if !(v > 0.0) || !v.is_finite() {
                result.add_error(format!("{name} ({v}) must be positive and finite"));
            }
        }
    }

    if let (Some(qes), Some(qms)) = (params.qes, params.qms) {
        if params.qts >= qes && qes > 0.0 {
            result.add_error(format!(
                "qts ({}) must be below qes ({qes})",
                params.qts
            ));
        }
        if params.qts >= qms && qms > 0.0 {
            result.add_error(format!(
                "qts ({}) must be below qms ({qms})",
                params.qts
            ));
        }
    }
}

fn validate_cross_relations(params: &DriverParameters, result: &mut ValidationResult) {
    if let (Some(qes), Some(qms)) = (params.qes, params.qms) {
        if qes > 0.0 && qms > 0.0 {
            let qts = 1.0 / (1.0 / qes + 1.0 / qms);
            cross_check(result, "qts", params.qts, "1/(1/qes + 1/qms)", qts);
        }
    }

    if let (Some(cms), Some(sd)) = (params.cms, params.sd) {
        if cms > 0.0 && sd > 0.0 {
            let vas = AIR_BULK_MODULUS * cms * sd * sd;
            cross_check(result, "vas", params.vas, "rho*c^2*cms*sd^2", vas);
        }
    }

    if let (Some(mms), Some(cms)) = (params.mms, params.cms) {
        if mms > 0.0 && cms > 0.0 {
            let fs = 1.0 / (2.0 * PI * (mms * cms).sqrt());
            cross_check(result, "fs", params.fs, "1/(2*pi*sqrt(mms*cms))", fs);
        }
    }
}

fn cross_check(result: &mut ValidationResult, name: &str, stated: f64, formula: &str, derived: f64) {
    if !(stated > 0.0) || !derived.is_finite() {
        return;
    }
    let deviation = (stated - derived).abs() / stated;
    if deviation > CROSS_CHECK_FATAL {
        result.add_error(format!(
            "{name} ({stated:.4}) disagrees with {formula} ({derived:.4}) by {:.0}%",
            deviation * 100.0
        ));
    } else if deviation > CROSS_CHECK_QUIET {
        result.add_warning(format!(
            "{name} ({stated:.4}) differs from {formula} ({derived:.4}) by {:.0}%",
            deviation * 100.0
        ));
    }
}
