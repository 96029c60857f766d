//! Closed-form transfer function engine.
//!
//! Two evaluators: the exact 2nd-order highpass of a sealed box
//! (parameterized by `fc`, `qtc`) and the lossy 4th-order highpass of a
//! vented box (parameterized by `fs`, `fb`, `alpha`, `qts`, `ql`).
//! Both return magnitude in dB relative to passband level and are
//! floor-clamped so curves stay plottable down to DC.
//!
//! The vented form comes from the standard lumped model. With
//! `Ts = 1/ωs`, `Tb = 1/ωb` and s the Laplace variable:
//!
//! ```text
//! A(s) = s²Ts² + sTs/Qts + 1          (driver branch)
//! B(s) = s²Tb² + sTb/QL  + 1          (box/port branch, leakage QL)
//! D(s) = A(s)·B(s) + α·s²Tb²
//! G(s) = s²Ts²·(s²Tb² + sTb/QL) / D(s)
//! ```
//!
//! `G` converges to 1 in the passband, rolls off at 24 dB/oct below fb,
//! and carries the phase information that produces the cone excursion
//! null at fb; the same polynomials drive the displacement evaluators
//! used by the power-limit engine.

use num_complex::Complex64;
use std::f64::consts::PI;

use crate::constants::{MAGNITUDE_FLOOR, REFERENCE_FREQ_HZ};

/// Convert a linear magnitude ratio to dB with the engine-wide floor.
#[inline]
pub(crate) fn ratio_to_db(ratio: f64) -> f64 {
    20.0 * ratio.max(MAGNITUDE_FLOOR).log10()
}

/// Sealed-box response in dB at `f`, for a system with resonance `fc`
/// and total Q `qtc`. 0 dB deep in the passband, -200 dB floor near DC.
pub fn sealed_response_db(f: f64, fc: f64, qtc: f64) -> f64 {
    let r2 = (f / fc).powi(2);
    let denom = (1.0 - r2).powi(2) + r2 / (qtc * qtc);
    ratio_to_db((r2 * r2 / denom).sqrt())
}

/// The -3 dB frequency of a sealed system, closed form.
///
/// For `qtc = 0.707` this collapses to `f3 = fc`.
pub fn sealed_f3(fc: f64, qtc: f64) -> f64 {
    let a = 1.0 / (qtc * qtc) - 2.0;
    let x = (a + (a * a + 4.0).sqrt()) / 2.0;
    fc * x.sqrt()
}

/// Sealed cone displacement relative to the static (DC) displacement.
///
/// 1.0 at DC, falling as 1/f² in the mass-controlled passband.
pub fn sealed_displacement_ratio(f: f64, fc: f64, qtc: f64) -> f64 {
    let r2 = (f / fc).powi(2);
    1.0 / ((1.0 - r2).powi(2) + r2 / (qtc * qtc)).sqrt()
}

/// The driver branch polynomial A(s) evaluated at s = j2πf.
fn driver_branch(f: f64, fs: f64, qts: f64) -> Complex64 {
    let s = Complex64::new(0.0, 2.0 * PI * f);
    let ts = 1.0 / (2.0 * PI * fs);
    s * s * (ts * ts) + s * (ts / qts) + 1.0
}

/// The box/port branch polynomial B(s) evaluated at s = j2πf.
///
/// `ql = f64::INFINITY` gives the lossless case.
fn box_branch(f: f64, fb: f64, ql: f64) -> Complex64 {
    let s = Complex64::new(0.0, 2.0 * PI * f);
    let tb = 1.0 / (2.0 * PI * fb);
    let loss = if ql.is_finite() { tb / ql } else { 0.0 };
    s * s * (tb * tb) + s * loss + 1.0
}

fn vented_denominator(f: f64, fs: f64, fb: f64, alpha: f64, qts: f64, ql: f64) -> Complex64 {
    let s = Complex64::new(0.0, 2.0 * PI * f);
    let tb = 1.0 / (2.0 * PI * fb);
    driver_branch(f, fs, qts) * box_branch(f, fb, ql) + s * s * (alpha * tb * tb)
}

/// Complex vented-box transfer function G(s) at `f`.
pub(crate) fn vented_transfer(f: f64, fs: f64, fb: f64, alpha: f64, qts: f64, ql: f64) -> Complex64 {
    let s = Complex64::new(0.0, 2.0 * PI * f);
    let ts = 1.0 / (2.0 * PI * fs);
    let tb = 1.0 / (2.0 * PI * fb);
    let loss = if ql.is_finite() { tb / ql } else { 0.0 };
    let numerator = s * s * (ts * ts) * (s * s * (tb * tb) + s * loss);
    numerator / vented_denominator(f, fs, fb, alpha, qts, ql)
}

/// Vented-box response in dB at `f`.
///
/// Normalized against the evaluation at the 200 Hz reference frequency,
/// so the curve is relative to passband level rather than absolute SPL;
/// callers add sensitivity and power-gain terms separately.
pub fn ported_response_db(f: f64, fs: f64, fb: f64, alpha: f64, qts: f64, ql: f64) -> f64 {
    let g = vented_transfer(f, fs, fb, alpha, qts, ql);
    let g_ref = vented_transfer(REFERENCE_FREQ_HZ, fs, fb, alpha, qts, ql);
    ratio_to_db(g.norm() / g_ref.norm())
}

/// Vented cone displacement relative to the static (DC) displacement,
/// `|B(jω)| / |D(jω)|`.
///
/// Dips sharply at fb, where the port carries the volume displacement
/// instead of the cone. This is the physically correct shape; the power
/// engine relies on it to reproduce the excursion null.
pub fn ported_displacement_ratio(f: f64, fs: f64, fb: f64, alpha: f64, qts: f64, ql: f64) -> f64 {
    let b = box_branch(f, fb, ql);
    let d = vented_denominator(f, fs, fb, alpha, qts, ql);
    b.norm() / d.norm()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sealed_passband_converges_to_zero_db() {
        assert!(sealed_response_db(1000.0, 50.0, 0.707).abs() < 0.5);
    }

    #[test]
    fn sealed_butterworth_is_three_db_down_at_fc() {
        let db = sealed_response_db(50.0, 50.0, 0.707);
        assert!((-4.0..=-2.0).contains(&db), "got {db}");
        assert!((db + 3.01).abs() < 0.05);
    }

    #[test]
    fn sealed_response_is_monotone_and_floored_toward_dc() {
        let mut prev = sealed_response_db(40.0, 50.0, 0.707);
        for f in [20.0, 10.0, 5.0, 1.0, 0.1, 0.0] {
            let db = sealed_response_db(f, 50.0, 0.707);
            assert!(db.is_finite(), "non-finite response at {f} Hz");
            assert!(db <= prev + 1e-9, "response rose as f fell at {f} Hz");
            prev = db;
        }
        // f = 0 hits the floor representation, not -inf
        assert!(sealed_response_db(0.0, 50.0, 0.707) <= -180.0);
    }

    #[test]
    fn sealed_f3_matches_response() {
        for qtc in [0.5, 0.707, 1.0, 1.5] {
            let f3 = sealed_f3(50.0, qtc);
            let db = sealed_response_db(f3, 50.0, qtc);
            assert!((db + 3.01).abs() < 0.05, "qtc {qtc}: {db} dB at f3");
        }
    }

    #[test]
    fn ported_rolloff_is_steeper_than_sealed() {
        // Same resonance region; compare slope one octave below tuning.
        let fb = 30.0;
        let sealed_drop = sealed_response_db(fb / 2.0, fb, 0.707) - sealed_response_db(fb, fb, 0.707);
        let ported_drop = ported_response_db(fb / 2.0, 30.0, fb, 1.0, 0.35, 7.0)
            - ported_response_db(fb, 30.0, fb, 1.0, 0.35, 7.0);
        assert!(ported_drop < sealed_drop);
    }

    #[test]
    fn ported_passband_converges_to_zero_db() {
        let db = ported_response_db(180.0, 30.0, 30.0, 1.0, 0.35, 7.0);
        assert!(db.abs() < 0.5, "got {db}");
    }

    #[test]
    fn ported_lossless_accepts_infinite_ql() {
        let db = ported_response_db(25.0, 30.0, 30.0, 1.0, 0.35, f64::INFINITY);
        assert!(db.is_finite());
    }

    #[test]
    fn ported_displacement_dips_at_tuning() {
        let at_fb = ported_displacement_ratio(30.0, 30.0, 30.0, 1.13, 0.35, 7.0);
        let below = ported_displacement_ratio(15.0, 30.0, 30.0, 1.13, 0.35, 7.0);
        let above = ported_displacement_ratio(45.0, 30.0, 30.0, 1.13, 0.35, 7.0);
        assert!(at_fb < below);
        assert!(at_fb < above);
    }

    #[test]
    fn displacement_ratios_start_at_unity() {
        assert!((sealed_displacement_ratio(0.0, 50.0, 0.707) - 1.0).abs() < 1e-12);
        assert!((ported_displacement_ratio(0.0, 30.0, 30.0, 1.0, 0.35, 7.0) - 1.0).abs() < 1e-12);
    }
}
