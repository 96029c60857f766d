//! Alignment search: invert the closed-form relations to find the
//! enclosure that realizes a target response shape.
//!
//! The sealed family is analytically invertible; target-F3 searches use
//! a bounded bisection. QB3 is the only named vented alignment: the B4
//! and C4 two-parameter inversions in the legacy design charts are a
//! known-unsolved problem here and are deliberately not offered.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::driver::DriverParameters;
use crate::enclosure::{EnclosureSpec, SealedSystem};
use crate::error::{invalid_parameter, BoxsimError, Result};
use crate::transfer::sealed_f3;

/// Bisection bracket for target-F3 searches, in Qtc.
const QTC_BRACKET: (f64, f64) = (0.4, 2.0);
/// Convergence tolerance on the f3 target (Hz).
const F3_TOLERANCE_HZ: f64 = 0.5;
/// Iteration bound for all bisection searches.
const MAX_BISECTION_STEPS: usize = 30;

/// Named sealed-box alignment targets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SealedAlignment {
    /// Maximally flat magnitude, Qtc = 0.707.
    Butterworth,
    /// Maximally flat group delay, Qtc = 0.577.
    Bessel,
    /// Equal-ripple with a presence peak, Qtc = 1.0.
    Chebyshev,
    /// Arbitrary numeric Qtc target.
    Custom(f64),
}

impl SealedAlignment {
    /// The total system Q this alignment targets.
    pub fn target_qtc(&self) -> f64 {
        match *self {
            SealedAlignment::Butterworth => 0.707,
            SealedAlignment::Bessel => 0.577,
            SealedAlignment::Chebyshev => 1.0,
            SealedAlignment::Custom(qtc) => qtc,
        }
    }

    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            SealedAlignment::Butterworth => "Butterworth",
            SealedAlignment::Bessel => "Bessel",
            SealedAlignment::Chebyshev => "Chebyshev",
            SealedAlignment::Custom(_) => "custom",
        }
    }
}

/// A resolved sealed design: the box volume plus the system it produces.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SealedDesign {
    /// Net box volume (m³).
    pub volume_m3: f64,
    /// Derived system parameters in that box.
    pub system: SealedSystem,
}

/// A resolved ported design recipe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortedDesign {
    /// Net box volume (m³).
    pub volume_m3: f64,
    /// Port tuning frequency (Hz).
    pub tuning_hz: f64,
}

/// Sealed box volume that realizes `target_qtc`, analytic inverse of
/// `qtc = qts·sqrt(1 + vas/vb)`.
///
/// Fails with `InfeasibleAlignment` when `target_qtc <= qts`: a sealed
/// box can only raise the system Q above the driver's own.
pub fn find_volume_for_qtc(qts: f64, vas: f64, target_qtc: f64) -> Result<f64> {
    if !(qts > 0.0) || !(vas > 0.0) {
        return Err(invalid_parameter("qts/vas", "must be positive"));
    }
    if target_qtc <= qts {
        return Err(BoxsimError::InfeasibleAlignment {
            target_qtc,
            qts,
        });
    }
    let ratio = target_qtc / qts;
    Ok(vas / (ratio * ratio - 1.0))
}

/// Resolve a named sealed alignment to a full design.
pub fn design_sealed(driver: &DriverParameters, alignment: SealedAlignment) -> Result<SealedDesign> {
    let volume_m3 = find_volume_for_qtc(driver.qts, driver.vas, alignment.target_qtc())?;
    let system = SealedSystem::derive(driver, volume_m3)?;
    Ok(SealedDesign { volume_m3, system })
}

/// QB3 (quasi-third-order) vented alignment, direct empirical closed
/// form: tuning at the driver resonance, volume scaled by Qts.
pub fn qb3_alignment(qts: f64, vas: f64, fs: f64) -> Result<PortedDesign> {
    if !(qts > 0.0) || !(vas > 0.0) || !(fs > 0.0) {
        return Err(invalid_parameter("qts/vas/fs", "must be positive"));
    }
    Ok(PortedDesign {
        volume_m3: 15.0 * qts.powf(2.7) * vas,
        tuning_hz: fs,
    })
}

/// Outcome of a bounded bisection search.
enum Bisection {
    Converged(f64),
    Exhausted { lo: f64, hi: f64 },
}

/// Bisect a monotonically increasing `f` over `[lo, hi]` until
/// `|f(x) - target| <= tolerance`, for at most `max_steps` steps.
fn bisect(
    mut lo: f64,
    mut hi: f64,
    target: f64,
    tolerance: f64,
    max_steps: usize,
    f: impl Fn(f64) -> f64,
) -> Bisection {
    for step in 0..max_steps {
        let mid = 0.5 * (lo + hi);
        let value = f(mid);
        if (value - target).abs() <= tolerance {
            debug!("bisection converged after {step} steps: x = {mid}");
            return Bisection::Converged(mid);
        }
        if value < target {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    Bisection::Exhausted { lo, hi }
}

/// Bounded ternary search for the minimizer of a unimodal `f`.
fn minimize(mut lo: f64, mut hi: f64, max_steps: usize, f: impl Fn(f64) -> f64) -> f64 {
    for _ in 0..max_steps {
        let a = lo + (hi - lo) / 3.0;
        let b = hi - (hi - lo) / 3.0;
        if f(a) < f(b) {
            hi = b;
        } else {
            lo = a;
        }
    }
    0.5 * (lo + hi)
}

/// Sealed enclosure whose -3 dB point hits `target_f3_hz`.
///
/// `f3(qtc)` is not monotone over the full [0.4, 2.0] bracket: it falls
/// toward a minimum near the Butterworth region (big boxes roll off
/// slowly, small boxes push fc up), then rises. Targets below that
/// minimum are physically unreachable for the driver; targets above it
/// are resolved on the increasing branch, i.e. the smallest box that
/// reaches the target. Fails with `UnreachableTarget` when the target
/// falls outside the reachable span or the bounded search is exhausted.
pub fn find_volume_for_f3(driver: &DriverParameters, target_f3_hz: f64) -> Result<EnclosureSpec> {
    if !(driver.fs > 0.0) || !(driver.qts > 0.0) || !(driver.vas > 0.0) {
        return Err(invalid_parameter(
            "driver",
            "fs, qts and vas must all be positive",
        ));
    }

    // fc/fs = sqrt(1+alpha) = qtc/qts, so f3 is a function of qtc alone
    let f3_of = |qtc: f64| sealed_f3(driver.fs * qtc / driver.qts, qtc);

    // the box must still raise Q above the driver's own
    let bracket_lo = QTC_BRACKET.0.max(driver.qts * (1.0 + 1e-9));
    let hi = QTC_BRACKET.1;
    if bracket_lo >= hi {
        return Err(BoxsimError::UnreachableTarget {
            target_hz: target_f3_hz,
            lo_hz: f3_of(hi),
            hi_hz: f3_of(hi),
        });
    }

    let lo = minimize(bracket_lo, hi, MAX_BISECTION_STEPS, &f3_of);

    let (f3_lo, f3_hi) = (f3_of(lo), f3_of(hi));
    if target_f3_hz < f3_lo - F3_TOLERANCE_HZ || target_f3_hz > f3_hi {
        return Err(BoxsimError::UnreachableTarget {
            target_hz: target_f3_hz,
            lo_hz: f3_lo,
            hi_hz: f3_hi,
        });
    }

    match bisect(
        lo,
        hi,
        target_f3_hz,
        F3_TOLERANCE_HZ,
        MAX_BISECTION_STEPS,
        &f3_of,
    ) {
        Bisection::Converged(qtc) => {
            let volume_m3 = find_volume_for_qtc(driver.qts, driver.vas, qtc)?;
            Ok(EnclosureSpec::sealed(volume_m3))
        }
        Bisection::Exhausted { lo, hi } => Err(BoxsimError::UnreachableTarget {
            target_hz: target_f3_hz,
            lo_hz: f3_of(lo),
            hi_hz: f3_of(hi),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_for_qtc_inverts_exactly() {
        for (qts, vas, target) in [
            (0.39, 0.185, 0.707),
            (0.30, 0.050, 0.577),
            (0.55, 0.400, 1.0),
            (0.25, 0.020, 1.5),
        ] {
            let vb = find_volume_for_qtc(qts, vas, target).unwrap();
            let realized = qts * (1.0 + vas / vb).sqrt();
            assert!(
                (realized - target).abs() / target < 1e-6,
                "qts {qts}: realized {realized} vs {target}"
            );
        }
    }

    #[test]
    fn qtc_at_or_below_qts_is_infeasible() {
        for target in [0.39, 0.30, 0.1] {
            let err = find_volume_for_qtc(0.39, 0.185, target).unwrap_err();
            assert!(err.is_design_error(), "{err}");
        }
    }

    #[test]
    fn butterworth_scenario_matches_reference_design() {
        // fs=27.4, qts=0.39, vas=185 L -> 80.9 L, fc = f3 ~= 49.7 Hz
        let driver = DriverParameters::new(27.4, 0.39, 0.185);
        let design = design_sealed(&driver, SealedAlignment::Butterworth).unwrap();
        assert!(
            (design.volume_m3 - 0.0809).abs() < 0.001,
            "volume {}",
            design.volume_m3
        );
        assert!((design.system.fc - 49.7).abs() < 1.0, "fc {}", design.system.fc);
        assert!((design.system.f3 - 49.7).abs() < 1.0, "f3 {}", design.system.f3);
    }

    #[test]
    fn qb3_scenario_matches_reference_design() {
        // fs=34.3, qts=0.35, vas=201 L -> ~178 L tuned to fs
        let design = qb3_alignment(0.35, 0.201, 34.3).unwrap();
        assert_eq!(design.tuning_hz, 34.3);
        assert!(
            (design.volume_m3 - 0.178).abs() < 0.005,
            "volume {}",
            design.volume_m3
        );
    }

    #[test]
    fn qb3_tuning_roundtrips_fs_exactly() {
        for fs in [18.0, 27.4, 34.3, 55.0] {
            assert_eq!(qb3_alignment(0.35, 0.1, fs).unwrap().tuning_hz, fs);
        }
    }

    #[test]
    fn f3_search_converges_within_tolerance() {
        let driver = DriverParameters::new(27.4, 0.39, 0.185);
        let enclosure = find_volume_for_f3(&driver, 55.0).unwrap();
        let EnclosureSpec::Sealed { volume_m3 } = enclosure else {
            panic!("expected sealed enclosure");
        };
        let sys = SealedSystem::derive(&driver, volume_m3).unwrap();
        assert!((sys.f3 - 55.0).abs() <= F3_TOLERANCE_HZ, "f3 {}", sys.f3);
    }

    #[test]
    fn f3_search_reports_unreachable_targets() {
        let driver = DriverParameters::new(27.4, 0.39, 0.185);
        // far below what a sealed box on this driver can reach
        let err = find_volume_for_f3(&driver, 10.0).unwrap_err();
        assert!(matches!(err, BoxsimError::UnreachableTarget { .. }), "{err}");
        // and far above
        let err = find_volume_for_f3(&driver, 500.0).unwrap_err();
        assert!(matches!(err, BoxsimError::UnreachableTarget { .. }), "{err}");
    }
}
