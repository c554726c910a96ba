//! Transition easing curves: cubic Hermite segments over the unit square.
//!
//! Model:
//! - A curve is an ordered keyframe slice; each key carries a value plus
//!   in/out tangents (slopes, not control points).
//! - Zero keys is the identity ramp (output = input), the fast path every
//!   consumer is expected to hit for un-eased transitions.
//! - One key is a constant.
//! - Otherwise the bracketing segment is evaluated with the standard cubic
//!   Hermite basis, parameterized by the fractional position within the
//!   segment, and the result is clamped back into [0,1] so steep tangents
//!   never leak out-of-range progress to the caller.
//!
//! The evaluator only sees a plain slice, so sampling from a flattened
//! contiguous table and from a standalone keyframe list is identical.

use serde::{Deserialize, Serialize};

/// Tolerance used when deciding that an authored curve is the default
/// linear ramp and can be dropped entirely.
const LINEAR_TOLERANCE: f32 = 1e-4;

/// One Hermite keyframe: time/value plus arrival and departure slopes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CurveKey {
    pub time: f32,
    pub value: f32,
    #[serde(default)]
    pub in_tangent: f32,
    #[serde(default)]
    pub out_tangent: f32,
}

impl CurveKey {
    pub fn new(time: f32, value: f32, in_tangent: f32, out_tangent: f32) -> Self {
        Self {
            time,
            value,
            in_tangent,
            out_tangent,
        }
    }
}

/// Cubic Hermite basis over one segment. `s` is the local fraction in [0,1],
/// `dt` the segment length in curve time (tangents are slopes per unit time).
#[inline]
fn hermite(p0: f32, m0: f32, p1: f32, m1: f32, dt: f32, s: f32) -> f32 {
    let s2 = s * s;
    let s3 = s2 * s;
    let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
    let h10 = s3 - 2.0 * s2 + s;
    let h01 = -2.0 * s3 + 3.0 * s2;
    let h11 = s3 - s2;
    h00 * p0 + h10 * dt * m0 + h01 * p1 + h11 * dt * m1
}

/// Evaluate a curve at `t`.
///
/// Empty slice returns `t` unchanged; a single key returns its (clamped)
/// constant value; otherwise `t` is clamped to [0,1], the bracketing segment
/// located, and the Hermite result clamped to [0,1].
pub fn evaluate_curve(keys: &[CurveKey], t: f32) -> f32 {
    match keys.len() {
        0 => t,
        1 => keys[0].value.clamp(0.0, 1.0),
        n => {
            let t = t.clamp(0.0, 1.0);
            if t <= keys[0].time {
                return keys[0].value.clamp(0.0, 1.0);
            }
            if t >= keys[n - 1].time {
                return keys[n - 1].value.clamp(0.0, 1.0);
            }
            let mut i = 0;
            while i + 2 < n && t > keys[i + 1].time {
                i += 1;
            }
            let k0 = &keys[i];
            let k1 = &keys[i + 1];
            let dt = (k1.time - k0.time).max(f32::EPSILON);
            let s = ((t - k0.time) / dt).clamp(0.0, 1.0);
            hermite(k0.value, k0.out_tangent, k1.value, k1.in_tangent, dt, s).clamp(0.0, 1.0)
        }
    }
}

/// True when `keys` encodes the default linear ramp: either already empty,
/// or exactly two keys at (0,0)/(1,1) with unit interior tangents.
pub fn is_identity_ramp(keys: &[CurveKey]) -> bool {
    match keys {
        [] => true,
        [a, b] => {
            a.time.abs() <= LINEAR_TOLERANCE
                && a.value.abs() <= LINEAR_TOLERANCE
                && (b.time - 1.0).abs() <= LINEAR_TOLERANCE
                && (b.value - 1.0).abs() <= LINEAR_TOLERANCE
                && (a.out_tangent - 1.0).abs() <= LINEAR_TOLERANCE
                && (b.in_tangent - 1.0).abs() <= LINEAR_TOLERANCE
        }
        _ => false,
    }
}

/// Reduce an authored easing curve for embedding in the blob: a
/// default-shaped linear curve becomes the empty list so every consumer can
/// take the identity fast path; anything else is kept as-is.
pub fn simplify_easing(keys: &[CurveKey]) -> Vec<CurveKey> {
    if is_identity_ramp(keys) {
        Vec::new()
    } else {
        keys.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32, eps: f32) {
        assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
    }

    /// it should return t unchanged for an empty curve
    #[test]
    fn identity_fast_path() {
        for t in [-0.5f32, 0.0, 0.25, 0.7, 1.0, 1.5] {
            assert_eq!(evaluate_curve(&[], t), t);
        }
    }

    /// it should return the constant value for a single keyframe
    #[test]
    fn single_key_constant() {
        let keys = [CurveKey::new(0.3, 0.6, 0.0, 0.0)];
        approx(evaluate_curve(&keys, 0.0), 0.6, 1e-6);
        approx(evaluate_curve(&keys, 1.0), 0.6, 1e-6);
    }

    /// it should reproduce a linear ramp from unit-tangent endpoint keys
    #[test]
    fn linear_ramp_matches_input() {
        let keys = [
            CurveKey::new(0.0, 0.0, 1.0, 1.0),
            CurveKey::new(1.0, 1.0, 1.0, 1.0),
        ];
        for i in 0..=10 {
            let t = i as f32 / 10.0;
            approx(evaluate_curve(&keys, t), t, 1e-5);
        }
    }

    /// it should clamp the input time into [0,1]
    #[test]
    fn clamps_input() {
        let keys = [
            CurveKey::new(0.0, 0.0, 1.0, 1.0),
            CurveKey::new(1.0, 1.0, 1.0, 1.0),
        ];
        assert_eq!(evaluate_curve(&keys, -0.5), evaluate_curve(&keys, 0.0));
        assert_eq!(evaluate_curve(&keys, 2.0), evaluate_curve(&keys, 1.0));
    }

    /// it should never return a value outside [0,1] for steep tangents
    #[test]
    fn steep_tangents_clamped() {
        let keys = [
            CurveKey::new(0.0, 0.0, 0.0, 12.0),
            CurveKey::new(1.0, 1.0, 12.0, 0.0),
        ];
        for i in 0..=40 {
            let v = evaluate_curve(&keys, i as f32 / 40.0);
            assert!((0.0..=1.0).contains(&v), "out of range: {v}");
        }
    }

    /// it should evaluate identically from a flattened table slice and a standalone list
    #[test]
    fn representation_independent() {
        let standalone = vec![
            CurveKey::new(0.0, 0.0, 0.0, 2.0),
            CurveKey::new(0.5, 0.8, 0.4, 0.4),
            CurveKey::new(1.0, 1.0, 2.0, 0.0),
        ];
        // Same keys embedded mid-table, addressed through a range.
        let mut table = vec![CurveKey::new(0.0, 1.0, 0.0, 0.0); 4];
        table.extend(standalone.iter().copied());
        let slice = &table[4..7];
        for i in 0..=20 {
            let t = i as f32 / 20.0;
            assert_eq!(evaluate_curve(&standalone, t), evaluate_curve(slice, t));
        }
    }

    /// it should drop default-shaped linear curves and keep everything else
    #[test]
    fn simplify_detects_default_ramp() {
        let linear = [
            CurveKey::new(0.0, 0.0, 1.0, 1.0),
            CurveKey::new(1.0, 1.0, 1.0, 1.0),
        ];
        assert!(simplify_easing(&linear).is_empty());

        let eased = [
            CurveKey::new(0.0, 0.0, 0.0, 0.0),
            CurveKey::new(1.0, 1.0, 0.0, 0.0),
        ];
        assert_eq!(simplify_easing(&eased).len(), 2);
    }
}
