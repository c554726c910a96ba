//! Per-frame blend-weight computation for 1D and 2D blend states.
//!
//! All functions are pure and allocation-free: the caller owns the output
//! slice (`weights.len()` must equal the clip count) and every call leaves
//! it fully populated. Zero clips is a no-op. There is no invalid input
//! domain: non-finite input components are treated as zero so a frame loop
//! never sees NaN weights, and every variant keeps weights non-negative and
//! summing to 1.

use core::f32::consts::{PI, TAU};

/// Positions and input magnitudes below this count as "at the origin".
const POS_EPSILON: f32 = 1e-4;

#[inline]
fn sanitize(v: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

#[inline]
fn length(p: [f32; 2]) -> f32 {
    (p[0] * p[0] + p[1] * p[1]).sqrt()
}

/// 1D threshold blend: clamp the input into the threshold span, give the two
/// bracketing clips complementary linear weights, everything else 0.
///
/// `thresholds` must be sorted ascending (the compiler emits them sorted).
/// A single clip always receives weight 1 regardless of input.
pub fn blend_weights_1d(thresholds: &[f32], input: f32, weights: &mut [f32]) {
    debug_assert_eq!(thresholds.len(), weights.len());
    debug_assert!(thresholds.windows(2).all(|w| w[0] <= w[1]));
    let n = thresholds.len();
    if n == 0 {
        return;
    }
    weights.fill(0.0);
    if n == 1 {
        weights[0] = 1.0;
        return;
    }
    let x = sanitize(input).clamp(thresholds[0], thresholds[n - 1]);
    let mut i = 0;
    while i + 2 < n && x > thresholds[i + 1] {
        i += 1;
    }
    let t0 = thresholds[i];
    let t1 = thresholds[i + 1];
    let span = t1 - t0;
    if span <= f32::EPSILON {
        weights[i] = 1.0;
    } else {
        let f = ((x - t0) / span).clamp(0.0, 1.0);
        weights[i] = 1.0 - f;
        weights[i + 1] = f;
    }
}

/// 2D simple directional blend.
///
/// Clip positions are directions in blend-parameter space; at most one clip
/// sits at the origin (the idle clip). The two clips angularly straddling
/// the input direction interpolate by angular fraction, then hand weight to
/// the idle clip as the input magnitude shrinks toward zero. All
/// non-selected clips are exactly 0.
pub fn blend_weights_simple_directional(
    positions: &[[f32; 2]],
    input: [f32; 2],
    weights: &mut [f32],
) {
    debug_assert_eq!(positions.len(), weights.len());
    let n = positions.len();
    if n == 0 {
        return;
    }
    weights.fill(0.0);
    if n == 1 {
        weights[0] = 1.0;
        return;
    }

    let v = [sanitize(input[0]), sanitize(input[1])];
    let mag = length(v);
    let idle = positions.iter().position(|p| length(*p) <= POS_EPSILON);

    if mag <= POS_EPSILON {
        // Idle clip wins at the origin; otherwise the clip nearest the
        // origin, first index on exact ties.
        let ix = idle.unwrap_or_else(|| {
            let mut best = 0;
            let mut best_len = length(positions[0]);
            for (i, p) in positions.iter().enumerate().skip(1) {
                let l = length(*p);
                if l < best_len {
                    best = i;
                    best_len = l;
                }
            }
            best
        });
        weights[ix] = 1.0;
        return;
    }

    let dir = v[1].atan2(v[0]);

    // Angular neighbours of the input direction among the non-idle clips:
    // the nearest on the counter-clockwise side and the nearest clockwise.
    let mut ccw: Option<(usize, f32)> = None;
    let mut cw: Option<(usize, f32)> = None;
    for (i, p) in positions.iter().enumerate() {
        if Some(i) == idle || length(*p) <= POS_EPSILON {
            continue;
        }
        let mut d = p[1].atan2(p[0]) - dir;
        if d > PI {
            d -= TAU;
        } else if d < -PI {
            d += TAU;
        }
        if d >= 0.0 {
            if ccw.map_or(true, |(_, best)| d < best) {
                ccw = Some((i, d));
            }
        } else if cw.map_or(true, |(_, best)| -d < best) {
            cw = Some((i, -d));
        }
    }

    let (ia, wa, ib, wb) = match (ccw, cw) {
        (Some((ia, da)), Some((ib, db))) => {
            let denom = da + db;
            if denom <= 1e-6 {
                // Both neighbours sit on the input direction; first index wins.
                let first = ia.min(ib);
                (first, 1.0, first, 0.0)
            } else {
                (ia, db / denom, ib, da / denom)
            }
        }
        // All non-idle clips on one side (colinear layouts): full weight to
        // the angularly nearest clip.
        (Some((ia, _)), None) => (ia, 1.0, ia, 0.0),
        (None, Some((ib, _))) => (ib, 1.0, ib, 0.0),
        (None, None) => {
            // Every clip is at the origin; fall back to the idle rule.
            weights[idle.unwrap_or(0)] = 1.0;
            return;
        }
    };

    // Magnitude handoff: reference magnitude is the angular interpolation of
    // the selected clip magnitudes, so the idle share reaches 0 once the
    // input is as long as the surrounding clips.
    let idle_frac = match idle {
        Some(_) => {
            let ref_mag = wa * length(positions[ia]) + wb * length(positions[ib]);
            if ref_mag <= POS_EPSILON {
                0.0
            } else {
                (1.0 - mag / ref_mag).clamp(0.0, 1.0)
            }
        }
        None => 0.0,
    };

    let dir_total = 1.0 - idle_frac;
    weights[ia] += dir_total * wa;
    weights[ib] += dir_total * wb;
    if let Some(ii) = idle {
        weights[ii] += idle_frac;
    }
}

/// 2D inverse-distance-weighted blend: every clip contributes 1/d² of the
/// distance from the input to its position, normalized to sum 1. An input
/// exactly on a clip position gives that clip weight 1 (first index on
/// ties) and all others 0.
pub fn blend_weights_inverse_distance(
    positions: &[[f32; 2]],
    input: [f32; 2],
    weights: &mut [f32],
) {
    debug_assert_eq!(positions.len(), weights.len());
    let n = positions.len();
    if n == 0 {
        return;
    }
    weights.fill(0.0);
    if n == 1 {
        weights[0] = 1.0;
        return;
    }

    let v = [sanitize(input[0]), sanitize(input[1])];
    let eps2 = POS_EPSILON * POS_EPSILON;

    let mut sum = 0.0f32;
    let mut nearest = 0usize;
    let mut nearest_d2 = f32::INFINITY;
    for (i, p) in positions.iter().enumerate() {
        let dx = v[0] - p[0];
        let dy = v[1] - p[1];
        let d2 = dx * dx + dy * dy;
        if d2 <= eps2 {
            weights.fill(0.0);
            weights[i] = 1.0;
            return;
        }
        if d2 < nearest_d2 {
            nearest = i;
            nearest_d2 = d2;
        }
        let w = 1.0 / d2;
        weights[i] = w;
        sum += w;
    }

    // Enormous inputs can underflow every contribution to zero; keep the
    // contract by collapsing onto the nearest clip.
    if !(sum.is_finite() && sum > 0.0) {
        weights.fill(0.0);
        weights[nearest] = 1.0;
        return;
    }
    for w in weights.iter_mut() {
        *w /= sum;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32, eps: f32) {
        assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
    }

    fn sum(w: &[f32]) -> f32 {
        w.iter().sum()
    }

    fn assert_weight_contract(w: &[f32]) {
        assert!(w.iter().all(|x| x.is_finite() && *x >= 0.0), "{w:?}");
        approx(sum(w), 1.0, 1e-4);
    }

    /// it should give the middle clip full weight at its threshold
    #[test]
    fn one_d_exact_threshold() {
        let thresholds = [-1.0, 0.0, 1.0];
        let mut w = [0.0; 3];
        blend_weights_1d(&thresholds, 0.0, &mut w);
        assert_eq!(w, [0.0, 1.0, 0.0]);
    }

    /// it should interpolate bracketing clips and clamp out-of-range input
    #[test]
    fn one_d_interpolation_and_clamp() {
        let thresholds = [-1.0, 0.0, 1.0];
        let mut w = [0.0; 3];
        blend_weights_1d(&thresholds, 0.5, &mut w);
        approx(w[1], 0.5, 1e-6);
        approx(w[2], 0.5, 1e-6);
        assert_eq!(w[0], 0.0);
        assert_weight_contract(&w);

        blend_weights_1d(&thresholds, 10.0, &mut w);
        assert_eq!(w, [0.0, 0.0, 1.0]);
        blend_weights_1d(&thresholds, -10.0, &mut w);
        assert_eq!(w, [1.0, 0.0, 0.0]);
    }

    /// it should weight a single clip 1 regardless of input
    #[test]
    fn one_d_single_clip() {
        let mut w = [0.0; 1];
        blend_weights_1d(&[0.4], 123.0, &mut w);
        assert_eq!(w, [1.0]);
        blend_weights_1d(&[0.4], f32::NAN, &mut w);
        assert_eq!(w, [1.0]);
    }

    /// it should be a no-op for zero clips
    #[test]
    fn zero_clips_no_op() {
        blend_weights_1d(&[], 1.0, &mut []);
        blend_weights_simple_directional(&[], [1.0, 0.0], &mut []);
        blend_weights_inverse_distance(&[], [1.0, 0.0], &mut []);
    }

    const CARDINAL: [[f32; 2]; 4] = [[1.0, 0.0], [0.0, 1.0], [-1.0, 0.0], [0.0, -1.0]];

    /// it should give full weight to the aligned cardinal clip
    #[test]
    fn directional_cardinal_axis() {
        let mut w = [0.0; 4];
        blend_weights_simple_directional(&CARDINAL, [1.0, 0.0], &mut w);
        approx(w[0], 1.0, 0.01);
        approx(w[1], 0.0, 0.01);
        approx(w[2], 0.0, 0.01);
        approx(w[3], 0.0, 0.01);
        assert_weight_contract(&w);
    }

    /// it should split a diagonal input between the two straddling clips only
    #[test]
    fn directional_diagonal_split() {
        let mut w = [0.0; 4];
        blend_weights_simple_directional(&CARDINAL, [1.0, 1.0], &mut w);
        approx(w[0], 0.5, 0.01);
        approx(w[1], 0.5, 0.01);
        assert_eq!(w[2], 0.0);
        assert_eq!(w[3], 0.0);
        assert_weight_contract(&w);
    }

    /// it should hand weight to the idle clip as the input magnitude shrinks
    #[test]
    fn directional_idle_handoff() {
        let positions = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [-1.0, 0.0], [0.0, -1.0]];
        let mut w = [0.0; 5];

        blend_weights_simple_directional(&positions, [0.0, 0.0], &mut w);
        assert_eq!(w[0], 1.0);

        blend_weights_simple_directional(&positions, [0.25, 0.0], &mut w);
        approx(w[0], 0.75, 0.01);
        approx(w[1], 0.25, 0.01);
        assert_weight_contract(&w);

        blend_weights_simple_directional(&positions, [1.0, 0.0], &mut w);
        approx(w[0], 0.0, 0.01);
        approx(w[1], 1.0, 0.01);
        assert_weight_contract(&w);
    }

    /// it should pick the nearest clip at the origin when no idle clip exists
    #[test]
    fn directional_origin_without_idle() {
        let positions = [[2.0, 0.0], [0.5, 0.5], [0.0, -3.0]];
        let mut w = [0.0; 3];
        blend_weights_simple_directional(&positions, [0.0, 0.0], &mut w);
        assert_eq!(w, [0.0, 1.0, 0.0]);
    }

    /// it should stay well-defined for colinear and duplicated-angle layouts
    #[test]
    fn directional_degenerate_layouts() {
        // All clips on the +x axis, input pointing the other way.
        let colinear = [[1.0, 0.0], [2.0, 0.0], [3.0, 0.0]];
        let mut w = [0.0; 3];
        blend_weights_simple_directional(&colinear, [-1.0, 0.0], &mut w);
        assert_weight_contract(&w);

        // Two clips at the same angle as the input: first index wins.
        let stacked = [[1.0, 0.0], [2.0, 0.0], [0.0, 1.0]];
        let mut w = [0.0; 3];
        blend_weights_simple_directional(&stacked, [1.5, 0.0], &mut w);
        assert_weight_contract(&w);
        assert!(w[0] > 0.0);
        assert_eq!(w[1], 0.0);
    }

    /// it should produce finite sum-1 weights for hostile numeric input
    #[test]
    fn directional_hostile_input() {
        let mut w = [0.0; 4];
        blend_weights_simple_directional(&CARDINAL, [f32::NAN, f32::INFINITY], &mut w);
        assert_weight_contract(&w);
        blend_weights_simple_directional(&CARDINAL, [1e30, 1e30], &mut w);
        assert_weight_contract(&w);
    }

    /// it should weight four symmetric clips equally at the centroid
    #[test]
    fn idw_centroid_equal_weights() {
        let mut w = [0.0; 4];
        blend_weights_inverse_distance(&CARDINAL, [0.0, 0.0], &mut w);
        for x in w {
            approx(x, 0.25, 1e-6);
        }
    }

    /// it should collapse onto an exactly-hit clip position
    #[test]
    fn idw_exact_hit() {
        let mut w = [0.0; 4];
        blend_weights_inverse_distance(&CARDINAL, [0.0, 1.0], &mut w);
        assert_eq!(w, [0.0, 1.0, 0.0, 0.0]);
    }

    /// it should give every clip some weight away from clip positions
    #[test]
    fn idw_all_contribute() {
        let mut w = [0.0; 4];
        blend_weights_inverse_distance(&CARDINAL, [0.3, 0.2], &mut w);
        assert!(w.iter().all(|x| *x > 0.0));
        assert_weight_contract(&w);
    }

    /// it should stay normalized for enormous inputs
    #[test]
    fn idw_huge_input() {
        let mut w = [0.0; 4];
        blend_weights_inverse_distance(&CARDINAL, [1e30, -1e30], &mut w);
        assert_weight_contract(&w);
    }
}
