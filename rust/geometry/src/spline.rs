// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! B-spline curve sampling
//!
//! Splines are discretized with de Boor's algorithm, in homogeneous
//! coordinates so rational curves (conic arcs exported as NURBS) sample
//! exactly. Files with inconsistent knot data fall back to a clamped
//! uniform knot vector over the stored control points.

use nalgebra::{Point3, Vector4};

use crate::geom_utils::points_equal;

/// Samples generated per control point when discretizing
const SAMPLES_PER_CONTROL_POINT: usize = 8;

/// Discretize a B-spline curve into an ordered point run.
///
/// `knots` is the expanded knot vector. `weights` is either empty
/// (polynomial curve) or one weight per control point. A closed curve
/// gets its first control point appended so the run wraps around.
pub fn sample_bspline(
    control_points: &[Point3<f64>],
    degree: usize,
    knots: &[f64],
    weights: &[f64],
    closed: bool,
) -> Vec<Point3<f64>> {
    if control_points.len() < 2 {
        return control_points.to_vec();
    }

    let rational = weights.len() == control_points.len();

    // Closed curves wrap by repeating the first control point
    let wrap = closed
        && control_points
            .first()
            .zip(control_points.last())
            .is_some_and(|(first, last)| !points_equal(first, last, 1e-12));

    let mut homogeneous: Vec<Vector4<f64>> = control_points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let w = if rational { weights[i] } else { 1.0 };
            Vector4::new(p.x * w, p.y * w, p.z * w, w)
        })
        .collect();
    if wrap {
        homogeneous.push(homogeneous[0]);
    }

    let n_ctrl = homogeneous.len();
    let degree = degree.clamp(1, n_ctrl - 1);

    let owned_knots;
    let knots = if valid_knot_vector(knots, n_ctrl, degree) {
        knots
    } else {
        owned_knots = clamped_uniform_knots(n_ctrl, degree);
        &owned_knots
    };

    let t_start = knots[degree];
    let t_end = knots[n_ctrl];
    let samples = (n_ctrl * SAMPLES_PER_CONTROL_POINT).max(2);

    let mut points = Vec::with_capacity(samples);
    for i in 0..samples {
        let t = t_start + (t_end - t_start) * (i as f64) / ((samples - 1) as f64);
        let h = de_boor(knots, degree, &homogeneous, t);
        let w = if h.w.abs() < 1e-12 { 1.0 } else { h.w };
        points.push(Point3::new(h.x / w, h.y / w, h.z / w));
    }

    points
}

/// Knot vector must have one knot per control point plus degree plus one,
/// be non-decreasing, and span a non-empty parameter range
fn valid_knot_vector(knots: &[f64], n_ctrl: usize, degree: usize) -> bool {
    if knots.len() != n_ctrl + degree + 1 {
        return false;
    }
    if knots.windows(2).any(|w| w[1] < w[0]) {
        return false;
    }
    knots[n_ctrl] > knots[degree]
}

fn clamped_uniform_knots(n_ctrl: usize, degree: usize) -> Vec<f64> {
    let interior = n_ctrl - degree;
    let mut knots = Vec::with_capacity(n_ctrl + degree + 1);
    for _ in 0..=degree {
        knots.push(0.0);
    }
    for i in 1..interior {
        knots.push(i as f64 / interior as f64);
    }
    for _ in 0..=degree {
        knots.push(1.0);
    }
    knots
}

fn find_span(knots: &[f64], degree: usize, n_ctrl: usize, t: f64) -> usize {
    if t >= knots[n_ctrl] {
        return n_ctrl - 1;
    }
    if t <= knots[degree] {
        return degree;
    }

    let mut low = degree;
    let mut high = n_ctrl;
    let mut mid = (low + high) / 2;
    while t < knots[mid] || t >= knots[mid + 1] {
        if t < knots[mid] {
            high = mid;
        } else {
            low = mid;
        }
        mid = (low + high) / 2;
    }
    mid
}

fn de_boor(knots: &[f64], degree: usize, ctrl: &[Vector4<f64>], t: f64) -> Vector4<f64> {
    let n_ctrl = ctrl.len();
    let span = find_span(knots, degree, n_ctrl, t);

    let mut d: Vec<Vector4<f64>> = (0..=degree).map(|j| ctrl[j + span - degree]).collect();

    for r in 1..=degree {
        for j in (r..=degree).rev() {
            let i = j + span - degree;
            let denom = knots[i + degree - r + 1] - knots[i];
            let alpha = if denom.abs() < 1e-12 {
                0.0
            } else {
                (t - knots[i]) / denom
            };
            d[j] = d[j - 1] * (1.0 - alpha) + d[j] * alpha;
        }
    }

    d[degree]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_spline_interpolates_control_points() {
        let ctrl = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        ];
        let points = sample_bspline(&ctrl, 1, &[], &[], false);

        assert_eq!(points.first(), Some(&ctrl[0]));
        assert_eq!(points.last(), Some(&ctrl[2]));
        // Every sample lies on one of the two segments
        for p in &points {
            let on_first = (p.y.abs() < 1e-9) && (0.0..=1.0).contains(&p.x);
            let on_second = ((p.x - 1.0).abs() < 1e-9) && (0.0..=1.0).contains(&p.y);
            assert!(on_first || on_second, "sample off the control polygon: {p}");
        }
    }

    #[test]
    fn test_quadratic_bezier_midpoint() {
        let ctrl = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 2.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        let knots = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let points = sample_bspline(&ctrl, 2, &knots, &[], false);

        // Bezier at t = 0.5 is (p0 + 2 p1 + p2) / 4
        let mid = points
            .iter()
            .min_by(|a, b| {
                let da = (a.x - 1.0).abs();
                let db = (b.x - 1.0).abs();
                da.partial_cmp(&db).unwrap()
            })
            .copied()
            .unwrap();
        assert!((mid.y - 1.0).abs() < 0.05);
    }

    #[test]
    fn test_rational_quarter_circle() {
        let w = std::f64::consts::FRAC_1_SQRT_2;
        let ctrl = vec![
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let knots = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let weights = [1.0, w, 1.0];
        let points = sample_bspline(&ctrl, 2, &knots, &weights, false);

        for p in &points {
            let r = (p.x * p.x + p.y * p.y).sqrt();
            assert!((r - 1.0).abs() < 1e-9, "sample off the unit circle: {p}");
        }
    }

    #[test]
    fn test_bad_knot_vector_falls_back_to_clamped() {
        let ctrl = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(3.0, 1.0, 0.0),
        ];
        // Wrong length and decreasing
        let knots = [1.0, 0.0];
        let points = sample_bspline(&ctrl, 2, &knots, &[], false);

        assert_eq!(points.first(), Some(&ctrl[0]));
        assert_eq!(points.last(), Some(&ctrl[3]));
    }

    #[test]
    fn test_closed_spline_wraps_to_start() {
        let ctrl = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 2.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        ];
        let points = sample_bspline(&ctrl, 2, &[], &[], true);

        let first = points.first().copied().unwrap();
        let last = points.last().copied().unwrap();
        assert!((first - last).norm() < 1e-9);
    }

    #[test]
    fn test_degenerate_input_passthrough() {
        let single = vec![Point3::new(1.0, 2.0, 3.0)];
        assert_eq!(sample_bspline(&single, 3, &[], &[], false), single);
        assert!(sample_bspline(&[], 3, &[], &[], false).is_empty());
    }
}
