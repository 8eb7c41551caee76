// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 2D contour booleans and winding utilities
//!
//! Composite profiles are merged with the i_overlay crate so that touching
//! or overlapping members become one contour set before extrusion. The
//! winding helpers are shared with the profile converters, which normalize
//! arbitrary boundary curves to counter-clockwise outers and clockwise holes.

use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;
use nalgebra::Point2;

use crate::error::{Error, Result};
use crate::profile::Profile2D;

/// Minimum area threshold, contours smaller than this are considered degenerate
const MIN_AREA_THRESHOLD: f64 = 1e-10;

/// Cross-product threshold below which a vertex counts as collinear
const COLLINEAR_THRESHOLD: f64 = 1e-9;

/// Union a list of profiles into as few disjoint profiles as possible.
///
/// Touching and overlapping members merge into a single outer boundary;
/// member holes survive where the union leaves them uncovered. The result
/// is sorted by outer area, largest first.
pub fn merge_profiles(parts: &[Profile2D]) -> Result<Vec<Profile2D>> {
    match parts {
        [] => Ok(Vec::new()),
        [single] => Ok(vec![single.clone()]),
        [first, rest @ ..] => {
            let subject = profile_to_paths(first);
            let clip: Vec<Vec<[f64; 2]>> =
                rest.iter().flat_map(profile_to_paths).collect();

            // Result is Vec<Vec<Vec<[f64; 2]>>>: shapes, contours per shape
            // (first is outer, rest are holes), points per contour.
            let shapes = subject.overlay(&clip, OverlayRule::Union, FillRule::EvenOdd);

            let mut merged: Vec<Profile2D> =
                shapes.iter().filter_map(|s| shape_to_profile(s)).collect();
            if merged.is_empty() {
                return Err(Error::KernelError(
                    "profile union produced no output".to_string(),
                ));
            }

            merged.sort_by(|a, b| {
                let area_a = compute_signed_area(&a.outer).abs();
                let area_b = compute_signed_area(&b.outer).abs();
                area_b
                    .partial_cmp(&area_a)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            Ok(merged)
        }
    }
}

/// Check if a contour is valid (has area, not degenerate)
pub fn is_valid_contour(contour: &[Point2<f64>]) -> bool {
    if contour.len() < 3 {
        return false;
    }

    compute_signed_area(contour).abs() > MIN_AREA_THRESHOLD
}

/// Compute the signed area of a 2D contour
/// Positive = counter-clockwise, Negative = clockwise
pub fn compute_signed_area(contour: &[Point2<f64>]) -> f64 {
    if contour.len() < 3 {
        return 0.0;
    }

    let mut area = 0.0;
    let n = contour.len();

    for i in 0..n {
        let j = (i + 1) % n;
        area += contour[i].x * contour[j].y;
        area -= contour[j].x * contour[i].y;
    }

    area * 0.5
}

/// Ensure contour has counter-clockwise winding (positive area)
pub fn ensure_ccw(contour: &[Point2<f64>]) -> Vec<Point2<f64>> {
    if compute_signed_area(contour) < 0.0 {
        contour.iter().rev().cloned().collect()
    } else {
        contour.to_vec()
    }
}

/// Ensure contour has clockwise winding (for holes)
pub fn ensure_cw(contour: &[Point2<f64>]) -> Vec<Point2<f64>> {
    if compute_signed_area(contour) > 0.0 {
        contour.iter().rev().cloned().collect()
    } else {
        contour.to_vec()
    }
}

/// Simplify a contour by removing collinear points
pub fn simplify_contour(contour: &[Point2<f64>], epsilon: f64) -> Vec<Point2<f64>> {
    if contour.len() <= 3 {
        return contour.to_vec();
    }

    let mut result = Vec::with_capacity(contour.len());
    let n = contour.len();

    for i in 0..n {
        let prev = &contour[(i + n - 1) % n];
        let curr = &contour[i];
        let next = &contour[(i + 1) % n];

        let cross = (curr.x - prev.x) * (next.y - prev.y) - (curr.y - prev.y) * (next.x - prev.x);

        if cross.abs() > epsilon {
            result.push(*curr);
        }
    }

    if result.len() < 3 {
        return contour.to_vec();
    }

    result
}

/// Check if a point is inside a contour using ray casting
pub fn point_in_contour(point: &Point2<f64>, contour: &[Point2<f64>]) -> bool {
    if contour.len() < 3 {
        return false;
    }

    let mut inside = false;
    let n = contour.len();

    let mut j = n - 1;
    for i in 0..n {
        let pi = &contour[i];
        let pj = &contour[j];

        if ((pi.y > point.y) != (pj.y > point.y))
            && (point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x)
        {
            inside = !inside;
        }
        j = i;
    }

    inside
}

/// Check if contour A is completely inside contour B
pub fn contour_inside_contour(inner: &[Point2<f64>], outer: &[Point2<f64>]) -> bool {
    inner.iter().all(|p| point_in_contour(p, outer))
}

/// Convert a profile to i_overlay path format, outer counter-clockwise
/// and holes clockwise for the even-odd fill rule
fn profile_to_paths(profile: &Profile2D) -> Vec<Vec<[f64; 2]>> {
    let mut paths = Vec::with_capacity(1 + profile.holes.len());

    paths.push(contour_to_path(&ensure_ccw(&profile.outer)));
    for hole in &profile.holes {
        paths.push(contour_to_path(&ensure_cw(hole)));
    }

    paths
}

fn contour_to_path(contour: &[Point2<f64>]) -> Vec<[f64; 2]> {
    contour.iter().map(|p| [p.x, p.y]).collect()
}

/// Convert one i_overlay result shape back to a profile. Unioning touching
/// members leaves collinear seam vertices behind, so contours are simplified
/// on the way out. Returns None for shapes with no usable outer boundary.
fn shape_to_profile(shape: &[Vec<[f64; 2]>]) -> Option<Profile2D> {
    let mut contours = shape.iter().map(|contour| {
        let points: Vec<Point2<f64>> = contour
            .iter()
            .map(|p| Point2::new(p[0], p[1]))
            .collect();
        simplify_contour(&points, COLLINEAR_THRESHOLD)
    });

    let outer = contours.next()?;
    if !is_valid_contour(&outer) {
        return None;
    }

    let mut profile = Profile2D::new(ensure_ccw(&outer));
    for hole in contours {
        if is_valid_contour(&hole) {
            profile.add_hole(ensure_cw(&hole));
        }
    }

    Some(profile)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON_2D: f64 = 1e-9;

    fn square(origin: Point2<f64>, size: f64) -> Vec<Point2<f64>> {
        vec![
            Point2::new(origin.x, origin.y),
            Point2::new(origin.x + size, origin.y),
            Point2::new(origin.x + size, origin.y + size),
            Point2::new(origin.x, origin.y + size),
        ]
    }

    #[test]
    fn test_compute_signed_area_ccw() {
        let contour = square(Point2::new(0.0, 0.0), 1.0);
        let area = compute_signed_area(&contour);
        assert!((area - 1.0).abs() < EPSILON_2D);
    }

    #[test]
    fn test_compute_signed_area_cw() {
        let mut contour = square(Point2::new(0.0, 0.0), 1.0);
        contour.reverse();
        let area = compute_signed_area(&contour);
        assert!((area + 1.0).abs() < EPSILON_2D);
    }

    #[test]
    fn test_ensure_ccw() {
        let mut cw = square(Point2::new(0.0, 0.0), 1.0);
        cw.reverse();
        let ccw = ensure_ccw(&cw);
        assert!(compute_signed_area(&ccw) > 0.0);
    }

    #[test]
    fn test_merge_overlapping_squares() {
        let parts = vec![
            Profile2D::new(square(Point2::new(0.0, 0.0), 2.0)),
            Profile2D::new(square(Point2::new(1.0, 1.0), 2.0)),
        ];

        let merged = merge_profiles(&parts).unwrap();
        assert_eq!(merged.len(), 1);

        // Two 2x2 squares overlapping in a 1x1 corner union to area 7
        let area = compute_signed_area(&merged[0].outer);
        assert!((area - 7.0).abs() < 1e-6);
        assert!(merged[0].holes.is_empty());
    }

    #[test]
    fn test_merge_touching_squares_simplifies_seam() {
        let parts = vec![
            Profile2D::new(square(Point2::new(0.0, 0.0), 1.0)),
            Profile2D::new(square(Point2::new(1.0, 0.0), 1.0)),
        ];

        let merged = merge_profiles(&parts).unwrap();
        assert_eq!(merged.len(), 1);

        let area = compute_signed_area(&merged[0].outer);
        assert!((area - 2.0).abs() < 1e-6);
        assert_eq!(merged[0].outer.len(), 4);
    }

    #[test]
    fn test_merge_disjoint_squares_sorted_by_area() {
        let parts = vec![
            Profile2D::new(square(Point2::new(10.0, 10.0), 1.0)),
            Profile2D::new(square(Point2::new(0.0, 0.0), 2.0)),
        ];

        let merged = merge_profiles(&parts).unwrap();
        assert_eq!(merged.len(), 2);

        let first = compute_signed_area(&merged[0].outer);
        let second = compute_signed_area(&merged[1].outer);
        assert!((first - 4.0).abs() < 1e-6);
        assert!((second - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_merge_single_profile_is_passthrough() {
        let mut profile = Profile2D::new(square(Point2::new(0.0, 0.0), 4.0));
        profile.add_hole(ensure_cw(&square(Point2::new(1.0, 1.0), 1.0)));

        let merged = merge_profiles(&[profile.clone()]).unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0], profile);
    }

    #[test]
    fn test_merge_preserves_uncovered_hole() {
        let mut left = Profile2D::new(square(Point2::new(0.0, 0.0), 4.0));
        left.add_hole(ensure_cw(&square(Point2::new(1.0, 1.0), 1.0)));
        let right = Profile2D::new(square(Point2::new(4.0, 0.0), 4.0));

        let merged = merge_profiles(&[left, right]).unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].holes.len(), 1);

        let area = compute_signed_area(&merged[0].outer);
        assert!((area - 32.0).abs() < 1e-6);
    }

    #[test]
    fn test_point_in_contour() {
        let contour = square(Point2::new(0.0, 0.0), 10.0);

        assert!(point_in_contour(&Point2::new(5.0, 5.0), &contour));
        assert!(!point_in_contour(&Point2::new(15.0, 5.0), &contour));
        assert!(!point_in_contour(&Point2::new(-1.0, 5.0), &contour));
    }

    #[test]
    fn test_contour_inside_contour() {
        let outer = square(Point2::new(0.0, 0.0), 10.0);
        let inner = square(Point2::new(2.0, 2.0), 2.0);
        let crossing = square(Point2::new(8.0, 8.0), 4.0);

        assert!(contour_inside_contour(&inner, &outer));
        assert!(!contour_inside_contour(&crossing, &outer));
    }

    #[test]
    fn test_simplify_contour() {
        let contour = vec![
            Point2::new(0.0, 0.0),
            Point2::new(5.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(0.0, 10.0),
        ];

        let simplified = simplify_contour(&contour, 1e-6);
        assert_eq!(simplified.len(), 4);
    }

    #[test]
    fn test_is_valid_contour() {
        let valid = square(Point2::new(0.0, 0.0), 1.0);
        assert!(is_valid_contour(&valid));

        let degenerate = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
        ];
        assert!(!is_valid_contour(&degenerate));

        let too_few = vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)];
        assert!(!is_valid_contour(&too_few));
    }
}
