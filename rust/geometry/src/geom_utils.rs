// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wire repair and sampling utilities
//!
//! Curve conversion produces edge runs with small gaps, duplicate
//! vertices, and occasional reversed pieces. The helpers here stitch
//! those runs into connected wires and discretize them for display.
//! Gap checks compare squared distances against the configured
//! tolerance.

use ifc_brep_core::EntityId;

use crate::brep::{Edge, Shape, Wire};
use crate::diagnostics::ReporterHandle;
use crate::settings::{GeometrySettings, EPSILON};
use crate::{Matrix4, Point2, Point3};

/// Squared-distance threshold for dropping repeated sample points
pub const DUPLICATE_TOLERANCE: f64 = 1e-5;

const COMPONENT: &str = "wire repair";

/// Tolerant point equality, squared distance against `tolerance`
#[inline]
pub fn points_equal(a: &Point3<f64>, b: &Point3<f64>, tolerance: f64) -> bool {
    (a - b).norm_squared() <= tolerance
}

/// True when `matrix` deviates from identity by less than `epsilon`
/// in every component
pub fn is_identity(matrix: &Matrix4<f64>, epsilon: f64) -> bool {
    let identity = Matrix4::<f64>::identity();
    matrix
        .iter()
        .zip(identity.iter())
        .all(|(a, b)| (a - b).abs() < epsilon)
}

/// Build a wire of straight edges from a point run.
///
/// Zero-length edges between tolerantly equal neighbors are skipped.
/// With `close` set, a closing edge back to the first point is added
/// unless the run already ends there.
pub fn build_wire_from_points(points: &[Point3<f64>], close: bool) -> Wire {
    let mut wire = Wire::new();
    if points.len() < 2 {
        return wire;
    }

    for pair in points.windows(2) {
        if points_equal(&pair[0], &pair[1], EPSILON) {
            continue;
        }
        wire.push(Edge::line(pair[0], pair[1]));
    }

    if close {
        if let (Some(end), first) = (wire.end(), points[0]) {
            if !points_equal(&end, &first, EPSILON) {
                wire.push(Edge::line(end, first));
            }
        }
    }

    wire
}

/// Append `source` onto `target`, fixing the joint.
///
/// The repair pass tries the four endpoint pairings (append, append
/// reversed, prepend, prepend reversed) and snaps the joint when the
/// matched endpoints are within tolerance. If no pairing matches, a
/// connecting edge is synthesized from the target's end to the source's
/// start and the gap is reported.
pub fn append_and_fix(
    target: &mut Wire,
    source: Wire,
    settings: &GeometrySettings,
    reporter: &ReporterHandle,
    entity: Option<EntityId>,
) {
    if source.is_empty() {
        return;
    }
    if target.is_empty() {
        *target = source;
        return;
    }

    let tolerance = settings.wire_join_tolerance;
    // These unwraps cannot fail, both wires are non-empty here
    let target_start = target.start().unwrap_or_else(Point3::origin);
    let target_end = target.end().unwrap_or_else(Point3::origin);
    let source_start = source.start().unwrap_or_else(Point3::origin);
    let source_end = source.end().unwrap_or_else(Point3::origin);

    if points_equal(&target_end, &source_start, tolerance) {
        extend_snapped(target, source);
    } else if points_equal(&target_end, &source_end, tolerance) {
        extend_snapped(target, source.reversed());
    } else if points_equal(&target_start, &source_end, tolerance) {
        let mut joined = source;
        extend_snapped(&mut joined, std::mem::take(target));
        *target = joined;
    } else if points_equal(&target_start, &source_start, tolerance) {
        let mut joined = source.reversed();
        extend_snapped(&mut joined, std::mem::take(target));
        *target = joined;
    } else {
        let gap = (source_start - target_end).norm();
        reporter.minor_warning(
            format!("Closed a gap of {:.6} with a connecting edge", gap),
            entity,
            COMPONENT,
        );
        target.push(Edge::line(target_end, source_start));
        target.edges.extend(source.edges);
    }
}

/// Append edges, snapping the joining vertex onto the target's end
fn extend_snapped(target: &mut Wire, source: Wire) {
    let joint = target.end();
    let mut edges = source.edges.into_iter();
    if let (Some(joint), Some(mut first)) = (joint, edges.next()) {
        first.start = joint;
        target.push(first);
    }
    target.edges.extend(edges);
}

/// Close a wire in place.
///
/// Every consecutive edge pair, including the wrap-around from last to
/// first, either gets its vertices merged (same position within
/// tolerance) or a synthesized closing edge (further apart). A wire
/// that still fails the closure test afterwards is reported.
pub fn close_wire(
    wire: &mut Wire,
    settings: &GeometrySettings,
    reporter: &ReporterHandle,
    entity: Option<EntityId>,
) {
    let tolerance = settings.wire_join_tolerance;
    if wire.edges.len() < 2 {
        if !wire.is_empty() && !wire.is_closed(tolerance) {
            reporter.minor_warning("Wire could not be closed", entity, COMPONENT);
        }
        return;
    }
    if wire.is_closed(tolerance) {
        // Still merge interior joints that only differ by rounding
        snap_interior_joints(wire, tolerance);
        return;
    }

    let count = wire.edges.len();
    let mut repaired: Vec<Edge> = Vec::with_capacity(count + 1);

    for i in 0..count {
        let current_end = wire.edges[i].end;
        let next_start = wire.edges[(i + 1) % count].start;
        repaired.push(wire.edges[i].clone());

        if !points_equal(&current_end, &next_start, tolerance) {
            repaired.push(Edge::line(current_end, next_start));
        }
    }

    wire.edges = repaired;
    snap_interior_joints(wire, tolerance);

    if !wire.is_closed(tolerance) {
        reporter.minor_warning("Wire remains open after repair", entity, COMPONENT);
    }
}

/// Merge consecutive vertices that sit on the same position
fn snap_interior_joints(wire: &mut Wire, tolerance: f64) {
    let count = wire.edges.len();
    if count < 2 {
        return;
    }
    for i in 0..count {
        let next = (i + 1) % count;
        let end = wire.edges[i].end;
        let start = wire.edges[next].start;
        if start != end && points_equal(&end, &start, tolerance) {
            wire.edges[next].start = end;
        }
    }
}

/// Discretize a wire into a point run, dropping repeated neighbors
pub fn sample_wire(wire: &Wire, settings: &GeometrySettings) -> Vec<Point3<f64>> {
    let mut points: Vec<Point3<f64>> = Vec::new();
    for edge in &wire.edges {
        for point in edge.sample(settings) {
            if let Some(last) = points.last() {
                if points_equal(last, &point, DUPLICATE_TOLERANCE) {
                    continue;
                }
            }
            points.push(point);
        }
    }
    points
}

/// Discretize a wire into line-segment pairs for display.
///
/// Every interior sample appears twice (end of one segment, start of
/// the next) so the output can be drawn directly as discrete segments.
/// An odd leftover point is padded by duplication.
pub fn sample_wire_pairs(wire: &Wire, settings: &GeometrySettings) -> Vec<Point3<f64>> {
    let mut pairs: Vec<Point3<f64>> = Vec::new();
    for edge in &wire.edges {
        let samples = edge.sample(settings);
        for window in samples.windows(2) {
            pairs.push(window[0]);
            pairs.push(window[1]);
        }
    }
    if pairs.len() % 2 == 1 {
        if let Some(last) = pairs.last().copied() {
            pairs.push(last);
        }
    }
    pairs
}

/// Closest point to `point` on the infinite line through `origin`
/// along `direction`
pub fn closest_point_on_line(
    point: &Point3<f64>,
    origin: &Point3<f64>,
    direction: &crate::Vector3<f64>,
) -> Point3<f64> {
    let denominator = direction.norm_squared();
    if denominator <= f64::MIN_POSITIVE {
        return *origin;
    }
    let t = (point - origin).dot(direction) / denominator;
    origin + direction * t
}

/// Intersect two 2D lines given as origin plus direction.
///
/// Returns `None` for near-parallel lines.
pub fn intersect_lines_2d(
    origin1: &Point2<f64>,
    direction1: &crate::Vector2<f64>,
    origin2: &Point2<f64>,
    direction2: &crate::Vector2<f64>,
) -> Option<Point2<f64>> {
    let determinant = direction1.x * direction2.y - direction1.y * direction2.x;
    if determinant.abs() < 1e-12 {
        return None;
    }
    let delta = origin2 - origin1;
    let t = (delta.x * direction2.y - delta.y * direction2.x) / determinant;
    Some(origin1 + direction1 * t)
}

/// Transform a shape, short-circuiting identity matrices.
///
/// Rigid and uniformly scaled matrices keep analytic edges intact;
/// general matrices go through the discretizing path.
pub fn apply_transform(
    shape: &mut Shape,
    matrix: &Matrix4<f64>,
    non_uniform: bool,
    settings: &GeometrySettings,
) {
    if is_identity(matrix, settings.epsilon) {
        return;
    }
    if non_uniform {
        shape.transform_general(matrix, settings);
    } else {
        shape.transform(matrix);
    }
}
