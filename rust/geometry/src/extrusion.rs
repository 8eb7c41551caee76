// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Swept solid generation
//!
//! Builds closed boundary representations by moving a 2D profile through
//! space: linear extrusion, revolution about an axis, and transport along
//! a polyline directrix with mitered joints. Cross sections keep their
//! vertex count from station to station, so side walls are simple quads.
//! Every constructor hands its face set to [`solid_from_faces`], which
//! flips the whole set when the signed volume comes out negative, the
//! returned solid always points outward.

use std::f64::consts::TAU;

use nalgebra::{Matrix4, Point2, Point3, Rotation3, Unit, Vector3};

use crate::brep::{BrepFace, Edge, Shell, Solid, Wire};
use crate::error::{Error, Result};
use crate::geom_utils::{points_equal, DUPLICATE_TOLERANCE};
use crate::profile::{create_circle, Profile2D};
use crate::settings::{GeometrySettings, EPSILON};

/// Extrude a profile along an arbitrary vector.
///
/// The profile lies in the xy plane; the vector does not have to be
/// perpendicular to it, a tilted vector produces a sheared prism.
pub fn extrude_profile(
    profile: &Profile2D,
    vector: Vector3<f64>,
    settings: &GeometrySettings,
) -> Result<Solid> {
    if profile.outer.len() < 3 {
        return Err(Error::KernelError(
            "extrusion profile has no outline".to_string(),
        ));
    }
    if vector.norm_squared() <= EPSILON * EPSILON {
        return Err(Error::KernelError(
            "extrusion vector is degenerate".to_string(),
        ));
    }

    let rings = profile_rings(profile);
    let mut faces = Vec::with_capacity(rings.iter().map(Vec::len).sum::<usize>() + 2);
    for ring in &rings {
        let upper: Vec<Point3<f64>> = ring.iter().map(|p| *p + vector).collect();
        loft_walls(ring, &upper, &mut faces);
    }

    if let Some(cap) = ring_face(rings[0].clone(), rings[1..].to_vec()) {
        let mut bottom = cap.clone();
        bottom.reverse();
        faces.push(bottom);

        let mut top = cap;
        top.transform(&Matrix4::new_translation(&vector));
        faces.push(top);
    }

    Ok(solid_from_faces(faces, settings))
}

/// Revolve a profile about an axis lying in the profile plane.
///
/// The angle is clamped to a full turn; a full turn closes the ring of
/// wall quads onto itself and needs no end caps.
pub fn revolve_profile(
    profile: &Profile2D,
    axis_origin: Point3<f64>,
    axis_direction: Vector3<f64>,
    angle: f64,
    settings: &GeometrySettings,
) -> Result<Solid> {
    if profile.outer.len() < 3 {
        return Err(Error::KernelError(
            "revolution profile has no outline".to_string(),
        ));
    }
    let Some(axis) = axis_direction.try_normalize(EPSILON) else {
        return Err(Error::KernelError(
            "revolution axis is degenerate".to_string(),
        ));
    };
    if angle.abs() <= EPSILON {
        return Err(Error::KernelError("revolution angle is zero".to_string()));
    }
    let angle = angle.clamp(-TAU, TAU);
    let full_turn = TAU - angle.abs() < 1.0e-9;

    let segments = settings.arc_segments(angle);
    let base_rings = profile_rings(profile);

    let to_axis = Matrix4::new_translation(&(-axis_origin.coords));
    let from_axis = Matrix4::new_translation(&axis_origin.coords);
    let station_matrix = |i: usize| -> Matrix4<f64> {
        let theta = angle * i as f64 / segments as f64;
        let rotation = Rotation3::from_axis_angle(&Unit::new_unchecked(axis), theta);
        from_axis * rotation.to_homogeneous() * to_axis
    };

    let station_count = if full_turn { segments } else { segments + 1 };
    let mut stations: Vec<Vec<Vec<Point3<f64>>>> = Vec::with_capacity(station_count);
    for i in 0..station_count {
        let matrix = station_matrix(i);
        stations.push(
            base_rings
                .iter()
                .map(|ring| ring.iter().map(|p| matrix.transform_point(p)).collect())
                .collect(),
        );
    }

    let mut faces = Vec::new();
    for i in 0..segments {
        let next = if full_turn { (i + 1) % segments } else { i + 1 };
        for (lower, upper) in stations[i].iter().zip(stations[next].iter()) {
            loft_walls(lower, upper, &mut faces);
        }
    }

    if !full_turn {
        if let Some(cap) = ring_face(base_rings[0].clone(), base_rings[1..].to_vec()) {
            let mut start = cap.clone();
            start.reverse();
            faces.push(start);

            let mut end = cap;
            end.transform(&station_matrix(segments));
            faces.push(end);
        }
    }

    Ok(solid_from_faces(faces, settings))
}

/// Sweep a profile along a polyline path.
///
/// The profile plane is set perpendicular to the first segment; at each
/// interior point the cross section is projected onto the bisecting
/// plane of the adjoining segments, which miters the joint.
pub fn sweep_profile(
    profile: &Profile2D,
    path: &[Point3<f64>],
    settings: &GeometrySettings,
) -> Result<Solid> {
    if profile.outer.len() < 3 {
        return Err(Error::KernelError(
            "sweep profile has no outline".to_string(),
        ));
    }
    let path = dedup_path(path);
    if path.len() < 2 {
        return Err(Error::KernelError(
            "sweep path needs at least two distinct points".to_string(),
        ));
    }

    let base_rings = profile_rings(profile);
    let stations = transport_rings(&base_rings, &path);

    let mut faces = Vec::new();
    for i in 0..stations.len() - 1 {
        for (lower, upper) in stations[i].iter().zip(stations[i + 1].iter()) {
            loft_walls(lower, upper, &mut faces);
        }
    }

    let first = &stations[0];
    if let Some(mut cap) = ring_face(first[0].clone(), first[1..].to_vec()) {
        cap.reverse();
        faces.push(cap);
    }
    let last = &stations[stations.len() - 1];
    if let Some(cap) = ring_face(last[0].clone(), last[1..].to_vec()) {
        faces.push(cap);
    }

    Ok(solid_from_faces(faces, settings))
}

/// Sweep a circular cross section along a path, a pipe when an inner
/// radius is given. Small radii get a reduced segment count.
pub fn sweep_disk(
    path: &[Point3<f64>],
    radius: f64,
    inner_radius: Option<f64>,
    settings: &GeometrySettings,
) -> Result<Solid> {
    if radius <= EPSILON {
        return Err(Error::KernelError(
            "swept disk radius is degenerate".to_string(),
        ));
    }

    let mut segments = settings.circle_segments();
    if radius < 0.05 {
        segments = segments.min(8);
    } else if radius < 0.1 {
        segments = segments.min(12);
    }

    let inner = inner_radius.filter(|r| *r > EPSILON && *r < radius - EPSILON);
    let disk = create_circle(radius, inner, segments);
    sweep_profile(&disk, path, settings)
}

/// Assemble faces into a solid oriented outward.
///
/// The faces must already form a closed surface with a coherent winding;
/// when the enclosed signed volume is negative the whole set is flipped.
pub fn solid_from_faces(faces: Vec<BrepFace>, settings: &GeometrySettings) -> Solid {
    let mut solid = Solid::new(Shell::new(faces));
    if solid.volume(settings) < 0.0 {
        for face in solid.shell.faces.iter_mut() {
            face.reverse();
        }
    }
    solid
}

/// Wall faces between two cross-section rings of equal length.
///
/// A collapsed edge on either ring degrades the quad to a triangle, so
/// lofting toward an apex works without degenerate faces.
pub(crate) fn loft_walls(
    lower: &[Point3<f64>],
    upper: &[Point3<f64>],
    faces: &mut Vec<BrepFace>,
) {
    let count = lower.len().min(upper.len());
    for k in 0..count {
        let next = (k + 1) % count;
        let a = lower[k];
        let b = lower[next];
        let c = upper[next];
        let d = upper[k];

        let bottom_collapsed = points_equal(&a, &b, DUPLICATE_TOLERANCE);
        let top_collapsed = points_equal(&c, &d, DUPLICATE_TOLERANCE);
        if bottom_collapsed && top_collapsed {
            continue;
        }

        let wire = if top_collapsed {
            Wire::from_edges(vec![Edge::line(a, b), Edge::line(b, c), Edge::line(c, a)])
        } else if bottom_collapsed {
            Wire::from_edges(vec![Edge::line(a, c), Edge::line(c, d), Edge::line(d, a)])
        } else {
            Wire::from_edges(vec![
                Edge::line(a, b),
                Edge::line(b, c),
                Edge::line(c, d),
                Edge::line(d, a),
            ])
        };
        faces.push(BrepFace::new(wire));
    }
}

/// Planar face over a ring of points plus hole rings
pub(crate) fn ring_face(
    outer: Vec<Point3<f64>>,
    holes: Vec<Vec<Point3<f64>>>,
) -> Option<BrepFace> {
    let mut face = BrepFace::new(closed_ring_wire(outer)?);
    for hole in holes {
        if let Some(wire) = closed_ring_wire(hole) {
            face.add_hole(wire);
        }
    }
    Some(face)
}

fn closed_ring_wire(mut points: Vec<Point3<f64>>) -> Option<Wire> {
    if points.len() < 3 {
        return None;
    }
    let first = points[0];
    points.push(first);
    Edge::polyline(points).map(|edge| Wire::from_edges(vec![edge]))
}

/// Profile rings lifted into the xy plane, outer ring first
fn profile_rings(profile: &Profile2D) -> Vec<Vec<Point3<f64>>> {
    let mut rings = vec![ring_to_3d(&profile.outer)];
    for hole in &profile.holes {
        if hole.len() >= 3 {
            rings.push(ring_to_3d(hole));
        }
    }
    rings
}

fn ring_to_3d(ring: &[Point2<f64>]) -> Vec<Point3<f64>> {
    ring.iter().map(|p| Point3::new(p.x, p.y, 0.0)).collect()
}

fn dedup_path(path: &[Point3<f64>]) -> Vec<Point3<f64>> {
    let mut deduped: Vec<Point3<f64>> = Vec::with_capacity(path.len());
    for point in path {
        let keep = deduped
            .last()
            .map_or(true, |prev| !points_equal(prev, point, DUPLICATE_TOLERANCE));
        if keep {
            deduped.push(*point);
        }
    }
    deduped
}

/// Place the cross-section rings at every path point.
///
/// The first station sits in the plane perpendicular to the first
/// segment; each following station projects the previous ring along the
/// incoming segment onto the bisecting plane at the path point.
fn transport_rings(
    base_rings: &[Vec<Point3<f64>>],
    path: &[Point3<f64>],
) -> Vec<Vec<Vec<Point3<f64>>>> {
    let tangent = (path[1] - path[0]).normalize();
    let frame = sweep_frame(path[0], tangent);

    let mut current: Vec<Vec<Point3<f64>>> = base_rings
        .iter()
        .map(|ring| ring.iter().map(|p| frame.transform_point(p)).collect())
        .collect();

    let mut stations = Vec::with_capacity(path.len());
    stations.push(current.clone());

    for i in 1..path.len() {
        let delta = path[i] - path[i - 1];
        let incoming = delta.normalize();
        let outgoing = if i + 1 < path.len() {
            (path[i + 1] - path[i]).normalize()
        } else {
            incoming
        };
        let normal = (incoming + outgoing)
            .try_normalize(EPSILON)
            .unwrap_or(incoming);

        for ring in current.iter_mut() {
            for point in ring.iter_mut() {
                *point = project_to_plane(*point, incoming, path[i], normal)
                    .unwrap_or(*point + delta);
            }
        }
        stations.push(current.clone());
    }
    stations
}

/// Intersection of a ray with a plane, `None` when the ray runs parallel
fn project_to_plane(
    point: Point3<f64>,
    direction: Vector3<f64>,
    plane_point: Point3<f64>,
    plane_normal: Vector3<f64>,
) -> Option<Point3<f64>> {
    let denom = plane_normal.dot(&direction);
    if denom.abs() < 1.0e-12 {
        return None;
    }
    let t = plane_normal.dot(&(plane_point - point)) / denom;
    Some(point + direction * t)
}

/// Frame with z along the sweep tangent and a stable in-plane basis
fn sweep_frame(origin: Point3<f64>, tangent: Vector3<f64>) -> Matrix4<f64> {
    let mut x_axis = Vector3::z().cross(&tangent);
    if x_axis.norm_squared() < 1.0e-6 {
        x_axis = Vector3::y().cross(&tangent);
    }
    let x_axis = x_axis.normalize();
    let y_axis = tangent.cross(&x_axis);

    let mut frame = Matrix4::identity();
    frame.fixed_view_mut::<3, 1>(0, 0).copy_from(&x_axis);
    frame.fixed_view_mut::<3, 1>(0, 1).copy_from(&y_axis);
    frame.fixed_view_mut::<3, 1>(0, 2).copy_from(&tangent);
    frame.fixed_view_mut::<3, 1>(0, 3).copy_from(&origin.coords);
    frame
}
