// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Curve and loop to wire conversion
//!
//! Every curve kind resolves to a [`Wire`]; conic arcs stay analytic
//! edges until sampling. Converting is tolerant: degenerate input turns
//! into an empty wire plus a diagnostic, only structural faults (missing
//! or mistyped entities) propagate as errors.

use std::f64::consts::{PI, TAU};

use ifc_brep_core::{
    AngularUnit, Curve, EntityId, Model, TopologicalItem, TrimmingSelect, UnitContext,
    VertexGeometry,
};
use nalgebra::{Matrix4, Point2, Point3};

use crate::brep::{Edge, Wire};
use crate::diagnostics::ReporterHandle;
use crate::error::{Error, Result};
use crate::geom_utils::{
    append_and_fix, build_wire_from_points, close_wire, closest_point_on_line, points_equal,
    sample_wire,
};
use crate::placement::placement_matrix;
use crate::points::{resolve_point, resolve_point_list, resolve_vector};
use crate::settings::GeometrySettings;
use crate::spline::sample_bspline;

const COMPONENT: &str = "curve converter";

/// Squared distance within which a trim point counts as lying on a line
const LINE_TRIM_TOLERANCE: f64 = 0.0001;

/// Convert a curve entity into a wire
pub fn convert_curve(
    model: &Model,
    id: EntityId,
    settings: &GeometrySettings,
    reporter: &ReporterHandle,
) -> Result<Wire> {
    match model.curve(id)? {
        Curve::Polyline { points } => {
            let resolved = resolve_point_list(model, points, settings, false)?;
            if resolved.len() < 2 {
                reporter.info(
                    "polyline has fewer than 2 distinct points",
                    Some(id),
                    COMPONENT,
                );
                return Ok(Wire::new());
            }
            Ok(build_wire_from_points(&resolved, false))
        }

        Curve::CompositeCurve { segments, .. } => {
            let mut wire = Wire::new();
            for segment in segments {
                let mut seg_wire = convert_curve(model, segment.parent_curve, settings, reporter)?;
                if !segment.same_sense {
                    seg_wire.reverse();
                }
                if seg_wire.is_empty() {
                    continue;
                }
                append_and_fix(&mut wire, seg_wire, settings, reporter, Some(id));
            }
            Ok(wire)
        }

        Curve::TrimmedCurve {
            basis_curve,
            trim1,
            trim2,
            sense_agreement,
        } => convert_trimmed_curve(
            model,
            id,
            *basis_curve,
            trim1,
            trim2,
            *sense_agreement,
            settings,
            reporter,
        ),

        Curve::BSpline(spline) => {
            let control: Vec<Point3<f64>> = spline
                .control_points
                .iter()
                .map(|&pid| resolve_point(model, pid, settings))
                .collect::<Result<_>>()?;
            if control.len() < 2 {
                reporter.info(
                    "spline has fewer than 2 control points",
                    Some(id),
                    COMPONENT,
                );
                return Ok(Wire::new());
            }
            let samples = sample_bspline(
                &control,
                spline.degree,
                &spline.knots,
                &spline.weights,
                spline.closed,
            );
            Ok(build_wire_from_points(&samples, false))
        }

        Curve::Circle { position, radius } => {
            let radius = radius * model.units().length_factor;
            if radius <= 0.0 {
                reporter.info("circle has zero radius", Some(id), COMPONENT);
                return Ok(Wire::new());
            }
            let frame = placement_matrix(model, *position, settings)?;
            Ok(Wire::from_edges(vec![Edge::arc(frame, radius, 0.0, TAU)]))
        }

        Curve::Ellipse {
            position,
            semi_axis1,
            semi_axis2,
        } => {
            let a = semi_axis1 * model.units().length_factor;
            let b = semi_axis2 * model.units().length_factor;
            if a <= 0.0 || b <= 0.0 {
                reporter.info("ellipse has a degenerate semi axis", Some(id), COMPONENT);
                return Ok(Wire::new());
            }
            let frame = placement_matrix(model, *position, settings)?;
            Ok(Wire::from_edges(vec![Edge::elliptical_arc(
                frame, a, b, 0.0, TAU,
            )]))
        }

        Curve::Line { point, direction } => {
            let anchor = resolve_point(model, *point, settings)?;
            let vector = resolve_vector(model, *direction)?;
            if vector.norm_squared() < 1e-24 {
                reporter.info("line has a zero direction vector", Some(id), COMPONENT);
                return Ok(Wire::new());
            }
            Ok(Wire::from_edges(vec![Edge::line(anchor, anchor + vector)]))
        }

        Curve::OffsetCurve2D { .. } | Curve::OffsetCurve3D { .. } => {
            reporter.info("offset curves are not implemented", Some(id), COMPONENT);
            Ok(Wire::new())
        }

        Curve::PCurve { .. } => {
            reporter.info(
                "curves in surface parameter space are not implemented",
                Some(id),
                COMPONENT,
            );
            Ok(Wire::new())
        }
    }
}

/// Convert a curve and sample it into a planar contour, closing it first.
/// Profile boundary curves come through here.
pub fn curve_to_contour_2d(
    model: &Model,
    id: EntityId,
    settings: &GeometrySettings,
    reporter: &ReporterHandle,
) -> Result<Vec<Point2<f64>>> {
    let mut wire = convert_curve(model, id, settings, reporter)?;
    if wire.is_empty() {
        return Ok(Vec::new());
    }
    close_wire(&mut wire, settings, reporter, Some(id));

    let mut points = sample_wire(&wire, settings);
    // The closing sample repeats the first point, rings stay open
    if points.len() > 1 {
        let first = points[0];
        if let Some(last) = points.last() {
            if points_equal(&first, last, crate::geom_utils::DUPLICATE_TOLERANCE) {
                points.pop();
            }
        }
    }

    Ok(points.into_iter().map(|p| Point2::new(p.x, p.y)).collect())
}

/// Convert a topological loop into a wire. Poly loops close over their
/// point ring, edge loops chord their edges between vertex points.
pub fn convert_loop(
    model: &Model,
    id: EntityId,
    settings: &GeometrySettings,
    reporter: &ReporterHandle,
) -> Result<Wire> {
    match model.topology(id)? {
        TopologicalItem::PolyLoop { polygon } => {
            let points = resolve_point_list(model, polygon, settings, true)?;
            if points.len() < 3 {
                reporter.info(
                    "poly loop has fewer than 3 distinct points",
                    Some(id),
                    COMPONENT,
                );
                return Ok(Wire::new());
            }
            Ok(build_wire_from_points(&points, true))
        }

        TopologicalItem::EdgeLoop { edges } => {
            let mut wire = Wire::new();
            for &edge_id in edges {
                let seg = convert_topological_edge(model, edge_id, settings, reporter)?;
                if seg.is_empty() {
                    continue;
                }
                append_and_fix(&mut wire, seg, settings, reporter, Some(id));
            }
            close_wire(&mut wire, settings, reporter, Some(id));
            Ok(wire)
        }

        TopologicalItem::VertexLoop { .. } => {
            reporter.info("vertex loop carries no extent", Some(id), COMPONENT);
            Ok(Wire::new())
        }

        _ => Err(Error::UnhandledRepresentation { entity: id }),
    }
}

fn convert_topological_edge(
    model: &Model,
    id: EntityId,
    settings: &GeometrySettings,
    reporter: &ReporterHandle,
) -> Result<Wire> {
    match model.topology(id)? {
        TopologicalItem::OrientedEdge { edge, orientation } => {
            let mut wire = convert_topological_edge(model, *edge, settings, reporter)?;
            if !orientation {
                wire.reverse();
            }
            Ok(wire)
        }

        TopologicalItem::Edge {
            start, end, curve, ..
        } => {
            let a = vertex_point(model, *start, settings)?;
            let b = vertex_point(model, *end, settings)?;
            match (a, b) {
                (Some(a), Some(b)) => {
                    if curve.is_some() {
                        reporter.info(
                            "edge curve geometry approximated by its chord",
                            Some(id),
                            COMPONENT,
                        );
                    }
                    if points_equal(&a, &b, settings.epsilon) {
                        return Ok(Wire::new());
                    }
                    Ok(Wire::from_edges(vec![Edge::line(a, b)]))
                }
                _ => {
                    reporter.minor_warning(
                        "edge vertex without cartesian geometry",
                        Some(id),
                        COMPONENT,
                    );
                    Ok(Wire::new())
                }
            }
        }

        _ => Err(Error::UnhandledRepresentation { entity: id }),
    }
}

/// Wire from a bare edge, oriented edge or open path item.
pub(crate) fn convert_topological_path(
    model: &Model,
    id: EntityId,
    settings: &GeometrySettings,
    reporter: &ReporterHandle,
) -> Result<Wire> {
    match model.topology(id)? {
        TopologicalItem::Path { edges } => {
            let mut wire = Wire::new();
            for &edge_id in edges {
                let seg = convert_topological_edge(model, edge_id, settings, reporter)?;
                if seg.is_empty() {
                    continue;
                }
                append_and_fix(&mut wire, seg, settings, reporter, Some(id));
            }
            Ok(wire)
        }

        TopologicalItem::OrientedEdge { .. } | TopologicalItem::Edge { .. } => {
            convert_topological_edge(model, id, settings, reporter)
        }

        _ => Err(Error::UnhandledRepresentation { entity: id }),
    }
}

fn vertex_point(
    model: &Model,
    id: EntityId,
    settings: &GeometrySettings,
) -> Result<Option<Point3<f64>>> {
    match model.topology(id)? {
        TopologicalItem::Vertex(VertexGeometry::Point(pid)) => {
            Ok(Some(resolve_point(model, *pid, settings)?))
        }
        TopologicalItem::Vertex(_) => Ok(None),
        _ => Err(Error::data_integrity(id, "expected a vertex".to_string())),
    }
}

#[allow(clippy::too_many_arguments)]
fn convert_trimmed_curve(
    model: &Model,
    id: EntityId,
    basis_id: EntityId,
    trim1: &[TrimmingSelect],
    trim2: &[TrimmingSelect],
    sense_agreement: bool,
    settings: &GeometrySettings,
    reporter: &ReporterHandle,
) -> Result<Wire> {
    match model.curve(basis_id)? {
        Curve::Circle { position, radius } => {
            let radius = radius * model.units().length_factor;
            if radius <= 0.0 {
                reporter.info("trimmed circle has zero radius", Some(id), COMPONENT);
                return Ok(Wire::new());
            }
            let frame = placement_matrix(model, *position, settings)?;
            let into_local = local_frame(&frame);

            let t1 = circle_trim_angle(model, trim1, &into_local, settings)?.unwrap_or(0.0);
            let t2 = circle_trim_angle(model, trim2, &into_local, settings)?.unwrap_or(TAU);
            let span = arc_span(t1, t2, sense_agreement);
            if span.abs() < 1e-12 {
                reporter.info("trimmed circle spans zero angle", Some(id), COMPONENT);
                return Ok(Wire::new());
            }
            Ok(Wire::from_edges(vec![Edge::arc(frame, radius, t1, span)]))
        }

        Curve::Ellipse {
            position,
            semi_axis1,
            semi_axis2,
        } => {
            let a = semi_axis1 * model.units().length_factor;
            let b = semi_axis2 * model.units().length_factor;
            if a <= 0.0 || b <= 0.0 {
                reporter.info(
                    "trimmed ellipse has a degenerate semi axis",
                    Some(id),
                    COMPONENT,
                );
                return Ok(Wire::new());
            }
            let frame = placement_matrix(model, *position, settings)?;
            let into_local = local_frame(&frame);

            let t1 = ellipse_trim_angle(model, trim1, &into_local, a, b, settings)?.unwrap_or(0.0);
            let t2 = ellipse_trim_angle(model, trim2, &into_local, a, b, settings)?.unwrap_or(TAU);
            let span = arc_span(t1, t2, sense_agreement);
            if span.abs() < 1e-12 {
                reporter.info("trimmed ellipse spans zero angle", Some(id), COMPONENT);
                return Ok(Wire::new());
            }
            Ok(Wire::from_edges(vec![Edge::elliptical_arc(
                frame, a, b, t1, span,
            )]))
        }

        Curve::Line { point, direction } => {
            let anchor = resolve_point(model, *point, settings)?;
            let vector = resolve_vector(model, *direction)?;
            if vector.norm_squared() < 1e-24 {
                reporter.info(
                    "trimmed line has a zero direction vector",
                    Some(id),
                    COMPONENT,
                );
                return Ok(Wire::new());
            }

            let mut start = anchor;
            let mut end = anchor + vector;
            if let Some(p) =
                line_trim_position(model, trim1, &anchor, &vector, settings, reporter, id)?
            {
                start = p;
            }
            if let Some(p) =
                line_trim_position(model, trim2, &anchor, &vector, settings, reporter, id)?
            {
                end = p;
            }
            if !sense_agreement {
                std::mem::swap(&mut start, &mut end);
            }
            if points_equal(&start, &end, settings.epsilon) {
                reporter.info("trimmed line has zero length", Some(id), COMPONENT);
                return Ok(Wire::new());
            }
            Ok(Wire::from_edges(vec![Edge::line(start, end)]))
        }

        _ => {
            // Other basis curves are converted whole
            reporter.info(
                "trim bounds ignored for this basis curve kind",
                Some(id),
                COMPONENT,
            );
            convert_curve(model, basis_id, settings, reporter)
        }
    }
}

/// Matrix taking world coordinates into the conic's local frame
fn local_frame(frame: &Matrix4<f64>) -> Matrix4<f64> {
    frame.try_inverse().unwrap_or_else(Matrix4::identity)
}

/// Resolve one trim bound on a circle into an angle. Parameter bounds
/// are preferred over point bounds when a file supplies both.
fn circle_trim_angle(
    model: &Model,
    trims: &[TrimmingSelect],
    into_local: &Matrix4<f64>,
    settings: &GeometrySettings,
) -> Result<Option<f64>> {
    for trim in trims {
        if let TrimmingSelect::Parameter(value) = trim {
            return Ok(Some(plane_angle(*value, model.units())));
        }
    }
    for trim in trims {
        if let TrimmingSelect::Point(pid) = trim {
            let p = resolve_point(model, *pid, settings)?;
            let local = into_local.transform_point(&p);
            return Ok(Some(local.y.atan2(local.x)));
        }
    }
    Ok(None)
}

/// Same as [`circle_trim_angle`], but point bounds are normalized by the
/// semi axes so the angle matches the ellipse parameterization
fn ellipse_trim_angle(
    model: &Model,
    trims: &[TrimmingSelect],
    into_local: &Matrix4<f64>,
    semi_axis1: f64,
    semi_axis2: f64,
    settings: &GeometrySettings,
) -> Result<Option<f64>> {
    for trim in trims {
        if let TrimmingSelect::Parameter(value) = trim {
            return Ok(Some(plane_angle(*value, model.units())));
        }
    }
    for trim in trims {
        if let TrimmingSelect::Point(pid) = trim {
            let p = resolve_point(model, *pid, settings)?;
            let local = into_local.transform_point(&p);
            return Ok(Some((local.y / semi_axis2).atan2(local.x / semi_axis1)));
        }
    }
    Ok(None)
}

fn line_trim_position(
    model: &Model,
    trims: &[TrimmingSelect],
    anchor: &Point3<f64>,
    vector: &crate::Vector3<f64>,
    settings: &GeometrySettings,
    reporter: &ReporterHandle,
    entity: EntityId,
) -> Result<Option<Point3<f64>>> {
    for trim in trims {
        if let TrimmingSelect::Parameter(u) = trim {
            return Ok(Some(anchor + vector * *u));
        }
    }
    for trim in trims {
        if let TrimmingSelect::Point(pid) = trim {
            let p = resolve_point(model, *pid, settings)?;
            let candidate = closest_point_on_line(&p, anchor, vector);
            if (candidate - p).norm_squared() < LINE_TRIM_TOLERANCE {
                return Ok(Some(candidate));
            }
            reporter.minor_warning(
                "trim point lies off its line and is ignored",
                Some(entity),
                COMPONENT,
            );
        }
    }
    Ok(None)
}

/// Convert a raw plane angle to radians.
///
/// Files without a declared angular unit get a value-range heuristic:
/// magnitudes beyond pi are taken as degrees.
pub(crate) fn plane_angle(raw: f64, units: &UnitContext) -> f64 {
    match units.angular_unit {
        AngularUnit::Undefined => {
            if raw.abs() > PI {
                raw.to_radians()
            } else {
                raw
            }
        }
        _ => raw * units.plane_angle_factor,
    }
}

/// Signed arc span between two angles. With sense agreement the arc runs
/// counter-clockwise from `t1` to `t2`, otherwise clockwise.
fn arc_span(t1: f64, t2: f64, sense: bool) -> f64 {
    if sense {
        if t1 > t2 {
            t2 - t1 + TAU
        } else {
            t2 - t1
        }
    } else if t1 > t2 {
        t2 - t1
    } else {
        t2 - t1 - TAU
    }
}
