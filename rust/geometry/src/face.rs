// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Surface and face-set conversion
//!
//! Dispatches surface entities into bounded faces, builds faces from
//! boundary curve sets, and assembles topological face lists into shells
//! or sewn solids. Unbounded elementary surfaces become finite proxy
//! faces so downstream boolean operations have something to clip against.

use ifc_brep_core::{EntityId, Model, Surface, TopologicalItem};

use crate::brep::{sew_faces, BrepFace, Edge, Shape, Shell, Wire};
use crate::curve::{convert_curve, convert_loop};
use crate::diagnostics::ReporterHandle;
use crate::error::{Error, Result};
use crate::placement::placement_matrix;
use crate::settings::{GeometrySettings, HALF_SPACE_BOX_SIZE};
use crate::{Matrix4, Point3, Vector3};

const COMPONENT: &str = "face converter";

/// Smallest parameter span a rectangular trim may cut out of a surface
const TRIM_FACE_TOLERANCE: f64 = 0.001;

/// Elementary carrier behind a bounded surface
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceBasis {
    /// Plane placement, xy axes spanning the surface
    Plane(Matrix4<f64>),
    /// Cylinder axis placement plus radius
    Cylinder(Matrix4<f64>, f64),
}

/// Resolve the elementary carrier of a surface, looking through bounded
/// and trimmed layers down to the underlying plane or cylinder.
pub fn resolve_surface_basis(
    model: &Model,
    id: EntityId,
    settings: &GeometrySettings,
) -> Result<SurfaceBasis> {
    match model.surface(id)? {
        Surface::Plane { position } => Ok(SurfaceBasis::Plane(placement_matrix(
            model, *position, settings,
        )?)),
        Surface::CylindricalSurface { position, radius } => {
            let matrix = placement_matrix(model, *position, settings)?;
            Ok(SurfaceBasis::Cylinder(
                matrix,
                radius * model.units().length_factor,
            ))
        }
        Surface::CurveBoundedPlane { basis_surface, .. }
        | Surface::CurveBoundedSurface { basis_surface, .. }
        | Surface::RectangularTrimmedSurface { basis_surface, .. } => {
            resolve_surface_basis(model, *basis_surface, settings)
        }
        _ => Err(Error::UnhandledRepresentation { entity: id }),
    }
}

/// Convert a surface entity into a face-backed shape
pub fn convert_surface(
    model: &Model,
    id: EntityId,
    settings: &GeometrySettings,
    reporter: &ReporterHandle,
) -> Result<Shape> {
    match model.surface(id)? {
        Surface::Plane { position } => {
            let matrix = placement_matrix(model, *position, settings)?;
            Ok(Shape::Face(plane_proxy_face(&matrix)))
        }

        Surface::CylindricalSurface { position, radius } => {
            let matrix = placement_matrix(model, *position, settings)?;
            let radius = radius * model.units().length_factor;
            let wire = Wire::from_edges(vec![Edge::arc(
                matrix,
                radius,
                0.0,
                std::f64::consts::TAU,
            )]);
            Ok(Shape::Face(BrepFace::new(wire)))
        }

        Surface::CurveBoundedPlane {
            basis_surface,
            outer_boundary,
            inner_boundaries,
        } => {
            // Boundary curves live in the plane's local coordinates,
            // the basis placement is applied to the finished face
            let mut face = build_face_from_boundary_curves(
                model,
                *outer_boundary,
                inner_boundaries,
                settings,
                reporter,
            )?;
            let basis = resolve_surface_basis(model, *basis_surface, settings)?;
            let SurfaceBasis::Plane(matrix) = basis else {
                return Err(Error::data_integrity(
                    id,
                    "curve bounded plane with a non-planar basis",
                ));
            };
            face.transform(&matrix);
            Ok(Shape::Face(face))
        }

        Surface::CurveBoundedSurface { basis_surface, .. } => {
            reporter.info(
                "Boundary curves on a curve bounded surface are not applied",
                Some(id),
                COMPONENT,
            );
            convert_surface(model, *basis_surface, settings, reporter)
        }

        Surface::RectangularTrimmedSurface {
            basis_surface,
            u1,
            v1,
            u2,
            v2,
            ..
        } => trimmed_surface_face(
            model,
            id,
            *basis_surface,
            (*u1, *v1, *u2, *v2),
            settings,
            reporter,
        ),

        Surface::SurfaceOfLinearExtrusion { .. } => {
            reporter.minor_warning(
                "Surface of linear extrusion is not implemented",
                Some(id),
                COMPONENT,
            );
            Ok(Shape::Shell(Shell::default()))
        }

        Surface::SurfaceOfRevolution { .. } => {
            reporter.minor_warning(
                "Surface of revolution is not implemented",
                Some(id),
                COMPONENT,
            );
            Ok(Shape::Shell(Shell::default()))
        }

        Surface::BSplineSurface { .. } => {
            reporter.minor_warning("B-spline surfaces are not implemented", Some(id), COMPONENT);
            Ok(Shape::Shell(Shell::default()))
        }
    }
}

/// Build a face from an outer boundary curve plus hole curves.
///
/// Hole wires are added reversed so they wind opposite to the outer
/// boundary. Inner boundaries that fail to convert are skipped.
pub fn build_face_from_boundary_curves(
    model: &Model,
    outer: EntityId,
    inners: &[EntityId],
    settings: &GeometrySettings,
    reporter: &ReporterHandle,
) -> Result<BrepFace> {
    let outer_wire = convert_curve(model, outer, settings, reporter)?;
    let mut face = BrepFace::new(outer_wire);

    for &inner in inners {
        match convert_curve(model, inner, settings, reporter) {
            Ok(wire) if !wire.is_empty() => face.add_hole(wire.reversed()),
            Ok(_) => {}
            Err(error) => {
                if error.is_fatal() {
                    return Err(error);
                }
                reporter.minor_warning(
                    format!("Skipping inner boundary that failed to convert: {error}"),
                    Some(inner),
                    COMPONENT,
                );
            }
        }
    }

    Ok(face)
}

/// Sew a face list into closed solids.
///
/// A face set that does not close stays an open shell with a warning.
/// Multiple closed components are kept together in a compound, which also
/// earns a warning because the caller expected one volume.
pub fn build_solid_from_faces(
    faces: Vec<BrepFace>,
    entity: Option<EntityId>,
    settings: &GeometrySettings,
    reporter: &ReporterHandle,
) -> Shape {
    if faces.is_empty() {
        return Shape::Shell(Shell::default());
    }

    let outcome = sew_faces(faces.clone(), settings);
    if !outcome.is_closed {
        reporter.minor_warning("Failed to connect faces", entity, COMPONENT);
        return Shape::Shell(Shell::new(faces));
    }
    if !outcome.is_consistent {
        reporter.minor_warning(
            "Face orientations disagree across shared edges",
            entity,
            COMPONENT,
        );
    }

    let mut solids = outcome.solids;
    if solids.len() == 1 {
        Shape::Solid(solids.remove(0))
    } else {
        reporter.minor_warning("Failed to connect faces", entity, COMPONENT);
        Shape::Compound(solids.into_iter().map(Shape::Solid).collect())
    }
}

/// How a face list should be assembled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellClosure {
    /// Sew into a solid, warn when the result does not close
    Closed,
    /// Keep as an open shell
    Open,
    /// Closure not stated by the source entity, treated as open
    Unknown,
}

/// Convert a list of topological faces into a shell or solid.
///
/// The first bound of each face is authoritative: when it fails to
/// resolve the whole face is abandoned, later bounds only add holes.
pub fn convert_face_list(
    model: &Model,
    face_ids: &[EntityId],
    closure: ShellClosure,
    entity: EntityId,
    settings: &GeometrySettings,
    reporter: &ReporterHandle,
) -> Result<Shape> {
    let mut faces = Vec::with_capacity(face_ids.len());
    for &face_id in face_ids {
        match convert_topological_face(model, face_id, settings, reporter) {
            Ok(Some(face)) => faces.push(face),
            Ok(None) => {}
            Err(error) => {
                if error.is_fatal() {
                    return Err(error);
                }
                reporter.minor_warning(
                    format!("Skipping face that failed to convert: {error}"),
                    Some(face_id),
                    COMPONENT,
                );
            }
        }
    }

    match closure {
        ShellClosure::Closed => Ok(build_solid_from_faces(
            faces,
            Some(entity),
            settings,
            reporter,
        )),
        ShellClosure::Open | ShellClosure::Unknown => Ok(Shape::Shell(Shell::new(faces))),
    }
}

fn convert_topological_face(
    model: &Model,
    id: EntityId,
    settings: &GeometrySettings,
    reporter: &ReporterHandle,
) -> Result<Option<BrepFace>> {
    let TopologicalItem::Face { bounds } = model.topology(id)? else {
        return Err(Error::UnhandledRepresentation { entity: id });
    };

    let mut face: Option<BrepFace> = None;
    for (index, &bound_id) in bounds.iter().enumerate() {
        let wire = match face_bound_wire(model, bound_id, settings, reporter) {
            Ok(wire) => wire,
            Err(error) => {
                if error.is_fatal() {
                    return Err(error);
                }
                if index == 0 {
                    reporter.minor_warning(
                        format!("Face has no usable outer bound: {error}"),
                        Some(id),
                        COMPONENT,
                    );
                    return Ok(None);
                }
                reporter.minor_warning(
                    format!("Skipping face bound that failed to convert: {error}"),
                    Some(bound_id),
                    COMPONENT,
                );
                continue;
            }
        };
        if wire.is_empty() {
            if index == 0 {
                return Ok(None);
            }
            continue;
        }
        match face.as_mut() {
            None => face = Some(BrepFace::new(wire)),
            Some(face) => face.add_hole(wire),
        }
    }

    Ok(face)
}

fn face_bound_wire(
    model: &Model,
    id: EntityId,
    settings: &GeometrySettings,
    reporter: &ReporterHandle,
) -> Result<Wire> {
    match model.topology(id)? {
        TopologicalItem::FaceBound {
            bound, orientation, ..
        } => {
            let mut wire = convert_loop(model, *bound, settings, reporter)?;
            if !*orientation {
                wire.reverse();
            }
            Ok(wire)
        }
        // Tolerate a loop listed directly among the bounds
        _ => convert_loop(model, id, settings, reporter),
    }
}

/// Finite stand-in face for an unbounded plane
fn plane_proxy_face(matrix: &Matrix4<f64>) -> BrepFace {
    let span = HALF_SPACE_BOX_SIZE;
    let corners = [
        Point3::new(span, span, 0.0),
        Point3::new(-span, span, 0.0),
        Point3::new(-span, -span, 0.0),
        Point3::new(span, -span, 0.0),
    ];
    let mut face = BrepFace::new(rectangle_wire(corners));
    face.transform(matrix);
    face
}

fn trimmed_surface_face(
    model: &Model,
    id: EntityId,
    basis: EntityId,
    (u1, v1, u2, v2): (f64, f64, f64, f64),
    settings: &GeometrySettings,
    reporter: &ReporterHandle,
) -> Result<Shape> {
    let lf = model.units().length_factor;
    match resolve_surface_basis(model, basis, settings)? {
        SurfaceBasis::Plane(matrix) => {
            let (u1, u2) = (u1 * lf, u2 * lf);
            let (v1, v2) = (v1 * lf, v2 * lf);
            if (u2 - u1).abs() < TRIM_FACE_TOLERANCE || (v2 - v1).abs() < TRIM_FACE_TOLERANCE {
                reporter.minor_warning(
                    "Trim bounds collapse the surface patch",
                    Some(id),
                    COMPONENT,
                );
                return convert_surface(model, basis, settings, reporter);
            }
            let corners = [
                Point3::new(u1, v1, 0.0),
                Point3::new(u2, v1, 0.0),
                Point3::new(u2, v2, 0.0),
                Point3::new(u1, v2, 0.0),
            ];
            let mut face = BrepFace::new(rectangle_wire(corners));
            face.transform(&matrix);
            Ok(Shape::Face(face))
        }

        SurfaceBasis::Cylinder(matrix, radius) => {
            // The u parameter is the angle around the axis, v runs along it
            let (v1, v2) = (v1 * lf, v2 * lf);
            if (u2 - u1).abs() < TRIM_FACE_TOLERANCE || (v2 - v1).abs() < TRIM_FACE_TOLERANCE {
                reporter.minor_warning(
                    "Trim bounds collapse the surface patch",
                    Some(id),
                    COMPONENT,
                );
                return convert_surface(model, basis, settings, reporter);
            }
            let bottom_frame = matrix * Matrix4::new_translation(&Vector3::new(0.0, 0.0, v1));
            let top_frame = matrix * Matrix4::new_translation(&Vector3::new(0.0, 0.0, v2));
            let span = u2 - u1;
            let bottom = Edge::arc(bottom_frame, radius, u1, span);
            let top = Edge::arc(top_frame, radius, u1, span).reversed();
            let rise = Edge::line(bottom.end, top.start);
            let fall = Edge::line(top.end, bottom.start);
            let wire = Wire::from_edges(vec![bottom, rise, top, fall]);
            Ok(Shape::Face(BrepFace::new(wire)))
        }
    }
}

fn rectangle_wire(corners: [Point3<f64>; 4]) -> Wire {
    Wire::from_edges(vec![
        Edge::line(corners[0], corners[1]),
        Edge::line(corners[1], corners[2]),
        Edge::line(corners[2], corners[3]),
        Edge::line(corners[3], corners[0]),
    ])
}
