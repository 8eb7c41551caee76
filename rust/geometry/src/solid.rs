// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Solid model conversion
//!
//! Swept area solids, breps, CSG primitives, boolean results and half
//! spaces all enter through [`convert_solid_model`] or
//! [`convert_boolean_result`]. Sweeps and primitives are assembled in the
//! b-rep kernel; boolean combinations are evaluated on triangle meshes
//! and stay meshes.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use ifc_brep_core::{
    BooleanOperator, CsgPrimitive3D, Entity, EntityId, HalfSpaceVariant, Model, SolidModel,
};

use crate::brep::{Shape, Shell, Solid};
use crate::csg::{box_mesh, mesh_difference, mesh_intersection, mesh_union};
use crate::curve::{convert_curve, plane_angle};
use crate::diagnostics::ReporterHandle;
use crate::error::{Error, Result};
use crate::extrusion::{
    extrude_profile, loft_walls, revolve_profile, ring_face, solid_from_faces, sweep_disk,
    sweep_profile,
};
use crate::face::{convert_face_list, resolve_surface_basis, ShellClosure, SurfaceBasis};
use crate::geom_utils::{points_equal, sample_wire, DUPLICATE_TOLERANCE};
use crate::mesh::Mesh;
use crate::placement::{placement_axis, placement_matrix};
use crate::points::{resolve_direction, resolve_point};
use crate::profile::Profile2D;
use crate::profiles::ProfileCache;
use crate::settings::{GeometrySettings, HALF_SPACE_BOX_SIZE};
use crate::{Matrix4, Point2, Point3, Vector3};

const COMPONENT: &str = "solid converter";

/// Disk radius below which a swept disk degrades to its directrix curve
const MIN_SWEPT_DISK_RADIUS: f64 = 0.001;

/// Convert a solid model entity into a shape.
///
/// Swept solids keep their optional position placement: the profile is
/// swept in local coordinates and the placement is applied to the result.
pub fn convert_solid_model(
    model: &Model,
    id: EntityId,
    profiles: &ProfileCache,
    settings: &GeometrySettings,
    reporter: &ReporterHandle,
) -> Result<Shape> {
    match model.solid(id)? {
        SolidModel::ExtrudedAreaSolid {
            swept_area,
            position,
            extruded_direction,
            depth,
        } => {
            let profile = profiles.get(model, *swept_area, settings, reporter)?;
            if profile.is_empty() {
                reporter.minor_warning("Extruded profile has no outline", Some(id), COMPONENT);
                return Ok(Shape::Shell(Shell::default()));
            }
            let direction = resolve_direction(model, *extruded_direction)?;
            let vector = direction * (depth * model.units().length_factor);
            let solid = extrude_profile(&profile, vector, settings)?;
            position_shape(model, Shape::Solid(solid), *position, settings)
        }

        SolidModel::RevolvedAreaSolid {
            swept_area,
            position,
            axis,
            angle,
        } => {
            let profile = profiles.get(model, *swept_area, settings, reporter)?;
            if profile.is_empty() {
                reporter.minor_warning("Revolved profile has no outline", Some(id), COMPONENT);
                return Ok(Shape::Shell(Shell::default()));
            }
            let (axis_origin, axis_direction) = placement_axis(model, *axis, settings)?;
            let swept_angle = plane_angle(*angle, model.units());
            let solid = revolve_profile(&profile, axis_origin, axis_direction, swept_angle, settings)?;
            position_shape(model, Shape::Solid(solid), *position, settings)
        }

        SolidModel::FixedReferenceSweptAreaSolid {
            swept_area,
            position,
            directrix,
            ..
        } => {
            reporter.minor_warning(
                "Fixed reference of a swept solid is not applied",
                Some(id),
                COMPONENT,
            );
            sweep_profile_along(
                model, id, *swept_area, *directrix, *position, profiles, settings, reporter,
            )
        }

        SolidModel::SurfaceCurveSweptAreaSolid {
            swept_area,
            position,
            directrix,
            ..
        } => {
            reporter.minor_warning(
                "Reference surface of a swept solid is not applied",
                Some(id),
                COMPONENT,
            );
            sweep_profile_along(
                model, id, *swept_area, *directrix, *position, profiles, settings, reporter,
            )
        }

        SolidModel::SweptDiskSolid {
            directrix,
            radius,
            inner_radius,
        } => {
            let wire = convert_curve(model, *directrix, settings, reporter)?;
            let path = sample_wire(&wire, settings);
            if path.len() < 2 {
                reporter.minor_warning(
                    "Swept disk directrix has fewer than two points",
                    Some(id),
                    COMPONENT,
                );
                return Ok(Shape::Shell(Shell::default()));
            }

            let lf = model.units().length_factor;
            let disk_radius = radius * lf;
            if disk_radius < MIN_SWEPT_DISK_RADIUS {
                reporter.minor_warning(
                    "Swept disk radius is too small to solidify, keeping the directrix curve",
                    Some(id),
                    COMPONENT,
                );
                return Ok(Shape::Wire(wire));
            }

            let hole_radius = match inner_radius {
                Some(inner) => {
                    let inner = inner * lf;
                    if inner >= disk_radius {
                        reporter.minor_warning(
                            "Swept disk inner radius exceeds the outer radius and is ignored",
                            Some(id),
                            COMPONENT,
                        );
                        None
                    } else {
                        Some(inner)
                    }
                }
                None => None,
            };
            let solid = sweep_disk(&path, disk_radius, hole_radius, settings)?;
            Ok(Shape::Solid(solid))
        }

        SolidModel::FacetedBrep { outer, voids } | SolidModel::AdvancedBrep { outer, voids } => {
            if !voids.is_empty() {
                reporter.minor_warning(
                    "Interior voids of a brep are not subtracted",
                    Some(id),
                    COMPONENT,
                );
            }
            let item = model.topology(*outer)?;
            let Some(faces) = item.faces() else {
                return Err(Error::data_integrity(
                    *outer,
                    "brep outer boundary is not a shell",
                ));
            };
            convert_face_list(model, faces, ShellClosure::Closed, *outer, settings, reporter)
        }

        SolidModel::CsgSolid { tree_root } => {
            convert_csg_tree(model, *tree_root, profiles, settings, reporter)
        }
    }
}

/// Evaluate a boolean result.
///
/// Operands convert recursively; a half-space operand is sized against
/// the first operand's bounds. A second operand that fails to convert or
/// carries no volume is skipped and the first operand passes through.
pub fn convert_boolean_result(
    model: &Model,
    id: EntityId,
    profiles: &ProfileCache,
    settings: &GeometrySettings,
    reporter: &ReporterHandle,
) -> Result<Shape> {
    let result = *model.boolean_result(id)?;

    let first = convert_boolean_operand(
        model,
        result.first_operand,
        profiles,
        None,
        settings,
        reporter,
    )?;
    if matches!(first, Shape::Wire(_)) {
        reporter.minor_warning(
            "Boolean operand is a curve and cannot be combined",
            Some(result.first_operand),
            COMPONENT,
        );
        return Ok(first);
    }
    let first_mesh = first.to_mesh(settings);
    let extent = first_mesh.bounds();

    let second = match convert_boolean_operand(
        model,
        result.second_operand,
        profiles,
        extent,
        settings,
        reporter,
    ) {
        Ok(shape) => shape,
        Err(error) => {
            if error.is_fatal() {
                return Err(error);
            }
            reporter.minor_warning(
                format!("Skipping boolean operand that failed to convert: {error}"),
                Some(result.second_operand),
                COMPONENT,
            );
            return Ok(first);
        }
    };
    if matches!(second, Shape::Wire(_)) {
        reporter.minor_warning(
            "Boolean operand is a curve and is skipped",
            Some(result.second_operand),
            COMPONENT,
        );
        return Ok(first);
    }
    let second_mesh = second.to_mesh(settings);

    let mesh = match result.operator {
        BooleanOperator::Union => mesh_union(&first_mesh, &second_mesh, settings)?,
        BooleanOperator::Intersection => mesh_intersection(&first_mesh, &second_mesh, settings)?,
        BooleanOperator::Difference => mesh_difference(&first_mesh, &second_mesh, settings)?,
    };
    Ok(Shape::Mesh(mesh))
}

/// Convert an analytic CSG primitive, placed by its axis placement.
/// Non-positive dimensions are malformed input.
pub fn convert_csg_primitive(
    model: &Model,
    id: EntityId,
    settings: &GeometrySettings,
) -> Result<Shape> {
    let lf = model.units().length_factor;

    let (position, solid) = match *model.csg_primitive(id)? {
        CsgPrimitive3D::Block {
            position,
            x_length,
            y_length,
            z_length,
        } => {
            let (x, y, z) = (x_length * lf, y_length * lf, z_length * lf);
            require_positive_dimensions(id, &[x, y, z])?;
            (position, block_solid(x, y, z, settings))
        }
        CsgPrimitive3D::RectangularPyramid {
            position,
            x_length,
            y_length,
            height,
        } => {
            let (x, y, h) = (x_length * lf, y_length * lf, height * lf);
            require_positive_dimensions(id, &[x, y, h])?;
            (position, pyramid_solid(x, y, h, settings))
        }
        CsgPrimitive3D::RightCircularCone {
            position,
            height,
            bottom_radius,
        } => {
            let (r, h) = (bottom_radius * lf, height * lf);
            require_positive_dimensions(id, &[r, h])?;
            (position, cone_solid(r, h, settings))
        }
        CsgPrimitive3D::RightCircularCylinder {
            position,
            height,
            radius,
        } => {
            let (r, h) = (radius * lf, height * lf);
            require_positive_dimensions(id, &[r, h])?;
            (position, cylinder_solid(r, h, settings))
        }
        CsgPrimitive3D::Sphere { position, radius } => {
            let r = radius * lf;
            require_positive_dimensions(id, &[r])?;
            (position, sphere_solid(r, settings))
        }
    };

    let matrix = placement_matrix(model, position, settings)?;
    let mut shape = Shape::Solid(solid);
    shape.transform(&matrix);
    Ok(shape)
}

/// Realize a half space as a bounded mesh.
///
/// The base surface must be planar. The kept side is boxed out to cover
/// `clipping_extent` (the other boolean operand's bounds) with margin;
/// without an extent the box falls back to a fixed reach. Boxed and
/// polygonal variants intersect that box with their enclosure.
pub fn convert_half_space_solid(
    model: &Model,
    id: EntityId,
    clipping_extent: Option<(Point3<f64>, Point3<f64>)>,
    settings: &GeometrySettings,
    reporter: &ReporterHandle,
) -> Result<Shape> {
    let half_space = *model.half_space(id)?;

    let SurfaceBasis::Plane(plane) =
        resolve_surface_basis(model, half_space.base_surface, settings)?
    else {
        return Err(Error::data_integrity(
            id,
            "half space base surface is not planar",
        ));
    };
    let Some(plane_inverse) = plane.try_inverse() else {
        return Err(Error::data_integrity(
            id,
            "half space plane placement is singular",
        ));
    };

    let (anchor, reach) = clipping_reach(&plane_inverse, clipping_extent);
    let side_box = side_box_mesh(&plane, anchor, reach, half_space.agreement_flag);

    match half_space.variant {
        HalfSpaceVariant::Plain => Ok(Shape::Mesh(side_box)),

        HalfSpaceVariant::Boxed { enclosure } => {
            let Entity::BoundingBox(extent) = model.entity(enclosure)? else {
                return Err(Error::data_integrity(
                    enclosure,
                    "expected a bounding box enclosure",
                ));
            };
            let corner = resolve_point(model, extent.corner, settings)?;
            let lf = model.units().length_factor;
            let far = Point3::new(
                corner.x + extent.x_dim * lf,
                corner.y + extent.y_dim * lf,
                corner.z + extent.z_dim * lf,
            );
            let mesh = mesh_intersection(&side_box, &box_mesh(corner, far), settings)?;
            Ok(Shape::Mesh(mesh))
        }

        HalfSpaceVariant::Polygonal { position, boundary } => {
            let matrix = placement_matrix(model, position, settings)?;
            let wire = convert_curve(model, boundary, settings, reporter)?;
            let mut points = sample_wire(&wire, settings);
            if points.len() > 1
                && points_equal(&points[0], &points[points.len() - 1], DUPLICATE_TOLERANCE)
            {
                points.pop();
            }
            if points.len() < 3 {
                return Err(Error::data_integrity(
                    id,
                    "polygonal half space boundary has fewer than three points",
                ));
            }

            let profile =
                Profile2D::new(points.iter().map(|p| Point2::new(p.x, p.y)).collect());
            let mut prism =
                extrude_profile(&profile, Vector3::new(0.0, 0.0, 2.0 * reach), settings)?;
            prism.transform(&(matrix * Matrix4::new_translation(&Vector3::new(0.0, 0.0, -reach))));

            let mesh = mesh_intersection(&prism.to_mesh(settings), &side_box, settings)?;
            Ok(Shape::Mesh(mesh))
        }
    }
}

/// Convert a sectioned spine by sweeping its first cross section along
/// the spine curve. Section-to-section interpolation is not applied.
pub fn convert_sectioned_spine(
    model: &Model,
    id: EntityId,
    profiles: &ProfileCache,
    settings: &GeometrySettings,
    reporter: &ReporterHandle,
) -> Result<Shape> {
    let Entity::SectionedSpine(spine) = model.entity(id)? else {
        return Err(Error::UnhandledRepresentation { entity: id });
    };
    let Some(&first_section) = spine.cross_sections.first() else {
        return Err(Error::data_integrity(
            id,
            "sectioned spine without cross sections",
        ));
    };
    if spine.cross_sections.len() > 1 {
        reporter.minor_warning(
            "Cross section variation along a sectioned spine is not applied",
            Some(id),
            COMPONENT,
        );
    }
    sweep_profile_along(
        model,
        id,
        first_section,
        spine.spine_curve,
        None,
        profiles,
        settings,
        reporter,
    )
}

/// Resolve a CSG tree root node
fn convert_csg_tree(
    model: &Model,
    id: EntityId,
    profiles: &ProfileCache,
    settings: &GeometrySettings,
    reporter: &ReporterHandle,
) -> Result<Shape> {
    match model.entity(id)? {
        Entity::BooleanResult(_) => convert_boolean_result(model, id, profiles, settings, reporter),
        Entity::CsgPrimitive(_) => convert_csg_primitive(model, id, settings),
        _ => Err(Error::UnhandledRepresentation { entity: id }),
    }
}

fn convert_boolean_operand(
    model: &Model,
    id: EntityId,
    profiles: &ProfileCache,
    clipping_extent: Option<(Point3<f64>, Point3<f64>)>,
    settings: &GeometrySettings,
    reporter: &ReporterHandle,
) -> Result<Shape> {
    match model.entity(id)? {
        Entity::Solid(_) => convert_solid_model(model, id, profiles, settings, reporter),
        Entity::BooleanResult(_) => convert_boolean_result(model, id, profiles, settings, reporter),
        Entity::CsgPrimitive(_) => convert_csg_primitive(model, id, settings),
        Entity::HalfSpace(_) => {
            convert_half_space_solid(model, id, clipping_extent, settings, reporter)
        }
        _ => Err(Error::UnhandledRepresentation { entity: id }),
    }
}

fn sweep_profile_along(
    model: &Model,
    entity: EntityId,
    swept_area: EntityId,
    directrix: EntityId,
    position: Option<EntityId>,
    profiles: &ProfileCache,
    settings: &GeometrySettings,
    reporter: &ReporterHandle,
) -> Result<Shape> {
    let profile = profiles.get(model, swept_area, settings, reporter)?;
    if profile.is_empty() {
        reporter.minor_warning("Swept profile has no outline", Some(entity), COMPONENT);
        return Ok(Shape::Shell(Shell::default()));
    }
    let wire = convert_curve(model, directrix, settings, reporter)?;
    let path = sample_wire(&wire, settings);
    if path.len() < 2 {
        reporter.minor_warning(
            "Sweep directrix has fewer than two points",
            Some(entity),
            COMPONENT,
        );
        return Ok(Shape::Shell(Shell::default()));
    }
    let solid = sweep_profile(&profile, &path, settings)?;
    position_shape(model, Shape::Solid(solid), position, settings)
}

fn position_shape(
    model: &Model,
    mut shape: Shape,
    position: Option<EntityId>,
    settings: &GeometrySettings,
) -> Result<Shape> {
    if let Some(placement) = position {
        let matrix = placement_matrix(model, placement, settings)?;
        shape.transform(&matrix);
    }
    Ok(shape)
}

fn require_positive_dimensions(id: EntityId, values: &[f64]) -> Result<()> {
    for value in values {
        if *value <= 0.0 {
            return Err(Error::data_integrity(
                id,
                "csg primitive with a non-positive dimension",
            ));
        }
    }
    Ok(())
}

/// Anchor (in plane-local coordinates) and half-size for the boxes that
/// realize a half space. The reach covers the other operand with margin.
fn clipping_reach(
    plane_inverse: &Matrix4<f64>,
    extent: Option<(Point3<f64>, Point3<f64>)>,
) -> (Point3<f64>, f64) {
    match extent {
        Some((min, max)) => {
            let center = Point3::from((min.coords + max.coords) * 0.5);
            let local = plane_inverse.transform_point(&center);
            let reach = ((max - min).norm() * 2.0).max(1.0) + local.coords.norm();
            (local, reach)
        }
        None => (Point3::origin(), HALF_SPACE_BOX_SIZE),
    }
}

/// Box over one side of the plane z = 0, then moved into world space
fn side_box_mesh(
    plane: &Matrix4<f64>,
    anchor: Point3<f64>,
    reach: f64,
    agreement: bool,
) -> Mesh {
    // Agreement keeps the material on the side the normal points away from
    let (z_min, z_max) = if agreement { (-reach, 0.0) } else { (0.0, reach) };
    let min = Point3::new(anchor.x - reach, anchor.y - reach, z_min);
    let max = Point3::new(anchor.x + reach, anchor.y + reach, z_max);
    let mut mesh = box_mesh(min, max);
    mesh.transform(plane);
    mesh
}

fn block_solid(x: f64, y: f64, z: f64, settings: &GeometrySettings) -> Solid {
    let bottom = rectangle_ring(x, y, -0.5 * z);
    let top = rectangle_ring(x, y, 0.5 * z);
    prism_solid(bottom, top, settings)
}

fn pyramid_solid(x: f64, y: f64, height: f64, settings: &GeometrySettings) -> Solid {
    let base = rectangle_ring(x, y, 0.0);
    let apex = vec![Point3::new(0.0, 0.0, height); base.len()];
    let mut faces = Vec::new();
    loft_walls(&base, &apex, &mut faces);
    if let Some(mut cap) = ring_face(base, Vec::new()) {
        cap.reverse();
        faces.push(cap);
    }
    solid_from_faces(faces, settings)
}

fn cone_solid(radius: f64, height: f64, settings: &GeometrySettings) -> Solid {
    let base = circle_ring(radius, 0.0, settings.circle_segments());
    let apex = vec![Point3::new(0.0, 0.0, height); base.len()];
    let mut faces = Vec::new();
    loft_walls(&base, &apex, &mut faces);
    if let Some(mut cap) = ring_face(base, Vec::new()) {
        cap.reverse();
        faces.push(cap);
    }
    solid_from_faces(faces, settings)
}

fn cylinder_solid(radius: f64, height: f64, settings: &GeometrySettings) -> Solid {
    let segments = settings.circle_segments();
    let bottom = circle_ring(radius, 0.0, segments);
    let top = circle_ring(radius, height, segments);
    prism_solid(bottom, top, settings)
}

/// Sphere centered on the placement origin, built from latitude rings
fn sphere_solid(radius: f64, settings: &GeometrySettings) -> Solid {
    let segments = settings.circle_segments();
    let stacks = (segments / 2).max(2);

    let mut rings: Vec<Vec<Point3<f64>>> = Vec::with_capacity(stacks + 1);
    rings.push(vec![Point3::new(0.0, 0.0, -radius); segments]);
    for stack in 1..stacks {
        let latitude = -FRAC_PI_2 + PI * stack as f64 / stacks as f64;
        rings.push(circle_ring(radius * latitude.cos(), radius * latitude.sin(), segments));
    }
    rings.push(vec![Point3::new(0.0, 0.0, radius); segments]);

    let mut faces = Vec::new();
    for pair in rings.windows(2) {
        loft_walls(&pair[0], &pair[1], &mut faces);
    }
    solid_from_faces(faces, settings)
}

fn prism_solid(
    bottom: Vec<Point3<f64>>,
    top: Vec<Point3<f64>>,
    settings: &GeometrySettings,
) -> Solid {
    let mut faces = Vec::new();
    loft_walls(&bottom, &top, &mut faces);
    if let Some(cap) = ring_face(top, Vec::new()) {
        faces.push(cap);
    }
    if let Some(mut cap) = ring_face(bottom, Vec::new()) {
        cap.reverse();
        faces.push(cap);
    }
    solid_from_faces(faces, settings)
}

fn rectangle_ring(x: f64, y: f64, z: f64) -> Vec<Point3<f64>> {
    let hx = 0.5 * x;
    let hy = 0.5 * y;
    vec![
        Point3::new(-hx, -hy, z),
        Point3::new(hx, -hy, z),
        Point3::new(hx, hy, z),
        Point3::new(-hx, hy, z),
    ]
}

fn circle_ring(radius: f64, z: f64, segments: usize) -> Vec<Point3<f64>> {
    (0..segments)
        .map(|k| {
            let t = TAU * k as f64 / segments as f64;
            Point3::new(radius * t.cos(), radius * t.sin(), z)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{CollectingReporter, Severity};
    use ifc_brep_core::{
        BooleanResult, Curve, HalfSpaceSolid, Placement, ProfileDef, Surface, TopologicalItem,
        UnitContext,
    };
    use std::sync::Arc;

    fn placement_3d(model: &mut Model, x: f64, y: f64, z: f64) -> EntityId {
        let location = model.add_point(x, y, z);
        model.insert(Entity::Placement(Placement::Axis2Placement3D {
            location,
            axis: None,
            ref_direction: None,
        }))
    }

    fn placement_2d(model: &mut Model, x: f64, y: f64) -> EntityId {
        let location = model.add_point_2d(x, y);
        model.insert(Entity::Placement(Placement::Axis2Placement2D {
            location,
            ref_direction: None,
        }))
    }

    fn rectangle_profile(model: &mut Model, x: f64, y: f64) -> EntityId {
        model.insert(Entity::Profile(ProfileDef::Rectangle {
            position: None,
            x_dim: x,
            y_dim: y,
        }))
    }

    fn polyline_3d(model: &mut Model, points: &[[f64; 3]]) -> EntityId {
        let ids = points
            .iter()
            .map(|p| model.add_point(p[0], p[1], p[2]))
            .collect();
        model.insert(Entity::Curve(Curve::Polyline { points: ids }))
    }

    fn polyline_2d(model: &mut Model, points: &[(f64, f64)]) -> EntityId {
        let ids = points
            .iter()
            .map(|&(x, y)| model.add_point_2d(x, y))
            .collect();
        model.insert(Entity::Curve(Curve::Polyline { points: ids }))
    }

    fn extruded_box(model: &mut Model, x: f64, y: f64, depth: f64) -> EntityId {
        let swept_area = rectangle_profile(model, x, y);
        let extruded_direction = model.add_direction(0.0, 0.0, 1.0);
        model.insert(Entity::Solid(SolidModel::ExtrudedAreaSolid {
            swept_area,
            position: None,
            extruded_direction,
            depth,
        }))
    }

    fn centered_block(model: &mut Model, center_x: f64, size: f64) -> EntityId {
        let position = placement_3d(model, center_x, 0.0, 0.0);
        model.insert(Entity::CsgPrimitive(CsgPrimitive3D::Block {
            position,
            x_length: size,
            y_length: size,
            z_length: size,
        }))
    }

    fn solid_volume(shape: &Shape, settings: &GeometrySettings) -> f64 {
        match shape {
            Shape::Solid(solid) => solid.volume(settings),
            Shape::Mesh(mesh) => mesh.signed_volume(),
            other => panic!("expected a solid or mesh, got {other:?}"),
        }
    }

    #[test]
    fn test_extruded_rectangle_makes_box() {
        let mut model = Model::new();
        let id = extruded_box(&mut model, 1.0, 2.0, 3.0);

        let settings = GeometrySettings::default();
        let profiles = ProfileCache::new();
        let shape =
            convert_solid_model(&model, id, &profiles, &settings, &ReporterHandle::null())
                .unwrap();

        let Shape::Solid(solid) = &shape else {
            panic!("expected a solid");
        };
        assert!((solid.volume(&settings) - 6.0).abs() < 1e-9);
        assert_eq!(shape.to_mesh(&settings).triangle_count(), 12);
    }

    #[test]
    fn test_extrusion_position_offsets_solid() {
        let mut model = Model::new();
        let swept_area = rectangle_profile(&mut model, 1.0, 1.0);
        let extruded_direction = model.add_direction(0.0, 0.0, 1.0);
        let position = placement_3d(&mut model, 10.0, 0.0, 0.0);
        let id = model.insert(Entity::Solid(SolidModel::ExtrudedAreaSolid {
            swept_area,
            position: Some(position),
            extruded_direction,
            depth: 1.0,
        }));

        let settings = GeometrySettings::default();
        let shape = convert_solid_model(
            &model,
            id,
            &ProfileCache::new(),
            &settings,
            &ReporterHandle::null(),
        )
        .unwrap();

        let (min, max) = shape.bounds(&settings).unwrap();
        assert!((min.x - 9.5).abs() < 1e-9);
        assert!((max.x - 10.5).abs() < 1e-9);
    }

    #[test]
    fn test_revolved_offset_rectangle_quarter_ring() {
        let mut model = Model::new();
        let position = placement_2d(&mut model, 2.0, 0.0);
        let swept_area = model.insert(Entity::Profile(ProfileDef::Rectangle {
            position: Some(position),
            x_dim: 1.0,
            y_dim: 1.0,
        }));
        let location = model.add_point(0.0, 0.0, 0.0);
        let direction = model.add_direction(0.0, 1.0, 0.0);
        let axis = model.insert(Entity::Placement(Placement::Axis1Placement {
            location,
            axis: Some(direction),
        }));
        let id = model.insert(Entity::Solid(SolidModel::RevolvedAreaSolid {
            swept_area,
            position: None,
            axis,
            angle: FRAC_PI_2,
        }));

        let settings = GeometrySettings::default();
        let shape = convert_solid_model(
            &model,
            id,
            &ProfileCache::new(),
            &settings,
            &ReporterHandle::null(),
        )
        .unwrap();

        // Pappus: area 1 at centroid radius 2 over a quarter turn
        let volume = solid_volume(&shape, &settings);
        assert!((volume - PI).abs() < 0.1, "volume {volume}");
    }

    #[test]
    fn test_revolution_angle_in_degrees() {
        let mut model = Model::with_units(UnitContext::si().with_degrees());
        let position = placement_2d(&mut model, 2.0, 0.0);
        let swept_area = model.insert(Entity::Profile(ProfileDef::Rectangle {
            position: Some(position),
            x_dim: 1.0,
            y_dim: 1.0,
        }));
        let location = model.add_point(0.0, 0.0, 0.0);
        let direction = model.add_direction(0.0, 1.0, 0.0);
        let axis = model.insert(Entity::Placement(Placement::Axis1Placement {
            location,
            axis: Some(direction),
        }));
        let id = model.insert(Entity::Solid(SolidModel::RevolvedAreaSolid {
            swept_area,
            position: None,
            axis,
            angle: 90.0,
        }));

        let settings = GeometrySettings::default();
        let shape = convert_solid_model(
            &model,
            id,
            &ProfileCache::new(),
            &settings,
            &ReporterHandle::null(),
        )
        .unwrap();

        let volume = solid_volume(&shape, &settings);
        assert!((volume - PI).abs() < 0.1, "volume {volume}");
    }

    #[test]
    fn test_swept_disk_builds_pipe() {
        let mut model = Model::new();
        let directrix = polyline_3d(&mut model, &[[0.0, 0.0, 0.0], [0.0, 0.0, 4.0]]);
        let id = model.insert(Entity::Solid(SolidModel::SweptDiskSolid {
            directrix,
            radius: 0.5,
            inner_radius: None,
        }));

        let settings = GeometrySettings::default();
        let shape = convert_solid_model(
            &model,
            id,
            &ProfileCache::new(),
            &settings,
            &ReporterHandle::null(),
        )
        .unwrap();

        let volume = solid_volume(&shape, &settings);
        let exact = PI * 0.25 * 4.0;
        assert!((volume - exact).abs() / exact < 0.05, "volume {volume}");
    }

    #[test]
    fn test_swept_disk_thin_radius_keeps_directrix() {
        let mut model = Model::new();
        let directrix = polyline_3d(&mut model, &[[0.0, 0.0, 0.0], [0.0, 0.0, 4.0]]);
        let id = model.insert(Entity::Solid(SolidModel::SweptDiskSolid {
            directrix,
            radius: 0.0005,
            inner_radius: None,
        }));

        let collector = Arc::new(CollectingReporter::new());
        let reporter = ReporterHandle::new(collector.clone());
        let shape = convert_solid_model(
            &model,
            id,
            &ProfileCache::new(),
            &GeometrySettings::default(),
            &reporter,
        )
        .unwrap();

        assert!(matches!(shape, Shape::Wire(_)));
        assert!(collector.has_severity(Severity::MinorWarning));
    }

    #[test]
    fn test_swept_disk_inner_radius_ignored_when_oversized() {
        let mut model = Model::new();
        let directrix = polyline_3d(&mut model, &[[0.0, 0.0, 0.0], [0.0, 0.0, 2.0]]);
        let id = model.insert(Entity::Solid(SolidModel::SweptDiskSolid {
            directrix,
            radius: 0.5,
            inner_radius: Some(0.6),
        }));

        let settings = GeometrySettings::default();
        let collector = Arc::new(CollectingReporter::new());
        let reporter = ReporterHandle::new(collector.clone());
        let shape =
            convert_solid_model(&model, id, &ProfileCache::new(), &settings, &reporter).unwrap();

        let Shape::Solid(solid) = shape else {
            panic!("expected a solid");
        };
        // Solid disk section: wall quads plus two caps, no inner tube
        assert_eq!(solid.shell.faces.len(), settings.circle_segments() + 2);
        assert!(collector.has_severity(Severity::MinorWarning));
    }

    #[test]
    fn test_fixed_reference_sweep_reports_refinement_gap() {
        let mut model = Model::new();
        let swept_area = rectangle_profile(&mut model, 0.2, 0.2);
        let directrix = polyline_3d(&mut model, &[[0.0, 0.0, 0.0], [2.0, 0.0, 0.0]]);
        let fixed_reference = model.add_direction(0.0, 0.0, 1.0);
        let id = model.insert(Entity::Solid(SolidModel::FixedReferenceSweptAreaSolid {
            swept_area,
            position: None,
            directrix,
            fixed_reference,
        }));

        let settings = GeometrySettings::default();
        let collector = Arc::new(CollectingReporter::new());
        let reporter = ReporterHandle::new(collector.clone());
        let shape =
            convert_solid_model(&model, id, &ProfileCache::new(), &settings, &reporter).unwrap();

        let volume = solid_volume(&shape, &settings);
        assert!((volume - 0.08).abs() < 1e-9, "volume {volume}");
        assert!(collector.has_severity(Severity::MinorWarning));
    }

    #[test]
    fn test_sectioned_spine_sweeps_first_section() {
        let mut model = Model::new();
        let spine_curve = polyline_3d(&mut model, &[[0.0, 0.0, 0.0], [0.0, 0.0, 3.0]]);
        let first = rectangle_profile(&mut model, 1.0, 1.0);
        let second = rectangle_profile(&mut model, 0.5, 0.5);
        let position_a = placement_3d(&mut model, 0.0, 0.0, 0.0);
        let position_b = placement_3d(&mut model, 0.0, 0.0, 3.0);
        let id = model.insert(Entity::SectionedSpine(ifc_brep_core::SectionedSpine {
            spine_curve,
            cross_sections: vec![first, second],
            cross_section_positions: vec![position_a, position_b],
        }));

        let settings = GeometrySettings::default();
        let collector = Arc::new(CollectingReporter::new());
        let reporter = ReporterHandle::new(collector.clone());
        let shape =
            convert_sectioned_spine(&model, id, &ProfileCache::new(), &settings, &reporter)
                .unwrap();

        let volume = solid_volume(&shape, &settings);
        assert!((volume - 3.0).abs() < 1e-6, "volume {volume}");
        assert!(collector.has_severity(Severity::MinorWarning));
    }

    fn cube_face(model: &mut Model, corners: &[[f64; 3]]) -> EntityId {
        let polygon = corners
            .iter()
            .map(|c| model.add_point(c[0], c[1], c[2]))
            .collect();
        let loop_id = model.insert(Entity::Topology(TopologicalItem::PolyLoop { polygon }));
        let bound = model.insert(Entity::Topology(TopologicalItem::FaceBound {
            bound: loop_id,
            orientation: true,
            is_outer: true,
        }));
        model.insert(Entity::Topology(TopologicalItem::Face {
            bounds: vec![bound],
        }))
    }

    fn closed_cube_shell(model: &mut Model) -> EntityId {
        let faces = vec![
            cube_face(model, &[[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0], [1.0, 0.0, 0.0]]),
            cube_face(model, &[[0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [1.0, 1.0, 1.0], [0.0, 1.0, 1.0]]),
            cube_face(model, &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 1.0], [0.0, 0.0, 1.0]]),
            cube_face(model, &[[1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [1.0, 1.0, 1.0], [1.0, 0.0, 1.0]]),
            cube_face(model, &[[1.0, 1.0, 0.0], [0.0, 1.0, 0.0], [0.0, 1.0, 1.0], [1.0, 1.0, 1.0]]),
            cube_face(model, &[[0.0, 1.0, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 1.0]]),
        ];
        model.insert(Entity::Topology(TopologicalItem::ClosedShell { faces }))
    }

    #[test]
    fn test_faceted_brep_closes_cube() {
        let mut model = Model::new();
        let outer = closed_cube_shell(&mut model);
        let id = model.insert(Entity::Solid(SolidModel::FacetedBrep {
            outer,
            voids: Vec::new(),
        }));

        let settings = GeometrySettings::default();
        let shape = convert_solid_model(
            &model,
            id,
            &ProfileCache::new(),
            &settings,
            &ReporterHandle::null(),
        )
        .unwrap();

        let Shape::Solid(solid) = shape else {
            panic!("expected a solid");
        };
        assert!((solid.volume(&settings) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_brep_voids_are_reported() {
        let mut model = Model::new();
        let outer = closed_cube_shell(&mut model);
        let inner = closed_cube_shell(&mut model);
        let id = model.insert(Entity::Solid(SolidModel::FacetedBrep {
            outer,
            voids: vec![inner],
        }));

        let collector = Arc::new(CollectingReporter::new());
        let reporter = ReporterHandle::new(collector.clone());
        let shape = convert_solid_model(
            &model,
            id,
            &ProfileCache::new(),
            &GeometrySettings::default(),
            &reporter,
        )
        .unwrap();

        assert!(matches!(shape, Shape::Solid(_)));
        assert!(collector.has_severity(Severity::MinorWarning));
    }

    #[test]
    fn test_csg_block_is_centered() {
        let mut model = Model::new();
        let position = placement_3d(&mut model, 0.0, 0.0, 0.0);
        let id = model.insert(Entity::CsgPrimitive(CsgPrimitive3D::Block {
            position,
            x_length: 2.0,
            y_length: 3.0,
            z_length: 4.0,
        }));

        let settings = GeometrySettings::default();
        let shape = convert_csg_primitive(&model, id, &settings).unwrap();

        let volume = solid_volume(&shape, &settings);
        assert!((volume - 24.0).abs() < 1e-9);
        let (min, max) = shape.bounds(&settings).unwrap();
        assert!((min.z + 2.0).abs() < 1e-9);
        assert!((max.y - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_csg_sphere_volume() {
        let mut model = Model::new();
        let position = placement_3d(&mut model, 0.0, 0.0, 0.0);
        let id = model.insert(Entity::CsgPrimitive(CsgPrimitive3D::Sphere {
            position,
            radius: 1.0,
        }));

        let settings = GeometrySettings::default();
        let shape = convert_csg_primitive(&model, id, &settings).unwrap();

        let volume = solid_volume(&shape, &settings);
        let exact = 4.0 * PI / 3.0;
        assert!((volume - exact).abs() / exact < 0.05, "volume {volume}");
    }

    #[test]
    fn test_csg_primitive_rejects_flat_block() {
        let mut model = Model::new();
        let position = placement_3d(&mut model, 0.0, 0.0, 0.0);
        let id = model.insert(Entity::CsgPrimitive(CsgPrimitive3D::Block {
            position,
            x_length: 1.0,
            y_length: 1.0,
            z_length: 0.0,
        }));

        let error =
            convert_csg_primitive(&model, id, &GeometrySettings::default()).unwrap_err();
        assert!(matches!(error, Error::DataIntegrity { .. }));
    }

    #[test]
    fn test_boolean_difference_carves_overlap() {
        let mut model = Model::new();
        let first_operand = centered_block(&mut model, 0.0, 2.0);
        let second_operand = centered_block(&mut model, 1.0, 2.0);
        let id = model.insert(Entity::BooleanResult(BooleanResult {
            operator: BooleanOperator::Difference,
            first_operand,
            second_operand,
        }));

        let settings = GeometrySettings::default();
        let shape = convert_boolean_result(
            &model,
            id,
            &ProfileCache::new(),
            &settings,
            &ReporterHandle::null(),
        )
        .unwrap();

        let Shape::Mesh(mesh) = shape else {
            panic!("expected a mesh");
        };
        assert!((mesh.signed_volume() - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_csg_tree_rooted_union() {
        let mut model = Model::new();
        let first_operand = centered_block(&mut model, 0.0, 2.0);
        let second_operand = centered_block(&mut model, 1.0, 2.0);
        let tree_root = model.insert(Entity::BooleanResult(BooleanResult {
            operator: BooleanOperator::Union,
            first_operand,
            second_operand,
        }));
        let id = model.insert(Entity::Solid(SolidModel::CsgSolid { tree_root }));

        let settings = GeometrySettings::default();
        let shape = convert_solid_model(
            &model,
            id,
            &ProfileCache::new(),
            &settings,
            &ReporterHandle::null(),
        )
        .unwrap();

        let volume = solid_volume(&shape, &settings);
        assert!((volume - 12.0).abs() < 1e-5, "volume {volume}");
    }

    #[test]
    fn test_half_space_clips_block_at_plane() {
        let mut model = Model::new();
        let first_operand = centered_block(&mut model, 0.0, 2.0);
        let plane_position = placement_3d(&mut model, 0.0, 0.0, 0.0);
        let base_surface = model.insert(Entity::Surface(Surface::Plane {
            position: plane_position,
        }));
        let second_operand = model.insert(Entity::HalfSpace(HalfSpaceSolid {
            base_surface,
            agreement_flag: false,
            variant: HalfSpaceVariant::Plain,
        }));
        let id = model.insert(Entity::BooleanResult(BooleanResult {
            operator: BooleanOperator::Difference,
            first_operand,
            second_operand,
        }));

        let settings = GeometrySettings::default();
        let shape = convert_boolean_result(
            &model,
            id,
            &ProfileCache::new(),
            &settings,
            &ReporterHandle::null(),
        )
        .unwrap();

        let Shape::Mesh(mesh) = shape else {
            panic!("expected a mesh");
        };
        assert!((mesh.signed_volume() - 4.0).abs() < 1e-5);
        let (_, max) = mesh.bounds().unwrap();
        assert!(max.z.abs() < 1e-6);
    }

    #[test]
    fn test_polygonal_half_space_cuts_within_boundary() {
        let mut model = Model::new();
        let position = placement_3d(&mut model, 0.0, 0.0, 0.0);
        let first_operand = model.insert(Entity::CsgPrimitive(CsgPrimitive3D::Block {
            position,
            x_length: 4.0,
            y_length: 4.0,
            z_length: 2.0,
        }));

        let plane_position = placement_3d(&mut model, 0.0, 0.0, 0.0);
        let base_surface = model.insert(Entity::Surface(Surface::Plane {
            position: plane_position,
        }));
        let boundary_position = placement_3d(&mut model, 0.0, 0.0, 0.0);
        let boundary = polyline_2d(
            &mut model,
            &[(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5), (-0.5, -0.5)],
        );
        let second_operand = model.insert(Entity::HalfSpace(HalfSpaceSolid {
            base_surface,
            agreement_flag: false,
            variant: HalfSpaceVariant::Polygonal {
                position: boundary_position,
                boundary,
            },
        }));
        let id = model.insert(Entity::BooleanResult(BooleanResult {
            operator: BooleanOperator::Difference,
            first_operand,
            second_operand,
        }));

        let settings = GeometrySettings::default();
        let shape = convert_boolean_result(
            &model,
            id,
            &ProfileCache::new(),
            &settings,
            &ReporterHandle::null(),
        )
        .unwrap();

        // Only the 1 x 1 column above the plane is removed
        let Shape::Mesh(mesh) = shape else {
            panic!("expected a mesh");
        };
        assert!((mesh.signed_volume() - 31.0).abs() < 0.02);
    }

    #[test]
    fn test_curve_operand_is_skipped() {
        let mut model = Model::new();
        let first_operand = centered_block(&mut model, 0.0, 2.0);
        let directrix = polyline_3d(&mut model, &[[0.0, 0.0, 0.0], [0.0, 0.0, 1.0]]);
        let second_operand = model.insert(Entity::Solid(SolidModel::SweptDiskSolid {
            directrix,
            radius: 0.0001,
            inner_radius: None,
        }));
        let id = model.insert(Entity::BooleanResult(BooleanResult {
            operator: BooleanOperator::Difference,
            first_operand,
            second_operand,
        }));

        let settings = GeometrySettings::default();
        let collector = Arc::new(CollectingReporter::new());
        let reporter = ReporterHandle::new(collector.clone());
        let shape =
            convert_boolean_result(&model, id, &ProfileCache::new(), &settings, &reporter)
                .unwrap();

        let volume = solid_volume(&shape, &settings);
        assert!((volume - 8.0).abs() < 1e-9, "volume {volume}");
        assert!(collector.has_severity(Severity::MinorWarning));
    }
}
