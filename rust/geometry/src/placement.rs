// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Placement and transformation operator resolution
//!
//! Axis placements become homogeneous matrices with a right-handed,
//! orthonormalized frame. Object placements chain those matrices up the
//! spatial tree; a per-walk visited set breaks reference cycles so a
//! malformed model still converts.

use ifc_brep_core::{EntityId, Model, ObjectPlacement, Placement};
use nalgebra::{Matrix3, Matrix4, Point3, Vector2, Vector3};
use rustc_hash::FxHashSet;

use crate::diagnostics::ReporterHandle;
use crate::error::{Error, Result};
use crate::points::{resolve_direction, resolve_direction_2d, resolve_point, resolve_point_2d};
use crate::settings::GeometrySettings;

const COMPONENT: &str = "placement converter";

/// Resolve an axis placement into a homogeneous 3D matrix
pub fn placement_matrix(
    model: &Model,
    id: EntityId,
    settings: &GeometrySettings,
) -> Result<Matrix4<f64>> {
    match *model.placement(id)? {
        Placement::Axis2Placement2D {
            location,
            ref_direction,
        } => {
            let origin = resolve_point(model, location, settings)?;
            let x2 = match ref_direction {
                Some(dir) => resolve_direction_2d(model, dir)?,
                None => Vector2::x(),
            };
            let x = Vector3::new(x2.x, x2.y, 0.0);
            // The plane's y axis is x rotated a quarter turn counter-clockwise
            let y = Vector3::new(-x2.y, x2.x, 0.0);
            Ok(frame_matrix(x, y, Vector3::z(), origin))
        }
        Placement::Axis2Placement3D {
            location,
            axis,
            ref_direction,
        } => {
            let origin = resolve_point(model, location, settings)?;
            let z_axis = match axis {
                Some(dir) => resolve_direction(model, dir)?,
                None => Vector3::z(),
            };
            let x_hint = match ref_direction {
                Some(dir) => resolve_direction(model, dir)?,
                None => Vector3::x(),
            };
            let (x, y, z) = orthonormal_frame(z_axis, x_hint);
            Ok(frame_matrix(x, y, z, origin))
        }
        Placement::Axis1Placement { location, axis } => {
            let origin = resolve_point(model, location, settings)?;
            let z_axis = match axis {
                Some(dir) => resolve_direction(model, dir)?,
                None => Vector3::z(),
            };
            let (x, y, z) = orthonormal_frame(z_axis, Vector3::x());
            Ok(frame_matrix(x, y, z, origin))
        }
    }
}

/// Resolve a planar axis placement into a homogeneous 2D matrix.
/// Profile positions use this; a 3D placement here is malformed data.
pub fn placement_matrix_2d(
    model: &Model,
    id: EntityId,
    settings: &GeometrySettings,
) -> Result<Matrix3<f64>> {
    match *model.placement(id)? {
        Placement::Axis2Placement2D {
            location,
            ref_direction,
        } => {
            let origin = resolve_point_2d(model, location, settings)?;
            let x = match ref_direction {
                Some(dir) => resolve_direction_2d(model, dir)?,
                None => Vector2::x(),
            };

            let mut m = Matrix3::identity();
            m[(0, 0)] = x.x;
            m[(1, 0)] = x.y;
            m[(0, 1)] = -x.y;
            m[(1, 1)] = x.x;
            m[(0, 2)] = origin.x;
            m[(1, 2)] = origin.y;
            Ok(m)
        }
        _ => Err(Error::data_integrity(
            id,
            "expected a planar axis placement".to_string(),
        )),
    }
}

/// Resolve an axis placement into a revolution axis: a point on the axis
/// and the unit axis direction
pub fn placement_axis(
    model: &Model,
    id: EntityId,
    settings: &GeometrySettings,
) -> Result<(Point3<f64>, Vector3<f64>)> {
    match *model.placement(id)? {
        Placement::Axis1Placement { location, axis } => {
            let origin = resolve_point(model, location, settings)?;
            let direction = match axis {
                Some(dir) => resolve_direction(model, dir)?,
                None => Vector3::z(),
            };
            Ok((origin, direction))
        }
        Placement::Axis2Placement3D { location, axis, .. } => {
            let origin = resolve_point(model, location, settings)?;
            let direction = match axis {
                Some(dir) => resolve_direction(model, dir)?,
                None => Vector3::z(),
            };
            Ok((origin, direction))
        }
        Placement::Axis2Placement2D { location, .. } => {
            let origin = resolve_point(model, location, settings)?;
            Ok((origin, Vector3::z()))
        }
    }
}

/// Resolve an object placement chain into one world matrix.
///
/// The visited set belongs to the caller and must be fresh per product.
/// A placement that is reached twice in one walk is a reference cycle;
/// it is reported and contributes the identity, so the chain built up to
/// that point still places the product.
pub fn resolve_object_placement(
    model: &Model,
    id: EntityId,
    settings: &GeometrySettings,
    reporter: &ReporterHandle,
    visited: &mut FxHashSet<EntityId>,
) -> Result<Matrix4<f64>> {
    if !visited.insert(id) {
        reporter.error(
            format!("object placement {} is part of a reference cycle", id),
            Some(id),
            COMPONENT,
        );
        return Ok(Matrix4::identity());
    }

    match *model.object_placement(id)? {
        ObjectPlacement::Local {
            placement_rel_to,
            relative_placement,
        } => {
            let local = placement_matrix(model, relative_placement, settings)?;
            match placement_rel_to {
                Some(parent) => {
                    let parent_matrix =
                        resolve_object_placement(model, parent, settings, reporter, visited)?;
                    Ok(parent_matrix * local)
                }
                None => Ok(local),
            }
        }
        ObjectPlacement::Grid { .. } => {
            reporter.minor_warning(
                "grid placement is not supported, product stays at the origin",
                Some(id),
                COMPONENT,
            );
            Ok(Matrix4::identity())
        }
    }
}

/// A resolved cartesian transformation operator
#[derive(Debug, Clone, Copy)]
pub struct OperatorTransform {
    pub matrix: Matrix4<f64>,
    /// Per-axis scales differ, so the matrix is not angle preserving
    pub is_non_uniform: bool,
}

/// Resolve a cartesian transformation operator (2D or 3D) into a matrix
/// plus a flag for non-uniform scaling
pub fn transform_operator_matrix(
    model: &Model,
    id: EntityId,
    settings: &GeometrySettings,
) -> Result<OperatorTransform> {
    let op = *model.transform_operator(id)?;

    let origin = match op.local_origin {
        Some(point) => resolve_point(model, point, settings)?,
        None => {
            return Err(Error::data_integrity(
                id,
                "transformation operator without a local origin".to_string(),
            ))
        }
    };

    let scale = op.scale.unwrap_or(1.0);
    let scale2 = op.scale2.unwrap_or(scale);
    let scale3 = op.scale3.unwrap_or(scale);

    let (x, y, z) = if op.dimensions == 2 {
        let x2 = match op.axis1 {
            Some(dir) => resolve_direction_2d(model, dir)?,
            None => Vector2::x(),
        };
        let y2 = match op.axis2 {
            Some(dir) => resolve_direction_2d(model, dir)?,
            None => Vector2::new(-x2.y, x2.x),
        };
        (
            Vector3::new(x2.x, x2.y, 0.0),
            Vector3::new(y2.x, y2.y, 0.0),
            Vector3::z(),
        )
    } else {
        // Mirroring operators carry explicit, possibly left-handed axes,
        // so given directions are used as stored
        let z = match op.axis3 {
            Some(dir) => resolve_direction(model, dir)?,
            None => Vector3::z(),
        };
        let x = match op.axis1 {
            Some(dir) => resolve_direction(model, dir)?,
            None => {
                let (x, _, _) = orthonormal_frame(z, Vector3::x());
                x
            }
        };
        let y = match op.axis2 {
            Some(dir) => resolve_direction(model, dir)?,
            None => z.cross(&x),
        };
        (x, y, z)
    };

    let mut matrix = frame_matrix(x * scale, y * scale2, z * scale3, origin);
    if op.dimensions == 2 {
        matrix[(2, 2)] = 1.0;
    }

    let is_non_uniform = scale2 != scale || scale3 != scale;
    Ok(OperatorTransform {
        matrix,
        is_non_uniform,
    })
}

/// Resolve the world coordinate system of a representation context,
/// walking sub-contexts up to their parents
pub fn context_matrix(
    model: &Model,
    id: EntityId,
    settings: &GeometrySettings,
) -> Result<Matrix4<f64>> {
    let mut visited = FxHashSet::default();
    let mut current = id;

    loop {
        if !visited.insert(current) {
            return Ok(Matrix4::identity());
        }
        let context = model.context(current)?;
        if let Some(wcs) = context.world_coordinate_system {
            return placement_matrix(model, wcs, settings);
        }
        match context.parent_context {
            Some(parent) => current = parent,
            None => return Ok(Matrix4::identity()),
        }
    }
}

/// Build a right-handed orthonormal frame from a z axis and an x hint.
/// A hint parallel to z falls back to the global axis least aligned
/// with z.
fn orthonormal_frame(
    z_axis: Vector3<f64>,
    x_hint: Vector3<f64>,
) -> (Vector3<f64>, Vector3<f64>, Vector3<f64>) {
    let z = z_axis.try_normalize(1e-12).unwrap_or_else(Vector3::z);

    let mut hint = x_hint;
    if z.cross(&hint).norm_squared() < 1e-12 {
        hint = least_aligned_axis(&z);
    }

    let y = z.cross(&hint).normalize();
    let x = y.cross(&z);
    (x, y, z)
}

fn least_aligned_axis(z: &Vector3<f64>) -> Vector3<f64> {
    let ax = z.x.abs();
    let ay = z.y.abs();
    let az = z.z.abs();
    if ax <= ay && ax <= az {
        Vector3::x()
    } else if ay <= az {
        Vector3::y()
    } else {
        Vector3::z()
    }
}

fn frame_matrix(
    x: Vector3<f64>,
    y: Vector3<f64>,
    z: Vector3<f64>,
    origin: Point3<f64>,
) -> Matrix4<f64> {
    let mut m = Matrix4::identity();
    m.fixed_view_mut::<3, 1>(0, 0).copy_from(&x);
    m.fixed_view_mut::<3, 1>(0, 1).copy_from(&y);
    m.fixed_view_mut::<3, 1>(0, 2).copy_from(&z);
    m.fixed_view_mut::<3, 1>(0, 3).copy_from(&origin.coords);
    m
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{CollectingReporter, Severity};
    use ifc_brep_core::Entity;
    use std::sync::Arc;

    fn axis2_3d(
        model: &mut Model,
        origin: (f64, f64, f64),
        axis: Option<(f64, f64, f64)>,
        ref_dir: Option<(f64, f64, f64)>,
    ) -> EntityId {
        let location = model.add_point(origin.0, origin.1, origin.2);
        let axis = axis.map(|(x, y, z)| model.add_direction(x, y, z));
        let ref_direction = ref_dir.map(|(x, y, z)| model.add_direction(x, y, z));
        model.insert(Entity::Placement(Placement::Axis2Placement3D {
            location,
            axis,
            ref_direction,
        }))
    }

    #[test]
    fn test_default_axis2_3d_is_translation() {
        let mut model = Model::new();
        let id = axis2_3d(&mut model, (1.0, 2.0, 3.0), None, None);

        let m = placement_matrix(&model, id, &GeometrySettings::default()).unwrap();
        let p = m.transform_point(&Point3::origin());
        assert_eq!(p, Point3::new(1.0, 2.0, 3.0));
        let x = m.transform_vector(&Vector3::x());
        assert!((x - Vector3::x()).norm() < 1e-12);
    }

    #[test]
    fn test_axis2_3d_orthonormalizes_skewed_ref() {
        let mut model = Model::new();
        // Ref direction not perpendicular to the axis
        let id = axis2_3d(&mut model, (0.0, 0.0, 0.0), Some((0.0, 0.0, 1.0)), Some((1.0, 0.2, 0.5)));

        let m = placement_matrix(&model, id, &GeometrySettings::default()).unwrap();
        let x = m.transform_vector(&Vector3::x());
        let y = m.transform_vector(&Vector3::y());
        let z = m.transform_vector(&Vector3::z());

        assert!((x.norm() - 1.0).abs() < 1e-12);
        assert!(x.dot(&y).abs() < 1e-12);
        assert!(x.dot(&z).abs() < 1e-12);
        assert!((x.cross(&y) - z).norm() < 1e-12);
        // x keeps the in-plane part of the hint
        assert!(x.z.abs() < 1e-12);
    }

    #[test]
    fn test_axis2_3d_ref_parallel_to_axis_falls_back() {
        let mut model = Model::new();
        let id = axis2_3d(&mut model, (0.0, 0.0, 0.0), Some((1.0, 0.0, 0.0)), Some((1.0, 0.0, 0.0)));

        let m = placement_matrix(&model, id, &GeometrySettings::default()).unwrap();
        let z = m.transform_vector(&Vector3::z());
        assert!((z - Vector3::x()).norm() < 1e-12);
        let x = m.transform_vector(&Vector3::x());
        assert!(x.dot(&z).abs() < 1e-12);
        assert!((x.norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_axis2_2d_rotates_quarter_turn() {
        let mut model = Model::new();
        let location = model.add_point_2d(2.0, 0.0);
        let ref_direction = model.add_direction_2d(0.0, 1.0);
        let id = model.insert(Entity::Placement(Placement::Axis2Placement2D {
            location,
            ref_direction: Some(ref_direction),
        }));

        let m = placement_matrix_2d(&model, id, &GeometrySettings::default()).unwrap();
        let p = m.transform_point(&nalgebra::Point2::new(1.0, 0.0));
        // x axis maps to +y, translated by (2, 0)
        assert!((p.x - 2.0).abs() < 1e-12);
        assert!((p.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_object_placement_chain_composes() {
        let mut model = Model::new();
        let parent_axis = axis2_3d(&mut model, (10.0, 0.0, 0.0), None, None);
        let parent = model.insert(Entity::ObjectPlacement(ObjectPlacement::Local {
            placement_rel_to: None,
            relative_placement: parent_axis,
        }));
        let child_axis = axis2_3d(&mut model, (0.0, 5.0, 0.0), None, None);
        let child = model.insert(Entity::ObjectPlacement(ObjectPlacement::Local {
            placement_rel_to: Some(parent),
            relative_placement: child_axis,
        }));

        let mut visited = FxHashSet::default();
        let m = resolve_object_placement(
            &model,
            child,
            &GeometrySettings::default(),
            &ReporterHandle::null(),
            &mut visited,
        )
        .unwrap();
        let p = m.transform_point(&Point3::origin());
        assert_eq!(p, Point3::new(10.0, 5.0, 0.0));
    }

    #[test]
    fn test_object_placement_cycle_reports_and_terminates() {
        let mut model = Model::new();
        let axis_a = axis2_3d(&mut model, (1.0, 0.0, 0.0), None, None);
        let axis_b = axis2_3d(&mut model, (0.0, 1.0, 0.0), None, None);

        // Reserve ids, then tie the placements into a cycle
        let a = model.insert(Entity::ObjectPlacement(ObjectPlacement::Local {
            placement_rel_to: None,
            relative_placement: axis_a,
        }));
        let b = model.insert(Entity::ObjectPlacement(ObjectPlacement::Local {
            placement_rel_to: Some(a),
            relative_placement: axis_b,
        }));
        model.insert_with_tag(
            a.0,
            Entity::ObjectPlacement(ObjectPlacement::Local {
                placement_rel_to: Some(b),
                relative_placement: axis_a,
            }),
        );

        let collector = Arc::new(CollectingReporter::new());
        let reporter = ReporterHandle::new(collector.clone());
        let mut visited = FxHashSet::default();
        let m = resolve_object_placement(
            &model,
            a,
            &GeometrySettings::default(),
            &reporter,
            &mut visited,
        )
        .unwrap();

        // Walk terminates: a composes b's local frame with its own
        let p = m.transform_point(&Point3::origin());
        assert_eq!(p, Point3::new(1.0, 1.0, 0.0));
        assert!(collector.has_severity(Severity::Error));
    }

    #[test]
    fn test_transform_operator_uniform_scale() {
        let mut model = Model::new();
        let origin = model.add_point(0.0, 0.0, 0.0);
        let id = model.insert(Entity::TransformOperator(
            ifc_brep_core::TransformOperator {
                dimensions: 3,
                axis1: None,
                axis2: None,
                axis3: None,
                local_origin: Some(origin),
                scale: Some(2.0),
                scale2: None,
                scale3: None,
            },
        ));

        let op = transform_operator_matrix(&model, id, &GeometrySettings::default()).unwrap();
        assert!(!op.is_non_uniform);
        let v = op.matrix.transform_vector(&Vector3::new(1.0, 1.0, 1.0));
        assert!((v - Vector3::new(2.0, 2.0, 2.0)).norm() < 1e-12);
    }

    #[test]
    fn test_transform_operator_non_uniform_flag() {
        let mut model = Model::new();
        let origin = model.add_point(0.0, 0.0, 0.0);
        let id = model.insert(Entity::TransformOperator(
            ifc_brep_core::TransformOperator {
                dimensions: 3,
                axis1: None,
                axis2: None,
                axis3: None,
                local_origin: Some(origin),
                scale: Some(1.0),
                scale2: Some(3.0),
                scale3: None,
            },
        ));

        let op = transform_operator_matrix(&model, id, &GeometrySettings::default()).unwrap();
        assert!(op.is_non_uniform);
        let v = op.matrix.transform_vector(&Vector3::y());
        assert!((v.y - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_transform_operator_missing_origin_is_rejected() {
        let mut model = Model::new();
        let id = model.insert(Entity::TransformOperator(
            ifc_brep_core::TransformOperator {
                dimensions: 3,
                axis1: None,
                axis2: None,
                axis3: None,
                local_origin: None,
                scale: None,
                scale2: None,
                scale3: None,
            },
        ));

        assert!(matches!(
            transform_operator_matrix(&model, id, &GeometrySettings::default()),
            Err(Error::DataIntegrity { .. })
        ));
    }

    #[test]
    fn test_context_matrix_walks_to_parent() {
        let mut model = Model::new();
        let wcs = axis2_3d(&mut model, (0.0, 0.0, 7.0), None, None);
        let parent = model.insert(Entity::Context(ifc_brep_core::RepresentationContext {
            parent_context: None,
            world_coordinate_system: Some(wcs),
            coordinate_space_dimension: 3,
            precision: Some(1e-5),
        }));
        let sub = model.insert(Entity::Context(ifc_brep_core::RepresentationContext {
            parent_context: Some(parent),
            world_coordinate_system: None,
            coordinate_space_dimension: 3,
            precision: None,
        }));

        let m = context_matrix(&model, sub, &GeometrySettings::default()).unwrap();
        let p = m.transform_point(&Point3::origin());
        assert_eq!(p, Point3::new(0.0, 0.0, 7.0));
    }
}
