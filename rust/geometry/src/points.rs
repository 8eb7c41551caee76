// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cartesian point, direction and vector resolution
//!
//! All lengths are scaled into meters here, at the model boundary, so the
//! rest of the crate works in one unit. Directions are unitless and only
//! normalized.

use ifc_brep_core::{EntityId, Model};
use nalgebra::{Point2, Point3, Vector2, Vector3};

use crate::error::{Error, Result};
use crate::geom_utils::points_equal;
use crate::settings::GeometrySettings;

/// Squared distance under which consecutive list points collapse into one
const CONSECUTIVE_POINT_TOLERANCE: f64 = 1e-8;

/// Resolve a cartesian point into metric 3D coordinates.
/// 2D points land in the z = 0 plane.
pub fn resolve_point(
    model: &Model,
    id: EntityId,
    settings: &GeometrySettings,
) -> Result<Point3<f64>> {
    let point = model.point(id)?;
    let coords = &point.coordinates;

    let raw = match coords.len() {
        2 => Point3::new(coords[0], coords[1], 0.0),
        3 => Point3::new(coords[0], coords[1], coords[2]),
        n => {
            return Err(Error::data_integrity(
                id,
                format!("cartesian point with {} coordinates", n),
            ))
        }
    };

    Ok(scale_point(raw, model.units().length_factor, settings))
}

/// Resolve a cartesian point into metric 2D coordinates, dropping any
/// z component. Profile and planar curve geometry lives in this space.
pub fn resolve_point_2d(
    model: &Model,
    id: EntityId,
    settings: &GeometrySettings,
) -> Result<Point2<f64>> {
    let p = resolve_point(model, id, settings)?;
    Ok(Point2::new(p.x, p.y))
}

/// Resolve a direction into a unit 3D vector. 2D directions land in the
/// z = 0 plane.
pub fn resolve_direction(model: &Model, id: EntityId) -> Result<Vector3<f64>> {
    let direction = model.direction(id)?;
    let ratios = &direction.ratios;

    let raw = match ratios.len() {
        2 => Vector3::new(ratios[0], ratios[1], 0.0),
        3 => Vector3::new(ratios[0], ratios[1], ratios[2]),
        n => {
            return Err(Error::data_integrity(
                id,
                format!("direction with {} components", n),
            ))
        }
    };

    raw.try_normalize(1e-12)
        .ok_or_else(|| Error::data_integrity(id, "direction with zero length".to_string()))
}

/// Resolve a direction into a unit 2D vector, dropping any z component
pub fn resolve_direction_2d(model: &Model, id: EntityId) -> Result<Vector2<f64>> {
    let d = resolve_direction(model, id)?;
    Vector2::new(d.x, d.y)
        .try_normalize(1e-12)
        .ok_or_else(|| Error::data_integrity(id, "direction lies outside the xy plane".to_string()))
}

/// Resolve a vector (direction reference plus magnitude) into a metric,
/// non-normalized 3D vector
pub fn resolve_vector(model: &Model, id: EntityId) -> Result<Vector3<f64>> {
    let def = model.vector(id)?;
    let unit = resolve_direction(model, def.orientation)?;
    Ok(unit * (def.magnitude * model.units().length_factor))
}

/// Resolve an ordered point list, dropping consecutive duplicates.
///
/// With `close` set, a trailing point that repeats the first one is also
/// dropped; loop entities frequently store that explicit closing copy.
pub fn resolve_point_list(
    model: &Model,
    ids: &[EntityId],
    settings: &GeometrySettings,
    close: bool,
) -> Result<Vec<Point3<f64>>> {
    let mut points: Vec<Point3<f64>> = Vec::with_capacity(ids.len());

    for &id in ids {
        let p = resolve_point(model, id, settings)?;
        if let Some(last) = points.last() {
            if points_equal(last, &p, CONSECUTIVE_POINT_TOLERANCE) {
                continue;
            }
        }
        points.push(p);
    }

    if close && points.len() > 1 {
        let first = points[0];
        if let Some(last) = points.last() {
            if points_equal(&first, last, CONSECUTIVE_POINT_TOLERANCE) {
                points.pop();
            }
        }
    }

    Ok(points)
}

#[inline]
fn scale_point(p: Point3<f64>, length_factor: f64, settings: &GeometrySettings) -> Point3<f64> {
    let scaled = p * length_factor;
    match settings.coordinate_decimals {
        Some(decimals) => {
            let grid = 10f64.powi(decimals as i32);
            Point3::new(
                (scaled.x * grid).round() / grid,
                (scaled.y * grid).round() / grid,
                (scaled.z * grid).round() / grid,
            )
        }
        None => scaled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifc_brep_core::UnitContext;

    #[test]
    fn test_resolve_point_2d_fills_z() {
        let mut model = Model::new();
        let id = model.add_point_2d(1.5, -2.5);

        let p = resolve_point(&model, id, &GeometrySettings::default()).unwrap();
        assert_eq!(p, Point3::new(1.5, -2.5, 0.0));
    }

    #[test]
    fn test_resolve_point_scales_to_meters() {
        let mut model = Model::with_units(UnitContext::millimeters());
        let id = model.add_point(1000.0, 500.0, -250.0);

        let p = resolve_point(&model, id, &GeometrySettings::default()).unwrap();
        assert!((p.x - 1.0).abs() < 1e-12);
        assert!((p.y - 0.5).abs() < 1e-12);
        assert!((p.z + 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_resolve_point_quantizes() {
        let mut model = Model::new();
        let id = model.add_point(1.23456789, 0.0, 0.0);

        let settings = GeometrySettings {
            coordinate_decimals: Some(3),
            ..GeometrySettings::default()
        };
        let p = resolve_point(&model, id, &settings).unwrap();
        assert!((p.x - 1.235).abs() < 1e-12);
    }

    #[test]
    fn test_resolve_point_rejects_single_coordinate() {
        use ifc_brep_core::{CartesianPoint, Entity};
        let mut model = Model::new();
        let id = model.insert(Entity::Point(CartesianPoint {
            coordinates: smallvec::smallvec![4.0],
        }));

        let err = resolve_point(&model, id, &GeometrySettings::default()).unwrap_err();
        assert!(matches!(err, Error::DataIntegrity { .. }));
    }

    #[test]
    fn test_resolve_direction_normalizes() {
        let mut model = Model::new();
        let id = model.add_direction(3.0, 0.0, 4.0);

        let d = resolve_direction(&model, id).unwrap();
        assert!((d.norm() - 1.0).abs() < 1e-12);
        assert!((d.x - 0.6).abs() < 1e-12);
        assert!((d.z - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_resolve_direction_rejects_zero() {
        let mut model = Model::new();
        let id = model.add_direction(0.0, 0.0, 0.0);

        assert!(matches!(
            resolve_direction(&model, id),
            Err(Error::DataIntegrity { .. })
        ));
    }

    #[test]
    fn test_resolve_vector_applies_magnitude_and_units() {
        use ifc_brep_core::{Entity, VectorDef};
        let mut model = Model::with_units(UnitContext::millimeters());
        let dir = model.add_direction(1.0, 0.0, 0.0);
        let vec_id = model.insert(Entity::Vector(VectorDef {
            orientation: dir,
            magnitude: 2000.0,
        }));

        let v = resolve_vector(&model, vec_id).unwrap();
        assert!((v.x - 2.0).abs() < 1e-12);
        assert_eq!(v.y, 0.0);
    }

    #[test]
    fn test_point_list_skips_consecutive_duplicates() {
        let mut model = Model::new();
        let a = model.add_point(0.0, 0.0, 0.0);
        let a_repeat = model.add_point(0.0, 0.0, 1e-9);
        let b = model.add_point(1.0, 0.0, 0.0);

        let points = resolve_point_list(
            &model,
            &[a, a_repeat, b],
            &GeometrySettings::default(),
            false,
        )
        .unwrap();
        assert_eq!(points.len(), 2);
    }

    #[test]
    fn test_point_list_close_drops_repeated_first() {
        let mut model = Model::new();
        let a = model.add_point(0.0, 0.0, 0.0);
        let b = model.add_point(1.0, 0.0, 0.0);
        let c = model.add_point(1.0, 1.0, 0.0);
        let a_again = model.add_point(0.0, 0.0, 0.0);

        let points = resolve_point_list(
            &model,
            &[a, b, c, a_again],
            &GeometrySettings::default(),
            true,
        )
        .unwrap();
        assert_eq!(points.len(), 3);
    }
}
