// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Profile definition conversion and caching
//!
//! Converts profile definitions into [`Profile2D`] polygons in
//! profile-local coordinates, applying the optional 2D position
//! placement. Parameterized outlines run counter-clockwise about the
//! profile centroid; steel shapes build one half or quarter of the
//! outline and mirror the rest. Converted profiles are shared through
//! [`ProfileCache`], keyed by entity identity.

use std::f64::consts::{FRAC_PI_2, TAU};
use std::sync::{Arc, Mutex};

use ifc_brep_core::{EntityId, Model, ProfileDef};
use nalgebra::{Matrix3, Matrix4, Point2, Vector2};
use rustc_hash::FxHashMap;

use crate::bool2d;
use crate::curve::{convert_curve, curve_to_contour_2d};
use crate::diagnostics::ReporterHandle;
use crate::error::{Error, Result};
use crate::geom_utils::sample_wire;
use crate::placement::{placement_matrix_2d, transform_operator_matrix};
use crate::profile::{create_circle, create_rectangle, Profile2D};
use crate::settings::{GeometrySettings, EPSILON};

const COMPONENT: &str = "profile converter";

/// Session-scoped cache of converted profiles, keyed by entity identity.
///
/// Lookups take the lock briefly; the conversion itself runs unlocked, so
/// two workers racing on the same miss may both convert. The last insert
/// wins, which is harmless because both computed the same polygon.
#[derive(Debug, Default)]
pub struct ProfileCache {
    entries: Mutex<FxHashMap<EntityId, Arc<Profile2D>>>,
}

impl ProfileCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the converted profile behind `id`, converting on a miss.
    ///
    /// A negative identity tag is a malformed-model signal and fails
    /// outright instead of counting as a miss.
    pub fn get(
        &self,
        model: &Model,
        id: EntityId,
        settings: &GeometrySettings,
        reporter: &ReporterHandle,
    ) -> Result<Arc<Profile2D>> {
        if !id.is_valid() {
            return Err(Error::data_integrity(
                id,
                "profile entity has a negative identity tag",
            ));
        }

        if let Ok(entries) = self.entries.lock() {
            if let Some(profile) = entries.get(&id) {
                return Ok(Arc::clone(profile));
            }
        }

        let profile = Arc::new(convert_profile(model, id, settings, reporter)?);

        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(id, Arc::clone(&profile));
        }

        Ok(profile)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Convert a profile definition into a polygon in profile-local coordinates
pub fn convert_profile(
    model: &Model,
    id: EntityId,
    settings: &GeometrySettings,
    reporter: &ReporterHandle,
) -> Result<Profile2D> {
    let def = model.profile(id)?;
    let lf = model.units().length_factor;

    let mut result = match def {
        ProfileDef::Rectangle { x_dim, y_dim, .. } => {
            let x = x_dim * lf;
            let y = y_dim * lf;
            require_positive_dims(id, &[x, y])?;
            create_rectangle(x, y)
        }
        ProfileDef::RectangleHollow {
            x_dim,
            y_dim,
            wall_thickness,
            ..
        } => rectangle_hollow(id, x_dim * lf, y_dim * lf, wall_thickness * lf)?,
        ProfileDef::RoundedRectangle {
            x_dim,
            y_dim,
            rounding_radius,
            ..
        } => {
            let x = x_dim * lf;
            let y = y_dim * lf;
            require_positive_dims(id, &[x, y])?;
            rounded_rectangle(x, y, rounding_radius * lf, settings)
        }
        ProfileDef::Circle { radius, .. } => {
            let r = radius * lf;
            require_positive_dims(id, &[r])?;
            create_circle(r, None, settings.circle_segments())
        }
        ProfileDef::CircleHollow {
            radius,
            wall_thickness,
            ..
        } => {
            let r = radius * lf;
            require_positive_dims(id, &[r])?;
            let inner = r - wall_thickness * lf;
            let hole = if inner > EPSILON {
                Some(inner)
            } else {
                reporter.minor_warning(
                    "Wall thickness leaves no hollow core, profile stays solid",
                    Some(id),
                    COMPONENT,
                );
                None
            };
            create_circle(r, hole, settings.circle_segments())
        }
        ProfileDef::Ellipse {
            semi_axis1,
            semi_axis2,
            ..
        } => ellipse_outline(semi_axis1 * lf, semi_axis2 * lf, settings.circle_segments()),
        ProfileDef::Trapezium {
            bottom_x_dim,
            top_x_dim,
            y_dim,
            top_x_offset,
            ..
        } => trapezium_outline(
            bottom_x_dim * lf,
            top_x_dim * lf,
            y_dim * lf,
            top_x_offset * lf,
        ),
        ProfileDef::IShape {
            overall_width,
            overall_depth,
            web_thickness,
            flange_thickness,
            ..
        } => i_shape_outline(
            overall_width * lf,
            overall_depth * lf,
            web_thickness * lf,
            flange_thickness * lf,
        ),
        ProfileDef::LShape {
            depth,
            width,
            thickness,
            ..
        } => {
            let h = depth * lf;
            let w = width.map_or(h, |w| w * lf);
            let t = thickness * lf;
            require_positive_dims(id, &[w * 0.5, h * 0.5, t])?;
            l_shape_outline(w, h, t)
        }
        ProfileDef::UShape {
            depth,
            flange_width,
            web_thickness,
            flange_thickness,
            ..
        } => {
            let h = depth * lf;
            let w = flange_width * lf;
            let tw = web_thickness * lf;
            let tf = flange_thickness * lf;
            require_positive_dims(id, &[w, h, tw, tf])?;
            u_shape_outline(w, h, tw, tf)
        }
        ProfileDef::CShape {
            depth,
            width,
            wall_thickness,
            girth,
            ..
        } => {
            let h = depth * lf;
            let w = width * lf;
            let t = wall_thickness * lf;
            let g = girth * lf;
            require_positive_dims(id, &[w * 0.5, h * 0.5, t, g])?;
            c_shape_outline(w, h, t, g)
        }
        ProfileDef::TShape {
            depth,
            flange_width,
            web_thickness,
            flange_thickness,
            ..
        } => {
            let h = depth * lf;
            let w = flange_width * lf;
            let tw = web_thickness * lf;
            let tf = flange_thickness * lf;
            require_positive_dims(id, &[w * 0.5, h * 0.5, tw, tf])?;
            t_shape_outline(w, h, tw, tf)
        }
        ProfileDef::ZShape {
            depth,
            flange_width,
            web_thickness,
            flange_thickness,
            ..
        } => z_shape_outline(
            depth * lf,
            flange_width * lf,
            web_thickness * lf,
            flange_thickness * lf,
        ),
        ProfileDef::ArbitraryClosed { outer_curve } => {
            arbitrary_closed(model, id, *outer_curve, &[], settings, reporter)?
        }
        ProfileDef::ArbitraryClosedWithVoids {
            outer_curve,
            inner_curves,
        } => arbitrary_closed(model, id, *outer_curve, inner_curves, settings, reporter)?,
        ProfileDef::ArbitraryOpen { curve } => {
            reporter.info(
                "Open profile used as a boundary, emitting its polyline",
                Some(id),
                COMPONENT,
            );
            Profile2D::new(open_polyline(model, *curve, settings, reporter)?)
        }
        ProfileDef::CenterLine { curve, thickness } => {
            center_line_band(model, id, *curve, thickness * lf, settings, reporter)?
        }
        ProfileDef::Composite { profiles } => {
            composite_profile(model, id, profiles, settings, reporter)?
        }
        ProfileDef::Derived {
            parent_profile,
            operator,
        } => {
            let mut parent = convert_profile(model, *parent_profile, settings, reporter)?;
            let op = transform_operator_matrix(model, *operator, settings)?;
            parent.transform(&planar_matrix(&op.matrix));
            parent
        }
    };

    if let Some(position) = def.position() {
        let matrix = placement_matrix_2d(model, position, settings)?;
        result.transform(&matrix);
    }

    Ok(result)
}

fn require_positive_dims(id: EntityId, dims: &[f64]) -> Result<()> {
    if dims.iter().any(|d| *d < EPSILON) {
        return Err(Error::data_integrity(
            id,
            "profile dimension is zero or negative",
        ));
    }
    Ok(())
}

fn rectangle_hollow(
    id: EntityId,
    x_dim: f64,
    y_dim: f64,
    wall_thickness: f64,
) -> Result<Profile2D> {
    require_positive_dims(id, &[x_dim, y_dim, wall_thickness])?;
    let inner_x = x_dim * 0.5 - wall_thickness;
    let inner_y = y_dim * 0.5 - wall_thickness;
    if inner_x < EPSILON || inner_y < EPSILON {
        return Err(Error::data_integrity(
            id,
            "wall thickness exceeds the rectangle half dimensions",
        ));
    }

    let mut profile = create_rectangle(x_dim, y_dim);
    // Hole winds clockwise, opposite to the outer boundary
    profile.add_hole(vec![
        Point2::new(-inner_x, -inner_y),
        Point2::new(-inner_x, inner_y),
        Point2::new(inner_x, inner_y),
        Point2::new(inner_x, -inner_y),
    ]);
    Ok(profile)
}

fn rounded_rectangle(
    x_dim: f64,
    y_dim: f64,
    rounding_radius: f64,
    settings: &GeometrySettings,
) -> Profile2D {
    let radius = rounding_radius.min(x_dim * 0.5).min(y_dim * 0.5);
    if radius < EPSILON {
        return create_rectangle(x_dim, y_dim);
    }

    let arc_x = x_dim * 0.5 - radius;
    let arc_y = y_dim * 0.5 - radius;
    let segments = settings.arc_segments(FRAC_PI_2);

    // Corner arcs walk counter-clockwise starting at the right edge
    let corners = [
        (arc_x, arc_y, 0.0),
        (-arc_x, arc_y, FRAC_PI_2),
        (-arc_x, -arc_y, 2.0 * FRAC_PI_2),
        (arc_x, -arc_y, 3.0 * FRAC_PI_2),
    ];

    let mut outline: Vec<Point2<f64>> = Vec::with_capacity(4 * (segments + 1));
    for (center_x, center_y, start) in corners {
        for i in 0..=segments {
            let angle = start + FRAC_PI_2 * i as f64 / segments as f64;
            let point = Point2::new(
                center_x + radius * angle.cos(),
                center_y + radius * angle.sin(),
            );
            let duplicate = outline
                .last()
                .map_or(false, |last| (point - last).norm_squared() < 1e-18);
            if !duplicate {
                outline.push(point);
            }
        }
    }
    // Adjacent arcs meet exactly when the radius swallows a whole side
    if outline.len() > 2 {
        let first = outline[0];
        let last = outline[outline.len() - 1];
        if (first - last).norm_squared() < 1e-18 {
            outline.pop();
        }
    }

    Profile2D::new(outline)
}

fn ellipse_outline(semi_axis1: f64, semi_axis2: f64, segments: usize) -> Profile2D {
    let segments = segments.max(3);
    let mut outline = Vec::with_capacity(segments);
    for i in 0..segments {
        let angle = TAU * i as f64 / segments as f64;
        outline.push(Point2::new(
            semi_axis1 * angle.cos(),
            semi_axis2 * angle.sin(),
        ));
    }
    Profile2D::new(outline)
}

fn trapezium_outline(
    bottom_x_dim: f64,
    top_x_dim: f64,
    y_dim: f64,
    top_x_offset: f64,
) -> Profile2D {
    Profile2D::new(vec![
        Point2::new(-bottom_x_dim * 0.5, -y_dim * 0.5),
        Point2::new(bottom_x_dim * 0.5, -y_dim * 0.5),
        Point2::new(-bottom_x_dim * 0.5 + top_x_offset + top_x_dim, y_dim * 0.5),
        Point2::new(-bottom_x_dim * 0.5 + top_x_offset, y_dim * 0.5),
    ])
}

/// I outline from one quarter, mirrored across both axes
fn i_shape_outline(width: f64, depth: f64, web_thickness: f64, flange_thickness: f64) -> Profile2D {
    let mut outline = vec![
        Point2::new(width * 0.5, -depth * 0.5),
        Point2::new(width * 0.5, -depth * 0.5 + flange_thickness),
        Point2::new(web_thickness * 0.5, -depth * 0.5 + flange_thickness),
    ];
    mirror_copy_reversed(&mut outline, false, true);
    mirror_copy_reversed(&mut outline, true, false);
    Profile2D::new(outline)
}

fn l_shape_outline(width: f64, depth: f64, thickness: f64) -> Profile2D {
    Profile2D::new(vec![
        Point2::new(-width * 0.5, -depth * 0.5),
        Point2::new(width * 0.5, -depth * 0.5),
        Point2::new(width * 0.5, -depth * 0.5 + thickness),
        Point2::new(-width * 0.5 + thickness, -depth * 0.5 + thickness),
        Point2::new(-width * 0.5 + thickness, depth * 0.5),
        Point2::new(-width * 0.5, depth * 0.5),
    ])
}

/// U outline from the lower half, mirrored across the x axis
fn u_shape_outline(
    flange_width: f64,
    depth: f64,
    web_thickness: f64,
    flange_thickness: f64,
) -> Profile2D {
    let mut outline = vec![
        Point2::new(-flange_width * 0.5, -depth * 0.5),
        Point2::new(flange_width * 0.5, -depth * 0.5),
        Point2::new(flange_width * 0.5, -depth * 0.5 + flange_thickness),
        Point2::new(
            -flange_width * 0.5 + web_thickness,
            -depth * 0.5 + flange_thickness,
        ),
    ];
    mirror_copy_reversed(&mut outline, false, true);
    Profile2D::new(outline)
}

fn c_shape_outline(width: f64, depth: f64, wall_thickness: f64, girth: f64) -> Profile2D {
    let w = width * 0.5;
    let h = depth * 0.5;
    let t = wall_thickness;
    let mut outline = vec![
        Point2::new(-w, -h),
        Point2::new(w, -h),
        Point2::new(w, -h + girth),
        Point2::new(w - t, -h + girth),
        Point2::new(w - t, -h + t),
        Point2::new(-w + t, -h + t),
    ];
    mirror_copy_reversed(&mut outline, false, true);
    Profile2D::new(outline)
}

/// T outline built on the web half thickness, mirrored across the y axis
fn t_shape_outline(
    flange_width: f64,
    depth: f64,
    web_thickness: f64,
    flange_thickness: f64,
) -> Profile2D {
    let half_web = web_thickness * 0.5;
    let mut outline = vec![
        Point2::new(-flange_width * 0.5, depth * 0.5),
        Point2::new(-flange_width * 0.5, depth * 0.5 - flange_thickness),
        Point2::new(-half_web, depth * 0.5 - flange_thickness),
        Point2::new(-half_web, -depth * 0.5),
    ];
    mirror_copy_reversed(&mut outline, true, false);
    Profile2D::new(outline)
}

/// Z outline from the lower half, continued by a half-turn copy
fn z_shape_outline(
    depth: f64,
    flange_width: f64,
    web_thickness: f64,
    flange_thickness: f64,
) -> Profile2D {
    let half_web = web_thickness * 0.5;
    let mut outline = vec![
        Point2::new(-half_web, -depth * 0.5),
        Point2::new(flange_width - half_web, -depth * 0.5),
        Point2::new(flange_width - half_web, -depth * 0.5 + flange_thickness),
        Point2::new(half_web, -depth * 0.5 + flange_thickness),
    ];
    point_mirror_copy(&mut outline);
    Profile2D::new(outline)
}

/// Append a mirrored copy of the outline in reverse order so the boundary
/// keeps running in one direction
fn mirror_copy_reversed(outline: &mut Vec<Point2<f64>>, flip_x: bool, flip_y: bool) {
    for i in (0..outline.len()).rev() {
        let p = outline[i];
        let x = if flip_x { -p.x } else { p.x };
        let y = if flip_y { -p.y } else { p.y };
        outline.push(Point2::new(x, y));
    }
}

/// Append a half-turn copy of the outline in forward order
fn point_mirror_copy(outline: &mut Vec<Point2<f64>>) {
    let count = outline.len();
    for i in 0..count {
        let p = outline[i];
        outline.push(Point2::new(-p.x, -p.y));
    }
}

fn arbitrary_closed(
    model: &Model,
    id: EntityId,
    outer_curve: EntityId,
    inner_curves: &[EntityId],
    settings: &GeometrySettings,
    reporter: &ReporterHandle,
) -> Result<Profile2D> {
    let contour = curve_to_contour_2d(model, outer_curve, settings, reporter)?;
    if contour.len() < 3 {
        reporter.minor_warning(
            "Outer boundary resolves to fewer than 3 points",
            Some(id),
            COMPONENT,
        );
    }
    let mut profile = Profile2D::new(bool2d::ensure_ccw(&contour));

    for &inner in inner_curves {
        let hole = match curve_to_contour_2d(model, inner, settings, reporter) {
            Ok(points) => points,
            Err(error) => {
                if error.is_fatal() {
                    return Err(error);
                }
                reporter.minor_warning(
                    format!("Skipping inner boundary that failed to convert: {error}"),
                    Some(id),
                    COMPONENT,
                );
                continue;
            }
        };
        if !bool2d::is_valid_contour(&hole) {
            reporter.minor_warning("Skipping degenerate inner boundary", Some(inner), COMPONENT);
            continue;
        }
        if !bool2d::contour_inside_contour(&hole, &profile.outer) {
            reporter.minor_warning(
                "Skipping inner boundary outside the outer boundary",
                Some(inner),
                COMPONENT,
            );
            continue;
        }
        profile.add_hole(bool2d::ensure_cw(&hole));
    }

    Ok(profile)
}

fn open_polyline(
    model: &Model,
    curve: EntityId,
    settings: &GeometrySettings,
    reporter: &ReporterHandle,
) -> Result<Vec<Point2<f64>>> {
    let wire = convert_curve(model, curve, settings, reporter)?;
    Ok(sample_wire(&wire, settings)
        .into_iter()
        .map(|p| Point2::new(p.x, p.y))
        .collect())
}

/// Thicken a center line into a closed band of `thickness`
fn center_line_band(
    model: &Model,
    id: EntityId,
    curve: EntityId,
    thickness: f64,
    settings: &GeometrySettings,
    reporter: &ReporterHandle,
) -> Result<Profile2D> {
    let path = open_polyline(model, curve, settings, reporter)?;
    if path.len() < 2 {
        reporter.minor_warning(
            "Center line resolves to fewer than 2 points",
            Some(id),
            COMPONENT,
        );
        return Ok(Profile2D::new(Vec::new()));
    }

    let half = thickness * 0.5;
    let mut left = Vec::with_capacity(path.len());
    let mut right = Vec::with_capacity(path.len());
    for i in 0..path.len() {
        // Central difference doubles as the bisecting direction at joints
        let before = if i == 0 {
            path[0] + (path[0] - path[1])
        } else {
            path[i - 1]
        };
        let after = if i + 1 == path.len() {
            path[i] + (path[i] - path[i - 1])
        } else {
            path[i + 1]
        };
        let tangent = (after - before)
            .try_normalize(1e-12)
            .unwrap_or_else(Vector2::x);
        let normal = Vector2::new(-tangent.y, tangent.x);
        left.push(path[i] + normal * half);
        right.push(path[i] - normal * half);
    }

    right.reverse();
    left.extend(right);
    Ok(Profile2D::new(bool2d::ensure_ccw(&left)))
}

fn composite_profile(
    model: &Model,
    id: EntityId,
    members: &[EntityId],
    settings: &GeometrySettings,
    reporter: &ReporterHandle,
) -> Result<Profile2D> {
    let mut parts = Vec::with_capacity(members.len());
    for &member in members {
        match convert_profile(model, member, settings, reporter) {
            Ok(part) if !part.is_empty() => parts.push(part),
            Ok(_) => {
                reporter.minor_warning("Skipping empty composite member", Some(member), COMPONENT);
            }
            Err(error) => {
                if error.is_fatal() {
                    return Err(error);
                }
                reporter.minor_warning(
                    format!("Skipping composite member that failed to convert: {error}"),
                    Some(member),
                    COMPONENT,
                );
            }
        }
    }

    let mut merged = bool2d::merge_profiles(&parts)?;
    match merged.len() {
        0 => Err(Error::data_integrity(
            id,
            "composite profile has no usable parts",
        )),
        1 => Ok(merged.remove(0)),
        count => {
            reporter.minor_warning(
                format!("Composite profile parts are disjoint, keeping the largest of {count}"),
                Some(id),
                COMPONENT,
            );
            Ok(merged.remove(0))
        }
    }
}

/// Collapse an operator matrix onto the xy plane
fn planar_matrix(matrix: &Matrix4<f64>) -> Matrix3<f64> {
    let mut flat = Matrix3::identity();
    flat[(0, 0)] = matrix[(0, 0)];
    flat[(0, 1)] = matrix[(0, 1)];
    flat[(0, 2)] = matrix[(0, 3)];
    flat[(1, 0)] = matrix[(1, 0)];
    flat[(1, 1)] = matrix[(1, 1)];
    flat[(1, 2)] = matrix[(1, 3)];
    flat
}
