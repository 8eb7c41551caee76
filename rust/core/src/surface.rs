// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Surface entity definitions

use crate::model::EntityId;

/// Polymorphic surface entity
#[derive(Debug, Clone, PartialEq)]
pub enum Surface {
    /// Unbounded plane at an axis placement
    Plane { position: EntityId },
    CylindricalSurface { position: EntityId, radius: f64 },
    /// Plane bounded by an outer curve and hole curves
    CurveBoundedPlane {
        basis_surface: EntityId,
        outer_boundary: EntityId,
        inner_boundaries: Vec<EntityId>,
    },
    /// General surface bounded by boundary curve sets
    CurveBoundedSurface {
        basis_surface: EntityId,
        boundaries: Vec<EntityId>,
        implicit_outer: bool,
    },
    /// Basis surface restricted to a (u, v) parameter rectangle
    RectangularTrimmedSurface {
        basis_surface: EntityId,
        u1: f64,
        v1: f64,
        u2: f64,
        v2: f64,
        u_sense: bool,
        v_sense: bool,
    },
    SurfaceOfLinearExtrusion {
        swept_curve: EntityId,
        position: EntityId,
        extrusion_direction: EntityId,
        depth: f64,
    },
    SurfaceOfRevolution {
        swept_curve: EntityId,
        position: EntityId,
        axis: EntityId,
    },
    /// Control-point surface (conversion unimplemented downstream)
    BSplineSurface {
        u_degree: usize,
        v_degree: usize,
        control_points: Vec<Vec<EntityId>>,
    },
}
