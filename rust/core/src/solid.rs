// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Solid model, boolean result and CSG primitive entities

use crate::model::EntityId;

/// Polymorphic solid model entity
#[derive(Debug, Clone, PartialEq)]
pub enum SolidModel {
    /// Profile swept linearly along a direction
    ExtrudedAreaSolid {
        swept_area: EntityId,
        position: Option<EntityId>,
        extruded_direction: EntityId,
        depth: f64,
    },
    /// Profile revolved about an axis placement
    RevolvedAreaSolid {
        swept_area: EntityId,
        position: Option<EntityId>,
        axis: EntityId,
        /// Raw angle value; unit resolution happens downstream
        angle: f64,
    },
    FixedReferenceSweptAreaSolid {
        swept_area: EntityId,
        position: Option<EntityId>,
        directrix: EntityId,
        fixed_reference: EntityId,
    },
    SurfaceCurveSweptAreaSolid {
        swept_area: EntityId,
        position: Option<EntityId>,
        directrix: EntityId,
        reference_surface: EntityId,
    },
    /// Disk (with optional concentric hole) swept along a spine curve
    SweptDiskSolid {
        directrix: EntityId,
        radius: f64,
        inner_radius: Option<f64>,
    },
    /// Closed shell boundary representation
    FacetedBrep {
        outer: EntityId,
        voids: Vec<EntityId>,
    },
    /// B-rep with advanced (freeform) faces; treated like a faceted brep
    AdvancedBrep {
        outer: EntityId,
        voids: Vec<EntityId>,
    },
    /// Root of a CSG tree
    CsgSolid { tree_root: EntityId },
}

/// Boolean operator of a boolean result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOperator {
    Union,
    Intersection,
    Difference,
}

/// Boolean combination of two operands
///
/// Operands select over solids, boolean results, CSG primitives and half
/// space solids; the model stores plain handles and the converter
/// dispatches on the resolved entity kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BooleanResult {
    pub operator: BooleanOperator,
    pub first_operand: EntityId,
    pub second_operand: EntityId,
}

/// Operand kinds a CSG tree node may resolve to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsgSelect {
    BooleanResult,
    Primitive,
    Solid,
    HalfSpace,
}

/// Analytic CSG primitives, each placed by a 3D axis placement
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CsgPrimitive3D {
    Block {
        position: EntityId,
        x_length: f64,
        y_length: f64,
        z_length: f64,
    },
    RectangularPyramid {
        position: EntityId,
        x_length: f64,
        y_length: f64,
        height: f64,
    },
    RightCircularCone {
        position: EntityId,
        height: f64,
        bottom_radius: f64,
    },
    RightCircularCylinder {
        position: EntityId,
        height: f64,
        radius: f64,
    },
    Sphere {
        position: EntityId,
        radius: f64,
    },
}

/// Bounding variant of a half space solid
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HalfSpaceVariant {
    /// Unbounded half space
    Plain,
    /// Half space bounded by a box enclosure
    Boxed { enclosure: EntityId },
    /// Half space restricted to an extruded polygonal footprint
    Polygonal {
        position: EntityId,
        boundary: EntityId,
    },
}

/// Half space: one side of a base surface
///
/// `agreement_flag == true` keeps the material on the side the surface
/// normal points away from (the subset where the normal points outward
/// from the material).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HalfSpaceSolid {
    pub base_surface: EntityId,
    pub agreement_flag: bool,
    pub variant: HalfSpaceVariant,
}
