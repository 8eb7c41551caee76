// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Placement, transformation operator and context entities

use crate::model::EntityId;

/// Axis placement: origin plus optional local frame directions
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// Origin + optional reference (x) direction in the plane
    Axis2Placement2D {
        location: EntityId,
        ref_direction: Option<EntityId>,
    },
    /// Origin + optional z axis + optional reference (x) direction
    Axis2Placement3D {
        location: EntityId,
        axis: Option<EntityId>,
        ref_direction: Option<EntityId>,
    },
    /// Origin + single axis (revolution axes)
    Axis1Placement {
        location: EntityId,
        axis: Option<EntityId>,
    },
}

/// Placement of a product in the spatial tree
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ObjectPlacement {
    /// Placement relative to a parent object placement (or absolute when
    /// no parent is given)
    Local {
        placement_rel_to: Option<EntityId>,
        relative_placement: EntityId,
    },
    /// Placement on a virtual grid (conversion unimplemented downstream)
    Grid { placement_location: EntityId },
}

/// Cartesian transformation operator (2D or 3D, uniform or non-uniform)
///
/// `scale2`/`scale3` only apply to the non-uniform subtypes; when they
/// differ from `scale` the resolved matrix is not angle preserving and
/// downstream shape application must take the general path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformOperator {
    /// Coordinate space dimension: 2 or 3
    pub dimensions: u8,
    pub axis1: Option<EntityId>,
    pub axis2: Option<EntityId>,
    pub axis3: Option<EntityId>,
    pub local_origin: Option<EntityId>,
    pub scale: Option<f64>,
    pub scale2: Option<f64>,
    pub scale3: Option<f64>,
}

/// Geometric representation context (possibly a sub-context)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepresentationContext {
    /// Parent context for sub-contexts
    pub parent_context: Option<EntityId>,
    /// World coordinate system placement
    pub world_coordinate_system: Option<EntityId>,
    pub coordinate_space_dimension: u8,
    pub precision: Option<f64>,
}
