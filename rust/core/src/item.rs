// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Representation items that are neither solids nor bare curves

use crate::model::EntityId;

/// Surface model given as a list of connected face sets
#[derive(Debug, Clone, PartialEq)]
pub struct FaceBasedSurfaceModel {
    pub face_sets: Vec<EntityId>,
}

/// Surface model given as a list of open or closed shells
#[derive(Debug, Clone, PartialEq)]
pub struct ShellBasedSurfaceModel {
    pub shells: Vec<EntityId>,
}

/// Element of a geometric set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometricSetElement {
    Point(EntityId),
    Curve(EntityId),
    Surface(EntityId),
}

impl GeometricSetElement {
    pub fn id(&self) -> EntityId {
        match self {
            GeometricSetElement::Point(id)
            | GeometricSetElement::Curve(id)
            | GeometricSetElement::Surface(id) => *id,
        }
    }
}

/// Unstructured collection of points, curves and surfaces
#[derive(Debug, Clone, PartialEq)]
pub struct GeometricSet {
    pub elements: Vec<GeometricSetElement>,
    /// Curve set subtype restricts elements to points and curves
    pub is_curve_set: bool,
}

/// Cross sections lofted along a spine curve
#[derive(Debug, Clone, PartialEq)]
pub struct SectionedSpine {
    pub spine_curve: EntityId,
    pub cross_sections: Vec<EntityId>,
    pub cross_section_positions: Vec<EntityId>,
}

/// Axis-aligned box given by its lower corner and extents
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub corner: EntityId,
    pub x_dim: f64,
    pub y_dim: f64,
    pub z_dim: f64,
}

/// Annotation text anchored by a placement
#[derive(Debug, Clone, PartialEq)]
pub struct TextLiteral {
    pub literal: String,
    pub placement: EntityId,
    pub path: String,
}

/// Filled annotation area with optional holes
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationFillArea {
    pub outer_boundary: EntityId,
    pub inner_boundaries: Vec<EntityId>,
}

/// Use of a representation map under a placement transform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappedItem {
    pub source: EntityId,
    pub target: EntityId,
}

/// Reusable representation with its own origin placement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepresentationMap {
    pub origin: EntityId,
    pub mapped_representation: EntityId,
}
