// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # IFC-Brep Core Model
//!
//! Typed in-memory IFC entity graph consumed by the geometry conversion
//! crate. Entities live in an arena keyed by their STEP tag and reference
//! each other through [`EntityId`] handles; every polymorphic schema family
//! (curves, surfaces, profiles, placements, solids, topology) is a sum type
//! so converters can dispatch with exhaustive `match`.
//!
//! ## Overview
//!
//! - **Arena storage**: `Model` owns all entities, handles stay stable
//! - **Typed access**: `model.curve(id)` style accessors with
//!   kind-mismatch errors instead of downcasts
//! - **Units**: length/angle conversion context with an explicit
//!   "angular unit undefined" state
//! - **Builder API**: `insert`/`add_*` helpers for constructing graphs
//!   programmatically (tests, importers)
//!
//! ## Quick Start
//!
//! ```rust
//! use ifc_brep_core::{Curve, Entity, Model};
//!
//! let mut model = Model::new();
//! let center = model.add_point_2d(0.0, 0.0);
//! let placement = model.insert(Entity::Placement(
//!     ifc_brep_core::Placement::Axis2Placement2D {
//!         location: center,
//!         ref_direction: None,
//!     },
//! ));
//! let circle = model.insert(Entity::Curve(Curve::Circle {
//!     position: placement,
//!     radius: 2.0,
//! }));
//! assert!(model.curve(circle).is_ok());
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization support for handles and unit data

pub mod curve;
pub mod error;
pub mod item;
pub mod model;
pub mod placement;
pub mod product;
pub mod profile;
pub mod solid;
pub mod style;
pub mod surface;
pub mod topology;
pub mod units;

pub use curve::{BSplineCurve, CompositeCurveSegment, Curve, Transition, TrimmingSelect};
pub use error::{Error, Result};
pub use item::{
    AnnotationFillArea, BoundingBox, FaceBasedSurfaceModel, GeometricSet, GeometricSetElement,
    MappedItem, RepresentationMap, SectionedSpine, ShellBasedSurfaceModel, TextLiteral,
};
pub use model::{CartesianPoint, Direction, Entity, EntityId, Model, VectorDef};
pub use placement::{ObjectPlacement, Placement, RepresentationContext, TransformOperator};
pub use product::{Product, RelVoidsElement, Representation};
pub use profile::ProfileDef;
pub use solid::{
    BooleanOperator, BooleanResult, CsgPrimitive3D, CsgSelect, HalfSpaceSolid, HalfSpaceVariant,
    SolidModel,
};
pub use style::{
    ColourRgb, PresentationLayerAssignment, PresentationStyleAssignment, StyledItem, SurfaceSide,
    SurfaceStyle, SurfaceStyleShading,
};
pub use surface::Surface;
pub use topology::{TopologicalItem, VertexGeometry};
pub use units::{AngularUnit, UnitContext};
