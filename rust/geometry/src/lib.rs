// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # IFC-Brep Geometry
//!
//! Converts the typed entity graph of `ifc-brep-core` into boundary
//! representation shapes and display meshes. Curves become sampled
//! wires, profiles become 2D contours with holes, swept solids and
//! face sets become sewn b-rep solids, and boolean results are
//! evaluated on triangle meshes with `csgrs`.
//!
//! ## Overview
//!
//! - **Best effort**: malformed entities degrade to reported
//!   diagnostics, conversion of sibling items continues
//! - **Session caches**: profiles, appearances and representation maps
//!   resolve once per converter and are shared across products
//! - **Optional parallelism**: independent products convert on the
//!   rayon pool when [`GeometrySettings::concurrent`] is set
//!
//! ## Quick Start
//!
//! ```rust
//! use ifc_brep_core::{Entity, Model, Product, ProfileDef, Representation, SolidModel};
//! use ifc_brep_geometry::{GeometryConverter, GeometrySettings};
//!
//! let mut model = Model::new();
//! let profile = model.insert(Entity::Profile(ProfileDef::Rectangle {
//!     position: None,
//!     x_dim: 1.0,
//!     y_dim: 2.0,
//! }));
//! let direction = model.add_direction(0.0, 0.0, 1.0);
//! let solid = model.insert(Entity::Solid(SolidModel::ExtrudedAreaSolid {
//!     swept_area: profile,
//!     position: None,
//!     extruded_direction: direction,
//!     depth: 3.0,
//! }));
//! let representation = model.insert(Entity::Representation(Representation {
//!     context: None,
//!     identifier: Some("Body".to_string()),
//!     representation_type: Some("SweptSolid".to_string()),
//!     items: vec![solid],
//! }));
//! let product = model.insert(Entity::Product(Product {
//!     name: Some("Beam".to_string()),
//!     object_placement: None,
//!     representations: vec![representation],
//!     openings: Vec::new(),
//! }));
//!
//! let converter = GeometryConverter::new(&model);
//! let result = converter.convert_model().unwrap();
//! let mesh = result.product(product).unwrap().to_mesh(&GeometrySettings::default());
//! assert!((mesh.signed_volume() - 6.0).abs() < 1e-9);
//! ```

pub mod bool2d;
pub mod brep;
pub mod converter;
pub mod csg;
pub mod curve;
pub mod diagnostics;
pub mod error;
pub mod extrusion;
pub mod face;
pub mod geom_utils;
pub mod mesh;
pub mod placement;
pub mod points;
pub mod profile;
pub mod profiles;
pub mod representation;
pub mod settings;
pub mod shape_data;
pub mod solid;
pub mod spline;
pub mod styles;
pub mod triangulation;

// Re-export nalgebra types for convenience
pub use nalgebra::{Matrix3, Matrix4, Point2, Point3, Vector2, Vector3};

pub use brep::{BrepFace, Edge, EdgeGeometry, Shape, Shell, Solid, Wire};
pub use converter::GeometryConverter;
pub use diagnostics::{
    CollectingReporter, Diagnostic, NullReporter, Reporter, ReporterHandle, Severity,
};
pub use error::{Error, Result};
pub use mesh::Mesh;
pub use profile::Profile2D;
pub use profiles::ProfileCache;
pub use representation::{MapCache, RepresentationConverter};
pub use settings::GeometrySettings;
pub use shape_data::{
    ConversionResult, ItemShapeData, ProductShapeData, RepresentationData, TextPlacement,
};
pub use styles::{Appearance, LayerIndex, StyleCache, StyledItemIndex};
