// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity arena and polymorphic entity access
//!
//! The [`Model`] owns every entity of a parsed IFC file, keyed by the STEP
//! tag. Handles are plain integers so relationship traversal is a map
//! lookup, never a live back-pointer; cyclic structures in the input stay
//! representable and are broken by the converters' visited sets.

use crate::curve::Curve;
use crate::error::{Error, Result};
use crate::item::{
    AnnotationFillArea, BoundingBox, FaceBasedSurfaceModel, GeometricSet, MappedItem,
    RepresentationMap, SectionedSpine, ShellBasedSurfaceModel, TextLiteral,
};
use crate::placement::{ObjectPlacement, Placement, RepresentationContext, TransformOperator};
use crate::product::{Product, RelVoidsElement, Representation};
use crate::profile::ProfileDef;
use crate::solid::{BooleanResult, CsgPrimitive3D, HalfSpaceSolid, SolidModel};
use crate::style::{
    ColourRgb, PresentationLayerAssignment, PresentationStyleAssignment, StyledItem,
    SurfaceStyle, SurfaceStyleShading,
};
use crate::surface::Surface;
use crate::topology::TopologicalItem;
use crate::units::UnitContext;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::fmt;

/// Stable entity identity (the STEP tag)
///
/// Tags are signed: a negative tag marks an entity that was constructed
/// from malformed input and is rejected wherever identity matters (cache
/// keys, diagnostics).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityId(pub i64);

impl EntityId {
    /// Whether the tag is usable as a cache key / report id
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.0 >= 0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Cartesian point with 2 or 3 stored coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct CartesianPoint {
    pub coordinates: SmallVec<[f64; 3]>,
}

/// Direction with 2 or 3 stored ratios (not necessarily normalized)
#[derive(Debug, Clone, PartialEq)]
pub struct Direction {
    pub ratios: SmallVec<[f64; 3]>,
}

/// Vector: direction reference plus magnitude
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorDef {
    pub orientation: EntityId,
    pub magnitude: f64,
}

/// Every concrete entity kind the converters dispatch on
///
/// One variant per schema family keeps the dispatch exhaustive; the
/// families themselves are nested sum types (see the per-domain modules).
#[derive(Debug, Clone)]
pub enum Entity {
    Point(CartesianPoint),
    Direction(Direction),
    Vector(VectorDef),
    Curve(Curve),
    Surface(Surface),
    Profile(ProfileDef),
    Placement(Placement),
    ObjectPlacement(ObjectPlacement),
    TransformOperator(TransformOperator),
    Context(RepresentationContext),
    Solid(SolidModel),
    BooleanResult(BooleanResult),
    CsgPrimitive(CsgPrimitive3D),
    HalfSpace(HalfSpaceSolid),
    Topology(TopologicalItem),
    FaceBasedSurfaceModel(FaceBasedSurfaceModel),
    ShellBasedSurfaceModel(ShellBasedSurfaceModel),
    GeometricSet(GeometricSet),
    SectionedSpine(SectionedSpine),
    BoundingBox(BoundingBox),
    TextLiteral(TextLiteral),
    AnnotationFillArea(AnnotationFillArea),
    MappedItem(MappedItem),
    RepresentationMap(RepresentationMap),
    StyledItem(StyledItem),
    StyleAssignment(PresentationStyleAssignment),
    SurfaceStyle(SurfaceStyle),
    SurfaceStyleShading(SurfaceStyleShading),
    Colour(ColourRgb),
    LayerAssignment(PresentationLayerAssignment),
    Representation(Representation),
    Product(Product),
    RelVoids(RelVoidsElement),
}

impl Entity {
    /// Short kind name used in kind-mismatch errors
    pub fn kind(&self) -> &'static str {
        match self {
            Entity::Point(_) => "cartesian point",
            Entity::Direction(_) => "direction",
            Entity::Vector(_) => "vector",
            Entity::Curve(_) => "curve",
            Entity::Surface(_) => "surface",
            Entity::Profile(_) => "profile definition",
            Entity::Placement(_) => "axis placement",
            Entity::ObjectPlacement(_) => "object placement",
            Entity::TransformOperator(_) => "transformation operator",
            Entity::Context(_) => "representation context",
            Entity::Solid(_) => "solid model",
            Entity::BooleanResult(_) => "boolean result",
            Entity::CsgPrimitive(_) => "csg primitive",
            Entity::HalfSpace(_) => "half space solid",
            Entity::Topology(_) => "topological item",
            Entity::FaceBasedSurfaceModel(_) => "face based surface model",
            Entity::ShellBasedSurfaceModel(_) => "shell based surface model",
            Entity::GeometricSet(_) => "geometric set",
            Entity::SectionedSpine(_) => "sectioned spine",
            Entity::BoundingBox(_) => "bounding box",
            Entity::TextLiteral(_) => "text literal",
            Entity::AnnotationFillArea(_) => "annotation fill area",
            Entity::MappedItem(_) => "mapped item",
            Entity::RepresentationMap(_) => "representation map",
            Entity::StyledItem(_) => "styled item",
            Entity::StyleAssignment(_) => "presentation style assignment",
            Entity::SurfaceStyle(_) => "surface style",
            Entity::SurfaceStyleShading(_) => "surface style shading",
            Entity::Colour(_) => "colour",
            Entity::LayerAssignment(_) => "layer assignment",
            Entity::Representation(_) => "representation",
            Entity::Product(_) => "product",
            Entity::RelVoids(_) => "voiding relationship",
        }
    }
}

/// Arena of entities plus the model's unit context
#[derive(Debug, Clone, Default)]
pub struct Model {
    entities: FxHashMap<EntityId, Entity>,
    units: UnitContext,
    next_tag: i64,
}

macro_rules! typed_accessor {
    ($name:ident, $variant:ident, $ty:ty, $expected:expr) => {
        pub fn $name(&self, id: EntityId) -> Result<&$ty> {
            match self.entity(id)? {
                Entity::$variant(inner) => Ok(inner),
                other => Err(Error::KindMismatch {
                    id,
                    expected: $expected,
                    found: other.kind(),
                }),
            }
        }
    };
}

impl Model {
    /// Create an empty model with default (meters/radians) units
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty model with an explicit unit context
    pub fn with_units(units: UnitContext) -> Self {
        Self {
            units,
            ..Self::default()
        }
    }

    /// Unit conversion context
    #[inline]
    pub fn units(&self) -> &UnitContext {
        &self.units
    }

    /// Mutable unit conversion context
    pub fn units_mut(&mut self) -> &mut UnitContext {
        &mut self.units
    }

    /// Number of entities in the arena
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the arena holds no entities
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Insert an entity under a fresh tag
    pub fn insert(&mut self, entity: Entity) -> EntityId {
        let id = EntityId(self.next_tag);
        self.next_tag += 1;
        self.entities.insert(id, entity);
        id
    }

    /// Insert an entity under an explicit tag (importer path)
    ///
    /// Negative tags are stored as-is; converters reject them where
    /// identity matters, which is the malformed-model signal.
    pub fn insert_with_tag(&mut self, tag: i64, entity: Entity) -> EntityId {
        let id = EntityId(tag);
        self.entities.insert(id, entity);
        if tag >= self.next_tag {
            self.next_tag = tag + 1;
        }
        id
    }

    /// Look up any entity
    pub fn entity(&self, id: EntityId) -> Result<&Entity> {
        self.entities.get(&id).ok_or(Error::MissingEntity(id))
    }

    /// Whether an entity exists under the tag
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Iterate over all `(id, entity)` pairs (unordered)
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities.iter().map(|(id, e)| (*id, e))
    }

    /// All product entities, ordered by tag for deterministic output
    pub fn products(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self
            .entities
            .iter()
            .filter_map(|(id, e)| matches!(e, Entity::Product(_)).then_some(*id))
            .collect();
        ids.sort_unstable();
        ids
    }

    typed_accessor!(point, Point, CartesianPoint, "cartesian point");
    typed_accessor!(direction, Direction, Direction, "direction");
    typed_accessor!(vector, Vector, VectorDef, "vector");
    typed_accessor!(curve, Curve, Curve, "curve");
    typed_accessor!(surface, Surface, Surface, "surface");
    typed_accessor!(profile, Profile, ProfileDef, "profile definition");
    typed_accessor!(placement, Placement, Placement, "axis placement");
    typed_accessor!(
        object_placement,
        ObjectPlacement,
        ObjectPlacement,
        "object placement"
    );
    typed_accessor!(
        transform_operator,
        TransformOperator,
        TransformOperator,
        "transformation operator"
    );
    typed_accessor!(context, Context, RepresentationContext, "representation context");
    typed_accessor!(solid, Solid, SolidModel, "solid model");
    typed_accessor!(boolean_result, BooleanResult, BooleanResult, "boolean result");
    typed_accessor!(csg_primitive, CsgPrimitive, CsgPrimitive3D, "csg primitive");
    typed_accessor!(half_space, HalfSpace, HalfSpaceSolid, "half space solid");
    typed_accessor!(topology, Topology, TopologicalItem, "topological item");
    typed_accessor!(
        representation,
        Representation,
        Representation,
        "representation"
    );
    typed_accessor!(
        representation_map,
        RepresentationMap,
        RepresentationMap,
        "representation map"
    );
    typed_accessor!(product, Product, Product, "product");
    typed_accessor!(rel_voids, RelVoids, RelVoidsElement, "voiding relationship");
    typed_accessor!(styled_item, StyledItem, StyledItem, "styled item");
    typed_accessor!(surface_style, SurfaceStyle, SurfaceStyle, "surface style");
    typed_accessor!(
        surface_style_shading,
        SurfaceStyleShading,
        SurfaceStyleShading,
        "surface style shading"
    );
    typed_accessor!(colour, Colour, ColourRgb, "colour");

    /// Convenience: insert a 2D cartesian point
    pub fn add_point_2d(&mut self, x: f64, y: f64) -> EntityId {
        self.insert(Entity::Point(CartesianPoint {
            coordinates: SmallVec::from_slice(&[x, y]),
        }))
    }

    /// Convenience: insert a 3D cartesian point
    pub fn add_point(&mut self, x: f64, y: f64, z: f64) -> EntityId {
        self.insert(Entity::Point(CartesianPoint {
            coordinates: SmallVec::from_slice(&[x, y, z]),
        }))
    }

    /// Convenience: insert a 2D direction
    pub fn add_direction_2d(&mut self, x: f64, y: f64) -> EntityId {
        self.insert(Entity::Direction(Direction {
            ratios: SmallVec::from_slice(&[x, y]),
        }))
    }

    /// Convenience: insert a 3D direction
    pub fn add_direction(&mut self, x: f64, y: f64, z: f64) -> EntityId {
        self.insert(Entity::Direction(Direction {
            ratios: SmallVec::from_slice(&[x, y, z]),
        }))
    }
}
