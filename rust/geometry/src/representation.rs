// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Representation conversion
//!
//! Walks shape representations item by item and dispatches each item to
//! the matching converter. Items degrade individually: a failed item is
//! reported and leaves an empty entry while its siblings still convert.
//! Mapped items recurse into their source representation through a
//! shared cache, guarded against reference cycles.

use std::sync::{Arc, Mutex};

use ifc_brep_core::{
    Entity, EntityId, GeometricSet, GeometricSetElement, MappedItem, Model, TopologicalItem,
    VertexGeometry,
};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::brep::Shape;
use crate::csg::{mesh_difference, mesh_union};
use crate::curve::{convert_curve, convert_loop, convert_topological_path};
use crate::diagnostics::ReporterHandle;
use crate::error::{Error, Result};
use crate::face::{build_face_from_boundary_curves, convert_face_list, convert_surface, ShellClosure};
use crate::geom_utils::is_identity;
use crate::mesh::Mesh;
use crate::placement::{
    context_matrix, placement_matrix, resolve_object_placement, transform_operator_matrix,
};
use crate::points::resolve_point;
use crate::profiles::ProfileCache;
use crate::settings::GeometrySettings;
use crate::shape_data::{ItemShapeData, ProductShapeData, RepresentationData, TextPlacement};
use crate::solid::{
    convert_boolean_result, convert_csg_primitive, convert_half_space_solid,
    convert_sectioned_spine, convert_solid_model,
};
use crate::styles::{resolve_styled_item, Appearance, LayerIndex, StyleCache, StyledItemIndex};
use crate::Matrix4;

const COMPONENT: &str = "representation converter";

/// Cache of representation map conversions, keyed by the map tag.
///
/// A map reused by many products converts once; each use clones the
/// cached items and applies its own operator. Insert-only under a lock,
/// like the profile cache.
#[derive(Debug, Default)]
pub struct MapCache {
    entries: Mutex<FxHashMap<EntityId, Arc<RepresentationData>>>,
}

impl MapCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn get(&self, id: EntityId) -> Option<Arc<RepresentationData>> {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(&id).cloned())
    }

    fn insert(&self, id: EntityId, data: Arc<RepresentationData>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(id, data);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Borrowed bundle of everything item conversion needs
pub struct RepresentationConverter<'a> {
    pub model: &'a Model,
    pub settings: &'a GeometrySettings,
    pub reporter: &'a ReporterHandle,
    pub profiles: &'a ProfileCache,
    pub styles: &'a StyleCache,
    pub styled_items: &'a StyledItemIndex,
    pub layers: &'a LayerIndex,
    pub maps: &'a MapCache,
}

impl<'a> RepresentationConverter<'a> {
    /// Convert a product: all of its representations, then the resolved
    /// world transform (context coordinate system times the object
    /// placement chain) applied to every shape.
    pub fn convert_product(&self, id: EntityId) -> Result<ProductShapeData> {
        let product = self.model.product(id)?;
        let mut data = ProductShapeData::new(id);
        data.name = product.name.clone();

        let mut context = None;
        for &rep_id in &product.representations {
            let mut visited = FxHashSet::default();
            match self.convert_representation(rep_id, &mut visited) {
                Ok(representation) => {
                    if context.is_none() {
                        context = self
                            .model
                            .representation(rep_id)
                            .ok()
                            .and_then(|r| r.context);
                    }
                    data.representations.push(representation);
                }
                Err(error) if error.is_fatal() => return Err(error),
                Err(error) => self.reporter.error(
                    format!("Skipping representation that failed to convert: {error}"),
                    Some(rep_id),
                    COMPONENT,
                ),
            }
        }

        let matrix = self.product_transform(context, product.object_placement)?;
        data.placement = matrix;
        if !is_identity(&matrix, self.settings.epsilon) {
            for representation in &mut data.representations {
                representation.transform(&matrix);
            }
        }
        Ok(data)
    }

    /// Convert one shape representation. The visited set guards mapped
    /// item recursion and must be fresh per top-level call.
    pub fn convert_representation(
        &self,
        id: EntityId,
        visited: &mut FxHashSet<EntityId>,
    ) -> Result<RepresentationData> {
        let representation = self.model.representation(id)?;
        let mut data = RepresentationData::new(id);
        data.identifier = representation.identifier.clone();
        data.representation_type = representation.representation_type.clone();

        for &item_id in &representation.items {
            match self.convert_item(item_id, visited) {
                Ok(items) => data.items.extend(items),
                Err(error) if error.is_fatal() => return Err(error),
                Err(error) => {
                    self.reporter.error(
                        format!("Skipping representation item that failed to convert: {error}"),
                        Some(item_id),
                        COMPONENT,
                    );
                    data.items.push(ItemShapeData::new(item_id));
                }
            }
        }
        Ok(data)
    }

    /// Convert one representation item. A mapped item expands to the
    /// items of its source representation, every other kind yields a
    /// single entry.
    pub fn convert_item(
        &self,
        id: EntityId,
        visited: &mut FxHashSet<EntityId>,
    ) -> Result<Vec<ItemShapeData>> {
        match self.model.entity(id)? {
            Entity::MappedItem(mapped) => self.convert_mapped_item(id, *mapped, visited),
            entity => {
                let mut data = ItemShapeData::new(id);
                self.convert_geometric_item(id, entity, &mut data)?;
                self.attach_styles(id, &mut data);
                self.attach_layers(id, &mut data);
                Ok(vec![data])
            }
        }
    }

    fn convert_geometric_item(
        &self,
        id: EntityId,
        entity: &Entity,
        data: &mut ItemShapeData,
    ) -> Result<()> {
        match entity {
            Entity::Solid(_) => {
                let shape =
                    convert_solid_model(self.model, id, self.profiles, self.settings, self.reporter)?;
                data.add_shape(shape);
            }

            Entity::BooleanResult(_) => {
                let shape = convert_boolean_result(
                    self.model,
                    id,
                    self.profiles,
                    self.settings,
                    self.reporter,
                )?;
                data.add_shape(shape);
            }

            Entity::CsgPrimitive(_) => {
                data.add_shape(convert_csg_primitive(self.model, id, self.settings)?);
            }

            Entity::HalfSpace(_) => {
                let shape =
                    convert_half_space_solid(self.model, id, None, self.settings, self.reporter)?;
                data.add_shape(shape);
            }

            Entity::Curve(_) => {
                let wire = convert_curve(self.model, id, self.settings, self.reporter)?;
                data.add_shape(Shape::Wire(wire));
            }

            Entity::Surface(_) => {
                data.add_shape(convert_surface(self.model, id, self.settings, self.reporter)?);
            }

            Entity::Topology(item) => self.convert_topological_item(id, item, data)?,

            Entity::FaceBasedSurfaceModel(surface_model) => {
                for &face_set in &surface_model.face_sets {
                    self.convert_shell_entity(face_set, data)?;
                }
            }

            Entity::ShellBasedSurfaceModel(surface_model) => {
                for &shell in &surface_model.shells {
                    self.convert_shell_entity(shell, data)?;
                }
            }

            Entity::GeometricSet(set) => self.convert_geometric_set(set, data)?,

            Entity::SectionedSpine(_) => {
                let shape = convert_sectioned_spine(
                    self.model,
                    id,
                    self.profiles,
                    self.settings,
                    self.reporter,
                )?;
                data.add_shape(shape);
            }

            Entity::AnnotationFillArea(area) => {
                let face = build_face_from_boundary_curves(
                    self.model,
                    area.outer_boundary,
                    &area.inner_boundaries,
                    self.settings,
                    self.reporter,
                )?;
                data.add_shape(Shape::Face(face));
            }

            Entity::TextLiteral(text) => {
                if self.settings.render_text {
                    let placement = placement_matrix(self.model, text.placement, self.settings)?;
                    data.text.push(TextPlacement {
                        text: text.literal.clone(),
                        placement,
                    });
                }
            }

            Entity::Point(_) => {
                data.points.push(resolve_point(self.model, id, self.settings)?);
            }

            // Bounding boxes are display hints without shape geometry
            Entity::BoundingBox(_) => {}

            // Styled items are consumed by the style resolver
            Entity::StyledItem(_) => {}

            _ => return Err(Error::UnhandledRepresentation { entity: id }),
        }
        Ok(())
    }

    fn convert_topological_item(
        &self,
        id: EntityId,
        item: &TopologicalItem,
        data: &mut ItemShapeData,
    ) -> Result<()> {
        match item {
            TopologicalItem::ConnectedFaceSet { .. }
            | TopologicalItem::ClosedShell { .. }
            | TopologicalItem::OpenShell { .. } => self.convert_shell_entity(id, data),

            TopologicalItem::Face { .. } => {
                let shape = convert_face_list(
                    self.model,
                    &[id],
                    ShellClosure::Open,
                    id,
                    self.settings,
                    self.reporter,
                )?;
                data.add_shape(shape);
                Ok(())
            }

            TopologicalItem::FaceBound { bound, .. } => {
                let wire = convert_loop(self.model, *bound, self.settings, self.reporter)?;
                data.add_shape(Shape::Wire(wire));
                Ok(())
            }

            TopologicalItem::PolyLoop { .. }
            | TopologicalItem::EdgeLoop { .. }
            | TopologicalItem::VertexLoop { .. } => {
                let wire = convert_loop(self.model, id, self.settings, self.reporter)?;
                data.add_shape(Shape::Wire(wire));
                Ok(())
            }

            TopologicalItem::OrientedEdge { .. }
            | TopologicalItem::Edge { .. }
            | TopologicalItem::Path { .. } => {
                let wire = convert_topological_path(self.model, id, self.settings, self.reporter)?;
                data.add_shape(Shape::Wire(wire));
                Ok(())
            }

            TopologicalItem::Vertex(geometry) => {
                match geometry {
                    VertexGeometry::Point(point) => {
                        data.points
                            .push(resolve_point(self.model, *point, self.settings)?);
                    }
                    _ => self.reporter.info(
                        "vertex bound to a curve or surface is not evaluated",
                        Some(id),
                        COMPONENT,
                    ),
                }
                Ok(())
            }
        }
    }

    fn convert_shell_entity(&self, id: EntityId, data: &mut ItemShapeData) -> Result<()> {
        let item = self.model.topology(id)?;
        let Some(faces) = item.faces() else {
            return Err(Error::data_integrity(id, "expected a shell or face set"));
        };
        let closure = match item {
            TopologicalItem::ClosedShell { .. } => ShellClosure::Closed,
            TopologicalItem::OpenShell { .. } => ShellClosure::Open,
            _ => ShellClosure::Unknown,
        };
        let shape =
            convert_face_list(self.model, faces, closure, id, self.settings, self.reporter)?;
        data.add_shape(shape);
        Ok(())
    }

    fn convert_geometric_set(&self, set: &GeometricSet, data: &mut ItemShapeData) -> Result<()> {
        for element in &set.elements {
            match element {
                GeometricSetElement::Point(point) => {
                    self.reporter.info(
                        "points in a geometric set are not collected",
                        Some(*point),
                        COMPONENT,
                    );
                }

                GeometricSetElement::Curve(curve) => {
                    match convert_curve(self.model, *curve, self.settings, self.reporter) {
                        Ok(wire) => data.add_shape(Shape::Wire(wire)),
                        Err(error) if error.is_fatal() => return Err(error),
                        Err(error) => self.reporter.minor_warning(
                            format!("Skipping geometric set curve: {error}"),
                            Some(*curve),
                            COMPONENT,
                        ),
                    }
                }

                GeometricSetElement::Surface(surface) => {
                    if set.is_curve_set {
                        self.reporter.info(
                            "surface in a geometric curve set is ignored",
                            Some(*surface),
                            COMPONENT,
                        );
                        continue;
                    }
                    match convert_surface(self.model, *surface, self.settings, self.reporter) {
                        Ok(shape) => data.add_shape(shape),
                        Err(error) if error.is_fatal() => return Err(error),
                        Err(error) => self.reporter.minor_warning(
                            format!("Skipping geometric set surface: {error}"),
                            Some(*surface),
                            COMPONENT,
                        ),
                    }
                }
            }
        }
        Ok(())
    }

    fn convert_mapped_item(
        &self,
        id: EntityId,
        mapped: MappedItem,
        visited: &mut FxHashSet<EntityId>,
    ) -> Result<Vec<ItemShapeData>> {
        let map = *self.model.representation_map(mapped.source)?;

        let base = match self.maps.get(mapped.source) {
            Some(base) => base,
            None => {
                if !visited.insert(mapped.source) {
                    self.reporter.error(
                        format!("representation map {} is part of a reference cycle", mapped.source),
                        Some(id),
                        COMPONENT,
                    );
                    return Ok(Vec::new());
                }
                let converted =
                    self.convert_representation(map.mapped_representation, visited);
                visited.remove(&mapped.source);
                let converted = Arc::new(converted?);
                self.maps.insert(mapped.source, Arc::clone(&converted));
                converted
            }
        };

        let origin = placement_matrix(self.model, map.origin, self.settings)?;
        let operator = transform_operator_matrix(self.model, mapped.target, self.settings)?;
        let combined = operator.matrix * origin;

        let mut items = base.items.clone();
        if !is_identity(&combined, self.settings.epsilon) {
            for item in &mut items {
                if operator.is_non_uniform {
                    item.transform_general(&combined, self.settings);
                } else {
                    item.transform(&combined);
                }
            }
        }

        // Styles on the map use override whatever the source items carry
        let overrides = self.resolve_item_appearances(id);
        if !overrides.is_empty() {
            for item in &mut items {
                item.appearances = overrides.clone();
            }
        }
        if self.settings.process_layers {
            for item in &mut items {
                let entity = item.entity;
                self.attach_layers(entity, item);
                self.attach_layers(id, item);
            }
        }
        Ok(items)
    }

    fn resolve_item_appearances(&self, id: EntityId) -> Vec<Arc<Appearance>> {
        let mut appearances: Vec<Arc<Appearance>> = Vec::new();
        if !self.settings.process_styles {
            return appearances;
        }
        for &styled in self.styled_items.styles_for(id) {
            match resolve_styled_item(self.model, styled, self.styles, self.reporter) {
                Ok(resolved) => {
                    for appearance in resolved {
                        if !appearances.iter().any(|known| known.entity == appearance.entity) {
                            appearances.push(appearance);
                        }
                    }
                }
                Err(error) => self.reporter.info(
                    format!("Skipping styled item that failed to resolve: {error}"),
                    Some(styled),
                    COMPONENT,
                ),
            }
        }
        appearances
    }

    fn attach_styles(&self, id: EntityId, data: &mut ItemShapeData) {
        for appearance in self.resolve_item_appearances(id) {
            if !data.appearances.iter().any(|known| known.entity == appearance.entity) {
                data.appearances.push(appearance);
            }
        }
    }

    fn attach_layers(&self, id: EntityId, data: &mut ItemShapeData) {
        if !self.settings.process_layers {
            return;
        }
        for layer in self.layers.layers_for(id) {
            if !data.layers.contains(layer) {
                data.layers.push(layer.clone());
            }
        }
    }

    fn product_transform(
        &self,
        context: Option<EntityId>,
        placement: Option<EntityId>,
    ) -> Result<Matrix4<f64>> {
        let mut matrix = Matrix4::identity();
        if let Some(context_id) = context {
            match context_matrix(self.model, context_id, self.settings) {
                Ok(world) => matrix = world,
                Err(error) if error.is_fatal() => return Err(error),
                Err(error) => self.reporter.error(
                    format!("Representation context failed to resolve: {error}"),
                    Some(context_id),
                    COMPONENT,
                ),
            }
        }
        if let Some(placement_id) = placement {
            let mut visited = FxHashSet::default();
            match resolve_object_placement(
                self.model,
                placement_id,
                self.settings,
                self.reporter,
                &mut visited,
            ) {
                Ok(local) => matrix *= local,
                Err(error) if error.is_fatal() => return Err(error),
                Err(error) => self.reporter.error(
                    format!("Object placement failed to resolve: {error}"),
                    Some(placement_id),
                    COMPONENT,
                ),
            }
        }
        Ok(matrix)
    }

    /// Subtract the union of the given opening products from every item
    /// shape of the host. Each opening converts under its own placement,
    /// so host and openings meet in world coordinates. A failed opening
    /// or subtraction keeps the affected shape uncut.
    pub fn subtract_openings(
        &self,
        openings: &[EntityId],
        host: &mut ProductShapeData,
    ) -> Result<()> {
        if openings.is_empty() || host.is_empty() {
            return Ok(());
        }

        let mut opening_mesh = Mesh::new();
        for &opening_id in openings {
            match self.convert_product(opening_id) {
                Ok(opening) => {
                    let mesh = opening.to_mesh(self.settings);
                    if mesh.is_empty() {
                        continue;
                    }
                    if opening_mesh.is_empty() {
                        opening_mesh = mesh;
                        continue;
                    }
                    match mesh_union(&opening_mesh, &mesh, self.settings) {
                        Ok(merged) => opening_mesh = merged,
                        Err(error) if error.is_fatal() => return Err(error),
                        Err(error) => self.reporter.minor_warning(
                            format!("Skipping opening that failed to merge: {error}"),
                            Some(opening_id),
                            COMPONENT,
                        ),
                    }
                }
                Err(error) if error.is_fatal() => return Err(error),
                Err(error) => self.reporter.minor_warning(
                    format!("Skipping opening that failed to convert: {error}"),
                    Some(opening_id),
                    COMPONENT,
                ),
            }
        }
        if opening_mesh.is_empty() {
            return Ok(());
        }

        for representation in &mut host.representations {
            for item in &mut representation.items {
                for shape in &mut item.shapes {
                    if matches!(shape, Shape::Wire(_)) {
                        continue;
                    }
                    let host_mesh = shape.to_mesh(self.settings);
                    if host_mesh.is_empty() {
                        continue;
                    }
                    match mesh_difference(&host_mesh, &opening_mesh, self.settings) {
                        Ok(carved) => *shape = Shape::Mesh(carved),
                        Err(error) if error.is_fatal() => return Err(error),
                        Err(error) => self.reporter.minor_warning(
                            format!("Opening subtraction failed, keeping the shape uncut: {error}"),
                            Some(item.entity),
                            COMPONENT,
                        ),
                    }
                }
            }
        }
        Ok(())
    }
}
