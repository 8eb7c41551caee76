// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Converted shape output
//!
//! Conversion produces a tree: one [`ProductShapeData`] per product, one
//! [`RepresentationData`] per shape representation and one
//! [`ItemShapeData`] per representation item. Items collect finished
//! shapes next to the loose points, text anchors and style data that do
//! not tessellate.

use std::sync::Arc;

use ifc_brep_core::EntityId;
use rustc_hash::FxHashMap;

use crate::brep::Shape;
use crate::mesh::Mesh;
use crate::settings::GeometrySettings;
use crate::styles::Appearance;
use crate::{Matrix4, Point3};

/// Text literal anchored by its resolved placement
#[derive(Debug, Clone, PartialEq)]
pub struct TextPlacement {
    pub text: String,
    pub placement: Matrix4<f64>,
}

/// Output of one representation item
#[derive(Debug, Clone, Default)]
pub struct ItemShapeData {
    /// Representation item the data was converted from
    pub entity: EntityId,
    /// Solids, shells, faces, meshes and loose wires
    pub shapes: Vec<Shape>,
    /// Standalone points without any extent
    pub points: Vec<Point3<f64>>,
    /// Text literals, resolved only when text rendering is enabled
    pub text: Vec<TextPlacement>,
    /// Appearances attached through styled items
    pub appearances: Vec<Arc<Appearance>>,
    /// Presentation layer names the item is assigned to
    pub layers: Vec<String>,
}

impl ItemShapeData {
    pub fn new(entity: EntityId) -> Self {
        ItemShapeData {
            entity,
            ..Self::default()
        }
    }

    /// Store a finished shape, dropping shapes with no geometry
    pub fn add_shape(&mut self, shape: Shape) {
        if !shape.is_empty() {
            self.shapes.push(shape);
        }
    }

    /// True when the item carries neither geometry nor annotations
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty() && self.points.is_empty() && self.text.is_empty()
    }

    /// Apply a rigid transform to every shape, point and text anchor
    pub fn transform(&mut self, matrix: &Matrix4<f64>) {
        for shape in &mut self.shapes {
            shape.transform(matrix);
        }
        for point in &mut self.points {
            *point = matrix.transform_point(point);
        }
        for text in &mut self.text {
            text.placement = matrix * text.placement;
        }
    }

    /// Transform variant that tessellates analytic edges first, for
    /// matrices with non-uniform scaling
    pub fn transform_general(&mut self, matrix: &Matrix4<f64>, settings: &GeometrySettings) {
        for shape in &mut self.shapes {
            shape.transform_general(matrix, settings);
        }
        for point in &mut self.points {
            *point = matrix.transform_point(point);
        }
        for text in &mut self.text {
            text.placement = matrix * text.placement;
        }
    }

    /// Merged display mesh of every shape. Wires and points contribute
    /// nothing.
    pub fn to_mesh(&self, settings: &GeometrySettings) -> Mesh {
        let mut mesh = Mesh::new();
        for shape in &self.shapes {
            mesh.merge(&shape.to_mesh(settings));
        }
        mesh
    }
}

/// Output of one shape representation
#[derive(Debug, Clone, Default)]
pub struct RepresentationData {
    pub entity: EntityId,
    pub identifier: Option<String>,
    pub representation_type: Option<String>,
    pub items: Vec<ItemShapeData>,
}

impl RepresentationData {
    pub fn new(entity: EntityId) -> Self {
        RepresentationData {
            entity,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.iter().all(ItemShapeData::is_empty)
    }

    pub fn transform(&mut self, matrix: &Matrix4<f64>) {
        for item in &mut self.items {
            item.transform(matrix);
        }
    }

    pub fn transform_general(&mut self, matrix: &Matrix4<f64>, settings: &GeometrySettings) {
        for item in &mut self.items {
            item.transform_general(matrix, settings);
        }
    }
}

/// Output of one product: its representations in world coordinates
#[derive(Debug, Clone)]
pub struct ProductShapeData {
    pub entity: EntityId,
    pub name: Option<String>,
    /// Resolved world transform, already applied to the representations
    pub placement: Matrix4<f64>,
    pub representations: Vec<RepresentationData>,
}

impl ProductShapeData {
    pub fn new(entity: EntityId) -> Self {
        ProductShapeData {
            entity,
            name: None,
            placement: Matrix4::identity(),
            representations: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.representations.iter().all(RepresentationData::is_empty)
    }

    /// Merged display mesh of every item of every representation
    pub fn to_mesh(&self, settings: &GeometrySettings) -> Mesh {
        let mut mesh = Mesh::new();
        for representation in &self.representations {
            for item in &representation.items {
                mesh.merge(&item.to_mesh(settings));
            }
        }
        mesh
    }
}

/// Conversion output for a whole model, keyed by product tag
#[derive(Debug, Clone, Default)]
pub struct ConversionResult {
    products: FxHashMap<EntityId, ProductShapeData>,
}

impl ConversionResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, data: ProductShapeData) {
        self.products.insert(data.entity, data);
    }

    pub fn product(&self, id: EntityId) -> Option<&ProductShapeData> {
        self.products.get(&id)
    }

    /// Product tags in ascending order, for deterministic walks
    pub fn product_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self.products.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &ProductShapeData)> {
        self.products.iter().map(|(id, data)| (*id, data))
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csg::box_mesh;
    use crate::Vector3;

    fn unit_box_item(entity: EntityId) -> ItemShapeData {
        let mut item = ItemShapeData::new(entity);
        item.add_shape(Shape::Mesh(box_mesh(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 1.0),
        )));
        item
    }

    #[test]
    fn test_empty_shapes_are_dropped() {
        let mut item = ItemShapeData::new(EntityId(1));
        item.add_shape(Shape::Mesh(Mesh::new()));
        assert!(item.shapes.is_empty());
        assert!(item.is_empty());
    }

    #[test]
    fn test_transform_moves_shapes_points_and_text() {
        let mut item = unit_box_item(EntityId(1));
        item.points.push(Point3::new(0.0, 0.0, 0.0));
        item.text.push(TextPlacement {
            text: "A-01".to_string(),
            placement: Matrix4::identity(),
        });

        let offset = Matrix4::new_translation(&Vector3::new(1.0, 2.0, 3.0));
        item.transform(&offset);

        let settings = GeometrySettings::default();
        let (min, _) = item.to_mesh(&settings).bounds().unwrap();
        assert!((min.x - 1.0).abs() < 1e-9);
        assert!((min.z - 3.0).abs() < 1e-9);
        assert_eq!(item.points[0], Point3::new(1.0, 2.0, 3.0));
        assert!((item.text[0].placement[(1, 3)] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_item_mesh_merges_shapes() {
        let mut item = unit_box_item(EntityId(1));
        item.add_shape(Shape::Mesh(box_mesh(
            Point3::new(5.0, 0.0, 0.0),
            Point3::new(6.0, 1.0, 1.0),
        )));

        let mesh = item.to_mesh(&GeometrySettings::default());
        assert_eq!(mesh.triangle_count(), 24);
    }

    #[test]
    fn test_product_mesh_collects_all_items() {
        let mut representation = RepresentationData::new(EntityId(10));
        representation.items.push(unit_box_item(EntityId(11)));
        representation.items.push(unit_box_item(EntityId(12)));

        let mut product = ProductShapeData::new(EntityId(20));
        product.representations.push(representation);

        let mesh = product.to_mesh(&GeometrySettings::default());
        assert_eq!(mesh.triangle_count(), 24);
        assert!(!product.is_empty());
    }

    #[test]
    fn test_result_ids_are_sorted() {
        let mut result = ConversionResult::new();
        result.insert(ProductShapeData::new(EntityId(30)));
        result.insert(ProductShapeData::new(EntityId(3)));
        result.insert(ProductShapeData::new(EntityId(12)));

        assert_eq!(
            result.product_ids(),
            vec![EntityId(3), EntityId(12), EntityId(30)]
        );
        assert!(result.product(EntityId(12)).is_some());
        assert!(result.product(EntityId(99)).is_none());
    }
}
