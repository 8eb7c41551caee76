// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Boundary representation kernel
//!
//! Converted geometry passes through these types before meshing: curves
//! become [`Wire`]s, bounded surfaces become [`BrepFace`]s, sewn face
//! lists become [`Solid`]s. CSG results arrive as triangle meshes and
//! stay meshes.

mod edge;
mod face;
mod shell;
mod wire;

pub use edge::{Edge, EdgeGeometry};
pub use face::{BrepFace, FaceTessellation};
pub(crate) use face::append_tessellation;
pub use shell::{sew_faces, SewOutcome, Shell, Solid};
pub use wire::Wire;

use crate::settings::GeometrySettings;
use crate::{Matrix4, Mesh, Point3};

/// Any shape a representation item can convert into
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Solid(Solid),
    Shell(Shell),
    Face(BrepFace),
    /// Curve-only geometry: annotation curves, degenerate sweeps
    Wire(Wire),
    /// Already-meshed geometry, e.g. a CSG result or a swept solid
    Mesh(Mesh),
    /// Multiple disconnected parts kept together
    Compound(Vec<Shape>),
}

impl Shape {
    pub fn is_empty(&self) -> bool {
        match self {
            Shape::Solid(solid) => solid.shell.is_empty(),
            Shape::Shell(shell) => shell.is_empty(),
            Shape::Face(face) => face.outer.is_empty(),
            Shape::Wire(wire) => wire.is_empty(),
            Shape::Mesh(mesh) => mesh.is_empty(),
            Shape::Compound(parts) => parts.iter().all(|p| p.is_empty()),
        }
    }

    /// Tessellate into a display mesh. Wires carry no surface and
    /// contribute nothing.
    pub fn to_mesh(&self, settings: &GeometrySettings) -> Mesh {
        match self {
            Shape::Solid(solid) => solid.to_mesh(settings),
            Shape::Shell(shell) => shell.to_mesh(settings),
            Shape::Face(face) => {
                let mut mesh = Mesh::new();
                let _ = face.tessellate_into(&mut mesh, settings);
                mesh
            }
            Shape::Wire(_) => Mesh::new(),
            Shape::Mesh(mesh) => mesh.clone(),
            Shape::Compound(parts) => {
                let mut mesh = Mesh::new();
                for part in parts {
                    mesh.merge(&part.to_mesh(settings));
                }
                mesh
            }
        }
    }

    /// Apply a rigid or uniformly scaled transform in place
    pub fn transform(&mut self, matrix: &Matrix4<f64>) {
        match self {
            Shape::Solid(solid) => solid.transform(matrix),
            Shape::Shell(shell) => shell.transform(matrix),
            Shape::Face(face) => face.transform(matrix),
            Shape::Wire(wire) => wire.transform(matrix),
            Shape::Mesh(mesh) => mesh.transform(matrix),
            Shape::Compound(parts) => {
                for part in parts.iter_mut() {
                    part.transform(matrix);
                }
            }
        }
    }

    /// Apply a general affine transform, discretizing analytic arcs
    pub fn transform_general(&mut self, matrix: &Matrix4<f64>, settings: &GeometrySettings) {
        match self {
            Shape::Solid(solid) => solid.transform_general(matrix, settings),
            Shape::Shell(shell) => shell.transform_general(matrix, settings),
            Shape::Face(face) => face.transform_general(matrix, settings),
            Shape::Wire(wire) => wire.transform_general(matrix, settings),
            Shape::Mesh(mesh) => mesh.transform_general(matrix),
            Shape::Compound(parts) => {
                for part in parts.iter_mut() {
                    part.transform_general(matrix, settings);
                }
            }
        }
    }

    /// Axis-aligned bounds of the tessellated shape
    pub fn bounds(&self, settings: &GeometrySettings) -> Option<(Point3<f64>, Point3<f64>)> {
        self.to_mesh(settings).bounds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Vector3;

    #[test]
    fn test_empty_shapes() {
        assert!(Shape::Mesh(Mesh::new()).is_empty());
        assert!(Shape::Compound(vec![]).is_empty());
        assert!(Shape::Shell(Shell::default()).is_empty());
    }

    #[test]
    fn test_compound_mesh_merges_parts() {
        let mut mesh = Mesh::new();
        let n = Vector3::new(0.0, 0.0, 1.0);
        mesh.add_vertex(Point3::new(0.0, 0.0, 0.0), n);
        mesh.add_vertex(Point3::new(1.0, 0.0, 0.0), n);
        mesh.add_vertex(Point3::new(0.0, 1.0, 0.0), n);
        mesh.add_triangle(0, 1, 2);

        let compound = Shape::Compound(vec![
            Shape::Mesh(mesh.clone()),
            Shape::Mesh(mesh.clone()),
        ]);
        let merged = compound.to_mesh(&GeometrySettings::default());
        assert_eq!(merged.triangle_count(), 2);
        assert!(!compound.is_empty());
    }
}
