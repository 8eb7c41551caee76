// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bounded faces
//!
//! A face is an outer wire plus hole wires. Tessellation samples the
//! wires, projects them into the face plane, and runs the polygon
//! triangulator, so mildly warped boundaries still produce usable
//! triangles.

use crate::brep::Wire;
use crate::geom_utils;
use crate::settings::GeometrySettings;
use crate::triangulation::{
    calculate_polygon_normal, project_to_2d, project_to_2d_with_basis, triangulate_polygon_with_holes,
};
use crate::{Error, Matrix4, Mesh, Point3, Result, Vector3};

/// Face bounded by an outer wire and optional hole wires
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrepFace {
    pub outer: Wire,
    pub holes: Vec<Wire>,
}

/// Sampled and triangulated form of a face.
///
/// `points` holds the outer ring followed by the hole rings;
/// `ring_sizes` gives the length of each ring in order. Triangle indices
/// point into `points` and wind counter-clockwise around `normal`.
#[derive(Debug, Clone)]
pub struct FaceTessellation {
    pub points: Vec<Point3<f64>>,
    pub ring_sizes: Vec<usize>,
    pub triangles: Vec<usize>,
    pub normal: Vector3<f64>,
}

impl BrepFace {
    pub fn new(outer: Wire) -> Self {
        BrepFace {
            outer,
            holes: Vec::new(),
        }
    }

    pub fn add_hole(&mut self, hole: Wire) {
        self.holes.push(hole);
    }

    /// Flip orientation of the face and all its bounds
    pub fn reverse(&mut self) {
        self.outer.reverse();
        for hole in self.holes.iter_mut() {
            hole.reverse();
        }
    }

    /// Face normal from the sampled outer boundary (Newell)
    pub fn normal(&self, settings: &GeometrySettings) -> Vector3<f64> {
        let ring = boundary_ring(&self.outer, settings);
        calculate_polygon_normal(&ring)
    }

    /// Apply a rigid or uniformly scaled transform in place
    pub fn transform(&mut self, matrix: &Matrix4<f64>) {
        self.outer.transform(matrix);
        for hole in self.holes.iter_mut() {
            hole.transform(matrix);
        }
    }

    /// Apply a general affine transform, discretizing arcs first
    pub fn transform_general(&mut self, matrix: &Matrix4<f64>, settings: &GeometrySettings) {
        self.outer.transform_general(matrix, settings);
        for hole in self.holes.iter_mut() {
            hole.transform_general(matrix, settings);
        }
    }

    /// Sample and triangulate the face
    pub fn tessellate(&self, settings: &GeometrySettings) -> Result<FaceTessellation> {
        let outer_ring = boundary_ring(&self.outer, settings);
        if outer_ring.len() < 3 {
            return Err(Error::TriangulationError(
                "Face boundary has fewer than 3 points".to_string(),
            ));
        }

        let normal = calculate_polygon_normal(&outer_ring);
        let (outer_2d, u_axis, v_axis, origin) = project_to_2d(&outer_ring, &normal);

        let mut points = outer_ring;
        let mut ring_sizes = vec![points.len()];
        let mut holes_2d = Vec::with_capacity(self.holes.len());

        for hole in &self.holes {
            let ring = boundary_ring(hole, settings);
            if ring.len() < 3 {
                continue;
            }
            holes_2d.push(project_to_2d_with_basis(&ring, &u_axis, &v_axis, &origin));
            ring_sizes.push(ring.len());
            points.extend(ring);
        }

        let mut triangles = triangulate_polygon_with_holes(&outer_2d, &holes_2d)?;

        // Triangulation ran in projected 2D space, re-orient the output
        // so every triangle winds counter-clockwise around the face normal
        for tri in triangles.chunks_exact_mut(3) {
            let a = points[tri[0]];
            let b = points[tri[1]];
            let c = points[tri[2]];
            if (b - a).cross(&(c - a)).dot(&normal) < 0.0 {
                tri.swap(1, 2);
            }
        }

        Ok(FaceTessellation {
            points,
            ring_sizes,
            triangles,
            normal,
        })
    }

    /// Tessellate and append to a display mesh, one flat-shaded vertex
    /// triple per triangle
    pub fn tessellate_into(&self, mesh: &mut Mesh, settings: &GeometrySettings) -> Result<()> {
        let tess = self.tessellate(settings)?;
        append_tessellation(mesh, &tess);
        Ok(())
    }
}

impl FaceTessellation {
    /// Boundary segments of every ring as index pairs into `points`
    pub fn boundary_segments(&self) -> Vec<(usize, usize)> {
        let mut segments = Vec::with_capacity(self.points.len());
        let mut offset = 0;
        for &size in &self.ring_sizes {
            for i in 0..size {
                segments.push((offset + i, offset + (i + 1) % size));
            }
            offset += size;
        }
        segments
    }

    /// Signed volume contribution of the triangles against the origin
    pub fn signed_volume(&self) -> f64 {
        let mut volume = 0.0;
        for tri in self.triangles.chunks_exact(3) {
            let p0 = self.points[tri[0]];
            let p1 = self.points[tri[1]];
            let p2 = self.points[tri[2]];
            volume += p0.coords.dot(&p1.coords.cross(&p2.coords));
        }
        volume / 6.0
    }
}

/// Append a tessellated face to a mesh with per-triangle normals
pub(crate) fn append_tessellation(mesh: &mut Mesh, tess: &FaceTessellation) {
    for tri in tess.triangles.chunks_exact(3) {
        let p0 = tess.points[tri[0]];
        let p1 = tess.points[tri[1]];
        let p2 = tess.points[tri[2]];

        let normal = (p1 - p0)
            .cross(&(p2 - p0))
            .try_normalize(1e-10)
            .unwrap_or(tess.normal);

        let base = mesh.vertex_count() as u32;
        mesh.add_vertex(p0, normal);
        mesh.add_vertex(p1, normal);
        mesh.add_vertex(p2, normal);
        mesh.add_triangle(base, base + 1, base + 2);
    }
}

/// Sampled boundary of a wire as a ring, without the closing duplicate
fn boundary_ring(wire: &Wire, settings: &GeometrySettings) -> Vec<Point3<f64>> {
    let mut points = geom_utils::sample_wire(wire, settings);
    if points.len() > 1 {
        let first = points[0];
        let last = points[points.len() - 1];
        if geom_utils::points_equal(&first, &last, geom_utils::DUPLICATE_TOLERANCE) {
            points.pop();
        }
    }
    points
}
