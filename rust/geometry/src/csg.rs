// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Boolean operations on triangle meshes
//!
//! Bridges the display mesh format to the `csgrs` BSP kernel. Vertex
//! coordinates are snapped to a fuzzy grid on the way in, so faces that
//! are numerically coincident end up exactly coincident and classify
//! cleanly. Degenerate triangles are dropped on both directions of the
//! conversion.

use nalgebra::{Point3, Vector3};

use crate::error::Result;
use crate::mesh::Mesh;
use crate::settings::GeometrySettings;
use crate::triangulation::{calculate_polygon_normal, project_to_2d, triangulate_polygon};

/// Union of two meshes
pub fn mesh_union(a: &Mesh, b: &Mesh, settings: &GeometrySettings) -> Result<Mesh> {
    use csgrs::traits::CSG;

    if a.is_empty() {
        return Ok(b.clone());
    }
    if b.is_empty() {
        return Ok(a.clone());
    }

    let lhs = mesh_to_csg(a, settings);
    let rhs = mesh_to_csg(b, settings);
    csg_to_mesh(&lhs.union(&rhs))
}

/// Intersection of two meshes
pub fn mesh_intersection(a: &Mesh, b: &Mesh, settings: &GeometrySettings) -> Result<Mesh> {
    use csgrs::traits::CSG;

    if a.is_empty() || b.is_empty() {
        return Ok(Mesh::new());
    }

    let lhs = mesh_to_csg(a, settings);
    let rhs = mesh_to_csg(b, settings);
    csg_to_mesh(&lhs.intersection(&rhs))
}

/// Difference `a - b`, the second operand is carved out of the first
pub fn mesh_difference(a: &Mesh, b: &Mesh, settings: &GeometrySettings) -> Result<Mesh> {
    use csgrs::traits::CSG;

    if b.is_empty() {
        return Ok(a.clone());
    }
    if a.is_empty() {
        return Ok(Mesh::new());
    }

    let lhs = mesh_to_csg(a, settings);
    let rhs = mesh_to_csg(b, settings);
    csg_to_mesh(&lhs.difference(&rhs))
}

/// Axis-aligned box as a closed mesh, 12 triangles winding outward
pub fn box_mesh(min: Point3<f64>, max: Point3<f64>) -> Mesh {
    let mut mesh = Mesh::with_capacity(36, 36);

    let v0 = Point3::new(min.x, min.y, min.z);
    let v1 = Point3::new(max.x, min.y, min.z);
    let v2 = Point3::new(max.x, max.y, min.z);
    let v3 = Point3::new(min.x, max.y, min.z);
    let v4 = Point3::new(min.x, min.y, max.z);
    let v5 = Point3::new(max.x, min.y, max.z);
    let v6 = Point3::new(max.x, max.y, max.z);
    let v7 = Point3::new(min.x, max.y, max.z);

    // Bottom (-z) and top (+z)
    add_triangle(&mut mesh, v0, v2, v1);
    add_triangle(&mut mesh, v0, v3, v2);
    add_triangle(&mut mesh, v4, v5, v6);
    add_triangle(&mut mesh, v4, v6, v7);

    // Left (-x) and right (+x)
    add_triangle(&mut mesh, v0, v4, v7);
    add_triangle(&mut mesh, v0, v7, v3);
    add_triangle(&mut mesh, v1, v2, v6);
    add_triangle(&mut mesh, v1, v6, v5);

    // Front (-y) and back (+y)
    add_triangle(&mut mesh, v0, v1, v5);
    add_triangle(&mut mesh, v0, v5, v4);
    add_triangle(&mut mesh, v3, v7, v6);
    add_triangle(&mut mesh, v3, v6, v2);

    mesh
}

fn add_triangle(mesh: &mut Mesh, v0: Point3<f64>, v1: Point3<f64>, v2: Point3<f64>) {
    let normal = (v1 - v0)
        .cross(&(v2 - v0))
        .try_normalize(1e-10)
        .unwrap_or_else(Vector3::z);
    let base = mesh.vertex_count() as u32;
    mesh.add_vertex(v0, normal);
    mesh.add_vertex(v1, normal);
    mesh.add_vertex(v2, normal);
    mesh.add_triangle(base, base + 1, base + 2);
}

fn snap(point: Point3<f64>, grid: f64) -> Point3<f64> {
    Point3::new(
        (point.x / grid).round() * grid,
        (point.y / grid).round() * grid,
        (point.z / grid).round() * grid,
    )
}

/// One csgrs polygon per triangle, coordinates welded on the fuzzy grid
fn mesh_to_csg(mesh: &Mesh, settings: &GeometrySettings) -> csgrs::mesh::Mesh<()> {
    use csgrs::mesh::{polygon::Polygon, vertex::Vertex, Mesh as CsgMesh};
    use std::sync::OnceLock;

    if mesh.is_empty() {
        return CsgMesh {
            polygons: Vec::new(),
            bounding_box: OnceLock::new(),
            metadata: None,
        };
    }

    let grid = settings.csg_fuzzy_factor.max(1.0e-12);
    let mut polygons = Vec::with_capacity(mesh.triangle_count());

    for tri in mesh.indices.chunks_exact(3) {
        let v0 = snap(mesh.position(tri[0] as usize), grid);
        let v1 = snap(mesh.position(tri[1] as usize), grid);
        let v2 = snap(mesh.position(tri[2] as usize), grid);

        // Triangles collapsed by welding would propagate NaN normals
        let normal = match (v1 - v0).cross(&(v2 - v0)).try_normalize(1e-10) {
            Some(n) => n,
            None => continue,
        };

        let vertices = vec![
            Vertex::new(v0, normal),
            Vertex::new(v1, normal),
            Vertex::new(v2, normal),
        ];
        polygons.push(Polygon::new(vertices, None));
    }

    CsgMesh::from_polygons(&polygons, None)
}

/// Triangulate the csgrs polygon soup back into a display mesh
fn csg_to_mesh(csg: &csgrs::mesh::Mesh<()>) -> Result<Mesh> {
    let mut mesh = Mesh::new();

    for polygon in &csg.polygons {
        let vertices = &polygon.vertices;
        if vertices.len() < 3 {
            continue;
        }

        let points: Vec<Point3<f64>> = vertices
            .iter()
            .map(|v| Point3::new(v.pos[0], v.pos[1], v.pos[2]))
            .collect();

        let raw_normal = Vector3::new(
            vertices[0].normal[0],
            vertices[0].normal[1],
            vertices[0].normal[2],
        );
        let normal = match raw_normal.try_normalize(1e-10) {
            Some(n) if n.x.is_finite() && n.y.is_finite() && n.z.is_finite() => n,
            _ => match calculate_polygon_normal(&points).try_normalize(1e-10) {
                Some(n) => n,
                None => continue,
            },
        };

        if points.len() == 3 {
            let base = mesh.vertex_count() as u32;
            for point in &points {
                mesh.add_vertex(*point, normal);
            }
            mesh.add_triangle(base, base + 1, base + 2);
            continue;
        }

        // BSP output may be an arbitrary convex or concave polygon
        let (points_2d, _, _, _) = project_to_2d(&points, &normal);
        let Ok(indices) = triangulate_polygon(&points_2d) else {
            continue;
        };

        let base = mesh.vertex_count();
        for point in &points {
            mesh.add_vertex(*point, normal);
        }
        for tri in indices.chunks_exact(3) {
            mesh.add_triangle(
                (base + tri[0]) as u32,
                (base + tri[1]) as u32,
                (base + tri[2]) as u32,
            );
        }
    }

    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_mesh_is_closed() {
        let mesh = box_mesh(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 2.0, 3.0));
        assert_eq!(mesh.triangle_count(), 12);

        let (min, max) = mesh.bounds().unwrap();
        assert!((min.x).abs() < 1e-9);
        assert!((max.z - 3.0).abs() < 1e-9);
        assert!((mesh.signed_volume() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_difference_removes_overlap() {
        let settings = GeometrySettings::default();
        let host = box_mesh(Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 2.0, 2.0));
        let tool = box_mesh(Point3::new(1.0, 0.0, 0.0), Point3::new(3.0, 2.0, 2.0));

        let result = mesh_difference(&host, &tool, &settings).unwrap();
        assert!((result.signed_volume() - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_difference_with_empty_tool_returns_host() {
        let settings = GeometrySettings::default();
        let host = box_mesh(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));

        let result = mesh_difference(&host, &Mesh::new(), &settings).unwrap();
        assert_eq!(result.vertex_count(), host.vertex_count());
        assert!((result.signed_volume() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_union_of_disjoint_boxes_keeps_both() {
        let settings = GeometrySettings::default();
        let a = box_mesh(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
        let b = box_mesh(Point3::new(5.0, 0.0, 0.0), Point3::new(6.0, 1.0, 1.0));

        let result = mesh_union(&a, &b, &settings).unwrap();
        assert!((result.signed_volume() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_union_with_empty_returns_other() {
        let settings = GeometrySettings::default();
        let a = box_mesh(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));

        let result = mesh_union(&Mesh::new(), &a, &settings).unwrap();
        assert_eq!(result.triangle_count(), 12);
    }

    #[test]
    fn test_intersection_keeps_shared_volume() {
        let settings = GeometrySettings::default();
        let a = box_mesh(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
        let b = box_mesh(Point3::new(0.5, 0.5, 0.5), Point3::new(2.0, 2.0, 2.0));

        let result = mesh_intersection(&a, &b, &settings).unwrap();
        assert!((result.signed_volume() - 0.125).abs() < 1e-6);
    }

    #[test]
    fn test_intersection_with_empty_is_empty() {
        let settings = GeometrySettings::default();
        let a = box_mesh(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));

        let result = mesh_intersection(&a, &Mesh::new(), &settings).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_degenerate_triangles_are_dropped() {
        let settings = GeometrySettings::default();
        let mut collapsed = Mesh::new();
        add_triangle(
            &mut collapsed,
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        );
        let tool = box_mesh(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));

        let result = mesh_difference(&collapsed, &tool, &settings).unwrap();
        assert!(result.is_empty());
    }
}
