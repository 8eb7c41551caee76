// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 2D profile contours and their triangulation

use nalgebra::{Matrix3, Point2};

use crate::error::{Error, Result};

/// Closed 2D contour set: one outer boundary plus optional holes.
///
/// Winding convention: the outer boundary runs counter-clockwise and
/// holes run clockwise. Extrusion and triangulation rely on this.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile2D {
    /// Outer boundary (counter-clockwise)
    pub outer: Vec<Point2<f64>>,
    /// Holes (clockwise)
    pub holes: Vec<Vec<Point2<f64>>>,
}

impl Profile2D {
    /// Create a new profile from its outer boundary
    pub fn new(outer: Vec<Point2<f64>>) -> Self {
        Self {
            outer,
            holes: Vec::new(),
        }
    }

    /// Add a hole to the profile
    pub fn add_hole(&mut self, hole: Vec<Point2<f64>>) {
        self.holes.push(hole);
    }

    /// A profile without an outer boundary carries no area
    pub fn is_empty(&self) -> bool {
        self.outer.len() < 3
    }

    /// Apply a homogeneous 2D transform to all contours
    pub fn transform(&mut self, matrix: &Matrix3<f64>) {
        for p in &mut self.outer {
            *p = matrix.transform_point(p);
        }
        for hole in &mut self.holes {
            for p in hole {
                *p = matrix.transform_point(p);
            }
        }
    }

    /// Triangulate the profile using earcutr
    /// Returns triangle indices into the flattened vertex array
    pub fn triangulate(&self) -> Result<Triangulation> {
        if self.outer.len() < 3 {
            return Err(Error::TriangulationError(format!(
                "profile outer boundary has {} points, need at least 3",
                self.outer.len()
            )));
        }

        // Flatten vertices for earcutr
        let mut vertices = Vec::with_capacity(
            (self.outer.len() + self.holes.iter().map(|h| h.len()).sum::<usize>()) * 2,
        );

        for p in &self.outer {
            vertices.push(p.x);
            vertices.push(p.y);
        }

        // Holes too small to bound area are skipped
        let mut hole_indices = Vec::with_capacity(self.holes.len());
        for hole in &self.holes {
            if hole.len() < 3 {
                continue;
            }
            hole_indices.push(vertices.len() / 2);
            for p in hole {
                vertices.push(p.x);
                vertices.push(p.y);
            }
        }

        let indices = earcutr::earcut(&vertices, &hole_indices, 2)
            .map_err(|e| Error::TriangulationError(format!("{:?}", e)))?;

        if indices.is_empty() {
            return Err(Error::TriangulationError(
                "profile triangulation produced no triangles".to_string(),
            ));
        }

        let mut points = Vec::with_capacity(vertices.len() / 2);
        for i in (0..vertices.len()).step_by(2) {
            points.push(Point2::new(vertices[i], vertices[i + 1]));
        }

        Ok(Triangulation { points, indices })
    }
}

/// Triangulated profile result
#[derive(Debug, Clone)]
pub struct Triangulation {
    /// All vertices (outer followed by holes)
    pub points: Vec<Point2<f64>>,
    /// Triangle indices
    pub indices: Vec<usize>,
}

/// Create a rectangular profile centered on the origin
#[inline]
pub fn create_rectangle(x_dim: f64, y_dim: f64) -> Profile2D {
    let half_x = x_dim / 2.0;
    let half_y = y_dim / 2.0;

    Profile2D::new(vec![
        Point2::new(-half_x, -half_y),
        Point2::new(half_x, -half_y),
        Point2::new(half_x, half_y),
        Point2::new(-half_x, half_y),
    ])
}

/// Create a circular profile centered on the origin, with an optional
/// concentric hole. The ring is open: no duplicate closing point.
pub fn create_circle(radius: f64, hole_radius: Option<f64>, segments: usize) -> Profile2D {
    let mut profile = Profile2D::new(circle_ring(radius, segments));

    if let Some(hole_r) = hole_radius {
        let mut hole = circle_ring(hole_r, segments);
        // Reverse winding for the hole (clockwise)
        hole.reverse();
        profile.add_hole(hole);
    }

    profile
}

fn circle_ring(radius: f64, segments: usize) -> Vec<Point2<f64>> {
    let segments = segments.max(3);
    let mut ring = Vec::with_capacity(segments);
    for i in 0..segments {
        let angle = 2.0 * std::f64::consts::PI * (i as f64) / (segments as f64);
        ring.push(Point2::new(radius * angle.cos(), radius * angle.sin()));
    }
    ring
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bool2d::compute_signed_area;

    #[test]
    fn test_rectangle_profile() {
        let profile = create_rectangle(10.0, 5.0);
        assert_eq!(profile.outer.len(), 4);
        assert_eq!(profile.holes.len(), 0);

        assert_eq!(profile.outer[0], Point2::new(-5.0, -2.5));
        assert_eq!(profile.outer[1], Point2::new(5.0, -2.5));
        assert_eq!(profile.outer[2], Point2::new(5.0, 2.5));
        assert_eq!(profile.outer[3], Point2::new(-5.0, 2.5));
    }

    #[test]
    fn test_circle_profile() {
        let profile = create_circle(5.0, None, 40);
        assert_eq!(profile.outer.len(), 40);
        assert_eq!(profile.holes.len(), 0);

        for p in &profile.outer {
            let dist = (p.x * p.x + p.y * p.y).sqrt();
            assert!((dist - 5.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_hollow_circle_windings() {
        let profile = create_circle(10.0, Some(5.0), 40);
        assert_eq!(profile.outer.len(), 40);
        assert_eq!(profile.holes.len(), 1);

        assert!(compute_signed_area(&profile.outer) > 0.0);
        assert!(compute_signed_area(&profile.holes[0]) < 0.0);
    }

    #[test]
    fn test_transform_translates_all_contours() {
        let mut profile = create_circle(10.0, Some(5.0), 16);
        let mut m = Matrix3::identity();
        m[(0, 2)] = 3.0;
        m[(1, 2)] = -2.0;
        profile.transform(&m);

        let first = profile.outer[0];
        assert!((first.x - 13.0).abs() < 1e-12);
        assert!((first.y + 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_triangulate_rectangle() {
        let profile = create_rectangle(10.0, 5.0);
        let tri = profile.triangulate().unwrap();

        assert_eq!(tri.points.len(), 4);
        assert_eq!(tri.indices.len(), 6);
    }

    #[test]
    fn test_triangulate_circle() {
        let profile = create_circle(5.0, None, 24);
        let tri = profile.triangulate().unwrap();

        assert_eq!(tri.points.len(), 24);
        // A simple polygon triangulates to n - 2 triangles
        assert_eq!(tri.indices.len(), (tri.points.len() - 2) * 3);
    }

    #[test]
    fn test_triangulate_hollow_circle() {
        let profile = create_circle(10.0, Some(5.0), 32);
        let tri = profile.triangulate().unwrap();

        assert_eq!(tri.points.len(), 64);
        assert!(!tri.indices.is_empty());
        assert_eq!(tri.indices.len() % 3, 0);
    }

    #[test]
    fn test_triangulate_degenerate_outer_fails() {
        let profile = Profile2D::new(vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)]);
        assert!(profile.triangulate().is_err());
    }
}
