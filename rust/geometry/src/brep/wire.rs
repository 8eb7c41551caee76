// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Edge sequences

use crate::brep::Edge;
use crate::settings::GeometrySettings;
use crate::{Matrix4, Point3};

/// Ordered run of edges, possibly closed.
///
/// A wire makes no connectivity promises by itself. The repair passes in
/// [`crate::geom_utils`] are responsible for closing gaps between
/// consecutive edges.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Wire {
    pub edges: Vec<Edge>,
}

impl Wire {
    pub fn new() -> Self {
        Wire { edges: Vec::new() }
    }

    pub fn from_edges(edges: Vec<Edge>) -> Self {
        Wire { edges }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn push(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    /// Start point of the first edge
    pub fn start(&self) -> Option<Point3<f64>> {
        self.edges.first().map(|e| e.start)
    }

    /// End point of the last edge
    pub fn end(&self) -> Option<Point3<f64>> {
        self.edges.last().map(|e| e.end)
    }

    /// True when the last edge ends where the first begins, compared by
    /// squared distance against `tolerance`
    pub fn is_closed(&self, tolerance: f64) -> bool {
        match (self.start(), self.end()) {
            (Some(start), Some(end)) => (end - start).norm_squared() <= tolerance,
            _ => false,
        }
    }

    /// Reverse traversal direction in place
    pub fn reverse(&mut self) {
        self.edges.reverse();
        for edge in self.edges.iter_mut() {
            *edge = edge.reversed();
        }
    }

    pub fn reversed(&self) -> Wire {
        let mut wire = self.clone();
        wire.reverse();
        wire
    }

    /// Apply a rigid or uniformly scaled transform in place
    pub fn transform(&mut self, matrix: &Matrix4<f64>) {
        for edge in self.edges.iter_mut() {
            edge.transform(matrix);
        }
    }

    /// Apply a general affine transform, discretizing analytic arcs first
    pub fn transform_general(&mut self, matrix: &Matrix4<f64>, settings: &GeometrySettings) {
        for edge in self.edges.iter_mut() {
            *edge = edge.discretized(settings);
            edge.transform(matrix);
        }
    }
}
