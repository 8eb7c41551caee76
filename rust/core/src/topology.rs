// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Topological entities: shells, faces, loops, edges and vertices

use crate::model::EntityId;

/// Geometry carried by a topological vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexGeometry {
    /// Vertex positioned by a cartesian point
    Point(EntityId),
    /// Vertex positioned by a parameter on a curve (unevaluated)
    PointOnCurve(EntityId),
    /// Vertex positioned by parameters on a surface (unevaluated)
    PointOnSurface(EntityId),
}

/// Polymorphic topological entity
#[derive(Debug, Clone, PartialEq)]
pub enum TopologicalItem {
    /// Unclassified collection of faces
    ConnectedFaceSet { faces: Vec<EntityId> },
    /// Face set forming a closed volume boundary
    ClosedShell { faces: Vec<EntityId> },
    /// Face set that does not enclose a volume
    OpenShell { faces: Vec<EntityId> },
    /// Face bounded by one or more loops
    Face { bounds: Vec<EntityId> },
    /// Loop plus orientation; `is_outer` marks the outer bound subtype
    FaceBound {
        bound: EntityId,
        orientation: bool,
        is_outer: bool,
    },
    /// Loop given directly as an ordered list of points
    PolyLoop { polygon: Vec<EntityId> },
    /// Loop assembled from oriented edges
    EdgeLoop { edges: Vec<EntityId> },
    /// Degenerate loop around a single vertex
    VertexLoop { vertex: EntityId },
    /// Edge use with a direction flag
    OrientedEdge { edge: EntityId, orientation: bool },
    /// Edge between two vertices, optionally backed by a curve
    Edge {
        start: EntityId,
        end: EntityId,
        /// Present on edge curves; `None` means a straight segment
        curve: Option<EntityId>,
        same_sense: bool,
    },
    Vertex(VertexGeometry),
    /// Open sequence of connected edges
    Path { edges: Vec<EntityId> },
}

impl TopologicalItem {
    /// Faces of a shell or face set, if this item carries any.
    pub fn faces(&self) -> Option<&[EntityId]> {
        match self {
            TopologicalItem::ConnectedFaceSet { faces }
            | TopologicalItem::ClosedShell { faces }
            | TopologicalItem::OpenShell { faces } => Some(faces),
            _ => None,
        }
    }

    /// True for closed shells, false for open shells and face sets.
    pub fn is_closed_shell(&self) -> bool {
        matches!(self, TopologicalItem::ClosedShell { .. })
    }
}
