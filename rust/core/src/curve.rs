// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Curve entity definitions
//!
//! One sum type over the bounded/conic/line curve hierarchy. Trim bounds
//! are stored exactly as the file gives them: a small list of selects per
//! bound, since a file may provide a parameter value, a cartesian point,
//! or both for the same bound.

use crate::model::EntityId;
use smallvec::SmallVec;

/// A single trimming bound
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrimmingSelect {
    /// Parametric value (unit depends on the basis curve)
    Parameter(f64),
    /// Cartesian point near (not necessarily on) the basis curve
    Point(EntityId),
}

/// Transition code between composite curve segments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transition {
    Discontinuous,
    #[default]
    Continuous,
    ContSameGradient,
    ContSameGradientSameCurvature,
}

/// One segment of a composite curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositeCurveSegment {
    pub transition: Transition,
    /// Whether the parent curve is traversed in its natural direction
    pub same_sense: bool,
    pub parent_curve: EntityId,
}

/// B-spline curve data (control points by reference, knot vector expanded
/// from the stored multiplicities by the importer)
#[derive(Debug, Clone, PartialEq)]
pub struct BSplineCurve {
    pub degree: usize,
    pub control_points: Vec<EntityId>,
    pub knots: Vec<f64>,
    pub multiplicities: Vec<usize>,
    /// Rational weights; empty for polynomial splines
    pub weights: Vec<f64>,
    pub closed: bool,
}

/// Polymorphic curve entity
#[derive(Debug, Clone, PartialEq)]
pub enum Curve {
    /// Ordered cartesian point list, no implicit closing edge
    Polyline { points: Vec<EntityId> },
    /// Ordered segments, each referencing its parent curve
    CompositeCurve {
        segments: Vec<CompositeCurveSegment>,
        self_intersect: bool,
    },
    /// Basis curve restricted to a sub-range
    TrimmedCurve {
        basis_curve: EntityId,
        trim1: SmallVec<[TrimmingSelect; 2]>,
        trim2: SmallVec<[TrimmingSelect; 2]>,
        sense_agreement: bool,
    },
    BSpline(BSplineCurve),
    Circle {
        /// 2D or 3D axis placement
        position: EntityId,
        radius: f64,
    },
    Ellipse {
        position: EntityId,
        semi_axis1: f64,
        semi_axis2: f64,
    },
    /// Infinite line: base point plus vector (direction and magnitude)
    Line { point: EntityId, direction: EntityId },
    OffsetCurve2D {
        basis_curve: EntityId,
        distance: f64,
        self_intersect: bool,
    },
    OffsetCurve3D {
        basis_curve: EntityId,
        distance: f64,
        self_intersect: bool,
        ref_direction: EntityId,
    },
    /// Curve in surface parameter space
    PCurve {
        basis_surface: EntityId,
        reference_curve: EntityId,
    },
}
