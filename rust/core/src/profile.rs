// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Profile definition entities
//!
//! Cross sections for swept solids. Parameterized profiles carry their
//! dimension attributes; arbitrary profiles reference boundary curves.
//! `position` is the optional 2D placement of the profile within the
//! sweeping plane.

use crate::model::EntityId;

/// Polymorphic profile definition
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileDef {
    ArbitraryClosed {
        outer_curve: EntityId,
    },
    ArbitraryClosedWithVoids {
        outer_curve: EntityId,
        inner_curves: Vec<EntityId>,
    },
    ArbitraryOpen {
        curve: EntityId,
    },
    /// Open center line thickened symmetrically
    CenterLine {
        curve: EntityId,
        thickness: f64,
    },
    Composite {
        profiles: Vec<EntityId>,
    },
    /// Parent profile transformed by a 2D cartesian operator
    Derived {
        parent_profile: EntityId,
        operator: EntityId,
    },
    Rectangle {
        position: Option<EntityId>,
        x_dim: f64,
        y_dim: f64,
    },
    RectangleHollow {
        position: Option<EntityId>,
        x_dim: f64,
        y_dim: f64,
        wall_thickness: f64,
    },
    RoundedRectangle {
        position: Option<EntityId>,
        x_dim: f64,
        y_dim: f64,
        rounding_radius: f64,
    },
    Circle {
        position: Option<EntityId>,
        radius: f64,
    },
    CircleHollow {
        position: Option<EntityId>,
        radius: f64,
        wall_thickness: f64,
    },
    Ellipse {
        position: Option<EntityId>,
        semi_axis1: f64,
        semi_axis2: f64,
    },
    Trapezium {
        position: Option<EntityId>,
        bottom_x_dim: f64,
        top_x_dim: f64,
        y_dim: f64,
        top_x_offset: f64,
    },
    IShape {
        position: Option<EntityId>,
        overall_width: f64,
        overall_depth: f64,
        web_thickness: f64,
        flange_thickness: f64,
    },
    LShape {
        position: Option<EntityId>,
        depth: f64,
        width: Option<f64>,
        thickness: f64,
    },
    UShape {
        position: Option<EntityId>,
        depth: f64,
        flange_width: f64,
        web_thickness: f64,
        flange_thickness: f64,
    },
    CShape {
        position: Option<EntityId>,
        depth: f64,
        width: f64,
        wall_thickness: f64,
        girth: f64,
    },
    TShape {
        position: Option<EntityId>,
        depth: f64,
        flange_width: f64,
        web_thickness: f64,
        flange_thickness: f64,
    },
    ZShape {
        position: Option<EntityId>,
        depth: f64,
        flange_width: f64,
        web_thickness: f64,
        flange_thickness: f64,
    },
}

impl ProfileDef {
    /// Profile-local 2D placement, if the variant carries one
    pub fn position(&self) -> Option<EntityId> {
        match self {
            ProfileDef::Rectangle { position, .. }
            | ProfileDef::RectangleHollow { position, .. }
            | ProfileDef::RoundedRectangle { position, .. }
            | ProfileDef::Circle { position, .. }
            | ProfileDef::CircleHollow { position, .. }
            | ProfileDef::Ellipse { position, .. }
            | ProfileDef::Trapezium { position, .. }
            | ProfileDef::IShape { position, .. }
            | ProfileDef::LShape { position, .. }
            | ProfileDef::UShape { position, .. }
            | ProfileDef::CShape { position, .. }
            | ProfileDef::TShape { position, .. }
            | ProfileDef::ZShape { position, .. } => *position,
            _ => None,
        }
    }
}
