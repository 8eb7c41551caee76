// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Presentation style entities: colours, shading and layer assignment

use crate::model::EntityId;

/// RGB colour with components in `[0, 1]`
#[derive(Debug, Clone, PartialEq)]
pub struct ColourRgb {
    pub name: Option<String>,
    pub red: f64,
    pub green: f64,
    pub blue: f64,
}

/// Which side of a surface a style applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceSide {
    Positive,
    Negative,
    Both,
}

/// Shading style: a colour plus optional transparency
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceStyleShading {
    pub colour: EntityId,
    /// 0 is opaque, 1 is fully transparent
    pub transparency: Option<f64>,
}

/// Surface style grouping element styles for one side
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceStyle {
    pub name: Option<String>,
    pub side: SurfaceSide,
    pub styles: Vec<EntityId>,
}

/// Assignment grouping presentation styles
#[derive(Debug, Clone, PartialEq)]
pub struct PresentationStyleAssignment {
    pub styles: Vec<EntityId>,
}

/// Style attached to a representation item
///
/// `item == None` styles the material definition rather than a
/// concrete item.
#[derive(Debug, Clone, PartialEq)]
pub struct StyledItem {
    pub item: Option<EntityId>,
    pub styles: Vec<EntityId>,
    pub name: Option<String>,
}

/// Layer grouping of representation items
#[derive(Debug, Clone, PartialEq)]
pub struct PresentationLayerAssignment {
    pub name: String,
    pub assigned_items: Vec<EntityId>,
}
