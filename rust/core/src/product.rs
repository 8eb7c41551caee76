// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Products, their representations and the void relationship

use crate::model::EntityId;

/// Collection of representation items under an optional context
#[derive(Debug, Clone, PartialEq)]
pub struct Representation {
    pub context: Option<EntityId>,
    pub identifier: Option<String>,
    pub representation_type: Option<String>,
    pub items: Vec<EntityId>,
}

/// Physical element with placement, shape and attached openings
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub name: Option<String>,
    pub object_placement: Option<EntityId>,
    pub representations: Vec<EntityId>,
    /// Opening products subtracted from this product's shape
    pub openings: Vec<EntityId>,
}

/// Relationship attaching an opening element to the element it voids
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelVoidsElement {
    pub relating_element: EntityId,
    pub related_opening: EntityId,
}
