// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the entity model

use crate::model::EntityId;
use thiserror::Error;

/// Result type alias for model operations
pub type Result<T> = std::result::Result<T, Error>;

/// Entity model errors
///
/// All of these signal malformed-but-survivable input: the geometry crate
/// catches them at item/profile/product boundaries and reports them as
/// diagnostics instead of aborting a conversion.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Referenced entity does not exist in the arena
    #[error("Entity {0} not found in model")]
    MissingEntity(EntityId),

    /// Entity exists but is not of the expected kind
    #[error("Entity {id} is a {found}, expected {expected}")]
    KindMismatch {
        id: EntityId,
        expected: &'static str,
        found: &'static str,
    },

    /// Negative identity tag (malformed model signal)
    #[error("Entity {0} carries an invalid (negative) identity tag")]
    InvalidTag(EntityId),

    /// Required attribute is absent or empty
    #[error("Entity {id} is missing required attribute '{attribute}'")]
    MissingAttribute { id: EntityId, attribute: &'static str },
}

impl Error {
    /// Entity the error is attributed to (for diagnostic reporting)
    pub fn entity(&self) -> EntityId {
        match self {
            Error::MissingEntity(id) => *id,
            Error::KindMismatch { id, .. } => *id,
            Error::InvalidTag(id) => *id,
            Error::MissingAttribute { id, .. } => *id,
        }
    }
}
