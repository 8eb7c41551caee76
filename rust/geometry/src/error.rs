use ifc_brep_core::EntityId;
use thiserror::Error;

/// Result type for geometry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during geometry conversion.
///
/// Most variants are recoverable: the converter reports them through the
/// diagnostics channel and abandons the offending item instead of aborting
/// the whole model. Only [`Error::OutOfMemory`] is rethrown unconditionally.
#[derive(Error, Debug)]
pub enum Error {
    /// An entity kind reached a dispatch point that has no conversion for it
    #[error("No conversion for representation item {entity}")]
    UnhandledRepresentation { entity: EntityId },

    /// Malformed input data, e.g. a negative tag or a zero-length direction
    #[error("Data integrity violation at {entity}: {detail}")]
    DataIntegrity { entity: EntityId, detail: String },

    /// A geometry kernel operation did not produce a usable shape
    #[error("Kernel operation failed: {0}")]
    KernelError(String),

    #[error("Triangulation failed: {0}")]
    TriangulationError(String),

    /// Allocation failure, always fatal
    #[error("Out of memory during {0}")]
    OutOfMemory(String),

    #[error("Entity model error: {0}")]
    CoreError(#[from] ifc_brep_core::Error),
}

impl Error {
    /// Fatal errors abort the whole conversion instead of a single item.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::OutOfMemory(_))
    }

    /// Entity the failure is attributed to, if one is known.
    pub fn entity(&self) -> Option<EntityId> {
        match self {
            Error::UnhandledRepresentation { entity } => Some(*entity),
            Error::DataIntegrity { entity, .. } => Some(*entity),
            Error::CoreError(inner) => Some(inner.entity()),
            _ => None,
        }
    }

    pub(crate) fn data_integrity(entity: EntityId, detail: impl Into<String>) -> Self {
        Error::DataIntegrity {
            entity,
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_out_of_memory_is_fatal() {
        assert!(Error::OutOfMemory("mesh merge".to_string()).is_fatal());
        assert!(!Error::KernelError("sewing failed".to_string()).is_fatal());
        assert!(!Error::UnhandledRepresentation {
            entity: EntityId(4)
        }
        .is_fatal());
    }

    #[test]
    fn test_entity_attribution() {
        let err = Error::data_integrity(EntityId(12), "zero length direction");
        assert_eq!(err.entity(), Some(EntityId(12)));
        assert_eq!(Error::KernelError("boom".to_string()).entity(), None);
    }
}
