use thiserror::Error;

/// Why an edit was rejected. A rejected edit leaves the entity list untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("unknown entity `{0}`")]
    UnknownEntity(String),
    #[error("cannot make `{parent}` the parent of `{entity}`: it is `{entity}` or one of its descendants")]
    Cycle { entity: String, parent: String },
    #[error("entity `{0}` already exists")]
    DuplicateId(String),
    #[error("generation of `{0}` is too large to place a child under it")]
    GenerationOverflow(String),
    #[error("attribute key `{0}` is reserved for record fields")]
    ReservedAttribute(String),
}
