/// Repository failures surface to the caller (spec §7 "Propagation
/// policy"); callers decide whether to retry or publish a CANCELED/REJECT
/// outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbError {
    /// A unique-constraint violation (spec §6 "Persistence (consumed)"),
    /// e.g. inserting an order whose `externalId` already exists.
    UniqueConstraintViolation { entity: &'static str, key: String },
    NotFound { entity: &'static str, key: String },
}

impl std::fmt::Display for DbError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DbError::UniqueConstraintViolation { entity, key } => {
                write!(f, "{entity} unique constraint violated for key {key}")
            }
            DbError::NotFound { entity, key } => write!(f, "{entity} not found for key {key}"),
        }
    }
}

impl std::error::Error for DbError {}
