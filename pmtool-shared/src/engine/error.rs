/// Engine error taxonomy
///
/// Every operation ends in exactly one success value or exactly one
/// [`EngineError`]. [`EngineError::kind`] gives the classification a transport
/// layer maps to its own status codes.

use std::fmt;

use crate::store::{StoreError, UniqueRule};
use crate::validation::ValidationError;

pub type EngineResult<T> = Result<T, EngineError>;

/// Entity kinds named in "not found" messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Organization,
    Project,
    Task,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Entity::Organization => "Organization",
            Entity::Project => "Project",
            Entity::Task => "Task",
        };
        f.write_str(name)
    }
}

/// Classification of an [`EngineError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    TenantUnresolved,
    Validation,
    NotFound,
    Conflict,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::TenantUnresolved => "tenant_unresolved",
            ErrorKind::Validation => "validation_error",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Internal => "internal_error",
        }
    }
}

fn conflict_message(rule: &UniqueRule) -> &'static str {
    match rule {
        UniqueRule::OrganizationSlug => "An organization with this slug already exists",
        UniqueRule::ProjectNamePerOrganization => {
            "A project with this name already exists in your organization"
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A tenant-bound operation ran without a resolved organization
    #[error("Organization not resolved. Provide header '{header}'.")]
    TenantUnresolved { header: String },

    /// An argument broke a field rule
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Missing, or owned by another tenant; the two are indistinguishable
    #[error("{0} not found")]
    NotFound(Entity),

    /// A uniqueness rule would be broken
    #[error("{}", conflict_message(.0))]
    Conflict(UniqueRule),

    /// The store failed
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::TenantUnresolved { .. } => ErrorKind::TenantUnresolved,
            EngineError::Validation(_) => ErrorKind::Validation,
            EngineError::NotFound(_) => ErrorKind::NotFound,
            EngineError::Conflict(_) => ErrorKind::Conflict,
            EngineError::Store(_) => ErrorKind::Internal,
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(rule) => EngineError::Conflict(rule),
            other => EngineError::Store(other),
        }
    }
}
