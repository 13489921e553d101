use thiserror::Error;

use super::StoreErrorKind;

/// Service-level errors that can occur in business logic
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Food not found")]
    FoodNotFound { id: String },

    #[error("No update data provided")]
    EmptyUpdate,

    #[error(transparent)]
    Repository {
        #[from]
        source: RepositoryError,
    },
}

impl ServiceError {
    /// Short label for metrics and logs
    pub fn outcome(&self) -> &'static str {
        match self {
            ServiceError::FoodNotFound { .. } => "not_found",
            ServiceError::EmptyUpdate => "empty_update",
            ServiceError::Repository { source } => match source.kind() {
                StoreErrorKind::Validation => "validation",
                StoreErrorKind::Connectivity => "connectivity",
            },
        }
    }
}

/// Errors raised at the document-store boundary
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Cast to ObjectId failed for value \"{id}\" (expected 24 hex characters)")]
    InvalidId { id: String },

    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("Stored document is malformed: {message}")]
    MalformedDocument { message: String },

    #[error("Database connection failed: {message}")]
    Connectivity { message: String },

    #[error("Table not found: {table_name}")]
    TableNotFound { table_name: String },
}

impl RepositoryError {
    /// Classify the error for status selection and logging
    pub fn kind(&self) -> StoreErrorKind {
        match self {
            RepositoryError::InvalidId { .. }
            | RepositoryError::Validation { .. }
            | RepositoryError::MalformedDocument { .. } => StoreErrorKind::Validation,
            RepositoryError::Connectivity { .. } | RepositoryError::TableNotFound { .. } => {
                StoreErrorKind::Connectivity
            }
        }
    }
}

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Result type alias for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;
