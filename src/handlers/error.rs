use axum::{
    extract::rejection::{BytesRejection, JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::fmt;
use thiserror::Error;

use crate::models::{MessageResponse, ServiceError, StoreErrorKind};

/// The route an error came from; reads and writes fail with different statuses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Get,
    Create,
    Update,
    Delete,
}

impl Operation {
    /// Status for store failures on this route: 500 for reads, 400 for writes
    pub fn failure_status(self) -> StatusCode {
        match self {
            Operation::List | Operation::Get => StatusCode::INTERNAL_SERVER_ERROR,
            Operation::Create | Operation::Update | Operation::Delete => StatusCode::BAD_REQUEST,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::List => write!(f, "list"),
            Operation::Get => write!(f, "get"),
            Operation::Create => write!(f, "create"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}

/// Errors returned by the food handlers, rendered as `{"message": ...}`
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{source}")]
    Service {
        operation: Operation,
        #[source]
        source: ServiceError,
    },

    #[error("{message}")]
    MalformedBody { message: String },

    #[error("{message}")]
    UnreadableBody { status: StatusCode, message: String },
}

impl ApiError {
    pub fn service(operation: Operation) -> impl FnOnce(ServiceError) -> Self {
        move |source| ApiError::Service { operation, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Service {
                source: ServiceError::FoodNotFound { .. },
                ..
            } => StatusCode::NOT_FOUND,
            ApiError::Service {
                source: ServiceError::EmptyUpdate,
                ..
            } => StatusCode::BAD_REQUEST,
            ApiError::Service { operation, .. } => operation.failure_status(),
            ApiError::MalformedBody { .. } => StatusCode::BAD_REQUEST,
            ApiError::UnreadableBody { status, .. } => *status,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedBody {
            message: rejection.body_text(),
        }
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        ApiError::UnreadableBody {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        match &self {
            ApiError::Service {
                operation,
                source: ServiceError::Repository { source },
            } => match source.kind() {
                StoreErrorKind::Connectivity => {
                    crate::error_with_trace!(operation = %operation, error = %source, "Document store unavailable");
                }
                StoreErrorKind::Validation => {
                    crate::warn_with_trace!(operation = %operation, error = %source, "Document store rejected request");
                }
            },
            ApiError::Service { operation, source } => {
                crate::info_with_trace!(operation = %operation, outcome = source.outcome(), "Request not fulfilled");
            }
            ApiError::MalformedBody { message } => {
                crate::warn_with_trace!(error = %message, "Malformed request body");
            }
            ApiError::UnreadableBody { status, message } => {
                crate::warn_with_trace!(status = %status, error = %message, "Request body could not be read");
            }
        }

        (status, Json(MessageResponse { message })).into_response()
    }
}
