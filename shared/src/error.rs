use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    EntityNotFound(String),
    #[error("{0}")]
    ValidationError(#[from] garde::Report),
    #[error("{0}")]
    InvalidReservation(String),
    #[error("{0}")]
    MalformedRequest(String),
    #[error("Seats already reserved: {}", .0.join(", "))]
    SeatConflict(Vec<String>),
    #[error("{0}")]
    IllegalTransition(String),
    #[error("Failed to run the database transaction")]
    TransactionError(#[source] sqlx::Error),
    #[error("A database error occurred")]
    SpecificOperationError(#[source] sqlx::Error),
    #[error("No rows affected: {0}")]
    NoRowsAffectedError(String),
    #[error("{0}")]
    ConversionEntityError(String),
    #[error("Authentication required")]
    UnauthenticatedError,
    #[error("Operation not permitted")]
    ForbiddenOperation,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status_code = match &self {
            AppError::EntityNotFound(_) => StatusCode::NOT_FOUND,
            AppError::ValidationError(_)
            | AppError::InvalidReservation(_)
            | AppError::MalformedRequest(_)
            | AppError::SeatConflict(_)
            | AppError::IllegalTransition(_) => StatusCode::BAD_REQUEST,
            AppError::UnauthenticatedError => StatusCode::UNAUTHORIZED,
            AppError::ForbiddenOperation => StatusCode::FORBIDDEN,
            e @ (AppError::TransactionError(_)
            | AppError::SpecificOperationError(_)
            | AppError::NoRowsAffectedError(_)
            | AppError::ConversionEntityError(_)) => {
                tracing::error!(
                    error.cause_chain = ?e,
                    error.message = %e,
                    "Unexpected error happened"
                );
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = match &self {
            AppError::SeatConflict(seats) => serde_json::json!({
                "error": self.to_string(),
                "unavailableSeats": seats,
            }),
            _ => serde_json::json!({ "error": self.to_string() }),
        };

        (status_code, Json(body)).into_response()
    }
}

// 形式の誤ったリクエストは axum 既定の応答ではなく 400 と JSON 本文で返す
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::MalformedRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::MalformedRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::MalformedRequest(rejection.body_text())
    }
}

pub type AppResult<T> = Result<T, AppError>;
