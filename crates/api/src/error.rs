use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pantry_core::error::{BookingError, CoreError};
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for generic domain errors, [`BookingError`] for the
/// booking engine's typed failures, and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A typed failure from the booking engine.
    #[error(transparent)]
    Booking(#[from] BookingError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

const INTERNAL_MESSAGE: &str = "An internal error occurred";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Unauthorized(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
                CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        INTERNAL_MESSAGE.to_string(),
                    )
                }
            },

            AppError::Booking(err) => return booking_error_response(err),

            AppError::Database(err) => classify_sqlx_error(err),

            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    INTERNAL_MESSAGE.to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Render a [`BookingError`] with the details a person needs to act on it.
///
/// - `SlotClosed` carries the lowest-level `reason` (holiday name, block
///   reason) and maps to 422: retrying the same date cannot succeed.
/// - `SlotFull`, `DuplicateActiveBooking` and `InvalidTransition` map to 409.
///   A duplicate carries both the `existing` booking and the `attempted`
///   request so the caller can choose between them.
fn booking_error_response(err: &BookingError) -> Response {
    let code = err.code();
    let (status, body) = match err {
        BookingError::SlotClosed {
            target,
            date,
            reason,
        } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({
                "error": err.to_string(),
                "code": code,
                "target": target,
                "date": date,
                "reason": reason,
            }),
        ),
        BookingError::SlotFull { target, date } => (
            StatusCode::CONFLICT,
            json!({
                "error": err.to_string(),
                "code": code,
                "target": target,
                "date": date,
            }),
        ),
        BookingError::DuplicateActiveBooking {
            existing,
            attempted,
        } => (
            StatusCode::CONFLICT,
            json!({
                "error": err.to_string(),
                "code": code,
                "existing": existing,
                "attempted": attempted,
            }),
        ),
        BookingError::InvalidTransition { from, to } => (
            StatusCode::CONFLICT,
            json!({
                "error": err.to_string(),
                "code": code,
                "from": from,
                "to": to,
            }),
        ),
        BookingError::NotFound { .. } => (
            StatusCode::NOT_FOUND,
            json!({ "error": err.to_string(), "code": code }),
        ),
        BookingError::Invalid(msg) => (
            StatusCode::BAD_REQUEST,
            json!({ "error": msg, "code": code }),
        ),
        BookingError::Storage(msg) => {
            tracing::error!(error = %msg, "Booking storage error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": INTERNAL_MESSAGE, "code": code }),
            )
        }
    };

    (status, axum::Json(body)).into_response()
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique violations (23505) and foreign-key violations (23503) map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            match db_err.code().as_deref() {
                Some("23505") => {
                    let constraint = db_err.constraint().unwrap_or("unknown");
                    return (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
                Some("23503") => {
                    return (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        "Row is still referenced by existing bookings".to_string(),
                    );
                }
                _ => {}
            }
            tracing::error!(error = %db_err, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                INTERNAL_MESSAGE.to_string(),
            )
        }
        other => {
            tracing::error!(error = %other, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                INTERNAL_MESSAGE.to_string(),
            )
        }
    }
}
