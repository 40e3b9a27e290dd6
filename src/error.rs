use std::collections::BTreeMap;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("stored password hash is malformed")]
    MalformedHash,

    #[error("token generation failed: {0}")]
    TokenGeneration(String),

    #[error("invalid token")]
    InvalidToken,

    #[error("token expired")]
    TokenExpired,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not authenticated")]
    Unauthorized,

    #[error("{0}")]
    NotFound(String),

    #[error("validation failed")]
    Validation(#[from] ValidationErrors),

    #[error("malformed body: {message}")]
    MalformedBody {
        field: Option<String>,
        message: String,
    },

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn todo_not_found(id: i64) -> Self {
        AppError::NotFound(format!("Todo with ID: {} not found", id))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        let message = rejection.body_text();
        AppError::MalformedBody {
            field: rejected_field(&message),
            message,
        }
    }
}

/// Best-effort name of the field a JSON deserialization error points at.
fn rejected_field(detail: &str) -> Option<String> {
    if let Some(rest) = detail.split("missing field `").nth(1) {
        return rest.split('`').next().map(str::to_string);
    }

    let detail = detail.rsplit("target type: ").next()?;
    let (path, _) = detail.split_once(": ")?;
    let is_path = !path.is_empty()
        && path
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    is_path.then(|| path.to_string())
}

/// Collapses validator output into `{field: [message, ...]}`.
pub fn field_messages(errors: &ValidationErrors) -> BTreeMap<String, Vec<String>> {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let messages = errs
                .iter()
                .map(|e| match &e.message {
                    Some(message) => message.to_string(),
                    None => e.code.to_string(),
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({"status": "fail", "message": "Could not validate user"}),
            ),
            AppError::NotFound(message) => (
                StatusCode::NOT_FOUND,
                json!({"status": "fail", "message": message}),
            ),
            AppError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({
                    "status": "fail",
                    "message": "Invalid todo fields",
                    "errors": field_messages(errors),
                }),
            ),
            AppError::MalformedBody { field, message } => {
                let field = field.clone().unwrap_or_else(|| "body".to_string());
                let errors = BTreeMap::from([(field, vec![message.clone()])]);
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    json!({
                        "status": "fail",
                        "message": "Invalid todo fields",
                        "errors": errors,
                    }),
                )
            }
            AppError::Conflict(message) => (
                StatusCode::CONFLICT,
                json!({"status": "fail", "message": message}),
            ),
            AppError::Auth(AuthError::InvalidToken | AuthError::TokenExpired) => (
                StatusCode::UNAUTHORIZED,
                json!({"status": "fail", "message": "Could not validate user"}),
            ),
            AppError::Auth(_) | AppError::Database(_) | AppError::Internal(_) => {
                tracing::error!(error = %self, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({"status": "error", "message": "Something bad happened"}),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_field() {
        assert_eq!(
            rejected_field(
                "Failed to deserialize the JSON body into the target type: missing field `complete` at line 1 column 52"
            ),
            Some("complete".to_string())
        );
        assert_eq!(
            rejected_field(
                "Failed to deserialize the JSON body into the target type: priority: invalid type: string \"3\", expected i64 at line 1 column 60"
            ),
            Some("priority".to_string())
        );
        assert_eq!(
            rejected_field("Expected request with `Content-Type: application/json`"),
            None
        );
        assert_eq!(rejected_field("EOF while parsing an object"), None);
    }
}
