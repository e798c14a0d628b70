use academy_core::{AppError, FieldViolation};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;
use ts_rs::TS;

/// One rejected request field.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/field-error-response.ts"
)]
pub struct FieldErrorResponse {
    pub field: String,
    pub message: String,
}

/// API error payload.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/error-response.ts"
)]
pub struct ErrorResponse {
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldErrorResponse>,
}

/// HTTP API error wrapper around core application errors.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            AppError::Validation(_) | AppError::InvalidFields(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let fields = match &self.0 {
            AppError::InvalidFields(violations) => violations
                .iter()
                .map(|FieldViolation { field, message }| FieldErrorResponse {
                    field: field.clone(),
                    message: message.clone(),
                })
                .collect(),
            _ => Vec::new(),
        };

        // Internal details stay in the log.
        let message = match &self.0 {
            AppError::Internal(detail) => {
                error!(error = %detail, "request failed with internal error");
                "internal server error".to_owned()
            }
            other => other.to_string(),
        };

        let payload = Json(ErrorResponse {
            kind: self.0.kind().to_owned(),
            message,
            fields,
        });

        (status, payload).into_response()
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use academy_core::{AppError, FieldViolation};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    use super::ApiError;

    #[test]
    fn every_error_kind_has_its_status() {
        let cases = [
            (AppError::Unauthorized("x".to_owned()), StatusCode::UNAUTHORIZED),
            (AppError::Forbidden("x".to_owned()), StatusCode::FORBIDDEN),
            (AppError::NotFound("x".to_owned()), StatusCode::NOT_FOUND),
            (AppError::Validation("x".to_owned()), StatusCode::BAD_REQUEST),
            (
                AppError::InvalidFields(vec![FieldViolation::new("name", "must not be empty")]),
                StatusCode::BAD_REQUEST,
            ),
            (AppError::Conflict("x".to_owned()), StatusCode::CONFLICT),
            (AppError::RateLimited("x".to_owned()), StatusCode::TOO_MANY_REQUESTS),
            (AppError::Internal("x".to_owned()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, status) in cases {
            assert_eq!(ApiError::from(error).into_response().status(), status);
        }
    }
}
