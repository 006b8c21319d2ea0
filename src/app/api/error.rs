use crate::utils::error::MissionControlError;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Error body every endpoint returns: `{"detail": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, detail)
    }

    pub fn unprocessable(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, detail)
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, detail)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

impl From<MissionControlError> for ApiError {
    fn from(err: MissionControlError) -> Self {
        match &err {
            MissionControlError::WorkflowNotFound { .. } => Self::not_found("Workflow not found"),
            MissionControlError::WorkflowAlreadyRunning { .. } => {
                Self::new(StatusCode::CONFLICT, "Workflow already running")
            }
            MissionControlError::ValidationError { message } => Self::unprocessable(message.clone()),
            MissionControlError::InvalidConfigValueError { .. } => Self::unprocessable(err.to_string()),
            MissionControlError::GatewayUnavailable { .. } => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, err.to_string())
            }
            _ => {
                tracing::error!(
                    "Request failed: {} (Category: {:?}, Severity: {:?})",
                    err,
                    err.category(),
                    err.severity()
                );
                Self::internal(err.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let status = match rejection.status() {
            StatusCode::BAD_REQUEST => StatusCode::UNPROCESSABLE_ENTITY,
            other => other,
        };
        Self::new(status, rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::unprocessable(rejection.body_text())
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_map_to_status_codes() {
        let cases = [
            (
                MissionControlError::WorkflowNotFound { id: "wf-1".into() },
                StatusCode::NOT_FOUND,
            ),
            (
                MissionControlError::WorkflowAlreadyRunning { id: "wf-1".into() },
                StatusCode::CONFLICT,
            ),
            (MissionControlError::validation("name too long"), StatusCode::UNPROCESSABLE_ENTITY),
            (
                MissionControlError::GatewayUnavailable { message: "down".into() },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                MissionControlError::GatewayCommandError {
                    command: "openclaw".into(),
                    details: "boom".into(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status, expected);
        }
    }

    #[test]
    fn test_validation_detail_is_message() {
        let err = ApiError::from(MissionControlError::validation("task must not be empty"));
        assert_eq!(err.detail, "task must not be empty");
    }
}
