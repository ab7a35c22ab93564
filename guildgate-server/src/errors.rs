use axum::response::IntoResponse;
use axum::Json;
use http::StatusCode;
use serde_json::json;

/// Error type rendered to HTTP clients as a JSON body.
///
/// `reason` carries the machine-readable code the bot matches on
/// (e.g. `duplicate_subject`); `detail` is the human-readable message.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub detail: String,
    pub reason: Option<&'static str>,
    pub status_code: StatusCode,
}

impl ApiError {
    /// Create a new ApiError with a detail message and status code
    pub fn new<S: ToString>(detail: S, status_code: StatusCode) -> Self {
        Self {
            detail: detail.to_string(),
            reason: None,
            status_code,
        }
    }

    /// Attach a machine-readable reason code
    pub fn with_reason(mut self, reason: &'static str) -> Self {
        self.reason = Some(reason);
        self
    }

    /// Create new Internal Server Error (500) with a detail message
    pub fn internal<S: ToString>(detail: S) -> Self {
        Self::new(detail, StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Create new Bad Request Error (400) with a detail message
    pub fn bad_request<S: ToString>(detail: S) -> Self {
        Self::new(detail, StatusCode::BAD_REQUEST)
    }

    /// Create new Bad Gateway (502) with a detail message
    pub fn bad_gateway<S: ToString>(detail: S) -> Self {
        Self::new(detail, StatusCode::BAD_GATEWAY)
    }

    /// Create new Unauthorized (401) with a detail message
    pub fn unauthorized<S: ToString>(detail: S) -> Self {
        Self::new(detail, StatusCode::UNAUTHORIZED)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status_code = self.status_code;
        let body = match self.reason {
            Some(reason) => json!({
                "detail": self.detail,
                "reason": reason,
            }),
            None => json!({
                "detail": self.detail,
            }),
        };
        (status_code, Json(body)).into_response()
    }
}
