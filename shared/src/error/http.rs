//! Classify backend HTTP statuses

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Classify a non-2xx backend response
    pub fn from_http_status(status: StatusCode) -> Self {
        match status {
            s if s.is_success() => Self::Success,
            StatusCode::NOT_FOUND => Self::NotFound,
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => Self::ValidationFailed,
            StatusCode::CONFLICT => Self::UpdateInFlight,
            _ => Self::ServerError,
        }
    }
}
