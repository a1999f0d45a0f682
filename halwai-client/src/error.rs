//! Client error types

use shared::ErrorCode;
use shared::models::{InvalidOrder, NotARider};
use shared::order::TransitionError;
use thiserror::Error;

use crate::realtime::RealtimeError;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed (network unreachable, timeout, ...)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-2xx status
    #[error("Server error ({status}): {message}")]
    Server {
        status: http::StatusCode,
        message: String,
    },

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Status change or rider assignment rejected locally
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// Employee picked as rider is not a rider
    #[error(transparent)]
    NotARider(#[from] NotARider),

    /// Order received from the backend failed validation
    #[error("Invalid order: {0}")]
    InvalidOrder(#[from] InvalidOrder),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Shop not found: {0}")]
    ShopNotFound(String),

    #[error("Employee not found: {0}")]
    EmployeeNotFound(String),

    /// Another update for the same order is still pending
    #[error("Update already in progress for order {0}")]
    UpdateInFlight(String),

    /// Branch clone refused by the server
    #[error("Clone failed: {0}")]
    CloneFailed(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Local state file error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Realtime connection error
    #[error("Realtime error: {0}")]
    Realtime(#[from] RealtimeError),
}

impl ClientError {
    /// Error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Http(_) => ErrorCode::NetworkError,
            Self::Server { status, .. } => ErrorCode::from_http_status(*status),
            Self::InvalidResponse(_) => ErrorCode::InvalidFormat,
            Self::Transition(e) => e.code(),
            Self::NotARider(_) => ErrorCode::NotARider,
            Self::InvalidOrder(_) => ErrorCode::ValidationFailed,
            Self::OrderNotFound(_) => ErrorCode::OrderNotFound,
            Self::ShopNotFound(_) => ErrorCode::ShopNotFound,
            Self::EmployeeNotFound(_) => ErrorCode::EmployeeNotFound,
            Self::UpdateInFlight(_) => ErrorCode::UpdateInFlight,
            Self::CloneFailed(_) => ErrorCode::ShopCloneFailed,
            Self::Serialization(_) => ErrorCode::InvalidFormat,
            Self::Io(_) => ErrorCode::StorageError,
            Self::Realtime(e) => e.code(),
        }
    }

    /// Whether this failure is recovered locally (state kept, retry later)
    pub fn is_transient(&self) -> bool {
        self.code().category().is_transient()
    }

    /// Message shown to the operator
    pub fn user_message(&self) -> String {
        match self {
            Self::CloneFailed(message) if !message.is_empty() => message.clone(),
            Self::Server { message, .. } if !message.is_empty() => {
                format!("{}: {}", ErrorCode::ServerError.message(), message)
            }
            other => other.code().message().to_string(),
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
