//! Unified error codes for the Halwai admin core
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 4xxx: Order errors
//! - 6xxx: Shop (branch) errors
//! - 8xxx: Employee errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so they serialize compactly
/// and can be matched by any rendering surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Invalid format
    InvalidFormat = 6,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Status change not allowed from the current status
    IllegalTransition = 4002,
    /// A rider must be attached before dispatch
    RiderRequired = 4003,
    /// Rider can only be changed while the order is ready
    RiderLocked = 4004,
    /// Employee is not a rider
    NotARider = 4005,
    /// Another update for this order is still pending
    UpdateInFlight = 4006,
    /// Order total does not match its items
    TotalMismatch = 4007,

    // ==================== 6xxx: Shop ====================
    /// Shop not found
    ShopNotFound = 6001,
    /// Branch clone failed
    ShopCloneFailed = 6002,

    // ==================== 8xxx: Employee ====================
    /// Employee not found
    EmployeeNotFound = 8001,

    // ==================== 9xxx: System ====================
    /// Network unreachable or request failed
    NetworkError = 9001,
    /// Server returned an error status
    ServerError = 9002,
    /// Malformed realtime frame or payload
    ProtocolError = 9003,
    /// Realtime connection lost
    ConnectionLost = 9004,
    /// Local state file could not be read or written
    StorageError = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the default message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Success",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::InvalidFormat => "Invalid format",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::IllegalTransition => "Order cannot move to that status",
            ErrorCode::RiderRequired => "Please select a rider before sending out for delivery",
            ErrorCode::RiderLocked => "Rider can only be changed while the order is ready",
            ErrorCode::NotARider => "Selected employee is not a rider",
            ErrorCode::UpdateInFlight => "Order update already in progress",
            ErrorCode::TotalMismatch => "Order total does not match its items",

            // Shop
            ErrorCode::ShopNotFound => "Shop not found",
            ErrorCode::ShopCloneFailed => "Failed to create branch",

            // Employee
            ErrorCode::EmployeeNotFound => "Employee not found",

            // System
            ErrorCode::NetworkError => "Network error",
            ErrorCode::ServerError => "Failed to update order",
            ErrorCode::ProtocolError => "Malformed realtime message",
            ErrorCode::ConnectionLost => "Realtime connection lost",
            ErrorCode::StorageError => "Local storage error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            6 => Ok(ErrorCode::InvalidFormat),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::IllegalTransition),
            4003 => Ok(ErrorCode::RiderRequired),
            4004 => Ok(ErrorCode::RiderLocked),
            4005 => Ok(ErrorCode::NotARider),
            4006 => Ok(ErrorCode::UpdateInFlight),
            4007 => Ok(ErrorCode::TotalMismatch),

            // Shop
            6001 => Ok(ErrorCode::ShopNotFound),
            6002 => Ok(ErrorCode::ShopCloneFailed),

            // Employee
            8001 => Ok(ErrorCode::EmployeeNotFound),

            // System
            9001 => Ok(ErrorCode::NetworkError),
            9002 => Ok(ErrorCode::ServerError),
            9003 => Ok(ErrorCode::ProtocolError),
            9004 => Ok(ErrorCode::ConnectionLost),
            9005 => Ok(ErrorCode::StorageError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::NotFound.code(), 3);
        assert_eq!(ErrorCode::OrderNotFound.code(), 4001);
        assert_eq!(ErrorCode::IllegalTransition.code(), 4002);
        assert_eq!(ErrorCode::RiderRequired.code(), 4003);
        assert_eq!(ErrorCode::ShopNotFound.code(), 6001);
        assert_eq!(ErrorCode::EmployeeNotFound.code(), 8001);
        assert_eq!(ErrorCode::NetworkError.code(), 9001);
    }

    #[test]
    fn test_is_success() {
        assert!(ErrorCode::Success.is_success());
        assert!(!ErrorCode::NotFound.is_success());
        assert!(!ErrorCode::IllegalTransition.is_success());
    }

    #[test]
    fn test_try_from_valid() {
        assert_eq!(ErrorCode::try_from(0), Ok(ErrorCode::Success));
        assert_eq!(ErrorCode::try_from(4004), Ok(ErrorCode::RiderLocked));
        assert_eq!(ErrorCode::try_from(6002), Ok(ErrorCode::ShopCloneFailed));
        assert_eq!(ErrorCode::try_from(9003), Ok(ErrorCode::ProtocolError));
    }

    #[test]
    fn test_try_from_invalid() {
        assert_eq!(ErrorCode::try_from(1), Err(InvalidErrorCode(1)));
        assert_eq!(ErrorCode::try_from(999), Err(InvalidErrorCode(999)));
        assert_eq!(ErrorCode::try_from(4999), Err(InvalidErrorCode(4999)));
        assert_eq!(ErrorCode::try_from(10000), Err(InvalidErrorCode(10000)));
    }

    #[test]
    fn test_serialize() {
        let json = serde_json::to_string(&ErrorCode::RiderRequired).unwrap();
        assert_eq!(json, "4003");

        let json = serde_json::to_string(&ErrorCode::Success).unwrap();
        assert_eq!(json, "0");
    }

    #[test]
    fn test_deserialize() {
        let code: ErrorCode = serde_json::from_str("4002").unwrap();
        assert_eq!(code, ErrorCode::IllegalTransition);

        let result: Result<ErrorCode, _> = serde_json::from_str("1234");
        assert!(result.is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", ErrorCode::OrderNotFound), "4001");
        assert_eq!(InvalidErrorCode(42).to_string(), "invalid error code: 42");
    }

    #[test]
    fn test_message() {
        assert_eq!(
            ErrorCode::RiderRequired.message(),
            "Please select a rider before sending out for delivery"
        );
        assert_eq!(ErrorCode::ServerError.message(), "Failed to update order");
    }
}
