//! Unified error codes for the Halwai admin core
//!
//! - [`ErrorCode`]: Standardized error codes for all error types
//! - [`ErrorCategory`]: Classification of errors by domain
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 4xxx: Order errors
//! - 6xxx: Shop errors
//! - 8xxx: Employee errors
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use shared::error::{ErrorCategory, ErrorCode};
//!
//! let code = ErrorCode::RiderRequired;
//! assert_eq!(code.category(), ErrorCategory::Order);
//! assert_eq!(u16::from(code), 4003);
//! ```

mod category;
mod codes;
mod http;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
