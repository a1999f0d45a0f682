//! Data models
//!
//! Wire shapes of the admin backend (`_id` identifiers, camelCase fields).
//! Unknown fields are kept in an `extra` map so records survive a round-trip.

pub mod employee;
pub mod order;
pub mod shop;

// Re-exports
pub use employee::*;
pub use order::*;
pub use shop::*;
