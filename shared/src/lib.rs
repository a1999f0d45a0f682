//! Shared types for the Halwai admin core
//!
//! Domain models, the order state machine, realtime event types, REST
//! response envelopes and the error-code catalogue.

pub mod error;
pub mod message;
pub mod models;
pub mod order;
pub mod response;

// Re-exports
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ErrorCategory, ErrorCode};
pub use message::{EventName, RealtimeEvent};
pub use models::{Employee, Order, OrderItem, Rider, Shop};
pub use order::{OrderStatus, TransitionError};
