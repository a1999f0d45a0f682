//! Order lifecycle
//!
//! - Status: the seven lifecycle states and the transition table
//! - Machine: validated transitions and rider assignment
//! - Totals: decimal check of declared totals against line items

pub mod machine;
pub mod status;
pub mod totals;

// Re-exports
pub use machine::{
    NextAction, TransitionContext, TransitionError, assign_rider, next_actions, transition,
};
pub use status::{OrderStatus, UnknownStatus};
pub use totals::{MONEY_TOLERANCE, TotalCheck};
