//! Order status transitions
//!
//! Pure functions: they validate a change and return the next order value.
//! Issuing the update request is the caller's job.

use thiserror::Error;

use super::status::OrderStatus;
use crate::error::ErrorCode;
use crate::models::{Order, Rider};

/// A button offered for the current status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextAction {
    pub label: &'static str,
    pub target: OrderStatus,
}

const PLACED_ACTIONS: &[NextAction] = &[
    NextAction {
        label: "Accept",
        target: OrderStatus::Accepted,
    },
    NextAction {
        label: "Reject",
        target: OrderStatus::Rejected,
    },
];

const ACCEPTED_ACTIONS: &[NextAction] = &[NextAction {
    label: "Mark as Ready",
    target: OrderStatus::Ready,
}];

const READY_ACTIONS: &[NextAction] = &[NextAction {
    label: "Out for Delivery",
    target: OrderStatus::OutForDelivery,
}];

const OUT_FOR_DELIVERY_ACTIONS: &[NextAction] = &[NextAction {
    label: "Mark Delivered",
    target: OrderStatus::Delivered,
}];

/// Actions available from `status`; empty for terminal statuses
pub fn next_actions(status: OrderStatus) -> &'static [NextAction] {
    match status {
        OrderStatus::Placed => PLACED_ACTIONS,
        OrderStatus::Accepted => ACCEPTED_ACTIONS,
        OrderStatus::Ready => READY_ACTIONS,
        OrderStatus::OutForDelivery => OUT_FOR_DELIVERY_ACTIONS,
        OrderStatus::Delivered | OrderStatus::Rejected | OrderStatus::Cancelled => &[],
    }
}

/// Extra input for a transition
#[derive(Debug, Clone, Default)]
pub struct TransitionContext {
    /// Rider picked in the selector. Wins over the one already on the order
    /// while it is ready; any other status only accepts the current rider.
    pub rider: Option<Rider>,
}

impl TransitionContext {
    pub fn with_rider(rider: Rider) -> Self {
        Self { rider: Some(rider) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("order cannot move from {from} to {to}")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },

    #[error("a rider must be assigned before moving from {from} to {to}")]
    GuardViolation { from: OrderStatus, to: OrderStatus },

    #[error("rider cannot be changed while the order is {status}")]
    RiderLocked { status: OrderStatus },
}

impl TransitionError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::IllegalTransition { .. } => ErrorCode::IllegalTransition,
            Self::GuardViolation { .. } => ErrorCode::RiderRequired,
            Self::RiderLocked { .. } => ErrorCode::RiderLocked,
        }
    }
}

/// Validate `order.status → target` and build the updated order
///
/// Check order: terminal source, rider guard, transition table, rider lock.
/// A dispatch without a rider is therefore always reported as a guard
/// violation, and a terminal order always as an illegal transition.
pub fn transition(
    order: &Order,
    target: OrderStatus,
    ctx: TransitionContext,
) -> Result<Order, TransitionError> {
    let from = order.status;
    if from.is_terminal() {
        return Err(TransitionError::IllegalTransition { from, to: target });
    }

    let changes_rider = ctx
        .rider
        .as_ref()
        .is_some_and(|picked| order.rider_info.as_ref().map(Rider::id) != Some(picked.id()));
    let rider = ctx.rider.or_else(|| order.rider_info.clone());
    if target.requires_rider() && rider.is_none() {
        return Err(TransitionError::GuardViolation { from, to: target });
    }

    if !from.can_transition_to(target) {
        return Err(TransitionError::IllegalTransition { from, to: target });
    }

    // 只有 ready 状态可以换骑手
    if changes_rider && !from.rider_editable() {
        return Err(TransitionError::RiderLocked { status: from });
    }

    let mut next = order.clone();
    next.status = target;
    next.rider_info = rider;
    Ok(next)
}

/// Attach, replace or clear (`None`) the rider without touching the status
pub fn assign_rider(order: &Order, rider: Option<Rider>) -> Result<Order, TransitionError> {
    if !order.status.rider_editable() {
        return Err(TransitionError::RiderLocked {
            status: order.status,
        });
    }
    let mut next = order.clone();
    next.rider_info = rider;
    Ok(next)
}
