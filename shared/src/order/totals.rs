//! Order total verification using rust_decimal
//!
//! Totals are computed server-side and trusted. The check here only reports
//! drift between `totalAmount` and the line items; nothing is rejected.

use rust_decimal::prelude::*;

use crate::error::ErrorCode;
use crate::models::{Order, OrderItem};

/// Rounding to paise (2 decimal places)
const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// price × quantity, rounded half away from zero
pub fn line_total(item: &OrderItem) -> Decimal {
    (to_decimal(item.price) * Decimal::from(item.quantity))
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Σ line totals
pub fn items_total(items: &[OrderItem]) -> Decimal {
    items.iter().map(line_total).sum()
}

/// Outcome of comparing the declared total with the items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TotalCheck {
    pub declared: Decimal,
    pub computed: Decimal,
}

impl TotalCheck {
    pub fn difference(&self) -> Decimal {
        (self.declared - self.computed).abs()
    }

    pub fn is_consistent(&self) -> bool {
        self.difference() <= MONEY_TOLERANCE
    }

    /// `TotalMismatch` when the totals drift apart
    pub fn error_code(&self) -> Option<ErrorCode> {
        (!self.is_consistent()).then_some(ErrorCode::TotalMismatch)
    }
}

impl Order {
    /// Compare `total_amount` against Σ price × quantity
    pub fn verify_total(&self) -> TotalCheck {
        TotalCheck {
            declared: to_decimal(self.total_amount),
            computed: items_total(&self.order_items),
        }
    }
}
