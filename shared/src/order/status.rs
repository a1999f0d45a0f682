//! Order lifecycle status

use serde::{Deserialize, Serialize};
use std::fmt;

/// Order status
///
/// ```text
/// placed ──► accepted ──► ready ──► out_for_delivery ──► delivered
///    │                      (rider required)
///    └──► rejected
///
/// cancelled: set by the backend only
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Placed,
    Accepted,
    Ready,
    /// 历史数据中也出现过 `out-for-delivery`
    #[serde(alias = "out-for-delivery")]
    OutForDelivery,
    Delivered,
    Rejected,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 7] = [
        Self::Placed,
        Self::Accepted,
        Self::Ready,
        Self::OutForDelivery,
        Self::Delivered,
        Self::Rejected,
        Self::Cancelled,
    ];

    /// Wire representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Placed => "placed",
            Self::Accepted => "accepted",
            Self::Ready => "ready",
            Self::OutForDelivery => "out_for_delivery",
            Self::Delivered => "delivered",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }

    /// Badge label
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Placed => "Placed",
            Self::Accepted => "Accepted",
            Self::Ready => "Ready",
            Self::OutForDelivery => "Out for Delivery",
            Self::Delivered => "Delivered",
            Self::Rejected => "Rejected",
            Self::Cancelled => "Cancelled",
        }
    }

    /// No further transitions once here
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Rejected | Self::Cancelled)
    }

    /// Statuses reachable in one step
    pub const fn allowed_next(&self) -> &'static [OrderStatus] {
        match self {
            Self::Placed => &[Self::Accepted, Self::Rejected],
            Self::Accepted => &[Self::Ready],
            Self::Ready => &[Self::OutForDelivery],
            Self::OutForDelivery => &[Self::Delivered],
            Self::Delivered | Self::Rejected | Self::Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        self.allowed_next().contains(&target)
    }

    /// Whether entering this status needs a rider on the order
    pub const fn requires_rider(&self) -> bool {
        matches!(self, Self::OutForDelivery)
    }

    /// Rider may only be (re)assigned while the order waits for pickup
    pub const fn rider_editable(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when parsing an unknown status string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown order status: {0}")]
pub struct UnknownStatus(pub String);

impl std::str::FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "placed" => Ok(Self::Placed),
            "accepted" => Ok(Self::Accepted),
            "ready" => Ok(Self::Ready),
            "out_for_delivery" | "out-for-delivery" => Ok(Self::OutForDelivery),
            "delivered" => Ok(Self::Delivered),
            "rejected" => Ok(Self::Rejected),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses_have_no_successors() {
        for status in OrderStatus::ALL {
            assert_eq!(status.is_terminal(), status.allowed_next().is_empty());
        }
    }

    #[test]
    fn test_transition_table() {
        use OrderStatus::*;
        assert!(Placed.can_transition_to(Accepted));
        assert!(Placed.can_transition_to(Rejected));
        assert!(!Placed.can_transition_to(Ready));
        assert!(Accepted.can_transition_to(Ready));
        assert!(!Accepted.can_transition_to(Rejected));
        assert!(Ready.can_transition_to(OutForDelivery));
        assert!(OutForDelivery.can_transition_to(Delivered));
        assert!(!Delivered.can_transition_to(Placed));
        assert!(!Cancelled.can_transition_to(Accepted));
    }

    #[test]
    fn test_wire_format() {
        let json = serde_json::to_string(&OrderStatus::OutForDelivery).unwrap();
        assert_eq!(json, "\"out_for_delivery\"");

        let legacy: OrderStatus = serde_json::from_str("\"out-for-delivery\"").unwrap();
        assert_eq!(legacy, OrderStatus::OutForDelivery);

        assert!(serde_json::from_str::<OrderStatus>("\"shipped\"").is_err());
    }

    #[test]
    fn test_from_str_matches_serde() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert_eq!(
            "nope".parse::<OrderStatus>(),
            Err(UnknownStatus("nope".into()))
        );
    }
}
