//! 实时事件类型定义
//!
//! Event names pushed by the admin backend over Socket.IO, and their typed
//! payloads. Payloads are parsed once, at the boundary; everything past
//! [`RealtimeEvent::from_wire`] works with typed values.

use serde_json::Value;
use std::fmt;
use thiserror::Error;

use crate::error::ErrorCode;
use crate::models::{InvalidOrder, Order};

pub mod payload;
pub use payload::*;

/// Realtime event names (subscribe direction)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
    /// 连接建立 (本地合成)
    Connect,
    /// 连接断开 (本地合成)
    Disconnect,
    NewOrder,
    AdminOrderUpdated,
    AdminOrderCancelled,
    ShopUpdated,
    AdminEmpUpdate,
}

impl EventName {
    pub const ALL: [EventName; 7] = [
        Self::Connect,
        Self::Disconnect,
        Self::NewOrder,
        Self::AdminOrderUpdated,
        Self::AdminOrderCancelled,
        Self::ShopUpdated,
        Self::AdminEmpUpdate,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::NewOrder => "new-order",
            Self::AdminOrderUpdated => "admin-order-updated",
            Self::AdminOrderCancelled => "admin-order-cancelled",
            Self::ShopUpdated => "shop-updated",
            Self::AdminEmpUpdate => "admin-empupdate",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.as_str() == name)
    }

    /// Generated locally by the connection, never sent by the server
    pub const fn is_synthetic(&self) -> bool {
        matches!(self, Self::Connect | Self::Disconnect)
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed realtime event
#[derive(Debug, Clone, PartialEq)]
pub enum RealtimeEvent {
    Connect,
    Disconnect { reason: String },
    NewOrder(Order),
    OrderUpdated(Order),
    OrderCancelled { order_id: String },
    /// Signal only; the payload (if any) is not trusted, shops are refetched
    ShopUpdated,
    /// Signal only; employees are refetched
    EmployeesUpdated,
}

/// Malformed payload for a known event
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("{event}: missing payload")]
    Missing { event: EventName },

    #[error("{event}: invalid payload: {source}")]
    Invalid {
        event: EventName,
        #[source]
        source: serde_json::Error,
    },

    #[error("{event}: rejected order: {source}")]
    Rejected {
        event: EventName,
        #[source]
        source: InvalidOrder,
    },

    #[error("{event}: no order id in payload")]
    MissingOrderId { event: EventName },

    #[error("{event}: not a server event")]
    Synthetic { event: EventName },
}

impl PayloadError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Rejected { .. } => ErrorCode::ValidationFailed,
            _ => ErrorCode::ProtocolError,
        }
    }
}

impl RealtimeEvent {
    pub fn name(&self) -> EventName {
        match self {
            Self::Connect => EventName::Connect,
            Self::Disconnect { .. } => EventName::Disconnect,
            Self::NewOrder(_) => EventName::NewOrder,
            Self::OrderUpdated(_) => EventName::AdminOrderUpdated,
            Self::OrderCancelled { .. } => EventName::AdminOrderCancelled,
            Self::ShopUpdated => EventName::ShopUpdated,
            Self::EmployeesUpdated => EventName::AdminEmpUpdate,
        }
    }

    /// Parse a server event frame `[name, ...args]`
    ///
    /// Unknown names yield `Ok(None)`. Server frames may not claim the
    /// `connect` / `disconnect` names.
    pub fn from_wire(name: &str, args: &[Value]) -> Result<Option<Self>, PayloadError> {
        let Some(event) = EventName::parse(name) else {
            return Ok(None);
        };
        let first = args.first();

        let parsed = match event {
            EventName::Connect | EventName::Disconnect => {
                return Err(PayloadError::Synthetic { event });
            }
            EventName::NewOrder => Self::NewOrder(decode_order(event, first)?),
            EventName::AdminOrderUpdated => Self::OrderUpdated(decode_order(event, first)?),
            EventName::AdminOrderCancelled => {
                let payload = first.ok_or(PayloadError::Missing { event })?;
                let order_id = CancelledPayload::order_id(payload)
                    .ok_or(PayloadError::MissingOrderId { event })?;
                Self::OrderCancelled { order_id }
            }
            EventName::ShopUpdated => Self::ShopUpdated,
            EventName::AdminEmpUpdate => Self::EmployeesUpdated,
        };
        Ok(Some(parsed))
    }
}

fn decode_order(event: EventName, payload: Option<&Value>) -> Result<Order, PayloadError> {
    let payload = payload.ok_or(PayloadError::Missing { event })?;
    let order =
        OrderPayload::decode(payload).map_err(|source| PayloadError::Invalid { event, source })?;
    order
        .validate()
        .map_err(|source| PayloadError::Rejected { event, source })?;
    Ok(order)
}
