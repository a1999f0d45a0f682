//! 事件负载解析
//!
//! The backend is not consistent about payload shapes: order events carry
//! either the bare order or the `{order}` envelope returned by the REST
//! update, and cancellations carry either an id or an order object.

use serde_json::Value;

use crate::models::Order;

/// Order carried by `new-order` / `admin-order-updated`
pub struct OrderPayload;

impl OrderPayload {
    pub fn decode(payload: &Value) -> Result<Order, serde_json::Error> {
        match payload {
            Value::Object(map)
                if !has_id(map) && map.get("order").is_some_and(Value::is_object) =>
            {
                serde_json::from_value(map["order"].clone())
            }
            _ => serde_json::from_value(payload.clone()),
        }
    }
}

/// Identifier carried by `admin-order-cancelled`
pub struct CancelledPayload;

impl CancelledPayload {
    const ID_KEYS: [&'static str; 3] = ["_id", "id", "orderId"];

    pub fn order_id(payload: &Value) -> Option<String> {
        match payload {
            Value::String(id) if !id.is_empty() => Some(id.clone()),
            Value::Object(map) => {
                if let Some(inner) = map.get("order")
                    && inner.is_object()
                {
                    return Self::order_id(inner);
                }
                Self::ID_KEYS
                    .iter()
                    .filter_map(|key| map.get(*key))
                    .find_map(|v| v.as_str().filter(|s| !s.is_empty()))
                    .map(str::to_string)
            }
            _ => None,
        }
    }
}

fn has_id(map: &serde_json::Map<String, Value>) -> bool {
    map.contains_key("_id") || map.contains_key("id")
}
