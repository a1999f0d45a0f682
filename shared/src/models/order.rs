//! Order Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::employee::Rider;
use crate::order::OrderStatus;

/// Order line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Line id assigned by the backend (absent on some legacy orders)
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub quantity: u32,
    /// Unit price in currency unit
    pub price: f64,
    /// Fields this client does not interpret (variant, notes, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OrderItem {
    pub fn new(name: impl Into<String>, quantity: u32, price: f64) -> Self {
        Self {
            id: None,
            name: name.into(),
            quantity,
            price,
            extra: Map::new(),
        }
    }

    /// price × quantity
    pub fn subtotal(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

/// Order rejected at the boundary
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidOrder {
    #[error("order has an empty id")]
    MissingId,

    #[error("order {order_id}: item {index} has quantity 0")]
    ZeroQuantity { order_id: String, index: usize },

    #[error("order {order_id}: item {index} has invalid price {price}")]
    InvalidPrice {
        order_id: String,
        index: usize,
        price: f64,
    },
}

/// Order record as served by the admin backend
///
/// Only the fields the status workflow needs are typed. Everything else
/// (customer, address, payment, ...) rides along in `extra` so that a full
/// record `PUT` never drops server data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    /// Orders without a status are treated as freshly placed
    #[serde(default)]
    pub status: OrderStatus,
    /// Serialized as `null` when no rider is attached
    #[serde(default)]
    pub rider_info: Option<Rider>,
    #[serde(default)]
    pub order_items: Vec<OrderItem>,
    /// Total amount in currency unit
    #[serde(default)]
    pub total_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Owning branch; legacy orders may not carry one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shop_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Order {
    /// Create a placed order (mostly useful for fixtures)
    pub fn new(id: impl Into<String>, items: Vec<OrderItem>) -> Self {
        let total_amount = items.iter().map(OrderItem::subtotal).sum();
        Self {
            id: id.into(),
            status: OrderStatus::Placed,
            rider_info: None,
            order_items: items,
            total_amount,
            created_at: Some(Utc::now()),
            shop_id: None,
            extra: Map::new(),
        }
    }

    pub fn with_shop(mut self, shop_id: impl Into<String>) -> Self {
        self.shop_id = Some(shop_id.into());
        self
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_rider(mut self, rider: Rider) -> Self {
        self.rider_info = Some(rider);
        self
    }

    pub fn has_rider(&self) -> bool {
        self.rider_info.is_some()
    }

    pub fn belongs_to(&self, shop_id: &str) -> bool {
        self.shop_id.as_deref() == Some(shop_id)
    }

    /// Items need `quantity ≥ 1` and a finite `price ≥ 0`
    pub fn validate(&self) -> Result<(), InvalidOrder> {
        if self.id.is_empty() {
            return Err(InvalidOrder::MissingId);
        }
        for (index, item) in self.order_items.iter().enumerate() {
            if item.quantity == 0 {
                return Err(InvalidOrder::ZeroQuantity {
                    order_id: self.id.clone(),
                    index,
                });
            }
            if !item.price.is_finite() || item.price < 0.0 {
                return Err(InvalidOrder::InvalidPrice {
                    order_id: self.id.clone(),
                    index,
                    price: item.price,
                });
            }
        }
        Ok(())
    }

    /// Last six characters of the id, upper-cased (as shown on order rows)
    pub fn short_id(&self) -> String {
        let start = self
            .id
            .char_indices()
            .rev()
            .nth(5)
            .map(|(i, _)| i)
            .unwrap_or(0);
        self.id[start..].to_uppercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_backend_order() {
        let value = json!({
            "_id": "665f1c2a9b1e8a0012ab34cd",
            "status": "ready",
            "riderInfo": null,
            "orderItems": [
                {"_id": "i1", "name": "Kaju Katli", "quantity": 2, "price": 450.0},
                {"name": "Samosa", "quantity": 4, "price": 25}
            ],
            "totalAmount": 1000,
            "createdAt": "2024-06-04T10:15:00.000Z",
            "shopId": "shop-1",
            "customer": {"name": "Asha", "phone": "98xxxxxx01"}
        });

        let order: Order = serde_json::from_value(value).unwrap();
        assert_eq!(order.id, "665f1c2a9b1e8a0012ab34cd");
        assert_eq!(order.status, OrderStatus::Ready);
        assert!(order.rider_info.is_none());
        assert_eq!(order.order_items.len(), 2);
        assert_eq!(order.order_items[1].id, None);
        assert_eq!(order.total_amount, 1000.0);
        assert!(order.belongs_to("shop-1"));
        assert_eq!(order.extra["customer"]["name"], "Asha");
    }

    #[test]
    fn test_serialize_preserves_unknown_fields() {
        let value = json!({
            "_id": "o1",
            "status": "placed",
            "orderItems": [],
            "totalAmount": 0,
            "paymentMode": "cod",
            "address": {"line1": "MG Road"}
        });
        let order: Order = serde_json::from_value(value).unwrap();
        let out = serde_json::to_value(&order).unwrap();

        assert_eq!(out["_id"], "o1");
        assert_eq!(out["paymentMode"], "cod");
        assert_eq!(out["address"]["line1"], "MG Road");
        // riderInfo is always sent, as null when cleared
        assert!(out.get("riderInfo").unwrap().is_null());
    }

    #[test]
    fn test_id_alias_and_default_status() {
        let order: Order = serde_json::from_value(json!({"id": "o9"})).unwrap();
        assert_eq!(order.id, "o9");
        assert_eq!(order.status, OrderStatus::Placed);
        assert!(order.order_items.is_empty());
    }

    #[test]
    fn test_short_id() {
        let order = Order::new("665f1c2a9b1e8a0012ab34cd", vec![]);
        assert_eq!(order.short_id(), "AB34CD");

        let order = Order::new("abc", vec![]);
        assert_eq!(order.short_id(), "ABC");
    }

    #[test]
    fn test_validate_items() {
        let order = Order::new("o1", vec![OrderItem::new("Ladoo", 3, 20.0)]);
        assert_eq!(order.validate(), Ok(()));

        let order = Order::new(
            "o2",
            vec![OrderItem::new("Ladoo", 1, 20.0), OrderItem::new("Jalebi", 0, 60.0)],
        );
        assert_eq!(
            order.validate(),
            Err(InvalidOrder::ZeroQuantity {
                order_id: "o2".into(),
                index: 1
            })
        );

        let order = Order::new("o3", vec![OrderItem::new("Barfi", 1, -5.0)]);
        assert!(matches!(
            order.validate(),
            Err(InvalidOrder::InvalidPrice { index: 0, .. })
        ));

        let order = Order::new("o4", vec![OrderItem::new("Barfi", 1, f64::INFINITY)]);
        assert!(order.validate().is_err());

        // 免费赠品是合法的
        let order = Order::new("o5", vec![OrderItem::new("Saunf", 1, 0.0)]);
        assert!(order.validate().is_ok());

        assert_eq!(Order::new("", vec![]).validate(), Err(InvalidOrder::MissingId));
    }

    #[test]
    fn test_new_computes_total() {
        let order = Order::new(
            "o1",
            vec![OrderItem::new("Ladoo", 3, 20.0), OrderItem::new("Jalebi", 1, 60.0)],
        );
        assert_eq!(order.total_amount, 120.0);
    }
}
