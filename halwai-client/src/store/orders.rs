use parking_lot::RwLock;
use shared::models::Order;
use shared::order::OrderStatus;
use std::sync::Arc;
use tokio::sync::broadcast;

use super::{ChangeFeed, StoreChange};

/// Client-local order list, most recent first
///
/// Holds at most one order per id. Updates replace whole records by id,
/// never merge fields.
#[derive(Debug, Clone, Default)]
pub struct OrderStore {
    orders: Arc<RwLock<Vec<Order>>>,
    feed: ChangeFeed,
}

impl OrderStore {
    pub fn new(feed: ChangeFeed) -> Self {
        Self {
            orders: Arc::default(),
            feed,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.feed.subscribe()
    }

    /// Authoritative full refetch
    pub fn replace_all(&self, orders: Vec<Order>) {
        let orders = dedup_by_id(orders);
        let count = orders.len();
        *self.orders.write() = orders;
        tracing::debug!(count, "Orders replaced");
        self.feed.publish(StoreChange::OrdersReplaced { count });
    }

    /// `new-order`: prepend, or replace in place when the id is already known
    pub fn insert_new(&self, order: Order) {
        let id = order.id.clone();
        let change = {
            let mut orders = self.orders.write();
            match orders.iter_mut().find(|o| o.id == order.id) {
                Some(existing) => {
                    tracing::debug!(order_id = %id, "Duplicate new-order, replacing in place");
                    *existing = order;
                    StoreChange::OrderUpdated { id }
                }
                None => {
                    orders.insert(0, order);
                    StoreChange::OrderInserted { id }
                }
            }
        };
        self.feed.publish(change);
    }

    /// `admin-order-updated`: replace by id; unknown ids are ignored
    pub fn replace(&self, order: Order) -> bool {
        let id = order.id.clone();
        let replaced = {
            let mut orders = self.orders.write();
            match orders.iter_mut().find(|o| o.id == order.id) {
                Some(existing) => {
                    *existing = order;
                    true
                }
                None => false,
            }
        };

        if replaced {
            self.feed.publish(StoreChange::OrderUpdated { id });
        } else {
            tracing::debug!(order_id = %id, "Update for unknown order ignored");
        }
        replaced
    }

    /// Apply the initiating client's own update response
    ///
    /// Same as [`replace`](Self::replace) but inserts at the head when the
    /// order is not yet known locally.
    pub fn apply_local(&self, order: Order) {
        if !self.replace(order.clone()) {
            self.insert_new(order);
        }
    }

    /// `admin-order-cancelled`: remove by id
    pub fn remove(&self, id: &str) -> Option<Order> {
        let removed = {
            let mut orders = self.orders.write();
            let index = orders.iter().position(|o| o.id == id)?;
            orders.remove(index)
        };
        self.feed.publish(StoreChange::OrderRemoved { id: id.to_string() });
        Some(removed)
    }

    pub fn snapshot(&self) -> Vec<Order> {
        self.orders.read().clone()
    }

    pub fn get(&self, id: &str) -> Option<Order> {
        self.orders.read().iter().find(|o| o.id == id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.orders.read().iter().any(|o| o.id == id)
    }

    pub fn len(&self) -> usize {
        self.orders.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.read().is_empty()
    }

    pub fn ids(&self) -> Vec<String> {
        self.orders.read().iter().map(|o| o.id.clone()).collect()
    }

    /// Orders of one branch (legacy orders without a shop are excluded)
    pub fn for_shop(&self, shop_id: &str) -> Vec<Order> {
        self.orders
            .read()
            .iter()
            .filter(|o| o.belongs_to(shop_id))
            .cloned()
            .collect()
    }

    pub fn with_status(&self, status: OrderStatus) -> Vec<Order> {
        self.orders
            .read()
            .iter()
            .filter(|o| o.status == status)
            .cloned()
            .collect()
    }
}

/// 保留每个 id 的第一次出现
fn dedup_by_id(orders: Vec<Order>) -> Vec<Order> {
    let mut seen = std::collections::HashSet::new();
    let total = orders.len();
    let unique: Vec<Order> = orders
        .into_iter()
        .filter(|o| seen.insert(o.id.clone()))
        .collect();
    if unique.len() != total {
        tracing::warn!(dropped = total - unique.len(), "Duplicate order ids in refetch");
    }
    unique
}
