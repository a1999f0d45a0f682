//! 订单操作
//!
//! 状态机校验 → `PUT /api/orders/update/{id}` → 本地应用服务器返回的订单。
//! 其它客户端通过 `admin-order-updated` 事件收到同一变更。

use parking_lot::Mutex;
use shared::models::{Order, Rider};
use shared::order::{self, OrderStatus, TransitionContext};
use std::collections::HashSet;
use std::sync::Arc;

use crate::http::AdminApi;
use crate::store::{EmployeeStore, OrderStore};
use crate::{ClientError, ClientResult};

/// Order mutations issued by this client
#[derive(Debug, Clone)]
pub struct OrderService {
    api: Arc<dyn AdminApi>,
    orders: OrderStore,
    employees: EmployeeStore,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

/// Marks an order as having a pending update until dropped
struct InFlight {
    set: Arc<Mutex<HashSet<String>>>,
    id: String,
}

impl InFlight {
    fn acquire(set: &Arc<Mutex<HashSet<String>>>, id: &str) -> ClientResult<Self> {
        if !set.lock().insert(id.to_string()) {
            return Err(ClientError::UpdateInFlight(id.to_string()));
        }
        Ok(Self {
            set: set.clone(),
            id: id.to_string(),
        })
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.set.lock().remove(&self.id);
    }
}

impl OrderService {
    pub fn new(api: Arc<dyn AdminApi>, orders: OrderStore, employees: EmployeeStore) -> Self {
        Self {
            api,
            orders,
            employees,
            in_flight: Arc::default(),
        }
    }

    /// Whether an update for `id` is pending
    pub fn is_updating(&self, id: &str) -> bool {
        self.in_flight.lock().contains(id)
    }

    /// Move an order to `target`, optionally attaching a rider first
    pub async fn transition(
        &self,
        id: &str,
        target: OrderStatus,
        rider_id: Option<&str>,
    ) -> ClientResult<Order> {
        let _guard = InFlight::acquire(&self.in_flight, id)?;
        let current = self.local(id)?;
        let ctx = match rider_id {
            Some(rider_id) => TransitionContext::with_rider(self.rider(rider_id)?),
            None => TransitionContext::default(),
        };

        let next = order::transition(&current, target, ctx)?;
        tracing::info!(
            order_id = %id,
            from = %current.status,
            to = %target,
            rider = next.rider_info.as_ref().map(Rider::id),
            "Updating order status"
        );
        self.submit(&next).await
    }

    /// Attach (or clear) the rider while the order is ready
    pub async fn assign_rider(&self, id: &str, rider_id: Option<&str>) -> ClientResult<Order> {
        let _guard = InFlight::acquire(&self.in_flight, id)?;
        let current = self.local(id)?;
        let rider = rider_id.map(|r| self.rider(r)).transpose()?;

        let next = order::assign_rider(&current, rider)?;
        tracing::info!(order_id = %id, rider = ?rider_id, "Assigning rider");
        self.submit(&next).await
    }

    /// Refetch every order
    pub async fn refresh(&self) -> ClientResult<usize> {
        let orders = self.api.fetch_orders().await?;
        let count = orders.len();
        self.orders.replace_all(orders);
        Ok(count)
    }

    /// Fetch one order and store it
    pub async fn fetch(&self, id: &str) -> ClientResult<Order> {
        let order = self.api.fetch_order(id).await?;
        self.orders.apply_local(order.clone());
        Ok(order)
    }

    pub fn orders(&self) -> &OrderStore {
        &self.orders
    }

    async fn submit(&self, next: &Order) -> ClientResult<Order> {
        match self.api.update_order(next).await {
            Ok(saved) => {
                tracing::info!(
                    target: "audit",
                    order_id = %saved.id,
                    status = %saved.status,
                    rider = saved.rider_info.as_ref().map(Rider::id),
                    "Order saved"
                );
                self.orders.apply_local(saved.clone());
                Ok(saved)
            }
            Err(e) => {
                tracing::error!(
                    order_id = %next.id,
                    code = e.code().code(),
                    error = %e,
                    "Order update failed"
                );
                Err(e)
            }
        }
    }

    fn local(&self, id: &str) -> ClientResult<Order> {
        self.orders
            .get(id)
            .ok_or_else(|| ClientError::OrderNotFound(id.to_string()))
    }

    fn rider(&self, id: &str) -> ClientResult<Rider> {
        let employee = self
            .employees
            .get(id)
            .ok_or_else(|| ClientError::EmployeeNotFound(id.to_string()))?;
        Ok(Rider::try_from(employee)?)
    }
}
