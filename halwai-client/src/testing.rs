//! In-memory admin backend
//!
//! [`MockApi`] implements [`AdminApi`] over plain vectors so that services
//! and the reconciler can run without a server. Pair it with
//! [`MemoryConnector`](crate::realtime::MemoryConnector) for the realtime side.

use async_trait::async_trait;
use http::StatusCode;
use parking_lot::Mutex;
use shared::models::{CloneShopRequest, Employee, Order, Shop};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

use crate::http::AdminApi;
use crate::{ClientError, ClientResult};

#[derive(Debug, Default)]
struct MockState {
    orders: Vec<Order>,
    shops: Vec<Shop>,
    employees: Vec<Employee>,
    updates: Vec<Order>,
    fail_updates: bool,
    fail_fetches: bool,
}

#[derive(Debug, Default)]
pub struct MockApi {
    state: Mutex<MockState>,
    order_fetches: AtomicUsize,
    shop_fetches: AtomicUsize,
    employee_fetches: AtomicUsize,
    gate: Mutex<Option<Arc<Notify>>>,
    entered: Notify,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_orders(self, orders: Vec<Order>) -> Self {
        self.set_orders(orders);
        self
    }

    pub fn with_shops(self, shops: Vec<Shop>) -> Self {
        self.set_shops(shops);
        self
    }

    pub fn with_employees(self, employees: Vec<Employee>) -> Self {
        self.set_employees(employees);
        self
    }

    pub fn set_orders(&self, orders: Vec<Order>) {
        self.state.lock().orders = orders;
    }

    pub fn set_shops(&self, shops: Vec<Shop>) {
        self.state.lock().shops = shops;
    }

    pub fn set_employees(&self, employees: Vec<Employee>) {
        self.state.lock().employees = employees;
    }

    /// Every order body received by `update_order`, in order
    pub fn updates(&self) -> Vec<Order> {
        self.state.lock().updates.clone()
    }

    /// Answer `update_order` with a 500
    pub fn fail_updates(&self, fail: bool) {
        self.state.lock().fail_updates = fail;
    }

    /// Fail every fetch as if the network were down
    pub fn fail_fetches(&self, fail: bool) {
        self.state.lock().fail_fetches = fail;
    }

    /// Hold the next `update_order` call until the returned gate is notified
    pub fn hold_updates(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock() = Some(gate.clone());
        gate
    }

    /// Wait until a held `update_order` call has started
    pub async fn wait_for_pending_update(&self) {
        self.entered.notified().await;
    }

    pub fn order_fetches(&self) -> usize {
        self.order_fetches.load(Ordering::SeqCst)
    }

    pub fn shop_fetches(&self) -> usize {
        self.shop_fetches.load(Ordering::SeqCst)
    }

    pub fn employee_fetches(&self) -> usize {
        self.employee_fetches.load(Ordering::SeqCst)
    }

    fn check_network(&self) -> ClientResult<()> {
        if self.state.lock().fail_fetches {
            return Err(ClientError::Server {
                status: StatusCode::SERVICE_UNAVAILABLE,
                message: "backend unreachable".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl AdminApi for MockApi {
    async fn fetch_orders(&self) -> ClientResult<Vec<Order>> {
        self.order_fetches.fetch_add(1, Ordering::SeqCst);
        self.check_network()?;
        Ok(self.state.lock().orders.clone())
    }

    async fn fetch_order(&self, id: &str) -> ClientResult<Order> {
        self.check_network()?;
        self.state
            .lock()
            .orders
            .iter()
            .find(|o| o.id == id)
            .cloned()
            .ok_or_else(|| ClientError::Server {
                status: StatusCode::NOT_FOUND,
                message: "Order not found".into(),
            })
    }

    async fn update_order(&self, order: &Order) -> ClientResult<Order> {
        let gate = self.gate.lock().take();
        if let Some(gate) = gate {
            self.entered.notify_one();
            gate.notified().await;
        }

        let mut state = self.state.lock();
        state.updates.push(order.clone());
        if state.fail_updates {
            return Err(ClientError::Server {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "Failed to update order".into(),
            });
        }
        match state.orders.iter_mut().find(|o| o.id == order.id) {
            Some(existing) => *existing = order.clone(),
            None => state.orders.push(order.clone()),
        }
        Ok(order.clone())
    }

    async fn fetch_employees(&self) -> ClientResult<Vec<Employee>> {
        self.employee_fetches.fetch_add(1, Ordering::SeqCst);
        self.check_network()?;
        Ok(self.state.lock().employees.clone())
    }

    async fn fetch_shops(&self) -> ClientResult<Vec<Shop>> {
        self.shop_fetches.fetch_add(1, Ordering::SeqCst);
        self.check_network()?;
        Ok(self.state.lock().shops.clone())
    }

    async fn update_shop(&self, shop: &Shop) -> ClientResult<Shop> {
        let mut state = self.state.lock();
        match state.shops.iter_mut().find(|s| s.id == shop.id) {
            Some(existing) => *existing = shop.clone(),
            None => {
                return Err(ClientError::Server {
                    status: StatusCode::NOT_FOUND,
                    message: "Shop not found".into(),
                });
            }
        }
        Ok(shop.clone())
    }

    async fn clone_shop(&self, request: &CloneShopRequest) -> ClientResult<Shop> {
        let mut state = self.state.lock();
        let Some(source) = state.shops.iter().find(|s| s.id == request.source_shop_id) else {
            return Err(ClientError::CloneFailed("Source shop not found".into()));
        };
        if state.shops.iter().any(|s| s.code == request.code) {
            return Err(ClientError::CloneFailed("Shop code already exists".into()));
        }

        let mut shop = source.clone();
        shop.id = format!("{}-{}", source.id, request.code.to_lowercase());
        shop.name = request.name.clone();
        shop.code = request.code.clone();
        state.shops.push(shop.clone());
        Ok(shop)
    }
}
