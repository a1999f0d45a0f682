//! Reconciler - 把实时事件应用到本地 store
//!
//! ```text
//! RealtimeClient dispatch
//!       │ (Subscription 回调只负责转发)
//!       ▼
//! mpsc (按接收顺序)
//!       │
//!       ▼
//! reconciler task ── apply(event)
//!   ├── Connect             → 全量拉取 orders / shops / employees
//!   ├── NewOrder            → OrderStore::insert_new
//!   ├── OrderUpdated        → OrderStore::replace
//!   ├── OrderCancelled      → OrderStore::remove
//!   ├── ShopUpdated         → ShopService::refresh
//!   └── EmployeesUpdated    → 拉取 employees
//! ```
//!
//! 每次 connect (包括重连) 都先全量拉取, 断线期间错过的事件由此补齐。
//! 拉取失败时保留原有状态, 只记录日志。

use shared::message::{EventName, RealtimeEvent};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::http::AdminApi;
use crate::realtime::{Registry, Subscription};
use crate::shops::ShopService;
use crate::store::{EmployeeStore, OrderStore};

/// Applies realtime events to the local stores
#[derive(Debug, Clone)]
pub struct Reconciler {
    api: Arc<dyn AdminApi>,
    orders: OrderStore,
    employees: EmployeeStore,
    shops: ShopService,
}

/// Running reconciler: its subscriptions and apply task
#[derive(Debug)]
pub struct ReconcilerHandle {
    subscriptions: Vec<Subscription>,
    applied: watch::Receiver<u64>,
    task: JoinHandle<()>,
}

impl Reconciler {
    pub fn new(
        api: Arc<dyn AdminApi>,
        orders: OrderStore,
        employees: EmployeeStore,
        shops: ShopService,
    ) -> Self {
        Self {
            api,
            orders,
            employees,
            shops,
        }
    }

    /// Subscribe to every event and start applying them in receipt order
    pub fn spawn(self, registry: &Registry) -> ReconcilerHandle {
        let (tx, mut rx) = mpsc::unbounded_channel::<RealtimeEvent>();
        let subscriber = registry.subscriber();
        let subscriptions = EventName::ALL
            .into_iter()
            .map(|name| {
                let tx = tx.clone();
                subscriber.on(name, move |event| {
                    if tx.send(event.clone()).is_err() {
                        tracing::debug!(
                            event = %event.name(),
                            "Reconciler stopped, event dropped"
                        );
                    }
                })
            })
            .collect();
        drop(tx);

        let (applied_tx, applied) = watch::channel(0u64);
        let task = tokio::spawn(async move {
            // 所有 Subscription 释放后 channel 关闭, 任务随之结束
            while let Some(event) = rx.recv().await {
                self.apply(event).await;
                applied_tx.send_modify(|n| *n += 1);
            }
            tracing::debug!("Reconciler task finished");
        });

        ReconcilerHandle {
            subscriptions,
            applied,
            task,
        }
    }

    /// Apply one event to the local stores
    pub async fn apply(&self, event: RealtimeEvent) {
        match event {
            RealtimeEvent::Connect => self.full_refetch().await,
            RealtimeEvent::Disconnect { reason } => {
                tracing::info!(reason = %reason, "Realtime lost, local state may go stale");
            }
            RealtimeEvent::NewOrder(order) => {
                let check = order.verify_total();
                if let Some(code) = check.error_code() {
                    tracing::warn!(
                        order_id = %order.id,
                        code = code.code(),
                        declared = %check.declared,
                        computed = %check.computed,
                        "Order total does not match its items"
                    );
                }
                tracing::info!(order_id = %order.id, short_id = %order.short_id(), "New order");
                self.orders.insert_new(order);
            }
            RealtimeEvent::OrderUpdated(order) => {
                tracing::debug!(order_id = %order.id, status = %order.status, "Order updated");
                self.orders.replace(order);
            }
            RealtimeEvent::OrderCancelled { order_id } => {
                if self.orders.remove(&order_id).is_some() {
                    tracing::info!(order_id = %order_id, "Order cancelled");
                } else {
                    tracing::debug!(order_id = %order_id, "Cancel for unknown order ignored");
                }
            }
            RealtimeEvent::ShopUpdated => self.refresh_shops().await,
            RealtimeEvent::EmployeesUpdated => self.refresh_employees().await,
        }
    }

    /// Authoritative refetch of orders, shops and employees
    pub async fn full_refetch(&self) {
        tracing::info!("Full refetch");
        tokio::join!(
            self.refresh_orders(),
            self.refresh_shops(),
            self.refresh_employees()
        );
    }

    async fn refresh_orders(&self) {
        match self.api.fetch_orders().await {
            Ok(orders) => self.orders.replace_all(orders),
            Err(e) => tracing::warn!(
                code = e.code().code(),
                error = %e,
                "Order refetch failed, keeping local state"
            ),
        }
    }

    async fn refresh_shops(&self) {
        if let Err(e) = self.shops.refresh().await {
            tracing::warn!(
                code = e.code().code(),
                error = %e,
                "Shop refetch failed, keeping local state"
            );
        }
    }

    async fn refresh_employees(&self) {
        match self.api.fetch_employees().await {
            Ok(employees) => self.employees.replace_all(employees),
            Err(e) => tracing::warn!(
                code = e.code().code(),
                error = %e,
                "Employee refetch failed, keeping local state"
            ),
        }
    }
}

impl ReconcilerHandle {
    /// Number of events applied so far
    pub fn applied(&self) -> u64 {
        *self.applied.borrow()
    }

    pub fn watch_applied(&self) -> watch::Receiver<u64> {
        self.applied.clone()
    }

    /// Wait until at least `count` events have been applied
    pub async fn wait_applied(&self, count: u64) {
        let mut rx = self.applied.clone();
        let _ = rx.wait_for(|n| *n >= count).await;
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Unsubscribe and wait for queued events to drain
    pub async fn shutdown(self) {
        drop(self.subscriptions);
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "Reconciler task ended abnormally");
        }
    }
}
