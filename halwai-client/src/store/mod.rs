//! 客户端本地状态
//!
//! ```text
//! Reconciler / OrderService / ShopService
//!       │ mutate (短时 parking_lot 锁)
//!       ▼
//! OrderStore / ShopStore / EmployeeStore
//!       │ StoreChange (broadcast)
//!       ▼
//! 渲染层 (snapshot + 变更通知)
//! ```

mod employees;
mod orders;
mod shops;

pub use employees::EmployeeStore;
pub use orders::OrderStore;
pub use shops::ShopStore;

use tokio::sync::broadcast;

/// Broadcast channel 容量
const CHANGE_CAPACITY: usize = 256;

/// Store 变更通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreChange {
    OrdersReplaced { count: usize },
    OrderInserted { id: String },
    OrderUpdated { id: String },
    OrderRemoved { id: String },
    ShopsReplaced { count: usize },
    ShopUpdated { id: String },
    EmployeesReplaced { count: usize },
}

/// Change fan-out shared by every store of a session
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<StoreChange>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        let (tx, _) = broadcast::channel(CHANGE_CAPACITY);
        Self { tx }
    }
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.tx.subscribe()
    }

    pub(crate) fn publish(&self, change: StoreChange) {
        // 无订阅者时 send 返回 Err，安全忽略
        let _ = self.tx.send(change);
    }
}
