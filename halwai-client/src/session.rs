//! AdminSession - 组合根
//!
//! 持有 REST 客户端、实时连接、本地 store 和各个服务。
//! 实时连接的生命周期由这里显式管理 (`start` / `shutdown`)。

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

use crate::active_shop::ActiveShop;
use crate::http::AdminApi;
use crate::orders::OrderService;
use crate::realtime::{Connector, RealtimeClient, WsConnector};
use crate::reconciler::{Reconciler, ReconcilerHandle};
use crate::shops::ShopService;
use crate::store::{ChangeFeed, EmployeeStore, OrderStore, ShopStore, StoreChange};
use crate::{ClientConfig, ClientResult, HttpClient};

#[derive(Debug)]
pub struct AdminSession {
    feed: ChangeFeed,
    orders: OrderStore,
    shops: ShopStore,
    employees: EmployeeStore,
    realtime: RealtimeClient,
    order_service: OrderService,
    shop_service: ShopService,
    reconciler: Reconciler,
    running: Mutex<Option<ReconcilerHandle>>,
}

impl AdminSession {
    /// Session talking to the configured backend over HTTP and WebSocket
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let api = Arc::new(HttpClient::new(config)?);
        Ok(Self::with_parts(config, api, Arc::new(WsConnector)))
    }

    /// Session over custom REST and realtime implementations
    pub fn with_parts(
        config: &ClientConfig,
        api: Arc<dyn AdminApi>,
        connector: Arc<dyn Connector>,
    ) -> Self {
        let feed = ChangeFeed::new();
        let orders = OrderStore::new(feed.clone());
        let shops = ShopStore::new(feed.clone());
        let employees = EmployeeStore::new(feed.clone());
        let active = ActiveShop::open(&config.state_dir);

        let order_service = OrderService::new(api.clone(), orders.clone(), employees.clone());
        let shop_service = ShopService::new(api.clone(), shops.clone(), active);
        let reconciler = Reconciler::new(
            api,
            orders.clone(),
            employees.clone(),
            shop_service.clone(),
        );
        let realtime = RealtimeClient::with_connector(config.realtime.clone(), connector);

        Self {
            feed,
            orders,
            shops,
            employees,
            realtime,
            order_service,
            shop_service,
            reconciler,
            running: Mutex::new(None),
        }
    }

    /// Subscribe the reconciler and open the realtime connection
    ///
    /// The first `connect` triggers the initial full fetch.
    pub fn start(&self) {
        {
            let mut running = self.running.lock();
            if running.is_none() {
                *running = Some(self.reconciler.clone().spawn(self.realtime.registry()));
            }
        }
        self.realtime.connect();
        tracing::info!(url = %self.realtime.config().endpoint(), "Admin session started");
    }

    /// Close the realtime connection and drain the reconciler
    pub async fn shutdown(&self) {
        self.realtime.disconnect().await;
        let handle = self.running.lock().take();
        if let Some(handle) = handle {
            handle.shutdown().await;
        }
        tracing::info!("Admin session stopped");
    }

    /// Events applied by the reconciler, `None` before `start`
    pub fn applied(&self) -> Option<watch::Receiver<u64>> {
        self.running.lock().as_ref().map(ReconcilerHandle::watch_applied)
    }

    pub fn changes(&self) -> broadcast::Receiver<StoreChange> {
        self.feed.subscribe()
    }

    pub fn orders(&self) -> &OrderStore {
        &self.orders
    }

    pub fn shops(&self) -> &ShopStore {
        &self.shops
    }

    pub fn employees(&self) -> &EmployeeStore {
        &self.employees
    }

    pub fn active_shop(&self) -> &ActiveShop {
        self.shop_service.active()
    }

    pub fn order_service(&self) -> &OrderService {
        &self.order_service
    }

    pub fn shop_service(&self) -> &ShopService {
        &self.shop_service
    }

    pub fn realtime(&self) -> &RealtimeClient {
        &self.realtime
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }
}
