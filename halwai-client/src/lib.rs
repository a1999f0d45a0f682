//! Halwai Client - realtime admin core for the Mr Halwai backend
//!
//! REST calls for order and branch mutations, a Socket.IO connection for
//! server pushes, and the local stores the two keep in sync.

pub mod active_shop;
pub mod config;
pub mod error;
pub mod http;
pub mod logger;
pub mod orders;
pub mod realtime;
pub mod reconciler;
pub mod session;
pub mod shops;
pub mod store;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use active_shop::ActiveShop;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::{AdminApi, HttpClient};
pub use orders::OrderService;
pub use realtime::{ConnectionState, RealtimeClient, RealtimeConfig, RealtimeError};
pub use reconciler::{Reconciler, ReconcilerHandle};
pub use session::AdminSession;
pub use shops::ShopService;
pub use store::{EmployeeStore, OrderStore, ShopStore, StoreChange};

// Re-export shared types for convenience
pub use shared::message::{EventName, RealtimeEvent};
pub use shared::models::{Employee, Order, Rider, Shop};
pub use shared::order::{OrderStatus, TransitionError};
