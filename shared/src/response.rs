//! REST response envelopes
//!
//! Response shapes of the admin backend. Several endpoints have more than one
//! historical shape; each is modelled here so the client only unwraps.

use serde::{Deserialize, Serialize};

use crate::models::{Employee, Order, Shop};

/// `GET /api/orders`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrdersEnvelope {
    #[serde(default)]
    pub orders: Vec<Order>,
}

/// `PUT /api/orders/update/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderEnvelope {
    pub order: Order,
}

/// `GET /api/shop/list`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShopsEnvelope {
    #[serde(default)]
    pub shops: Vec<Shop>,
}

/// `GET /api/shop` (single-shop deployments), also the shop mutation responses
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShopEnvelope {
    #[serde(default)]
    pub shop: Option<Shop>,
    /// Failure reason on non-2xx
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ShopEnvelope {
    pub fn into_list(self) -> Vec<Shop> {
        self.shop.into_iter().collect()
    }
}

/// `GET /api/employee`: a bare array or `{employees: [...]}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EmployeesResponse {
    List(Vec<Employee>),
    Wrapped {
        #[serde(default)]
        employees: Vec<Employee>,
    },
}

impl EmployeesResponse {
    pub fn into_vec(self) -> Vec<Employee> {
        match self {
            Self::List(list) => list,
            Self::Wrapped { employees } => employees,
        }
    }
}

/// Error body: `{message}`, also tolerated as `{error}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default, alias = "error")]
    pub message: Option<String>,
}
