//! HTTP client for the admin REST API

use async_trait::async_trait;
use http::StatusCode;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::message::OrderPayload;
use shared::models::{CloneShopRequest, Employee, Order, Shop};
use shared::response::{
    EmployeesResponse, ErrorBody, OrderEnvelope, OrdersEnvelope, ShopEnvelope, ShopsEnvelope,
};

use crate::{ClientConfig, ClientError, ClientResult};

/// REST operations the reconciliation layer depends on
///
/// Implemented by [`HttpClient`]; tests substitute in-memory fakes.
#[async_trait]
pub trait AdminApi: Send + Sync + std::fmt::Debug {
    /// `GET /api/orders`
    async fn fetch_orders(&self) -> ClientResult<Vec<Order>>;
    /// `GET /api/orders/{id}`
    async fn fetch_order(&self, id: &str) -> ClientResult<Order>;
    /// `PUT /api/orders/update/{id}` with the full record
    async fn update_order(&self, order: &Order) -> ClientResult<Order>;
    /// `GET /api/employee`
    async fn fetch_employees(&self) -> ClientResult<Vec<Employee>>;
    /// `GET /api/shop/list`, falling back to `GET /api/shop`
    async fn fetch_shops(&self) -> ClientResult<Vec<Shop>>;
    /// `POST /api/shop/update/{id}`
    async fn update_shop(&self, shop: &Shop) -> ClientResult<Shop>;
    /// `POST /api/shop/clone`
    async fn clone_shop(&self, request: &CloneShopRequest) -> ClientResult<Shop>;
}

/// HTTP client for making network requests to the admin backend
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    /// Create a new HTTP client from configuration
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.backend_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let response = self.client.get(self.url(path)).send().await?;
        Self::handle_response(response).await
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        Self::handle_response(response).await
    }

    /// Make a PUT request with JSON body
    pub async fn put<T: DeserializeOwned, B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let response = self.client.put(self.url(path)).json(body).send().await?;
        Self::handle_response(response).await
    }

    /// Handle the HTTP response
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await?;
            return Err(ClientError::Server {
                status,
                message: error_message(&text),
            });
        }

        response.json().await.map_err(Into::into)
    }
}

/// `{message}` / `{error}` from an error body, else the raw text
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait]
impl AdminApi for HttpClient {
    async fn fetch_orders(&self) -> ClientResult<Vec<Order>> {
        let envelope: OrdersEnvelope = self.get("/api/orders").await?;
        // 单条坏数据不应挡住整个列表
        let orders = envelope
            .orders
            .into_iter()
            .filter(|order| match order.validate() {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(order_id = %order.id, error = %e, "Dropping invalid order");
                    false
                }
            })
            .collect();
        Ok(orders)
    }

    async fn fetch_order(&self, id: &str) -> ClientResult<Order> {
        let value: Value = match self.get(&format!("/api/orders/{id}")).await {
            Err(ClientError::Server { status, .. }) if status == StatusCode::NOT_FOUND => {
                return Err(ClientError::OrderNotFound(id.to_string()));
            }
            other => other?,
        };
        let order = OrderPayload::decode(&value)?;
        order.validate()?;
        Ok(order)
    }

    async fn update_order(&self, order: &Order) -> ClientResult<Order> {
        let envelope: OrderEnvelope = self
            .put(&format!("/api/orders/update/{}", order.id), order)
            .await?;
        envelope.order.validate()?;
        Ok(envelope.order)
    }

    async fn fetch_employees(&self) -> ClientResult<Vec<Employee>> {
        let response: EmployeesResponse = self.get("/api/employee").await?;
        Ok(response.into_vec())
    }

    async fn fetch_shops(&self) -> ClientResult<Vec<Shop>> {
        let response = self.client.get(self.url("/api/shop/list")).send().await?;
        if response.status().is_success() {
            let envelope: ShopsEnvelope = response.json().await?;
            return Ok(envelope.shops);
        }

        // 部分部署还没有 /list 接口
        tracing::debug!(
            status = %response.status(),
            "Shop list endpoint unavailable, falling back to single shop"
        );
        let envelope: ShopEnvelope = self.get("/api/shop").await?;
        Ok(envelope.into_list())
    }

    async fn update_shop(&self, shop: &Shop) -> ClientResult<Shop> {
        let envelope: ShopEnvelope = self
            .post(&format!("/api/shop/update/{}", shop.id), shop)
            .await?;
        envelope
            .shop
            .ok_or_else(|| ClientError::InvalidResponse("Missing shop in update response".into()))
    }

    async fn clone_shop(&self, request: &CloneShopRequest) -> ClientResult<Shop> {
        let response = self
            .client
            .post(self.url("/api/shop/clone"))
            .json(request)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        let envelope: ShopEnvelope = serde_json::from_str(&text).unwrap_or_default();

        if !status.is_success() {
            return Err(ClientError::CloneFailed(envelope.message.unwrap_or_default()));
        }
        envelope
            .shop
            .ok_or_else(|| ClientError::InvalidResponse("Missing shop in clone response".into()))
    }
}
