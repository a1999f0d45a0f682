// halwai-client/tests/http_api.rs
// REST 客户端集成测试 (进程内 axum 服务器)

use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use halwai_client::{AdminApi, ClientConfig, ClientError, HttpClient, OrderStatus};
use serde_json::{Value, json};
use shared::ErrorCode;
use shared::models::{CloneShopRequest, Shop};

async fn serve(router: Router) -> HttpClient {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    HttpClient::new(&ClientConfig::new(format!("http://{addr}"))).unwrap()
}

fn order_json(id: &str, status: &str) -> Value {
    json!({
        "_id": id,
        "status": status,
        "riderInfo": null,
        "orderItems": [{ "name": "Rasgulla", "quantity": 2, "price": 40.0 }],
        "totalAmount": 80.0,
        "createdAt": "2024-03-01T10:15:00Z",
        "shopId": "s1",
        "customer": { "name": "Asha", "phone": "98xxxxxx10" }
    })
}

fn orders_router() -> Router {
    Router::new()
        .route(
            "/api/orders",
            get(|| async {
                Json(json!({
                    "orders": [order_json("o1", "placed"), order_json("o2", "out-for-delivery")]
                }))
            }),
        )
        .route(
            "/api/orders/{id}",
            get(|Path(id): Path<String>| async move {
                if id == "o1" {
                    (StatusCode::OK, Json(order_json("o1", "placed")))
                } else {
                    (StatusCode::NOT_FOUND, Json(json!({ "message": "Order not found" })))
                }
            }),
        )
        .route(
            "/api/orders/update/{id}",
            put(|Path(id): Path<String>, Json(body): Json<Value>| async move {
                if id == "broken" {
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({ "error": "database unavailable" })),
                    );
                }
                (StatusCode::OK, Json(json!({ "order": body })))
            }),
        )
}

#[tokio::test]
async fn test_fetch_orders() {
    let client = serve(orders_router()).await;
    let orders = client.fetch_orders().await.unwrap();

    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].id, "o1");
    assert_eq!(orders[1].status, OrderStatus::OutForDelivery);
    assert_eq!(orders[0].extra["customer"]["name"], "Asha");

    let single = client.fetch_order("o1").await.unwrap();
    assert_eq!(single.shop_id.as_deref(), Some("s1"));

    let err = client.fetch_order("missing").await.unwrap_err();
    assert!(matches!(err, ClientError::OrderNotFound(ref id) if id == "missing"));
    assert_eq!(err.code(), ErrorCode::OrderNotFound);
}

#[tokio::test]
async fn test_invalid_orders_are_not_admitted() {
    let client = serve(
        Router::new()
            .route(
                "/api/orders",
                get(|| async {
                    let mut bad = order_json("o2", "placed");
                    bad["orderItems"][0]["quantity"] = json!(0);
                    Json(json!({ "orders": [order_json("o1", "placed"), bad] }))
                }),
            )
            .route(
                "/api/orders/{id}",
                get(|| async {
                    let mut bad = order_json("o3", "placed");
                    bad["orderItems"][0]["price"] = json!(-5.0);
                    Json(bad)
                }),
            )
            .route(
                "/api/orders/update/{id}",
                put(|Json(mut body): Json<Value>| async move {
                    body["orderItems"][0]["quantity"] = json!(0);
                    Json(json!({ "order": body }))
                }),
            ),
    )
    .await;

    let orders = client.fetch_orders().await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].id, "o1");

    let err = client.fetch_order("o3").await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidOrder(_)));
    assert_eq!(err.code(), ErrorCode::ValidationFailed);

    let err = client.update_order(&orders[0]).await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidOrder(_)));
}

#[tokio::test]
async fn test_update_order_round_trips_unknown_fields() {
    let client = serve(orders_router()).await;
    let mut order = client.fetch_order("o1").await.unwrap();
    order.status = OrderStatus::Accepted;

    let saved = client.update_order(&order).await.unwrap();
    assert_eq!(saved, order);
    assert_eq!(saved.extra["customer"]["phone"], "98xxxxxx10");
}

#[tokio::test]
async fn test_update_order_server_error() {
    let client = serve(orders_router()).await;
    let mut order = client.fetch_order("o1").await.unwrap();
    order.id = "broken".into();

    let err = client.update_order(&order).await.unwrap_err();
    match &err {
        ClientError::Server { status, message } => {
            assert_eq!(*status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(message, "database unavailable");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.user_message(), "Failed to update order: database unavailable");
}

#[tokio::test]
async fn test_employees_both_shapes() {
    let plain = serve(Router::new().route(
        "/api/employee",
        get(|| async { Json(json!([{ "_id": "e1", "name": "Ravi", "role": "rider" }])) }),
    ))
    .await;
    let wrapped = serve(Router::new().route(
        "/api/employee",
        get(|| async {
            Json(json!({ "employees": [
                { "_id": "e1", "name": "Ravi", "role": "rider" },
                { "_id": "e2", "name": "Sunita", "role": "manager" }
            ] }))
        }),
    ))
    .await;

    assert_eq!(plain.fetch_employees().await.unwrap().len(), 1);
    let employees = wrapped.fetch_employees().await.unwrap();
    assert_eq!(employees.len(), 2);
    assert!(employees[0].is_rider());
    assert!(!employees[1].is_rider());
}

#[tokio::test]
async fn test_shop_list_falls_back_to_single_shop() {
    let client = serve(Router::new().route(
        "/api/shop",
        get(|| async {
            Json(json!({
                "shop": { "_id": "s1", "name": "Chandni Chowk", "code": "CC", "shopOpen": true }
            }))
        }),
    ))
    .await;

    let shops = client.fetch_shops().await.unwrap();
    assert_eq!(shops.len(), 1);
    assert_eq!(shops[0].code, "CC");
    assert!(shops[0].shop_open);
}

#[tokio::test]
async fn test_shop_list() {
    let client = serve(
        Router::new()
            .route(
                "/api/shop/list",
                get(|| async {
                    Json(json!({ "shops": [
                        { "_id": "s1", "name": "Chandni Chowk", "code": "CC" },
                        { "_id": "s2", "name": "Saket", "code": "SK", "shopDeliveryRange": 5.0 }
                    ] }))
                }),
            )
            .route("/api/shop", get(|| async { StatusCode::GONE })),
    )
    .await;

    let shops = client.fetch_shops().await.unwrap();
    assert_eq!(shops.len(), 2);
    assert_eq!(shops[1].shop_delivery_range, Some(5.0));
}

#[tokio::test]
async fn test_shop_update_and_clone() {
    let client = serve(
        Router::new()
            .route(
                "/api/shop/update/{id}",
                post(|Json(body): Json<Value>| async move { Json(json!({ "shop": body })) }),
            )
            .route(
                "/api/shop/clone",
                post(|Json(body): Json<Value>| async move {
                    if body["code"] == "CC" {
                        return (
                            StatusCode::CONFLICT,
                            Json(json!({ "message": "Shop code already exists" })),
                        );
                    }
                    (
                        StatusCode::CREATED,
                        Json(json!({
                            "shop": { "_id": "s9", "name": body["name"], "code": body["code"] }
                        })),
                    )
                }),
            ),
    )
    .await;

    let mut shop = Shop::new("s1", "Chandni Chowk", "CC");
    shop.shop_open = false;
    shop.menu_items = vec!["m1".into(), "m2".into()];
    let saved = client.update_shop(&shop).await.unwrap();
    assert_eq!(saved, shop);

    let created = client
        .clone_shop(&CloneShopRequest {
            source_shop_id: "s1".into(),
            name: "Rajouri Garden".into(),
            code: "RG".into(),
        })
        .await
        .unwrap();
    assert_eq!(created.id, "s9");

    let err = client
        .clone_shop(&CloneShopRequest {
            source_shop_id: "s1".into(),
            name: "Duplicate".into(),
            code: "CC".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::CloneFailed(_)));
    assert_eq!(err.user_message(), "Shop code already exists");
}
