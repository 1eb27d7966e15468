use actix_web::{http::StatusCode, web, web::ServiceConfig};
use serde_json::{json, Value};
use storefront_engine::{
    db_types::{OrderDetails, OrderItem, OrderId, PaymentStatus, PricedOrder, PricedVariant, TelegramId, Tenge},
    test_utils::recording_notifier::RecordingNotifier,
    AccountApi,
};

use super::{
    helpers::{flow_api, get_request, init_data_for, order, policy, post_request, settings, CUSTOMER, STRANGER},
    mocks::MockStorefrontDb,
};
use crate::routes::{CreateOrderRoute, MyOrdersRoute, OrderByIdRoute};

fn hoodie(stock: i64) -> PricedVariant {
    PricedVariant {
        product_id: 3,
        product_name: "Hoodie".into(),
        size: "L".into(),
        color: "black".into(),
        stock_quantity: stock,
        price: Tenge::from(6000),
        sale_price: Some(Tenge::from(5000)),
    }
}

fn order_body() -> Value {
    json!({
        "items": [{ "product_id": 3, "size": "L", "color": "black", "quantity": 2, "product_name": "Hoodie" }],
        "delivery_address": "Абая 10, Алматы",
        "phone": "+77011112233"
    })
}

// Persists the priced order the way the database would, as order #1001
fn persisted(order: PricedOrder) -> OrderDetails {
    let mut o = super::helpers::order(1, PaymentStatus::Unpaid);
    o.telegram_id = order.customer.id();
    o.total_amount = order.total_amount;
    o.cashback_earned = order.cashback_earned;
    let items = order
        .lines
        .iter()
        .enumerate()
        .map(|(i, l)| OrderItem {
            id: i as i64 + 1,
            order_id: o.id,
            product_id: l.product_id,
            product_name: l.product_name.clone(),
            size: l.size.clone(),
            color: l.color.clone(),
            quantity: l.quantity,
            price: l.unit_price,
        })
        .collect();
    OrderDetails { order: o, items }
}

fn configure_create(db: MockStorefrontDb, notifier: RecordingNotifier) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.service(CreateOrderRoute::<MockStorefrontDb, RecordingNotifier>::new())
            .app_data(web::Data::new(flow_api(db, notifier)));
    }
}

#[actix_web::test]
async fn create_order_without_init_data() {
    let _ = env_logger::try_init().ok();
    let configure = configure_create(MockStorefrontDb::new(), RecordingNotifier::new());
    let (status, body) = post_request("", "/api/orders", order_body(), configure).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Authentication Error. No authorization data"}"#);
}

#[actix_web::test]
async fn create_order_with_forged_init_data() {
    let _ = env_logger::try_init().ok();
    let forged = init_data_for(CUSTOMER, "Aigerim").replace(&CUSTOMER.to_string(), &STRANGER.to_string());
    let configure = configure_create(MockStorefrontDb::new(), RecordingNotifier::new());
    let (status, body) = post_request(&forged, "/api/orders", order_body(), configure).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("signature mismatch"), "{body}");
}

#[actix_web::test]
async fn create_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockStorefrontDb::new();
    db.expect_fetch_priced_variant()
        .withf(|id, size, color| *id == 3 && size == "L" && color == "black")
        .times(1)
        .returning(|_, _, _| Ok(Some(hoodie(3))));
    db.expect_insert_order_reserving_stock()
        .withf(|o| o.customer.telegram_id == CUSTOMER && o.customer.first_name.as_deref() == Some("Aigerim"))
        .times(1)
        .returning(|o| Ok(persisted(o)));
    let notifier = RecordingNotifier::new();
    let configure = configure_create(db, notifier.clone());
    let (status, body) = post_request(&init_data_for(CUSTOMER, "Aigerim"), "/api/orders", order_body(), configure).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let created: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(created["order"]["total_amount"], 10_000);
    assert_eq!(created["order"]["cashback_earned"], 300);
    assert_eq!(created["order"]["items"][0]["price"], 5000);
    assert_eq!(created["paymentData"]["orderNumber"], 1001);
    assert_eq!(created["paymentData"]["amount"], 10_000);
    assert_eq!(created["paymentData"]["cashbackAmount"], 300);
    assert_eq!(created["paymentData"]["kaspiPhone"], "+77001234567");
    let sent = notifier.sent_to(TelegramId::from(CUSTOMER));
    assert_eq!(sent.len(), 1);
    assert!(sent[0].text().unwrap().contains("Заказ №1001"));
}

#[actix_web::test]
async fn create_order_out_of_stock() {
    let _ = env_logger::try_init().ok();
    let mut db = MockStorefrontDb::new();
    db.expect_fetch_priced_variant().returning(|_, _, _| Ok(Some(hoodie(1))));
    db.expect_insert_order_reserving_stock().never();
    let notifier = RecordingNotifier::new();
    let configure = configure_create(db, notifier.clone());
    let (status, body) = post_request(&init_data_for(CUSTOMER, "Aigerim"), "/api/orders", order_body(), configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Item out of stock: Hoodie (L, black)"}"#);
    assert!(notifier.sent().is_empty());
}

#[actix_web::test]
async fn create_order_without_address() {
    let _ = env_logger::try_init().ok();
    let mut body = order_body();
    body["delivery_address"] = json!("  ");
    let configure = configure_create(MockStorefrontDb::new(), RecordingNotifier::new());
    let (status, _) = post_request(&init_data_for(CUSTOMER, "Aigerim"), "/api/orders", body, configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

fn configure_reads(cfg: &mut ServiceConfig) {
    let mut db = MockStorefrontDb::new();
    db.expect_fetch_order_details().returning(|id| {
        Ok((id == OrderId::from(1)).then(|| OrderDetails { order: order(1, PaymentStatus::Unpaid), items: vec![] }))
    });
    db.expect_fetch_orders_for_customer().returning(|id| {
        let orders = if id == TelegramId::from(CUSTOMER) {
            vec![
                OrderDetails { order: order(2, PaymentStatus::Verification), items: vec![] },
                OrderDetails { order: order(1, PaymentStatus::Unpaid), items: vec![] },
            ]
        } else {
            vec![]
        };
        Ok(orders)
    });
    let api = AccountApi::new(db, policy(), settings().payment_target);
    cfg.service(MyOrdersRoute::<MockStorefrontDb>::new())
        .service(OrderByIdRoute::<MockStorefrontDb>::new())
        .app_data(web::Data::new(api));
}

#[actix_web::test]
async fn fetch_my_orders() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(&init_data_for(CUSTOMER, "Aigerim"), "/api/orders", configure_reads).await;
    assert_eq!(status, StatusCode::OK);
    let orders: Value = serde_json::from_str(&body).unwrap();
    let numbers = orders.as_array().unwrap().iter().map(|o| o["order_number"].as_i64().unwrap()).collect::<Vec<_>>();
    assert_eq!(numbers, vec![1002, 1001]);
    let (status, body) = get_request(&init_data_for(STRANGER, "Dana"), "/api/orders", configure_reads).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[]");
}

#[actix_web::test]
async fn fetch_order_by_id() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(&init_data_for(CUSTOMER, "Aigerim"), "/api/orders/1", configure_reads).await;
    assert_eq!(status, StatusCode::OK);
    let view: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(view["order"]["payment_status"], "unpaid");
    assert_eq!(view["paymentData"]["orderNumber"], 1001);
}

#[actix_web::test]
async fn someone_elses_order_is_not_found() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(&init_data_for(STRANGER, "Dana"), "/api/orders/1", configure_reads).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. Order 1 not found"}"#);
    let (status, _) = get_request(&init_data_for(CUSTOMER, "Aigerim"), "/api/orders/99", configure_reads).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
