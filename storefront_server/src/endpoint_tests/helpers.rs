use std::sync::Arc;

use actix_web::{
    body::to_bytes,
    http::StatusCode,
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use chrono::{TimeZone, Utc};
use log::debug;
use serde_json::json;
use sf_common::Secret;
use storefront_engine::{
    db_types::{Order, OrderId, OrderStatus, PaymentStatus, TelegramId, Tenge},
    helpers::PaymentTarget,
    test_utils::recording_notifier::RecordingNotifier,
    FlowSettings,
    OperatorAllowList,
    OperatorPolicy,
    OrderFlowApi,
};

use super::mocks::MockStorefrontDb;
use crate::{auth::init_data_hash, middleware::InitDataMiddlewareFactory};

pub const TEST_BOT_TOKEN: &str = "6000000001:AAE-endpoint-tests-only";
pub const CUSTOMER: i64 = 5550001;
pub const STRANGER: i64 = 5550002;
pub const OPERATOR: i64 = 7770001;

/// Init data for the given user, signed with [`TEST_BOT_TOKEN`].
pub fn init_data_for(user_id: i64, first_name: &str) -> String {
    let user = json!({ "id": user_id, "first_name": first_name, "language_code": "ru" }).to_string();
    let fields = vec![("auth_date".to_string(), "1718000000".to_string()), ("user".to_string(), user)];
    let hash = init_data_hash(&fields, TEST_BOT_TOKEN);
    let mut s = url::form_urlencoded::Serializer::new(String::new());
    for (k, v) in &fields {
        s.append_pair(k, v);
    }
    s.append_pair("hash", &hash);
    s.finish()
}

pub fn policy() -> Arc<dyn OperatorPolicy> {
    Arc::new(OperatorAllowList::new([TelegramId::from(OPERATOR)]))
}

pub fn settings() -> FlowSettings {
    FlowSettings {
        payment_target: PaymentTarget { phone: "+77001234567".into(), qr_code_url: "/kaspi-qr.png".into() },
        frontend_url: "https://shop.example.com".into(),
        review_chats: vec![TelegramId::from(OPERATOR)],
    }
}

pub fn flow_api(db: MockStorefrontDb, notifier: RecordingNotifier) -> OrderFlowApi<MockStorefrontDb, RecordingNotifier> {
    OrderFlowApi::new(db, notifier, policy(), settings())
}

/// An order for [`CUSTOMER`] in the given payment status.
pub fn order(id: i64, payment_status: PaymentStatus) -> Order {
    let status = match payment_status {
        PaymentStatus::Paid => OrderStatus::Confirmed,
        PaymentStatus::Failed => OrderStatus::Cancelled,
        _ => OrderStatus::Pending,
    };
    let screenshot = matches!(payment_status, PaymentStatus::Verification | PaymentStatus::Paid | PaymentStatus::Failed)
        .then(|| "AgACAgIAAxkBAAIBlarge".to_string());
    Order {
        id: OrderId::from(id),
        order_number: 1000 + id,
        user_id: 1,
        telegram_id: TelegramId::from(CUSTOMER),
        total_amount: Tenge::from(11_000),
        cashback_earned: Tenge::from(330),
        delivery_address: "Абая 10, Алматы".into(),
        phone: "+77011112233".into(),
        notes: None,
        status,
        payment_status,
        payment_screenshot: screenshot,
        created_at: Utc.with_ymd_and_hms(2024, 6, 10, 9, 30, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 6, 10, 9, 45, 0).unwrap(),
    }
}

pub async fn get_request<F>(init_data: &str, path: &str, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let mut req = TestRequest::get().uri(path);
    if !init_data.is_empty() {
        req = req.insert_header(("X-Telegram-Init-Data", init_data));
    }
    send(req, configure).await
}

pub async fn post_request<F>(init_data: &str, path: &str, body: serde_json::Value, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let mut req = TestRequest::post().uri(path).set_json(body);
    if !init_data.is_empty() {
        req = req.insert_header(("X-Telegram-Init-Data", init_data));
    }
    send(req, configure).await
}

/// Calls the `/api` scope, set up the way the server sets it up, and returns the status and body. Errors raised by
/// middleware are rendered the same way the server renders them.
async fn send<F>(req: TestRequest, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let scope = web::scope("/api")
        .wrap(InitDataMiddlewareFactory::new(Secret::new(TEST_BOT_TOKEN.to_string()), true))
        .configure(configure);
    let service = test::init_service(App::new().service(scope)).await;
    debug!("🚀️ Making request");
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => {
            let status = res.status();
            let body = test::read_body(res).await;
            (status, String::from_utf8_lossy(&body).into_owned())
        },
        Err(e) => {
            let res = e.error_response();
            let status = res.status();
            let body = to_bytes(res.into_body()).await.unwrap_or_default();
            (status, String::from_utf8_lossy(&body).into_owned())
        },
    }
}
