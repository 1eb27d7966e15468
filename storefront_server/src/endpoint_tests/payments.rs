use actix_web::{http::StatusCode, web, web::ServiceConfig};
use serde_json::{json, Value};
use storefront_engine::{
    db_types::{OrderId, OrderStatus, PaymentStatus, TelegramId},
    test_utils::recording_notifier::{RecordingNotifier, Sent},
    AccountApi,
    OperatorPolicy,
};

use super::{
    helpers::{flow_api, get_request, init_data_for, order, policy, post_request, settings, CUSTOMER, OPERATOR},
    mocks::MockStorefrontDb,
};
use crate::routes::{PendingPaymentsRoute, VerifyPaymentRoute};

fn configure_pending(cfg: &mut ServiceConfig) {
    let mut db = MockStorefrontDb::new();
    db.expect_fetch_orders_by_payment_status()
        .withf(|statuses| statuses == [PaymentStatus::ScreenshotAwaited, PaymentStatus::Verification])
        .returning(|_| Ok(vec![order(2, PaymentStatus::Verification), order(1, PaymentStatus::ScreenshotAwaited)]));
    let api = AccountApi::new(db, policy(), settings().payment_target);
    cfg.service(PendingPaymentsRoute::<MockStorefrontDb>::new())
        .app_data(web::Data::new(api))
        .app_data(web::Data::<dyn OperatorPolicy>::from(policy()));
}

#[actix_web::test]
async fn pending_payments_are_for_operators() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        get_request(&init_data_for(CUSTOMER, "Aigerim"), "/api/payments/pending", configure_pending).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, r#"{"error":"Insufficient Permissions. Operator access is required"}"#);
    let (status, _) = get_request("", "/api/payments/pending", configure_pending).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn pending_payments() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        get_request(&init_data_for(OPERATOR, "Operator"), "/api/payments/pending", configure_pending).await;
    assert_eq!(status, StatusCode::OK);
    let orders: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(orders[0]["payment_status"], "verification");
    assert_eq!(orders[1]["payment_status"], "screenshot_awaited");
}

fn configure_verify(db: MockStorefrontDb, notifier: RecordingNotifier) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.service(VerifyPaymentRoute::<MockStorefrontDb, RecordingNotifier>::new())
            .app_data(web::Data::new(flow_api(db, notifier)))
            .app_data(web::Data::<dyn OperatorPolicy>::from(policy()));
    }
}

#[actix_web::test]
async fn approve_payment() {
    let _ = env_logger::try_init().ok();
    let mut db = MockStorefrontDb::new();
    db.expect_fetch_order().returning(|_| Ok(Some(order(12, PaymentStatus::Verification))));
    db.expect_apply_transition()
        .withf(|id, t| {
            *id == OrderId::from(12) &&
                t.from == PaymentStatus::Verification &&
                t.to == PaymentStatus::Paid &&
                t.cashback_credit().map(|(_, amount)| amount.value()) == Some(330)
        })
        .times(1)
        .returning(|_, _| {
            let mut o = order(12, PaymentStatus::Paid);
            o.status = OrderStatus::Confirmed;
            Ok(Some(o))
        });
    let notifier = RecordingNotifier::new();
    let configure = configure_verify(db, notifier.clone());
    let (status, body) =
        post_request(&init_data_for(OPERATOR, "Operator"), "/api/payments/12/verify", json!({"status": "paid"}), configure)
            .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"message":"Order 12 marked as paid"}"#);
    let sent = notifier.sent_to(TelegramId::from(CUSTOMER));
    assert_eq!(sent.len(), 1);
    assert!(matches!(&sent[0], Sent::Message { text, .. } if text.contains("330")));
}

#[actix_web::test]
async fn customers_cannot_verify() {
    let _ = env_logger::try_init().ok();
    let mut db = MockStorefrontDb::new();
    db.expect_apply_transition().never();
    let configure = configure_verify(db, RecordingNotifier::new());
    let (status, _) =
        post_request(&init_data_for(CUSTOMER, "Aigerim"), "/api/payments/12/verify", json!({"status": "paid"}), configure)
            .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn settled_orders_are_left_alone() {
    let _ = env_logger::try_init().ok();
    let mut db = MockStorefrontDb::new();
    db.expect_fetch_order().returning(|_| Ok(Some(order(12, PaymentStatus::Paid))));
    db.expect_apply_transition().never();
    let notifier = RecordingNotifier::new();
    let configure = configure_verify(db, notifier.clone());
    let (status, body) = post_request(
        &init_data_for(OPERATOR, "Operator"),
        "/api/payments/12/verify",
        json!({"status": "failed"}),
        configure,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"message":"Order 12 was already settled as paid"}"#);
    assert!(notifier.sent().is_empty());
}

#[actix_web::test]
async fn orders_without_a_screenshot_cannot_be_verified() {
    let _ = env_logger::try_init().ok();
    let mut db = MockStorefrontDb::new();
    db.expect_fetch_order().returning(|_| Ok(Some(order(12, PaymentStatus::Unpaid))));
    db.expect_apply_transition().never();
    let configure = configure_verify(db, RecordingNotifier::new());
    let (status, _) =
        post_request(&init_data_for(OPERATOR, "Operator"), "/api/payments/12/verify", json!({"status": "paid"}), configure)
            .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn verify_missing_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockStorefrontDb::new();
    db.expect_fetch_order().returning(|_| Ok(None));
    let configure = configure_verify(db, RecordingNotifier::new());
    let (status, _) =
        post_request(&init_data_for(OPERATOR, "Operator"), "/api/payments/77/verify", json!({"status": "paid"}), configure)
            .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn verify_with_unknown_status() {
    let _ = env_logger::try_init().ok();
    let configure = configure_verify(MockStorefrontDb::new(), RecordingNotifier::new());
    let (status, _) = post_request(
        &init_data_for(OPERATOR, "Operator"),
        "/api/payments/12/verify",
        json!({"status": "refunded"}),
        configure,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
