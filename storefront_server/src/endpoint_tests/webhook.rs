use actix_web::{http::StatusCode, test, web, App};
use serde_json::{json, Value};
use sf_common::Secret;
use storefront_engine::{
    db_types::{PaymentStatus, TelegramId},
    test_utils::recording_notifier::{RecordingNotifier, Sent},
    StorefrontError,
};

use super::{
    helpers::{flow_api, order, CUSTOMER, OPERATOR},
    mocks::MockStorefrontDb,
};
use crate::{
    config::ServerOptions,
    data_objects::WebhookSecret,
    webhook::{TelegramWebhookRoute, SECRET_TOKEN_HEADER},
};

const SECRET: &str = "webhook-s3cret";

async fn post_update(db: MockStorefrontDb, notifier: RecordingNotifier, token: Option<&str>, update: Value) -> StatusCode {
    let app = App::new()
        .app_data(web::Data::new(flow_api(db, notifier)))
        .app_data(web::Data::new(ServerOptions::default()))
        .app_data(web::Data::new(WebhookSecret(Some(Secret::new(SECRET.to_string())))))
        .service(TelegramWebhookRoute::<MockStorefrontDb, RecordingNotifier>::new());
    let app = test::init_service(app).await;
    let mut req = test::TestRequest::post().uri("/webhook").set_json(update);
    if let Some(token) = token {
        req = req.insert_header((SECRET_TOKEN_HEADER, token));
    }
    match test::try_call_service(&app, req.to_request()).await {
        Ok(res) => res.status(),
        Err(e) => e.error_response().status(),
    }
}

fn photo_update(from: i64) -> Value {
    json!({
        "update_id": 10,
        "message": {
            "message_id": 311,
            "from": { "id": from, "is_bot": false, "first_name": "Aigerim" },
            "chat": { "id": from, "type": "private" },
            "photo": [
                { "file_id": "small", "file_unique_id": "s", "width": 90, "height": 67 },
                { "file_id": "large", "file_unique_id": "l", "width": 1280, "height": 960 }
            ]
        }
    })
}

#[actix_web::test]
async fn wrong_secret_is_rejected() {
    let _ = env_logger::try_init().ok();
    let mut db = MockStorefrontDb::new();
    db.expect_fetch_latest_awaiting_screenshot().never();
    let notifier = RecordingNotifier::new();
    let status = post_update(db, notifier.clone(), Some("guess"), photo_update(CUSTOMER)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let status = post_update(MockStorefrontDb::new(), notifier.clone(), None, photo_update(CUSTOMER)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(notifier.sent().is_empty());
}

#[actix_web::test]
async fn start_command_greets() {
    let _ = env_logger::try_init().ok();
    let notifier = RecordingNotifier::new();
    let update = json!({
        "update_id": 11,
        "message": { "message_id": 1, "chat": { "id": CUSTOMER, "type": "private" }, "text": "/start" }
    });
    let status = post_update(MockStorefrontDb::new(), notifier.clone(), Some(SECRET), update).await;
    assert_eq!(status, StatusCode::OK);
    let sent = notifier.sent_to(TelegramId::from(CUSTOMER));
    assert_eq!(sent.len(), 1);
    assert!(matches!(&sent[0], Sent::Message { buttons, .. } if buttons.len() == 1));
}

#[actix_web::test]
async fn photo_without_an_order_is_acknowledged() {
    let _ = env_logger::try_init().ok();
    let mut db = MockStorefrontDb::new();
    db.expect_fetch_latest_awaiting_screenshot().times(1).returning(|_| Ok(None));
    let notifier = RecordingNotifier::new();
    let status = post_update(db, notifier.clone(), Some(SECRET), photo_update(CUSTOMER)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(notifier.sent().is_empty());
}

#[actix_web::test]
async fn screenshot_goes_to_review() {
    let _ = env_logger::try_init().ok();
    let mut db = MockStorefrontDb::new();
    db.expect_fetch_latest_awaiting_screenshot()
        .returning(|_| Ok(Some(order(5, PaymentStatus::ScreenshotAwaited))));
    db.expect_apply_transition()
        .withf(|_, t| t.to == PaymentStatus::Verification && t.screenshot.as_deref() == Some("large"))
        .times(1)
        .returning(|_, _| Ok(Some(order(5, PaymentStatus::Verification))));
    let notifier = RecordingNotifier::new();
    let status = post_update(db, notifier.clone(), Some(SECRET), photo_update(CUSTOMER)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(notifier.sent_to(TelegramId::from(CUSTOMER)).len(), 1);
    let review = notifier.sent_to(TelegramId::from(OPERATOR));
    assert!(matches!(&review[..], [Sent::Photo { photo, buttons, .. }] if photo == "large" && buttons.len() == 2));
}

#[actix_web::test]
async fn unrelated_updates_are_acknowledged() {
    let _ = env_logger::try_init().ok();
    let update = json!({
        "update_id": 12,
        "message": { "message_id": 2, "chat": { "id": CUSTOMER, "type": "private" }, "text": "where is my order?" }
    });
    let status = post_update(MockStorefrontDb::new(), RecordingNotifier::new(), Some(SECRET), update).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn database_failures_ask_telegram_to_retry() {
    let _ = env_logger::try_init().ok();
    let mut db = MockStorefrontDb::new();
    db.expect_fetch_latest_awaiting_screenshot()
        .returning(|_| Err(StorefrontError::DatabaseError("database is locked".into())));
    let status = post_update(db, RecordingNotifier::new(), Some(SECRET), photo_update(CUSTOMER)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[actix_web::test]
async fn button_taps_are_always_answered() {
    let _ = env_logger::try_init().ok();
    let mut db = MockStorefrontDb::new();
    db.expect_fetch_order().returning(|_| Ok(Some(order(5, PaymentStatus::Verification))));
    db.expect_apply_transition().never();
    let notifier = RecordingNotifier::new();
    // A customer tapping the operator's approve button
    let update = json!({
        "update_id": 13,
        "callback_query": {
            "id": "cb-9",
            "from": { "id": CUSTOMER, "first_name": "Aigerim" },
            "data": "confirm_payment_5"
        }
    });
    let status = post_update(db, notifier.clone(), Some(SECRET), update).await;
    assert_eq!(status, StatusCode::OK);
    let answers = notifier.callback_answers();
    assert!(matches!(
        &answers[..],
        [Sent::CallbackAnswer { callback_id, show_alert: true, .. }] if callback_id == "cb-9"
    ));
}
