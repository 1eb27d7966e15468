use cucumber::{then, when};
use storefront_engine::{
    db_types::{OrderStatus, PaymentStatus, Tenge, TelegramId},
    order_objects::{TransitionResult, VerifyDecision},
    test_utils::{
        recording_notifier::Sent,
        seed::{line, new_order},
    },
    AccountManagement,
    StorefrontError,
};

use crate::cucumber::StorefrontWorld;

async fn place_order(world: &mut StorefrontWorld, customer: i64, lines: &[(i64, String)], name: String) {
    let lines = lines.iter().map(|(qty, product)| line(world.product(product), *qty)).collect();
    let result = world.api().create_order(new_order(customer, lines)).await;
    match result {
        Ok(created) => {
            world.orders.insert(name, created.order.order.id);
            world.last_created = Some(created);
            world.last_error = None;
        },
        Err(e) => {
            world.last_created = None;
            world.last_error = Some(e);
        },
    }
}

#[when(expr = "customer {int} orders {int} {string} as order {string}")]
async fn order_one(world: &mut StorefrontWorld, customer: i64, qty: i64, product: String, name: String) {
    place_order(world, customer, &[(qty, product)], name).await;
}

#[when(expr = "customer {int} orders {int} {string} and {int} {string} as order {string}")]
async fn order_two(
    world: &mut StorefrontWorld,
    customer: i64,
    qty1: i64,
    product1: String,
    qty2: i64,
    product2: String,
    name: String,
) {
    place_order(world, customer, &[(qty1, product1), (qty2, product2)], name).await;
}

#[when(expr = "customer {int} taps \"I paid\" on order {string}")]
async fn tap_paid(world: &mut StorefrontWorld, customer: i64, name: String) {
    let id = world.order_id(&name);
    let outcome = world.api().mark_paid(TelegramId::from(customer), id).await.expect("Error marking order as paid");
    world.last_outcome = Some(outcome);
}

#[when(expr = "customer {int} sends a screenshot {string}")]
async fn send_screenshot(world: &mut StorefrontWorld, customer: i64, photo: String) {
    let outcome =
        world.api().submit_screenshot(TelegramId::from(customer), photo).await.expect("Error submitting screenshot");
    world.last_outcome = outcome;
}

async fn verify(world: &mut StorefrontWorld, user: i64, name: &str, decision: &str) {
    let id = world.order_id(name);
    let decision = match decision {
        "paid" => VerifyDecision::Paid,
        "failed" => VerifyDecision::Failed,
        d => panic!("Unknown decision {d}"),
    };
    let result = world.api().verify_payment(TelegramId::from(user), id, decision).await;
    match result {
        Ok(outcome) => {
            world.last_outcome = Some(outcome);
            world.last_error = None;
        },
        Err(e) => {
            world.last_outcome = None;
            world.last_error = Some(e);
        },
    }
}

#[when(expr = "operator {int} marks order {string} as {word}")]
async fn operator_verifies(world: &mut StorefrontWorld, operator: i64, name: String, decision: String) {
    verify(world, operator, &name, &decision).await;
}

#[when(expr = "customer {int} tries to mark order {string} as {word}")]
async fn customer_verifies(world: &mut StorefrontWorld, customer: i64, name: String, decision: String) {
    verify(world, customer, &name, &decision).await;
}

#[then(expr = "the order total is {int} ₸ with {int} ₸ cashback")]
async fn order_total(world: &mut StorefrontWorld, total: i64, cashback: i64) {
    let created = world.last_created.as_ref().expect("No order was created");
    assert_eq!(created.order.order.total_amount, Tenge::from(total));
    assert_eq!(created.order.order.cashback_earned, Tenge::from(cashback));
    assert_eq!(created.payment_data.amount, Tenge::from(total));
    assert_eq!(created.payment_data.cashback_amount, Tenge::from(cashback));
}

#[then(expr = "the order is refused because {string} is out of stock")]
async fn out_of_stock(world: &mut StorefrontWorld, item: String) {
    match &world.last_error {
        Some(StorefrontError::OutOfStock { item: i }) => assert_eq!(i, &item),
        other => panic!("Expected an out-of-stock error, got {other:?}"),
    }
}

#[then(expr = "the request is refused as unauthorized")]
async fn unauthorized(world: &mut StorefrontWorld) {
    assert!(
        matches!(world.last_error, Some(StorefrontError::Unauthorized(_))),
        "Expected Unauthorized, got {:?}",
        world.last_error
    );
}

#[then(expr = "order {string} has payment status {word}")]
async fn payment_status(world: &mut StorefrontWorld, name: String, status: String) {
    let status = status.parse::<PaymentStatus>().expect("Invalid payment status");
    let id = world.order_id(&name);
    let order = world.db().fetch_order_details(id).await.unwrap().expect("Order not found");
    assert_eq!(order.order.payment_status, status);
}

#[then(expr = "order {string} has order status {word}")]
async fn order_status(world: &mut StorefrontWorld, name: String, status: String) {
    let status = status.parse::<OrderStatus>().expect("Invalid order status");
    let id = world.order_id(&name);
    let order = world.db().fetch_order_details(id).await.unwrap().expect("Order not found");
    assert_eq!(order.order.status, status);
}

#[then(expr = "there are {int} {string} left in stock")]
async fn stock_left(world: &mut StorefrontWorld, stock: i64, product: String) {
    let p = world.product(&product);
    let variant = &p.variants[0];
    let level = world.db().stock_level(p.product.id, &variant.size, &variant.color).await.unwrap();
    assert_eq!(level, Some(stock));
}

#[then(expr = "customer {int} has no orders")]
async fn no_orders(world: &mut StorefrontWorld, customer: i64) {
    let orders = world.db().fetch_orders_for_customer(TelegramId::from(customer)).await.unwrap();
    assert!(orders.is_empty(), "Customer has {} orders", orders.len());
}

#[then(expr = "customer {int} has a cashback balance of {int} ₸")]
async fn cashback_balance(world: &mut StorefrontWorld, customer: i64, balance: i64) {
    let profile = world.accounts().profile(TelegramId::from(customer), None).await.unwrap();
    assert_eq!(profile.cashback_balance(), Tenge::from(balance));
}

#[then(expr = "customer {int} has {int} cashback transaction(s)")]
async fn cashback_transactions(world: &mut StorefrontWorld, customer: i64, count: usize) {
    let history = world.db().fetch_cashback_history(TelegramId::from(customer)).await.unwrap();
    assert_eq!(history.len(), count);
}

#[then(expr = "{word} {int} was sent a message containing {string}")]
async fn message_sent(world: &mut StorefrontWorld, _role: String, chat: i64, text: String) {
    let sent = world.notifier().sent_to(TelegramId::from(chat));
    assert!(
        sent.iter().any(|s| s.text().map(|t| t.contains(&text)).unwrap_or(false)),
        "No message containing '{text}' in {sent:?}"
    );
}

#[then(expr = "operator {int} was sent the screenshot {string}")]
async fn screenshot_forwarded(world: &mut StorefrontWorld, operator: i64, file_id: String) {
    let sent = world.notifier().sent_to(TelegramId::from(operator));
    assert!(
        sent.iter().any(|s| matches!(s, Sent::Photo { photo, .. } if photo == &file_id)),
        "Screenshot was not forwarded. {sent:?}"
    );
}

#[then("the photo is ignored")]
async fn photo_ignored(world: &mut StorefrontWorld) {
    assert!(world.last_outcome.is_none(), "The photo was attached to an order");
}

#[then("the last decision had no effect")]
async fn no_effect(world: &mut StorefrontWorld) {
    let outcome = world.last_outcome.as_ref().expect("No decision was made");
    assert_eq!(outcome.result, TransitionResult::NoOp);
    assert_eq!(outcome.notifications_sent, 0);
}

#[then(expr = "the last change reported {int} undelivered notification(s)")]
async fn undelivered(world: &mut StorefrontWorld, count: usize) {
    let outcome = world.last_outcome.as_ref().expect("No change was made");
    assert!(outcome.is_applied());
    assert_eq!(outcome.notifications_failed, count);
}
