//! Fixtures for tests that need a catalog and a running order flow.
use std::sync::Arc;

use crate::{
    db_types::{Customer, NewOrder, NewProduct, NewVariant, OrderLineRequest, ProductDetails, Tenge, TelegramId},
    helpers::PaymentTarget,
    test_utils::recording_notifier::RecordingNotifier,
    CatalogApi,
    FlowSettings,
    OperatorAllowList,
    OrderFlowApi,
    SqliteDatabase,
};

pub const OPERATOR_1: i64 = 7770001;
pub const OPERATOR_2: i64 = 7770002;

pub fn operators() -> OperatorAllowList {
    OperatorAllowList::new([TelegramId::from(OPERATOR_1), TelegramId::from(OPERATOR_2)])
}

pub fn settings() -> FlowSettings {
    FlowSettings {
        payment_target: PaymentTarget { phone: "+77010000000".into(), qr_code_url: "/kaspi-qr.png".into() },
        frontend_url: "https://shop.example".into(),
        review_chats: vec![TelegramId::from(OPERATOR_1), TelegramId::from(OPERATOR_2)],
    }
}

pub fn flow_api(db: SqliteDatabase, notifier: RecordingNotifier) -> OrderFlowApi<SqliteDatabase, RecordingNotifier> {
    OrderFlowApi::new(db, notifier, Arc::new(operators()), settings())
}

/// Adds a product with a single variant and returns it.
pub async fn add_product(
    db: &SqliteDatabase,
    name: &str,
    price: i64,
    sale_price: Option<i64>,
    size: &str,
    color: &str,
    stock: i64,
) -> ProductDetails {
    let product = NewProduct {
        name: name.to_string(),
        description: None,
        price: Tenge::from(price),
        sale_price: sale_price.map(Tenge::from),
        category: Some("test".into()),
        images: vec![],
        featured: false,
        variants: vec![NewVariant { size: size.to_string(), color: color.to_string(), stock_quantity: stock }],
    };
    CatalogApi::new(db.clone()).insert_product(product).await.expect("Error inserting product")
}

pub fn line(product: &ProductDetails, quantity: i64) -> OrderLineRequest {
    let variant = &product.variants[0];
    OrderLineRequest {
        product_id: product.product.id,
        size: variant.size.clone(),
        color: variant.color.clone(),
        quantity,
        product_name: Some(product.product.name.clone()),
    }
}

pub fn new_order(customer: i64, items: Vec<OrderLineRequest>) -> NewOrder {
    NewOrder {
        customer: Customer {
            telegram_id: customer,
            username: Some(format!("customer{customer}")),
            first_name: Some("Test".into()),
            last_name: None,
        },
        items,
        delivery_address: "Abay ave 10, Almaty".into(),
        phone: "+77011234567".into(),
        notes: None,
    }
}
