use std::{collections::HashMap, sync::Arc};

use cucumber::World;
use log::*;
use storefront_engine::{
    db_types::{OrderId, ProductDetails},
    order_objects::{FlowOutcome, OrderCreated},
    test_utils::{
        prepare_env::new_test_database,
        recording_notifier::RecordingNotifier,
        seed::{flow_api, operators, settings},
    },
    AccountApi,
    OrderFlowApi,
    SqliteDatabase,
    StorefrontDatabase,
    StorefrontError,
};

#[derive(Default, Debug, World)]
pub struct StorefrontWorld {
    pub system: Option<StorefrontSystem>,
    /// Products by name
    pub products: HashMap<String, ProductDetails>,
    /// Orders by the name the scenario gave them
    pub orders: HashMap<String, OrderId>,
    pub last_created: Option<OrderCreated>,
    pub last_outcome: Option<FlowOutcome>,
    pub last_error: Option<StorefrontError>,
}

#[derive(Debug)]
pub struct StorefrontSystem {
    pub db_path: String,
    pub api: OrderFlowApi<SqliteDatabase, RecordingNotifier>,
    pub notifier: RecordingNotifier,
}

impl StorefrontWorld {
    pub fn system(&self) -> &StorefrontSystem {
        self.system.as_ref().expect("Storefront not initialised")
    }

    pub fn api(&self) -> &OrderFlowApi<SqliteDatabase, RecordingNotifier> {
        &self.system().api
    }

    pub fn db(&self) -> &SqliteDatabase {
        self.api().db()
    }

    pub fn notifier(&self) -> &RecordingNotifier {
        &self.system().notifier
    }

    pub fn accounts(&self) -> AccountApi<SqliteDatabase> {
        AccountApi::new(self.db().clone(), Arc::new(operators()), settings().payment_target)
    }

    pub fn product(&self, name: &str) -> &ProductDetails {
        self.products.get(name).unwrap_or_else(|| panic!("Product {name} has not been added"))
    }

    pub fn order_id(&self, name: &str) -> OrderId {
        *self.orders.get(name).unwrap_or_else(|| panic!("Order {name} has not been placed"))
    }
}

impl StorefrontSystem {
    pub async fn new() -> Self {
        let db = new_test_database(1).await;
        let db_path = db.url().to_string();
        debug!("Created database: {db_path}");
        let notifier = RecordingNotifier::new();
        let api = flow_api(db, notifier.clone());
        Self { db_path, api, notifier }
    }
}
