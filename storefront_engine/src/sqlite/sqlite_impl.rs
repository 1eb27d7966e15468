//! `SqliteDatabase` is a concrete implementation of a storefront engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use log::*;
use sqlx::{migrate, SqlitePool};

use super::db::{cashback, db_url, inventory, new_pool, orders, products, users};
use crate::{
    db_types::{
        CashbackTransaction,
        NewProduct,
        Order,
        OrderDetails,
        OrderId,
        PaymentStatus,
        PricedOrder,
        PricedVariant,
        Product,
        ProductDetails,
        TelegramId,
        User,
    },
    order_objects::ProductQueryFilter,
    state_machine::Transition,
    traits::{AccountApiError, AccountManagement, CatalogError, CatalogManagement, StorefrontDatabase, StorefrontError},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl StorefrontDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn fetch_priced_variant(
        &self,
        product_id: i64,
        size: &str,
        color: &str,
    ) -> Result<Option<PricedVariant>, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        let variant = inventory::fetch_priced_variant(product_id, size, color, &mut conn).await?;
        Ok(variant)
    }

    /// The first statement in the transaction is a write, so the transaction takes the database write lock straight
    /// away and never has to upgrade a read lock (which SQLite refuses under contention).
    async fn insert_order_reserving_stock(&self, order: PricedOrder) -> Result<OrderDetails, StorefrontError> {
        let mut tx = self.pool.begin().await?;
        for line in &order.lines {
            if !inventory::reserve_stock(line, &mut tx).await? {
                // Dropping the transaction rolls back any reservations already made
                return Err(StorefrontError::OutOfStock { item: line.describe() });
            }
        }
        let user = users::fetch_or_create_user(&order.customer, &mut tx).await?;
        let details = orders::insert_order(user.id, &order, &mut tx).await?;
        tx.commit().await?;
        debug!(
            "🗃️ Order #{} saved for user #{} with {} items reserved",
            details.order.order_number,
            user.id,
            details.items.len()
        );
        Ok(details)
    }

    async fn fetch_order(&self, id: OrderId) -> Result<Option<Order>, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_latest_awaiting_screenshot(&self, telegram_id: TelegramId) -> Result<Option<Order>, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_latest_awaiting_screenshot(telegram_id, &mut conn).await?;
        Ok(order)
    }

    async fn apply_transition(&self, id: OrderId, transition: &Transition) -> Result<Option<Order>, StorefrontError> {
        let mut tx = self.pool.begin().await?;
        let updated = match orders::update_payment_status(id, transition, &mut tx).await? {
            Some(order) => order,
            None => {
                debug!("🗃️ Order {id} is no longer {}. Transition to {} skipped.", transition.from, transition.to);
                return Ok(None);
            },
        };
        if let Some((user_id, amount)) = transition.cashback_credit() {
            cashback::credit_cashback(user_id, id, amount, &mut tx).await?;
        }
        tx.commit().await?;
        trace!("🗃️ Order {id} is now {}", updated.payment_status);
        Ok(Some(updated))
    }
}

impl AccountManagement for SqliteDatabase {
    async fn fetch_order_details(&self, id: OrderId) -> Result<Option<OrderDetails>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_details(id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_orders_for_customer(&self, telegram_id: TelegramId) -> Result<Vec<OrderDetails>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_customer(telegram_id, &mut conn).await?;
        let mut result = Vec::with_capacity(orders.len());
        for order in orders {
            let items = orders::fetch_items(order.id, &mut conn).await?;
            result.push(OrderDetails { order, items });
        }
        Ok(result)
    }

    async fn fetch_orders_by_payment_status(&self, statuses: &[PaymentStatus]) -> Result<Vec<Order>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::search_by_payment_status(statuses, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_user(&self, telegram_id: TelegramId) -> Result<Option<User>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user(telegram_id, &mut conn).await?;
        Ok(user)
    }

    async fn fetch_cashback_history(
        &self,
        telegram_id: TelegramId,
    ) -> Result<Vec<CashbackTransaction>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let history = cashback::fetch_history(telegram_id, &mut conn).await?;
        Ok(history)
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn fetch_products(&self, filter: ProductQueryFilter) -> Result<Vec<Product>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let products = products::search_products(filter, &mut conn).await?;
        Ok(products)
    }

    async fn fetch_product(&self, id: i64) -> Result<Option<ProductDetails>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product(id, &mut conn).await?;
        Ok(product)
    }

    async fn insert_product(&self, product: NewProduct) -> Result<ProductDetails, CatalogError> {
        let mut tx = self.pool.begin().await?;
        let details = products::insert_product(product, &mut tx).await?;
        tx.commit().await?;
        Ok(details)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub async fn close(&mut self) -> Result<(), sqlx::Error> {
        self.pool.close().await;
        Ok(())
    }

    /// The current stock level of a variant, or `None` if the variant does not exist.
    pub async fn stock_level(&self, product_id: i64, size: &str, color: &str) -> Result<Option<i64>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        inventory::stock_level(product_id, size, color, &mut conn).await
    }
}
