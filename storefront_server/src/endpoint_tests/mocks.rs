use mockall::mock;
use storefront_engine::{
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

mock! {
    pub StorefrontDb {}
    impl Clone for StorefrontDb {
        fn clone(&self) -> Self;
    }
    impl AccountManagement for StorefrontDb {
        async fn fetch_order_details(&self, id: OrderId) -> Result<Option<OrderDetails>, AccountApiError>;
        async fn fetch_orders_for_customer(&self, telegram_id: TelegramId) -> Result<Vec<OrderDetails>, AccountApiError>;
        async fn fetch_orders_by_payment_status(&self, statuses: &[PaymentStatus]) -> Result<Vec<Order>, AccountApiError>;
        async fn fetch_user(&self, telegram_id: TelegramId) -> Result<Option<User>, AccountApiError>;
        async fn fetch_cashback_history(&self, telegram_id: TelegramId) -> Result<Vec<CashbackTransaction>, AccountApiError>;
    }
    impl StorefrontDatabase for StorefrontDb {
        fn url(&self) -> &str;
        async fn fetch_priced_variant(&self, product_id: i64, size: &str, color: &str) -> Result<Option<PricedVariant>, StorefrontError>;
        async fn insert_order_reserving_stock(&self, order: PricedOrder) -> Result<OrderDetails, StorefrontError>;
        async fn fetch_order(&self, id: OrderId) -> Result<Option<Order>, StorefrontError>;
        async fn fetch_latest_awaiting_screenshot(&self, telegram_id: TelegramId) -> Result<Option<Order>, StorefrontError>;
        async fn apply_transition(&self, id: OrderId, transition: &Transition) -> Result<Option<Order>, StorefrontError>;
    }
}

mock! {
    pub Catalog {}
    impl Clone for Catalog {
        fn clone(&self) -> Self;
    }
    impl CatalogManagement for Catalog {
        async fn fetch_products(&self, filter: ProductQueryFilter) -> Result<Vec<Product>, CatalogError>;
        async fn fetch_product(&self, id: i64) -> Result<Option<ProductDetails>, CatalogError>;
        async fn insert_product(&self, product: NewProduct) -> Result<ProductDetails, CatalogError>;
    }
}
