use std::{sync::Arc, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use storefront_engine::{AccountApi, CatalogApi, OperatorPolicy, OrderFlowApi, SqliteDatabase};
use telegram_tools::TelegramApi;

use crate::{
    cache::{CatalogCache, MemoryCache, ResponseCache},
    config::{ServerConfig, ServerOptions},
    data_objects::WebhookSecret,
    errors::ServerError,
    integrations::telegram::TelegramNotifier,
    middleware::InitDataMiddlewareFactory,
    routes::{
        health,
        AddProductRoute,
        CreateOrderRoute,
        MyCashbackHistoryRoute,
        MyOrdersRoute,
        MyProfileRoute,
        OrderByIdRoute,
        PendingPaymentsRoute,
        ProductByIdRoute,
        ProductsRoute,
        VerifyPaymentRoute,
    },
    webhook::TelegramWebhookRoute,
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, config.db_max_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(format!("Could not run migrations. {e}")))?;
    info!("🚀️ Database is ready at {}", config.database_url);
    let api = TelegramApi::new(config.telegram.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let notifier = TelegramNotifier::new(api);
    let srv = create_server_instance(config, db, notifier)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    notifier: TelegramNotifier,
) -> Result<Server, ServerError> {
    let policy: Arc<dyn OperatorPolicy> = Arc::new(config.operator_policy());
    let cache: Arc<dyn ResponseCache> = Arc::new(MemoryCache::new());
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone(), notifier.clone(), Arc::clone(&policy), config.flow_settings());
        let accounts_api = AccountApi::new(db.clone(), Arc::clone(&policy), config.payment_target.clone());
        let catalog_api = CatalogApi::new(db.clone());
        let catalog_cache = CatalogCache::new(Arc::clone(&cache), config.catalog_cache_ttl);
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("sf::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(accounts_api))
            .app_data(web::Data::new(catalog_api))
            .app_data(web::Data::new(catalog_cache))
            .app_data(web::Data::from(Arc::clone(&policy)))
            .app_data(web::Data::new(ServerOptions::from_config(&config)))
            .app_data(web::Data::new(WebhookSecret(config.webhook_secret.clone())));
        let api_scope = web::scope("/api")
            .wrap(InitDataMiddlewareFactory::new(config.telegram.bot_token.clone(), config.init_data_checks))
            .service(CreateOrderRoute::<SqliteDatabase, TelegramNotifier>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(PendingPaymentsRoute::<SqliteDatabase>::new())
            .service(VerifyPaymentRoute::<SqliteDatabase, TelegramNotifier>::new())
            .service(MyProfileRoute::<SqliteDatabase>::new())
            .service(MyCashbackHistoryRoute::<SqliteDatabase>::new())
            .service(ProductsRoute::<SqliteDatabase>::new())
            .service(ProductByIdRoute::<SqliteDatabase>::new())
            .service(AddProductRoute::<SqliteDatabase>::new());
        app.service(health).service(TelegramWebhookRoute::<SqliteDatabase, TelegramNotifier>::new()).service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
