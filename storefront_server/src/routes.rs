//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Any I/O (database calls, Bot API calls) must be awaited, never
//! blocked on.
//!
//! ## Authentication
//! Every route under `/api` sits behind [`crate::middleware::InitDataMiddlewareFactory`]. Handlers that take a
//! [`TelegramUser`] argument need the caller's init data, and reply with a 401 without it. Catalog reads are public.
//! Routes declared with `where requires operator` are additionally wrapped in the operator ACL.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use chrono::Utc;
use log::*;
use serde_json::json;
use storefront_engine::{
    db_types::{NewProduct, OrderId},
    order_objects::{ProductQueryFilter, TransitionResult},
    traits::{AccountManagement, CatalogManagement},
    AccountApi,
    CatalogApi,
    Notifier,
    OrderFlowApi,
    StorefrontDatabase,
};

use crate::{
    auth::TelegramUser,
    cache::CatalogCache,
    data_objects::{CreateOrderRequest, JsonResponse, VerifyRequest},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where requires operator) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>)
                    .wrap($crate::middleware::OperatorAclFactory::new());
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().json(json!({ "status": "ok", "timestamp": Utc::now() }))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(create_order => Post "/orders" impl StorefrontDatabase, Notifier);
/// Route handler for placing an order.
///
/// The order is placed for the caller identified by the init data. The whole order is rejected with a 400 if any line
/// is out of stock. On success, the response carries the order and the payment instructions (`paymentData`), and the
/// customer is sent the same instructions in the bot chat.
pub async fn create_order<B: StorefrontDatabase, N: Notifier>(
    user: TelegramUser,
    body: web::Json<CreateOrderRequest>,
    api: web::Data<OrderFlowApi<B, N>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST new order for {}", user.id);
    let order = body.into_inner().into_new_order((&user).into());
    let created = api.create_order(order).await?;
    if created.notifications_failed > 0 {
        warn!("💻️ Order {} was placed, but the customer could not be notified", created.order.order.id);
    }
    Ok(HttpResponse::Created().json(created))
}

route!(my_orders => Get "/orders" impl AccountManagement);
/// The caller's orders, newest first.
pub async fn my_orders<B: AccountManagement>(
    user: TelegramUser,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET my_orders for {}", user.id);
    let orders = api.orders_for(user.telegram_id()).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_id => Get "/orders/{id}" impl AccountManagement);
/// A single order with its payment instructions. Orders that belong to someone else are reported as not found,
/// unless the caller is an operator.
pub async fn order_by_id<B: AccountManagement>(
    user: TelegramUser,
    path: web::Path<i64>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId::from(path.into_inner());
    debug!("💻️ GET order {order_id} for {}", user.id);
    let order = api.order_for(user.telegram_id(), order_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(pending_payments => Get "/payments/pending" impl AccountManagement where requires operator);
/// Orders waiting for a screenshot or a verdict, most recently updated first.
pub async fn pending_payments<B: AccountManagement>(
    user: TelegramUser,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET pending payments for operator {}", user.id);
    let orders = api.pending_payments(user.telegram_id()).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(verify_payment => Post "/payments/{id}/verify" impl StorefrontDatabase, Notifier where requires operator);
/// Route handler for an operator's verdict on a payment: `{"status": "paid"}` or `{"status": "failed"}`.
///
/// Approving credits the customer's cashback. Verdicts on orders that are already settled succeed without changing
/// anything. Verdicts on orders that have no screenshot yet are refused with a 409.
pub async fn verify_payment<B: StorefrontDatabase, N: Notifier>(
    user: TelegramUser,
    path: web::Path<i64>,
    body: web::Json<VerifyRequest>,
    api: web::Data<OrderFlowApi<B, N>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId::from(path.into_inner());
    let decision = body.into_inner().status;
    info!("💻️ Operator {} marks order {order_id} as {decision}", user.id);
    let outcome = api.verify_payment(user.telegram_id(), order_id, decision).await?;
    let message = match outcome.result {
        TransitionResult::Applied => format!("Order {order_id} marked as {decision}"),
        TransitionResult::Repeated | TransitionResult::NoOp => {
            format!("Order {order_id} was already settled as {}", outcome.order.payment_status)
        },
    };
    Ok(HttpResponse::Ok().json(JsonResponse::success(message)))
}

//----------------------------------------------   Users  ----------------------------------------------------
route!(my_profile => Get "/users/me" impl AccountManagement);
/// The caller's profile and cashback balance. Customers that have never ordered get a zero balance.
pub async fn my_profile<B: AccountManagement>(
    user: TelegramUser,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET profile for {}", user.id);
    let profile = api.profile(user.telegram_id(), user.first_name.clone()).await?;
    Ok(HttpResponse::Ok().json(profile))
}

route!(my_cashback_history => Get "/users/cashback/history" impl AccountManagement);
pub async fn my_cashback_history<B: AccountManagement>(
    user: TelegramUser,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET cashback history for {}", user.id);
    let history = api.cashback_history(user.telegram_id()).await?;
    Ok(HttpResponse::Ok().json(history))
}

//----------------------------------------------   Products  ----------------------------------------------------
route!(products => Get "/products" impl CatalogManagement);
/// In-stock products, newest first. Supports `category`, `featured` and `limit` query parameters.
/// Responses are cached.
pub async fn products<B: CatalogManagement>(
    req: HttpRequest,
    query: web::Query<ProductQueryFilter>,
    api: web::Data<CatalogApi<B>>,
    cache: web::Data<CatalogCache>,
) -> Result<HttpResponse, ServerError> {
    let key = req.uri().to_string();
    if let Some(cached) = cache.get(&key) {
        return Ok(HttpResponse::Ok().json(cached));
    }
    let products = api.products(query.into_inner()).await?;
    let value = serde_json::to_value(&products).map_err(|e| ServerError::Unspecified(e.to_string()))?;
    cache.set(&key, value.clone());
    Ok(HttpResponse::Ok().json(value))
}

route!(product_by_id => Get "/products/{id}" impl CatalogManagement);
pub async fn product_by_id<B: CatalogManagement>(
    req: HttpRequest,
    path: web::Path<i64>,
    api: web::Data<CatalogApi<B>>,
    cache: web::Data<CatalogCache>,
) -> Result<HttpResponse, ServerError> {
    let key = req.uri().to_string();
    if let Some(cached) = cache.get(&key) {
        return Ok(HttpResponse::Ok().json(cached));
    }
    let product = api.product(path.into_inner()).await?;
    let value = serde_json::to_value(&product).map_err(|e| ServerError::Unspecified(e.to_string()))?;
    cache.set(&key, value.clone());
    Ok(HttpResponse::Ok().json(value))
}

route!(add_product => Post "/products" impl CatalogManagement where requires operator);
/// Adds a product and its variants to the catalog. The catalog cache is cleared so that the product shows up
/// immediately.
pub async fn add_product<B: CatalogManagement>(
    user: TelegramUser,
    body: web::Json<NewProduct>,
    api: web::Data<CatalogApi<B>>,
    cache: web::Data<CatalogCache>,
) -> Result<HttpResponse, ServerError> {
    info!("💻️ Operator {} is adding product '{}'", user.id, body.name);
    let product = api.insert_product(body.into_inner()).await?;
    cache.clear();
    Ok(HttpResponse::Created().json(product))
}
