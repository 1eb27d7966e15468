use std::{sync::Arc, time::Duration};

use actix_web::{http::StatusCode, test, web, App};
use serde_json::{json, Value};
use sf_common::Secret;
use storefront_engine::{
    db_types::{Product, ProductDetails},
    CatalogApi,
    CatalogError,
    OperatorPolicy,
};

use super::{
    helpers::{init_data_for, policy, CUSTOMER, OPERATOR, TEST_BOT_TOKEN},
    mocks::MockCatalog,
};
use crate::{
    cache::{CatalogCache, MemoryCache, ResponseCache},
    middleware::InitDataMiddlewareFactory,
    routes::{AddProductRoute, ProductByIdRoute, ProductsRoute},
};

fn hoodie() -> Product {
    serde_json::from_value(json!({
        "id": 3,
        "name": "Hoodie",
        "description": "Oversized cotton hoodie",
        "price": 6000,
        "sale_price": 5000,
        "category": "hoodies",
        "images": ["/img/hoodie.webp"],
        "featured": true,
        "in_stock": true,
        "created_at": "2024-06-01T10:00:00Z",
        "updated_at": "2024-06-01T10:00:00Z"
    }))
    .unwrap()
}

fn init_app(
    catalog: MockCatalog,
    cache: Arc<dyn ResponseCache>,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let scope = web::scope("/api")
        .wrap(InitDataMiddlewareFactory::new(Secret::new(TEST_BOT_TOKEN.to_string()), true))
        .service(ProductsRoute::<MockCatalog>::new())
        .service(ProductByIdRoute::<MockCatalog>::new())
        .service(AddProductRoute::<MockCatalog>::new())
        .app_data(web::Data::new(CatalogApi::new(catalog)))
        .app_data(web::Data::new(CatalogCache::new(cache, Duration::from_secs(60))))
        .app_data(web::Data::<dyn OperatorPolicy>::from(policy()));
    App::new().service(scope)
}

#[actix_web::test]
async fn product_list_is_cached() {
    let _ = env_logger::try_init().ok();
    let mut catalog = MockCatalog::new();
    catalog.expect_fetch_products().times(1).returning(|_| Ok(vec![hoodie()]));
    let cache = Arc::new(MemoryCache::new());
    let app = test::init_service(init_app(catalog, cache.clone())).await;
    for _ in 0..3 {
        let req = test::TestRequest::get().uri("/api/products?category=hoodies").to_request();
        let products: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(products[0]["name"], "Hoodie");
        assert_eq!(products[0]["sale_price"], 5000);
    }
    assert_eq!(cache.len(), 1);
}

#[actix_web::test]
async fn product_filters_are_checked() {
    let _ = env_logger::try_init().ok();
    let mut catalog = MockCatalog::new();
    catalog.expect_fetch_products().never();
    let app = test::init_service(init_app(catalog, Arc::new(MemoryCache::new()))).await;
    let req = test::TestRequest::get().uri("/api/products?limit=0").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn product_not_found() {
    let _ = env_logger::try_init().ok();
    let mut catalog = MockCatalog::new();
    catalog.expect_fetch_product().returning(|_| Ok(None));
    let app = test::init_service(init_app(catalog, Arc::new(MemoryCache::new()))).await;
    let req = test::TestRequest::get().uri("/api/products/44").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body = test::read_body(res).await;
    assert_eq!(body, r#"{"error":"The data was not found. Product 44 not found"}"#);
}

#[actix_web::test]
async fn only_operators_add_products() {
    let _ = env_logger::try_init().ok();
    let mut catalog = MockCatalog::new();
    catalog.expect_insert_product().never();
    let app = test::init_service(init_app(catalog, Arc::new(MemoryCache::new()))).await;
    let req = test::TestRequest::post()
        .uri("/api/products")
        .insert_header(("X-Telegram-Init-Data", init_data_for(CUSTOMER, "Aigerim")))
        .set_json(json!({ "name": "Cap", "price": 3000 }))
        .to_request();
    let err = test::try_call_service(&app, req).await.expect_err("customers may not add products");
    assert_eq!(err.error_response().status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn adding_a_product_clears_the_cache() {
    let _ = env_logger::try_init().ok();
    let mut catalog = MockCatalog::new();
    catalog
        .expect_insert_product()
        .withf(|p| p.name == "Cap" && p.variants.len() == 1)
        .times(1)
        .returning(|p| {
            let mut product = hoodie();
            product.id = 4;
            product.name = p.name;
            Ok(ProductDetails { product, variants: vec![] })
        });
    catalog.expect_fetch_product().returning(|_| Err(CatalogError::DatabaseError("unreachable".into())));
    let cache = Arc::new(MemoryCache::new());
    cache.set("/api/products", json!([]), Duration::from_secs(60));
    let app = test::init_service(init_app(catalog, cache.clone())).await;
    let req = test::TestRequest::post()
        .uri("/api/products")
        .insert_header(("X-Telegram-Init-Data", init_data_for(OPERATOR, "Operator")))
        .set_json(json!({
            "name": "Cap",
            "price": 3000,
            "variants": [{ "size": "one", "color": "red", "stock_quantity": 2 }]
        }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    assert!(cache.is_empty());
    let req = test::TestRequest::get().uri("/api/products/4").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
