pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;

use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use application::auth_service::AuthService;
use application::catalog_service::CatalogService;
use application::order_service::OrderService;
use application::provider_service::ProviderService;
use domain::ports::{Clock, Store};

pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut conn = pool.get()?;
    let applied = conn.run_pending_migrations(MIGRATIONS)?;
    log::info!("Applied {} pending migration(s)", applied.len());
    Ok(())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::orders::create_order,
        handlers::orders::quote_order,
        handlers::orders::list_orders,
        handlers::orders::get_order,
        handlers::orders::update_status,
        handlers::orders::update_payment,
        handlers::providers::list_available,
        handlers::providers::register_provider,
        handlers::providers::deactivate_provider,
        handlers::providers::dashboard,
        handlers::catalog::list_services,
        handlers::catalog::list_extras,
        handlers::catalog::validate_coupon,
        handlers::auth::login,
        handlers::auth::register_customer,
    ),
    tags(
        (name = "orders", description = "Order placement and fulfillment"),
        (name = "providers", description = "Laundry providers"),
        (name = "catalog", description = "Services, extras and coupons"),
        (name = "accounts", description = "Login and registration"),
    )
)]
pub struct ApiDoc;

/// The application services shared by every worker, all backed by one store.
#[derive(Clone)]
pub struct AppServices {
    pub orders: web::Data<OrderService<dyn Store>>,
    pub providers: web::Data<ProviderService<dyn Store>>,
    pub catalog: web::Data<CatalogService<dyn Store>>,
    pub auth: web::Data<AuthService<dyn Store>>,
}

impl AppServices {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>, activation_window: chrono::Duration) -> Self {
        Self {
            orders: web::Data::new(OrderService::new(store.clone(), clock.clone())),
            providers: web::Data::new(ProviderService::new(store.clone(), clock.clone())),
            catalog: web::Data::new(CatalogService::new(store.clone(), clock.clone())),
            auth: web::Data::new(AuthService::new(store, clock, activation_window)),
        }
    }
}

/// Register every HTTP route.
pub fn routes(cfg: &mut web::ServiceConfig) {
    use handlers::{auth, catalog, orders, providers};

    cfg.service(
        web::scope("/orders")
            .route("", web::post().to(orders::create_order))
            .route("", web::get().to(orders::list_orders))
            .route("/quote", web::post().to(orders::quote_order))
            .route("/{id}", web::get().to(orders::get_order))
            .route("/{id}/status", web::put().to(orders::update_status))
            .route("/{id}/payment", web::patch().to(orders::update_payment)),
    )
    .service(
        web::scope("/providers")
            .route("", web::post().to(providers::register_provider))
            .route("/available", web::get().to(providers::list_available))
            .route("/{id}/deactivate", web::post().to(providers::deactivate_provider))
            .route("/{id}/dashboard", web::get().to(providers::dashboard)),
    )
    .route("/services", web::get().to(catalog::list_services))
    .route("/extras", web::get().to(catalog::list_extras))
    .route("/coupons/validate", web::post().to(catalog::validate_coupon))
    .route("/auth/login", web::post().to(auth::login))
    .route("/customers", web::post().to(auth::register_customer));
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    services: AppServices,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let openapi = ApiDoc::openapi();

    Ok(HttpServer::new(move || {
        App::new()
            .app_data(services.orders.clone())
            .app_data(services.providers.clone())
            .app_data(services.catalog.clone())
            .app_data(services.auth.clone())
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
            )
            .configure(routes)
    })
    .bind((host.to_string(), port))?
    .run())
}
