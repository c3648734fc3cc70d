use std::sync::Arc;

use dotenvy::dotenv;
use laundry_service::config::{AppConfig, StorageBackend};
use laundry_service::domain::ports::{Store, SystemClock};
use laundry_service::infrastructure::{memory::MemoryStore, DieselStore};
use laundry_service::{build_server, create_pool, run_migrations, AppServices};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(|e| {
        log::error!("Invalid configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e)
    })?;

    let store: Arc<dyn Store> = match config.storage {
        StorageBackend::Postgres => {
            let url = config.database_url.as_deref().unwrap_or_default();
            let pool = create_pool(url).map_err(|e| {
                log::error!("Could not create connection pool: {}", e);
                std::io::Error::other(e)
            })?;
            run_migrations(&pool).map_err(|e| {
                log::error!("Database migrations failed: {}", e);
                std::io::Error::other(e)
            })?;
            Arc::new(DieselStore::new(pool))
        }
        StorageBackend::Memory => {
            log::warn!("Using in-memory storage, nothing will survive a restart");
            Arc::new(MemoryStore::with_default_catalog())
        }
    };

    let services = AppServices::new(
        store,
        Arc::new(SystemClock),
        chrono::Duration::seconds(config.activation_window_secs),
    );

    log::info!("Starting server at http://{}:{}", config.host, config.port);

    build_server(services, &config.host, config.port)?.await
}
