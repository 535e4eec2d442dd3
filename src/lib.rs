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

use application::cart_service::CartService;
use application::commands::CartCommands;
use config::AppConfig;
use errors::{AppError, StartupError};
use infrastructure::diesel_repo::DieselCartRepository;
use infrastructure::memory::InMemoryCartRepository;

pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), StartupError> {
    let mut conn = pool.get()?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| StartupError::Migrations(e.to_string()))?;
    Ok(())
}

/// Picks the storage backend from the configuration and wraps it in the
/// cart service. Without a database URL carts live in process memory.
pub fn build_commands(config: &AppConfig) -> Result<Arc<dyn CartCommands>, StartupError> {
    let prices = config.price_table.clone();
    match &config.database_url {
        Some(url) => {
            let pool = create_pool(url)?;
            run_migrations(&pool)?;
            log::info!("Using PostgreSQL cart storage");
            Ok(Arc::new(CartService::new(
                DieselCartRepository::new(pool),
                prices,
            )))
        }
        None => {
            log::warn!("DATABASE_URL not set; carts are kept in memory and lost on restart");
            Ok(Arc::new(CartService::new(
                InMemoryCartRepository::new(),
                prices,
            )))
        }
    }
}

/// Registers the cart routes. Expects a `web::Data<dyn CartCommands>` in the
/// app data.
pub fn configure_app(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .service(
        web::scope("/cart")
            .route("", web::get().to(handlers::cart::list_items))
            .route("/items", web::post().to(handlers::cart::add_item))
            .route("/items/{id}", web::delete().to(handlers::cart::remove_item)),
    )
    .route("/products", web::get().to(handlers::cart::list_products))
    .route("/api-docs/openapi.json", web::get().to(handlers::openapi_json));
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    commands: Arc<dyn CartCommands>,
    host: &str,
    port: u16,
    workers: Option<usize>,
) -> std::io::Result<actix_web::dev::Server> {
    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::from(commands.clone()))
            .wrap(Logger::default())
            .configure(configure_app)
    });
    if let Some(workers) = workers {
        server = server.workers(workers);
    }
    Ok(server.bind((host.to_string(), port))?.run())
}
