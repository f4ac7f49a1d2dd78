// src/main.rs
// DOCUMENTATION: Application entry point
// PURPOSE: Initialize config, local cache, Places client and start HTTP server

use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use places_lookup::config::{self, Config};
use places_lookup::db::SqliteCacheStore;
use places_lookup::handlers;
use places_lookup::services::{GooglePlacesClient, LookupOrchestrator};
use std::io;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // 1. Load environment variables
    dotenv().ok();

    // 2. Load configuration
    let config = Config::from_env();

    // 3. Initialize logging
    if std::env::var("RUST_LOG").is_err() {
        let log_level = if !config.log_level.is_empty() {
            config.log_level.clone()
        } else {
            "info,actix_web=info,sqlx=warn".to_string()
        };
        std::env::set_var("RUST_LOG", log_level);
    }
    env_logger::init();

    // Without a usable API key every lookup would fail
    if let Err(e) = config.validate() {
        log::error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    log::info!("Starting places-lookup service...");
    log::info!("Environment: {}", config.environment);
    log::info!(
        "Server Address: {}:{}",
        config.server_address,
        config.server_port
    );

    // 4. Initialize local cache store
    let pool = match config::init_db_pool(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("Failed to open cache database: {}", e);
            std::process::exit(1);
        }
    };
    let cache = match SqliteCacheStore::new(pool).await {
        Ok(cache) => cache,
        Err(e) => {
            log::error!("Failed to prepare cache store: {}", e);
            std::process::exit(1);
        }
    };

    // 5. Places client and orchestrator
    let client = match GooglePlacesClient::from_config(&config) {
        Ok(client) => client,
        Err(e) => {
            log::error!("Failed to build Places client: {}", e);
            std::process::exit(1);
        }
    };
    let orchestrator = LookupOrchestrator::new(Arc::new(client), Arc::new(cache))
        .with_photo_bounds(config.photo_max_width, config.photo_max_height);
    log::info!(
        "Lookup orchestrator ready (photo bounds {}x{})",
        config.photo_max_width,
        config.photo_max_height
    );

    // 6. Start HTTP server
    let server_addr = format!("{}:{}", config.server_address, config.server_port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(orchestrator.clone()))
            // Middleware
            .wrap(Logger::default())
            .wrap(actix_web::middleware::Compress::default())
            // Routes
            .configure(handlers::health_config)
            .configure(handlers::places_config)
    })
    .bind(&server_addr)?
    .run()
    .await
}
