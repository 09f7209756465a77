// src/main.rs
// DOCUMENTATION: Application entry point
// PURPOSE: Initialize config, build the scan pipeline, start the worker and HTTP server

mod config;
mod errors;
mod handlers;
mod models;
mod services;

use actix_web::{middleware::Logger, web, App, HttpServer};
use config::Config;
use dotenv::dotenv;
use services::{
    DirectoryClient, EmailReportSink, NominatimResolver, ScanCoordinator, ScanJobRunner,
};
use std::io;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // 1. Load environment variables
    dotenv().ok();

    // 2. Load and validate configuration (fatal on error)
    let config = match Config::from_env().and_then(|c| c.validate().map(|_| c)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    // 3. Initialize logging
    if std::env::var("RUST_LOG").is_err() {
        let log_level = if !config.log_level.is_empty() {
            config.log_level.as_str()
        } else {
            "info"
        };
        std::env::set_var("RUST_LOG", log_level);
    }
    env_logger::init();

    log::info!("Starting gridscan-places...");
    for warning in config.warnings() {
        log::warn!("{}", warning);
    }
    log::info!("Environment: {}", config.environment);
    log::info!(
        "Scan settings: category={}, radius={}, grid_step={}, pace={}ms, regions=[{}]",
        config.category,
        config.radius,
        config.grid_step,
        config.pace_interval_ms,
        config.regions.join(", ")
    );

    // 4. Build the outbound clients shared by every run
    let http_client = match config::init_http_client(&config) {
        Ok(client) => client,
        Err(e) => {
            log::error!("Failed to build HTTP client: {}", e);
            std::process::exit(1);
        }
    };

    let sink = match EmailReportSink::from_config(&config) {
        Ok(sink) => sink,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    let coordinator = ScanCoordinator::new(
        Arc::new(NominatimResolver::from_config(http_client.clone(), &config)),
        Arc::new(DirectoryClient::from_config(http_client, &config)),
        Arc::new(sink),
        config.scan_settings(),
    );

    // 5. Start the background scan worker
    let runner = ScanJobRunner::start(Arc::new(coordinator), config.regions.clone());
    log::info!("Started scan worker");

    // 6. Start HTTP server
    let server_addr = format!("{}:{}", config.server_address, config.server_port);
    log::info!("Server Address: {}", server_addr);
    let config_clone = config.clone();

    HttpServer::new(move || {
        App::new()
            // Application state (config and worker handle)
            .app_data(web::Data::new(config_clone.clone()))
            .app_data(web::Data::new(runner.clone()))
            // Middleware
            .wrap(Logger::default())
            // Routes
            .configure(handlers::health_config)
            .configure(handlers::scan_config)
    })
    .bind(&server_addr)?
    .run()
    .await
}
