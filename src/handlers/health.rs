// src/handlers/health.rs
// DOCUMENTATION: Health check handlers
// PURPOSE: Static liveness endpoints that never touch the scan worker

use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

pub async fn index() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": "gridscan-places",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/health", web::get().to(health_check));
}
