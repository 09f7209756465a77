// src/handlers/scan.rs
// DOCUMENTATION: Scan trigger handlers
// PURPOSE: Start batch scans in the background and report worker status

use crate::config::Config;
use crate::errors::ScanError;
use crate::services::ScanJobRunner;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

/// Optional request body for the trigger endpoint
#[derive(Debug, Deserialize, Validate)]
pub struct RunRequest {
    /// Regions to scan instead of the configured list
    #[validate(length(min = 1, max = 100))]
    pub regions: Option<Vec<String>>,
}

impl RunRequest {
    /// Parse an optional JSON body; an empty body means "use the defaults"
    fn from_body(body: &[u8]) -> Result<Option<Vec<String>>, ScanError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        let request: RunRequest = serde_json::from_slice(body)
            .map_err(|e| ScanError::InvalidInput(format!("Invalid JSON body: {}", e)))?;

        if let Err(e) = request.validate() {
            return Err(ScanError::InvalidInput(e.to_string()));
        }

        let Some(regions) = request.regions else {
            return Ok(None);
        };

        let regions: Vec<String> = regions.iter().map(|r| r.trim().to_string()).collect();
        if regions.iter().any(String::is_empty) {
            return Err(ScanError::InvalidInput(
                "region names must not be blank".to_string(),
            ));
        }

        Ok(Some(regions))
    }
}

/// POST /run
/// Trigger a batch scan
///
/// DOCUMENTATION: Queues the run on the background worker and answers
/// immediately with 202; per-region outcomes are only visible through
/// GET /run/status and the logs
pub async fn start_run(
    runner: web::Data<ScanJobRunner>,
    config: web::Data<Config>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<impl Responder, ScanError> {
    verify_admin_token(&req, &config)?;

    let regions = RunRequest::from_body(&body)?;
    let triggered = runner.trigger(regions).await?;

    log::info!(
        "Scan run {} started for: {}",
        triggered.run_id,
        triggered.regions.join(", ")
    );

    Ok(HttpResponse::Accepted().json(json!({
        "status": "started",
        "run_id": triggered.run_id,
        "regions": triggered.regions,
    })))
}

/// GET /run/status
/// Current worker state and the last finished run
pub async fn run_status(
    runner: web::Data<ScanJobRunner>,
    config: web::Data<Config>,
    req: HttpRequest,
) -> Result<impl Responder, ScanError> {
    verify_admin_token(&req, &config)?;

    Ok(HttpResponse::Ok().json(runner.status().await))
}

/// Helper function to verify admin authentication
/// DOCUMENTATION: Checks X-Admin-Token header against the configured token.
/// An empty configured token leaves the endpoints open.
fn verify_admin_token(req: &HttpRequest, config: &Config) -> Result<(), ScanError> {
    if config.admin_token.is_empty() {
        return Ok(());
    }

    let token = req
        .headers()
        .get("X-Admin-Token")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            log::warn!("Trigger request without token");
            ScanError::Unauthorized
        })?;

    if token != config.admin_token {
        log::warn!("Trigger request with invalid token");
        return Err(ScanError::Forbidden);
    }

    Ok(())
}

/// Configuration for scan routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/run", web::post().to(start_run))
        .route("/run/status", web::get().to(run_status));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::env::test_config;
    use crate::services::scan_coordinator::tests::{
        resolver_with, settings, small_box, FakeFetcher, FakeSink,
    };
    use crate::services::ScanCoordinator;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use std::sync::Arc;
    use std::time::Duration;

    fn runner(pace: Duration) -> ScanJobRunner {
        let mut settings = settings();
        settings.pace_interval = pace;

        let coordinator = ScanCoordinator::new(
            Arc::new(resolver_with(&[("Karnataka", small_box())])),
            Arc::new(FakeFetcher::default()),
            Arc::new(FakeSink::default()),
            settings,
        );

        ScanJobRunner::start(Arc::new(coordinator), vec!["Karnataka".to_string()])
    }

    #[actix_rt::test]
    async fn test_run_is_accepted() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(runner(Duration::ZERO)))
                .app_data(web::Data::new(test_config()))
                .configure(config),
        )
        .await;

        let req = test::TestRequest::post().uri("/run").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::ACCEPTED);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "started");
        assert_eq!(body["regions"], json!(["Karnataka"]));
        assert!(body["run_id"].is_string());
    }

    #[actix_rt::test]
    async fn test_second_run_conflicts() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(runner(Duration::from_millis(50))))
                .app_data(web::Data::new(test_config()))
                .configure(config),
        )
        .await;

        let first = test::call_service(&app, test::TestRequest::post().uri("/run").to_request()).await;
        assert_eq!(first.status(), StatusCode::ACCEPTED);

        let second = test::call_service(&app, test::TestRequest::post().uri("/run").to_request()).await;
        assert_eq!(second.status(), StatusCode::CONFLICT);

        let req = test::TestRequest::get().uri("/run/status").to_request();
        let status: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(status["status"], "running");
    }

    #[actix_rt::test]
    async fn test_admin_token_enforced() {
        let mut config_with_token = test_config();
        config_with_token.admin_token = "secret".to_string();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(runner(Duration::ZERO)))
                .app_data(web::Data::new(config_with_token))
                .configure(config),
        )
        .await;

        let missing = test::call_service(&app, test::TestRequest::get().uri("/run/status").to_request()).await;
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

        let wrong = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/run/status")
                .insert_header(("X-Admin-Token", "guess"))
                .to_request(),
        )
        .await;
        assert_eq!(wrong.status(), StatusCode::FORBIDDEN);

        let ok = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/run/status")
                .insert_header(("X-Admin-Token", "secret"))
                .to_request(),
        )
        .await;
        assert_eq!(ok.status(), StatusCode::OK);
    }

    #[actix_rt::test]
    async fn test_run_request_parsing() {
        assert_eq!(RunRequest::from_body(b"").unwrap(), None);
        assert_eq!(RunRequest::from_body(b"{}").unwrap(), None);
        assert_eq!(
            RunRequest::from_body(br#"{"regions": [" Goa ", "Kerala"]}"#).unwrap(),
            Some(vec!["Goa".to_string(), "Kerala".to_string()])
        );

        assert!(RunRequest::from_body(br#"{"regions": []}"#).is_err());
        assert!(RunRequest::from_body(br#"{"regions": ["  "]}"#).is_err());
        assert!(RunRequest::from_body(b"not json").is_err());
    }
}
