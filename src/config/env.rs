// src/config/env.rs
// DOCUMENTATION: Environment variable management
// PURPOSE: Load and validate configuration from .env files

use crate::errors::ScanError;
use crate::services::ScanSettings;
use dotenv::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Smallest grid step that survives rounding to 4 decimal digits
pub const MIN_GRID_STEP: f64 = 0.0001;

/// Application configuration loaded from environment variables
/// DOCUMENTATION: Centralizes all configuration in one struct
/// Load with Config::from_env() at application startup, then pass it
/// (or the values derived from it) explicitly into each component
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "0.0.0.0")
    pub server_address: String,

    /// Server listen port (default 10000)
    pub server_port: u16,

    /// Environment: development, staging, production
    pub environment: String,

    /// Log level: debug, info, warn, error
    pub log_level: String,

    /// Admin token for the trigger endpoints (empty = endpoints are open)
    pub admin_token: String,

    /// Geocoder search endpoint (Nominatim compatible)
    pub geocoder_url: String,

    /// User-Agent sent to the geocoder
    pub geocoder_user_agent: String,

    /// Country appended to every region name before lookup
    pub region_country: String,

    /// Business directory endpoint
    pub directory_api_url: String,

    /// Business directory credential
    pub directory_api_key: String,

    /// Header name carrying the directory credential
    pub directory_api_key_header: String,

    /// Category filter sent with every directory query
    pub category: String,

    /// Search radius sent with every directory query
    pub radius: u32,

    /// Grid spacing in degrees
    pub grid_step: f64,

    /// Pause after each grid point, in milliseconds
    pub pace_interval_ms: u64,

    /// Regions scanned by a default run, in order
    pub regions: Vec<String>,

    /// Timeout for every outbound HTTP call, in seconds
    pub http_timeout_secs: u64,

    /// SMTP relay host (implicit TLS)
    pub smtp_host: String,

    /// SMTP relay port
    pub smtp_port: u16,

    /// Sender address, also the SMTP login
    pub email_user: String,

    /// SMTP password (app password)
    pub email_password: String,

    /// Report recipient
    pub email_to: String,
}

impl Config {
    /// Load configuration from environment variables
    /// DOCUMENTATION: Reads from .env or process environment
    /// Called once at application startup. Numeric values that do not parse
    /// are reported as configuration errors instead of silently defaulting.
    pub fn from_env() -> Result<Self, ScanError> {
        // Load .env file if it exists
        dotenv().ok();

        Ok(Config {
            server_address: string_var("SERVER_ADDRESS", "0.0.0.0"),
            server_port: parsed_var("PORT", 10000)?,
            environment: string_var("ENVIRONMENT", "development"),
            log_level: string_var("LOG_LEVEL", "info"),
            admin_token: string_var("ADMIN_TOKEN", ""),

            geocoder_url: string_var(
                "GEOCODER_URL",
                "https://nominatim.openstreetmap.org/search",
            ),
            geocoder_user_agent: string_var("GEOCODER_USER_AGENT", "geo-scraper"),
            region_country: string_var("REGION_COUNTRY", "India"),

            directory_api_url: string_var(
                "DIRECTORY_API_URL",
                "https://api.chotu.com/api/biz/latlong",
            ),
            directory_api_key: string_var("DIRECTORY_API_KEY", ""),
            directory_api_key_header: string_var("DIRECTORY_API_KEY_HEADER", "chotu_api_key"),

            category: string_var("SCAN_CATEGORY", "stationery"),
            radius: parsed_var("SCAN_RADIUS", 20)?,
            grid_step: parsed_var("GRID_STEP", 0.3)?,
            pace_interval_ms: parsed_var("PACE_INTERVAL_MS", 400)?,
            regions: parse_regions(&string_var("SCAN_REGIONS", "Tamil Nadu,Karnataka")),
            http_timeout_secs: parsed_var("HTTP_TIMEOUT_SECS", 30)?,

            smtp_host: string_var("SMTP_HOST", "smtp.gmail.com"),
            smtp_port: parsed_var("SMTP_PORT", 465)?,
            email_user: string_var("EMAIL_USER", ""),
            email_password: string_var("EMAIL_APP_PASSWORD", ""),
            email_to: string_var("EMAIL_TO", ""),
        })
    }

    /// Validate critical configuration
    /// DOCUMENTATION: Ensures the application can start safely
    /// Every missing credential is named in one error so an operator can fix
    /// the environment in a single pass.
    pub fn validate(&self) -> Result<(), ScanError> {
        let required = [
            ("DIRECTORY_API_KEY", &self.directory_api_key),
            ("EMAIL_USER", &self.email_user),
            ("EMAIL_APP_PASSWORD", &self.email_password),
            ("EMAIL_TO", &self.email_to),
        ];

        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();

        if !missing.is_empty() {
            return Err(ScanError::Configuration(format!(
                "missing required variables: {}",
                missing.join(", ")
            )));
        }

        if self.regions.is_empty() {
            return Err(ScanError::Configuration(
                "SCAN_REGIONS must list at least one region".to_string(),
            ));
        }

        if self.category.trim().is_empty() {
            return Err(ScanError::Configuration(
                "SCAN_CATEGORY must not be empty".to_string(),
            ));
        }

        if self.radius == 0 {
            return Err(ScanError::Configuration(
                "SCAN_RADIUS must be positive".to_string(),
            ));
        }

        if !self.grid_step.is_finite() || !(MIN_GRID_STEP..=90.0).contains(&self.grid_step) {
            return Err(ScanError::Configuration(format!(
                "GRID_STEP must be between {} and 90 degrees, got {}",
                MIN_GRID_STEP, self.grid_step
            )));
        }

        if self.http_timeout_secs == 0 {
            return Err(ScanError::Configuration(
                "HTTP_TIMEOUT_SECS must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Non-fatal configuration problems
    /// DOCUMENTATION: Returned rather than logged so main can report them once
    /// the logger is running
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.admin_token.is_empty() {
            warnings.push("ADMIN_TOKEN not configured - trigger endpoints are open".to_string());
        }

        warnings
    }

    /// Per-region scan parameters derived from this configuration
    pub fn scan_settings(&self) -> ScanSettings {
        ScanSettings {
            grid_step: self.grid_step,
            category: self.category.clone(),
            radius: self.radius,
            pace_interval: Duration::from_millis(self.pace_interval_ms),
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn string_var(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parsed_var<T: FromStr>(name: &str, default: T) -> Result<T, ScanError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| {
            ScanError::Configuration(format!("{} has an invalid value: {:?}", name, raw))
        }),
        Err(_) => Ok(default),
    }
}

/// Split a comma-separated region list, dropping blanks
pub fn parse_regions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        server_address: "127.0.0.1".to_string(),
        server_port: 10000,
        environment: "test".to_string(),
        log_level: "info".to_string(),
        admin_token: String::new(),
        geocoder_url: "http://localhost/search".to_string(),
        geocoder_user_agent: "geo-scraper".to_string(),
        region_country: "India".to_string(),
        directory_api_url: "http://localhost/latlong".to_string(),
        directory_api_key: "key".to_string(),
        directory_api_key_header: "chotu_api_key".to_string(),
        category: "stationery".to_string(),
        radius: 20,
        grid_step: 0.3,
        pace_interval_ms: 400,
        regions: vec!["Tamil Nadu".to_string(), "Karnataka".to_string()],
        http_timeout_secs: 30,
        smtp_host: "smtp.gmail.com".to_string(),
        smtp_port: 465,
        email_user: "sender@example.com".to_string(),
        email_password: "app-password".to_string(),
        email_to: "ops@example.com".to_string(),
    }
}
