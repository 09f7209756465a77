// src/services/report_sink.rs
// DOCUMENTATION: Report rendering and delivery
// PURPOSE: Render a region's records as CSV and send them as an e-mail attachment

use crate::config::Config;
use crate::errors::ScanError;
use crate::models::{BusinessRecord, ScanResult};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;

/// Accepts a finished region result
/// DOCUMENTATION: Takes ownership of the result; the coordinator keeps no copy
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn deliver(&self, region: &str, result: ScanResult) -> Result<(), ScanError>;
}

/// Render records as CSV
/// DOCUMENTATION: Header row always present, one row per record in order.
/// Absent values are written as empty cells.
pub fn render_csv(records: &[BusinessRecord]) -> Result<String, ScanError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    if records.is_empty() {
        writer
            .write_record([
                "region",
                "scan_lat",
                "scan_lon",
                "business_name",
                "category",
                "address",
                "phone",
                "business_lat",
                "business_lon",
            ])
            .map_err(|e| ScanError::DeliveryFailed(format!("CSV error: {}", e)))?;
    }

    for record in records {
        writer
            .serialize(record)
            .map_err(|e| ScanError::DeliveryFailed(format!("CSV error: {}", e)))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ScanError::DeliveryFailed(format!("CSV error: {}", e)))?;

    String::from_utf8(bytes).map_err(|e| ScanError::DeliveryFailed(format!("CSV error: {}", e)))
}

/// Attachment name for a region, e.g. "Tamil_Nadu.csv"
pub fn attachment_filename(region: &str) -> String {
    format!("{}.csv", region.replace(' ', "_"))
}

/// E-mail report sink
/// DOCUMENTATION: Sends one message per region over SMTP with implicit TLS
pub struct EmailReportSink {
    smtp_host: String,
    smtp_port: u16,
    username: String,
    password: String,
    from: Mailbox,
    to: Mailbox,
    timeout: Duration,
}

impl EmailReportSink {
    /// Build the sink, checking both addresses up front
    pub fn from_config(config: &Config) -> Result<Self, ScanError> {
        let from = config.email_user.parse::<Mailbox>().map_err(|e| {
            ScanError::Configuration(format!("EMAIL_USER is not a valid address: {}", e))
        })?;
        let to = config.email_to.parse::<Mailbox>().map_err(|e| {
            ScanError::Configuration(format!("EMAIL_TO is not a valid address: {}", e))
        })?;

        Ok(Self {
            smtp_host: config.smtp_host.clone(),
            smtp_port: config.smtp_port,
            username: config.email_user.clone(),
            password: config.email_password.clone(),
            from,
            to,
            timeout: config.http_timeout(),
        })
    }

    /// Compose the report message for one region
    pub fn build_message(&self, region: &str, csv_body: String) -> Result<Message, ScanError> {
        let content_type = ContentType::parse("text/csv")
            .map_err(|e| ScanError::DeliveryFailed(format!("Invalid content type: {}", e)))?;

        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(format!("{} - Business Data", region))
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(format!(
                        "Attached is the scraped business data for {}.",
                        region
                    )))
                    .singlepart(
                        Attachment::new(attachment_filename(region)).body(csv_body, content_type),
                    ),
            )
            .map_err(|e| ScanError::DeliveryFailed(format!("Failed to build message: {}", e)))
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, ScanError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.smtp_host)
            .map_err(|e| ScanError::DeliveryFailed(format!("SMTP setup failed: {}", e)))?
            .port(self.smtp_port)
            .credentials(Credentials::new(self.username.clone(), self.password.clone()))
            .timeout(Some(self.timeout))
            .build();

        Ok(transport)
    }
}

#[async_trait]
impl ReportSink for EmailReportSink {
    async fn deliver(&self, region: &str, result: ScanResult) -> Result<(), ScanError> {
        let row_count = result.len();
        let csv_body = render_csv(result.records())?;
        let message = self.build_message(region, csv_body)?;

        self.transport()?.send(message).await.map_err(|e| {
            log::error!("SMTP delivery failed for {}: {}", region, e);
            ScanError::DeliveryFailed(format!("SMTP error: {}", e))
        })?;

        log::info!("Report for {} sent to {} ({} rows)", region, self.to, row_count);
        Ok(())
    }
}
