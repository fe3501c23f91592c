use crate::{config::ChannelManagerConfig, errors::ServiceError};
use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, instrument};

const DATE_FORMAT: &str = "%Y-%m-%d";
const MAX_ERROR_BODY: usize = 512;

/// One day of availability reported upstream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityDay {
    pub date: NaiveDate,
    pub quantity: i32,
    pub status: String,
}

/// Source of per-day availability for a room type
#[async_trait]
pub trait InventorySource: Send + Sync {
    async fn fetch_availability(
        &self,
        hotel_id: &str,
        inv_type_code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AvailabilityDay>, ServiceError>;
}

#[derive(Debug, Deserialize)]
struct InventoryEnvelope {
    data: Vec<InventoryEntry>,
}

#[derive(Debug, Deserialize)]
struct InventoryEntry {
    #[serde(default)]
    availability: Option<Vec<RawAvailability>>,
}

#[derive(Debug, Deserialize)]
struct RawAvailability {
    date: String,
    quantity: i32,
    status: String,
}

/// HTTP client for the channel manager inventory endpoint
#[derive(Clone)]
pub struct ChannelManagerClient {
    client: Client,
    config: ChannelManagerConfig,
}

impl ChannelManagerClient {
    pub fn new(config: ChannelManagerConfig) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| {
                ServiceError::InternalError(format!("failed to build HTTP client: {}", e))
            })?;

        Ok(Self::with_client(config, client))
    }

    pub fn with_client(config: ChannelManagerConfig, client: Client) -> Self {
        Self { client, config }
    }

    fn parse_body(body: &[u8]) -> Result<Vec<AvailabilityDay>, ServiceError> {
        let envelope: InventoryEnvelope = serde_json::from_slice(body).map_err(|e| {
            ServiceError::ExternalApiError(format!("invalid channel manager response: {}", e))
        })?;

        let Some(raw_days) = envelope
            .data
            .into_iter()
            .next()
            .and_then(|entry| entry.availability)
        else {
            return Ok(Vec::new());
        };

        raw_days
            .into_iter()
            .map(|raw| {
                let date = NaiveDate::parse_from_str(&raw.date, DATE_FORMAT).map_err(|e| {
                    ServiceError::ExternalApiError(format!(
                        "invalid availability date '{}': {}",
                        raw.date, e
                    ))
                })?;
                Ok(AvailabilityDay {
                    date,
                    quantity: raw.quantity,
                    status: raw.status,
                })
            })
            .collect()
    }
}

fn truncate(text: &str) -> &str {
    match text.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[async_trait]
impl InventorySource for ChannelManagerClient {
    #[instrument(skip(self))]
    async fn fetch_availability(
        &self,
        hotel_id: &str,
        inv_type_code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AvailabilityDay>, ServiceError> {
        let start_date = start.format(DATE_FORMAT).to_string();
        let end_date = end.format(DATE_FORMAT).to_string();
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

        let response = self
            .client
            .get(&self.config.base_url)
            .query(&[
                ("echo_token", self.config.echo_token.as_str()),
                ("end_date", end_date.as_str()),
                ("hotel_code", hotel_id),
                ("inv_type_code", inv_type_code),
                ("password", self.config.password.as_str()),
                ("start_date", start_date.as_str()),
                ("timestamp", timestamp.as_str()),
                ("username", self.config.username.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Channel manager request failed");
                ServiceError::ExternalApiError(format!("channel manager request failed: {}", e))
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            ServiceError::ExternalApiError(format!("failed to read channel manager response: {}", e))
        })?;
        debug!(%status, bytes = body.len(), "Channel manager responded");

        if !status.is_success() {
            let text = String::from_utf8_lossy(&body);
            error!(%status, "Channel manager returned an error status");
            return Err(ServiceError::ExternalApiError(format!(
                "channel manager returned {}: {}",
                status,
                truncate(&text)
            )));
        }

        Self::parse_body(&body)
    }
}
