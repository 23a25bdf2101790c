//! Telemetry boundary: wire payload for a cook reading and the publish
//! capability that carries it to the ingest endpoint.

use crate::cooker::CookSnapshot;
use crate::thermal::Reading;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Timestamp format the ingest side expects: ISO-8601 UTC, second precision.
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Upper bound on one publish attempt. The control loop runs publishes
/// inline, so a dead ingest endpoint must fail fast, not hang.
const PUBLISH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One published cook snapshot. Built from an immutable [`CookSnapshot`];
/// never references live controller state.
#[derive(Debug, Clone, Serialize)]
pub struct CookReading {
    pub cook_id: String,
    pub time: String,
    pub cook_start_time: String,
    pub chamber_target: f64,
    pub cooker_on: bool,
    pub readings: Vec<Reading>,
}

impl CookReading {
    pub fn from_snapshot(snapshot: &CookSnapshot) -> Self {
        Self {
            cook_id: snapshot.cook_id.clone(),
            time: format_time(Utc::now()),
            cook_start_time: format_time(snapshot.cook_start_time),
            chamber_target: snapshot.chamber_target,
            cooker_on: snapshot.cooker_on,
            readings: snapshot.readings.clone(),
        }
    }
}

fn format_time(t: DateTime<Utc>) -> String {
    t.format(TIME_FORMAT).to_string()
}

/// Best-effort outbound telemetry. A failed publish is the caller's problem
/// only to the extent of logging it; the control loop never blocks on it.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, reading: &CookReading) -> Result<(), PublishError>;
}

/// Posts each reading as JSON to the configured ingest URL. Every request
/// carries a timeout so an endpoint that accepts the connection but never
/// answers cannot stall the publish cycle.
pub struct HttpPublisher {
    client: reqwest::Client,
    url: String,
}

impl HttpPublisher {
    pub fn new(url: String) -> Result<Self, PublishError> {
        Self::with_timeout(url, PUBLISH_TIMEOUT)
    }

    fn with_timeout(url: String, timeout: Duration) -> Result<Self, PublishError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl Publisher for HttpPublisher {
    async fn publish(&self, reading: &CookReading) -> Result<(), PublishError> {
        self.client
            .post(&self.url)
            .json(reading)
            .send()
            .await?
            .error_for_status()?;
        tracing::debug!("Published cook reading to {}", self.url);
        Ok(())
    }
}

/// Fallback when no ingest URL is configured: readings only reach the log.
pub struct LogPublisher;

#[async_trait]
impl Publisher for LogPublisher {
    async fn publish(&self, reading: &CookReading) -> Result<(), PublishError> {
        tracing::info!("Cook reading: {}", serde_json::to_string(reading)?);
        Ok(())
    }
}
