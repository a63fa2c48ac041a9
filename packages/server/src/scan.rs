use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

use crate::config::ScanConfig;

/// Outcome of a completed malware analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanVerdict {
    Clean,
    Infected,
}

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("virus scan submission failed: {0}")]
    SubmitFailed(String),
    #[error("failed to fetch scan results: {0}")]
    FetchFailed(String),
    #[error("scan did not complete after {attempts} polls")]
    Timeout { attempts: u32 },
}

/// Submits file bytes to an external scanning service and polls for a
/// verdict. The scan gates every stored blob; a failure here aborts the
/// enclosing upload batch.
#[async_trait]
pub trait MalwareScanner: Send + Sync {
    /// Submit raw bytes for analysis, returning an analysis identifier.
    async fn submit(&self, data: Vec<u8>) -> Result<String, ScanError>;

    /// Poll the analysis until it completes and return its verdict.
    async fn verdict(&self, analysis_id: &str) -> Result<ScanVerdict, ScanError>;
}

/// VirusTotal v3 API client.
pub struct VirusTotalScanner {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    poll_attempts: u32,
    poll_interval: Duration,
}

impl VirusTotalScanner {
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            poll_attempts: config.poll_attempts,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        }
    }
}

#[derive(Deserialize)]
struct SubmitResponse {
    data: SubmitData,
}

#[derive(Deserialize)]
struct SubmitData {
    id: String,
}

#[derive(Deserialize)]
struct AnalysisResponse {
    data: AnalysisData,
}

#[derive(Deserialize)]
struct AnalysisData {
    attributes: AnalysisAttributes,
}

#[derive(Deserialize)]
struct AnalysisAttributes {
    status: String,
    #[serde(default)]
    stats: AnalysisStats,
}

#[derive(Deserialize, Default)]
struct AnalysisStats {
    #[serde(default)]
    malicious: u32,
}

fn verdict_from(attributes: &AnalysisAttributes) -> Option<ScanVerdict> {
    if attributes.status != "completed" {
        return None;
    }
    Some(if attributes.stats.malicious > 0 {
        ScanVerdict::Infected
    } else {
        ScanVerdict::Clean
    })
}

#[async_trait]
impl MalwareScanner for VirusTotalScanner {
    #[instrument(skip(self, data), fields(size = data.len()))]
    async fn submit(&self, data: Vec<u8>) -> Result<String, ScanError> {
        let part = reqwest::multipart::Part::bytes(data).file_name("file");
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(format!("{}/files", self.base_url))
            .header("x-apikey", &self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ScanError::SubmitFailed(e.to_string()))?
            .error_for_status()
            .map_err(|e| ScanError::SubmitFailed(e.to_string()))?;

        let body: SubmitResponse = response
            .json()
            .await
            .map_err(|e| ScanError::SubmitFailed(e.to_string()))?;

        Ok(body.data.id)
    }

    #[instrument(skip(self))]
    async fn verdict(&self, analysis_id: &str) -> Result<ScanVerdict, ScanError> {
        for attempt in 0..self.poll_attempts {
            if attempt > 0 {
                tokio::time::sleep(self.poll_interval).await;
            }

            let response = self
                .http
                .get(format!("{}/analyses/{analysis_id}", self.base_url))
                .header("x-apikey", &self.api_key)
                .send()
                .await
                .map_err(|e| ScanError::FetchFailed(e.to_string()))?
                .error_for_status()
                .map_err(|e| ScanError::FetchFailed(e.to_string()))?;

            let body: AnalysisResponse = response
                .json()
                .await
                .map_err(|e| ScanError::FetchFailed(e.to_string()))?;

            if let Some(verdict) = verdict_from(&body.data.attributes) {
                return Ok(verdict);
            }

            tracing::debug!(
                status = %body.data.attributes.status,
                attempt,
                "analysis not yet complete"
            );
        }

        Err(ScanError::Timeout {
            attempts: self.poll_attempts,
        })
    }
}
