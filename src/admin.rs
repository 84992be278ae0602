//! Client for the admin import/export API.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::record::{kind_of, records_from, Record};
use crate::util::{endpoint, SecretString};

pub const IMPORT_PATH: &str = "/api/admin/import";
pub const EXPORT_PATH: &str = "/api/admin/export";

/// Counts reported by the import endpoint for one request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ImportSummary {
    #[serde(default)]
    pub imported: usize,
    #[serde(default)]
    pub errors: usize,
    #[serde(default)]
    pub total: Option<usize>,
}

/// Where records get imported.
#[async_trait]
pub trait ImportSink: Send + Sync {
    async fn import(
        &self,
        records: &[Record],
        import_source: &str,
        platform: &str,
    ) -> Result<ImportSummary>;
}

/// Where records get exported from during a database sync.
#[async_trait]
pub trait ExportSource: Send + Sync {
    async fn export(&self) -> Result<Vec<Record>>;
}

#[derive(Serialize)]
struct ImportRequest<'a> {
    skills: &'a [Record],
    import_source: &'a str,
    platform: &'a str,
}

pub struct AdminClient {
    base_url: String,
    token: SecretString,
    client: Client,
}

impl AdminClient {
    pub fn new(base_url: &str, token: SecretString, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .context("failed to build HTTP client")?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ImportSink for AdminClient {
    async fn import(
        &self,
        records: &[Record],
        import_source: &str,
        platform: &str,
    ) -> Result<ImportSummary> {
        let url = endpoint(&self.base_url, IMPORT_PATH);
        debug!(
            "POST {} ({} records, source={}, platform={})",
            url,
            records.len(),
            import_source,
            platform
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.token.expose())
            .json(&ImportRequest {
                skills: records,
                import_source,
                platform,
            })
            .send()
            .await
            .with_context(|| format!("Failed to send import request to {}", url))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            bail!("Import API error {}: {}", status, error_text);
        }

        response
            .json()
            .await
            .context("Failed to parse import API response")
    }
}

#[async_trait]
impl ExportSource for AdminClient {
    async fn export(&self) -> Result<Vec<Record>> {
        let url = endpoint(&self.base_url, EXPORT_PATH);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(self.token.expose())
            .send()
            .await
            .with_context(|| format!("Failed to send export request to {}", url))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            bail!("Export API error {}: {}", status, error_text);
        }

        let body: Value = response
            .json()
            .await
            .context("Failed to parse export API response")?;
        match body {
            Value::Array(items) => Ok(records_from(items)?),
            other => bail!("Expected list of skills, got {}", kind_of(&other)),
        }
    }
}
