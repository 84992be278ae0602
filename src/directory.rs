//! Client for the public plugin directory.
//!
//! The directory serves `{ "plugins": [...] }` pages addressed by
//! `limit`/`offset`. It sits behind bot protection that answers 403 to
//! requests without browser-like headers, so every request carries them.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::DirectoryConfig;
use crate::record::{records_from, Record};

/// Result of requesting one page.
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    /// Records on this page. Empty means the directory is exhausted.
    Page(Vec<Record>),
    /// The directory refused the request (HTTP 403).
    Blocked,
}

#[async_trait]
pub trait PluginSource: Send + Sync {
    /// URL recorded as `import_source` for records taken from here.
    fn source_url(&self) -> &str;

    async fn fetch_page(&self, offset: usize, limit: usize) -> Result<PageOutcome>;
}

#[derive(Debug, Deserialize)]
struct PluginPage {
    #[serde(default)]
    plugins: Option<Vec<Value>>,
}

pub struct DirectoryClient {
    base_url: String,
    client: Client,
}

impl DirectoryClient {
    pub fn new(config: &DirectoryConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json, text/plain, */*"),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            header::HeaderValue::from_static("en-US,en;q=0.9"),
        );
        let site = config.site.trim_end_matches('/');
        headers.insert(
            header::REFERER,
            header::HeaderValue::from_str(&format!("{}/", site))
                .context("invalid directory site URL")?,
        );
        headers.insert(
            header::ORIGIN,
            header::HeaderValue::from_str(site).context("invalid directory site URL")?,
        );
        headers.insert("sec-fetch-dest", header::HeaderValue::from_static("empty"));
        headers.insert("sec-fetch-mode", header::HeaderValue::from_static("cors"));
        headers.insert(
            "sec-fetch-site",
            header::HeaderValue::from_static("same-origin"),
        );

        Ok(Self {
            base_url: config.base_url.clone(),
            client: Client::builder()
                .user_agent(config.user_agent.clone())
                .default_headers(headers)
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()
                .context("failed to build HTTP client")?,
        })
    }
}

#[async_trait]
impl PluginSource for DirectoryClient {
    fn source_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch_page(&self, offset: usize, limit: usize) -> Result<PageOutcome> {
        debug!("GET {} offset={} limit={}", self.base_url, offset, limit);

        let limit = limit.to_string();
        let offset = offset.to_string();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("q", ""), ("limit", limit.as_str()), ("offset", offset.as_str())])
            .send()
            .await
            .context("Failed to send request to plugin directory")?;

        if response.status() == StatusCode::FORBIDDEN {
            return Ok(PageOutcome::Blocked);
        }
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            bail!("Plugin directory error {}: {}", status, error_text);
        }

        let page: PluginPage = response
            .json()
            .await
            .context("Failed to parse plugin directory response")?;
        let records = records_from(page.plugins.unwrap_or_default())?;
        Ok(PageOutcome::Page(records))
    }
}

/// Page through the whole directory, collecting every record.
///
/// Stops at the first empty page, block, or fetch error. Whatever was
/// collected before the stop is returned.
pub async fn extract_all(
    source: &dyn PluginSource,
    page_size: usize,
    delay: Duration,
) -> Result<Vec<Record>> {
    if page_size == 0 {
        bail!("page size must be at least 1");
    }

    let mut all = Vec::new();
    let mut offset = 0;

    loop {
        match source.fetch_page(offset, page_size).await {
            Ok(PageOutcome::Page(records)) if records.is_empty() => {
                info!("No more plugins found");
                break;
            }
            Ok(PageOutcome::Page(records)) => {
                let fetched = records.len();
                all.extend(records);
                info!(
                    "Fetched {} items (total: {}), moving to next batch",
                    fetched,
                    all.len()
                );
            }
            Ok(PageOutcome::Blocked) => {
                warn!("Received 403 Forbidden at offset {}, protection detected", offset);
                break;
            }
            Err(e) => {
                warn!("Error at offset {}: {:#}", offset, e);
                break;
            }
        }

        offset += page_size;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    Ok(all)
}
