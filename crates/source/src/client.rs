//! The [`ListingSource`] seam and its production implementation.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use gigwatch_core::config::SourceConfig;
use gigwatch_core::Listing;

use crate::error::SourceError;
use crate::query;
use crate::response::{self, GraphqlResponse};

/// Anything the watcher can poll one page of listings from.
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Fetch one page of listings, newest first.
    async fn fetch_page(&self, offset: u32, count: u32) -> Result<Vec<Listing>, SourceError>;

    /// Short provider name for logs (e.g. "upwork").
    fn source_name(&self) -> &str;
}

/// Listing source backed by the Upwork visitor job-search GraphQL endpoint.
pub struct UpworkSource {
    config: SourceConfig,
    client: reqwest::Client,
}

impl UpworkSource {
    pub fn new(config: SourceConfig) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl ListingSource for UpworkSource {
    async fn fetch_page(&self, offset: u32, count: u32) -> Result<Vec<Listing>, SourceError> {
        let body = query::request_body(offset, count, &self.config.search_term, &self.config.skill_uid);

        let mut request = self.client.post(&self.config.endpoint).json(&body);
        if let Some(token) = &self.config.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(SourceError::Status { status: status.as_u16(), body });
        }

        let text = response.text().await?;
        let envelope: GraphqlResponse = serde_json::from_str(&text)
            .map_err(|e| SourceError::MalformedResponse(format!("invalid JSON payload: {e}")))?;

        let listings = response::extract_results(envelope)?;
        debug!(count = listings.len(), offset, "fetched listing page");
        Ok(listings)
    }

    fn source_name(&self) -> &str {
        "upwork"
    }
}
