//! Client for the external item-metadata classification service.
//!
//! The service is advisory only: any failure degrades to `None` and is
//! logged at debug level, so its unavailability never blocks item or
//! swap operations.

use crate::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct ClassifyRequest<'a> {
    title: &'a str,
    description: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ClassifyResponse {
    category: Option<String>,
}

#[derive(Clone)]
pub struct EnrichmentClient {
    endpoint: String,
    client: Client,
}

impl EnrichmentClient {
    pub fn new(endpoint: String, timeout_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;

        Ok(Self { endpoint, client })
    }

    /// Disabled clients short-circuit instead of dialing out.
    pub fn is_enabled(&self) -> bool {
        !self.endpoint.is_empty()
    }

    /// Ask the classifier for a category suggestion. Transport and decode
    /// failures are swallowed; callers only ever see a suggestion or
    /// nothing.
    pub async fn suggest_category(
        &self,
        title: &str,
        description: Option<&str>,
    ) -> Option<String> {
        if !self.is_enabled() {
            return None;
        }

        let request = ClassifyRequest { title, description };

        match self.classify(&request).await {
            Ok(category) => category,
            Err(e) => {
                tracing::debug!("Enrichment unavailable, continuing without: {}", e);
                None
            }
        }
    }

    async fn classify(&self, request: &ClassifyRequest<'_>) -> Result<Option<String>> {
        let response = self
            .client
            .post(format!("{}/classify", self.endpoint))
            .json(request)
            .send()
            .await?
            .error_for_status()?;

        let body: ClassifyResponse = response.json().await?;
        Ok(body.category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_client_returns_nothing() {
        let client = EnrichmentClient::new(String::new(), 5).unwrap();
        assert!(!client.is_enabled());

        let suggestion = client.suggest_category("Denim jacket", None).await;
        assert!(suggestion.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_degrades_to_none() {
        // Nothing listens here; the client must swallow the failure.
        let client = EnrichmentClient::new("http://127.0.0.1:1".to_string(), 1).unwrap();
        assert!(client.is_enabled());

        let suggestion = client.suggest_category("Denim jacket", Some("blue")).await;
        assert!(suggestion.is_none());
    }
}
