use async_trait::async_trait;
use reqwest::Client;

use crate::model::WttrPayload;

use super::{CurrentConditionsProvider, truncate_body};

/// wttr.in current-conditions client.
#[derive(Debug, Clone)]
pub struct WttrProvider {
    base_url: String,
    http: Client,
}

impl WttrProvider {
    pub fn new(http: Client, base_url: &str) -> Self {
        Self { base_url: base_url.trim_end_matches('/').to_string(), http }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl CurrentConditionsProvider for WttrProvider {
    async fn fetch_current(&self, city: &str) -> Option<WttrPayload> {
        tracing::info!(city, "Fetching current conditions from wttr.in");

        // City goes into the path verbatim; wttr.in copes with raw names.
        let url = format!("{}/{}", self.base_url, city);

        let res = match self.http.get(&url).query(&[("format", "j1")]).send().await {
            Ok(res) => res,
            Err(e) => {
                tracing::warn!(city, error = %e, "wttr.in request failed");
                return None;
            }
        };

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            tracing::warn!(
                city,
                %status,
                body = %truncate_body(&body),
                "wttr.in returned a non-success status"
            );
            return None;
        }

        match res.json::<WttrPayload>().await {
            Ok(payload) => Some(payload),
            Err(e) => {
                tracing::warn!(city, error = %e, "Failed to decode wttr.in response");
                None
            }
        }
    }
}
