use tracing::debug;

use crate::error::{ListingError, Result};
use crate::model::Listing;

/// Posts updated listings to an external endpoint.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    http: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), url)
    }

    /// Use this when you need to configure timeouts, proxies, headers, etc.
    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http: client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST `listing` as JSON. Non-success statuses are errors.
    pub async fn notify(&self, listing: &Listing) -> Result<()> {
        debug!(url = %self.url, listing_id = %listing.id, "posting listing webhook");

        let response = self
            .http
            .post(&self.url)
            .json(listing)
            .send()
            .await
            .map_err(|e| self.error(e))?;

        response.error_for_status().map_err(|e| self.error(e))?;
        Ok(())
    }

    fn error(&self, source: reqwest::Error) -> ListingError {
        ListingError::Webhook {
            url: self.url.clone(),
            source,
        }
    }
}
