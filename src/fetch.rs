use reqwest::{Client, StatusCode};
use thiserror::Error;
use url::Url;

use crate::config::FetchConfig;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("unsupported or malformed url {0:?}")]
    InvalidUrl(String),
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with status {status}")]
    Status { url: String, status: StatusCode },
}

/// Single GET per call over a shared, connection-pooling client.
#[derive(Clone)]
pub struct PageFetcher {
    client: Client,
    config: FetchConfig,
}

impl PageFetcher {
    pub fn new(client: Client, config: FetchConfig) -> Self {
        Self { client, config }
    }

    pub async fn fetch(&self, raw_url: &str) -> Result<String, TransportError> {
        let url = match Url::parse(raw_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => url,
            _ => return Err(TransportError::InvalidUrl(raw_url.to_string())),
        };

        let request_error = |source| TransportError::Request {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(url.clone())
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response.text().await.map_err(request_error)?;
        tracing::debug!(target: "fetch", url = %url, bytes = body.len(), "page fetched");
        Ok(body)
    }
}
