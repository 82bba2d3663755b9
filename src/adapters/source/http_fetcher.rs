use std::time::Duration;
use async_trait::async_trait;
use reqwest::{header, Client};

use crate::ports::source::{FetchError, RawMarkup, SourcePort};

/// FENEGOSIDA rate board
pub const DEFAULT_SOURCE_URL: &str = "https://www.fenegosida.org/";

/// Browser-like identity; the board rejects clients without one
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// HTTP source configuration
#[derive(Debug, Clone)]
pub struct SourceFetcherConfig {
    pub url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for SourceFetcherConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SOURCE_URL.to_string(),
            timeout: DEFAULT_FETCH_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Single-attempt HTTP GET of the rate board page
#[derive(Debug, Clone)]
pub struct HttpSourceFetcher {
    config: SourceFetcherConfig,
    http: Client,
}

impl HttpSourceFetcher {
    pub fn new(config: SourceFetcherConfig) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { config, http })
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    fn classify(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.config.timeout)
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl SourcePort for HttpSourceFetcher {
    async fn fetch(&self) -> Result<RawMarkup, FetchError> {
        tracing::debug!("Fetching rate board from {}", self.config.url);

        let response = self
            .http
            .get(&self.config.url)
            .header(header::ACCEPT, "text/html,application/xhtml+xml")
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(self.config.timeout)
            } else {
                FetchError::Body(e.to_string())
            }
        })?;

        tracing::debug!("Fetched {} bytes from {}", body.len(), self.config.url);
        Ok(body)
    }
}
