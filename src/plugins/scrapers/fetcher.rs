use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tokio_retry::strategy::jitter;
use tracing::debug;

use crate::config::ScraperConfig;
use crate::plugins::traits::ScrapeOutcome;
use crate::utils::error::{AppError, Result};
use crate::utils::retry::RetryPolicy;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

/// HTTP access shared by the shop scrapers: browser-like headers, a random
/// pause before every request, and backoff on transient failures.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    retry: RetryPolicy,
    politeness_min: Duration,
    politeness_max: Duration,
}

impl PageFetcher {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, header_value(&config.user_agent)?);
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(ACCEPT_LANGUAGE, header_value(&config.accept_language)?);

        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(config.connect_timeout))
            .timeout(Duration::from_secs(config.request_timeout))
            .build()?;

        Ok(Self {
            client,
            retry: RetryPolicy::from_config(&config.retry, AppError::is_transient),
            politeness_min: Duration::from_millis(config.politeness_min_ms),
            politeness_max: Duration::from_millis(config.politeness_max_ms),
        })
    }

    async fn pause(&self) {
        let window = self.politeness_max.saturating_sub(self.politeness_min);
        let delay = self.politeness_min + jitter(window);
        if !delay.is_zero() {
            debug!(delay_ms = delay.as_millis() as u64, "Waiting before request");
            tokio::time::sleep(delay).await;
        }
    }

    /// `None` when the page does not exist (HTTP 404).
    async fn fetch_once(&self, url: &str) -> Result<Option<String>> {
        self.pause().await;

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(AppError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(Some(response.text().await?))
    }

    /// Fetches `url` and runs `parse` on the body, retrying the pair as a
    /// unit so a malformed page is fetched again.
    pub async fn fetch_and_parse<P>(&self, operation: &str, url: &str, parse: P) -> Result<ScrapeOutcome>
    where
        P: Fn(&str) -> Result<ScrapeOutcome> + Sync,
    {
        let parse = &parse;
        self.retry
            .run(operation, || async move {
                match self.fetch_once(url).await? {
                    Some(body) => parse(&body),
                    None => {
                        debug!(url, "Page not found");
                        Ok(ScrapeOutcome::NotFound)
                    }
                }
            })
            .await
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| AppError::Validation(format!("invalid header value '{}': {}", value, e)))
}
