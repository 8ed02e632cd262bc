//! Shared HTTP client with timeout, retry and backoff for board APIs.

use std::time::Duration;

use anyhow::Context;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, info_span, Instrument};

#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub timeout: Duration,
    pub user_agent: String,
    pub max_retries: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            user_agent: "jobsift/0.1".to_string(),
            max_retries: 3,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed after retries: {0}")]
    Request(#[from] reqwest::Error),
    #[error("http status {status} for {url}")]
    HttpStatus { status: u16, url: String },
}

/// Thin wrapper over one shared reqwest client. Retries 5xx and 429
/// responses plus connect/timeout errors with exponential backoff.
#[derive(Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
    max_retries: usize,
    base_delay: Duration,
    max_delay: Duration,
}

impl HttpFetcher {
    pub fn new(config: HttpClientConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .gzip(true)
            .brotli(true)
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .context("building reqwest client")?;
        Ok(Self {
            client,
            max_retries: config.max_retries,
            base_delay: config.base_delay,
            max_delay: config.max_delay,
        })
    }

    fn delay_for_attempt(&self, attempt: usize) -> Duration {
        let factor = 1u32.checked_shl(attempt as u32).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    fn retryable_status(status: StatusCode) -> bool {
        status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
    }

    fn retryable_error(err: &reqwest::Error) -> bool {
        err.is_timeout() || err.is_connect() || err.is_request()
    }

    pub async fn get_bytes(&self, company: &str, url: &str) -> Result<Vec<u8>, FetchError> {
        let span = info_span!("board_fetch", company, url);
        async {
            let mut last_request_error: Option<reqwest::Error> = None;

            for attempt in 0..=self.max_retries {
                match self.client.get(url).send().await {
                    Ok(resp) => {
                        let status = resp.status();
                        let final_url = resp.url().to_string();

                        if status.is_success() {
                            return Ok(resp.bytes().await?.to_vec());
                        }

                        if Self::retryable_status(status) && attempt < self.max_retries {
                            debug!(attempt, %status, "retrying board fetch");
                            tokio::time::sleep(self.delay_for_attempt(attempt)).await;
                            continue;
                        }

                        return Err(FetchError::HttpStatus {
                            status: status.as_u16(),
                            url: final_url,
                        });
                    }
                    Err(err) => {
                        if Self::retryable_error(&err) && attempt < self.max_retries {
                            debug!(attempt, error = %err, "retrying board fetch");
                            last_request_error = Some(err);
                            tokio::time::sleep(self.delay_for_attempt(attempt)).await;
                            continue;
                        }
                        return Err(FetchError::Request(err));
                    }
                }
            }

            Err(FetchError::Request(
                last_request_error.expect("retry loop records the last request error"),
            ))
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_is_exponential_and_capped() {
        let fetcher = HttpFetcher::new(HttpClientConfig {
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(350),
            ..Default::default()
        })
        .expect("client");

        assert_eq!(fetcher.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(fetcher.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(fetcher.delay_for_attempt(2), Duration::from_millis(350));
        assert_eq!(fetcher.delay_for_attempt(5), Duration::from_millis(350));
    }

    #[test]
    fn only_server_side_statuses_are_retryable() {
        assert!(HttpFetcher::retryable_status(
            StatusCode::INTERNAL_SERVER_ERROR
        ));
        assert!(HttpFetcher::retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(!HttpFetcher::retryable_status(StatusCode::NOT_FOUND));
        assert!(!HttpFetcher::retryable_status(StatusCode::UNAUTHORIZED));
    }
}
