//! HTTP transport with timeouts, cookie support, and retry where the
//! protocol allows it.
//!
//! Form submissions are single-shot (a successful POST is a navigation; a
//! repeat would double-submit). The JSON approval POST retries on server
//! errors with exponential backoff. Poll GETs report status to the caller
//! untouched so the polling loop can apply its own backoff policy.

use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, Response};

use crate::config::HttpSettings;
use crate::polling::{PollResponse, PollTransport};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_RETRIES: u32 = 3;

#[derive(Clone)]
pub struct HttpClient {
    inner: Client,
    max_retries: u32,
}

impl HttpClient {
    pub fn new() -> Result<Self> {
        Self::with_settings(&HttpSettings::default())
    }

    pub fn with_settings(settings: &HttpSettings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!(
                "{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))?,
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );

        let client = Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(settings.timeout))
            .connect_timeout(Duration::from_secs(settings.connect_timeout))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner: client,
            max_retries: settings.max_retries,
        })
    }

    /// Single-shot urlencoded POST. Non-success statuses are errors; no
    /// retry, matching form-submission semantics (a repeat would
    /// double-submit a navigation).
    pub async fn post_form<T: serde::Serialize + ?Sized>(
        &self,
        url: &str,
        form: &T,
    ) -> Result<Response> {
        let resp = self.inner.post(url).form(form).send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            bail!(
                "form submission failed: {} - {}",
                status,
                &text[..text.len().min(200)]
            );
        }
        Ok(resp)
    }

    /// JSON POST with retry on server errors.
    pub async fn post_json<T: serde::Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
    ) -> Result<Response> {
        self.with_retry(|| {
            self.inner
                .post(url)
                .header("Content-Type", "application/json")
                .header("Accept", "application/json")
                .json(body)
                .send()
        })
        .await
    }

    /// Retry up to `max_retries` times with exponential backoff.
    async fn with_retry<F, Fut>(&self, request_fn: F) -> Result<Response>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = reqwest::Result<Response>>,
    {
        let mut last_err = None;

        for attempt in 0..self.max_retries {
            match request_fn().await {
                Ok(resp) if resp.status().is_success() => return Ok(resp),
                Ok(resp) if resp.status().is_server_error() && attempt < self.max_retries - 1 => {
                    let delay = Duration::from_secs(1 << attempt);
                    let status = resp.status();
                    let body = resp.text().await.unwrap_or_default();
                    tracing::warn!(
                        "server error {}, body: '{}', retrying in {:?}... (attempt {}/{})",
                        status,
                        &body[..body.len().min(200)],
                        delay,
                        attempt + 1,
                        self.max_retries
                    );
                    tokio::time::sleep(delay).await;
                }
                Ok(resp) => {
                    let status = resp.status();
                    let text = resp.text().await.unwrap_or_default();
                    bail!(
                        "request failed: {} - {}",
                        status,
                        &text[..50.min(text.len())]
                    );
                }
                Err(e) if attempt < self.max_retries - 1 => {
                    let delay = Duration::from_secs(1 << attempt);
                    tracing::warn!(
                        "request error: {}, retrying in {:?}... (attempt {}/{})",
                        e,
                        delay,
                        attempt + 1,
                        self.max_retries
                    );
                    last_err = Some(e);
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(last_err
            .map(Into::into)
            .unwrap_or_else(|| anyhow::anyhow!("max retries exceeded")))
    }
}

#[async_trait]
impl PollTransport for HttpClient {
    async fn poll(&self, url: &str) -> Result<PollResponse> {
        let resp = self
            .inner
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get("Content-Type")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or("").trim().to_owned());
        let rate_limit_reset = resp
            .headers()
            .get("X-RateLimit-Reset")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        let body = resp.text().await.unwrap_or_default();

        Ok(PollResponse {
            status,
            content_type,
            body,
            rate_limit_reset,
        })
    }
}
