//! The submission boundary.
//!
//! The protocol layer never talks to the network directly; it hands a
//! [`PreparedForm`] to a sink. In a browser-equivalent deployment the sink
//! performs a navigating POST and the process never observes completion; in
//! tests and dry runs the recording sink captures the form instead.

use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use crate::form::PreparedForm;
use crate::http::HttpClient;

/// Something that can carry a prepared form to the server.
#[async_trait]
pub trait SubmissionSink: Send + Sync {
    /// Submits the form. A successful submission is expected to end the
    /// current screen's lifecycle (the server answers with the next
    /// rendered page); no retry is attempted here.
    async fn submit(&self, form: &PreparedForm) -> Result<()>;
}

/// Sink that POSTs the form as `application/x-www-form-urlencoded` against
/// a base URL, the way a browser submits a form. An empty route resolves to
/// the current page, i.e. the base URL itself.
pub struct HttpFormSink {
    client: HttpClient,
    base_url: String,
}

impl HttpFormSink {
    pub fn new(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn resolve(&self, route: &str) -> String {
        if route.is_empty() {
            return self.base_url.clone();
        }
        match reqwest::Url::parse(&self.base_url).and_then(|base| base.join(route)) {
            Ok(url) => url.to_string(),
            // Unparseable base; let the client surface the real error.
            Err(_) => route.to_owned(),
        }
    }
}

#[async_trait]
impl SubmissionSink for HttpFormSink {
    async fn submit(&self, form: &PreparedForm) -> Result<()> {
        let url = self.resolve(&form.route);
        tracing::debug!(%url, "posting form");
        self.client.post_form(&url, &form.fields).await?;
        Ok(())
    }
}

/// Sink that records every submission instead of sending it. Used by unit
/// tests and by the CLI's dry-run mode.
#[derive(Default)]
pub struct RecordingSink {
    submissions: Mutex<Vec<PreparedForm>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submissions(&self) -> Vec<PreparedForm> {
        self.submissions.lock().unwrap().clone()
    }

    /// The most recent submission, if any.
    pub fn last(&self) -> Option<PreparedForm> {
        self.submissions.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl SubmissionSink for RecordingSink {
    async fn submit(&self, form: &PreparedForm) -> Result<()> {
        self.submissions.lock().unwrap().push(form.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_resolution() {
        let sink =
            HttpFormSink::new(HttpClient::new().unwrap(), "https://tenant.example.com/u/login");

        assert_eq!(sink.resolve(""), "https://tenant.example.com/u/login");
        assert_eq!(
            sink.resolve("/u/mfa-phone-challenge"),
            "https://tenant.example.com/u/mfa-phone-challenge"
        );
        assert_eq!(
            sink.resolve("https://other.example.com/x"),
            "https://other.example.com/x"
        );
    }
}
