//! Long-poll helper for push-style challenges.
//!
//! Polls a status endpoint until the server signals completion, backing off
//! to the server's indicated reset time on 429. Any other non-200 status
//! stops polling and reports through `on_error`. The control is cancellable;
//! after `cancel` nothing fires, including for a response already in
//! transit.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::task::JoinHandle;

use crate::error::PollError;
use crate::http::HttpClient;
use crate::resend::{Clock, SystemClock};

/// One round trip against the status endpoint, as seen by the loop.
#[derive(Debug, Clone)]
pub struct PollResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
    /// `X-RateLimit-Reset`, Unix seconds, when the server sent one.
    pub rate_limit_reset: Option<u64>,
}

/// The wire seam; implemented on [`HttpClient`] and scripted in tests.
#[async_trait]
pub trait PollTransport: Send + Sync {
    async fn poll(&self, url: &str) -> Result<PollResponse>;
}

type Condition = dyn Fn(&Value) -> bool + Send + Sync;
type SuspendProbe = dyn Fn() -> bool + Send + Sync;
type ResultCallback = dyn Fn() + Send + Sync;
type ErrorCallback = dyn Fn(PollError) + Send + Sync;

/// Configuration for one polling loop.
pub struct PollingOptions {
    /// Normal poll cadence.
    pub interval: Duration,
    /// Completion predicate over the parsed JSON body. Default:
    /// `body.completed == true`.
    pub condition: Option<Box<Condition>>,
    /// When true, the tick is skipped entirely (rescheduled without
    /// sending) — the backgrounded-page analog.
    pub suspended: Option<Box<SuspendProbe>>,
    pub on_result: Option<Box<ResultCallback>>,
    pub on_error: Option<Box<ErrorCallback>>,
    /// Clock for the 429 reset math; swapped out in tests.
    pub clock: Arc<dyn Clock>,
}

impl Default for PollingOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(5000),
            condition: None,
            suspended: None,
            on_result: None,
            on_error: None,
            clock: Arc::new(SystemClock),
        }
    }
}

fn default_condition(body: &Value) -> bool {
    body.get("completed").and_then(Value::as_bool) == Some(true)
}

/// Handle over a running poll loop.
pub struct PollingControl {
    cancelled: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl PollingControl {
    /// Stops the loop. Clears the scheduled timer and suppresses callbacks
    /// for any response still in flight.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.lock().unwrap().take() {
            handle.abort();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Drop for PollingControl {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Starts polling `url` through `transport`. Returns the cancellation
/// handle; the loop runs on a spawned task.
pub fn start_polling(
    transport: Arc<dyn PollTransport>,
    url: impl Into<String>,
    options: PollingOptions,
) -> PollingControl {
    let url = url.into();
    let cancelled = Arc::new(AtomicBool::new(false));
    let cancel_flag = Arc::clone(&cancelled);

    let PollingOptions {
        interval,
        condition,
        suspended,
        on_result,
        on_error,
        clock,
    } = options;

    let handle = tokio::spawn(async move {
        loop {
            if cancel_flag.load(Ordering::SeqCst) {
                return;
            }

            if suspended.as_ref().is_some_and(|probe| probe()) {
                tokio::time::sleep(interval).await;
                continue;
            }

            let response = transport.poll(&url).await;

            // A cancel racing the response wins; nothing fires after it.
            if cancel_flag.load(Ordering::SeqCst) {
                return;
            }

            let response = match response {
                Ok(response) => response,
                Err(err) => {
                    if let Some(cb) = &on_error {
                        cb(PollError::Transport(err));
                    }
                    return;
                }
            };

            match response.status {
                200 => {
                    let body = parse_body(&response);
                    let done = body
                        .as_ref()
                        .filter(|b| b.is_object())
                        .map(|b| match &condition {
                            Some(cond) => cond(b),
                            None => default_condition(b),
                        })
                        .unwrap_or(false);

                    if done {
                        if let Some(cb) = &on_result {
                            cb();
                        }
                        return;
                    }
                    tokio::time::sleep(interval).await;
                }
                429 => {
                    let reset_ms = response
                        .rate_limit_reset
                        .map(|secs| secs.saturating_mul(1000))
                        .unwrap_or(0) as i64;
                    let wait_ms = reset_ms - clock.now_millis();
                    let wait = Duration::from_millis(wait_ms.max(0) as u64).max(interval);
                    tracing::warn!(?wait, "rate limited while polling, backing off");
                    tokio::time::sleep(wait).await;
                }
                status => {
                    if let Some(cb) = &on_error {
                        cb(PollError::Status {
                            status,
                            body: response.body.clone(),
                        });
                    }
                    return;
                }
            }
        }
    });

    PollingControl {
        cancelled,
        handle: Mutex::new(Some(handle)),
    }
}

/// JSON only when the server says so; everything else stays opaque text.
fn parse_body(response: &PollResponse) -> Option<Value> {
    if response.content_type.as_deref() == Some("application/json") {
        serde_json::from_str(&response.body).ok()
    } else {
        None
    }
}

/// Confirms a received push challenge out-of-band: JSON POST with the
/// continuation state and the remember-device choice.
pub async fn approve_push(
    client: &HttpClient,
    url: &str,
    state: &str,
    remember_device: bool,
) -> Result<()> {
    client
        .post_json(
            url,
            &json!({
                "action": "continue",
                "state": state,
                "rememberDevice": remember_device,
            }),
        )
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;
    use tokio::time::Instant;

    struct PausedClock {
        epoch: Instant,
    }

    impl Clock for PausedClock {
        fn now_millis(&self) -> i64 {
            self.epoch.elapsed().as_millis() as i64
        }
    }

    struct Scripted {
        responses: Mutex<VecDeque<PollResponse>>,
        polled_at: Mutex<Vec<Duration>>,
        epoch: Instant,
    }

    impl Scripted {
        fn new(responses: Vec<PollResponse>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                polled_at: Mutex::new(Vec::new()),
                epoch: Instant::now(),
            })
        }

        fn polls(&self) -> Vec<Duration> {
            self.polled_at.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PollTransport for Scripted {
        async fn poll(&self, _url: &str) -> Result<PollResponse> {
            self.polled_at.lock().unwrap().push(self.epoch.elapsed());
            let next = self.responses.lock().unwrap().pop_front();
            // An exhausted script keeps answering "not yet".
            Ok(next.unwrap_or_else(|| json_response(200, r#"{"completed":false}"#)))
        }
    }

    fn json_response(status: u16, body: &str) -> PollResponse {
        PollResponse {
            status,
            content_type: Some("application/json".into()),
            body: body.into(),
            rate_limit_reset: None,
        }
    }

    fn options(interval_ms: u64) -> PollingOptions {
        PollingOptions {
            interval: Duration::from_millis(interval_ms),
            clock: Arc::new(PausedClock {
                epoch: Instant::now(),
            }),
            ..PollingOptions::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn completes_when_condition_is_met() {
        let transport = Scripted::new(vec![
            json_response(200, r#"{"completed":false}"#),
            json_response(200, r#"{"completed":true}"#),
        ]);
        let results = Arc::new(AtomicUsize::new(0));
        let results_cb = results.clone();

        let mut opts = options(1000);
        opts.on_result = Some(Box::new(move || {
            results_cb.fetch_add(1, Ordering::SeqCst);
        }));

        let control = start_polling(transport.clone(), "https://x/poll", opts);
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(results.load(Ordering::SeqCst), 1);
        // First poll immediately, second after one interval, then done.
        assert_eq!(transport.polls().len(), 2);
        drop(control);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_defers_to_reset_time() {
        let transport = Scripted::new(vec![PollResponse {
            status: 429,
            content_type: None,
            body: String::new(),
            rate_limit_reset: Some(5), // 5s past the paused epoch
        }]);

        let control = start_polling(transport.clone(), "https://x/poll", options(1000));
        tokio::time::sleep(Duration::from_secs(20)).await;
        control.cancel();

        let polls = transport.polls();
        assert!(polls.len() >= 2);
        // The follow-up waited for the reset, not the 1s interval.
        assert!(polls[1] >= Duration::from_secs(5), "{:?}", polls[1]);
        assert!(polls[1] < Duration::from_secs(6), "{:?}", polls[1]);
    }

    #[tokio::test(start_paused = true)]
    async fn plain_200_reschedules_at_interval() {
        let transport = Scripted::new(Vec::new());
        let control = start_polling(transport.clone(), "https://x/poll", options(1000));
        tokio::time::sleep(Duration::from_millis(3500)).await;
        control.cancel();

        let polls = transport.polls();
        assert_eq!(polls.len(), 4);
        assert_eq!(polls[1] - polls[0], Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn error_status_stops_and_reports() {
        let transport = Scripted::new(vec![PollResponse {
            status: 403,
            content_type: None,
            body: "forbidden".into(),
            rate_limit_reset: None,
        }]);
        let errors = Arc::new(Mutex::new(Vec::new()));
        let errors_cb = errors.clone();

        let mut opts = options(1000);
        opts.on_error = Some(Box::new(move |err| {
            errors_cb.lock().unwrap().push(err.to_string());
        }));

        let _control = start_polling(transport.clone(), "https://x/poll", opts);
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(transport.polls().len(), 1);
        let errors = errors.lock().unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("403"));
    }

    #[tokio::test(start_paused = true)]
    async fn non_json_body_is_opaque() {
        let transport = Scripted::new(vec![PollResponse {
            status: 200,
            content_type: Some("text/html".into()),
            body: r#"{"completed":true}"#.into(),
            rate_limit_reset: None,
        }]);
        let results = Arc::new(AtomicUsize::new(0));
        let results_cb = results.clone();

        let mut opts = options(1000);
        opts.on_result = Some(Box::new(move || {
            results_cb.fetch_add(1, Ordering::SeqCst);
        }));

        let control = start_polling(transport.clone(), "https://x/poll", opts);
        tokio::time::sleep(Duration::from_millis(1500)).await;
        control.cancel();

        // The body looked complete but was not JSON; polling continued.
        assert_eq!(results.load(Ordering::SeqCst), 0);
        assert!(transport.polls().len() >= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn suspended_probe_skips_the_send() {
        let transport = Scripted::new(Vec::new());
        let suspended = Arc::new(AtomicBool::new(true));
        let probe = suspended.clone();

        let mut opts = options(1000);
        opts.suspended = Some(Box::new(move || probe.load(Ordering::SeqCst)));

        let control = start_polling(transport.clone(), "https://x/poll", opts);
        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert!(transport.polls().is_empty());

        suspended.store(false, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!transport.polls().is_empty());
        control.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_silences_everything() {
        let transport = Scripted::new(Vec::new());
        let results = Arc::new(AtomicUsize::new(0));
        let results_cb = results.clone();

        let mut opts = options(1000);
        opts.on_result = Some(Box::new(move || {
            results_cb.fetch_add(1, Ordering::SeqCst);
        }));

        let control = start_polling(transport.clone(), "https://x/poll", opts);
        tokio::time::sleep(Duration::from_millis(1500)).await;
        control.cancel();
        let polls_at_cancel = transport.polls().len();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(transport.polls().len(), polls_at_cancel);
        assert_eq!(results.load(Ordering::SeqCst), 0);
        assert!(control.is_cancelled());
    }
}
