//! Cooldown gate for rate-limited repeat actions (resend code, resend push).
//!
//! The last trigger time is persisted under a screen-scoped key so the gate
//! survives page reloads. Blocking is a normal outcome, not an error: a
//! call during the cooldown returns [`ResendOutcome::Blocked`] and the
//! underlying action is never invoked.
//!
//! The disabled check and the timestamp write are not atomic: two calls
//! racing before the first resend future resolves can both pass the check.
//! Single-caller pages make this acceptable; the behavior is pinned by a
//! test rather than papered over.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

/// Prefix for the persisted last-trigger key, completed by the screen
/// identifier.
pub const RESEND_KEY_PREFIX: &str = "acul_resend_timeout_";

/// Durable string key-value store scoped to one origin/installation.
pub trait StateStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
}

/// Millisecond clock; swapped out in tests.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }
}

/// In-memory store for tests and embedders with their own persistence.
#[derive(Default)]
pub struct MemoryStateStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStateStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values.lock().unwrap().insert(key.into(), value.into());
    }
}

/// JSON-map-on-disk store, the durable analog of origin-scoped browser
/// storage. Writes are best effort; a failed write logs and drops the
/// update rather than failing the resend.
pub struct FileStateStore {
    path: PathBuf,
    values: Mutex<HashMap<String, String>>,
}

impl FileStateStore {
    pub fn new(path: PathBuf) -> Self {
        let values = std::fs::read_to_string(&path)
            .ok()
            .and_then(|text| serde_json::from_str(&text).ok())
            .unwrap_or_default();
        Self {
            path,
            values: Mutex::new(values),
        }
    }

    /// `~/.local/state/ulogin/resend.json` (platform equivalent).
    pub fn default_location() -> Self {
        let dir = dirs::state_dir()
            .or_else(dirs::cache_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ulogin");
        Self::new(dir.join("resend.json"))
    }

    fn flush(&self, values: &HashMap<String, String>) {
        if let Some(parent) = self.path.parent() {
            if let Err(err) = std::fs::create_dir_all(parent) {
                tracing::warn!("cannot create state dir {}: {err}", parent.display());
                return;
            }
        }
        match serde_json::to_string(values) {
            Ok(text) => {
                if let Err(err) = std::fs::write(&self.path, text) {
                    tracing::warn!("cannot persist resend state: {err}");
                }
            }
            Err(err) => tracing::warn!("cannot serialize resend state: {err}"),
        }
    }
}

impl StateStore for FileStateStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut values = self.values.lock().unwrap();
        values.insert(key.into(), value.into());
        self.flush(&values);
    }
}

/// What `start_resend` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResendOutcome {
    /// The resend action ran and the cooldown restarted.
    Triggered,
    /// Cooldown still running or the server-side limit is reached; the
    /// action was not invoked.
    Blocked,
}

type StatusCallback = dyn Fn(u64, bool) + Send + Sync;
type TimeoutCallback = dyn Fn() + Send + Sync;

/// Configuration for one gate.
pub struct ResendOptions {
    /// Cooldown length in seconds.
    pub timeout_seconds: u64,
    /// Server-side "no more resends" flag from the screen data; forces the
    /// gate closed regardless of the countdown.
    pub resend_limit_reached: bool,
    /// Invoked once at construction and then every tick with
    /// `(remaining_seconds, disabled)`.
    pub on_status_change: Option<Box<StatusCallback>>,
    /// Invoked exactly once per countdown when it reaches zero.
    pub on_timeout: Option<Box<TimeoutCallback>>,
}

impl Default for ResendOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 10,
            resend_limit_reached: false,
            on_status_change: None,
            on_timeout: None,
        }
    }
}

struct Callbacks {
    on_status_change: Option<Box<StatusCallback>>,
    on_timeout: Option<Box<TimeoutCallback>>,
}

/// Countdown-gated repeat action, persisted per screen identifier.
pub struct ResendControl {
    storage_key: String,
    timeout_ms: i64,
    limit_reached: bool,
    store: Arc<dyn StateStore>,
    clock: Arc<dyn Clock>,
    callbacks: Arc<Callbacks>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl ResendControl {
    /// Builds the gate and, when a countdown is already running for this
    /// screen (persisted from an earlier page view) and callbacks are
    /// registered, starts the tick task. Tick tasks need a tokio runtime;
    /// construction without callbacks does not.
    pub fn new(
        screen_identifier: &str,
        store: Arc<dyn StateStore>,
        clock: Arc<dyn Clock>,
        options: ResendOptions,
    ) -> Self {
        let control = Self {
            storage_key: format!("{RESEND_KEY_PREFIX}{screen_identifier}"),
            timeout_ms: options.timeout_seconds as i64 * 1000,
            limit_reached: options.resend_limit_reached,
            store,
            clock,
            callbacks: Arc::new(Callbacks {
                on_status_change: options.on_status_change,
                on_timeout: options.on_timeout,
            }),
            ticker: Mutex::new(None),
        };

        let remaining = control.remaining_seconds();
        control.notify(remaining);
        if remaining > 0 {
            control.start_ticker();
        }
        control
    }

    /// Seconds left before the gate reopens. A future-dated persisted
    /// timestamp (clock skew) yields a longer-than-configured remainder;
    /// that is documented behavior, not clamped.
    pub fn remaining_seconds(&self) -> u64 {
        let last: i64 = self
            .store
            .get(&self.storage_key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        let elapsed = self.clock.now_millis() - last;
        let remaining_ms = self.timeout_ms - elapsed;
        if remaining_ms <= 0 {
            0
        } else {
            ((remaining_ms + 999) / 1000) as u64
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.remaining_seconds() > 0 || self.limit_reached
    }

    fn notify(&self, remaining: u64) {
        if let Some(cb) = &self.callbacks.on_status_change {
            cb(remaining, remaining > 0 || self.limit_reached);
        }
    }

    /// Runs `resend` unless the gate is closed. The timestamp is persisted
    /// and the countdown restarted only after `resend` resolves Ok; a
    /// failed resend leaves the gate open and propagates the error.
    pub async fn start_resend<F, Fut, E>(&self, resend: F) -> Result<ResendOutcome, E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<(), E>>,
    {
        if self.is_disabled() {
            tracing::debug!(key = %self.storage_key, "resend blocked by cooldown");
            return Ok(ResendOutcome::Blocked);
        }

        resend().await?;

        self.store
            .set(&self.storage_key, &self.clock.now_millis().to_string());
        self.notify(self.remaining_seconds());
        self.start_ticker();
        Ok(ResendOutcome::Triggered)
    }

    fn start_ticker(&self) {
        if self.callbacks.on_status_change.is_none() && self.callbacks.on_timeout.is_none() {
            return;
        }

        let store = Arc::clone(&self.store);
        let clock = Arc::clone(&self.clock);
        let callbacks = Arc::clone(&self.callbacks);
        let key = self.storage_key.clone();
        let timeout_ms = self.timeout_ms;
        let limit_reached = self.limit_reached;

        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_secs(1)).await;

                let last: i64 = store.get(&key).and_then(|v| v.parse().ok()).unwrap_or(0);
                let remaining_ms = timeout_ms - (clock.now_millis() - last);
                let remaining = if remaining_ms <= 0 {
                    0
                } else {
                    ((remaining_ms + 999) / 1000) as u64
                };

                if let Some(cb) = &callbacks.on_status_change {
                    cb(remaining, remaining > 0 || limit_reached);
                }
                if remaining == 0 {
                    if let Some(cb) = &callbacks.on_timeout {
                        cb();
                    }
                    break;
                }
            }
        });

        let mut ticker = self.ticker.lock().unwrap();
        if let Some(old) = ticker.replace(handle) {
            old.abort();
        }
    }
}

impl Drop for ResendControl {
    fn drop(&mut self) {
        if let Some(handle) = self.ticker.lock().unwrap().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

    struct TestClock(AtomicI64);

    impl TestClock {
        fn new(start: i64) -> Arc<Self> {
            Arc::new(Self(AtomicI64::new(start)))
        }

        fn advance(&self, ms: i64) {
            self.0.fetch_add(ms, Ordering::SeqCst);
        }
    }

    impl Clock for TestClock {
        fn now_millis(&self) -> i64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn control(
        store: Arc<dyn StateStore>,
        clock: Arc<dyn Clock>,
        options: ResendOptions,
    ) -> ResendControl {
        ResendControl::new("mfa-sms-challenge", store, clock, options)
    }

    #[tokio::test]
    async fn second_call_within_cooldown_is_blocked() {
        let store = Arc::new(MemoryStateStore::new());
        let clock = TestClock::new(1_000_000);
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = control(store, clock.clone(), ResendOptions::default());

        let run = |calls: Arc<AtomicUsize>| async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<(), std::convert::Infallible>(())
        };

        let first = gate.start_resend(|| run(calls.clone())).await.unwrap();
        assert_eq!(first, ResendOutcome::Triggered);

        clock.advance(3_000);
        let second = gate.start_resend(|| run(calls.clone())).await.unwrap();
        assert_eq!(second, ResendOutcome::Blocked);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Past the window the gate reopens.
        clock.advance(8_000);
        let third = gate.start_resend(|| run(calls.clone())).await.unwrap();
        assert_eq!(third, ResendOutcome::Triggered);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_resend_persists_nothing() {
        let store = Arc::new(MemoryStateStore::new());
        let clock = TestClock::new(1_000_000);
        let gate = control(store.clone(), clock, ResendOptions::default());

        let result = gate
            .start_resend(|| async { Err::<(), &str>("smtp down") })
            .await;
        assert_eq!(result.unwrap_err(), "smtp down");
        assert!(store.get("acul_resend_timeout_mfa-sms-challenge").is_none());
        assert_eq!(gate.remaining_seconds(), 0);
        assert!(!gate.is_disabled());
    }

    #[tokio::test]
    async fn limit_reached_blocks_even_when_idle() {
        let store = Arc::new(MemoryStateStore::new());
        let clock = TestClock::new(1_000_000);
        let gate = control(
            store,
            clock,
            ResendOptions {
                resend_limit_reached: true,
                ..ResendOptions::default()
            },
        );

        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = calls.clone();
        let outcome = gate
            .start_resend(move || {
                let calls = calls2.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<(), std::convert::Infallible>(())
                }
            })
            .await
            .unwrap();

        assert_eq!(outcome, ResendOutcome::Blocked);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn future_timestamp_inflates_remaining() {
        let store = Arc::new(MemoryStateStore::new());
        // Persisted stamp 30s in the future of "now".
        store.set("acul_resend_timeout_mfa-sms-challenge", "1030000");
        let clock = TestClock::new(1_000_000);
        let gate = control(store, clock, ResendOptions::default());

        // 10s window + 30s skew: far beyond the configured timeout.
        assert_eq!(gate.remaining_seconds(), 40);
        assert!(gate.is_disabled());
    }

    #[tokio::test]
    async fn controls_for_distinct_screens_do_not_interfere() {
        let store: Arc<dyn StateStore> = Arc::new(MemoryStateStore::new());
        let clock = TestClock::new(1_000_000);

        let sms = ResendControl::new(
            "mfa-sms-challenge",
            store.clone(),
            clock.clone(),
            ResendOptions::default(),
        );
        let email = ResendControl::new(
            "mfa-email-challenge",
            store.clone(),
            clock.clone(),
            ResendOptions::default(),
        );

        sms.start_resend(|| async { Ok::<(), std::convert::Infallible>(()) })
            .await
            .unwrap();

        assert!(sms.is_disabled());
        assert!(!email.is_disabled());
    }

    #[tokio::test]
    async fn racing_calls_expose_the_toctou_gap() {
        // Two calls started before either resend future resolves both pass
        // the disabled check. Documented limitation.
        let store = Arc::new(MemoryStateStore::new());
        let clock = TestClock::new(1_000_000);
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = control(store, clock, ResendOptions::default());

        let slow = |calls: Arc<AtomicUsize>| async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            Ok::<(), std::convert::Infallible>(())
        };

        let (a, b) = tokio::join!(
            gate.start_resend(|| slow(calls.clone())),
            gate.start_resend(|| slow(calls.clone()))
        );

        assert_eq!(a.unwrap(), ResendOutcome::Triggered);
        assert_eq!(b.unwrap(), ResendOutcome::Triggered);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn file_store_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resend.json");
        {
            let store = FileStateStore::new(path.clone());
            store.set("acul_resend_timeout_login", "123");
        }

        let store = FileStateStore::new(path);
        assert_eq!(
            store.get("acul_resend_timeout_login").as_deref(),
            Some("123")
        );
        assert!(store.get("acul_resend_timeout_signup").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_counts_down_and_fires_timeout_once() {
        // Clock driven by tokio's paused time so sleep() and now_millis()
        // advance together.
        struct PausedClock {
            epoch: tokio::time::Instant,
        }
        impl Clock for PausedClock {
            fn now_millis(&self) -> i64 {
                self.epoch.elapsed().as_millis() as i64
            }
        }

        let store = Arc::new(MemoryStateStore::new());
        let clock = Arc::new(PausedClock {
            epoch: tokio::time::Instant::now(),
        });
        let timeouts = Arc::new(AtomicUsize::new(0));
        let statuses = Arc::new(Mutex::new(Vec::new()));

        let timeouts_cb = timeouts.clone();
        let statuses_cb = statuses.clone();
        let gate = ResendControl::new(
            "mfa-email-challenge",
            store,
            clock,
            ResendOptions {
                timeout_seconds: 3,
                on_status_change: Some(Box::new(move |remaining, disabled| {
                    statuses_cb.lock().unwrap().push((remaining, disabled));
                })),
                on_timeout: Some(Box::new(move || {
                    timeouts_cb.fetch_add(1, Ordering::SeqCst);
                })),
                ..ResendOptions::default()
            },
        );

        gate.start_resend(|| async { Ok::<(), std::convert::Infallible>(()) })
            .await
            .unwrap();

        // Walk well past the countdown; the ticker must stop at zero.
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(timeouts.load(Ordering::SeqCst), 1);
        let recorded = statuses.lock().unwrap();
        assert!(recorded.iter().any(|(r, d)| *r > 0 && *d));
        assert_eq!(recorded.last(), Some(&(0, false)));
    }
}
