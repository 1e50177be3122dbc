//! Client SDK for server-rendered Universal Login screens.
//!
//! The server embeds a JSON context into every rendered screen; this crate
//! parses it into typed views, exposes one handler per screen, and turns
//! handler actions back into the form POST the server expects. Submission
//! goes through a narrow sink trait so the protocol layer stays testable
//! without any transport.
//!
//! ```no_run
//! use std::sync::Arc;
//! use ulogin_client::context::ContextStore;
//! use ulogin_client::http::HttpClient;
//! use ulogin_client::screens::login::{Login, LoginOptions};
//! use ulogin_client::sink::HttpFormSink;
//!
//! # async fn run(context_json: &str) -> anyhow::Result<()> {
//! let store = ContextStore::new();
//! store.install_json(context_json)?;
//!
//! let sink = Arc::new(HttpFormSink::new(
//!     HttpClient::new()?,
//!     "https://tenant.example.com/u/login?state=...",
//! ));
//!
//! let screen = Login::new(&store, sink)?;
//! screen
//!     .login(LoginOptions {
//!         username: "user@example.com".into(),
//!         password: "hunter2".into(),
//!         captcha: None,
//!         custom: Default::default(),
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod form;
pub mod http;
pub mod models;
pub mod polling;
pub mod resend;
pub mod screens;
pub mod sink;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_support;

pub use context::{ContextProvider, ContextStore};
pub use error::{ContextError, InputError, PollError, SubmitError};
pub use form::{Fields, FormHandler, FormOptions, PreparedForm, Telemetry, TELEMETRY_FIELD};
pub use polling::{start_polling, PollResponse, PollTransport, PollingControl, PollingOptions};
pub use resend::{
    Clock, FileStateStore, MemoryStateStore, ResendControl, ResendOptions, ResendOutcome,
    StateStore, SystemClock,
};
pub use screens::ScreenClient;
pub use sink::{HttpFormSink, RecordingSink, SubmissionSink};
