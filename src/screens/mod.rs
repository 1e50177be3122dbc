//! Per-screen handlers.
//!
//! Every handler owns a [`ScreenClient`]: the composition root that checks
//! the rendered screen's identity, builds the nine context views, and hands
//! out pre-tagged form handlers. Handlers add two things on top — a typed
//! projection of `screen.data` built by a pure `from_screen` constructor,
//! and action methods that assemble a payload and push it through the sink.
//!
//! Action methods share one micro-protocol: validate input, spread caller
//! fields first, apply protocol fields last, submit. Server-side outcomes
//! of a submission are never surfaced here; they come back as
//! `transaction.errors` on the next rendered context.

pub mod consent;
pub mod device;
pub mod identifier;
pub mod login;
pub mod mfa;
pub mod mfa_phone;
pub mod mfa_push;
pub mod mfa_recovery;
pub mod organizations;
pub mod passkey;
pub mod reset_password;
pub mod signup;
pub mod unblock;
pub mod webauthn;

use std::sync::Arc;

use crate::context::ContextStore;
use crate::error::{ContextError, SubmitError};
use crate::form::{Fields, FormHandler, FormOptions, Telemetry};
use crate::models::{
    Branding, Client, Organization, Prompt, Screen, Tenant, Transaction, TransactionError,
    UntrustedData, User,
};
use crate::sink::SubmissionSink;

/// Server-side operation names used in the `action` field.
pub mod actions {
    pub const DEFAULT: &str = "default";
    pub const RESEND_CODE: &str = "resend-code";
    pub const RESEND: &str = "resend";
    pub const PICK_AUTHENTICATOR: &str = "pick-authenticator";
    pub const PICK_EMAIL: &str = "pick-email";
    pub const PICK_SMS: &str = "pick-sms";
    pub const PICK_PHONE: &str = "pick-phone";
    pub const PICK_COUNTRY_CODE: &str = "pick-country-code";
    pub const SWITCH_TO_VOICE: &str = "switch-to-voice";
    pub const SWITCH_TO_SMS: &str = "switch-to-sms";
    pub const BACK: &str = "back-action";
    pub const CONTINUE: &str = "continue";
    pub const ENROLL: &str = "enroll";
    pub const ENTER_OTP_CODE: &str = "enter-otp-code";
    pub const CONFIRM: &str = "confirm";
    pub const CANCEL: &str = "cancel";
    pub const ACCEPT: &str = "accept";
    pub const DENY: &str = "deny";
    pub const TRY_AGAIN: &str = "tryagain";
    pub const USE_PASSWORD: &str = "use-password";
    pub const REFUSE_ADD_DEVICE: &str = "refuse-add-device";
    pub const SNOOZE_ENROLLMENT: &str = "snooze-enrollment";
    pub const ABORT_PASSKEY_ENROLLMENT: &str = "abort-passkey-enrollment";
    pub const TOGGLE_VIEW: &str = "toggle-view";
    pub const SKIP: &str = "skip";
    pub const CHANGE_LANGUAGE: &str = "change-language";

    /// Composite selection actions: `selection-action::<suffix>`.
    pub fn selection(suffix: impl std::fmt::Display) -> String {
        format!("selection-action::{suffix}")
    }

    /// Browser-reported credential errors: `showError::<json>`.
    pub fn show_error(details: &serde_json::Value) -> String {
        format!("showError::{details}")
    }
}

/// Shared endpoint for the phone challenge screens reused by the
/// reset-password flow.
pub const MFA_PHONE_CHALLENGE_ROUTE: &str = "/u/mfa-phone-challenge";

/// Composition root behind every screen handler.
///
/// Construction validates identity and never retries: a missing context or
/// a name mismatch means the page cannot proceed with this handler.
/// Actions are not serialized against each other — a successful submission
/// ends the page lifecycle, so only the first one's navigation takes
/// effect; overlapping calls are a caller error.
pub struct ScreenClient {
    pub branding: Branding,
    pub client: Client,
    pub prompt: Prompt,
    pub screen: Screen,
    pub organization: Organization,
    pub user: User,
    pub transaction: Transaction,
    pub tenant: Tenant,
    pub untrusted_data: UntrustedData,
    screen_name: String,
    sink: Arc<dyn SubmissionSink>,
}

impl std::fmt::Debug for ScreenClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScreenClient")
            .field("screen_name", &self.screen_name)
            .finish_non_exhaustive()
    }
}

impl ScreenClient {
    /// Opens the store's context for the named screen. An empty
    /// `expected_screen` skips the identity check (screens without data of
    /// their own).
    pub fn open(
        store: &ContextStore,
        sink: Arc<dyn SubmissionSink>,
        expected_screen: &str,
    ) -> Result<Self, ContextError> {
        let raw = store.get().ok_or(ContextError::Missing)?;

        let actual = raw.screen_name().unwrap_or_default();
        if !expected_screen.is_empty() && actual != expected_screen {
            return Err(ContextError::ScreenMismatch {
                expected: expected_screen.to_owned(),
                actual: actual.to_owned(),
            });
        }

        let screen_name = if expected_screen.is_empty() {
            actual.to_owned()
        } else {
            expected_screen.to_owned()
        };

        Ok(Self {
            branding: Branding::new(raw.branding.clone()),
            client: Client::new(raw.client.clone()),
            prompt: Prompt::new(raw.prompt.clone()),
            screen: Screen::new(raw.screen.clone()),
            organization: Organization::new(raw.organization.clone()),
            user: User::new(raw.user.clone()),
            transaction: Transaction::new(raw.transaction.clone()),
            tenant: Tenant::new(raw.tenant.clone()),
            untrusted_data: UntrustedData::new(raw.untrusted_data.clone()),
            screen_name,
            sink,
        })
    }

    /// The identifier this handler was opened under.
    pub fn screen_name(&self) -> &str {
        &self.screen_name
    }

    /// Errors reported by the previous round trip; empty when none.
    pub fn errors(&self) -> &[TransactionError] {
        self.transaction.errors()
    }

    /// A form handler tagged for one action method, targeting the current
    /// page.
    pub(crate) fn form(&self, method: &str) -> FormHandler {
        self.form_options(method, None)
    }

    /// Same, but against an explicit shared route.
    pub(crate) fn form_at(&self, route: &str, method: &str) -> FormHandler {
        self.form_options(method, Some(route.to_owned()))
    }

    fn form_options(&self, method: &str, route: Option<String>) -> FormHandler {
        FormHandler::new(
            FormOptions {
                state: self.transaction.state().map(str::to_owned),
                telemetry: Some(Telemetry::new(self.screen_name.clone(), method)),
                route,
            },
            Arc::clone(&self.sink),
        )
    }

    /// Universal action, available on every screen: asks the server to
    /// re-render in another language.
    pub async fn change_language(&self, options: Fields) -> Result<(), SubmitError> {
        let mut fields = options;
        fields.set("action", actions::CHANGE_LANGUAGE);
        self.form("change_language").submit_data(fields).await
    }

    /// Submits an arbitrary payload against the current page. Escape hatch
    /// for tooling that drives screens generically; the typed handlers are
    /// the normal path and protect the protocol fields.
    pub async fn submit_raw(&self, fields: Fields) -> Result<(), SubmitError> {
        self.form("submit_raw").submit_data(fields).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{recording_pair, store_with_screen};
    use serde_json::json;

    #[test]
    fn open_fails_without_context() {
        let store = ContextStore::new();
        let (sink, _) = recording_pair();
        let err = ScreenClient::open(&store, sink, "login").unwrap_err();
        assert!(matches!(err, ContextError::Missing));
        assert_eq!(err.to_string(), "Universal Login Context is not available");
    }

    #[test]
    fn open_fails_on_screen_mismatch() {
        let store = store_with_screen("signup", "abc");
        let (sink, _) = recording_pair();
        let err = ScreenClient::open(&store, sink, "login").unwrap_err();
        match err {
            ContextError::ScreenMismatch { expected, actual } => {
                assert_eq!(expected, "login");
                assert_eq!(actual, "signup");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_identifier_skips_the_check() {
        let store = store_with_screen("whatever-screen", "abc");
        let (sink, _) = recording_pair();
        let client = ScreenClient::open(&store, sink, "").unwrap();
        assert_eq!(client.screen_name(), "whatever-screen");
    }

    #[test]
    fn open_builds_all_views() {
        let store = ContextStore::new();
        store
            .install(json!({
                "screen": { "name": "login" },
                "transaction": { "state": "abc", "locale": "en" },
                "client": { "id": "c_1" },
                "tenant": { "friendly_name": "Acme" }
            }))
            .unwrap();
        let (sink, _) = recording_pair();
        let client = ScreenClient::open(&store, sink, "login").unwrap();

        assert_eq!(client.transaction.state(), Some("abc"));
        assert_eq!(client.client.id(), Some("c_1"));
        assert_eq!(client.tenant.friendly_name(), Some("Acme"));
        assert!(client.errors().is_empty());
        assert!(client.user.id().is_none());
    }

    #[tokio::test]
    async fn change_language_submits_protocol_action() {
        let store = store_with_screen("login", "abc");
        let (sink, recorder) = recording_pair();
        let client = ScreenClient::open(&store, sink, "login").unwrap();

        let mut options = Fields::new();
        options.set("language", "fr");
        options.set("action", "sneaky");
        client.change_language(options).await.unwrap();

        let form = recorder.last().unwrap();
        assert_eq!(form.get("language"), Some("fr"));
        assert_eq!(form.get("action"), Some("change-language"));
        assert_eq!(form.get("state"), Some("abc"));
    }
}
