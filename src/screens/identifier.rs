//! Identifier verification challenges: a code sent to the email address or
//! phone number the user just entered.

use std::sync::Arc;

use crate::context::ContextStore;
use crate::error::{ContextError, InputError, SubmitError};
use crate::form::Fields;
use crate::models::{self, ScreenContext};
use crate::resend::{Clock, ResendControl, ResendOptions, StateStore};
use crate::screens::{actions, ScreenClient};
use crate::sink::SubmissionSink;

use super::login::CodeOptions;

/// Data for the email identifier challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailChallengeData {
    pub email: Option<String>,
    pub message_type: Option<String>,
    pub resend_limit_reached: bool,
}

impl EmailChallengeData {
    pub fn from_screen(screen: &ScreenContext) -> Option<Self> {
        let data = screen.data.as_ref()?;
        Some(Self {
            email: models::str_field(data, "email"),
            message_type: models::str_field(data, "message_type"),
            resend_limit_reached: models::flag_field(data, "resend_limit_reached"),
        })
    }
}

pub struct EmailIdentifierChallenge {
    pub base: ScreenClient,
    pub data: Option<EmailChallengeData>,
}

impl EmailIdentifierChallenge {
    pub const IDENTIFIER: &'static str = "email-identifier-challenge";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        let base = ScreenClient::open(store, sink, Self::IDENTIFIER)?;
        let data = EmailChallengeData::from_screen(base.screen.raw());
        Ok(Self { base, data })
    }

    pub async fn submit_email_challenge(&self, options: CodeOptions) -> Result<(), SubmitError> {
        if options.code.trim().is_empty() {
            return Err(InputError::required("code").into());
        }
        let mut fields = options.custom;
        fields.set("code", options.code);
        fields.set("action", actions::DEFAULT);
        self.base
            .form("submit_email_challenge")
            .submit_data(fields)
            .await
    }

    pub async fn resend_code(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::RESEND_CODE);
        self.base.form("resend_code").submit_data(fields).await
    }

    pub async fn return_to_previous(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::BACK);
        self.base
            .form("return_to_previous")
            .submit_data(fields)
            .await
    }

    /// A cooldown gate for this screen, closed for good once the server
    /// reports the resend limit reached.
    pub fn resend_gate(
        &self,
        store: Arc<dyn StateStore>,
        clock: Arc<dyn Clock>,
        mut options: ResendOptions,
    ) -> ResendControl {
        options.resend_limit_reached = self
            .data
            .as_ref()
            .map(|d| d.resend_limit_reached)
            .unwrap_or(false);
        ResendControl::new(Self::IDENTIFIER, store, clock, options)
    }
}

/// Data for the phone identifier challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneChallengeData {
    pub phone_number: Option<String>,
    /// `sms` or `voice`.
    pub message_type: Option<String>,
    pub resend_limit_reached: bool,
}

impl PhoneChallengeData {
    pub fn from_screen(screen: &ScreenContext) -> Option<Self> {
        let data = screen.data.as_ref()?;
        Some(Self {
            phone_number: models::str_field(data, "phone_number"),
            message_type: models::str_field(data, "message_type"),
            resend_limit_reached: models::flag_field(data, "resend_limit_reached"),
        })
    }
}

pub struct PhoneIdentifierChallenge {
    pub base: ScreenClient,
    pub data: Option<PhoneChallengeData>,
}

impl PhoneIdentifierChallenge {
    pub const IDENTIFIER: &'static str = "phone-identifier-challenge";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        let base = ScreenClient::open(store, sink, Self::IDENTIFIER)?;
        let data = PhoneChallengeData::from_screen(base.screen.raw());
        Ok(Self { base, data })
    }

    pub async fn submit_phone_challenge(&self, options: CodeOptions) -> Result<(), SubmitError> {
        if options.code.trim().is_empty() {
            return Err(InputError::required("code").into());
        }
        let mut fields = options.custom;
        fields.set("code", options.code);
        fields.set("action", actions::DEFAULT);
        self.base
            .form("submit_phone_challenge")
            .submit_data(fields)
            .await
    }

    pub async fn resend_code(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::RESEND_CODE);
        self.base.form("resend_code").submit_data(fields).await
    }

    pub async fn return_to_previous(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::BACK);
        self.base
            .form("return_to_previous")
            .submit_data(fields)
            .await
    }

    pub fn resend_gate(
        &self,
        store: Arc<dyn StateStore>,
        clock: Arc<dyn Clock>,
        mut options: ResendOptions,
    ) -> ResendControl {
        options.resend_limit_reached = self
            .data
            .as_ref()
            .map(|d| d.resend_limit_reached)
            .unwrap_or(false);
        ResendControl::new(Self::IDENTIFIER, store, clock, options)
    }
}

/// One-time code challenge delivered over email mid-flow.
pub struct EmailOtpChallenge {
    pub base: ScreenClient,
}

impl EmailOtpChallenge {
    pub const IDENTIFIER: &'static str = "email-otp-challenge";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        Ok(Self {
            base: ScreenClient::open(store, sink, Self::IDENTIFIER)?,
        })
    }

    pub async fn submit_code(&self, options: CodeOptions) -> Result<(), SubmitError> {
        if options.code.trim().is_empty() {
            return Err(InputError::required("code").into());
        }
        let mut fields = options.custom;
        fields.set("code", options.code);
        fields.set("action", actions::DEFAULT);
        self.base.form("submit_code").submit_data(fields).await
    }

    pub async fn resend_code(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::RESEND_CODE);
        self.base.form("resend_code").submit_data(fields).await
    }
}

/// Terminal screen reporting how an email verification went. Display only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResultData {
    pub status: Option<String>,
}

impl VerificationResultData {
    pub fn from_screen(screen: &ScreenContext) -> Option<Self> {
        let data = screen.data.as_ref()?;
        Some(Self {
            status: models::str_field(data, "status"),
        })
    }
}

pub struct EmailVerificationResult {
    pub base: ScreenClient,
    pub data: Option<VerificationResultData>,
}

impl EmailVerificationResult {
    pub const IDENTIFIER: &'static str = "email-verification-result";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        let base = ScreenClient::open(store, sink, Self::IDENTIFIER)?;
        let data = VerificationResultData::from_screen(base.screen.raw());
        Ok(Self { base, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resend::{MemoryStateStore, ResendOutcome, SystemClock};
    use crate::test_support::{recording_pair, store_with_screen, store_with_screen_data};
    use serde_json::json;

    #[test]
    fn phone_data_extraction_is_pure_and_total() {
        let screen: ScreenContext = serde_json::from_value(json!({
            "name": "phone-identifier-challenge",
            "data": { "phone_number": "+15551234", "message_type": "sms" }
        }))
        .unwrap();

        let data = PhoneChallengeData::from_screen(&screen).unwrap();
        assert_eq!(data.phone_number.as_deref(), Some("+15551234"));
        assert_eq!(data.message_type.as_deref(), Some("sms"));
        assert!(!data.resend_limit_reached);

        let bare: ScreenContext =
            serde_json::from_value(json!({ "name": "phone-identifier-challenge" })).unwrap();
        assert!(PhoneChallengeData::from_screen(&bare).is_none());
    }

    #[tokio::test]
    async fn challenge_actions_carry_their_action_names() {
        let store = store_with_screen("phone-identifier-challenge", "abc");
        let (sink, recorder) = recording_pair();
        let screen = PhoneIdentifierChallenge::new(&store, sink).unwrap();

        screen
            .submit_phone_challenge(CodeOptions {
                code: "123456".into(),
                custom: Fields::new(),
            })
            .await
            .unwrap();
        assert_eq!(recorder.last().unwrap().get("action"), Some("default"));

        screen.resend_code(Fields::new()).await.unwrap();
        assert_eq!(recorder.last().unwrap().get("action"), Some("resend-code"));

        screen.return_to_previous(Fields::new()).await.unwrap();
        assert_eq!(recorder.last().unwrap().get("action"), Some("back-action"));
    }

    #[tokio::test]
    async fn resend_gate_honors_server_limit_flag() {
        let store = store_with_screen_data(
            "email-identifier-challenge",
            "abc",
            json!({ "email": "u@example.com", "resend_limit_reached": true }),
        );
        let (sink, _) = recording_pair();
        let screen = EmailIdentifierChallenge::new(&store, sink).unwrap();

        let gate = screen.resend_gate(
            Arc::new(MemoryStateStore::new()),
            Arc::new(SystemClock),
            ResendOptions::default(),
        );

        let outcome = gate
            .start_resend(|| async { Ok::<(), std::convert::Infallible>(()) })
            .await
            .unwrap();
        assert_eq!(outcome, ResendOutcome::Blocked);
    }
}
