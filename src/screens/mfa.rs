//! Factor selection and the email/OTP MFA challenges and enrollments.

use std::sync::Arc;

use serde_json::Value;

use crate::context::ContextStore;
use crate::error::{ContextError, InputError, SubmitError};
use crate::form::Fields;
use crate::models::{self, ScreenContext};
use crate::screens::{actions, ScreenClient};
use crate::sink::SubmissionSink;

/// Code entry with the optional remember-this-browser checkbox. The flag is
/// encoded as `rememberBrowser: true` only when set; omission means unset.
pub struct MfaCodeOptions {
    pub code: String,
    pub remember_device: bool,
    pub custom: Fields,
}

impl MfaCodeOptions {
    pub fn code(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            remember_device: false,
            custom: Fields::new(),
        }
    }
}

/// Choice screen over the user's enrolled factors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOptionsData {
    pub enrolled_factors: Vec<String>,
}

impl LoginOptionsData {
    pub fn from_screen(screen: &ScreenContext) -> Option<Self> {
        let data = screen.data.as_ref()?;
        let enrolled_factors = data
            .get("enrolled_factors")
            .and_then(Value::as_array)?
            .iter()
            .filter_map(|f| f.as_str().map(str::to_owned))
            .collect();
        Some(Self { enrolled_factors })
    }
}

pub struct MfaLoginOptions {
    pub base: ScreenClient,
    pub data: Option<LoginOptionsData>,
}

impl MfaLoginOptions {
    pub const IDENTIFIER: &'static str = "mfa-login-options";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        let base = ScreenClient::open(store, sink, Self::IDENTIFIER)?;
        let data = LoginOptionsData::from_screen(base.screen.raw());
        Ok(Self { base, data })
    }

    /// Continues with one of the enrolled factors; the factor name becomes
    /// part of the action (`pick-sms`, `pick-email`, ...).
    pub async fn select_factor(
        &self,
        factor: impl AsRef<str>,
        custom: Fields,
    ) -> Result<(), SubmitError> {
        let factor = factor.as_ref();
        if factor.trim().is_empty() {
            return Err(InputError::required("factor").into());
        }
        let mut fields = custom;
        fields.set("action", format!("pick-{factor}"));
        self.base.form("select_factor").submit_data(fields).await
    }
}

/// Terminal screen reporting how an enrollment went. Display only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollResultData {
    pub status: Option<String>,
}

impl EnrollResultData {
    pub fn from_screen(screen: &ScreenContext) -> Option<Self> {
        let data = screen.data.as_ref()?;
        Some(Self {
            status: models::str_field(data, "status"),
        })
    }
}

pub struct MfaEnrollResult {
    pub base: ScreenClient,
    pub data: Option<EnrollResultData>,
}

impl MfaEnrollResult {
    pub const IDENTIFIER: &'static str = "mfa-enroll-result";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        let base = ScreenClient::open(store, sink, Self::IDENTIFIER)?;
        let data = EnrollResultData::from_screen(base.screen.raw());
        Ok(Self { base, data })
    }
}

/// Dial-code picker for phone enrollment.
pub struct MfaCountryCodes {
    pub base: ScreenClient,
}

impl MfaCountryCodes {
    pub const IDENTIFIER: &'static str = "mfa-country-codes";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        Ok(Self {
            base: ScreenClient::open(store, sink, Self::IDENTIFIER)?,
        })
    }

    /// The selection is encoded in the action itself:
    /// `selection-action::<code><prefix>`.
    pub async fn select_country_code(
        &self,
        country_code: impl AsRef<str>,
        phone_prefix: impl AsRef<str>,
        custom: Fields,
    ) -> Result<(), SubmitError> {
        let country_code = country_code.as_ref();
        if country_code.trim().is_empty() {
            return Err(InputError::required("country_code").into());
        }
        let mut fields = custom;
        fields.set(
            "action",
            actions::selection(format!("{country_code}{}", phone_prefix.as_ref())),
        );
        self.base
            .form("select_country_code")
            .submit_data(fields)
            .await
    }

    pub async fn go_back(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::BACK);
        self.base.form("go_back").submit_data(fields).await
    }
}

/// Email challenge: a code mailed to the enrolled address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MfaEmailChallengeData {
    pub email: Option<String>,
    pub show_remember_device: bool,
}

impl MfaEmailChallengeData {
    pub fn from_screen(screen: &ScreenContext) -> Option<Self> {
        let data = screen.data.as_ref()?;
        Some(Self {
            email: models::str_field(data, "email"),
            show_remember_device: models::flag_field(data, "show_remember_device"),
        })
    }
}

pub struct MfaEmailChallenge {
    pub base: ScreenClient,
    pub data: Option<MfaEmailChallengeData>,
}

impl MfaEmailChallenge {
    pub const IDENTIFIER: &'static str = "mfa-email-challenge";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        let base = ScreenClient::open(store, sink, Self::IDENTIFIER)?;
        let data = MfaEmailChallengeData::from_screen(base.screen.raw());
        Ok(Self { base, data })
    }

    pub async fn continue_with_code(&self, options: MfaCodeOptions) -> Result<(), SubmitError> {
        if options.code.trim().is_empty() {
            return Err(InputError::required("code").into());
        }
        let mut fields = options.custom;
        fields.set("code", options.code);
        fields.set_if("rememberBrowser", options.remember_device, true);
        fields.set("action", actions::DEFAULT);
        self.base
            .form("continue_with_code")
            .submit_data(fields)
            .await
    }

    pub async fn resend_code(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::RESEND_CODE);
        self.base.form("resend_code").submit_data(fields).await
    }

    pub async fn try_another_method(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::PICK_AUTHENTICATOR);
        self.base
            .form("try_another_method")
            .submit_data(fields)
            .await
    }

    /// Picks a different enrolled email address, when more than one exists.
    pub async fn pick_email(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::PICK_EMAIL);
        self.base.form("pick_email").submit_data(fields).await
    }
}

/// List of enrolled email addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailListData {
    pub enrolled_emails: Vec<String>,
}

impl EmailListData {
    pub fn from_screen(screen: &ScreenContext) -> Option<Self> {
        let data = screen.data.as_ref()?;
        let enrolled_emails = data
            .get("enrolled_emails")
            .and_then(Value::as_array)?
            .iter()
            .filter_map(|e| e.as_str().map(str::to_owned))
            .collect();
        Some(Self { enrolled_emails })
    }
}

pub struct MfaEmailList {
    pub base: ScreenClient,
    pub data: Option<EmailListData>,
}

impl MfaEmailList {
    pub const IDENTIFIER: &'static str = "mfa-email-list";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        let base = ScreenClient::open(store, sink, Self::IDENTIFIER)?;
        let data = EmailListData::from_screen(base.screen.raw());
        Ok(Self { base, data })
    }

    /// Selects by position in `enrolled_emails`.
    pub async fn select_email(&self, index: usize, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::selection(index));
        self.base.form("select_email").submit_data(fields).await
    }

    pub async fn go_back(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::BACK);
        self.base.form("go_back").submit_data(fields).await
    }
}

/// TOTP challenge against an authenticator app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpChallengeData {
    pub show_remember_device: bool,
}

impl OtpChallengeData {
    pub fn from_screen(screen: &ScreenContext) -> Option<Self> {
        let data = screen.data.as_ref()?;
        Some(Self {
            show_remember_device: models::flag_field(data, "show_remember_device"),
        })
    }
}

pub struct MfaOtpChallenge {
    pub base: ScreenClient,
    pub data: Option<OtpChallengeData>,
}

impl MfaOtpChallenge {
    pub const IDENTIFIER: &'static str = "mfa-otp-challenge";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        let base = ScreenClient::open(store, sink, Self::IDENTIFIER)?;
        let data = OtpChallengeData::from_screen(base.screen.raw());
        Ok(Self { base, data })
    }

    pub async fn continue_with_code(&self, options: MfaCodeOptions) -> Result<(), SubmitError> {
        if options.code.trim().is_empty() {
            return Err(InputError::required("code").into());
        }
        let mut fields = options.custom;
        fields.set("code", options.code);
        fields.set_if("rememberBrowser", options.remember_device, true);
        fields.set("action", actions::DEFAULT);
        self.base
            .form("continue_with_code")
            .submit_data(fields)
            .await
    }

    pub async fn try_another_method(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::PICK_AUTHENTICATOR);
        self.base
            .form("try_another_method")
            .submit_data(fields)
            .await
    }
}

/// QR enrollment step for an authenticator app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpEnrollmentQrData {
    pub qr_code: Option<String>,
}

impl OtpEnrollmentQrData {
    pub fn from_screen(screen: &ScreenContext) -> Option<Self> {
        let data = screen.data.as_ref()?;
        Some(Self {
            qr_code: models::str_field(data, "qr_code"),
        })
    }
}

pub struct MfaOtpEnrollmentQr {
    pub base: ScreenClient,
    pub data: Option<OtpEnrollmentQrData>,
}

impl MfaOtpEnrollmentQr {
    pub const IDENTIFIER: &'static str = "mfa-otp-enrollment-qr";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        let base = ScreenClient::open(store, sink, Self::IDENTIFIER)?;
        let data = OtpEnrollmentQrData::from_screen(base.screen.raw());
        Ok(Self { base, data })
    }

    pub async fn continue_with_code(&self, options: MfaCodeOptions) -> Result<(), SubmitError> {
        if options.code.trim().is_empty() {
            return Err(InputError::required("code").into());
        }
        let mut fields = options.custom;
        fields.set("code", options.code);
        fields.set("action", actions::DEFAULT);
        self.base
            .form("continue_with_code")
            .submit_data(fields)
            .await
    }

    /// Switches to the manual text-code view.
    pub async fn toggle_view(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::TOGGLE_VIEW);
        self.base.form("toggle_view").submit_data(fields).await
    }

    pub async fn try_another_method(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::PICK_AUTHENTICATOR);
        self.base
            .form("try_another_method")
            .submit_data(fields)
            .await
    }
}

/// Manual text-code enrollment step for an authenticator app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpEnrollmentCodeData {
    pub text_code: Option<String>,
}

impl OtpEnrollmentCodeData {
    pub fn from_screen(screen: &ScreenContext) -> Option<Self> {
        let data = screen.data.as_ref()?;
        Some(Self {
            text_code: models::str_field(data, "text_code"),
        })
    }
}

pub struct MfaOtpEnrollmentCode {
    pub base: ScreenClient,
    pub data: Option<OtpEnrollmentCodeData>,
}

impl MfaOtpEnrollmentCode {
    pub const IDENTIFIER: &'static str = "mfa-otp-enrollment-code";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        let base = ScreenClient::open(store, sink, Self::IDENTIFIER)?;
        let data = OtpEnrollmentCodeData::from_screen(base.screen.raw());
        Ok(Self { base, data })
    }

    pub async fn continue_with_code(&self, options: MfaCodeOptions) -> Result<(), SubmitError> {
        if options.code.trim().is_empty() {
            return Err(InputError::required("code").into());
        }
        let mut fields = options.custom;
        fields.set("code", options.code);
        fields.set("action", actions::DEFAULT);
        self.base
            .form("continue_with_code")
            .submit_data(fields)
            .await
    }

    pub async fn try_another_method(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::PICK_AUTHENTICATOR);
        self.base
            .form("try_another_method")
            .submit_data(fields)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{recording_pair, store_with_screen, store_with_screen_data};
    use serde_json::json;

    #[tokio::test]
    async fn continue_encodes_remember_device_by_omission() {
        let store = store_with_screen_data(
            "mfa-email-challenge",
            "abc",
            json!({ "email": "u@example.com", "show_remember_device": true }),
        );
        let (sink, recorder) = recording_pair();
        let screen = MfaEmailChallenge::new(&store, sink).unwrap();

        screen
            .continue_with_code(MfaCodeOptions {
                code: "123456".into(),
                remember_device: true,
                custom: Fields::new(),
            })
            .await
            .unwrap();

        let form = recorder.last().unwrap();
        assert_eq!(form.get("code"), Some("123456"));
        assert_eq!(form.get("action"), Some("default"));
        assert_eq!(form.get("rememberBrowser"), Some("true"));

        screen
            .continue_with_code(MfaCodeOptions::code("654321"))
            .await
            .unwrap();
        let form = recorder.last().unwrap();
        assert_eq!(form.get("rememberBrowser"), None);
    }

    #[tokio::test]
    async fn protocol_action_wins_over_caller_payload() {
        let store = store_with_screen("mfa-email-challenge", "abc");
        let (sink, recorder) = recording_pair();
        let screen = MfaEmailChallenge::new(&store, sink).unwrap();

        let mut custom = Fields::new();
        custom.set("action", "sneaky");
        custom.set("reason", "user-clicked");
        screen
            .continue_with_code(MfaCodeOptions {
                code: "123456".into(),
                remember_device: false,
                custom,
            })
            .await
            .unwrap();

        let form = recorder.last().unwrap();
        assert_eq!(form.get("action"), Some("default"));
        assert_eq!(form.get("reason"), Some("user-clicked"));
    }

    #[test]
    fn email_challenge_data_requires_data_block() {
        let bare: ScreenContext =
            serde_json::from_value(json!({ "name": "mfa-email-challenge" })).unwrap();
        assert!(MfaEmailChallengeData::from_screen(&bare).is_none());

        let with_data: ScreenContext = serde_json::from_value(json!({
            "name": "mfa-email-challenge",
            "data": { "email": "u@example.com" }
        }))
        .unwrap();
        let data = MfaEmailChallengeData::from_screen(&with_data).unwrap();
        assert_eq!(data.email.as_deref(), Some("u@example.com"));
        assert!(!data.show_remember_device);
    }

    #[tokio::test]
    async fn selection_actions_embed_their_argument() {
        let store = store_with_screen_data(
            "mfa-email-list",
            "abc",
            json!({ "enrolled_emails": ["a@x.com", "b@x.com"] }),
        );
        let (sink, recorder) = recording_pair();
        let screen = MfaEmailList::new(&store, sink).unwrap();
        assert_eq!(screen.data.as_ref().unwrap().enrolled_emails.len(), 2);

        screen.select_email(1, Fields::new()).await.unwrap();
        assert_eq!(
            recorder.last().unwrap().get("action"),
            Some("selection-action::1")
        );
    }

    #[tokio::test]
    async fn country_code_selection_concatenates_code_and_prefix() {
        let store = store_with_screen("mfa-country-codes", "abc");
        let (sink, recorder) = recording_pair();
        let screen = MfaCountryCodes::new(&store, sink).unwrap();

        screen
            .select_country_code("US", "+1", Fields::new())
            .await
            .unwrap();
        assert_eq!(
            recorder.last().unwrap().get("action"),
            Some("selection-action::US+1")
        );
    }

    #[tokio::test]
    async fn factor_selection_builds_pick_action() {
        let store = store_with_screen_data(
            "mfa-login-options",
            "abc",
            json!({ "enrolled_factors": ["sms", "otp"] }),
        );
        let (sink, recorder) = recording_pair();
        let screen = MfaLoginOptions::new(&store, sink).unwrap();

        screen.select_factor("sms", Fields::new()).await.unwrap();
        assert_eq!(recorder.last().unwrap().get("action"), Some("pick-sms"));
    }
}
