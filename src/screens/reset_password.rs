//! MFA challenges inside the reset-password flow. These mirror their login
//! counterparts; the phone screen additionally posts to the shared
//! challenge endpoint instead of the current page.

use std::sync::Arc;

use serde_json::Value;

use crate::context::ContextStore;
use crate::error::{ContextError, InputError, SubmitError};
use crate::form::Fields;
use crate::models::{self, ScreenContext};
use crate::screens::{actions, ScreenClient, MFA_PHONE_CHALLENGE_ROUTE};
use crate::sink::SubmissionSink;

use super::login::CodeOptions;
use super::mfa::MfaCodeOptions;
use super::mfa_phone::DeliveryType;

pub struct ResetPasswordMfaEmailChallenge {
    pub base: ScreenClient,
    pub data: Option<EmailData>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailData {
    pub email: Option<String>,
}

impl EmailData {
    pub fn from_screen(screen: &ScreenContext) -> Option<Self> {
        let data = screen.data.as_ref()?;
        Some(Self {
            email: models::str_field(data, "email"),
        })
    }
}

impl ResetPasswordMfaEmailChallenge {
    pub const IDENTIFIER: &'static str = "reset-password-mfa-email-challenge";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        let base = ScreenClient::open(store, sink, Self::IDENTIFIER)?;
        let data = EmailData::from_screen(base.screen.raw());
        Ok(Self { base, data })
    }

    pub async fn continue_with_code(&self, options: CodeOptions) -> Result<(), SubmitError> {
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
}

pub struct ResetPasswordMfaOtpChallenge {
    pub base: ScreenClient,
}

impl ResetPasswordMfaOtpChallenge {
    pub const IDENTIFIER: &'static str = "reset-password-mfa-otp-challenge";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        Ok(Self {
            base: ScreenClient::open(store, sink, Self::IDENTIFIER)?,
        })
    }

    pub async fn continue_with_code(&self, options: CodeOptions) -> Result<(), SubmitError> {
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

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneData {
    pub phone_number: Option<String>,
}

impl PhoneData {
    pub fn from_screen(screen: &ScreenContext) -> Option<Self> {
        let data = screen.data.as_ref()?;
        Some(Self {
            phone_number: models::str_field(data, "phone_number"),
        })
    }
}

/// Phone challenge reused from the login flow; submissions target the
/// shared endpoint explicitly because the rendered page lives under the
/// reset-password path.
pub struct ResetPasswordMfaPhoneChallenge {
    pub base: ScreenClient,
    pub data: Option<PhoneData>,
}

impl ResetPasswordMfaPhoneChallenge {
    pub const IDENTIFIER: &'static str = "reset-password-mfa-phone-challenge";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        let base = ScreenClient::open(store, sink, Self::IDENTIFIER)?;
        let data = PhoneData::from_screen(base.screen.raw());
        Ok(Self { base, data })
    }

    pub async fn continue_with_type(
        &self,
        delivery: DeliveryType,
        custom: Fields,
    ) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("type", delivery.as_str());
        fields.set("action", actions::DEFAULT);
        self.base
            .form_at(MFA_PHONE_CHALLENGE_ROUTE, "continue_with_type")
            .submit_data(fields)
            .await
    }

    pub async fn try_another_method(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::PICK_AUTHENTICATOR);
        self.base
            .form_at(MFA_PHONE_CHALLENGE_ROUTE, "try_another_method")
            .submit_data(fields)
            .await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushData {
    pub device_name: Option<String>,
}

impl PushData {
    pub fn from_screen(screen: &ScreenContext) -> Option<Self> {
        let data = screen.data.as_ref()?;
        Some(Self {
            device_name: models::str_field(data, "device_name"),
        })
    }
}

pub struct ResetPasswordMfaPushChallengePush {
    pub base: ScreenClient,
    pub data: Option<PushData>,
}

impl ResetPasswordMfaPushChallengePush {
    pub const IDENTIFIER: &'static str = "reset-password-mfa-push-challenge-push";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        let base = ScreenClient::open(store, sink, Self::IDENTIFIER)?;
        let data = PushData::from_screen(base.screen.raw());
        Ok(Self { base, data })
    }

    pub async fn continue_challenge(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::CONTINUE);
        self.base
            .form("continue_challenge")
            .submit_data(fields)
            .await
    }

    pub async fn resend_notification(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::RESEND);
        self.base
            .form("resend_notification")
            .submit_data(fields)
            .await
    }

    pub async fn enter_code_manually(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::ENTER_OTP_CODE);
        self.base
            .form("enter_code_manually")
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

pub struct ResetPasswordMfaRecoveryCodeChallenge {
    pub base: ScreenClient,
}

impl ResetPasswordMfaRecoveryCodeChallenge {
    pub const IDENTIFIER: &'static str = "reset-password-mfa-recovery-code-challenge";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        Ok(Self {
            base: ScreenClient::open(store, sink, Self::IDENTIFIER)?,
        })
    }

    pub async fn continue_with_code(&self, options: CodeOptions) -> Result<(), SubmitError> {
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

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsData {
    pub phone_number: Option<String>,
    pub show_link_voice: bool,
}

impl SmsData {
    pub fn from_screen(screen: &ScreenContext) -> Option<Self> {
        let data = screen.data.as_ref()?;
        Some(Self {
            phone_number: models::str_field(data, "phone_number"),
            show_link_voice: models::flag_field(data, "show_link_voice"),
        })
    }
}

pub struct ResetPasswordMfaSmsChallenge {
    pub base: ScreenClient,
    pub data: Option<SmsData>,
}

impl ResetPasswordMfaSmsChallenge {
    pub const IDENTIFIER: &'static str = "reset-password-mfa-sms-challenge";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        let base = ScreenClient::open(store, sink, Self::IDENTIFIER)?;
        let data = SmsData::from_screen(base.screen.raw());
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

    pub async fn get_a_call(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::SWITCH_TO_VOICE);
        self.base.form("get_a_call").submit_data(fields).await
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

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceData {
    pub phone_number: Option<String>,
    pub show_link_sms: bool,
}

impl VoiceData {
    pub fn from_screen(screen: &ScreenContext) -> Option<Self> {
        let data = screen.data.as_ref()?;
        Some(Self {
            phone_number: models::str_field(data, "phone_number"),
            show_link_sms: models::flag_field(data, "show_link_sms"),
        })
    }
}

pub struct ResetPasswordMfaVoiceChallenge {
    pub base: ScreenClient,
    pub data: Option<VoiceData>,
}

impl ResetPasswordMfaVoiceChallenge {
    pub const IDENTIFIER: &'static str = "reset-password-mfa-voice-challenge";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        let base = ScreenClient::open(store, sink, Self::IDENTIFIER)?;
        let data = VoiceData::from_screen(base.screen.raw());
        Ok(Self { base, data })
    }

    pub async fn continue_with_code(&self, options: CodeOptions) -> Result<(), SubmitError> {
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

    pub async fn switch_to_sms(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::SWITCH_TO_SMS);
        self.base.form("switch_to_sms").submit_data(fields).await
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
}

#[derive(Debug, Clone, PartialEq)]
pub struct WebAuthnData {
    pub passkey: Option<Value>,
    pub show_remember_device: bool,
}

impl WebAuthnData {
    pub fn from_screen(screen: &ScreenContext) -> Option<Self> {
        let data = screen.data.as_ref()?;
        Some(Self {
            passkey: data.get("passkey").cloned(),
            show_remember_device: models::flag_field(data, "show_remember_device"),
        })
    }
}

pub struct ResetPasswordMfaWebAuthnPlatformChallenge {
    pub base: ScreenClient,
    pub data: Option<WebAuthnData>,
}

impl ResetPasswordMfaWebAuthnPlatformChallenge {
    pub const IDENTIFIER: &'static str = "reset-password-mfa-webauthn-platform-challenge";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        let base = ScreenClient::open(store, sink, Self::IDENTIFIER)?;
        let data = WebAuthnData::from_screen(base.screen.raw());
        Ok(Self { base, data })
    }

    pub async fn verify(&self, credential: Value, custom: Fields) -> Result<(), SubmitError> {
        if credential.is_null() {
            return Err(InputError::required("response").into());
        }
        let mut fields = custom;
        fields.set(
            "response",
            serde_json::to_string(&credential).unwrap_or_default(),
        );
        fields.set("action", actions::DEFAULT);
        self.base.form("verify").submit_data(fields).await
    }

    pub async fn report_browser_error(
        &self,
        error: Value,
        custom: Fields,
    ) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::show_error(&error));
        self.base
            .form("report_browser_error")
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

pub struct ResetPasswordMfaWebAuthnRoamingChallenge {
    pub base: ScreenClient,
    pub data: Option<WebAuthnData>,
}

impl ResetPasswordMfaWebAuthnRoamingChallenge {
    pub const IDENTIFIER: &'static str = "reset-password-mfa-webauthn-roaming-challenge";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        let base = ScreenClient::open(store, sink, Self::IDENTIFIER)?;
        let data = WebAuthnData::from_screen(base.screen.raw());
        Ok(Self { base, data })
    }

    pub async fn verify(&self, credential: Value, custom: Fields) -> Result<(), SubmitError> {
        if credential.is_null() {
            return Err(InputError::required("response").into());
        }
        let mut fields = custom;
        fields.set(
            "response",
            serde_json::to_string(&credential).unwrap_or_default(),
        );
        fields.set("action", actions::DEFAULT);
        self.base.form("verify").submit_data(fields).await
    }

    pub async fn report_browser_error(
        &self,
        error: Value,
        custom: Fields,
    ) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::show_error(&error));
        self.base
            .form("report_browser_error")
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
    async fn phone_challenge_targets_the_shared_route() {
        let store = store_with_screen_data(
            "reset-password-mfa-phone-challenge",
            "abc",
            json!({ "phone_number": "+1555***1234" }),
        );
        let (sink, recorder) = recording_pair();
        let screen = ResetPasswordMfaPhoneChallenge::new(&store, sink).unwrap();

        screen
            .continue_with_type(DeliveryType::Sms, Fields::new())
            .await
            .unwrap();
        let form = recorder.last().unwrap();
        assert_eq!(form.route, "/u/mfa-phone-challenge");
        assert_eq!(form.get("type"), Some("sms"));
        assert_eq!(form.get("action"), Some("default"));

        screen.try_another_method(Fields::new()).await.unwrap();
        assert_eq!(recorder.last().unwrap().route, "/u/mfa-phone-challenge");
    }

    #[tokio::test]
    async fn sibling_screens_target_the_current_page() {
        let store = store_with_screen("reset-password-mfa-sms-challenge", "abc");
        let (sink, recorder) = recording_pair();
        let screen = ResetPasswordMfaSmsChallenge::new(&store, sink).unwrap();

        screen.resend_code(Fields::new()).await.unwrap();
        let form = recorder.last().unwrap();
        assert_eq!(form.route, "");
        assert_eq!(form.get("action"), Some("resend-code"));
    }
}
