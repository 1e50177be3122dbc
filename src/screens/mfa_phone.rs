//! Phone-based MFA: SMS and voice challenges plus their enrollments.

use std::sync::Arc;

use crate::context::ContextStore;
use crate::error::{ContextError, InputError, SubmitError};
use crate::form::Fields;
use crate::models::{self, ScreenContext};
use crate::screens::{actions, ScreenClient};
use crate::sink::SubmissionSink;

use super::mfa::MfaCodeOptions;

/// How the challenge should be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryType {
    Sms,
    Voice,
}

impl DeliveryType {
    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryType::Sms => "sms",
            DeliveryType::Voice => "voice",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneChallengeData {
    pub phone_number: String,
}

impl PhoneChallengeData {
    pub fn from_screen(screen: &ScreenContext) -> Option<Self> {
        let data = screen.data.as_ref()?;
        // The masked phone number is the whole point of this screen; treat
        // a data block without it as absent.
        let phone_number = models::str_field(data, "phone_number")?;
        Some(Self { phone_number })
    }
}

/// Chooses SMS or voice delivery for an enrolled phone number.
pub struct MfaPhoneChallenge {
    pub base: ScreenClient,
    pub data: Option<PhoneChallengeData>,
}

impl MfaPhoneChallenge {
    pub const IDENTIFIER: &'static str = "mfa-phone-challenge";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        let base = ScreenClient::open(store, sink, Self::IDENTIFIER)?;
        let data = PhoneChallengeData::from_screen(base.screen.raw());
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
            .form("continue_with_type")
            .submit_data(fields)
            .await
    }

    pub async fn pick_phone(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::PICK_PHONE);
        self.base.form("pick_phone").submit_data(fields).await
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

pub struct PhoneEnrollmentOptions {
    pub phone: String,
    pub delivery: DeliveryType,
    pub custom: Fields,
}

/// Enrolls a new phone number for MFA.
pub struct MfaPhoneEnrollment {
    pub base: ScreenClient,
}

impl MfaPhoneEnrollment {
    pub const IDENTIFIER: &'static str = "mfa-phone-enrollment";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        Ok(Self {
            base: ScreenClient::open(store, sink, Self::IDENTIFIER)?,
        })
    }

    pub async fn enroll_phone(&self, options: PhoneEnrollmentOptions) -> Result<(), SubmitError> {
        if options.phone.trim().is_empty() {
            return Err(InputError::required("phone").into());
        }
        let mut fields = options.custom;
        fields.set("phone", options.phone);
        fields.set("type", options.delivery.as_str());
        fields.set("action", actions::DEFAULT);
        self.base.form("enroll_phone").submit_data(fields).await
    }

    pub async fn pick_country_code(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::PICK_COUNTRY_CODE);
        self.base
            .form("pick_country_code")
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
pub struct SmsChallengeData {
    pub phone_number: Option<String>,
    pub show_remember_device: bool,
    pub show_link_voice: bool,
}

impl SmsChallengeData {
    pub fn from_screen(screen: &ScreenContext) -> Option<Self> {
        let data = screen.data.as_ref()?;
        Some(Self {
            phone_number: models::str_field(data, "phone_number"),
            show_remember_device: models::flag_field(data, "show_remember_device"),
            show_link_voice: models::flag_field(data, "show_link_voice"),
        })
    }
}

/// Code delivered by SMS.
pub struct MfaSmsChallenge {
    pub base: ScreenClient,
    pub data: Option<SmsChallengeData>,
}

impl MfaSmsChallenge {
    pub const IDENTIFIER: &'static str = "mfa-sms-challenge";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        let base = ScreenClient::open(store, sink, Self::IDENTIFIER)?;
        let data = SmsChallengeData::from_screen(base.screen.raw());
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

    /// Re-delivers the challenge as a voice call.
    pub async fn get_a_call(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::SWITCH_TO_VOICE);
        self.base.form("get_a_call").submit_data(fields).await
    }

    pub async fn pick_sms(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::PICK_SMS);
        self.base.form("pick_sms").submit_data(fields).await
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

/// Enrolls a phone number for SMS delivery.
pub struct MfaSmsEnrollment {
    pub base: ScreenClient,
}

impl MfaSmsEnrollment {
    pub const IDENTIFIER: &'static str = "mfa-sms-enrollment";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        Ok(Self {
            base: ScreenClient::open(store, sink, Self::IDENTIFIER)?,
        })
    }

    pub async fn enroll_phone(&self, phone: impl Into<String>, custom: Fields) -> Result<(), SubmitError> {
        let phone = phone.into();
        if phone.trim().is_empty() {
            return Err(InputError::required("phone").into());
        }
        let mut fields = custom;
        fields.set("phone", phone);
        fields.set("action", actions::DEFAULT);
        self.base.form("enroll_phone").submit_data(fields).await
    }

    pub async fn pick_country_code(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::PICK_COUNTRY_CODE);
        self.base
            .form("pick_country_code")
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
pub struct VoiceChallengeData {
    pub phone_number: Option<String>,
    pub show_remember_device: bool,
    pub show_link_sms: bool,
}

impl VoiceChallengeData {
    pub fn from_screen(screen: &ScreenContext) -> Option<Self> {
        let data = screen.data.as_ref()?;
        Some(Self {
            phone_number: models::str_field(data, "phone_number"),
            show_remember_device: models::flag_field(data, "show_remember_device"),
            show_link_sms: models::flag_field(data, "show_link_sms"),
        })
    }
}

/// Code delivered by voice call.
pub struct MfaVoiceChallenge {
    pub base: ScreenClient,
    pub data: Option<VoiceChallengeData>,
}

impl MfaVoiceChallenge {
    pub const IDENTIFIER: &'static str = "mfa-voice-challenge";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        let base = ScreenClient::open(store, sink, Self::IDENTIFIER)?;
        let data = VoiceChallengeData::from_screen(base.screen.raw());
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

    pub async fn switch_to_sms(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::SWITCH_TO_SMS);
        self.base.form("switch_to_sms").submit_data(fields).await
    }

    pub async fn pick_phone(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::PICK_PHONE);
        self.base.form("pick_phone").submit_data(fields).await
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

/// Enrolls a phone number for voice delivery.
pub struct MfaVoiceEnrollment {
    pub base: ScreenClient,
}

impl MfaVoiceEnrollment {
    pub const IDENTIFIER: &'static str = "mfa-voice-enrollment";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        Ok(Self {
            base: ScreenClient::open(store, sink, Self::IDENTIFIER)?,
        })
    }

    pub async fn enroll_phone(&self, phone: impl Into<String>, custom: Fields) -> Result<(), SubmitError> {
        let phone = phone.into();
        if phone.trim().is_empty() {
            return Err(InputError::required("phone").into());
        }
        let mut fields = custom;
        fields.set("phone", phone);
        fields.set("action", actions::DEFAULT);
        self.base.form("enroll_phone").submit_data(fields).await
    }

    pub async fn pick_country_code(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::PICK_COUNTRY_CODE);
        self.base
            .form("pick_country_code")
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
