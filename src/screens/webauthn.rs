//! WebAuthn MFA screens: platform and roaming enrollment, challenges, the
//! nickname editor, and the error surfaces.
//!
//! Credential ceremonies happen outside this crate; these handlers carry
//! the resolved credential (or the browser's error) back to the server.
//! Browser-reported errors ride inside the action itself:
//! `showError::<json>`.

use std::sync::Arc;

use serde_json::Value;

use crate::context::ContextStore;
use crate::error::{ContextError, InputError, SubmitError};
use crate::form::Fields;
use crate::models::{self, ScreenContext};
use crate::screens::{actions, ScreenClient};
use crate::sink::SubmissionSink;

fn set_credential(fields: &mut Fields, credential: &Value) {
    fields.set(
        "response",
        serde_json::to_string(credential).unwrap_or_default(),
    );
}

/// Passkey creation options plus the remember toggle.
#[derive(Debug, Clone, PartialEq)]
pub struct WebAuthnChallengeData {
    pub passkey: Option<Value>,
    pub show_remember_device: bool,
    pub webauthn_type: Option<String>,
}

impl WebAuthnChallengeData {
    pub fn from_screen(screen: &ScreenContext) -> Option<Self> {
        let data = screen.data.as_ref()?;
        Some(Self {
            passkey: data.get("passkey").cloned(),
            show_remember_device: models::flag_field(data, "show_remember_device"),
            webauthn_type: models::str_field(data, "webauthn_type"),
        })
    }
}

pub struct MfaWebAuthnPlatformEnrollment {
    pub base: ScreenClient,
    pub data: Option<WebAuthnChallengeData>,
}

impl MfaWebAuthnPlatformEnrollment {
    pub const IDENTIFIER: &'static str = "mfa-webauthn-platform-enrollment";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        let base = ScreenClient::open(store, sink, Self::IDENTIFIER)?;
        let data = WebAuthnChallengeData::from_screen(base.screen.raw());
        Ok(Self { base, data })
    }

    pub async fn submit_credential(
        &self,
        credential: Value,
        custom: Fields,
    ) -> Result<(), SubmitError> {
        if credential.is_null() {
            return Err(InputError::required("response").into());
        }
        let mut fields = custom;
        set_credential(&mut fields, &credential);
        fields.set("action", actions::DEFAULT);
        self.base
            .form("submit_credential")
            .submit_data(fields)
            .await
    }

    /// Postpones enrollment to a later login.
    pub async fn snooze(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::SNOOZE_ENROLLMENT);
        self.base.form("snooze").submit_data(fields).await
    }

    pub async fn refuse_on_this_device(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::REFUSE_ADD_DEVICE);
        self.base
            .form("refuse_on_this_device")
            .submit_data(fields)
            .await
    }
}

pub struct MfaWebAuthnRoamingEnrollment {
    pub base: ScreenClient,
    pub data: Option<WebAuthnChallengeData>,
}

impl MfaWebAuthnRoamingEnrollment {
    pub const IDENTIFIER: &'static str = "mfa-webauthn-roaming-enrollment";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        let base = ScreenClient::open(store, sink, Self::IDENTIFIER)?;
        let data = WebAuthnChallengeData::from_screen(base.screen.raw());
        Ok(Self { base, data })
    }

    pub async fn submit_credential(
        &self,
        credential: Value,
        custom: Fields,
    ) -> Result<(), SubmitError> {
        if credential.is_null() {
            return Err(InputError::required("response").into());
        }
        let mut fields = custom;
        set_credential(&mut fields, &credential);
        fields.set("action", actions::DEFAULT);
        self.base
            .form("submit_credential")
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

pub struct MfaWebAuthnPlatformChallenge {
    pub base: ScreenClient,
    pub data: Option<WebAuthnChallengeData>,
}

impl MfaWebAuthnPlatformChallenge {
    pub const IDENTIFIER: &'static str = "mfa-webauthn-platform-challenge";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        let base = ScreenClient::open(store, sink, Self::IDENTIFIER)?;
        let data = WebAuthnChallengeData::from_screen(base.screen.raw());
        Ok(Self { base, data })
    }

    pub async fn verify(
        &self,
        credential: Value,
        remember_device: bool,
        custom: Fields,
    ) -> Result<(), SubmitError> {
        if credential.is_null() {
            return Err(InputError::required("response").into());
        }
        let mut fields = custom;
        set_credential(&mut fields, &credential);
        fields.set_if("rememberBrowser", remember_device, true);
        fields.set("action", actions::DEFAULT);
        self.base.form("verify").submit_data(fields).await
    }

    /// Reports the browser's ceremony error to the server for rendering.
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

pub struct MfaWebAuthnRoamingChallenge {
    pub base: ScreenClient,
    pub data: Option<WebAuthnChallengeData>,
}

impl MfaWebAuthnRoamingChallenge {
    pub const IDENTIFIER: &'static str = "mfa-webauthn-roaming-challenge";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        let base = ScreenClient::open(store, sink, Self::IDENTIFIER)?;
        let data = WebAuthnChallengeData::from_screen(base.screen.raw());
        Ok(Self { base, data })
    }

    pub async fn verify(
        &self,
        credential: Value,
        remember_device: bool,
        custom: Fields,
    ) -> Result<(), SubmitError> {
        if credential.is_null() {
            return Err(InputError::required("response").into());
        }
        let mut fields = custom;
        set_credential(&mut fields, &credential);
        fields.set_if("rememberBrowser", remember_device, true);
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

/// Current nickname of the key being renamed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyNicknameData {
    pub nickname: Option<String>,
}

impl KeyNicknameData {
    pub fn from_screen(screen: &ScreenContext) -> Option<Self> {
        let data = screen.data.as_ref()?;
        Some(Self {
            nickname: models::str_field(data, "nickname"),
        })
    }
}

pub struct MfaWebAuthnChangeKeyNickname {
    pub base: ScreenClient,
    pub data: Option<KeyNicknameData>,
}

impl MfaWebAuthnChangeKeyNickname {
    pub const IDENTIFIER: &'static str = "mfa-webauthn-change-key-nickname";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        let base = ScreenClient::open(store, sink, Self::IDENTIFIER)?;
        let data = KeyNicknameData::from_screen(base.screen.raw());
        Ok(Self { base, data })
    }

    pub async fn update_nickname(
        &self,
        nickname: impl Into<String>,
        custom: Fields,
    ) -> Result<(), SubmitError> {
        let nickname = nickname.into();
        if nickname.trim().is_empty() {
            return Err(InputError::required("nickname").into());
        }
        let mut fields = custom;
        fields.set("nickname", nickname);
        fields.set("action", actions::DEFAULT);
        self.base.form("update_nickname").submit_data(fields).await
    }
}

/// Success page after key enrollment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollmentSuccessData {
    pub nickname: Option<String>,
    pub webauthn_type: Option<String>,
}

impl EnrollmentSuccessData {
    pub fn from_screen(screen: &ScreenContext) -> Option<Self> {
        let data = screen.data.as_ref()?;
        Some(Self {
            nickname: models::str_field(data, "nickname"),
            webauthn_type: models::str_field(data, "webauthn_type"),
        })
    }
}

pub struct MfaWebAuthnEnrollmentSuccess {
    pub base: ScreenClient,
    pub data: Option<EnrollmentSuccessData>,
}

impl MfaWebAuthnEnrollmentSuccess {
    pub const IDENTIFIER: &'static str = "mfa-webauthn-enrollment-success";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        let base = ScreenClient::open(store, sink, Self::IDENTIFIER)?;
        let data = EnrollmentSuccessData::from_screen(base.screen.raw());
        Ok(Self { base, data })
    }

    pub async fn continue_login(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::DEFAULT);
        self.base.form("continue_login").submit_data(fields).await
    }
}

/// Recovery surface after a failed ceremony.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebAuthnErrorData {
    pub error_type: Option<String>,
    pub webauthn_type: Option<String>,
}

impl WebAuthnErrorData {
    pub fn from_screen(screen: &ScreenContext) -> Option<Self> {
        let data = screen.data.as_ref()?;
        Some(Self {
            error_type: models::str_field(data, "error_type"),
            webauthn_type: models::str_field(data, "webauthn_type"),
        })
    }
}

pub struct MfaWebAuthnError {
    pub base: ScreenClient,
    pub data: Option<WebAuthnErrorData>,
}

impl MfaWebAuthnError {
    pub const IDENTIFIER: &'static str = "mfa-webauthn-error";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        let base = ScreenClient::open(store, sink, Self::IDENTIFIER)?;
        let data = WebAuthnErrorData::from_screen(base.screen.raw());
        Ok(Self { base, data })
    }

    pub async fn try_again(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::TRY_AGAIN);
        self.base.form("try_again").submit_data(fields).await
    }

    pub async fn use_password(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::USE_PASSWORD);
        self.base.form("use_password").submit_data(fields).await
    }

    pub async fn try_another_method(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::PICK_AUTHENTICATOR);
        self.base
            .form("try_another_method")
            .submit_data(fields)
            .await
    }

    pub async fn no_thanks(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::REFUSE_ADD_DEVICE);
        self.base.form("no_thanks").submit_data(fields).await
    }
}

pub struct MfaWebAuthnNotAvailableError {
    pub base: ScreenClient,
}

impl MfaWebAuthnNotAvailableError {
    pub const IDENTIFIER: &'static str = "mfa-webauthn-not-available-error";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        Ok(Self {
            base: ScreenClient::open(store, sink, Self::IDENTIFIER)?,
        })
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
    async fn credential_rides_as_compact_json() {
        let store = store_with_screen_data(
            "mfa-webauthn-roaming-enrollment",
            "abc",
            json!({ "passkey": { "public_key": { "challenge": "xyz" } } }),
        );
        let (sink, recorder) = recording_pair();
        let screen = MfaWebAuthnRoamingEnrollment::new(&store, sink).unwrap();
        assert!(screen.data.as_ref().unwrap().passkey.is_some());

        screen
            .submit_credential(json!({ "id": "cred_1", "type": "public-key" }), Fields::new())
            .await
            .unwrap();

        let form = recorder.last().unwrap();
        let response: serde_json::Value =
            serde_json::from_str(form.get("response").unwrap()).unwrap();
        assert_eq!(response["id"], json!("cred_1"));
        assert_eq!(form.get("action"), Some("default"));
    }

    #[tokio::test]
    async fn browser_error_is_embedded_in_the_action() {
        let store = store_with_screen("mfa-webauthn-platform-challenge", "abc");
        let (sink, recorder) = recording_pair();
        let screen = MfaWebAuthnPlatformChallenge::new(&store, sink).unwrap();

        screen
            .report_browser_error(json!({ "name": "NotAllowedError" }), Fields::new())
            .await
            .unwrap();

        let action = recorder.last().unwrap().get("action").unwrap().to_owned();
        assert!(action.starts_with("showError::"));
        assert!(action.contains("NotAllowedError"));
    }

    #[tokio::test]
    async fn nickname_must_be_present() {
        let store = store_with_screen_data(
            "mfa-webauthn-change-key-nickname",
            "abc",
            json!({ "nickname": "Work key" }),
        );
        let (sink, recorder) = recording_pair();
        let screen = MfaWebAuthnChangeKeyNickname::new(&store, sink).unwrap();

        let err = screen
            .update_nickname("   ", Fields::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::Input(_)));
        assert!(recorder.submissions().is_empty());

        screen
            .update_nickname("Home key", Fields::new())
            .await
            .unwrap();
        assert_eq!(recorder.last().unwrap().get("nickname"), Some("Home key"));
    }
}
