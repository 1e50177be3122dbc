//! Recovery-code MFA: challenge entry, initial enrollment, and the
//! replacement-code screen.

use std::sync::Arc;

use crate::context::ContextStore;
use crate::error::{ContextError, InputError, SubmitError};
use crate::form::Fields;
use crate::models::{self, ScreenContext};
use crate::screens::{actions, ScreenClient};
use crate::sink::SubmissionSink;

use super::login::CodeOptions;

pub struct MfaRecoveryCodeChallenge {
    pub base: ScreenClient,
}

impl MfaRecoveryCodeChallenge {
    pub const IDENTIFIER: &'static str = "mfa-recovery-code-challenge";

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

/// The freshly issued recovery code the user must store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryCodeData {
    pub text_code: Option<String>,
}

impl RecoveryCodeData {
    pub fn from_screen(screen: &ScreenContext) -> Option<Self> {
        let data = screen.data.as_ref()?;
        Some(Self {
            text_code: models::str_field(data, "text_code"),
        })
    }
}

pub struct MfaRecoveryCodeEnrollment {
    pub base: ScreenClient,
    pub data: Option<RecoveryCodeData>,
}

impl MfaRecoveryCodeEnrollment {
    pub const IDENTIFIER: &'static str = "mfa-recovery-code-enrollment";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        let base = ScreenClient::open(store, sink, Self::IDENTIFIER)?;
        let data = RecoveryCodeData::from_screen(base.screen.raw());
        Ok(Self { base, data })
    }

    /// Confirms the user saved the code. The confirmation mirrors checkbox
    /// semantics on the wire: `saved: "on"` when true, omitted otherwise.
    pub async fn confirm_saved(
        &self,
        is_code_copied: bool,
        custom: Fields,
    ) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set_if("saved", is_code_copied, "on");
        fields.set("action", actions::DEFAULT);
        self.base.form("confirm_saved").submit_data(fields).await
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

pub struct MfaRecoveryCodeChallengeNewCode {
    pub base: ScreenClient,
    pub data: Option<RecoveryCodeData>,
}

impl MfaRecoveryCodeChallengeNewCode {
    pub const IDENTIFIER: &'static str = "mfa-recovery-code-challenge-new-code";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        let base = ScreenClient::open(store, sink, Self::IDENTIFIER)?;
        let data = RecoveryCodeData::from_screen(base.screen.raw());
        Ok(Self { base, data })
    }

    pub async fn confirm_saved(
        &self,
        is_code_copied: bool,
        custom: Fields,
    ) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set_if("saved", is_code_copied, "on");
        fields.set("action", actions::DEFAULT);
        self.base.form("confirm_saved").submit_data(fields).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{recording_pair, store_with_screen_data};
    use serde_json::json;

    #[tokio::test]
    async fn saved_flag_follows_checkbox_semantics() {
        let store = store_with_screen_data(
            "mfa-recovery-code-enrollment",
            "abc",
            json!({ "text_code": "ABCD-EFGH-IJKL" }),
        );
        let (sink, recorder) = recording_pair();
        let screen = MfaRecoveryCodeEnrollment::new(&store, sink).unwrap();
        assert_eq!(
            screen.data.as_ref().unwrap().text_code.as_deref(),
            Some("ABCD-EFGH-IJKL")
        );

        screen.confirm_saved(true, Fields::new()).await.unwrap();
        let form = recorder.last().unwrap();
        assert_eq!(form.get("saved"), Some("on"));

        screen.confirm_saved(false, Fields::new()).await.unwrap();
        let form = recorder.last().unwrap();
        assert_eq!(form.get("saved"), None);
        assert_eq!(form.get("action"), Some("default"));
    }
}
