//! Passkey enrollment screens offered during login and signup.

use std::sync::Arc;

use serde_json::Value;

use crate::context::ContextStore;
use crate::error::{ContextError, InputError, SubmitError};
use crate::form::Fields;
use crate::models::ScreenContext;
use crate::screens::{actions, ScreenClient};
use crate::sink::SubmissionSink;

/// Creation options for the passkey ceremony.
#[derive(Debug, Clone, PartialEq)]
pub struct PasskeyEnrollmentData {
    pub passkey: Option<Value>,
}

impl PasskeyEnrollmentData {
    pub fn from_screen(screen: &ScreenContext) -> Option<Self> {
        let data = screen.data.as_ref()?;
        Some(Self {
            passkey: data.get("passkey").cloned(),
        })
    }
}

pub struct PasskeyEnrollment {
    pub base: ScreenClient,
    pub data: Option<PasskeyEnrollmentData>,
}

impl PasskeyEnrollment {
    pub const IDENTIFIER: &'static str = "passkey-enrollment";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        let base = ScreenClient::open(store, sink, Self::IDENTIFIER)?;
        let data = PasskeyEnrollmentData::from_screen(base.screen.raw());
        Ok(Self { base, data })
    }

    pub async fn continue_with_passkey(
        &self,
        credential: Value,
        custom: Fields,
    ) -> Result<(), SubmitError> {
        if credential.is_null() {
            return Err(InputError::required("passkey").into());
        }
        let mut fields = custom;
        fields.set(
            "passkey",
            serde_json::to_string(&credential).unwrap_or_default(),
        );
        fields.set("action", actions::DEFAULT);
        self.base
            .form("continue_with_passkey")
            .submit_data(fields)
            .await
    }

    pub async fn abort(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::ABORT_PASSKEY_ENROLLMENT);
        self.base.form("abort").submit_data(fields).await
    }
}

pub struct PasskeyEnrollmentLocal {
    pub base: ScreenClient,
    pub data: Option<PasskeyEnrollmentData>,
}

impl PasskeyEnrollmentLocal {
    pub const IDENTIFIER: &'static str = "passkey-enrollment-local";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        let base = ScreenClient::open(store, sink, Self::IDENTIFIER)?;
        let data = PasskeyEnrollmentData::from_screen(base.screen.raw());
        Ok(Self { base, data })
    }

    pub async fn continue_with_passkey(
        &self,
        credential: Value,
        custom: Fields,
    ) -> Result<(), SubmitError> {
        if credential.is_null() {
            return Err(InputError::required("passkey").into());
        }
        let mut fields = custom;
        fields.set(
            "passkey",
            serde_json::to_string(&credential).unwrap_or_default(),
        );
        fields.set("action", actions::DEFAULT);
        self.base
            .form("continue_with_passkey")
            .submit_data(fields)
            .await
    }

    /// Declines enrollment; `do_not_show_again` suppresses future offers
    /// on this device (checkbox semantics: `"on"` or omitted).
    pub async fn abort(
        &self,
        do_not_show_again: bool,
        custom: Fields,
    ) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set_if("dontShowAgain", do_not_show_again, "on");
        fields.set("action", actions::ABORT_PASSKEY_ENROLLMENT);
        self.base.form("abort").submit_data(fields).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{recording_pair, store_with_screen_data};
    use serde_json::json;

    #[tokio::test]
    async fn abort_carries_the_dont_show_again_checkbox() {
        let store = store_with_screen_data(
            "passkey-enrollment-local",
            "abc",
            json!({ "passkey": { "public_key": {} } }),
        );
        let (sink, recorder) = recording_pair();
        let screen = PasskeyEnrollmentLocal::new(&store, sink).unwrap();

        screen.abort(true, Fields::new()).await.unwrap();
        let form = recorder.last().unwrap();
        assert_eq!(form.get("dontShowAgain"), Some("on"));
        assert_eq!(form.get("action"), Some("abort-passkey-enrollment"));

        screen.abort(false, Fields::new()).await.unwrap();
        assert_eq!(recorder.last().unwrap().get("dontShowAgain"), None);
    }
}
