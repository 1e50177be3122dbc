//! Brute-force protection screens: requesting an account unblock email and
//! the follow-up page after it is sent.

use std::sync::Arc;

use crate::context::ContextStore;
use crate::error::{ContextError, SubmitError};
use crate::form::Fields;
use crate::models::{self, ScreenContext};
use crate::screens::{actions, ScreenClient};
use crate::sink::SubmissionSink;

pub struct BruteForceProtectionUnblock {
    pub base: ScreenClient,
}

impl BruteForceProtectionUnblock {
    pub const IDENTIFIER: &'static str = "brute-force-protection-unblock";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        Ok(Self {
            base: ScreenClient::open(store, sink, Self::IDENTIFIER)?,
        })
    }

    /// Requests the unblock email.
    pub async fn unblock_account(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::DEFAULT);
        self.base.form("unblock_account").submit_data(fields).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnblockSuccessData {
    pub status: Option<String>,
}

impl UnblockSuccessData {
    pub fn from_screen(screen: &ScreenContext) -> Option<Self> {
        let data = screen.data.as_ref()?;
        Some(Self {
            status: models::str_field(data, "status"),
        })
    }
}

pub struct BruteForceProtectionUnblockSuccess {
    pub base: ScreenClient,
    pub data: Option<UnblockSuccessData>,
}

impl BruteForceProtectionUnblockSuccess {
    pub const IDENTIFIER: &'static str = "brute-force-protection-unblock-success";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        let base = ScreenClient::open(store, sink, Self::IDENTIFIER)?;
        let data = UnblockSuccessData::from_screen(base.screen.raw());
        Ok(Self { base, data })
    }

    pub async fn resend_email(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::RESEND);
        self.base.form("resend_email").submit_data(fields).await
    }

    pub async fn cancel(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::CANCEL);
        self.base.form("cancel").submit_data(fields).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{recording_pair, store_with_screen};

    #[tokio::test]
    async fn unblock_submits_default_action() {
        let store = store_with_screen("brute-force-protection-unblock", "abc");
        let (sink, recorder) = recording_pair();
        let screen = BruteForceProtectionUnblock::new(&store, sink).unwrap();

        screen.unblock_account(Fields::new()).await.unwrap();
        let form = recorder.last().unwrap();
        assert_eq!(form.get("action"), Some("default"));
        assert_eq!(form.get("state"), Some("abc"));
    }
}
