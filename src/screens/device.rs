//! Device authorization flow: code entry on a browser-equipped device and
//! the confirmation screen that follows.

use std::sync::Arc;

use crate::context::ContextStore;
use crate::error::{ContextError, InputError, SubmitError};
use crate::form::Fields;
use crate::models::{self, ScreenContext};
use crate::screens::{actions, ScreenClient};
use crate::sink::SubmissionSink;

use super::login::CodeOptions;

/// Entry of the user code shown on the limited-input device.
pub struct DeviceCodeActivation {
    pub base: ScreenClient,
}

impl DeviceCodeActivation {
    pub const IDENTIFIER: &'static str = "device-code-activation";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        Ok(Self {
            base: ScreenClient::open(store, sink, Self::IDENTIFIER)?,
        })
    }

    pub async fn confirm_code(&self, options: CodeOptions) -> Result<(), SubmitError> {
        if options.code.trim().is_empty() {
            return Err(InputError::required("code").into());
        }
        let mut fields = options.custom;
        fields.set("code", options.code);
        fields.set("action", actions::DEFAULT);
        self.base.form("confirm_code").submit_data(fields).await
    }
}

/// Confirmation that the displayed code matches the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfirmationData {
    pub text_code: Option<String>,
}

impl DeviceConfirmationData {
    pub fn from_screen(screen: &ScreenContext) -> Option<Self> {
        let data = screen.data.as_ref()?;
        Some(Self {
            text_code: models::str_field(data, "text_code"),
        })
    }
}

pub struct DeviceCodeConfirmation {
    pub base: ScreenClient,
    pub data: Option<DeviceConfirmationData>,
}

impl DeviceCodeConfirmation {
    pub const IDENTIFIER: &'static str = "device-code-confirmation";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        let base = ScreenClient::open(store, sink, Self::IDENTIFIER)?;
        let data = DeviceConfirmationData::from_screen(base.screen.raw());
        Ok(Self { base, data })
    }

    pub async fn confirm(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::CONFIRM);
        self.base.form("confirm").submit_data(fields).await
    }

    pub async fn cancel(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::CANCEL);
        self.base.form("cancel").submit_data(fields).await
    }
}
