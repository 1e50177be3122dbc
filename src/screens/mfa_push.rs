//! Push-notification MFA: welcome/enrollment, the waiting screen that polls
//! for approval, and the device list.

use std::sync::Arc;

use serde_json::Value;

use crate::context::ContextStore;
use crate::error::{ContextError, SubmitError};
use crate::form::Fields;
use crate::models::{self, ScreenContext};
use crate::polling::{start_polling, PollTransport, PollingControl, PollingOptions};
use crate::screens::{actions, ScreenClient};
use crate::sink::SubmissionSink;

/// Store links for installing the authenticator app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushWelcomeData {
    pub ios_url: Option<String>,
    pub android_url: Option<String>,
}

impl PushWelcomeData {
    pub fn from_screen(screen: &ScreenContext) -> Option<Self> {
        let data = screen.data.as_ref()?;
        Some(Self {
            ios_url: models::str_field(data, "ios_url"),
            android_url: models::str_field(data, "android_url"),
        })
    }
}

pub struct MfaPushWelcome {
    pub base: ScreenClient,
    pub data: Option<PushWelcomeData>,
}

impl MfaPushWelcome {
    pub const IDENTIFIER: &'static str = "mfa-push-welcome";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        let base = ScreenClient::open(store, sink, Self::IDENTIFIER)?;
        let data = PushWelcomeData::from_screen(base.screen.raw());
        Ok(Self { base, data })
    }

    pub async fn enroll(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::ENROLL);
        self.base.form("enroll").submit_data(fields).await
    }

    pub async fn pick_authenticator(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::PICK_AUTHENTICATOR);
        self.base
            .form("pick_authenticator")
            .submit_data(fields)
            .await
    }
}

/// Waiting screen shown while a push notification is pending on the user's
/// device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushChallengeData {
    pub device_name: Option<String>,
    pub show_remember_device: bool,
}

impl PushChallengeData {
    pub fn from_screen(screen: &ScreenContext) -> Option<Self> {
        let data = screen.data.as_ref()?;
        Some(Self {
            device_name: models::str_field(data, "device_name"),
            show_remember_device: models::flag_field(data, "show_remember_device"),
        })
    }
}

pub struct MfaPushChallengePush {
    pub base: ScreenClient,
    pub data: Option<PushChallengeData>,
}

impl MfaPushChallengePush {
    pub const IDENTIFIER: &'static str = "mfa-push-challenge-push";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        let base = ScreenClient::open(store, sink, Self::IDENTIFIER)?;
        let data = PushChallengeData::from_screen(base.screen.raw());
        Ok(Self { base, data })
    }

    /// Reloads the page to pick up an approval that already happened. The
    /// remember flag is always carried here, `false` included — this
    /// endpoint expects it.
    pub async fn continue_challenge(
        &self,
        remember_device: bool,
        custom: Fields,
    ) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("rememberDevice", remember_device);
        fields.set("action", actions::CONTINUE);
        self.base
            .form("continue_challenge")
            .submit_data(fields)
            .await
    }

    pub async fn resend_notification(
        &self,
        remember_device: bool,
        custom: Fields,
    ) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("rememberDevice", remember_device);
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

    /// Starts polling `url` until the server reports the challenge
    /// completed (`body.completed == true` unless the options say
    /// otherwise). Returns the cancellation handle.
    pub fn poll_status(
        &self,
        transport: Arc<dyn PollTransport>,
        url: impl Into<String>,
        options: PollingOptions,
    ) -> PollingControl {
        start_polling(transport, url, options)
    }
}

/// List of devices enrolled for push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushListData {
    pub enrolled_devices: Vec<String>,
}

impl PushListData {
    pub fn from_screen(screen: &ScreenContext) -> Option<Self> {
        let data = screen.data.as_ref()?;
        let enrolled_devices = data
            .get("enrolled_devices")
            .and_then(Value::as_array)?
            .iter()
            .filter_map(|d| d.as_str().map(str::to_owned))
            .collect();
        Some(Self { enrolled_devices })
    }
}

pub struct MfaPushList {
    pub base: ScreenClient,
    pub data: Option<PushListData>,
}

impl MfaPushList {
    pub const IDENTIFIER: &'static str = "mfa-push-list";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        let base = ScreenClient::open(store, sink, Self::IDENTIFIER)?;
        let data = PushListData::from_screen(base.screen.raw());
        Ok(Self { base, data })
    }

    /// Selects by position in `enrolled_devices`.
    pub async fn select_device(&self, index: usize, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::selection(index));
        self.base.form("select_device").submit_data(fields).await
    }

    pub async fn go_back(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::BACK);
        self.base.form("go_back").submit_data(fields).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{recording_pair, store_with_screen_data};
    use serde_json::json;

    #[test]
    fn push_data_renames_device_fields() {
        let screen: ScreenContext = serde_json::from_value(json!({
            "name": "mfa-push-challenge-push",
            "data": { "device_name": "Pixel 9", "show_remember_device": true }
        }))
        .unwrap();

        let data = PushChallengeData::from_screen(&screen).unwrap();
        assert_eq!(data.device_name.as_deref(), Some("Pixel 9"));
        assert!(data.show_remember_device);
    }

    #[tokio::test]
    async fn continue_always_carries_remember_device() {
        let store = store_with_screen_data(
            "mfa-push-challenge-push",
            "abc",
            json!({ "device_name": "Pixel 9" }),
        );
        let (sink, recorder) = recording_pair();
        let screen = MfaPushChallengePush::new(&store, sink).unwrap();

        screen
            .continue_challenge(false, Fields::new())
            .await
            .unwrap();
        let form = recorder.last().unwrap();
        assert_eq!(form.get("rememberDevice"), Some("false"));
        assert_eq!(form.get("action"), Some("continue"));

        screen
            .resend_notification(true, Fields::new())
            .await
            .unwrap();
        let form = recorder.last().unwrap();
        assert_eq!(form.get("rememberDevice"), Some("true"));
        assert_eq!(form.get("action"), Some("resend"));
    }

    #[tokio::test]
    async fn device_selection_is_positional() {
        let store = store_with_screen_data(
            "mfa-push-list",
            "abc",
            json!({ "enrolled_devices": ["Pixel 9", "iPad"] }),
        );
        let (sink, recorder) = recording_pair();
        let screen = MfaPushList::new(&store, sink).unwrap();

        screen.select_device(0, Fields::new()).await.unwrap();
        assert_eq!(
            recorder.last().unwrap().get("action"),
            Some("selection-action::0")
        );
    }
}
