//! The screen slice: name, navigation links, localized texts, captcha, and
//! the opaque `data` map that per-screen projections narrow.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScreenContext {
    pub name: Option<String>,
    pub links: Option<ScreenLinks>,
    pub texts: Option<Map<String, Value>>,
    pub captcha: Option<CaptchaContext>,
    pub data: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScreenLinks {
    pub login: Option<String>,
    pub signup: Option<String>,
    pub reset_password: Option<String>,
    pub forgot_password: Option<String>,
    pub back: Option<String>,
    pub edit_identifier: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptchaContext {
    pub provider: Option<String>,
    #[serde(rename = "siteKey")]
    pub site_key: Option<String>,
    pub image: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Normalized view over [`ScreenContext`].
#[derive(Debug, Clone, Default)]
pub struct Screen {
    raw: ScreenContext,
}

impl Screen {
    pub fn new(raw: Option<ScreenContext>) -> Self {
        Self {
            raw: raw.unwrap_or_default(),
        }
    }

    /// The raw slice, for per-screen data projections.
    pub fn raw(&self) -> &ScreenContext {
        &self.raw
    }

    pub fn name(&self) -> Option<&str> {
        self.raw.name.as_deref()
    }

    pub fn links(&self) -> Option<&ScreenLinks> {
        self.raw.links.as_ref()
    }

    pub fn login_link(&self) -> Option<&str> {
        self.raw.links.as_ref()?.login.as_deref()
    }

    pub fn signup_link(&self) -> Option<&str> {
        self.raw.links.as_ref()?.signup.as_deref()
    }

    pub fn reset_password_link(&self) -> Option<&str> {
        self.raw.links.as_ref()?.reset_password.as_deref()
    }

    pub fn back_link(&self) -> Option<&str> {
        self.raw.links.as_ref()?.back.as_deref()
    }

    pub fn edit_identifier_link(&self) -> Option<&str> {
        self.raw.links.as_ref()?.edit_identifier.as_deref()
    }

    /// Localized text table for the rendered screen.
    pub fn texts(&self) -> Option<&Map<String, Value>> {
        self.raw.texts.as_ref()
    }

    pub fn captcha(&self) -> Option<&CaptchaContext> {
        self.raw.captcha.as_ref()
    }

    pub fn has_captcha(&self) -> bool {
        self.raw.captcha.is_some()
    }

    /// Screen-specific payload; shape varies per screen.
    pub fn data(&self) -> Option<&Map<String, Value>> {
        self.raw.data.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn links_reach_through_and_default_to_none() {
        let screen = Screen::new(Some(
            serde_json::from_value(json!({
                "name": "login-id",
                "links": { "signup": "/u/signup", "reset_password": "/u/reset" }
            }))
            .unwrap(),
        ));

        assert_eq!(screen.name(), Some("login-id"));
        assert_eq!(screen.signup_link(), Some("/u/signup"));
        assert_eq!(screen.reset_password_link(), Some("/u/reset"));
        assert!(screen.back_link().is_none());
        assert!(!screen.has_captcha());
    }

    #[test]
    fn data_map_passes_through_untouched() {
        let screen = Screen::new(Some(
            serde_json::from_value(json!({
                "name": "mfa-sms-challenge",
                "data": { "phone_number": "+15551234", "show_link_voice": true }
            }))
            .unwrap(),
        ));

        let data = screen.data().unwrap();
        assert_eq!(data["phone_number"], json!("+15551234"));
        assert_eq!(data["show_link_voice"], json!(true));
    }
}
