//! The untrusted-data slice: values that originate from the client side of
//! a previous round trip. Nothing here is server-verified; treat every
//! value as display-only input.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UntrustedDataContext {
    /// Echo of the previous form POST, arbitrary keys. Custom fields carry
    /// an `ulp_` prefix on the wire; the prefix is preserved here.
    pub submitted_form_data: Option<Map<String, Value>>,
    /// Query parameters forwarded from the authorization request.
    pub authorization_params: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Authorization parameters with the well-known keys pulled out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizationParams {
    pub login_hint: Option<String>,
    pub screen_hint: Option<String>,
    pub ui_locales: Option<String>,
    /// `ext-`-prefixed extension parameters, key → raw value.
    pub extensions: Vec<(String, String)>,
}

/// Normalized view over [`UntrustedDataContext`].
#[derive(Debug, Clone, Default)]
pub struct UntrustedData {
    raw: UntrustedDataContext,
}

impl UntrustedData {
    pub fn new(raw: Option<UntrustedDataContext>) -> Self {
        Self {
            raw: raw.unwrap_or_default(),
        }
    }

    /// The raw slice, for screens that derive narrower projections.
    pub fn raw(&self) -> &UntrustedDataContext {
        &self.raw
    }

    /// The previous submission's fields, or `None` when there was none.
    pub fn submitted_form_data(&self) -> Option<&Map<String, Value>> {
        self.raw.submitted_form_data.as_ref()
    }

    /// Extracts the well-known authorization parameters. `None` when the
    /// block is absent entirely.
    pub fn authorization_params(&self) -> Option<AuthorizationParams> {
        let params = self.raw.authorization_params.as_ref()?;

        let get = |key: &str| params.get(key).and_then(Value::as_str).map(str::to_owned);
        let extensions = params
            .iter()
            .filter(|(k, _)| k.starts_with("ext-"))
            .filter_map(|(k, v)| Some((k.clone(), v.as_str()?.to_owned())))
            .collect();

        Some(AuthorizationParams {
            login_hint: get("login_hint"),
            screen_hint: get("screen_hint"),
            ui_locales: get("ui_locales"),
            extensions,
        })
    }
}
