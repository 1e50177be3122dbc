//! Typed views over the raw screen context.
//!
//! The raw tree arrives as snake_case JSON. Each slice gets two layers: a
//! serde struct mirroring the wire shape (`*Context`, all fields optional,
//! unknown keys kept in a flattened `extra` map) and a normalized view that
//! fills documented defaults. Absent fields surface as `None` or the
//! documented default; accessors never fail.

mod branding;
mod client;
mod organization;
mod prompt;
mod screen;
mod tenant;
mod transaction;
mod untrusted_data;
mod user;

pub use branding::{
    Branding, BrandingColors, BrandingContext, BrandingFont, BrandingSettings, BrandingThemes,
};
pub use client::{Client, ClientContext};
pub use organization::{Organization, OrganizationContext};
pub use prompt::{Prompt, PromptContext};
pub use screen::{CaptchaContext, Screen, ScreenContext, ScreenLinks};
pub use tenant::{Tenant, TenantContext};
pub use transaction::{
    Connection, ConnectionContext, ConnectionOptions, CountryCode, RawCountryCode,
    RawTransactionError, Transaction, TransactionContext, TransactionError,
};
pub use untrusted_data::{AuthorizationParams, UntrustedData, UntrustedDataContext};
pub use user::{
    EnrolledFactor, RawEnrolledDevice, RawUserOrganization, User, UserContext, UserOrganization,
};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The full server-embedded context for one page view.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawContext {
    pub branding: Option<BrandingContext>,
    pub client: Option<ClientContext>,
    pub prompt: Option<PromptContext>,
    pub screen: Option<ScreenContext>,
    pub organization: Option<OrganizationContext>,
    pub transaction: Option<TransactionContext>,
    pub user: Option<UserContext>,
    pub tenant: Option<TenantContext>,
    pub untrusted_data: Option<UntrustedDataContext>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawContext {
    /// The rendered screen's canonical name, if any.
    pub fn screen_name(&self) -> Option<&str> {
        self.screen.as_ref().and_then(|s| s.name.as_deref())
    }

    /// Returns one named top-level slice re-serialized as JSON, or `None`.
    pub fn slice(&self, key: &str) -> Option<Value> {
        let value = match key {
            "branding" => serde_json::to_value(self.branding.as_ref()?),
            "client" => serde_json::to_value(self.client.as_ref()?),
            "prompt" => serde_json::to_value(self.prompt.as_ref()?),
            "screen" => serde_json::to_value(self.screen.as_ref()?),
            "organization" => serde_json::to_value(self.organization.as_ref()?),
            "transaction" => serde_json::to_value(self.transaction.as_ref()?),
            "user" => serde_json::to_value(self.user.as_ref()?),
            "tenant" => serde_json::to_value(self.tenant.as_ref()?),
            "untrusted_data" => serde_json::to_value(self.untrusted_data.as_ref()?),
            other => return self.extra.get(other).cloned(),
        };
        value.ok()
    }
}

/// Reads a string field out of a raw `data` map.
pub(crate) fn str_field(data: &Map<String, Value>, key: &str) -> Option<String> {
    data.get(key).and_then(Value::as_str).map(str::to_owned)
}

/// Reads a boolean field; non-boolean values count as absent.
pub(crate) fn bool_field(data: &Map<String, Value>, key: &str) -> Option<bool> {
    data.get(key).and_then(Value::as_bool)
}

/// Reads a boolean field, defaulting absent or mistyped values to `false`.
pub(crate) fn flag_field(data: &Map<String, Value>, key: &str) -> bool {
    bool_field(data, key).unwrap_or(false)
}
