//! The tenant slice: deployment-wide names and enabled capabilities.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TenantContext {
    pub name: Option<String>,
    pub friendly_name: Option<String>,
    pub enabled_locales: Option<Vec<String>>,
    pub enabled_factors: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Normalized view over [`TenantContext`].
#[derive(Debug, Clone, Default)]
pub struct Tenant {
    raw: TenantContext,
}

impl Tenant {
    pub fn new(raw: Option<TenantContext>) -> Self {
        Self {
            raw: raw.unwrap_or_default(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.raw.name.as_deref()
    }

    pub fn friendly_name(&self) -> Option<&str> {
        self.raw.friendly_name.as_deref()
    }

    /// Locales the tenant can render; empty when the slice is absent.
    pub fn enabled_locales(&self) -> &[String] {
        self.raw.enabled_locales.as_deref().unwrap_or_default()
    }

    /// Factors the tenant has switched on; empty when the slice is absent.
    pub fn enabled_factors(&self) -> &[String] {
        self.raw.enabled_factors.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_accessors_default_to_empty() {
        let tenant = Tenant::new(None);
        assert!(tenant.enabled_locales().is_empty());
        assert!(tenant.enabled_factors().is_empty());

        let tenant = Tenant::new(Some(
            serde_json::from_value(json!({
                "friendly_name": "Acme",
                "enabled_factors": ["otp", "push-notification"]
            }))
            .unwrap(),
        ));
        assert_eq!(tenant.friendly_name(), Some("Acme"));
        assert_eq!(tenant.enabled_factors(), ["otp", "push-notification"]);
    }
}
