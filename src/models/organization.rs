//! The organization slice, present when the transaction is org-scoped.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizationContext {
    pub id: Option<String>,
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub branding: Option<Map<String, Value>>,
    pub metadata: Option<Map<String, Value>>,
    pub usage: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Normalized view over [`OrganizationContext`].
#[derive(Debug, Clone, Default)]
pub struct Organization {
    raw: OrganizationContext,
}

impl Organization {
    pub fn new(raw: Option<OrganizationContext>) -> Self {
        Self {
            raw: raw.unwrap_or_default(),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.raw.id.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.raw.name.as_deref()
    }

    pub fn display_name(&self) -> Option<&str> {
        self.raw.display_name.as_deref()
    }

    pub fn branding(&self) -> Option<&Map<String, Value>> {
        self.raw.branding.as_ref()
    }

    pub fn metadata(&self) -> Option<&Map<String, Value>> {
        self.raw.metadata.as_ref()
    }

    pub fn usage(&self) -> Option<&str> {
        self.raw.usage.as_deref()
    }
}
