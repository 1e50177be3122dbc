//! The application (client) slice of the context.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientContext {
    pub id: Option<String>,
    pub name: Option<String>,
    pub logo_uri: Option<String>,
    pub metadata: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Normalized view over [`ClientContext`].
#[derive(Debug, Clone, Default)]
pub struct Client {
    raw: ClientContext,
}

impl Client {
    pub fn new(raw: Option<ClientContext>) -> Self {
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

    pub fn logo_uri(&self) -> Option<&str> {
        self.raw.logo_uri.as_deref()
    }

    pub fn metadata(&self) -> Option<&Map<String, Value>> {
        self.raw.metadata.as_ref()
    }
}
