//! The prompt slice: which flow family the rendered screen belongs to.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptContext {
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Normalized view over [`PromptContext`].
#[derive(Debug, Clone, Default)]
pub struct Prompt {
    raw: PromptContext,
}

impl Prompt {
    pub fn new(raw: Option<PromptContext>) -> Self {
        Self {
            raw: raw.unwrap_or_default(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.raw.name.as_deref()
    }
}
