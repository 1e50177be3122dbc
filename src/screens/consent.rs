//! OAuth consent screen: the user grants or declines the requested scopes.

use std::sync::Arc;

use serde_json::Value;

use crate::context::ContextStore;
use crate::error::{ContextError, SubmitError};
use crate::form::Fields;
use crate::models::ScreenContext;
use crate::screens::{actions, ScreenClient};
use crate::sink::SubmissionSink;

/// One requested scope, normalized: the description defaults to empty and
/// `values` falls back to the scope name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub name: String,
    pub description: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsentData {
    pub scopes: Vec<Scope>,
}

impl ConsentData {
    pub fn from_screen(screen: &ScreenContext) -> Option<Self> {
        let data = screen.data.as_ref()?;
        let raw_scopes = data.get("scopes").and_then(Value::as_array)?;

        let scopes = raw_scopes
            .iter()
            .filter_map(|scope| {
                let name = scope.get("name")?.as_str()?.to_owned();
                let description = scope
                    .get("description")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_owned();
                let values = match scope.get("values").and_then(Value::as_array) {
                    Some(values) => values
                        .iter()
                        .filter_map(|v| v.as_str().map(str::to_owned))
                        .collect(),
                    None => vec![name.clone()],
                };
                Some(Scope {
                    name,
                    description,
                    values,
                })
            })
            .collect();

        Some(Self { scopes })
    }
}

pub struct Consent {
    pub base: ScreenClient,
    pub data: Option<ConsentData>,
}

impl Consent {
    pub const IDENTIFIER: &'static str = "consent";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        let base = ScreenClient::open(store, sink, Self::IDENTIFIER)?;
        let data = ConsentData::from_screen(base.screen.raw());
        Ok(Self { base, data })
    }

    pub async fn accept(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::ACCEPT);
        self.base.form("accept").submit_data(fields).await
    }

    pub async fn deny(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::DENY);
        self.base.form("deny").submit_data(fields).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{recording_pair, store_with_screen_data};
    use serde_json::json;

    #[test]
    fn scopes_are_normalized() {
        let screen: ScreenContext = serde_json::from_value(json!({
            "name": "consent",
            "data": {
                "scopes": [
                    { "name": "read:contacts", "description": "Read contacts", "values": ["read"] },
                    { "name": "openid" },
                    { "description": "dropped, no name" }
                ]
            }
        }))
        .unwrap();

        let data = ConsentData::from_screen(&screen).unwrap();
        assert_eq!(data.scopes.len(), 2);
        assert_eq!(data.scopes[0].values, ["read"]);
        assert_eq!(data.scopes[1].description, "");
        assert_eq!(data.scopes[1].values, ["openid"]);
    }

    #[tokio::test]
    async fn accept_overrides_caller_action() {
        let store =
            store_with_screen_data("consent", "abc", json!({ "scopes": [{ "name": "openid" }] }));
        let (sink, recorder) = recording_pair();
        let screen = Consent::new(&store, sink).unwrap();

        let mut custom = Fields::new();
        custom.set("action", "sneaky");
        screen.accept(custom).await.unwrap();
        assert_eq!(recorder.last().unwrap().get("action"), Some("accept"));
    }
}
