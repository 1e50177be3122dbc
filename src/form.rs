//! Payload assembly for screen submissions.
//!
//! Every action funnels through here: caller fields first, protocol fields
//! last, then `state` and the telemetry tag, then the sink. Field order is
//! part of the contract — a caller-supplied `action` is displaced by the
//! protocol's own, not merged with it.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::error::SubmitError;
use crate::sink::SubmissionSink;

/// Form field name carrying the diagnostic tag on every submission.
pub const TELEMETRY_FIELD: &str = "x-acul-sdk-analytics";

pub(crate) const SDK_NAME: &str = env!("CARGO_PKG_NAME");
pub(crate) const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// An insertion-ordered field map.
///
/// `set` removes any existing entry for the key and appends the new one, so
/// later writers win both the value and the position. That property backs
/// the "protocol fields are applied last" rule.
#[derive(Debug, Clone, Default)]
pub struct Fields(Vec<(String, Value)>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let key = key.into();
        self.0.retain(|(k, _)| *k != key);
        self.0.push((key, value.into()));
        self
    }

    /// Sets the key only when the flag is true; omission encodes "unset".
    pub fn set_if(&mut self, key: impl Into<String>, on: bool, value: impl Into<Value>) -> &mut Self {
        if on {
            self.set(key, value);
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn extend(&mut self, other: Fields) -> &mut Self {
        for (k, v) in other.0 {
            self.set(k, v);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Fields {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut fields = Fields::new();
        for (k, v) in iter {
            fields.set(k, v);
        }
        fields
    }
}

/// Diagnostic tag attached to every submission: which build of the SDK sent
/// it, from which screen, via which method. Observability only.
#[derive(Debug, Clone, Serialize)]
pub struct Telemetry {
    #[serde(rename = "sdkVersion")]
    pub sdk_version: &'static str,
    #[serde(rename = "sdkName")]
    pub sdk_name: &'static str,
    #[serde(rename = "screenName")]
    pub screen_name: String,
    #[serde(rename = "methodName")]
    pub method_name: String,
}

impl Telemetry {
    pub fn new(screen_name: impl Into<String>, method_name: impl Into<String>) -> Self {
        Self {
            sdk_version: SDK_VERSION,
            sdk_name: SDK_NAME,
            screen_name: screen_name.into(),
            method_name: method_name.into(),
        }
    }

    pub fn encode(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Submission settings for one action.
#[derive(Debug, Clone, Default)]
pub struct FormOptions {
    /// The transaction's continuation token; required on every submission.
    pub state: Option<String>,
    pub telemetry: Option<Telemetry>,
    /// Explicit target path. Empty/absent resolves to the current page at
    /// the sink.
    pub route: Option<String>,
}

/// A fully assembled form: target route plus stringified fields in
/// submission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedForm {
    pub route: String,
    pub fields: Vec<(String, String)>,
}

impl PreparedForm {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// The `application/x-www-form-urlencoded` body.
    pub fn encode(&self) -> String {
        self.fields
            .iter()
            .map(|(k, v)| {
                format!(
                    "{}={}",
                    urlencoding::encode(k),
                    urlencoding::encode(v)
                )
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Turns one flat payload into a POST through the configured sink.
pub struct FormHandler {
    options: FormOptions,
    sink: Arc<dyn SubmissionSink>,
}

impl FormHandler {
    pub fn new(options: FormOptions, sink: Arc<dyn SubmissionSink>) -> Self {
        Self { options, sink }
    }

    /// Stringifies one field value. `null` becomes the empty string, never
    /// the literal `"null"`; compound values are carried as compact JSON.
    fn stringify(value: &Value) -> String {
        match value {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            other => serde_json::to_string(other).unwrap_or_default(),
        }
    }

    /// Pure assembly step: stringify `fields` against a route. No state or
    /// telemetry is added here.
    pub fn build_form(route: Option<&str>, fields: &Fields) -> PreparedForm {
        PreparedForm {
            route: route.unwrap_or_default().to_owned(),
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_owned(), Self::stringify(v)))
                .collect(),
        }
    }

    /// Merges the continuation state and telemetry tag into `fields`, then
    /// submits through the sink. The sink call is expected to end the page
    /// lifecycle on success; callers should not sequence further actions
    /// after it.
    pub async fn submit_data(&self, mut fields: Fields) -> Result<(), SubmitError> {
        let state = self
            .options
            .state
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(SubmitError::MissingState)?;
        fields.set("state", state);

        if let Some(telemetry) = &self.options.telemetry {
            fields.set(TELEMETRY_FIELD, telemetry.encode());
        }

        let form = Self::build_form(self.options.route.as_deref(), &fields);
        tracing::debug!(
            route = %form.route,
            fields = form.fields.len(),
            "submitting form"
        );
        self.sink.submit(&form).await.map_err(SubmitError::Transport)
    }
}
