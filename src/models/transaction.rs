//! The transaction slice: continuation state, errors from the previous
//! submission, and the connection catalogue.
//!
//! This is the one view with normalization rules beyond camelCasing:
//! `errors` and the connection lists default to empty collections so callers
//! can iterate without checking for absence.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionContext {
    pub state: Option<String>,
    pub locale: Option<String>,
    pub errors: Option<Vec<RawTransactionError>>,
    pub country_code: Option<RawCountryCode>,
    pub connection: Option<ConnectionContext>,
    pub alternate_connections: Option<Vec<ConnectionContext>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTransactionError {
    pub code: Option<String>,
    pub field: Option<String>,
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCountryCode {
    pub code: Option<String>,
    pub prefix: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionContext {
    pub name: Option<String>,
    pub strategy: Option<String>,
    pub metadata: Option<Map<String, Value>>,
    pub options: Option<ConnectionOptions>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionOptions {
    pub signup_enabled: Option<bool>,
    pub forgot_password_enabled: Option<bool>,
    pub username_required: Option<bool>,
    pub icon_url: Option<String>,
    pub display_name: Option<String>,
    pub show_as_button: Option<bool>,
    pub authentication_methods: Option<Value>,
    pub attributes: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A server-reported validation outcome from the previous submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionError {
    pub code: String,
    pub field: Option<String>,
    pub message: String,
}

/// A usable connection, normalized for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub name: String,
    pub strategy: Option<String>,
    pub display_name: Option<String>,
    pub icon_url: Option<String>,
    pub show_as_button: Option<bool>,
}

/// The dialing-code pair for phone-based screens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryCode {
    pub code: String,
    pub prefix: String,
}

/// Normalized view over [`TransactionContext`].
#[derive(Debug, Clone, Default)]
pub struct Transaction {
    raw: TransactionContext,
    errors: Vec<TransactionError>,
    alternate_connections: Vec<Connection>,
}

impl Transaction {
    pub fn new(raw: Option<TransactionContext>) -> Self {
        let raw = raw.unwrap_or_default();
        let errors = Self::collect_errors(&raw);
        let alternate_connections = Self::collect_alternates(&raw);
        Self {
            raw,
            errors,
            alternate_connections,
        }
    }

    fn collect_errors(raw: &TransactionContext) -> Vec<TransactionError> {
        raw.errors
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|e| TransactionError {
                code: e.code.clone().unwrap_or_default(),
                field: e.field.clone(),
                message: e.message.clone().unwrap_or_default(),
            })
            .collect()
    }

    fn collect_alternates(raw: &TransactionContext) -> Vec<Connection> {
        raw.alternate_connections
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter_map(Self::normalize_connection)
            .collect()
    }

    fn normalize_connection(ctx: &ConnectionContext) -> Option<Connection> {
        let name = ctx.name.clone()?;
        let options = ctx.options.as_ref();
        Some(Connection {
            name,
            strategy: ctx.strategy.clone(),
            display_name: options.and_then(|o| o.display_name.clone()),
            icon_url: options.and_then(|o| o.icon_url.clone()),
            show_as_button: options.and_then(|o| o.show_as_button),
        })
    }

    /// The raw slice, for screens that derive narrower projections.
    pub fn raw(&self) -> &TransactionContext {
        &self.raw
    }

    /// The opaque continuation token. `None` only on malformed contexts;
    /// submission fails with a missing-state error in that case.
    pub fn state(&self) -> Option<&str> {
        self.raw.state.as_deref()
    }

    pub fn locale(&self) -> Option<&str> {
        self.raw.locale.as_deref()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Errors from the previous round trip; empty when the server reported
    /// none.
    pub fn errors(&self) -> &[TransactionError] {
        &self.errors
    }

    pub fn country_code(&self) -> Option<CountryCode> {
        let cc = self.raw.country_code.as_ref()?;
        Some(CountryCode {
            code: cc.code.clone()?,
            prefix: cc.prefix.clone().unwrap_or_default(),
        })
    }

    pub fn connection_strategy(&self) -> Option<String> {
        self.raw
            .connection
            .as_ref()?
            .strategy
            .as_ref()
            .map(|s| s.to_lowercase())
    }

    pub fn current_connection(&self) -> Option<Connection> {
        self.raw.connection.as_ref().and_then(Self::normalize_connection)
    }

    /// Other connections the user could switch to; empty when absent.
    pub fn alternate_connections(&self) -> &[Connection] {
        &self.alternate_connections
    }

    pub fn is_signup_enabled(&self) -> bool {
        self.connection_option(|o| o.signup_enabled)
    }

    pub fn is_forgot_password_enabled(&self) -> bool {
        self.connection_option(|o| o.forgot_password_enabled)
    }

    pub fn is_username_required(&self) -> bool {
        self.connection_option(|o| o.username_required)
    }

    fn connection_option(&self, pick: impl Fn(&ConnectionOptions) -> Option<bool>) -> bool {
        self.raw
            .connection
            .as_ref()
            .and_then(|c| c.options.as_ref())
            .and_then(pick)
            .unwrap_or(false)
    }

    /// The connection's username validation block, raw. Feed to
    /// [`crate::validation::UsernamePolicy::from_value`].
    pub fn username_validation(&self) -> Option<&Value> {
        let attributes = self
            .raw
            .connection
            .as_ref()?
            .options
            .as_ref()?
            .attributes
            .as_ref()?;
        attributes.get("username")?.get("validation")
    }
}
