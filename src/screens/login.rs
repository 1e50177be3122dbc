//! Identifier and password entry screens, including the passwordless code
//! variants.

use std::sync::Arc;

use serde_json::Value;

use crate::context::ContextStore;
use crate::error::{ContextError, InputError, SubmitError};
use crate::form::Fields;
use crate::models::TransactionContext;
use crate::screens::{actions, ScreenClient};
use crate::sink::SubmissionSink;

/// Identifier kinds a connection accepts, derived from the connection's
/// attribute table. Pure; unit-testable without a handler.
pub fn allowed_identifiers(transaction: &TransactionContext) -> Vec<String> {
    let attributes = transaction
        .connection
        .as_ref()
        .and_then(|c| c.options.as_ref())
        .and_then(|o| o.attributes.as_ref())
        .and_then(Value::as_object);

    let Some(attributes) = attributes else {
        return Vec::new();
    };

    ["email", "username", "phone"]
        .iter()
        .filter(|key| attributes.contains_key(**key))
        .map(|key| (*key).to_owned())
        .collect()
}

pub struct LoginOptions {
    pub username: String,
    pub password: String,
    pub captcha: Option<String>,
    pub custom: Fields,
}

pub struct FederatedOptions {
    pub connection: String,
    pub custom: Fields,
}

/// Combined identifier + password screen.
#[derive(Debug)]
pub struct Login {
    pub base: ScreenClient,
    /// Identifier kinds the current connection accepts. Reassignable; test
    /// and UI code overrides it to simulate connection configurations.
    pub allowed_identifiers: Vec<String>,
}

impl Login {
    pub const IDENTIFIER: &'static str = "login";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        let base = ScreenClient::open(store, sink, Self::IDENTIFIER)?;
        let allowed_identifiers = allowed_identifiers(base.transaction.raw());
        Ok(Self {
            base,
            allowed_identifiers,
        })
    }

    /// Submits the identifier and password. This endpoint takes no
    /// `action` discriminator; the POST itself is the operation.
    pub async fn login(&self, options: LoginOptions) -> Result<(), SubmitError> {
        if options.username.trim().is_empty() {
            return Err(InputError::required("username").into());
        }
        if options.password.is_empty() {
            return Err(InputError::required("password").into());
        }

        let mut fields = options.custom;
        fields.set("username", options.username);
        fields.set("password", options.password);
        if let Some(captcha) = options.captcha {
            fields.set("captcha", captcha);
        }
        self.base.form("login").submit_data(fields).await
    }

    /// Hands the transaction to an upstream identity provider.
    pub async fn federated_login(&self, options: FederatedOptions) -> Result<(), SubmitError> {
        if options.connection.trim().is_empty() {
            return Err(InputError::required("connection").into());
        }
        let mut fields = options.custom;
        fields.set("connection", options.connection);
        self.base.form("federated_login").submit_data(fields).await
    }

    pub async fn pick_country_code(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::PICK_COUNTRY_CODE);
        self.base
            .form("pick_country_code")
            .submit_data(fields)
            .await
    }
}

pub struct LoginIdOptions {
    pub username: String,
    pub captcha: Option<String>,
    pub custom: Fields,
}

/// Identifier-first screen; the password (or another factor) comes on the
/// next page.
pub struct LoginId {
    pub base: ScreenClient,
    pub allowed_identifiers: Vec<String>,
    pub data: Option<LoginIdData>,
}

/// Passkey challenge handed down for conditional UI autofill.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginIdData {
    pub passkey_challenge: Option<Value>,
}

impl LoginIdData {
    pub fn from_screen(screen: &crate::models::ScreenContext) -> Option<Self> {
        let data = screen.data.as_ref()?;
        Some(Self {
            passkey_challenge: data
                .get("passkey")
                .and_then(|p| p.get("public_key"))
                .cloned(),
        })
    }
}

impl LoginId {
    pub const IDENTIFIER: &'static str = "login-id";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        let base = ScreenClient::open(store, sink, Self::IDENTIFIER)?;
        let allowed_identifiers = allowed_identifiers(base.transaction.raw());
        let data = LoginIdData::from_screen(base.screen.raw());
        Ok(Self {
            base,
            allowed_identifiers,
            data,
        })
    }

    pub async fn login(&self, options: LoginIdOptions) -> Result<(), SubmitError> {
        if options.username.trim().is_empty() {
            return Err(InputError::required("username").into());
        }
        let mut fields = options.custom;
        fields.set("username", options.username);
        if let Some(captcha) = options.captcha {
            fields.set("captcha", captcha);
        }
        self.base.form("login").submit_data(fields).await
    }

    pub async fn federated_login(&self, options: FederatedOptions) -> Result<(), SubmitError> {
        if options.connection.trim().is_empty() {
            return Err(InputError::required("connection").into());
        }
        let mut fields = options.custom;
        fields.set("connection", options.connection);
        self.base.form("federated_login").submit_data(fields).await
    }

    /// Submits a resolved passkey assertion. The credential is carried as
    /// compact JSON in a single field.
    pub async fn passkey_login(&self, credential: Value, custom: Fields) -> Result<(), SubmitError> {
        if credential.is_null() {
            return Err(InputError::required("passkey").into());
        }
        let mut fields = custom;
        fields.set(
            "passkey",
            serde_json::to_string(&credential).unwrap_or_default(),
        );
        self.base.form("passkey_login").submit_data(fields).await
    }

    pub async fn pick_country_code(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::PICK_COUNTRY_CODE);
        self.base
            .form("pick_country_code")
            .submit_data(fields)
            .await
    }
}

pub struct CodeOptions {
    pub code: String,
    pub custom: Fields,
}

/// Email verification during login: the user retypes a mailed code.
pub struct LoginEmailVerification {
    pub base: ScreenClient,
}

impl LoginEmailVerification {
    pub const IDENTIFIER: &'static str = "login-email-verification";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        Ok(Self {
            base: ScreenClient::open(store, sink, Self::IDENTIFIER)?,
        })
    }

    pub async fn continue_with_code(&self, options: CodeOptions) -> Result<(), SubmitError> {
        if options.code.trim().is_empty() {
            return Err(InputError::required("code").into());
        }
        let mut fields = options.custom;
        fields.set("code", options.code);
        fields.set("action", actions::DEFAULT);
        self.base
            .form("continue_with_code")
            .submit_data(fields)
            .await
    }

    pub async fn resend_code(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::RESEND_CODE);
        self.base.form("resend_code").submit_data(fields).await
    }
}

/// Passwordless login, code delivered by email.
pub struct LoginPasswordlessEmailCode {
    pub base: ScreenClient,
}

impl LoginPasswordlessEmailCode {
    pub const IDENTIFIER: &'static str = "login-passwordless-email-code";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        Ok(Self {
            base: ScreenClient::open(store, sink, Self::IDENTIFIER)?,
        })
    }

    pub async fn submit_code(&self, options: CodeOptions) -> Result<(), SubmitError> {
        if options.code.trim().is_empty() {
            return Err(InputError::required("code").into());
        }
        let mut fields = options.custom;
        fields.set("code", options.code);
        fields.set("action", actions::DEFAULT);
        self.base.form("submit_code").submit_data(fields).await
    }

    pub async fn resend_code(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::RESEND);
        self.base.form("resend_code").submit_data(fields).await
    }
}

/// Passwordless login, code delivered by SMS.
pub struct LoginPasswordlessSmsOtp {
    pub base: ScreenClient,
}

impl LoginPasswordlessSmsOtp {
    pub const IDENTIFIER: &'static str = "login-passwordless-sms-otp";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        Ok(Self {
            base: ScreenClient::open(store, sink, Self::IDENTIFIER)?,
        })
    }

    pub async fn submit_otp(&self, options: CodeOptions) -> Result<(), SubmitError> {
        if options.code.trim().is_empty() {
            return Err(InputError::required("code").into());
        }
        let mut fields = options.custom;
        fields.set("code", options.code);
        fields.set("action", actions::DEFAULT);
        self.base.form("submit_otp").submit_data(fields).await
    }

    pub async fn resend_code(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::RESEND);
        self.base.form("resend_code").submit_data(fields).await
    }
}
