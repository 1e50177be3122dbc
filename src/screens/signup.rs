//! Signup screens: combined, identifier-first, and password step.

use std::sync::Arc;

use crate::context::ContextStore;
use crate::error::{ContextError, InputError, SubmitError};
use crate::form::Fields;
use crate::screens::{actions, ScreenClient};
use crate::sink::SubmissionSink;

use super::login::FederatedOptions;

pub struct SignupOptions {
    pub email: String,
    pub password: String,
    pub username: Option<String>,
    pub phone: Option<String>,
    pub custom: Fields,
}

/// Combined signup: identifier and password on one page.
pub struct Signup {
    pub base: ScreenClient,
}

impl Signup {
    pub const IDENTIFIER: &'static str = "signup";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        Ok(Self {
            base: ScreenClient::open(store, sink, Self::IDENTIFIER)?,
        })
    }

    pub async fn signup(&self, options: SignupOptions) -> Result<(), SubmitError> {
        if options.email.trim().is_empty() {
            return Err(InputError::required("email").into());
        }
        if options.password.is_empty() {
            return Err(InputError::required("password").into());
        }

        let mut fields = options.custom;
        fields.set("email", options.email);
        if let Some(username) = options.username {
            fields.set("username", username);
        }
        if let Some(phone) = options.phone {
            fields.set("phone", phone);
        }
        fields.set("password", options.password);
        self.base.form("signup").submit_data(fields).await
    }

    pub async fn federated_signup(&self, options: FederatedOptions) -> Result<(), SubmitError> {
        if options.connection.trim().is_empty() {
            return Err(InputError::required("connection").into());
        }
        let mut fields = options.custom;
        fields.set("connection", options.connection);
        self.base.form("federated_signup").submit_data(fields).await
    }
}

pub struct SignupIdOptions {
    pub email: String,
    pub username: Option<String>,
    pub phone: Option<String>,
    pub custom: Fields,
}

/// Identifier-first signup.
pub struct SignupId {
    pub base: ScreenClient,
}

impl SignupId {
    pub const IDENTIFIER: &'static str = "signup-id";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        Ok(Self {
            base: ScreenClient::open(store, sink, Self::IDENTIFIER)?,
        })
    }

    pub async fn signup(&self, options: SignupIdOptions) -> Result<(), SubmitError> {
        if options.email.trim().is_empty() {
            return Err(InputError::required("email").into());
        }
        let mut fields = options.custom;
        fields.set("email", options.email);
        if let Some(username) = options.username {
            fields.set("username", username);
        }
        if let Some(phone) = options.phone {
            fields.set("phone", phone);
        }
        self.base.form("signup").submit_data(fields).await
    }

    pub async fn federated_signup(&self, options: FederatedOptions) -> Result<(), SubmitError> {
        if options.connection.trim().is_empty() {
            return Err(InputError::required("connection").into());
        }
        let mut fields = options.custom;
        fields.set("connection", options.connection);
        self.base.form("federated_signup").submit_data(fields).await
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

pub struct SignupPasswordOptions {
    pub password: String,
    /// Echo of the identifier from the previous step, when the server asks
    /// for it again.
    pub email: Option<String>,
    pub username: Option<String>,
    pub phone: Option<String>,
    pub custom: Fields,
}

/// Password step after identifier-first signup.
pub struct SignupPassword {
    pub base: ScreenClient,
}

impl SignupPassword {
    pub const IDENTIFIER: &'static str = "signup-password";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        Ok(Self {
            base: ScreenClient::open(store, sink, Self::IDENTIFIER)?,
        })
    }

    pub async fn signup(&self, options: SignupPasswordOptions) -> Result<(), SubmitError> {
        if options.password.is_empty() {
            return Err(InputError::required("password").into());
        }
        let mut fields = options.custom;
        if let Some(email) = options.email {
            fields.set("email", email);
        }
        if let Some(username) = options.username {
            fields.set("username", username);
        }
        if let Some(phone) = options.phone {
            fields.set("phone", phone);
        }
        fields.set("password", options.password);
        self.base.form("signup").submit_data(fields).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{recording_pair, store_with_screen};

    #[tokio::test]
    async fn signup_submits_identifier_fields() {
        let store = store_with_screen("signup", "abc");
        let (sink, recorder) = recording_pair();
        let screen = Signup::new(&store, sink).unwrap();

        screen
            .signup(SignupOptions {
                email: "u@example.com".into(),
                password: "secret".into(),
                username: Some("u".into()),
                phone: None,
                custom: Fields::new(),
            })
            .await
            .unwrap();

        let form = recorder.last().unwrap();
        assert_eq!(form.get("email"), Some("u@example.com"));
        assert_eq!(form.get("username"), Some("u"));
        assert_eq!(form.get("password"), Some("secret"));
        assert_eq!(form.get("phone"), None);
    }

    #[tokio::test]
    async fn federated_signup_requires_connection() {
        let store = store_with_screen("signup-id", "abc");
        let (sink, recorder) = recording_pair();
        let screen = SignupId::new(&store, sink).unwrap();

        let err = screen
            .federated_signup(FederatedOptions {
                connection: "".into(),
                custom: Fields::new(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, SubmitError::Input(_)));
        assert!(recorder.submissions().is_empty());
    }
}
