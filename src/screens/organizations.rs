//! Organization entry screens: typing an organization name, or picking one
//! of the memberships offered by the server.

use std::sync::Arc;

use crate::context::ContextStore;
use crate::error::{ContextError, InputError, SubmitError};
use crate::form::Fields;
use crate::screens::{actions, ScreenClient};
use crate::sink::SubmissionSink;

/// Free-form organization name entry.
pub struct OrganizationSelection {
    pub base: ScreenClient,
}

impl OrganizationSelection {
    pub const IDENTIFIER: &'static str = "organization-selection";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        Ok(Self {
            base: ScreenClient::open(store, sink, Self::IDENTIFIER)?,
        })
    }

    pub async fn continue_with_organization_name(
        &self,
        organization_name: impl Into<String>,
        custom: Fields,
    ) -> Result<(), SubmitError> {
        let organization_name = organization_name.into();
        if organization_name.trim().is_empty() {
            return Err(InputError::required("organizationName").into());
        }
        let mut fields = custom;
        fields.set("organizationName", organization_name);
        fields.set("action", actions::DEFAULT);
        self.base
            .form("continue_with_organization_name")
            .submit_data(fields)
            .await
    }
}

/// Picker over the memberships in `user.organizations`.
pub struct OrganizationPicker {
    pub base: ScreenClient,
}

impl OrganizationPicker {
    pub const IDENTIFIER: &'static str = "organization-picker";

    pub fn new(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<Self, ContextError> {
        Ok(Self {
            base: ScreenClient::open(store, sink, Self::IDENTIFIER)?,
        })
    }

    /// Submits the chosen organization id. No `action` discriminator; the
    /// selection itself is the operation.
    pub async fn select_organization(
        &self,
        organization_id: impl Into<String>,
        custom: Fields,
    ) -> Result<(), SubmitError> {
        let organization_id = organization_id.into();
        if organization_id.trim().is_empty() {
            return Err(InputError::required("organization").into());
        }
        let mut fields = custom;
        fields.set("organization", organization_id);
        self.base
            .form("select_organization")
            .submit_data(fields)
            .await
    }

    /// Continues without narrowing to an organization.
    pub async fn skip_organization_selection(&self, custom: Fields) -> Result<(), SubmitError> {
        let mut fields = custom;
        fields.set("action", actions::SKIP);
        self.base
            .form("skip_organization_selection")
            .submit_data(fields)
            .await
    }
}
