//! The user slice, present once an identifier is known.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserContext {
    pub id: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub picture: Option<String>,
    pub enrolled_factors: Option<Vec<String>>,
    pub enrolled_devices: Option<Vec<RawEnrolledDevice>>,
    pub organizations: Option<Vec<RawUserOrganization>>,
    pub app_metadata: Option<Map<String, Value>>,
    pub user_metadata: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawEnrolledDevice {
    pub device_type: Option<String>,
    pub device_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawUserOrganization {
    pub organization_id: Option<String>,
    pub organization_name: Option<String>,
    pub display_name: Option<String>,
    pub branding: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A factor the user has already enrolled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrolledFactor {
    pub factor_type: String,
    pub device_name: Option<String>,
}

/// An organization membership, normalized from the `organization_*` keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserOrganization {
    pub id: String,
    pub name: Option<String>,
    pub display_name: Option<String>,
}

/// Normalized view over [`UserContext`].
#[derive(Debug, Clone, Default)]
pub struct User {
    raw: UserContext,
    organizations: Vec<UserOrganization>,
    enrolled_factors: Vec<EnrolledFactor>,
}

impl User {
    pub fn new(raw: Option<UserContext>) -> Self {
        let raw = raw.unwrap_or_default();
        let organizations = Self::collect_organizations(&raw);
        let enrolled_factors = Self::collect_factors(&raw);
        Self {
            raw,
            organizations,
            enrolled_factors,
        }
    }

    fn collect_organizations(raw: &UserContext) -> Vec<UserOrganization> {
        raw.organizations
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter_map(|org| {
                Some(UserOrganization {
                    id: org.organization_id.clone()?,
                    name: org.organization_name.clone(),
                    display_name: org.display_name.clone(),
                })
            })
            .collect()
    }

    fn collect_factors(raw: &UserContext) -> Vec<EnrolledFactor> {
        let mut factors: Vec<EnrolledFactor> = raw
            .enrolled_factors
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|f| EnrolledFactor {
                factor_type: f.clone(),
                device_name: None,
            })
            .collect();

        for device in raw.enrolled_devices.as_deref().unwrap_or_default() {
            if let Some(kind) = device.device_type.clone() {
                factors.push(EnrolledFactor {
                    factor_type: kind,
                    device_name: device.device_name.clone(),
                });
            }
        }
        factors
    }

    pub fn id(&self) -> Option<&str> {
        self.raw.id.as_deref()
    }

    pub fn username(&self) -> Option<&str> {
        self.raw.username.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.raw.email.as_deref()
    }

    pub fn phone_number(&self) -> Option<&str> {
        self.raw.phone_number.as_deref()
    }

    pub fn picture(&self) -> Option<&str> {
        self.raw.picture.as_deref()
    }

    /// Factors enrolled by this user; empty when absent.
    pub fn enrolled_factors(&self) -> &[EnrolledFactor] {
        &self.enrolled_factors
    }

    /// Organizations this user belongs to; empty when absent.
    pub fn organizations(&self) -> &[UserOrganization] {
        &self.organizations
    }

    pub fn app_metadata(&self) -> Option<&Map<String, Value>> {
        self.raw.app_metadata.as_ref()
    }

    pub fn user_metadata(&self) -> Option<&Map<String, Value>> {
        self.raw.user_metadata.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn organizations_are_renamed_and_filtered() {
        let user = User::new(Some(
            serde_json::from_value(json!({
                "id": "u_1",
                "organizations": [
                    { "organization_id": "org_1", "organization_name": "acme", "display_name": "Acme" },
                    { "organization_name": "no-id-dropped" }
                ]
            }))
            .unwrap(),
        ));

        assert_eq!(user.organizations().len(), 1);
        assert_eq!(user.organizations()[0].id, "org_1");
        assert_eq!(user.organizations()[0].display_name.as_deref(), Some("Acme"));
    }

    #[test]
    fn factors_merge_plain_and_device_entries() {
        let user = User::new(Some(
            serde_json::from_value(json!({
                "enrolled_factors": ["otp"],
                "enrolled_devices": [
                    { "device_type": "push-notification", "device_name": "Pixel 9" }
                ]
            }))
            .unwrap(),
        ));

        let factors = user.enrolled_factors();
        assert_eq!(factors.len(), 2);
        assert_eq!(factors[0].factor_type, "otp");
        assert_eq!(factors[1].device_name.as_deref(), Some("Pixel 9"));
    }

    #[test]
    fn absent_slice_is_all_defaults() {
        let user = User::new(None);
        assert!(user.id().is_none());
        assert!(user.enrolled_factors().is_empty());
        assert!(user.organizations().is_empty());
    }
}
