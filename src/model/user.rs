//! Session identity: the signed-in user and the role that selects their services.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Which set of services a session gets. Resolved once at login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Driver,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Driver => "driver",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role as reported by the backend's `mobile_role` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MobileRole {
    App(Role),
    /// Accounts that must use the web portal instead.
    WebOnly,
}

impl MobileRole {
    /// Parses the backend value. A missing or unrecognised role means customer.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("driver") => MobileRole::App(Role::Driver),
            Some("web_only") => MobileRole::WebOnly,
            _ => MobileRole::App(Role::Customer),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address_line1: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
}

impl UserProfile {
    /// `"<line1>, <city>"` for prefilling the checkout address, if the profile has one.
    pub fn default_delivery_address(&self) -> Option<String> {
        let line1 = self.address_line1.as_deref().unwrap_or("").trim();
        let city = self.city.as_deref().unwrap_or("").trim();
        match (line1.is_empty(), city.is_empty()) {
            (true, true) => None,
            (false, true) => Some(line1.to_string()),
            (true, false) => Some(city.to_string()),
            (false, false) => Some(format!("{line1}, {city}")),
        }
    }
}

/// Response of the `auth/me/` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Me {
    pub user: UserProfile,
    #[serde(default)]
    pub mobile_role: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mobile_role_defaults_to_customer() {
        assert_eq!(MobileRole::parse(None), MobileRole::App(Role::Customer));
        assert_eq!(MobileRole::parse(Some("driver")), MobileRole::App(Role::Driver));
        assert_eq!(MobileRole::parse(Some("web_only")), MobileRole::WebOnly);
        assert_eq!(MobileRole::parse(Some("manager")), MobileRole::App(Role::Customer));
    }

    #[test]
    fn test_default_delivery_address() {
        let mut user = UserProfile::default();
        assert_eq!(user.default_delivery_address(), None);

        user.address_line1 = Some("4 Borrowdale Rd".into());
        user.city = Some("Harare".into());
        assert_eq!(
            user.default_delivery_address().as_deref(),
            Some("4 Borrowdale Rd, Harare")
        );
    }
}
