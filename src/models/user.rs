use serde::{Deserialize, Serialize};

use super::service::Service;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

impl Role {
    pub fn has_permission(&self, name: &str) -> bool {
        self.permissions.iter().any(|p| p.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRole {
    pub service: Service,
    pub role: Role,
}

/// The authenticated user, as loaded from adminusers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub external_id: String,
    #[serde(default)]
    pub username: Option<String>,
    pub email: String,
    #[serde(default)]
    pub service_roles: Vec<ServiceRole>,
    #[serde(default)]
    pub disabled: bool,
}

impl User {
    pub fn service_role(&self, service_external_id: &str) -> Option<&ServiceRole> {
        self.service_roles
            .iter()
            .find(|sr| sr.service.external_id == service_external_id)
    }

    pub fn has_permission(&self, service_external_id: &str, permission: &str) -> bool {
        self.service_role(service_external_id)
            .map(|sr| sr.role.has_permission(permission))
            .unwrap_or(false)
    }
}

/// A member of a service team, as listed by adminusers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMember {
    pub external_id: String,
    #[serde(default)]
    pub username: Option<String>,
    pub email: String,
    #[serde(default)]
    pub service_roles: Vec<ServiceRole>,
}

impl TeamMember {
    pub fn role_for(&self, service_external_id: &str) -> Option<&str> {
        self.service_roles
            .iter()
            .find(|sr| sr.service.external_id == service_external_id)
            .map(|sr| sr.role.name.as_str())
    }
}

/// Roles a team member can be given.
pub const ASSIGNABLE_ROLES: &[&str] = &["admin", "view-and-refund", "view-only", "view-and-initiate-moto"];
