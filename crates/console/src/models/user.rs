//! User profile types.

use serde::{Deserialize, Serialize};

use tienda_core::{RoleSet, RolesColumn, UserId, normalize_roles};

/// Row from the backend `users` table.
///
/// `roles` may be missing, `null`, a legacy single string, or an array.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRow {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub roles: Option<RolesColumn>,
}

/// A resolved user profile (domain type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub id: UserId,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub roles: RoleSet,
}

impl UserProfile {
    /// Name to show in lists: full name, else email, else the id.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.full_name
            .clone()
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| self.id.to_string())
    }
}

impl From<UserRow> for UserProfile {
    fn from(row: UserRow) -> Self {
        Self {
            roles: normalize_roles(row.roles.as_ref()),
            id: row.id,
            email: row.email,
            full_name: row.full_name,
        }
    }
}
