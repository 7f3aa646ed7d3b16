//! Business roles and role sets.
//!
//! Roles are a closed enumeration. The users table historically stored a
//! single role string; newer rows store an array. [`RolesColumn`] models both
//! shapes and [`normalize_roles`] maps either one onto a [`RoleSet`].

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Error returned when a string is not one of the known roles.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid role: {0}")]
pub struct ParseRoleError(pub String);

/// A business role granting access to specific admin views.
///
/// Declaration order is the display/sort order used by [`RoleSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Business owner. Full access, including team management.
    Owner,
    /// Administrator. Full access, including team management.
    Admin,
    /// Sales desk.
    Ventas,
    /// Production floor supervisor.
    Produccion,
    /// Inventory management.
    Inventario,
    /// Accountant.
    Contador,
    /// Stock replenishment.
    Repositor,
    /// Cutting station.
    Cortador,
    /// Folding station.
    Doblador,
    /// Storefront customer. The default for rows without role data.
    Cliente,
}

impl Role {
    /// Every role, in declaration order.
    pub const ALL: [Self; 10] = [
        Self::Owner,
        Self::Admin,
        Self::Ventas,
        Self::Produccion,
        Self::Inventario,
        Self::Contador,
        Self::Repositor,
        Self::Cortador,
        Self::Doblador,
        Self::Cliente,
    ];

    /// Role assigned when a profile carries no role data at all.
    pub const DEFAULT: Self = Self::Cliente;

    /// Wire name of the role (lowercase).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Ventas => "ventas",
            Self::Produccion => "produccion",
            Self::Inventario => "inventario",
            Self::Contador => "contador",
            Self::Repositor => "repositor",
            Self::Cortador => "cortador",
            Self::Doblador => "doblador",
            Self::Cliente => "cliente",
        }
    }

    /// Whether this role may edit other members' roles.
    #[must_use]
    pub const fn manages_team(self) -> bool {
        matches!(self, Self::Owner | Self::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseRoleError(s.to_owned()))
    }
}

/// An ordered, de-duplicated set of roles.
///
/// Serialises as a JSON array of role names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet(BTreeSet<Role>);

impl RoleSet {
    /// An empty role set.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// A set containing exactly one role.
    #[must_use]
    pub fn single(role: Role) -> Self {
        Self(BTreeSet::from([role]))
    }

    #[must_use]
    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    /// Whether the two sets share at least one role.
    ///
    /// An empty set intersects nothing.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        !self.0.is_disjoint(&other.0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Add a role. Returns `false` if it was already present.
    pub fn insert(&mut self, role: Role) -> bool {
        self.0.insert(role)
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.iter().copied()
    }

    /// Whether any role in the set may manage the team.
    #[must_use]
    pub fn manages_team(&self) -> bool {
        self.iter().any(Role::manages_team)
    }

    /// Parse a comma-separated list such as `"admin, ventas"`.
    ///
    /// # Errors
    ///
    /// Returns the first token that is not a known role. Empty tokens are skipped.
    pub fn parse_list(s: &str) -> Result<Self, ParseRoleError> {
        s.split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::parse)
            .collect()
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[Role; N]> for RoleSet {
    fn from(roles: [Role; N]) -> Self {
        roles.into_iter().collect()
    }
}

impl std::fmt::Display for RoleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.iter().map(Role::as_str).collect();
        f.write_str(&names.join(", "))
    }
}

/// Raw shape of the `roles` column in the users table.
///
/// Legacy rows hold a single role string; current rows hold an array.
/// Absent or `null` is represented by wrapping this in `Option`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RolesColumn {
    /// Legacy single-role value, e.g. `"admin"`.
    Single(String),
    /// Current multi-role value, e.g. `["admin", "ventas"]`.
    Many(Vec<String>),
}

/// Normalise a raw `roles` column into a [`RoleSet`].
///
/// - absent/`null` yields `{cliente}`
/// - a single string yields a one-element set
/// - an array yields the set of its known roles
///
/// Unknown role names are dropped (and logged) rather than failing the read,
/// so a row with only unknown roles ends up with an empty set and is denied
/// everywhere.
#[must_use]
pub fn normalize_roles(column: Option<&RolesColumn>) -> RoleSet {
    let names: Vec<&str> = match column {
        None => return RoleSet::single(Role::DEFAULT),
        Some(RolesColumn::Single(name)) => vec![name.as_str()],
        Some(RolesColumn::Many(names)) => names.iter().map(String::as_str).collect(),
    };

    names
        .into_iter()
        .filter_map(|name| match name.parse::<Role>() {
            Ok(role) => Some(role),
            Err(e) => {
                tracing::warn!(role = name, "dropping unknown role: {e}");
                None
            }
        })
        .collect()
}
