//! Access rules: the route guard and role-filtered navigation.
//!
//! Both are pure functions so the same decision can be made by any front end
//! (the CLI, a rendered page, a test) without touching session plumbing.

use crate::types::{Role, RoleSet};

/// What the guard needs to know about the current identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessContext {
    /// Identity is still being resolved.
    pub loading: bool,
    /// An auth session is present.
    pub has_session: bool,
    /// Roles of the resolved profile, `None` when no profile is loaded.
    pub roles: Option<RoleSet>,
}

impl AccessContext {
    /// Context before the auth provider has answered.
    #[must_use]
    pub const fn pending() -> Self {
        Self {
            loading: true,
            has_session: false,
            roles: None,
        }
    }

    /// Context with no identity.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            loading: false,
            has_session: false,
            roles: None,
        }
    }

    /// Context for a signed-in user with the given roles.
    #[must_use]
    pub const fn signed_in(roles: RoleSet) -> Self {
        Self {
            loading: false,
            has_session: true,
            roles: Some(roles),
        }
    }

    /// Logged in means both a session and a profile are present.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.has_session && self.roles.is_some()
    }
}

/// Where the guard sends users it turns away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardRedirects {
    /// Destination for unauthenticated users.
    pub login: String,
    /// Destination for authenticated users lacking the required roles.
    pub fallback: String,
}

impl Default for GuardRedirects {
    fn default() -> Self {
        Self {
            login: "/login".to_string(),
            fallback: "/".to_string(),
        }
    }
}

/// Outcome of guarding a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision<'a> {
    /// Identity not resolved yet: show a neutral pending state.
    Pending,
    /// Not logged in.
    RedirectToLogin(&'a str),
    /// Logged in, but none of the required roles.
    Redirect(&'a str),
    /// Render the guarded content.
    Allow,
}

/// Decide whether guarded content may render.
///
/// `required` of `None` means any authenticated user is allowed.
/// `Some` of an empty set admits nobody.
#[must_use]
pub fn guard<'a>(
    ctx: &AccessContext,
    required: Option<&RoleSet>,
    redirects: &'a GuardRedirects,
) -> GuardDecision<'a> {
    if ctx.loading {
        return GuardDecision::Pending;
    }

    let Some(roles) = ctx.roles.as_ref().filter(|_| ctx.has_session) else {
        return GuardDecision::RedirectToLogin(&redirects.login);
    };

    match required {
        Some(required) if !roles.intersects(required) => {
            GuardDecision::Redirect(&redirects.fallback)
        }
        _ => GuardDecision::Allow,
    }
}

/// A navigation entry and the roles that may see it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavItem {
    pub path: &'static str,
    pub label: &'static str,
    pub roles: &'static [Role],
}

impl NavItem {
    #[must_use]
    pub fn required_roles(&self) -> RoleSet {
        self.roles.iter().copied().collect()
    }

    /// Whether a user with these roles may see the entry.
    #[must_use]
    pub fn visible_to(&self, user_roles: &RoleSet) -> bool {
        self.roles.iter().any(|role| user_roles.contains(*role))
    }
}

/// The entries visible to a user, in their original order.
///
/// A user without roles sees nothing.
#[must_use]
pub fn visible_nav<'a>(items: &'a [NavItem], user_roles: &RoleSet) -> Vec<&'a NavItem> {
    items
        .iter()
        .filter(|item| item.visible_to(user_roles))
        .collect()
}
