//! Team management: list members and edit their roles.
//!
//! Listing is a read path: a backend failure is logged and an empty list is
//! shown. Editing is a mutating path: failures are returned so the caller can
//! block on them and tell the user.

use thiserror::Error;
use tracing::{error, info, instrument};

use tienda_core::{RoleSet, UserId};

use crate::backend::{BackendError, UserDirectory};
use crate::models::UserProfile;

/// Errors from team role edits.
#[derive(Debug, Error)]
pub enum TeamError {
    /// The acting user may not edit roles.
    #[error("only owners and admins can change roles")]
    Forbidden,

    /// A member must keep at least one role.
    #[error("a member must have at least one role")]
    EmptyRoleSet,

    /// Backend rejected or failed the update.
    #[error("could not update roles: {0}")]
    Backend(#[from] BackendError),
}

/// Team operations over a user directory.
pub struct TeamService<'a, D> {
    directory: &'a D,
}

impl<'a, D: UserDirectory + Sync> TeamService<'a, D> {
    #[must_use]
    pub const fn new(directory: &'a D) -> Self {
        Self { directory }
    }

    /// All members visible to the current session.
    ///
    /// Returns an empty list if the backend call fails.
    #[instrument(skip(self))]
    pub async fn list_members(&self) -> Vec<UserProfile> {
        match self.directory.list_users().await {
            Ok(members) => members,
            Err(e) => {
                error!("Failed to fetch team members: {e}");
                vec![]
            }
        }
    }

    /// Replace `member`'s roles on behalf of `actor`.
    ///
    /// # Errors
    ///
    /// - `TeamError::Forbidden` if `actor` is neither owner nor admin
    /// - `TeamError::EmptyRoleSet` if `roles` is empty
    /// - `TeamError::Backend` if the update fails
    #[instrument(skip(self, actor), fields(actor = %actor.id, roles = %roles))]
    pub async fn set_roles(
        &self,
        actor: &UserProfile,
        member: UserId,
        roles: RoleSet,
    ) -> Result<UserProfile, TeamError> {
        if !actor.roles.manages_team() {
            return Err(TeamError::Forbidden);
        }
        if roles.is_empty() {
            return Err(TeamError::EmptyRoleSet);
        }

        let updated = self
            .directory
            .update_roles(member, &roles)
            .await
            .inspect_err(|e| error!("Failed to update roles: {e}"))?;

        info!(member = %updated.id, roles = %updated.roles, "Roles updated");
        Ok(updated)
    }
}
