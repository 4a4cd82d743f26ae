use chrono::{DateTime, Utc};
use custodia_core::{AppResult, NonEmptyString, TenantId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::RoleId;

/// Direct grant of a role to a user, optionally scoped to one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRoleAssignment {
    assignment_id: Uuid,
    user_id: NonEmptyString,
    role_id: RoleId,
    tenant_id: Option<TenantId>,
    granted_at: DateTime<Utc>,
    granted_by: NonEmptyString,
    expires_at: Option<DateTime<Utc>>,
}

impl UserRoleAssignment {
    /// Creates an assignment with a fresh identifier.
    pub fn new(
        user_id: impl Into<String>,
        role_id: RoleId,
        tenant_id: Option<TenantId>,
        granted_by: impl Into<String>,
        granted_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
    ) -> AppResult<Self> {
        Ok(Self {
            assignment_id: Uuid::new_v4(),
            user_id: NonEmptyString::new(user_id)?,
            role_id,
            tenant_id,
            granted_at,
            granted_by: NonEmptyString::new(granted_by)?,
            expires_at,
        })
    }

    /// Returns the assignment identifier.
    #[must_use]
    pub fn assignment_id(&self) -> Uuid {
        self.assignment_id
    }

    /// Returns the grantee.
    #[must_use]
    pub fn user_id(&self) -> &str {
        self.user_id.as_str()
    }

    /// Returns the granted role.
    #[must_use]
    pub fn role_id(&self) -> &RoleId {
        &self.role_id
    }

    /// Returns the tenant scope; `None` grants the role in every tenant.
    #[must_use]
    pub fn tenant_id(&self) -> Option<&TenantId> {
        self.tenant_id.as_ref()
    }

    /// Returns the grant instant.
    #[must_use]
    pub fn granted_at(&self) -> DateTime<Utc> {
        self.granted_at
    }

    /// Returns the granting actor.
    #[must_use]
    pub fn granted_by(&self) -> &str {
        self.granted_by.as_str()
    }

    /// Returns the expiry instant, if the grant is temporary.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Returns whether the grant is unexpired at `now`.
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|expires_at| expires_at > now)
    }

    /// Returns whether this assignment occupies exactly the given uniqueness key.
    ///
    /// The global scope (`None`) is its own key and never equals a tenant scope.
    #[must_use]
    pub fn has_key(&self, user_id: &str, role_id: &RoleId, tenant_id: Option<&TenantId>) -> bool {
        self.user_id.as_str() == user_id
            && &self.role_id == role_id
            && self.tenant_id.as_ref() == tenant_id
    }

    /// Returns whether the grant applies when resolving roles for `tenant_id`.
    ///
    /// Global grants apply everywhere; an unscoped lookup considers every grant.
    #[must_use]
    pub fn applies_to(&self, tenant_id: Option<&TenantId>) -> bool {
        match (tenant_id, self.tenant_id.as_ref()) {
            (None, _) | (Some(_), None) => true,
            (Some(requested), Some(scoped)) => requested == scoped,
        }
    }
}
