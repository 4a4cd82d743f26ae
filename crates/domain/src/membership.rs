use std::str::FromStr;

use chrono::{DateTime, Utc};
use custodia_core::{AppError, AppResult, NonEmptyString, TenantId};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a user's membership in a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipState {
    /// Invited or requested, not yet effective.
    Proposed,
    /// Effective membership.
    Active,
    /// Temporarily suspended.
    Paused,
    /// Ended normally.
    Completed,
    /// Ended by revocation.
    Terminated,
}

impl MembershipState {
    /// Returns a stable storage value for this state.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Proposed => "proposed",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Terminated => "terminated",
        }
    }
}

impl FromStr for MembershipState {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "proposed" => Ok(Self::Proposed),
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            "completed" => Ok(Self::Completed),
            "terminated" => Ok(Self::Terminated),
            _ => Err(AppError::Validation(format!(
                "unknown membership state '{value}'"
            ))),
        }
    }
}

/// Membership of one user in one tenant organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantMembership {
    user_id: NonEmptyString,
    organization_id: TenantId,
    state: MembershipState,
    role_label: String,
    joined_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TenantMembership {
    /// Creates a membership record.
    pub fn new(
        user_id: impl Into<String>,
        organization_id: TenantId,
        state: MembershipState,
        role_label: impl Into<String>,
        joined_at: DateTime<Utc>,
    ) -> AppResult<Self> {
        Ok(Self {
            user_id: NonEmptyString::new(user_id)?,
            organization_id,
            state,
            role_label: role_label.into(),
            joined_at,
            updated_at: joined_at,
        })
    }

    /// Returns the member.
    #[must_use]
    pub fn user_id(&self) -> &str {
        self.user_id.as_str()
    }

    /// Returns the tenant organization.
    #[must_use]
    pub fn organization_id(&self) -> &TenantId {
        &self.organization_id
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub fn state(&self) -> MembershipState {
        self.state
    }

    /// Returns the membership role label (informational).
    #[must_use]
    pub fn role_label(&self) -> &str {
        self.role_label.as_str()
    }

    /// Returns the join instant.
    #[must_use]
    pub fn joined_at(&self) -> DateTime<Utc> {
        self.joined_at
    }

    /// Returns the last update instant.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Only `active` memberships satisfy tenant gating.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == MembershipState::Active
    }
}
