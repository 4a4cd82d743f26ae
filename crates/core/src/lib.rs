//! Shared primitives for all Rust crates in Custodia.

#![forbid(unsafe_code)]

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across Custodia crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for NonEmptyString {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

impl Display for NonEmptyString {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Tenant (organization) identifier scoping memberships, grants and audit entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantId(String);

impl TenantId {
    /// Creates a tenant identifier from an external organization key.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "tenant id must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for TenantId {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for TenantId {
    type Error = AppError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TenantId> for String {
    fn from(value: TenantId) -> Self {
        value.0
    }
}

impl Display for TenantId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Common application error categories.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A grant referenced a role that has not been registered.
    #[error("role '{role_id}' is not registered")]
    RoleNotFound {
        /// Unknown role identifier.
        role_id: String,
    },

    /// A tenant-scoped operation was attempted without an active membership.
    #[error("user '{user_id}' is not an active member of tenant '{tenant_id}'")]
    MembershipRequired {
        /// User lacking the membership.
        user_id: String,
        /// Tenant the operation was scoped to.
        tenant_id: TenantId,
    },

    /// The same user, role and tenant scope is already assigned.
    #[error(
        "user '{user_id}' already holds role '{role_id}' in scope '{}'",
        scope_label(.tenant_id)
    )]
    DuplicateGrant {
        /// Grantee.
        user_id: String,
        /// Role already held.
        role_id: String,
        /// Scope of the existing assignment; `None` is the global scope.
        tenant_id: Option<TenantId>,
    },

    /// Granting the role would let one user hold mutually exclusive roles.
    #[error(
        "separation of duty constraint '{constraint_name}' ({constraint_id}) forbids role '{requested_role_id}' alongside '{held_role_id}'"
    )]
    SeparationOfDutyViolation {
        /// Violated constraint identifier.
        constraint_id: String,
        /// Violated constraint display name.
        constraint_name: String,
        /// Role the caller attempted to grant.
        requested_role_id: String,
        /// Conflicting role the user already holds.
        held_role_id: String,
    },

    /// An audit record was missing a required field and was not appended.
    #[error("audit entry field '{field}' is required")]
    MissingAuditField {
        /// Name of the missing field.
        field: &'static str,
    },

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

fn scope_label(tenant_id: &Option<TenantId>) -> String {
    tenant_id
        .as_ref()
        .map_or_else(|| "global".to_owned(), ToString::to_string)
}
