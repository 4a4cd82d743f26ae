use chrono::{DateTime, Utc};
use custodia_core::{AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::RoleId;

/// Set of roles that no single user may hold together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeparationOfDutyConstraint {
    constraint_id: NonEmptyString,
    name: NonEmptyString,
    conflicting_role_ids: Vec<RoleId>,
    description: Option<String>,
    created_at: DateTime<Utc>,
}

impl SeparationOfDutyConstraint {
    /// Creates a constraint. Callers are responsible for listing at least two roles.
    pub fn new(
        constraint_id: impl Into<String>,
        name: impl Into<String>,
        conflicting_role_ids: Vec<RoleId>,
        created_at: DateTime<Utc>,
    ) -> AppResult<Self> {
        Ok(Self {
            constraint_id: NonEmptyString::new(constraint_id)?,
            name: NonEmptyString::new(name)?,
            conflicting_role_ids,
            description: None,
            created_at,
        })
    }

    /// Sets the human-readable description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns the constraint identifier.
    #[must_use]
    pub fn constraint_id(&self) -> &str {
        self.constraint_id.as_str()
    }

    /// Returns the constraint name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the mutually exclusive roles.
    #[must_use]
    pub fn conflicting_role_ids(&self) -> &[RoleId] {
        self.conflicting_role_ids.as_slice()
    }

    /// Returns the optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the creation instant.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns whether the role is one of the exclusive set.
    #[must_use]
    pub fn involves(&self, role_id: &RoleId) -> bool {
        self.conflicting_role_ids.contains(role_id)
    }

    /// Finds a held role that conflicts with `requested` under this constraint.
    ///
    /// Holding the requested role itself (e.g. in another tenant scope) is not a
    /// conflict; only a different role from the same exclusive set is.
    #[must_use]
    pub fn conflicting_held_role<'a>(
        &self,
        requested: &RoleId,
        held: impl IntoIterator<Item = &'a RoleId>,
    ) -> Option<&'a RoleId> {
        if !self.involves(requested) {
            return None;
        }

        held.into_iter()
            .find(|role_id| *role_id != requested && self.involves(role_id))
    }
}
