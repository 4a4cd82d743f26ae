use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use custodia_core::{AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stable role identifier, e.g. `approver`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(String);

impl RoleId {
    /// Creates a role identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the underlying identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for RoleId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl Display for RoleId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Named role that bundles permissions and may inherit from one parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    role_id: RoleId,
    display_name: NonEmptyString,
    description: Option<String>,
    metadata: BTreeMap<String, Value>,
    parent_role_id: Option<RoleId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Role {
    /// Creates a role with validated identifier and display name.
    pub fn new(
        role_id: impl Into<String>,
        display_name: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> AppResult<Self> {
        let role_id = NonEmptyString::new(role_id)?;

        Ok(Self {
            role_id: RoleId::new(role_id),
            display_name: NonEmptyString::new(display_name)?,
            description: None,
            metadata: BTreeMap::new(),
            parent_role_id: None,
            created_at,
            updated_at: created_at,
        })
    }

    /// Sets the human-readable description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the single-parent inheritance pointer.
    #[must_use]
    pub fn with_parent(mut self, parent_role_id: impl Into<RoleId>) -> Self {
        self.parent_role_id = Some(parent_role_id.into());
        self
    }

    /// Adds one free-form metadata value.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Returns the role identifier.
    #[must_use]
    pub fn role_id(&self) -> &RoleId {
        &self.role_id
    }

    /// Returns the display name reported in permission decisions.
    #[must_use]
    pub fn display_name(&self) -> &NonEmptyString {
        &self.display_name
    }

    /// Returns the optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns free-form metadata.
    #[must_use]
    pub fn metadata(&self) -> &BTreeMap<String, Value> {
        &self.metadata
    }

    /// Returns the parent role, if this role inherits from one.
    #[must_use]
    pub fn parent_role_id(&self) -> Option<&RoleId> {
        self.parent_role_id.as_ref()
    }

    /// Returns the creation instant.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last update instant.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// Explicit parent/child inheritance edge, allowing multiple parents per role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleHierarchyEdge {
    parent_role_id: RoleId,
    child_role_id: RoleId,
    depth: u32,
}

impl RoleHierarchyEdge {
    /// Creates an edge where `child_role_id` inherits from `parent_role_id`.
    #[must_use]
    pub fn new(
        parent_role_id: impl Into<RoleId>,
        child_role_id: impl Into<RoleId>,
        depth: u32,
    ) -> Self {
        Self {
            parent_role_id: parent_role_id.into(),
            child_role_id: child_role_id.into(),
            depth,
        }
    }

    /// Returns the inherited (parent) role.
    #[must_use]
    pub fn parent_role_id(&self) -> &RoleId {
        &self.parent_role_id
    }

    /// Returns the inheriting (child) role.
    #[must_use]
    pub fn child_role_id(&self) -> &RoleId {
        &self.child_role_id
    }

    /// Returns the informational depth recorded with the edge.
    #[must_use]
    pub fn depth(&self) -> u32 {
        self.depth
    }
}
