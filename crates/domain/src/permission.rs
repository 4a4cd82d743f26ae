use chrono::{DateTime, Utc};
use custodia_core::{AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::RoleId;

/// Permission to perform one action on one resource category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Permission {
    permission_id: NonEmptyString,
    resource: NonEmptyString,
    action: NonEmptyString,
    constraints: Option<Map<String, Value>>,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Permission {
    /// Creates a permission for `action` on `resource`, e.g. `pause` on `subscription`.
    pub fn new(
        permission_id: impl Into<String>,
        resource: impl Into<String>,
        action: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> AppResult<Self> {
        Ok(Self {
            permission_id: NonEmptyString::new(permission_id)?,
            resource: NonEmptyString::new(resource)?,
            action: NonEmptyString::new(action)?,
            constraints: None,
            description: None,
            created_at,
            updated_at: created_at,
        })
    }

    /// Attaches opaque fine-grained constraints.
    #[must_use]
    pub fn with_constraints(mut self, constraints: Map<String, Value>) -> Self {
        self.constraints = Some(constraints);
        self
    }

    /// Sets the human-readable description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns the permission identifier.
    #[must_use]
    pub fn permission_id(&self) -> &str {
        self.permission_id.as_str()
    }

    /// Returns the resource category.
    #[must_use]
    pub fn resource(&self) -> &str {
        self.resource.as_str()
    }

    /// Returns the action verb.
    #[must_use]
    pub fn action(&self) -> &str {
        self.action.as_str()
    }

    /// Returns the opaque constraints, if any.
    #[must_use]
    pub fn constraints(&self) -> Option<&Map<String, Value>> {
        self.constraints.as_ref()
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

    /// Returns the last update instant.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns whether this permission covers `action` on `resource_type`.
    #[must_use]
    pub fn covers(&self, resource_type: &str, action: &str) -> bool {
        self.resource.as_str() == resource_type && self.action.as_str() == action
    }
}

/// Many-to-many link between a role and a permission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePermission {
    mapping_id: Uuid,
    role_id: RoleId,
    permission_id: String,
    created_at: DateTime<Utc>,
}

impl RolePermission {
    /// Creates a mapping with a fresh identifier.
    #[must_use]
    pub fn new(
        role_id: impl Into<RoleId>,
        permission_id: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            mapping_id: Uuid::new_v4(),
            role_id: role_id.into(),
            permission_id: permission_id.into(),
            created_at,
        }
    }

    /// Returns the mapping identifier.
    #[must_use]
    pub fn mapping_id(&self) -> Uuid {
        self.mapping_id
    }

    /// Returns the mapped role.
    #[must_use]
    pub fn role_id(&self) -> &RoleId {
        &self.role_id
    }

    /// Returns the mapped permission.
    #[must_use]
    pub fn permission_id(&self) -> &str {
        self.permission_id.as_str()
    }

    /// Returns the creation instant.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Resource reference split into category and optional instance identifier.
///
/// `"subscription:sub_123"` parses to type `subscription` and instance
/// `sub_123`; a reference without `:` is a bare type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceRef<'a> {
    resource_type: &'a str,
    instance_id: Option<&'a str>,
}

impl<'a> ResourceRef<'a> {
    /// Splits a reference on its first `:`.
    #[must_use]
    pub fn parse(value: &'a str) -> Self {
        match value.split_once(':') {
            Some((resource_type, instance_id)) => Self {
                resource_type,
                instance_id: Some(instance_id),
            },
            None => Self {
                resource_type: value,
                instance_id: None,
            },
        }
    }

    /// Returns the resource category.
    #[must_use]
    pub fn resource_type(&self) -> &'a str {
        self.resource_type
    }

    /// Returns the instance identifier after the first `:`.
    #[must_use]
    pub fn instance_id(&self) -> Option<&'a str> {
        self.instance_id
    }
}
