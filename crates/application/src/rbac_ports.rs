use async_trait::async_trait;
use chrono::{DateTime, Utc};
use custodia_core::{AppResult, TenantId};
use custodia_domain::{
    Permission, Role, RoleHierarchyEdge, RoleId, RolePermission, SeparationOfDutyConstraint,
    TenantMembership, UserRoleAssignment,
};
use serde::Serialize;

/// Repository port for roles, permissions, assignments, constraints and memberships.
///
/// Seeding writes are idempotent upserts keyed by the entity's natural key.
#[async_trait]
pub trait RbacRepository: Send + Sync {
    /// Inserts or replaces a role by id.
    async fn save_role(&self, role: Role) -> AppResult<()>;

    /// Finds one role.
    async fn find_role(&self, role_id: &RoleId) -> AppResult<Option<Role>>;

    /// Lists every registered role, ordered by id.
    async fn list_roles(&self) -> AppResult<Vec<Role>>;

    /// Inserts or replaces a permission by id.
    async fn save_permission(&self, permission: Permission) -> AppResult<()>;

    /// Links a permission to a role; an existing `(role, permission)` link is kept.
    async fn save_role_permission(&self, mapping: RolePermission) -> AppResult<()>;

    /// Lists permissions mapped to a role, in mapping order.
    async fn list_permissions_for_role(&self, role_id: &RoleId) -> AppResult<Vec<Permission>>;

    /// Adds a hierarchy edge; an identical edge is kept once.
    async fn save_hierarchy_edge(&self, edge: RoleHierarchyEdge) -> AppResult<()>;

    /// Lists all hierarchy edges in insertion order.
    async fn list_hierarchy_edges(&self) -> AppResult<Vec<RoleHierarchyEdge>>;

    /// Stores a new assignment.
    async fn save_assignment(&self, assignment: UserRoleAssignment) -> AppResult<()>;

    /// Lists a user's assignments in grant order.
    async fn list_assignments_for_user(&self, user_id: &str)
    -> AppResult<Vec<UserRoleAssignment>>;

    /// Removes a user's assignments of a role and returns how many were removed.
    ///
    /// With `tenant_id` only that scope is removed; without it every scope is.
    async fn remove_assignments(
        &self,
        user_id: &str,
        role_id: &RoleId,
        tenant_id: Option<&TenantId>,
    ) -> AppResult<usize>;

    /// Inserts or replaces a separation-of-duty constraint by id.
    async fn save_sod_constraint(&self, constraint: SeparationOfDutyConstraint) -> AppResult<()>;

    /// Lists all separation-of-duty constraints, ordered by id.
    async fn list_sod_constraints(&self) -> AppResult<Vec<SeparationOfDutyConstraint>>;

    /// Inserts or replaces a membership keyed by `(user, organization)`.
    async fn save_membership(&self, membership: TenantMembership) -> AppResult<()>;

    /// Finds a user's membership in one tenant.
    async fn find_membership(
        &self,
        user_id: &str,
        tenant_id: &TenantId,
    ) -> AppResult<Option<TenantMembership>>;

    /// Lists a user's memberships across tenants.
    async fn list_memberships_for_user(&self, user_id: &str) -> AppResult<Vec<TenantMembership>>;
}

/// Input payload for granting a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantRoleInput {
    /// Grantee.
    pub user_id: String,
    /// Role to grant.
    pub role_id: RoleId,
    /// Actor performing the grant.
    pub granted_by: String,
    /// Tenant scope; `None` grants the role in every tenant.
    pub tenant_id: Option<TenantId>,
    /// Optional expiry for temporary grants.
    pub expires_at: Option<DateTime<Utc>>,
}

impl GrantRoleInput {
    /// Creates a permanent global grant.
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        role_id: impl Into<RoleId>,
        granted_by: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            role_id: role_id.into(),
            granted_by: granted_by.into(),
            tenant_id: None,
            expires_at: None,
        }
    }

    /// Scopes the grant to one tenant.
    #[must_use]
    pub fn in_tenant(mut self, tenant_id: TenantId) -> Self {
        self.tenant_id = Some(tenant_id);
        self
    }

    /// Makes the grant expire at `expires_at`.
    #[must_use]
    pub fn expiring_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }
}

/// Result of a permission check. Denials are normal results, never errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionDecision {
    /// Whether the action is permitted.
    pub allowed: bool,
    /// Denial reason, when not allowed.
    pub reason: Option<String>,
    /// Display names of effective roles that carry a matching permission.
    pub granted_by_roles: Vec<String>,
}

impl PermissionDecision {
    pub(crate) fn allow(granted_by_roles: Vec<String>) -> Self {
        Self {
            allowed: true,
            reason: None,
            granted_by_roles,
        }
    }

    pub(crate) fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
            granted_by_roles: Vec::new(),
        }
    }
}
