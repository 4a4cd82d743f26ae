use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use custodia_application::RbacRepository;
use custodia_core::{AppResult, TenantId};
use custodia_domain::{
    Permission, Role, RoleHierarchyEdge, RoleId, RolePermission, SeparationOfDutyConstraint,
    TenantMembership, UserRoleAssignment,
};
use tokio::sync::RwLock;

/// In-memory RBAC repository implementation.
#[derive(Debug, Default)]
pub struct InMemoryRbacRepository {
    roles: RwLock<BTreeMap<RoleId, Role>>,
    permissions: RwLock<HashMap<String, Permission>>,
    role_permissions: RwLock<Vec<RolePermission>>,
    hierarchy_edges: RwLock<Vec<RoleHierarchyEdge>>,
    assignments: RwLock<HashMap<String, Vec<UserRoleAssignment>>>,
    sod_constraints: RwLock<BTreeMap<String, SeparationOfDutyConstraint>>,
    memberships: RwLock<HashMap<(String, TenantId), TenantMembership>>,
}

impl InMemoryRbacRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RbacRepository for InMemoryRbacRepository {
    async fn save_role(&self, role: Role) -> AppResult<()> {
        self.roles.write().await.insert(role.role_id().clone(), role);
        Ok(())
    }

    async fn find_role(&self, role_id: &RoleId) -> AppResult<Option<Role>> {
        Ok(self.roles.read().await.get(role_id).cloned())
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        Ok(self.roles.read().await.values().cloned().collect())
    }

    async fn save_permission(&self, permission: Permission) -> AppResult<()> {
        self.permissions
            .write()
            .await
            .insert(permission.permission_id().to_owned(), permission);
        Ok(())
    }

    async fn save_role_permission(&self, mapping: RolePermission) -> AppResult<()> {
        let mut role_permissions = self.role_permissions.write().await;
        let exists = role_permissions.iter().any(|existing| {
            existing.role_id() == mapping.role_id()
                && existing.permission_id() == mapping.permission_id()
        });

        if !exists {
            role_permissions.push(mapping);
        }

        Ok(())
    }

    async fn list_permissions_for_role(&self, role_id: &RoleId) -> AppResult<Vec<Permission>> {
        let role_permissions = self.role_permissions.read().await;
        let permissions = self.permissions.read().await;

        Ok(role_permissions
            .iter()
            .filter(|mapping| mapping.role_id() == role_id)
            .filter_map(|mapping| permissions.get(mapping.permission_id()).cloned())
            .collect())
    }

    async fn save_hierarchy_edge(&self, edge: RoleHierarchyEdge) -> AppResult<()> {
        let mut hierarchy_edges = self.hierarchy_edges.write().await;
        if !hierarchy_edges.contains(&edge) {
            hierarchy_edges.push(edge);
        }

        Ok(())
    }

    async fn list_hierarchy_edges(&self) -> AppResult<Vec<RoleHierarchyEdge>> {
        Ok(self.hierarchy_edges.read().await.clone())
    }

    async fn save_assignment(&self, assignment: UserRoleAssignment) -> AppResult<()> {
        self.assignments
            .write()
            .await
            .entry(assignment.user_id().to_owned())
            .or_default()
            .push(assignment);
        Ok(())
    }

    async fn list_assignments_for_user(
        &self,
        user_id: &str,
    ) -> AppResult<Vec<UserRoleAssignment>> {
        Ok(self
            .assignments
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn remove_assignments(
        &self,
        user_id: &str,
        role_id: &RoleId,
        tenant_id: Option<&TenantId>,
    ) -> AppResult<usize> {
        let mut assignments = self.assignments.write().await;
        let Some(user_assignments) = assignments.get_mut(user_id) else {
            return Ok(0);
        };

        let before = user_assignments.len();
        user_assignments.retain(|assignment| {
            let in_scope =
                tenant_id.is_none_or(|tenant_id| assignment.tenant_id() == Some(tenant_id));
            !(assignment.role_id() == role_id && in_scope)
        });
        let removed = before - user_assignments.len();

        if user_assignments.is_empty() {
            assignments.remove(user_id);
        }

        Ok(removed)
    }

    async fn save_sod_constraint(&self, constraint: SeparationOfDutyConstraint) -> AppResult<()> {
        self.sod_constraints
            .write()
            .await
            .insert(constraint.constraint_id().to_owned(), constraint);
        Ok(())
    }

    async fn list_sod_constraints(&self) -> AppResult<Vec<SeparationOfDutyConstraint>> {
        Ok(self.sod_constraints.read().await.values().cloned().collect())
    }

    async fn save_membership(&self, membership: TenantMembership) -> AppResult<()> {
        let key = (
            membership.user_id().to_owned(),
            membership.organization_id().clone(),
        );
        self.memberships.write().await.insert(key, membership);
        Ok(())
    }

    async fn find_membership(
        &self,
        user_id: &str,
        tenant_id: &TenantId,
    ) -> AppResult<Option<TenantMembership>> {
        Ok(self
            .memberships
            .read()
            .await
            .get(&(user_id.to_owned(), tenant_id.clone()))
            .cloned())
    }

    async fn list_memberships_for_user(&self, user_id: &str) -> AppResult<Vec<TenantMembership>> {
        let memberships = self.memberships.read().await;

        let mut values: Vec<TenantMembership> = memberships
            .iter()
            .filter_map(|((stored_user_id, _), membership)| {
                (stored_user_id == user_id).then_some(membership.clone())
            })
            .collect();
        values.sort_by(|left, right| left.organization_id().cmp(right.organization_id()));

        Ok(values)
    }
}
