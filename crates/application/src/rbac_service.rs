use std::collections::HashSet;
use std::sync::Arc;

use custodia_core::{AppError, AppResult, TenantId};
use custodia_domain::{
    MembershipState, Permission, ResourceRef, Role, RoleGraph, RoleHierarchyEdge, RoleId,
    RolePermission, SeparationOfDutyConstraint, TenantMembership, UserRoleAssignment,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::permission_constraints::{
    AllowAllConstraints, ConstraintContext, PermissionConstraintEvaluator,
};
use crate::rbac_ports::{GrantRoleInput, PermissionDecision, RbacRepository};

mod administration;
mod authorization;
mod grants;

/// Application service for hierarchical roles, separation of duty and tenant gating.
#[derive(Clone)]
pub struct RbacService {
    repository: Arc<dyn RbacRepository>,
    clock: Arc<dyn Clock>,
    constraint_evaluator: Arc<dyn PermissionConstraintEvaluator>,
    grant_lock: Arc<Mutex<()>>,
}

impl RbacService {
    /// Creates a service whose permission constraints always pass.
    #[must_use]
    pub fn new(repository: Arc<dyn RbacRepository>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repository,
            clock,
            constraint_evaluator: Arc::new(AllowAllConstraints),
            grant_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Replaces the permission-constraint evaluator.
    #[must_use]
    pub fn with_constraint_evaluator(
        mut self,
        constraint_evaluator: Arc<dyn PermissionConstraintEvaluator>,
    ) -> Self {
        self.constraint_evaluator = constraint_evaluator;
        self
    }

    async fn has_active_membership(&self, user_id: &str, tenant_id: &TenantId) -> AppResult<bool> {
        Ok(self
            .repository
            .find_membership(user_id, tenant_id)
            .await?
            .is_some_and(|membership| membership.is_active()))
    }

    async fn load_role_graph(&self) -> AppResult<(Vec<Role>, RoleGraph)> {
        let roles = self.repository.list_roles().await?;
        let edges = self.repository.list_hierarchy_edges().await?;
        let graph = RoleGraph::from_parts(&roles, &edges);
        Ok((roles, graph))
    }
}

#[cfg(test)]
mod tests;
