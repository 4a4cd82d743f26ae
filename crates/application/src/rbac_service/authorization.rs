use super::*;

impl RbacService {
    /// Decides whether a user may perform `action` on `resource_ref`.
    ///
    /// Denials are returned as decisions. Only store failures surface as errors.
    pub async fn check_permission(
        &self,
        user_id: &str,
        resource_ref: &str,
        action: &str,
        tenant_id: Option<&TenantId>,
    ) -> AppResult<PermissionDecision> {
        if let Some(tenant_id) = tenant_id
            && !self.has_active_membership(user_id, tenant_id).await?
        {
            warn!(
                user_id = %user_id,
                tenant_id = %tenant_id,
                "permission denied: no active membership"
            );
            return Ok(PermissionDecision::deny("not an active member of tenant"));
        }

        let effective_roles = self.list_effective_roles(user_id, tenant_id).await?;
        if effective_roles.is_empty() {
            warn!(user_id = %user_id, "permission denied: no assigned roles");
            return Ok(PermissionDecision::deny("no assigned roles"));
        }

        let resource = ResourceRef::parse(resource_ref);
        let context = ConstraintContext {
            user_id,
            tenant_id,
            resource_type: resource.resource_type(),
            resource_instance_id: resource.instance_id(),
            action,
        };

        let mut granted_by_roles = Vec::new();
        for role in &effective_roles {
            let permissions = self
                .repository
                .list_permissions_for_role(role.role_id())
                .await?;

            let grants = permissions.iter().any(|permission| {
                permission.covers(context.resource_type, action)
                    && self.constraint_evaluator.is_satisfied(permission, &context)
            });

            if grants {
                granted_by_roles.push(role.display_name().as_str().to_owned());
            }
        }

        if granted_by_roles.is_empty() {
            warn!(
                user_id = %user_id,
                resource_type = context.resource_type,
                action = action,
                "permission denied: no matching permission"
            );
            return Ok(PermissionDecision::deny(format!(
                "missing permission '{action}' on '{}'",
                context.resource_type
            )));
        }

        Ok(PermissionDecision::allow(granted_by_roles))
    }

    /// Returns the user's directly assigned roles plus every inherited ancestor.
    ///
    /// Only unexpired assignments in scope count. Global grants apply in every
    /// tenant and an unscoped lookup considers every grant. Roles are returned
    /// in discovery order: direct roles first, then ancestors depth first.
    pub async fn list_effective_roles(
        &self,
        user_id: &str,
        tenant_id: Option<&TenantId>,
    ) -> AppResult<Vec<Role>> {
        if let Some(tenant_id) = tenant_id
            && !self.has_active_membership(user_id, tenant_id).await?
        {
            return Ok(Vec::new());
        }

        let now = self.clock.now();
        let assignments = self.repository.list_assignments_for_user(user_id).await?;
        let direct_role_ids: Vec<RoleId> = assignments
            .iter()
            .filter(|assignment| assignment.applies_to(tenant_id) && assignment.is_active(now))
            .map(|assignment| assignment.role_id().clone())
            .collect();

        if direct_role_ids.is_empty() {
            return Ok(Vec::new());
        }

        let (roles, graph) = self.load_role_graph().await?;
        let closure = graph.ancestors_closure(&direct_role_ids);

        let mut effective_roles = Vec::with_capacity(closure.len());
        for role_id in &closure {
            if let Some(role) = roles.iter().find(|role| role.role_id() == role_id) {
                effective_roles.push(role.clone());
            }
        }

        debug!(
            user_id = %user_id,
            direct = direct_role_ids.len(),
            effective = effective_roles.len(),
            "expanded effective roles"
        );

        Ok(effective_roles)
    }

    /// Returns the distinct permissions carried by the user's effective roles.
    pub async fn list_effective_permissions(
        &self,
        user_id: &str,
        tenant_id: Option<&TenantId>,
    ) -> AppResult<Vec<Permission>> {
        let effective_roles = self.list_effective_roles(user_id, tenant_id).await?;

        let mut seen = HashSet::new();
        let mut permissions = Vec::new();
        for role in &effective_roles {
            for permission in self
                .repository
                .list_permissions_for_role(role.role_id())
                .await?
            {
                if seen.insert(permission.permission_id().to_owned()) {
                    permissions.push(permission);
                }
            }
        }

        Ok(permissions)
    }
}
