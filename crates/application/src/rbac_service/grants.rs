use super::*;

impl RbacService {
    /// Grants a role to a user, optionally scoped to a tenant and expiring.
    ///
    /// Checks run in order: the role must exist, a tenant grant needs an active
    /// membership, the exact `(user, role, scope)` key must be free, and no
    /// separation-of-duty constraint may pair the role with one the user
    /// already holds directly. Concurrent grants are serialized so two grants
    /// cannot both pass the conflict check against the same snapshot.
    pub async fn grant_role(&self, input: GrantRoleInput) -> AppResult<UserRoleAssignment> {
        let GrantRoleInput {
            user_id,
            role_id,
            granted_by,
            tenant_id,
            expires_at,
        } = input;

        if self.repository.find_role(&role_id).await?.is_none() {
            return Err(AppError::RoleNotFound {
                role_id: role_id.as_str().to_owned(),
            });
        }

        if let Some(tenant_id) = tenant_id.as_ref()
            && !self.has_active_membership(&user_id, tenant_id).await?
        {
            return Err(AppError::MembershipRequired {
                user_id,
                tenant_id: tenant_id.clone(),
            });
        }

        let _guard = self.grant_lock.lock().await;

        let existing = self.repository.list_assignments_for_user(&user_id).await?;
        if existing
            .iter()
            .any(|assignment| assignment.has_key(&user_id, &role_id, tenant_id.as_ref()))
        {
            warn!(user_id = %user_id, role_id = %role_id, "duplicate role grant rejected");
            return Err(AppError::DuplicateGrant {
                user_id,
                role_id: role_id.as_str().to_owned(),
                tenant_id,
            });
        }

        let held_role_ids: Vec<&RoleId> = existing
            .iter()
            .map(UserRoleAssignment::role_id)
            .collect();
        for constraint in self.repository.list_sod_constraints().await? {
            if let Some(held_role_id) =
                constraint.conflicting_held_role(&role_id, held_role_ids.iter().copied())
            {
                warn!(
                    user_id = %user_id,
                    role_id = %role_id,
                    held_role_id = %held_role_id,
                    constraint_id = constraint.constraint_id(),
                    "separation of duty violation"
                );
                return Err(AppError::SeparationOfDutyViolation {
                    constraint_id: constraint.constraint_id().to_owned(),
                    constraint_name: constraint.name().to_owned(),
                    requested_role_id: role_id.as_str().to_owned(),
                    held_role_id: held_role_id.as_str().to_owned(),
                });
            }
        }

        let assignment = UserRoleAssignment::new(
            user_id,
            role_id,
            tenant_id,
            granted_by,
            self.clock.now(),
            expires_at,
        )?;
        self.repository.save_assignment(assignment.clone()).await?;

        info!(
            user_id = assignment.user_id(),
            role_id = %assignment.role_id(),
            tenant_id = assignment.tenant_id().map(TenantId::as_str),
            granted_by = assignment.granted_by(),
            "role granted"
        );

        Ok(assignment)
    }

    /// Revokes a user's role and returns whether anything was removed.
    ///
    /// With a tenant only that scope is revoked; without one every scope is.
    pub async fn revoke_role(
        &self,
        user_id: &str,
        role_id: &RoleId,
        tenant_id: Option<&TenantId>,
    ) -> AppResult<bool> {
        let _guard = self.grant_lock.lock().await;
        let removed = self
            .repository
            .remove_assignments(user_id, role_id, tenant_id)
            .await?;

        if removed > 0 {
            info!(
                user_id = %user_id,
                role_id = %role_id,
                tenant_id = tenant_id.map(TenantId::as_str),
                removed,
                "role revoked"
            );
        }

        Ok(removed > 0)
    }

    /// Lists a user's direct assignments, including expired ones.
    pub async fn list_user_assignments(&self, user_id: &str) -> AppResult<Vec<UserRoleAssignment>> {
        self.repository.list_assignments_for_user(user_id).await
    }
}
