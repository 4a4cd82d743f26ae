use super::*;

impl RbacService {
    /// Registers or replaces a role.
    pub async fn seed_role(&self, role: Role) -> AppResult<()> {
        debug!(role_id = %role.role_id(), "seeding role");
        self.repository.save_role(role).await
    }

    /// Registers or replaces a permission.
    pub async fn seed_permission(&self, permission: Permission) -> AppResult<()> {
        debug!(permission_id = permission.permission_id(), "seeding permission");
        self.repository.save_permission(permission).await
    }

    /// Maps a permission onto a role; mapping the same pair twice is a no-op.
    pub async fn seed_role_permission(
        &self,
        role_id: &RoleId,
        permission_id: &str,
    ) -> AppResult<()> {
        let mapping = RolePermission::new(role_id.clone(), permission_id, self.clock.now());
        self.repository.save_role_permission(mapping).await
    }

    /// Adds an inheritance edge where `child_role_id` inherits from `parent_role_id`.
    pub async fn seed_hierarchy_edge(&self, edge: RoleHierarchyEdge) -> AppResult<()> {
        self.repository.save_hierarchy_edge(edge).await
    }

    /// Records or replaces a user's membership in a tenant.
    pub async fn seed_membership(&self, membership: TenantMembership) -> AppResult<()> {
        self.repository.save_membership(membership).await
    }

    /// Records an active membership for a user in a tenant.
    pub async fn activate_membership(
        &self,
        user_id: &str,
        tenant_id: TenantId,
        role_label: &str,
    ) -> AppResult<TenantMembership> {
        let membership = TenantMembership::new(
            user_id,
            tenant_id,
            MembershipState::Active,
            role_label,
            self.clock.now(),
        )?;
        self.repository.save_membership(membership.clone()).await?;
        Ok(membership)
    }

    /// Inserts or replaces a separation-of-duty constraint.
    ///
    /// The constraint is stored as given. Existing assignments are not re-checked.
    pub async fn add_sod_constraint(
        &self,
        constraint: SeparationOfDutyConstraint,
    ) -> AppResult<()> {
        info!(
            constraint_id = constraint.constraint_id(),
            roles = constraint.conflicting_role_ids().len(),
            "separation of duty constraint stored"
        );
        self.repository.save_sod_constraint(constraint).await
    }

    /// Finds a role by id.
    pub async fn get_role(&self, role_id: &RoleId) -> AppResult<Option<Role>> {
        self.repository.find_role(role_id).await
    }

    /// Lists registered roles ordered by id.
    pub async fn list_roles(&self) -> AppResult<Vec<Role>> {
        self.repository.list_roles().await
    }

    /// Lists permissions mapped directly to a role, without inheritance.
    pub async fn list_permissions_for_role(&self, role_id: &RoleId) -> AppResult<Vec<Permission>> {
        if self.repository.find_role(role_id).await?.is_none() {
            return Err(AppError::RoleNotFound {
                role_id: role_id.as_str().to_owned(),
            });
        }

        self.repository.list_permissions_for_role(role_id).await
    }

    /// Lists separation-of-duty constraints ordered by id.
    pub async fn list_sod_constraints(&self) -> AppResult<Vec<SeparationOfDutyConstraint>> {
        self.repository.list_sod_constraints().await
    }

    /// Lists a user's memberships across tenants.
    pub async fn list_memberships_for_user(
        &self,
        user_id: &str,
    ) -> AppResult<Vec<TenantMembership>> {
        self.repository.list_memberships_for_user(user_id).await
    }
}
