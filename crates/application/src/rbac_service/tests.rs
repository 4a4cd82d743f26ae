use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use custodia_core::{AppError, AppResult, TenantId};
use custodia_domain::{
    MembershipState, Permission, Role, RoleHierarchyEdge, RoleId, RolePermission,
    SeparationOfDutyConstraint, TenantMembership, UserRoleAssignment,
};
use tokio::sync::Mutex;

use crate::clock::Clock;
use crate::permission_constraints::{ConstraintContext, PermissionConstraintEvaluator};
use crate::rbac_ports::{GrantRoleInput, RbacRepository};

use super::RbacService;

#[derive(Default)]
struct FakeRbacRepository {
    roles: Mutex<Vec<Role>>,
    permissions: Mutex<Vec<Permission>>,
    role_permissions: Mutex<Vec<RolePermission>>,
    edges: Mutex<Vec<RoleHierarchyEdge>>,
    assignments: Mutex<Vec<UserRoleAssignment>>,
    constraints: Mutex<Vec<SeparationOfDutyConstraint>>,
    memberships: Mutex<Vec<TenantMembership>>,
}

#[async_trait]
impl RbacRepository for FakeRbacRepository {
    async fn save_role(&self, role: Role) -> AppResult<()> {
        let mut roles = self.roles.lock().await;
        roles.retain(|existing| existing.role_id() != role.role_id());
        roles.push(role);
        Ok(())
    }

    async fn find_role(&self, role_id: &RoleId) -> AppResult<Option<Role>> {
        Ok(self
            .roles
            .lock()
            .await
            .iter()
            .find(|role| role.role_id() == role_id)
            .cloned())
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        let mut roles = self.roles.lock().await.clone();
        roles.sort_by(|left, right| left.role_id().cmp(right.role_id()));
        Ok(roles)
    }

    async fn save_permission(&self, permission: Permission) -> AppResult<()> {
        let mut permissions = self.permissions.lock().await;
        permissions.retain(|existing| existing.permission_id() != permission.permission_id());
        permissions.push(permission);
        Ok(())
    }

    async fn save_role_permission(&self, mapping: RolePermission) -> AppResult<()> {
        let mut role_permissions = self.role_permissions.lock().await;
        if !role_permissions.iter().any(|existing| {
            existing.role_id() == mapping.role_id()
                && existing.permission_id() == mapping.permission_id()
        }) {
            role_permissions.push(mapping);
        }
        Ok(())
    }

    async fn list_permissions_for_role(&self, role_id: &RoleId) -> AppResult<Vec<Permission>> {
        let role_permissions = self.role_permissions.lock().await;
        let permissions = self.permissions.lock().await;
        Ok(role_permissions
            .iter()
            .filter(|mapping| mapping.role_id() == role_id)
            .filter_map(|mapping| {
                permissions
                    .iter()
                    .find(|permission| permission.permission_id() == mapping.permission_id())
                    .cloned()
            })
            .collect())
    }

    async fn save_hierarchy_edge(&self, edge: RoleHierarchyEdge) -> AppResult<()> {
        let mut edges = self.edges.lock().await;
        if !edges.contains(&edge) {
            edges.push(edge);
        }
        Ok(())
    }

    async fn list_hierarchy_edges(&self) -> AppResult<Vec<RoleHierarchyEdge>> {
        Ok(self.edges.lock().await.clone())
    }

    async fn save_assignment(&self, assignment: UserRoleAssignment) -> AppResult<()> {
        self.assignments.lock().await.push(assignment);
        Ok(())
    }

    async fn list_assignments_for_user(
        &self,
        user_id: &str,
    ) -> AppResult<Vec<UserRoleAssignment>> {
        Ok(self
            .assignments
            .lock()
            .await
            .iter()
            .filter(|assignment| assignment.user_id() == user_id)
            .cloned()
            .collect())
    }

    async fn remove_assignments(
        &self,
        user_id: &str,
        role_id: &RoleId,
        tenant_id: Option<&TenantId>,
    ) -> AppResult<usize> {
        let mut assignments = self.assignments.lock().await;
        let before = assignments.len();
        assignments.retain(|assignment| {
            !(assignment.user_id() == user_id
                && assignment.role_id() == role_id
                && tenant_id.is_none_or(|tenant_id| assignment.tenant_id() == Some(tenant_id)))
        });
        Ok(before - assignments.len())
    }

    async fn save_sod_constraint(&self, constraint: SeparationOfDutyConstraint) -> AppResult<()> {
        let mut constraints = self.constraints.lock().await;
        constraints.retain(|existing| existing.constraint_id() != constraint.constraint_id());
        constraints.push(constraint);
        Ok(())
    }

    async fn list_sod_constraints(&self) -> AppResult<Vec<SeparationOfDutyConstraint>> {
        Ok(self.constraints.lock().await.clone())
    }

    async fn save_membership(&self, membership: TenantMembership) -> AppResult<()> {
        let mut memberships = self.memberships.lock().await;
        memberships.retain(|existing| {
            !(existing.user_id() == membership.user_id()
                && existing.organization_id() == membership.organization_id())
        });
        memberships.push(membership);
        Ok(())
    }

    async fn find_membership(
        &self,
        user_id: &str,
        tenant_id: &TenantId,
    ) -> AppResult<Option<TenantMembership>> {
        Ok(self
            .memberships
            .lock()
            .await
            .iter()
            .find(|membership| {
                membership.user_id() == user_id && membership.organization_id() == tenant_id
            })
            .cloned())
    }

    async fn list_memberships_for_user(&self, user_id: &str) -> AppResult<Vec<TenantMembership>> {
        Ok(self
            .memberships
            .lock()
            .await
            .iter()
            .filter(|membership| membership.user_id() == user_id)
            .cloned()
            .collect())
    }
}

struct FixedClock(DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

struct DenyConstrainedPermissions;

impl PermissionConstraintEvaluator for DenyConstrainedPermissions {
    fn is_satisfied(&self, permission: &Permission, _context: &ConstraintContext<'_>) -> bool {
        permission.constraints().is_none()
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
        .single()
        .unwrap_or_else(|| unreachable!())
}

fn org(tenant_id: &str) -> TenantId {
    TenantId::new(tenant_id).unwrap_or_else(|_| unreachable!())
}

fn service() -> RbacService {
    RbacService::new(
        Arc::new(FakeRbacRepository::default()),
        Arc::new(FixedClock(now())),
    )
}

fn role(role_id: &str, display_name: &str) -> Role {
    Role::new(role_id, display_name, now()).unwrap_or_else(|_| unreachable!())
}

fn permission(permission_id: &str, resource: &str, action: &str) -> Permission {
    Permission::new(permission_id, resource, action, now()).unwrap_or_else(|_| unreachable!())
}

async fn seed_billing_roles(service: &RbacService) {
    let roles = [
        role("viewer", "Viewer"),
        role("editor", "Editor").with_parent("viewer"),
        role("admin", "Admin"),
        role("approver", "Approver"),
        role("contributor", "Contributor"),
    ];
    for role in roles {
        assert!(service.seed_role(role).await.is_ok());
    }

    assert!(
        service
            .seed_hierarchy_edge(RoleHierarchyEdge::new("editor", "admin", 1))
            .await
            .is_ok()
    );

    let permissions = [
        permission("subscription.read", "subscription", "read"),
        permission("subscription.pause", "subscription", "pause"),
        permission("invoice.void", "invoice", "void"),
    ];
    for permission in permissions {
        assert!(service.seed_permission(permission).await.is_ok());
    }

    for (role_id, permission_id) in [
        ("viewer", "subscription.read"),
        ("editor", "subscription.pause"),
        ("admin", "invoice.void"),
        ("approver", "invoice.void"),
    ] {
        assert!(
            service
                .seed_role_permission(&RoleId::from(role_id), permission_id)
                .await
                .is_ok()
        );
    }
}

fn role_ids(roles: &[Role]) -> Vec<&str> {
    roles.iter().map(|role| role.role_id().as_str()).collect()
}

#[tokio::test]
async fn effective_roles_follow_parent_pointers_and_edges() {
    let service = service();
    seed_billing_roles(&service).await;
    assert!(
        service
            .grant_role(GrantRoleInput::new("alice", "admin", "root"))
            .await
            .is_ok()
    );

    let effective = service
        .list_effective_roles("alice", None)
        .await
        .unwrap_or_default();
    assert_eq!(role_ids(&effective), vec!["admin", "editor", "viewer"]);

    let again = service
        .list_effective_roles("alice", None)
        .await
        .unwrap_or_default();
    assert_eq!(effective, again);
}

#[tokio::test]
async fn inherited_permission_is_granted_and_names_the_role() {
    let service = service();
    seed_billing_roles(&service).await;
    assert!(
        service
            .grant_role(GrantRoleInput::new("alice", "admin", "root"))
            .await
            .is_ok()
    );

    let decision = service
        .check_permission("alice", "subscription:sub_123", "read", None)
        .await
        .unwrap_or_else(|_| unreachable!());

    assert!(decision.allowed);
    assert_eq!(decision.reason, None);
    assert_eq!(decision.granted_by_roles, vec!["Viewer".to_owned()]);
}

#[tokio::test]
async fn check_permission_denies_without_roles_or_matching_permission() {
    let service = service();
    seed_billing_roles(&service).await;

    let no_roles = service
        .check_permission("bob", "subscription:sub_1", "read", None)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(!no_roles.allowed);
    assert_eq!(no_roles.reason.as_deref(), Some("no assigned roles"));

    assert!(
        service
            .grant_role(GrantRoleInput::new("bob", "viewer", "root"))
            .await
            .is_ok()
    );
    let missing = service
        .check_permission("bob", "invoice:inv_9", "void", None)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(!missing.allowed);
    assert!(missing.granted_by_roles.is_empty());
    let reason = missing.reason.unwrap_or_default();
    assert!(reason.contains("void"));
    assert!(reason.contains("invoice"));
}

#[tokio::test]
async fn tenant_check_requires_active_membership_even_with_global_roles() {
    let service = service();
    seed_billing_roles(&service).await;
    let tenant = org("org_acme");
    assert!(
        service
            .grant_role(GrantRoleInput::new("alice", "admin", "root"))
            .await
            .is_ok()
    );

    let denied = service
        .check_permission("alice", "subscription:sub_1", "read", Some(&tenant))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(!denied.allowed);
    assert_eq!(
        denied.reason.as_deref(),
        Some("not an active member of tenant")
    );

    let paused = TenantMembership::new(
        "alice",
        tenant.clone(),
        MembershipState::Paused,
        "member",
        now(),
    )
    .unwrap_or_else(|_| unreachable!());
    assert!(service.seed_membership(paused).await.is_ok());
    let still_denied = service
        .check_permission("alice", "subscription:sub_1", "read", Some(&tenant))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(!still_denied.allowed);
    assert!(
        service
            .list_effective_roles("alice", Some(&tenant))
            .await
            .unwrap_or_default()
            .is_empty()
    );

    assert!(
        service
            .activate_membership("alice", tenant.clone(), "member")
            .await
            .is_ok()
    );
    let allowed = service
        .check_permission("alice", "subscription:sub_1", "read", Some(&tenant))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(allowed.allowed);
}

#[tokio::test]
async fn tenant_scoped_grant_applies_only_in_its_tenant() {
    let service = service();
    seed_billing_roles(&service).await;
    let acme = org("org_acme");
    let globex = org("org_globex");
    for tenant in [&acme, &globex] {
        assert!(
            service
                .activate_membership("carol", tenant.clone(), "member")
                .await
                .is_ok()
        );
    }
    assert!(
        service
            .grant_role(GrantRoleInput::new("carol", "editor", "root").in_tenant(acme.clone()))
            .await
            .is_ok()
    );

    let in_acme = service
        .check_permission("carol", "subscription:sub_1", "pause", Some(&acme))
        .await
        .unwrap_or_else(|_| unreachable!());
    let in_globex = service
        .check_permission("carol", "subscription:sub_1", "pause", Some(&globex))
        .await
        .unwrap_or_else(|_| unreachable!());
    let unscoped = service
        .check_permission("carol", "subscription:sub_1", "pause", None)
        .await
        .unwrap_or_else(|_| unreachable!());

    assert!(in_acme.allowed);
    assert!(!in_globex.allowed);
    assert!(unscoped.allowed);
}

#[tokio::test]
async fn expired_assignment_is_not_effective() {
    let service = service();
    seed_billing_roles(&service).await;
    assert!(
        service
            .grant_role(
                GrantRoleInput::new("dave", "viewer", "root")
                    .expiring_at(now() - Duration::minutes(1)),
            )
            .await
            .is_ok()
    );

    let decision = service
        .check_permission("dave", "subscription:sub_1", "read", None)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(!decision.allowed);
    assert_eq!(decision.reason.as_deref(), Some("no assigned roles"));
    assert_eq!(
        service
            .list_user_assignments("dave")
            .await
            .unwrap_or_default()
            .len(),
        1
    );
}

#[tokio::test]
async fn grant_rejects_unknown_role_and_missing_membership() {
    let service = service();
    seed_billing_roles(&service).await;

    let unknown = service
        .grant_role(GrantRoleInput::new("alice", "ghost", "root"))
        .await;
    assert!(matches!(unknown, Err(AppError::RoleNotFound { .. })));

    let no_membership = service
        .grant_role(GrantRoleInput::new("alice", "viewer", "root").in_tenant(org("org_acme")))
        .await;
    assert!(matches!(
        no_membership,
        Err(AppError::MembershipRequired { .. })
    ));
}

#[tokio::test]
async fn duplicate_grant_is_rejected_per_scope() {
    let service = service();
    seed_billing_roles(&service).await;
    let acme = org("org_acme");
    let globex = org("org_globex");
    for tenant in [&acme, &globex] {
        assert!(
            service
                .activate_membership("erin", tenant.clone(), "member")
                .await
                .is_ok()
        );
    }

    assert!(
        service
            .grant_role(GrantRoleInput::new("erin", "viewer", "root"))
            .await
            .is_ok()
    );
    let duplicate = service
        .grant_role(GrantRoleInput::new("erin", "viewer", "root"))
        .await;
    assert!(matches!(
        duplicate,
        Err(AppError::DuplicateGrant {
            tenant_id: None,
            ..
        })
    ));

    assert!(
        service
            .grant_role(GrantRoleInput::new("erin", "viewer", "root").in_tenant(acme))
            .await
            .is_ok()
    );
    assert!(
        service
            .grant_role(GrantRoleInput::new("erin", "viewer", "root").in_tenant(globex))
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn separation_of_duty_blocks_conflicting_roles_for_one_user() {
    let service = service();
    seed_billing_roles(&service).await;
    let constraint = SeparationOfDutyConstraint::new(
        "sod_invoice",
        "approve-vs-contribute",
        vec![RoleId::from("approver"), RoleId::from("contributor")],
        now(),
    )
    .unwrap_or_else(|_| unreachable!());
    assert!(service.add_sod_constraint(constraint).await.is_ok());

    assert!(
        service
            .grant_role(GrantRoleInput::new("frank", "approver", "root"))
            .await
            .is_ok()
    );
    let conflicting = service
        .grant_role(GrantRoleInput::new("frank", "contributor", "root"))
        .await;
    match conflicting {
        Err(AppError::SeparationOfDutyViolation {
            constraint_id,
            held_role_id,
            ..
        }) => {
            assert_eq!(constraint_id, "sod_invoice");
            assert_eq!(held_role_id, "approver");
        }
        other => panic!("expected separation of duty violation, got {other:?}"),
    }

    assert!(
        service
            .grant_role(GrantRoleInput::new("grace", "contributor", "root"))
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn concurrent_conflicting_grants_admit_only_one() {
    let service = service();
    seed_billing_roles(&service).await;
    let constraint = SeparationOfDutyConstraint::new(
        "sod_invoice",
        "approve-vs-contribute",
        vec![RoleId::from("approver"), RoleId::from("contributor")],
        now(),
    )
    .unwrap_or_else(|_| unreachable!());
    assert!(service.add_sod_constraint(constraint).await.is_ok());

    let first = service.clone();
    let second = service.clone();
    let (left, right) = tokio::join!(
        tokio::spawn(async move {
            first
                .grant_role(GrantRoleInput::new("heidi", "approver", "root"))
                .await
        }),
        tokio::spawn(async move {
            second
                .grant_role(GrantRoleInput::new("heidi", "contributor", "root"))
                .await
        }),
    );

    let outcomes = [
        left.unwrap_or_else(|_| unreachable!()),
        right.unwrap_or_else(|_| unreachable!()),
    ];
    assert_eq!(outcomes.iter().filter(|outcome| outcome.is_ok()).count(), 1);
    assert_eq!(
        service
            .list_user_assignments("heidi")
            .await
            .unwrap_or_default()
            .len(),
        1
    );
}

#[tokio::test]
async fn revoke_without_tenant_removes_every_scope() {
    let service = service();
    seed_billing_roles(&service).await;
    let acme = org("org_acme");
    assert!(
        service
            .activate_membership("ivan", acme.clone(), "member")
            .await
            .is_ok()
    );
    assert!(
        service
            .grant_role(GrantRoleInput::new("ivan", "viewer", "root"))
            .await
            .is_ok()
    );
    assert!(
        service
            .grant_role(GrantRoleInput::new("ivan", "viewer", "root").in_tenant(acme.clone()))
            .await
            .is_ok()
    );
    let viewer = RoleId::from("viewer");

    let scoped = service.revoke_role("ivan", &viewer, Some(&acme)).await;
    assert_eq!(scoped.ok(), Some(true));
    assert_eq!(
        service
            .list_user_assignments("ivan")
            .await
            .unwrap_or_default()
            .len(),
        1
    );

    assert!(
        service
            .grant_role(GrantRoleInput::new("ivan", "viewer", "root").in_tenant(acme))
            .await
            .is_ok()
    );
    let everywhere = service.revoke_role("ivan", &viewer, None).await;
    assert_eq!(everywhere.ok(), Some(true));
    assert!(
        service
            .list_user_assignments("ivan")
            .await
            .unwrap_or_default()
            .is_empty()
    );

    let nothing = service.revoke_role("ivan", &viewer, None).await;
    assert_eq!(nothing.ok(), Some(false));
}

#[tokio::test]
async fn cyclic_hierarchy_terminates() {
    let service = service();
    for role in [
        role("a", "A").with_parent("b"),
        role("b", "B").with_parent("c"),
        role("c", "C"),
    ] {
        assert!(service.seed_role(role).await.is_ok());
    }
    assert!(
        service
            .seed_hierarchy_edge(RoleHierarchyEdge::new("a", "c", 1))
            .await
            .is_ok()
    );
    assert!(
        service
            .grant_role(GrantRoleInput::new("judy", "a", "root"))
            .await
            .is_ok()
    );

    let effective = service
        .list_effective_roles("judy", None)
        .await
        .unwrap_or_default();
    assert_eq!(role_ids(&effective), vec!["a", "b", "c"]);
}

#[tokio::test]
async fn effective_permissions_are_distinct() {
    let service = service();
    seed_billing_roles(&service).await;
    assert!(
        service
            .grant_role(GrantRoleInput::new("kim", "admin", "root"))
            .await
            .is_ok()
    );
    assert!(
        service
            .grant_role(GrantRoleInput::new("kim", "approver", "root"))
            .await
            .is_ok()
    );

    let permissions = service
        .list_effective_permissions("kim", None)
        .await
        .unwrap_or_default();
    let ids: Vec<&str> = permissions
        .iter()
        .map(Permission::permission_id)
        .collect();

    assert_eq!(
        ids,
        vec!["invoice.void", "subscription.pause", "subscription.read"]
    );
}

#[tokio::test]
async fn constraint_evaluator_can_withhold_a_permission() {
    let repository = Arc::new(FakeRbacRepository::default());
    let service = RbacService::new(repository, Arc::new(FixedClock(now())))
        .with_constraint_evaluator(Arc::new(DenyConstrainedPermissions));

    assert!(service.seed_role(role("support", "Support")).await.is_ok());
    let mut owner_only = serde_json::Map::new();
    owner_only.insert("owner".to_owned(), serde_json::Value::Bool(true));
    assert!(
        service
            .seed_permission(
                permission("subscription.cancel", "subscription", "cancel")
                    .with_constraints(owner_only)
            )
            .await
            .is_ok()
    );
    assert!(
        service
            .seed_role_permission(&RoleId::from("support"), "subscription.cancel")
            .await
            .is_ok()
    );
    assert!(
        service
            .grant_role(GrantRoleInput::new("leo", "support", "root"))
            .await
            .is_ok()
    );

    let decision = service
        .check_permission("leo", "subscription:sub_1", "cancel", None)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(!decision.allowed);
}

#[tokio::test]
async fn list_permissions_for_unknown_role_is_not_found() {
    let service = service();
    let result = service
        .list_permissions_for_role(&RoleId::from("ghost"))
        .await;
    assert!(matches!(result, Err(AppError::RoleNotFound { .. })));
}
