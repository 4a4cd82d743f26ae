use custodia_core::TenantId;
use custodia_domain::Permission;

/// Request details available to fine-grained permission constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstraintContext<'a> {
    /// User being authorized.
    pub user_id: &'a str,
    /// Tenant scope of the check.
    pub tenant_id: Option<&'a TenantId>,
    /// Resource category parsed from the reference.
    pub resource_type: &'a str,
    /// Resource instance parsed from the reference.
    pub resource_instance_id: Option<&'a str>,
    /// Requested action.
    pub action: &'a str,
}

/// Extension point deciding whether a permission's `constraints` hold.
pub trait PermissionConstraintEvaluator: Send + Sync {
    /// Returns whether the permission's constraints are satisfied for the request.
    fn is_satisfied(&self, permission: &Permission, context: &ConstraintContext<'_>) -> bool;
}

/// Evaluator that treats every constraint as satisfied.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAllConstraints;

impl PermissionConstraintEvaluator for AllowAllConstraints {
    fn is_satisfied(&self, _permission: &Permission, _context: &ConstraintContext<'_>) -> bool {
        true
    }
}
