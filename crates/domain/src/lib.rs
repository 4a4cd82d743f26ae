//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod assignment;
mod audit;
mod audit_chain;
mod hashing;
mod membership;
mod permission;
mod role;
mod role_graph;
mod separation_of_duty;

pub use assignment::UserRoleAssignment;
pub use audit::{
    ActorType, AuditLogEntry, AuditLogEntryInput, AuditSeverity, DualTimestamp,
    require_audit_field,
};
pub use audit_chain::{ChainIntegrityViolation, ChainVerification, verify_chain};
pub use hashing::{canonical_json, compute_hash};
pub use membership::{MembershipState, TenantMembership};
pub use permission::{Permission, ResourceRef, RolePermission};
pub use role::{Role, RoleHierarchyEdge, RoleId};
pub use role_graph::RoleGraph;
pub use separation_of_duty::SeparationOfDutyConstraint;
