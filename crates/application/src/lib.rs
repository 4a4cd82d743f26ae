//! Application services and ports.

#![forbid(unsafe_code)]

mod audit_log_ports;
mod audit_log_service;
mod clock;
mod permission_constraints;
mod rbac_ports;
mod rbac_service;

pub use audit_log_ports::{
    AuditLogFilter, AuditLogRepository, AuditLogSettings, AuditStatistics, EntryOrder,
    RecordAuditEventInput,
};
pub use audit_log_service::AuditLogService;
pub use clock::Clock;
pub use permission_constraints::{
    AllowAllConstraints, ConstraintContext, PermissionConstraintEvaluator,
};
pub use rbac_ports::{GrantRoleInput, PermissionDecision, RbacRepository};
pub use rbac_service::RbacService;
