//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod compliance_config;
mod compliance_services;
mod in_memory_audit_log_repository;
mod in_memory_rbac_repository;
mod system_clock;

pub use compliance_config::{ComplianceConfig, init_tracing};
pub use compliance_services::ComplianceServices;
pub use in_memory_audit_log_repository::InMemoryAuditLogRepository;
pub use in_memory_rbac_repository::InMemoryRbacRepository;
pub use system_clock::SystemClock;
