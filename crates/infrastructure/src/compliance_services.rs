use std::sync::Arc;

use custodia_application::{AuditLogService, Clock, RbacService};
use tracing::info;

use crate::{ComplianceConfig, InMemoryAuditLogRepository, InMemoryRbacRepository, SystemClock};

/// Explicitly constructed RBAC and audit services sharing one time source.
#[derive(Clone)]
pub struct ComplianceServices {
    /// Role, separation-of-duty and membership service.
    pub rbac: RbacService,
    /// Hash-chained audit log service.
    pub audit_log: AuditLogService,
}

impl ComplianceServices {
    /// Builds both services over fresh in-memory stores and the system clock.
    #[must_use]
    pub fn in_memory(config: &ComplianceConfig) -> Self {
        Self::in_memory_with_clock(config, Arc::new(SystemClock))
    }

    /// Builds both services over fresh in-memory stores and the given clock.
    #[must_use]
    pub fn in_memory_with_clock(config: &ComplianceConfig, clock: Arc<dyn Clock>) -> Self {
        let rbac = RbacService::new(Arc::new(InMemoryRbacRepository::new()), clock.clone());
        let audit_log = AuditLogService::new(
            Arc::new(InMemoryAuditLogRepository::new()),
            clock,
            config.audit.clone(),
        );

        info!(
            default_limit = config.audit.default_limit,
            max_limit = config.audit.max_limit,
            default_timezone = config.audit.default_timezone.as_deref(),
            "compliance services initialised"
        );

        Self { rbac, audit_log }
    }
}
