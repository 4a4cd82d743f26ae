use std::sync::Arc;

use custodia_core::{AppError, AppResult};
use custodia_domain::{
    AuditLogEntry, AuditLogEntryInput, ChainVerification, DualTimestamp, compute_hash,
    require_audit_field, verify_chain,
};
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::audit_log_ports::{
    AuditLogFilter, AuditLogRepository, AuditLogSettings, AuditStatistics, EntryOrder,
    RecordAuditEventInput,
};
use crate::clock::Clock;

mod integrity;
mod query;
mod record;

/// Application service for the tamper-evident, hash-chained audit log.
#[derive(Clone)]
pub struct AuditLogService {
    repository: Arc<dyn AuditLogRepository>,
    clock: Arc<dyn Clock>,
    settings: AuditLogSettings,
    append_lock: Arc<Mutex<()>>,
}

impl AuditLogService {
    /// Creates a new audit log service from a store and time source.
    #[must_use]
    pub fn new(
        repository: Arc<dyn AuditLogRepository>,
        clock: Arc<dyn Clock>,
        settings: AuditLogSettings,
    ) -> Self {
        Self {
            repository,
            clock,
            settings,
            append_lock: Arc::new(Mutex::new(())),
        }
    }
}
