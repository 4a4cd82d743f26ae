use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use custodia_core::{AppError, AppResult, TenantId};
use custodia_domain::{ActorType, AuditLogEntry, AuditSeverity};
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

/// Ordering of listed audit entries by sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOrder {
    /// Ascending sequence (chronological export).
    OldestFirst,
    /// Descending sequence (interactive listing).
    NewestFirst,
}

/// Port for the append-only audit store.
///
/// Append is the only mutation. Stores must never reorder or drop entries.
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// Appends one entry.
    ///
    /// Returns `Conflict` unless the entry's sequence number is exactly one past
    /// the current tail (zero for an empty log) and its `previous_hash` equals
    /// the tail's canonical hash (absent for an empty log).
    async fn append_entry(&self, entry: AuditLogEntry) -> AppResult<()>;

    /// Returns the entry with the highest sequence number.
    async fn latest_entry(&self) -> AppResult<Option<AuditLogEntry>>;

    /// Finds one entry by id.
    async fn find_entry(&self, entry_id: Uuid) -> AppResult<Option<AuditLogEntry>>;

    /// Lists entries matching `filter` in `order`, skipping `offset` and keeping at most `limit`.
    ///
    /// The filter's own `limit`/`offset` fields are ignored; callers resolve them.
    async fn list_entries(
        &self,
        filter: &AuditLogFilter,
        order: EntryOrder,
        offset: usize,
        limit: Option<usize>,
    ) -> AppResult<Vec<AuditLogEntry>>;

    /// Counts entries matching `filter`, ignoring pagination.
    async fn count_entries(&self, filter: &AuditLogFilter) -> AppResult<usize>;
}

/// Filter and pagination parameters for audit reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditLogFilter {
    /// Optional actor filter.
    pub actor_id: Option<String>,
    /// Optional tenant filter.
    pub tenant_id: Option<TenantId>,
    /// Optional action filter.
    pub action: Option<String>,
    /// Optional resource reference filter.
    pub resource_ref: Option<String>,
    /// Optional severity filter.
    pub severity: Option<AuditSeverity>,
    /// Inclusive lower bound on system time.
    pub start_time: Option<DateTime<FixedOffset>>,
    /// Inclusive upper bound on system time.
    pub end_time: Option<DateTime<FixedOffset>>,
    /// Maximum rows returned.
    pub limit: Option<usize>,
    /// Number of rows skipped.
    pub offset: Option<usize>,
}

impl AuditLogFilter {
    /// Filters by actor.
    #[must_use]
    pub fn with_actor(mut self, actor_id: impl Into<String>) -> Self {
        self.actor_id = Some(actor_id.into());
        self
    }

    /// Filters by tenant.
    #[must_use]
    pub fn with_tenant(mut self, tenant_id: TenantId) -> Self {
        self.tenant_id = Some(tenant_id);
        self
    }

    /// Filters by action.
    #[must_use]
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Filters by resource reference.
    #[must_use]
    pub fn with_resource_ref(mut self, resource_ref: impl Into<String>) -> Self {
        self.resource_ref = Some(resource_ref.into());
        self
    }

    /// Filters by severity.
    #[must_use]
    pub fn with_severity(mut self, severity: AuditSeverity) -> Self {
        self.severity = Some(severity);
        self
    }

    /// Filters to an inclusive system-time range given in any offset.
    #[must_use]
    pub fn with_time_range(
        mut self,
        start_time: Option<DateTime<FixedOffset>>,
        end_time: Option<DateTime<FixedOffset>>,
    ) -> Self {
        self.start_time = start_time;
        self.end_time = end_time;
        self
    }

    /// Sets offset pagination.
    #[must_use]
    pub fn paginate(mut self, offset: usize, limit: usize) -> Self {
        self.offset = Some(offset);
        self.limit = Some(limit);
        self
    }

    /// Rejects malformed filter values instead of silently matching nothing.
    pub fn validate(&self) -> AppResult<()> {
        let text_filters = [
            ("actor_id", self.actor_id.as_deref()),
            ("action", self.action.as_deref()),
            ("resource_ref", self.resource_ref.as_deref()),
            ("tenant_id", self.tenant_id.as_ref().map(TenantId::as_str)),
        ];
        for (name, value) in text_filters {
            if value.is_some_and(|value| value.trim().is_empty()) {
                return Err(AppError::Validation(format!(
                    "audit filter '{name}' must not be empty when provided"
                )));
            }
        }

        if let (Some(start_time), Some(end_time)) = (self.start_time, self.end_time)
            && start_time > end_time
        {
            return Err(AppError::Validation(format!(
                "audit filter start_time '{}' is after end_time '{}'",
                start_time.to_rfc3339(),
                end_time.to_rfc3339()
            )));
        }

        if self.limit == Some(0) {
            return Err(AppError::Validation(
                "audit filter limit must be greater than zero".to_owned(),
            ));
        }

        Ok(())
    }

    /// Returns whether an entry satisfies every criterion (pagination excluded).
    #[must_use]
    pub fn matches(&self, entry: &AuditLogEntry) -> bool {
        if self
            .actor_id
            .as_deref()
            .is_some_and(|actor_id| entry.actor_id() != actor_id)
        {
            return false;
        }

        if self
            .tenant_id
            .as_ref()
            .is_some_and(|tenant_id| entry.tenant_id() != Some(tenant_id))
        {
            return false;
        }

        if self
            .action
            .as_deref()
            .is_some_and(|action| entry.action() != action)
        {
            return false;
        }

        if self
            .resource_ref
            .as_deref()
            .is_some_and(|resource_ref| entry.resource_ref() != resource_ref)
        {
            return false;
        }

        if self
            .severity
            .is_some_and(|severity| entry.severity() != severity)
        {
            return false;
        }

        let system_time = entry.system_time();
        if self
            .start_time
            .is_some_and(|start_time| system_time < start_time.with_timezone(&Utc))
        {
            return false;
        }

        if self
            .end_time
            .is_some_and(|end_time| system_time > end_time.with_timezone(&Utc))
        {
            return false;
        }

        true
    }
}

/// Input payload for recording an audit event.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordAuditEventInput {
    /// Acting principal.
    pub actor_id: String,
    /// Acting principal kind.
    pub actor_type: ActorType,
    /// Action verb.
    pub action: String,
    /// Affected resource reference.
    pub resource_ref: String,
    /// Caller payload; only its digest is retained.
    pub payload: Value,
    /// Optional tenant scope.
    pub tenant_id: Option<TenantId>,
    /// Optional metadata retained verbatim on the entry.
    pub metadata: Option<Map<String, Value>>,
    /// Severity, `INFO` by default.
    pub severity: AuditSeverity,
    /// IANA zone for the business timestamp.
    pub tenant_timezone: Option<String>,
}

impl RecordAuditEventInput {
    /// Creates an `INFO` event without tenant, metadata or timezone.
    #[must_use]
    pub fn new(
        actor_id: impl Into<String>,
        actor_type: ActorType,
        action: impl Into<String>,
        resource_ref: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self {
            actor_id: actor_id.into(),
            actor_type,
            action: action.into(),
            resource_ref: resource_ref.into(),
            payload,
            tenant_id: None,
            metadata: None,
            severity: AuditSeverity::Info,
            tenant_timezone: None,
        }
    }

    /// Scopes the event to a tenant.
    #[must_use]
    pub fn in_tenant(mut self, tenant_id: TenantId) -> Self {
        self.tenant_id = Some(tenant_id);
        self
    }

    /// Attaches retained metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Sets the severity.
    #[must_use]
    pub fn with_severity(mut self, severity: AuditSeverity) -> Self {
        self.severity = severity;
        self
    }

    /// Renders the business timestamp in an IANA zone.
    #[must_use]
    pub fn with_timezone(mut self, tenant_timezone: impl Into<String>) -> Self {
        self.tenant_timezone = Some(tenant_timezone.into());
        self
    }
}

/// Aggregate counts over a filtered set of audit entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditStatistics {
    /// Number of matching entries.
    pub total_events: usize,
    /// Count per severity.
    pub by_severity: BTreeMap<AuditSeverity, usize>,
    /// Count per actor.
    pub by_actor: BTreeMap<String, usize>,
    /// Count per action.
    pub by_action: BTreeMap<String, usize>,
}

/// Paging and timezone defaults for the audit service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditLogSettings {
    /// Page size used by `query` when the filter sets no limit.
    pub default_limit: usize,
    /// Upper bound applied to any requested `query` limit.
    pub max_limit: usize,
    /// IANA zone used when a record call supplies none.
    pub default_timezone: Option<String>,
}

impl Default for AuditLogSettings {
    fn default() -> Self {
        Self {
            default_limit: 1_000,
            max_limit: 10_000,
            default_timezone: None,
        }
    }
}
