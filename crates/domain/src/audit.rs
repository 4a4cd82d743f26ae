use std::str::FromStr;

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use chrono_tz::Tz;
use custodia_core::{AppError, AppResult, NonEmptyString, TenantId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::compute_hash;

/// Kind of principal that performed an audited action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorType {
    /// Human user.
    User,
    /// Automated agent acting for a user or tenant.
    Agent,
    /// The platform itself.
    System,
}

impl ActorType {
    /// Returns a stable storage value for this actor type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Agent => "agent",
            Self::System => "system",
        }
    }
}

impl FromStr for ActorType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user" => Ok(Self::User),
            "agent" => Ok(Self::Agent),
            "system" => Ok(Self::System),
            _ => Err(AppError::Validation(format!("unknown actor type '{value}'"))),
        }
    }
}

/// Audit entry severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditSeverity {
    /// Routine event.
    #[default]
    Info,
    /// Event worth reviewing.
    Warning,
    /// Event requiring attention.
    Critical,
}

impl AuditSeverity {
    /// Returns a stable storage value for this severity.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Critical => "CRITICAL",
        }
    }
}

impl FromStr for AuditSeverity {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "INFO" => Ok(Self::Info),
            "WARNING" => Ok(Self::Warning),
            "CRITICAL" => Ok(Self::Critical),
            _ => Err(AppError::Validation(format!(
                "unknown audit severity '{value}'"
            ))),
        }
    }
}

/// Instant recorded both in UTC and in the tenant's local zone.
///
/// `system_time` orders the log; `business_time` is for display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DualTimestamp {
    business_time: DateTime<FixedOffset>,
    system_time: DateTime<Utc>,
}

impl DualTimestamp {
    /// Renders `system_time` into the IANA zone `timezone`, or UTC when absent.
    pub fn render(system_time: DateTime<Utc>, timezone: Option<&str>) -> AppResult<Self> {
        let business_time = match timezone {
            Some(name) => {
                let zone = Tz::from_str(name.trim()).map_err(|error| {
                    AppError::Validation(format!("unknown timezone '{name}': {error}"))
                })?;
                system_time.with_timezone(&zone).fixed_offset()
            }
            None => system_time.fixed_offset(),
        };

        Ok(Self {
            business_time,
            system_time,
        })
    }

    /// Returns the tenant-local rendering.
    #[must_use]
    pub fn business_time(&self) -> DateTime<FixedOffset> {
        self.business_time
    }

    /// Returns the UTC ordering instant.
    #[must_use]
    pub fn system_time(&self) -> DateTime<Utc> {
        self.system_time
    }
}

/// Validates a required audit field, naming it when empty.
pub fn require_audit_field(field: &'static str, value: &str) -> AppResult<NonEmptyString> {
    NonEmptyString::new(value).map_err(|_| AppError::MissingAuditField { field })
}

/// Fully resolved values for a new audit entry.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditLogEntryInput {
    /// Unique entry identifier.
    pub entry_id: Uuid,
    /// Dual timestamp of the event.
    pub timestamp: DualTimestamp,
    /// Acting principal identifier.
    pub actor_id: String,
    /// Acting principal kind.
    pub actor_type: ActorType,
    /// Optional tenant scope.
    pub tenant_id: Option<TenantId>,
    /// Action verb, e.g. `subscription.pause`.
    pub action: String,
    /// Affected resource reference, e.g. `subscription:sub_123`.
    pub resource_ref: String,
    /// Digest of the caller payload.
    pub payload_hash: String,
    /// Retained caller metadata.
    pub metadata: Option<Map<String, Value>>,
    /// Severity.
    pub severity: AuditSeverity,
    /// Canonical hash of the preceding entry.
    pub previous_hash: Option<String>,
    /// Position in the log, starting at zero.
    pub sequence_number: u64,
}

/// Immutable, hash-linked audit log entry.
///
/// The raw payload is never part of an entry; only its digest is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    entry_id: Uuid,
    timestamp: DualTimestamp,
    actor_id: NonEmptyString,
    actor_type: ActorType,
    tenant_id: Option<TenantId>,
    action: NonEmptyString,
    resource_ref: NonEmptyString,
    payload_hash: String,
    metadata: Option<Map<String, Value>>,
    severity: AuditSeverity,
    previous_hash: Option<String>,
    sequence_number: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CanonicalEntryProjection<'a> {
    id: String,
    system_time: String,
    business_time: String,
    actor_id: &'a str,
    action: &'a str,
    resource_ref: &'a str,
    payload_hash: &'a str,
    sequence_number: u64,
}

impl AuditLogEntry {
    /// Creates an entry, rejecting empty actor, action or resource fields.
    pub fn new(input: AuditLogEntryInput) -> AppResult<Self> {
        Ok(Self {
            actor_id: require_audit_field("actor_id", &input.actor_id)?,
            action: require_audit_field("action", &input.action)?,
            resource_ref: require_audit_field("resource_ref", &input.resource_ref)?,
            entry_id: input.entry_id,
            timestamp: input.timestamp,
            actor_type: input.actor_type,
            tenant_id: input.tenant_id,
            payload_hash: input.payload_hash,
            metadata: input.metadata,
            severity: input.severity,
            previous_hash: input.previous_hash,
            sequence_number: input.sequence_number,
        })
    }

    /// Returns the entry identifier.
    #[must_use]
    pub fn entry_id(&self) -> Uuid {
        self.entry_id
    }

    /// Returns the dual timestamp.
    #[must_use]
    pub fn timestamp(&self) -> &DualTimestamp {
        &self.timestamp
    }

    /// Returns the UTC ordering instant.
    #[must_use]
    pub fn system_time(&self) -> DateTime<Utc> {
        self.timestamp.system_time()
    }

    /// Returns the acting principal.
    #[must_use]
    pub fn actor_id(&self) -> &str {
        self.actor_id.as_str()
    }

    /// Returns the acting principal kind.
    #[must_use]
    pub fn actor_type(&self) -> ActorType {
        self.actor_type
    }

    /// Returns the tenant scope.
    #[must_use]
    pub fn tenant_id(&self) -> Option<&TenantId> {
        self.tenant_id.as_ref()
    }

    /// Returns the action verb.
    #[must_use]
    pub fn action(&self) -> &str {
        self.action.as_str()
    }

    /// Returns the resource reference.
    #[must_use]
    pub fn resource_ref(&self) -> &str {
        self.resource_ref.as_str()
    }

    /// Returns the payload digest.
    #[must_use]
    pub fn payload_hash(&self) -> &str {
        self.payload_hash.as_str()
    }

    /// Returns retained caller metadata.
    #[must_use]
    pub fn metadata(&self) -> Option<&Map<String, Value>> {
        self.metadata.as_ref()
    }

    /// Returns the severity.
    #[must_use]
    pub fn severity(&self) -> AuditSeverity {
        self.severity
    }

    /// Returns the predecessor's canonical hash; `None` only for the first entry.
    #[must_use]
    pub fn previous_hash(&self) -> Option<&str> {
        self.previous_hash.as_deref()
    }

    /// Returns the log position.
    #[must_use]
    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    /// Computes the digest that the next entry stores as its `previous_hash`.
    ///
    /// The projection covers id, both timestamps (RFC 3339, millisecond
    /// precision; `system_time` with a `Z` suffix, `business_time` with its own
    /// offset), actor id, action, resource reference, payload hash and sequence
    /// number. Changing this projection invalidates every stored chain.
    pub fn canonical_hash(&self) -> AppResult<String> {
        compute_hash(&CanonicalEntryProjection {
            id: self.entry_id.to_string(),
            system_time: self
                .timestamp
                .system_time
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            business_time: self
                .timestamp
                .business_time
                .to_rfc3339_opts(SecondsFormat::Millis, false),
            actor_id: self.actor_id.as_str(),
            action: self.action.as_str(),
            resource_ref: self.resource_ref.as_str(),
            payload_hash: self.payload_hash.as_str(),
            sequence_number: self.sequence_number,
        })
    }

    #[cfg(test)]
    pub(crate) fn tamper_previous_hash(&mut self, previous_hash: Option<String>) {
        self.previous_hash = previous_hash;
    }
}
