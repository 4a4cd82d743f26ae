use async_trait::async_trait;
use custodia_application::{AuditLogFilter, AuditLogRepository, EntryOrder};
use custodia_core::{AppError, AppResult};
use custodia_domain::AuditLogEntry;
use tokio::sync::RwLock;
use tracing::warn;
use uuid::Uuid;

/// Append-only in-memory audit log store.
///
/// Entries are held in sequence order; the vector index equals the sequence number.
#[derive(Debug, Default)]
pub struct InMemoryAuditLogRepository {
    entries: RwLock<Vec<AuditLogEntry>>,
}

impl InMemoryAuditLogRepository {
    /// Creates an empty audit log store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditLogRepository for InMemoryAuditLogRepository {
    async fn append_entry(&self, entry: AuditLogEntry) -> AppResult<()> {
        let mut entries = self.entries.write().await;

        let expected_sequence = u64::try_from(entries.len())
            .map_err(|error| AppError::Internal(format!("audit log length overflow: {error}")))?;
        if entry.sequence_number() != expected_sequence {
            warn!(
                expected = expected_sequence,
                found = entry.sequence_number(),
                "rejected audit append with stale sequence number"
            );
            return Err(AppError::Conflict(format!(
                "audit entry sequence {} does not follow tail; expected {expected_sequence}",
                entry.sequence_number()
            )));
        }

        let expected_previous_hash = entries
            .last()
            .map(AuditLogEntry::canonical_hash)
            .transpose()?;
        if entry.previous_hash() != expected_previous_hash.as_deref() {
            warn!(
                sequence_number = entry.sequence_number(),
                "rejected audit append with stale previous hash"
            );
            return Err(AppError::Conflict(format!(
                "audit entry {} does not link to the current tail",
                entry.sequence_number()
            )));
        }

        entries.push(entry);
        Ok(())
    }

    async fn latest_entry(&self) -> AppResult<Option<AuditLogEntry>> {
        Ok(self.entries.read().await.last().cloned())
    }

    async fn find_entry(&self, entry_id: Uuid) -> AppResult<Option<AuditLogEntry>> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .find(|entry| entry.entry_id() == entry_id)
            .cloned())
    }

    async fn list_entries(
        &self,
        filter: &AuditLogFilter,
        order: EntryOrder,
        offset: usize,
        limit: Option<usize>,
    ) -> AppResult<Vec<AuditLogEntry>> {
        let entries = self.entries.read().await;
        let limit = limit.unwrap_or(usize::MAX);

        let matching = entries.iter().filter(|entry| filter.matches(entry));
        let page = match order {
            EntryOrder::OldestFirst => matching.skip(offset).take(limit).cloned().collect(),
            EntryOrder::NewestFirst => matching.rev().skip(offset).take(limit).cloned().collect(),
        };

        Ok(page)
    }

    async fn count_entries(&self, filter: &AuditLogFilter) -> AppResult<usize> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .filter(|entry| filter.matches(entry))
            .count())
    }
}
