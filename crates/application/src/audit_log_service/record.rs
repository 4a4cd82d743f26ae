use super::*;

impl AuditLogService {
    /// Appends one event to the log and returns the stored entry.
    ///
    /// Only the payload's digest is kept on the entry. Nothing is
    /// appended when a required field is empty or the timezone is unknown.
    /// Reading the tail and appending happen under one lock, and the store
    /// rejects any entry that does not extend its current tail.
    pub async fn record(&self, input: RecordAuditEventInput) -> AppResult<AuditLogEntry> {
        let RecordAuditEventInput {
            actor_id,
            actor_type,
            action,
            resource_ref,
            payload,
            tenant_id,
            metadata,
            severity,
            tenant_timezone,
        } = input;

        require_audit_field("actor_id", &actor_id)?;
        require_audit_field("action", &action)?;
        require_audit_field("resource_ref", &resource_ref)?;

        let payload_hash = compute_hash(&payload)?;

        let timezone = tenant_timezone
            .as_deref()
            .or(self.settings.default_timezone.as_deref());

        let _guard = self.append_lock.lock().await;

        let timestamp = DualTimestamp::render(self.clock.now(), timezone)?;
        let (previous_hash, sequence_number) = match self.repository.latest_entry().await? {
            Some(tail) => {
                let next = tail.sequence_number().checked_add(1).ok_or_else(|| {
                    AppError::Internal("audit sequence number overflowed".to_owned())
                })?;
                (Some(tail.canonical_hash()?), next)
            }
            None => (None, 0),
        };

        let entry = AuditLogEntry::new(AuditLogEntryInput {
            entry_id: Uuid::new_v4(),
            timestamp,
            actor_id,
            actor_type,
            tenant_id,
            action,
            resource_ref,
            payload_hash,
            metadata,
            severity,
            previous_hash,
            sequence_number,
        })?;

        self.repository.append_entry(entry.clone()).await?;

        info!(
            sequence_number = entry.sequence_number(),
            entry_id = %entry.entry_id(),
            actor_id = entry.actor_id(),
            actor_type = entry.actor_type().as_str(),
            action = entry.action(),
            resource_ref = entry.resource_ref(),
            severity = entry.severity().as_str(),
            "audit entry appended"
        );

        Ok(entry)
    }
}
