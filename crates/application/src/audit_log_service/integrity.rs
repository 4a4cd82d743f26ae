use super::*;

impl AuditLogService {
    /// Verifies the stored chain backing the entries that match `filter`.
    ///
    /// Links are always checked between consecutive stored entries, from the
    /// first entry through the newest one matching `filter`, so a filter only
    /// narrows how far the walk goes. Pagination fields are ignored. A broken
    /// chain is reported in the result, never as an error.
    pub async fn verify_integrity(&self, filter: &AuditLogFilter) -> AppResult<ChainVerification> {
        filter.validate()?;

        let chain = self
            .repository
            .list_entries(&AuditLogFilter::default(), EntryOrder::OldestFirst, 0, None)
            .await?;
        let covered = chain
            .iter()
            .rposition(|entry| filter.matches(entry))
            .map_or(0, |index| index + 1);
        let verification = verify_chain(&chain[..covered]);

        match &verification.error {
            Some(violation) => warn!(
                entries_checked = verification.entries_checked,
                violation = %violation,
                "audit chain integrity violation"
            ),
            None => info!(
                entries_checked = verification.entries_checked,
                "audit chain verified"
            ),
        }

        Ok(verification)
    }

    /// Returns whether the given entries form an intact chain, in any input order.
    #[must_use]
    pub fn verify_chain_integrity(&self, entries: &[AuditLogEntry]) -> bool {
        verify_chain(entries).valid
    }

    /// Finds one entry by id.
    pub async fn get_entry(&self, entry_id: Uuid) -> AppResult<Option<AuditLogEntry>> {
        self.repository.find_entry(entry_id).await
    }

    /// Returns the most recently appended entry.
    pub async fn latest_entry(&self) -> AppResult<Option<AuditLogEntry>> {
        self.repository.latest_entry().await
    }
}
