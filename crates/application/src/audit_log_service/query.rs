use super::*;

impl AuditLogService {
    /// Lists matching entries newest first, paginated.
    ///
    /// A missing limit falls back to the configured default page size, and any
    /// limit is capped at the configured maximum.
    pub async fn query(&self, filter: &AuditLogFilter) -> AppResult<Vec<AuditLogEntry>> {
        filter.validate()?;

        let limit = filter
            .limit
            .unwrap_or(self.settings.default_limit)
            .min(self.settings.max_limit);

        self.repository
            .list_entries(
                filter,
                EntryOrder::NewestFirst,
                filter.offset.unwrap_or(0),
                Some(limit),
            )
            .await
    }

    /// Lists matching entries in chronological order for compliance reporting.
    ///
    /// Explicit offset and limit are honored; otherwise every match is returned.
    pub async fn export(&self, filter: &AuditLogFilter) -> AppResult<Vec<AuditLogEntry>> {
        filter.validate()?;

        self.repository
            .list_entries(
                filter,
                EntryOrder::OldestFirst,
                filter.offset.unwrap_or(0),
                filter.limit,
            )
            .await
    }

    /// Counts entries matching the filter, ignoring pagination.
    pub async fn count(&self, filter: &AuditLogFilter) -> AppResult<usize> {
        filter.validate()?;
        self.repository.count_entries(filter).await
    }

    /// Tallies matching entries per severity, actor and action, ignoring pagination.
    pub async fn get_statistics(&self, filter: &AuditLogFilter) -> AppResult<AuditStatistics> {
        filter.validate()?;

        let entries = self
            .repository
            .list_entries(filter, EntryOrder::OldestFirst, 0, None)
            .await?;

        let mut statistics = AuditStatistics {
            total_events: entries.len(),
            ..AuditStatistics::default()
        };
        for entry in &entries {
            *statistics.by_severity.entry(entry.severity()).or_default() += 1;
            *statistics
                .by_actor
                .entry(entry.actor_id().to_owned())
                .or_default() += 1;
            *statistics
                .by_action
                .entry(entry.action().to_owned())
                .or_default() += 1;
        }

        Ok(statistics)
    }
}
