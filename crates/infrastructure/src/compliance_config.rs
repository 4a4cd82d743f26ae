use std::env;

use chrono::Utc;
use custodia_application::AuditLogSettings;
use custodia_core::{AppError, AppResult};
use custodia_domain::DualTimestamp;
use tracing_subscriber::EnvFilter;

const AUDIT_DEFAULT_LIMIT: &str = "CUSTODIA_AUDIT_DEFAULT_LIMIT";
const AUDIT_MAX_LIMIT: &str = "CUSTODIA_AUDIT_MAX_LIMIT";
const DEFAULT_TIMEZONE: &str = "CUSTODIA_DEFAULT_TIMEZONE";
const LOG_FILTER: &str = "CUSTODIA_LOG_FILTER";

/// Runtime configuration for the compliance services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplianceConfig {
    /// Paging and timezone defaults for the audit log.
    pub audit: AuditLogSettings,
    /// Tracing filter used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self {
            audit: AuditLogSettings::default(),
            log_filter: "info".to_owned(),
        }
    }
}

impl ComplianceConfig {
    /// Loads configuration from the process environment and an optional `.env` file.
    pub fn load() -> AppResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let default_limit = match read(AUDIT_DEFAULT_LIMIT) {
            Some(value) => positive_limit(AUDIT_DEFAULT_LIMIT, &value)?,
            None => defaults.audit.default_limit,
        };
        let max_limit = match read(AUDIT_MAX_LIMIT) {
            Some(value) => positive_limit(AUDIT_MAX_LIMIT, &value)?,
            None => defaults.audit.max_limit,
        };
        if default_limit > max_limit {
            return Err(AppError::Validation(format!(
                "{AUDIT_DEFAULT_LIMIT} ({default_limit}) must not exceed {AUDIT_MAX_LIMIT} ({max_limit})"
            )));
        }

        let default_timezone = read(DEFAULT_TIMEZONE)
            .map(|value| value.trim().to_owned())
            .map(|timezone| {
                DualTimestamp::render(Utc::now(), Some(&timezone))
                    .map(|_| timezone)
                    .map_err(|error| AppError::Validation(format!("{DEFAULT_TIMEZONE}: {error}")))
            })
            .transpose()?;

        let log_filter = read(LOG_FILTER).unwrap_or(defaults.log_filter);

        Ok(Self {
            audit: AuditLogSettings {
                default_limit,
                max_limit,
                default_timezone,
            },
            log_filter,
        })
    }
}

fn positive_limit(name: &str, value: &str) -> AppResult<usize> {
    match value.trim().parse::<usize>() {
        Ok(limit) if limit > 0 => Ok(limit),
        _ => Err(AppError::Validation(format!(
            "{name} must be a positive integer, got '{value}'"
        ))),
    }
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured filter.
pub fn init_tracing(config: &ComplianceConfig) -> AppResult<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|error| {
            AppError::Internal(format!("failed to install tracing subscriber: {error}"))
        })
}
