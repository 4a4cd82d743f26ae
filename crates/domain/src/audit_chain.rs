use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::AuditLogEntry;

/// Tamper evidence found while walking an audit chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChainIntegrityViolation {
    /// An entry's stored link does not match its predecessor's canonical hash.
    PreviousHashMismatch {
        /// Sequence number of the entry holding the bad link.
        sequence_number: u64,
        /// Canonical hash recomputed from the predecessor.
        expected: String,
        /// Link stored on the entry.
        found: Option<String>,
    },
    /// A predecessor could not be hashed.
    HashUnavailable {
        /// Sequence number of the entry that failed to hash.
        sequence_number: u64,
        /// Failure description.
        message: String,
    },
}

impl Display for ChainIntegrityViolation {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PreviousHashMismatch {
                sequence_number,
                expected,
                found,
            } => write!(
                formatter,
                "entry {sequence_number} links to '{}' but its predecessor hashes to '{expected}'",
                found.as_deref().unwrap_or("<none>")
            ),
            Self::HashUnavailable {
                sequence_number,
                message,
            } => write!(
                formatter,
                "entry {sequence_number} could not be hashed: {message}"
            ),
        }
    }
}

/// Outcome of an integrity check; a broken chain is a result, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainVerification {
    /// Whether every link matched.
    pub valid: bool,
    /// Number of entries walked, up to and including the first violation.
    pub entries_checked: usize,
    /// First violation found, when invalid.
    pub error: Option<ChainIntegrityViolation>,
}

impl ChainVerification {
    fn intact(entries_checked: usize) -> Self {
        Self {
            valid: true,
            entries_checked,
            error: None,
        }
    }

    fn broken(entries_checked: usize, violation: ChainIntegrityViolation) -> Self {
        Self {
            valid: false,
            entries_checked,
            error: Some(violation),
        }
    }
}

/// Verifies hash linkage between consecutive entries.
///
/// Entries are ordered by sequence number first, so input order does not
/// matter. Empty and single-entry inputs are trivially intact. The walk stops
/// at the first violation.
#[must_use]
pub fn verify_chain(entries: &[AuditLogEntry]) -> ChainVerification {
    let mut ordered: Vec<&AuditLogEntry> = entries.iter().collect();
    ordered.sort_by_key(|entry| entry.sequence_number());

    for (index, pair) in ordered.windows(2).enumerate() {
        let (earlier, later) = (pair[0], pair[1]);

        let expected = match earlier.canonical_hash() {
            Ok(hash) => hash,
            Err(error) => {
                return ChainVerification::broken(
                    index + 1,
                    ChainIntegrityViolation::HashUnavailable {
                        sequence_number: earlier.sequence_number(),
                        message: error.to_string(),
                    },
                );
            }
        };

        if later.previous_hash() != Some(expected.as_str()) {
            return ChainVerification::broken(
                index + 2,
                ChainIntegrityViolation::PreviousHashMismatch {
                    sequence_number: later.sequence_number(),
                    expected,
                    found: later.previous_hash().map(str::to_owned),
                },
            );
        }
    }

    ChainVerification::intact(entries.len())
}
