//! Send/receive counts per whitelisted entry.
//!
//! Join rules depend on the policy type:
//! - VIP: senders count every mail they sent, recipients unconstrained
//! - Global: senders count mail to this rule's whitelisted recipients;
//!   recipients count mail from anyone
//! - Local: both sides must match the same rule
//!
//! A Global rule without recipient entries leaves its senders unrestricted:
//! every mail they sent counts, rather than the 0 an intersection with the
//! empty recipient set would give.
//!
//! Counts are numbers of log rows. A direction that does not apply to an
//! entry is `None`, which the reports render as a blank cell.

use serde::{Deserialize, Serialize};

use crate::maillog::{LogRow, MailLog};
use crate::policy::types::{ConditionEntry, PolicyRecord, PolicyType};

/// How email-kind entries are compared against log addresses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Address equals the whitelisted value.
    #[default]
    Exact,
    /// Address contains the whitelisted value. Reproduces older reports,
    /// which over-count (`bob@x.com` also matches `jimbob@x.com`).
    Contains,
}

/// Counts for one (record, entry) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateCount {
    /// Index of the record in the parsed sequence.
    pub record: usize,
    pub policy_type: PolicyType,
    pub entry: ConditionEntry,
    pub sent_count: Option<u64>,
    pub received_count: Option<u64>,
}

fn domain_of(address: &str) -> Option<&str> {
    address.rsplit_once('@').map(|(_, domain)| domain)
}

/// Whether a log address matches a whitelisted entry.
///
/// Domain entries compare against the part after the last `@`. Email entries
/// without an `@` are bare domains in practice and compare the same way
/// under [`MatchMode::Exact`].
pub fn entry_matches(entry: &ConditionEntry, address: &str, mode: MatchMode) -> bool {
    if address.is_empty() {
        return false;
    }
    let value = entry.value.as_str();
    if entry.kind.is_domain() {
        return domain_of(address) == Some(value);
    }
    match mode {
        MatchMode::Contains => address.contains(value),
        MatchMode::Exact if value.contains('@') => address == value,
        MatchMode::Exact => domain_of(address) == Some(value),
    }
}

fn sender_matches_any(row: &LogRow, entries: &[&ConditionEntry], mode: MatchMode) -> bool {
    entries.iter().any(|e| entry_matches(e, &row.sender, mode))
}

fn recipient_matches_any(row: &LogRow, entries: &[&ConditionEntry], mode: MatchMode) -> bool {
    row.recipients
        .iter()
        .any(|r| entries.iter().any(|e| entry_matches(e, r, mode)))
}

fn count_rows(log: &MailLog, predicate: impl Fn(&LogRow) -> bool) -> u64 {
    log.rows.iter().filter(|row| predicate(row)).count() as u64
}

fn count_entry(
    record: &PolicyRecord,
    entry: &ConditionEntry,
    senders: &[&ConditionEntry],
    recipients: &[&ConditionEntry],
    log: &MailLog,
    mode: MatchMode,
) -> (Option<u64>, Option<u64>) {
    let this = [entry];

    if entry.kind.is_sender() {
        let sent = match record.policy_type {
            PolicyType::Vip => count_rows(log, |row| sender_matches_any(row, &this, mode)),
            PolicyType::Global => count_rows(log, |row| {
                sender_matches_any(row, &this, mode)
                    && (recipients.is_empty() || recipient_matches_any(row, recipients, mode))
            }),
            PolicyType::Local => count_rows(log, |row| {
                sender_matches_any(row, &this, mode) && recipient_matches_any(row, recipients, mode)
            }),
        };
        (Some(sent), None)
    } else {
        let received = match record.policy_type {
            PolicyType::Vip | PolicyType::Global => {
                count_rows(log, |row| recipient_matches_any(row, &this, mode))
            }
            PolicyType::Local => count_rows(log, |row| {
                recipient_matches_any(row, &this, mode) && sender_matches_any(row, senders, mode)
            }),
        };
        (None, Some(received))
    }
}

/// Compute counts for every entry of every record against a mail log.
pub fn aggregate(records: &[PolicyRecord], log: &MailLog, mode: MatchMode) -> Vec<AggregateCount> {
    let mut counts = Vec::new();
    for (index, record) in records.iter().enumerate() {
        let senders: Vec<&ConditionEntry> = record.senders().collect();
        let recipients: Vec<&ConditionEntry> = record.recipients().collect();

        for entry in &record.conditions {
            let (sent_count, received_count) =
                count_entry(record, entry, &senders, &recipients, log, mode);
            counts.push(AggregateCount {
                record: index,
                policy_type: record.policy_type,
                entry: entry.clone(),
                sent_count,
                received_count,
            });
        }
    }
    counts
}

/// One blank count per entry, for reports produced without a mail log.
pub fn aggregate_without_log(records: &[PolicyRecord]) -> Vec<AggregateCount> {
    records
        .iter()
        .enumerate()
        .flat_map(|(index, record)| {
            record.conditions.iter().map(move |entry| AggregateCount {
                record: index,
                policy_type: record.policy_type,
                entry: entry.clone(),
                sent_count: None,
                received_count: None,
            })
        })
        .collect()
}
