//! Condition extraction for a single rule's condition region.
//!
//! A condition line looks like `Sender is: a@x.com, b@x.com`. Labels are
//! matched from one ordered table in a single pass, so extraction order is
//! stable: grouped by kind, source order within a kind.

use std::sync::LazyLock;

use regex::Regex;

use crate::policy::types::{ConditionEntry, ConditionKind};

/// Condition labels recognised in the console export, with the kind each one yields.
pub const CONDITION_LABELS: &[(&str, ConditionKind)] = &[
    ("Sender is", ConditionKind::SenderEmail),
    ("send address contains words", ConditionKind::SenderEmail),
    ("Sender domain is", ConditionKind::SenderDomain),
    ("Recipient address contains words", ConditionKind::RecipientEmail),
    ("Recipient domain is", ConditionKind::RecipientDomain),
];

/// Output order of the extracted lists.
const KIND_ORDER: [ConditionKind; 4] = [
    ConditionKind::SenderEmail,
    ConditionKind::SenderDomain,
    ConditionKind::RecipientEmail,
    ConditionKind::RecipientDomain,
];

static LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    let alternation = CONDITION_LABELS
        .iter()
        .map(|(label, _)| regex::escape(label))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"({alternation}):[ \t]*([^\r\n]*)")).expect("condition label regex")
});

fn kind_for_label(label: &str) -> Option<ConditionKind> {
    CONDITION_LABELS
        .iter()
        .find(|(l, _)| *l == label)
        .map(|(_, kind)| *kind)
}

fn slot(kind: ConditionKind) -> usize {
    match kind {
        ConditionKind::SenderEmail => 0,
        ConditionKind::SenderDomain => 1,
        ConditionKind::RecipientEmail => 2,
        ConditionKind::RecipientDomain => 3,
    }
}

/// The four typed whitelists of one rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionSet {
    pub sender_emails: Vec<String>,
    pub sender_domains: Vec<String>,
    pub recipient_emails: Vec<String>,
    pub recipient_domains: Vec<String>,
}

impl ConditionSet {
    /// Extract all whitelisted values from a condition region.
    ///
    /// Every match of a kind is comma-joined and re-split, so values must not
    /// contain commas themselves. Items are trimmed, lowercased, and empty
    /// items are dropped.
    pub fn extract(region: &str) -> Self {
        let mut raw: [Vec<&str>; 4] = Default::default();
        for caps in LABEL_RE.captures_iter(region) {
            let Some(kind) = kind_for_label(&caps[1]) else {
                continue;
            };
            raw[slot(kind)].push(caps.get(2).map_or("", |m| m.as_str()));
        }

        let mut lists = raw.map(|parts| {
            parts
                .join(",")
                .split(',')
                .map(|item| item.trim().to_lowercase())
                .filter(|item| !item.is_empty())
                .collect::<Vec<_>>()
        });

        Self {
            sender_emails: std::mem::take(&mut lists[0]),
            sender_domains: std::mem::take(&mut lists[1]),
            recipient_emails: std::mem::take(&mut lists[2]),
            recipient_domains: std::mem::take(&mut lists[3]),
        }
    }

    /// Values of a single kind.
    pub fn get(&self, kind: ConditionKind) -> &[String] {
        match kind {
            ConditionKind::SenderEmail => &self.sender_emails,
            ConditionKind::SenderDomain => &self.sender_domains,
            ConditionKind::RecipientEmail => &self.recipient_emails,
            ConditionKind::RecipientDomain => &self.recipient_domains,
        }
    }

    pub fn is_empty(&self) -> bool {
        KIND_ORDER.iter().all(|kind| self.get(*kind).is_empty())
    }

    /// Flatten into tagged entries, grouped by kind.
    pub fn into_entries(self) -> Vec<ConditionEntry> {
        KIND_ORDER
            .iter()
            .flat_map(|kind| {
                self.get(*kind)
                    .iter()
                    .filter_map(|value| ConditionEntry::new(*kind, value))
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

/// Extract the tagged condition entries of a condition region.
pub fn extract_conditions(region: &str) -> Vec<ConditionEntry> {
    ConditionSet::extract(region).into_entries()
}
