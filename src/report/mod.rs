//! Report rendering for policy counts, rule listings and scan findings.
//!
//! Rows implement [`TableRow`] so the same writers serve every table; the
//! CSV and workbook backends live in `csv_out` and `xlsx`.

pub mod csv_out;
pub mod xlsx;

use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::aggregate::AggregateCount;
use crate::error::ReportError;
use crate::policy::types::{ConditionKind, PolicyType};

/// Output file format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    #[default]
    Xlsx,
    Csv,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Xlsx => "xlsx",
            Self::Csv => "csv",
        }
    }
}

/// How policy rows are distributed over workbook sheets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum SheetLayout {
    /// One sheet per policy type; types without rows get no sheet.
    #[default]
    PerPolicyType,
    /// A single sheet with every row.
    Unified,
}

/// A single table cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Text(String),
    Count(u64),
    Blank,
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn count(value: Option<u64>) -> Self {
        value.map_or(Self::Blank, Self::Count)
    }

    /// Plain-text rendering used by CSV output.
    pub fn render(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Count(n) => n.to_string(),
            Self::Blank => String::new(),
        }
    }
}

/// A row of a fixed-column table.
pub trait TableRow {
    fn headers() -> &'static [&'static str];
    fn cells(&self) -> Vec<Cell>;
}

// ── Policy report ───────────────────────────────────────────────────

pub const POLICY_EXPLANATION: &[&str] = &[
    "VIP Policies: Whitelisted emails can send emails to any recipient.",
    "Global Policies: Whitelisted senders can send emails to anyone, and anyone can send emails to whitelisted recipient domains or users.",
    "Local Policies: Whitelisted senders can only send emails to whitelisted recipient domains or users.",
    "",
    "Number of Emails Sent: This column represents how many emails were sent by the whitelisted entity.",
    "Number of Emails Received: This column represents how many emails were received by the whitelisted recipient domain or user.",
    "A blank count means the column does not apply to the item, or no mail log was supplied.",
];

/// One line of the policy report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub policy_type: PolicyType,
    pub item_type: &'static str,
    pub item: String,
    pub sent: Option<u64>,
    pub received: Option<u64>,
}

impl TableRow for ReportRow {
    fn headers() -> &'static [&'static str] {
        &[
            "Policy Type",
            "Whitelisted Item Type",
            "Item",
            "Number of Emails Sent",
            "Number of Emails Received",
        ]
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::text(self.policy_type.label()),
            Cell::text(self.item_type),
            Cell::text(&self.item),
            Cell::count(self.sent),
            Cell::count(self.received),
        ]
    }
}

/// "Whitelisted Item Type" column value.
pub fn item_type_label(policy_type: PolicyType, kind: ConditionKind) -> &'static str {
    match (policy_type, kind) {
        (PolicyType::Vip, ConditionKind::SenderEmail) => "Whitelisted Email",
        (_, ConditionKind::SenderEmail) => "Whitelisted Sender Email",
        (_, ConditionKind::SenderDomain) => "Whitelisted Sender Domain",
        (_, ConditionKind::RecipientEmail) => "Whitelisted Recipient Email",
        (_, ConditionKind::RecipientDomain) => "Whitelisted Recipient Domain",
    }
}

/// Turn aggregate counts into report rows, preserving order.
pub fn build_rows(counts: &[AggregateCount]) -> Vec<ReportRow> {
    counts
        .iter()
        .map(|c| ReportRow {
            policy_type: c.policy_type,
            item_type: item_type_label(c.policy_type, c.entry.kind),
            item: c.entry.value.clone(),
            sent: c.sent_count,
            received: c.received_count,
        })
        .collect()
}

/// Sheet name for a policy type in the per-type layout.
pub fn sheet_name(policy_type: PolicyType) -> &'static str {
    match policy_type {
        PolicyType::Vip => "VIP Policy",
        PolicyType::Global => "Global Policy",
        PolicyType::Local => "Local Policy",
    }
}

/// Write the policy report for one export in the requested format.
pub fn write_policy_report(
    rows: &[ReportRow],
    path: &Path,
    format: ReportFormat,
    layout: SheetLayout,
    generated_at: DateTime<Utc>,
) -> Result<(), ReportError> {
    match format {
        ReportFormat::Xlsx => xlsx::write_policy_workbook(rows, layout, path, generated_at)?,
        ReportFormat::Csv => csv_out::write_table_file(rows, path)?,
    }
    info!(path = %path.display(), rows = rows.len(), "Report saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::types::ConditionEntry;

    fn count(
        policy_type: PolicyType,
        kind: ConditionKind,
        value: &str,
        sent: Option<u64>,
        received: Option<u64>,
    ) -> AggregateCount {
        AggregateCount {
            record: 0,
            policy_type,
            entry: ConditionEntry::new(kind, value).unwrap(),
            sent_count: sent,
            received_count: received,
        }
    }

    #[test]
    fn vip_sender_email_has_short_label() {
        assert_eq!(
            item_type_label(PolicyType::Vip, ConditionKind::SenderEmail),
            "Whitelisted Email"
        );
        assert_eq!(
            item_type_label(PolicyType::Global, ConditionKind::SenderEmail),
            "Whitelisted Sender Email"
        );
        assert_eq!(
            item_type_label(PolicyType::Local, ConditionKind::RecipientDomain),
            "Whitelisted Recipient Domain"
        );
    }

    #[test]
    fn builds_rows_in_count_order() {
        let counts = vec![
            count(PolicyType::Global, ConditionKind::SenderDomain, "x.com", Some(4), None),
            count(PolicyType::Global, ConditionKind::RecipientEmail, "r@y.com", None, Some(0)),
        ];
        let rows = build_rows(&counts);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].item, "x.com");
        assert_eq!(rows[0].item_type, "Whitelisted Sender Domain");
        assert_eq!(rows[1].sent, None);
        assert_eq!(rows[1].received, Some(0));
    }

    #[test]
    fn blank_counts_render_empty() {
        let row = ReportRow {
            policy_type: PolicyType::Local,
            item_type: "Whitelisted Sender Email",
            item: "a@x.com".into(),
            sent: Some(0),
            received: None,
        };
        let rendered: Vec<String> = row.cells().iter().map(Cell::render).collect();
        assert_eq!(rendered, vec!["Local", "Whitelisted Sender Email", "a@x.com", "0", ""]);
        assert_eq!(rendered.len(), ReportRow::headers().len());
    }
}
