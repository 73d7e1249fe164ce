//! Shared types for the policy extraction pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Policy type ─────────────────────────────────────────────────────

/// Whitelist policy family, as encoded in the rule name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PolicyType {
    /// Whitelisted senders may mail anyone.
    #[serde(rename = "VIP")]
    Vip,
    /// Senders and recipients are whitelisted independently.
    Global,
    /// Sender and recipient must both be whitelisted by the same rule.
    Local,
}

impl PolicyType {
    /// All policy types in report order.
    pub const ALL: [PolicyType; 3] = [PolicyType::Vip, PolicyType::Global, PolicyType::Local];

    /// Map a marker suffix to a policy type. `Local2` folds into `Local`.
    pub fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            "VIP" => Some(Self::Vip),
            "Global" => Some(Self::Global),
            "Local" | "Local2" => Some(Self::Local),
            _ => None,
        }
    }

    /// Display label used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Vip => "VIP",
            Self::Global => "Global",
            Self::Local => "Local",
        }
    }
}

impl fmt::Display for PolicyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── Conditions ──────────────────────────────────────────────────────

/// What a whitelisted condition value refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    SenderEmail,
    SenderDomain,
    RecipientEmail,
    RecipientDomain,
}

impl ConditionKind {
    pub fn is_sender(&self) -> bool {
        matches!(self, Self::SenderEmail | Self::SenderDomain)
    }

    pub fn is_recipient(&self) -> bool {
        !self.is_sender()
    }

    pub fn is_domain(&self) -> bool {
        matches!(self, Self::SenderDomain | Self::RecipientDomain)
    }
}

/// A single whitelisted value extracted from a condition region.
///
/// `value` is always trimmed, lowercase and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConditionEntry {
    pub kind: ConditionKind,
    pub value: String,
}

impl ConditionEntry {
    /// Normalize `raw` and build an entry, or `None` if nothing is left.
    pub fn new(kind: ConditionKind, raw: &str) -> Option<Self> {
        let value = raw.trim().to_lowercase();
        if value.is_empty() {
            return None;
        }
        Some(Self { kind, value })
    }
}

// ── Blocks and records ──────────────────────────────────────────────

/// A span of the source document between two block boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawBlock<'a> {
    /// Block text, borrowed from the document.
    pub text: &'a str,
    /// Byte offset of the first character in the document.
    pub offset: usize,
    /// 1-based line number of the first character.
    pub line: usize,
}

/// One parsed whitelist rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRecord {
    pub policy_type: PolicyType,
    /// The literal type token from the rule name (`VIP`, `Global`, `Local`, `Local2`).
    pub marker: String,
    /// Trimmed source line carrying the rule marker.
    pub name: String,
    /// 1-based source line of the rule marker.
    pub line: usize,
    pub conditions: Vec<ConditionEntry>,
}

impl PolicyRecord {
    /// Sender-side entries (emails and domains).
    pub fn senders(&self) -> impl Iterator<Item = &ConditionEntry> {
        self.conditions.iter().filter(|e| e.kind.is_sender())
    }

    /// Recipient-side entries (emails and domains).
    pub fn recipients(&self) -> impl Iterator<Item = &ConditionEntry> {
        self.conditions.iter().filter(|e| e.kind.is_recipient())
    }
}

// ── Rule listing ────────────────────────────────────────────────────

/// Boolean operator separating condition groups in a rule listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionOperator {
    And,
    Or,
}

impl ConditionOperator {
    pub fn from_line(line: &str) -> Option<Self> {
        match line {
            "And" => Some(Self::And),
            "Or" => Some(Self::Or),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::And => "And",
            Self::Or => "Or",
        }
    }
}

/// Condition lines following an optional `And`/`Or` separator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionGroup {
    pub operator: Option<ConditionOperator>,
    pub lines: Vec<String>,
}

impl ConditionGroup {
    /// Render as the operator line (if any) followed by the condition lines.
    pub fn render(&self) -> String {
        let body = self.lines.join("\n");
        match self.operator {
            Some(op) => format!("{}\n{}", op.label(), body),
            None => body,
        }
    }
}

/// A rule as listed in the console export: name, conditions, actions, status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleListing {
    pub name: String,
    pub conditions: Vec<ConditionGroup>,
    pub actions: String,
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local2_folds_into_local() {
        assert_eq!(PolicyType::from_marker("Local2"), Some(PolicyType::Local));
        assert_eq!(PolicyType::from_marker("Local"), Some(PolicyType::Local));
        assert_eq!(PolicyType::from_marker("Local3"), None);
    }

    #[test]
    fn entry_normalizes_value() {
        let entry = ConditionEntry::new(ConditionKind::SenderEmail, "  Alice@Example.COM ").unwrap();
        assert_eq!(entry.value, "alice@example.com");
    }

    #[test]
    fn entry_rejects_blank_value() {
        assert!(ConditionEntry::new(ConditionKind::SenderDomain, "   ").is_none());
    }

    #[test]
    fn group_render_includes_operator() {
        let group = ConditionGroup {
            operator: Some(ConditionOperator::Or),
            lines: vec!["Sender is: a@x.com".into(), "Recipient domain is: y.com".into()],
        };
        assert_eq!(group.render(), "Or\nSender is: a@x.com\nRecipient domain is: y.com");
    }
}
