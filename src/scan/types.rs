//! Scan API response types and the flattened finding row.

use serde::Deserialize;
use serde_json::Value;

use crate::report::{Cell, TableRow};

/// Placeholder for fields the API omits.
pub const MISSING: &str = "-";

/// One page of the service listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScanPage {
    /// Opaque token for the next page; absent or null on the last page.
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default)]
    pub services: Vec<Service>,
}

/// An exposed service. Scalar fields are kept as raw JSON since the API
/// returns ports and scores as numbers or strings depending on the source.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Service {
    #[serde(default)]
    pub ip_address: Option<Value>,
    #[serde(default)]
    pub port: Option<Value>,
    #[serde(default)]
    pub domain: Option<Value>,
    #[serde(default)]
    pub isp: Option<Value>,
    #[serde(default)]
    pub cpes: Vec<String>,
    #[serde(default)]
    pub issues: Option<Vec<Issue>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Issue {
    #[serde(default)]
    pub severity: Option<Value>,
    #[serde(default)]
    pub issue_id_label: Option<Value>,
    #[serde(default)]
    pub cvss2_base_score: Option<Value>,
    #[serde(default)]
    pub title: Option<Value>,
    #[serde(default)]
    pub first_discovered_date: Option<Value>,
    #[serde(default)]
    pub timestamp: Option<Value>,
    #[serde(default)]
    pub description: Option<Value>,
}

/// Render a JSON scalar for a report cell; missing and null become `-`.
pub fn render_value(value: &Option<Value>) -> String {
    match value {
        None | Some(Value::Null) => MISSING.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// One (service, CPE, issue) combination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindingRow {
    pub ip_address: String,
    pub port: String,
    pub domain: String,
    pub isp: String,
    pub cpe: String,
    pub severity: String,
    pub issue_id: String,
    pub cvss2_base_score: String,
    pub title: String,
    pub first_discovered_date: String,
    pub timestamp: String,
    pub description: String,
}

impl TableRow for FindingRow {
    fn headers() -> &'static [&'static str] {
        &[
            "IP Address",
            "Port",
            "Domain",
            "ISP",
            "CPE",
            "Issue Severity",
            "Issue ID",
            "CVSS2 Base Score",
            "Issue Title",
            "First Discovered Date",
            "Timestamp",
            "Description",
        ]
    }

    fn cells(&self) -> Vec<Cell> {
        [
            &self.ip_address,
            &self.port,
            &self.domain,
            &self.isp,
            &self.cpe,
            &self.severity,
            &self.issue_id,
            &self.cvss2_base_score,
            &self.title,
            &self.first_discovered_date,
            &self.timestamp,
            &self.description,
        ]
        .into_iter()
        .map(Cell::text)
        .collect()
    }
}
