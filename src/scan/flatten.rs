//! Flatten nested service records into finding rows.

use std::collections::HashSet;

use crate::scan::types::{FindingRow, Issue, MISSING, Service, render_value};

/// Expand a service into one row per (CPE, issue) pair.
///
/// CPEs are deduplicated in first-seen order. A service without CPEs still
/// yields rows with CPE `-`, and a service without issues yields a single
/// placeholder issue, so every service appears in the report at least once.
pub fn flatten_service(service: &Service) -> Vec<FindingRow> {
    let mut seen = HashSet::new();
    let mut cpes: Vec<&str> = service
        .cpes
        .iter()
        .map(String::as_str)
        .filter(|cpe| seen.insert(*cpe))
        .collect();
    if cpes.is_empty() {
        cpes.push(MISSING);
    }

    let placeholder = [Issue::default()];
    let issues: &[Issue] = match &service.issues {
        Some(issues) if !issues.is_empty() => issues,
        _ => &placeholder,
    };

    let ip_address = render_value(&service.ip_address);
    let port = render_value(&service.port);
    let domain = render_value(&service.domain);
    let isp = render_value(&service.isp);

    let mut rows = Vec::with_capacity(cpes.len() * issues.len());
    for cpe in &cpes {
        for issue in issues {
            rows.push(FindingRow {
                ip_address: ip_address.clone(),
                port: port.clone(),
                domain: domain.clone(),
                isp: isp.clone(),
                cpe: cpe.to_string(),
                severity: render_value(&issue.severity),
                issue_id: render_value(&issue.issue_id_label),
                cvss2_base_score: render_value(&issue.cvss2_base_score),
                title: render_value(&issue.title),
                first_discovered_date: render_value(&issue.first_discovered_date),
                timestamp: render_value(&issue.timestamp),
                description: render_value(&issue.description),
            });
        }
    }
    rows
}
