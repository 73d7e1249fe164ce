//! CSV output.

use std::io::Write;
use std::path::Path;

use crate::error::ReportError;
use crate::policy::types::RuleListing;
use crate::report::TableRow;

/// Write a table with its header row.
pub fn write_table<T: TableRow, W: Write>(rows: &[T], writer: W) -> Result<(), ReportError> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(T::headers())?;
    for row in rows {
        out.write_record(row.cells().iter().map(|c| c.render()))?;
    }
    out.flush()?;
    Ok(())
}

pub fn write_table_file<T: TableRow>(rows: &[T], path: &Path) -> Result<(), ReportError> {
    let file = std::fs::File::create(path)?;
    write_table(rows, file)
}

/// Write the rule listing: name, actions, status, then one column per
/// condition group up to the longest rule.
pub fn write_rule_listing<W: Write>(rules: &[RuleListing], writer: W) -> Result<(), ReportError> {
    let groups = rules.iter().map(|r| r.conditions.len()).max().unwrap_or(0);

    let mut out = csv::Writer::from_writer(writer);
    let mut header = vec!["Rule Name".to_string(), "Actions".into(), "Status".into()];
    header.extend((1..=groups).map(|i| format!("Condition {i}")));
    out.write_record(&header)?;

    for rule in rules {
        let mut record = vec![rule.name.clone(), rule.actions.clone(), rule.status.clone()];
        record.extend(rule.conditions.iter().map(|g| g.render()));
        record.resize(header.len(), String::new());
        out.write_record(&record)?;
    }
    out.flush()?;
    Ok(())
}

pub fn write_rule_listing_file(rules: &[RuleListing], path: &Path) -> Result<(), ReportError> {
    let file = std::fs::File::create(path)?;
    write_rule_listing(rules, file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::types::{ConditionGroup, ConditionOperator, PolicyType};
    use crate::report::ReportRow;

    #[test]
    fn writes_policy_rows_with_blank_counts() {
        let rows = vec![
            ReportRow {
                policy_type: PolicyType::Vip,
                item_type: "Whitelisted Email",
                item: "a@x.com".into(),
                sent: Some(3),
                received: None,
            },
            ReportRow {
                policy_type: PolicyType::Global,
                item_type: "Whitelisted Recipient Domain",
                item: "y.com".into(),
                sent: None,
                received: Some(0),
            },
        ];
        let mut buf = Vec::new();
        write_table(&rows, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "Policy Type,Whitelisted Item Type,Item,Number of Emails Sent,Number of Emails Received"
        );
        assert_eq!(lines[1], "VIP,Whitelisted Email,a@x.com,3,");
        assert_eq!(lines[2], "Global,Whitelisted Recipient Domain,y.com,,0");
    }

    #[test]
    fn rule_listing_pads_condition_columns() {
        let rules = vec![
            RuleListing {
                name: "X-EPPA-DLP-VIP-A".into(),
                conditions: vec![
                    ConditionGroup {
                        operator: None,
                        lines: vec!["Sender is: a@x.com".into()],
                    },
                    ConditionGroup {
                        operator: Some(ConditionOperator::And),
                        lines: vec!["Recipient domain is: y.com".into()],
                    },
                ],
                actions: "Allow".into(),
                status: "On".into(),
            },
            RuleListing {
                name: "X-EPPA-DLP-VIP-B".into(),
                conditions: vec![],
                actions: String::new(),
                status: "Off".into(),
            },
        ];
        let mut buf = Vec::new();
        write_rule_listing(&rules, &mut buf).unwrap();

        let mut reader = csv::Reader::from_reader(buf.as_slice());
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec!["Rule Name", "Actions", "Status", "Condition 1", "Condition 2"]
        );
        let records: Vec<_> = reader.records().map(Result::unwrap).collect();
        assert_eq!(&records[0][4], "And\nRecipient domain is: y.com");
        assert_eq!(&records[1][2], "Off");
        assert_eq!(&records[1][3], "");
    }
}
