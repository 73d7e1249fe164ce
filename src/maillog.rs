//! Email transaction log loading.
//!
//! The log is a CSV export with a header row. Only the sender and recipients
//! columns are used. Recipient cells come in several shapes depending on the
//! exporting tool: `a@x.com, b@y.com`, `a@x.com; b@y.com`, or a list literal
//! such as `['a@x.com', 'b@y.com']`.

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::LogError;

const SENDER_COLUMNS: &[&str] = &["sender"];
const RECIPIENT_COLUMNS: &[&str] = &["recipients", "recipient"];

/// One mail transaction. All addresses are trimmed and lowercase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRow {
    pub sender: String,
    pub recipients: Vec<String>,
}

impl LogRow {
    pub fn new(sender: &str, recipients: &str) -> Self {
        Self {
            sender: sender.trim().to_lowercase(),
            recipients: parse_recipients(recipients),
        }
    }
}

/// A fully loaded mail log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailLog {
    pub rows: Vec<LogRow>,
}

impl MailLog {
    pub fn from_rows(rows: Vec<LogRow>) -> Self {
        Self { rows }
    }

    /// Load a mail log CSV from disk.
    pub fn from_path(path: &Path) -> Result<Self, LogError> {
        let file = std::fs::File::open(path)?;
        let log = Self::from_reader(file)?;
        debug!(path = %path.display(), rows = log.rows.len(), "Loaded mail log");
        Ok(log)
    }

    /// Load a mail log CSV from any reader.
    ///
    /// Records the CSV reader cannot split are skipped with a warning. Short
    /// rows are kept with the missing cells treated as empty, and a recipients
    /// cell that is not UTF-8 becomes an empty list so the sender still counts.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, LogError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let sender_idx = find_column(&headers, SENDER_COLUMNS).ok_or_else(|| {
            LogError::MissingColumn {
                column: "Sender".into(),
            }
        })?;
        let recipients_idx = find_column(&headers, RECIPIENT_COLUMNS).ok_or_else(|| {
            LogError::MissingColumn {
                column: "Recipients".into(),
            }
        })?;

        let mut rows = Vec::new();
        for (index, record) in csv_reader.byte_records().enumerate() {
            let record = match record {
                Ok(r) => r,
                Err(e) => {
                    warn!(row = index + 1, error = %e, "Skipping unreadable mail log row");
                    continue;
                }
            };
            let sender = String::from_utf8_lossy(record.get(sender_idx).unwrap_or_default());
            let cell = record.get(recipients_idx).unwrap_or_default();
            let recipients = match std::str::from_utf8(cell) {
                Ok(cell) => cell,
                Err(e) => {
                    warn!(
                        row = index + 1,
                        error = %e,
                        "Recipients cell is not UTF-8, treating as empty"
                    );
                    ""
                }
            };
            rows.push(LogRow::new(&sender, recipients));
        }

        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn find_column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| names.iter().any(|n| h.eq_ignore_ascii_case(n)))
}

/// Normalize a recipients cell into a list of lowercase addresses.
///
/// Never fails: anything unrecognisable ends up as an empty list.
pub fn parse_recipients(cell: &str) -> Vec<String> {
    let trimmed = cell.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(trimmed);

    inner
        .split([',', ';'])
        .map(|item| item.trim().trim_matches(|c: char| c == '\'' || c == '"').trim())
        .filter(|item| !item.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_delimited_recipients() {
        assert_eq!(
            parse_recipients(" A@x.com, b@y.com ,"),
            vec!["a@x.com", "b@y.com"]
        );
    }

    #[test]
    fn parses_semicolon_delimited_recipients() {
        assert_eq!(parse_recipients("a@x.com;b@y.com"), vec!["a@x.com", "b@y.com"]);
    }

    #[test]
    fn parses_list_literal_recipients() {
        assert_eq!(
            parse_recipients(r#"['a@x.com', "B@y.com"]"#),
            vec!["a@x.com", "b@y.com"]
        );
    }

    #[test]
    fn unparseable_recipients_become_empty() {
        assert!(parse_recipients("").is_empty());
        assert!(parse_recipients("[]").is_empty());
        assert!(parse_recipients(" , ; ").is_empty());
    }

    #[test]
    fn loads_rows_from_csv() {
        let data = "Timestamp,Sender,Recipients\n\
                    2024-01-01,Alice@X.com,\"b@y.com, c@z.com\"\n\
                    2024-01-02,bob@x.com,d@y.com\n";
        let log = MailLog::from_reader(data.as_bytes()).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log.rows[0].sender, "alice@x.com");
        assert_eq!(log.rows[0].recipients, vec!["b@y.com", "c@z.com"]);
        assert_eq!(log.rows[1].recipients, vec!["d@y.com"]);
    }

    #[test]
    fn finds_columns_case_insensitively() {
        let data = "SENDER,recipient\na@x.com,b@y.com\n";
        let log = MailLog::from_reader(data.as_bytes()).unwrap();
        assert_eq!(log.rows[0].recipients, vec!["b@y.com"]);
    }

    #[test]
    fn short_rows_keep_empty_recipients() {
        let data = "Sender,Recipients\na@x.com\n";
        let log = MailLog::from_reader(data.as_bytes()).unwrap();
        assert_eq!(log.len(), 1);
        assert!(log.rows[0].recipients.is_empty());
    }

    #[test]
    fn non_utf8_recipients_keep_the_row() {
        let mut data = b"Sender,Recipients\nvip@x.com,b@y.com\nvip@x.com,".to_vec();
        data.extend_from_slice(&[0xff, 0xfe]);
        data.extend_from_slice(b"\nvip@x.com,c@y.com\n");

        let log = MailLog::from_reader(data.as_slice()).unwrap();
        assert_eq!(log.len(), 3);
        assert_eq!(log.rows[1].sender, "vip@x.com");
        assert!(log.rows[1].recipients.is_empty());
        assert_eq!(log.rows[2].recipients, vec!["c@y.com"]);
    }

    #[test]
    fn non_utf8_recipients_still_count_for_vip_sender() {
        use crate::aggregate::{MatchMode, aggregate};
        use crate::policy::PolicyParser;

        let mut data = b"Sender,Recipients\nvip@x.com,b@y.com\nvip@x.com,".to_vec();
        data.extend_from_slice(&[0xff, 0xfe]);
        data.extend_from_slice(b"\nvip@x.com,c@y.com\n");
        let log = MailLog::from_reader(data.as_slice()).unwrap();

        let export = "ACME-EPPA-DLP-VIP-Execs\nConditions\nSender is: vip@x.com\nActions\nAllow\nOn\n";
        let records = PolicyParser::default().parse(export);
        let counts = aggregate(&records, &log, MatchMode::Exact);
        assert_eq!(counts[0].sent_count, Some(3));
    }

    #[test]
    fn missing_column_is_an_error() {
        let data = "From,To\na@x.com,b@y.com\n";
        let err = MailLog::from_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, LogError::MissingColumn { .. }));
    }
}
