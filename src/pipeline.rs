//! Batch orchestration.
//!
//! Each `*.txt` export in the input directory goes through:
//! 1. read + UTF-8 decode
//! 2. `PolicyParser::parse()` and syntax checks on the extracted entries
//! 3. `aggregate()` against the mail log (blank counts when there is none)
//! 4. report writing, one file per export
//!
//! A file that cannot be read or decoded is logged and skipped; the rest of
//! the batch still runs.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::aggregate::{aggregate, aggregate_without_log};
use crate::config::{ExtractConfig, ScanConfig};
use crate::error::{ConfigError, DocumentError, ReportError, Result};
use crate::maillog::MailLog;
use crate::policy::{PolicyParser, PolicyRecord, list_rules};
use crate::report::{self, ReportFormat, ReportRow, build_rows, csv_out, xlsx};
use crate::scan::{self, HttpScanSource, ScanExport};
use crate::validate::is_valid_entry;

/// Suffix appended to each export's stem to name its report.
const REPORT_SUFFIX: &str = "_DLP_Policies";

const FINDINGS_SHEET: &str = "Scan Findings";

/// Outcome of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub files_processed: usize,
    pub files_failed: usize,
    pub records: usize,
    pub rows: usize,
}

/// Outcome for one export file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub output: PathBuf,
    pub records: usize,
    pub rows: usize,
}

/// Read an export and decode it as UTF-8.
pub fn read_document(path: &Path) -> std::result::Result<String, DocumentError> {
    let bytes = std::fs::read(path).map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    String::from_utf8(bytes).map_err(|source| DocumentError::Encoding {
        path: path.to_path_buf(),
        source,
    })
}

/// `<output_dir>/<name up to the first dot>_DLP_Policies.<ext>`
pub fn report_path(output_dir: &Path, input: &Path, format: ReportFormat) -> PathBuf {
    let file_name = input
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("export");
    let stem = file_name.split('.').next().unwrap_or(file_name);
    output_dir.join(format!("{stem}{REPORT_SUFFIX}.{}", format.extension()))
}

/// List `*.txt` files in a directory, sorted by name.
pub fn list_exports(dir: &Path) -> std::result::Result<Vec<PathBuf>, DocumentError> {
    let io_err = |source| DocumentError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let is_txt = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("txt"));
        if is_txt && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Runs policy extraction over a directory of exports.
pub struct Extractor {
    config: ExtractConfig,
    parser: PolicyParser,
    log: Option<MailLog>,
}

impl Extractor {
    /// Validate the configuration and load the mail log, if any.
    pub fn new(config: ExtractConfig) -> Result<Self> {
        config.validate()?;
        let parser =
            PolicyParser::new(&config.rule_prefix).map_err(|e| ConfigError::InvalidValue {
                key: "rule_prefix".into(),
                message: e.to_string(),
            })?;
        let log = match &config.log_path {
            Some(path) => {
                let log = MailLog::from_path(path)?;
                info!(path = %path.display(), rows = log.len(), "Mail log loaded");
                Some(log)
            }
            None => None,
        };
        Ok(Self {
            config,
            parser,
            log,
        })
    }

    /// Build an extractor around an already loaded log, skipping path checks.
    pub fn with_log(config: ExtractConfig, log: Option<MailLog>) -> Result<Self> {
        let parser =
            PolicyParser::new(&config.rule_prefix).map_err(|e| ConfigError::InvalidValue {
                key: "rule_prefix".into(),
                message: e.to_string(),
            })?;
        Ok(Self {
            config,
            parser,
            log,
        })
    }

    /// Parse an export and check every entry's syntax.
    pub fn parse_records(&self, text: &str) -> Vec<PolicyRecord> {
        let mut records = self.parser.parse(text);
        for record in &mut records {
            record.conditions.retain(|entry| {
                if is_valid_entry(entry) {
                    return true;
                }
                warn!(
                    rule = %record.name,
                    item = %entry.value,
                    kind = ?entry.kind,
                    "Whitelisted item failed syntax check"
                );
                !self.config.drop_invalid
            });
        }
        records
    }

    /// Parse, aggregate and build report rows for one export's text.
    pub fn process_text(&self, text: &str) -> (Vec<PolicyRecord>, Vec<ReportRow>) {
        let records = self.parse_records(text);
        let counts = match &self.log {
            Some(log) => aggregate(&records, log, self.config.match_mode),
            None => aggregate_without_log(&records),
        };
        let rows = build_rows(&counts);
        (records, rows)
    }

    /// Process one export file and write its report.
    pub fn process_file(&self, path: &Path) -> Result<FileReport> {
        let text = read_document(path)?;
        let (records, rows) = self.process_text(&text);
        let output = report_path(&self.config.output_dir, path, self.config.format);
        report::write_policy_report(
            &rows,
            &output,
            self.config.format,
            self.config.layout,
            Utc::now(),
        )?;
        Ok(FileReport {
            output,
            records: records.len(),
            rows: rows.len(),
        })
    }

    /// Process every export in the input directory.
    pub fn run(&self) -> Result<RunSummary> {
        std::fs::create_dir_all(&self.config.output_dir).map_err(ReportError::from)?;
        let files = list_exports(&self.config.input_dir)?;
        if files.is_empty() {
            warn!(dir = %self.config.input_dir.display(), "No .txt exports found");
        }

        let mut summary = RunSummary::default();
        for path in &files {
            match self.process_file(path) {
                Ok(report) => {
                    debug!(
                        input = %path.display(),
                        records = report.records,
                        rows = report.rows,
                        "Processed export"
                    );
                    summary.files_processed += 1;
                    summary.records += report.records;
                    summary.rows += report.rows;
                }
                Err(e) => {
                    error!(input = %path.display(), error = %e, "Failed to process export");
                    summary.files_failed += 1;
                }
            }
        }

        info!(
            processed = summary.files_processed,
            failed = summary.files_failed,
            records = summary.records,
            "Extraction finished"
        );
        Ok(summary)
    }
}

/// Write the rule listing CSV for one export. Returns the number of rules.
pub fn export_rule_listing(input: &Path, output: &Path) -> Result<usize> {
    let text = read_document(input)?;
    let rules = list_rules(&text);
    csv_out::write_rule_listing_file(&rules, output)?;
    info!(output = %output.display(), rules = rules.len(), "Rule listing saved");
    Ok(rules.len())
}

/// Page through the scan API and write the flattened findings.
pub async fn export_scan(
    config: &ScanConfig,
    output: &Path,
    format: ReportFormat,
) -> Result<ScanExport> {
    config.validate()?;
    let source = HttpScanSource::new(config)?;
    info!(url = %source.url(), "Fetching scan results");
    let export = scan::collect_findings(&source, config.max_pages).await?;

    match format {
        ReportFormat::Xlsx => xlsx::write_table_workbook(&export.rows, FINDINGS_SHEET, output)?,
        ReportFormat::Csv => csv_out::write_table_file(&export.rows, output)?,
    }
    if !export.complete {
        warn!(pages = export.pages, "Scan export is incomplete");
    }
    info!(output = %output.display(), rows = export.rows.len(), "Scan findings saved");
    Ok(export)
}
