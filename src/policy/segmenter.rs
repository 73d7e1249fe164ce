//! Rule-block segmentation and classification.
//!
//! The console export has no explicit record separator. A block ends right
//! after an `Actions` token followed by whitespace, so the actions body and
//! on/off status of a rule land at the head of the next block. Rule markers
//! look like `ACME-EPPA-DLP-Global-Partners`.
//!
//! Known limitation: the word `Actions` inside a condition value also ends a
//! block. That matches how the exports have always been split and is kept.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::policy::conditions::extract_conditions;
use crate::policy::types::{PolicyRecord, PolicyType, RawBlock};

/// Product prefix used by the console when naming DLP rules.
pub const DEFAULT_RULE_PREFIX: &str = "EPPA";

static BOUNDARY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Actions\s+").expect("block boundary regex"));

static CONDITIONS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)Conditions(.*?)(?:Actions|\z)").expect("condition region regex")
});

const ACTIONS_TOKEN: &str = "Actions";

/// Splits a policy export into blocks and turns each recognised block into a
/// [`PolicyRecord`].
#[derive(Debug, Clone)]
pub struct PolicyParser {
    marker_re: Regex,
}

impl PolicyParser {
    /// Build a parser for rules named `-<prefix>-DLP-<Type>`.
    pub fn new(prefix: &str) -> Result<Self, regex::Error> {
        let head = if prefix.is_empty() {
            String::new()
        } else {
            format!("-{}", regex::escape(prefix))
        };
        let marker_re = Regex::new(&format!("{head}-DLP-(VIP|Global|Local2|Local)"))?;
        Ok(Self { marker_re })
    }

    /// Split a document into candidate blocks, preserving order.
    ///
    /// The whitespace run after each `Actions` token is consumed by the
    /// boundary and belongs to neither block.
    pub fn split_blocks<'a>(&self, text: &'a str) -> Vec<RawBlock<'a>> {
        let mut blocks = Vec::new();
        let mut start = 0;
        let mut line = 1;

        for boundary in BOUNDARY_RE.find_iter(text) {
            let end = boundary.start() + ACTIONS_TOKEN.len();
            blocks.push(RawBlock {
                text: &text[start..end],
                offset: start,
                line,
            });
            line += count_newlines(&text[start..boundary.end()]);
            start = boundary.end();
        }

        blocks.push(RawBlock {
            text: &text[start..],
            offset: start,
            line,
        });
        blocks
    }

    /// Classify a block and extract its conditions.
    ///
    /// Returns `None` for blocks without a rule marker (headers, footers,
    /// action bodies); those are not errors.
    pub fn parse_block(&self, block: &RawBlock<'_>) -> Option<PolicyRecord> {
        let Some(caps) = self.marker_re.captures(block.text) else {
            debug!(
                offset = block.offset,
                line = block.line,
                "Skipping block without a rule marker"
            );
            return None;
        };

        let whole = caps.get(0)?;
        let marker = caps.get(1)?.as_str();
        let policy_type = PolicyType::from_marker(marker)?;

        let region = condition_region(block.text);
        let conditions = extract_conditions(region);
        let line = block.line + count_newlines(&block.text[..whole.start()]);

        if conditions.is_empty() {
            debug!(line, marker, "Rule has no whitelist conditions");
        }

        Some(PolicyRecord {
            policy_type,
            marker: marker.to_string(),
            name: enclosing_line(block.text, whole.start(), whole.end()).to_string(),
            line,
            conditions,
        })
    }

    /// Parse a whole document into policy records, in source order.
    pub fn parse(&self, text: &str) -> Vec<PolicyRecord> {
        let blocks = self.split_blocks(text);
        let records: Vec<PolicyRecord> = blocks.iter().filter_map(|b| self.parse_block(b)).collect();
        debug!(
            blocks = blocks.len(),
            records = records.len(),
            "Segmented policy export"
        );
        records
    }
}

impl Default for PolicyParser {
    fn default() -> Self {
        Self::new(DEFAULT_RULE_PREFIX).expect("default rule marker regex")
    }
}

/// The text strictly between `Conditions` and the following `Actions`.
///
/// Runs to the end of the block when no `Actions` follows, and is empty when
/// the block has no `Conditions` token.
pub fn condition_region(block: &str) -> &str {
    CONDITIONS_RE
        .captures(block)
        .and_then(|caps| caps.get(1))
        .map_or("", |m| m.as_str().trim())
}

fn count_newlines(s: &str) -> usize {
    s.bytes().filter(|b| *b == b'\n').count()
}

fn enclosing_line(text: &str, start: usize, end: usize) -> &str {
    let line_start = text[..start].rfind('\n').map_or(0, |i| i + 1);
    let line_end = text[end..].find('\n').map_or(text.len(), |i| end + i);
    text[line_start..line_end].trim()
}
