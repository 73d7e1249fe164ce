//! Line-oriented rule listing.
//!
//! Unlike the block segmenter, this scanner keeps every rule's actions and
//! on/off status together with its conditions, and preserves the `And`/`Or`
//! structure of the condition section. Its output feeds the rule listing CSV.

use crate::policy::types::{ConditionGroup, ConditionOperator, RuleListing};

const RULE_MARKER: &str = "-DLP-";
const CONDITIONS_TOKEN: &str = "Conditions";
const ACTIONS_TOKEN: &str = "Actions";

fn is_status(line: &str) -> bool {
    matches!(line, "On" | "Off")
}

/// Scans an export line by line into [`RuleListing`]s.
struct ListingScanner<'a> {
    lines: Vec<&'a str>,
    pos: usize,
    rules: Vec<RuleListing>,
    current: Option<RuleListing>,
}

impl<'a> ListingScanner<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().map(str::trim).collect(),
            pos: 0,
            rules: Vec::new(),
            current: None,
        }
    }

    fn peek(&self) -> Option<&'a str> {
        self.lines.get(self.pos).copied()
    }

    fn close_current(&mut self) {
        if let Some(rule) = self.current.take() {
            self.rules.push(rule);
        }
    }

    /// Collect condition lines up to the next operator line or `Actions`.
    fn take_group(&mut self, operator: Option<ConditionOperator>) -> Option<ConditionGroup> {
        let mut lines = Vec::new();
        while let Some(line) = self.peek() {
            if line.contains(ACTIONS_TOKEN) || ConditionOperator::from_line(line).is_some() {
                break;
            }
            if !line.is_empty() {
                lines.push(line.to_string());
            }
            self.pos += 1;
        }
        (!lines.is_empty()).then_some(ConditionGroup { operator, lines })
    }

    fn scan_conditions(&mut self) {
        let mut groups = Vec::new();
        groups.extend(self.take_group(None));

        while let Some(line) = self.peek() {
            if line.contains(ACTIONS_TOKEN) {
                break;
            }
            match ConditionOperator::from_line(line) {
                Some(op) => {
                    self.pos += 1;
                    groups.extend(self.take_group(Some(op)));
                }
                None => self.pos += 1,
            }
        }

        if let Some(rule) = self.current.as_mut() {
            rule.conditions.extend(groups);
        }
    }

    fn scan_actions(&mut self) {
        let mut actions = Vec::new();
        while let Some(line) = self.peek() {
            if is_status(line) {
                break;
            }
            if !line.is_empty() {
                actions.push(line);
            }
            self.pos += 1;
        }
        if let Some(rule) = self.current.as_mut() {
            rule.actions = actions.join("\n");
        }
    }

    fn run(mut self) -> Vec<RuleListing> {
        while let Some(line) = self.peek() {
            self.pos += 1;
            if line.contains(RULE_MARKER) {
                self.close_current();
                self.current = Some(RuleListing {
                    name: line.to_string(),
                    ..Default::default()
                });
            } else if line.contains(CONDITIONS_TOKEN) {
                self.scan_conditions();
            } else if line.contains(ACTIONS_TOKEN) {
                self.scan_actions();
            } else if is_status(line) {
                if let Some(rule) = self.current.as_mut() {
                    rule.status = line.to_string();
                }
                self.close_current();
            }
        }
        self.close_current();
        self.rules
    }
}

/// List every rule in an export with its condition groups, actions and status.
///
/// Sections that appear before any rule marker are ignored.
pub fn list_rules(text: &str) -> Vec<RuleListing> {
    ListingScanner::new(text).run()
}
