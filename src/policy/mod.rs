//! Policy extraction from mail-security console exports.
//!
//! An export flows through:
//! 1. `PolicyParser::split_blocks()`: boundary after each `Actions` token
//! 2. `PolicyParser::parse_block()`: rule marker → `PolicyType`, skip the rest
//! 3. `extract_conditions()`: typed whitelist entries from the condition region
//!
//! `list_rules()` is a separate line scanner that keeps actions, status and
//! `And`/`Or` condition groups for the rule listing export.

pub mod conditions;
pub mod listing;
pub mod segmenter;
pub mod types;

pub use conditions::{ConditionSet, extract_conditions};
pub use listing::list_rules;
pub use segmenter::{DEFAULT_RULE_PREFIX, PolicyParser};
pub use types::{
    ConditionEntry, ConditionGroup, ConditionKind, ConditionOperator, PolicyRecord, PolicyType,
    RawBlock, RuleListing,
};
