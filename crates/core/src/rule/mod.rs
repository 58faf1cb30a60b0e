//! Matching rules: which files a monitored folder ingests.
//!
//! A folder carries exactly one [`Rule`]. Rules are validated when they are
//! built (from the API, from config, or from a database row), so matching
//! itself never fails and never has to deal with an unknown criterion.

mod matcher;
mod types;

pub use matcher::{matches, FileStats};
pub use types::{Rule, RuleCriteria, RuleError, RuleSpec, RULE_DATE_FORMAT};
