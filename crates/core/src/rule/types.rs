use std::fmt;

use chrono::NaiveDate;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::result::ErrorCategory;

/// Date format used by date-based rules (`DD/MM/YYYY`).
pub const RULE_DATE_FORMAT: &str = "%d/%m/%Y";

/// The criterion a rule matches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RuleCriteria {
    Extension,
    CreationDate,
    ModificationDate,
    Pattern,
}

impl RuleCriteria {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleCriteria::Extension => "extension",
            RuleCriteria::CreationDate => "creationDate",
            RuleCriteria::ModificationDate => "modificationDate",
            RuleCriteria::Pattern => "pattern",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "extension" => Some(RuleCriteria::Extension),
            "creationDate" => Some(RuleCriteria::CreationDate),
            "modificationDate" => Some(RuleCriteria::ModificationDate),
            "pattern" => Some(RuleCriteria::Pattern),
            _ => None,
        }
    }
}

impl fmt::Display for RuleCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("Rule value for {0} cannot be empty")]
    EmptyValue(RuleCriteria),

    #[error("Invalid date '{value}', expected DD/MM/YYYY: {reason}")]
    InvalidDate { value: String, reason: String },

    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

impl RuleError {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::Validation
    }
}

/// Unvalidated wire/storage shape of a rule: `{ "criteria": ..., "value": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub criteria: RuleCriteria,
    pub value: String,
}

/// A single active matching rule.
///
/// Extensions are stored normalized (lowercase, leading dot).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RuleSpec", into = "RuleSpec")]
pub enum Rule {
    Extension(Vec<String>),
    CreationDate(NaiveDate),
    ModificationDate(NaiveDate),
    Pattern(Regex),
}

impl Rule {
    /// Build a rule from a criterion and its raw value.
    pub fn parse(criteria: RuleCriteria, value: &str) -> Result<Self, RuleError> {
        match criteria {
            RuleCriteria::Extension => Self::extensions(value),
            RuleCriteria::CreationDate => Ok(Rule::CreationDate(parse_date(criteria, value)?)),
            RuleCriteria::ModificationDate => {
                Ok(Rule::ModificationDate(parse_date(criteria, value)?))
            }
            RuleCriteria::Pattern => Self::pattern(value),
        }
    }

    /// Comma-separated extension list, e.g. `".pdf, docx"`.
    pub fn extensions(value: &str) -> Result<Self, RuleError> {
        let mut extensions: Vec<String> = Vec::new();
        for raw in value.split(',') {
            let trimmed = raw.trim().trim_start_matches('.');
            if trimmed.is_empty() {
                continue;
            }
            let normalized = format!(".{}", trimmed.to_ascii_lowercase());
            if !extensions.contains(&normalized) {
                extensions.push(normalized);
            }
        }

        if extensions.is_empty() {
            return Err(RuleError::EmptyValue(RuleCriteria::Extension));
        }
        Ok(Rule::Extension(extensions))
    }

    pub fn pattern(source: &str) -> Result<Self, RuleError> {
        if source.is_empty() {
            return Err(RuleError::EmptyValue(RuleCriteria::Pattern));
        }
        Regex::new(source)
            .map(Rule::Pattern)
            .map_err(|e| RuleError::InvalidPattern {
                pattern: source.to_string(),
                reason: e.to_string(),
            })
    }

    pub fn criteria(&self) -> RuleCriteria {
        match self {
            Rule::Extension(_) => RuleCriteria::Extension,
            Rule::CreationDate(_) => RuleCriteria::CreationDate,
            Rule::ModificationDate(_) => RuleCriteria::ModificationDate,
            Rule::Pattern(_) => RuleCriteria::Pattern,
        }
    }

    /// Canonical string value, as persisted and returned to callers.
    pub fn value(&self) -> String {
        match self {
            Rule::Extension(exts) => exts.join(","),
            Rule::CreationDate(date) | Rule::ModificationDate(date) => {
                date.format(RULE_DATE_FORMAT).to_string()
            }
            Rule::Pattern(regex) => regex.as_str().to_string(),
        }
    }

    pub fn to_spec(&self) -> RuleSpec {
        RuleSpec {
            criteria: self.criteria(),
            value: self.value(),
        }
    }
}

fn parse_date(criteria: RuleCriteria, value: &str) -> Result<NaiveDate, RuleError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RuleError::EmptyValue(criteria));
    }
    NaiveDate::parse_from_str(trimmed, RULE_DATE_FORMAT).map_err(|e| RuleError::InvalidDate {
        value: value.to_string(),
        reason: e.to_string(),
    })
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Rule::Extension(a), Rule::Extension(b)) => a == b,
            (Rule::CreationDate(a), Rule::CreationDate(b)) => a == b,
            (Rule::ModificationDate(a), Rule::ModificationDate(b)) => a == b,
            (Rule::Pattern(a), Rule::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl TryFrom<RuleSpec> for Rule {
    type Error = RuleError;

    fn try_from(spec: RuleSpec) -> Result<Self, Self::Error> {
        Rule::parse(spec.criteria, &spec.value)
    }
}

impl From<Rule> for RuleSpec {
    fn from(rule: Rule) -> Self {
        rule.to_spec()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.criteria(), self.value())
    }
}
