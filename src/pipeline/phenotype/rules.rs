//! Ordered allele → phenotype rule table.
//!
//! Rules are evaluated top to bottom and the first matching predicate decides
//! the phenotype. Tables serialize to JSON so a deployment can ship its own:
//!
//! ```json
//! {
//!   "rules": [
//!     { "when": { "contains_any": ["2", "3"] }, "phenotype": "PM" },
//!     { "when": { "contains_any": ["17"] }, "phenotype": "URM" }
//!   ],
//!   "fallback": "IM"
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::models::Phenotype;

/// Test applied to a raw star-allele token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllelePredicate {
    /// Token contains any of the substrings.
    ContainsAny(Vec<String>),
    /// Token equals one of the values exactly.
    OneOf(Vec<String>),
}

impl AllelePredicate {
    pub fn matches(&self, allele: &str) -> bool {
        match self {
            Self::ContainsAny(needles) => needles.iter().any(|n| allele.contains(n.as_str())),
            Self::OneOf(values) => values.iter().any(|v| v == allele),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhenotypeRule {
    pub when: AllelePredicate,
    pub phenotype: Phenotype,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTable {
    rules: Vec<PhenotypeRule>,
    /// Phenotype when no rule matches.
    fallback: Phenotype,
}

impl RuleTable {
    pub fn new(rules: Vec<PhenotypeRule>, fallback: Phenotype) -> Self {
        Self { rules, fallback }
    }

    /// Reference policy: "2" or "3" → PM, then "17" → URM, otherwise IM.
    ///
    /// Substring matching is deliberate, so `*12` lands on PM before the
    /// `17` rule is ever consulted.
    pub fn reference() -> Self {
        Self::new(
            vec![
                PhenotypeRule {
                    when: AllelePredicate::ContainsAny(vec!["2".into(), "3".into()]),
                    phenotype: Phenotype::Poor,
                },
                PhenotypeRule {
                    when: AllelePredicate::ContainsAny(vec!["17".into()]),
                    phenotype: Phenotype::Ultrarapid,
                },
            ],
            Phenotype::Intermediate,
        )
    }

    /// Load a table from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn rules(&self) -> &[PhenotypeRule] {
        &self.rules
    }

    pub fn fallback(&self) -> Phenotype {
        self.fallback
    }

    /// First matching rule wins.
    pub fn evaluate(&self, allele: &str) -> Phenotype {
        self.rules
            .iter()
            .find(|rule| rule.when.matches(allele))
            .map(|rule| rule.phenotype)
            .unwrap_or(self.fallback)
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::reference()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_priority_order() {
        let table = RuleTable::reference();
        assert_eq!(table.evaluate("*3"), Phenotype::Poor);
        assert_eq!(table.evaluate("*2"), Phenotype::Poor);
        assert_eq!(table.evaluate("*17"), Phenotype::Ultrarapid);
        assert_eq!(table.evaluate("*4"), Phenotype::Intermediate);
    }

    #[test]
    fn substring_semantics_not_numeric() {
        let table = RuleTable::reference();
        // "2" inside "*12" matches before "17" is checked
        assert_eq!(table.evaluate("*12"), Phenotype::Poor);
        assert_eq!(table.evaluate("*23"), Phenotype::Poor);
        assert_eq!(table.evaluate("*3C"), Phenotype::Poor);
        assert_eq!(table.evaluate("*10"), Phenotype::Intermediate);
        assert_eq!(table.evaluate(""), Phenotype::Intermediate);
    }

    #[test]
    fn rule_order_is_data() {
        let reversed = RuleTable::new(
            vec![
                PhenotypeRule {
                    when: AllelePredicate::ContainsAny(vec!["17".into()]),
                    phenotype: Phenotype::Ultrarapid,
                },
                PhenotypeRule {
                    when: AllelePredicate::ContainsAny(vec!["2".into(), "3".into()]),
                    phenotype: Phenotype::Poor,
                },
            ],
            Phenotype::Intermediate,
        );
        assert_eq!(reversed.evaluate("*17"), Phenotype::Ultrarapid);
        assert_eq!(reversed.evaluate("*2"), Phenotype::Poor);
    }

    #[test]
    fn one_of_is_exact() {
        let table = RuleTable::new(
            vec![PhenotypeRule {
                when: AllelePredicate::OneOf(vec!["*1xN".into()]),
                phenotype: Phenotype::Ultrarapid,
            }],
            Phenotype::Normal,
        );
        assert_eq!(table.evaluate("*1xN"), Phenotype::Ultrarapid);
        assert_eq!(table.evaluate("*1x"), Phenotype::Normal);
    }

    #[test]
    fn table_parses_from_json_with_codes() {
        let json = r#"{
            "rules": [
                { "when": { "contains_any": ["2", "3"] }, "phenotype": "PM" },
                { "when": { "contains_any": ["17"] }, "phenotype": "URM" }
            ],
            "fallback": "IM"
        }"#;
        let table: RuleTable = serde_json::from_str(json).unwrap();
        assert_eq!(table, RuleTable::reference());
    }

    #[test]
    fn table_loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        std::fs::write(
            &path,
            r#"{"rules": [{"when": {"one_of": ["*4"]}, "phenotype": "PM"}], "fallback": "NM"}"#,
        )
        .unwrap();
        let table = RuleTable::from_json_file(&path).unwrap();
        assert_eq!(table.evaluate("*4"), Phenotype::Poor);
        assert_eq!(table.evaluate("*41"), Phenotype::Normal);
    }

    #[test]
    fn bad_table_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        std::fs::write(&path, r#"{"rules": "nope"}"#).unwrap();
        assert!(matches!(
            RuleTable::from_json_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
