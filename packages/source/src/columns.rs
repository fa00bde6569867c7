//! Attribute column identification by naming convention.
//!
//! Boundary files name their attribute columns after the geography
//! vintage (`MSOA11CD`, `MSOA21NM`, `msoa_name`, ...), so the columns are
//! located with an ordered list of [`ColumnRule`]s instead of fixed names.
//! Rules are tried in order. The first rule that matches exactly one column
//! wins; a rule matching several columns is an ambiguity and an error.

use crate::DataError;

/// How the part of a column name after the prefix is tested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameTest {
    /// The name ends with the given text.
    EndsWith(String),
    /// The name contains the given text anywhere after the prefix.
    Contains(String),
}

/// A case-insensitive column-name pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRule {
    prefix: String,
    test: NameTest,
}

impl ColumnRule {
    /// Builds a rule. Both parts are compared case-insensitively.
    #[must_use]
    pub fn new(prefix: &str, test: NameTest) -> Self {
        let test = match test {
            NameTest::EndsWith(s) => NameTest::EndsWith(s.to_lowercase()),
            NameTest::Contains(s) => NameTest::Contains(s.to_lowercase()),
        };
        Self {
            prefix: prefix.to_lowercase(),
            test,
        }
    }

    /// Returns `true` if `column` satisfies the rule.
    #[must_use]
    pub fn matches(&self, column: &str) -> bool {
        let lower = column.trim().to_lowercase();
        let Some(rest) = lower.strip_prefix(&self.prefix) else {
            return false;
        };
        match &self.test {
            NameTest::EndsWith(suffix) => rest.ends_with(suffix.as_str()),
            NameTest::Contains(needle) => rest.contains(needle.as_str()),
        }
    }
}

/// Rules for the area-code column of a boundary file.
#[must_use]
pub fn code_rules(granularity: &str) -> Vec<ColumnRule> {
    vec![
        ColumnRule::new(granularity, NameTest::EndsWith("cd".to_string())),
        ColumnRule::new(granularity, NameTest::EndsWith("code".to_string())),
    ]
}

/// Rules for the area-name column of a boundary file.
#[must_use]
pub fn name_rules(granularity: &str) -> Vec<ColumnRule> {
    vec![
        ColumnRule::new(granularity, NameTest::EndsWith("nm".to_string())),
        ColumnRule::new(granularity, NameTest::Contains("name".to_string())),
    ]
}

/// Picks the single column matched by the first applicable rule.
///
/// # Errors
///
/// Returns [`DataError::AmbiguousColumn`] if the first rule with any match
/// matches more than one column, or [`DataError::MissingColumn`] if no rule
/// matches at all.
pub fn identify_column(
    columns: &[String],
    rules: &[ColumnRule],
    wanted: &str,
    artifact: &str,
) -> Result<String, DataError> {
    for rule in rules {
        let candidates: Vec<&String> = columns.iter().filter(|c| rule.matches(c)).collect();
        match candidates.as_slice() {
            [] => {}
            [single] => return Ok((*single).clone()),
            _ => {
                return Err(DataError::AmbiguousColumn {
                    artifact: artifact.to_string(),
                    wanted: wanted.to_string(),
                    candidates: candidates.into_iter().cloned().collect(),
                });
            }
        }
    }

    Err(DataError::MissingColumn {
        artifact: artifact.to_string(),
        column: wanted.to_string(),
    })
}
