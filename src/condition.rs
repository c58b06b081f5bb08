use crate::error::ConditionError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Comparison operators accepted in a Measure branch condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparator {
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Equal,
    NotEqual,
}

impl Comparator {
    /// Two-character operators come first so `<=` is never read as `<`.
    const PREFIXES: [(&'static str, Comparator); 6] = [
        ("<=", Comparator::LessThanOrEqual),
        (">=", Comparator::GreaterThanOrEqual),
        ("==", Comparator::Equal),
        ("!=", Comparator::NotEqual),
        ("<", Comparator::LessThan),
        (">", Comparator::GreaterThan),
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            Comparator::LessThan => "<",
            Comparator::LessThanOrEqual => "<=",
            Comparator::GreaterThan => ">",
            Comparator::GreaterThanOrEqual => ">=",
            Comparator::Equal => "==",
            Comparator::NotEqual => "!=",
        }
    }

    fn apply(&self, value: f64, threshold: f64) -> bool {
        match self {
            Comparator::LessThan => value < threshold,
            Comparator::LessThanOrEqual => value <= threshold,
            Comparator::GreaterThan => value > threshold,
            Comparator::GreaterThanOrEqual => value >= threshold,
            Comparator::Equal => value == threshold,
            Comparator::NotEqual => value != threshold,
        }
    }
}

/// A parsed branch condition of the form `<operator><number>`, e.g. `>= 11.8`.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub comparator: Comparator,
    pub threshold: f64,
}

impl Condition {
    pub fn parse(text: &str) -> Result<Self, ConditionError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ConditionError::Empty);
        }

        let (comparator, rest) = Comparator::PREFIXES
            .iter()
            .find_map(|(prefix, comparator)| {
                trimmed
                    .strip_prefix(prefix)
                    .map(|rest| (*comparator, rest.trim()))
            })
            .ok_or_else(|| ConditionError::UnknownOperator(trimmed.to_string()))?;

        let threshold = rest
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| ConditionError::InvalidLiteral {
                condition: trimmed.to_string(),
                literal: rest.to_string(),
            })?;

        Ok(Self {
            comparator,
            threshold,
        })
    }

    pub fn matches(&self, value: f64) -> bool {
        self.comparator.apply(value, self.threshold)
    }
}

/// Parses `condition` and tests it against `value` in one step.
pub fn evaluate(condition: &str, value: f64) -> Result<bool, ConditionError> {
    Condition::parse(condition).map(|c| c.matches(value))
}

impl FromStr for Condition {
    type Err = ConditionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Condition::parse(s)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.comparator.symbol(), self.threshold)
    }
}

impl Serialize for Condition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Condition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Condition::parse(&text).map_err(serde::de::Error::custom)
    }
}
