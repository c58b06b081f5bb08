use crate::flow::Node;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A value supplied by the operator in response to a node.
///
/// The engine never coerces between variants: a Measure node given `Text("12")`
/// is rejected. Use [`ResponseValue::parse_for`] to turn raw operator input into
/// the variant a node expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl ResponseValue {
    /// Acknowledgement semantics used by Safety and Terminal nodes.
    pub fn is_truthy(&self) -> bool {
        match self {
            ResponseValue::Bool(b) => *b,
            ResponseValue::Number(n) => *n != 0.0 && !n.is_nan(),
            ResponseValue::Text(s) => !s.trim().is_empty(),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            ResponseValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ResponseValue::Bool(_) => "a boolean",
            ResponseValue::Number(_) => "a number",
            ResponseValue::Text(_) => "text",
        }
    }

    /// Interprets raw operator input for the given node.
    ///
    /// Measure input that does not parse as a number stays `Text`, so the
    /// engine reports the mismatch instead of guessing.
    pub fn parse_for(node: &Node, input: &str) -> Self {
        let input = input.trim();
        match node {
            Node::Question(_) => ResponseValue::Text(input.to_string()),
            Node::Measure(_) => input
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(ResponseValue::Number)
                .unwrap_or_else(|| ResponseValue::Text(input.to_string())),
            Node::Safety(_) | Node::Terminal(_) => match input.to_ascii_lowercase().as_str() {
                "" | "y" | "yes" | "ok" | "true" | "ack" => ResponseValue::Bool(true),
                "n" | "no" | "false" => ResponseValue::Bool(false),
                _ => ResponseValue::Text(input.to_string()),
            },
        }
    }
}

impl From<bool> for ResponseValue {
    fn from(value: bool) -> Self {
        ResponseValue::Bool(value)
    }
}

impl From<f64> for ResponseValue {
    fn from(value: f64) -> Self {
        ResponseValue::Number(value)
    }
}

impl From<i32> for ResponseValue {
    fn from(value: i32) -> Self {
        ResponseValue::Number(value as f64)
    }
}

impl From<&str> for ResponseValue {
    fn from(value: &str) -> Self {
        ResponseValue::Text(value.to_string())
    }
}

impl From<String> for ResponseValue {
    fn from(value: String) -> Self {
        ResponseValue::Text(value)
    }
}

impl fmt::Display for ResponseValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            ResponseValue::Bool(b) => write!(f, "{}", b),
            ResponseValue::Text(s) => write!(f, "{}", s),
        }
    }
}
