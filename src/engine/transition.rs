use crate::error::EngineError;
use crate::flow::{MeasureNode, Node, QuestionNode};
use crate::session::ResponseValue;
use itertools::Itertools;

/// Where a validated response leads.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Route<'a> {
    /// Record the response and move to this node.
    Advance(&'a str),
    /// The current node is itself Terminal; finish without moving.
    Complete,
}

/// Checks `value` against the contract of `node` and resolves the next hop.
/// Pure: no state is touched, so a rejection leaves nothing to undo.
pub(super) fn route<'a>(
    node_id: &str,
    node: &'a Node,
    value: &ResponseValue,
) -> Result<Route<'a>, EngineError> {
    match node {
        Node::Question(question) => answer(node_id, question, value).map(Route::Advance),
        Node::Safety(safety) => {
            acknowledge(node_id, "safety", value)?;
            Ok(Route::Advance(&safety.next))
        }
        Node::Measure(measure) => measure_branch(node_id, measure, value).map(Route::Advance),
        Node::Terminal(_) => {
            acknowledge(node_id, "terminal", value)?;
            Ok(Route::Complete)
        }
    }
}

fn answer<'a>(
    node_id: &str,
    question: &'a QuestionNode,
    value: &ResponseValue,
) -> Result<&'a str, EngineError> {
    let key = value
        .as_text()
        .ok_or_else(|| EngineError::ResponseTypeMismatch {
            node_id: node_id.to_string(),
            node_type: "question",
            expected: "an answer key",
            found: value.type_name().to_string(),
        })?;

    question
        .answers
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| EngineError::UnknownAnswer {
            node_id: node_id.to_string(),
            answer: key.to_string(),
            options: question.answers.keys().join(", "),
        })
}

fn acknowledge(
    node_id: &str,
    node_type: &'static str,
    value: &ResponseValue,
) -> Result<(), EngineError> {
    if value.is_truthy() {
        Ok(())
    } else {
        Err(EngineError::ResponseTypeMismatch {
            node_id: node_id.to_string(),
            node_type,
            expected: "an acknowledgement",
            found: format!("{} ({})", value.type_name(), value),
        })
    }
}

fn measure_branch<'a>(
    node_id: &str,
    measure: &'a MeasureNode,
    value: &ResponseValue,
) -> Result<&'a str, EngineError> {
    let reading = value
        .as_number()
        .filter(|n| n.is_finite())
        .ok_or_else(|| EngineError::ResponseTypeMismatch {
            node_id: node_id.to_string(),
            node_type: "measure",
            expected: "a finite number",
            found: value.type_name().to_string(),
        })?;

    let range = measure.valid_range;
    if !range.contains(reading) {
        return Err(EngineError::OutOfRange {
            node_id: node_id.to_string(),
            value: reading,
            min: range.min,
            max: range.max,
        });
    }

    measure
        .select_branch(reading)
        .map(|branch| branch.next.as_str())
        .ok_or_else(|| EngineError::NoMatchingBranch {
            node_id: node_id.to_string(),
            value: reading,
        })
}
