use super::{RawNodes, json_type};
use crate::artifact::{Artifact, ArtifactValue, LIST_FIELDS, NOTES_FIELD, UNIVERSAL_FIELDS};
use crate::condition::Condition;
use crate::error::ValidationError;
use crate::flow::{
    MeasureBranch, MeasureNode, Node, QuestionNode, SafetyNode, TerminalNode, ValidRange,
};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Keys authors commonly write instead of `next` on a Safety node.
const ALTERNATE_NEXT_KEYS: [&str; 2] = ["nextNode", "next_node"];

/// Per-node context carried through every check so errors can name the node.
struct NodeCheck<'a> {
    flow_id: &'a str,
    node_id: &'a str,
    body: &'a Map<String, Value>,
    known: &'a RawNodes,
}

pub(super) fn parse_node(
    flow_id: &str,
    node_id: &str,
    body: &Map<String, Value>,
    known: &RawNodes,
) -> Result<Node, ValidationError> {
    let check = NodeCheck {
        flow_id,
        node_id,
        body,
        known,
    };

    let type_name = body
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| check.invalid("type", "must be one of question, safety, measure, terminal"))?;

    match type_name {
        "question" => check.question().map(Node::Question),
        "safety" => check.safety().map(Node::Safety),
        "measure" => check.measure().map(Node::Measure),
        "terminal" => check.terminal().map(Node::Terminal),
        other => Err(ValidationError::UnknownNodeType {
            flow_id: flow_id.to_string(),
            node_id: node_id.to_string(),
            type_name: other.to_string(),
        }),
    }
}

impl NodeCheck<'_> {
    fn question(&self) -> Result<QuestionNode, ValidationError> {
        let text = self.required_text("text")?;
        let raw_answers = self
            .body
            .get("answers")
            .and_then(Value::as_object)
            .filter(|a| !a.is_empty())
            .ok_or_else(|| self.invalid("answers", "must be a non-empty mapping of answer to node id"))?;

        let mut answers = BTreeMap::new();
        for (key, target) in raw_answers {
            if key.trim().is_empty() {
                return Err(self.invalid("answers", "answer keys must be non-empty"));
            }
            let field = format!("answers.{}", key);
            let target = self.reference(&field, target)?;
            answers.insert(key.clone(), target);
        }

        Ok(QuestionNode { text, answers })
    }

    fn safety(&self) -> Result<SafetyNode, ValidationError> {
        let text = self.required_text("text")?;

        if let Some(found) = ALTERNATE_NEXT_KEYS
            .iter()
            .find(|key| self.body.contains_key(**key))
        {
            return Err(ValidationError::AlternateNextField {
                flow_id: self.flow_id.to_string(),
                node_id: self.node_id.to_string(),
                found: found.to_string(),
            });
        }

        let next = match self.body.get("next") {
            Some(target) => self.reference("next", target)?,
            None => return Err(self.invalid("next", "must name the node that follows")),
        };

        Ok(SafetyNode { text, next })
    }

    fn measure(&self) -> Result<MeasureNode, ValidationError> {
        let text = self.required_text("text")?;

        let unit = match self.body.get("unit") {
            None | Some(Value::Null) => None,
            Some(Value::String(unit)) => Some(unit.clone()),
            Some(_) => return Err(self.invalid("unit", "must be a string when present")),
        };

        let range = self
            .body
            .get("validRange")
            .and_then(Value::as_object)
            .ok_or_else(|| self.invalid("validRange", "must be an object with numeric min and max"))?;
        let min = range
            .get("min")
            .and_then(Value::as_f64)
            .ok_or_else(|| self.invalid("validRange.min", "must be a number"))?;
        let max = range
            .get("max")
            .and_then(Value::as_f64)
            .ok_or_else(|| self.invalid("validRange.max", "must be a number"))?;
        if min >= max {
            return Err(ValidationError::InvalidRange {
                flow_id: self.flow_id.to_string(),
                node_id: self.node_id.to_string(),
                min,
                max,
            });
        }

        let raw_branches = self
            .body
            .get("branches")
            .and_then(Value::as_array)
            .filter(|b| !b.is_empty())
            .ok_or_else(|| self.invalid("branches", "must be a non-empty list of {condition, next}"))?;

        let mut branches = Vec::with_capacity(raw_branches.len());
        for (index, raw) in raw_branches.iter().enumerate() {
            let raw = raw.as_object().ok_or_else(|| {
                self.invalid(&format!("branches[{}]", index), "must be an object")
            })?;
            let condition_text = raw.get("condition").and_then(Value::as_str).ok_or_else(|| {
                self.invalid(&format!("branches[{}].condition", index), "must be a string")
            })?;
            let condition = Condition::parse(condition_text).map_err(|source| {
                ValidationError::InvalidCondition {
                    flow_id: self.flow_id.to_string(),
                    node_id: self.node_id.to_string(),
                    index,
                    source,
                }
            })?;
            let field = format!("branches[{}].next", index);
            let next = match raw.get("next") {
                Some(target) => self.reference(&field, target)?,
                None => return Err(self.invalid(&field, "must name the node that follows")),
            };
            branches.push(MeasureBranch { condition, next });
        }

        Ok(MeasureNode {
            text,
            unit,
            valid_range: ValidRange { min, max },
            branches,
        })
    }

    fn terminal(&self) -> Result<TerminalNode, ValidationError> {
        let result = self.required_text("result")?;
        let raw = self
            .body
            .get("artifact")
            .and_then(Value::as_object)
            .ok_or_else(|| self.invalid("artifact", "must be an object"))?;

        for field in UNIVERSAL_FIELDS {
            if !raw.get(field).is_some_and(Value::is_string) {
                return Err(self.invalid(
                    &format!("artifact.{}", field),
                    "required universal field must be a string",
                ));
            }
        }

        let mut artifact = Artifact::new();
        for (key, value) in raw {
            let field = format!("artifact.{}", key);
            let parsed = if LIST_FIELDS.contains(&key.as_str()) {
                string_list(value)
                    .map(ArtifactValue::List)
                    .ok_or_else(|| self.invalid(&field, "must be an array of strings"))?
            } else if key == NOTES_FIELD || UNIVERSAL_FIELDS.contains(&key.as_str()) {
                value
                    .as_str()
                    .map(|s| ArtifactValue::Text(s.to_string()))
                    .ok_or_else(|| self.invalid(&field, "must be a string"))?
            } else {
                match value {
                    Value::String(s) => ArtifactValue::Text(s.clone()),
                    other => string_list(other).map(ArtifactValue::List).ok_or_else(|| {
                        self.invalid(
                            &field,
                            &format!("must be a string or array of strings, found {}", json_type(other)),
                        )
                    })?,
                }
            };
            artifact.insert(key.clone(), parsed);
        }

        Ok(TerminalNode { result, artifact })
    }

    fn required_text(&self, field: &str) -> Result<String, ValidationError> {
        self.body
            .get(field)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
            .ok_or_else(|| self.invalid(field, "must be a non-empty string"))
    }

    /// A node-id reference that must name a node of this flow.
    fn reference(&self, field: &str, target: &Value) -> Result<String, ValidationError> {
        let target = target
            .as_str()
            .ok_or_else(|| self.invalid(field, "must be a node id string"))?;
        if !self.known.contains_key(target) {
            return Err(ValidationError::DanglingReference {
                flow_id: self.flow_id.to_string(),
                node_id: self.node_id.to_string(),
                field: field.to_string(),
                target: target.to_string(),
            });
        }
        Ok(target.to_string())
    }

    fn invalid(&self, field: &str, rule: &str) -> ValidationError {
        ValidationError::InvalidField {
            flow_id: self.flow_id.to_string(),
            node_id: self.node_id.to_string(),
            field: field.to_string(),
            rule: rule.to_string(),
        }
    }
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect()
}
