use crate::artifact::Artifact;
use crate::condition::Condition;
use serde::Serialize;
use std::collections::BTreeMap;

/// A validated, immutable decision graph.
///
/// The only way to obtain one is through [`crate::validator::validate`], so an
/// `Engine` can never be built on top of a document that failed validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowDefinition {
    flow_id: String,
    flow_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    start_node: String,
    nodes: BTreeMap<String, Node>,
}

impl FlowDefinition {
    pub(crate) fn new(
        flow_id: String,
        flow_version: String,
        title: Option<String>,
        start_node: String,
        nodes: BTreeMap<String, Node>,
    ) -> Self {
        Self {
            flow_id,
            flow_version,
            title,
            start_node,
            nodes,
        }
    }

    pub fn flow_id(&self) -> &str {
        &self.flow_id
    }

    pub fn flow_version(&self) -> &str {
        &self.flow_version
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn start_node(&self) -> &str {
        &self.start_node
    }

    pub fn nodes(&self) -> &BTreeMap<String, Node> {
        &self.nodes
    }

    pub fn node(&self, node_id: &str) -> Option<&Node> {
        self.nodes.get(node_id)
    }

    /// Terminal nodes in node-id order.
    pub fn terminal_nodes(&self) -> impl Iterator<Item = (&str, &TerminalNode)> {
        self.nodes.iter().filter_map(|(id, node)| match node {
            Node::Terminal(terminal) => Some((id.as_str(), terminal)),
            _ => None,
        })
    }
}

/// One step of a flow. The set of variants is closed; every dispatch over it is
/// an exhaustive `match`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    Question(QuestionNode),
    Safety(SafetyNode),
    Measure(MeasureNode),
    Terminal(TerminalNode),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Question,
    Safety,
    Measure,
    Terminal,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Question => "question",
            NodeKind::Safety => "safety",
            NodeKind::Measure => "measure",
            NodeKind::Terminal => "terminal",
        }
    }
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Question(_) => NodeKind::Question,
            Node::Safety(_) => NodeKind::Safety,
            Node::Measure(_) => NodeKind::Measure,
            Node::Terminal(_) => NodeKind::Terminal,
        }
    }

    /// Outgoing edges of this node. Measure branches keep declaration order.
    pub fn successors(&self) -> Vec<&str> {
        match self {
            Node::Question(q) => q.answers.values().map(String::as_str).collect(),
            Node::Safety(s) => vec![s.next.as_str()],
            Node::Measure(m) => m.branches.iter().map(|b| b.next.as_str()).collect(),
            Node::Terminal(_) => Vec::new(),
        }
    }

    /// Operator-facing prompt text.
    pub fn prompt(&self) -> &str {
        match self {
            Node::Question(q) => &q.text,
            Node::Safety(s) => &s.text,
            Node::Measure(m) => &m.text,
            Node::Terminal(t) => &t.result,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionNode {
    pub text: String,
    pub answers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SafetyNode {
    pub text: String,
    pub next: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasureNode {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub valid_range: ValidRange,
    pub branches: Vec<MeasureBranch>,
}

impl MeasureNode {
    /// First branch, in declaration order, whose condition holds for `value`.
    pub fn select_branch(&self, value: f64) -> Option<&MeasureBranch> {
        self.branches.iter().find(|b| b.condition.matches(value))
    }
}

/// Inclusive bounds for a measured value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValidRange {
    pub min: f64,
    pub max: f64,
}

impl ValidRange {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasureBranch {
    pub condition: Condition,
    pub next: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TerminalNode {
    pub result: String,
    pub artifact: Artifact,
}
