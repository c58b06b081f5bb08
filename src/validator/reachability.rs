use crate::flow::Node;
use ahash::AHashSet;
use std::collections::{BTreeMap, VecDeque};

/// Breadth-first walk from `start` over every outgoing edge. Returns the ids
/// that were never visited, sorted.
pub fn unreachable_nodes(start: &str, nodes: &BTreeMap<String, Node>) -> Vec<String> {
    let mut visited: AHashSet<&str> = AHashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();

    if nodes.contains_key(start) {
        visited.insert(start);
        queue.push_back(start);
    }

    while let Some(id) = queue.pop_front() {
        let Some(node) = nodes.get(id) else {
            continue;
        };
        for next in node.successors() {
            if nodes.contains_key(next) && visited.insert(next) {
                queue.push_back(next);
            }
        }
    }

    nodes
        .keys()
        .filter(|id| !visited.contains(id.as_str()))
        .cloned()
        .collect()
}
