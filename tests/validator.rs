//! Tests for flow document validation.
mod common;
use common::*;
use serde_json::{Value, json};
use shindan::prelude::*;

/// Validates a modified copy of the battery flow and returns the error text.
fn reject(edit: impl FnOnce(&mut Value)) -> String {
    let mut flow = battery_flow_json();
    edit(&mut flow);
    match validate(&document(flow)) {
        Ok(_) => panic!("flow should have been rejected"),
        Err(e) => e.to_string(),
    }
}

#[test]
fn test_control_flow_is_accepted() {
    let flow = battery_flow();
    assert_eq!(flow.flow_id(), "battery-check");
    assert_eq!(flow.flow_version(), "1.0");
    assert_eq!(flow.title(), Some("Starter battery check"));
    assert_eq!(flow.start_node(), "q1");
    assert_eq!(flow.nodes().len(), 5);
    assert_eq!(
        flow.terminal_nodes().map(|(id, _)| id).collect::<Vec<_>>(),
        vec!["t1", "t2"]
    );
}

#[test]
fn test_missing_start_node() {
    let message = reject(|f| {
        f.as_object_mut().unwrap().remove("startNode");
    });
    assert!(message.contains("startNode"), "{message}");
}

#[test]
fn test_start_node_not_in_nodes() {
    let message = reject(|f| f["startNode"] = json!("q0"));
    assert!(message.contains("startNode 'q0' does not exist"), "{message}");
}

#[test]
fn test_missing_flow_id_and_version() {
    let message = reject(|f| f["flowId"] = json!(""));
    assert!(message.contains("flowId"), "{message}");

    let message = reject(|f| f["flowVersion"] = json!(2));
    assert!(message.contains("flowVersion"), "{message}");
}

#[test]
fn test_title_must_be_a_string_when_present() {
    let message = reject(|f| f["title"] = json!(5));
    assert!(message.contains("'title'"), "{message}");
    assert!(message.contains("a number"), "{message}");

    let mut untitled = battery_flow_json();
    untitled.as_object_mut().unwrap().remove("title");
    assert_eq!(validate(&document(untitled)).unwrap().title(), None);

    let mut null_title = battery_flow_json();
    null_title["title"] = json!(null);
    assert_eq!(validate(&document(null_title)).unwrap().title(), None);
}

#[test]
fn test_empty_nodes() {
    let message = reject(|f| f["nodes"] = json!({}));
    assert!(message.contains("has no nodes"), "{message}");

    let message = reject(|f| f["nodes"] = json!("q1"));
    assert!(message.contains("'nodes' is malformed"), "{message}");
}

#[test]
fn test_dangling_question_reference() {
    let message = reject(|f| f["nodes"]["q1"]["answers"]["no"] = json!("t9"));
    assert!(message.contains("references missing node 't9'"), "{message}");
    assert!(message.contains("answers.no"), "{message}");
}

#[test]
fn test_dangling_safety_reference() {
    let message = reject(|f| f["nodes"]["s1"]["next"] = json!("m9"));
    assert!(message.contains("references missing node 'm9'"), "{message}");
    assert!(message.contains("node 's1'"), "{message}");
}

#[test]
fn test_dangling_measure_reference() {
    let message = reject(|f| f["nodes"]["m1"]["branches"][1]["next"] = json!("t3"));
    assert!(message.contains("references missing node 't3'"), "{message}");
    assert!(message.contains("branches[1].next"), "{message}");
}

#[test]
fn test_safety_alternate_next_field() {
    let message = reject(|f| {
        let s1 = f["nodes"]["s1"].as_object_mut().unwrap();
        let next = s1.remove("next").unwrap();
        s1.insert("nextNode".into(), next);
    });
    assert!(message.contains("uses 'nextNode' instead of 'next'"), "{message}");
}

#[test]
fn test_measure_range_min_not_below_max() {
    let message = reject(|f| f["nodes"]["m1"]["validRange"] = json!({ "min": 15, "max": 15 }));
    assert!(message.contains("min must be less than max"), "{message}");

    let message = reject(|f| f["nodes"]["m1"]["validRange"] = json!({ "min": 20, "max": 10 }));
    assert!(message.contains("min must be less than max"), "{message}");
}

#[test]
fn test_measure_range_must_be_numeric() {
    let message = reject(|f| f["nodes"]["m1"]["validRange"]["min"] = json!("10"));
    assert!(message.contains("validRange.min"), "{message}");
}

#[test]
fn test_unparseable_branch_condition() {
    let message = reject(|f| f["nodes"]["m1"]["branches"][0]["condition"] = json!("about 11"));
    assert!(message.contains("branch 0 condition is invalid"), "{message}");
}

#[test]
fn test_empty_branches() {
    let message = reject(|f| f["nodes"]["m1"]["branches"] = json!([]));
    assert!(message.contains("'branches'"), "{message}");
}

#[test]
fn test_missing_text() {
    let message = reject(|f| {
        f["nodes"]["q1"].as_object_mut().unwrap().remove("text");
    });
    assert!(message.contains("node 'q1'"), "{message}");
    assert!(message.contains("field 'text'"), "{message}");

    let message = reject(|f| f["nodes"]["s1"]["text"] = json!("   "));
    assert!(message.contains("field 'text'"), "{message}");
}

#[test]
fn test_question_answers_must_be_non_empty() {
    let message = reject(|f| f["nodes"]["q1"]["answers"] = json!({}));
    assert!(message.contains("field 'answers'"), "{message}");
}

#[test]
fn test_unknown_node_type() {
    let message = reject(|f| f["nodes"]["s1"]["type"] = json!("warning"));
    assert!(message.contains("unknown node type 'warning'"), "{message}");
}

#[test]
fn test_terminal_missing_universal_field() {
    let message = reject(|f| {
        f["nodes"]["t2"]["artifact"]
            .as_object_mut()
            .unwrap()
            .remove("safety_notes");
    });
    assert!(message.contains("artifact.safety_notes"), "{message}");
    assert!(message.contains("required universal field"), "{message}");
}

#[test]
fn test_terminal_missing_result() {
    let message = reject(|f| f["nodes"]["t1"]["result"] = json!(""));
    assert!(message.contains("field 'result'"), "{message}");
}

#[test]
fn test_terminal_optional_field_types() {
    let message = reject(|f| f["nodes"]["t1"]["artifact"]["recommendations"] = json!("charge it"));
    assert!(message.contains("artifact.recommendations"), "{message}");
    assert!(message.contains("array of strings"), "{message}");

    let message = reject(|f| f["nodes"]["t1"]["artifact"]["notes"] = json!(["a", "b"]));
    assert!(message.contains("artifact.notes"), "{message}");

    let message = reject(|f| f["nodes"]["t1"]["artifact"]["technician_tier"] = json!(3));
    assert!(message.contains("artifact.technician_tier"), "{message}");
}

#[test]
fn test_unreachable_nodes_are_all_named() {
    let message = reject(|f| {
        let nodes = f["nodes"].as_object_mut().unwrap();
        nodes.insert(
            "z_orphan".into(),
            json!({ "type": "safety", "text": "Never shown", "next": "t1" }),
        );
        nodes.insert(
            "a_orphan".into(),
            json!({ "type": "safety", "text": "Never shown either", "next": "z_orphan" }),
        );
    });
    assert!(message.contains("unreachable nodes"), "{message}");
    assert!(message.contains("a_orphan, z_orphan"), "{message}");
}

#[test]
fn test_zero_terminal_nodes() {
    let flow = json!({
        "flowId": "loop",
        "flowVersion": "1",
        "startNode": "a",
        "nodes": {
            "a": { "type": "safety", "text": "Step A", "next": "b" },
            "b": { "type": "question", "text": "Again?", "answers": { "yes": "a" } }
        }
    });
    let err = validate(&document(flow)).unwrap_err();
    assert!(matches!(err, ValidationError::NoTerminalNode { .. }));
    assert!(err.to_string().contains("no Terminal node"));
}

#[test]
fn test_tagged_array_encoding_matches_mapping() {
    let mapped = battery_flow();

    let mut flow = battery_flow_json();
    let nodes: Vec<Value> = flow["nodes"]
        .as_object()
        .unwrap()
        .iter()
        .map(|(id, body)| {
            let mut body = body.clone();
            body["id"] = json!(id);
            body
        })
        .collect();
    flow["nodes"] = Value::Array(nodes);

    let tagged = validate(&document(flow)).expect("array encoding should validate");
    assert_eq!(tagged.nodes().keys().collect::<Vec<_>>(), mapped.nodes().keys().collect::<Vec<_>>());
    assert_eq!(tagged.node("m1"), mapped.node("m1"));
    assert_eq!(tagged.node("t2"), mapped.node("t2"));
}

#[test]
fn test_tagged_array_duplicate_ids() {
    let flow = json!({
        "flowId": "dup",
        "flowVersion": "1",
        "startNode": "a",
        "nodes": [
            { "id": "a", "type": "safety", "text": "A", "next": "end" },
            { "id": "a", "type": "safety", "text": "A again", "next": "end" },
            { "id": "end", "type": "terminal", "result": "done", "artifact": {} }
        ]
    });
    let err = validate(&document(flow)).unwrap_err();
    assert!(err.to_string().contains("duplicate node id 'a'"), "{err}");
}

#[test]
fn test_validated_measure_keeps_declaration_order() {
    let flow = battery_flow();
    let Some(Node::Measure(measure)) = flow.node("m1") else {
        panic!("m1 should be a Measure node");
    };
    assert_eq!(measure.unit.as_deref(), Some("V"));
    assert_eq!(measure.valid_range.min, 10.0);
    assert_eq!(measure.valid_range.max, 15.0);
    assert_eq!(measure.branches[0].next, "t1");
    assert_eq!(measure.branches[0].condition.to_string(), "< 11.8");
    assert_eq!(measure.select_branch(11.8).map(|b| b.next.as_str()), Some("t2"));
}

#[test]
fn test_load_flow_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("battery.json");
    std::fs::write(&path, battery_flow_json().to_string()).unwrap();

    let flow = load_flow(&path).expect("flow file should load");
    assert_eq!(flow, battery_flow());

    let missing = load_flow(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(missing, FlowLoadError::Io { .. }));

    std::fs::write(&path, "{ not json").unwrap();
    assert!(matches!(load_flow(&path).unwrap_err(), FlowLoadError::Json(_)));
}
