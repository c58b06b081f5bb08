//! End-to-end runs over a flow file and a directory-backed store.
mod common;
use common::*;
use shindan::prelude::*;
use std::fs;
use tempfile::TempDir;

fn write_flow(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("battery-check.json");
    fs::write(&path, serde_json::to_vec_pretty(&battery_flow_json()).unwrap()).unwrap();
    path
}

#[test]
fn test_run_from_flow_file() -> Result<()> {
    let dir = TempDir::new()?;
    let flow = load_flow(write_flow(&dir))?;
    let engine = Engine::new(flow, FileStore::open(dir.path().join("data"))?);

    let mut state = engine.start_session()?;
    for input in ["yes", "ok", "12.9"] {
        let node = engine.current_node(&state)?;
        state = engine.process_response(&state, ResponseValue::parse_for(node, input))?;
    }

    assert!(state.completed);
    assert_eq!(state.terminal_node_id.as_deref(), Some("t2"));
    assert_eq!(engine.resume_session()?, None);

    let history = engine.history()?;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].result.as_deref(), Some("Battery healthy"));
    Ok(())
}

#[test]
fn test_crash_and_resume_across_processes() -> Result<()> {
    let dir = TempDir::new()?;
    let flow_path = write_flow(&dir);
    let data = dir.path().join("data");

    // First "process": answers two nodes and goes away without stopping.
    let session_id = {
        let engine = Engine::new(load_flow(&flow_path)?, FileStore::open(&data)?);
        let state = engine.start_session()?;
        let state = engine.process_response(&state, "yes")?;
        let state = engine.process_response(&state, true)?;
        state.session_id
    };

    // Second "process": only the files on disk remain.
    let engine = Engine::new(load_flow(&flow_path)?, FileStore::open(&data)?);
    let state = engine
        .resume_session()?
        .ok_or("session should be resumable")?;
    assert_eq!(state.session_id, session_id);
    assert_eq!(state.current_node_id, "m1");

    let done = engine.process_response(&state, 11.5)?;
    assert_eq!(done.result.as_deref(), Some("Battery discharged"));

    let kinds: Vec<EventKind> = done.events.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        [
            EventKind::Question,
            EventKind::Safety,
            EventKind::Measure,
            EventKind::Terminal
        ]
    );
    Ok(())
}

#[test]
fn test_history_accumulates_across_sessions() -> Result<()> {
    let dir = TempDir::new()?;
    let flow_path = write_flow(&dir);
    let data = dir.path().join("data");

    {
        let engine = Engine::new(load_flow(&flow_path)?, FileStore::open(&data)?);
        let state = engine.start_session()?;
        engine.process_response(&state, "no")?;
    }
    {
        let engine = Engine::new(load_flow(&flow_path)?, FileStore::open(&data)?);
        let state = engine.start_session()?;
        let state = engine.process_response(&state, "yes")?;
        engine.stop_session(&state)?;
    }

    let store = FileStore::open(&data)?;
    let history = store.session_history()?;
    assert_eq!(history.len(), 2);
    assert!(!history[0].stopped);
    assert!(history[1].stopped);
    assert_eq!(
        history[1].artifact["stop_reason"],
        ArtifactValue::from("User stopped diagnostic at node: s1")
    );

    let engine = Engine::new(load_flow(&flow_path)?, store);
    assert_eq!(engine.resume_session()?, None);
    let store = engine.into_store();
    store.clear_session_history()?;
    assert!(store.session_history()?.is_empty());
    Ok(())
}

#[test]
fn test_replayed_responses_normalize_identically() -> Result<()> {
    let dir = TempDir::new()?;
    let flow_path = write_flow(&dir);
    let responses: Vec<ResponseValue> = serde_json::from_str(r#"["yes", true, 11.5]"#)?;

    let mut normalized = Vec::new();
    for run in 0..2 {
        let engine = Engine::new(
            load_flow(&flow_path)?,
            FileStore::open(dir.path().join(format!("run-{run}")))?,
        );
        let state = engine.start_session()?;
        let done = run_responses(&engine, state, &responses);
        normalized.push(serde_json::to_string(
            &summary_for(&engine.history()?, &done.session_id).normalized(),
        )?);
    }

    assert_eq!(normalized[0], normalized[1]);
    Ok(())
}
