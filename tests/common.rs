//! Common test fixtures: flow documents, stores and session drivers.
use serde_json::{Value, json};
use shindan::error::StorageError;
use shindan::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};

/// Battery check used across the suite.
///
/// `q1` (question) -yes-> `s1` (safety) -> `m1` (measure, 10..=15 V)
/// `< 11.8` -> `t1`, `>= 11.8` -> `t2`; `q1` -no-> `t1`.
#[allow(dead_code)]
pub fn battery_flow_json() -> Value {
    json!({
        "flowId": "battery-check",
        "flowVersion": "1.0",
        "title": "Starter battery check",
        "startNode": "q1",
        "nodes": {
            "q1": {
                "type": "question",
                "text": "Does the engine crank?",
                "answers": { "yes": "s1", "no": "t1" }
            },
            "s1": {
                "type": "safety",
                "text": "Put on insulated gloves before touching the terminals.",
                "next": "m1"
            },
            "m1": {
                "type": "measure",
                "text": "Measure the resting battery voltage.",
                "unit": "V",
                "validRange": { "min": 10, "max": 15 },
                "branches": [
                    { "condition": "< 11.8", "next": "t1" },
                    { "condition": ">= 11.8", "next": "t2" }
                ]
            },
            "t1": {
                "type": "terminal",
                "result": "Battery discharged",
                "artifact": {
                    "flow_id": "battery-check",
                    "flow_version": "1.0",
                    "issue": "Low battery voltage",
                    "stop_reason": "",
                    "last_confirmed_state": "Voltage below threshold",
                    "safety_notes": "Wear insulated gloves",
                    "measured_voltage": "{{m1.value}}",
                    "engine_cranks": "{{q1.value}}",
                    "technician_tier": "field",
                    "stabilization_actions": ["Connect a maintenance charger"],
                    "recommendations": ["Replace battery if it fails a load test"],
                    "notes": "Discharged battery"
                }
            },
            "t2": {
                "type": "terminal",
                "result": "Battery healthy",
                "artifact": {
                    "flow_id": "battery-check",
                    "flow_version": "1.0",
                    "issue": "Starter circuit",
                    "stop_reason": "",
                    "last_confirmed_state": "Voltage nominal",
                    "safety_notes": "Wear insulated gloves",
                    "measured_voltage": "{{m1.value}}",
                    "engine_cranks": "{{q1.value}}",
                    "technician_tier": "workshop",
                    "stabilization_actions": [],
                    "recommendations": ["Inspect starter relay"],
                    "notes": "Battery within range"
                }
            }
        }
    })
}

#[allow(dead_code)]
pub fn document(value: Value) -> FlowDocument {
    serde_json::from_value(value).expect("fixture must deserialize into a FlowDocument")
}

#[allow(dead_code)]
pub fn battery_flow() -> FlowDefinition {
    validate(&document(battery_flow_json())).expect("battery fixture must validate")
}

/// Applies every response in order and returns the final state.
#[allow(dead_code)]
pub fn run_responses<S: SessionStore>(
    engine: &Engine<S>,
    mut state: SessionState,
    responses: &[ResponseValue],
) -> SessionState {
    for response in responses {
        state = engine
            .process_response(&state, response.clone())
            .expect("response should be accepted");
    }
    state
}

/// The summary recorded for `session_id`, if any.
#[allow(dead_code)]
pub fn summary_for(history: &[SessionSummary], session_id: &str) -> SessionSummary {
    history
        .iter()
        .find(|s| s.session_id == session_id)
        .cloned()
        .expect("summary should be in history")
}

/// A store whose writes can be switched to fail, for all-or-nothing checks.
#[allow(dead_code)]
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    fail_state_writes: AtomicBool,
    fail_summary_writes: AtomicBool,
}

#[allow(dead_code)]
impl FlakyStore {
    pub fn fail_state_writes(&self, fail: bool) {
        self.fail_state_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_summary_writes(&self, fail: bool) {
        self.fail_summary_writes.store(fail, Ordering::SeqCst);
    }

    fn injected() -> StorageError {
        StorageError::Io(std::io::Error::other("injected write failure"))
    }
}

impl SessionStore for FlakyStore {
    fn save_session_state(&self, state: &SessionState) -> std::result::Result<(), StorageError> {
        if self.fail_state_writes.load(Ordering::SeqCst) {
            return Err(Self::injected());
        }
        self.inner.save_session_state(state)
    }

    fn load_session_state(&self) -> std::result::Result<Option<SessionState>, StorageError> {
        self.inner.load_session_state()
    }

    fn clear_session_state(&self) -> std::result::Result<(), StorageError> {
        self.inner.clear_session_state()
    }

    fn save_session_summary(&self, summary: &SessionSummary) -> std::result::Result<(), StorageError> {
        if self.fail_summary_writes.load(Ordering::SeqCst) {
            return Err(Self::injected());
        }
        self.inner.save_session_summary(summary)
    }

    fn session_history(&self) -> std::result::Result<Vec<SessionSummary>, StorageError> {
        self.inner.session_history()
    }

    fn clear_session_history(&self) -> std::result::Result<(), StorageError> {
        self.inner.clear_session_history()
    }
}
