//! Det3 Engine: canonical hashing
//!
//! Deterministic canonical serialization + SHA-256 hashing.
//! Produces byte-identical output across platforms.
//!
//! Rules:
//!   - Fixed field order, built with an insertion-ordered map
//!   - Integers, booleans and ASCII strings only
//!   - UTF-8 JSON, no whitespace, no platform newline

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::domain::{EngineState, Outputs};
use crate::ENGINE_VERSION;

/// Canonical serialization of an EngineState to UTF-8 JSON bytes.
///
/// Field order: engine_version, cycle, phase, cursor, matrix, result,
///              result_valid, overflow, request
pub fn canonical_serialize(state: &EngineState) -> Vec<u8> {
    serde_json::to_string(&build_state_value(state))
        .expect("canonical_serialize: JSON serialization failed")
        .into_bytes()
}

/// SHA-256 of the canonical state serialization. Lowercase hex string.
pub fn canonical_hash(state: &EngineState) -> String {
    hex_digest(&canonical_serialize(state))
}

/// Canonical serialization of an observable output trace.
///
/// One object per edge, numbered from 1, field order:
/// edge, request, result, result_valid, overflow
pub fn trace_serialize(trace: &[Outputs]) -> Vec<u8> {
    let edges: Vec<Value> = trace
        .iter()
        .enumerate()
        .map(|(i, o)| {
            let mut m = Map::new();
            m.insert("edge".to_string(), Value::Number((i as u64 + 1).into()));
            m.insert("request".to_string(), Value::Bool(o.request));
            m.insert("result".to_string(), Value::Number((o.result as i64).into()));
            m.insert("result_valid".to_string(), Value::Bool(o.result_valid));
            m.insert("overflow".to_string(), Value::Bool(o.overflow));
            Value::Object(m)
        })
        .collect();

    serde_json::to_string(&Value::Array(edges))
        .expect("trace_serialize: JSON serialization failed")
        .into_bytes()
}

/// SHA-256 of the canonical trace serialization. Lowercase hex string.
pub fn trace_hash(trace: &[Outputs]) -> String {
    hex_digest(&trace_serialize(trace))
}

/// SHA-256 of `bytes` as a lowercase hex string.
pub fn hex_digest(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

fn build_state_value(state: &EngineState) -> Value {
    let mut cursor = Map::new();
    cursor.insert("row".to_string(), Value::Number(state.cursor.row.into()));
    cursor.insert("col".to_string(), Value::Number(state.cursor.col.into()));

    let rows: Vec<Value> = state
        .matrix
        .cells()
        .iter()
        .map(|row| {
            Value::Array(
                row.iter()
                    .map(|&v| Value::Number((v as i64).into()))
                    .collect(),
            )
        })
        .collect();

    // engine_version MUST be first: it binds the hash to this transition table.
    let mut root = Map::new();
    root.insert(
        "engine_version".to_string(),
        Value::Number((ENGINE_VERSION as i64).into()),
    );
    root.insert("cycle".to_string(), Value::Number(state.cycle.into()));
    root.insert(
        "phase".to_string(),
        Value::String(state.phase.as_str().to_string()),
    );
    root.insert("cursor".to_string(), Value::Object(cursor));
    root.insert("matrix".to_string(), Value::Array(rows));
    root.insert(
        "result".to_string(),
        Value::Number((state.result as i64).into()),
    );
    root.insert("result_valid".to_string(), Value::Bool(state.result_valid));
    root.insert("overflow".to_string(), Value::Bool(state.overflow));
    root.insert("request".to_string(), Value::Bool(state.request));

    Value::Object(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::create_initial_state;

    #[test]
    fn initial_state_serializes_in_fixed_order() {
        let json = String::from_utf8(canonical_serialize(&create_initial_state())).unwrap();
        assert_eq!(
            json,
            "{\"engine_version\":1,\"cycle\":0,\"phase\":\"reset\",\
             \"cursor\":{\"row\":0,\"col\":0},\
             \"matrix\":[[0,0,0],[0,0,0],[0,0,0]],\
             \"result\":0,\"result_valid\":false,\"overflow\":false,\"request\":true}"
        );
    }

    #[test]
    fn hash_is_lowercase_hex() {
        let h = canonical_hash(&create_initial_state());
        assert_eq!(h.len(), 64);
        assert!(h.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn empty_trace_hash_is_hash_of_empty_array() {
        assert_eq!(trace_serialize(&[]), b"[]".to_vec());
        assert_eq!(
            trace_hash(&[]),
            "4f53cda18c2baa0c0354bb5f9a3ecbe5ed12ab4d8e11ba873c2f11161202b945"
        );
    }

    #[test]
    fn trace_serialize_shape() {
        let o = Outputs {
            request: false,
            result: -5,
            result_valid: true,
            overflow: false,
        };
        let json = String::from_utf8(trace_serialize(&[o])).unwrap();
        assert_eq!(
            json,
            "[{\"edge\":1,\"request\":false,\"result\":-5,\"result_valid\":true,\"overflow\":false}]"
        );
    }
}
