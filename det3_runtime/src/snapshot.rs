//! Snapshot layer: deterministic engine checkpoints.
//!
//! Two formats share this module:
//!   - `Snapshot` files (`snapshot_NNNNNN.json`) wrap the canonical state
//!     JSON with its hash, for checkpoints taken during a run
//!   - the plain codec (`encode_state` / `decode_state` / `restore_state`)
//!     writes and reads the serde form of `EngineState`
//!
//! No timestamps anywhere. Restores are strict and validate invariants.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use det3_engine::hashing::{canonical_hash, canonical_serialize, hex_digest};
use det3_engine::invariants::try_validate_invariants;
use det3_engine::{EngineState, ENGINE_VERSION};

use crate::error::SnapshotError;

/// Snapshot on-disk format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Snapshot {
    /// Edge count at which this snapshot was taken.
    pub cycle: u64,
    /// Canonical JSON of the state (UTF-8).
    pub canonical_json: String,
    /// SHA-256 of the canonical JSON.
    pub hash: String,
    pub engine_version: u32,
}

impl Snapshot {
    pub fn capture(state: &EngineState) -> Result<Self, SnapshotError> {
        let canonical_json = String::from_utf8(canonical_serialize(state))
            .map_err(|e| SnapshotError::Serialization(e.to_string()))?;
        Ok(Self {
            cycle: state.cycle,
            canonical_json,
            hash: canonical_hash(state),
            engine_version: ENGINE_VERSION,
        })
    }

    /// Verify the hash, then decode and validate the embedded state.
    pub fn restore(&self) -> Result<EngineState, SnapshotError> {
        verify_snapshot_hash(self)?;

        let mut value: Value = serde_json::from_str(&self.canonical_json)
            .map_err(|e| SnapshotError::Deserialization(e.to_string()))?;
        let version = value
            .as_object_mut()
            .and_then(|m| m.remove("engine_version"))
            .and_then(|v| v.as_u64());
        if version != Some(u64::from(ENGINE_VERSION)) {
            return Err(SnapshotError::Deserialization(format!(
                "engine_version {:?} does not match {}",
                version, ENGINE_VERSION
            )));
        }

        let state: EngineState = serde_json::from_value(value)
            .map_err(|e| SnapshotError::Deserialization(e.to_string()))?;
        try_validate_invariants(&state)?;
        Ok(state)
    }
}

fn snapshot_path(dir: &Path, cycle: u64) -> PathBuf {
    dir.join(format!("snapshot_{:06}.json", cycle))
}

/// Save a deterministic snapshot of the current state.
pub fn save_snapshot(dir: &Path, state: &EngineState) -> Result<PathBuf, SnapshotError> {
    fs::create_dir_all(dir)?;

    let snap = Snapshot::capture(state)?;
    let content =
        serde_json::to_string(&snap).map_err(|e| SnapshotError::Serialization(e.to_string()))?;

    let path = snapshot_path(dir, snap.cycle);
    let mut file = File::create(&path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;

    debug!(cycle = snap.cycle, path = %path.display(), "snapshot saved");
    Ok(path)
}

/// Load the snapshot taken at `cycle`, if one exists.
pub fn load_snapshot(dir: &Path, cycle: u64) -> Result<Option<Snapshot>, SnapshotError> {
    let path = snapshot_path(dir, cycle);
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&path)?;
    let snap = serde_json::from_str(&content)
        .map_err(|e| SnapshotError::Deserialization(format!("bad snapshot: {}", e)))?;
    Ok(Some(snap))
}

/// Load the snapshot with the highest cycle number in `dir`.
pub fn load_latest_snapshot(dir: &Path) -> Result<Option<Snapshot>, SnapshotError> {
    if !dir.exists() {
        return Ok(None);
    }

    let mut best: Option<u64> = None;
    for entry in fs::read_dir(dir)? {
        let name = entry?.file_name();
        let cycle = name
            .to_str()
            .and_then(|n| n.strip_prefix("snapshot_"))
            .and_then(|n| n.strip_suffix(".json"))
            .and_then(|n| n.parse::<u64>().ok());
        if let Some(cycle) = cycle {
            best = Some(best.map_or(cycle, |b| b.max(cycle)));
        }
    }

    match best {
        Some(cycle) => load_snapshot(dir, cycle),
        None => Ok(None),
    }
}

/// Check that the stored hash matches the stored canonical JSON.
pub fn verify_snapshot_hash(snap: &Snapshot) -> Result<(), SnapshotError> {
    let computed = hex_digest(snap.canonical_json.as_bytes());
    if computed != snap.hash {
        warn!(cycle = snap.cycle, "snapshot hash mismatch");
        return Err(SnapshotError::HashMismatch {
            stored: snap.hash.clone(),
            computed,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Plain state codec
// ---------------------------------------------------------------------------

/// Encode an EngineState to its serde JSON form. No whitespace.
pub fn encode_state(state: &EngineState) -> Result<String, SnapshotError> {
    serde_json::to_string(state).map_err(|e| SnapshotError::Serialization(e.to_string()))
}

/// Strict decode: unknown or missing fields fail. No invariant check.
pub fn decode_state(json: &str) -> Result<EngineState, SnapshotError> {
    serde_json::from_str(json).map_err(|e| SnapshotError::Deserialization(e.to_string()))
}

/// Decode and validate invariants. Entry point for untrusted input.
pub fn restore_state(json: &str) -> Result<EngineState, SnapshotError> {
    let state = decode_state(json)?;
    try_validate_invariants(&state)?;
    Ok(state)
}

pub fn export_state_to_file(state: &EngineState, path: &Path) -> Result<(), SnapshotError> {
    let json = encode_state(state)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, json.as_bytes())?;
    Ok(())
}

pub fn import_state_from_file(path: &Path) -> Result<EngineState, SnapshotError> {
    let content = fs::read_to_string(path)?;
    restore_state(&content)
}

/// SHA-256 of the serde encoding. Integrity check for exported files;
/// distinct from the canonical hash.
pub fn state_file_hash(state: &EngineState) -> Result<String, SnapshotError> {
    Ok(hex_digest(encode_state(state)?.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use det3_engine::events::matrix_burst;
    use det3_engine::{DeterminantEngine, Phase};

    fn held_state() -> EngineState {
        let mut engine = DeterminantEngine::new();
        engine.replay(&matrix_burst(1, [3, 0, 0, 0, 3, 0, 0, 0, 3]));
        engine.state().clone()
    }

    fn fresh_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("det3_snapshot_tests").join(name);
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    // ── Snapshot files ─────────────────────────────────────────────

    #[test]
    fn snapshot_restores_same_state() {
        let state = held_state();
        let snap = Snapshot::capture(&state).unwrap();
        assert_eq!(snap.cycle, 9);
        assert_eq!(snap.restore().unwrap(), state);
    }

    #[test]
    fn latest_snapshot_wins() {
        let dir = fresh_dir("latest");
        let mut engine = DeterminantEngine::new();
        engine.clock(1, true);
        save_snapshot(&dir, engine.state()).unwrap();
        engine.clock(2, true);
        engine.clock(3, true);
        save_snapshot(&dir, engine.state()).unwrap();

        let latest = load_latest_snapshot(&dir).unwrap().unwrap();
        assert_eq!(latest.cycle, 3);
        assert!(dir.join("snapshot_000003.json").exists());
        assert!(load_snapshot(&dir, 2).unwrap().is_none());
    }

    #[test]
    fn tampered_snapshot_is_rejected() {
        let mut snap = Snapshot::capture(&held_state()).unwrap();
        snap.canonical_json = snap.canonical_json.replace("\"result\":27", "\"result\":28");
        assert!(matches!(
            snap.restore(),
            Err(SnapshotError::HashMismatch { .. })
        ));
    }

    #[test]
    fn empty_dir_has_no_latest() {
        let dir = fresh_dir("empty");
        assert!(load_latest_snapshot(&dir).unwrap().is_none());
    }

    // ── Plain codec ────────────────────────────────────────────────

    #[test]
    fn codec_roundtrip_is_stable() {
        let state = held_state();
        let json1 = encode_state(&state).unwrap();
        let json2 = encode_state(&restore_state(&json1).unwrap()).unwrap();
        assert_eq!(json1, json2);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let mut v: Value = serde_json::to_value(held_state()).unwrap();
        v["extra"] = Value::Bool(true);
        let result = decode_state(&v.to_string());
        assert!(matches!(result, Err(SnapshotError::Deserialization(_))));
    }

    #[test]
    fn invariant_breach_is_rejected() {
        let mut state = held_state();
        state.phase = Phase::Filling;
        state.request = false;
        let json = encode_state(&state).unwrap();
        match restore_state(&json) {
            Err(SnapshotError::InvariantViolation(v)) => {
                assert_eq!(v.check, "request_handshake");
            }
            other => panic!("expected invariant violation, got {:?}", other),
        }
    }

    #[test]
    fn file_hash_matches_written_bytes() {
        let state = held_state();
        let path = fresh_dir("file_hash").join("state.json");
        export_state_to_file(&state, &path).unwrap();
        let bytes = fs::read(&path).unwrap();
        assert_eq!(hex_digest(&bytes), state_file_hash(&state).unwrap());
        assert_eq!(import_state_from_file(&path).unwrap(), state);
    }
}
