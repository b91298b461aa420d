//! Append-only stimulus trace: binary protobuf log.
//!
//! Storage format: length-prefixed protobuf frames.
//!   [4-byte LE length][protobuf bytes][4-byte LE length][protobuf bytes]...
//!
//! Rules:
//!   - Strict append only, no mutation or reordering
//!   - fsync after every write
//!   - Cycles consecutive, starting at 1 (validated on append and on load)

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use prost::Message;
use tracing::debug;

use det3_engine::Stimulus;

use crate::error::{BenchError, BenchResult};
use crate::proto_bridge::{proto_to_stimulus, stimulus_to_proto};
use crate::proto_types::ProtoStimulus;

const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Append-only stimulus log backed by a binary file.
#[derive(Debug)]
pub struct TraceStore {
    path: PathBuf,
    last_cycle: u64,
}

impl TraceStore {
    /// Open or create a trace log at the given path.
    /// Reads existing frames to determine the last cycle.
    pub fn open(path: &Path) -> BenchResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let last_cycle = if path.exists() {
            let stimuli = Self::read_all_from_file(path)?;
            stimuli.last().map(|s| s.cycle).unwrap_or(0)
        } else {
            0
        };

        debug!(path = %path.display(), last_cycle, "opened trace store");
        Ok(Self {
            path: path.to_path_buf(),
            last_cycle,
        })
    }

    /// Append a single stimulus. Its cycle must follow the last one.
    pub fn append(&mut self, stimulus: &Stimulus) -> BenchResult<()> {
        let expected = self.last_cycle + 1;
        if stimulus.cycle != expected {
            return Err(BenchError::SequenceViolation {
                expected,
                got: stimulus.cycle,
            });
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let buf = stimulus_to_proto(stimulus).encode_to_vec();
        let len = buf.len() as u32;

        {
            let mut writer = BufWriter::new(&mut file);
            writer.write_all(&len.to_le_bytes())?;
            writer.write_all(&buf)?;
            writer.flush()?;
        }
        file.sync_all()?;

        self.last_cycle = stimulus.cycle;
        Ok(())
    }

    /// Load every stimulus in cycle order.
    pub fn load_all(&self) -> BenchResult<Vec<Stimulus>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        Self::read_all_from_file(&self.path)
    }

    pub fn last_cycle(&self) -> u64 {
        self.last_cycle
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all frames from a file, validating frame integrity and
    /// consecutive cycle numbering from 1.
    pub fn read_all_from_file(path: &Path) -> BenchResult<Vec<Stimulus>> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let mut stimuli = Vec::new();
        let mut len_buf = [0u8; 4];
        let mut offset = 0u64;

        loop {
            match reader.read_exact(&mut len_buf) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            }

            let len = u32::from_le_bytes(len_buf) as usize;
            if len == 0 || len > MAX_FRAME_LEN {
                return Err(BenchError::CorruptFrame(format!(
                    "invalid frame length {} at offset {}",
                    len, offset
                )));
            }

            let mut frame = vec![0u8; len];
            reader.read_exact(&mut frame).map_err(|e| {
                BenchError::CorruptFrame(format!("truncated frame at offset {}: {}", offset, e))
            })?;

            let proto = ProtoStimulus::decode(frame.as_slice())?;
            let stimulus = proto_to_stimulus(&proto)?;
            let expected = stimuli.len() as u64 + 1;
            if stimulus.cycle != expected {
                return Err(BenchError::SequenceViolation {
                    expected,
                    got: stimulus.cycle,
                });
            }
            stimuli.push(stimulus);
            offset += 4 + len as u64;
        }

        Ok(stimuli)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("det3_trace_store_tests").join(name);
        let _ = fs::remove_dir_all(&dir);
        dir.join("trace.log")
    }

    #[test]
    fn append_and_reopen() {
        let path = fresh("reopen");
        let mut store = TraceStore::open(&path).unwrap();
        store.append(&Stimulus::element(1, -5)).unwrap();
        store.append(&Stimulus::idle(2, 0)).unwrap();
        store.append(&Stimulus::reset(3)).unwrap();

        let reopened = TraceStore::open(&path).unwrap();
        assert_eq!(reopened.last_cycle(), 3);
        let loaded = reopened.load_all().unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded[0], Stimulus::element(1, -5));
        assert!(loaded[2].reset);
    }

    #[test]
    fn gap_in_cycles_is_rejected() {
        let path = fresh("gap");
        let mut store = TraceStore::open(&path).unwrap();
        store.append(&Stimulus::element(1, 1)).unwrap();
        let err = store.append(&Stimulus::element(3, 1)).unwrap_err();
        assert!(matches!(
            err,
            BenchError::SequenceViolation {
                expected: 2,
                got: 3
            }
        ));
        assert_eq!(store.last_cycle(), 1);
    }

    #[test]
    fn zero_length_frame_is_corrupt() {
        let path = fresh("zero_len");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, 0u32.to_le_bytes()).unwrap();
        assert!(matches!(
            TraceStore::read_all_from_file(&path),
            Err(BenchError::CorruptFrame(_))
        ));
    }

    fn write_raw(path: &Path, cycles: &[u64]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut bytes = Vec::new();
        for &c in cycles {
            let buf = stimulus_to_proto(&Stimulus::element(c, 1)).encode_to_vec();
            bytes.extend_from_slice(&(buf.len() as u32).to_le_bytes());
            bytes.extend_from_slice(&buf);
        }
        fs::write(path, bytes).unwrap();
    }

    #[test]
    fn gap_on_disk_is_rejected_at_load() {
        let path = fresh("gap_on_disk");
        write_raw(&path, &[1, 5, 5]);
        assert!(matches!(
            TraceStore::read_all_from_file(&path),
            Err(BenchError::SequenceViolation {
                expected: 2,
                got: 5
            })
        ));
        assert!(TraceStore::open(&path).is_err());
    }

    #[test]
    fn log_not_starting_at_one_is_rejected() {
        let path = fresh("late_start");
        write_raw(&path, &[2, 3]);
        assert!(matches!(
            TraceStore::read_all_from_file(&path),
            Err(BenchError::SequenceViolation {
                expected: 1,
                got: 2
            })
        ));
    }

    #[test]
    fn missing_file_loads_empty() {
        let path = fresh("missing");
        let store = TraceStore::open(&path).unwrap();
        assert_eq!(store.last_cycle(), 0);
        assert!(store.load_all().unwrap().is_empty());
    }
}
