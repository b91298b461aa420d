//! Testbench configuration.
//!
//! Every field has a default, so a config file only needs the values it
//! changes. CLI flags are applied on top by the binary.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BenchError, BenchResult};

/// What the driver parks on the data bus while `valid` is low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdleData {
    #[default]
    Zero,
    /// Alternating-bit pattern, `0xAAAA`.
    Pattern,
}

impl IdleData {
    pub fn value(&self) -> i16 {
        match self {
            IdleData::Zero => 0,
            IdleData::Pattern => 0xAAAAu16 as i16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BenchConfig {
    /// Seed for every random draw in a run.
    pub seed: u64,
    /// Item count override; `None` uses the sequence's own default.
    pub items: Option<usize>,
    /// Reset pulse count override for the multiple-reset sequence.
    pub num_resets: Option<usize>,
    /// Cycles between reset pulses, inclusive range.
    pub reset_gap_min: u64,
    pub reset_gap_max: u64,
    pub reset_hold_cycles: u64,
    /// Upper bound for a random pre-element delay.
    pub max_pre_delay: u32,
    /// Allowed latency deviation before the scoreboard warns.
    pub latency_tolerance: u64,
    pub idle_data: IdleData,
    /// Hard stop for the cycle loop.
    pub max_cycles: u64,
    /// Snapshot every N cycles; 0 disables.
    pub snapshot_interval: u64,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            items: None,
            num_resets: None,
            reset_gap_min: 50,
            reset_gap_max: 200,
            reset_hold_cycles: 5,
            max_pre_delay: 10,
            latency_tolerance: 2,
            idle_data: IdleData::Zero,
            max_cycles: 10_000_000,
            snapshot_interval: 0,
        }
    }
}

impl BenchConfig {
    /// Read a JSON config file. Unknown keys are rejected.
    pub fn load(path: &Path) -> BenchResult<Self> {
        let content = fs::read_to_string(path)?;
        let config: BenchConfig = serde_json::from_str(&content)
            .map_err(|e| BenchError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> BenchResult<()> {
        if self.reset_gap_min > self.reset_gap_max {
            return Err(BenchError::Config(format!(
                "reset_gap_min ({}) exceeds reset_gap_max ({})",
                self.reset_gap_min, self.reset_gap_max
            )));
        }
        if self.reset_hold_cycles == 0 {
            return Err(BenchError::Config(
                "reset_hold_cycles must be at least 1".to_string(),
            ));
        }
        if self.max_cycles == 0 {
            return Err(BenchError::Config("max_cycles must be positive".to_string()));
        }
        Ok(())
    }
}
