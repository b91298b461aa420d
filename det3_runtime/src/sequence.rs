//! Stimulus sequences.
//!
//! Every generator draws from a `StdRng` seeded from the config, so a
//! (kind, config) pair always produces the same items and reset pulses.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use det3_engine::arithmetic::ELEMENT_COUNT;
use det3_engine::Matrix;

use crate::config::BenchConfig;
use crate::items::MatrixItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SequenceKind {
    /// Identity, then a small matrix with unit delays.
    Simple,
    /// Full 16-bit range, random delays.
    Random,
    /// Full 16-bit range, no delays.
    Stress,
    /// Elements in -32..=32, delays up to 5.
    Small,
    /// Random items with reset pulses injected during traffic.
    MultipleReset,
}

impl SequenceKind {
    pub fn default_items(&self) -> usize {
        match self {
            SequenceKind::Simple => 2,
            SequenceKind::Random => 1000,
            SequenceKind::Stress => 100,
            SequenceKind::Small => 50,
            SequenceKind::MultipleReset => 30,
        }
    }
}

/// Reset held asserted for `hold` cycles starting at cycle `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetPulse {
    pub start: u64,
    pub hold: u64,
}

impl ResetPulse {
    pub fn end(&self) -> u64 {
        self.start + self.hold
    }
}

/// Ordered, non-overlapping reset pulses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetSchedule {
    pulses: Vec<ResetPulse>,
}

impl ResetSchedule {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_pulses(mut pulses: Vec<ResetPulse>) -> Self {
        pulses.sort_by_key(|p| p.start);
        Self { pulses }
    }

    /// `count` pulses of `hold` cycles, each starting a random gap after the
    /// previous one ended.
    pub fn random(rng: &mut StdRng, count: usize, gap_min: u64, gap_max: u64, hold: u64) -> Self {
        let mut pulses = Vec::with_capacity(count);
        let mut at = 1;
        for _ in 0..count {
            let start = at + rng.gen_range(gap_min..=gap_max);
            pulses.push(ResetPulse { start, hold });
            at = start + hold;
        }
        Self { pulses }
    }

    pub fn is_asserted(&self, cycle: u64) -> bool {
        self.pulses
            .iter()
            .any(|p| cycle >= p.start && cycle < p.end())
    }

    /// First cycle after which no further reset is scheduled.
    pub fn quiet_after(&self) -> u64 {
        self.pulses.iter().map(ResetPulse::end).max().unwrap_or(0)
    }

    pub fn pulses(&self) -> &[ResetPulse] {
        &self.pulses
    }
}

/// Items to drive and resets to inject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    pub kind: SequenceKind,
    pub items: Vec<MatrixItem>,
    pub resets: ResetSchedule,
}

pub fn generate(kind: SequenceKind, config: &BenchConfig) -> Sequence {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let count = config.items.unwrap_or_else(|| kind.default_items());

    let (items, resets) = match kind {
        SequenceKind::Simple => (simple_items(count), ResetSchedule::none()),
        SequenceKind::Random => (
            random_items(&mut rng, count, i16::MIN, i16::MAX, config.max_pre_delay),
            ResetSchedule::none(),
        ),
        SequenceKind::Stress => (
            random_items(&mut rng, count, i16::MIN, i16::MAX, 0),
            ResetSchedule::none(),
        ),
        SequenceKind::Small => (
            random_items(&mut rng, count, -32, 32, 5),
            ResetSchedule::none(),
        ),
        SequenceKind::MultipleReset => {
            let items = random_items(&mut rng, count, i16::MIN, i16::MAX, config.max_pre_delay);
            let resets = ResetSchedule::random(
                &mut rng,
                config.num_resets.unwrap_or(20),
                config.reset_gap_min,
                config.reset_gap_max,
                config.reset_hold_cycles,
            );
            (items, resets)
        }
    };

    Sequence {
        kind,
        items,
        resets,
    }
}

fn simple_items(count: usize) -> Vec<MatrixItem> {
    let fixed = [
        MatrixItem::new(Matrix::identity()),
        MatrixItem::new(Matrix::from_rows([[2, 1, 0], [1, 2, 0], [0, 0, 1]])).with_uniform_delay(1),
    ];
    fixed.into_iter().cycle().take(count).collect()
}

fn random_items(rng: &mut StdRng, count: usize, lo: i16, hi: i16, max_delay: u32) -> Vec<MatrixItem> {
    (0..count)
        .map(|_| {
            let elements: [i16; ELEMENT_COUNT] = std::array::from_fn(|_| rng.gen_range(lo..=hi));
            let mut item = MatrixItem::new(Matrix::from_row_major(elements));
            for d in item.pre_element_delay.iter_mut().flatten() {
                *d = rng.gen_range(0..=max_delay);
            }
            item
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_sequence_is_fixed() {
        let seq = generate(SequenceKind::Simple, &BenchConfig::default());
        assert_eq!(seq.items.len(), 2);
        assert_eq!(seq.items[0].matrix, Matrix::identity());
        assert_eq!(seq.items[0].total_delay(), 0);
        assert_eq!(seq.items[1].total_delay(), 9);
    }

    #[test]
    fn same_seed_same_sequence() {
        let config = BenchConfig {
            seed: 77,
            items: Some(10),
            ..Default::default()
        };
        let a = generate(SequenceKind::Random, &config);
        let b = generate(SequenceKind::Random, &config);
        assert_eq!(a, b);
    }

    #[test]
    fn small_values_and_stress_delays_in_bounds() {
        let config = BenchConfig::default();
        let small = generate(SequenceKind::Small, &config);
        assert_eq!(small.items.len(), 50);
        for item in &small.items {
            assert!(item.matrix.row_major().iter().all(|v| (-32..=32).contains(v)));
            assert!(item.pre_element_delay.iter().flatten().all(|&d| d <= 5));
        }
        let stress = generate(SequenceKind::Stress, &config);
        assert!(stress.items.iter().all(|i| i.total_delay() == 0));
    }

    #[test]
    fn reset_schedule_spacing() {
        let config = BenchConfig::default();
        let seq = generate(SequenceKind::MultipleReset, &config);
        let pulses = seq.resets.pulses();
        assert_eq!(pulses.len(), 20);
        for w in pulses.windows(2) {
            let gap = w[1].start - w[0].end();
            assert!((config.reset_gap_min..=config.reset_gap_max).contains(&gap));
        }
        let p = pulses[0];
        assert!(seq.resets.is_asserted(p.start));
        assert!(seq.resets.is_asserted(p.end() - 1));
        assert!(!seq.resets.is_asserted(p.end()));
        assert_eq!(seq.resets.quiet_after(), pulses[19].end());
    }
}
