//! Functional coverage over captured items.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use det3_engine::classify::{classify, MatrixKind};

use crate::items::{DeterminantItem, MatrixItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueBin {
    Min,
    Max,
    Small,
    Medium,
    Large,
}

impl ValueBin {
    pub const ALL: [ValueBin; 5] = [
        ValueBin::Min,
        ValueBin::Max,
        ValueBin::Small,
        ValueBin::Medium,
        ValueBin::Large,
    ];

    pub fn of(v: i16) -> Self {
        match v {
            i16::MIN => ValueBin::Min,
            i16::MAX => ValueBin::Max,
            _ => match v.unsigned_abs() {
                0..=1000 => ValueBin::Small,
                1001..=10000 => ValueBin::Medium,
                _ => ValueBin::Large,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DelayBin {
    Short,
    Medium,
    Long,
}

impl DelayBin {
    pub const ALL: [DelayBin; 3] = [DelayBin::Short, DelayBin::Medium, DelayBin::Long];

    pub fn of(total: u64) -> Self {
        match total {
            0..=5 => DelayBin::Short,
            6..=20 => DelayBin::Medium,
            _ => DelayBin::Long,
        }
    }
}

/// Hit counts per bin. Every bin is present, so unhit bins report zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Coverage {
    pub elements: BTreeMap<ValueBin, u64>,
    pub determinants: BTreeMap<ValueBin, u64>,
    pub overflow_set: u64,
    pub overflow_clear: u64,
    pub delays: BTreeMap<DelayBin, u64>,
    pub kinds: BTreeMap<MatrixKind, u64>,
}

impl Default for Coverage {
    fn default() -> Self {
        Self::new()
    }
}

impl Coverage {
    pub fn new() -> Self {
        Self {
            elements: ValueBin::ALL.iter().map(|&b| (b, 0)).collect(),
            determinants: ValueBin::ALL.iter().map(|&b| (b, 0)).collect(),
            overflow_set: 0,
            overflow_clear: 0,
            delays: DelayBin::ALL.iter().map(|&b| (b, 0)).collect(),
            kinds: MatrixKind::ALL.iter().map(|&k| (k, 0)).collect(),
        }
    }

    pub fn sample_input(&mut self, item: &MatrixItem) {
        for v in item.matrix.row_major() {
            *self.elements.entry(ValueBin::of(v)).or_default() += 1;
        }
        *self.delays.entry(DelayBin::of(item.total_delay())).or_default() += 1;
        *self.kinds.entry(classify(&item.matrix)).or_default() += 1;
    }

    pub fn sample_output(&mut self, item: &DeterminantItem) {
        *self
            .determinants
            .entry(ValueBin::of(item.determinant))
            .or_default() += 1;
        if item.overflow {
            self.overflow_set += 1;
        } else {
            self.overflow_clear += 1;
        }
    }

    /// Fraction of all bins hit at least once, in percent.
    pub fn percent(&self) -> f64 {
        let counts = self
            .elements
            .values()
            .chain(self.determinants.values())
            .chain([&self.overflow_set, &self.overflow_clear])
            .chain(self.delays.values())
            .chain(self.kinds.values());
        let (hit, total) = counts.fold((0u32, 0u32), |(h, t), &c| (h + (c > 0) as u32, t + 1));
        if total == 0 {
            return 0.0;
        }
        f64::from(hit) * 100.0 / f64::from(total)
    }
}

impl fmt::Display for Coverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "coverage: {:.1}%", self.percent())?;
        write!(f, "  elements:")?;
        for (b, c) in &self.elements {
            write!(f, " {:?}={}", b, c)?;
        }
        write!(f, "\n  determinants:")?;
        for (b, c) in &self.determinants {
            write!(f, " {:?}={}", b, c)?;
        }
        write!(
            f,
            "\n  overflow: true={} false={}",
            self.overflow_set, self.overflow_clear
        )?;
        write!(f, "\n  delays:")?;
        for (b, c) in &self.delays {
            write!(f, " {:?}={}", b, c)?;
        }
        write!(f, "\n  kinds:")?;
        for (k, c) in &self.kinds {
            write!(f, " {}={}", k.as_str(), c)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use det3_engine::Matrix;

    #[test]
    fn value_bin_edges() {
        assert_eq!(ValueBin::of(i16::MIN), ValueBin::Min);
        assert_eq!(ValueBin::of(i16::MAX), ValueBin::Max);
        assert_eq!(ValueBin::of(-1000), ValueBin::Small);
        assert_eq!(ValueBin::of(1001), ValueBin::Medium);
        assert_eq!(ValueBin::of(-10000), ValueBin::Medium);
        assert_eq!(ValueBin::of(10001), ValueBin::Large);
        assert_eq!(ValueBin::of(-32767), ValueBin::Large);
    }

    #[test]
    fn delay_bin_edges() {
        assert_eq!(DelayBin::of(5), DelayBin::Short);
        assert_eq!(DelayBin::of(6), DelayBin::Medium);
        assert_eq!(DelayBin::of(20), DelayBin::Medium);
        assert_eq!(DelayBin::of(21), DelayBin::Long);
    }

    #[test]
    fn samples_land_in_bins() {
        let mut cov = Coverage::new();
        let item = MatrixItem::new(Matrix::identity()).with_uniform_delay(1);
        cov.sample_input(&item);
        cov.sample_output(&DeterminantItem::expected_for(&item));

        assert_eq!(cov.elements[&ValueBin::Small], 9);
        assert_eq!(cov.delays[&DelayBin::Medium], 1);
        assert_eq!(cov.kinds[&MatrixKind::Identity], 1);
        assert_eq!(cov.determinants[&ValueBin::Small], 1);
        assert_eq!(cov.overflow_clear, 1);
        assert_eq!(cov.overflow_set, 0);
        assert!(cov.percent() > 0.0 && cov.percent() < 100.0);
        assert!(cov.to_string().contains("identity=1"));
    }
}
