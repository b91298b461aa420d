//! Bench session: one engine with its driver, monitors and checkers.
//!
//! Each session owns everything it touches, so sessions on different
//! threads never interact. `SharedSession` adds a Mutex for callers that
//! need to observe a running session from elsewhere.
//!
//! Per-cycle order:
//!   1. sample outputs, decide reset, driver produces the stimulus
//!   2. input monitor observes, engine takes the edge
//!   3. output monitor observes, scoreboard checks
//!   4. stimulus is appended to the trace, snapshot if interval reached

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Serialize;
use tracing::{info, info_span, warn};

use det3_engine::hashing::canonical_hash;
use det3_engine::{DeterminantEngine, EngineState, Phase};

use crate::config::BenchConfig;
use crate::coverage::Coverage;
use crate::driver::Driver;
use crate::error::{BenchError, BenchResult};
use crate::monitor::{InputMonitor, OutputMonitor};
use crate::scoreboard::{ScoreReport, Scoreboard};
use crate::sequence::{ResetSchedule, Sequence, SequenceKind};
use crate::snapshot;
use crate::trace_store::TraceStore;

/// Summary of a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub kind: SequenceKind,
    pub cycles: u64,
    /// Loop stopped on `max_cycles` rather than draining.
    pub timed_out: bool,
    pub items_driven: usize,
    pub items_aborted: usize,
    pub score: ScoreReport,
    pub coverage: Coverage,
    pub final_hash: String,
}

impl RunReport {
    pub fn passed(&self) -> bool {
        !self.timed_out && self.score.passed()
    }
}

pub struct BenchSession {
    kind: SequenceKind,
    config: BenchConfig,
    engine: DeterminantEngine,
    driver: Driver,
    resets: ResetSchedule,
    input: InputMonitor,
    output: OutputMonitor,
    scoreboard: Scoreboard,
    coverage: Coverage,
    trace: Option<TraceStore>,
    snapshot_dir: Option<PathBuf>,
    cycle: u64,
}

impl BenchSession {
    pub fn new(sequence: Sequence, config: BenchConfig) -> Self {
        Self {
            kind: sequence.kind,
            engine: DeterminantEngine::new(),
            driver: Driver::new(sequence.items, config.idle_data),
            resets: sequence.resets,
            input: InputMonitor::new(),
            output: OutputMonitor::new(),
            scoreboard: Scoreboard::new(config.latency_tolerance),
            coverage: Coverage::new(),
            trace: None,
            snapshot_dir: None,
            cycle: 0,
            config,
        }
    }

    /// Record every stimulus to `<dir>/trace.log` and take snapshots under
    /// `<dir>/snapshots/` when the config asks for them.
    ///
    /// The trace file must be new or empty: cycles restart at 1.
    pub fn with_trace_dir(mut self, dir: &Path) -> BenchResult<Self> {
        let store = TraceStore::open(&dir.join("trace.log"))?;
        if store.last_cycle() != 0 {
            return Err(BenchError::Config(format!(
                "trace log {} already holds {} cycles",
                store.path().display(),
                store.last_cycle()
            )));
        }
        self.trace = Some(store);
        if self.config.snapshot_interval > 0 {
            self.snapshot_dir = Some(dir.join("snapshots"));
        }
        Ok(self)
    }

    /// Advance one cycle.
    pub fn step(&mut self) -> BenchResult<()> {
        self.cycle += 1;
        let cycle = self.cycle;

        let before = self.engine.outputs();
        let reset = self.resets.is_asserted(cycle);
        let stimulus = self.driver.drive(cycle, &before, reset);

        if let Some(item) = self.input.observe(&before, &stimulus) {
            self.coverage.sample_input(&item);
            self.scoreboard.push_input(&item);
        }

        self.engine.tick(&stimulus);
        let after = self.engine.outputs();

        if let Some(item) = self.output.observe(&before, &stimulus, &after) {
            self.coverage.sample_output(&item);
            self.scoreboard.check_output(item);
        }

        if let Some(trace) = self.trace.as_mut() {
            trace.append(&stimulus)?;
        }
        if let Some(dir) = &self.snapshot_dir {
            if cycle % self.config.snapshot_interval == 0 {
                snapshot::save_snapshot(dir, self.engine.state())?;
            }
        }
        Ok(())
    }

    /// All items driven, no result outstanding, no reset still to come.
    pub fn is_done(&self) -> bool {
        self.driver.is_drained()
            && self.engine.state().phase != Phase::Hold
            && self.scoreboard.pending() == 0
            && self.cycle >= self.resets.quiet_after()
    }

    /// Run to completion (or `max_cycles`) and report.
    pub fn run(mut self) -> BenchResult<RunReport> {
        let span = info_span!("run", sequence = ?self.kind, seed = self.config.seed);
        let _enter = span.enter();
        info!("starting run");

        let mut timed_out = false;
        while !self.is_done() {
            if self.cycle >= self.config.max_cycles {
                warn!(cycles = self.cycle, "max_cycles reached before drain");
                timed_out = true;
                break;
            }
            self.step()?;
        }

        let report = RunReport {
            kind: self.kind,
            cycles: self.cycle,
            timed_out,
            items_driven: self.driver.completed(),
            items_aborted: self.driver.aborted(),
            final_hash: canonical_hash(self.engine.state()),
            score: self.scoreboard.finish(),
            coverage: self.coverage,
        };
        info!(
            cycles = report.cycles,
            matched = report.score.matched,
            mismatches = report.score.mismatches.len(),
            passed = report.passed(),
            "run finished"
        );
        Ok(report)
    }

    pub fn state(&self) -> &EngineState {
        self.engine.state()
    }

    pub fn current_hash(&self) -> String {
        canonical_hash(self.engine.state())
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn score(&self) -> &ScoreReport {
        self.scoreboard.report()
    }
}

/// Thread-safe session handle using Mutex.
pub struct SharedSession {
    inner: Mutex<BenchSession>,
}

impl SharedSession {
    pub fn new(session: BenchSession) -> Self {
        Self {
            inner: Mutex::new(session),
        }
    }

    /// Step under lock.
    pub fn step(&self) -> BenchResult<()> {
        let mut session = self.inner.lock().expect("Session lock poisoned");
        session.step()
    }

    pub fn is_done(&self) -> bool {
        let session = self.inner.lock().expect("Session lock poisoned");
        session.is_done()
    }

    pub fn current_hash(&self) -> String {
        let session = self.inner.lock().expect("Session lock poisoned");
        session.current_hash()
    }

    pub fn cycle(&self) -> u64 {
        let session = self.inner.lock().expect("Session lock poisoned");
        session.cycle()
    }

    /// Release the session, e.g. to call `run` on what remains.
    pub fn into_inner(self) -> BenchSession {
        self.inner
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
