//! Self-check harness.
//!
//! Drives the FIFO the way the original bring-up stimulus does: domain A
//! pushes a free-running counter whenever `full` is low, domain B starts
//! dequeueing after an initial idle period, and a reset pulse can be injected
//! at literal time offsets. The observed output sequence is compared against
//! the expected monotonically increasing counter sequence; any gap,
//! duplicate, or reordering shows up as a mismatch.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::clock::{ClockEdge, Domain, DualClockScheduler, TickEvent};
use crate::consumer::PopOutcome;
use crate::fifo::{CdcFifo, ConfigError, FifoConfig};
use crate::producer::PushOutcome;

/// A reset pulse as seen by both domains, in absolute simulation time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ResetPulse {
    pub start_ps: u64,
    pub end_ps: u64,
}

impl ResetPulse {
    fn covers(&self, time_ps: u64) -> bool {
        (self.start_ps..self.end_ps).contains(&time_ps)
    }
}

/// Parameters for one self-check run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    pub fifo: FifoConfig,
    pub period_a_ps: u64,
    pub period_b_ps: u64,
    /// Total simulated time.
    pub run_ps: u64,
    /// Consumer ticks to sit idle before the first dequeue request.
    pub consumer_idle_ticks: u64,
    /// Reset pulses applied to both domains.
    pub reset_pulses: Vec<ResetPulse>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        HarnessConfig {
            fifo: FifoConfig::default(),
            period_a_ps: 10_000,
            period_b_ps: 14_000,
            run_ps: 10_000_000,
            consumer_idle_ticks: 8,
            reset_pulses: Vec::new(),
        }
    }
}

/// One observed deviation from the expected counter sequence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SequenceMismatch {
    pub time_ps: u64,
    pub expected: u64,
    pub actual: u64,
}

/// Outcome of a self-check run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelfTestReport {
    pub passed: bool,
    pub pushed: u64,
    pub rejected_pushes: u64,
    pub delivered: u64,
    pub ticks_a: u64,
    pub ticks_b: u64,
    pub mismatches: Vec<SequenceMismatch>,
    /// Per-tick signal histories keyed by signal name: `full` sampled on
    /// every producer tick, `data_valid`/`data_out` on every consumer tick.
    pub traces: IndexMap<String, Vec<u64>>,
}

impl SelfTestReport {
    /// Human-readable summary in testbench-report form.
    pub fn render(&self) -> String {
        let mut report = String::new();
        report.push_str("=== CDC FIFO Self-Check ===\n\n");
        report.push_str(&format!("Result: {}\n", if self.passed { "PASS" } else { "FAIL" }));
        report.push_str(&format!("Producer ticks: {}\n", self.ticks_a));
        report.push_str(&format!("Consumer ticks: {}\n", self.ticks_b));
        report.push_str(&format!("Pushed: {}\n", self.pushed));
        report.push_str(&format!("Rejected (full): {}\n", self.rejected_pushes));
        report.push_str(&format!("Delivered: {}\n", self.delivered));
        report.push_str(&format!("Mismatches: {}\n", self.mismatches.len()));
        for mismatch in self.mismatches.iter().take(10) {
            report.push_str(&format!(
                "  t={}ps expected {} got {}\n",
                mismatch.time_ps, mismatch.expected, mismatch.actual
            ));
        }
        report.push_str("Traces:\n");
        for (signal, samples) in &self.traces {
            report.push_str(&format!("  {}: {} samples\n", signal, samples.len()));
        }
        report
    }
}

/// Counter-stimulus harness around a [`CdcFifo`].
pub struct SelfTest {
    config: HarnessConfig,
    fifo: CdcFifo,
    scheduler: DualClockScheduler,
    /// Next word to push; increments only on accepted pushes.
    counter: u64,
    /// Next word the consumer should deliver.
    expected_next: u64,
    pushed: u64,
    rejected_pushes: u64,
    delivered: u64,
    ticks_a: u64,
    ticks_b: u64,
    mismatches: Vec<SequenceMismatch>,
    traces: IndexMap<String, Vec<u64>>,
}

impl SelfTest {
    pub fn new(config: HarnessConfig) -> Result<Self, ConfigError> {
        let fifo = CdcFifo::new(config.fifo.clone())?;
        let scheduler = DualClockScheduler::new(config.period_a_ps, config.period_b_ps);
        let mut traces = IndexMap::new();
        for signal in ["full", "data_valid", "data_out"] {
            traces.insert(signal.to_string(), Vec::new());
        }
        Ok(SelfTest {
            config,
            fifo,
            scheduler,
            counter: 0,
            expected_next: 0,
            pushed: 0,
            rejected_pushes: 0,
            delivered: 0,
            ticks_a: 0,
            ticks_b: 0,
            mismatches: Vec::new(),
            traces,
        })
    }

    fn in_reset(&self, time_ps: u64) -> bool {
        self.config.reset_pulses.iter().any(|p| p.covers(time_ps))
    }

    /// Run the configured stimulus to completion.
    pub fn run(&mut self) -> SelfTestReport {
        while let Some(event) = self.scheduler.next_edge_before(self.config.run_ps) {
            self.apply(event);
        }
        let passed = self.mismatches.is_empty() && self.delivered > 0;
        if !passed {
            log::info!(
                "self-check failed: {} mismatches, {} delivered",
                self.mismatches.len(),
                self.delivered
            );
        }
        SelfTestReport {
            passed,
            pushed: self.pushed,
            rejected_pushes: self.rejected_pushes,
            delivered: self.delivered,
            ticks_a: self.ticks_a,
            ticks_b: self.ticks_b,
            mismatches: self.mismatches.clone(),
            traces: self.traces.clone(),
        }
    }

    fn apply(&mut self, event: TickEvent) {
        match (event.domain, event.edge) {
            (Domain::A, ClockEdge::Rising) => self.producer_edge(event.time_ps),
            (Domain::A, ClockEdge::Falling) => self.fifo.tick_producer_falling(),
            (Domain::B, ClockEdge::Rising) => self.consumer_edge(event.time_ps),
            (Domain::B, ClockEdge::Falling) => {}
        }
    }

    fn producer_edge(&mut self, time_ps: u64) {
        self.ticks_a += 1;
        let reset = self.in_reset(time_ps);
        // Caller contract: sample `full` before asserting the push request.
        let push_request = !reset && !self.fifo.full();
        let data_in = self.fifo.mask(self.counter);
        match self.fifo.tick_producer(reset, push_request, data_in) {
            PushOutcome::Accepted => {
                self.pushed += 1;
                self.counter = self.fifo.mask(self.counter + 1);
            }
            PushOutcome::Rejected => self.rejected_pushes += 1,
            PushOutcome::Idle => {}
        }
        if reset {
            // The stimulus counter resets in lockstep with the FIFO.
            self.counter = 0;
        }
        self.traces["full"].push(self.fifo.full() as u64);
    }

    fn consumer_edge(&mut self, time_ps: u64) {
        self.ticks_b += 1;
        let reset = self.in_reset(time_ps);
        let dequeue_request = !reset && self.ticks_b > self.config.consumer_idle_ticks;
        if let PopOutcome::Delivered(word) = self.fifo.tick_consumer(reset, dequeue_request) {
            self.delivered += 1;
            if word != self.expected_next {
                self.mismatches.push(SequenceMismatch {
                    time_ps,
                    expected: self.expected_next,
                    actual: word,
                });
            }
            // Resynchronize after a mismatch so one fault is one report.
            self.expected_next = self.fifo.mask(word + 1);
        }
        if reset {
            self.expected_next = 0;
        }
        self.traces["data_valid"].push(self.fifo.data_valid() as u64);
        self.traces["data_out"].push(self.fifo.data_out());
    }
}
