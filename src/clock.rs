//! Clock modeling for the two independent tick domains.
//!
//! The producer and consumer sides of the FIFO advance on unrelated clocks.
//! `DualClockScheduler` merges the edge streams of both clocks into a single
//! time-ordered sequence of [`TickEvent`]s so a behavioral simulation can
//! evaluate each controller exactly once per own-domain edge.

use serde::{Deserialize, Serialize};

/// The two tick domains of the FIFO.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Domain {
    /// Producer (write) side.
    A,
    /// Consumer (read) side.
    B,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockEdge {
    Rising,
    Falling,
}

/// One free-running clock with a fixed period and phase offset.
#[derive(Debug, Clone)]
pub struct ClockInfo {
    pub domain: Domain,
    /// Period in picoseconds. Odd periods get the longer half after the
    /// falling edge, so rising edges stay exactly one period apart.
    pub period_ps: u64,
    /// Offset of the first rising edge from t=0.
    pub phase_ps: u64,
    next_edge_ps: u64,
    next_edge: ClockEdge,
}

impl ClockInfo {
    pub fn new(domain: Domain, period_ps: u64) -> Self {
        Self::with_phase(domain, period_ps, 0)
    }

    pub fn with_phase(domain: Domain, period_ps: u64, phase_ps: u64) -> Self {
        ClockInfo {
            domain,
            period_ps,
            phase_ps,
            next_edge_ps: phase_ps,
            next_edge: ClockEdge::Rising,
        }
    }

    /// Time of the next edge without consuming it.
    fn peek(&self) -> u64 {
        self.next_edge_ps
    }

    /// Consume the pending edge and schedule the following one.
    fn advance(&mut self) -> (u64, ClockEdge) {
        let fired = (self.next_edge_ps, self.next_edge);
        let (delta_ps, next_edge) = match self.next_edge {
            ClockEdge::Rising => (self.period_ps / 2, ClockEdge::Falling),
            ClockEdge::Falling => (self.period_ps - self.period_ps / 2, ClockEdge::Rising),
        };
        self.next_edge_ps += delta_ps;
        self.next_edge = next_edge;
        fired
    }

    fn reset(&mut self) {
        self.next_edge_ps = self.phase_ps;
        self.next_edge = ClockEdge::Rising;
    }
}

/// A clock edge delivered by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickEvent {
    pub domain: Domain,
    pub edge: ClockEdge,
    pub time_ps: u64,
}

/// Merges the edges of two unrelated clocks into global time order.
///
/// Coincident edges are delivered domain A first, so runs are deterministic
/// for any period/phase combination.
#[derive(Debug, Clone)]
pub struct DualClockScheduler {
    clock_a: ClockInfo,
    clock_b: ClockInfo,
    current_time_ps: u64,
}

impl DualClockScheduler {
    pub fn new(period_a_ps: u64, period_b_ps: u64) -> Self {
        DualClockScheduler {
            clock_a: ClockInfo::new(Domain::A, period_a_ps),
            clock_b: ClockInfo::new(Domain::B, period_b_ps),
            current_time_ps: 0,
        }
    }

    pub fn with_phase(mut self, domain: Domain, phase_ps: u64) -> Self {
        match domain {
            Domain::A => self.clock_a = ClockInfo::with_phase(Domain::A, self.clock_a.period_ps, phase_ps),
            Domain::B => self.clock_b = ClockInfo::with_phase(Domain::B, self.clock_b.period_ps, phase_ps),
        }
        self
    }

    pub fn current_time_ps(&self) -> u64 {
        self.current_time_ps
    }

    pub fn period_ps(&self, domain: Domain) -> u64 {
        match domain {
            Domain::A => self.clock_a.period_ps,
            Domain::B => self.clock_b.period_ps,
        }
    }

    /// Deliver the next clock edge in either domain.
    pub fn next_edge(&mut self) -> TickEvent {
        let clock = if self.clock_a.peek() <= self.clock_b.peek() {
            &mut self.clock_a
        } else {
            &mut self.clock_b
        };
        let domain = clock.domain;
        let (time_ps, edge) = clock.advance();
        self.current_time_ps = time_ps;
        TickEvent {
            domain,
            edge,
            time_ps,
        }
    }

    /// Deliver edges until `deadline_ps` (exclusive). Returns `None` once the
    /// next edge would fall at or past the deadline.
    pub fn next_edge_before(&mut self, deadline_ps: u64) -> Option<TickEvent> {
        let upcoming = self.clock_a.peek().min(self.clock_b.peek());
        if upcoming >= deadline_ps {
            return None;
        }
        Some(self.next_edge())
    }

    pub fn reset(&mut self) {
        self.current_time_ps = 0;
        self.clock_a.reset();
        self.clock_b.reset();
    }
}
