//! Cross-domain toggle synchronizer.
//!
//! A toggle bit flipped in one clock domain cannot be read directly from the
//! other domain: the destination may sample it mid-transition. Hardware solves
//! this with a chain of registers clocked by the destination; the value is
//! trusted only after it has passed through every stage. This module models
//! that chain as an explicit delayed-visibility pipeline over a vector of
//! independent bits, so the latency and hazard semantics survive in the
//! behavioral model.
//!
//! The protocol-side precondition still applies: a source bit must stay
//! stable for at least one full destination tick after changing. The
//! synchronizer only relays committed toggles, it never generates or consumes
//! data itself.

use bitvec::prelude::*;

/// Register chain carrying a toggle vector from one domain into the other.
///
/// `sample` must be called exactly once per destination-domain rising edge.
/// With `stages == 2` (the metastability-safe form) a source change becomes
/// visible on the second destination edge after it happened; `stages == 1`
/// models a bare single-register crossing.
#[derive(Debug, Clone)]
pub struct ToggleSynchronizer {
    /// `stages[0]` is the capture register, the last entry is the stable
    /// output read by destination logic.
    stages: Vec<BitVec>,
    width: usize,
}

impl ToggleSynchronizer {
    pub fn new(width: usize, stages: usize) -> Self {
        debug_assert!(stages >= 1);
        ToggleSynchronizer {
            stages: vec![bitvec![0; width]; stages],
            width,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn num_stages(&self) -> usize {
        self.stages.len()
    }

    /// Clock the chain once: every stage takes the previous stage's value and
    /// the capture register samples the source wire.
    pub fn sample(&mut self, source: &BitSlice) {
        debug_assert_eq!(source.len(), self.width);
        self.stages.rotate_right(1);
        self.stages[0].clear();
        self.stages[0].extend_from_bitslice(source);
    }

    /// The settled view of the source vector.
    pub fn output(&self) -> &BitSlice {
        &self.stages[self.stages.len() - 1]
    }

    pub fn bit(&self, index: usize) -> bool {
        self.output()[index]
    }

    /// Drop all in-flight samples back to zero.
    pub fn reset(&mut self) {
        for stage in &mut self.stages {
            stage.fill(false);
        }
    }
}
