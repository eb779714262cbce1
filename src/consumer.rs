//! Consumer controller for the read (domain B) side.
//!
//! The consumer owns `tail` and the ack toggle vector. It watches the
//! producer's push and confirm toggles through per-vector synchronizers,
//! treats the slot at `tail` as ready once both synchronized toggles disagree
//! with its own ack, and exposes the oldest ready word with peek semantics:
//! the delivered value stays on `data_out` until the caller asks to advance.
//!
//! A slot is consumed by flipping its ack toggle; that flip crosses back into
//! domain A and eventually frees the slot from the producer's point of view.

use bitvec::prelude::*;

use crate::store::SlotStore;
use crate::sync::ToggleSynchronizer;

/// Result of one consumer tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopOutcome {
    /// A new word was latched onto `data_out` this tick.
    Delivered(u64),
    /// Nothing new; `data_out` still holds the last delivered word.
    Held(u64),
    /// Nothing delivered and nothing held.
    Empty,
}

#[derive(Debug, Clone)]
pub struct ConsumerController {
    depth: usize,
    two_phase: bool,
    /// Next slot to read.
    tail: usize,
    /// Flipped when a slot's word has been latched.
    ack_toggle: BitVec,
    push_sync: ToggleSynchronizer,
    confirm_sync: ToggleSynchronizer,
    output_valid: bool,
    output_data: u64,
}

impl ConsumerController {
    pub fn new(depth: usize, sync_stages: usize, two_phase: bool) -> Self {
        ConsumerController {
            depth,
            two_phase,
            tail: 0,
            ack_toggle: bitvec![0; depth],
            push_sync: ToggleSynchronizer::new(depth, sync_stages),
            confirm_sync: ToggleSynchronizer::new(depth, sync_stages),
            output_valid: false,
            output_data: 0,
        }
    }

    /// Evaluate one rising edge of clock B.
    ///
    /// `push_toggle` and `confirm_toggle` are the producer's vectors as they
    /// sit on the wire; both cross through synchronizers before use.
    /// `last_written` is the producer's headPrevious, consulted only by the
    /// single-phase readiness window.
    pub fn tick(
        &mut self,
        reset: bool,
        dequeue_request: bool,
        store: &SlotStore,
        push_toggle: &BitSlice,
        confirm_toggle: &BitSlice,
        last_written: usize,
    ) -> PopOutcome {
        if reset {
            self.apply_reset();
            return PopOutcome::Empty;
        }

        self.push_sync.sample(push_toggle);
        self.confirm_sync.sample(confirm_toggle);

        let data_ready = self.data_ready(last_written);

        if data_ready && (!self.output_valid || dequeue_request) {
            let word = store.read(self.tail);
            let flipped = !self.ack_toggle[self.tail];
            self.ack_toggle.set(self.tail, flipped);
            log::trace!("pop: slot={} data={:#x}", self.tail, word);
            self.tail = (self.tail + 1) % self.depth;
            self.output_data = word;
            self.output_valid = true;
            return PopOutcome::Delivered(word);
        }

        if dequeue_request && self.output_valid {
            // Advance past the held word with nothing behind it: report empty
            // from here on instead of re-delivering.
            self.output_valid = false;
            return PopOutcome::Empty;
        }

        if self.output_valid {
            PopOutcome::Held(self.output_data)
        } else {
            PopOutcome::Empty
        }
    }

    /// The slot at `tail` holds an unacknowledged, stably committed write.
    ///
    /// In two-phase mode both the push and the delayed confirm toggle must
    /// disagree with our ack, which is what enforces the producer-side hold
    /// time. Single-phase mode has no confirm toggle; instead it considers
    /// only the two most recently written slots (the producer's headPrevious
    /// and the write before it), which covers every slot when the depth is
    /// at most 2 — the variant's intended range. The push toggle it trusts
    /// may have flipped on the immediately preceding source edge, and
    /// `last_written` itself crosses domains unsynchronized; both hazards
    /// are inherent to the fallback.
    fn data_ready(&self, last_written: usize) -> bool {
        let pushed = self.push_sync.bit(self.tail) != self.ack_toggle[self.tail];
        if self.two_phase {
            return pushed && self.confirm_sync.bit(self.tail) != self.ack_toggle[self.tail];
        }
        let penultimate = (last_written + self.depth - 1) % self.depth;
        pushed && (self.tail == last_written || self.tail == penultimate)
    }

    fn apply_reset(&mut self) {
        self.tail = 0;
        self.ack_toggle.fill(false);
        self.push_sync.reset();
        self.confirm_sync.reset();
        self.output_valid = false;
        self.output_data = 0;
    }

    pub fn data_valid(&self) -> bool {
        self.output_valid
    }

    pub fn data_out(&self) -> u64 {
        self.output_data
    }

    pub fn tail(&self) -> usize {
        self.tail
    }

    pub fn ack_toggles(&self) -> &BitSlice {
        &self.ack_toggle
    }
}
