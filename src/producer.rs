//! Producer controller for the write (domain A) side.
//!
//! The producer owns `head`, the push and confirm toggle vectors, and the
//! `full` flag. Occupancy is advertised to the consumer purely by flipping a
//! slot's push toggle; the consumer's acknowledgments come back through a
//! [`ToggleSynchronizer`], so the producer's view of freed slots is delayed
//! but never optimistic.
//!
//! Pushes are committed in two phases: the push toggle flips the moment a
//! word is accepted, and a matching confirm toggle flips half a source cycle
//! later (on the falling edge). The consumer treats a slot as ready only once
//! both toggles disagree with its acknowledgment, which guarantees the push
//! toggle has been stable for a known hold time before anyone acts on it.

use bitvec::prelude::*;
use serde::{Deserialize, Serialize};

use crate::store::SlotStore;
use crate::sync::ToggleSynchronizer;

/// Result of one producer tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// The word was written and committed this tick.
    Accepted,
    /// Push requested while full; the store was left untouched.
    Rejected,
    /// No push was requested.
    Idle,
}

/// How the producer decides it is full.
///
/// Both strategies rely only on the already-synchronized ack vector and must
/// produce identical externally observable behavior; `LazyShadow` is the
/// canonical hardware-shaped form, `DirectOccupancy` the simpler reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FullTracking {
    /// Keep a shadow tail/size pair: size goes up on every accepted push and
    /// down whenever the slot at the shadow tail is observed to be free.
    LazyShadow,
    /// Declare full exactly when the slot the next write would target is
    /// still occupied.
    DirectOccupancy,
}

#[derive(Debug, Clone)]
pub struct ProducerController {
    depth: usize,
    two_phase: bool,
    tracking: FullTracking,
    /// Next slot to write.
    head: usize,
    /// Slot written on the previous accepted push.
    head_prev: usize,
    /// Flipped immediately when a push is accepted (phase 1).
    push_toggle: BitVec,
    /// Mirrors the push toggle half a source cycle later (phase 2).
    confirm_toggle: BitVec,
    /// Slot whose confirm flip is due at the next commit point.
    confirm_pending: Option<usize>,
    /// Destination-clocked view of the consumer's ack toggles.
    ack_sync: ToggleSynchronizer,
    shadow_tail: usize,
    shadow_size: usize,
    full: bool,
}

impl ProducerController {
    pub fn new(depth: usize, sync_stages: usize, two_phase: bool, tracking: FullTracking) -> Self {
        ProducerController {
            depth,
            two_phase,
            tracking,
            head: 0,
            head_prev: 0,
            push_toggle: bitvec![0; depth],
            confirm_toggle: bitvec![0; depth],
            confirm_pending: None,
            ack_sync: ToggleSynchronizer::new(depth, sync_stages),
            shadow_tail: 0,
            shadow_size: 0,
            full: false,
        }
    }

    /// Evaluate one rising edge of clock A.
    ///
    /// `ack_toggle` is the consumer's ack vector as it sits on the wire right
    /// now; it is sampled through the synchronizer before anything else looks
    /// at it.
    pub fn tick(
        &mut self,
        reset: bool,
        push_request: bool,
        data_in: u64,
        store: &mut SlotStore,
        ack_toggle: &BitSlice,
    ) -> PushOutcome {
        if reset {
            self.apply_reset();
            store.reset();
            return PushOutcome::Idle;
        }

        self.ack_sync.sample(ack_toggle);

        // Phase 2 fallback: if the harness never drives falling edges, the
        // confirm flip still lands before this tick's push is considered.
        if self.confirm_pending.is_some() {
            self.commit_confirm();
        }

        self.retire_freed_slots();
        self.full = self.compute_full();

        if !push_request {
            return PushOutcome::Idle;
        }
        if self.full {
            log::debug!("push rejected: fifo full (head={})", self.head);
            return PushOutcome::Rejected;
        }

        store.write(self.head, data_in);
        let flipped = !self.push_toggle[self.head];
        self.push_toggle.set(self.head, flipped);
        if self.two_phase {
            self.confirm_pending = Some(self.head);
        }
        log::trace!("push accepted: slot={} data={:#x}", self.head, store.read(self.head));

        self.head_prev = self.head;
        self.head = (self.head + 1) % self.depth;
        self.shadow_size += 1;
        self.full = self.compute_full();
        PushOutcome::Accepted
    }

    /// Phase-2 commit point, driven from the falling edge of clock A.
    pub fn commit_confirm(&mut self) {
        if let Some(slot) = self.confirm_pending.take() {
            let flipped = !self.confirm_toggle[slot];
            self.confirm_toggle.set(slot, flipped);
        }
    }

    /// Walk the shadow tail over every slot the synchronized ack vector shows
    /// as freed since the last tick.
    fn retire_freed_slots(&mut self) {
        while self.shadow_size > 0 && self.slot_free(self.shadow_tail) {
            self.shadow_tail = (self.shadow_tail + 1) % self.depth;
            self.shadow_size -= 1;
        }
    }

    /// A slot is free once the consumer's (synchronized) ack toggle has
    /// caught up with our push toggle.
    fn slot_free(&self, index: usize) -> bool {
        self.push_toggle[index] == self.ack_sync.bit(index)
    }

    fn compute_full(&self) -> bool {
        match self.tracking {
            FullTracking::LazyShadow => self.shadow_size == self.depth,
            FullTracking::DirectOccupancy => !self.slot_free(self.head),
        }
    }

    fn apply_reset(&mut self) {
        self.head = 0;
        self.head_prev = 0;
        self.push_toggle.fill(false);
        self.confirm_toggle.fill(false);
        self.confirm_pending = None;
        self.ack_sync.reset();
        self.shadow_tail = 0;
        self.shadow_size = 0;
        self.full = false;
    }

    /// Registered `full` flag as sampled by the caller.
    pub fn is_full(&self) -> bool {
        self.full
    }

    /// Number of pushes not yet observed as freed. An upper bound on the true
    /// occupancy, stale by at most the synchronization latency.
    pub fn occupancy_estimate(&self) -> usize {
        self.shadow_size
    }

    pub fn head(&self) -> usize {
        self.head
    }

    /// Slot written by the most recent accepted push; the single-phase
    /// consumer readiness window anchors on this.
    pub fn head_previous(&self) -> usize {
        self.head_prev
    }

    pub fn push_toggles(&self) -> &BitSlice {
        &self.push_toggle
    }

    pub fn confirm_toggles(&self) -> &BitSlice {
        &self.confirm_toggle
    }
}
