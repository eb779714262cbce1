//! The assembled dual-clock FIFO and its configuration.
//!
//! [`CdcFifo`] bundles the slot store with the two controllers and exposes
//! the pin-level boundary of the design: `tick_producer` evaluates one rising
//! edge of clock A, `tick_consumer` one rising edge of clock B, and
//! `tick_producer_falling` is the phase-2 commit point on the falling edge of
//! clock A. The wiring between the controllers (toggle vectors crossing
//! through synchronizers) is internal.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consumer::{ConsumerController, PopOutcome};
use crate::producer::{FullTracking, ProducerController, PushOutcome};
use crate::store::SlotStore;

/// Widest supported data word.
pub const MAX_DATA_WIDTH: u32 = 64;

/// Recommended minimum depth for lazy full tracking; below this the shadow
/// counter's deassert latency eats most of the capacity.
pub const MIN_LAZY_DEPTH: usize = 4;

/// Push commit discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommitMode {
    /// Canonical form: push toggle plus a confirm toggle flipped half a
    /// source cycle later, guaranteeing a hold time before the consumer may
    /// act on the write.
    TwoPhase,
    /// Simplified fallback without the hold-time guarantee. Readiness is
    /// derived from the push toggles of the two most recently written slots
    /// (the producer's headPrevious and the write before it), so it only
    /// covers the whole store at depths up to 2. The consumer may sample a
    /// push toggle that flipped on the immediately preceding source edge;
    /// whether that window is safe depends on the synchronizer depth and the
    /// clock ratio, and is not warranted here.
    SinglePhase,
}

/// Errors that can occur while instantiating a FIFO.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("fifo depth must be at least 1, got {0}")]
    DepthTooSmall(usize),
    #[error("data width must be between 1 and {MAX_DATA_WIDTH} bits, got {0}")]
    InvalidDataWidth(u32),
    #[error("synchronizer needs at least one register stage")]
    NoSyncStages,
}

/// Instantiation parameters for a [`CdcFifo`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FifoConfig {
    /// Bits per item, 1 to 64.
    pub data_width: u32,
    /// Item capacity.
    pub depth: usize,
    /// Register stages per crossing; 2 is the metastability-safe form.
    pub sync_stages: usize,
    pub commit_mode: CommitMode,
    pub full_tracking: FullTracking,
}

impl Default for FifoConfig {
    fn default() -> Self {
        FifoConfig {
            data_width: 8,
            depth: 32,
            sync_stages: 2,
            commit_mode: CommitMode::TwoPhase,
            full_tracking: FullTracking::LazyShadow,
        }
    }
}

impl FifoConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.depth < 1 {
            return Err(ConfigError::DepthTooSmall(self.depth));
        }
        if self.data_width < 1 || self.data_width > MAX_DATA_WIDTH {
            return Err(ConfigError::InvalidDataWidth(self.data_width));
        }
        if self.sync_stages < 1 {
            return Err(ConfigError::NoSyncStages);
        }
        if self.full_tracking == FullTracking::LazyShadow && self.depth < MIN_LAZY_DEPTH {
            log::warn!(
                "depth {} below recommended minimum {} for lazy full tracking",
                self.depth,
                MIN_LAZY_DEPTH
            );
        }
        Ok(())
    }
}

/// Behavioral model of the dual-clock FIFO.
#[derive(Debug, Clone)]
pub struct CdcFifo {
    config: FifoConfig,
    store: SlotStore,
    producer: ProducerController,
    consumer: ConsumerController,
}

impl CdcFifo {
    pub fn new(config: FifoConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let two_phase = config.commit_mode == CommitMode::TwoPhase;
        Ok(CdcFifo {
            store: SlotStore::new(config.depth, config.data_width),
            producer: ProducerController::new(
                config.depth,
                config.sync_stages,
                two_phase,
                config.full_tracking,
            ),
            consumer: ConsumerController::new(config.depth, config.sync_stages, two_phase),
            config,
        })
    }

    pub fn config(&self) -> &FifoConfig {
        &self.config
    }

    /// One rising edge of clock A.
    ///
    /// `push_request` is honored only when the FIFO is not full; callers are
    /// expected to sample [`full`](Self::full) first, and a push attempted
    /// while full is rejected without touching the store.
    pub fn tick_producer(&mut self, reset: bool, push_request: bool, data_in: u64) -> PushOutcome {
        self.producer.tick(
            reset,
            push_request,
            data_in,
            &mut self.store,
            self.consumer.ack_toggles(),
        )
    }

    /// Falling edge of clock A: the phase-2 confirm commit point.
    pub fn tick_producer_falling(&mut self) {
        self.producer.commit_confirm();
    }

    /// One rising edge of clock B.
    pub fn tick_consumer(&mut self, reset: bool, dequeue_request: bool) -> PopOutcome {
        self.consumer.tick(
            reset,
            dequeue_request,
            &self.store,
            self.producer.push_toggles(),
            self.producer.confirm_toggles(),
            self.producer.head_previous(),
        )
    }

    /// Domain A `full` output as of the last producer tick.
    pub fn full(&self) -> bool {
        self.producer.is_full()
    }

    /// Domain B `dataValid` output.
    pub fn data_valid(&self) -> bool {
        self.consumer.data_valid()
    }

    /// Domain B `dataOut` output; meaningful while `dataValid` is high.
    pub fn data_out(&self) -> u64 {
        self.consumer.data_out()
    }

    /// Producer-side occupancy estimate (stale by at most the sync latency).
    pub fn occupancy_estimate(&self) -> usize {
        self.producer.occupancy_estimate()
    }

    /// Mask a word to the configured data width.
    pub fn mask(&self, word: u64) -> u64 {
        self.store.mask(word)
    }
}
