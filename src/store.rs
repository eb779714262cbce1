//! The shared slot store: a fixed-capacity ring of data words.
//!
//! The store holds payload only. Ownership of each slot is encoded entirely
//! in the push/ack toggle pairs kept by the two controllers; the store itself
//! has no occupancy state and is written by the producer and read by the
//! consumer under the toggle protocol's exclusion guarantee.

/// Fixed-size array of data slots, each holding one word of up to 64 bits.
#[derive(Debug, Clone)]
pub struct SlotStore {
    slots: Vec<u64>,
    data_width: u32,
    width_mask: u64,
}

impl SlotStore {
    pub fn new(depth: usize, data_width: u32) -> Self {
        let width_mask = if data_width >= 64 {
            u64::MAX
        } else {
            (1u64 << data_width) - 1
        };
        SlotStore {
            slots: vec![0; depth],
            data_width,
            width_mask,
        }
    }

    pub fn depth(&self) -> usize {
        self.slots.len()
    }

    pub fn data_width(&self) -> u32 {
        self.data_width
    }

    /// Mask a word down to the configured data width.
    pub fn mask(&self, word: u64) -> u64 {
        word & self.width_mask
    }

    pub fn write(&mut self, index: usize, word: u64) {
        self.slots[index] = word & self.width_mask;
    }

    pub fn read(&self, index: usize) -> u64 {
        self.slots[index]
    }

    pub fn reset(&mut self) {
        self.slots.fill(0);
    }
}
