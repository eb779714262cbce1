//! Behavioral model of a clock-domain-crossing FIFO.
//!
//! Transfers words from a producer on clock A to a consumer on an unrelated
//! clock B using a per-slot toggle handshake: the producer flips a slot's
//! push toggle to advertise a write, the consumer flips the matching ack
//! toggle to free it, and both vectors cross domains through double-register
//! synchronizers so neither side ever acts on an unsettled value. No full
//! pointer state is synchronized across the boundary.
//!
//! The model preserves the timing semantics of the protocol: each crossing
//! is an explicit delayed-visibility pipeline, pushes commit in two phases
//! (immediate toggle plus a confirm half a source cycle later), and each
//! controller is evaluated exactly once per own-domain clock edge by a
//! dual-clock scheduler.

pub mod clock;
pub mod consumer;
pub mod fifo;
pub mod producer;
pub mod store;
pub mod sync;
pub mod testbench;

pub use clock::{ClockEdge, ClockInfo, Domain, DualClockScheduler, TickEvent};
pub use consumer::{ConsumerController, PopOutcome};
pub use fifo::{CdcFifo, CommitMode, ConfigError, FifoConfig, MAX_DATA_WIDTH, MIN_LAZY_DEPTH};
pub use producer::{FullTracking, ProducerController, PushOutcome};
pub use store::SlotStore;
pub use sync::ToggleSynchronizer;
pub use testbench::{HarnessConfig, ResetPulse, SelfTest, SelfTestReport, SequenceMismatch};
