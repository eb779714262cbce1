//! End-to-end protocol tests: ordering across arbitrary clock ratios, full
//! flag behavior, peek semantics, depth-1 boundary, reset recovery, and the
//! counter soak scenario with an intermediate reset pulse.

use cdc_fifo::{
    CdcFifo, ClockEdge, CommitMode, Domain, DualClockScheduler, FifoConfig, FullTracking,
    HarnessConfig, PopOutcome, PushOutcome, ResetPulse, SelfTest,
};
use rand::Rng;

fn config(depth: usize) -> FifoConfig {
    FifoConfig {
        data_width: 32,
        depth,
        ..FifoConfig::default()
    }
}

/// Push `items` sequential words on clock A and collect everything clock B
/// delivers, for an arbitrary period pair.
fn run_transfer(fifo_config: FifoConfig, period_a_ps: u64, period_b_ps: u64, items: u64) -> Vec<u64> {
    let mut fifo = CdcFifo::new(fifo_config).unwrap();
    let mut scheduler = DualClockScheduler::new(period_a_ps, period_b_ps);
    let mut counter = 0u64;
    let mut delivered = Vec::new();

    let edge_budget = (items + 64) * 500;
    for _ in 0..edge_budget {
        if delivered.len() as u64 == items {
            break;
        }
        let event = scheduler.next_edge();
        match (event.domain, event.edge) {
            (Domain::A, ClockEdge::Rising) => {
                let push = counter < items && !fifo.full();
                if fifo.tick_producer(false, push, counter) == PushOutcome::Accepted {
                    counter += 1;
                }
            }
            (Domain::A, ClockEdge::Falling) => fifo.tick_producer_falling(),
            (Domain::B, ClockEdge::Rising) => {
                if let PopOutcome::Delivered(word) = fifo.tick_consumer(false, true) {
                    delivered.push(word);
                }
            }
            (Domain::B, ClockEdge::Falling) => {}
        }
    }
    delivered
}

fn expected(items: u64) -> Vec<u64> {
    (0..items).collect()
}

#[test]
fn in_order_at_equal_rates() {
    assert_eq!(run_transfer(config(8), 10_000, 10_000, 500), expected(500));
}

#[test]
fn in_order_with_fast_producer() {
    assert_eq!(run_transfer(config(8), 1_000, 100_000, 200), expected(200));
}

#[test]
fn in_order_with_fast_consumer() {
    assert_eq!(run_transfer(config(8), 100_000, 1_000, 200), expected(200));
}

#[test]
fn in_order_at_odd_ratio() {
    assert_eq!(run_transfer(config(8), 7_000, 3_000, 500), expected(500));
}

#[test]
fn in_order_at_odd_periods() {
    assert_eq!(run_transfer(config(8), 9_973, 3_001, 200), expected(200));
}

#[test]
fn in_order_at_randomized_ratios() {
    let mut rng = rand::thread_rng();
    for _ in 0..10 {
        let period_a = rng.gen_range(1_000..=50_000);
        let period_b = rng.gen_range(1_000..=50_000);
        let delivered = run_transfer(config(8), period_a, period_b, 100);
        assert_eq!(delivered, expected(100), "periods {period_a}/{period_b}");
    }
}

// The single-phase readiness window only spans the two most recently written
// slots, so the fallback is exercised at the depths it fully covers.
#[test]
fn in_order_single_phase_fallback() {
    let fifo_config = FifoConfig {
        commit_mode: CommitMode::SinglePhase,
        full_tracking: FullTracking::DirectOccupancy,
        ..config(2)
    };
    assert_eq!(run_transfer(fifo_config, 9_000, 4_000, 300), expected(300));
}

#[test]
fn in_order_single_phase_at_depth_one() {
    let fifo_config = FifoConfig {
        commit_mode: CommitMode::SinglePhase,
        full_tracking: FullTracking::DirectOccupancy,
        ..config(1)
    };
    assert_eq!(run_transfer(fifo_config, 10_000, 6_000, 50), expected(50));
}

#[test]
fn in_order_at_depth_one() {
    let fifo_config = FifoConfig {
        full_tracking: FullTracking::DirectOccupancy,
        ..config(1)
    };
    assert_eq!(run_transfer(fifo_config, 10_000, 6_000, 50), expected(50));
}

#[test]
fn depth_one_push_then_stall() {
    let mut fifo = CdcFifo::new(FifoConfig {
        full_tracking: FullTracking::DirectOccupancy,
        ..config(1)
    })
    .unwrap();

    assert_eq!(fifo.tick_producer(false, true, 77), PushOutcome::Accepted);
    fifo.tick_producer_falling();
    assert!(fifo.full());

    // Consumer must see exactly that one word.
    let mut delivered = None;
    for _ in 0..6 {
        if let PopOutcome::Delivered(word) = fifo.tick_consumer(false, false) {
            delivered = Some(word);
            break;
        }
    }
    assert_eq!(delivered, Some(77));

    // Advancing past it reports empty from then on.
    assert_eq!(fifo.tick_consumer(false, true), PopOutcome::Empty);
    for _ in 0..4 {
        assert_eq!(fifo.tick_consumer(false, true), PopOutcome::Empty);
        assert!(!fifo.data_valid());
    }
}

#[test]
fn peek_holds_value_across_idle_ticks() {
    let mut fifo = CdcFifo::new(config(4)).unwrap();
    fifo.tick_producer(false, true, 123);
    fifo.tick_producer_falling();
    while !matches!(fifo.tick_consumer(false, false), PopOutcome::Delivered(_)) {}

    for _ in 0..5 {
        assert_eq!(fifo.tick_consumer(false, false), PopOutcome::Held(123));
        assert!(fifo.data_valid());
        assert_eq!(fifo.data_out(), 123);
    }
}

#[test]
fn full_asserts_at_capacity_and_releases_after_sync() {
    let mut fifo = CdcFifo::new(config(4)).unwrap();

    let mut accepted = 0;
    for i in 0..10 {
        fifo.tick_producer_falling();
        if fifo.tick_producer(false, true, i) == PushOutcome::Accepted {
            accepted += 1;
        }
    }
    assert_eq!(accepted, 4, "exactly depth pushes fit with no consumer");
    assert!(fifo.full());

    // One consumer tick auto-latches (and thereby frees) the oldest slot.
    let mut freed = false;
    for _ in 0..4 {
        if let PopOutcome::Delivered(word) = fifo.tick_consumer(false, false) {
            assert_eq!(word, 0);
            freed = true;
            break;
        }
    }
    assert!(freed);

    // The ack needs the synchronizer latency to reach domain A, then full
    // must drop and exactly one more push fit.
    let mut ticks_until_free = 0;
    while fifo.full() && ticks_until_free < 4 {
        fifo.tick_producer(false, false, 0);
        ticks_until_free += 1;
    }
    assert!(!fifo.full(), "full must deassert within the sync window");
    assert!(ticks_until_free <= 3);
    assert_eq!(fifo.tick_producer(false, true, 10), PushOutcome::Accepted);
    assert!(fifo.full());
}

#[test]
fn lazy_and_direct_tracking_are_externally_identical() {
    let mut lazy = CdcFifo::new(config(8)).unwrap();
    let mut direct = CdcFifo::new(FifoConfig {
        full_tracking: FullTracking::DirectOccupancy,
        ..config(8)
    })
    .unwrap();

    let mut scheduler = DualClockScheduler::new(11_000, 7_000);
    let mut counter_lazy = 0u64;
    let mut counter_direct = 0u64;
    let mut seq_lazy = Vec::new();
    let mut seq_direct = Vec::new();

    for _ in 0..20_000 {
        let event = scheduler.next_edge();
        match (event.domain, event.edge) {
            (Domain::A, ClockEdge::Rising) => {
                fifo_push(&mut lazy, &mut counter_lazy);
                fifo_push(&mut direct, &mut counter_direct);
                assert_eq!(lazy.full(), direct.full(), "t={}", event.time_ps);
            }
            (Domain::A, ClockEdge::Falling) => {
                lazy.tick_producer_falling();
                direct.tick_producer_falling();
            }
            (Domain::B, ClockEdge::Rising) => {
                if let PopOutcome::Delivered(w) = lazy.tick_consumer(false, true) {
                    seq_lazy.push(w);
                }
                if let PopOutcome::Delivered(w) = direct.tick_consumer(false, true) {
                    seq_direct.push(w);
                }
            }
            (Domain::B, ClockEdge::Falling) => {}
        }
    }

    assert!(!seq_lazy.is_empty());
    assert_eq!(seq_lazy, seq_direct);
}

fn fifo_push(fifo: &mut CdcFifo, counter: &mut u64) {
    let push = !fifo.full();
    if fifo.tick_producer(false, push, *counter) == PushOutcome::Accepted {
        *counter += 1;
    }
}

#[test]
fn reset_from_any_state_reads_back_empty() {
    let mut fifo = CdcFifo::new(config(4)).unwrap();

    // Reach a mid-transfer state: some slots occupied, one word held.
    for i in 0..3 {
        fifo.tick_producer(false, true, i);
        fifo.tick_producer_falling();
    }
    for _ in 0..3 {
        fifo.tick_consumer(false, false);
    }
    assert!(fifo.data_valid());

    // Independent resets on each domain's own edge.
    fifo.tick_producer(true, true, 99);
    fifo.tick_consumer(true, true);

    // One stability window later both sides read back empty.
    for _ in 0..3 {
        fifo.tick_producer(false, false, 0);
        assert_eq!(fifo.tick_consumer(false, true), PopOutcome::Empty);
    }
    assert!(!fifo.full());
    assert!(!fifo.data_valid());
    assert_eq!(fifo.occupancy_estimate(), 0);

    // And the FIFO still works from scratch.
    fifo.tick_producer(false, true, 55);
    fifo.tick_producer_falling();
    let mut delivered = None;
    for _ in 0..4 {
        if let PopOutcome::Delivered(word) = fifo.tick_consumer(false, true) {
            delivered = Some(word);
            break;
        }
    }
    assert_eq!(delivered, Some(55));
}

/// The concrete soak scenario: depth 32, width 8, free-running counter on A,
/// consumer dequeueing after an idle period, with a reset pulse in the middle
/// that restarts the counter and the FIFO in lockstep.
#[test]
fn counter_soak_with_intermediate_reset() {
    let mut harness = SelfTest::new(HarnessConfig {
        fifo: FifoConfig::default(),
        period_a_ps: 10_000,
        period_b_ps: 14_000,
        run_ps: 20_000_000,
        consumer_idle_ticks: 8,
        reset_pulses: vec![ResetPulse {
            start_ps: 9_000_000,
            end_ps: 9_100_000,
        }],
    })
    .unwrap();
    let report = harness.run();
    assert!(report.passed, "{}", report.render());
    assert!(report.delivered > 500);
}

#[test]
fn soak_passes_with_multiple_reset_pulses() {
    let mut harness = SelfTest::new(HarnessConfig {
        run_ps: 15_000_000,
        reset_pulses: vec![
            ResetPulse {
                start_ps: 4_000_000,
                end_ps: 4_100_000,
            },
            ResetPulse {
                start_ps: 10_000_000,
                end_ps: 10_100_000,
            },
        ],
        ..HarnessConfig::default()
    })
    .unwrap();
    let report = harness.run();
    assert!(report.passed, "{}", report.render());
}

#[test]
fn soak_passes_at_randomized_reset_offsets() {
    let mut rng = rand::thread_rng();
    for _ in 0..5 {
        let start_ps = rng.gen_range(1_000_000..8_000_000);
        let mut harness = SelfTest::new(HarnessConfig {
            run_ps: 12_000_000,
            reset_pulses: vec![ResetPulse {
                start_ps,
                end_ps: start_ps + 100_000,
            }],
            ..HarnessConfig::default()
        })
        .unwrap();
        let report = harness.run();
        assert!(report.passed, "reset at {start_ps}: {}", report.render());
    }
}
