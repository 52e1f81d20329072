use crate::encoding::{
    ConfigError, Encoding, NodeId, PRIME_TABLE_LEN, PrimeProductEncoding,
};
use crate::stats::StatsAggregator;
use crate::trace::{TraceError, TraceRunner, TraceSpec};

#[test]
fn prime_table_is_ascending_and_starts_at_two() {
    assert_eq!(PrimeProductEncoding::prime_at(0), 2);
    assert_eq!(PrimeProductEncoding::prime_at(1), 3);
    assert_eq!(PrimeProductEncoding::prime_at(PRIME_TABLE_LEN - 1), 719);
    for i in 1..PRIME_TABLE_LEN {
        assert!(PrimeProductEncoding::prime_at(i) > PrimeProductEncoding::prime_at(i - 1));
    }
}

#[test]
fn loop_is_confirmed_exactly_at_the_wrap() {
    // B=2, L=3: indices 0 1 | 2 3 4 | 2 ... — the second visit of index 2
    // finds its prime already multiplied in.
    let mut enc = PrimeProductEncoding::new(1, 10).expect("within table");
    let mut runner = TraceRunner::new(3, 1_000);
    let mut agg = StatsAggregator::new();
    runner
        .run(&mut enc, TraceSpec::Loop { entry: 2, cycle: 3 }, 1, &mut agg)
        .expect("within hop limit");

    let rec = agg.records()[0];
    assert!(rec.is_loop);
    assert!(rec.detected);
    assert_eq!(rec.loop_start, Some(2));
    assert_eq!(rec.loop_size, Some(3));
    assert_eq!(rec.hop_count, 5);
}

#[test]
fn threshold_two_confirms_one_hop_after_the_wrap() {
    // After the first wrap every index is already in the factor set, so the
    // second signal arrives on the very next hop.
    let mut enc = PrimeProductEncoding::new(2, 10).expect("within table");
    let mut runner = TraceRunner::new(3, 1_000);
    let mut agg = StatsAggregator::new();
    runner
        .run(&mut enc, TraceSpec::Loop { entry: 2, cycle: 3 }, 1, &mut agg)
        .expect("within hop limit");

    let rec = agg.records()[0];
    assert!(rec.detected);
    assert_eq!(rec.hop_count, 6);
}

#[test]
fn distinct_paths_never_false_positive() {
    // Exact divisibility over distinct positions: zero false positives
    // across 1000 random traversals.
    let mut enc = PrimeProductEncoding::new(1, 30).expect("within table");
    let mut runner = TraceRunner::new(65137, 1_000);
    let mut agg = StatsAggregator::new();
    runner
        .run(&mut enc, TraceSpec::Path { length: 30 }, 1000, &mut agg)
        .expect("within hop limit");

    let stats = agg.summarize();
    assert_eq!(stats.paths, 1000);
    assert_eq!(stats.false_positives, 0);
    assert_eq!(stats.fp_pct, 0.0);
}

#[test]
fn exhausted_table_is_a_construction_error() {
    assert!(matches!(
        PrimeProductEncoding::new(1, PRIME_TABLE_LEN + 1),
        Err(ConfigError::PrimeTableExhausted { .. })
    ));
    assert!(PrimeProductEncoding::new(1, PRIME_TABLE_LEN).is_ok());
}

#[test]
fn runner_rejects_traces_beyond_the_hop_limit() {
    let mut enc = PrimeProductEncoding::new(1, 20).expect("within table");
    let mut runner = TraceRunner::new(1, 1_000);
    let mut agg = StatsAggregator::new();
    let err = runner
        .run(&mut enc, TraceSpec::Path { length: 21 }, 1, &mut agg)
        .unwrap_err();
    assert!(matches!(
        err,
        TraceError::HopLimitExceeded {
            needed: 21,
            limit: 20
        }
    ));
}

#[test]
fn reset_clears_the_factor_set() {
    let mut enc = PrimeProductEncoding::new(1, 10).expect("within table");
    assert!(enc.process(NodeId(1), 0));
    assert!(!enc.process(NodeId(2), 0)); // same index, confirmed

    enc.reset();
    assert!(enc.process(NodeId(3), 0));
    assert!(!enc.finalize().detected);
}

#[test]
fn notional_memory_is_only_the_gate_counter() {
    let enc = PrimeProductEncoding::new(8, 10).expect("within table");
    assert_eq!(enc.memory_bits(), 3.0); // log2(8)
}
