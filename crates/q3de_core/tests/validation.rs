mod common;

use common::{BruteForceExact, RandomSource, VecSource, event};
use q3de_common::{EventId, MatchDecision, Partner};
use q3de_core::{DecodeError, DecoderConfig, ValidationHarness, canonicalize};

#[test]
fn canonicalize_orients_and_sorts() {
    let raw = vec![
        MatchDecision::boundary(EventId(3)),
        MatchDecision {
            event: EventId(2),
            partner: Partner::Event(EventId(0)),
        },
        MatchDecision::boundary(EventId(1)),
    ];
    assert_eq!(
        canonicalize(raw),
        vec![
            MatchDecision::pair(EventId(0), EventId(2)),
            MatchDecision::boundary(EventId(1)),
            MatchDecision::boundary(EventId(3)),
        ]
    );
}

#[test]
fn random_trials_agree_with_enough_capacity() {
    let harness = ValidationHarness::new(&DecoderConfig::new(5, 64))
        .unwrap()
        .keep_dumps(true);
    let mut source = RandomSource::new(0x5eed, 5, 9, 24);
    let report = harness.run(&mut source, 300).unwrap();

    assert_eq!(report.trials, 300);
    assert!(report.passed());
    assert_eq!(report.mismatches, 0);
    assert!(report.dumps.is_empty());
    assert!(report.agreement() >= 0.99);
    assert!(report.peak_occupancy <= 24);
    assert_eq!(report.max_streaming_latency, report.max_batch_latency);
}

#[test]
fn empty_trials_pass() {
    let harness = ValidationHarness::new(&DecoderConfig::new(5, 4)).unwrap();
    let mut source = VecSource::new(vec![Vec::new()]);
    let report = harness.run(&mut source, 10).unwrap();
    assert_eq!(report.trials, 10);
    assert_eq!(report.events, 0);
    assert!(report.passed());
}

#[test]
fn overflow_aborts_the_run() {
    let harness = ValidationHarness::new(&DecoderConfig::new(7, 1)).unwrap();
    let mut source = VecSource::new(vec![vec![event(0, 0, 0, 0, 3), event(1, 5, 0, 0, 3)]]);
    let err = harness.run(&mut source, 5).unwrap_err();
    assert!(matches!(err, DecodeError::BufferOverflow { capacity: 1, .. }));
}

#[test]
fn exact_matcher_disagreements_are_counted_separately() {
    let greedy_trap = vec![
        event(0, 0, 0, 0, 100),
        event(1, 3, 0, 0, 100),
        event(2, 5, 0, 0, 100),
        event(3, 8, 0, 0, 100),
    ];
    let easy = vec![event(0, 0, 0, 0, 4), event(1, 1, 0, 0, 4)];
    let harness = ValidationHarness::new(&DecoderConfig::new(9, 8)).unwrap();
    let mut source = VecSource::new(vec![greedy_trap, easy]);

    let report = harness
        .run_with_exact(&mut source, 4, &mut BruteForceExact)
        .unwrap();
    assert_eq!(report.exact_trials, 4);
    assert_eq!(report.exact_disagreements, 2);
    assert!(report.passed());
}

#[test]
fn trial_run_reports_commits_and_stats() {
    let harness = ValidationHarness::new(&DecoderConfig::new(7, 8)).unwrap();
    let run = harness
        .run_trial(&[event(0, 0, 0, 0, 2), event(1, 4, 0, 0, 2)])
        .unwrap();
    assert!(run.agrees());
    assert_eq!(run.streaming.len(), 1);
    assert_eq!(run.stats.max_latency, 4);
    assert_eq!(run.batch.max_latency, 4);
}
