mod common;

use common::{covers_each_once, event, stream_decisions};
use q3de_common::{EventId, MatchDecision};
use q3de_core::{BatchGreedyMatcher, CostModel, DecoderConfig, canonicalize};

fn matcher() -> BatchGreedyMatcher {
    BatchGreedyMatcher::with_model(CostModel::direct())
}

#[test]
fn empty_trial_has_no_commits() {
    let outcome = matcher().run(&[]);
    assert!(outcome.is_empty());
    assert_eq!(outcome.max_latency, 0);
}

#[test]
fn boundary_event_matches_at_its_own_cycle() {
    let outcome = matcher().run(&[event(0, 0, 0, 3, 0)]);
    assert_eq!(outcome.decisions(), vec![MatchDecision::boundary(EventId(0))]);
    assert_eq!(outcome.commits[0].latency, 0);
}

#[test]
fn greedy_takes_cheapest_pair_first() {
    // Optimal is {e0-e1, e2-e3} at total 6; greedy commits e1-e2 at cost 2
    // and is left with e0-e3 at cost 8.
    let events = [
        event(0, 0, 0, 0, 100),
        event(1, 3, 0, 0, 100),
        event(2, 5, 0, 0, 100),
        event(3, 8, 0, 0, 100),
    ];
    let outcome = matcher().run(&events);
    assert_eq!(
        outcome.decisions(),
        vec![
            MatchDecision::pair(EventId(1), EventId(2)),
            MatchDecision::pair(EventId(0), EventId(3)),
        ]
    );
    let costs: Vec<u64> = outcome.commits.iter().map(|c| c.cost).collect();
    assert_eq!(costs, vec![2, 8]);
    assert_eq!(outcome.max_latency, 8);
}

#[test]
fn input_order_does_not_matter() {
    let events = vec![
        event(0, 1, 1, 0, 1),
        event(1, 2, 1, 0, 2),
        event(2, 4, 2, 2, 3),
        event(3, 1, 4, 3, 1),
        event(4, 5, 5, 3, 2),
    ];
    let mut reversed = events.clone();
    reversed.reverse();

    let forward = canonicalize(matcher().run(&events).decisions());
    let backward = canonicalize(matcher().run(&reversed).decisions());
    assert_eq!(forward, backward);
    assert!(covers_each_once(&events, &forward));
}

#[test]
fn agrees_with_streaming_given_enough_capacity() {
    let events = [
        event(0, 0, 2, 0, 0),
        event(1, 3, 3, 0, 3),
        event(2, 4, 3, 1, 3),
        event(3, 6, 1, 4, 1),
        event(4, 2, 2, 5, 2),
        event(5, 3, 2, 5, 3),
    ];
    let config = DecoderConfig::new(7, events.len());
    let batch = BatchGreedyMatcher::new(&config).unwrap().run(&events);
    let streaming = stream_decisions(&config, &events).unwrap();
    assert_eq!(canonicalize(streaming), canonicalize(batch.decisions()));
}
