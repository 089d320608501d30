use q3de_common::{DetectionEvent, EventId, MatchDecision, Position};
use q3de_core::MismatchDump;
use q3de_io::dump::{format_decisions, save_dumps, write_dump};
use q3de_io::trace::{load_trace, parse_trace, save_trace, write_trace};

fn scratch_dir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("q3de_io_{}_{}", name, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn parses_records_and_skips_comments() {
    let text = "# distance 5\n\n0 1 0 0\n  3 2 1 2  \n# trailing\n4 4 1 1\n";
    let events = parse_trace(text).unwrap();
    assert_eq!(
        events,
        vec![
            DetectionEvent::new(0, Position::new(0, 1, 0), 0),
            DetectionEvent::new(1, Position::new(3, 2, 1), 2),
            DetectionEvent::new(2, Position::new(4, 4, 1), 1),
        ]
    );
}

#[test]
fn reports_line_of_malformed_record() {
    let err = parse_trace("0 0 0 1\n1 two 0 1\n").unwrap_err();
    assert!(err.to_string().contains("line 2"), "{}", err);
}

#[test]
fn written_trace_parses_back() {
    let events = vec![
        DetectionEvent::new(0, Position::new(-1, 0, 0), 0),
        DetectionEvent::new(1, Position::new(2, 3, 4), 2),
    ];
    let mut out = Vec::new();
    write_trace(&mut out, &events).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text, "-1 0 0 0\n2 3 4 2\n");
    assert_eq!(parse_trace(&text).unwrap(), events);
}

#[test]
fn saved_trace_keeps_header_as_comments() {
    let dir = scratch_dir("save");
    let path = dir.join("trial.trace");
    let events = vec![DetectionEvent::new(0, Position::new(1, 1, 1), 1)];
    save_trace(&path, "seed 7\ndistance 5", &events).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("# seed 7\n# distance 5\n"));
    assert_eq!(load_trace(&path).unwrap(), events);
    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn dump_is_a_replayable_trace() {
    let dump = MismatchDump {
        trial: 12,
        events: vec![
            DetectionEvent::new(0, Position::new(0, 0, 0), 1),
            DetectionEvent::new(1, Position::new(1, 0, 0), 2),
        ],
        streaming: vec![MatchDecision::pair(EventId(0), EventId(1))],
        batch: vec![
            MatchDecision::boundary(EventId(0)),
            MatchDecision::boundary(EventId(1)),
        ],
    };
    let mut out = Vec::new();
    write_dump(&mut out, &dump).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("# streaming: e0 - e1\n"));
    assert!(text.contains("# batch: e0 - BOUNDARY, e1 - BOUNDARY\n"));
    assert_eq!(parse_trace(&text).unwrap(), dump.events);

    let dir = scratch_dir("dumps");
    let written = save_dumps(dir.join("out"), std::slice::from_ref(&dump)).unwrap();
    assert_eq!(written.len(), 1);
    assert!(written[0].ends_with("trial_12.trace"));
    assert_eq!(load_trace(&written[0]).unwrap(), dump.events);
    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn empty_decision_list_formats_empty() {
    assert_eq!(format_decisions(&[]), "");
}
