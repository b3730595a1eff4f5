//! End-to-end pipeline tests
//!
//! Runs the full ingest -> index -> report chain on real files:
//! single-source aggregation, propagation seeding from treated volume,
//! the not-found signal, report idempotence and the append-only leak
//! history.

use std::fs;
use std::path::PathBuf;

use water_network_core_rs::{
    pipeline, KeywordClassifier, LeakTarget, Metric, PipelineError,
};

fn write_ledger(dir: &tempfile::TempDir, name: &str, lines: &[&str]) -> PathBuf {
    let path = dir.path().join(name);
    let mut content = String::from("actor;upstream;downstream;volume;leak\n");
    for line in lines {
        content.push_str(line);
        content.push('\n');
    }
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_single_source_aggregate_reports() {
    // One source->actor row (volume 100, leak 10%) and nothing else:
    // "real" shows 90, "source" shows 100.
    let dir = tempfile::tempdir().unwrap();
    let ledger = write_ledger(&dir, "ledger.csv", &["Facility A;Source 1;Plant Alpha;100;10"]);
    let classifier = KeywordClassifier::default();

    let real = dir.path().join("vol_real.dat");
    pipeline::run_aggregate(&ledger, Metric::Treated, &real, &classifier).unwrap();
    assert_eq!(
        fs::read_to_string(&real).unwrap(),
        "identifier;real volume (k.m3.year-1)\nPlant Alpha;90.000\n"
    );

    let source = dir.path().join("vol_src.dat");
    pipeline::run_aggregate(&ledger, Metric::Captured, &source, &classifier).unwrap();
    assert_eq!(
        fs::read_to_string(&source).unwrap(),
        "identifier;source volume (k.m3.year-1)\nPlant Alpha;100.000\n"
    );
}

#[test]
fn test_max_report_is_descending() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = write_ledger(
        &dir,
        "ledger.csv",
        &["A;Plant Alpha;-;100;-", "A;Plant Beta;-;200;-"],
    );

    let out = dir.path().join("vol_max.dat");
    pipeline::run_aggregate(&ledger, Metric::MaxCapacity, &out, &KeywordClassifier::default())
        .unwrap();

    let text = fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "identifier;max volume (k.m3.year-1)");
    assert_eq!(lines[1], "Plant Beta;200.000");
    assert_eq!(lines[2], "Plant Alpha;100.000");
}

#[test]
fn test_leak_query_for_absent_actor_is_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = write_ledger(&dir, "ledger.csv", &["A;Source 1;Plant Alpha;100;10"]);
    let out = dir.path().join("leaks.dat");

    let summary = pipeline::run_leak_balance(
        &ledger,
        &LeakTarget::Single("Plant Ghost".to_string()),
        &out,
        1.0,
        &KeywordClassifier::default(),
    )
    .unwrap();

    // Distinct signal, plus a well-defined zero-valued report row
    assert!(summary.target_missing);
    assert_eq!(
        fs::read_to_string(&out).unwrap(),
        "identifier;Leak volume (M.m3.year-1)\nPlant Ghost;0.0\n"
    );
}

#[test]
fn test_batch_leak_report() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = write_ledger(
        &dir,
        "ledger.csv",
        &[
            "A;Source 1;Plant C;100;0",
            "A;Plant C;Junction J;80;0",
            "A;Source 2;Plant A;50;0",
            "A;Plant A;Junction J;30;0",
        ],
    );
    let out = dir.path().join("leaks.dat");

    let summary = pipeline::run_leak_balance(
        &ledger,
        &LeakTarget::All,
        &out,
        1.0,
        &KeywordClassifier::default(),
    )
    .unwrap();

    assert!(!summary.target_missing);
    assert_eq!(summary.leak, 40.0);
    assert_eq!(
        fs::read_to_string(&out).unwrap(),
        "identifier;Leak volume (k.m3.year-1 / 1)\nPlant A;20.0\nPlant C;20.0\n"
    );
}

#[test]
fn test_propagation_seeds_from_treated_volume() {
    // Source feeds Plant X: captured 1000, treated 1000 (0% source leak).
    // Plant X -> Junction J at 5%, J -> user. Seed is the treated volume.
    let dir = tempfile::tempdir().unwrap();
    let ledger = write_ledger(
        &dir,
        "ledger.csv",
        &[
            "Facility A;Source 1;Plant X;1000;0",
            "Facility A;Plant X;Junction J;1000;5",
            "Facility A;Junction J;Unit U;950;0",
        ],
    );
    let out = dir.path().join("leaks.dat");

    let summary = pipeline::run_leak_propagation(
        &ledger,
        "Plant X",
        &out,
        None,
        &KeywordClassifier::default(),
    )
    .unwrap();

    assert!(!summary.target_missing);
    assert!((summary.leak - 50.0).abs() < 1e-9);
    assert_eq!(
        fs::read_to_string(&out).unwrap(),
        "identifier;Leak volume (M.m3.year-1)\nPlant X;50.0\n"
    );
}

#[test]
fn test_propagation_on_cyclic_ledger_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = write_ledger(
        &dir,
        "ledger.csv",
        &[
            "Facility A;Source 1;Plant X;100;0",
            "Facility A;Plant X;Junction J;100;5",
            "Facility A;Junction J;Plant X;95;5",
        ],
    );
    let out = dir.path().join("leaks.dat");

    let err = pipeline::run_leak_propagation(
        &ledger,
        "Plant X",
        &out,
        None,
        &KeywordClassifier::default(),
    )
    .unwrap_err();
    assert!(matches!(err, PipelineError::Propagation(_)));
}

#[test]
fn test_aggregate_reports_are_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = write_ledger(
        &dir,
        "ledger.csv",
        &[
            "Facility A;Source 1;Plant Alpha;100;10",
            "Facility A;Source 2;Plant Beta;80;5",
            "Facility A;Plant Alpha;Junction 2;50;2",
        ],
    );
    let classifier = KeywordClassifier::default();

    let first = dir.path().join("first.dat");
    let second = dir.path().join("second.dat");
    pipeline::run_aggregate(&ledger, Metric::Treated, &first, &classifier).unwrap();
    pipeline::run_aggregate(&ledger, Metric::Treated, &second, &classifier).unwrap();

    assert_eq!(
        fs::read(&first).unwrap(),
        fs::read(&second).unwrap(),
        "re-running on an unchanged ledger must be byte-identical"
    );
}

#[test]
fn test_leak_history_is_append_only() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = write_ledger(
        &dir,
        "ledger.csv",
        &[
            "Facility A;Source 1;Plant X;1000;0",
            "Facility A;Plant X;Junction J;1000;5",
            "Facility A;Junction J;Unit U;950;0",
        ],
    );
    let out = dir.path().join("leaks.dat");
    let history = dir.path().join("leaks_history.dat");
    let classifier = KeywordClassifier::default();

    for _ in 0..3 {
        pipeline::run_leak_propagation(&ledger, "Plant X", &out, Some(history.as_path()), &classifier)
            .unwrap();
    }

    let text = fs::read_to_string(&history).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3, "one history line per invocation");
    for line in lines {
        assert_eq!(line, "Plant X;0.050000");
    }
}

#[test]
fn test_missing_input_is_an_ingest_error() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.dat");

    let err = pipeline::run_aggregate(
        &dir.path().join("nope.csv"),
        Metric::Captured,
        &out,
        &KeywordClassifier::default(),
    )
    .unwrap_err();
    assert!(matches!(err, PipelineError::Ingest(_)));
}
