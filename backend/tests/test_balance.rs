//! Tests for the direct balance calculator
//!
//! Leak is always |captured - treated|, a miss is a distinct signal, and
//! batch mode filters zero-leak and zero-volume actors.

use water_network_core_rs::{
    batch_balance, build_balance_index, query_balance, BalanceOutcome, KeywordClassifier,
    LedgerRow,
};

fn index_for(lines: &[&str]) -> water_network_core_rs::AggregationIndex {
    let rows: Vec<LedgerRow> = lines.iter().map(|l| LedgerRow::parse(l)).collect();
    build_balance_index(&rows, &KeywordClassifier::default())
}

#[test]
fn test_leak_is_never_negative() {
    // Whatever the data ordering, the reported leak is an absolute value
    let inflow_heavy = index_for(&[
        "A;Source 1;Plant P;100;0",
        "A;Plant P;Junction J;70;0",
    ]);
    let outflow_heavy = index_for(&[
        "A;Source 1;Plant P;70;0",
        "A;Plant P;Junction J;100;0",
    ]);

    for index in [&inflow_heavy, &outflow_heavy] {
        match query_balance(index, "Plant P") {
            BalanceOutcome::Found { leak } => assert_eq!(leak, 30.0),
            BalanceOutcome::NotFound => panic!("Plant P must exist"),
        }
    }
}

#[test]
fn test_multiple_segments_accumulate_before_balancing() {
    let index = index_for(&[
        "A;Source 1;Plant P;100;0",
        "A;Source 2;Plant P;50;0",
        "A;Plant P;Junction J;60;0",
        "A;Plant P;Unit 9;40;0",
    ]);
    // captured 150, treated 100
    assert_eq!(
        query_balance(&index, "Plant P"),
        BalanceOutcome::Found { leak: 50.0 }
    );
}

#[test]
fn test_miss_is_distinct_from_computed_zero() {
    let index = index_for(&[
        "A;Source 1;Plant P;100;0",
        "A;Plant P;Junction J;100;0",
    ]);

    // Computed zero: actor exists, perfectly balanced
    assert_eq!(
        query_balance(&index, "Plant P"),
        BalanceOutcome::Found { leak: 0.0 }
    );

    // Miss: actor absent from the ledger entirely
    let miss = query_balance(&index, "Plant Ghost");
    assert!(miss.is_miss());
    assert_eq!(miss.leak(), 0.0);
}

#[test]
fn test_batch_rows_ascending_and_filtered() {
    let index = index_for(&[
        "A;Source 1;Plant C;100;0",
        "A;Plant C;Junction J;80;0", // leak 20
        "A;Source 2;Plant A;50;0",
        "A;Plant A;Junction J;30;0", // leak 20
        "A;Source 3;Plant B;40;0",
        "A;Plant B;Junction J;40;0", // leak 0: filtered out
    ]);

    let batch = batch_balance(&index, 1.0);
    assert_eq!(
        batch,
        vec![
            ("Plant A".to_string(), 20.0),
            ("Plant C".to_string(), 20.0),
        ]
    );
}
