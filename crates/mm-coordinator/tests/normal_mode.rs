//! End-to-end coordinator scenarios (§10.5) against `FixtureEngine`, driven
//! through real `fork`/pipe/poll, not the dispatch unit tests in `aggregate.rs`.
use mm_coordinator::{run_normal, CoordinatorConfig, Mode};
use mm_engine::fixture::FixtureEngine;
use mm_protocol::Record;

fn base_config(workers: usize, cap: Option<u64>) -> CoordinatorConfig {
    CoordinatorConfig {
        workers,
        order: "kpc".to_string(),
        cap,
        mode: Mode::Normal,
        queue_path: std::env::temp_dir().join("meshmate-normal-mode-test-unused"),
        single_combo: None,
        first_move_partition: None,
    }
}

/// Literal scenario 1: two workers, one per combo, each emitting the same
/// two progress depths then finishing; the aggregated totals sum both.
#[test]
fn scenario_one_trivial_partition_round_trip() {
    let combo_a = (0, 0, 0);
    let combo_b = (1, 0, 0);
    let script = vec![Record::Progress { m: 1, k: 0, positions: 3 }, Record::Progress { m: 1, k: 1, positions: 7 }];
    let mut engine = FixtureEngine::new(vec![combo_a, combo_b])
        .with_script(combo_a, script.clone())
        .with_script(combo_b, script);

    let config = base_config(2, None);
    let mut out = Vec::new();
    run_normal(&mut engine, &config, &mut out).expect("coordinator run");

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("1+0: 6 positions"), "got:\n{text}");
    assert!(text.contains("1+1: 14 positions"), "got:\n{text}");
}

/// Literal scenario 2: a solution header reaching the cap stops the run;
/// the solution line still appears on output.
#[test]
fn scenario_two_cap_stops_workers() {
    let combo = (0, 0, 0);
    let mut engine = FixtureEngine::new(vec![combo])
        .with_script(combo, vec![Record::Text("  1.e2-e4 e7-e5 #".to_string())]);

    let config = base_config(1, Some(1));
    let mut out = Vec::new();
    run_normal(&mut engine, &config, &mut out).expect("coordinator run");

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("1.e2-e4 e7-e5 #"), "got:\n{text}");
}
