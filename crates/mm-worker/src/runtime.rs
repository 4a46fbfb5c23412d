//! Worker drive loop (§4.4): install the partition predicate and first-move
//! filter, then push an [`Engine`](mm_engine::Engine) through its combo space,
//! emitting protocol records to the pipe.
use crate::config::{AssignmentSpec, FirstMoveSpec, WorkerConfig};
use mm_engine::Engine;
use mm_partition::{Partitioner, PartitionError};
use mm_protocol::Record;
use mm_queue::{CachingQueueHandle, WorkQueue};
use nix::sys::signal::{signal, SigHandler, Signal};
use std::io::{self, Write};

/// Reset SIGINT/SIGTERM to their default disposition (§4.4 step 1). A forked
/// child inherits the coordinator's handlers; the default action for both
/// signals is immediate termination, which is exactly step 6's contract — no
/// custom handler is installed here, only the inherited one is cleared.
pub fn reset_signal_handlers() {
    unsafe {
        let _ = signal(Signal::SIGINT, SigHandler::SigDfl);
        let _ = signal(Signal::SIGTERM, SigHandler::SigDfl);
    }
}

fn build_partitioner(config: &WorkerConfig) -> Result<Partitioner, PartitionError> {
    let mut partitioner = Partitioner::new();
    partitioner.configure_order(&config.order)?;
    match config.assignment {
        AssignmentSpec::Whole => {}
        AssignmentSpec::Strided { start, stride, max } => partitioner.assign_strided(start, stride, max)?,
        AssignmentSpec::Simple { n, m } => partitioner.assign_simple(n, m)?,
        AssignmentSpec::Single { index } => partitioner.assign_single_combo(index),
    }
    Ok(partitioner)
}

/// Acquire a rotation first-move filter from the shared work queue. On any
/// I/O failure the worker falls back to unfiltered search (§4.3 failure
/// mode) and emits a `@@DEBUG` record so the coordinator can see it happened.
fn install_queue_filter(
    partitioner: &mut Partitioner,
    path: &std::path::Path,
    out: &mut impl Write,
) -> io::Result<()> {
    let acquired = WorkQueue::open(path).and_then(|queue| {
        let mut handle = CachingQueueHandle::new(queue);
        let index = handle.acquire_worker_index()?;
        let total = handle.read_total()?;
        Ok((index, total))
    });
    match acquired {
        Ok((index, total)) => {
            partitioner.set_first_move_rotation(index as usize, total as usize);
            Ok(())
        }
        Err(e) => {
            log::warn!("work-queue unavailable ({e}), falling back to unfiltered first-move search");
            Record::Debug(format!("work-queue unavailable: {e}, unfiltered fallback")).write_line(out)
        }
    }
}

/// Drive `engine` to completion under `config`, writing protocol records and
/// solver chatter to `out` (§4.4 steps 3–5). The caller is responsible for
/// having already duplicated stdout/stderr onto the pipe and for calling
/// [`reset_signal_handlers`] — both are process-global effects this function
/// does not perform so it stays unit-testable against a plain `Vec<u8>`.
pub fn run(engine: &mut dyn Engine, config: &WorkerConfig, out: &mut impl Write) -> io::Result<()> {
    let mut partitioner = build_partitioner(config)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;

    if let FirstMoveSpec::Static { index, total } = config.first_move {
        partitioner.set_first_move(index, total);
    }
    if let FirstMoveSpec::Queue { path } = &config.first_move {
        install_queue_filter(&mut partitioner, path, out)?;
    }

    Record::Ready.write_line(out)?;
    Record::Solving.write_line(out)?;

    let mut target_ordinal = 0usize;
    for (king, checker, check_sq) in engine.combos() {
        if !partitioner.in_partition(king, checker, check_sq) {
            continue;
        }
        let label = partitioner.combo_index(king, checker, check_sq).to_string();
        Record::Combo(label).write_line(out)?;

        let candidates = engine.first_moves((king, checker, check_sq));
        let moves = partitioner.filter_first_moves(&candidates, target_ordinal);
        target_ordinal += 1;

        engine.solve((king, checker, check_sq), &moves, out)?;
    }

    Record::Finished.write_line(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mm_engine::fixture::FixtureEngine;

    fn combo_n(n: usize) -> (usize, usize, usize) {
        // decode an index under the default kpc order (king fastest)
        let king = n % 64;
        let checker = (n / 64) % 15;
        let check_sq = n / (64 * 15);
        (king, checker, check_sq)
    }

    #[test]
    fn ready_solving_finished_bracket_every_run() {
        let combos = vec![combo_n(0), combo_n(1)];
        let mut engine = FixtureEngine::new(combos);
        let config = WorkerConfig::default();
        let mut buf = Vec::new();
        run(&mut engine, &config, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.first(), Some(&"@@READY"));
        assert_eq!(lines.get(1), Some(&"@@SOLVING"));
        assert_eq!(lines.last(), Some(&"@@FINISHED"));
    }

    #[test]
    fn strided_assignment_skips_combos_outside_partition() {
        let combos: Vec<_> = (0..4).map(combo_n).collect();
        let mut engine = FixtureEngine::new(combos);
        let config = WorkerConfig {
            order: "kpc".to_string(),
            assignment: AssignmentSpec::Strided { start: 0, stride: 2, max: 61_440 },
            first_move: FirstMoveSpec::None,
        };
        let mut buf = Vec::new();
        run(&mut engine, &config, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let combo_labels: Vec<&str> = text
            .lines()
            .filter_map(|l| l.strip_prefix("@@COMBO:"))
            .collect();
        assert_eq!(combo_labels, vec!["0", "2"]);
    }

    #[test]
    fn static_first_move_filter_is_applied_per_combo() {
        let combo = combo_n(0);
        let mut engine = FixtureEngine::new(vec![combo])
            .with_moves(combo, vec![0, 1, 2, 3])
            .with_script(combo, vec![Record::Finished]);
        let config = WorkerConfig {
            order: "kpc".to_string(),
            assignment: AssignmentSpec::Whole,
            first_move: FirstMoveSpec::Static { index: 1, total: 2 },
        };
        let mut buf = Vec::new();
        run(&mut engine, &config, &mut buf).unwrap();
        // the fixture's own script emits FINISHED regardless of filtered moves,
        // so here we only confirm the run completes without error when a
        // static filter is installed.
        assert!(String::from_utf8(buf).unwrap().contains("@@FINISHED"));
    }

    #[test]
    fn bad_order_is_rejected_before_any_record_is_written() {
        let config = WorkerConfig {
            order: "xyz".to_string(),
            assignment: AssignmentSpec::Whole,
            first_move: FirstMoveSpec::None,
        };
        let mut engine = FixtureEngine::new(vec![]);
        let mut buf = Vec::new();
        assert!(run(&mut engine, &config, &mut buf).is_err());
        assert!(buf.is_empty());
    }

    #[test]
    fn queue_failure_falls_back_to_unfiltered_with_debug_record() {
        let combo = combo_n(0);
        let mut engine = FixtureEngine::new(vec![combo]);
        let config = WorkerConfig {
            order: "kpc".to_string(),
            assignment: AssignmentSpec::Whole,
            first_move: FirstMoveSpec::Queue { path: std::env::temp_dir().join("mm-worker-test-missing-queue-file") },
        };
        let mut buf = Vec::new();
        run(&mut engine, &config, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("@@DEBUG:"));
        assert!(text.contains("@@READY"));
        assert!(text.contains("@@FINISHED"));
    }
}
