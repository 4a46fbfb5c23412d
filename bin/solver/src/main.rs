//! CLI entry point: parses the `-parallel`/`-worker`/`-partition*`/`-probe`/
//! `-rebalance` flag grammar and dispatches to the worker or coordinator
//! runtime. The chess solver itself is out of scope; this binary links the
//! fixture engine so the coordination subsystem is exercisable end to end.
mod args;
mod error;

use args::CliArgs;
use error::CliError;
use mm_coordinator::{CoordinatorConfig, Mode};
use mm_engine::fixture::FixtureEngine;
use mm_partition::DEFAULT_ORDER;
use mm_worker::{AssignmentSpec, FirstMoveSpec, WorkerConfig};
use std::time::Duration;

fn print_usage() {
    eprintln!(
        "usage: meshmate-solver [-parallel N] [-worker] [-partition N/M] \
         [-partition-range start/stride/max] [-partition-order kpc] \
         [-first-move-partition N/M] [-first-move-queue N] [-single-combo IDX] \
         [-probe [T]] [-rebalance [T]]"
    );
}

fn queue_path() -> std::path::PathBuf {
    std::env::temp_dir().join(format!("meshmate-work-queue-{}", std::process::id()))
}

fn clamp_phase_timeout(secs: Option<u64>) -> Duration {
    Duration::from_secs(secs.unwrap_or(mm_core::DEFAULT_PHASE_TIMEOUT.as_secs()))
        .clamp(Duration::from_secs(1), mm_core::MAX_PHASE_TIMEOUT)
}

fn worker_assignment(args: &CliArgs) -> Result<AssignmentSpec, CliError> {
    if let Some(index) = args.single_combo {
        return Ok(AssignmentSpec::Single { index });
    }
    if let Some((start, stride, max)) = args.partition_range {
        return Ok(AssignmentSpec::Strided { start, stride, max });
    }
    if let Some((n, m)) = args.partition {
        return Ok(AssignmentSpec::Simple { n, m });
    }
    Ok(AssignmentSpec::Whole)
}

fn worker_first_move(args: &CliArgs) -> FirstMoveSpec {
    if let Some((n, m)) = args.first_move_partition {
        return FirstMoveSpec::Static { index: n.saturating_sub(1), total: m };
    }
    if args.first_move_queue.is_some() {
        return FirstMoveSpec::Queue { path: queue_path() };
    }
    FirstMoveSpec::None
}

fn build_worker_config(args: &CliArgs) -> Result<WorkerConfig, CliError> {
    Ok(WorkerConfig {
        order: args.partition_order.clone().unwrap_or_else(|| DEFAULT_ORDER.to_string()),
        assignment: worker_assignment(args)?,
        first_move: worker_first_move(args),
    })
}

fn build_coordinator_config(args: &CliArgs) -> Result<CoordinatorConfig, CliError> {
    // §6: "-single-combo ... used with -first-move-*". A static
    // -first-move-partition only has sane semantics across a coordinator
    // pool when every worker shares the same combo via -single-combo;
    // without it, reject rather than silently dropping the flag.
    if args.first_move_partition.is_some() && args.single_combo.is_none() {
        return Err(CliError(
            "-first-move-partition requires -single-combo when spawning a coordinator pool".to_string(),
        ));
    }
    let mode = if let Some(timeout) = args.rebalance {
        Mode::Rebalance { timeout: clamp_phase_timeout(timeout) }
    } else if let Some(timeout) = args.probe {
        Mode::Probe { timeout: clamp_phase_timeout(timeout) }
    } else if args.first_move_queue.is_some() {
        Mode::FirstMoveQueue
    } else {
        Mode::Normal
    };
    Ok(CoordinatorConfig {
        workers: args.parallel.unwrap_or_else(mm_core::default_worker_count),
        order: args.partition_order.clone().unwrap_or_else(|| DEFAULT_ORDER.to_string()),
        cap: None,
        mode,
        queue_path: queue_path(),
        single_combo: args.single_combo,
        first_move_partition: args.first_move_partition,
    })
}

/// The demonstration engine standing in for the out-of-scope chess solver:
/// every point in the combo space, no scripted output. Exercises the
/// coordination machinery without claiming to search anything.
fn demo_engine() -> FixtureEngine {
    let mut combos = Vec::with_capacity(mm_core::COMBO_SPACE);
    for king in 0..mm_core::KING_CARD {
        for checker in 0..mm_core::CHECKER_CARD {
            for check_sq in 0..mm_core::CHECK_SQ_CARD {
                combos.push((king, checker, check_sq));
            }
        }
    }
    FixtureEngine::new(combos)
}

fn run() -> anyhow::Result<()> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let parsed = match args::parse(&argv) {
        Ok(parsed) => parsed,
        Err(e) => {
            print_usage();
            anyhow::bail!(e);
        }
    };

    mm_core::log();
    let mut engine = demo_engine();

    if parsed.worker {
        let config = build_worker_config(&parsed)?;
        mm_worker::run(&mut engine, &config, &mut std::io::stdout())?;
    } else {
        let config = build_coordinator_config(&parsed)?;
        mm_coordinator::run(&mut engine, &config, &mut std::io::stdout())?;
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    run()
}
