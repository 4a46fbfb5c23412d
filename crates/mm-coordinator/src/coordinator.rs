//! The coordinator event loop (§4.5): fork the worker pool, multiplex their
//! pipes with a 1-second tick, dispatch frames, periodically render status,
//! and drain/reap on completion or interruption.
use crate::aggregate::{dispatch_frame, Aggregator, DispatchEffect};
use crate::signals;
use crate::status::{self, HeavyComboTable};
use crate::worker::{spawn_worker, WorkerRecord};
use mm_engine::Engine;
use mm_queue::WorkQueue;
use mm_worker::{AssignmentSpec, FirstMoveSpec, WorkerConfig};
use nix::fcntl::{fcntl, FcntlArg, OFlag};
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use nix::sys::signal::Signal;
use nix::sys::wait::waitpid;
use std::io::{self, Write};
use std::os::fd::{BorrowedFd, RawFd};
use std::time::{Duration, Instant};

/// Which public coordinator mode to run (§4.5).
#[derive(Debug, Clone)]
pub enum Mode {
    Normal,
    Probe { timeout: Duration },
    Rebalance { timeout: Duration },
    FirstMoveQueue,
}

/// Everything the coordinator needs that isn't already implied by the
/// engine instance itself.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub workers: usize,
    pub order: String,
    pub cap: Option<u64>,
    pub mode: Mode,
    pub queue_path: std::path::PathBuf,
    /// `-single-combo`, honoured by queue mode (§6: "used with
    /// `-first-move-*`"): every worker gets the same one-combo assignment
    /// instead of a disjoint stride of the whole combo space, so the work
    /// queue's rotation filter is what actually splits the work.
    pub single_combo: Option<usize>,
    /// `-first-move-partition N/M`, honoured by normal mode when paired with
    /// `single_combo` (§6: "used with `-first-move-*`"): `M` is the static
    /// first-move partition count shared by every spawned worker, each of
    /// which takes a distinct index `i % M`. The `N` half of the pair is
    /// only meaningful for a lone `-worker` invocation, not a
    /// coordinator-spawned pool, so it is ignored here.
    pub first_move_partition: Option<(usize, usize)>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            order: mm_partition::DEFAULT_ORDER.to_string(),
            cap: None,
            mode: Mode::Normal,
            queue_path: std::env::temp_dir().join("meshmate-work-queue"),
            single_combo: None,
            first_move_partition: None,
        }
    }
}

/// Static first-move specs for `n` coordinator-spawned workers sharing one
/// combo, built from `-single-combo` + `-first-move-partition M` (§6): each
/// worker gets a distinct index `i % m` into the `m`-way static filter.
fn static_first_moves(n: usize, m: usize) -> Vec<FirstMoveSpec> {
    (0..n).map(|i| FirstMoveSpec::Static { index: i % m, total: m }).collect()
}

fn clamp_workers(n: usize) -> usize {
    n.clamp(1, mm_core::MAX_WORKERS)
}

fn set_blocking(fd: RawFd) -> io::Result<()> {
    let raw = fcntl(fd, FcntlArg::F_GETFL).map_err(io::Error::from)?;
    let mut flags = OFlag::from_bits_truncate(raw);
    flags.remove(OFlag::O_NONBLOCK);
    fcntl(fd, FcntlArg::F_SETFL(flags)).map_err(io::Error::from)?;
    Ok(())
}

fn strided_worker_config(order: &str, index: usize, total: usize) -> WorkerConfig {
    WorkerConfig {
        order: order.to_string(),
        assignment: AssignmentSpec::Strided { start: index, stride: total, max: mm_core::COMBO_SPACE },
        first_move: FirstMoveSpec::None,
    }
}

fn single_combo_worker_config(order: &str, index: usize) -> WorkerConfig {
    WorkerConfig { order: order.to_string(), assignment: AssignmentSpec::Single { index }, first_move: FirstMoveSpec::None }
}

/// Fork `n` workers, each owning `1/n` of the combo space under `order`,
/// or (when `single_combo` is `Some`) all of them owning the same one combo
/// so a queue-mode rotation filter is the only thing dividing the work
/// (§4.5 step 3, §6 `-single-combo`: "used with `-first-move-*`" — callers
/// outside queue mode always pass `None` here). Per-worker fork/pipe
/// failure is logged and tolerated — the caller proceeds with however many
/// workers actually started.
fn spawn_pool(
    engine: &mut dyn Engine,
    order: &str,
    n: usize,
    single_combo: Option<usize>,
    first_moves: &[FirstMoveSpec],
) -> Vec<WorkerRecord> {
    let mut workers = Vec::with_capacity(n);
    for i in 0..n {
        let mut config = match single_combo {
            Some(index) => single_combo_worker_config(order, index),
            None => strided_worker_config(order, i, n),
        };
        if let Some(fm) = first_moves.get(i) {
            config.first_move = fm.clone();
        }
        match spawn_worker(i, engine, &config) {
            Ok(handle) => workers.push(WorkerRecord::new(handle, i)),
            Err(e) => log::warn!("{e}"),
        }
    }
    workers
}

/// Read one ready pipe's worth of bytes and dispatch whatever frames it
/// completes (§4.5 step 4).
fn service_ready_worker(
    workers: &mut [WorkerRecord],
    idx: usize,
    agg: &mut Aggregator,
    out: &mut impl Write,
) -> io::Result<bool> {
    let mut buf = [0u8; mm_core::READ_CHUNK];
    let fd = workers[idx].read_fd;
    let mut cap_reached = false;
    match nix::unistd::read(fd, &mut buf) {
        Ok(0) => {
            if let Some(frame) = workers[idx].reader.flush() {
                dispatch_frame(workers, idx, frame, agg, out)?;
            }
            workers[idx].close();
        }
        Ok(n) => {
            let frames = workers[idx].reader.feed(&buf[..n]);
            for frame in frames {
                if dispatch_frame(workers, idx, frame, agg, out)? == DispatchEffect::CapReached {
                    cap_reached = true;
                }
            }
        }
        Err(nix::errno::Errno::EAGAIN) | Err(nix::errno::Errno::EINTR) => {}
        Err(_) => workers[idx].close(),
    }
    Ok(cap_reached)
}

/// The core multiplex loop (§4.5 step 4): repeatedly poll non-finished
/// worker fds with a 1-second tick until every worker has finished or the
/// cooperative interrupt flag is set.
fn multiplex(
    workers: &mut [WorkerRecord],
    agg: &mut Aggregator,
    start_time: Instant,
    phase_deadline: Option<Instant>,
    out: &mut impl Write,
) -> io::Result<()> {
    let mut last_status = Instant::now();
    loop {
        let active: Vec<usize> = (0..workers.len()).filter(|&i| !workers[i].finished).collect();
        if active.is_empty() || mm_core::interrupted() {
            break;
        }
        if let Some(deadline) = phase_deadline {
            if Instant::now() >= deadline {
                break;
            }
        }

        let borrows: Vec<BorrowedFd> =
            active.iter().map(|&i| unsafe { BorrowedFd::borrow_raw(workers[i].read_fd) }).collect();
        let mut poll_fds: Vec<PollFd> = borrows.iter().map(|&fd| PollFd::new(fd, PollFlags::POLLIN)).collect();
        let timeout = PollTimeout::from(mm_core::SELECT_TIMEOUT.as_millis() as u16);
        let ready = poll(&mut poll_fds, timeout).unwrap_or(0);

        if ready > 0 {
            for (slot, &idx) in active.iter().enumerate() {
                let revents = poll_fds[slot].revents().unwrap_or(PollFlags::empty());
                if revents.intersects(PollFlags::POLLIN | PollFlags::POLLHUP | PollFlags::POLLERR) {
                    if service_ready_worker(workers, idx, agg, out)? {
                        signals::terminate_workers(workers);
                    }
                }
            }
        }

        if last_status.elapsed() >= mm_core::STATUS_INTERVAL {
            log::info!("{}", status::render_status_line(workers, start_time.elapsed()));
            last_status = Instant::now();
        }
    }
    Ok(())
}

/// Drain remaining buffered output from every still-open worker by
/// switching its fd to blocking and reading to EOF, then `waitpid` every
/// child (§4.5 step 6).
fn drain(workers: &mut [WorkerRecord], agg: &mut Aggregator, out: &mut impl Write) -> io::Result<()> {
    for idx in 0..workers.len() {
        if !workers[idx].finished {
            let _ = set_blocking(workers[idx].read_fd);
            loop {
                let mut buf = [0u8; mm_core::READ_CHUNK];
                match nix::unistd::read(workers[idx].read_fd, &mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        let frames = workers[idx].reader.feed(&buf[..n]);
                        for frame in frames {
                            dispatch_frame(workers, idx, frame, agg, out)?;
                        }
                    }
                }
            }
            if let Some(frame) = workers[idx].reader.flush() {
                dispatch_frame(workers, idx, frame, agg, out)?;
            }
            workers[idx].close();
        }
    }
    for worker in workers.iter() {
        let _ = waitpid(worker.pid, None);
    }
    Ok(())
}

/// Normal mode (§4.5 "Normal mode"): the baseline spawn/multiplex/drain
/// cycle every other mode builds on.
pub fn run_normal(engine: &mut dyn Engine, config: &CoordinatorConfig, out: &mut impl Write) -> io::Result<()> {
    signals::install();
    mm_core::reset_interrupt();
    let n = clamp_workers(config.workers);
    let start_time = Instant::now();
    log::info!("spawning {n} workers, order {}", config.order);

    let first_moves = match (config.single_combo, config.first_move_partition) {
        (Some(_), Some((_, m))) => static_first_moves(n, m),
        _ => Vec::new(),
    };
    let mut workers = spawn_pool(engine, &config.order, n, config.single_combo, &first_moves);
    let mut agg = Aggregator::new(config.cap, start_time);
    multiplex(&mut workers, &mut agg, start_time, None, out)?;

    let interrupted = mm_core::interrupted();
    if interrupted {
        signals::terminate_workers(&workers);
    }
    drain(&mut workers, &mut agg, out)?;
    log::info!("coordinator phase complete in {:.2}s", start_time.elapsed().as_secs_f64());

    if interrupted {
        signals::reraise_and_exit(Signal::SIGINT);
    }
    Ok(())
}

/// Probe mode (§4.5 "Probe mode"): cycle through all six `kpc` permutations,
/// recording any combo still running when the phase timeout fires.
pub fn run_probe(engine: &mut dyn Engine, config: &CoordinatorConfig, timeout: Duration, out: &mut impl Write) -> io::Result<HeavyComboTable> {
    signals::install();
    mm_core::reset_interrupt();
    let n = clamp_workers(config.workers);
    let orders = ["kpc", "kcp", "pkc", "pck", "ckp", "cpk"];
    let mut heavy = HeavyComboTable::new();

    for order in orders {
        if mm_core::interrupted() {
            break;
        }
        let start_time = Instant::now();
        let deadline = start_time + timeout;
        let mut workers = spawn_pool(engine, order, n, None, &[]);
        let mut agg = Aggregator::new(config.cap, start_time);
        multiplex(&mut workers, &mut agg, start_time, Some(deadline), out)?;

        for worker in workers.iter().filter(|w| !w.finished) {
            if let (Some(label), Some(depth)) = (&worker.current_combo_label, worker.last_depth) {
                heavy.record(label, depth);
            }
        }
        signals::terminate_workers(&workers);
        drain(&mut workers, &mut agg, out)?;
        log::info!("probe order {order} complete");
    }

    writeln!(out, "{}", status::render_heavy_combo_table(&heavy))?;
    if mm_core::interrupted() {
        signals::reraise_and_exit(Signal::SIGINT);
    }
    Ok(heavy)
}

/// Rebalance mode (§4.5 "Rebalance mode"): after `timeout`, spawn a helper
/// on each freed slot for the heaviest still-running combo, accepting
/// duplicate solutions from overlapping helper coverage as a stated trade-off.
pub fn run_rebalance(engine: &mut dyn Engine, config: &CoordinatorConfig, timeout: Duration, out: &mut impl Write) -> io::Result<()> {
    signals::install();
    mm_core::reset_interrupt();
    let n = clamp_workers(config.workers);
    let start_time = Instant::now();
    let watchful_deadline = start_time + timeout;

    let mut workers = spawn_pool(engine, &config.order, n, None, &[]);
    let mut agg = Aggregator::new(config.cap, start_time);
    multiplex(&mut workers, &mut agg, start_time, Some(watchful_deadline), out)?;

    if !mm_core::interrupted() {
        let still_running: Vec<(String, usize)> = workers
            .iter()
            .filter(|w| !w.finished)
            .filter_map(|w| w.current_combo_label.clone().map(|l| (l, w.partition_id)))
            .collect();
        let free_slots: Vec<usize> = workers.iter().filter(|w| w.finished).map(|w| w.partition_id).collect();

        if !still_running.is_empty() {
            let helpers_per_combo = free_slots.len().max(1);
            for (slot_i, &_free_partition) in free_slots.iter().enumerate() {
                let (label, _owner) = &still_running[slot_i % still_running.len()];
                let Ok(combo_index) = label.parse::<usize>() else { continue };
                let helper_config = WorkerConfig {
                    order: config.order.clone(),
                    assignment: AssignmentSpec::Single { index: combo_index },
                    first_move: FirstMoveSpec::Static { index: slot_i % helpers_per_combo, total: helpers_per_combo },
                };
                let helper_id = workers.len();
                match spawn_worker(helper_id, engine, &helper_config) {
                    Ok(handle) => workers.push(WorkerRecord::new(handle, helper_id)),
                    Err(e) => log::warn!("{e}"),
                }
            }
        }
        multiplex(&mut workers, &mut agg, start_time, None, out)?;
    }

    let interrupted = mm_core::interrupted();
    if interrupted {
        signals::terminate_workers(&workers);
    }
    drain(&mut workers, &mut agg, out)?;
    if interrupted {
        signals::reraise_and_exit(Signal::SIGINT);
    }
    Ok(())
}

/// First-move queue mode (§4.5 "First-move queue mode"): `W` workers share a
/// dynamic rotation filter backed by the work-queue file instead of a
/// static combo partition.
pub fn run_queue_mode(engine: &mut dyn Engine, config: &CoordinatorConfig, out: &mut impl Write) -> io::Result<()> {
    signals::install();
    mm_core::reset_interrupt();
    let n = clamp_workers(config.workers);
    let start_time = Instant::now();

    let queue = WorkQueue::initialise(&config.queue_path, n as u32)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;

    let first_moves: Vec<FirstMoveSpec> =
        (0..n).map(|_| FirstMoveSpec::Queue { path: config.queue_path.clone() }).collect();
    let mut workers = spawn_pool(engine, &config.order, n, config.single_combo, &first_moves);
    let mut agg = Aggregator::new(config.cap, start_time);
    multiplex(&mut workers, &mut agg, start_time, None, out)?;

    let interrupted = mm_core::interrupted();
    if interrupted {
        signals::terminate_workers(&workers);
    }
    drain(&mut workers, &mut agg, out)?;
    let _ = queue.destroy();

    if interrupted {
        signals::reraise_and_exit(Signal::SIGINT);
    }
    Ok(())
}

/// Dispatch to the configured mode (§6 CLI surface: `-probe`/`-rebalance`/`-first-move-queue`/default).
pub fn run(engine: &mut dyn Engine, config: &CoordinatorConfig, out: &mut impl Write) -> io::Result<()> {
    match config.mode.clone() {
        Mode::Normal => run_normal(engine, config, out),
        Mode::Probe { timeout } => run_probe(engine, config, timeout, out).map(|_| ()),
        Mode::Rebalance { timeout } => run_rebalance(engine, config, timeout, out),
        Mode::FirstMoveQueue => run_queue_mode(engine, config, out),
    }
}
