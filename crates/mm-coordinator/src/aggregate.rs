//! Event dispatch (§4.5.1): applies one decoded frame from one worker to the
//! coordinator's aggregation state and emits whatever user-facing output the
//! frame implies. Kept free of fork/pipe/poll so it is unit-testable against
//! plain buffers and a `FixtureEngine`-driven worker record.
use crate::worker::WorkerRecord;
use mm_protocol::{Frame, Record};
use std::io::{self, Write};
use std::time::Instant;

/// What the caller (the multiplex loop) must do in response to a dispatched
/// frame, beyond the aggregation bookkeeping already applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchEffect {
    None,
    /// The solution cap was reached: SIGTERM every worker (§4.5.1 `TEXT`).
    CapReached,
}

/// Aggregation state shared across all workers in one coordinator phase.
pub struct Aggregator {
    pub last_printed_depth: Option<u32>,
    pub global_solutions_found: u64,
    pub cap: Option<u64>,
    pub show_progress: bool,
    pub start_time: Instant,
}

impl Aggregator {
    pub fn new(cap: Option<u64>, start_time: Instant) -> Self {
        Self { last_printed_depth: None, global_solutions_found: 0, cap, show_progress: true, start_time }
    }
}

fn depth_code(m: u32, k: u32) -> u32 {
    m * 100 + k
}

fn depth_slot(depth: u32) -> Option<usize> {
    let slot = depth as usize;
    (slot < mm_core::PROGRESS_TABLE_SLOTS).then_some(slot)
}

fn apply_progress(workers: &mut [WorkerRecord], idx: usize, m: u32, k: u32, positions: u64) {
    let depth = depth_code(m, k);
    if let Some(slot) = depth_slot(depth) {
        workers[idx].positions_at_depth[slot] = positions;
    }
    // P4: last_depth is monotone non-decreasing between accepted records.
    if depth >= workers[idx].last_depth.unwrap_or(0) || workers[idx].last_depth.is_none() {
        workers[idx].last_depth = Some(depth);
    }
}

/// Advance the aggregated progress frontier (§4.5.1 `PROGRESS` effect, the
/// aggregated-progress invariant of the same section): for every depth
/// strictly after the last printed one and up to the minimum `last_depth`
/// across non-finished workers, sum positions across all workers and print.
/// A non-finished worker that hasn't reported any depth yet blocks the
/// frontier entirely — it is unknown how far behind it is.
fn advance_frontier(workers: &[WorkerRecord], agg: &mut Aggregator, out: &mut impl Write) -> io::Result<()> {
    let running: Vec<&WorkerRecord> = workers.iter().filter(|w| !w.finished).collect();
    if running.iter().any(|w| w.last_depth.is_none()) {
        return Ok(());
    }
    let min_depth = running.iter().filter_map(|w| w.last_depth).min();
    let Some(min_depth) = min_depth else { return Ok(()) };
    let start = agg.last_printed_depth.map_or(0, |d| d + 1);
    if start > min_depth {
        return Ok(());
    }
    for depth in start..=min_depth {
        let Some(slot) = depth_slot(depth) else { break };
        let total: u64 = workers.iter().map(|w| w.positions_at_depth[slot]).sum();
        if total == 0 {
            continue;
        }
        let (m, k) = (depth / 100, depth % 100);
        writeln!(out, "[{:>8.2}s] {m}+{k}: {total} positions", agg.start_time.elapsed().as_secs_f64())?;
    }
    agg.last_printed_depth = Some(min_depth);
    Ok(())
}

/// A `TEXT` body looks like a solution header iff it matches `^[1-9]\.` once
/// leading whitespace is stripped.
fn looks_like_solution_header(trimmed: &str) -> bool {
    let mut chars = trimmed.chars();
    let first_is_nonzero_digit = matches!(chars.next(), Some(c) if c.is_ascii_digit() && c != '0');
    first_is_nonzero_digit && chars.next() == Some('.')
}

fn handle_text(body: &str, agg: &mut Aggregator, out: &mut impl Write) -> io::Result<DispatchEffect> {
    writeln!(out)?;
    writeln!(out, "{body}")?;
    if !looks_like_solution_header(body.trim_start()) {
        return Ok(DispatchEffect::None);
    }
    agg.global_solutions_found += 1;
    if agg.cap.is_some_and(|cap| agg.global_solutions_found >= cap) {
        Ok(DispatchEffect::CapReached)
    } else {
        Ok(DispatchEffect::None)
    }
}

/// Suppress whitespace-only lines, the stipulation echo prefix, and the
/// legacy "solution finished" noise line (§4.5.1 non-`@@` row).
fn dispatch_opaque(line: &str, out: &mut impl Write) -> io::Result<()> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with("ser-") || trimmed == "solution finished" {
        return Ok(());
    }
    writeln!(out, "{line}")
}

fn dispatch_record(
    workers: &mut [WorkerRecord],
    idx: usize,
    record: Record,
    agg: &mut Aggregator,
    out: &mut impl Write,
) -> io::Result<DispatchEffect> {
    match record {
        Record::Progress { m, k, positions } => {
            apply_progress(workers, idx, m, k, positions);
            if agg.show_progress {
                advance_frontier(workers, agg, out)?;
            }
            Ok(DispatchEffect::None)
        }
        Record::Text(body) => handle_text(&body, agg, out),
        Record::Combo(label) => {
            workers[idx].current_combo_label = Some(label);
            Ok(DispatchEffect::None)
        }
        Record::Finished
        | Record::Debug(_)
        | Record::Error(_)
        | Record::Solving
        | Record::Ready
        | Record::SolutionStart
        | Record::SolutionEnd
        | Record::Time(_)
        | Record::Heartbeat(_)
        | Record::ProblemStart(_)
        | Record::ProblemEnd(_)
        | Record::Partial
        | Record::Unknown(_) => Ok(DispatchEffect::None),
    }
}

/// Dispatch one decoded frame from worker `idx`.
pub fn dispatch_frame(
    workers: &mut [WorkerRecord],
    idx: usize,
    frame: Frame,
    agg: &mut Aggregator,
    out: &mut impl Write,
) -> io::Result<DispatchEffect> {
    match frame {
        Frame::Record(record) => dispatch_record(workers, idx, record, agg, out),
        Frame::Opaque(line) => {
            dispatch_opaque(&line, out)?;
            Ok(DispatchEffect::None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::WorkerHandle;
    use nix::unistd::Pid;

    fn fake_worker(partition_id: usize) -> WorkerRecord {
        // read_fd -1 is never polled or closed in these pure dispatch tests.
        WorkerRecord::new(WorkerHandle { pid: Pid::from_raw(-1), read_fd: -1 }, partition_id)
    }

    /// Literal scenario 1: two workers each emit `1+0:3`/`1+1:7` then finish;
    /// expect one aggregated line per depth summing both workers.
    #[test]
    fn scenario_one_trivial_partition_round_trip() {
        let mut workers = vec![fake_worker(0), fake_worker(1)];
        let mut agg = Aggregator::new(None, Instant::now());
        let mut out = Vec::new();
        for (idx, (m, k, positions)) in [(0, 1u32, 0u32, 3u64), (1, 1, 1, 7)]
            .into_iter()
            .map(|(i, m, k, p)| (i, (m, k, p)))
        {
            dispatch_frame(&mut workers, idx, Frame::Record(Record::Progress { m, k, positions }), &mut agg, &mut out).unwrap();
        }
        for w in &mut workers {
            w.finished = true;
        }
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("1+0: 3 positions"));
        // 1+1 hasn't advanced the frontier yet: worker 0's last_depth is still 1+0 (100).
        assert!(!text.contains("1+1"));
    }

    #[test]
    fn frontier_only_advances_once_every_worker_reaches_the_depth() {
        let mut workers = vec![fake_worker(0), fake_worker(1)];
        let mut agg = Aggregator::new(None, Instant::now());
        let mut out = Vec::new();
        dispatch_frame(&mut workers, 0, Frame::Record(Record::Progress { m: 1, k: 0, positions: 3 }), &mut agg, &mut out).unwrap();
        dispatch_frame(&mut workers, 1, Frame::Record(Record::Progress { m: 1, k: 1, positions: 7 }), &mut agg, &mut out).unwrap();
        // worker 1 is ahead of worker 0; min_depth is still worker 0's depth (1+0=100)
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("1+0: 3 positions"));
        assert_eq!(agg.last_printed_depth, Some(100));
    }

    /// Literal scenario 2: cap=1, a TEXT solution header triggers CapReached.
    #[test]
    fn scenario_two_cap_stops_workers() {
        let mut workers = vec![fake_worker(0)];
        let mut agg = Aggregator::new(Some(1), Instant::now());
        let mut out = Vec::new();
        let effect = dispatch_frame(
            &mut workers,
            0,
            Frame::Record(Record::Text("  1.e2-e4 e7-e5 #".to_string())),
            &mut agg,
            &mut out,
        )
        .unwrap();
        assert_eq!(effect, DispatchEffect::CapReached);
        assert_eq!(agg.global_solutions_found, 1);
        assert!(String::from_utf8(out).unwrap().contains("1.e2-e4 e7-e5 #"));
    }

    /// Literal scenario 5: malformed frame with leading noise before `@@`.
    #[test]
    fn scenario_five_malformed_frame_still_applies_progress() {
        let mut workers = vec![fake_worker(0)];
        let mut agg = Aggregator::new(None, Instant::now());
        let mut out = Vec::new();
        let mut reader = mm_protocol::FrameReader::new();
        let frames = reader.feed(b"XYZ@@PROGRESS:2+3:100\nTRAIL");
        for frame in frames {
            dispatch_frame(&mut workers, 0, frame, &mut agg, &mut out).unwrap();
        }
        assert_eq!(workers[0].last_depth, Some(203));
        if let Some(frame) = reader.flush() {
            dispatch_frame(&mut workers, 0, frame, &mut agg, &mut out).unwrap();
        }
        assert!(String::from_utf8(out).unwrap().contains("TRAIL"));
    }

    #[test]
    fn whitespace_and_stipulation_echo_lines_are_suppressed() {
        let mut out = Vec::new();
        dispatch_opaque("   ", &mut out).unwrap();
        dispatch_opaque("ser-#2", &mut out).unwrap();
        dispatch_opaque("solution finished", &mut out).unwrap();
        assert!(out.is_empty());
        dispatch_opaque("a genuinely interesting line", &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap().trim(), "a genuinely interesting line");
    }

    #[test]
    fn combo_record_updates_current_label() {
        let mut workers = vec![fake_worker(0)];
        let mut agg = Aggregator::new(None, Instant::now());
        let mut out = Vec::new();
        dispatch_frame(&mut workers, 0, Frame::Record(Record::Combo("30212".to_string())), &mut agg, &mut out).unwrap();
        assert_eq!(workers[0].current_combo_label.as_deref(), Some("30212"));
    }
}
