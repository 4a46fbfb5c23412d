//! The worker-local configuration materialised inside a forked child (§4.4
//! step 3, §9 "global mutable state" design note: process-wide singletons in
//! the host become a plain struct here).
use std::path::PathBuf;

/// How a worker's combo assignment is specified (§3, §6 `-partition`/`-partition-range`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentSpec {
    /// No partitioning: process the whole combo space.
    Whole,
    /// `-partition-range start/stride/max`.
    Strided { start: usize, stride: usize, max: usize },
    /// `-partition N/M`, one-indexed.
    Simple { n: usize, m: usize },
    /// `-single-combo idx`.
    Single { index: usize },
}

/// How a worker's ply-1 first-move list is filtered (§3, §6 `-first-move-*`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FirstMoveSpec {
    /// No filtering.
    None,
    /// `-first-move-partition N/M`.
    Static { index: usize, total: usize },
    /// `-first-move-queue N`: dynamic rotation backed by the shared work-queue file.
    Queue { path: PathBuf },
}

/// Everything a worker needs to configure itself post-fork, threaded in by
/// the spawning coordinator (or, in tests, constructed directly).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    pub order: String,
    pub assignment: AssignmentSpec,
    pub first_move: FirstMoveSpec,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            order: mm_partition::DEFAULT_ORDER.to_string(),
            assignment: AssignmentSpec::Whole,
            first_move: FirstMoveSpec::None,
        }
    }
}
